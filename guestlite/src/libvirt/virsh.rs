//! Guest disk resolution through the virsh command-line client.

use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

use super::{GuestDisk, GuestSource};
use crate::errors::GuestError;

// virsh emits domain XML with single-quoted attributes.
static DISK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<disk[^>]*\bdevice='disk'[^>]*>(.*?)</disk>").unwrap());
static SOURCE_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<source[^>]*\bfile='([^']+)'").unwrap());
static SOURCE_DEV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<source[^>]*\bdev='([^']+)'").unwrap());
static DRIVER_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<driver[^>]*\btype='([^']+)'").unwrap());

/// Resolves guest disks by dumping the domain XML with `virsh`.
///
/// Only `<disk device='disk'>` elements with a file or block source
/// count; cdroms, floppies and network volumes are skipped. Disks are
/// returned in document order, which is the guest's defined disk order.
#[derive(Debug, Clone, Default)]
pub struct VirshSource {
    uri: Option<String>,
    read_only: bool,
}

impl VirshSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect to a specific hypervisor URI instead of the default.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Open the libvirt connection read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    fn dump_xml(&self, guest: &str) -> Result<String, GuestError> {
        let mut cmd = Command::new("virsh");
        if self.read_only {
            cmd.arg("--readonly");
        }
        if let Some(uri) = &self.uri {
            cmd.args(["--connect", uri]);
        }
        cmd.args(["dumpxml", "--domain", guest]);

        let output = cmd.output().map_err(|e| GuestError::Resolver {
            guest: guest.to_string(),
            reason: format!("failed to run virsh: {}", e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.classify_failure(guest, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn classify_failure(&self, guest: &str, stderr: &str) -> GuestError {
        if stderr.contains("failed to connect") || stderr.contains("no connection driver") {
            GuestError::Connection {
                uri: self.uri.clone(),
                reason: stderr.to_string(),
            }
        } else if stderr.contains("failed to get domain") || stderr.contains("Domain not found") {
            GuestError::NotFound {
                guest: guest.to_string(),
            }
        } else {
            GuestError::Resolver {
                guest: guest.to_string(),
                reason: stderr.to_string(),
            }
        }
    }
}

impl GuestSource for VirshSource {
    fn guest_disks(&self, guest: &str) -> Result<Vec<GuestDisk>, GuestError> {
        let xml = self.dump_xml(guest)?;
        let disks = parse_domain_disks(&xml);
        if disks.is_empty() {
            tracing::warn!("guest '{}' has no usable disks", guest);
        }
        Ok(disks)
    }
}

/// Extract disks from a libvirt domain XML dump, in document order.
fn parse_domain_disks(xml: &str) -> Vec<GuestDisk> {
    let mut disks = Vec::new();

    for capture in DISK_RE.captures_iter(xml) {
        let body = &capture[1];

        let path = SOURCE_FILE_RE
            .captures(body)
            .or_else(|| SOURCE_DEV_RE.captures(body))
            .map(|c| PathBuf::from(&c[1]));
        let Some(path) = path else {
            // Network and pool-backed sources have no local path.
            continue;
        };

        let format = DRIVER_TYPE_RE.captures(body).map(|c| c[1].to_string());
        disks.push(GuestDisk { path, format });
    }

    disks
}
