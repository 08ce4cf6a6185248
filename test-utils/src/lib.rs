//! Shared test doubles for guestlite.
//!
//! - [`RecordingBackend`]: backend that records calls and assigns device
//!   names sequentially, with primable failures
//! - [`ScriptedGuestSource`]: in-memory guest resolver
//! - [`DropProbe`]: scratch payload that counts its drops
//! - helpers for test images and logging setup

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use guestlite::{
    Backend, BackendError, BackendOption, DeviceHandle, GuestDisk, GuestError, GuestSource,
};

/// One call observed by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    AttachDisk {
        path: PathBuf,
        format: Option<String>,
    },
    AttachPrepared {
        path: PathBuf,
        device: String,
    },
    Mount {
        device: String,
        mountpoint: String,
    },
    SetOption(BackendOption),
}

/// Backend double that records every call.
///
/// Device names follow the appliance convention: the first attached disk
/// becomes `/dev/sda`, the next `/dev/sdb`, and so on. Individual image
/// paths or mountpoints can be primed to fail.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    next_index: u8,
    fail_attach: Vec<PathBuf>,
    fail_mount: Vec<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make attachment of `path` fail.
    pub fn fail_attach(&mut self, path: impl Into<PathBuf>) {
        self.fail_attach.push(path.into());
    }

    /// Make mounting on `mountpoint` fail.
    pub fn fail_mount(&mut self, mountpoint: impl Into<String>) {
        self.fail_mount.push(mountpoint.into());
    }

    /// Every call observed so far, in order.
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Paths attached so far, in attachment order.
    pub fn attach_sequence(&self) -> Vec<PathBuf> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::AttachDisk { path, .. }
                | BackendCall::AttachPrepared { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Mountpoints mounted so far, in mount order.
    pub fn mount_sequence(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Mount { mountpoint, .. } => Some(mountpoint.clone()),
                _ => None,
            })
            .collect()
    }

    fn next_device(&mut self) -> DeviceHandle {
        assert!(self.next_index < 26, "appliance device index must be < 26");
        let letter = (b'a' + self.next_index) as char;
        self.next_index += 1;
        DeviceHandle::new(format!("/dev/sd{}", letter))
    }
}

impl Backend for RecordingBackend {
    fn attach_disk(
        &mut self,
        path: &Path,
        format: Option<&str>,
    ) -> Result<DeviceHandle, BackendError> {
        if self.fail_attach.iter().any(|p| p == path) {
            return Err(BackendError::new(format!(
                "could not open disk {}",
                path.display()
            )));
        }
        self.calls.push(BackendCall::AttachDisk {
            path: path.to_path_buf(),
            format: format.map(str::to_string),
        });
        Ok(self.next_device())
    }

    fn attach_prepared(
        &mut self,
        path: &Path,
        device: &str,
    ) -> Result<DeviceHandle, BackendError> {
        if self.fail_attach.iter().any(|p| p == path) {
            return Err(BackendError::new(format!(
                "could not open disk {}",
                path.display()
            )));
        }
        self.calls.push(BackendCall::AttachPrepared {
            path: path.to_path_buf(),
            device: device.to_string(),
        });
        // The prepared disk still occupies a device slot.
        self.next_index += 1;
        Ok(DeviceHandle::new(device))
    }

    fn mount(&mut self, device: &str, mountpoint: &str) -> Result<(), BackendError> {
        if self.fail_mount.iter().any(|mp| mp == mountpoint) {
            return Err(BackendError::new(format!(
                "mount on {} failed",
                mountpoint
            )));
        }
        self.calls.push(BackendCall::Mount {
            device: device.to_string(),
            mountpoint: mountpoint.to_string(),
        });
        Ok(())
    }

    fn set_option(&mut self, option: BackendOption) {
        self.calls.push(BackendCall::SetOption(option));
    }
}

/// In-memory [`GuestSource`] mapping guest names to fixed disk sets.
#[derive(Debug, Default)]
pub struct ScriptedGuestSource {
    guests: HashMap<String, Vec<GuestDisk>>,
}

impl ScriptedGuestSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guest(mut self, name: impl Into<String>, disks: Vec<GuestDisk>) -> Self {
        self.guests.insert(name.into(), disks);
        self
    }
}

impl GuestSource for ScriptedGuestSource {
    fn guest_disks(&self, guest: &str) -> Result<Vec<GuestDisk>, GuestError> {
        self.guests
            .get(guest)
            .cloned()
            .ok_or_else(|| GuestError::NotFound {
                guest: guest.to_string(),
            })
    }
}

/// Scratch payload that counts how many times it has been dropped.
///
/// Keep the counter, hand the probe to the drive list, and assert on the
/// count after release.
pub struct DropProbe {
    drops: Arc<AtomicUsize>,
}

impl DropProbe {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        (
            Self {
                drops: drops.clone(),
            },
            drops,
        )
    }
}

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Temporary directory for test disk images.
pub fn image_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create image dir")
}

/// Create a readable file standing in for a disk image.
pub fn touch_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"\0").expect("write test image");
    path
}

/// Initialize test logging once. Honors `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
