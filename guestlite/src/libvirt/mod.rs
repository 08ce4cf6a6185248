//! Libvirt guest disk expansion.
//!
//! A guest directive stands for the ordered disk set of a libvirt domain.
//! The expander resolves that set through a [`GuestSource`] and prepends
//! one image directive per disk to the drive list, so order restoration
//! later yields the guest's disks exactly where the guest appeared on the
//! command line.

mod virsh;

pub use virsh::VirshSource;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::directives::{DriveDirective, DriveList};
use crate::errors::{GuestError, GuestliteResult};

/// One disk of a resolved guest, in the guest's defined disk order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestDisk {
    /// Host path of the disk image.
    pub path: PathBuf,
    /// Image format from the domain description. `None` = auto-detect.
    pub format: Option<String>,
}

impl GuestDisk {
    pub fn new(path: impl Into<PathBuf>, format: Option<String>) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

/// Resolves a guest name to its ordered disk set.
pub trait GuestSource {
    /// Look up `guest` and return its disks in the guest's defined order.
    fn guest_disks(&self, guest: &str) -> Result<Vec<GuestDisk>, GuestError>;
}

/// Expand a guest into image directives at the head of `drives`.
///
/// Returns the number of disks added. On failure nothing is added: a
/// guest that cannot be resolved aborts the whole accumulation phase, so
/// partial population would only obscure the error.
pub fn expand_guest(
    drives: &mut DriveList,
    source: &dyn GuestSource,
    guest: &str,
) -> GuestliteResult<usize> {
    let disks = source.guest_disks(guest)?;

    // Prepending disk 1..N in order leaves them head-first like any other
    // run of flags, so restored order interleaves them correctly with
    // directives before and after this expansion point.
    let count = disks.len();
    for disk in disks {
        tracing::debug!("guest '{}': disk {}", guest, disk.path.display());
        drives.push_front(DriveDirective::Image {
            path: disk.path,
            format: disk.format,
        });
    }

    tracing::info!("expanded guest '{}' into {} disk(s)", guest, count);
    Ok(count)
}
