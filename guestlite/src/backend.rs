//! Appliance backend boundary.
//!
//! The backend is the disk-access runtime that actually attaches block
//! devices and mounts filesystems. Guestlite only decides what to attach
//! and in what order to mount, then issues ordered calls across this
//! trait.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned by backend attachment and mount calls.
///
/// The backend owns the failure detail; callers wrap it with the path or
/// device context of the rejected operation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Identifier the backend assigned to an attached block device.
///
/// Assignment is a pure function of attachment order: the first attached
/// disk gets the first device name, the second the next, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceHandle {
    /// Device path inside the appliance (e.g. "/dev/sda").
    pub device: String,
}

impl DeviceHandle {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }
}

/// Pass-through configuration flags for the backend.
///
/// Forwarded verbatim from the surrounding tool's flag dispatch; none of
/// these participate in attachment or mount ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendOption {
    /// Attach all disks read-only.
    ReadOnly(bool),
    /// Synchronize disk state automatically when the handle closes.
    Autosync(bool),
    /// Verbose backend messages.
    Verbose(bool),
    /// Trace every backend call.
    Trace(bool),
}

/// Appliance disk-access runtime.
///
/// Synchronous by design: accumulation, attachment and mounting are three
/// strictly ordered phases, and every call blocks until the backend
/// completes it. The `&mut` receiver gives the resolution phase exclusive
/// use of the single backend handle.
pub trait Backend {
    /// Attach a disk image. `format: None` lets the backend auto-detect.
    fn attach_disk(
        &mut self,
        path: &Path,
        format: Option<&str>,
    ) -> Result<DeviceHandle, BackendError>;

    /// Attach a prepared scratch image under a caller-chosen device name.
    fn attach_prepared(
        &mut self,
        path: &Path,
        device: &str,
    ) -> Result<DeviceHandle, BackendError>;

    /// Mount `device` at `mountpoint` inside the appliance.
    fn mount(&mut self, device: &str, mountpoint: &str) -> Result<(), BackendError>;

    /// Set a pass-through backend flag.
    fn set_option(&mut self, option: BackendOption);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_handle_serialization() {
        let handle = DeviceHandle::new("/dev/sda");
        let json = serde_json::to_string(&handle).unwrap();
        let deserialized: DeviceHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, handle);
    }

    #[test]
    fn test_backend_option_roundtrip() {
        for option in [
            BackendOption::ReadOnly(true),
            BackendOption::Autosync(false),
            BackendOption::Verbose(true),
            BackendOption::Trace(false),
        ] {
            let json = serde_json::to_string(&option).unwrap();
            let deserialized: BackendOption = serde_json::from_str(&json).unwrap();
            assert_eq!(deserialized, option);
        }
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::new("qemu: could not open disk");
        assert_eq!(err.to_string(), "qemu: could not open disk");
    }
}
