//! Error types for directive accumulation and resolution.
//!
//! Categorized by the phase that raises them:
//! - [`SourceError`]: eager image validation at directive creation
//! - [`GuestError`]: libvirt guest resolution during accumulation
//! - [`AttachError`] / [`MountError`]: backend rejections during resolution
//!
//! Every error is terminal for the run. Nothing is retried, and partial
//! state (disks already attached, filesystems already mounted) is left
//! as-is for the terminating process.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::backend::BackendError;

/// Result alias used across the crate.
pub type GuestliteResult<T> = Result<T, GuestliteError>;

// ============================================================================
// Top-Level Error
// ============================================================================

/// Errors raised while accumulating and resolving directives.
#[derive(Debug, Error)]
pub enum GuestliteError {
    /// An explicit disk image was unreadable when its directive was created.
    #[error("source: {0}")]
    Source(#[from] SourceError),

    /// The backend rejected a disk attachment.
    #[error("attach: {0}")]
    Attach(#[from] AttachError),

    /// A libvirt guest could not be resolved to its disk set.
    #[error("guest: {0}")]
    Guest(#[from] GuestError),

    /// The backend rejected a mount.
    #[error("mount: {0}")]
    Mount(#[from] MountError),

    /// A directive reached a phase that must never see it, e.g. an
    /// unexpanded guest directive reaching the drive resolver.
    #[error("internal consistency: {0}")]
    Internal(String),
}

// ============================================================================
// Accumulation-Phase Errors
// ============================================================================

/// Explicit disk image unreadable at directive-creation time.
///
/// Detected eagerly, before accumulation completes.
#[derive(Debug, Error)]
#[error("cannot read disk image {}: {source}", path.display())]
pub struct SourceError {
    /// Path the user supplied.
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Libvirt guest resolution failures.
#[derive(Debug, Error)]
pub enum GuestError {
    /// The named domain does not exist.
    #[error("guest '{guest}' not found")]
    NotFound { guest: String },

    /// The hypervisor connection could not be established.
    #[error("cannot connect to libvirt ({}): {reason}", uri.as_deref().unwrap_or("default URI"))]
    Connection { uri: Option<String>, reason: String },

    /// The resolver itself failed (spawn error, unusable domain description).
    #[error("cannot resolve disks for guest '{guest}': {reason}")]
    Resolver { guest: String, reason: String },
}

// ============================================================================
// Resolution-Phase Errors
// ============================================================================

/// Backend rejected a disk attachment.
#[derive(Debug, Error)]
#[error("cannot attach {}: {reason}", path.display())]
pub struct AttachError {
    /// Disk image the backend refused.
    pub path: PathBuf,
    #[source]
    pub reason: BackendError,
}

impl AttachError {
    pub fn new(path: impl Into<PathBuf>, reason: BackendError) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }
}

/// Backend rejected a mount.
#[derive(Debug, Error)]
#[error("cannot mount {device} on {mountpoint}: {reason}")]
pub struct MountError {
    pub device: String,
    pub mountpoint: String,
    #[source]
    pub reason: BackendError,
}

impl MountError {
    pub fn new(
        device: impl Into<String>,
        mountpoint: impl Into<String>,
        reason: BackendError,
    ) -> Self {
        Self {
            device: device.into(),
            mountpoint: mountpoint.into(),
            reason,
        }
    }
}
