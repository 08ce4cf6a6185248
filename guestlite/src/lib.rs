//! Guestlite - ordered disk attachment and mount sequencing
//!
//! Guestlite accumulates disk-image and mountpoint directives the way a
//! command-line loop observes them, then resolves them against an appliance
//! backend in an order the user can predict:
//!
//! - `directives`: head-first accumulators for drives and mountpoints, with
//!   an explicit order-restoring walk
//! - `attach`: attaches accumulated drives in specification order, so the
//!   backend's sequential device naming matches the command line
//! - `mounting`: issues mounts parents-first (stable depth ordering)
//! - `libvirt`: expands a guest name into its ordered disk set
//! - `backend`: the appliance runtime boundary (attachment, mounting,
//!   pass-through flags)
//!
//! The crate decides *what* to attach and *in what order* to mount; the
//! backend performs the actual work. All phases are strictly sequential and
//! every error is terminal for the run.

pub mod attach;
pub mod backend;
pub mod directives;
pub mod errors;
pub mod libvirt;
pub mod mounting;

pub use attach::attach_all;
pub use backend::{Backend, BackendError, BackendOption, DeviceHandle};
pub use directives::{DriveDirective, DriveList, MountDirective, MountList, PreparedPayload};
pub use errors::{
    AttachError, GuestError, GuestliteError, GuestliteResult, MountError, SourceError,
};
pub use libvirt::{GuestDisk, GuestSource, VirshSource, expand_guest};
pub use mounting::{mount_all, mount_order};
