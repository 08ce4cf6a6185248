//! Directive accumulators for drives and mountpoints.
//!
//! Directives are collected head-first while the surrounding tool walks
//! its command line: each new directive becomes the head of its list, so
//! the natural walk order is the *reverse* of specification order. Both
//! lists expose an explicit order-restoring iterator that the resolution
//! phase starts from.

mod drive;
mod mount;

pub use drive::{DriveDirective, DriveList, PreparedPayload};
pub use mount::{MountDirective, MountList};
