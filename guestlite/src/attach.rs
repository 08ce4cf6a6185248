//! Ordered drive attachment.
//!
//! Directives accumulate head-first, but device names inside the backend
//! are assigned strictly sequentially, so the resolver walks the list in
//! restored specification order: the first disk the user specified
//! becomes the first device, guest-expanded disks included.

use crate::backend::{Backend, DeviceHandle};
use crate::directives::{DriveDirective, DriveList};
use crate::errors::{AttachError, GuestliteError, GuestliteResult};

/// Attach every accumulated drive in specification order.
///
/// Returns the backend-assigned device handles in attachment order, one
/// per directive. The first failure aborts the run; disks already
/// attached stay attached for the terminating process to discard.
pub fn attach_all(
    backend: &mut dyn Backend,
    drives: &DriveList,
) -> GuestliteResult<Vec<DeviceHandle>> {
    let mut attached = Vec::with_capacity(drives.len());

    for directive in drives.iter_spec_order() {
        match directive {
            DriveDirective::Image { path, format } => {
                let handle = backend
                    .attach_disk(path, format.as_deref())
                    .map_err(|reason| AttachError::new(path.clone(), reason))?;
                tracing::debug!("attached {} as {}", path.display(), handle.device);
                attached.push(handle);
            }

            DriveDirective::Guest { name } => {
                // Guest directives are expanded during accumulation; one
                // surviving to this point is a defect in that phase.
                return Err(GuestliteError::Internal(format!(
                    "guest directive '{}' was never expanded into its disks",
                    name
                )));
            }

            DriveDirective::Scratch { path, device, .. } => {
                let handle = backend
                    .attach_prepared(path, device)
                    .map_err(|reason| AttachError::new(path.clone(), reason))?;
                tracing::debug!(
                    "attached scratch {} as {}",
                    path.display(),
                    handle.device
                );
                attached.push(handle);
            }
        }
    }

    tracing::info!("attached {} disk(s)", attached.len());
    Ok(attached)
}
