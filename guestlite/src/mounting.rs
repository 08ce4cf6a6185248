//! Mount ordering and execution.
//!
//! Mounting a path before its parent filesystem exists fails, so mounts
//! are issued parents-first: restore specification order, then stable-sort
//! by mountpoint depth. Among equal depths the first-specified mount goes
//! first.
//!
//! Depth ordering assumes every dependency between mountpoints is a
//! path-prefix relation; non-hierarchical dependencies (e.g. bind mounts)
//! are unsupported.

use crate::backend::Backend;
use crate::directives::{MountDirective, MountList};
use crate::errors::{GuestliteResult, MountError};

/// Compute the order mounts will be issued in.
///
/// Restored specification order, stable-sorted by ascending mountpoint
/// depth. Stability is load-bearing: it is the only mechanism that orders
/// equal-depth mountpoints, and it keeps the first-specified one first.
pub fn mount_order(mounts: &MountList) -> Vec<&MountDirective> {
    let mut ordered: Vec<&MountDirective> = mounts.iter_spec_order().collect();
    ordered.sort_by_key(|directive| directive.depth());
    ordered
}

/// Mount every accumulated directive, parents before children.
///
/// The first failure aborts the run: later mounts may depend on the
/// failed one, so none of them are attempted.
pub fn mount_all(backend: &mut dyn Backend, mounts: &MountList) -> GuestliteResult<()> {
    for directive in mount_order(mounts) {
        backend
            .mount(&directive.device, &directive.mountpoint)
            .map_err(|reason| {
                MountError::new(directive.device.clone(), directive.mountpoint.clone(), reason)
            })?;
        tracing::debug!("mounted {} on {}", directive.device, directive.mountpoint);
    }

    tracing::info!("mounted {} filesystem(s)", mounts.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, BackendOption, DeviceHandle};
    use crate::errors::GuestliteError;
    use std::path::Path;

    /// Minimal backend double recording mounts, one primable failure.
    #[derive(Default)]
    struct TestBackend {
        mounted: Vec<(String, String)>,
        fail_on: Option<String>,
    }

    impl Backend for TestBackend {
        fn attach_disk(
            &mut self,
            _path: &Path,
            _format: Option<&str>,
        ) -> Result<DeviceHandle, BackendError> {
            unreachable!("mount tests never attach");
        }

        fn attach_prepared(
            &mut self,
            _path: &Path,
            _device: &str,
        ) -> Result<DeviceHandle, BackendError> {
            unreachable!("mount tests never attach");
        }

        fn mount(&mut self, device: &str, mountpoint: &str) -> Result<(), BackendError> {
            if self.fail_on.as_deref() == Some(mountpoint) {
                return Err(BackendError::new("wrong fs type"));
            }
            self.mounted.push((device.to_string(), mountpoint.to_string()));
            Ok(())
        }

        fn set_option(&mut self, _option: BackendOption) {}
    }

    fn list(tokens: &[&str]) -> MountList {
        let mut mounts = MountList::new();
        for token in tokens {
            mounts.add_token(token);
        }
        mounts
    }

    fn mountpoints(backend: &TestBackend) -> Vec<&str> {
        backend.mounted.iter().map(|(_, mp)| mp.as_str()).collect()
    }

    #[test]
    fn test_parents_mount_before_children() {
        let mounts = list(&[
            "/dev/sda3:/a/b/c",
            "/dev/sda1:/a",
            "/dev/sda2:/a/b",
        ]);

        let mut backend = TestBackend::default();
        mount_all(&mut backend, &mounts).unwrap();
        assert_eq!(mountpoints(&backend), vec!["/a", "/a/b", "/a/b/c"]);
    }

    #[test]
    fn test_equal_depth_keeps_specification_order() {
        let mounts = list(&["/dev/sda1:/x", "/dev/sda2:/y"]);

        let mut backend = TestBackend::default();
        mount_all(&mut backend, &mounts).unwrap();
        assert_eq!(mountpoints(&backend), vec!["/x", "/y"]);
    }

    #[test]
    fn test_root_mounts_first_regardless_of_position() {
        let mounts = list(&["/dev/sda2:/boot", "/dev/sda1"]);

        let mut backend = TestBackend::default();
        mount_all(&mut backend, &mounts).unwrap();
        assert_eq!(mountpoints(&backend), vec!["/", "/boot"]);
    }

    #[test]
    fn test_first_failure_stops_sequencing() {
        let mounts = list(&["/dev/sda1:/", "/dev/sda2:/home", "/dev/sda3:/home/user"]);

        let mut backend = TestBackend {
            fail_on: Some("/home".into()),
            ..Default::default()
        };

        let err = mount_all(&mut backend, &mounts).unwrap_err();
        assert!(matches!(err, GuestliteError::Mount(_)));
        assert!(err.to_string().contains("/home"));
        // root mounted, /home/user never attempted
        assert_eq!(mountpoints(&backend), vec!["/"]);
    }

    #[test]
    fn test_mount_order_borrows_only() {
        let mounts = list(&["/dev/sda2:/var/log", "/dev/sda1:/var"]);
        let order: Vec<&str> = mount_order(&mounts)
            .iter()
            .map(|d| d.mountpoint.as_str())
            .collect();
        assert_eq!(order, vec!["/var", "/var/log"]);
        // list untouched, still walkable afterwards
        assert_eq!(mounts.len(), 2);
    }

    #[test]
    fn test_empty_list_mounts_nothing() {
        let mounts = MountList::new();
        let mut backend = TestBackend::default();
        mount_all(&mut backend, &mounts).unwrap();
        assert!(backend.mounted.is_empty());
    }
}
