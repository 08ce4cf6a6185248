//! Drive directive accumulation.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::path::PathBuf;

use crate::errors::{GuestliteResult, SourceError};

/// Opaque payload produced when a scratch image is prepared.
///
/// The accumulator owns the payload for the lifetime of its list and
/// drops it exactly once when the list is released; attachment only
/// borrows it.
pub struct PreparedPayload(Box<dyn Any>);

impl PreparedPayload {
    pub fn new(data: impl Any) -> Self {
        Self(Box::new(data))
    }

    /// Borrow the payload as a concrete type, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for PreparedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PreparedPayload(..)")
    }
}

/// One requested block-device attachment.
///
/// The three payload shapes are structurally disjoint, so the resolver
/// matches exhaustively instead of dispatching through a trait object.
#[derive(Debug)]
pub enum DriveDirective {
    /// Explicit disk image. `format: None` lets the backend auto-detect.
    Image {
        path: PathBuf,
        format: Option<String>,
    },

    /// Libvirt guest awaiting expansion into its disk set.
    ///
    /// Must be replaced by [`crate::libvirt::expand_guest`] before the
    /// drive resolver runs; the resolver treats a surviving `Guest` entry
    /// as an internal-consistency error.
    Guest { name: String },

    /// Prepared scratch image with a pre-assigned appliance device name.
    Scratch {
        path: PathBuf,
        prepared: PreparedPayload,
        device: String,
    },
}

/// Head-first accumulator of drive directives.
///
/// The most recently specified directive is the head, matching the
/// prepend-per-flag accumulation of the surrounding command-line loop.
/// [`DriveList::iter_spec_order`] restores specification order for the
/// attachment phase.
#[derive(Debug, Default)]
pub struct DriveList {
    // Front of the deque is the head (newest directive).
    entries: VecDeque<DriveDirective>,
}

impl DriveList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accumulated directives.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record an explicit disk image as the new head.
    ///
    /// The file must be readable now: an unreadable path fails the
    /// accumulation phase before any backend work starts.
    pub fn add_image(
        &mut self,
        path: impl Into<PathBuf>,
        format: Option<String>,
    ) -> GuestliteResult<()> {
        let path = path.into();
        if let Err(source) = File::open(&path) {
            return Err(SourceError { path, source }.into());
        }

        tracing::debug!("drive directive: image {}", path.display());
        self.entries.push_front(DriveDirective::Image { path, format });
        Ok(())
    }

    /// Record a prepared scratch image as the new head.
    pub fn add_scratch(
        &mut self,
        path: impl Into<PathBuf>,
        prepared: PreparedPayload,
        device: impl Into<String>,
    ) {
        let path = path.into();
        let device = device.into();

        tracing::debug!("drive directive: scratch {} ({})", path.display(), device);
        self.entries.push_front(DriveDirective::Scratch {
            path,
            prepared,
            device,
        });
    }

    /// Push a directive onto the head of the list.
    ///
    /// The raw primitive behind the `add_*` helpers; the libvirt expander
    /// uses it directly for guest-resolved disks, which skip the eager
    /// readability check.
    pub fn push_front(&mut self, directive: DriveDirective) {
        self.entries.push_front(directive);
    }

    /// Walk the list head-first (reverse of specification order).
    pub fn iter(&self) -> impl Iterator<Item = &DriveDirective> {
        self.entries.iter()
    }

    /// Restore specification order.
    ///
    /// Every resolution pass starts from this walk: the first directive
    /// the user specified comes out first.
    pub fn iter_spec_order(&self) -> impl Iterator<Item = &DriveDirective> {
        self.entries.iter().rev()
    }

    /// Release the list and every payload it owns.
    ///
    /// Scratch payloads are dropped here, exactly once. Safe on an empty
    /// list. Consuming `self` makes a second release unrepresentable.
    pub fn release(self) {
        tracing::debug!("releasing {} drive directive(s)", self.entries.len());
        drop(self.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn image(path: &str) -> DriveDirective {
        DriveDirective::Image {
            path: PathBuf::from(path),
            format: None,
        }
    }

    fn paths_of<'a>(iter: impl Iterator<Item = &'a DriveDirective>) -> Vec<String> {
        iter.map(|d| match d {
            DriveDirective::Image { path, .. } => path.display().to_string(),
            DriveDirective::Scratch { path, .. } => path.display().to_string(),
            DriveDirective::Guest { name } => name.clone(),
        })
        .collect()
    }

    #[test]
    fn test_head_first_walk_order() {
        let mut drives = DriveList::new();
        drives.push_front(image("first.img"));
        drives.push_front(image("second.img"));
        drives.push_front(image("third.img"));

        assert_eq!(
            paths_of(drives.iter()),
            vec!["third.img", "second.img", "first.img"]
        );
    }

    #[test]
    fn test_spec_order_restoration() {
        let mut drives = DriveList::new();
        drives.push_front(image("first.img"));
        drives.push_front(image("second.img"));
        drives.push_front(image("third.img"));

        assert_eq!(
            paths_of(drives.iter_spec_order()),
            vec!["first.img", "second.img", "third.img"]
        );
    }

    #[test]
    fn test_add_image_rejects_unreadable_path() {
        let mut drives = DriveList::new();
        let err = drives
            .add_image("/nonexistent/disk.img", None)
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/disk.img"));
        assert!(drives.is_empty());
    }

    #[test]
    fn test_add_image_accepts_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        std::fs::write(&path, b"\0").unwrap();

        let mut drives = DriveList::new();
        drives.add_image(&path, Some("raw".into())).unwrap();
        assert_eq!(drives.len(), 1);
    }

    struct DropProbe(Arc<AtomicUsize>);

    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_release_drops_scratch_payload_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut drives = DriveList::new();
        drives.add_scratch(
            "test1.img",
            PreparedPayload::new(DropProbe(drops.clone())),
            "/dev/sda",
        );

        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drives.release();
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_empty_list_is_noop() {
        DriveList::new().release();
    }

    #[test]
    fn test_payload_downcast() {
        let payload = PreparedPayload::new(42usize);
        assert_eq!(payload.downcast_ref::<usize>(), Some(&42));
        assert_eq!(payload.downcast_ref::<String>(), None);
    }
}
