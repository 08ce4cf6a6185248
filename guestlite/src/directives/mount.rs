//! Mountpoint directive accumulation.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One requested mount, parsed from a `DEVICE[:MOUNTPOINT]` token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountDirective {
    /// Block device or partition inside the appliance.
    pub device: String,
    /// Absolute mountpoint path. `/` when the token has no colon.
    pub mountpoint: String,
}

impl MountDirective {
    pub fn new(device: impl Into<String>, mountpoint: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            mountpoint: mountpoint.into(),
        }
    }

    /// Parse a `DEVICE[:MOUNTPOINT]` token.
    ///
    /// The first literal colon splits the fields; without one the
    /// mountpoint defaults to `/`.
    pub fn parse(token: &str) -> Self {
        match token.split_once(':') {
            Some((device, mountpoint)) => Self::new(device, mountpoint),
            None => Self::new(token, "/"),
        }
    }

    /// Number of non-empty path components (`/` -> 0, `/var/log` -> 2).
    ///
    /// A parent mountpoint always has a smaller depth than any of its
    /// children, which is what the mount sequencer orders by.
    pub fn depth(&self) -> usize {
        self.mountpoint.split('/').filter(|c| !c.is_empty()).count()
    }
}

/// Head-first accumulator of mount directives.
///
/// Same head-insertion invariant as [`crate::directives::DriveList`]: the
/// newest directive is the head, and [`MountList::iter_spec_order`]
/// restores specification order.
#[derive(Debug, Default)]
pub struct MountList {
    // Front of the deque is the head (newest directive).
    entries: VecDeque<MountDirective>,
}

impl MountList {
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

    /// Record a mount directive as the new head.
    pub fn push_front(&mut self, directive: MountDirective) {
        tracing::debug!(
            "mount directive: {} on {}",
            directive.device,
            directive.mountpoint
        );
        self.entries.push_front(directive);
    }

    /// Parse a `DEVICE[:MOUNTPOINT]` token and record it as the new head.
    pub fn add_token(&mut self, token: &str) {
        self.push_front(MountDirective::parse(token));
    }

    /// Walk the list head-first (reverse of specification order).
    pub fn iter(&self) -> impl Iterator<Item = &MountDirective> {
        self.entries.iter()
    }

    /// Restore specification order.
    pub fn iter_spec_order(&self) -> impl Iterator<Item = &MountDirective> {
        self.entries.iter().rev()
    }

    /// Release the list. Safe on an empty list; consuming `self` makes a
    /// second release unrepresentable.
    pub fn release(self) {
        tracing::debug!("releasing {} mount directive(s)", self.entries.len());
        drop(self.entries);
    }
}
