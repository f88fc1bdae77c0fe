//! Deferred change notifications
//!
//! Stores report what a structural edit did to them as [`Notification`]s. While
//! a worksheet is inside `with_deferred_notifications` they are only queued;
//! the queue is flushed once, after the outermost scope ends, so dependents
//! never see a partially shifted sheet.

/// Which annotation collection a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    Validations,
    ConditionalFormats,
    Sparklines,
    MergedRegions,
    Names,
}

/// Something dependents of a worksheet may need to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Rows or columns under the autofilter changed; it must be reapplied
    AutoFilterStale,
    /// A table's row or column count changed
    TableResized(String),
    /// A table was discarded
    TableRemoved(String),
    /// An edit invalidated ranges of a store
    EntriesInvalidated { store: StoreKind, ranges: usize },
}

/// Queue of notifications plus the nesting depth of deferral scopes
#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    depth: u32,
    pending: Vec<Notification>,
}

impl NotificationQueue {
    /// Create an empty, non-deferred queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether notifications are currently being held back
    pub fn is_deferred(&self) -> bool {
        self.depth > 0
    }

    /// Notifications waiting for the scope to end
    pub fn pending(&self) -> &[Notification] {
        &self.pending
    }

    /// Queue a notification; duplicates of a pending one are dropped
    pub(crate) fn push(&mut self, notification: Notification) {
        if !self.pending.contains(&notification) {
            self.pending.push(notification);
        }
    }

    pub(crate) fn suspend(&mut self) {
        self.depth += 1;
    }

    /// Leave one scope; returns `true` when the outermost one ended
    pub(crate) fn resume(&mut self) -> bool {
        self.depth = self.depth.saturating_sub(1);
        self.depth == 0
    }

    /// Take everything queued, unless still deferred
    pub(crate) fn drain(&mut self) -> Vec<Notification> {
        if self.is_deferred() {
            Vec::new()
        } else {
            std::mem::take(&mut self.pending)
        }
    }
}
