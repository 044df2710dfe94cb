//! Scoped, non-animated layout transactions
//!
//! Geometry changes are collected while the transaction is open and handed
//! to the compositor in one batch when it commits. Observers never see half a
//! layout pass, and nothing is interpolated.

use smallvec::SmallVec;

use crate::host::{CompositorHost, LayerChange};

/// Batches [`LayerChange`]s and applies them on commit (or drop)
pub struct LayoutTransaction<'a> {
    host: &'a dyn CompositorHost,
    changes: SmallVec<[LayerChange; 6]>,
    committed: bool,
}

impl<'a> LayoutTransaction<'a> {
    pub fn begin(host: &'a dyn CompositorHost) -> Self {
        Self {
            host,
            changes: SmallVec::new(),
            committed: false,
        }
    }

    pub fn push(&mut self, change: LayerChange) -> &mut Self {
        self.changes.push(change);
        self
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Apply the batch now
    pub fn commit(mut self) {
        self.flush();
    }

    fn flush(&mut self) {
        if self.committed {
            return;
        }
        self.committed = true;
        if self.changes.is_empty() {
            return;
        }
        tracing::trace!("layout transaction: {} changes", self.changes.len());
        self.host.apply_layout(&self.changes);
    }
}

impl Drop for LayoutTransaction<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}
