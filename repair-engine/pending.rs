//! Short-lived records of deleted pair characters awaiting a retype.
//!
//! When a single configured character is deleted, the coordinator records it
//! here keyed by buffer offset. The record is consumed by the next insertion
//! processed at the same offset, or overwritten by a later deletion there;
//! offsets are only meaningful within the synchronous edit-processing step,
//! so no timeout is needed.

use std::collections::HashMap;

use repair_core::pairs::{
  Direction,
  PairRole,
};

use crate::host::DocumentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDeletion {
  pub offset:    usize,
  pub deleted:   char,
  pub role:      PairRole,
  pub direction: Direction,
}

#[derive(Debug, Default)]
pub struct PendingDeletions {
  entries: HashMap<(DocumentId, usize), PendingDeletion>,
}

impl PendingDeletions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Remember a deletion. A deletion whose character has no role is
  /// invisible to the rest of the system, so `role = None` records nothing.
  /// At most one record exists per (document, offset); a new record
  /// overwrites.
  pub fn record(
    &mut self,
    doc: DocumentId,
    offset: usize,
    deleted: char,
    role: Option<PairRole>,
  ) {
    let Some(role) = role else {
      return;
    };

    self.entries.insert((doc, offset), PendingDeletion {
      offset,
      deleted,
      role,
      direction: role.into(),
    });
  }

  /// Remove and return the record at (doc, offset), if any.
  pub fn take(&mut self, doc: DocumentId, offset: usize) -> Option<PendingDeletion> {
    self.entries.remove(&(doc, offset))
  }

  pub fn clear(&mut self, doc: DocumentId, offset: usize) {
    self.entries.remove(&(doc, offset));
  }

  pub fn forget_doc(&mut self, doc: DocumentId) {
    self.entries.retain(|(entry_doc, _), _| *entry_doc != doc);
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
