//! Debounced per-document text snapshots.
//!
//! A shadow is the buffer content as of the last completed edit cycle, the
//! "before" text the coordinator diffs the current edit against. Refreshes
//! are coalesced through an explicit per-document queue: each refresh within
//! the window replaces the pending value and re-arms the deadline, and a
//! pending value is committed on the next access once its deadline passes.
//!
//! The staleness this buys is deliberate: bursts of fast typing do not
//! thrash the cache, and by the time the next edit needs the shadow the
//! window has normally elapsed. If an edit arrives before the deadline, the
//! snapshot served for that edit's diff may be one generation behind the
//! true "before" text.

use std::{
  collections::HashMap,
  time::{
    Duration,
    Instant,
  },
};

use ropey::Rope;
use thiserror::Error;

use crate::host::DocumentId;

pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(50);

pub type Result<T> = std::result::Result<T, ShadowError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShadowError {
  #[error("document {0:?} is not tracked")]
  UnknownDocument(DocumentId),
}

#[derive(Debug)]
struct Shadow {
  text:    Rope,
  pending: Option<PendingRefresh>,
}

#[derive(Debug)]
struct PendingRefresh {
  text: Rope,
  due:  Instant,
}

#[derive(Debug)]
pub struct ShadowStore {
  window:  Duration,
  shadows: HashMap<DocumentId, Shadow>,
}

impl ShadowStore {
  pub fn new() -> Self {
    Self::with_window(DEBOUNCE_WINDOW)
  }

  /// A store with a custom debounce window. Tests use short or zero windows
  /// together with the `_at` variants to avoid sleeping.
  pub fn with_window(window: Duration) -> Self {
    Self {
      window,
      shadows: HashMap::new(),
    }
  }

  /// Insert or reset the shadow for a document, dropping any pending
  /// refresh.
  pub fn track(&mut self, doc: DocumentId, text: Rope) {
    self.shadows.insert(doc, Shadow {
      text,
      pending: None,
    });
  }

  pub fn untrack(&mut self, doc: DocumentId) {
    self.shadows.remove(&doc);
  }

  pub fn is_tracked(&self, doc: DocumentId) -> bool {
    self.shadows.contains_key(&doc)
  }

  pub fn refresh(&mut self, doc: DocumentId, text: Rope) {
    self.refresh_at(doc, text, Instant::now());
  }

  /// Queue a refresh. Repeated calls within the window coalesce into the
  /// last call's value; each call re-arms the deadline. Refreshing an
  /// untracked document tracks it immediately instead.
  pub fn refresh_at(&mut self, doc: DocumentId, text: Rope, now: Instant) {
    match self.shadows.get_mut(&doc) {
      Some(shadow) => {
        shadow.pending = Some(PendingRefresh {
          text,
          due: now + self.window,
        });
      },
      None => self.track(doc, text),
    }
  }

  pub fn get(&mut self, doc: DocumentId) -> Result<&Rope> {
    self.get_at(doc, Instant::now())
  }

  /// The cached snapshot, committing a pending refresh first when its
  /// deadline has passed.
  pub fn get_at(&mut self, doc: DocumentId, now: Instant) -> Result<&Rope> {
    let shadow = self
      .shadows
      .get_mut(&doc)
      .ok_or(ShadowError::UnknownDocument(doc))?;

    if let Some(pending) = shadow.pending.take_if(|pending| pending.due <= now) {
      shadow.text = pending.text;
    }

    Ok(&shadow.text)
  }

  /// Commit a pending refresh immediately, regardless of its deadline.
  pub fn flush(&mut self, doc: DocumentId) -> Result<()> {
    let shadow = self
      .shadows
      .get_mut(&doc)
      .ok_or(ShadowError::UnknownDocument(doc))?;

    if let Some(pending) = shadow.pending.take() {
      shadow.text = pending.text;
    }
    Ok(())
  }
}

impl Default for ShadowStore {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod test {
  use std::num::NonZeroUsize;

  use super::*;

  fn doc(n: usize) -> DocumentId {
    DocumentId::new(NonZeroUsize::new(n).unwrap())
  }

  #[test]
  fn get_before_track_fails() {
    let mut store = ShadowStore::new();
    assert_eq!(
      store.get(doc(1)).unwrap_err(),
      ShadowError::UnknownDocument(doc(1))
    );
  }

  #[test]
  fn track_and_untrack() {
    let mut store = ShadowStore::new();
    store.track(doc(1), Rope::from("abc"));
    assert!(store.is_tracked(doc(1)));
    assert_eq!(store.get(doc(1)).unwrap().to_string(), "abc");

    store.untrack(doc(1));
    assert!(!store.is_tracked(doc(1)));
  }

  #[test]
  fn refresh_is_invisible_until_deadline() {
    let mut store = ShadowStore::new();
    let start = Instant::now();
    store.track(doc(1), Rope::from("v0"));

    store.refresh_at(doc(1), Rope::from("v1"), start);

    // Mid-window reads still serve the old snapshot.
    let mid = start + Duration::from_millis(10);
    assert_eq!(store.get_at(doc(1), mid).unwrap().to_string(), "v0");

    // One window after the refresh the new value converges.
    let after = start + DEBOUNCE_WINDOW;
    assert_eq!(store.get_at(doc(1), after).unwrap().to_string(), "v1");
  }

  #[test]
  fn burst_coalesces_to_last_value_and_rearms() {
    let mut store = ShadowStore::new();
    let start = Instant::now();
    store.track(doc(1), Rope::from("v0"));

    // Three rapid refreshes; each re-arms the deadline.
    store.refresh_at(doc(1), Rope::from("v1"), start);
    store.refresh_at(doc(1), Rope::from("v2"), start + Duration::from_millis(20));
    store.refresh_at(doc(1), Rope::from("v3"), start + Duration::from_millis(40));

    // The first deadline (start + 50ms) has passed, but the burst pushed it
    // out to 40ms + window.
    let mid = start + Duration::from_millis(60);
    assert_eq!(store.get_at(doc(1), mid).unwrap().to_string(), "v0");

    // Within one window of the last refresh the store converges, and only
    // the last value of the burst survives.
    let after = start + Duration::from_millis(40) + DEBOUNCE_WINDOW;
    assert_eq!(store.get_at(doc(1), after).unwrap().to_string(), "v3");
  }

  #[test]
  fn flush_commits_early() {
    let mut store = ShadowStore::new();
    let start = Instant::now();
    store.track(doc(1), Rope::from("v0"));
    store.refresh_at(doc(1), Rope::from("v1"), start);

    store.flush(doc(1)).unwrap();
    assert_eq!(store.get_at(doc(1), start).unwrap().to_string(), "v1");
  }

  #[test]
  fn track_resets_pending() {
    let mut store = ShadowStore::new();
    let start = Instant::now();
    store.track(doc(1), Rope::from("v0"));
    store.refresh_at(doc(1), Rope::from("v1"), start);

    store.track(doc(1), Rope::from("fresh"));
    let after = start + DEBOUNCE_WINDOW;
    assert_eq!(store.get_at(doc(1), after).unwrap().to_string(), "fresh");
  }

  #[test]
  fn refresh_untracked_tracks_immediately() {
    let mut store = ShadowStore::new();
    store.refresh_at(doc(1), Rope::from("v0"), Instant::now());
    assert_eq!(store.get(doc(1)).unwrap().to_string(), "v0");
  }
}
