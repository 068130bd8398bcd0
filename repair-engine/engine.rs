//! Edit coordination.
//!
//! [`EditEngine`] owns the pair table, the shadow store, the pending-deletion
//! registry and the tokenizer registry: one engine per host session, passed
//! by reference into the event handler. Per (document, offset) the engine
//! runs a small state machine:
//!
//! ```text
//! Idle --single-char deletion of a configured char--> AwaitingReplacement
//! AwaitingReplacement --single-char insertion at the offset--> Idle
//! ```
//!
//! On the closing transition the counterpart locator runs and, when it
//! resolves, an [`Effect`] carrying the replacement is returned. All buffer
//! mutation stays at the [`EditEngine::process`] boundary; [`EditEngine::on_edit`]
//! only describes what should happen, which keeps the decision logic
//! testable without a live host.
//!
//! Events are processed serially per document; the locator runs
//! synchronously inside the handler, and the debounced shadow refresh is the
//! only work that outlives it.

use std::{
  collections::HashSet,
  sync::Arc,
};

use arc_swap::ArcSwap;
use repair_core::{
  pairs::{
    Direction,
    PairRole,
    PairTable,
  },
  scan,
  token::TokenizerRegistry,
};
use ropey::Rope;
use thiserror::Error;

use crate::{
  executor::{
    self,
    ExecutorError,
    Replacement,
  },
  host::{
    ChangeEvent,
    DocumentId,
    HostBuffer,
    HostError,
  },
  pending::PendingDeletions,
  shadow::{
    ShadowError,
    ShadowStore,
  },
};

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
  #[error(transparent)]
  Shadow(#[from] ShadowError),
  #[error(transparent)]
  Host(#[from] HostError),
}

/// What the host should do in response to one edit. All side effects stay at
/// the boundary; `on_edit` itself never mutates a buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effect {
  pub replacement: Option<Replacement>,
  /// Advice about the host's own auto-closing-bracket feature: `Some(false)`
  /// asks to suspend it while an open-character deletion is pending (so the
  /// host does not insert a fresh close on the upcoming retype),
  /// `Some(true)` lifts the suspension.
  pub auto_close:  Option<bool>,
}

/// How one event was fully resolved at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// Nothing qualified, or no counterpart was found.
  Skipped,
  /// The counterpart replacement was applied.
  Replaced(Replacement),
  /// A replacement was located but the buffer moved underneath it; the
  /// edit was dropped.
  Conflicted(Replacement),
}

pub struct EditEngine {
  pairs:      ArcSwap<PairTable>,
  shadows:    ShadowStore,
  pending:    PendingDeletions,
  tokenizers: TokenizerRegistry,
  suppressed: HashSet<DocumentId>,
}

impl EditEngine {
  pub fn new(pairs: PairTable) -> Self {
    Self::with_tokenizers(pairs, TokenizerRegistry::default())
  }

  pub fn with_tokenizers(pairs: PairTable, tokenizers: TokenizerRegistry) -> Self {
    Self {
      pairs: ArcSwap::from_pointee(pairs),
      shadows: ShadowStore::new(),
      pending: PendingDeletions::new(),
      tokenizers,
      suppressed: HashSet::new(),
    }
  }

  /// The table edits started after this call will see.
  pub fn pairs(&self) -> Arc<PairTable> {
    self.pairs.load_full()
  }

  /// Swap in a rebuilt table. An edit already mid-processing keeps using
  /// the instance it loaded on entry.
  pub fn reload_pairs(&self, pairs: PairTable) {
    self.pairs.store(Arc::new(pairs));
  }

  pub fn track_document(&mut self, doc: DocumentId, text: Rope) {
    self.shadows.track(doc, text);
  }

  pub fn untrack_document(&mut self, doc: DocumentId) {
    self.shadows.untrack(doc);
    self.pending.forget_doc(doc);
    self.suppressed.remove(&doc);
  }

  pub fn is_tracking(&self, doc: DocumentId) -> bool {
    self.shadows.is_tracked(doc)
  }

  /// Inspect one discrete change and describe the side effects it warrants.
  /// `live_text` is the buffer content with the event already applied.
  pub fn on_edit(&mut self, event: &ChangeEvent, live_text: &Rope) -> Result<Effect> {
    let pairs = self.pairs.load_full();

    if event.is_single_char_deletion() {
      return Ok(self.on_deletion(event, live_text, pairs.as_ref()));
    }
    if let Some(typed) = event.inserted_char() {
      return Ok(self.on_insertion(event, live_text, pairs.as_ref(), typed));
    }

    // Multi-character deltas (paste, multi-char replace) never qualify.
    Ok(Effect::default())
  }

  fn on_deletion(&mut self, event: &ChangeEvent, live_text: &Rope, pairs: &PairTable) -> Effect {
    // The deleted character is read from the shadow: the live buffer no
    // longer contains it.
    if !self.shadows.is_tracked(event.doc) {
      // First sight of this document mid-deletion; start tracking and let
      // this event pass (the deleted character is unrecoverable).
      self.shadows.track(event.doc, live_text.clone());
      return Effect::default();
    }
    let Ok(shadow) = self.shadows.get(event.doc) else {
      return Effect::default();
    };

    let Some(deleted) = shadow.get_char(event.range_offset) else {
      return Effect::default();
    };

    let role = pairs.role_of(deleted);
    self.pending.record(event.doc, event.range_offset, deleted, role);

    if role.is_some() {
      tracing::trace!(
        doc = ?event.doc,
        offset = event.range_offset,
        deleted = %deleted,
        "recorded pending pair deletion"
      );
    }

    if role == Some(PairRole::Open) && self.suppressed.insert(event.doc) {
      Effect {
        replacement: None,
        auto_close:  Some(false),
      }
    } else {
      Effect::default()
    }
  }

  fn on_insertion(
    &mut self,
    event: &ChangeEvent,
    live_text: &Rope,
    pairs: &PairTable,
    typed: char,
  ) -> Effect {
    let auto_close = self.suppressed.remove(&event.doc).then_some(true);
    let skip = Effect {
      replacement: None,
      auto_close,
    };

    let Some(pending) = self.pending.take(event.doc, event.range_offset) else {
      return skip;
    };

    // Retyping the character that was just deleted restores the pair as it
    // was; the buffer must end up identical to before the deletion.
    if typed == pending.deleted {
      return skip;
    }

    // An unconfigured typed character leaves the user's edit alone.
    let Some(replace_with) = pairs.counterpart_of(typed) else {
      return skip;
    };

    // The table may have been reloaded since the deletion was recorded.
    let Some(old_counterpart) = pairs.counterpart_of(pending.deleted) else {
      return skip;
    };

    let located = match pending.direction {
      Direction::ToRight | Direction::ToLeft => {
        // Directional scans run on the shadow, which still contains the
        // deleted character at the edit offset. The deletion and insertion
        // cancel out in length, so shadow offsets map 1:1 onto the live
        // buffer.
        let Ok(shadow) = self.shadows.get(event.doc) else {
          return skip;
        };
        if pending.direction == Direction::ToRight {
          scan::find_close_right(
            shadow.slice(..),
            event.range_offset,
            pending.deleted,
            old_counterpart,
          )
        } else {
          scan::find_open_left(
            shadow.slice(..),
            event.range_offset,
            old_counterpart,
            pending.deleted,
          )
        }
      },
      Direction::Bidirectional => {
        // Symmetric characters resolve against the live line around the
        // edit, with lexical context from the tokenizer.
        if event.range_offset >= live_text.len_chars() {
          return skip;
        }
        let line = live_text.char_to_line(event.range_offset);
        let start = live_text.line_to_char(line);
        let span = live_text.line(line);
        let tokens = self
          .tokenizers
          .get(&event.grammar)
          .tokenize(&span.to_string());
        scan::resolve_symmetric(
          span,
          start,
          event.range_offset,
          pending.deleted,
          typed,
          &tokens,
        )
      },
    };

    let Some(at) = located else {
      tracing::debug!(
        doc = ?event.doc,
        offset = event.range_offset,
        "no counterpart found; leaving the buffer untouched"
      );
      return skip;
    };

    // Never clobber the character the user just typed.
    if at == event.range_offset {
      return skip;
    }

    let expected = match pending.direction {
      Direction::Bidirectional => match live_text.get_char(at) {
        Some(ch) => ch,
        None => return skip,
      },
      _ => old_counterpart,
    };

    Effect {
      replacement: Some(Replacement {
        doc: event.doc,
        offset: at,
        expected,
        with: replace_with,
      }),
      auto_close,
    }
  }

  /// Boundary driver: decide, apply, refresh. Locator misses and apply-time
  /// conflicts degrade to doing nothing; the user's own edit always stands.
  pub fn process(&mut self, host: &mut dyn HostBuffer, event: &ChangeEvent) -> Result<Outcome> {
    let live = host.text(event.doc)?;
    let effect = self.on_edit(event, &live)?;

    let outcome = match effect.replacement {
      None => Outcome::Skipped,
      Some(replacement) => match executor::apply(host, &replacement) {
        Ok(()) => Outcome::Replaced(replacement),
        Err(ExecutorError::EditConflict { offset }) => {
          tracing::debug!(doc = ?event.doc, offset, "replacement dropped after conflict");
          Outcome::Conflicted(replacement)
        },
        Err(ExecutorError::Host(err)) => return Err(err.into()),
      },
    };

    // Insertions schedule a debounced snapshot refresh from the live
    // buffer; deletions must not, so the shadow keeps the pre-deletion
    // text for the retype that may follow.
    if !event.text.is_empty() {
      let current = host.text(event.doc)?;
      self.shadows.refresh(event.doc, current);
    }

    Ok(outcome)
  }

  /// Commit any pending shadow refresh immediately. Tests use this to step
  /// past the debounce window deterministically.
  pub fn flush_shadow(&mut self, doc: DocumentId) -> Result<()> {
    Ok(self.shadows.flush(doc)?)
  }
}
