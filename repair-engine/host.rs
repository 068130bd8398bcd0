//! Host buffer seam.
//!
//! The editor hosting the engine owns the real documents. The engine only
//! consumes the narrow [`HostBuffer`] surface plus per-edit [`ChangeEvent`]s,
//! so it can be driven by any host, including the in-memory [`MemoryHost`]
//! the tests use.

use std::{
  collections::HashMap,
  num::NonZeroUsize,
};

use repair_core::Tendril;
use ropey::Rope;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(NonZeroUsize);

impl DocumentId {
  pub const fn new(id: NonZeroUsize) -> Self {
    Self(id)
  }

  pub const fn get(self) -> NonZeroUsize {
    self.0
  }
}

impl From<NonZeroUsize> for DocumentId {
  fn from(value: NonZeroUsize) -> Self {
    Self::new(value)
  }
}

/// One discrete content change, as reported by the host after the edit has
/// been applied to the live buffer. A host event carrying several changes is
/// delivered as several `ChangeEvent`s in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
  pub doc:          DocumentId,
  /// Grammar id of the document's declared language, for tokenizer lookup.
  pub grammar:      Tendril,
  /// Character offset of the change start, in the pre-edit buffer.
  pub range_offset: usize,
  /// Characters removed at `range_offset`.
  pub range_length: usize,
  /// Text inserted at `range_offset`.
  pub text:         Tendril,
}

impl ChangeEvent {
  pub fn is_single_char_deletion(&self) -> bool {
    self.text.is_empty() && self.range_length == 1
  }

  /// The inserted character, when the change inserted exactly one.
  pub fn inserted_char(&self) -> Option<char> {
    let mut chars = self.text.chars();
    match (chars.next(), chars.next()) {
      (Some(ch), None) => Some(ch),
      _ => None,
    }
  }
}

pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum HostError {
  #[error("unknown document {0:?}")]
  UnknownDocument(DocumentId),
  #[error("replace of {len} chars at {offset} is out of bounds for document length {doc_len}")]
  OutOfBounds {
    offset:  usize,
    len:     usize,
    doc_len: usize,
  },
}

/// What the engine asks of the host. `replace` must complete or fail before
/// the edit handler returns; there is no queueing on this side.
pub trait HostBuffer {
  fn text(&self, doc: DocumentId) -> Result<Rope>;

  /// Monotonic per-document revision, bumped on every content mutation.
  fn version(&self, doc: DocumentId) -> Result<u64>;

  /// Replace `len` characters at `offset` with `text`. `coalesce_undo`
  /// requests that this edit be grouped with the user's triggering edit
  /// into a single undo step.
  fn replace(
    &mut self,
    doc: DocumentId,
    offset: usize,
    len: usize,
    text: &str,
    coalesce_undo: bool,
  ) -> Result<()>;
}

#[derive(Debug)]
struct MemoryDoc {
  text:    Rope,
  version: u64,
}

/// In-memory reference host: rope-backed documents and change events shaped
/// like an editor would emit them.
#[derive(Debug, Default)]
pub struct MemoryHost {
  docs: HashMap<DocumentId, MemoryDoc>,
}

impl MemoryHost {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn open(&mut self, doc: DocumentId, text: &str) {
    self.docs.insert(doc, MemoryDoc {
      text:    Rope::from(text),
      version: 0,
    });
  }

  pub fn close(&mut self, doc: DocumentId) {
    self.docs.remove(&doc);
  }

  /// Apply a user edit and produce the change event the host would emit
  /// for it.
  pub fn edit(
    &mut self,
    doc: DocumentId,
    grammar: &str,
    offset: usize,
    len: usize,
    text: &str,
  ) -> Result<ChangeEvent> {
    let entry = self.docs.get_mut(&doc).ok_or(HostError::UnknownDocument(doc))?;
    check_bounds(&entry.text, offset, len)?;

    entry.text.remove(offset..offset + len);
    entry.text.insert(offset, text);
    entry.version = entry.version.saturating_add(1);

    Ok(ChangeEvent {
      doc,
      grammar: Tendril::from(grammar),
      range_offset: offset,
      range_length: len,
      text: Tendril::from(text),
    })
  }
}

impl HostBuffer for MemoryHost {
  fn text(&self, doc: DocumentId) -> Result<Rope> {
    self
      .docs
      .get(&doc)
      .map(|entry| entry.text.clone())
      .ok_or(HostError::UnknownDocument(doc))
  }

  fn version(&self, doc: DocumentId) -> Result<u64> {
    self
      .docs
      .get(&doc)
      .map(|entry| entry.version)
      .ok_or(HostError::UnknownDocument(doc))
  }

  fn replace(
    &mut self,
    doc: DocumentId,
    offset: usize,
    len: usize,
    text: &str,
    _coalesce_undo: bool,
  ) -> Result<()> {
    let entry = self.docs.get_mut(&doc).ok_or(HostError::UnknownDocument(doc))?;
    check_bounds(&entry.text, offset, len)?;

    entry.text.remove(offset..offset + len);
    entry.text.insert(offset, text);
    entry.version = entry.version.saturating_add(1);
    Ok(())
  }
}

fn check_bounds(rope: &Rope, offset: usize, len: usize) -> Result<()> {
  let doc_len = rope.len_chars();
  if offset + len > doc_len {
    return Err(HostError::OutOfBounds {
      offset,
      len,
      doc_len,
    });
  }
  Ok(())
}
