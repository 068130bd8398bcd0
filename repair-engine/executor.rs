//! Atomic counterpart replacement.
//!
//! The executor applies exactly one single-character substitution, grouped
//! with the user's triggering edit into one undo step. Before touching the
//! buffer it re-reads the live text and verifies the located character is
//! still in place; if anything moved underneath the locator the edit is
//! dropped and the buffer is left exactly as the user's keystrokes left it.

use thiserror::Error;

use crate::host::{
  DocumentId,
  HostBuffer,
  HostError,
};

/// Description of one replacement to perform: change the character at
/// `offset` (expected to still be `expected`) into `with`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replacement {
  pub doc:      DocumentId,
  pub offset:   usize,
  pub expected: char,
  pub with:     char,
}

pub type Result<T> = std::result::Result<T, ExecutorError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExecutorError {
  #[error("buffer changed between locating and replacing at offset {offset}")]
  EditConflict { offset: usize },
  #[error(transparent)]
  Host(#[from] HostError),
}

pub fn apply(host: &mut dyn HostBuffer, replacement: &Replacement) -> Result<()> {
  let text = host.text(replacement.doc)?;

  match text.get_char(replacement.offset) {
    Some(ch) if ch == replacement.expected => {},
    _ => {
      return Err(ExecutorError::EditConflict {
        offset: replacement.offset,
      });
    },
  }

  let mut buf = [0u8; 4];
  host.replace(
    replacement.doc,
    replacement.offset,
    1,
    replacement.with.encode_utf8(&mut buf),
    true,
  )?;

  tracing::trace!(
    doc = ?replacement.doc,
    offset = replacement.offset,
    from = %replacement.expected,
    to = %replacement.with,
    "replaced counterpart"
  );
  Ok(())
}

#[cfg(test)]
mod test {
  use std::num::NonZeroUsize;

  use super::*;
  use crate::host::MemoryHost;

  fn doc(n: usize) -> DocumentId {
    DocumentId::new(NonZeroUsize::new(n).unwrap())
  }

  #[test]
  fn replaces_expected_character() {
    let mut host = MemoryHost::new();
    host.open(doc(1), "[foo)");

    let replacement = Replacement {
      doc:      doc(1),
      offset:   4,
      expected: ')',
      with:     ']',
    };
    apply(&mut host, &replacement).unwrap();
    assert_eq!(host.text(doc(1)).unwrap().to_string(), "[foo]");
    assert_eq!(host.version(doc(1)).unwrap(), 1);
  }

  #[test]
  fn mismatch_is_a_conflict() {
    let mut host = MemoryHost::new();
    host.open(doc(1), "[foo}");

    let replacement = Replacement {
      doc:      doc(1),
      offset:   4,
      expected: ')',
      with:     ']',
    };
    let err = apply(&mut host, &replacement).unwrap_err();
    assert_eq!(err, ExecutorError::EditConflict { offset: 4 });

    // The buffer is untouched after a dropped edit, and its revision does
    // not advance.
    assert_eq!(host.text(doc(1)).unwrap().to_string(), "[foo}");
    assert_eq!(host.version(doc(1)).unwrap(), 0);
  }

  #[test]
  fn out_of_bounds_is_a_conflict() {
    let mut host = MemoryHost::new();
    host.open(doc(1), "[");

    let replacement = Replacement {
      doc:      doc(1),
      offset:   7,
      expected: ')',
      with:     ']',
    };
    let err = apply(&mut host, &replacement).unwrap_err();
    assert_eq!(err, ExecutorError::EditConflict { offset: 7 });
  }
}
