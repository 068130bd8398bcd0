//! Configured character pairs and their directional roles.
//!
//! A [`PairTable`] classifies every configured character as [`PairRole::Open`],
//! [`PairRole::Close`] or [`PairRole::Symmetric`] and maps it to its
//! counterpart. The table is built once from an `(open, close)` listing and is
//! immutable afterwards; a configuration reload builds a fresh table and swaps
//! it in for subsequent edits.
//!
//! Invariants enforced at build time:
//!
//! - every configured character has exactly one role;
//! - open and close characters are disjoint and form a bijection;
//! - symmetric characters (open == close) map to themselves.

use std::collections::HashMap;

use thiserror::Error;

pub const DEFAULT_PAIRS: &[(char, char)] = &[
  ('(', ')'),
  ('{', '}'),
  ('[', ']'),
  ('\'', '\''),
  ('"', '"'),
  ('`', '`'),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRole {
  Open,
  Close,
  Symmetric,
}

/// Which way the counterpart of a deleted character lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  ToRight,
  ToLeft,
  Bidirectional,
}

impl From<PairRole> for Direction {
  fn from(role: PairRole) -> Self {
    match role {
      PairRole::Open => Direction::ToRight,
      PairRole::Close => Direction::ToLeft,
      PairRole::Symmetric => Direction::Bidirectional,
    }
  }
}

pub type Result<T> = std::result::Result<T, PairTableError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PairTableError {
  #[error("character '{0}' is configured with more than one role")]
  ConflictingRole(char),
  #[error("character '{0}' is configured with more than one counterpart")]
  ConflictingCounterpart(char),
}

#[derive(Debug, Clone)]
pub struct PairTable {
  roles:        HashMap<char, PairRole>,
  counterparts: HashMap<char, char>,
}

impl PairTable {
  /// Build a table from `(open, close)` pairs. An entry whose sides are
  /// equal configures a symmetric character.
  pub fn new<I>(pairs: I) -> Result<Self>
  where
    I: IntoIterator<Item = (char, char)>,
  {
    let mut table = Self {
      roles:        HashMap::new(),
      counterparts: HashMap::new(),
    };

    for (open, close) in pairs {
      if open == close {
        table.insert(open, PairRole::Symmetric, open)?;
      } else {
        table.insert(open, PairRole::Open, close)?;
        table.insert(close, PairRole::Close, open)?;
      }
    }

    Ok(table)
  }

  fn insert(&mut self, ch: char, role: PairRole, counterpart: char) -> Result<()> {
    if self.roles.get(&ch).is_some_and(|&prev| prev != role) {
      return Err(PairTableError::ConflictingRole(ch));
    }
    if self.counterparts.get(&ch).is_some_and(|&prev| prev != counterpart) {
      return Err(PairTableError::ConflictingCounterpart(ch));
    }
    self.set(ch, role, counterpart);
    Ok(())
  }

  fn set(&mut self, ch: char, role: PairRole, counterpart: char) {
    self.roles.insert(ch, role);
    self.counterparts.insert(ch, counterpart);
  }

  pub fn role_of(&self, ch: char) -> Option<PairRole> {
    self.roles.get(&ch).copied()
  }

  pub fn counterpart_of(&self, ch: char) -> Option<char> {
    self.counterparts.get(&ch).copied()
  }

  pub fn direction_of(&self, ch: char) -> Option<Direction> {
    self.role_of(ch).map(Direction::from)
  }

  pub fn len(&self) -> usize {
    self.roles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.roles.is_empty()
  }
}

impl Default for PairTable {
  /// The built-in pairs. `DEFAULT_PAIRS` never maps a character twice, so
  /// the unchecked inserts cannot disagree with the checked construction.
  fn default() -> Self {
    let mut table = Self {
      roles:        HashMap::new(),
      counterparts: HashMap::new(),
    };

    for &(open, close) in DEFAULT_PAIRS {
      if open == close {
        table.set(open, PairRole::Symmetric, open);
      } else {
        table.set(open, PairRole::Open, close);
        table.set(close, PairRole::Close, open);
      }
    }

    table
  }
}
