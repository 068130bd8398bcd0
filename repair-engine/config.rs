//! Pair configuration surface.
//!
//! The host supplies pairs as a TOML table of open-character to
//! close-character strings; a character mapped to itself denotes a symmetric
//! pair. The parsed config validates into an immutable
//! [`repair_core::pairs::PairTable`] which the engine swaps in for
//! subsequent edits.
//!
//! ```toml
//! [pairs]
//! "(" = ")"
//! "<" = ">"
//! "\"" = "\""
//! ```

use std::collections::BTreeMap;

use repair_core::pairs::{
  DEFAULT_PAIRS,
  PairTable,
  PairTableError,
};
use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("failed to parse pairs config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("pair entry '{open}' -> '{close}' must map single characters")]
  NotSingleChar { open: String, close: String },
  #[error(transparent)]
  Table(#[from] PairTableError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairsConfig {
  #[serde(default = "default_pairs_map")]
  pub pairs: BTreeMap<String, String>,
}

impl Default for PairsConfig {
  fn default() -> Self {
    Self {
      pairs: default_pairs_map(),
    }
  }
}

fn default_pairs_map() -> BTreeMap<String, String> {
  DEFAULT_PAIRS
    .iter()
    .map(|&(open, close)| (String::from(open), String::from(close)))
    .collect()
}

impl PairsConfig {
  pub fn from_toml(input: &str) -> Result<Self> {
    Ok(toml::from_str(input)?)
  }

  /// Validate into a pair table. Construction is pure; the caller decides
  /// when to swap the shared instance.
  pub fn pair_table(&self) -> Result<PairTable> {
    let mut pairs = Vec::with_capacity(self.pairs.len());

    for (open, close) in &self.pairs {
      let (Some(open_char), Some(close_char)) = (single_char(open), single_char(close)) else {
        return Err(ConfigError::NotSingleChar {
          open:  open.clone(),
          close: close.clone(),
        });
      };
      pairs.push((open_char, close_char));
    }

    Ok(PairTable::new(pairs)?)
  }
}

fn single_char(s: &str) -> Option<char> {
  let mut chars = s.chars();
  match (chars.next(), chars.next()) {
    (Some(ch), None) => Some(ch),
    _ => None,
  }
}
