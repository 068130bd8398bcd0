//! Lexical tokenization seam.
//!
//! The bidirectional counterpart resolution in [`crate::scan`] needs to know
//! where the lexical token containing an edit starts and ends. The tokenizer
//! is treated as a black box behind the [`Tokenize`] trait so a host can plug
//! in a real grammar; [`ScanTokenizer`] is the built-in fallback used when a
//! document's declared language has no registered tokenizer.

use std::{
  collections::HashMap,
  sync::Arc,
};

use crate::{
  Tendril,
  chars::{
    categorize_char,
    char_is_quote,
  },
};

/// One lexical token: a contiguous run of text.
///
/// Concatenating the tokens produced for an input reproduces the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub text: Tendril,
}

impl Token {
  pub fn new(text: impl Into<Tendril>) -> Self {
    Self { text: text.into() }
  }

  pub fn len_chars(&self) -> usize {
    self.text.chars().count()
  }
}

pub trait Tokenize: Send + Sync {
  fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Grammar-id keyed lookup with a default fallback.
pub struct TokenizerRegistry {
  by_grammar: HashMap<Tendril, Arc<dyn Tokenize>>,
  fallback:   Arc<dyn Tokenize>,
}

impl TokenizerRegistry {
  pub fn new() -> Self {
    Self {
      by_grammar: HashMap::new(),
      fallback:   Arc::new(ScanTokenizer),
    }
  }

  pub fn register(&mut self, grammar: impl Into<Tendril>, tokenizer: Arc<dyn Tokenize>) {
    self.by_grammar.insert(grammar.into(), tokenizer);
  }

  /// The tokenizer for `grammar`, or the fallback if none is registered.
  pub fn get(&self, grammar: &str) -> &Arc<dyn Tokenize> {
    self.by_grammar.get(grammar).unwrap_or(&self.fallback)
  }
}

impl Default for TokenizerRegistry {
  fn default() -> Self {
    Self::new()
  }
}

/// Plaintext tokenizer: runs of word, whitespace or punctuation characters.
///
/// A quote character that has a matching quote later in the input starts a
/// delimited token spanning through the match, so symmetric pair context
/// stays visible to the scanner.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanTokenizer;

impl Tokenize for ScanTokenizer {
  fn tokenize(&self, text: &str) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut at = 0;

    while at < chars.len() {
      let ch = chars[at];

      if char_is_quote(ch) {
        if let Some(found) = chars[at + 1..].iter().position(|&c| c == ch) {
          let end = at + 1 + found;
          tokens.push(Token::new(collect(&chars[at..=end])));
          at = end + 1;
          continue;
        }
      }

      let category = categorize_char(ch);
      let mut end = at + 1;
      while end < chars.len() && categorize_char(chars[end]) == category && !char_is_quote(chars[end])
      {
        end += 1;
      }
      tokens.push(Token::new(collect(&chars[at..end])));
      at = end;
    }

    tokens
  }
}

fn collect(chars: &[char]) -> Tendril {
  let mut text = Tendril::new();
  for &ch in chars {
    text.push(ch);
  }
  text
}
