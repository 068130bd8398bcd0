//! Counterpart location within a text span.
//!
//! Three pure resolution algorithms, one per [`crate::pairs::Direction`]:
//!
//! - [`find_close_right`]: the deleted character opened a pair, so its close
//!   lies somewhere to the right. Forward depth scan.
//! - [`find_open_left`]: the deleted character closed a pair, so its open
//!   lies to the left. Left-to-right stack scan over the preceding span.
//! - [`resolve_symmetric`]: the deleted character is symmetric (a quote) and
//!   its role depends on lexical context. Occurrence-list resolution with
//!   token-boundary hints and a parity fallback.
//!
//! All three take a span and an anchor and return `Option<usize>`; none
//! mutate shared state. When a counterpart cannot be determined they return
//! `None`; a wrong guess is never made.

use ropey::RopeSlice;
use smallvec::SmallVec;

use crate::token::Token;

/// Offset of the close character matching the open at `from`.
///
/// Scans rightward keeping a nesting depth: +1 per `open`, -1 per `close`,
/// every other character ignored. The match is the first `close` at which
/// the depth returns to exactly zero, i.e. the innermost pair enclosing the
/// anchor. The span is expected to still contain the deleted open at `from`
/// (it is a pre-edit snapshot).
pub fn find_close_right(text: RopeSlice, from: usize, open: char, close: char) -> Option<usize> {
  if from >= text.len_chars() {
    return None;
  }

  let mut depth: isize = 0;
  for (i, ch) in text.chars_at(from).enumerate() {
    if ch == open {
      depth += 1;
    } else if ch == close {
      depth -= 1;
      if depth == 0 {
        return Some(from + i);
      }
    }
  }

  None
}

/// Offset of the open character matching a close deleted at `upto`.
///
/// Scans `[0, upto)` left to right, pushing the offset of every `open` and
/// popping on every `close`. The match is the last offset still on the
/// stack: the innermost open left unmatched right before the anchor.
pub fn find_open_left(text: RopeSlice, upto: usize, open: char, close: char) -> Option<usize> {
  let upto = upto.min(text.len_chars());
  let mut stack: SmallVec<[usize; 8]> = SmallVec::new();

  for (i, ch) in text.chars().take(upto).enumerate() {
    if ch == open {
      stack.push(i);
    } else if ch == close {
      stack.pop();
    }
  }

  stack.last().copied()
}

/// Where an offset sits within its covering token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundaryHint {
  Start,
  End,
}

/// Offset of the occurrence pairing with the symmetric character retyped at
/// `edit_at` (absolute; `span` starts at `span_start` in the buffer).
///
/// Collects every occurrence of `deleted` or `typed` within the span in
/// document order. The edited occurrence then resolves as:
///
/// - first occurrence pairs with the last, last with the first;
/// - interior occurrences consult the token covering the edit: at a token
///   start the nearest occurrence before the boundary wins, at a token end
///   the first occurrence after it; with no boundary information the parity
///   fallback applies (even 0-based index pairs forward, odd backward).
///
/// A lexically-adjacent boundary answer always beats the parity guess; a
/// disagreement between the two is logged rather than reconciled.
pub fn resolve_symmetric(
  span: RopeSlice,
  span_start: usize,
  edit_at: usize,
  deleted: char,
  typed: char,
  tokens: &[Token],
) -> Option<usize> {
  let rel = edit_at.checked_sub(span_start)?;

  let mut occurrences: SmallVec<[usize; 8]> = SmallVec::new();
  for (i, ch) in span.chars().enumerate() {
    if ch == deleted || ch == typed {
      occurrences.push(i);
    }
  }

  let me = occurrences.iter().position(|&at| at == rel)?;
  if occurrences.len() < 2 {
    return None;
  }
  let last = occurrences.len() - 1;

  let chosen = if me == 0 {
    occurrences[last]
  } else if me == last {
    occurrences[0]
  } else {
    let parity = if me % 2 == 0 {
      occurrences[me + 1]
    } else {
      occurrences[me - 1]
    };

    match boundary_hint(tokens, rel) {
      Some(BoundaryHint::Start) => {
        let adjacent = occurrences[me - 1];
        if adjacent != parity {
          tracing::debug!(
            rel,
            adjacent,
            parity,
            "token boundary and parity disagree; taking the adjacent occurrence"
          );
        }
        adjacent
      },
      Some(BoundaryHint::End) => {
        let adjacent = occurrences[me + 1];
        if adjacent != parity {
          tracing::debug!(
            rel,
            adjacent,
            parity,
            "token boundary and parity disagree; taking the adjacent occurrence"
          );
        }
        adjacent
      },
      None => parity,
    }
  };

  if chosen == rel {
    return None;
  }

  Some(span_start + chosen)
}

/// Classify `rel` against the token covering it: at its first character, at
/// its last, or neither. `None` also when the tokenizer produced nothing or
/// the offset falls past the tokenized text.
fn boundary_hint(tokens: &[Token], rel: usize) -> Option<BoundaryHint> {
  let mut start = 0;
  for token in tokens {
    let end = start + token.len_chars();
    if rel < end {
      if rel == start {
        return Some(BoundaryHint::Start);
      }
      if rel + 1 == end {
        return Some(BoundaryHint::End);
      }
      return None;
    }
    start = end;
  }
  None
}

#[cfg(test)]
mod test {
  use ropey::Rope;
  use quickcheck::quickcheck;

  use super::*;
  use crate::token::{
    ScanTokenizer,
    Tokenize,
  };

  #[test]
  fn close_right_prefers_innermost_enclosing() {
    // Deleting the outer '(' of (a(b)c) must target the outer ')'.
    let text = Rope::from("(a(b)c)");
    assert_eq!(find_close_right(text.slice(..), 0, '(', ')'), Some(6));

    // Deleting the inner '(' targets the inner ')'.
    assert_eq!(find_close_right(text.slice(..), 2, '(', ')'), Some(4));
  }

  #[test]
  fn close_right_ignores_unrelated_text() {
    let text = Rope::from("(foo [bar] baz)");
    assert_eq!(find_close_right(text.slice(..), 0, '(', ')'), Some(14));
  }

  #[test]
  fn close_right_unbalanced_returns_none() {
    let text = Rope::from("(a(b)c");
    assert_eq!(find_close_right(text.slice(..), 0, '(', ')'), None);

    let text = Rope::from("");
    assert_eq!(find_close_right(text.slice(..), 0, '(', ')'), None);
  }

  #[test]
  fn open_left_prefers_innermost_unmatched() {
    // Deleting the inner ')' of (a(b)c) must target the inner '('.
    let text = Rope::from("(a(b)c)");
    assert_eq!(find_open_left(text.slice(..), 4, '(', ')'), Some(2));

    // Deleting the outer ')' targets the outer '('.
    assert_eq!(find_open_left(text.slice(..), 6, '(', ')'), Some(0));
  }

  #[test]
  fn open_left_skips_balanced_siblings() {
    //            0123456789
    let text = Rope::from("((a)b(c)d)");
    assert_eq!(find_open_left(text.slice(..), 9, '(', ')'), Some(0));
  }

  #[test]
  fn open_left_no_unmatched_returns_none() {
    let text = Rope::from("(a)b)");
    assert_eq!(find_open_left(text.slice(..), 4, '(', ')'), None);
    assert_eq!(find_open_left(text.slice(..), 0, '(', ')'), None);
  }

  fn tokens_for(text: &str) -> Vec<Token> {
    ScanTokenizer.tokenize(text)
  }

  #[test]
  fn symmetric_first_pairs_with_last() {
    // "abc" with the first quote retyped as ': occurrences at 0 and 4.
    let line = Rope::from("'abc\"");
    let tokens = tokens_for("'abc\"");
    assert_eq!(
      resolve_symmetric(line.slice(..), 0, 0, '"', '\'', &tokens),
      Some(4)
    );
  }

  #[test]
  fn symmetric_last_pairs_with_first() {
    let line = Rope::from("\"abc'");
    let tokens = tokens_for("\"abc'");
    assert_eq!(
      resolve_symmetric(line.slice(..), 0, 4, '"', '\'', &tokens),
      Some(0)
    );
  }

  #[test]
  fn symmetric_respects_span_start_offset() {
    // Same text, but the span starts at buffer offset 10.
    let line = Rope::from("'abc\"");
    let tokens = tokens_for("'abc\"");
    assert_eq!(
      resolve_symmetric(line.slice(..), 10, 10, '"', '\'', &tokens),
      Some(14)
    );
  }

  #[test]
  fn symmetric_interior_parity_without_tokens() {
    // Four quotes; the occurrence at index 1 (odd) pairs backward, the one
    // at index 2 (even) pairs forward.
    //                     0123456789
    let line = Rope::from("\"a\" x \"b\"");
    assert_eq!(
      resolve_symmetric(line.slice(..), 0, 2, '"', '"', &[]),
      Some(0)
    );
    assert_eq!(
      resolve_symmetric(line.slice(..), 0, 6, '"', '"', &[]),
      Some(8)
    );
  }

  #[test]
  fn symmetric_boundary_beats_parity_when_they_disagree() {
    // Occurrences at 0, 2, 6, 8. The edit at offset 6 is the interior
    // occurrence with even index 2, so parity alone would pair it forward
    // to 8. But it sits at the start of the token "z", so the occurrence
    // just before that boundary, at 2, wins.
    let text = "\"x\"-y-\"z\"";
    let line = Rope::from(text);
    let tokens = vec![
      Token::new("\"x\""),
      Token::new("-y-"),
      Token::new("\"z\""),
    ];
    assert_eq!(
      resolve_symmetric(line.slice(..), 0, 6, '"', '"', &tokens),
      Some(2)
    );
    // Without token information the parity fallback answers forward.
    assert_eq!(
      resolve_symmetric(line.slice(..), 0, 6, '"', '"', &[]),
      Some(8)
    );
  }

  #[test]
  fn symmetric_no_occurrences_returns_none() {
    let line = Rope::from("plain text");
    let tokens = tokens_for("plain text");
    assert_eq!(
      resolve_symmetric(line.slice(..), 0, 3, '"', '\'', &tokens),
      None
    );
  }

  #[test]
  fn symmetric_lone_occurrence_returns_none() {
    let line = Rope::from("a ' b");
    assert_eq!(resolve_symmetric(line.slice(..), 0, 2, '"', '\'', &[]), None);
  }

  #[test]
  fn symmetric_edit_outside_span_returns_none() {
    let line = Rope::from("'a'");
    assert_eq!(resolve_symmetric(line.slice(..), 10, 2, '"', '\'', &[]), None);
  }

  quickcheck! {
    // A forward depth scan and the backward stack scan are duals: if the
    // open at p matches the close at q, then the innermost unmatched open
    // before q is p.
    fn right_and_left_scans_agree(raw: String) -> bool {
      let text: String = raw
        .chars()
        .map(|c| match (c as u32) % 4 {
          0 => '(',
          1 => ')',
          2 => 'a',
          _ => ' ',
        })
        .collect();
      let rope = Rope::from(text.as_str());
      let slice = rope.slice(..);

      for (p, ch) in text.chars().enumerate() {
        if ch != '(' {
          continue;
        }
        if let Some(q) = find_close_right(slice, p, '(', ')') {
          if find_open_left(slice, q, '(', ')') != Some(p) {
            return false;
          }
        }
      }
      true
    }
  }
}
