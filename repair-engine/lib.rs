//! Keeps configured punctuation and quote pairs consistent while a buffer is
//! edited: delete one member of a matched pair, retype a different character
//! in the same spot, and the counterpart elsewhere in the buffer is rewritten
//! to match.
//!
//! The stateful side lives here: document shadows, the pending-deletion
//! registry, the host-buffer seam and the [`engine::EditEngine`] coordinator.
//! The pure resolution algorithms live in `repair-core`.

pub mod config;
pub mod engine;
pub mod executor;
pub mod host;
pub mod pending;
pub mod shadow;
