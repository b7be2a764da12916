//! Engine crate - play helpers on top of the core rules
//!
//! - [`hint`]: scores every tile that could go to the tray and suggests one
//! - [`autoplay`]: drives a [`GameState`](triple_tray_core::GameState)
//!   headlessly, using items before the tray fills without a match
//!
//! Nothing here bypasses the core: every move goes through the same
//! operations a player or AI client would call.

pub mod autoplay;
pub mod hint;

pub use autoplay::{AutoplayConfig, AutoplayOutcome, Autoplayer};
pub use hint::{enumerate_candidates, suggest, Hint, HintSource};
