//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are plain data with no external dependencies, making them usable
//! in any context (core rules, headless autoplay, the AI control protocol).
//!
//! # Round Shape
//!
//! A default round deals 14 tile types, 3 triples each (9 tiles per type,
//! 126 tiles in total) across 6 stacking layers. The tray holds 7 tiles and
//! three of a kind are consumed.
//!
//! # Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Fixed timestep interval (~60 FPS) |
//! | `CLEAR_DELAY_MS` | 1000 | Grace period before a matched triple is consumed |
//! | `SHRINK_MS` | 250 | Shrink animation of consumed tiles |
//! | `SHUFFLE_MS` | 400 | Gather/spread animation of a board reshuffle |
//! | `LOADING_MS` | 150 | Loading screen hold before play starts |
//! | `WIN_NEXT_DELAY_MS` | 250 | Pause between a win and loading the next level |
//!
//! # Examples
//!
//! ```
//! use triple_tray_types::{ItemKind, PlayerAction, TileId, DEFAULT_SLOT_COUNT};
//!
//! let action = PlayerAction::from_str("pick:12").unwrap();
//! assert_eq!(action, PlayerAction::Pick(TileId(12)));
//!
//! let item = ItemKind::from_str("undo").unwrap();
//! assert_eq!(item, ItemKind::Undo);
//! assert_eq!(PlayerAction::UseItem(item).to_string(), "undo");
//!
//! assert_eq!(DEFAULT_SLOT_COUNT, 7);
//! ```

use std::fmt;

/// Tray capacity used when nothing else is configured
pub const DEFAULT_SLOT_COUNT: usize = 7;

/// Number of identical tiles consumed by one match
pub const DEFAULT_MATCH_COUNT: usize = 3;

/// Number of matchable groups dealt per tile type
pub const DEFAULT_TRIPLES_PER_TYPE: usize = 3;

/// Hard upper bound on tray capacity (fixed-capacity storage)
pub const MAX_TRAY_SLOTS: usize = 16;

/// Hard upper bound on holding capacity (fixed-capacity storage)
pub const MAX_HOLDING_SLOTS: usize = 8;

/// Holding capacity used when nothing else is configured
pub const DEFAULT_HOLDING_SLOTS: usize = 3;

/// Tiles moved from the tray front into holding by one Remove
pub const DEFAULT_REMOVE_MOVE_COUNT: usize = 3;

/// Tiles returned to the board by one Undo
pub const DEFAULT_UNDO_COUNT: usize = 1;

/// Stacking layers (0 = back)
pub const DEFAULT_LAYER_COUNT: u8 = 6;

/// Preferred number of pile columns; rows grow to fit
pub const DEFAULT_PREFERRED_COLS: usize = 5;

/// Distance between neighbouring pile centers
pub const DEFAULT_PILE_SPACING: f32 = 100.0;

/// Edge length of a square tile footprint
pub const DEFAULT_TILE_SIZE: f32 = 88.0;

/// Maximum per-layer offset applied to a pile position
pub const DEFAULT_LAYER_JITTER: f32 = 4.0;

/// Fixed timestep interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Grace period before matched tiles are consumed
pub const CLEAR_DELAY_MS: u32 = 1000;

/// Shrink animation length for consumed tiles
pub const SHRINK_MS: u32 = 250;

/// Reshuffle gather/spread animation length
pub const SHUFFLE_MS: u32 = 400;

/// Loading screen hold before a level becomes playable
pub const LOADING_MS: u32 = 150;

/// Pause between a win and loading the next level
pub const WIN_NEXT_DELAY_MS: u32 = 250;

/// Interned tile type (index into the tile catalog)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileTypeId(pub u16);

/// Stable identity of one tile instance within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId(pub u32);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three consumable assist items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Move the front tiles of the tray into holding
    Remove,
    /// Return the last tray tile to its board origin
    Undo,
    /// Redistribute every board tile
    Shuffle,
}

impl ItemKind {
    /// All items in display order
    pub const ALL: [ItemKind; 3] = [ItemKind::Remove, ItemKind::Undo, ItemKind::Shuffle];

    /// Parse item kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use triple_tray_types::ItemKind;
    ///
    /// assert_eq!(ItemKind::from_str("Remove"), Some(ItemKind::Remove));
    /// assert_eq!(ItemKind::from_str("shuffle"), Some(ItemKind::Shuffle));
    /// assert_eq!(ItemKind::from_str("hammer"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "remove" => Some(ItemKind::Remove),
            "undo" => Some(ItemKind::Undo),
            "shuffle" => Some(ItemKind::Shuffle),
            _ => None,
        }
    }

    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Remove => "remove",
            ItemKind::Undo => "undo",
            ItemKind::Shuffle => "shuffle",
        }
    }
}

/// Top-level round state
///
/// - **Home**: no round exists
/// - **Loading**: a round is being built (or waiting for its loading hold)
/// - **Playing**: the player may act
/// - **Lost**: the tray filled up with no match; retry or go home
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundPhase {
    Home,
    Loading,
    Playing,
    Lost,
}

impl RoundPhase {
    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundPhase::Home => "home",
            RoundPhase::Loading => "loading",
            RoundPhase::Playing => "playing",
            RoundPhase::Lost => "lost",
        }
    }
}

/// Player (or agent) intents applied to the game
///
/// These actions are used by the autoplayer and the AI protocol alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    /// Leave Home and load the current level
    Start,
    /// Send an unblocked board tile to the tray
    Pick(TileId),
    /// Send a holding tile back to the tray
    Release(TileId),
    /// Use one of the assist items
    UseItem(ItemKind),
    /// Claim one use of an item (unlocks it)
    ClaimItem(ItemKind),
    /// Reload the current level after a loss
    Retry,
    /// Abandon the round and return home
    Home,
    /// Complete every pending animation phase immediately
    Settle,
}

impl PlayerAction {
    /// Parse action from string (for the AI protocol)
    ///
    /// Tile-targeted actions carry the tile id after a colon.
    ///
    /// # Examples
    ///
    /// ```
    /// use triple_tray_types::{ItemKind, PlayerAction, TileId};
    ///
    /// assert_eq!(PlayerAction::from_str("pick:4"), Some(PlayerAction::Pick(TileId(4))));
    /// assert_eq!(PlayerAction::from_str("release:9"), Some(PlayerAction::Release(TileId(9))));
    /// assert_eq!(PlayerAction::from_str("UNDO"), Some(PlayerAction::UseItem(ItemKind::Undo)));
    /// assert_eq!(PlayerAction::from_str("claim:remove"), Some(PlayerAction::ClaimItem(ItemKind::Remove)));
    /// assert_eq!(PlayerAction::from_str("pick:x"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        if let Some((verb, arg)) = lower.split_once(':') {
            return match verb {
                "pick" => arg.parse().ok().map(|id| PlayerAction::Pick(TileId(id))),
                "release" => arg.parse().ok().map(|id| PlayerAction::Release(TileId(id))),
                "claim" => ItemKind::from_str(arg).map(PlayerAction::ClaimItem),
                _ => None,
            };
        }
        match lower.as_str() {
            "start" => Some(PlayerAction::Start),
            "retry" => Some(PlayerAction::Retry),
            "home" => Some(PlayerAction::Home),
            "settle" => Some(PlayerAction::Settle),
            other => ItemKind::from_str(other).map(PlayerAction::UseItem),
        }
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerAction::Start => f.write_str("start"),
            PlayerAction::Pick(id) => write!(f, "pick:{}", id),
            PlayerAction::Release(id) => write!(f, "release:{}", id),
            PlayerAction::UseItem(kind) => f.write_str(kind.as_str()),
            PlayerAction::ClaimItem(kind) => write!(f, "claim:{}", kind.as_str()),
            PlayerAction::Retry => f.write_str("retry"),
            PlayerAction::Home => f.write_str("home"),
            PlayerAction::Settle => f.write_str("settle"),
        }
    }
}

/// Change notifications emitted by the core
///
/// Presentation and mission subscribers observe these; none of them can push
/// back on the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreEvent {
    /// A tile left or joined the board, or the board was reshuffled
    BoardChanged,
    /// Tray contents or order changed
    TrayChanged,
    /// Holding contents changed
    HoldingChanged,
    /// Tray reached capacity while idle
    TrayFull,
    /// Matched tiles were consumed
    TilesCleared { count: u32 },
    /// An item executed and consumed a use
    ItemUsed { kind: ItemKind },
    /// Round phase transition
    PhaseChanged { from: RoundPhase, to: RoundPhase },
    /// Board, tray and holding all emptied
    RoundWon { level: u32 },
    /// Tray full with no possible match
    RoundLost { level: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_is_evenly_clearable() {
        let per_type = DEFAULT_TRIPLES_PER_TYPE * DEFAULT_MATCH_COUNT;
        assert_eq!(per_type % DEFAULT_MATCH_COUNT, 0);
        assert!(DEFAULT_SLOT_COUNT <= MAX_TRAY_SLOTS);
        assert!(DEFAULT_HOLDING_SLOTS <= MAX_HOLDING_SLOTS);
    }

    #[test]
    fn test_tile_footprint_fits_pile_spacing() {
        // Neighbouring piles must not overlap even with opposite jitter.
        assert!(DEFAULT_TILE_SIZE + 2.0 * DEFAULT_LAYER_JITTER < DEFAULT_PILE_SPACING);
    }

    #[test]
    fn test_player_action_display_roundtrip() {
        let actions = [
            PlayerAction::Start,
            PlayerAction::Pick(TileId(17)),
            PlayerAction::Release(TileId(2)),
            PlayerAction::UseItem(ItemKind::Shuffle),
            PlayerAction::ClaimItem(ItemKind::Undo),
            PlayerAction::Retry,
            PlayerAction::Home,
            PlayerAction::Settle,
        ];
        for action in actions {
            assert_eq!(PlayerAction::from_str(&action.to_string()), Some(action));
        }
    }

    #[test]
    fn test_player_action_rejects_garbage() {
        assert_eq!(PlayerAction::from_str(""), None);
        assert_eq!(PlayerAction::from_str("pick"), None);
        assert_eq!(PlayerAction::from_str("pick:-1"), None);
        assert_eq!(PlayerAction::from_str("fly:3"), None);
    }
}
