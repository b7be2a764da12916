//! Configuration - round shape, tray rules, item tuning and timing
//!
//! Values come from three layers, each overriding the last:
//!
//! 1. [`GameConfig::default`]
//! 2. A JSON file named by `TRIPLE_TRAY_CONFIG` (partial files are fine)
//! 3. Environment overrides (`TRIPLE_TRAY_SEED`, `TRIPLE_TRAY_SLOTS`,
//!    `TRIPLE_TRAY_MATCH`, `TRIPLE_TRAY_SMART_INSERT`,
//!    `TRIPLE_TRAY_CLEAR_DELAY_MS`)

use serde::Deserialize;

use crate::cards::CharacterDef;
use crate::catalog::TileCatalog;
use crate::error::ConfigError;
use triple_tray_types::*;

/// Tray and holding rules
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrayConfig {
    pub slot_count: usize,
    pub match_count: usize,
    /// Insert after the last tile of the same type instead of appending
    pub smart_insert: bool,
    pub holding_slots: usize,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            match_count: DEFAULT_MATCH_COUNT,
            smart_insert: true,
            holding_slots: DEFAULT_HOLDING_SLOTS,
        }
    }
}

/// Pile layout geometry
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub preferred_cols: usize,
    pub pile_spacing: f32,
    pub tile_size: f32,
    pub layer_jitter: f32,
    pub center_x: f32,
    pub center_y: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            preferred_cols: DEFAULT_PREFERRED_COLS,
            pile_spacing: DEFAULT_PILE_SPACING,
            tile_size: DEFAULT_TILE_SIZE,
            layer_jitter: DEFAULT_LAYER_JITTER,
            center_x: 0.0,
            center_y: 0.0,
        }
    }
}

impl BoardConfig {
    /// Neighbouring piles stay apart even when both tiles jitter toward each other
    pub fn keeps_piles_apart(&self) -> bool {
        let reach = self.tile_size + 2.0 * self.layer_jitter.abs();
        self.tile_size > 0.0 && self.pile_spacing > reach
    }
}

/// Item tuning
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ItemConfig {
    pub remove_move_count: usize,
    pub undo_count: usize,
    /// Uses granted to every claimed item when a level loads
    pub default_uses: u32,
    /// Treat every item as claimed from the start
    pub start_claimed: bool,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            remove_move_count: DEFAULT_REMOVE_MOVE_COUNT,
            undo_count: DEFAULT_UNDO_COUNT,
            default_uses: 1,
            start_claimed: false,
        }
    }
}

/// Durations of the timed phases, in milliseconds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub clear_delay_ms: u32,
    pub shrink_ms: u32,
    pub shuffle_ms: u32,
    pub loading_ms: u32,
    pub win_next_delay_ms: u32,
}

impl TimingConfig {
    /// Total time a matched group stays in the tray
    pub fn clear_total_ms(&self) -> u32 {
        self.clear_delay_ms.saturating_add(self.shrink_ms)
    }

    /// Every phase completes on the next tick
    pub fn instant() -> Self {
        Self {
            clear_delay_ms: 0,
            shrink_ms: 0,
            shuffle_ms: 0,
            loading_ms: 0,
            win_next_delay_ms: 0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            clear_delay_ms: CLEAR_DELAY_MS,
            shrink_ms: SHRINK_MS,
            shuffle_ms: SHUFFLE_MS,
            loading_ms: LOADING_MS,
            win_next_delay_ms: WIN_NEXT_DELAY_MS,
        }
    }
}

/// Shape of one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub type_count: usize,
    pub layer_count: u8,
    pub triples_per_type: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            type_count: 14,
            layer_count: DEFAULT_LAYER_COUNT,
            triples_per_type: DEFAULT_TRIPLES_PER_TYPE,
        }
    }
}

/// Playable characters and their card rewards
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub roster: Vec<CharacterDef>,
    /// Always unlocked, and active until another is chosen
    pub default_index: usize,
    /// Random cards granted to the active character per level won
    pub cards_per_win: usize,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            roster: vec![
                CharacterDef::new("fox", 9),
                CharacterDef::new("owl", 9),
                CharacterDef::new("cat", 9),
            ],
            default_index: 0,
            cards_per_win: 1,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub seed: u32,
    pub tray: TrayConfig,
    pub board: BoardConfig,
    pub items: ItemConfig,
    pub timing: TimingConfig,
    pub characters: CharacterConfig,
    /// Played in order; winning the last level wraps to the first
    pub levels: Vec<LevelConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            tray: TrayConfig::default(),
            board: BoardConfig::default(),
            items: ItemConfig::default(),
            timing: TimingConfig::default(),
            characters: CharacterConfig::default(),
            levels: vec![
                LevelConfig {
                    type_count: 6,
                    layer_count: 3,
                    triples_per_type: 1,
                },
                LevelConfig {
                    type_count: 10,
                    layer_count: 4,
                    triples_per_type: 2,
                },
                LevelConfig::default(),
            ],
        }
    }
}

impl GameConfig {
    /// Load defaults, the optional JSON file and environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("TRIPLE_TRAY_CONFIG") {
            Ok(path) if !path.trim().is_empty() => {
                let text = std::fs::read_to_string(path.trim())?;
                Self::from_json(&text)?
            }
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a (possibly partial) JSON config
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Apply overrides from a key lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TRIPLE_TRAY_SEED") {
            self.seed = parse_value("TRIPLE_TRAY_SEED", &v)?;
        }
        if let Some(v) = lookup("TRIPLE_TRAY_SLOTS") {
            self.tray.slot_count = parse_value("TRIPLE_TRAY_SLOTS", &v)?;
        }
        if let Some(v) = lookup("TRIPLE_TRAY_MATCH") {
            self.tray.match_count = parse_value("TRIPLE_TRAY_MATCH", &v)?;
        }
        if let Some(v) = lookup("TRIPLE_TRAY_SMART_INSERT") {
            self.tray.smart_insert = match v.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(ConfigError::Parse(format!(
                        "TRIPLE_TRAY_SMART_INSERT: expected a boolean, got {:?}",
                        other
                    )))
                }
            };
        }
        if let Some(v) = lookup("TRIPLE_TRAY_CLEAR_DELAY_MS") {
            self.timing.clear_delay_ms = parse_value("TRIPLE_TRAY_CLEAR_DELAY_MS", &v)?;
        }
        Ok(())
    }

    /// Check structural limits that do not depend on the catalog
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tray = &self.tray;
        if tray.slot_count == 0 {
            return Err(ConfigError::ZeroSlots);
        }
        if tray.slot_count > MAX_TRAY_SLOTS {
            return Err(ConfigError::TooManySlots(tray.slot_count));
        }
        if tray.match_count == 0 {
            return Err(ConfigError::ZeroMultiplicity);
        }
        if tray.match_count > tray.slot_count {
            return Err(ConfigError::MatchCountTooLarge {
                match_count: tray.match_count,
                slot_count: tray.slot_count,
            });
        }
        if tray.holding_slots > MAX_HOLDING_SLOTS {
            return Err(ConfigError::HoldingTooLarge(tray.holding_slots));
        }
        if !self.board.keeps_piles_apart() {
            return Err(ConfigError::PilesOverlap);
        }
        if self.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        for level in &self.levels {
            if level.type_count == 0 {
                return Err(ConfigError::EmptyCatalog);
            }
            if level.layer_count == 0 {
                return Err(ConfigError::ZeroLayers);
            }
            if level.triples_per_type == 0 {
                return Err(ConfigError::ZeroMultiplicity);
            }
        }
        Ok(())
    }

    /// Check that every level can be dealt from `catalog`
    pub fn validate_catalog(&self, catalog: &TileCatalog) -> Result<(), ConfigError> {
        if catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        for level in &self.levels {
            if level.type_count > catalog.len() {
                return Err(ConfigError::NotEnoughTypes {
                    needed: level.type_count,
                    available: catalog.len(),
                });
            }
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Parse(format!("{}: invalid value {:?}", key, value)))
}
