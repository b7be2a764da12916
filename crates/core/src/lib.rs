//! Core game logic - pure, deterministic, and testable
//!
//! This crate contains every rule of the tile-matching game: dealing the
//! layered board, occlusion, the tray with its match and chain clears, the
//! holding area, the three assist items, and the round state machine. It
//! does no rendering, input or networking, which makes it:
//!
//! - **Deterministic**: the same seed deals the same board and reshuffles
//! - **Headless**: timed phases are explicit and can be completed synchronously
//! - **Testable**: every rule is reachable without a clock or a screen
//!
//! # Module Structure
//!
//! - [`rng`]: seeded RNG and the tile bag
//! - [`catalog`]: ordered tile definitions
//! - [`geometry`] / [`layout`]: footprints, pile grid and jitter
//! - [`board`]: layered tiles and blocked-state computation
//! - [`tray`]: insertion, matching and chain clearing
//! - [`holding`]: parking area filled by the Remove item
//! - [`items`] / [`inventory`]: item gating and claimed uses
//! - [`round`]: one level's board, tray and holding
//! - [`game_state`]: Home/Loading/Playing/Lost driver and timers
//! - [`events`]: subscriber registry for [`CoreEvent`](triple_tray_types::CoreEvent)s
//! - [`store`]: key-value persistence seam
//! - [`cards`]: character card collections and unlocks
//!
//! # Example
//!
//! ```
//! use triple_tray_core::{GameConfig, GameState, TimingConfig};
//! use triple_tray_types::{PlayerAction, RoundPhase};
//!
//! let config = GameConfig {
//!     timing: TimingConfig::instant(),
//!     ..GameConfig::default()
//! };
//! let mut game = GameState::new(config).unwrap();
//! assert!(game.apply_action(PlayerAction::Start));
//! assert_eq!(game.phase(), RoundPhase::Playing);
//!
//! // Pick the first tile nothing covers.
//! let id = game.round().unwrap().board().clickable().next().unwrap().id;
//! assert!(game.apply_action(PlayerAction::Pick(id)));
//! assert_eq!(game.round().unwrap().tray().len(), 1);
//! ```
//!
//! # Timing
//!
//! The game uses a fixed timestep. Call [`GameState::tick`] every frame with
//! the elapsed time (normally [`TICK_MS`](triple_tray_types::TICK_MS)); a
//! matched group stays in the tray for the clear delay plus the shrink time
//! before it is consumed, and the tray rejects tiles until then.

pub mod board;
pub mod cards;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod game_state;
pub mod geometry;
pub mod holding;
pub mod inventory;
pub mod items;
pub mod layout;
pub mod rng;
pub mod round;
pub mod snapshot;
pub mod store;
pub mod tile;
pub mod tray;

pub use triple_tray_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use cards::{CardSet, CharacterDef, CharacterRoster};
pub use catalog::{TileCatalog, TileDefinition};
pub use config::{
    BoardConfig, CharacterConfig, GameConfig, ItemConfig, LevelConfig, TimingConfig, TrayConfig,
};
pub use error::ConfigError;
pub use events::{EventBus, EventSink, SubscriberId, SubscriberScope};
pub use game_state::GameState;
pub use geometry::{Point, Rect};
pub use holding::Holding;
pub use inventory::{Inventory, ItemSlot};
pub use items::{ItemRules, ItemTargets};
pub use rng::{SimpleRng, TileBag};
pub use round::Round;
pub use snapshot::{GameSnapshot, ItemSnapshot, SlotSnapshot, TileSnapshot};
pub use store::{KeyValueStore, MemoryStore};
pub use tile::{OriginRecord, Tile};
pub use tray::{Tray, TrayPhase};
