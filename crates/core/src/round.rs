//! Round module - one level's board, tray and holding
//!
//! A [`Round`] is built fresh for every level load and owns every tile of
//! that level. All tile movement goes through its operations, which keep the
//! one-container-per-tile invariant and queue [`CoreEvent`]s for the owner to
//! drain.

use crate::board::Board;
use crate::catalog::TileCatalog;
use crate::config::{GameConfig, LevelConfig};
use crate::error::ConfigError;
use crate::holding::Holding;
use crate::inventory::Inventory;
use crate::items::{ItemRules, ItemTargets};
use crate::rng::{SimpleRng, TileBag};
use crate::tray::Tray;
use triple_tray_types::{CoreEvent, ItemKind, TileId};

#[derive(Debug, Clone)]
pub struct Round {
    level: u32,
    seed: u32,
    board: Board,
    tray: Tray,
    holding: Holding,
    items: ItemRules,
    rng: SimpleRng,
    events: Vec<CoreEvent>,
}

impl Round {
    /// Build a round for `level` from `seed`
    ///
    /// Either the whole board is dealt or an error is returned; there is no
    /// partially built round.
    pub fn build(
        level: u32,
        level_config: &LevelConfig,
        config: &GameConfig,
        catalog: &TileCatalog,
        seed: u32,
    ) -> Result<Self, ConfigError> {
        if config.tray.slot_count == 0 {
            return Err(ConfigError::ZeroSlots);
        }
        let mut rng = SimpleRng::new(seed);
        let types = catalog.types(level_config.type_count)?;
        let mut bag = TileBag::build(
            &types,
            level_config.triples_per_type,
            config.tray.match_count,
            &mut rng,
        )?;
        let board = Board::build(&mut bag, level_config.layer_count, &config.board, &mut rng)?;

        Ok(Self {
            level,
            seed,
            board,
            tray: Tray::new(&config.tray, config.timing.clear_total_ms()),
            holding: Holding::new(config.tray.holding_slots),
            items: ItemRules::new(&config.items, config.timing.shuffle_ms),
            rng,
            events: Vec::new(),
        })
    }

    /// Assemble a round from prepared parts (custom layouts, tests)
    pub fn from_parts(
        level: u32,
        seed: u32,
        board: Board,
        tray: Tray,
        holding: Holding,
        items: ItemRules,
    ) -> Self {
        Self {
            level,
            seed,
            board,
            tray,
            holding,
            items,
            rng: SimpleRng::new(seed),
            events: Vec::new(),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn tray(&self) -> &Tray {
        &self.tray
    }

    pub fn holding(&self) -> &Holding {
        &self.holding
    }

    pub fn items(&self) -> &ItemRules {
        &self.items
    }

    /// Total tiles still in play anywhere
    pub fn tiles_remaining(&self) -> usize {
        self.board.len() + self.tray.len() + self.holding.len()
    }

    /// Whether a board tile click would be accepted
    pub fn can_pick(&self, id: TileId) -> bool {
        self.board.is_clickable(id) && self.tray.can_accept()
    }

    /// Send a board tile to the tray
    pub fn pick(&mut self, id: TileId) -> bool {
        if !self.can_pick(id) {
            return false;
        }
        let Some(tile) = self.board.remove(id) else {
            return false;
        };
        if let Err(tile) = self.tray.try_insert(tile) {
            log::error!("tray refused tile {} after accept check", tile.id);
            if self.board.add(tile).is_err() {
                log::error!("tile {} lost returning to the board", id);
            }
            return false;
        }
        self.events.push(CoreEvent::BoardChanged);
        self.after_tray_insert();
        true
    }

    /// Send a holding tile back to the tray
    pub fn release(&mut self, id: TileId) -> bool {
        if !self.tray.can_accept() {
            return false;
        }
        let Some((index, tile)) = self.holding.take(id) else {
            return false;
        };
        if let Err(tile) = self.tray.try_insert(tile) {
            if self.holding.reinsert(index, tile).is_err() {
                log::error!("tile {} lost returning to holding", id);
            }
            return false;
        }
        self.events.push(CoreEvent::HoldingChanged);
        self.after_tray_insert();
        true
    }

    fn after_tray_insert(&mut self) {
        self.events.push(CoreEvent::TrayChanged);
        if self.tray.is_full() && !self.tray.is_busy() {
            self.events.push(CoreEvent::TrayFull);
        }
    }

    pub fn can_use_item(&self, kind: ItemKind, inventory: &Inventory) -> bool {
        self.items
            .can_use(kind, inventory, &self.board, &self.tray, &self.holding)
    }

    /// Use an item against this round
    pub fn use_item(&mut self, kind: ItemKind, inventory: &mut Inventory) -> bool {
        let targets = ItemTargets {
            board: &mut self.board,
            tray: &mut self.tray,
            holding: &mut self.holding,
            rng: &mut self.rng,
        };
        if !self.items.use_item(kind, inventory, targets) {
            return false;
        }
        self.events.push(CoreEvent::ItemUsed { kind });
        match kind {
            ItemKind::Remove => {
                self.events.push(CoreEvent::TrayChanged);
                self.events.push(CoreEvent::HoldingChanged);
            }
            ItemKind::Undo => {
                self.events.push(CoreEvent::TrayChanged);
                self.events.push(CoreEvent::BoardChanged);
            }
            ItemKind::Shuffle => self.events.push(CoreEvent::BoardChanged),
        }
        true
    }

    /// Tray clear or board reshuffle in flight
    pub fn is_busy(&self) -> bool {
        self.tray.is_busy() || self.board.is_shuffling()
    }

    /// Board, tray and holding are all empty
    pub fn is_won(&self) -> bool {
        self.board.is_empty() && self.tray.is_empty() && self.holding.is_empty()
    }

    /// Tray full, nothing in it can match, and no clear is pending
    pub fn is_lost(&self) -> bool {
        self.tray.is_full() && !self.tray.has_any_match_possible() && !self.tray.is_busy()
    }

    /// Advance timed phases; true when something completed
    pub fn advance(&mut self, elapsed_ms: u32) -> bool {
        let mut changed = false;
        if let Some(count) = self.tray.advance(elapsed_ms) {
            self.on_cleared(count);
            changed = true;
        }
        if self.board.advance(elapsed_ms) {
            self.events.push(CoreEvent::BoardChanged);
            changed = true;
        }
        changed
    }

    /// Complete every pending phase, including chain clears
    pub fn settle(&mut self) -> bool {
        let mut changed = false;
        while let Some(count) = self.tray.complete_clear() {
            self.on_cleared(count);
            changed = true;
        }
        if self.board.complete_reshuffle() {
            self.events.push(CoreEvent::BoardChanged);
            changed = true;
        }
        changed
    }

    fn on_cleared(&mut self, count: u32) {
        self.events.push(CoreEvent::TilesCleared { count });
        self.events.push(CoreEvent::TrayChanged);
    }

    pub fn take_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }
}
