//! Game state module - round lifecycle, win/lose evaluation and timing
//!
//! [`GameState`] drives the round state machine:
//!
//! ```text
//! Home --start--> Loading --level_ready--> Playing
//! Playing --board, tray and holding empty--> Loading (next level)
//! Playing --tray full, no match, not busy--> Lost
//! Lost --retry--> Loading
//! Lost/Playing --home--> Home
//! ```
//!
//! While a transition is underway (loading, or the pause after a win) the
//! `transitioning` guard rejects every outward transition and every player
//! move. Re-entrant requests are dropped, not queued.
//!
//! Timed phases (loading hold, win pause, tray clears, reshuffles) advance
//! through [`GameState::tick`]; headless callers can use
//! [`GameState::settle`] to complete them all synchronously.

use std::collections::VecDeque;
use std::fmt;

use crate::cards::{CardSet, CharacterDef, CharacterRoster};
use crate::catalog::TileCatalog;
use crate::config::GameConfig;
use crate::error::ConfigError;
use crate::events::{EventBus, EventSink, SubscriberId, SubscriberScope};
use crate::inventory::Inventory;
use crate::rng::{derive_seed, SimpleRng};
use crate::round::Round;
use crate::snapshot::{GameSnapshot, ItemSnapshot, SlotSnapshot, TileSnapshot};
use crate::store::{KeyValueStore, MemoryStore};
use triple_tray_types::*;

/// Events kept for `take_events` when nobody drains them
const MAX_PENDING_EVENTS: usize = 1024;

/// Upper bound on phase completions performed by one `settle` call
const MAX_SETTLE_STEPS: usize = 16;

pub struct GameState {
    config: GameConfig,
    catalog: TileCatalog,
    inventory: Inventory,
    store: Box<dyn KeyValueStore>,
    roster: CharacterRoster,
    card_rng: SimpleRng,
    phase: RoundPhase,
    transitioning: bool,
    level_index: usize,
    levels_won: u32,
    round_seed: u32,
    round: Option<Round>,
    bus: EventBus,
    pending: VecDeque<CoreEvent>,
    loading_timer_ms: u32,
    win_timer_ms: Option<u32>,
    last_error: Option<ConfigError>,
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("phase", &self.phase)
            .field("transitioning", &self.transitioning)
            .field("level_index", &self.level_index)
            .field("levels_won", &self.levels_won)
            .field("round_seed", &self.round_seed)
            .field("round", &self.round)
            .field("inventory", &self.inventory)
            .finish_non_exhaustive()
    }
}

impl GameState {
    /// Create a new game with the built-in catalog and an in-memory store
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_parts(config, TileCatalog::builtin(), Box::new(MemoryStore::new()))
    }

    /// Create a new game from explicit collaborators
    ///
    /// The inventory and character progress are loaded from `store`.
    pub fn with_parts(
        config: GameConfig,
        catalog: TileCatalog,
        mut store: Box<dyn KeyValueStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        config.validate_catalog(&catalog)?;

        let mut inventory = Inventory::new(&config.items);
        inventory.load(store.as_ref());
        let round_seed = config.seed;

        let roster = CharacterRoster::new(
            config.characters.roster.clone(),
            config.characters.default_index,
        );
        roster.ensure_default_unlocked(store.as_mut());
        let card_rng = SimpleRng::new(derive_seed(config.seed, u32::MAX));

        Ok(Self {
            config,
            catalog,
            inventory,
            store,
            roster,
            card_rng,
            phase: RoundPhase::Home,
            transitioning: false,
            level_index: 0,
            levels_won: 0,
            round_seed,
            round: None,
            bus: EventBus::new(),
            pending: VecDeque::new(),
            loading_timer_ms: 0,
            win_timer_ms: None,
            last_error: None,
        })
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Zero-based index of the current level
    pub fn level(&self) -> u32 {
        self.level_index as u32
    }

    pub fn levels_won(&self) -> u32 {
        self.levels_won
    }

    /// Seed of the current (or next) round
    pub fn seed(&self) -> u32 {
        self.round_seed
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn roster(&self) -> &CharacterRoster {
        &self.roster
    }

    pub fn active_character(&self) -> Option<&CharacterDef> {
        self.roster.active(self.store.as_ref())
    }

    pub fn character_cards(&self, id: &str) -> CardSet {
        self.roster.cards(self.store.as_ref(), id)
    }

    pub fn is_character_unlocked(&self, id: &str) -> bool {
        self.roster.is_unlocked(self.store.as_ref(), id)
    }

    /// Grant up to `count` random missing cards; returns how many were added
    pub fn add_character_cards(&mut self, id: &str, count: usize) -> usize {
        self.roster
            .add_random_cards(self.store.as_mut(), id, count, &mut self.card_rng)
    }

    pub fn unlock_character(&mut self, id: &str) -> bool {
        self.roster.try_unlock(self.store.as_mut(), id)
    }

    /// Switch to an unlocked character
    pub fn select_character(&mut self, id: &str) -> bool {
        self.roster.set_active(self.store.as_mut(), id)
    }

    fn reward_win(&mut self) {
        let count = self.config.characters.cards_per_win;
        let Some(id) = self.active_character().map(|c| c.id.clone()) else {
            return;
        };
        if count > 0 {
            self.add_character_cards(&id, count);
        }
    }

    /// The error that aborted the most recent level load
    pub fn last_error(&self) -> Option<&ConfigError> {
        self.last_error.as_ref()
    }

    pub fn subscribe(&mut self, scope: SubscriberScope, sink: Box<dyn EventSink>) -> SubscriberId {
        self.bus.subscribe(scope, sink)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Drain events emitted since the last call
    pub fn take_events(&mut self) -> Vec<CoreEvent> {
        self.pending.drain(..).collect()
    }

    fn emit(&mut self, event: CoreEvent) {
        self.bus.publish(&event);
        if self.pending.len() >= MAX_PENDING_EVENTS {
            self.pending.pop_front();
        }
        self.pending.push_back(event);
    }

    fn flush_round_events(&mut self) {
        let events = match self.round.as_mut() {
            Some(round) => round.take_events(),
            None => return,
        };
        for event in events {
            self.emit(event);
        }
    }

    fn set_phase(&mut self, to: RoundPhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        log::debug!("phase {} -> {}", from.as_str(), to.as_str());
        self.emit(CoreEvent::PhaseChanged { from, to });
    }

    fn end_round(&mut self) {
        self.win_timer_ms = None;
        if self.round.take().is_some() {
            self.bus.end_round();
        }
    }

    /// Leave Home and load the current level
    pub fn start(&mut self) -> bool {
        if self.phase != RoundPhase::Home || self.transitioning {
            return false;
        }
        self.begin_load()
    }

    /// Reload the lost level with the same seed
    pub fn retry(&mut self) -> bool {
        if self.phase != RoundPhase::Lost || self.transitioning {
            return false;
        }
        self.begin_load()
    }

    /// Abandon the round and return Home
    pub fn home(&mut self) -> bool {
        if !matches!(self.phase, RoundPhase::Playing | RoundPhase::Lost) || self.transitioning {
            return false;
        }
        self.end_round();
        self.set_phase(RoundPhase::Home);
        true
    }

    /// Finish loading and open the level for play
    pub fn level_ready(&mut self) -> bool {
        if self.phase != RoundPhase::Loading || self.round.is_none() {
            return false;
        }
        self.loading_timer_ms = 0;
        self.set_phase(RoundPhase::Playing);
        self.transitioning = false;
        if let Some(round) = &self.round {
            log::info!(
                "level {} ready: {} tiles, seed {}",
                round.level() + 1,
                round.tiles_remaining(),
                round.seed()
            );
        }
        true
    }

    fn begin_load(&mut self) -> bool {
        self.transitioning = true;
        self.end_round();
        self.set_phase(RoundPhase::Loading);

        self.inventory.reset_to_default(&self.config.items);
        self.inventory.save(self.store.as_mut());

        let level_config = self.config.levels[self.level_index % self.config.levels.len()];
        match Round::build(
            self.level_index as u32,
            &level_config,
            &self.config,
            &self.catalog,
            self.round_seed,
        ) {
            Ok(round) => {
                self.round = Some(round);
                self.last_error = None;
                self.loading_timer_ms = self.config.timing.loading_ms;
                if self.loading_timer_ms == 0 {
                    self.level_ready();
                }
                true
            }
            Err(err) => {
                log::error!("level {} failed to load: {}", self.level_index + 1, err);
                self.last_error = Some(err);
                self.set_phase(RoundPhase::Home);
                self.transitioning = false;
                false
            }
        }
    }

    fn advance_level(&mut self) -> bool {
        self.win_timer_ms = None;
        self.level_index = (self.level_index + 1) % self.config.levels.len();
        self.round_seed = derive_seed(self.config.seed, self.levels_won);
        self.begin_load()
    }

    /// Check win and loss after any change while playing
    fn evaluate(&mut self) {
        if self.phase != RoundPhase::Playing || self.transitioning {
            return;
        }
        let Some(round) = &self.round else {
            return;
        };
        let level = round.level();

        if round.is_won() {
            log::info!("level {} won", level + 1);
            self.levels_won += 1;
            self.transitioning = true;
            self.reward_win();
            self.emit(CoreEvent::RoundWon { level });
            if self.config.timing.win_next_delay_ms == 0 {
                self.advance_level();
            } else {
                self.win_timer_ms = Some(self.config.timing.win_next_delay_ms);
            }
        } else if round.is_lost() {
            log::info!("level {} lost with a full tray", level + 1);
            self.emit(CoreEvent::RoundLost { level });
            self.set_phase(RoundPhase::Lost);
        }
    }

    fn can_act(&self) -> bool {
        self.phase == RoundPhase::Playing && !self.transitioning
    }

    /// Send a board tile to the tray
    pub fn pick(&mut self, id: TileId) -> bool {
        if !self.can_act() {
            return false;
        }
        let Some(round) = self.round.as_mut() else {
            return false;
        };
        let picked = round.pick(id);
        self.flush_round_events();
        self.evaluate();
        picked
    }

    /// Send a holding tile back to the tray
    pub fn release(&mut self, id: TileId) -> bool {
        if !self.can_act() {
            return false;
        }
        let Some(round) = self.round.as_mut() else {
            return false;
        };
        let released = round.release(id);
        self.flush_round_events();
        self.evaluate();
        released
    }

    /// Whether `kind` can be used right now
    pub fn can_use_item(&self, kind: ItemKind) -> bool {
        self.can_act()
            && self
                .round
                .as_ref()
                .is_some_and(|round| round.can_use_item(kind, &self.inventory))
    }

    pub fn use_item(&mut self, kind: ItemKind) -> bool {
        if !self.can_act() {
            return false;
        }
        let Some(round) = self.round.as_mut() else {
            return false;
        };
        let used = round.use_item(kind, &mut self.inventory);
        if used {
            self.inventory.save(self.store.as_mut());
        }
        self.flush_round_events();
        self.evaluate();
        used
    }

    /// Claim uses of an item (stands in for the reward flow that grants it)
    pub fn claim_item(&mut self, kind: ItemKind, amount: u32) -> bool {
        if amount == 0 {
            return false;
        }
        self.inventory.claim(kind, amount);
        self.inventory.save(self.store.as_mut());
        true
    }

    /// Apply a player action
    pub fn apply_action(&mut self, action: PlayerAction) -> bool {
        match action {
            PlayerAction::Start => self.start(),
            PlayerAction::Pick(id) => self.pick(id),
            PlayerAction::Release(id) => self.release(id),
            PlayerAction::UseItem(kind) => self.use_item(kind),
            PlayerAction::ClaimItem(kind) => self.claim_item(kind, 1),
            PlayerAction::Retry => self.retry(),
            PlayerAction::Home => self.home(),
            PlayerAction::Settle => self.settle(),
        }
    }

    /// Advance timers by `elapsed_ms`; true when anything changed
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        match self.phase {
            RoundPhase::Loading => {
                self.loading_timer_ms = self.loading_timer_ms.saturating_sub(elapsed_ms);
                if self.loading_timer_ms == 0 {
                    return self.level_ready();
                }
                false
            }
            RoundPhase::Playing => {
                if let Some(remaining) = self.win_timer_ms {
                    if remaining > elapsed_ms {
                        self.win_timer_ms = Some(remaining - elapsed_ms);
                        return false;
                    }
                    return self.advance_level();
                }
                let changed = self
                    .round
                    .as_mut()
                    .is_some_and(|round| round.advance(elapsed_ms));
                if changed {
                    self.flush_round_events();
                    self.evaluate();
                }
                changed
            }
            RoundPhase::Home | RoundPhase::Lost => false,
        }
    }

    /// Complete every pending timed phase synchronously
    ///
    /// Pending clears and reshuffles finish first; a win then proceeds
    /// through the next level's loading until the game is playable (or
    /// lost) again.
    pub fn settle(&mut self) -> bool {
        let mut changed = false;
        for _ in 0..MAX_SETTLE_STEPS {
            let step = match self.phase {
                RoundPhase::Loading => self.level_ready(),
                RoundPhase::Playing if self.win_timer_ms.is_some() => self.advance_level(),
                RoundPhase::Playing => {
                    let settled = self.round.as_mut().is_some_and(|round| round.settle());
                    if settled {
                        self.flush_round_events();
                        self.evaluate();
                    }
                    settled
                }
                RoundPhase::Home | RoundPhase::Lost => false,
            };
            if !step {
                break;
            }
            changed = true;
        }
        changed
    }

    /// Capture an observer view of the whole game
    pub fn snapshot(&self) -> GameSnapshot {
        let mut snap = GameSnapshot::empty(self.phase);
        snap.transitioning = self.transitioning;
        snap.level = self.level();
        snap.levels_won = self.levels_won;
        snap.seed = self.round_seed;
        snap.items = ItemKind::ALL
            .iter()
            .map(|&kind| {
                let slot = self.inventory.slot(kind);
                ItemSnapshot {
                    kind,
                    claimed: slot.claimed,
                    uses: slot.uses,
                    usable: self.can_use_item(kind),
                }
            })
            .collect();

        let Some(round) = &self.round else {
            return snap;
        };
        let board = round.board();
        snap.board = board
            .tiles()
            .iter()
            .map(|t| TileSnapshot {
                id: t.id,
                kind: t.kind,
                layer: t.layer,
                x: t.footprint.center.x,
                y: t.footprint.center.y,
                blocked: board.is_blocked(t.id),
            })
            .collect();
        let slot = |t: &crate::tile::Tile| SlotSnapshot {
            id: t.id,
            kind: t.kind,
        };
        snap.tray = round.tray().tiles().iter().map(slot).collect();
        snap.holding = round.holding().tiles().iter().map(slot).collect();
        snap.tray_capacity = round.tray().capacity() as u32;
        snap.holding_capacity = round.holding().capacity() as u32;
        snap.tray_busy = round.tray().is_busy();
        snap.board_shuffling = board.is_shuffling();
        snap
    }
}
