//! Headless autoplay
//!
//! Plays a level to completion through the same [`GameState`] operations a
//! player or AI client uses. Timed phases are completed synchronously with
//! [`GameState::settle`], so a whole level runs without a clock.
//!
//! Before a move would fill the tray without a match, the autoplayer tries
//! the items in order Remove, Undo, Shuffle. With `claim_items` set it
//! claims a use of an item whose board/tray precondition holds but whose
//! inventory slot is empty.

use triple_tray_core::{GameState, ItemRules};
use triple_tray_types::{CoreEvent, ItemKind, PlayerAction, RoundPhase};

use crate::hint::{suggest, Hint};

/// Item order tried when the tray is about to fill
const RESCUE_ORDER: [ItemKind; 3] = [ItemKind::Remove, ItemKind::Undo, ItemKind::Shuffle];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplayConfig {
    /// Upper bound on actions per round
    pub max_steps: u32,
    /// Upper bound on item uses per round
    pub max_item_uses: u32,
    /// Claim a use of an item when none is available
    pub claim_items: bool,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            max_item_uses: 8,
            claim_items: true,
        }
    }
}

/// Result of one autoplayed round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoplayOutcome {
    pub level: u32,
    pub won: bool,
    pub lost: bool,
    pub picks: u32,
    pub releases: u32,
    pub items_used: u32,
    pub tiles_cleared: u32,
    pub steps: u32,
}

impl AutoplayOutcome {
    /// Neither won nor lost within the step budget
    pub fn is_stuck(&self) -> bool {
        !self.won && !self.lost
    }
}

#[derive(Debug, Clone, Default)]
pub struct Autoplayer {
    config: AutoplayConfig,
}

impl Autoplayer {
    /// Create a new autoplayer
    pub fn new(config: AutoplayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AutoplayConfig {
        &self.config
    }

    /// Play the current level until it is won or lost
    ///
    /// From Home the level is started, and a lost level is retried first.
    pub fn play_round(&self, game: &mut GameState) -> AutoplayOutcome {
        game.settle();
        match game.phase() {
            RoundPhase::Home => {
                game.start();
            }
            RoundPhase::Lost => {
                game.retry();
            }
            RoundPhase::Loading | RoundPhase::Playing => {}
        }
        game.settle();

        let mut outcome = AutoplayOutcome {
            level: game.level(),
            ..AutoplayOutcome::default()
        };
        if game.phase() != RoundPhase::Playing {
            log::warn!("autoplay could not start level {}", game.level() + 1);
            return outcome;
        }
        let won_before = game.levels_won();
        self.drain(game, &mut outcome);

        while outcome.steps < self.config.max_steps {
            outcome.steps += 1;

            if game.levels_won() > won_before {
                outcome.won = true;
                break;
            }
            if game.phase() == RoundPhase::Lost {
                outcome.lost = true;
                break;
            }

            let Some(hint) = game.round().and_then(suggest) else {
                if !game.settle() {
                    log::warn!("autoplay found no move on level {}", outcome.level + 1);
                    break;
                }
                self.drain(game, &mut outcome);
                continue;
            };

            if self.needs_rescue(&hint, &outcome) && self.rescue(game, &mut outcome) {
                game.settle();
                self.drain(game, &mut outcome);
                continue;
            }

            let action = hint.action();
            if game.apply_action(action) {
                match action {
                    PlayerAction::Release(_) => outcome.releases += 1,
                    _ => outcome.picks += 1,
                }
            } else {
                log::warn!("autoplay move {} was rejected", action);
                break;
            }
            game.settle();
            self.drain(game, &mut outcome);
        }

        // A win advances straight into the next level while settling.
        if !outcome.won && game.levels_won() > won_before {
            outcome.won = true;
        }
        log::info!(
            "autoplay level {}: won={} picks={} items={} steps={}",
            outcome.level + 1,
            outcome.won,
            outcome.picks,
            outcome.items_used,
            outcome.steps
        );
        outcome
    }

    /// Play `rounds` levels in a row, retrying after a loss
    pub fn play(&self, game: &mut GameState, rounds: u32) -> Vec<AutoplayOutcome> {
        (0..rounds).map(|_| self.play_round(game)).collect()
    }

    fn needs_rescue(&self, hint: &Hint, outcome: &AutoplayOutcome) -> bool {
        hint.fills_tray && outcome.items_used < self.config.max_item_uses
    }

    /// Try each item in rescue order; true when one was used
    fn rescue(&self, game: &mut GameState, outcome: &mut AutoplayOutcome) -> bool {
        for kind in RESCUE_ORDER {
            if !self.item_applies(game, kind) {
                continue;
            }
            if !game.can_use_item(kind) && self.config.claim_items {
                game.claim_item(kind, 1);
            }
            if game.use_item(kind) {
                log::debug!("autoplay used {}", kind.as_str());
                outcome.items_used += 1;
                return true;
            }
        }
        false
    }

    fn item_applies(&self, game: &GameState, kind: ItemKind) -> bool {
        game.round().is_some_and(|round| {
            ItemRules::precondition(kind, round.board(), round.tray(), round.holding())
        })
    }

    fn drain(&self, game: &mut GameState, outcome: &mut AutoplayOutcome) {
        for event in game.take_events() {
            if let CoreEvent::TilesCleared { count } = event {
                outcome.tiles_cleared += count;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triple_tray_core::{GameConfig, LevelConfig, TimingConfig};

    fn config(levels: Vec<LevelConfig>) -> GameConfig {
        GameConfig {
            seed: 11,
            timing: TimingConfig::instant(),
            levels,
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_wins_trivial_level() {
        let mut game = GameState::new(config(vec![LevelConfig {
            type_count: 3,
            layer_count: 3,
            triples_per_type: 1,
        }]))
        .unwrap();
        let outcome = Autoplayer::default().play_round(&mut game);
        assert!(outcome.won, "{outcome:?}");
        assert_eq!(outcome.tiles_cleared, 9);
        // Three types never leave a non-matching move with one slot free.
        assert_eq!(outcome.items_used, 0);
        assert_eq!(outcome.picks, 9);
        assert_eq!(game.levels_won(), 1);
        assert_eq!(game.phase(), RoundPhase::Playing);
    }

    #[test]
    fn test_outcome_always_terminates() {
        let mut game = GameState::new(config(vec![LevelConfig {
            type_count: 10,
            layer_count: 5,
            triples_per_type: 2,
        }]))
        .unwrap();
        let player = Autoplayer::new(AutoplayConfig {
            max_steps: 500,
            ..AutoplayConfig::default()
        });
        let outcome = player.play_round(&mut game);
        assert!(outcome.steps <= 500);
        assert_eq!(outcome.won, game.levels_won() == 1);
        assert!(outcome.tiles_cleared % 3 == 0);
    }

    #[test]
    fn test_play_several_rounds() {
        let mut game = GameState::new(config(vec![LevelConfig {
            type_count: 3,
            layer_count: 2,
            triples_per_type: 1,
        }]))
        .unwrap();
        let outcomes = Autoplayer::default().play(&mut game, 3);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.won));
        assert_eq!(game.levels_won(), 3);
    }
}
