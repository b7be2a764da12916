//! Autoplay tests - hints and headless rounds through the public facade

use triple_tray::core::{GameConfig, GameState, LevelConfig, TimingConfig};
use triple_tray::engine::{suggest, AutoplayConfig, Autoplayer, HintSource};
use triple_tray::types::{PlayerAction, RoundPhase, TileTypeId};

fn game(seed: u32, levels: Vec<LevelConfig>) -> GameState {
    GameState::new(GameConfig {
        seed,
        timing: TimingConfig::instant(),
        levels,
        ..GameConfig::default()
    })
    .unwrap()
}

fn level(type_count: usize, layer_count: u8, triples_per_type: usize) -> LevelConfig {
    LevelConfig {
        type_count,
        layer_count,
        triples_per_type,
    }
}

#[test]
fn test_hints_only_name_movable_tiles() {
    let mut game = game(5, vec![level(8, 4, 1)]);
    assert!(game.start());

    for _ in 0..200 {
        if game.phase() != RoundPhase::Playing || game.levels_won() > 0 {
            break;
        }
        let round = game.round().unwrap();
        let Some(hint) = suggest(round) else {
            assert!(!round.tray().can_accept());
            assert!(game.settle());
            continue;
        };
        match hint.source {
            HintSource::Board => assert!(round.board().is_clickable(hint.id)),
            HintSource::Holding => assert!(round.holding().contains(hint.id)),
        }
        assert!(game.apply_action(hint.action()));
        game.settle();
    }
}

#[test]
fn test_same_seed_same_outcome() {
    let levels = vec![level(6, 3, 1), level(8, 4, 1)];
    let player = Autoplayer::default();

    let mut first = game(77, levels.clone());
    let mut second = game(77, levels);
    let a = player.play(&mut first, 2);
    let b = player.play(&mut second, 2);
    assert_eq!(a, b);
    assert_eq!(first.snapshot(), second.snapshot());
}

#[test]
fn test_won_round_clears_every_tile() {
    // Three types can never fill seven slots without a match.
    let mut game = game(3, vec![level(3, 2, 2)]);
    let outcome = Autoplayer::default().play_round(&mut game);
    assert!(outcome.won, "{outcome:?}");
    assert!(!outcome.is_stuck());
    assert_eq!(outcome.tiles_cleared, 18);
    assert_eq!(outcome.picks, 18);
    assert_eq!(outcome.items_used, 0);
}

#[test]
fn test_autoplay_retries_a_lost_level() {
    let mut game = game(9, vec![level(7, 1, 1)]);
    assert!(game.start());

    // Fill the tray with one tile of each type.
    let mut seen: Vec<TileTypeId> = Vec::new();
    let mut picks = Vec::new();
    for t in game.round().unwrap().board().clickable() {
        if !seen.contains(&t.kind) {
            seen.push(t.kind);
            picks.push(t.id);
        }
    }
    for id in picks {
        game.apply_action(PlayerAction::Pick(id));
    }
    assert_eq!(game.phase(), RoundPhase::Lost);

    let outcome = Autoplayer::default().play_round(&mut game);
    assert_eq!(outcome.level, 0);
    assert!(outcome.picks > 0);
    assert!(outcome.won || outcome.lost);
}

#[test]
fn test_items_are_bounded_by_config() {
    let player = Autoplayer::new(AutoplayConfig {
        max_item_uses: 2,
        ..AutoplayConfig::default()
    });
    let mut game = game(21, vec![level(12, 6, 2)]);
    let outcome = player.play_round(&mut game);
    assert!(outcome.items_used <= 2);
    assert!(outcome.steps <= player.config().max_steps);
}

#[test]
fn test_disabled_claiming_uses_no_items() {
    let player = Autoplayer::new(AutoplayConfig {
        claim_items: false,
        ..AutoplayConfig::default()
    });
    let mut game = game(21, vec![level(12, 6, 2)]);
    let outcome = player.play_round(&mut game);
    assert_eq!(outcome.items_used, 0);
}
