use criterion::{black_box, criterion_group, criterion_main, Criterion};
use triple_tray::core::{
    Board, BoardConfig, GameConfig, GameState, LevelConfig, Point, Rect, SimpleRng, Tile,
    TileBag, TimingConfig, Tray, TrayConfig,
};
use triple_tray::engine::{suggest, Autoplayer};
use triple_tray::types::{TileId, TileTypeId};

fn dealt_board(seed: u32) -> Board {
    let mut rng = SimpleRng::new(seed);
    let kinds: Vec<TileTypeId> = (0..14).map(TileTypeId).collect();
    let mut bag = TileBag::build(&kinds, 3, 3, &mut rng).unwrap();
    Board::build(&mut bag, 6, &BoardConfig::default(), &mut rng).unwrap()
}

fn instant_game(seed: u32) -> GameState {
    GameState::new(GameConfig {
        seed,
        timing: TimingConfig::instant(),
        levels: vec![LevelConfig::default()],
        ..GameConfig::default()
    })
    .unwrap()
}

fn bench_deal(c: &mut Criterion) {
    c.bench_function("deal_126_tiles", |b| {
        b.iter(|| dealt_board(black_box(12345)))
    });
}

fn bench_recompute_blocking(c: &mut Criterion) {
    let mut board = dealt_board(12345);
    c.bench_function("recompute_blocking_126", |b| {
        b.iter(|| {
            board.recompute_blocking();
            black_box(board.clickable().count())
        })
    });
}

fn bench_reshuffle(c: &mut Criterion) {
    let mut board = dealt_board(12345);
    let mut rng = SimpleRng::new(7);
    c.bench_function("reshuffle_126", |b| {
        b.iter(|| black_box(board.reshuffle(&mut rng)))
    });
}

fn bench_tray_insert_and_clear(c: &mut Criterion) {
    let config = TrayConfig::default();
    let tiles: Vec<Tile> = [0u16, 1, 0, 2, 1, 0]
        .iter()
        .enumerate()
        .map(|(i, &kind)| {
            Tile::new(
                TileId(i as u32),
                TileTypeId(kind),
                0,
                Rect::square(Point::default(), 10.0),
                0,
            )
        })
        .collect();

    c.bench_function("tray_insert_and_clear", |b| {
        b.iter(|| {
            let mut tray = Tray::new(&config, 0);
            for tile in &tiles {
                let _ = tray.try_insert(tile.clone());
            }
            black_box(tray.complete_clear())
        })
    });
}

fn bench_suggest(c: &mut Criterion) {
    let mut game = instant_game(12345);
    game.start();

    c.bench_function("suggest_opening", |b| {
        b.iter(|| black_box(game.round().and_then(suggest)))
    });
}

fn bench_autoplay_round(c: &mut Criterion) {
    let player = Autoplayer::default();
    c.bench_function("autoplay_default_level", |b| {
        b.iter(|| {
            let mut game = instant_game(black_box(12345));
            black_box(player.play_round(&mut game))
        })
    });
}

criterion_group!(
    benches,
    bench_deal,
    bench_recompute_blocking,
    bench_reshuffle,
    bench_tray_insert_and_clear,
    bench_suggest,
    bench_autoplay_round
);
criterion_main!(benches);
