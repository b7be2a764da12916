//! Triple Tray runner (default binary).
//!
//! `triple-tray [serve]` runs the fixed-timestep game loop and lets an
//! external agent play over the control socket.
//! `triple-tray autoplay [--seed N] [--rounds N]` plays headless rounds.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};

use triple_tray::adapter::{build_observation, handle_inbound, Adapter, OutboundMessage};
use triple_tray::cli::{parse_args, AutoplayArgs, RunMode};
use triple_tray::core::{GameConfig, GameState};
use triple_tray::engine::{AutoplayConfig, Autoplayer};
use triple_tray::types::TICK_MS;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = parse_args(&args)?;
    let config = GameConfig::load().context("failed to load game config")?;

    match mode {
        RunMode::Serve => serve(config),
        RunMode::Autoplay(args) => autoplay(config, &args),
    }
}

fn serve(config: GameConfig) -> Result<()> {
    let Some(mut adapter) = Adapter::start_from_env()? else {
        return Err(anyhow!(
            "control socket disabled; nothing to serve (try `triple-tray autoplay`)"
        ));
    };
    let mut game = GameState::new(config)?;

    let tick_duration = Duration::from_millis(TICK_MS as u64);
    let mut last_tick = Instant::now();
    let mut obs_seq: u64 = 0;
    let mut events = Vec::new();

    loop {
        let mut dirty = false;
        while let Some(inbound) = adapter.try_recv() {
            obs_seq += 1;
            for msg in handle_inbound(&mut game, &inbound, obs_seq, &mut events) {
                adapter.send(msg);
            }
            dirty = true;
        }

        if last_tick.elapsed() >= tick_duration {
            last_tick = Instant::now();
            dirty |= game.tick(TICK_MS);
            events.extend(game.take_events());
        }

        if dirty || !events.is_empty() {
            obs_seq += 1;
            let obs = build_observation(obs_seq, &game.snapshot(), &events);
            events.clear();
            adapter.send(OutboundMessage::BroadcastObservation { obs });
        }

        let wait = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO)
            .min(Duration::from_millis(2));
        std::thread::sleep(wait);
    }
}

fn autoplay(mut config: GameConfig, args: &AutoplayArgs) -> Result<()> {
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let mut game = GameState::new(config)?;
    let player = Autoplayer::new(AutoplayConfig::default());

    let mut wins = 0u32;
    for (round, outcome) in player.play(&mut game, args.rounds).iter().enumerate() {
        let result = if outcome.won {
            wins += 1;
            "won"
        } else if outcome.lost {
            "lost"
        } else {
            "stuck"
        };
        println!(
            "round {:>3}  level {:>2}  {:<5}  picks {:>4}  releases {:>3}  items {:>2}  cleared {:>4}",
            round + 1,
            outcome.level + 1,
            result,
            outcome.picks,
            outcome.releases,
            outcome.items_used,
            outcome.tiles_cleared
        );
    }
    println!("{}/{} rounds won", wins, args.rounds);
    Ok(())
}
