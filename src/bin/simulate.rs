use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use lootdog_server::app::{Application, PlayerId};
use lootdog_server::config;
use lootdog_server::records::RecordsStore;
use lootdog_server::types::Direction;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to the game configuration json.
    #[arg(long, short = 'c')]
    config_file: PathBuf,
    /// How many simulated ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Tick length in milliseconds.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
    /// Number of bot players to join on every map.
    #[arg(long, default_value_t = 4)]
    bots: usize,
    /// Seed for bot decisions.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Clone, Debug, Serialize)]
struct BotResult {
    name: String,
    map: String,
    score: i32,
    bag: usize,
    retired: bool,
}

fn main() {
    let cli = Cli::parse();

    let settings = match config::load_game(&cli.config_file) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!(
                "[simulate] failed to load {}: {err}",
                cli.config_file.display()
            );
            std::process::exit(1);
        }
    };

    let mut game = settings.game;
    game.set_randomize_spawn_points(true);
    let map_ids: Vec<String> = game.maps().map(|map| map.id().clone()).collect();

    let mut app = Application::new(game, RecordsStore::in_memory(), settings.retirement_time);
    let mut rng = SmallRng::seed_from_u64(cli.seed);

    let mut bots: Vec<(PlayerId, String, String)> = Vec::new();
    for map_id in &map_ids {
        for bot_index in 0..cli.bots {
            let name = format!("bot-{map_id}-{bot_index}");
            match app.join_game(&name, map_id) {
                Ok(joined) => bots.push((joined.player_id, name, map_id.clone())),
                Err(err) => {
                    eprintln!("[simulate] join failed: {err}");
                    std::process::exit(1);
                }
            }
        }
    }

    let delta = Duration::from_millis(cli.tick_ms);
    for tick in 0..cli.ticks {
        for (player_id, _, _) in &bots {
            // a bot reconsiders roughly every ten ticks
            if rng.random_range(0..10) == 0 {
                let direction = random_direction(&mut rng);
                let _ = match direction {
                    Some(direction) => app.move_player(*player_id, direction),
                    None => app.stop_player(*player_id),
                };
            }
        }
        app.tick(delta);

        if (tick + 1) % 100 == 0 {
            let loot_total: usize = map_ids
                .iter()
                .filter_map(|id| app.game().loot_items_in_map(id))
                .map(|items| items.len())
                .sum();
            eprintln!(
                "{}",
                json!({
                    "event": "progress",
                    "tick": tick + 1,
                    "players": app.player_count(),
                    "lootOnGround": loot_total,
                })
            );
        }
    }

    let mut results: Vec<BotResult> = Vec::new();
    for (player_id, name, map_id) in &bots {
        let dog = app
            .game()
            .session_for_map(map_id)
            .and_then(|session| session.dog(*player_id));
        results.push(BotResult {
            name: name.clone(),
            map: map_id.clone(),
            score: dog.map(|dog| dog.score()).unwrap_or(0),
            bag: dog.map(|dog| dog.bag().len()).unwrap_or(0),
            retired: dog.is_none(),
        });
    }
    results.sort_by(|a, b| b.score.cmp(&a.score));

    for result in &results {
        println!(
            "{}",
            serde_json::to_string(result).expect("bot result should serialize")
        );
    }

    let retired_records = app.records(0, 100);
    eprintln!(
        "{}",
        json!({
            "event": "finished",
            "ticks": cli.ticks,
            "bots": bots.len(),
            "stillPlaying": app.player_count(),
            "retired": retired_records.len(),
            "topScore": results.first().map(|r| r.score).unwrap_or(0),
        })
    );
}

fn random_direction(rng: &mut SmallRng) -> Option<Direction> {
    match rng.random_range(0..5) {
        0 => Some(Direction::North),
        1 => Some(Direction::South),
        2 => Some(Direction::West),
        3 => Some(Direction::East),
        _ => None,
    }
}
