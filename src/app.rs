//! Application layer on top of the simulation: player accounts, bearer
//! tokens, idle retirement, leaderboard records and whole-server snapshots.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use thiserror::Error;

use crate::dog::{Dog, DogId};
use crate::game::Game;
use crate::loot::{LootInfo, LootKind};
use crate::map::MapId;
use crate::records::{PlayerRecord, RecordsStore};
use crate::state_store::{
    AppState, AuthState, BagItemState, DogState, LootState, MapState, PlayerState, TokenState,
};
use crate::types::{Direction, Point, Velocity};

pub type PlayerId = u32;

const TOKEN_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("map {0:?} not found")]
    MapNotFound(MapId),
    #[error("player not found")]
    PlayerNotFound,
}

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("state refers to unknown map {0:?}")]
    MapNotFound(String),
    #[error("state holds invalid direction code {0:?}")]
    InvalidDirection(String),
    #[error("state holds duplicate dog id {0}")]
    DuplicateDog(DogId),
    #[error("state links player {player_id} to missing dog {dog_id} on map {map_id:?}")]
    DogNotFound {
        map_id: String,
        dog_id: DogId,
        player_id: PlayerId,
    },
    #[error("state holds token for unknown player {0}")]
    UnknownPlayer(PlayerId),
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub dog_id: DogId,
    pub map_id: MapId,
}

#[derive(Clone, Copy, Debug, Default)]
struct PlayerTiming {
    play_time: Duration,
    idle_time: Duration,
}

#[derive(Clone, Debug)]
pub struct JoinResult {
    pub token: String,
    pub player_id: PlayerId,
}

pub struct Application {
    game: Game,
    records: RecordsStore,
    players: HashMap<PlayerId, Player>,
    tokens: HashMap<String, PlayerId>,
    timing: HashMap<PlayerId, PlayerTiming>,
    next_player_id: PlayerId,
    retirement_time: Duration,
}

impl Application {
    pub fn new(game: Game, records: RecordsStore, retirement_time: Duration) -> Self {
        Self {
            game,
            records,
            players: HashMap::new(),
            tokens: HashMap::new(),
            timing: HashMap::new(),
            next_player_id: 0,
            retirement_time,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Creates a player, spawns its dog on the requested map and hands back
    /// a fresh auth token.
    pub fn join_game(&mut self, dog_name: &str, map_id: &str) -> Result<JoinResult, AppError> {
        let bag_capacity = self
            .game
            .find_map(map_id)
            .ok_or_else(|| AppError::MapNotFound(map_id.to_string()))?
            .bag_capacity();

        let player_id = self.next_player_id;
        self.next_player_id += 1;

        // the session cannot already hold this id, ids only move forward
        if let Some(session) = self.game.session_for_map_mut(map_id) {
            session.spawn_dog(dog_name, player_id, bag_capacity);
        }

        let token = loop {
            let candidate = generate_token();
            if !self.tokens.contains_key(&candidate) {
                break candidate;
            }
        };

        self.players.insert(
            player_id,
            Player {
                id: player_id,
                dog_id: player_id,
                map_id: map_id.to_string(),
            },
        );
        self.tokens.insert(token.clone(), player_id);
        self.timing.insert(player_id, PlayerTiming::default());

        Ok(JoinResult { token, player_id })
    }

    pub fn find_player_by_token(&self, token: &str) -> Option<&Player> {
        self.tokens.get(token).and_then(|id| self.players.get(id))
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Players whose dog lives on the given map.
    pub fn players_in_map(&self, map_id: &str) -> Vec<&Player> {
        let mut result: Vec<&Player> = self
            .players
            .values()
            .filter(|player| player.map_id == map_id)
            .collect();
        result.sort_by_key(|player| player.id);
        result
    }

    pub fn move_player(&mut self, id: PlayerId, direction: Direction) -> Result<(), AppError> {
        let player = self.players.get(&id).ok_or(AppError::PlayerNotFound)?;
        let (dog_id, map_id) = (player.dog_id, player.map_id.clone());
        if let Some(session) = self.game.session_for_map_mut(&map_id) {
            session.move_dog(dog_id, direction);
        }
        Ok(())
    }

    pub fn stop_player(&mut self, id: PlayerId) -> Result<(), AppError> {
        let player = self.players.get(&id).ok_or(AppError::PlayerNotFound)?;
        let (dog_id, map_id) = (player.dog_id, player.map_id.clone());
        if let Some(session) = self.game.session_for_map_mut(&map_id) {
            session.stop_dog(dog_id);
        }
        Ok(())
    }

    /// Advances the simulation and the per-player clocks, then retires every
    /// player whose dog has been standing still for the retirement window.
    pub fn tick(&mut self, delta: Duration) {
        let idle_before: HashMap<PlayerId, bool> = self
            .players
            .values()
            .map(|player| (player.id, self.dog_is_idle(player)))
            .collect();

        self.game.tick(delta);

        let mut retired: Vec<PlayerId> = Vec::new();
        for player in self.players.values() {
            let Some(timing) = self.timing.get_mut(&player.id) else {
                continue;
            };
            timing.play_time += delta;

            // only whole ticks spent standing still count as idle; a dog
            // that stops mid-tick starts its idle clock on the next one
            let idle_now = self
                .game
                .session_for_map(&player.map_id)
                .and_then(|session| session.dog(player.dog_id))
                .map(|dog| dog.velocity().is_zero())
                .unwrap_or(true);
            if idle_now && idle_before.get(&player.id).copied().unwrap_or(false) {
                timing.idle_time += delta;
            } else {
                timing.idle_time = Duration::ZERO;
            }

            if timing.idle_time >= self.retirement_time {
                retired.push(player.id);
            }
        }

        for id in retired {
            self.retire_player(id);
        }
    }

    pub fn records(&self, start: usize, max_items: usize) -> Vec<PlayerRecord> {
        self.records.get(start, max_items)
    }

    fn dog_is_idle(&self, player: &Player) -> bool {
        self.game
            .session_for_map(&player.map_id)
            .and_then(|session| session.dog(player.dog_id))
            .map(|dog| dog.velocity().is_zero())
            .unwrap_or(true)
    }

    fn retire_player(&mut self, id: PlayerId) {
        let Some(player) = self.players.remove(&id) else {
            return;
        };
        let timing = self.timing.remove(&id).unwrap_or_default();
        self.tokens.retain(|_, player_id| *player_id != id);

        if let Some(session) = self.game.session_for_map_mut(&player.map_id) {
            if let Some(dog) = session.dog(player.dog_id) {
                self.records.add_record(PlayerRecord {
                    name: dog.name().to_string(),
                    score: dog.score(),
                    play_time_sec: timing.play_time.as_secs_f64(),
                    retired_at: Utc::now(),
                });
            }
            session.remove_dog(player.dog_id);
        }
    }

    /// Captures the whole server state for persistence.
    pub fn get_state(&self) -> AppState {
        let mut maps = Vec::new();
        for session in self.game.sessions() {
            let dogs = session
                .dogs()
                .map(|dog| DogState {
                    id: dog.id(),
                    name: dog.name().to_string(),
                    x: dog.position().x,
                    y: dog.position().y,
                    vx: dog.velocity().vx,
                    vy: dog.velocity().vy,
                    dir: dog.direction().as_code().to_string(),
                    bag_capacity: dog.bag_capacity(),
                    score: dog.score(),
                    bag: dog
                        .bag()
                        .iter()
                        .map(|(item_id, info)| BagItemState {
                            id: *item_id,
                            kind: info.kind.as_str().to_string(),
                            value: info.value,
                        })
                        .collect(),
                })
                .collect();

            let loot = session
                .loot_items()
                .iter()
                .map(|item| LootState {
                    id: item.id,
                    kind: item.info.kind.as_str().to_string(),
                    value: item.info.value,
                    x: item.position.x,
                    y: item.position.y,
                    width: item.width,
                })
                .collect();

            maps.push(MapState {
                map_id: session.map_id().clone(),
                dogs,
                loot,
            });
        }

        let mut players: Vec<PlayerState> = self
            .players
            .values()
            .map(|player| {
                let timing = self.timing.get(&player.id).copied().unwrap_or_default();
                PlayerState {
                    id: player.id,
                    dog_id: player.dog_id,
                    map_id: player.map_id.clone(),
                    play_time_sec: timing.play_time.as_secs_f64(),
                    idle_time_sec: timing.idle_time.as_secs_f64(),
                }
            })
            .collect();
        players.sort_by_key(|player| player.id);

        let mut tokens: Vec<TokenState> = self
            .tokens
            .iter()
            .map(|(token, player_id)| TokenState {
                token: token.clone(),
                player_id: *player_id,
            })
            .collect();
        tokens.sort_by_key(|entry| entry.player_id);

        AppState {
            maps,
            auth: AuthState {
                next_player_id: self.next_player_id,
                players,
                tokens,
            },
        }
    }

    /// Replaces the whole server state from a snapshot. Any inconsistency in
    /// the snapshot fails the restore; callers treat that as fatal and must
    /// not keep serving from the half-restored state.
    pub fn restore_state(&mut self, state: AppState) -> Result<(), RestoreError> {
        for map_state in &state.maps {
            let session = self
                .game
                .session_for_map_mut(&map_state.map_id)
                .ok_or_else(|| RestoreError::MapNotFound(map_state.map_id.clone()))?;
            session.clear_dynamic_state();

            for dog_state in &map_state.dogs {
                let direction = Direction::parse_code(&dog_state.dir)
                    .ok_or_else(|| RestoreError::InvalidDirection(dog_state.dir.clone()))?;

                let mut dog = Dog::new(
                    dog_state.name.clone(),
                    dog_state.id,
                    Point::new(dog_state.x, dog_state.y),
                    dog_state.bag_capacity,
                );
                dog.set_direction(direction);
                dog.set_velocity(Velocity {
                    vx: dog_state.vx,
                    vy: dog_state.vy,
                });
                dog.add_score(dog_state.score);
                for bag_item in &dog_state.bag {
                    dog.restore_bag_item(bag_item.id, loot_info(&bag_item.kind, bag_item.value));
                }

                if !session.restore_dog(dog) {
                    return Err(RestoreError::DuplicateDog(dog_state.id));
                }
            }

            for loot_state in &map_state.loot {
                session.restore_loot_item(
                    loot_state.id,
                    loot_info(&loot_state.kind, loot_state.value),
                    Point::new(loot_state.x, loot_state.y),
                    loot_state.width,
                );
            }
            session.finalize_after_restore();
        }

        self.players.clear();
        self.tokens.clear();
        self.timing.clear();
        self.next_player_id = state.auth.next_player_id;

        for player_state in &state.auth.players {
            let session = self
                .game
                .session_for_map(&player_state.map_id)
                .ok_or_else(|| RestoreError::MapNotFound(player_state.map_id.clone()))?;
            if session.dog(player_state.dog_id).is_none() {
                return Err(RestoreError::DogNotFound {
                    map_id: player_state.map_id.clone(),
                    dog_id: player_state.dog_id,
                    player_id: player_state.id,
                });
            }

            self.players.insert(
                player_state.id,
                Player {
                    id: player_state.id,
                    dog_id: player_state.dog_id,
                    map_id: player_state.map_id.clone(),
                },
            );
            self.timing.insert(
                player_state.id,
                PlayerTiming {
                    play_time: Duration::from_secs_f64(player_state.play_time_sec),
                    idle_time: Duration::from_secs_f64(player_state.idle_time_sec),
                },
            );
        }

        for token_state in &state.auth.tokens {
            if !self.players.contains_key(&token_state.player_id) {
                return Err(RestoreError::UnknownPlayer(token_state.player_id));
            }
            self.tokens
                .insert(token_state.token.clone(), token_state.player_id);
        }

        Ok(())
    }
}

fn loot_info(kind: &str, value: i32) -> LootInfo {
    LootInfo {
        kind: LootKind::parse(kind).unwrap_or(LootKind::Unknown),
        value,
    }
}

fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
