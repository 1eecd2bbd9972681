use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::loot::LootItem;
use crate::loot_generator::LootPolicy;
use crate::map::{Map, MapId};
use crate::session::GameSession;

/// Owns every map and its session and routes per-map operations. Built once
/// at startup; maps are never added or removed at runtime.
pub struct Game {
    sessions: Vec<GameSession>,
    map_index: HashMap<MapId, usize>,
    loot_policy: Arc<dyn LootPolicy>,
    randomize_spawn_points: bool,
    next_seed: u64,
}

impl Game {
    pub fn new(loot_policy: Arc<dyn LootPolicy>) -> Self {
        let seed = rand::rng().random();
        Self::with_seed(loot_policy, seed)
    }

    /// Seeds every session deterministically; used by tests and the
    /// headless simulator.
    pub fn with_seed(loot_policy: Arc<dyn LootPolicy>, seed: u64) -> Self {
        Self {
            sessions: Vec::new(),
            map_index: HashMap::new(),
            loot_policy,
            randomize_spawn_points: false,
            next_seed: seed,
        }
    }

    /// Registers a map and creates its session. A duplicate id is refused.
    pub fn add_map(&mut self, map: Map) -> bool {
        if self.map_index.contains_key(map.id()) {
            return false;
        }
        let seed = self.next_seed;
        self.next_seed = self.next_seed.wrapping_add(1);

        let mut session = GameSession::new(map, Arc::clone(&self.loot_policy), seed);
        session.set_randomize_spawn_points(self.randomize_spawn_points);
        self.map_index
            .insert(session.map_id().clone(), self.sessions.len());
        self.sessions.push(session);
        true
    }

    pub fn set_randomize_spawn_points(&mut self, value: bool) {
        self.randomize_spawn_points = value;
        for session in &mut self.sessions {
            session.set_randomize_spawn_points(value);
        }
    }

    pub fn maps(&self) -> impl Iterator<Item = &Map> {
        self.sessions.iter().map(|session| session.map())
    }

    pub fn sessions(&self) -> impl Iterator<Item = &GameSession> {
        self.sessions.iter()
    }

    pub fn find_map(&self, id: &str) -> Option<&Map> {
        self.session_for_map(id).map(|session| session.map())
    }

    pub fn session_for_map(&self, id: &str) -> Option<&GameSession> {
        self.map_index.get(id).map(|&index| &self.sessions[index])
    }

    pub fn session_for_map_mut(&mut self, id: &str) -> Option<&mut GameSession> {
        self.map_index
            .get(id)
            .map(|&index| &mut self.sessions[index])
    }

    pub fn loot_items_in_map(&self, id: &str) -> Option<Vec<LootItem>> {
        self.session_for_map(id).map(|session| session.loot_items())
    }

    /// Advances every session by the same time step.
    pub fn tick(&mut self, delta: Duration) {
        for session in &mut self.sessions {
            session.tick(delta);
        }
    }
}
