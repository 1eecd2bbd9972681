use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::collision::Gatherer;
use crate::dog::{Dog, DogId};
use crate::loot::{ItemId, LootInfo, LootItem, LootKind, LootStore};
use crate::loot_generator::LootPolicy;
use crate::map::{Map, MapId};
use crate::types::{Direction, Point, Velocity};

mod loot_system;
mod movement;

/// Live state bound to one map: its dogs and loot. The session owns all
/// mutation of dog positions, velocities and bags, and drives one
/// simulation tick: move, collide, deposit/collect, regenerate loot.
pub struct GameSession {
    map: Map,
    dogs: BTreeMap<DogId, Dog>,
    loot_store: LootStore,
    loot_policy: Arc<dyn LootPolicy>,
    time_since_loot_spawn: Duration,
    randomize_spawn_points: bool,
    rng: SmallRng,
}

impl GameSession {
    pub fn new(map: Map, loot_policy: Arc<dyn LootPolicy>, seed: u64) -> Self {
        Self {
            map,
            dogs: BTreeMap::new(),
            loot_store: LootStore::new(),
            loot_policy,
            time_since_loot_spawn: Duration::ZERO,
            randomize_spawn_points: false,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn map_id(&self) -> &MapId {
        self.map.id()
    }

    pub fn dog(&self, id: DogId) -> Option<&Dog> {
        self.dogs.get(&id)
    }

    pub fn dogs(&self) -> impl Iterator<Item = &Dog> {
        self.dogs.values()
    }

    pub fn dog_count(&self) -> usize {
        self.dogs.len()
    }

    pub fn loot_items(&self) -> Vec<LootItem> {
        self.loot_store.iter().copied().collect()
    }

    pub fn set_randomize_spawn_points(&mut self, value: bool) {
        self.randomize_spawn_points = value;
    }

    /// Creates a dog for a joining player. Ids are assigned by the caller
    /// and must be unique per session; a clash is a no-op.
    pub fn spawn_dog(&mut self, name: &str, id: DogId, bag_capacity: usize) -> Option<&Dog> {
        if self.dogs.contains_key(&id) {
            return None;
        }
        let position = self.dog_spawn_point();
        let dog = Dog::new(name.to_string(), id, position, bag_capacity);
        Some(self.dogs.entry(id).or_insert(dog))
    }

    /// Unconditional removal, used when a player is retired.
    pub fn remove_dog(&mut self, id: DogId) {
        self.dogs.remove(&id);
    }

    /// Points the dog and sets its velocity from the map's configured speed.
    pub fn move_dog(&mut self, id: DogId, direction: Direction) -> bool {
        let speed = self.map.dog_speed();
        let Some(dog) = self.dogs.get_mut(&id) else {
            return false;
        };
        dog.set_direction(direction);
        dog.set_velocity(direction.velocity(speed));
        true
    }

    pub fn stop_dog(&mut self, id: DogId) -> bool {
        let Some(dog) = self.dogs.get_mut(&id) else {
            return false;
        };
        dog.set_velocity(Velocity::ZERO);
        true
    }

    /// Wipes dogs, loot and the loot spatial index before a snapshot restore.
    pub fn clear_dynamic_state(&mut self) {
        self.dogs.clear();
        self.loot_store.clear();
        self.map.clear_loot_index();
        self.time_since_loot_spawn = Duration::ZERO;
    }

    /// Re-inserts a dog from a snapshot. Fails on a duplicate id.
    pub fn restore_dog(&mut self, dog: Dog) -> bool {
        if self.dogs.contains_key(&dog.id()) {
            return false;
        }
        self.dogs.insert(dog.id(), dog);
        true
    }

    /// Re-inserts a loot item from a snapshot under its original id and
    /// indexes it spatially. [`GameSession::finalize_after_restore`] must be
    /// called once after the last item.
    pub fn restore_loot_item(&mut self, id: ItemId, info: LootInfo, position: Point, width: f64) {
        self.loot_store.restore_item(id, info, position, width);
        if let Some(item) = self.loot_store.get(id) {
            let item = *item;
            self.map.add_loot_item(&item);
        }
    }

    pub fn finalize_after_restore(&mut self) {
        self.loot_store.finalize_after_restore();
    }

    /// Advances the session by one discrete time step.
    pub fn tick(&mut self, delta: Duration) {
        let dt = delta.as_secs_f64();
        let mut gatherers: Vec<Gatherer> = Vec::new();

        for dog in self.dogs.values_mut() {
            let velocity = dog.velocity();
            if velocity.is_zero() {
                continue;
            }

            let from = dog.position();
            let target = Point::new(from.x + velocity.vx * dt, from.y + velocity.vy * dt);
            let clamped = movement::restrict_movement_to_roads(&self.map, from, target);

            if clamped == from {
                continue;
            }

            dog.set_position(clamped);
            gatherers.push(Gatherer {
                start: from,
                end: clamped,
                width: dog.pickup_radius(),
                dog_id: dog.id(),
            });

            // hit a corridor wall: the dog stops, not just this step
            if clamped != target {
                dog.set_velocity(Velocity::ZERO);
            }
        }

        self.process_loot_events(&gatherers);
        self.spawn_loot(delta);
    }

    fn dog_spawn_point(&mut self) -> Point {
        if self.randomize_spawn_points {
            return self.random_road_point();
        }

        match self.map.roads().first() {
            Some(road) => {
                let (x, y) = road.start();
                Point::new(x as f64, y as f64)
            }
            None => Point::new(0.0, 0.0),
        }
    }

    fn random_road_point(&mut self) -> Point {
        let roads = self.map.roads();
        if roads.is_empty() {
            return Point::new(0.0, 0.0);
        }

        let road = roads[self.rng.random_range(0..roads.len())];
        if road.is_horizontal() {
            let x = self
                .rng
                .random_range(road.min_along_axis()..=road.max_along_axis());
            Point::new(x as f64, road.start().1 as f64)
        } else {
            let y = self
                .rng
                .random_range(road.min_along_axis()..=road.max_along_axis());
            Point::new(road.start().0 as f64, y as f64)
        }
    }

    fn random_loot_kind(&mut self) -> LootKind {
        let count = self.map.loot_type_count();
        if count == 0 {
            return LootKind::Unknown;
        }
        self.map.loot_kind_at(self.rng.random_range(0..count))
    }
}
