use crate::constants::DOG_PICKUP_LENGTH;
use crate::loot::{ItemId, LootInfo, LootItem};
use crate::types::{Direction, Point, Velocity};

pub type DogId = u32;

/// One player's avatar on a map. All mutation goes through the owning
/// session's methods; nothing outside the session holds a handle to a dog.
#[derive(Clone, Debug)]
pub struct Dog {
    id: DogId,
    name: String,
    position: Point,
    velocity: Velocity,
    direction: Direction,
    bag: Vec<(ItemId, LootInfo)>,
    bag_capacity: usize,
    score: i32,
}

impl Dog {
    pub fn new(name: String, id: DogId, position: Point, bag_capacity: usize) -> Self {
        Self {
            id,
            name,
            position,
            velocity: Velocity::ZERO,
            direction: Direction::North,
            bag: Vec::new(),
            bag_capacity,
            score: 0,
        }
    }

    pub fn id(&self) -> DogId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn bag_capacity(&self) -> usize {
        self.bag_capacity
    }

    pub fn pickup_radius(&self) -> f64 {
        DOG_PICKUP_LENGTH / 2.0
    }

    /// Bag contents in pickup order.
    pub fn bag(&self) -> &[(ItemId, LootInfo)] {
        &self.bag
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn set_velocity(&mut self, velocity: Velocity) {
        self.velocity = velocity;
    }

    pub(crate) fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Puts the item into the bag unless it is already full.
    pub(crate) fn add_item(&mut self, item: &LootItem) -> bool {
        if self.bag.len() >= self.bag_capacity {
            return false;
        }
        self.bag.push((item.id, item.info));
        true
    }

    pub(crate) fn restore_bag_item(&mut self, id: ItemId, info: LootInfo) {
        self.bag.push((id, info));
    }

    /// Empties the bag into an office, scoring each held item's value.
    /// Never fails; an empty bag deposits nothing.
    pub(crate) fn deposit_bag(&mut self) {
        for (_, info) in self.bag.drain(..) {
            self.score += info.value;
        }
    }

    pub(crate) fn add_score(&mut self, score: i32) {
        self.score += score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loot::LootKind;

    fn loot(id: ItemId, value: i32) -> LootItem {
        LootItem {
            id,
            info: LootInfo {
                kind: LootKind::Wallet,
                value,
            },
            position: Point::new(0.0, 0.0),
            width: 0.0,
        }
    }

    #[test]
    fn bag_refuses_items_beyond_capacity() {
        let mut dog = Dog::new("Rex".to_string(), 0, Point::new(0.0, 0.0), 2);
        assert!(dog.add_item(&loot(0, 5)));
        assert!(dog.add_item(&loot(1, 7)));
        assert!(!dog.add_item(&loot(2, 9)));
        assert_eq!(dog.bag().len(), 2);
    }

    #[test]
    fn deposit_scores_and_empties_the_bag() {
        let mut dog = Dog::new("Rex".to_string(), 0, Point::new(0.0, 0.0), 3);
        dog.add_item(&loot(0, 5));
        dog.add_item(&loot(1, 7));
        dog.deposit_bag();
        assert_eq!(dog.score(), 12);
        assert!(dog.bag().is_empty());

        // a second deposit with an empty bag contributes nothing
        dog.deposit_bag();
        assert_eq!(dog.score(), 12);
    }

    #[test]
    fn bag_preserves_pickup_order() {
        let mut dog = Dog::new("Rex".to_string(), 0, Point::new(0.0, 0.0), 3);
        dog.add_item(&loot(4, 1));
        dog.add_item(&loot(2, 1));
        let ids: Vec<ItemId> = dog.bag().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![4, 2]);
    }
}
