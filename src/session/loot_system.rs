use std::collections::HashSet;

use super::*;
use crate::collision::{find_gather_events, Target, TargetClass};
use crate::map::Cell;

impl GameSession {
    /// Resolves this tick's gathering: one swept-cell query across every
    /// moved dog collects the loot candidates, every office joins the target
    /// list as a deposit target, and the resulting events are applied in
    /// path order.
    pub(super) fn process_loot_events(&mut self, gatherers: &[Gatherer]) {
        if gatherers.is_empty() {
            return;
        }

        let mut checked_cells: HashSet<Cell> = HashSet::new();
        for gatherer in gatherers {
            checked_cells.extend(self.map.cells_on_the_way_area(
                gatherer.start,
                gatherer.end,
                gatherer.width,
            ));
        }

        let mut targets: Vec<Target> = Vec::new();
        for cell in &checked_cells {
            for id in self.map.item_ids_in_cell(*cell) {
                if let Some(item) = self.loot_store.get(id) {
                    targets.push(Target {
                        class: TargetClass::Loot,
                        position: item.position,
                        width: item.width,
                        id,
                    });
                }
            }
        }

        for (index, office) in self.map.offices().iter().enumerate() {
            targets.push(Target {
                class: TargetClass::Office,
                position: Point::new(office.x as f64, office.y as f64),
                width: self.map.office_width(),
                id: index as u32,
            });
        }

        let events = find_gather_events(&targets, gatherers);

        // first gatherer to reach an item claims it for this tick, even when
        // a full bag then refuses the pickup
        let mut picked: HashSet<ItemId> = HashSet::new();
        for event in events {
            match event.class {
                TargetClass::Office => {
                    // a vanished dog id is a skip, not a tick abort
                    if let Some(dog) = self.dogs.get_mut(&event.dog_id) {
                        dog.deposit_bag();
                    }
                }
                TargetClass::Loot => {
                    if !picked.insert(event.target_id) {
                        continue;
                    }
                    let Some(item) = self.loot_store.get(event.target_id).copied() else {
                        continue;
                    };
                    let Some(dog) = self.dogs.get_mut(&event.dog_id) else {
                        continue;
                    };
                    if dog.add_item(&item) && self.loot_store.remove(item.id).is_ok() {
                        self.map.remove_loot_item(&item);
                    }
                }
            }
        }
    }

    /// Asks the shared policy how many items to create and scatters them
    /// uniformly over random roads. The since-last-spawn clock only resets
    /// when something was actually created.
    pub(super) fn spawn_loot(&mut self, delta: Duration) {
        self.time_since_loot_spawn += delta;

        let requested = self.loot_policy.generate(
            self.time_since_loot_spawn,
            self.loot_store.item_count(),
            self.dogs.len(),
        );

        let mut created = 0;
        for _ in 0..requested {
            let kind = self.random_loot_kind();
            if kind == LootKind::Unknown {
                continue;
            }
            let info = self.map.loot_info_for(kind);
            let position = self.random_road_point();
            let item = self.loot_store.create(info, position);
            self.map.add_loot_item(&item);
            created += 1;
        }

        if created > 0 {
            self.time_since_loot_spawn = Duration::ZERO;
        }
    }
}
