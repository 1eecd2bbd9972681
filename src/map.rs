use std::collections::{BTreeSet, HashMap};

use crate::constants::{DEFAULT_BAG_CAPACITY, DEFAULT_DOG_SPEED, OFFICE_WIDTH};
use crate::loot::{ItemId, LootInfo, LootKind, LootItem};
use crate::types::Point;

pub type MapId = String;

/// Integer grid cell used by the road and item spatial indexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn containing(point: Point) -> Self {
        Self {
            x: point.x.floor() as i32,
            y: point.y.floor() as i32,
        }
    }
}

/// An axis-aligned road. The constructors are the only way to build one, so
/// every road is strictly horizontal or strictly vertical.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Road {
    start_x: i32,
    start_y: i32,
    end_x: i32,
    end_y: i32,
}

impl Road {
    pub fn horizontal(start_x: i32, start_y: i32, end_x: i32) -> Self {
        Self {
            start_x,
            start_y,
            end_x,
            end_y: start_y,
        }
    }

    pub fn vertical(start_x: i32, start_y: i32, end_y: i32) -> Self {
        Self {
            start_x,
            start_y,
            end_x: start_x,
            end_y,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        self.start_y == self.end_y
    }

    pub fn start(&self) -> (i32, i32) {
        (self.start_x, self.start_y)
    }

    pub fn end(&self) -> (i32, i32) {
        (self.end_x, self.end_y)
    }

    /// Smallest coordinate along the road's own axis.
    pub fn min_along_axis(&self) -> i32 {
        if self.is_horizontal() {
            self.start_x.min(self.end_x)
        } else {
            self.start_y.min(self.end_y)
        }
    }

    pub fn max_along_axis(&self) -> i32 {
        if self.is_horizontal() {
            self.start_x.max(self.end_x)
        } else {
            self.start_y.max(self.end_y)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Building {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Office {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// Static map geometry plus two derived spatial indexes: roads by cell
/// (built once, or rebuilt after bulk loading) and live loot item ids by
/// cell (mutated as items spawn and disappear).
#[derive(Clone, Debug)]
pub struct Map {
    id: MapId,
    name: String,
    roads: Vec<Road>,
    buildings: Vec<Building>,
    offices: Vec<Office>,
    loot_types: Vec<LootInfo>,

    roads_by_cell: HashMap<Cell, Vec<usize>>,
    items_by_cell: HashMap<Cell, BTreeSet<ItemId>>,

    dog_speed: f64,
    bag_capacity: usize,
}

impl Map {
    pub fn new(id: MapId, name: String) -> Self {
        Self {
            id,
            name,
            roads: Vec::new(),
            buildings: Vec::new(),
            offices: Vec::new(),
            loot_types: Vec::new(),
            roads_by_cell: HashMap::new(),
            items_by_cell: HashMap::new(),
            dog_speed: DEFAULT_DOG_SPEED,
            bag_capacity: DEFAULT_BAG_CAPACITY,
        }
    }

    pub fn id(&self) -> &MapId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn offices(&self) -> &[Office] {
        &self.offices
    }

    pub fn office_width(&self) -> f64 {
        OFFICE_WIDTH
    }

    pub fn dog_speed(&self) -> f64 {
        self.dog_speed
    }

    pub fn set_dog_speed(&mut self, speed: f64) {
        self.dog_speed = speed;
    }

    pub fn bag_capacity(&self) -> usize {
        self.bag_capacity
    }

    pub fn set_bag_capacity(&mut self, capacity: usize) {
        self.bag_capacity = capacity;
    }

    pub fn add_road(&mut self, road: Road) {
        let index = self.roads.len();
        self.roads.push(road);
        self.index_road_cells(index);
    }

    pub fn add_building(&mut self, building: Building) {
        self.buildings.push(building);
    }

    pub fn add_office(&mut self, office: Office) {
        self.offices.push(office);
    }

    pub fn add_loot_type(&mut self, kind: LootKind, value: i32) {
        self.loot_types.push(LootInfo { kind, value });
    }

    pub fn loot_type_count(&self) -> usize {
        self.loot_types.len()
    }

    pub fn loot_kind_at(&self, index: usize) -> LootKind {
        self.loot_types[index].kind
    }

    pub fn loot_info_for(&self, kind: LootKind) -> LootInfo {
        self.loot_types
            .iter()
            .copied()
            .find(|info| info.kind == kind)
            .unwrap_or(LootInfo {
                kind: LootKind::Unknown,
                value: 0,
            })
    }

    pub fn loot_types(&self) -> &[LootInfo] {
        &self.loot_types
    }

    /// Rebuilds the road cell index from scratch after bulk loading.
    pub fn rebuild_road_cell_index(&mut self) {
        self.roads_by_cell.clear();
        self.roads_by_cell.reserve(self.roads.len() * 2);
        for index in 0..self.roads.len() {
            self.index_road_cells(index);
        }
    }

    fn index_road_cells(&mut self, road_index: usize) {
        let road = self.roads[road_index];

        if road.is_horizontal() {
            let y = road.start().1;
            let x0 = road.min_along_axis();
            let x1 = road.max_along_axis();
            for x in x0..=x1 {
                self.roads_by_cell
                    .entry(Cell { x, y })
                    .or_default()
                    .push(road_index);
            }
            // touch adjacent rows so queries with a fractional y just outside
            // the whole-number row near a corridor edge still find the road
            self.roads_by_cell.entry(Cell { x: x0, y: y - 1 }).or_default();
            self.roads_by_cell.entry(Cell { x: x0, y: y + 1 }).or_default();
            return;
        }

        let x = road.start().0;
        let y0 = road.min_along_axis();
        let y1 = road.max_along_axis();
        for y in y0..=y1 {
            self.roads_by_cell
                .entry(Cell { x, y })
                .or_default()
                .push(road_index);
        }
    }

    /// Road indices that may contain the given point. Checks the point's own
    /// cell plus five neighbors to tolerate queries near cell borders; the
    /// caller still verifies actual corridor containment.
    pub fn road_candidates(&self, point: Point) -> Vec<usize> {
        let base = Cell::containing(point);
        let mut result = Vec::with_capacity(8);

        let mut add_from_cell = |x: i32, y: i32| {
            if let Some(indices) = self.roads_by_cell.get(&Cell { x, y }) {
                result.extend_from_slice(indices);
            }
        };

        add_from_cell(base.x, base.y);
        add_from_cell(base.x + 1, base.y);
        add_from_cell(base.x, base.y + 1);
        add_from_cell(base.x + 1, base.y + 1);
        add_from_cell(base.x - 1, base.y);
        add_from_cell(base.x, base.y - 1);

        result.sort_unstable();
        result.dedup();
        result
    }

    pub fn add_loot_item(&mut self, item: &LootItem) {
        self.items_by_cell
            .entry(Cell::containing(item.position))
            .or_default()
            .insert(item.id);
    }

    pub fn remove_loot_item(&mut self, item: &LootItem) {
        if let Some(ids) = self.items_by_cell.get_mut(&Cell::containing(item.position)) {
            ids.remove(&item.id);
        }
    }

    pub fn clear_loot_index(&mut self) {
        self.items_by_cell.clear();
    }

    pub fn item_ids_in_cell(&self, cell: Cell) -> impl Iterator<Item = ItemId> + '_ {
        self.items_by_cell
            .get(&cell)
            .into_iter()
            .flat_map(|ids| ids.iter().copied())
    }

    /// Every cell in the bounding box of the segment `from`->`to` expanded by
    /// `width` on all sides. One query per tick replaces per-dog item scans.
    pub fn cells_on_the_way_area(&self, from: Point, to: Point, width: f64) -> Vec<Cell> {
        let min_x = (from.x.min(to.x) - width).floor() as i32;
        let max_x = (from.x.max(to.x) + width).floor() as i32;
        let min_y = (from.y.min(to.y) - width).floor() as i32;
        let max_y = (from.y.max(to.y) + width).floor() as i32;

        let mut result =
            Vec::with_capacity(((max_x - min_x + 1) * (max_y - min_y + 1)) as usize);
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                result.push(Cell { x, y });
            }
        }
        result
    }
}
