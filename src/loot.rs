use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Point;

pub type ItemId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LootKind {
    Key,
    Wallet,
    Unknown,
}

impl LootKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "key" => Some(Self::Key),
            "wallet" => Some(Self::Wallet),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Wallet => "wallet",
            Self::Unknown => "unknown",
        }
    }
}

/// Catalog entry: which kind of loot and how many points it deposits for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootInfo {
    pub kind: LootKind,
    pub value: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LootItem {
    pub id: ItemId,
    pub info: LootInfo,
    pub position: Point,
    pub width: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LootStoreError {
    #[error("invalid loot item id {0}")]
    InvalidId(ItemId),
}

/// Sparse, id-reusing store of live loot items.
///
/// Items live in a growable array of optional slots; a freed slot's id goes
/// onto a stack and is reused before the array is extended (LIFO), so ids
/// stay small and stable for each item's lifetime.
#[derive(Clone, Debug, Default)]
pub struct LootStore {
    items: Vec<Option<LootItem>>,
    free_ids: Vec<ItemId>,
}

impl LootStore {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(100),
            free_ids: Vec::with_capacity(100),
        }
    }

    pub fn create(&mut self, info: LootInfo, position: Point) -> LootItem {
        let id = match self.free_ids.pop() {
            Some(id) => id,
            None => {
                self.items.push(None);
                (self.items.len() - 1) as ItemId
            }
        };
        let item = LootItem {
            id,
            info,
            position,
            width: 0.0,
        };
        self.items[id as usize] = Some(item);
        item
    }

    pub fn remove(&mut self, id: ItemId) -> Result<(), LootStoreError> {
        let slot = self
            .items
            .get_mut(id as usize)
            .ok_or(LootStoreError::InvalidId(id))?;
        if slot.take().is_none() {
            return Err(LootStoreError::InvalidId(id));
        }
        self.free_ids.push(id);
        Ok(())
    }

    /// Drops all items and the free list. Used before restoring a snapshot.
    pub fn clear(&mut self) {
        self.items.clear();
        self.free_ids.clear();
    }

    /// Places an item under an explicit id from a persisted snapshot, growing
    /// the array as needed. Does not touch the free list; callers must invoke
    /// [`LootStore::finalize_after_restore`] once all items are loaded, and
    /// must not mix restores with normal allocation.
    pub fn restore_item(&mut self, id: ItemId, info: LootInfo, position: Point, width: f64) {
        let index = id as usize;
        if index >= self.items.len() {
            self.items.resize(index + 1, None);
        }
        self.items[index] = Some(LootItem {
            id,
            info,
            position,
            width,
        });
    }

    /// Rebuilds the free list from every empty slot in range.
    pub fn finalize_after_restore(&mut self) {
        self.free_ids.clear();
        for (index, slot) in self.items.iter().enumerate() {
            if slot.is_none() {
                self.free_ids.push(index as ItemId);
            }
        }
    }

    pub fn get(&self, id: ItemId) -> Option<&LootItem> {
        self.items.get(id as usize)?.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LootItem> {
        self.items.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn item_count(&self) -> usize {
        self.items.len() - self.free_ids.len()
    }
}
