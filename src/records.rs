//! Retired-player leaderboard, kept as a JSON file on disk. Every retirement
//! appends one record; reads are paged and sorted by score. An in-memory-only
//! store (no path) backs tests and the headless simulator.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub score: i32,
    pub play_time_sec: f64,
    pub retired_at: DateTime<Utc>,
}

pub struct RecordsStore {
    path: Option<PathBuf>,
    records: Vec<PlayerRecord>,
}

impl RecordsStore {
    /// Opens the store at `path`, loading any existing records. A missing or
    /// unreadable file starts the store empty.
    pub fn open(path: PathBuf) -> Self {
        let records = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                eprintln!("records file {} is not valid json: {err}", path.display());
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        Self {
            path: Some(path),
            records,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: Vec::new(),
        }
    }

    pub fn add_record(&mut self, record: PlayerRecord) {
        self.records.push(record);
        self.persist();
    }

    /// Records sorted by score descending, paged by `start` and `max_items`.
    pub fn get(&self, start: usize, max_items: usize) -> Vec<PlayerRecord> {
        let mut sorted: Vec<PlayerRecord> = self.records.clone();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));
        sorted.into_iter().skip(start).take(max_items).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let json = match serde_json::to_string(&self.records) {
            Ok(json) => json,
            Err(err) => {
                eprintln!("failed to serialize records: {err}");
                return;
            }
        };
        let tmp_path = path.with_extension("tmp");
        let result =
            std::fs::write(&tmp_path, json).and_then(|_| std::fs::rename(&tmp_path, path));
        if let Err(err) = result {
            eprintln!("failed to save records to {}: {err}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, score: i32) -> PlayerRecord {
        PlayerRecord {
            name: name.to_string(),
            score,
            play_time_sec: 30.0,
            retired_at: Utc::now(),
        }
    }

    #[test]
    fn records_are_paged_by_descending_score() {
        let mut store = RecordsStore::in_memory();
        store.add_record(record("low", 5));
        store.add_record(record("high", 50));
        store.add_record(record("mid", 20));

        let page = store.get(0, 2);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "high");
        assert_eq!(page[1].name, "mid");

        let rest = store.get(2, 10);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].name, "low");

        assert!(store.get(5, 10).is_empty());
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = std::env::temp_dir().join("lootdog-records-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("records.json");
        let _ = std::fs::remove_file(&path);

        {
            let mut store = RecordsStore::open(path.clone());
            assert!(store.is_empty());
            store.add_record(record("Rex", 40));
        }

        let store = RecordsStore::open(path.clone());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0, 10)[0].name, "Rex");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_starts_empty() {
        let store = RecordsStore::open(PathBuf::from("/nonexistent/lootdog/records.json"));
        assert!(store.is_empty());
    }
}
