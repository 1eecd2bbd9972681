//! Serialized server state: every session's dogs and loot plus the player
//! registry. Written as one JSON document; saves go through a temp file and
//! an atomic rename so a crash mid-write never corrupts the previous save.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("state file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file json failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppState {
    pub maps: Vec<MapState>,
    pub auth: AuthState,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapState {
    pub map_id: String,
    pub dogs: Vec<DogState>,
    pub loot: Vec<LootState>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DogState {
    pub id: u32,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub dir: String,
    pub bag_capacity: usize,
    pub score: i32,
    pub bag: Vec<BagItemState>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BagItemState {
    pub id: u32,
    pub kind: String,
    pub value: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LootState {
    pub id: u32,
    pub kind: String,
    pub value: i32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthState {
    pub next_player_id: u32,
    pub players: Vec<PlayerState>,
    pub tokens: Vec<TokenState>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: u32,
    pub dog_id: u32,
    pub map_id: String,
    pub play_time_sec: f64,
    pub idle_time_sec: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenState {
    pub token: String,
    pub player_id: u32,
}

/// Save/load endpoint for one state file path.
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, state: &AppState) -> Result<(), StateStoreError> {
        let json = serde_json::to_string(state)?;
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    pub fn load(&self) -> Result<AppState, StateStoreError> {
        let text = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> AppState {
        AppState {
            maps: vec![MapState {
                map_id: "town".to_string(),
                dogs: vec![DogState {
                    id: 0,
                    name: "Rex".to_string(),
                    x: 1.5,
                    y: 0.0,
                    vx: 2.0,
                    vy: 0.0,
                    dir: "R".to_string(),
                    bag_capacity: 3,
                    score: 40,
                    bag: vec![BagItemState {
                        id: 2,
                        kind: "key".to_string(),
                        value: 10,
                    }],
                }],
                loot: vec![LootState {
                    id: 1,
                    kind: "wallet".to_string(),
                    value: 30,
                    x: 7.0,
                    y: 0.0,
                    width: 0.0,
                }],
            }],
            auth: AuthState {
                next_player_id: 1,
                players: vec![PlayerState {
                    id: 0,
                    dog_id: 0,
                    map_id: "town".to_string(),
                    play_time_sec: 12.5,
                    idle_time_sec: 0.0,
                }],
                tokens: vec![TokenState {
                    token: "a".repeat(32),
                    player_id: 0,
                }],
            },
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join("lootdog-state-test");
        std::fs::create_dir_all(&dir).unwrap();
        let file = StateFile::new(dir.join("state.json"));

        file.save(&sample_state()).unwrap();
        assert!(file.exists());
        let loaded = file.load().unwrap();

        assert_eq!(loaded.maps.len(), 1);
        assert_eq!(loaded.maps[0].dogs[0].name, "Rex");
        assert_eq!(loaded.maps[0].dogs[0].bag[0].kind, "key");
        assert_eq!(loaded.maps[0].loot[0].value, 30);
        assert_eq!(loaded.auth.next_player_id, 1);
        assert_eq!(loaded.auth.tokens[0].player_id, 0);

        std::fs::remove_file(file.path()).unwrap();
    }

    #[test]
    fn save_replaces_previous_content() {
        let dir = std::env::temp_dir().join("lootdog-state-test-replace");
        std::fs::create_dir_all(&dir).unwrap();
        let file = StateFile::new(dir.join("state.json"));

        file.save(&sample_state()).unwrap();
        file.save(&AppState::default()).unwrap();
        let loaded = file.load().unwrap();
        assert!(loaded.maps.is_empty());
        assert_eq!(loaded.auth.next_player_id, 0);

        std::fs::remove_file(file.path()).unwrap();
    }

    #[test]
    fn load_of_missing_file_is_an_io_error() {
        let file = StateFile::new(PathBuf::from("/nonexistent/lootdog/state.json"));
        assert!(!file.exists());
        assert!(matches!(file.load(), Err(StateStoreError::Io(_))));
    }
}
