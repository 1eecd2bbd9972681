//! Game configuration loading. The on-disk format is a single JSON document
//! describing every map plus server-wide defaults; it is parsed into serde
//! structs and then converted into a ready [`Game`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{
    DEFAULT_BAG_CAPACITY, DEFAULT_DOG_SPEED, DEFAULT_LOOT_PERIOD_SEC, DEFAULT_LOOT_PROBABILITY,
    DEFAULT_RETIREMENT_TIME_SEC,
};
use crate::game::Game;
use crate::loot::LootKind;
use crate::loot_generator::LootGenerator;
use crate::map::{Building, Map, Office, Road};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map {map:?}: road needs exactly one of x1 or y1")]
    InvalidRoad { map: String },
    #[error("map {map:?}: unknown loot type {name:?}")]
    UnknownLootType { map: String, name: String },
    #[error("duplicate map id {0:?}")]
    DuplicateMap(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameConfig {
    maps: Vec<MapConfig>,
    #[serde(default)]
    default_dog_speed: Option<f64>,
    #[serde(default)]
    default_bag_capacity: Option<usize>,
    #[serde(default)]
    dog_retirement_time: Option<f64>,
    #[serde(default)]
    loot_generator_config: Option<LootGeneratorConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LootGeneratorConfig {
    period: f64,
    probability: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapConfig {
    id: String,
    name: String,
    #[serde(default)]
    dog_speed: Option<f64>,
    #[serde(default)]
    bag_capacity: Option<usize>,
    roads: Vec<RoadConfig>,
    #[serde(default)]
    buildings: Vec<BuildingConfig>,
    #[serde(default)]
    offices: Vec<OfficeConfig>,
    #[serde(default)]
    loot_types: Vec<LootTypeConfig>,
}

#[derive(Debug, Deserialize)]
struct RoadConfig {
    x0: i32,
    y0: i32,
    #[serde(default)]
    x1: Option<i32>,
    #[serde(default)]
    y1: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct BuildingConfig {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfficeConfig {
    id: String,
    x: i32,
    y: i32,
    offset_x: i32,
    offset_y: i32,
}

#[derive(Debug, Deserialize)]
struct LootTypeConfig {
    name: String,
    value: i32,
}

/// Everything the application layer needs from the config file.
pub struct GameSettings {
    pub game: Game,
    pub retirement_time: Duration,
}

pub fn load_game(path: &Path) -> Result<GameSettings, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    parse_game(&text)
}

pub fn parse_game(text: &str) -> Result<GameSettings, ConfigError> {
    let config: GameConfig = serde_json::from_str(text)?;

    let period = config
        .loot_generator_config
        .as_ref()
        .map(|c| c.period)
        .unwrap_or(DEFAULT_LOOT_PERIOD_SEC);
    let probability = config
        .loot_generator_config
        .as_ref()
        .map(|c| c.probability)
        .unwrap_or(DEFAULT_LOOT_PROBABILITY);
    let policy = Arc::new(LootGenerator::new(Duration::from_secs_f64(period), probability));

    let default_speed = config.default_dog_speed.unwrap_or(DEFAULT_DOG_SPEED);
    let default_capacity = config.default_bag_capacity.unwrap_or(DEFAULT_BAG_CAPACITY);

    let mut game = Game::new(policy);
    for map_config in config.maps {
        let map = build_map(map_config, default_speed, default_capacity)?;
        let id = map.id().clone();
        if !game.add_map(map) {
            return Err(ConfigError::DuplicateMap(id));
        }
    }

    let retirement_time = Duration::from_secs_f64(
        config
            .dog_retirement_time
            .unwrap_or(DEFAULT_RETIREMENT_TIME_SEC),
    );

    Ok(GameSettings {
        game,
        retirement_time,
    })
}

fn build_map(
    config: MapConfig,
    default_speed: f64,
    default_capacity: usize,
) -> Result<Map, ConfigError> {
    let mut map = Map::new(config.id.clone(), config.name);
    map.set_dog_speed(config.dog_speed.unwrap_or(default_speed));
    map.set_bag_capacity(config.bag_capacity.unwrap_or(default_capacity));

    for road in config.roads {
        let road = match (road.x1, road.y1) {
            (Some(x1), None) => Road::horizontal(road.x0, road.y0, x1),
            (None, Some(y1)) => Road::vertical(road.x0, road.y0, y1),
            _ => {
                return Err(ConfigError::InvalidRoad {
                    map: config.id.clone(),
                })
            }
        };
        map.add_road(road);
    }

    for building in config.buildings {
        map.add_building(Building {
            x: building.x,
            y: building.y,
            width: building.w,
            height: building.h,
        });
    }

    for office in config.offices {
        map.add_office(Office {
            id: office.id,
            x: office.x,
            y: office.y,
            offset_x: office.offset_x,
            offset_y: office.offset_y,
        });
    }

    for loot_type in config.loot_types {
        let kind = LootKind::parse(&loot_type.name).ok_or_else(|| ConfigError::UnknownLootType {
            map: config.id.clone(),
            name: loot_type.name.clone(),
        })?;
        map.add_loot_type(kind, loot_type.value);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "defaultDogSpeed": 3.0,
        "defaultBagCapacity": 3,
        "dogRetirementTime": 15.0,
        "lootGeneratorConfig": { "period": 5.0, "probability": 0.5 },
        "maps": [
            {
                "id": "town",
                "name": "Town",
                "dogSpeed": 4.0,
                "roads": [
                    { "x0": 0, "y0": 0, "x1": 40 },
                    { "x0": 40, "y0": 0, "y1": 30 }
                ],
                "buildings": [ { "x": 5, "y": 5, "w": 30, "h": 20 } ],
                "offices": [ { "id": "o0", "x": 40, "y": 30, "offsetX": 5, "offsetY": 0 } ],
                "lootTypes": [
                    { "name": "key", "value": 10 },
                    { "name": "wallet", "value": 30 }
                ]
            },
            {
                "id": "village",
                "name": "Village",
                "roads": [ { "x0": 0, "y0": 0, "y1": 10 } ]
            }
        ]
    }"#;

    #[test]
    fn parses_maps_with_defaults_and_overrides() {
        let settings = parse_game(SAMPLE).unwrap();
        assert_eq!(settings.retirement_time, Duration::from_secs(15));

        let town = settings.game.find_map("town").unwrap();
        assert_eq!(town.name(), "Town");
        assert_eq!(town.dog_speed(), 4.0);
        assert_eq!(town.bag_capacity(), 3);
        assert_eq!(town.roads().len(), 2);
        assert!(town.roads()[0].is_horizontal());
        assert!(!town.roads()[1].is_horizontal());
        assert_eq!(town.buildings().len(), 1);
        assert_eq!(town.offices().len(), 1);
        assert_eq!(town.offices()[0].offset_x, 5);
        assert_eq!(town.loot_types().len(), 2);

        let village = settings.game.find_map("village").unwrap();
        assert_eq!(village.dog_speed(), 3.0, "falls back to defaultDogSpeed");
        assert!(village.loot_types().is_empty());
    }

    #[test]
    fn missing_optional_sections_use_built_in_defaults() {
        let settings = parse_game(
            r#"{ "maps": [ { "id": "m", "name": "M", "roads": [ { "x0": 0, "y0": 0, "x1": 5 } ] } ] }"#,
        )
        .unwrap();
        assert_eq!(
            settings.retirement_time,
            Duration::from_secs_f64(crate::constants::DEFAULT_RETIREMENT_TIME_SEC)
        );
        let map = settings.game.find_map("m").unwrap();
        assert_eq!(map.dog_speed(), crate::constants::DEFAULT_DOG_SPEED);
    }

    #[test]
    fn road_without_endpoint_is_rejected() {
        let result = parse_game(
            r#"{ "maps": [ { "id": "m", "name": "M", "roads": [ { "x0": 0, "y0": 0 } ] } ] }"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidRoad { .. })));
    }

    #[test]
    fn unknown_loot_type_name_is_rejected() {
        let result = parse_game(
            r#"{ "maps": [ { "id": "m", "name": "M",
                "roads": [ { "x0": 0, "y0": 0, "x1": 5 } ],
                "lootTypes": [ { "name": "gemstone", "value": 1 } ] } ] }"#,
        );
        assert!(matches!(result, Err(ConfigError::UnknownLootType { .. })));
    }

    #[test]
    fn duplicate_map_ids_are_rejected() {
        let result = parse_game(
            r#"{ "maps": [
                { "id": "m", "name": "M", "roads": [ { "x0": 0, "y0": 0, "x1": 5 } ] },
                { "id": "m", "name": "M2", "roads": [ { "x0": 0, "y0": 0, "x1": 5 } ] }
            ] }"#,
        );
        assert!(matches!(result, Err(ConfigError::DuplicateMap(_))));
    }
}
