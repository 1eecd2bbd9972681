pub mod app;
pub mod collision;
pub mod config;
pub mod constants;
pub mod dog;
pub mod game;
pub mod loot;
pub mod loot_generator;
pub mod map;
pub mod records;
pub mod session;
pub mod state_store;
pub mod types;
