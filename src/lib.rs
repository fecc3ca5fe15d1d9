// Strength rankings for flat-track derby teams, rebuilt from the full game
// history on every computation and served over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod ladder;
pub mod metrics;
pub mod ranker;
