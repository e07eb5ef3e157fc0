// src/services/mod.rs
pub mod calculations;
pub mod calendar;
pub mod context;
pub mod csv_parser;
pub mod error;
pub mod genesis;
pub mod live_price;
pub mod loader;
pub mod merge;
pub mod preferences;
pub mod refresh;
pub mod sample_data;
pub mod state;
pub mod views;
