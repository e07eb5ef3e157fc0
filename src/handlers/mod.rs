// src/handlers/mod.rs
pub mod error;
pub mod genesis;
pub mod preferences;
pub mod price;
pub mod series;
