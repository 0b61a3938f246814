// src/cli/handlers/mod.rs

pub mod clean;
pub mod commons;
pub mod transform;
