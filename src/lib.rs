pub mod cli;
pub mod constants;
pub mod core;
pub mod engine;
pub mod models;
