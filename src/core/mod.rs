// src/core/mod.rs

pub mod aggregator;
pub mod config_loader;
pub mod fingerprint;
pub mod freshness;
pub mod job_executor;
pub mod lock;
pub mod parameters;
pub mod paths;
pub mod reporter;
pub mod scheduler;
pub mod timer;
