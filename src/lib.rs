pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod event_log;
pub mod events;
pub mod memory;
pub mod metrics;
pub mod models;
pub mod output;
pub mod reconcile;
pub mod render;
pub mod snapshot;
pub mod transport;

pub use engine::Engine;
