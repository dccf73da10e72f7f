//! Homeroom Core: Canvas polling, per-student homework change detection,
//! tracking-state persistence and notification delivery.

pub mod config;
pub mod connectors;
pub mod correlate;
pub mod error;
pub mod gate;
pub mod models;
pub mod monitor;
pub mod notify;
pub mod poller;
pub mod presentation;
pub mod scheduler;
pub mod store;
pub mod tracker;

#[cfg(test)]
mod testing;
