//! Barvis drink-dispenser firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod json;
pub mod link;
pub mod orders;
pub mod pins;
pub mod scheduler;

// The ESP-IDF-only parts of these are guarded by cfg attributes inside,
// so the crate compiles on the host too.
pub mod adapters;
pub mod drivers;
