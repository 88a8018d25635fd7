//! Growatt bridge firmware library.
//!
//! Exposes the scheduling loop, its ports, and the platform-free adapters
//! for integration testing. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod payload;
pub mod pins;
pub mod publisher;
pub mod scheduler;
pub mod supervisor;
pub mod telemetry;
pub mod update;

pub mod adapters;
pub mod drivers;
