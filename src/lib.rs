//! Telephone-line alarm firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alarm;
pub mod app;
pub mod config;
pub mod error;
pub mod identity_set;
pub mod pins;
pub mod poller;

// The ESP-IDF implementations inside these are cfg-guarded; host builds
// get simulation stubs.
pub mod adapters;
pub mod drivers;
pub mod sensors;
