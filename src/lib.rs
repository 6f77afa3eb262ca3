#![cfg_attr(not(test), no_std)]

//! # air-dashboard
//! ## An indoor air-quality dashboard in Rust
//!
//! Features:
//! - Temperature, humidity and pressure monitoring
//! - eCO2 / TVOC monitoring with humidity compensation
//! - Air-quality index with colour-coded bands
//! - Gas sensor baseline restored across power cycles
//! - Wall clock
//! - Button switching between the dashboard and a gas detail view

// Must stay first so the logging macros are visible to every module below
mod fmt;

pub mod calibration;
pub mod clock;
pub mod dashboard;
pub mod error;
pub mod metrics;
pub mod preferences;
pub mod rendering;
pub mod screen;
pub mod sensors;
pub mod timer;

#[cfg(feature = "board")]
pub mod board;

pub use dashboard::{BootReport, Dashboard};
pub use preferences::Preferences;
