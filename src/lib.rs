//! Furrow library crate: re-exports all modules for integration testing.
//!
//! The binary crate (`main.rs`) is the actual game entry point.
//! This library crate exposes the same modules so that `tests/` integration
//! tests can drive the simulation without needing a window or GPU.

pub mod config;
pub mod farming;
pub mod input;
pub mod iso;
pub mod save;
pub mod scene;
pub mod shared;
pub mod sim;
pub mod terrain;
pub mod ui;
pub mod vehicle;
