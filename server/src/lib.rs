//! Multicam scene server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod body;
pub mod clock;
pub mod color;
pub mod config;
pub mod directory;
pub mod event_bus;
pub mod obstacle;
pub mod protocol;
pub mod scene;
pub mod session_loop;
pub mod viewport;
pub mod ws;
