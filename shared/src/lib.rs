//! Types shared between the multicam server and its clients.

pub mod config;
pub mod protocol;
pub mod tile;
pub mod vec3;
