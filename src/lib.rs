//! mplay - Range-addressable media streaming server
//!
//! This library crate exposes the server pieces for integration testing.

pub mod catalog;
pub mod config;
pub mod server;
pub mod streaming;
