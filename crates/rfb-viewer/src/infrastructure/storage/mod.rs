//! Persistent storage for the viewer (TOML configuration only).

pub mod config;
