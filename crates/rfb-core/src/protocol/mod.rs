//! Outbound protocol event values.
//!
//! These are the *values* handed to the protocol engine; turning them into
//! RFB wire bytes is the engine's job and lives outside this crate.

pub mod messages;

pub use messages::*;
