//! Protocol engine implementations.
//!
//! The RFB wire codec and transport live outside this crate and plug in
//! through [`crate::application::engine::ProtocolEngine`].  This module only
//! ships the recording mock used by the tests and the demo binary.

pub mod mock;
