//! Application layer of the viewer.
//!
//! # What lives here?
//!
//! - **`engine`** – The [`engine::ProtocolEngine`] trait the session drives,
//!   the inbound [`engine::EngineEvent`]s, and the [`engine::EngineEventSender`]
//!   that marshals them onto the session thread.
//!
//! - **`session`** – The connect/authenticate/run/disconnect state machine.
//!   Owns the modifier snapshot, update scheduler and transform policy.
//!
//! - **`update_scheduler`** – Full vs. incremental update requests, one
//!   outstanding at a time.
//!
//! - **`forward_input`** – Raw local input → modifier sync + key/pointer
//!   events.
//!
//! - **`special_keys`** – Ordered press/release of reserved combinations.
//!
//! - **`event_loop`** – The Tokio task that owns the session and the
//!   cloneable handle the UI talks to.
//!
//! Everything here depends only on traits; concrete engines, credential
//! providers and input sources are injected from `infrastructure`.

pub mod engine;
pub mod event_loop;
pub mod forward_input;
pub mod session;
pub mod special_keys;
pub mod update_scheduler;
