//! Infrastructure layer for the viewer.
//!
//! Contains the adapters plugged into the application layer's traits.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `rfb_core`, but the session logic must only ever see the traits.
//!
//! # Sub-modules
//!
//! - **`engine`** – Protocol engine implementations (a recording mock).
//!
//! - **`credentials`** – Static and environment-variable credential
//!   providers.
//!
//! - **`input_source`** – The raw local input event type and the
//!   [`input_source::RawInputSource`] trait, with a mock that also acts as
//!   the reserved-key hook.
//!
//! - **`ui_bridge`** – Turns session notifications into serializable
//!   [`ui_bridge::ViewerEvent`]s for the UI.
//!
//! - **`storage`** – TOML configuration persistence.

pub mod credentials;
pub mod engine;
pub mod input_source;
pub mod storage;
pub mod ui_bridge;
