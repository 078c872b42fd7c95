//! rfb-viewer library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does rfb-viewer do? (for beginners)
//!
//! A *viewer* shows the desktop of a remote machine running an RFB (VNC)
//! server and forwards the local keyboard and mouse to it.  The wire protocol
//! itself (handshake, encodings, pixel decoding) lives in a protocol engine
//! behind the [`application::engine::ProtocolEngine`] trait; this crate is
//! the *session controller* around it:
//!
//! 1. Validates the connect parameters and asks the engine to open the
//!    transport.
//! 2. Asks a [`application::session::CredentialProvider`] for a password
//!    when the server demands one.
//! 3. Completes the handshake, then keeps exactly one framebuffer update
//!    request outstanding (full or incremental).
//! 4. Translates local key presses into X11 keysyms, keeping the remote
//!    modifier state in step, and maps local pointer coordinates into the
//!    remote framebuffer.
//! 5. Reports the first failure from any thread exactly once, on the session
//!    thread, and tears the session down.

/// Application layer: the session state machine and its collaborators' traits.
pub mod application;

/// Infrastructure layer: mock engine, credential providers, input source,
/// UI bridge, and configuration storage.
pub mod infrastructure;
