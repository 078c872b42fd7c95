//! # rfb-core
//!
//! Shared library for the rfb-viewer session controller containing the key
//! symbol translation tables, modifier-state tracking, reserved key
//! sequences, and the desktop geometry used to map between the local
//! viewport and the remote framebuffer.
//!
//! It has zero dependencies on OS APIs, UI frameworks, or network sockets.
//!
//! # Architecture overview
//!
//! An RFB (Remote Framebuffer) viewer shows the screen of a remote machine
//! and forwards the local keyboard and mouse to it.  The remote side does not
//! understand local virtual key codes; it expects X11 *key symbols* (keysyms).
//! It also has its own pixel coordinate system, which differs from the local
//! window whenever the view is scrolled or scaled.
//!
//! - **`keymap`** – Virtual key → keysym translation, the modifier bitset and
//!   its edge-triggered differ, and the predefined special-key sequences
//!   (Ctrl+Alt+Del and friends).
//!
//! - **`domain`** – Pure geometry: points, sizes, rectangles, and the
//!   [`DesktopTransformPolicy`] that maps between viewport and framebuffer.
//!
//! - **`protocol`** – The outbound event values (key events, pointer events)
//!   and the framebuffer description handed over by the protocol engine.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::geometry::{Point, Rect, Size};
pub use domain::transform::{DesktopTransformPolicy, GeometryError};
pub use keymap::modifiers::{Modifier, ModifierState};
pub use keymap::special::SpecialKeys;
pub use keymap::{KeySymbol, KeyTranslator};
pub use protocol::messages::{FramebufferInfo, KeyEvent, PointerButtons, PointerEvent};
