//! Domain entities for the viewer: pure geometry with no infrastructure
//! dependencies.
//!
//! The remote framebuffer and the local viewport are two coordinate spaces.
//! Everything that converts between them (invalidation rectangles, image
//! placement, pointer positions) lives here so that it can be tested without
//! a window or a network connection.

/// Points, sizes and rectangles.
pub mod geometry;

/// Viewport ↔ framebuffer mapping.
///
/// See [`transform::DesktopTransformPolicy`] for the main type.
pub mod transform;
