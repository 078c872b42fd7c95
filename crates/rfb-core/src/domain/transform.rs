//! Desktop transform policy: how the remote framebuffer is placed in the
//! local viewport.
//!
//! Three placements exist:
//!
//! | Variant      | Image placement                    | Auto-scroll | Pointer mapping          |
//! |--------------|------------------------------------|-------------|--------------------------|
//! | `Clipped`    | native scale, cropped, scrollable  | yes         | viewport + scroll offset |
//! | `Scaled`     | stretched to fill the viewport     | no          | viewport ÷ scale factor  |
//! | `DesignMode` | static placeholder, no live session| no          | identity                 |
//!
//! The policy never touches pixels; it only computes rectangles and points.

use thiserror::Error;

use super::geometry::{Point, Rect, Size};
use crate::protocol::messages::{PointerButtons, PointerEvent};

/// Errors that can occur when building a transform policy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// The remote framebuffer reported a zero width or height.
    #[error("framebuffer has no area ({0}x{1})")]
    EmptyFramebuffer(u32, u32),
    /// The remote framebuffer exceeds the 16-bit RFB dimension limit.
    #[error("framebuffer {0}x{1} exceeds 65535 pixels on a side")]
    OversizedFramebuffer(u32, u32),
}

/// Largest width or height an RFB server can announce.
pub const MAX_FRAMEBUFFER_DIMENSION: u32 = u16::MAX as u32;

/// Mapping between viewport space and framebuffer space.
#[derive(Debug, Clone, PartialEq)]
pub enum DesktopTransformPolicy {
    /// Native scale; the viewport shows a window onto the framebuffer
    /// starting at `scroll`.
    Clipped {
        framebuffer: Size,
        viewport: Size,
        scroll: Point,
    },
    /// The framebuffer is stretched to `viewport`, independently per axis.
    Scaled { framebuffer: Size, viewport: Size },
    /// No live session: identity geometry sized to a placeholder image.
    DesignMode { placeholder: Size },
}

impl DesktopTransformPolicy {
    /// A clipped policy scrolled to the top-left corner.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyFramebuffer`] if `framebuffer` has no area
    /// and [`GeometryError::OversizedFramebuffer`] if either side is larger
    /// than [`MAX_FRAMEBUFFER_DIMENSION`].
    pub fn clipped(framebuffer: Size, viewport: Size) -> Result<Self, GeometryError> {
        check_framebuffer(framebuffer)?;
        Ok(Self::Clipped {
            framebuffer,
            viewport,
            scroll: Point::default(),
        })
    }

    /// A scaled policy stretching `framebuffer` to `viewport`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyFramebuffer`] if `framebuffer` has no area
    /// and [`GeometryError::OversizedFramebuffer`] if either side is larger
    /// than [`MAX_FRAMEBUFFER_DIMENSION`].
    pub fn scaled(framebuffer: Size, viewport: Size) -> Result<Self, GeometryError> {
        check_framebuffer(framebuffer)?;
        Ok(Self::Scaled { framebuffer, viewport })
    }

    /// Placeholder geometry used while no session is live.
    pub fn design_mode(placeholder: Size) -> Self {
        Self::DesignMode { placeholder }
    }

    /// Builds the policy for a freshly connected session.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyFramebuffer`] if `framebuffer` has no area
    /// and [`GeometryError::OversizedFramebuffer`] if either side is larger
    /// than [`MAX_FRAMEBUFFER_DIMENSION`].
    pub fn for_session(
        framebuffer: Size,
        viewport: Size,
        scaled: bool,
    ) -> Result<Self, GeometryError> {
        if scaled {
            Self::scaled(framebuffer, viewport)
        } else {
            Self::clipped(framebuffer, viewport)
        }
    }

    /// Whether the hosting view should show scrollbars and follow the
    /// pointer.  Only the clipped variant scrolls.
    pub fn auto_scroll(&self) -> bool {
        matches!(self, Self::Clipped { .. })
    }

    /// Returns `true` for the scaled variant.
    pub fn is_scaled(&self) -> bool {
        matches!(self, Self::Scaled { .. })
    }

    /// The remote framebuffer size, or `None` in design mode.
    pub fn framebuffer_size(&self) -> Option<Size> {
        match self {
            Self::Clipped { framebuffer, .. } | Self::Scaled { framebuffer, .. } => {
                Some(*framebuffer)
            }
            Self::DesignMode { .. } => None,
        }
    }

    /// The current viewport size.
    pub fn viewport_size(&self) -> Size {
        match self {
            Self::Clipped { viewport, .. } | Self::Scaled { viewport, .. } => *viewport,
            Self::DesignMode { placeholder } => *placeholder,
        }
    }

    /// The current scroll offset (zero for non-clipped variants).
    pub fn scroll_offset(&self) -> Point {
        match self {
            Self::Clipped { scroll, .. } => *scroll,
            _ => Point::default(),
        }
    }

    /// Horizontal and vertical scale factors (viewport ÷ framebuffer).
    pub fn scale_factors(&self) -> (f64, f64) {
        match self {
            Self::Scaled { framebuffer, viewport } => (
                f64::from(viewport.width) / f64::from(framebuffer.width),
                f64::from(viewport.height) / f64::from(framebuffer.height),
            ),
            _ => (1.0, 1.0),
        }
    }

    /// Switches between the clipped and scaled variants, keeping the sizes.
    ///
    /// Design mode is returned unchanged.
    #[must_use]
    pub fn with_scaling(&self, scaled: bool) -> Self {
        match (self, scaled) {
            (Self::Clipped { framebuffer, viewport, .. }, true) => Self::Scaled {
                framebuffer: *framebuffer,
                viewport: *viewport,
            },
            (Self::Scaled { framebuffer, viewport }, false) => Self::Clipped {
                framebuffer: *framebuffer,
                viewport: *viewport,
                scroll: Point::default(),
            },
            _ => self.clone(),
        }
    }

    /// Updates the viewport size, re-clamping the scroll offset.
    pub fn set_viewport(&mut self, size: Size) {
        match self {
            Self::Clipped { framebuffer, viewport, scroll } => {
                *viewport = size;
                *scroll = clamp_scroll(*scroll, *framebuffer, size);
            }
            Self::Scaled { viewport, .. } => *viewport = size,
            Self::DesignMode { placeholder } => *placeholder = size,
        }
    }

    /// Scrolls a clipped view to `offset` (clamped to the framebuffer) and
    /// returns the effective offset.  Other variants ignore the call.
    pub fn scroll_to(&mut self, offset: Point) -> Point {
        match self {
            Self::Clipped { framebuffer, viewport, scroll } => {
                *scroll = clamp_scroll(offset, *framebuffer, *viewport);
                *scroll
            }
            _ => Point::default(),
        }
    }

    /// Maps a just-drawn framebuffer rectangle to the viewport rectangle that
    /// must be invalidated.
    ///
    /// Scaled rectangles are widened outward to whole pixels so partial pixels
    /// at the edges are repainted too.
    pub fn adjust_update_rectangle(&self, rect: Rect) -> Rect {
        match self {
            Self::Clipped { scroll, .. } => rect.offset(-scroll.x, -scroll.y),
            Self::Scaled { .. } => {
                let (sx, sy) = self.scale_factors();
                let left = (f64::from(rect.x) * sx).floor() as i32;
                let top = (f64::from(rect.y) * sy).floor() as i32;
                let right = (f64::from(rect.right()) * sx).ceil() as i32;
                let bottom = (f64::from(rect.bottom()) * sy).ceil() as i32;
                Rect::new(
                    left,
                    top,
                    right.saturating_sub(left).max(0) as u32,
                    bottom.saturating_sub(top).max(0) as u32,
                )
            }
            Self::DesignMode { .. } => rect,
        }
    }

    /// Destination rectangle (viewport space) for painting an image of size
    /// `image`.
    pub fn reposition_image(&self, image: Size) -> Rect {
        match self {
            Self::Clipped { scroll, .. } => Rect::at(Point::new(-scroll.x, -scroll.y), image),
            Self::Scaled { viewport, .. } => Rect::at(Point::default(), *viewport),
            Self::DesignMode { placeholder } => Rect::at(Point::default(), *placeholder),
        }
    }

    /// The viewport region considered "over the desktop".  Pointer events
    /// outside it are dropped.
    pub fn mouse_move_rectangle(&self) -> Rect {
        match self {
            Self::Clipped { framebuffer, viewport, scroll } => {
                let view = Rect::at(Point::default(), *viewport);
                let image = Rect::at(Point::new(-scroll.x, -scroll.y), *framebuffer);
                view.intersect(&image)
            }
            Self::Scaled { viewport, .. } => Rect::at(Point::default(), *viewport),
            Self::DesignMode { placeholder } => Rect::at(Point::default(), *placeholder),
        }
    }

    /// Maps a viewport point to framebuffer coordinates, clamped to the
    /// framebuffer.
    pub fn mouse_move_point(&self, local: Point) -> Point {
        match self {
            Self::Clipped { framebuffer, scroll, .. } => clamp_point(
                Point::new(local.x.saturating_add(scroll.x), local.y.saturating_add(scroll.y)),
                *framebuffer,
            ),
            Self::Scaled { framebuffer, .. } => {
                let (sx, sy) = self.scale_factors();
                if sx <= 0.0 || sy <= 0.0 {
                    return Point::default();
                }
                let x = (f64::from(local.x) / sx).floor() as i32;
                let y = (f64::from(local.y) / sy).floor() as i32;
                clamp_point(Point::new(x, y), *framebuffer)
            }
            Self::DesignMode { .. } => local,
        }
    }

    /// Builds the pointer event for a viewport point, or `None` if the point
    /// lies outside [`Self::mouse_move_rectangle`].
    pub fn update_remote_pointer(
        &self,
        local: Point,
        buttons: PointerButtons,
    ) -> Option<PointerEvent> {
        if !self.mouse_move_rectangle().contains(local) {
            return None;
        }
        Some(PointerEvent {
            buttons,
            position: self.mouse_move_point(local),
        })
    }
}

fn check_framebuffer(framebuffer: Size) -> Result<(), GeometryError> {
    if framebuffer.is_empty() {
        return Err(GeometryError::EmptyFramebuffer(
            framebuffer.width,
            framebuffer.height,
        ));
    }
    if framebuffer.width > MAX_FRAMEBUFFER_DIMENSION
        || framebuffer.height > MAX_FRAMEBUFFER_DIMENSION
    {
        return Err(GeometryError::OversizedFramebuffer(
            framebuffer.width,
            framebuffer.height,
        ));
    }
    Ok(())
}

/// `u32` extent as a non-negative `i32`, saturating at `i32::MAX`.
fn extent(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

fn clamp_scroll(offset: Point, framebuffer: Size, viewport: Size) -> Point {
    let max_x = extent(framebuffer.width.saturating_sub(viewport.width));
    let max_y = extent(framebuffer.height.saturating_sub(viewport.height));
    Point::new(offset.x.clamp(0, max_x), offset.y.clamp(0, max_y))
}

fn clamp_point(p: Point, bounds: Size) -> Point {
    let max_x = extent(bounds.width.saturating_sub(1));
    let max_y = extent(bounds.height.saturating_sub(1));
    Point::new(p.x.clamp(0, max_x), p.y.clamp(0, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FB: Size = Size::new(1920, 1080);

    fn clipped(viewport: Size) -> DesktopTransformPolicy {
        DesktopTransformPolicy::clipped(FB, viewport).unwrap()
    }

    fn scaled(viewport: Size) -> DesktopTransformPolicy {
        DesktopTransformPolicy::scaled(FB, viewport).unwrap()
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn test_empty_framebuffer_is_rejected() {
        let err = DesktopTransformPolicy::scaled(Size::new(0, 600), Size::new(800, 600));
        assert_eq!(err, Err(GeometryError::EmptyFramebuffer(0, 600)));
    }

    #[test]
    fn test_framebuffer_beyond_16_bits_is_rejected() {
        let huge = Size::new(3_000_000_000, 768);

        assert_eq!(
            DesktopTransformPolicy::for_session(huge, Size::new(800, 600), false),
            Err(GeometryError::OversizedFramebuffer(3_000_000_000, 768))
        );
        assert_eq!(
            DesktopTransformPolicy::scaled(Size::new(1024, 70_000), Size::new(800, 600)),
            Err(GeometryError::OversizedFramebuffer(1024, 70_000))
        );
        assert!(DesktopTransformPolicy::clipped(Size::new(65_535, 65_535), Size::new(800, 600)).is_ok());
    }

    #[test]
    fn test_huge_viewport_does_not_panic_when_clamping() {
        // Arrange
        let mut p = clipped(Size::new(800, 600));

        // Act
        p.set_viewport(Size::new(u32::MAX, u32::MAX));
        let scroll = p.scroll_to(Point::new(10, 10));
        let mapped = p.mouse_move_point(Point::new(i32::MAX, i32::MAX));

        // Assert
        assert_eq!(scroll, Point::default());
        assert_eq!(mapped, Point::new(1919, 1079));
        assert_eq!(p.mouse_move_rectangle(), Rect::new(0, 0, 1920, 1080));
    }

    #[test]
    fn test_auto_scroll_only_for_clipped() {
        assert!(clipped(Size::new(800, 600)).auto_scroll());
        assert!(!scaled(Size::new(800, 600)).auto_scroll());
        assert!(!DesktopTransformPolicy::design_mode(Size::new(64, 64)).auto_scroll());
    }

    // ── Clipped ───────────────────────────────────────────────────────────────

    #[test]
    fn test_clipped_pointer_mapping_adds_scroll_offset() {
        // Arrange
        let mut p = clipped(Size::new(800, 600));
        p.scroll_to(Point::new(100, 50));

        // Act
        let mapped = p.mouse_move_point(Point::new(10, 20));

        // Assert
        assert_eq!(mapped, Point::new(110, 70));
    }

    #[test]
    fn test_clipped_scroll_is_clamped_to_framebuffer() {
        let mut p = clipped(Size::new(800, 600));
        let effective = p.scroll_to(Point::new(5000, -10));
        assert_eq!(effective, Point::new(1120, 0));
    }

    #[test]
    fn test_clipped_update_rectangle_is_shifted_by_scroll() {
        let mut p = clipped(Size::new(800, 600));
        p.scroll_to(Point::new(100, 100));
        let r = p.adjust_update_rectangle(Rect::new(150, 120, 10, 10));
        assert_eq!(r, Rect::new(50, 20, 10, 10));
    }

    #[test]
    fn test_clipped_mouse_rectangle_is_limited_by_small_framebuffer() {
        // Viewport larger than the framebuffer: only the image area counts.
        let p = DesktopTransformPolicy::clipped(Size::new(640, 480), Size::new(800, 600)).unwrap();
        assert_eq!(p.mouse_move_rectangle(), Rect::new(0, 0, 640, 480));
        assert!(p
            .update_remote_pointer(Point::new(700, 10), PointerButtons::none())
            .is_none());
    }

    #[test]
    fn test_clipped_reposition_image_uses_negative_scroll() {
        let mut p = clipped(Size::new(800, 600));
        p.scroll_to(Point::new(30, 40));
        assert_eq!(p.reposition_image(FB), Rect::new(-30, -40, 1920, 1080));
    }

    #[test]
    fn test_set_viewport_reclamps_scroll() {
        let mut p = clipped(Size::new(800, 600));
        p.scroll_to(Point::new(1120, 480));
        p.set_viewport(Size::new(1920, 1080));
        assert_eq!(p.scroll_offset(), Point::new(0, 0));
    }

    // ── Scaled ────────────────────────────────────────────────────────────────

    #[test]
    fn test_scaled_pointer_mapping_divides_by_factor() {
        // Arrange – half size on both axes
        let p = scaled(Size::new(960, 540));

        // Act
        let mapped = p.mouse_move_point(Point::new(100, 200));

        // Assert
        assert_eq!(mapped, Point::new(200, 400));
    }

    #[test]
    fn test_scaled_factors_are_independent_per_axis() {
        let p = scaled(Size::new(960, 1080));
        assert_eq!(p.scale_factors(), (0.5, 1.0));
        assert_eq!(p.mouse_move_point(Point::new(10, 10)), Point::new(20, 10));
    }

    #[test]
    fn test_scaled_update_rectangle_rounds_outward() {
        // 1920 -> 640 is a factor of 1/3.
        let p = scaled(Size::new(640, 360));
        let r = p.adjust_update_rectangle(Rect::new(1, 1, 3, 3));
        // left = floor(1/3) = 0, right = ceil(4/3) = 2
        assert_eq!(r, Rect::new(0, 0, 2, 2));
    }

    #[test]
    fn test_scaled_mapping_is_clamped_to_framebuffer() {
        let p = scaled(Size::new(960, 540));
        assert_eq!(p.mouse_move_point(Point::new(959, 539)), Point::new(1918, 1078));
        assert_eq!(p.mouse_move_point(Point::new(5000, 5000)), Point::new(1919, 1079));
    }

    #[test]
    fn test_scaled_reposition_fills_viewport() {
        let p = scaled(Size::new(1024, 768));
        assert_eq!(p.reposition_image(FB), Rect::new(0, 0, 1024, 768));
    }

    #[test]
    fn test_scaled_with_empty_viewport_drops_pointer() {
        let p = scaled(Size::new(0, 0));
        assert!(p
            .update_remote_pointer(Point::new(0, 0), PointerButtons::none())
            .is_none());
    }

    // ── Design mode ───────────────────────────────────────────────────────────

    #[test]
    fn test_design_mode_is_identity() {
        let p = DesktopTransformPolicy::design_mode(Size::new(320, 240));
        assert_eq!(p.mouse_move_point(Point::new(5, 6)), Point::new(5, 6));
        assert_eq!(p.adjust_update_rectangle(Rect::new(1, 2, 3, 4)), Rect::new(1, 2, 3, 4));
        assert_eq!(p.reposition_image(FB), Rect::new(0, 0, 320, 240));
        assert_eq!(p.framebuffer_size(), None);
    }

    // ── Switching ─────────────────────────────────────────────────────────────

    #[test]
    fn test_with_scaling_round_trip_resets_scroll() {
        let mut p = clipped(Size::new(800, 600));
        p.scroll_to(Point::new(10, 10));
        let s = p.with_scaling(true);
        assert!(s.is_scaled());
        let c = s.with_scaling(false);
        assert_eq!(c.scroll_offset(), Point::default());
        assert_eq!(c.viewport_size(), Size::new(800, 600));
    }

    #[test]
    fn test_update_remote_pointer_carries_buttons() {
        let p = clipped(Size::new(800, 600));
        let ev = p
            .update_remote_pointer(Point::new(1, 2), PointerButtons(PointerButtons::LEFT))
            .unwrap();
        assert_eq!(ev.position, Point::new(1, 2));
        assert!(ev.buttons.left());
    }
}
