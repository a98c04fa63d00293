use crate::error::{StagecraftError, StagecraftResult};

pub use kurbo::{Point, Vec2};

/// Fixed design-space dimensions the whole plane is authored against.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DesignSpace {
    /// Design width in design pixels.
    pub width: f64,
    /// Design height in design pixels.
    pub height: f64,
}

impl DesignSpace {
    /// The 1920x1080 artboard the stock site is authored at.
    pub const FULL_HD: Self = Self {
        width: 1920.0,
        height: 1080.0,
    };

    /// Create a validated design space with positive dimensions.
    pub fn new(width: f64, height: f64) -> StagecraftResult<Self> {
        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            return Err(StagecraftError::validation(
                "DesignSpace dimensions must be finite and > 0",
            ));
        }
        Ok(Self { width, height })
    }
}

impl Default for DesignSpace {
    fn default() -> Self {
        Self::FULL_HD
    }
}

/// Live viewport dimensions in screen pixels. May be degenerate (zero) while
/// the host surface is collapsed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }
}

/// Uniform cover scale plus centering offsets mapping a design rectangle onto
/// a viewport rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Compute the cover fit for `design` inside `viewport`.
///
/// The design rect, scaled by `scale` and translated by the offsets, fully
/// covers the viewport and is centered on any axis with excess coverage.
/// Pure: resize handlers call it unconditionally, including for spurious
/// resize events, and rely on identical output for identical input. A
/// zero-size viewport yields a scale of zero.
pub fn cover_fit(viewport: Viewport, design: DesignSpace) -> FitTransform {
    let scale = (viewport.width / design.width)
        .max(viewport.height / design.height)
        .max(0.0);
    FitTransform {
        scale,
        offset_x: (viewport.width - design.width * scale) / 2.0,
        offset_y: (viewport.height - design.height * scale) / 2.0,
    }
}

/// The single pan/scale triple positioning the composited plane of all
/// scenes within the viewport.
///
/// At rest it equals `(horizontal offset of the current hash, vertical
/// offset of the current scene, cover-fit scale)`; the navigation state
/// machine is its only writer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldTransform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl WorldTransform {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        scale: 1.0,
    };
}
