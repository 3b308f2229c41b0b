//! Avatar crop mapping between on-screen pixels and normalized image space.
//!
//! A crop is drawn over a scaled rendering of the image (`displayed`). Stored
//! viewports are relative to the original image instead, so they survive any
//! later resize of the stored bytes. This module is the only place the
//! displayed/original scale mismatch is corrected.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error, PartialEq)]
pub enum ViewportError {
    #[error("{0} size must have positive, finite width and height")]
    DegenerateSize(&'static str),
    #[error("Crop rectangle must have finite coordinates and non-negative size")]
    InvalidRect,
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn validate(self, name: &'static str) -> Result<Self, ViewportError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(self)
        } else {
            Err(ViewportError::DegenerateSize(name))
        }
    }
}

/// Axis-aligned rectangle; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Normalized crop: center (`x`, `y`) and `size`, each in `0.0..=1.0`.
///
/// `size` is a single zoom level relative to the original's longer edge, not
/// an independent width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Map a crop drawn in displayed-pixel space to a normalized viewport on the original.
pub fn to_normalized_viewport(
    original: Size,
    displayed: Size,
    rect: Rect,
) -> Result<Viewport, ViewportError> {
    let original = original.validate("Original")?;
    let displayed = displayed.validate("Displayed")?;
    let finite = [rect.x, rect.y, rect.width, rect.height]
        .iter()
        .all(|v| v.is_finite());
    if !finite || rect.width < 0.0 || rect.height < 0.0 {
        return Err(ViewportError::InvalidRect);
    }

    let scale_x = original.width / displayed.width;
    let scale_y = original.height / displayed.height;

    let ax = rect.x * scale_x;
    let ay = rect.y * scale_y;
    let aw = rect.width * scale_x;
    let ah = rect.height * scale_y;

    Ok(Viewport {
        x: clamp01((ax + aw / 2.0) / original.width),
        y: clamp01((ay + ah / 2.0) / original.height),
        size: clamp01(aw / original.width.max(original.height)),
    })
}

/// Inverse of [`to_normalized_viewport`]: the crop rectangle to draw over an
/// image rendered at `displayed`.
///
/// The crop is square in original-image space since a viewport carries a
/// single size.
pub fn to_displayed_rect(
    original: Size,
    displayed: Size,
    viewport: Viewport,
) -> Result<Rect, ViewportError> {
    let original = original.validate("Original")?;
    let displayed = displayed.validate("Displayed")?;

    let scale_x = original.width / displayed.width;
    let scale_y = original.height / displayed.height;

    let side = viewport.size * original.width.max(original.height);
    let ax = viewport.x * original.width - side / 2.0;
    let ay = viewport.y * original.height - side / 2.0;

    Ok(Rect {
        x: ax / scale_x,
        y: ay / scale_y,
        width: side / scale_x,
        height: side / scale_y,
    })
}
