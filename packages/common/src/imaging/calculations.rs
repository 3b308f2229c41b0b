//! Pure calculation functions for image compression.
//!
//! All functions here are pure and testable without any I/O or images.

/// Lowest quality the size-cap retry will ever encode at.
pub const MIN_QUALITY: f32 = 0.1;

/// Quality drop applied by the single size-cap retry.
pub const RETRY_QUALITY_STEP: f32 = 0.2;

/// Downscale factor that fits `(width, height)` inside `(max_width, max_height)`.
///
/// Never greater than `1.0`: images are never upscaled.
///
/// ```
/// # use common::imaging::scale_factor;
/// assert_eq!(scale_factor((4000, 2000), (1000, 1000)), 0.25);
/// assert_eq!(scale_factor((800, 600), (1920, 1920)), 1.0);
/// ```
pub fn scale_factor(source: (u32, u32), max: (u32, u32)) -> f64 {
    let (w, h) = source;
    let (max_w, max_h) = max;
    if w == 0 || h == 0 {
        return 1.0;
    }
    let sx = f64::from(max_w) / f64::from(w);
    let sy = f64::from(max_h) / f64::from(h);
    sx.min(sy).min(1.0)
}

/// Output dimensions after applying [`scale_factor`].
///
/// Each edge is rounded and kept at least 1px, and never exceeds the source.
pub fn scaled_dimensions(source: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let scale = scale_factor(source, max);
    if scale >= 1.0 {
        return source;
    }
    let (w, h) = source;
    let scale_edge = |edge: u32| ((f64::from(edge) * scale).round() as u32).clamp(1, edge);
    (scale_edge(w), scale_edge(h))
}

/// Quality for the one-shot retry: `quality - 0.2`, floored at `0.1`.
pub fn reduced_quality(quality: f32) -> f32 {
    (quality - RETRY_QUALITY_STEP).max(MIN_QUALITY)
}

/// Map a `0.0..=1.0` quality to the encoder's `1..=100` scale.
pub(crate) fn encoder_quality(quality: f32) -> u8 {
    (quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}
