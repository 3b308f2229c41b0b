//! Image normalization before anything is persisted.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Inspect** | `image::ImageReader::into_dimensions` (header only) |
//! | **Decode** | `image::ImageReader::decode` (JPEG, PNG, WebP, GIF) |
//! | **Resize** | `DynamicImage::resize_exact` with `Lanczos3` |
//! | **Encode** | `JpegEncoder` (opaque) / `PngEncoder` (translucent pixels) |
//!
//! - **Calculations**: pure dimension math (unit testable)
//! - **Compress**: decode → downscale → encode, with one size-cap retry

mod calculations;
mod compress;
mod error;

pub use calculations::{reduced_quality, scale_factor, scaled_dimensions};
pub use compress::{CompressOptions, Compressed, ImageInfo, OutputFormat, compress, inspect};
pub use error::ImageError;
