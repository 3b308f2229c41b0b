use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};

use super::calculations::{encoder_quality, reduced_quality, scaled_dimensions};
use super::error::ImageError;

/// Input formats accepted for upload.
const ACCEPTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Gif,
];

/// Constraints applied by [`compress`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// Encoding quality in `0.0..=1.0`.
    pub quality: f32,
    /// Best-effort byte budget; see [`compress`].
    #[serde(default)]
    pub max_size_bytes: Option<u64>,
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

}

/// Header-level facts about an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

impl ImageInfo {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }
}

/// Result of [`compress`]: the bytes to store and what they decode to.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    /// Quality the stored bytes were encoded at.
    pub quality: f32,
    /// The input as it was before compression.
    pub source: ImageInfo,
}

fn reader(data: &[u8]) -> Result<(ImageReader<Cursor<&[u8]>>, ImageFormat), ImageError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| ImageError::Decode("unrecognized image data".into()))?;
    if !ACCEPTED_FORMATS.contains(&format) {
        return Err(ImageError::UnsupportedFormat(format!("{format:?}")));
    }
    Ok((reader, format))
}

/// Read format and pixel dimensions without decoding the pixel data.
pub fn inspect(data: &[u8]) -> Result<ImageInfo, ImageError> {
    let (reader, format) = reader(data)?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    Ok(ImageInfo {
        width,
        height,
        format,
    })
}

/// Decode, downscale to fit the bounds, and re-encode.
///
/// Images with at least one translucent pixel are written as PNG, everything
/// else (including RGBA input that is fully opaque) as JPEG at
/// `options.quality`. When `max_size_bytes` is set and the first encode is
/// over budget, the image is encoded exactly once more at `quality - 0.2`
/// (floor `0.1`) and that result is returned whether or not it fits. PNG has
/// no quality setting, so its retry uses the strongest deflate level instead.
pub fn compress(data: &[u8], options: &CompressOptions) -> Result<Compressed, ImageError> {
    let (reader, format) = reader(data)?;
    let image = reader
        .decode()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let source = ImageInfo {
        width: image.width(),
        height: image.height(),
        format,
    };
    let (width, height) = scaled_dimensions(
        (source.width, source.height),
        (options.max_width, options.max_height),
    );
    let image = if (width, height) == (source.width, source.height) {
        image
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    };

    let output = if has_transparency(&image) {
        OutputFormat::Png
    } else {
        OutputFormat::Jpeg
    };

    let mut quality = options.quality;
    let mut bytes = encode(&image, output, quality, false)?;

    if let Some(limit) = options.max_size_bytes
        && bytes.len() as u64 > limit
    {
        quality = reduced_quality(quality);
        bytes = encode(&image, output, quality, true)?;
        tracing::debug!(
            limit,
            size = bytes.len(),
            quality,
            "Re-encoded image at reduced quality"
        );
    }

    Ok(Compressed {
        bytes,
        width: image.width(),
        height: image.height(),
        format: output,
        quality,
        source,
    })
}

/// Whether any pixel is less than fully opaque. An alpha channel alone is not
/// enough: GIFs always decode as RGBA, and many PNGs carry an unused one.
fn has_transparency(image: &DynamicImage) -> bool {
    if !image.color().has_alpha() {
        return false;
    }
    match image {
        DynamicImage::ImageRgba8(buf) => buf.pixels().any(|p| p.0[3] < u8::MAX),
        DynamicImage::ImageLumaA8(buf) => buf.pixels().any(|p| p.0[1] < u8::MAX),
        other => other.to_rgba8().pixels().any(|p| p.0[3] < u8::MAX),
    }
}

fn encode(
    image: &DynamicImage,
    format: OutputFormat,
    quality: f32,
    retry: bool,
) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, encoder_quality(quality))),
        OutputFormat::Png => {
            let encoder = if retry {
                PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive)
            } else {
                PngEncoder::new(&mut buf)
            };
            DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)
        }
    }
    .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(buf)
}
