use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    /// The input could not be read as an image.
    #[error("Could not decode image: {0}")]
    Decode(String),

    /// The input is an image format this service does not accept.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not encode image: {0}")]
    Encode(String),
}
