use std::str::FromStr;

use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart};

use crate::error::AppError;
use crate::models::shared::{validate_alt_text, validate_optional_sort_order};
use crate::pipeline::{CropSelection, UploadOptions};
use common::viewport::{Rect, Size};

/// Headroom for multipart boundaries and text fields on top of the file.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Body limit layer for routes that accept a file of at most `max_file_size`.
pub fn upload_body_limit(max_file_size: u64) -> DefaultBodyLimit {
    let limit = max_file_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

/// A parsed upload request.
pub struct UploadForm {
    pub data: Vec<u8>,
    pub options: UploadOptions,
}

/// A parsed replace-file request.
pub struct ReplaceForm {
    pub data: Vec<u8>,
    pub compress: bool,
}

#[derive(Default)]
struct CropFields {
    displayed_width: Option<f64>,
    displayed_height: Option<f64>,
    crop_x: Option<f64>,
    crop_y: Option<f64>,
    crop_width: Option<f64>,
    crop_height: Option<f64>,
}

impl CropFields {
    /// All six fields or none.
    fn into_selection(self) -> Result<Option<CropSelection>, AppError> {
        match (
            self.displayed_width,
            self.displayed_height,
            self.crop_x,
            self.crop_y,
            self.crop_width,
            self.crop_height,
        ) {
            (None, None, None, None, None, None) => Ok(None),
            (Some(dw), Some(dh), Some(x), Some(y), Some(w), Some(h)) => Ok(Some(CropSelection {
                displayed: Size::new(dw, dh),
                rect: Rect::new(x, y, w, h),
            })),
            _ => Err(AppError::Validation(
                "Crop requires displayed_width, displayed_height, crop_x, crop_y, crop_width and crop_height"
                    .into(),
            )),
        }
    }
}

/// Read the `file` field and upload options from a multipart body.
pub async fn read_upload_form(
    mut multipart: Multipart,
    max_size: u64,
) -> Result<UploadForm, AppError> {
    let mut data: Option<Vec<u8>> = None;
    let mut options = UploadOptions::default();
    let mut crop = CropFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "file" => data = Some(read_file_field(field, max_size).await?),
            "alt_text" => options.alt_text = Some(read_text(field, &name).await?),
            "sort_order" => options.sort_order = Some(parse_field(field, &name).await?),
            "is_featured" => options.is_featured = parse_flag(field, &name).await?,
            "compress" => options.compress = parse_flag(field, &name).await?,
            "displayed_width" => crop.displayed_width = Some(parse_field(field, &name).await?),
            "displayed_height" => crop.displayed_height = Some(parse_field(field, &name).await?),
            "crop_x" => crop.crop_x = Some(parse_field(field, &name).await?),
            "crop_y" => crop.crop_y = Some(parse_field(field, &name).await?),
            "crop_width" => crop.crop_width = Some(parse_field(field, &name).await?),
            "crop_height" => crop.crop_height = Some(parse_field(field, &name).await?),
            _ => {} // Ignore unknown fields.
        }
    }

    let data = data.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    validate_alt_text(options.alt_text.as_deref())?;
    validate_optional_sort_order(options.sort_order)?;
    options.crop = crop.into_selection()?;

    Ok(UploadForm { data, options })
}

/// Read the `file` field and the optional `compress` flag.
pub async fn read_replace_form(
    mut multipart: Multipart,
    max_size: u64,
) -> Result<ReplaceForm, AppError> {
    let mut data: Option<Vec<u8>> = None;
    let mut compress = true;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => data = Some(read_file_field(field, max_size).await?),
            Some("compress") => compress = parse_flag(field, "compress").await?,
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    Ok(ReplaceForm { data, compress })
}

/// Buffer a file field, failing as soon as it grows past `max_size`.
async fn read_file_field(mut field: Field<'_>, max_size: u64) -> Result<Vec<u8>, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (data.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {max_size} bytes"
            )));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn read_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

async fn parse_field<T: FromStr>(field: Field<'_>, name: &str) -> Result<T, AppError> {
    let text = read_text(field, name).await?;
    text.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid value for {name}: '{text}'")))
}

async fn parse_flag(field: Field<'_>, name: &str) -> Result<bool, AppError> {
    let text = read_text(field, name).await?;
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" | "" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "Invalid value for {name}: '{text}'"
        ))),
    }
}
