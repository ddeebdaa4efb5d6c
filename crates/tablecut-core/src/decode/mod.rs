//! Source image loading for segmentation sessions.
//!
//! A session works on exactly one photograph of a table. The photograph is
//! decoded once, EXIF orientation is applied, and the resulting [`Raster`]
//! becomes the immutable source the whole session draws and crops against.
//!
//! Orientation matters here: table photographs usually come from phone
//! cameras, which record the rotation in EXIF instead of rotating pixels.
//! Without applying it the operator would be placing grid lines on a
//! sideways or upside-down frame.

mod types;

pub use types::{DecodeError, Raster};

use std::fs;
use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

/// Load and decode a table photograph from disk.
///
/// # Errors
///
/// Returns [`DecodeError::Io`] if the file cannot be read,
/// [`DecodeError::InvalidFormat`] if the bytes are not a recognized image
/// format, and [`DecodeError::CorruptedFile`] if decoding fails partway.
pub fn load_table_image(path: &Path) -> Result<Raster, DecodeError> {
    let bytes = fs::read(path).map_err(|e| DecodeError::Io(e.to_string()))?;
    decode_table_image(&bytes)
}

/// Decode a table photograph from in-memory bytes, applying EXIF orientation.
pub fn decode_table_image(bytes: &[u8]) -> Result<Raster, DecodeError> {
    let orientation = exif_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::Io(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let img = apply_orientation(img, orientation);
    Ok(Raster::from_rgb_image(img.into_rgb8()))
}

/// Extract the EXIF orientation value (1-8) from image bytes.
///
/// Returns 1 (normal) when there is no EXIF data or no orientation tag.
fn exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .unwrap_or(1),
        Err(_) => 1,
    }
}

/// Bake an EXIF orientation value into the pixel data.
fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        // 1 is normal; out-of-range values are treated as normal
        _ => img,
    }
}
