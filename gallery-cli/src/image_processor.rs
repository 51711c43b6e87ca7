use anyhow::{Context, Result};
use gallery_core::object::{FileKind, MediaKind};
use image::{imageops::FilterType, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::path::Path;

const COVER_SIZE: u32 = 400;

/// Folder cover thumbnail (400px max dimension), encoded as JPEG.
pub fn create_cover(path: &Path) -> Result<Vec<u8>> {
    tracing::info!("Generating cover from: {}", path.display());

    let img = image::open(path)
        .context(format!("Failed to open image: {}", path.display()))?;

    let (width, height) = img.dimensions();

    // Only resize if larger than target
    let resized = if width > COVER_SIZE || height > COVER_SIZE {
        img.resize(COVER_SIZE, COVER_SIZE, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = resized.to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Jpeg)
        .context("Failed to encode JPEG")?;

    Ok(buffer.into_inner())
}

pub fn file_kind(path: &Path) -> Option<FileKind> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(FileKind::from_extension)
}

pub fn is_media_file(path: &Path) -> bool {
    matches!(file_kind(path), Some(FileKind::Media(_)))
}

pub fn is_image_file(path: &Path) -> bool {
    file_kind(path) == Some(FileKind::Media(MediaKind::Image))
}
