use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use gt_core::frame::FrameBuffer;
use image::RgbaImage;

/// Copie une frame dans une `image::RgbaImage`.
///
/// # Errors
/// Returns an error if the buffer length does not match its dimensions.
pub fn to_rgba_image(frame: &FrameBuffer) -> Result<RgbaImage> {
    RgbaImage::from_raw(frame.width, frame.height, frame.data.clone()).with_context(|| {
        format!(
            "Buffer incohérent : {} bytes pour {}x{}",
            frame.data.len(),
            frame.width,
            frame.height
        )
    })
}

/// Nom par défaut d'un export PNG, horodaté.
///
/// # Example
/// ```
/// use chrono::{Local, TimeZone};
/// use gt_export::still::still_file_name;
///
/// let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// assert_eq!(still_file_name(at), "glyph-art-20240309-140507.png");
/// ```
#[must_use]
pub fn still_file_name(at: DateTime<Local>) -> String {
    format!("glyph-art-{}.png", at.format("%Y%m%d-%H%M%S"))
}

/// Écrit la frame composée courante en PNG.
///
/// # Errors
/// Returns an error if the image cannot be encoded or written.
pub fn save_png(frame: &FrameBuffer, path: &Path) -> Result<()> {
    to_rgba_image(frame)?
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    log::info!("PNG exporté : {}", path.display());
    Ok(())
}

/// Exporte la frame dans `dir` sous un nom horodaté ; retourne le chemin.
///
/// # Errors
/// Returns an error if the directory or the file cannot be written.
pub fn export_still(frame: &FrameBuffer, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Impossible de créer {}", dir.display()))?;
    let path = dir.join(still_file_name(Local::now()));
    save_png(frame, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trips_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let mut frame = FrameBuffer::new(3, 2);
        frame.fill([12, 34, 56, 255]);
        let path = export_still(&frame, dir.path()).unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("glyph-art-"));

        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(back.get_pixel(2, 1).0, [12, 34, 56, 255]);
    }

    #[test]
    fn inconsistent_buffer_is_rejected() {
        let frame = FrameBuffer {
            data: vec![0; 7],
            width: 2,
            height: 2,
        };
        assert!(to_rgba_image(&frame).is_err());
    }
}
