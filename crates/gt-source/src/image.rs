use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use gt_core::config::InputMode;
use gt_core::error::CoreError;
use gt_core::frame::FrameBuffer;
use gt_core::identity::{FrameIdentity, SourceKey, next_image_handle};
use gt_core::traits::{FrameSource, SourceFrame};

use crate::resize::Stretcher;

/// Décode un fichier image en frame RGBA.
///
/// # Errors
/// Returns [`CoreError::FileNotFound`] if the path does not exist, or a
/// decoding error.
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    if !path.exists() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(FrameBuffer::from_rgba(rgba.into_raw(), width, height)?)
}

/// Source d'image fixe.
///
/// Chaque chargement reçoit un handle unique : l'identité de frame reste
/// stable tant que l'image et la taille du canvas ne changent pas, ce qui
/// permet au compositor de réutiliser luminance et contours.
///
/// # Example
/// ```
/// use gt_core::frame::FrameBuffer;
/// use gt_core::traits::FrameSource;
/// use gt_source::image::ImageSource;
///
/// let mut src = ImageSource::from_frame(FrameBuffer::new(8, 8));
/// let a = src.frame(4, 4).unwrap();
/// let b = src.frame(4, 4).unwrap();
/// assert_eq!(a.identity, b.identity);
/// ```
pub struct ImageSource {
    original: FrameBuffer,
    handle: u64,
    stretcher: Stretcher,
    /// Dernière frame étirée, réutilisée tant que la taille ne change pas.
    scaled: Option<Arc<FrameBuffer>>,
}

impl ImageSource {
    /// Load an image from disk.
    ///
    /// # Errors
    /// Returns an error if the image cannot be read or decoded.
    pub fn open(path: &Path) -> Result<Self> {
        let frame = load_image(path)?;
        log::info!(
            "Image chargée : {} ({}x{})",
            path.display(),
            frame.width,
            frame.height
        );
        Ok(Self::from_frame(frame))
    }

    /// Wrap an already decoded frame.
    #[must_use]
    pub fn from_frame(original: FrameBuffer) -> Self {
        Self {
            original,
            handle: next_image_handle(),
            stretcher: Stretcher::new(),
            scaled: None,
        }
    }

    /// Native image size.
    #[must_use]
    pub fn native_size(&self) -> (u32, u32) {
        (self.original.width, self.original.height)
    }
}

impl FrameSource for ImageSource {
    fn frame(&mut self, width: u32, height: u32) -> Option<SourceFrame> {
        let reusable = self
            .scaled
            .as_ref()
            .is_some_and(|fb| fb.same_size(width, height));
        if !reusable {
            match self.stretcher.stretch(&self.original, width, height) {
                Ok(fb) => self.scaled = Some(Arc::new(fb)),
                Err(e) => {
                    log::warn!("Redimensionnement de l'image impossible : {e:#}");
                    return None;
                }
            }
        }
        let buffer = Arc::clone(self.scaled.as_ref()?);
        Some(SourceFrame {
            buffer,
            identity: FrameIdentity::new(
                InputMode::Image,
                width,
                height,
                SourceKey::Image(self.handle),
            ),
        })
    }

    fn mode(&self) -> InputMode {
        InputMode::Image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("in.png");
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_image(Path::new("/nonexistent/glyph.png")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::FileNotFound { .. })
        ));
    }

    #[test]
    fn decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let src = ImageSource::open(&png(dir.path())).unwrap();
        assert_eq!(src.native_size(), (4, 2));
    }

    #[test]
    fn resize_keeps_handle_changes_identity() {
        let mut src = ImageSource::from_frame(FrameBuffer::new(8, 8));
        let a = src.frame(4, 4).unwrap();
        let b = src.frame(6, 4).unwrap();
        assert_eq!(a.identity.key, b.identity.key);
        assert_ne!(a.identity, b.identity);
        assert_eq!((b.buffer.width, b.buffer.height), (6, 4));
    }

    #[test]
    fn reloading_gets_a_new_handle() {
        let fb = FrameBuffer::new(2, 2);
        let mut a = ImageSource::from_frame(fb.clone());
        let mut b = ImageSource::from_frame(fb);
        assert_ne!(a.frame(2, 2).unwrap().identity, b.frame(2, 2).unwrap().identity);
    }
}
