use anyhow::{Context, Result};
use fast_image_resize::images::{Image, ImageRef};
use fast_image_resize::{PixelType, ResizeOptions, Resizer as FirResizer};
use gt_core::frame::FrameBuffer;

/// Étire des frames RGBA aux dimensions du canvas (`fast_image_resize`).
///
/// Le ratio n'est pas conservé : la source couvre tout le canvas, comme un
/// `drawImage(src, 0, 0, w, h)`.
///
/// # Example
/// ```
/// use gt_core::frame::FrameBuffer;
/// use gt_source::resize::Stretcher;
///
/// let mut s = Stretcher::new();
/// let out = s.stretch(&FrameBuffer::new(100, 40), 10, 10).unwrap();
/// assert_eq!((out.width, out.height), (10, 10));
/// ```
pub struct Stretcher {
    inner: FirResizer,
    options: ResizeOptions,
}

impl Stretcher {
    /// Create a stretcher with the default (convolution) filter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new(),
        }
    }

    /// Écrit `src` étirée dans `dst` ; les dimensions de `dst` font foi.
    ///
    /// # Errors
    /// Returns an error if a buffer length does not match its dimensions.
    pub fn stretch_into(&mut self, src: &FrameBuffer, dst: &mut FrameBuffer) -> Result<()> {
        if src.same_size(dst.width, dst.height) {
            dst.data.copy_from_slice(&src.data);
            return Ok(());
        }
        if src.width == 0 || src.height == 0 || dst.width == 0 || dst.height == 0 {
            dst.fill([0, 0, 0, 0]);
            return Ok(());
        }

        let src_image = ImageRef::new(src.width, src.height, &src.data, PixelType::U8x4)
            .context("Dimensions source invalides")?;
        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data, PixelType::U8x4)
                .context("Dimensions destination invalides")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Redimensionnement échoué")?;
        Ok(())
    }

    /// Nouvelle frame `width × height` contenant `src` étirée.
    ///
    /// # Errors
    /// Returns an error if the resize fails.
    pub fn stretch(&mut self, src: &FrameBuffer, width: u32, height: u32) -> Result<FrameBuffer> {
        let mut dst = FrameBuffer::new(width, height);
        self.stretch_into(src, &mut dst)?;
        Ok(dst)
    }
}

impl Default for Stretcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_size_is_a_copy() {
        let mut src = FrameBuffer::new(3, 2);
        src.fill([7, 8, 9, 255]);
        let out = Stretcher::new().stretch(&src, 3, 2).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn uniform_colour_survives_stretch() {
        let mut src = FrameBuffer::new(16, 4);
        src.fill([120, 60, 30, 255]);
        let out = Stretcher::new().stretch(&src, 5, 9).unwrap();
        assert_eq!(out.pixel(0, 0), (120, 60, 30, 255));
        assert_eq!(out.pixel(4, 8), (120, 60, 30, 255));
    }

    #[test]
    fn empty_source_gives_transparent_canvas() {
        let out = Stretcher::new().stretch(&FrameBuffer::new(0, 0), 2, 2).unwrap();
        assert!(out.data.iter().all(|&b| b == 0));
    }
}
