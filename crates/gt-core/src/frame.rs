use crate::error::CoreError;

/// Poids de luminance (luma BT.601) appliqués à R, G, B.
pub const LUMA_WEIGHTS: (f32, f32, f32) = (0.299, 0.587, 0.114);

/// Luminance pondérée d'un pixel RGB, dans [0.0, 255.0].
///
/// # Example
/// ```
/// use gt_core::frame::luma;
/// assert!((luma(255, 255, 255) - 255.0).abs() < 0.01);
/// assert_eq!(luma(0, 0, 0), 0.0);
/// ```
#[inline(always)]
#[must_use]
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    f32::from(r) * LUMA_WEIGHTS.0 + f32::from(g) * LUMA_WEIGHTS.1 + f32::from(b) * LUMA_WEIGHTS.2
}

/// Buffer de pixels réutilisable.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel, origine en haut à gauche.
///
/// # Example
/// ```
/// use gt_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer transparent aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Wrap an existing RGBA byte vector.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if the length does not match
    /// `width × height × 4`.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, CoreError> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a top-left-origin buffer from rows stored bottom-up
    /// (framebuffer read-back order).
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if the length does not match.
    ///
    /// # Example
    /// ```
    /// use gt_core::frame::FrameBuffer;
    /// // 1×2 : la ligne du bas (rouge) est stockée en premier.
    /// let raw = vec![255, 0, 0, 255, 0, 0, 255, 255];
    /// let fb = FrameBuffer::from_bottom_up(&raw, 1, 2).unwrap();
    /// assert_eq!(fb.pixel(0, 0), (0, 0, 255, 255));
    /// assert_eq!(fb.pixel(0, 1), (255, 0, 0, 255));
    /// ```
    pub fn from_bottom_up(raw: &[u8], width: u32, height: u32) -> Result<Self, CoreError> {
        let mut fb = Self::new(width, height);
        fb.copy_flipped(raw)?;
        Ok(fb)
    }

    /// Overwrite this buffer with `raw` (same dimensions) flipped vertically.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if the length does not match.
    pub fn copy_flipped(&mut self, raw: &[u8]) -> Result<(), CoreError> {
        if raw.len() != self.data.len() {
            return Err(CoreError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let stride = self.width as usize * 4;
        if stride == 0 {
            return Ok(());
        }
        for (dst, src) in self
            .data
            .chunks_exact_mut(stride)
            .zip(raw.chunks_exact(stride).rev())
        {
            dst.copy_from_slice(src);
        }
        Ok(())
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if idx + 3 >= self.data.len() {
            return (0, 0, 0, 0);
        }
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }

    /// Luminance pondérée du pixel (x, y), non arrondie.
    ///
    /// # Example
    /// ```
    /// use gt_core::frame::FrameBuffer;
    /// let mut fb = FrameBuffer::new(1, 1);
    /// fb.data.copy_from_slice(&[255, 255, 255, 255]);
    /// assert!((fb.luma(0, 0) - 255.0).abs() < 0.01);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn luma(&self, x: u32, y: u32) -> f32 {
        let (r, g, b, _) = self.pixel(x, y);
        luma(r, g, b)
    }

    /// Fill every pixel with the same RGBA value.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// `true` if both buffers have the same dimensions.
    #[must_use]
    pub fn same_size(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_checks_length() {
        assert!(FrameBuffer::from_rgba(vec![0; 16], 2, 2).is_ok());
        assert!(matches!(
            FrameBuffer::from_rgba(vec![0; 15], 2, 2),
            Err(CoreError::InvalidDimensions { width: 2, height: 2 })
        ));
    }

    #[test]
    fn bottom_up_rows_are_flipped() {
        // 2×3, chaque ligne marquée par sa valeur de rouge.
        let mut raw = Vec::new();
        for row in 0..3u8 {
            for _ in 0..2 {
                raw.extend_from_slice(&[row, 0, 0, 255]);
            }
        }
        let fb = FrameBuffer::from_bottom_up(&raw, 2, 3).unwrap();
        assert_eq!(fb.pixel(0, 0).0, 2);
        assert_eq!(fb.pixel(1, 1).0, 1);
        assert_eq!(fb.pixel(0, 2).0, 0);
    }

    #[test]
    fn luma_weights_green_heaviest() {
        assert!(luma(0, 255, 0) > luma(255, 0, 0));
        assert!(luma(255, 0, 0) > luma(0, 0, 255));
    }
}
