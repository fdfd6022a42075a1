use gt_core::frame::FrameBuffer;

use crate::grid::TileRect;

/// Points échantillonnés par axe et par tuile (3 × 3 au maximum).
const PROBES_PER_AXIS: u32 = 3;

/// Carte de magnitudes de gradient Sobel à demi-résolution.
///
/// Chaque pixel de la carte couvre un bloc 2×2 de la frame source, dont la
/// luminance est moyennée. Les bords de la carte restent à zéro.
///
/// # Example
/// ```
/// use gt_core::frame::FrameBuffer;
/// use gt_glyph::edge::EdgeMap;
///
/// let frame = FrameBuffer::new(16, 16);
/// let map = EdgeMap::compute(&frame);
/// assert_eq!((map.width(), map.height()), (8, 8));
/// assert_eq!(map.magnitude(4, 4), 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeMap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl EdgeMap {
    /// Compute the map for `frame`.
    #[must_use]
    pub fn compute(frame: &FrameBuffer) -> Self {
        let width = frame.width / 2;
        let height = frame.height / 2;
        let luma = half_res_luma(frame, width, height);
        let mut data = vec![0u8; width as usize * height as usize];

        let w = width as usize;
        for y in 1..(height as usize).saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                let at = |dx: usize, dy: usize| luma[(y + dy - 1) * w + (x + dx - 1)];
                let (tl, tc, tr) = (at(0, 0), at(1, 0), at(2, 0));
                let (ml, mr) = (at(0, 1), at(2, 1));
                let (bl, bc, br) = (at(0, 2), at(1, 2), at(2, 2));

                let gx = -tl + tr - 2.0 * ml + 2.0 * mr - bl + br;
                let gy = -tl - 2.0 * tc - tr + bl + 2.0 * bc + br;
                data[y * w + x] = (gx * gx + gy * gy).sqrt().min(255.0) as u8;
            }
        }

        log::trace!("Carte de contours {width}×{height} calculée");
        Self {
            width,
            height,
            data,
        }
    }

    /// Width of the half-resolution map.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the half-resolution map.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Magnitude at half-resolution coordinates, 0 outside the map.
    #[inline(always)]
    #[must_use]
    pub fn magnitude(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// `true` dès qu'un point échantillonné de la tuile dépasse `threshold`.
    ///
    /// Test d'existence bon marché : au plus 9 points (début, milieu, fin de
    /// l'empreinte demi-résolution sur chaque axe), sortie au premier succès.
    ///
    /// Tolérance d'un demi-pixel : le support 3×3 du Sobel déborde d'un pixel
    /// demi-résolution, si bien qu'une discontinuité proche du bord d'une
    /// tuile marque aussi la tuile voisine.
    ///
    /// # Example
    /// ```
    /// use gt_core::frame::FrameBuffer;
    /// use gt_glyph::edge::EdgeMap;
    /// use gt_glyph::grid::TileRect;
    ///
    /// let map = EdgeMap::compute(&FrameBuffer::new(32, 32));
    /// assert!(!map.has_edge(TileRect::new(0, 0, 16, 16), 0));
    /// ```
    #[must_use]
    pub fn has_edge(&self, rect: TileRect, threshold: u8) -> bool {
        if rect.is_empty() || self.width == 0 || self.height == 0 {
            return false;
        }
        let hx0 = rect.x / 2;
        let hy0 = rect.y / 2;
        if hx0 >= self.width || hy0 >= self.height {
            return false;
        }
        let hx1 = ((rect.right() - 1) / 2).min(self.width - 1);
        let hy1 = ((rect.bottom() - 1) / 2).min(self.height - 1);

        for j in 0..PROBES_PER_AXIS {
            let y = hy0 + j * (hy1 - hy0) / (PROBES_PER_AXIS - 1);
            for i in 0..PROBES_PER_AXIS {
                let x = hx0 + i * (hx1 - hx0) / (PROBES_PER_AXIS - 1);
                if self.magnitude(x, y) > threshold {
                    return true;
                }
            }
        }
        false
    }
}

/// Luminance moyenne de chaque bloc 2×2.
fn half_res_luma(frame: &FrameBuffer, width: u32, height: u32) -> Vec<f32> {
    let mut out = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let (sx, sy) = (x * 2, y * 2);
            let sum = frame.luma(sx, sy)
                + frame.luma(sx + 1, sy)
                + frame.luma(sx, sy + 1)
                + frame.luma(sx + 1, sy + 1);
            out.push(sum / 4.0);
        }
    }
    out
}
