use gt_core::config::GlyphConfig;
use gt_core::frame::FrameBuffer;

use crate::grid::{GridLayout, TileRect};

/// Luminance retournée pour une tuile sans aucun échantillon.
pub const DEGENERATE_BRIGHTNESS: f32 = 128.0;

/// Échantillons par axe selon la densité de la grille.
///
/// Plus il y a de tuiles, moins chaque tuile est échantillonnée :
/// 16 points sous 2 000 tuiles, 9 sous 5 000, 4 au-delà.
///
/// # Example
/// ```
/// use gt_glyph::luminance::samples_per_axis;
/// assert_eq!(samples_per_axis(1_999), 4);
/// assert_eq!(samples_per_axis(2_000), 3);
/// assert_eq!(samples_per_axis(5_000), 2);
/// ```
#[must_use]
pub fn samples_per_axis(tile_count: usize) -> u32 {
    if tile_count < 2_000 {
        4
    } else if tile_count < 5_000 {
        3
    } else {
        2
    }
}

/// Luminance moyenne par tuile, par échantillonnage clairsemé.
///
/// # Example
/// ```
/// use gt_core::frame::FrameBuffer;
/// use gt_glyph::grid::TileRect;
/// use gt_glyph::luminance::LuminanceSampler;
///
/// let mut frame = FrameBuffer::new(8, 8);
/// frame.fill([100, 100, 100, 255]);
/// let sampler = LuminanceSampler::new(4, false, 1.0);
/// assert_eq!(sampler.brightness(&frame, TileRect::new(0, 0, 8, 8)), 100);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LuminanceSampler {
    per_axis: u32,
    invert: bool,
    intensity: f32,
}

impl LuminanceSampler {
    /// Build a sampler taking at most `per_axis²` samples per tile.
    #[must_use]
    pub fn new(per_axis: u32, invert: bool, intensity: f32) -> Self {
        Self {
            per_axis: per_axis.max(1),
            invert,
            intensity,
        }
    }

    /// Sampler for the given configuration and grid density.
    #[must_use]
    pub fn for_config(config: &GlyphConfig, tile_count: usize) -> Self {
        Self::new(
            samples_per_axis(tile_count),
            config.invert,
            config.intensity,
        )
    }

    /// Moyenne brute des luminances échantillonnées dans `rect`.
    ///
    /// Les points sont répartis au centre de `n` bandes égales sur chaque
    /// axe. Retourne `None` si aucun point ne tombe dans la frame.
    #[must_use]
    pub fn average(&self, frame: &FrameBuffer, rect: TileRect) -> Option<f32> {
        if rect.is_empty() {
            return None;
        }
        let nx = self.per_axis.min(rect.width);
        let ny = self.per_axis.min(rect.height);

        let mut total = 0.0f32;
        let mut count = 0u32;
        for j in 0..ny {
            let y = rect.y + (2 * j + 1) * rect.height / (2 * ny);
            if y >= frame.height {
                continue;
            }
            for i in 0..nx {
                let x = rect.x + (2 * i + 1) * rect.width / (2 * nx);
                if x >= frame.width {
                    continue;
                }
                total += frame.luma(x, y);
                count += 1;
            }
        }
        (count > 0).then(|| total / count as f32)
    }

    /// Applique inversion puis contraste autour de 128, arrondi dans [0, 255].
    ///
    /// # Example
    /// ```
    /// use gt_glyph::luminance::LuminanceSampler;
    /// let sampler = LuminanceSampler::new(4, true, 2.0);
    /// // 255 − 100 = 155 → 128 + 27 × 2 = 182
    /// assert_eq!(sampler.adjust(100.0), 182);
    /// ```
    #[inline]
    #[must_use]
    pub fn adjust(&self, average: f32) -> u8 {
        let mut value = if self.invert {
            255.0 - average
        } else {
            average
        };
        if (self.intensity - 1.0).abs() > f32::EPSILON {
            value = (value - 128.0) * self.intensity + 128.0;
        }
        value.clamp(0.0, 255.0).round() as u8
    }

    /// Luminance finale de la tuile, prête pour la table de steps.
    #[must_use]
    pub fn brightness(&self, frame: &FrameBuffer, rect: TileRect) -> u8 {
        let average = self.average(frame, rect).unwrap_or(DEGENERATE_BRIGHTNESS);
        self.adjust(average)
    }

    /// Luminance de chaque tuile de la grille, en ordre row-major.
    #[must_use]
    pub fn sample_grid(&self, frame: &FrameBuffer, layout: &GridLayout) -> Vec<u8> {
        layout
            .cells()
            .map(|(tx, ty)| self.brightness(frame, layout.base_rect(tx, ty)))
            .collect()
    }
}
