use std::sync::Arc;

use gt_core::config::{GlyphConfig, Step};
use gt_core::error::CoreError;
use gt_core::traits::SourceFrame;

use crate::animation::{animated_tile_side, glyph_scale};
use crate::cache::{FrameCache, Invalidation};
use crate::grid::{GridLayout, TileRect};

/// Une tuile résolue, prête à peindre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    /// Column index.
    pub column: u32,
    /// Row index.
    pub row: u32,
    /// Rectangle dessiné (animé si les lignes de grille sont visibles).
    pub rect: TileRect,
    /// Luminance ajustée de la cellule de base.
    pub brightness: u8,
    /// Index du step résolu dans `Composition::steps`.
    pub step: usize,
    /// Échelle du glyphe (1.0 pour une tuile de contour).
    pub scale: f32,
    /// La tuile porte la surcouche de contour au lieu du glyphe normal.
    pub edge: bool,
}

/// Résultat d'un passage du compositor.
#[derive(Debug)]
pub struct Composition<'a> {
    /// Géométrie de la grille.
    pub layout: GridLayout,
    /// Tuiles en ordre row-major.
    pub tiles: &'a [Tile],
    /// Steps référencés par `Tile::step`.
    pub steps: &'a [Step],
}

impl Composition<'_> {
    /// Step for a tile.
    #[must_use]
    pub fn step_of(&self, tile: &Tile) -> Option<&Step> {
        self.steps.get(tile.step)
    }

    /// Nombre de tuiles de contour.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.edge).count()
    }
}

/// Compositor : parcourt la grille et décide, par tuile, entre surcouche de
/// contour et glyphe normal.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use gt_core::config::{GlyphConfig, InputMode};
/// use gt_core::frame::FrameBuffer;
/// use gt_core::identity::{FrameIdentity, SourceKey};
/// use gt_core::traits::SourceFrame;
/// use gt_glyph::compositor::TileCompositor;
///
/// let config = Arc::new(GlyphConfig { width: 40, height: 40, tiles_per_row: 4, ..GlyphConfig::default() });
/// let frame = SourceFrame {
///     buffer: Arc::new(FrameBuffer::new(40, 40)),
///     identity: FrameIdentity::new(InputMode::Image, 40, 40, SourceKey::Image(1)),
/// };
/// let mut compositor = TileCompositor::new();
/// let plan = compositor.compose(&frame, &config, 0.0).unwrap();
/// assert_eq!(plan.tiles.len(), 16);
/// // Noir inversé → 255 → "White".
/// assert_eq!(plan.step_of(&plan.tiles[0]).unwrap().name, "White");
/// ```
#[derive(Debug, Default)]
pub struct TileCompositor {
    cache: FrameCache,
    tiles: Vec<Tile>,
    last_invalidation: Invalidation,
}

impl TileCompositor {
    /// Create a compositor with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose une frame en plan de tuiles pour le temps de simulation `time`.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptySteps`] if the configuration has no steps.
    pub fn compose(
        &mut self,
        frame: &SourceFrame,
        config: &Arc<GlyphConfig>,
        time: f64,
    ) -> Result<Composition<'_>, CoreError> {
        let layout = GridLayout::new(config.width, config.height, config.tiles_per_row);
        self.last_invalidation = self.cache.prepare(frame.identity, config);
        let cached = self.cache.data(&frame.buffer, config, &layout)?;

        let grid_lines = config.grid_line_opacity > 0.0;
        let drawn_side = animated_tile_side(config, time);

        self.tiles.clear();
        self.tiles.reserve(layout.tile_count());
        for ((tx, ty), &brightness) in layout.cells().zip(cached.luminance) {
            let base = layout.base_rect(tx, ty);
            let rect = if grid_lines {
                layout.centered_rect(tx, ty, drawn_side)
            } else {
                base
            };
            let edge = cached
                .edges
                .is_some_and(|map| map.has_edge(base, config.edge_threshold));
            let scale = if edge {
                1.0
            } else {
                glyph_scale(config, time, tx, ty)
            };
            self.tiles.push(Tile {
                column: tx,
                row: ty,
                rect,
                brightness,
                step: cached.table.index_of(brightness),
                scale,
                edge,
            });
        }

        Ok(Composition {
            layout,
            tiles: &self.tiles,
            steps: cached.table.steps(),
        })
    }

    /// Invalidation décidée au dernier [`TileCompositor::compose`].
    #[must_use]
    pub fn last_invalidation(&self) -> Invalidation {
        self.last_invalidation
    }

    /// Oublie toutes les données en cache.
    pub fn reset(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gt_core::config::InputMode;
    use gt_core::frame::FrameBuffer;
    use gt_core::identity::{FrameIdentity, SourceKey};

    fn source(buffer: FrameBuffer, key: SourceKey, mode: InputMode) -> SourceFrame {
        let (w, h) = (buffer.width, buffer.height);
        SourceFrame {
            buffer: Arc::new(buffer),
            identity: FrameIdentity::new(mode, w, h, key),
        }
    }

    fn split_frame(width: u32, height: u32) -> FrameBuffer {
        let mut frame = FrameBuffer::new(width, height);
        for y in 0..height {
            for x in width / 2..width {
                let i = ((y * width + x) * 4) as usize;
                frame.data[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
            }
        }
        frame
    }

    fn config(width: u32, height: u32, tiles: u32) -> GlyphConfig {
        GlyphConfig {
            width,
            height,
            tiles_per_row: tiles,
            invert: false,
            intensity: 1.0,
            ..GlyphConfig::default()
        }
    }

    #[test]
    fn brightness_selects_steps() {
        let config = Arc::new(config(64, 32, 4));
        let frame = source(split_frame(64, 32), SourceKey::Image(1), InputMode::Image);
        let mut compositor = TileCompositor::new();
        let plan = compositor.compose(&frame, &config, 0.0).unwrap();
        let names: Vec<&str> = plan.tiles[..4]
            .iter()
            .map(|t| plan.step_of(t).unwrap().name.as_str())
            .collect();
        assert_eq!(names, ["Black", "Black", "White", "White"]);
    }

    #[test]
    fn edge_tiles_skip_glyph_animation() {
        let config = Arc::new(GlyphConfig {
            edges_enabled: true,
            ..config(64, 32, 4)
        });
        let frame = source(split_frame(64, 32), SourceKey::Image(1), InputMode::Image);
        let mut compositor = TileCompositor::new();
        let plan = compositor.compose(&frame, &config, 0.0).unwrap();
        assert_eq!(plan.edge_count(), 4);
        for tile in plan.tiles {
            assert_eq!(tile.edge, tile.column == 1 || tile.column == 2);
            if tile.edge {
                assert!((tile.scale - 1.0).abs() < f32::EPSILON);
            } else {
                assert!((0.0..=1.5).contains(&tile.scale));
            }
        }
    }

    #[test]
    fn edge_to_edge_tiles_cover_canvas() {
        let config = Arc::new(config(101, 57, 9));
        let frame = source(FrameBuffer::new(101, 57), SourceKey::Image(3), InputMode::Image);
        let mut compositor = TileCompositor::new();
        let plan = compositor.compose(&frame, &config, 0.0).unwrap();
        let area: u64 = plan.tiles.iter().map(|t| t.rect.area()).sum();
        assert_eq!(area, 101 * 57);
    }

    #[test]
    fn grid_lines_shrink_tiles_with_size_animation() {
        let config = Arc::new(GlyphConfig {
            grid_line_opacity: 0.5,
            grid_line_width: 1.0,
            grid_size_animation: true,
            size_speed: 0.5,
            min_tile_size: 4.0,
            max_tile_size: 8.0,
            ..config(64, 64, 4)
        });
        let frame = source(FrameBuffer::new(64, 64), SourceKey::Image(4), InputMode::Image);
        let mut compositor = TileCompositor::new();
        let plan = compositor.compose(&frame, &config, 0.0).unwrap();
        // sin(0) → facteur 0.5 → côté 6, centré dans une cellule de 16.
        assert_eq!(plan.tiles[0].rect, TileRect::new(5, 5, 6, 6));
    }

    #[test]
    fn video_frames_recompute_every_tick() {
        let config = Arc::new(config(16, 16, 2));
        let mut compositor = TileCompositor::new();
        let a = source(FrameBuffer::new(16, 16), SourceKey::VideoPosition(0), InputMode::Video);
        compositor.compose(&a, &config, 0.0).unwrap();
        let b = source(split_frame(16, 16), SourceKey::VideoPosition(0), InputMode::Video);
        let plan = compositor.compose(&b, &config, 0.01).unwrap();
        assert_eq!(plan.tiles[1].brightness, 255);
        assert!(compositor.last_invalidation().source);
    }

    #[test]
    fn still_image_reuses_luminance() {
        let config = Arc::new(config(16, 16, 2));
        let mut compositor = TileCompositor::new();
        let black = source(FrameBuffer::new(16, 16), SourceKey::Image(9), InputMode::Image);
        compositor.compose(&black, &config, 0.0).unwrap();
        // Même identité, pixels différents : le cache fait foi.
        let other = source(split_frame(16, 16), SourceKey::Image(9), InputMode::Image);
        let plan = compositor.compose(&other, &config, 0.01).unwrap();
        assert_eq!(plan.tiles[1].brightness, 0);
        assert!(!compositor.last_invalidation().any());
    }
}
