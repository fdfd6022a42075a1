use gt_core::color::Rgb;
use gt_core::config::GlyphConfig;
use gt_core::frame::FrameBuffer;
use gt_glyph::compositor::{Composition, Tile};

use crate::canvas::{draw_mask, fill_rect, stroke_rect};
use crate::glyph::GlyphRasterizer;

/// Opacité des fonds de step quand la frame source reste visible dessous.
pub const OVERLAY_BACKGROUND_ALPHA: f32 = 0.8;

/// Peint un plan de tuiles sur un raster RGBA.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use gt_core::config::{GlyphConfig, InputMode};
/// use gt_core::frame::FrameBuffer;
/// use gt_core::identity::{FrameIdentity, SourceKey};
/// use gt_core::traits::SourceFrame;
/// use gt_glyph::compositor::TileCompositor;
/// use gt_render::glyph::BlockGlyphs;
/// use gt_render::painter::TilePainter;
///
/// let config = Arc::new(GlyphConfig { width: 20, height: 20, tiles_per_row: 2, ..GlyphConfig::default() });
/// let source = SourceFrame {
///     buffer: Arc::new(FrameBuffer::new(20, 20)),
///     identity: FrameIdentity::new(InputMode::Image, 20, 20, SourceKey::Image(1)),
/// };
/// let mut compositor = TileCompositor::new();
/// let plan = compositor.compose(&source, &config, 0.0).unwrap();
///
/// let mut painter = TilePainter::new(BlockGlyphs::new());
/// let mut out = FrameBuffer::new(20, 20);
/// painter.paint(&plan, &config, &source.buffer, &mut out);
/// // Step "White" : fond noir opaque.
/// assert_eq!(out.pixel(0, 0), (0, 0, 0, 255));
/// ```
#[derive(Debug)]
pub struct TilePainter<R> {
    glyphs: R,
}

impl<R: GlyphRasterizer> TilePainter<R> {
    /// Create a painter drawing glyphs with `glyphs`.
    #[must_use]
    pub fn new(glyphs: R) -> Self {
        Self { glyphs }
    }

    /// Prépare le fond du raster selon le mode d'affichage.
    ///
    /// Transparent, frame source (surcouche), ou noir opaque.
    pub fn prepare_background(config: &GlyphConfig, source: &FrameBuffer, out: &mut FrameBuffer) {
        if !out.same_size(config.width, config.height) {
            *out = FrameBuffer::new(config.width, config.height);
        }
        if config.transparent_bg {
            out.fill([0, 0, 0, 0]);
        } else if config.show_input_overlay && source.same_size(out.width, out.height) {
            out.data.copy_from_slice(&source.data);
        } else {
            out.fill([0, 0, 0, 255]);
        }
    }

    /// Peint toutes les tuiles de `plan` dans `out` (redimensionné au canvas).
    pub fn paint(
        &mut self,
        plan: &Composition<'_>,
        config: &GlyphConfig,
        source: &FrameBuffer,
        out: &mut FrameBuffer,
    ) {
        Self::prepare_background(config, source, out);
        for tile in plan.tiles {
            if tile.edge {
                self.paint_edge(tile, config, out);
            } else {
                self.paint_glyph(plan, tile, config, out);
            }
        }
    }

    fn stroke_grid(tile: &Tile, config: &GlyphConfig, out: &mut FrameBuffer) {
        if config.grid_line_opacity > 0.0 && config.grid_line_width > 0.0 {
            stroke_rect(
                out,
                tile.rect,
                config.grid_line_color,
                config.grid_line_opacity,
                config.grid_line_width,
            );
        }
    }

    fn draw_symbol(
        &mut self,
        tile: &Tile,
        symbol: char,
        size: f32,
        color: Rgb,
        alpha: f32,
        out: &mut FrameBuffer,
    ) {
        if size < 1.0 {
            return;
        }
        let cx = tile.rect.x as f32 + tile.rect.width as f32 / 2.0;
        let cy = tile.rect.y as f32 + tile.rect.height as f32 / 2.0;
        if let Some(mask) = self.glyphs.glyph(symbol, size) {
            draw_mask(out, mask, cx, cy, color, alpha);
        }
    }

    fn paint_edge(&mut self, tile: &Tile, config: &GlyphConfig, out: &mut FrameBuffer) {
        fill_rect(
            out,
            tile.rect,
            config.edge_background,
            config.edge_background_alpha,
        );
        Self::stroke_grid(tile, config, out);
        self.draw_symbol(
            tile,
            config.edge_symbol,
            tile.rect.height as f32,
            config.edge_color,
            config.edge_color_alpha,
            out,
        );
    }

    fn paint_glyph(
        &mut self,
        plan: &Composition<'_>,
        tile: &Tile,
        config: &GlyphConfig,
        out: &mut FrameBuffer,
    ) {
        let Some(step) = plan.step_of(tile) else {
            return;
        };
        if !step.background_transparent {
            let alpha = if config.show_input_overlay && !config.transparent_bg {
                OVERLAY_BACKGROUND_ALPHA
            } else {
                1.0
            };
            fill_rect(out, tile.rect, step.background_color, alpha);
        }
        Self::stroke_grid(tile, config, out);
        if !step.symbol_transparent {
            self.draw_symbol(
                tile,
                step.symbol,
                tile.rect.height as f32 * tile.scale,
                step.symbol_color,
                1.0,
                out,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gt_core::config::{InputMode, Step};
    use gt_core::identity::{FrameIdentity, SourceKey};
    use gt_core::traits::SourceFrame;
    use gt_glyph::compositor::TileCompositor;

    use super::*;
    use crate::glyph::BlockGlyphs;

    fn render(config: GlyphConfig, source: FrameBuffer) -> FrameBuffer {
        let config = Arc::new(config);
        let (w, h) = (source.width, source.height);
        let frame = SourceFrame {
            buffer: Arc::new(source),
            identity: FrameIdentity::new(InputMode::Image, w, h, SourceKey::Image(1)),
        };
        let mut compositor = TileCompositor::new();
        let plan = compositor.compose(&frame, &config, 0.0).unwrap();
        let mut out = FrameBuffer::new(1, 1);
        TilePainter::new(BlockGlyphs::new()).paint(&plan, &config, &frame.buffer, &mut out);
        out
    }

    fn single_step(step: Step) -> GlyphConfig {
        GlyphConfig {
            width: 20,
            height: 20,
            tiles_per_row: 1,
            glyph_animation: false,
            steps: vec![step],
            ..GlyphConfig::default()
        }
    }

    #[test]
    fn glyph_drawn_over_background() {
        let step = Step::new("s", '#', Rgb::new(255, 0, 0), Rgb::new(0, 0, 255), 0, 255);
        let out = render(single_step(step), FrameBuffer::new(20, 20));
        assert_eq!((out.width, out.height), (20, 20));
        // Centre : glyphe rouge (carré de 12 px) ; coin : fond bleu.
        assert_eq!(out.pixel(10, 10), (255, 0, 0, 255));
        assert_eq!(out.pixel(0, 0), (0, 0, 255, 255));
    }

    #[test]
    fn transparency_flags_are_honoured() {
        let mut step = Step::new("s", '#', Rgb::new(255, 0, 0), Rgb::new(0, 0, 255), 0, 255);
        step.symbol_transparent = true;
        step.background_transparent = true;
        let config = GlyphConfig {
            transparent_bg: true,
            ..single_step(step)
        };
        let out = render(config, FrameBuffer::new(20, 20));
        assert!(out.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn overlay_keeps_source_visible() {
        let step = Step::new("s", ' ', Rgb::WHITE, Rgb::BLACK, 0, 255);
        let config = GlyphConfig {
            show_input_overlay: true,
            ..single_step(step)
        };
        let mut source = FrameBuffer::new(20, 20);
        source.fill([200, 200, 200, 255]);
        let out = render(config, source);
        // 200 × 0.2 = 40
        assert_eq!(out.pixel(0, 0), (40, 40, 40, 255));
    }

    #[test]
    fn edge_tiles_use_edge_colours() {
        let mut source = FrameBuffer::new(40, 20);
        for y in 0..20u32 {
            for x in 20..40u32 {
                let i = ((y * 40 + x) * 4) as usize;
                source.data[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
            }
        }
        let config = GlyphConfig {
            width: 40,
            height: 20,
            tiles_per_row: 2,
            edges_enabled: true,
            edge_background: Rgb::new(1, 2, 3),
            edge_color: Rgb::new(9, 9, 9),
            ..GlyphConfig::default()
        };
        let out = render(config, source);
        assert_eq!(out.pixel(0, 0), (1, 2, 3, 255));
        assert_eq!(out.pixel(10, 10), (9, 9, 9, 255));
    }

    #[test]
    fn grid_lines_are_stroked() {
        let step = Step::new("s", ' ', Rgb::WHITE, Rgb::BLACK, 0, 255);
        let config = GlyphConfig {
            grid_line_opacity: 1.0,
            grid_line_width: 1.0,
            grid_line_color: Rgb::new(0, 255, 0),
            ..single_step(step)
        };
        let out = render(config, FrameBuffer::new(20, 20));
        assert_eq!(out.pixel(0, 0), (0, 255, 0, 255));
        assert_eq!(out.pixel(10, 10), (0, 0, 0, 255));
    }
}
