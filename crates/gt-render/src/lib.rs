//! Raster painting and terminal preview for glyphtile.
//!
//! Paints the tile plan produced by `gt-glyph` onto an RGBA raster, and
//! shows that raster in a terminal with half-block cells.

pub mod canvas;
pub mod glyph;
pub mod meter;
pub mod painter;
pub mod preview;

pub use glyph::{BlockGlyphs, FontAtlas, GlyphMask, GlyphRasterizer};
pub use painter::TilePainter;
