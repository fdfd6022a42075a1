//! Glyph-art engine for glyphtile.
//!
//! Turns a source frame into a plan of tiles: per-tile brightness, resolved
//! step, animated glyph scale and edge overlay flag. Painting the plan onto a
//! raster is the job of `gt-render`.

pub mod animation;
pub mod cache;
pub mod compositor;
pub mod edge;
pub mod grid;
pub mod luminance;
pub mod step_table;

pub use cache::FrameCache;
pub use compositor::{Composition, Tile, TileCompositor};
pub use edge::EdgeMap;
pub use grid::{GridLayout, TileRect};
pub use luminance::LuminanceSampler;
pub use step_table::StepTable;
