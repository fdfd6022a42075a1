//! Configuration, types, and shared structures for glyphtile.
//!
//! This crate contains the configuration snapshot, pixel buffers, frame
//! identities, the animation clock and the traits at the seams of the
//! engine (sources and encoders).

pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod glyphs;
pub mod identity;
pub mod presets;
pub mod traits;

pub use clock::AnimationClock;
pub use color::Rgb;
pub use config::{GlyphConfig, Step};
pub use error::CoreError;
pub use frame::FrameBuffer;
pub use identity::FrameIdentity;
