//! Frame sources for glyphtile (still image, video, 3D scene).

pub mod image;
pub mod resize;

#[cfg(feature = "scene")]
pub mod scene;
#[cfg(feature = "video")]
pub mod video;
