//! Capture and export for glyphtile: the capture state machine, video /
//! animated image / image sequence encoders and single-frame stills.

pub mod capture;
pub mod gif;
pub mod mp4;
pub mod png_seq;
pub mod still;

pub use capture::{CaptureCoordinator, CaptureError, CaptureHandle, CaptureState};
pub use gif::GifEncoder;
pub use mp4::Mp4Encoder;
pub use png_seq::PngSequenceEncoder;
