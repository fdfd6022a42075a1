use std::path::PathBuf;

use anyhow::{Context, Result};
use gt_core::frame::FrameBuffer;
use gt_core::traits::{ArtifactKind, EncodedArtifact, Encoder};

use crate::still::save_png;

/// Séquence d'images PNG numérotées (`frame_00001.png`, …) dans un dossier.
///
/// Le dossier n'est créé qu'à la première frame.
///
/// # Example
/// ```
/// use gt_core::frame::FrameBuffer;
/// use gt_core::traits::Encoder;
/// use gt_export::png_seq::PngSequenceEncoder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut enc = Box::new(PngSequenceEncoder::new(dir.path().join("seq")));
/// enc.accept(&FrameBuffer::new(2, 2)).unwrap();
/// let artifact = enc.finalize().unwrap();
/// assert!(artifact.path.join("frame_00001.png").is_file());
/// ```
#[derive(Debug)]
pub struct PngSequenceEncoder {
    dir: PathBuf,
    frames: usize,
}

impl PngSequenceEncoder {
    /// Write frames into `dir`.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, frames: 0 }
    }

    /// Nom du fichier de la frame `index` (à partir de 1).
    #[must_use]
    pub fn frame_name(index: usize) -> String {
        format!("frame_{index:05}.png")
    }
}

impl Encoder for PngSequenceEncoder {
    fn accept(&mut self, frame: &FrameBuffer) -> Result<()> {
        if self.frames == 0 {
            std::fs::create_dir_all(&self.dir)
                .with_context(|| format!("Impossible de créer {}", self.dir.display()))?;
        }
        self.frames += 1;
        save_png(frame, &self.dir.join(Self::frame_name(self.frames)))
    }

    fn finalize(self: Box<Self>) -> Result<EncodedArtifact> {
        Ok(EncodedArtifact {
            kind: ArtifactKind::ImageSequence,
            path: self.dir,
            frames: self.frames,
        })
    }
}
