use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use gt_core::frame::FrameBuffer;
use gt_core::traits::{ArtifactKind, EncodedArtifact, Encoder};
use image::codecs::gif::{GifEncoder as ImageGifEncoder, Repeat};
use image::{Delay, Frame};

use crate::still::to_rgba_image;

/// Vitesse de quantification NeuQuant (1 = lent/précis, 30 = rapide).
const QUANTIZE_SPEED: i32 = 10;

/// GIF animé bouclé, une frame par tick capturé.
///
/// Le fichier n'est créé qu'à la première frame.
pub struct GifEncoder {
    path: PathBuf,
    delay: Delay,
    inner: Option<ImageGifEncoder<BufWriter<File>>>,
    frames: usize,
}

impl std::fmt::Debug for GifEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GifEncoder")
            .field("path", &self.path)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl GifEncoder {
    /// Encode to `path` at `fps` frames per second.
    #[must_use]
    pub fn new(path: PathBuf, fps: u32) -> Self {
        Self {
            path,
            delay: Delay::from_numer_denom_ms(1000, fps.max(1)),
            inner: None,
            frames: 0,
        }
    }

    fn open(&self) -> Result<ImageGifEncoder<BufWriter<File>>> {
        let file = File::create(&self.path)
            .with_context(|| format!("Impossible de créer {}", self.path.display()))?;
        let mut encoder = ImageGifEncoder::new_with_speed(BufWriter::new(file), QUANTIZE_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .context("Impossible de configurer la boucle GIF")?;
        Ok(encoder)
    }
}

impl Encoder for GifEncoder {
    fn accept(&mut self, frame: &FrameBuffer) -> Result<()> {
        let encoder = match self.inner.take() {
            Some(encoder) => encoder,
            None => self.open()?,
        };
        let encoder = self.inner.insert(encoder);
        let image = to_rgba_image(frame)?;
        encoder
            .encode_frame(Frame::from_parts(image, 0, 0, self.delay))
            .with_context(|| format!("Encodage GIF échoué (frame {})", self.frames + 1))?;
        self.frames += 1;
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<EncodedArtifact> {
        // Le trailer GIF est écrit à la destruction de l'encodeur.
        drop(self.inner);
        log::debug!("GIF : {} frames → {}", self.frames, self.path.display());
        Ok(EncodedArtifact {
            kind: ArtifactKind::AnimatedImage,
            path: self.path,
            frames: self.frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::AnimationDecoder;
    use image::codecs::gif::GifDecoder;

    #[test]
    fn writes_looping_animation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.gif");
        let mut enc = Box::new(GifEncoder::new(path.clone(), 10));
        for v in [0u8, 255] {
            let mut fb = FrameBuffer::new(4, 4);
            fb.fill([v, v, v, 255]);
            enc.accept(&fb).unwrap();
        }
        let artifact = enc.finalize().unwrap();
        assert_eq!(artifact.kind, ArtifactKind::AnimatedImage);
        assert_eq!(artifact.frames, 2);

        let file = std::io::BufReader::new(File::open(&path).unwrap());
        let frames = GifDecoder::new(file).unwrap().into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 2);
        let (num, den) = frames[0].delay().numer_denom_ms();
        assert_eq!(num / den, 100);
    }

    #[test]
    fn nothing_written_without_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.gif");
        let _enc = GifEncoder::new(path.clone(), 24);
        assert!(!path.exists());
    }
}
