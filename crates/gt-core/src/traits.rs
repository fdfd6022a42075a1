use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{GlyphConfig, InputMode};
use crate::frame::FrameBuffer;
use crate::identity::FrameIdentity;

/// Frame produite par une [`FrameSource`], avec sa clé de cache.
#[derive(Clone, Debug)]
pub struct SourceFrame {
    /// Pixels RGBA, origine en haut à gauche, aux dimensions demandées.
    pub buffer: Arc<FrameBuffer>,
    /// Identité de la frame pour le cache luminance/contours.
    pub identity: FrameIdentity,
}

/// Fournit des frames visuelles au pipeline.
///
/// Implémenté par : `ImageSource`, `VideoSource`, `SceneSource`.
///
/// # Example
/// ```
/// use gt_core::config::InputMode;
/// use gt_core::traits::{FrameSource, SourceFrame};
///
/// struct NotReady;
/// impl FrameSource for NotReady {
///     fn frame(&mut self, _w: u32, _h: u32) -> Option<SourceFrame> { None }
///     fn mode(&self) -> InputMode { InputMode::Image }
/// }
/// assert!(NotReady.frame(8, 8).is_none());
/// ```
pub trait FrameSource: Send + 'static {
    /// Retourne la frame courante, redimensionnée à `width × height`.
    ///
    /// Retourne `None` si la source n'est pas (encore) prête : le tick est
    /// alors un no-op. Ne bloque JAMAIS.
    fn frame(&mut self, width: u32, height: u32) -> Option<SourceFrame>;

    /// Mode d'entrée de cette source.
    fn mode(&self) -> InputMode;

    /// Appelé une fois par tick rendu, avant [`FrameSource::frame`].
    fn on_tick(&mut self, _config: &GlyphConfig) {}

    /// Suspend ou reprend la lecture.
    fn set_paused(&mut self, _paused: bool) {}
}

/// Nature de l'artefact produit par un encodeur.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Vidéo encodée (MP4).
    Video,
    /// Image animée (GIF).
    AnimatedImage,
    /// Dossier d'images numérotées.
    ImageSequence,
}

/// Résultat final d'un encodage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedArtifact {
    /// Nature de l'artefact.
    pub kind: ArtifactKind,
    /// Fichier ou dossier écrit.
    pub path: PathBuf,
    /// Nombre de frames acceptées.
    pub frames: usize,
}

/// Encodeur externe alimenté par le `CaptureCoordinator`.
///
/// Reçoit les frames dans l'ordre d'enregistrement, puis produit un unique
/// artefact. Exécuté hors du thread de rendu.
///
/// # Example
/// ```
/// use gt_core::frame::FrameBuffer;
/// use gt_core::traits::{ArtifactKind, EncodedArtifact, Encoder};
///
/// struct Counter(usize);
/// impl Encoder for Counter {
///     fn accept(&mut self, _frame: &FrameBuffer) -> anyhow::Result<()> {
///         self.0 += 1;
///         Ok(())
///     }
///     fn finalize(self: Box<Self>) -> anyhow::Result<EncodedArtifact> {
///         Ok(EncodedArtifact { kind: ArtifactKind::Video, path: "out.mp4".into(), frames: self.0 })
///     }
/// }
/// ```
pub trait Encoder: Send + 'static {
    /// Ajoute une frame à l'artefact.
    ///
    /// # Errors
    /// Propagates any failure of the underlying writer.
    fn accept(&mut self, frame: &FrameBuffer) -> anyhow::Result<()>;

    /// Termine l'encodage et retourne l'artefact.
    ///
    /// # Errors
    /// Propagates any failure of the underlying writer.
    fn finalize(self: Box<Self>) -> anyhow::Result<EncodedArtifact>;
}
