use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::InputMode;

static NEXT_IMAGE_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Alloue un handle unique pour une image décodée.
///
/// Deux chargements du même fichier reçoivent deux handles distincts.
#[must_use]
pub fn next_image_handle() -> u64 {
    NEXT_IMAGE_HANDLE.fetch_add(1, Ordering::Relaxed)
}

/// Discriminant spécifique à la source d'une frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKey {
    /// Image fixe identifiée par son handle de chargement.
    Image(u64),
    /// Position de lecture vidéo en microsecondes.
    VideoPosition(u64),
    /// Frame de scène 3D, numérotée par tick rendu.
    SceneTick(u64),
}

/// Clé de cache identifiant « exactement cette frame source ».
///
/// Seules les images fixes produisent des identités stables : une vidéo en
/// lecture ou une scène 3D animée sont toujours considérées comme neuves.
///
/// # Example
/// ```
/// use gt_core::config::InputMode;
/// use gt_core::identity::{FrameIdentity, SourceKey};
///
/// let a = FrameIdentity::new(InputMode::Image, 64, 64, SourceKey::Image(7));
/// let b = FrameIdentity::new(InputMode::Image, 64, 64, SourceKey::Image(7));
/// assert!(a.reusable_for(&b));
///
/// let v = FrameIdentity::new(InputMode::Video, 64, 64, SourceKey::VideoPosition(0));
/// assert!(!v.reusable_for(&v));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameIdentity {
    /// Mode d'entrée ayant produit la frame.
    pub mode: InputMode,
    /// Largeur du canvas.
    pub width: u32,
    /// Hauteur du canvas.
    pub height: u32,
    /// Discriminant propre à la source.
    pub key: SourceKey,
}

impl FrameIdentity {
    /// Build an identity.
    #[must_use]
    pub fn new(mode: InputMode, width: u32, height: u32, key: SourceKey) -> Self {
        Self {
            mode,
            width,
            height,
            key,
        }
    }

    /// `true` if two frames with this identity are pixel-identical.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        matches!(self.key, SourceKey::Image(_))
    }

    /// `true` if data cached for `self` may be served for `current`.
    #[must_use]
    pub fn reusable_for(&self, current: &FrameIdentity) -> bool {
        self.is_stable() && self == current
    }
}
