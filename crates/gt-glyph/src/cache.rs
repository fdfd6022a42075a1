use std::sync::Arc;

use gt_core::config::GlyphConfig;
use gt_core::error::CoreError;
use gt_core::frame::FrameBuffer;
use gt_core::identity::FrameIdentity;

use crate::edge::EdgeMap;
use crate::grid::GridLayout;
use crate::luminance::LuminanceSampler;
use crate::step_table::StepTable;

/// Raison d'une invalidation, pour les logs et les tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Invalidation {
    /// Luminance et contours jetés : la frame source n'est plus la même.
    pub source: bool,
    /// Tout jeté : la configuration a changé.
    pub config: bool,
}

impl Invalidation {
    /// `true` if anything was dropped.
    #[must_use]
    pub fn any(&self) -> bool {
        self.source || self.config
    }
}

/// Données dérivées valides pour la frame courante.
#[derive(Debug)]
pub struct CachedFrame<'a> {
    /// Table luminance → step.
    pub table: &'a StepTable,
    /// Luminance par tuile, row-major.
    pub luminance: &'a [u8],
    /// Carte de contours, si la détection est active.
    pub edges: Option<&'a EdgeMap>,
}

/// Cache luminance / contours / table de steps, indexé par [`FrameIdentity`].
///
/// Ne sert jamais de données calculées pour une identité différente de
/// l'identité courante. Seules les images fixes sont réutilisables d'un tick
/// à l'autre ; vidéo et scène recalculent à chaque tick.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use gt_core::config::{GlyphConfig, InputMode};
/// use gt_core::frame::FrameBuffer;
/// use gt_core::identity::{FrameIdentity, SourceKey};
/// use gt_glyph::cache::FrameCache;
/// use gt_glyph::grid::GridLayout;
///
/// let config = Arc::new(GlyphConfig { width: 32, height: 32, tiles_per_row: 4, ..GlyphConfig::default() });
/// let frame = FrameBuffer::new(32, 32);
/// let id = FrameIdentity::new(InputMode::Image, 32, 32, SourceKey::Image(1));
/// let layout = GridLayout::new(32, 32, 4);
///
/// let mut cache = FrameCache::new();
/// assert!(cache.prepare(id, &config).any());
/// assert_eq!(cache.data(&frame, &config, &layout).unwrap().luminance.len(), 16);
/// assert!(!cache.prepare(id, &config).any());
/// ```
#[derive(Debug, Default)]
pub struct FrameCache {
    identity: Option<FrameIdentity>,
    config: Option<Arc<GlyphConfig>>,
    table: Option<StepTable>,
    luminance: Option<Vec<u8>>,
    edges: Option<EdgeMap>,
}

impl FrameCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare la frame et la configuration courantes aux précédentes et
    /// jette ce qui est périmé.
    ///
    /// Appelé une fois par tick rendu, avant [`FrameCache::data`].
    pub fn prepare(&mut self, identity: FrameIdentity, config: &Arc<GlyphConfig>) -> Invalidation {
        let config_changed = match &self.config {
            Some(previous) => !Arc::ptr_eq(previous, config) && **previous != **config,
            None => true,
        };
        let source_changed = match &self.identity {
            Some(previous) => !previous.reusable_for(&identity),
            None => true,
        };

        if config_changed {
            self.table = None;
            self.luminance = None;
            self.edges = None;
            log::debug!("Cache invalidé : configuration modifiée");
        } else if source_changed {
            self.luminance = None;
            self.edges = None;
            if identity.is_stable() {
                log::debug!("Cache invalidé : nouvelle frame source {:?}", identity.key);
            }
        }

        self.identity = Some(identity);
        self.config = Some(Arc::clone(config));
        Invalidation {
            source: source_changed,
            config: config_changed,
        }
    }

    /// Données dérivées pour `frame`, recalculées seulement si absentes.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptySteps`] if the configuration has no steps.
    pub fn data(
        &mut self,
        frame: &FrameBuffer,
        config: &GlyphConfig,
        layout: &GridLayout,
    ) -> Result<CachedFrame<'_>, CoreError> {
        let table = match self.table.take() {
            Some(table) => table,
            None => StepTable::build(&config.steps)?,
        };
        let table = &*self.table.insert(table);

        let luminance = self.luminance.get_or_insert_with(|| {
            LuminanceSampler::for_config(config, layout.tile_count()).sample_grid(frame, layout)
        });

        let edges = if config.edges_enabled {
            Some(&*self.edges.get_or_insert_with(|| EdgeMap::compute(frame)))
        } else {
            None
        };

        Ok(CachedFrame {
            table,
            luminance,
            edges,
        })
    }

    /// Vide entièrement le cache.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// `true` if per-tile luminance is currently cached.
    #[must_use]
    pub fn has_luminance(&self) -> bool {
        self.luminance.is_some()
    }

    /// `true` if an edge map is currently cached.
    #[must_use]
    pub fn has_edges(&self) -> bool {
        self.edges.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gt_core::config::InputMode;
    use gt_core::identity::SourceKey;

    fn setup() -> (Arc<GlyphConfig>, FrameBuffer, GridLayout) {
        let config = Arc::new(GlyphConfig {
            width: 16,
            height: 16,
            tiles_per_row: 4,
            edges_enabled: true,
            ..GlyphConfig::default()
        });
        (config, FrameBuffer::new(16, 16), GridLayout::new(16, 16, 4))
    }

    fn image(handle: u64) -> FrameIdentity {
        FrameIdentity::new(InputMode::Image, 16, 16, SourceKey::Image(handle))
    }

    #[test]
    fn still_image_is_reused() {
        let (config, frame, layout) = setup();
        let mut cache = FrameCache::new();
        cache.prepare(image(1), &config);
        cache.data(&frame, &config, &layout).unwrap();
        assert!(cache.has_luminance() && cache.has_edges());

        let inv = cache.prepare(image(1), &config);
        assert!(!inv.any());
        assert!(cache.has_luminance() && cache.has_edges());
    }

    #[test]
    fn new_image_drops_luminance_and_edges() {
        let (config, frame, layout) = setup();
        let mut cache = FrameCache::new();
        cache.prepare(image(1), &config);
        cache.data(&frame, &config, &layout).unwrap();

        let inv = cache.prepare(image(2), &config);
        assert_eq!(inv, Invalidation { source: true, config: false });
        assert!(!cache.has_luminance());
        assert!(!cache.has_edges());
    }

    #[test]
    fn video_is_always_fresh() {
        let (config, frame, layout) = setup();
        let mut cache = FrameCache::new();
        let id = FrameIdentity::new(InputMode::Video, 16, 16, SourceKey::VideoPosition(40));
        cache.prepare(id, &config);
        cache.data(&frame, &config, &layout).unwrap();
        assert!(cache.prepare(id, &config).source);
        assert!(!cache.has_luminance());
    }

    #[test]
    fn mode_and_size_changes_invalidate() {
        let (config, frame, layout) = setup();
        let mut cache = FrameCache::new();
        cache.prepare(image(1), &config);
        cache.data(&frame, &config, &layout).unwrap();
        let resized = FrameIdentity::new(InputMode::Image, 16, 8, SourceKey::Image(1));
        assert!(cache.prepare(resized, &config).source);
    }

    #[test]
    fn equal_config_value_is_not_a_change() {
        let (config, frame, layout) = setup();
        let mut cache = FrameCache::new();
        cache.prepare(image(1), &config);
        cache.data(&frame, &config, &layout).unwrap();
        let same = Arc::new((*config).clone());
        assert!(!cache.prepare(image(1), &same).config);
        assert!(cache.has_luminance());
    }

    #[test]
    fn edited_steps_rebuild_the_table() {
        let (config, frame, layout) = setup();
        let mut cache = FrameCache::new();
        cache.prepare(image(1), &config);
        let before = cache.data(&frame, &config, &layout).unwrap().table.lookup(0).symbol;
        assert_eq!(before, '■');

        let mut edited = (*config).clone();
        edited.steps[0].symbol = '@';
        let edited = Arc::new(edited);
        assert!(cache.prepare(image(1), &edited).config);
        let after = cache.data(&frame, &edited, &layout).unwrap().table.lookup(0).symbol;
        assert_eq!(after, '@');
    }

    #[test]
    fn edges_skipped_when_disabled() {
        let (config, frame, layout) = setup();
        let config = Arc::new(GlyphConfig {
            edges_enabled: false,
            ..(*config).clone()
        });
        let mut cache = FrameCache::new();
        cache.prepare(image(1), &config);
        assert!(cache.data(&frame, &config, &layout).unwrap().edges.is_none());
        assert!(!cache.has_edges());
    }
}
