use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use gt_core::clock::AnimationClock;
use gt_core::config::{GlyphConfig, InputMode};
use gt_core::frame::FrameBuffer;
use gt_core::traits::{Encoder, FrameSource};
use gt_export::capture::CaptureOutcome;
use gt_export::{
    CaptureCoordinator, CaptureError, CaptureHandle, CaptureState, GifEncoder, Mp4Encoder,
    PngSequenceEncoder,
};
use gt_glyph::TileCompositor;
use gt_render::{BlockGlyphs, FontAtlas, GlyphRasterizer, TilePainter};
use gt_source::image::ImageSource;

use crate::cli::{CaptureFormat, Cli};

/// Résultat d'un appel à [`FramePipeline::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Trop tôt pour la cadence, ou horloge en pause : aucun travail.
    Skipped,
    /// Source pas encore prête : le raster précédent reste affiché.
    NotReady,
    /// Nouveau raster composé (et enregistré si une capture est ouverte).
    Rendered,
}

/// Chaîne de rendu complète : source → compositor → painter → capture.
///
/// Pilotée une fois par rafraîchissement avec un snapshot immuable de la
/// config ; le throttling de cadence est fait par l'[`AnimationClock`].
pub struct FramePipeline {
    source: Box<dyn FrameSource>,
    clock: AnimationClock,
    compositor: TileCompositor,
    painter: TilePainter<Box<dyn GlyphRasterizer>>,
    raster: FrameBuffer,
    has_frame: bool,
    capture: CaptureCoordinator,
    capture_handle: Option<CaptureHandle>,
    meter: gt_render::meter::TickMeter,
}

impl FramePipeline {
    /// Assemble a pipeline around a source and a glyph rasterizer.
    #[must_use]
    pub fn new(source: Box<dyn FrameSource>, glyphs: Box<dyn GlyphRasterizer>) -> Self {
        Self {
            source,
            clock: AnimationClock::new(),
            compositor: TileCompositor::new(),
            painter: TilePainter::new(glyphs),
            raster: FrameBuffer::new(0, 0),
            has_frame: false,
            capture: CaptureCoordinator::new(),
            capture_handle: None,
            meter: gt_render::meter::TickMeter::new(30),
        }
    }

    /// Un passage de rendu pour le rafraîchissement à `now_ms`.
    pub fn tick(&mut self, config: &Arc<GlyphConfig>, now_ms: f64) -> TickOutcome {
        let Some(time) = self
            .clock
            .tick(now_ms, config.framerate, config.motion_speed)
        else {
            return TickOutcome::Skipped;
        };

        self.source.on_tick(config);
        let Some(frame) = self.source.frame(config.width, config.height) else {
            return TickOutcome::NotReady;
        };

        match self.compositor.compose(&frame, config, time) {
            Ok(plan) => self
                .painter
                .paint(&plan, config, &frame.buffer, &mut self.raster),
            Err(e) => {
                log::warn!("Composition impossible : {e}");
                return TickOutcome::NotReady;
            }
        }
        self.has_frame = true;

        self.capture.record(&self.raster, now_ms);
        self.meter.record(now_ms);
        TickOutcome::Rendered
    }

    /// Dernier raster composé.
    #[must_use]
    pub fn raster(&self) -> &FrameBuffer {
        &self.raster
    }

    /// Met en pause (ou reprend) l'horloge et la source.
    pub fn set_paused(&mut self, paused: bool) {
        self.clock.set_paused(paused);
        self.source.set_paused(paused);
        self.meter.reset();
        log::debug!("Pipeline {}", if paused { "en pause" } else { "relancé" });
    }

    /// `true` si l'horloge est en pause.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Cadence mesurée des ticks rendus.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.meter.rate()
    }

    /// Mode de la source branchée.
    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        self.source.mode()
    }

    // === Capture ===

    /// Démarre une capture de `secs` secondes vers `encoder`.
    ///
    /// # Errors
    /// [`CaptureError::InProgress`] if a capture is already running.
    pub fn start_capture(
        &mut self,
        encoder: Box<dyn Encoder>,
        secs: f64,
        now_ms: f64,
    ) -> Result<CaptureHandle, CaptureError> {
        let handle = self.capture.start(secs, encoder, now_ms)?;
        self.capture_handle = Some(handle.clone());
        Ok(handle)
    }

    /// Annulation coopérative : effective au prochain tick.
    pub fn cancel_capture(&mut self) {
        if let Some(handle) = &self.capture_handle {
            handle.cancel();
        }
    }

    /// Fait avancer la capture ; retourne son résultat une seule fois.
    pub fn poll_capture(&mut self, now_ms: f64) -> Option<CaptureOutcome> {
        let outcome = self.capture.poll(now_ms);
        if outcome.is_some() {
            self.capture_handle = None;
        }
        outcome
    }

    /// Ferme la capture en cours et attend l'encodeur.
    pub fn finish_capture(&mut self) -> Option<CaptureOutcome> {
        self.capture_handle = None;
        self.capture.finish_blocking()
    }

    /// État de la capture.
    #[must_use]
    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    /// Libellé court pour la barre de statut.
    #[must_use]
    pub fn capture_label(&self, now_ms: f64) -> String {
        match self.capture.state() {
            CaptureState::Idle => "idle".to_string(),
            CaptureState::Capturing => format!(
                "REC {:.1}s ({} frames)",
                self.capture.remaining_secs(now_ms).unwrap_or(0.0),
                self.capture.recorded_frames()
            ),
            CaptureState::Finalizing => {
                format!("encodage ({} frames)…", self.capture.recorded_frames())
            }
        }
    }

    // === Export ===

    /// Écrit le raster courant en PNG dans `path`.
    ///
    /// # Errors
    /// Returns an error if nothing was rendered yet or the file cannot be written.
    pub fn snapshot(&self, path: &Path) -> Result<()> {
        self.ensure_rendered()?;
        gt_export::still::save_png(&self.raster, path)
    }

    /// Écrit le raster courant sous un nom horodaté dans `dir`.
    ///
    /// # Errors
    /// Returns an error if nothing was rendered yet or the file cannot be written.
    pub fn export_still(&self, dir: &Path) -> Result<PathBuf> {
        self.ensure_rendered()?;
        gt_export::still::export_still(&self.raster, dir)
    }

    fn ensure_rendered(&self) -> Result<()> {
        if self.has_frame {
            Ok(())
        } else {
            anyhow::bail!("Aucune frame composée pour l'instant")
        }
    }
}

/// Encodeur correspondant au format choisi.
#[must_use]
pub fn make_encoder(format: CaptureFormat, path: PathBuf, fps: u32) -> Box<dyn Encoder> {
    match format {
        CaptureFormat::Mp4 => Box::new(Mp4Encoder::new(path, fps)),
        CaptureFormat::Gif => Box::new(GifEncoder::new(path, fps)),
        CaptureFormat::Png => Box::new(PngSequenceEncoder::new(path)),
    }
}

/// Chemin de capture par défaut, horodaté (dossier pour une séquence PNG).
#[must_use]
pub fn default_capture_path(format: CaptureFormat, at: DateTime<Local>) -> PathBuf {
    let stem = format!("glyph-capture-{}", at.format("%Y%m%d-%H%M%S"));
    match format.extension() {
        "" => PathBuf::from(stem),
        ext => PathBuf::from(format!("{stem}.{ext}")),
    }
}

/// Rasterizer de glyphes : police donnée, sinon police système, sinon blocs.
#[must_use]
pub fn load_glyphs(font: Option<&Path>) -> Box<dyn GlyphRasterizer> {
    let path = match font {
        Some(path) => Some(path.to_path_buf()),
        None => FontAtlas::discover(),
    };
    match path.map(|p| FontAtlas::load(&p)) {
        Some(Ok(atlas)) => Box::new(atlas),
        Some(Err(e)) => {
            log::warn!("{e:#} ; glyphes remplacés par des blocs.");
            Box::new(BlockGlyphs::new())
        }
        None => {
            log::warn!("Aucune police système trouvée (--font) ; glyphes remplacés par des blocs.");
            Box::new(BlockGlyphs::new())
        }
    }
}

/// Ouvre la source visuelle choisie par la ligne de commande.
///
/// # Errors
/// Returns an error if the file cannot be opened or the source kind was
/// compiled out.
pub fn open_source(cli: &Cli, config: &GlyphConfig) -> Result<Box<dyn FrameSource>> {
    match config.input_mode {
        InputMode::Image => {
            let path = cli.image.as_deref().context("--image requis pour le mode image")?;
            Ok(Box::new(ImageSource::open(path)?))
        }
        InputMode::Video => {
            let path = cli.video.as_deref().context("--video requis pour le mode vidéo")?;
            open_video(path)
        }
        InputMode::Scene => open_scene(config),
    }
}

#[cfg(feature = "video")]
fn open_video(path: &Path) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(gt_source::video::VideoSource::open(path)?))
}

#[cfg(not(feature = "video"))]
fn open_video(path: &Path) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!(
        "Support vidéo non compilé (feature `video`) : {}",
        path.display()
    )
}

#[cfg(feature = "scene")]
fn open_scene(config: &GlyphConfig) -> Result<Box<dyn FrameSource>> {
    log::info!("Scène 3D : {:?}", config.scene_shape);
    Ok(Box::new(gt_source::scene::SceneSource::new(
        config.scene_shape,
    )))
}

#[cfg(not(feature = "scene"))]
fn open_scene(_config: &GlyphConfig) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!("Scène 3D non compilée (feature `scene`) ; utilisez --image ou --video")
}
