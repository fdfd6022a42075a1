use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use arc_swap::ArcSwap;
use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use gt_core::config::{GlyphConfig, save_config};
use gt_core::presets::{STYLE_PRESETS, apply_style_preset, randomize_step};
use gt_export::CaptureState;
use gt_render::preview::{self, StatusLine};
use rand::Rng;
use ratatui::DefaultTerminal;

use crate::cli::CaptureFormat;
use crate::pipeline::{FramePipeline, default_capture_path, make_encoder};

/// Intervalle de rafraîchissement de l'affichage (~60 Hz).
const REFRESH: Duration = Duration::from_millis(16);

/// Réglages de capture fixés au lancement.
#[derive(Clone, Debug)]
pub struct CaptureSettings {
    /// Format de l'artefact.
    pub format: CaptureFormat,
    /// Chemin imposé (sinon nom horodaté).
    pub output: Option<PathBuf>,
    /// Durée d'une capture, en secondes.
    pub secs: f64,
}

/// Application interactive : aperçu terminal + raccourcis clavier.
pub struct App {
    /// Config courante, republiée à chaque changement.
    pub config: Arc<ArcSwap<GlyphConfig>>,
    config_path: PathBuf,
    pipeline: FramePipeline,
    capture: CaptureSettings,
    preset_idx: Option<usize>,
    message: Option<String>,
    quitting: bool,
    started: Instant,
}

impl App {
    /// Create the application around a ready pipeline.
    #[must_use]
    pub fn new(
        config: Arc<ArcSwap<GlyphConfig>>,
        config_path: PathBuf,
        pipeline: FramePipeline,
        capture: CaptureSettings,
    ) -> Self {
        Self {
            config,
            config_path,
            pipeline,
            capture,
            preset_idx: None,
            message: None,
            quitting: false,
            started: Instant::now(),
        }
    }

    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Boucle principale : événements, tick, capture, dessin.
    ///
    /// # Errors
    /// Returns an error if terminal operations fail.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        log::info!("Source : {:?}", self.pipeline.input_mode());
        while !self.quitting {
            // === Événements (attente bornée par le rafraîchissement) ===
            if event::poll(REFRESH)? {
                self.handle_event(&event::read()?);
                while event::poll(Duration::ZERO)? {
                    self.handle_event(&event::read()?);
                }
            }

            // === Rendu : snapshot stable pour tout le tick ===
            let now_ms = self.now_ms();
            let config = self.config.load_full();
            self.pipeline.tick(&config, now_ms);

            if let Some(outcome) = self.pipeline.poll_capture(now_ms) {
                self.message = Some(match outcome {
                    Ok(artifact) => format!(
                        "Capture écrite : {} ({} frames)",
                        artifact.path.display(),
                        artifact.frames
                    ),
                    Err(e) => format!("Capture échouée : {e:#}"),
                });
            }

            let status = self.status(&config, now_ms);
            terminal.draw(|frame| preview::draw(frame, self.pipeline.raster(), &status))?;
        }
        self.shutdown();
        Ok(())
    }

    /// Termine proprement une capture encore ouverte.
    fn shutdown(&mut self) {
        if self.pipeline.capture_state() != CaptureState::Idle {
            log::info!("Fermeture : finalisation de la capture en cours");
            match self.pipeline.finish_capture() {
                Some(Ok(artifact)) => log::info!("Capture écrite : {}", artifact.path.display()),
                Some(Err(e)) => log::warn!("Capture perdue : {e:#}"),
                None => {}
            }
        }
    }

    fn status(&self, config: &GlyphConfig, now_ms: f64) -> StatusLine {
        StatusLine {
            paused: self.pipeline.is_paused(),
            capture: self.pipeline.capture_label(now_ms),
            rate: self.pipeline.rate(),
            tiles_per_row: config.tiles_per_row,
            preset: self.preset_name(),
            message: self.message.clone(),
        }
    }

    /// Preset de style sélectionné au clavier.
    #[must_use]
    pub fn preset_name(&self) -> Option<&'static str> {
        self.preset_idx
            .and_then(|i| STYLE_PRESETS.get(i))
            .map(|p| p.name)
    }

    /// `true` une fois `q` reçu.
    #[must_use]
    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    /// Dernier message affiché dans la barre de statut.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn handle_event(&mut self, event: &Event) {
        if let Event::Key(key) = event
            && key.kind == KeyEventKind::Press
        {
            let now_ms = self.now_ms();
            self.handle_key(*key, now_ms);
        }
    }

    /// Applique un raccourci clavier.
    pub fn handle_key(&mut self, key: KeyEvent, now_ms: f64) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quitting = true;
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quitting = true,
            KeyCode::Char(' ') => {
                let paused = !self.pipeline.is_paused();
                self.pipeline.set_paused(paused);
            }

            // === Capture / export ===
            KeyCode::Char('c') => self.start_capture(now_ms),
            KeyCode::Char('x') => {
                self.pipeline.cancel_capture();
                self.message = Some("Capture annulée".to_string());
            }
            KeyCode::Char('s') => {
                self.message = Some(match self.pipeline.export_still(Path::new(".")) {
                    Ok(path) => format!("PNG exporté : {}", path.display()),
                    Err(e) => format!("Export PNG impossible : {e:#}"),
                });
            }
            KeyCode::Char('W') => {
                let config = self.config.load();
                self.message = Some(match save_config(&self.config_path, &config) {
                    Ok(()) => format!("Config sauvegardée : {}", self.config_path.display()),
                    Err(e) => format!("Sauvegarde impossible : {e:#}"),
                });
            }

            // === Style ===
            KeyCode::Char(']') => self.cycle_preset(true),
            KeyCode::Char('[') => self.cycle_preset(false),
            KeyCode::Char('r') => {
                let mut rng = rand::rng();
                self.toggle_config(|c| {
                    let index = rng.random_range(0..c.steps.len().max(1));
                    if let Some(step) = c.steps.get_mut(index) {
                        randomize_step(step, &c.glyph_collection, &mut rng);
                    }
                });
                self.preset_idx = None;
            }

            // === Grille ===
            KeyCode::Char('-') => {
                self.toggle_config(|c| c.tiles_per_row = c.tiles_per_row.saturating_sub(1));
            }
            KeyCode::Char('+' | '=') => {
                self.toggle_config(|c| c.tiles_per_row = c.tiles_per_row.saturating_add(1));
            }

            // === Drapeaux ===
            KeyCode::Char('i') => self.toggle_config(|c| c.invert = !c.invert),
            KeyCode::Char('e') => self.toggle_config(|c| c.edges_enabled = !c.edges_enabled),
            KeyCode::Char('w') => self.toggle_config(|c| c.wave_tiles = !c.wave_tiles),
            KeyCode::Char('g') => self.toggle_config(|c| c.glyph_animation = !c.glyph_animation),
            KeyCode::Char('o') => {
                self.toggle_config(|c| c.show_input_overlay = !c.show_input_overlay);
            }
            KeyCode::Char('t') => self.toggle_config(|c| c.transparent_bg = !c.transparent_bg),
            _ => {}
        }
    }

    fn start_capture(&mut self, now_ms: f64) {
        let path = self
            .capture
            .output
            .clone()
            .unwrap_or_else(|| default_capture_path(self.capture.format, Local::now()));
        let fps = self.config.load().framerate;
        let encoder = make_encoder(self.capture.format, path.clone(), fps);
        self.message = Some(
            match self.pipeline.start_capture(encoder, self.capture.secs, now_ms) {
                Ok(_) => format!("Capture {:.1}s → {}", self.capture.secs, path.display()),
                Err(e) => e.to_string(),
            },
        );
    }

    fn cycle_preset(&mut self, forward: bool) {
        let count = STYLE_PRESETS.len();
        if count == 0 {
            return;
        }
        let next = match (self.preset_idx, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        };
        if let Some(preset) = STYLE_PRESETS.get(next) {
            self.toggle_config(|c| apply_style_preset(&mut c.steps, preset));
            self.preset_idx = Some(next);
        }
    }

    /// Clone, modifie, publie : le tick en cours garde son snapshot.
    fn toggle_config(&mut self, mutate: impl FnOnce(&mut GlyphConfig)) {
        let config = self.config.load();
        let mut new = (**config).clone();
        mutate(&mut new);
        new.clamp_all();
        self.config.store(Arc::new(new));
    }
}
