use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use gt_core::config::{GlyphConfig, InputMode, SceneShape};
use gt_core::presets::{apply_style_preset, find_canvas_preset, find_style_preset};

/// Format de l'artefact de capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CaptureFormat {
    /// Vidéo MP4 (ffmpeg).
    #[default]
    Mp4,
    /// GIF animé.
    Gif,
    /// Séquence d'images PNG.
    Png,
}

impl CaptureFormat {
    /// Extension du fichier produit (vide pour une séquence : dossier).
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Gif => "gif",
            Self::Png => "",
        }
    }
}

/// glyphtile : rendu glyph-art en tuiles, temps réel.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source visuelle : image fixe (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Source visuelle : vidéo lue en boucle (ffmpeg requis).
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Source visuelle : scène 3D (torus, sphere, pyramid, cube, cylinder,
    /// octahedron, tetrahedron, icosahedron). Source par défaut.
    #[arg(long)]
    pub scene: Option<String>,

    /// Fichier de configuration (TOML, ou JSON si extension .json).
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Preset de style appliqué aux steps.
    #[arg(long)]
    pub preset: Option<String>,

    /// Preset de canvas : landscape, insta, square, story.
    #[arg(long)]
    pub canvas: Option<String>,

    /// Largeur du canvas en pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Hauteur du canvas en pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Nombre de tuiles par ligne.
    #[arg(long)]
    pub tiles: Option<u32>,

    /// Cadence de rendu (1-60).
    #[arg(long)]
    pub fps: Option<u32>,

    /// Police TrueType/OpenType des glyphes (défaut : police système).
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Rendu sans terminal (capture ou snapshot puis sortie).
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Durée de capture en secondes.
    #[arg(long)]
    pub capture: Option<f64>,

    /// Format de capture.
    #[arg(long, value_enum, default_value_t = CaptureFormat::Mp4)]
    pub format: CaptureFormat,

    /// Fichier (ou dossier pour png) de sortie de la capture.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exporter une seule frame PNG dans ce fichier (mode headless).
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Durée de capture quand `--capture` est absent (touche `c`).
pub const DEFAULT_CAPTURE_SECS: f64 = 5.0;

impl Cli {
    /// Validate source and mode combinations.
    ///
    /// # Errors
    /// Returns an error if more than one visual source is given, the scene
    /// shape is unknown, or headless mode has nothing to produce.
    pub fn validate(&self) -> anyhow::Result<()> {
        let count = usize::from(self.image.is_some())
            + usize::from(self.video.is_some())
            + usize::from(self.scene.is_some());
        if count > 1 {
            anyhow::bail!(
                "Une seule source visuelle à la fois. Spécifiez --image, --video, OU --scene."
            );
        }
        if let Some(name) = &self.scene
            && SceneShape::from_name(name).is_none()
        {
            anyhow::bail!("Forme de scène inconnue : {name}");
        }
        if self.headless && self.capture.is_none() && self.snapshot.is_none() {
            anyhow::bail!("Le mode --headless requiert --capture <secondes> ou --snapshot <fichier>.");
        }
        if self.capture.is_some_and(|secs| secs.is_nan() || secs <= 0.0) {
            anyhow::bail!("La durée de capture doit être positive.");
        }
        Ok(())
    }

    /// Mode d'entrée choisi par les arguments (scène par défaut).
    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        if self.image.is_some() {
            InputMode::Image
        } else if self.video.is_some() {
            InputMode::Video
        } else {
            InputMode::Scene
        }
    }

    /// Durée de capture effective.
    #[must_use]
    pub fn capture_secs(&self) -> f64 {
        self.capture.unwrap_or(DEFAULT_CAPTURE_SECS)
    }

    /// Applique les overrides de la ligne de commande sur une config chargée.
    ///
    /// # Errors
    /// Returns an error for unknown preset names.
    pub fn apply_overrides(&self, config: &mut GlyphConfig) -> anyhow::Result<()> {
        config.input_mode = self.input_mode();
        if let Some(shape) = self.scene.as_deref().and_then(SceneShape::from_name) {
            config.scene_shape = shape;
        }
        if let Some(name) = &self.canvas {
            let canvas = find_canvas_preset(name)?;
            config.width = canvas.width;
            config.height = canvas.height;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(tiles) = self.tiles {
            config.tiles_per_row = tiles;
        }
        if let Some(fps) = self.fps {
            config.framerate = fps;
        }
        if let Some(name) = &self.preset {
            apply_style_preset(&mut config.steps, find_style_preset(name)?);
        }
        config.clamp_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("glyphtile").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn scene_is_the_default_source() {
        let cli = parse(&[]);
        cli.validate().unwrap();
        assert_eq!(cli.input_mode(), InputMode::Scene);
        assert_eq!(cli.format, CaptureFormat::Mp4);
    }

    #[test]
    fn two_sources_are_rejected() {
        let cli = parse(&["--image", "a.png", "--video", "b.mp4"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn headless_needs_an_output() {
        assert!(parse(&["--headless"]).validate().is_err());
        assert!(parse(&["--headless", "--capture", "2"]).validate().is_ok());
        assert!(parse(&["--headless", "--capture", "0"]).validate().is_err());
    }

    #[test]
    fn overrides_apply_in_order() {
        let cli = parse(&[
            "--canvas", "square", "--height", "500", "--tiles", "20", "--scene", "cube", "--format",
            "gif",
        ]);
        let mut config = GlyphConfig::default();
        cli.apply_overrides(&mut config).unwrap();
        assert_eq!((config.width, config.height), (1080, 500));
        assert_eq!(config.tiles_per_row, 20);
        assert_eq!(config.scene_shape, SceneShape::Cube);
        assert_eq!(cli.format, CaptureFormat::Gif);
    }

    #[test]
    fn style_preset_changes_symbols() {
        let cli = parse(&["--preset", "Matrix Digital"]);
        let mut config = GlyphConfig::default();
        let before = config.steps.clone();
        cli.apply_overrides(&mut config).unwrap();
        assert_ne!(config.steps, before);
        assert_eq!(config.steps[0].min_gray, before[0].min_gray);
    }

    #[test]
    fn unknown_canvas_fails() {
        let cli = parse(&["--canvas", "poster"]);
        assert!(cli.apply_overrides(&mut GlyphConfig::default()).is_err());
    }
}
