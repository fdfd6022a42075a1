use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::glyphs::default_glyph_collection;

/// Configuration complète du rendu glyphes.
///
/// Document plat sérialisable (JSON ou TOML). Chaque champ a une valeur par
/// défaut saine : un document partiel est fusionné sur les défauts.
///
/// Le moteur ne lit qu'un snapshot immuable par tick ; toute édition publie
/// une nouvelle valeur.
///
/// # Example
/// ```
/// use gt_core::config::GlyphConfig;
/// let config = GlyphConfig::default();
/// assert_eq!(config.framerate, 24);
/// assert_eq!(config.steps.len(), 6);
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GlyphConfig {
    // === Canvas ===
    /// Cadence cible des ticks rendus [1, 60].
    pub framerate: u32,
    /// Largeur du canvas en pixels (≥ 1).
    pub width: u32,
    /// Hauteur du canvas en pixels (≥ 1).
    pub height: u32,

    // === Input ===
    /// Type de source visuelle.
    pub input_mode: InputMode,
    /// Laisser la frame source visible sous la grille.
    pub show_input_overlay: bool,
    /// Forme de la scène 3D intégrée.
    pub scene_shape: SceneShape,
    /// Rotation automatique de la scène.
    pub motion_mode: MotionMode,
    /// Zoom caméra de la scène [0.1, 5.0].
    pub zoom: f32,
    /// Multiplicateur global de vitesse d'animation [0.0, 5.0].
    pub motion_speed: f32,

    // === Grid ===
    /// Nombre de tuiles par ligne (≥ 1). La tuile est carrée.
    pub tiles_per_row: u32,
    /// Opacité des lignes de grille [0.0, 1.0]. 0 = tuiles bord à bord.
    pub grid_line_opacity: f32,
    /// Épaisseur des lignes de grille en pixels [0.0, 10.0].
    pub grid_line_width: f32,
    /// Couleur des lignes de grille.
    pub grid_line_color: Rgb,
    /// Animer la taille des tuiles (visible seulement avec lignes de grille).
    pub grid_size_animation: bool,
    /// Taille minimale animée, en pixels.
    pub min_tile_size: f32,
    /// Taille maximale animée, en pixels.
    pub max_tile_size: f32,
    /// Vitesse de l'animation de taille [0.0, 1.0].
    pub size_speed: f32,

    // === Glyph animation ===
    /// Animer l'échelle des glyphes.
    pub glyph_animation: bool,
    /// Vitesse de l'onde d'échelle.
    pub animation_speed: f32,
    /// Échelle minimale [0.0, 2.0].
    pub min_glyph_scale: f32,
    /// Échelle maximale [0.0, 2.0].
    pub max_glyph_scale: f32,
    /// Mode « wave » : produit de deux sinusoïdes déphasées.
    pub wave_tiles: bool,

    // === Tone ===
    /// Inverser la luminance.
    pub invert: bool,
    /// Fond du raster entièrement transparent.
    pub transparent_bg: bool,
    /// Contraste autour de 128 [0.0, 2.0]. 1.0 = neutre.
    pub intensity: f32,

    // === Edges ===
    /// Activer la surcouche de contours.
    pub edges_enabled: bool,
    /// Seuil de magnitude Sobel [0, 255].
    pub edge_threshold: u8,
    /// Glyphe peint sur les tuiles de contour.
    pub edge_symbol: char,
    /// Couleur du glyphe de contour.
    pub edge_color: Rgb,
    /// Alpha du glyphe de contour [0.0, 1.0].
    pub edge_color_alpha: f32,
    /// Fond des tuiles de contour.
    pub edge_background: Rgb,
    /// Alpha du fond de contour [0.0, 1.0].
    pub edge_background_alpha: f32,

    // === Steps ===
    /// Glyphes proposés au panneau d'édition.
    pub glyph_collection: Vec<char>,
    /// Règles luminance → apparence, dans l'ordre de priorité.
    pub steps: Vec<Step>,
}

/// Une règle (glyphe, couleurs, plage de luminance).
///
/// # Example
/// ```
/// use gt_core::config::Step;
/// use gt_core::color::Rgb;
/// let s = Step::new("Dark", '●', Rgb::new(0, 255, 0), Rgb::new(0, 100, 0), 43, 85);
/// assert!(s.contains(60));
/// assert!((s.center() - 64.0).abs() < f32::EPSILON);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Step {
    /// Nom affiché uniquement.
    pub name: String,
    /// Glyphe peint dans la tuile.
    pub symbol: char,
    /// Couleur du glyphe.
    pub symbol_color: Rgb,
    /// Couleur de fond de la tuile.
    pub background_color: Rgb,
    /// Ne pas peindre le glyphe.
    #[serde(default)]
    pub symbol_transparent: bool,
    /// Ne pas peindre le fond.
    #[serde(default)]
    pub background_transparent: bool,
    /// Borne basse incluse.
    pub min_gray: u8,
    /// Borne haute incluse.
    pub max_gray: u8,
}

impl Step {
    /// Build an opaque step.
    #[must_use]
    pub fn new(
        name: &str,
        symbol: char,
        symbol_color: Rgb,
        background_color: Rgb,
        min_gray: u8,
        max_gray: u8,
    ) -> Self {
        Self {
            name: name.to_string(),
            symbol,
            symbol_color,
            background_color,
            symbol_transparent: false,
            background_transparent: false,
            min_gray,
            max_gray,
        }
    }

    /// `true` if `gray` lies in `[min_gray, max_gray]`.
    #[inline]
    #[must_use]
    pub fn contains(&self, gray: u8) -> bool {
        self.min_gray <= gray && gray <= self.max_gray
    }

    /// Centre de la plage, `(min + max) / 2`.
    #[inline]
    #[must_use]
    pub fn center(&self) -> f32 {
        (f32::from(self.min_gray) + f32::from(self.max_gray)) / 2.0
    }
}

/// Type de source visuelle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum InputMode {
    /// Scène 3D rendue par le moteur intégré.
    #[default]
    Scene,
    /// Image fixe.
    Image,
    /// Vidéo en lecture continue.
    Video,
}

/// Rotation de la scène.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum MotionMode {
    /// La forme tourne à chaque tick.
    #[default]
    Motion,
    /// La forme reste fixe.
    Static,
}

/// Formes disponibles pour la scène intégrée.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneShape {
    /// Tore (rayon 1, tube 0.4).
    #[default]
    Torus,
    /// Sphère de rayon 1.
    Sphere,
    /// Pyramide à base carrée.
    Pyramid,
    /// Cube d'arête 1.
    Cube,
    /// Cylindre rayon 1, hauteur 2.
    Cylinder,
    /// Octaèdre.
    Octahedron,
    /// Tétraèdre.
    Tetrahedron,
    /// Icosaèdre (approché).
    Icosahedron,
}

impl SceneShape {
    /// All shapes, in menu order.
    pub const ALL: [Self; 8] = [
        Self::Torus,
        Self::Sphere,
        Self::Pyramid,
        Self::Cube,
        Self::Cylinder,
        Self::Octahedron,
        Self::Tetrahedron,
        Self::Icosahedron,
    ];

    /// Parse a lowercase shape name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "torus" => Some(Self::Torus),
            "sphere" => Some(Self::Sphere),
            "pyramid" => Some(Self::Pyramid),
            "cube" => Some(Self::Cube),
            "cylinder" => Some(Self::Cylinder),
            "octahedron" => Some(Self::Octahedron),
            "tetrahedron" => Some(Self::Tetrahedron),
            "icosahedron" => Some(Self::Icosahedron),
            _ => None,
        }
    }
}

/// Les six steps par défaut, couvrant [0, 255] sans trou.
#[must_use]
pub fn default_steps() -> Vec<Step> {
    vec![
        Step::new("Black", '■', Rgb::from_u32(0xff0000), Rgb::from_u32(0x8b0000), 0, 42),
        Step::new("Dark", '●', Rgb::from_u32(0x00ff00), Rgb::from_u32(0x006400), 43, 85),
        Step::new("Medium", '◆', Rgb::from_u32(0x0000ff), Rgb::from_u32(0x00008b), 86, 128),
        Step::new("Light", '▲', Rgb::from_u32(0xffff00), Rgb::from_u32(0x808000), 129, 170),
        Step::new("Very Light", 'O', Rgb::from_u32(0xff00ff), Rgb::from_u32(0x800080), 171, 213),
        Step::new("White", ' ', Rgb::WHITE, Rgb::BLACK, 214, 255),
    ]
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            framerate: 24,
            width: 1080,
            height: 1350,
            input_mode: InputMode::Scene,
            show_input_overlay: false,
            scene_shape: SceneShape::Torus,
            motion_mode: MotionMode::Motion,
            zoom: 1.0,
            motion_speed: 1.0,
            tiles_per_row: 40,
            grid_line_opacity: 0.0,
            grid_line_width: 0.0,
            grid_line_color: Rgb::WHITE,
            grid_size_animation: false,
            min_tile_size: 22.0,
            max_tile_size: 35.0,
            size_speed: 0.0,
            glyph_animation: true,
            animation_speed: 3.0,
            min_glyph_scale: 0.0,
            max_glyph_scale: 1.5,
            wave_tiles: false,
            invert: true,
            transparent_bg: false,
            intensity: 1.5,
            edges_enabled: false,
            edge_threshold: 118,
            edge_symbol: '-',
            edge_color: Rgb::from_u32(0xff8847),
            edge_color_alpha: 1.0,
            edge_background: Rgb::BLACK,
            edge_background_alpha: 1.0,
            glyph_collection: default_glyph_collection(),
            steps: default_steps(),
        }
    }
}

impl GlyphConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.framerate = self.framerate.clamp(1, 60);
        self.width = self.width.max(1);
        self.height = self.height.max(1);
        self.tiles_per_row = self.tiles_per_row.clamp(1, self.width);
        self.zoom = self.zoom.clamp(0.1, 5.0);
        self.motion_speed = self.motion_speed.clamp(0.0, 5.0);
        self.grid_line_opacity = self.grid_line_opacity.clamp(0.0, 1.0);
        self.grid_line_width = self.grid_line_width.clamp(0.0, 10.0);
        self.min_tile_size = self.min_tile_size.max(0.0);
        self.max_tile_size = self.max_tile_size.max(0.0);
        self.size_speed = self.size_speed.clamp(0.0, 1.0);
        self.animation_speed = self.animation_speed.max(0.0);
        self.min_glyph_scale = self.min_glyph_scale.clamp(0.0, 2.0);
        self.max_glyph_scale = self.max_glyph_scale.clamp(0.0, 2.0);
        self.intensity = self.intensity.clamp(0.0, 2.0);
        self.edge_color_alpha = self.edge_color_alpha.clamp(0.0, 1.0);
        self.edge_background_alpha = self.edge_background_alpha.clamp(0.0, 1.0);
        if self.steps.is_empty() {
            log::warn!("Aucun step configuré, retour aux steps par défaut");
            self.steps = default_steps();
        }
        if self.glyph_collection.is_empty() {
            self.glyph_collection = default_glyph_collection();
        }
    }

    /// Côté de la tuile de base, `width / tiles_per_row`.
    #[must_use]
    pub fn base_tile_side(&self) -> f32 {
        self.width as f32 / self.tiles_per_row.max(1) as f32
    }
}

/// Format de fichier de configuration, déduit de l'extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigFormat {
    if path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
    {
        ConfigFormat::Json
    } else {
        ConfigFormat::Toml
    }
}

/// Parse un document de configuration et le fusionne sur les défauts.
///
/// # Errors
/// Returns an error if the text is not valid JSON.
///
/// # Example
/// ```
/// use gt_core::config::parse_json;
/// let config = parse_json(r#"{ "tiles_per_row": 12, "invert": false }"#).unwrap();
/// assert_eq!(config.tiles_per_row, 12);
/// assert!(!config.invert);
/// assert_eq!(config.framerate, 24);
/// ```
pub fn parse_json(text: &str) -> Result<GlyphConfig> {
    let mut config: GlyphConfig =
        serde_json::from_str(text).context("Erreur de parsing JSON de la configuration")?;
    config.clamp_all();
    Ok(config)
}

/// Charge un fichier (JSON ou TOML) et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use gt_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<GlyphConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let mut config: GlyphConfig = match format_of(path) {
        ConfigFormat::Json => serde_json::from_str(&content)
            .with_context(|| format!("Erreur de parsing JSON dans {}", path.display()))?,
        ConfigFormat::Toml => toml::from_str(&content)
            .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?,
    };

    config.clamp_all();
    Ok(config)
}

/// Sauvegarde la configuration telle quelle.
///
/// # Errors
/// Returns an error if serialization or the write fails.
pub fn save_config(path: &Path, config: &GlyphConfig) -> Result<()> {
    let text = match format_of(path) {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
    };
    std::fs::write(path, text).with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    log::info!("Configuration sauvegardée dans {}", path.display());
    Ok(())
}
