use gt_core::config::GlyphConfig;

/// Facteur de taille animée dans [0, 1] :
/// `(sin(time · speed · 10 · motion_speed) + 1) / 2`.
#[inline]
#[must_use]
pub fn size_factor(time: f64, speed: f32, motion_speed: f32) -> f32 {
    let phase = time * f64::from(speed) * 10.0 * f64::from(motion_speed);
    ((phase.sin() + 1.0) / 2.0) as f32
}

/// Côté des tuiles dessinées quand les lignes de grille sont visibles.
///
/// Sans animation de taille (ou vitesse nulle), c'est le côté de base.
///
/// # Example
/// ```
/// use gt_core::config::GlyphConfig;
/// use gt_glyph::animation::animated_tile_side;
///
/// let mut config = GlyphConfig::default();
/// config.grid_size_animation = true;
/// config.size_speed = 0.5;
/// // sin(0) = 0 → facteur 0.5 → 22 + 13 × 0.5
/// assert!((animated_tile_side(&config, 0.0) - 28.5).abs() < 1e-4);
/// ```
#[must_use]
pub fn animated_tile_side(config: &GlyphConfig, time: f64) -> f32 {
    if config.grid_size_animation && config.size_speed > 0.0 {
        let factor = size_factor(time, config.size_speed, config.motion_speed);
        config.min_tile_size + (config.max_tile_size - config.min_tile_size) * factor
    } else {
        config.base_tile_side()
    }
}

/// Quantifie une échelle au dixième le plus proche, demi-valeurs arrondies
/// en s'éloignant de zéro (`0.75 → 0.8`).
///
/// # Example
/// ```
/// use gt_glyph::animation::quantize_scale;
/// assert!((quantize_scale(0.75) - 0.8).abs() < 1e-6);
/// assert!((quantize_scale(1.04) - 1.0).abs() < 1e-6);
/// ```
#[inline]
#[must_use]
pub fn quantize_scale(scale: f32) -> f32 {
    (scale * 10.0).round() / 10.0
}

/// Onde brute dans [-1, 1] pour la tuile (tx, ty).
///
/// Mode normal : `sin(t·s·10·m + (tx + ty)·0.1)`.
/// Mode vague : `sin(t·s·10·m + (tx + ty)·0.5) · cos(t·s·5·m + (tx − ty)·0.3)`.
#[must_use]
pub fn glyph_wave(time: f64, speed: f32, motion_speed: f32, wave_mode: bool, tx: u32, ty: u32) -> f64 {
    let base = time * f64::from(speed) * f64::from(motion_speed);
    let sum = f64::from(tx) + f64::from(ty);
    if wave_mode {
        let diff = f64::from(tx) - f64::from(ty);
        (base * 10.0 + sum * 0.5).sin() * (base * 5.0 + diff * 0.3).cos()
    } else {
        (base * 10.0 + sum * 0.1).sin()
    }
}

/// Échelle de glyphe animée et quantifiée pour la tuile (tx, ty).
///
/// Retourne 1.0 quand l'animation de glyphes est désactivée.
///
/// # Example
/// ```
/// use gt_core::config::GlyphConfig;
/// use gt_glyph::animation::glyph_scale;
///
/// let config = GlyphConfig::default(); // min 0, max 1.5
/// assert!((glyph_scale(&config, 0.0, 0, 0) - 0.8).abs() < 1e-6);
/// ```
#[must_use]
pub fn glyph_scale(config: &GlyphConfig, time: f64, tx: u32, ty: u32) -> f32 {
    if !config.glyph_animation {
        return 1.0;
    }
    let wave = glyph_wave(
        time,
        config.animation_speed,
        config.motion_speed,
        config.wave_tiles,
        tx,
        ty,
    ) as f32;
    let scale = config.min_glyph_scale
        + (config.max_glyph_scale - config.min_glyph_scale) * (wave + 1.0) / 2.0;
    quantize_scale(scale)
}
