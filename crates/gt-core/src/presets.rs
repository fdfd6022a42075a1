use rand::Rng;

use crate::color::Rgb;
use crate::config::Step;
use crate::error::CoreError;

/// Apparence d'un step dans un preset de style (glyphe + couleurs).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresetStep {
    /// Glyphe.
    pub symbol: char,
    /// Couleur du glyphe, `0xRRGGBB`.
    pub symbol_color: u32,
    /// Couleur de fond, `0xRRGGBB`.
    pub background_color: u32,
}

/// Preset de style nommé.
#[derive(Clone, Copy, Debug)]
pub struct StylePreset {
    /// Nom affiché.
    pub name: &'static str,
    /// Apparences appliquées aux steps par index.
    pub steps: &'static [PresetStep],
}

const fn ps(symbol: char, symbol_color: u32, background_color: u32) -> PresetStep {
    PresetStep {
        symbol,
        symbol_color,
        background_color,
    }
}

/// Presets de style intégrés.
pub const STYLE_PRESETS: &[StylePreset] = &[
    StylePreset {
        name: "Cutesy Hearts & Stars",
        steps: &[
            ps('♥', 0xFF69B4, 0xFFB6C1),
            ps('★', 0xFFD700, 0xFFF8DC),
            ps('☆', 0xFFB6C1, 0xFFE4E1),
            ps('♡', 0xFF1493, 0xFFC0CB),
            ps('•', 0xFF69B4, 0xFFE4E1),
            ps(' ', 0xFFFFFF, 0xFFF0F5),
        ],
    },
    StylePreset {
        name: "Christmas Joy",
        steps: &[
            ps('❄', 0xFFFFFF, 0xE8F4F8),
            ps('★', 0xFFD700, 0xFFA500),
            ps('●', 0xFF0000, 0x8B0000),
            ps('◆', 0x228B22, 0x006400),
            ps('·', 0xFFD700, 0xFFA500),
            ps(' ', 0xFFFFFF, 0xF0F8FF),
        ],
    },
    StylePreset {
        name: "Matrix Digital",
        steps: &[
            ps('0', 0x00FF00, 0x001100),
            ps('1', 0x00FF41, 0x002200),
            ps('|', 0x39FF14, 0x003300),
            ps('/', 0x7FFF00, 0x004400),
            ps('\\', 0xADFF2F, 0x005500),
            ps(' ', 0x00FF00, 0x000000),
        ],
    },
    StylePreset {
        name: "Vintage Dot Matrix",
        steps: &[
            ps('■', 0x8B4513, 0x654321),
            ps('□', 0xA0522D, 0x8B4513),
            ps('●', 0xCD853F, 0xA0522D),
            ps('·', 0xDEB887, 0xCD853F),
            ps('.', 0xF5DEB3, 0xDEB887),
            ps(' ', 0xFFF8DC, 0xF5DEB3),
        ],
    },
    StylePreset {
        name: "Bold Geometric",
        steps: &[
            ps('■', 0xFF0000, 0x8B0000),
            ps('●', 0x0000FF, 0x00008B),
            ps('◆', 0xFFFF00, 0xB8860B),
            ps('▲', 0x00FF00, 0x006400),
            ps('■', 0xFF00FF, 0x8B008B),
            ps('□', 0xFFFFFF, 0xC0C0C0),
        ],
    },
    StylePreset {
        name: "Minimalist Dots",
        steps: &[
            ps('●', 0x000000, 0x000000),
            ps('○', 0x333333, 0x1A1A1A),
            ps('·', 0x666666, 0x333333),
            ps('.', 0x999999, 0x666666),
            ps(' ', 0xCCCCCC, 0x999999),
            ps(' ', 0xFFFFFF, 0xCCCCCC),
        ],
    },
    StylePreset {
        name: "Retro Arcade",
        steps: &[
            ps('■', 0xFF00FF, 0x800080),
            ps('●', 0x00FFFF, 0x008080),
            ps('◆', 0xFFFF00, 0x808000),
            ps('▲', 0x00FF00, 0x008000),
            ps('■', 0xFF0000, 0x800000),
            ps('□', 0x0000FF, 0x000080),
        ],
    },
    StylePreset {
        name: "Classic Terminal",
        steps: &[
            ps('#', 0x00FF00, 0x000000),
            ps('@', 0x00FF00, 0x000000),
            ps('*', 0x00FF00, 0x000000),
            ps('.', 0x00FF00, 0x000000),
            ps(':', 0x00FF00, 0x000000),
            ps(' ', 0x00FF00, 0x000000),
        ],
    },
    StylePreset {
        name: "Ocean Waves",
        steps: &[
            ps('~', 0x000080, 0x000033),
            ps('≈', 0x0000CD, 0x000066),
            ps('○', 0x1E90FF, 0x0066CC),
            ps('·', 0x00BFFF, 0x0099CC),
            ps('.', 0x87CEEB, 0x5F9EA0),
            ps(' ', 0xB0E0E6, 0x87CEFA),
        ],
    },
    StylePreset {
        name: "Classic ASCII",
        steps: &[
            ps('@', 0x000000, 0x000000),
            ps('#', 0x1A1A1A, 0x0D0D0D),
            ps('8', 0x333333, 0x1A1A1A),
            ps('&', 0x4D4D4D, 0x262626),
            ps('%', 0x666666, 0x333333),
            ps('$', 0x808080, 0x404040),
            ps('+', 0x999999, 0x4D4D4D),
            ps('=', 0xB3B3B3, 0x666666),
            ps('-', 0xCCCCCC, 0x808080),
            ps('.', 0xE6E6E6, 0x999999),
            ps(' ', 0xFFFFFF, 0xB3B3B3),
        ],
    },
    StylePreset {
        name: "Typewriter",
        steps: &[
            ps('M', 0x000000, 0x1C1C1C),
            ps('W', 0x2A2A2A, 0x333333),
            ps('N', 0x444444, 0x4D4D4D),
            ps('m', 0x5E5E5E, 0x666666),
            ps('o', 0x787878, 0x808080),
            ps('*', 0x929292, 0x999999),
            ps('.', 0xACACAC, 0xB3B3B3),
            ps('\'', 0xC6C6C6, 0xCCCCCC),
            ps(' ', 0xE0E0E0, 0xE6E6E6),
        ],
    },
    StylePreset {
        name: "Neon Cyberpunk",
        steps: &[
            ps('#', 0xFF00FF, 0x4A004A),
            ps('@', 0xFF00AA, 0x550055),
            ps('%', 0xFF0055, 0x660066),
            ps('+', 0x00FFFF, 0x005555),
            ps('x', 0x00FFAA, 0x004466),
            ps('.', 0x00FF55, 0x003344),
            ps(' ', 0x0088FF, 0x001122),
        ],
    },
    StylePreset {
        name: "Fire & Flame",
        steps: &[
            ps('#', 0xFFFF00, 0xFF4500),
            ps('X', 0xFFD700, 0xFF6347),
            ps('+', 0xFFA500, 0xFF7F50),
            ps('x', 0xFF8C00, 0xFFA07A),
            ps('*', 0xFF6347, 0xFFB6C1),
            ps('.', 0xFF4500, 0xFFD7BE),
            ps(' ', 0x8B0000, 0xFFE4B5),
        ],
    },
    StylePreset {
        name: "Forest Canopy",
        steps: &[
            ps('@', 0x013220, 0x001A0F),
            ps('&', 0x0A5F38, 0x024D2A),
            ps('%', 0x16814F, 0x0D6842),
            ps('*', 0x34A853, 0x228B5A),
            ps('+', 0x52C674, 0x3DA862),
            ps('.', 0x7DE896, 0x60D47D),
            ps(' ', 0xA8F5BA, 0x8FF0A5),
        ],
    },
    StylePreset {
        name: "Starry Night",
        steps: &[
            ps('*', 0xFFFFFF, 0x000033),
            ps('+', 0xFFE4B5, 0x000066),
            ps('x', 0xFFD700, 0x000099),
            ps('.', 0xFFA500, 0x0000CC),
            ps('\'', 0x87CEEB, 0x191970),
            ps('.', 0x4169E1, 0x0C2340),
            ps(' ', 0x000080, 0x000000),
        ],
    },
];

/// Cherche un preset de style par nom (insensible à la casse).
///
/// # Errors
/// Returns [`CoreError::UnknownPreset`] if no preset has that name.
///
/// # Example
/// ```
/// use gt_core::presets::find_style_preset;
/// assert!(find_style_preset("matrix digital").is_ok());
/// assert!(find_style_preset("nope").is_err());
/// ```
pub fn find_style_preset(name: &str) -> Result<&'static StylePreset, CoreError> {
    STYLE_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| CoreError::UnknownPreset {
            name: name.to_string(),
        })
}

/// Remplace glyphe et couleurs des steps, index par index.
///
/// Les plages de luminance, les noms et les drapeaux de transparence ne sont
/// pas touchés. Les steps au-delà de la longueur du preset restent inchangés,
/// les entrées du preset au-delà du nombre de steps sont ignorées.
pub fn apply_style_preset(steps: &mut [Step], preset: &StylePreset) {
    for (step, look) in steps.iter_mut().zip(preset.steps) {
        step.symbol = look.symbol;
        step.symbol_color = Rgb::from_u32(look.symbol_color);
        step.background_color = Rgb::from_u32(look.background_color);
    }
    log::debug!("Preset de style appliqué : {}", preset.name);
}

/// Preset de dimensions du canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasPreset {
    /// Nom affiché.
    pub name: &'static str,
    /// Largeur en pixels.
    pub width: u32,
    /// Hauteur en pixels.
    pub height: u32,
}

/// Formats de sortie courants.
pub const CANVAS_PRESETS: &[CanvasPreset] = &[
    CanvasPreset {
        name: "landscape",
        width: 1920,
        height: 1080,
    },
    CanvasPreset {
        name: "insta",
        width: 1080,
        height: 1350,
    },
    CanvasPreset {
        name: "square",
        width: 1080,
        height: 1080,
    },
    CanvasPreset {
        name: "story",
        width: 1080,
        height: 1920,
    },
];

/// Cherche un preset de canvas par nom.
///
/// # Errors
/// Returns [`CoreError::UnknownPreset`] if no preset has that name.
pub fn find_canvas_preset(name: &str) -> Result<CanvasPreset, CoreError> {
    CANVAS_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .copied()
        .ok_or_else(|| CoreError::UnknownPreset {
            name: name.to_string(),
        })
}

/// Tire un glyphe de la collection et deux couleurs aléatoires pour un step.
///
/// La plage de luminance du step est conservée. Une collection vide laisse
/// le glyphe inchangé.
///
/// # Example
/// ```
/// use gt_core::config::default_steps;
/// use gt_core::presets::randomize_step;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let mut step = default_steps().remove(0);
/// randomize_step(&mut step, &['x', 'y'], &mut rng);
/// assert!(step.symbol == 'x' || step.symbol == 'y');
/// assert_eq!((step.min_gray, step.max_gray), (0, 42));
/// ```
pub fn randomize_step<R: Rng>(step: &mut Step, glyphs: &[char], rng: &mut R) {
    if !glyphs.is_empty() {
        step.symbol = glyphs[rng.random_range(0..glyphs.len())];
    }
    step.symbol_color = Rgb::from_u32(rng.random_range(0..=0xFF_FFFF));
    step.background_color = Rgb::from_u32(rng.random_range(0..=0xFF_FFFF));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_steps;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn preset_replaces_looks_but_keeps_ranges() {
        let mut steps = default_steps();
        let preset = find_style_preset("Classic Terminal").unwrap();
        apply_style_preset(&mut steps, preset);
        assert_eq!(steps[0].symbol, '#');
        assert_eq!(steps[0].symbol_color, Rgb::new(0, 255, 0));
        assert_eq!(steps[0].background_color, Rgb::BLACK);
        assert_eq!((steps[2].min_gray, steps[2].max_gray), (86, 128));
        assert_eq!(steps[2].name, "Medium");
    }

    #[test]
    fn longer_preset_is_truncated_to_step_count() {
        let mut steps = default_steps();
        let preset = find_style_preset("Classic ASCII").unwrap();
        apply_style_preset(&mut steps, preset);
        assert_eq!(steps.len(), 6);
        assert_eq!(steps[5].symbol, '$');
    }

    #[test]
    fn shorter_preset_leaves_tail_untouched() {
        let mut steps = default_steps();
        steps.push(Step::new("Extra", 'Z', Rgb::WHITE, Rgb::BLACK, 0, 0));
        apply_style_preset(&mut steps, find_style_preset("Matrix Digital").unwrap());
        assert_eq!(steps[6].symbol, 'Z');
    }

    #[test]
    fn preset_names_are_unique() {
        for (i, a) in STYLE_PRESETS.iter().enumerate() {
            for b in &STYLE_PRESETS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn canvas_presets() {
        let story = find_canvas_preset("Story").unwrap();
        assert_eq!((story.width, story.height), (1080, 1920));
        assert!(matches!(
            find_canvas_preset("a4"),
            Err(CoreError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn randomize_is_deterministic_with_seed() {
        let glyphs = ['a', 'b', 'c'];
        let mut a = default_steps().remove(1);
        let mut b = a.clone();
        randomize_step(&mut a, &glyphs, &mut StdRng::seed_from_u64(42));
        randomize_step(&mut b, &glyphs, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert!(glyphs.contains(&a.symbol));
    }

    #[test]
    fn randomize_with_empty_collection_keeps_symbol() {
        let mut step = default_steps().remove(1);
        randomize_step(&mut step, &[], &mut StdRng::seed_from_u64(1));
        assert_eq!(step.symbol, '●');
    }
}
