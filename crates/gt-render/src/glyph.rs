use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use anyhow::Context;

/// Masque de couverture d'un glyphe rasterisé (0 = vide, 255 = plein).
///
/// `offset_x` / `offset_y` placent le coin haut-gauche du masque par rapport
/// au point d'ancrage (centre de la cellule).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphMask {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Décalage horizontal du coin haut-gauche depuis le centre.
    pub offset_x: i32,
    /// Décalage vertical du coin haut-gauche depuis le centre.
    pub offset_y: i32,
    /// Couverture, row-major.
    pub alpha: Vec<u8>,
}

impl GlyphMask {
    /// Masque plein `width × height`, centré.
    ///
    /// # Example
    /// ```
    /// use gt_render::glyph::GlyphMask;
    /// let m = GlyphMask::solid(4, 2);
    /// assert_eq!((m.offset_x, m.offset_y), (-2, -1));
    /// assert_eq!(m.coverage(3, 1), 255);
    /// ```
    #[must_use]
    pub fn solid(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            offset_x: -((width / 2) as i32),
            offset_y: -((height / 2) as i32),
            alpha: vec![255; width as usize * height as usize],
        }
    }

    /// Coverage at (x, y), 0 outside the mask.
    #[inline(always)]
    #[must_use]
    pub fn coverage(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.alpha
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .unwrap_or(0)
    }
}

/// Clé de cache : la taille est quantifiée au dixième de pixel.
#[inline]
fn size_key(px_size: f32) -> u32 {
    (px_size.max(0.0) * 10.0).round() as u32
}

/// Rasterise des glyphes à une taille donnée (en pixels de hauteur de police).
pub trait GlyphRasterizer: Send {
    /// Masque du glyphe `ch` à la taille `px_size`.
    ///
    /// `None` pour un glyphe sans contour (espace) ou absent de la police.
    fn glyph(&mut self, ch: char, px_size: f32) -> Option<&GlyphMask>;
}

impl<G: GlyphRasterizer + ?Sized> GlyphRasterizer for Box<G> {
    fn glyph(&mut self, ch: char, px_size: f32) -> Option<&GlyphMask> {
        (**self).glyph(ch, px_size)
    }
}

/// Rasterizer de secours sans police : un carré plein proportionnel à la
/// taille, vide pour les espaces.
#[derive(Debug, Default)]
pub struct BlockGlyphs {
    cache: HashMap<u32, GlyphMask>,
}

impl BlockGlyphs {
    /// Create the fallback rasterizer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GlyphRasterizer for BlockGlyphs {
    fn glyph(&mut self, ch: char, px_size: f32) -> Option<&GlyphMask> {
        if ch.is_whitespace() {
            return None;
        }
        let side = (px_size * 0.6).round() as u32;
        if side == 0 {
            return None;
        }
        Some(
            self.cache
                .entry(side)
                .or_insert_with(|| GlyphMask::solid(side, side)),
        )
    }
}

/// Atlas de glyphes sur une police TrueType/OpenType (`ab_glyph`).
///
/// Chaque paire (glyphe, taille quantifiée) est rasterisée une seule fois.
pub struct FontAtlas {
    font: FontVec,
    cache: HashMap<(char, u32), Option<GlyphMask>>,
}

impl std::fmt::Debug for FontAtlas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontAtlas")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Polices monospace usuelles, essayées dans l'ordre.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/System/Library/Fonts/Monaco.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

impl FontAtlas {
    /// Build an atlas from raw font bytes.
    ///
    /// # Errors
    /// Returns an error if the bytes are not a valid font.
    pub fn from_bytes(data: Vec<u8>) -> anyhow::Result<Self> {
        let font = FontVec::try_from_vec(data).context("Police invalide")?;
        Ok(Self {
            font,
            cache: HashMap::new(),
        })
    }

    /// Load a font file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Impossible de lire la police {}", path.display()))?;
        let atlas = Self::from_bytes(data)
            .with_context(|| format!("Police invalide : {}", path.display()))?;
        log::info!("Police chargée : {}", path.display());
        Ok(atlas)
    }

    /// Première police système connue présente sur la machine.
    #[must_use]
    pub fn discover() -> Option<PathBuf> {
        FONT_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
    }

    fn rasterize(font: &FontVec, ch: char, px_size: f32) -> Option<GlyphMask> {
        let gid = font.glyph_id(ch);
        if gid.0 == 0 {
            return None;
        }
        let scale = PxScale::from(px_size);
        let scaled = font.as_scaled(scale);
        let ascent = scaled.ascent();
        let descent = scaled.descent();
        let advance = scaled.h_advance(gid);

        // Glyphe posé sur la ligne de base ; ancre = milieu horizontal de
        // l'avance, milieu vertical de la boîte ascent/descent.
        let glyph = gid.with_scale_and_position(scale, point(0.0, ascent));
        let outline = font.outline_glyph(glyph)?;
        let bounds = outline.px_bounds();
        let width = bounds.width().ceil().max(0.0) as u32;
        let height = bounds.height().ceil().max(0.0) as u32;
        if width == 0 || height == 0 {
            return None;
        }

        let mut alpha = vec![0u8; width as usize * height as usize];
        outline.draw(|x, y, v| {
            if x < width && y < height {
                alpha[(y * width + x) as usize] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        });

        let center_y = (ascent - descent) / 2.0;
        Some(GlyphMask {
            width,
            height,
            offset_x: (bounds.min.x - advance / 2.0).round() as i32,
            offset_y: (bounds.min.y - center_y).round() as i32,
            alpha,
        })
    }

    /// Nombre d'entrées en cache.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl GlyphRasterizer for FontAtlas {
    fn glyph(&mut self, ch: char, px_size: f32) -> Option<&GlyphMask> {
        let key = size_key(px_size);
        if key == 0 || ch.is_whitespace() {
            return None;
        }
        let font = &self.font;
        self.cache
            .entry((ch, key))
            .or_insert_with(|| Self::rasterize(font, ch, key as f32 / 10.0))
            .as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_glyphs_skip_spaces() {
        let mut glyphs = BlockGlyphs::new();
        assert!(glyphs.glyph(' ', 20.0).is_none());
        let mask = glyphs.glyph('#', 20.0).unwrap();
        assert_eq!((mask.width, mask.height), (12, 12));
    }

    #[test]
    fn block_glyphs_vanish_at_zero_scale() {
        let mut glyphs = BlockGlyphs::new();
        assert!(glyphs.glyph('#', 0.0).is_none());
    }

    #[test]
    fn size_key_quantizes_to_tenths() {
        assert_eq!(size_key(21.6), 216);
        assert_eq!(size_key(21.64), 216);
        assert_eq!(size_key(-3.0), 0);
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        assert!(FontAtlas::from_bytes(vec![0, 1, 2, 3]).is_err());
    }

    #[test]
    fn discovered_font_rasterizes() {
        // Dépend des polices installées ; rien à vérifier sans police.
        let Some(path) = FontAtlas::discover() else {
            return;
        };
        let Ok(mut atlas) = FontAtlas::load(&path) else {
            return;
        };
        let mask = atlas.glyph('M', 32.0).unwrap().clone();
        assert!(mask.alpha.iter().any(|&a| a > 0));
        assert!(mask.offset_x < 0 && mask.offset_y < 0);
        atlas.glyph('M', 32.0);
        assert_eq!(atlas.cached(), 1);
    }
}
