/// Ponctuation et symboles ASCII.
const PUNCTUATION: &str = ".,:;+*?%$#@^&()[]{}|/\\<>=-_~`\"'";
/// Chiffres.
const DIGITS: &str = "0123456789";
/// Lettres latines.
const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
/// Blocs.
const BLOCKS: &str = "▄▀▌▐■□▪▫";
/// Flèches.
const ARROWS: &str = "↑↓←→↖↗↘↙↔↕";
/// Formes géométriques et cartes.
const SHAPES: &str = "●○◆◇▲△▼▽★☆♦♠♣♥◯◎◉◐◑✧✦✿❀✾°";
/// Demi-chasse CJK.
const HALFWIDTH: &str = "｡･";
/// Symboles mathématiques.
const MATH: &str = "×÷±∞≈≠≤≥∑∏∫√";
/// Divers.
const MISC: &str = "♪♫☀☁☂☃☄☎☏☐☑☒ ·•‣⁃⁌⁍⁎⁏⁐⁑⁒";

/// Collection de glyphes par défaut, utilisée pour le tirage aléatoire
/// et le sélecteur de glyphes.
///
/// # Example
/// ```
/// use gt_core::glyphs::default_glyph_collection;
/// let glyphs = default_glyph_collection();
/// assert!(glyphs.contains(&'@'));
/// assert!(glyphs.contains(&' '));
/// ```
#[must_use]
pub fn default_glyph_collection() -> Vec<char> {
    [
        PUNCTUATION,
        DIGITS,
        LETTERS,
        BLOCKS,
        ARROWS,
        SHAPES,
        HALFWIDTH,
        MATH,
        MISC,
    ]
    .iter()
    .flat_map(|group| group.chars())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_has_no_duplicates() {
        let glyphs = default_glyph_collection();
        let mut sorted = glyphs.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), glyphs.len());
    }

    #[test]
    fn collection_size() {
        assert_eq!(default_glyph_collection().len(), 31 + 10 + 52 + 8 + 10 + 25 + 2 + 12 + 24);
    }
}
