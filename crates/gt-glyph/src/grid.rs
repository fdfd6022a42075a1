/// Rectangle de tuile en pixels, demi-ouvert : `[x, x + width) × [y, y + height)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TileRect {
    /// Build a rectangle.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    #[inline]
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// `true` if the rectangle covers no pixel.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Nombre de pixels couverts.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Géométrie de la grille de tuiles pour un canvas donné.
///
/// `columns = tiles_per_row`, côté de base `width / tiles_per_row`,
/// `rows = ceil(height / side)`. Sans lignes de grille, les tuiles pavent le
/// canvas bord à bord : chaque bord droit/bas tombe sur le début calculé de
/// la tuile suivante et la dernière ligne/colonne s'étire jusqu'au bord.
///
/// # Example
/// ```
/// use gt_glyph::grid::GridLayout;
/// let layout = GridLayout::new(1080, 1350, 40);
/// assert_eq!(layout.columns(), 40);
/// assert_eq!(layout.rows(), 50);
/// assert_eq!(layout.base_rect(39, 49).right(), 1080);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    width: u32,
    height: u32,
    columns: u32,
    rows: u32,
    side: f64,
}

impl GridLayout {
    /// Compute the grid for a `width × height` canvas.
    ///
    /// `tiles_per_row` is clamped to `[1, width]` so a tile is never narrower
    /// than one pixel.
    #[must_use]
    pub fn new(width: u32, height: u32, tiles_per_row: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let columns = tiles_per_row.clamp(1, width);
        let side = f64::from(width) / f64::from(columns);
        let rows = (f64::from(height) / side).ceil().max(1.0) as u32;
        Self {
            width,
            height,
            columns,
            rows,
            side,
        }
    }

    /// Canvas width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of tile columns.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Côté de base (non arrondi) d'une tuile.
    #[must_use]
    pub fn side(&self) -> f64 {
        self.side
    }

    /// Nombre total de tuiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    #[inline]
    fn edge(&self, index: u32, last: u32, limit: u32) -> u32 {
        if index >= last {
            limit
        } else {
            ((f64::from(index) * self.side).floor() as u32).min(limit)
        }
    }

    /// Rectangle de base de la tuile (tx, ty), sans animation de taille.
    ///
    /// C'est sur ce rectangle que la luminance et les contours sont évalués.
    #[must_use]
    pub fn base_rect(&self, tx: u32, ty: u32) -> TileRect {
        let x0 = self.edge(tx, self.columns, self.width);
        let x1 = self.edge(tx + 1, self.columns, self.width);
        let y0 = self.edge(ty, self.rows, self.height);
        let y1 = self.edge(ty + 1, self.rows, self.height);
        TileRect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    /// Rectangle carré de côté `side`, centré dans la cellule de base
    /// (tx, ty) et rogné au canvas. Utilisé quand les lignes de grille sont
    /// visibles.
    #[must_use]
    pub fn centered_rect(&self, tx: u32, ty: u32, side: f32) -> TileRect {
        let side = f64::from(side.max(0.0));
        let offset = (self.side - side) / 2.0;
        let x = f64::from(tx) * self.side + offset;
        let y = f64::from(ty) * self.side + offset;
        let x0 = (x.floor().max(0.0) as u32).min(self.width);
        let y0 = (y.floor().max(0.0) as u32).min(self.height);
        let x1 = ((x + side).floor().max(0.0) as u32).min(self.width);
        let y1 = ((y + side).floor().max(0.0) as u32).min(self.height);
        TileRect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    /// Iterate over `(tx, ty)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + use<> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |ty| (0..columns).map(move |tx| (tx, ty)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(width: u32, height: u32, tiles: u32) {
        let layout = GridLayout::new(width, height, tiles);
        let mut hits = vec![0u8; width as usize * height as usize];
        for (tx, ty) in layout.cells() {
            let r = layout.base_rect(tx, ty);
            assert!(!r.is_empty(), "{width}x{height}/{tiles}: tuile ({tx},{ty}) vide");
            for y in r.y..r.bottom() {
                for x in r.x..r.right() {
                    hits[(y * width + x) as usize] += 1;
                }
            }
        }
        assert!(
            hits.iter().all(|&h| h == 1),
            "{width}x{height}/{tiles}: couverture non exacte"
        );
    }

    #[test]
    fn grid_covers_canvas_exactly() {
        for (w, h, t) in [
            (64, 64, 4),
            (100, 37, 7),
            (1, 1, 1),
            (13, 200, 13),
            (37, 11, 5),
            (90, 91, 40),
            (7, 3, 100),
        ] {
            assert_exact_cover(w, h, t);
        }
    }

    #[test]
    fn rows_use_ceil() {
        let layout = GridLayout::new(100, 105, 10);
        assert_eq!(layout.rows(), 11);
        assert_eq!(layout.base_rect(0, 10), TileRect::new(0, 100, 10, 5));
    }

    #[test]
    fn last_column_stretches_to_boundary() {
        let layout = GridLayout::new(10, 10, 3);
        let last = layout.base_rect(2, 0);
        assert_eq!(last.right(), 10);
        assert_eq!(last.x, 6);
    }

    #[test]
    fn centered_rect_sits_inside_cell() {
        let layout = GridLayout::new(100, 100, 4);
        let r = layout.centered_rect(1, 1, 15.0);
        assert_eq!(r, TileRect::new(30, 30, 15, 15));
    }

    #[test]
    fn centered_rect_clips_to_canvas() {
        let layout = GridLayout::new(100, 100, 4);
        let r = layout.centered_rect(0, 0, 40.0);
        assert_eq!(r, TileRect::new(0, 0, 32, 32));
        let r = layout.centered_rect(3, 3, 40.0);
        assert_eq!((r.right(), r.bottom()), (100, 100));
    }
}
