use gt_core::frame::FrameBuffer;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

/// Demi-bloc inférieur : fg = pixel du bas, bg = pixel du haut.
const HALF_BLOCK: char = '▄';

#[inline]
fn term_color(px: (u8, u8, u8, u8)) -> Color {
    if px.3 == 0 {
        Color::Reset
    } else {
        Color::Rgb(px.0, px.1, px.2)
    }
}

/// Écrit un raster RGBA dans un `ratatui::Buffer`, deux pixels par cellule.
///
/// Le raster est réduit (plus proche voisin) pour tenir dans `area` en
/// conservant ses proportions, puis centré.
///
/// # Example
/// ```
/// use gt_core::frame::FrameBuffer;
/// use gt_render::preview::render_raster;
/// use ratatui::buffer::Buffer;
/// use ratatui::layout::Rect;
///
/// let area = Rect::new(0, 0, 8, 4);
/// let mut buf = Buffer::empty(area);
/// render_raster(&mut buf, area, &FrameBuffer::new(8, 8));
/// ```
pub fn render_raster(buf: &mut Buffer, area: Rect, raster: &FrameBuffer) {
    if area.width == 0 || area.height == 0 || raster.width == 0 || raster.height == 0 {
        return;
    }
    let cols = f64::from(area.width);
    let pixel_rows = f64::from(area.height) * 2.0;
    let scale = (cols / f64::from(raster.width)).min(pixel_rows / f64::from(raster.height));
    let out_w = ((f64::from(raster.width) * scale).floor() as u32).clamp(1, u32::from(area.width));
    let out_h = ((f64::from(raster.height) * scale).floor() as u32).clamp(1, u32::from(area.height) * 2);
    let out_rows = out_h.div_ceil(2);

    let off_x = area.x + ((u32::from(area.width) - out_w) / 2) as u16;
    let off_y = area.y + ((u32::from(area.height) - out_rows) / 2) as u16;

    let sample = |ox: u32, oy: u32| {
        let sx = (ox * raster.width / out_w).min(raster.width - 1);
        let sy = (oy * raster.height / out_h).min(raster.height - 1);
        raster.pixel(sx, sy)
    };

    for cy in 0..out_rows {
        for cx in 0..out_w {
            let top = sample(cx, cy * 2);
            let bottom = if cy * 2 + 1 < out_h {
                sample(cx, cy * 2 + 1)
            } else {
                (0, 0, 0, 0)
            };
            if let Some(cell) = buf.cell_mut((off_x + cx as u16, off_y + cy as u16)) {
                cell.set_char(HALF_BLOCK)
                    .set_fg(term_color(bottom))
                    .set_bg(term_color(top));
            }
        }
    }
}

/// État affiché dans la barre de statut.
#[derive(Clone, Debug, Default)]
pub struct StatusLine {
    /// Horloge en pause.
    pub paused: bool,
    /// Libellé de l'état de capture.
    pub capture: String,
    /// Ticks rendus par seconde.
    pub rate: f64,
    /// Nombre de tuiles par ligne.
    pub tiles_per_row: u32,
    /// Preset de style actif.
    pub preset: Option<&'static str>,
    /// Dernier message (export, erreur…).
    pub message: Option<String>,
}

/// Dessine l'interface : aperçu du raster + barre de statut.
pub fn draw(frame: &mut Frame, raster: &FrameBuffer, status: &StatusLine) {
    let chunks = Layout::vertical([Constraint::Min(4), Constraint::Length(2)]).split(frame.area());

    // === Canvas ===
    render_raster(frame.buffer_mut(), chunks[0], raster);

    // === Status ===
    let state = if status.paused {
        Span::styled(" PAUSE ", Style::default().fg(Color::Black).bg(Color::Yellow))
    } else {
        Span::styled(" LIVE ", Style::default().fg(Color::Black).bg(Color::Green))
    };
    let first = Line::from(vec![
        state,
        Span::raw(format!(
            " {:5.1} fps │ {} tuiles/ligne │ {} │ capture: {}",
            status.rate,
            status.tiles_per_row,
            status.preset.unwrap_or("steps perso"),
            status.capture,
        )),
    ]);
    let second = Line::from(Span::styled(
        status.message.clone().unwrap_or_else(|| {
            "[espace] pause  [c] capture  [x] annuler  [s] png  [[ ]] preset  [-/+] tuiles  [q] quitter"
                .to_string()
        }),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(vec![first, second]), chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_pixels_per_cell() {
        let mut raster = FrameBuffer::new(2, 2);
        raster.data.copy_from_slice(&[
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 9, 9, 9, 255,
        ]);
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        render_raster(&mut buf, area, &raster);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▄");
        assert_eq!(cell.bg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.fg, Color::Rgb(0, 0, 255));
        assert_eq!(buf[(1, 0)].fg, Color::Rgb(9, 9, 9));
    }

    #[test]
    fn transparent_pixels_reset_colour() {
        let raster = FrameBuffer::new(2, 2);
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        render_raster(&mut buf, area, &raster);
        assert_eq!(buf[(0, 0)].bg, Color::Reset);
    }

    #[test]
    fn wide_area_centres_raster() {
        let mut raster = FrameBuffer::new(2, 2);
        raster.fill([1, 1, 1, 255]);
        let area = Rect::new(0, 0, 6, 1);
        let mut buf = Buffer::empty(area);
        render_raster(&mut buf, area, &raster);
        assert_eq!(buf[(0, 0)].symbol(), " ");
        assert_eq!(buf[(2, 0)].bg, Color::Rgb(1, 1, 1));
        assert_eq!(buf[(3, 0)].bg, Color::Rgb(1, 1, 1));
    }
}
