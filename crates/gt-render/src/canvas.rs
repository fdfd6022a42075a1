use gt_core::color::Rgb;
use gt_core::frame::FrameBuffer;
use gt_glyph::grid::TileRect;

use crate::glyph::GlyphMask;

/// Mélange `color` sur le pixel (x, y) avec une opacité `alpha` dans [0, 1].
///
/// L'alpha du pixel est composé en mode « over » : un fond transparent
/// devient opaque sous une peinture opaque.
#[inline(always)]
pub fn blend_pixel(fb: &mut FrameBuffer, x: u32, y: u32, color: Rgb, alpha: f32) {
    if x >= fb.width || y >= fb.height || alpha <= 0.0 {
        return;
    }
    let idx = (y as usize * fb.width as usize + x as usize) * 4;
    let Some(px) = fb.data.get_mut(idx..idx + 4) else {
        return;
    };
    if alpha >= 1.0 {
        px.copy_from_slice(&[color.r, color.g, color.b, 255]);
        return;
    }
    let inv = 1.0 - alpha;
    let mix = |src: u8, dst: u8| (f32::from(src) * alpha + f32::from(dst) * inv).round() as u8;
    px[0] = mix(color.r, px[0]);
    px[1] = mix(color.g, px[1]);
    px[2] = mix(color.b, px[2]);
    px[3] = (255.0 * alpha + f32::from(px[3]) * inv).round() as u8;
}

/// Remplit un rectangle (rogné au buffer).
///
/// # Example
/// ```
/// use gt_core::color::Rgb;
/// use gt_core::frame::FrameBuffer;
/// use gt_glyph::grid::TileRect;
/// use gt_render::canvas::fill_rect;
///
/// let mut fb = FrameBuffer::new(4, 4);
/// fill_rect(&mut fb, TileRect::new(1, 1, 2, 2), Rgb::WHITE, 1.0);
/// assert_eq!(fb.pixel(1, 1), (255, 255, 255, 255));
/// assert_eq!(fb.pixel(0, 0), (0, 0, 0, 0));
/// ```
pub fn fill_rect(fb: &mut FrameBuffer, rect: TileRect, color: Rgb, alpha: f32) {
    let x1 = rect.right().min(fb.width);
    let y1 = rect.bottom().min(fb.height);
    if alpha >= 1.0 {
        let rgba = [color.r, color.g, color.b, 255];
        let stride = fb.width as usize * 4;
        for y in rect.y..y1 {
            let row = y as usize * stride;
            let start = row + rect.x as usize * 4;
            let end = row + x1 as usize * 4;
            if start >= end {
                continue;
            }
            for px in fb.data[start..end].chunks_exact_mut(4) {
                px.copy_from_slice(&rgba);
            }
        }
        return;
    }
    for y in rect.y..y1 {
        for x in rect.x..x1 {
            blend_pixel(fb, x, y, color, alpha);
        }
    }
}

/// Trace le contour intérieur d'un rectangle, épaisseur `line_width` pixels.
pub fn stroke_rect(fb: &mut FrameBuffer, rect: TileRect, color: Rgb, alpha: f32, line_width: f32) {
    if rect.is_empty() || line_width <= 0.0 {
        return;
    }
    let w = (line_width.round() as u32).max(1);
    let x1 = rect.right().min(fb.width);
    let y1 = rect.bottom().min(fb.height);
    for y in rect.y..y1 {
        let on_row = y < rect.y + w || y + w >= rect.bottom();
        for x in rect.x..x1 {
            if on_row || x < rect.x + w || x + w >= rect.right() {
                blend_pixel(fb, x, y, color, alpha);
            }
        }
    }
}

/// Peint un masque de couverture centré sur (cx, cy).
pub fn draw_mask(
    fb: &mut FrameBuffer,
    mask: &GlyphMask,
    cx: f32,
    cy: f32,
    color: Rgb,
    alpha: f32,
) {
    let left = cx.round() as i64 + i64::from(mask.offset_x);
    let top = cy.round() as i64 + i64::from(mask.offset_y);
    for my in 0..mask.height {
        let y = top + i64::from(my);
        if y < 0 || y >= i64::from(fb.height) {
            continue;
        }
        for mx in 0..mask.width {
            let x = left + i64::from(mx);
            if x < 0 || x >= i64::from(fb.width) {
                continue;
            }
            let coverage = mask.coverage(mx, my);
            if coverage > 0 {
                blend_pixel(fb, x as u32, y as u32, color, alpha * f32::from(coverage) / 255.0);
            }
        }
    }
}
