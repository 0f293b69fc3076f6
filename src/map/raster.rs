use crate::braille::BrailleCanvas;

/// Bresenham line between two dot positions
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_dot_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Three offset passes for heavier strokes
pub fn draw_thick_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    draw_line(canvas, x0, y0, x1, y1);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1);
}

/// Stroke a closed ring of projected dots. Stroke weight above 2 draws thick.
pub fn stroke_ring(canvas: &mut BrailleCanvas, dots: &[(i32, i32)], weight: u8) {
    if dots.len() < 2 {
        return;
    }
    let limit = (canvas.dot_width() + canvas.dot_height()) as i32;
    let closing = (dots[dots.len() - 1], dots[0]);
    for (a, b) in dots.windows(2).map(|w| (w[0], w[1])).chain(std::iter::once(closing)) {
        if !segment_near_canvas(canvas, a, b, limit) {
            continue;
        }
        if weight > 2 {
            draw_thick_line(canvas, a.0, a.1, b.0, b.1);
        } else {
            draw_line(canvas, a.0, a.1, b.0, b.1);
        }
    }
}

/// Rough bbox cull so off-screen segments are not walked dot by dot
fn segment_near_canvas(canvas: &BrailleCanvas, a: (i32, i32), b: (i32, i32), limit: i32) -> bool {
    let (w, h) = (canvas.dot_width() as i32, canvas.dot_height() as i32);
    let (min_x, max_x) = (a.0.min(b.0), a.0.max(b.0));
    let (min_y, max_y) = (a.1.min(b.1), a.1.max(b.1));
    max_x >= 0
        && min_x < w
        && max_y >= 0
        && min_y < h
        && (max_x - min_x) < limit * 4
        && (max_y - min_y) < limit * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.glyphs().count(), 5);
        assert_eq!(canvas.glyph(0, 0), Some('⠉'));
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.glyph(0, 0), Some('⡇'));
        assert_eq!(canvas.glyph(0, 1), Some('⡇'));
    }

    #[test]
    fn test_ring_is_closed() {
        let mut canvas = BrailleCanvas::new(4, 2);
        stroke_ring(&mut canvas, &[(0, 0), (7, 0), (7, 7)], 2);
        // closing edge runs back along the diagonal to the origin
        assert!(canvas.glyph(1, 0).is_some());
        assert!(canvas.glyph(3, 1).is_some());
    }

    #[test]
    fn test_thick_stroke_sets_more_dots() {
        let mut thin = BrailleCanvas::new(8, 4);
        let mut thick = BrailleCanvas::new(8, 4);
        let square = [(2, 2), (12, 2), (12, 12), (2, 12)];
        stroke_ring(&mut thin, &square, 2);
        stroke_ring(&mut thick, &square, 3);
        let count = |c: &BrailleCanvas| {
            c.glyphs()
                .map(|(_, _, g)| (g as u32 - 0x2800).count_ones())
                .sum::<u32>()
        };
        assert!(count(&thick) > count(&thin));
    }

    #[test]
    fn test_offscreen_segment_skipped() {
        let mut canvas = BrailleCanvas::new(2, 2);
        stroke_ring(&mut canvas, &[(100, 100), (200, 100), (200, 200)], 2);
        assert_eq!(canvas.glyphs().count(), 0);
    }
}
