use glam::DVec2;

use crate::map::geometry::Bounds;

/// Visible window onto planar data, measured in Braille dots.
/// Zoom is logarithmic: one zoom step doubles the dots per data unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    pub center: DVec2,
    pub zoom: f64,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(center: DVec2, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
        }
    }

    /// Dots per data unit at the current zoom
    pub fn scale(&self) -> f64 {
        self.zoom.exp2()
    }

    /// Centre on `bounds` at the largest zoom (up to `max_zoom`) that keeps
    /// all of it inside the viewport minus `padding` dots on every side
    pub fn fit_bounds(&mut self, bounds: &Bounds, padding: usize, max_zoom: f64) {
        self.center = bounds.center();

        let avail_w = self.width.saturating_sub(padding * 2) as f64;
        let avail_h = self.height.saturating_sub(padding * 2) as f64;
        if avail_w <= 0.0 || avail_h <= 0.0 {
            return;
        }

        let size = bounds.size();
        let fit = match (size.x > 0.0, size.y > 0.0) {
            (true, true) => (avail_w / size.x).min(avail_h / size.y).log2(),
            (true, false) => (avail_w / size.x).log2(),
            (false, true) => (avail_h / size.y).log2(),
            (false, false) => max_zoom,
        };
        self.zoom = fit.min(max_zoom);
    }

    /// Data coordinate to dot position (y grows downward on screen)
    pub fn project(&self, p: DVec2) -> (i32, i32) {
        let scale = self.scale();
        let px = (p.x - self.center.x) * scale + self.width as f64 / 2.0;
        let py = (self.center.y - p.y) * scale + self.height as f64 / 2.0;
        (px.floor() as i32, py.floor() as i32)
    }

    /// Dot position (may be fractional) back to a data coordinate
    pub fn unproject(&self, px: f64, py: f64) -> DVec2 {
        let scale = self.scale();
        DVec2::new(
            (px - self.width as f64 / 2.0) / scale + self.center.x,
            self.center.y - (py - self.height as f64 / 2.0) / scale,
        )
    }

    /// Data coordinate at the centre of terminal cell (col, row)
    pub fn cell_center(&self, col: u16, row: u16) -> DVec2 {
        self.unproject(col as f64 * 2.0 + 1.0, row as f64 * 4.0 + 2.0)
    }
}
