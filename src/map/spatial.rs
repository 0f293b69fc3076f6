use std::collections::HashMap;

use glam::DVec2;

use crate::map::geometry::Bounds;

/// Coarse grid over region bounding boxes.
/// Each region is indexed into every cell its bbox overlaps, so a point query
/// never misses a region; callers still run an exact containment test.
pub struct RegionGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl RegionGrid {
    /// Build from per-region bounds; regions without bounds are not indexed
    pub fn build<'a>(bounds: impl Iterator<Item = Option<&'a Bounds>>, cell_size: f64) -> Self {
        let mut grid = Self {
            cells: HashMap::new(),
            cell_size: if cell_size > 0.0 && cell_size.is_finite() { cell_size } else { 1.0 },
        };
        for (idx, b) in bounds.enumerate() {
            let Some(b) = b else { continue };
            let (min_x, min_y) = grid.to_cell(b.min);
            let (max_x, max_y) = grid.to_cell(b.max);
            for y in min_y..=max_y {
                for x in min_x..=max_x {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Cell size that splits the longer side of `extent` into `divisions` cells
    pub fn cell_size_for(extent: &Bounds, divisions: u32) -> f64 {
        let size = extent.size();
        size.x.max(size.y) / divisions.max(1) as f64
    }

    #[inline(always)]
    fn to_cell(&self, p: DVec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    /// Candidate region indices for a point, in insertion order
    pub fn candidates(&self, p: DVec2) -> &[usize] {
        self.cells
            .get(&self.to_cell(p))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
