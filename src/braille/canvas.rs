/// Sub-cell canvas for region outlines.
/// Each terminal cell holds a 2x4 dot grid mapped onto U+2800..U+28FF,
/// so a canvas of `w x h` cells has `2w x 4h` addressable dots.
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl BrailleCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0u8; width * height],
        }
    }

    /// Dot width of the canvas
    pub fn dot_width(&self) -> usize {
        self.width * 2
    }

    /// Dot height of the canvas
    pub fn dot_height(&self) -> usize {
        self.height * 4
    }

    /// Set one dot. Bit layout per cell:
    /// ```text
    /// (0,0) (1,0)   0x01 0x08
    /// (0,1) (1,1)   0x02 0x10
    /// (0,2) (1,2)   0x04 0x20
    /// (0,3) (1,3)   0x40 0x80
    /// ```
    pub fn set_dot(&mut self, x: usize, y: usize) {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }

        let bit = match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            _ => 0x80,
        };

        self.cells[cy * self.width + cx] |= bit;
    }

    /// Signed variant; dots left of or above the origin are dropped
    pub fn set_dot_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_dot(x as usize, y as usize);
        }
    }

    /// Glyph for a cell, or None when no dot is set there
    pub fn glyph(&self, cx: usize, cy: usize) -> Option<char> {
        if cx >= self.width || cy >= self.height {
            return None;
        }
        match self.cells[cy * self.width + cx] {
            0 => None,
            bits => char::from_u32(0x2800 + bits as u32),
        }
    }

    /// Non-empty cells as (column, row, glyph)
    pub fn glyphs(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        (0..self.height).flat_map(move |cy| {
            (0..self.width).filter_map(move |cx| self.glyph(cx, cy).map(|g| (cx, cy, g)))
        })
    }
}
