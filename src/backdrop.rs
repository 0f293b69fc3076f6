use std::fs;
use std::path::Path;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;
use tracing::{debug, warn};

/// Decorative text art painted beneath the map.
/// Optional: a missing asset just means a plain background.
#[derive(Clone, Debug, Default)]
pub struct Backdrop {
    lines: Vec<Vec<char>>,
}

impl Backdrop {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .map(|l| l.trim_end().chars().collect())
                .collect(),
        }
    }

    /// Load from disk; failures are logged and yield an empty backdrop
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => {
                let backdrop = Self::from_text(&text);
                debug!(path = %path.display(), lines = backdrop.lines.len(), "backdrop loaded");
                backdrop
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "backdrop unavailable, continuing without it");
                Self::empty()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }
}

impl Widget for &Backdrop {
    /// Tiles the art across `area`
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.is_empty() {
            return;
        }
        let area = area.intersection(buf.area);
        for row in 0..area.height {
            let line = &self.lines[row as usize % self.lines.len()];
            if line.is_empty() {
                continue;
            }
            for col in 0..area.width {
                let ch = line[col as usize % line.len()];
                if ch == ' ' {
                    continue;
                }
                buf[(area.x + col, area.y + row)]
                    .set_char(ch)
                    .set_fg(Color::DarkGray);
            }
        }
    }
}
