use ratatui::style::Color;

/// Resolved look of one shape layer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeStyle {
    pub fill: Color,
    pub fill_opacity: f32,
    pub weight: u8,
    pub stroke: Color,
    pub stroke_opacity: f32,
}

impl ShapeStyle {
    /// Fill colour composited over a black surface
    pub fn composited_fill(&self) -> Color {
        blend_over_black(self.fill, self.fill_opacity)
    }
}

/// Two-state palette with a hover variant of each state
#[derive(Clone, Debug)]
pub struct Palette {
    pub inactive: Color,
    pub active: Color,
    pub inactive_hover: Color,
    pub active_hover: Color,
    pub stroke: Color,
}

pub const BASE_WEIGHT: u8 = 2;
pub const HOVER_WEIGHT: u8 = 3;
pub const BASE_FILL_OPACITY: f32 = 0.8;
pub const HOVER_FILL_OPACITY: f32 = 0.9;

impl Default for Palette {
    fn default() -> Self {
        Self {
            inactive: Color::Rgb(0x1e, 0x29, 0x3b),
            active: Color::Rgb(0x3b, 0x82, 0xf6),
            inactive_hover: Color::Rgb(0x33, 0x41, 0x55),
            active_hover: Color::Rgb(0x25, 0x63, 0xeb),
            stroke: Color::Rgb(0xff, 0xff, 0xff),
        }
    }
}

impl Palette {
    /// Base style implied by selection alone
    pub fn base(&self, selected: bool) -> ShapeStyle {
        ShapeStyle {
            fill: if selected { self.active } else { self.inactive },
            fill_opacity: BASE_FILL_OPACITY,
            weight: BASE_WEIGHT,
            stroke: self.stroke,
            stroke_opacity: 1.0,
        }
    }

    /// Base style with the hover emphasis layered on top when `hovered`
    pub fn resolve(&self, selected: bool, hovered: bool) -> ShapeStyle {
        let base = self.base(selected);
        if !hovered {
            return base;
        }
        ShapeStyle {
            fill: if selected { self.active_hover } else { self.inactive_hover },
            fill_opacity: HOVER_FILL_OPACITY,
            weight: HOVER_WEIGHT,
            ..base
        }
    }
}

/// Scale an RGB colour by `opacity`; named colours pass through unchanged
pub fn blend_over_black(color: Color, opacity: f32) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let a = opacity.clamp(0.0, 1.0);
            let mix = |c: u8| (c as f32 * a).round() as u8;
            Color::Rgb(mix(r), mix(g), mix(b))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_styles() {
        let palette = Palette::default();
        let default = palette.base(false);
        let selected = palette.base(true);
        assert_eq!(default.fill, palette.inactive);
        assert_eq!(selected.fill, palette.active);
        assert_eq!(default.weight, 2);
        assert_eq!(selected.weight, 2);
        assert_eq!(default.fill_opacity, 0.8);
        assert_eq!(selected.fill_opacity, 0.8);
    }

    #[test]
    fn test_hover_layers_on_base() {
        let palette = Palette::default();
        let hover_default = palette.resolve(false, true);
        let hover_selected = palette.resolve(true, true);
        assert_eq!(hover_default.weight, 3);
        assert_eq!(hover_default.fill_opacity, 0.9);
        assert_eq!(hover_default.fill, palette.inactive_hover);
        assert_eq!(hover_selected.fill, palette.active_hover);
        assert_eq!(palette.resolve(true, false), palette.base(true));
    }

    #[test]
    fn test_blend_over_black() {
        assert_eq!(blend_over_black(Color::Rgb(100, 200, 50), 0.5), Color::Rgb(50, 100, 25));
        assert_eq!(blend_over_black(Color::Rgb(10, 10, 10), 2.0), Color::Rgb(10, 10, 10));
        assert_eq!(blend_over_black(Color::White, 0.1), Color::White);
    }
}
