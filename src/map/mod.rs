pub mod geometry;
pub mod raster;
pub mod renderer;
pub mod spatial;
pub mod style;
pub mod viewport;

pub use geometry::{label_anchor, Bounds, GeometryError, Polygon, RegionGeometry};
pub use renderer::{
    CursorIcon, MapRenderer, PointerEvent, RenderError, RendererState, Surface, DEFAULT_MAX_ZOOM,
};
pub use style::Palette;
pub use viewport::Viewport;
