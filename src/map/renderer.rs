use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec2;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Widget;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::braille::BrailleCanvas;
use crate::data::BoundaryDataset;
use crate::map::geometry::{label_anchor, Bounds};
use crate::map::raster::stroke_ring;
use crate::map::spatial::RegionGrid;
use crate::map::style::{blend_over_black, Palette, ShapeStyle};
use crate::map::viewport::Viewport;
use crate::selection::{SelectionStore, Subscription};

/// Zoom cap used when fitting the dataset
pub const DEFAULT_MAX_ZOOM: f64 = 12.0;

/// Grid divisions along the dataset's longer side for hit-testing
const GRID_DIVISIONS: u32 = 64;

/// Lifecycle of one renderer instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    Initializing,
    Ready,
    Destroyed,
}

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("renderer is {0:?}, expected Uninitialized")]
    InvalidState(RendererState),

    #[error("dataset has no regions")]
    EmptyDataset,
}

/// Cursor affordance shown over the surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorIcon {
    Default,
    Pointer,
}

/// Interaction a shape layer can respond to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEvent {
    Enter,
    Leave,
    Click,
}

/// The container region a renderer draws into.
/// Not `Clone`: a surface moves into exactly one renderer.
#[derive(Debug)]
pub struct Surface {
    area: Rect,
    pointer: Option<(u16, u16)>,
    cursor: CursorIcon,
}

impl Surface {
    pub fn new(area: Rect) -> Self {
        Self {
            area,
            pointer: None,
            cursor: CursorIcon::Default,
        }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    pub fn pointer(&self) -> Option<(u16, u16)> {
        self.pointer
    }

    fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.area.x
            && row >= self.area.y
            && col < self.area.x + self.area.width
            && row < self.area.y + self.area.height
    }
}

/// Styled shape for one region
#[derive(Clone, Debug)]
pub struct ShapeLayer {
    pub region: usize,
    pub code: String,
    pub style: ShapeStyle,
    pub bounds: Option<Bounds>,
    handlers: Vec<PointerEvent>,
}

impl ShapeLayer {
    pub fn handles(&self, event: PointerEvent) -> bool {
        self.handlers.contains(&event)
    }
}

/// Text marker anchored on a region
#[derive(Clone, Debug)]
pub struct LabelLayer {
    pub region: usize,
    pub text: String,
    pub anchor: DVec2,
}

/// Layers shared with the selection listener
struct LayerSet {
    palette: Palette,
    shapes: Vec<ShapeLayer>,
    labels: Vec<LabelLayer>,
    hovered: Option<usize>,
}

impl LayerSet {
    /// Re-derive every shape's style from the selection and hover state
    fn restyle(&mut self, selected: Option<&str>) {
        for idx in 0..self.shapes.len() {
            self.refresh(idx, selected);
        }
    }

    fn refresh(&mut self, idx: usize, selected: Option<&str>) {
        let hovered = self.hovered == Some(idx);
        if let Some(shape) = self.shapes.get_mut(idx) {
            let is_selected = selected == Some(shape.code.as_str());
            shape.style = self.palette.resolve(is_selected, hovered);
        }
    }

    fn clear(&mut self) {
        self.shapes.clear();
        self.labels.clear();
        self.hovered = None;
    }
}

/// Draws the region map onto its surface and routes pointer input.
///
/// Layers are built once in [`MapRenderer::initialize`]; selection changes
/// only re-style them. Everything the renderer holds is released by
/// [`MapRenderer::destroy`], which also runs on drop.
pub struct MapRenderer {
    state: RendererState,
    surface: Surface,
    max_zoom: f64,
    viewport: Option<Viewport>,
    layers: Rc<RefCell<LayerSet>>,
    dataset: Option<Rc<BoundaryDataset>>,
    grid: Option<RegionGrid>,
    extent: Option<Bounds>,
    store: Option<Rc<SelectionStore>>,
    subscription: Option<Subscription>,
}

impl MapRenderer {
    pub fn new(surface: Surface, max_zoom: f64, palette: Palette) -> Self {
        Self {
            state: RendererState::Uninitialized,
            surface,
            max_zoom,
            viewport: None,
            layers: Rc::new(RefCell::new(LayerSet {
                palette,
                shapes: Vec::new(),
                labels: Vec::new(),
                hovered: None,
            })),
            dataset: None,
            grid: None,
            extent: None,
            store: None,
            subscription: None,
        }
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn shape_count(&self) -> usize {
        self.layers.borrow().shapes.len()
    }

    pub fn label_count(&self) -> usize {
        self.layers.borrow().labels.len()
    }

    pub fn shape_style(&self, idx: usize) -> Option<ShapeStyle> {
        self.layers.borrow().shapes.get(idx).map(|s| s.style)
    }

    pub fn hovered(&self) -> Option<usize> {
        self.layers.borrow().hovered
    }

    /// Interaction handlers still attached, including the store listener
    pub fn handler_count(&self) -> usize {
        let per_shape: usize = self
            .layers
            .borrow()
            .shapes
            .iter()
            .map(|s| s.handlers.len())
            .sum();
        per_shape + usize::from(self.subscription.is_some())
    }

    /// Build layers for `dataset`, fit the view, and start following `store`
    pub fn initialize(
        &mut self,
        dataset: Rc<BoundaryDataset>,
        store: Rc<SelectionStore>,
    ) -> Result<(), RenderError> {
        if self.state != RendererState::Uninitialized {
            return Err(RenderError::InvalidState(self.state));
        }
        if dataset.is_empty() {
            return Err(RenderError::EmptyDataset);
        }
        self.state = RendererState::Initializing;

        let selected = store.current();
        let anchors: Vec<_> = dataset
            .regions()
            .par_iter()
            .map(|region| label_anchor(&region.geometry))
            .collect();

        {
            let mut layers = self.layers.borrow_mut();
            for (idx, (region, anchor)) in dataset.regions().iter().zip(anchors).enumerate() {
                let style = layers
                    .palette
                    .resolve(selected.as_deref() == Some(region.code.as_str()), false);
                layers.shapes.push(ShapeLayer {
                    region: idx,
                    code: region.code.clone(),
                    style,
                    bounds: region.geometry.bounds(),
                    handlers: vec![PointerEvent::Enter, PointerEvent::Leave, PointerEvent::Click],
                });

                match anchor {
                    Ok(anchor) => layers.labels.push(LabelLayer {
                        region: idx,
                        text: region.name.clone(),
                        anchor,
                    }),
                    Err(e) => warn!(code = %region.code, error = %e, "label skipped"),
                }
            }

            self.extent = layers
                .shapes
                .iter()
                .filter_map(|s| s.bounds)
                .reduce(Bounds::union);

            let cell_size = self
                .extent
                .map(|b| RegionGrid::cell_size_for(&b, GRID_DIVISIONS))
                .unwrap_or(1.0);
            self.grid = Some(RegionGrid::build(
                layers.shapes.iter().map(|s| s.bounds.as_ref()),
                cell_size,
            ));
        }

        self.viewport = Some(self.fitted_viewport());

        let weak = Rc::downgrade(&self.layers);
        self.subscription = Some(store.subscribe(move |event| {
            if let Some(layers) = weak.upgrade() {
                layers.borrow_mut().restyle(event.current.as_deref());
            }
        }));

        info!(
            shapes = self.shape_count(),
            labels = self.label_count(),
            zoom = ?self.viewport.as_ref().map(|v| v.zoom),
            "map ready"
        );
        self.dataset = Some(dataset);
        self.store = Some(store);
        self.state = RendererState::Ready;
        Ok(())
    }

    /// Viewport for the current surface, fitted to all shapes with no padding
    fn fitted_viewport(&self) -> Viewport {
        let area = self.surface.area;
        let mut viewport = Viewport::new(
            DVec2::ZERO,
            0.0,
            area.width as usize * 2,
            area.height as usize * 4,
        );
        if let Some(extent) = &self.extent {
            viewport.fit_bounds(extent, 0, self.max_zoom);
        }
        viewport
    }

    /// Surface changed size; refit while keeping layers as they are
    pub fn resize(&mut self, area: Rect) {
        self.surface.area = area;
        if self.state == RendererState::Ready {
            self.viewport = Some(self.fitted_viewport());
            debug!(width = area.width, height = area.height, "map refitted");
        }
    }

    /// Shape under a terminal cell, if any
    pub fn hit_test(&self, col: u16, row: u16) -> Option<usize> {
        if !self.surface.contains(col, row) {
            return None;
        }
        let viewport = self.viewport.as_ref()?;
        let dataset = self.dataset.as_deref()?;
        let grid = self.grid.as_ref()?;
        let p = viewport.cell_center(col - self.surface.area.x, row - self.surface.area.y);
        region_at(dataset, grid, p)
    }

    /// Track the pointer; fires leave/enter when the shape under it changes
    pub fn pointer_move(&mut self, col: u16, row: u16) -> bool {
        if self.state != RendererState::Ready {
            return false;
        }
        self.surface.pointer = self.surface.contains(col, row).then_some((col, row));

        let hit = self.hit_test(col, row);
        let hovered = self.hovered();
        if hit == hovered {
            return false;
        }
        if let Some(prev) = hovered {
            self.dispatch(prev, PointerEvent::Leave);
        }
        if let Some(next) = hit {
            self.dispatch(next, PointerEvent::Enter);
        }
        true
    }

    /// Pointer left the surface entirely
    pub fn pointer_exit(&mut self) {
        self.surface.pointer = None;
        if let Some(prev) = self.hovered() {
            self.dispatch(prev, PointerEvent::Leave);
        }
    }

    /// Click at a terminal cell; returns the region code that was toggled
    pub fn click(&mut self, col: u16, row: u16) -> Option<String> {
        if self.state != RendererState::Ready {
            return None;
        }
        let idx = self.hit_test(col, row)?;
        self.dispatch(idx, PointerEvent::Click)
            .then(|| self.layers.borrow().shapes[idx].code.clone())
    }

    /// Deliver one pointer event to a shape layer.
    /// Hover changes style and cursor only; clicks go through the store.
    pub fn dispatch(&mut self, idx: usize, event: PointerEvent) -> bool {
        if self.state != RendererState::Ready {
            return false;
        }
        let Some(code) = self
            .layers
            .borrow()
            .shapes
            .get(idx)
            .filter(|s| s.handles(event))
            .map(|s| s.code.clone())
        else {
            return false;
        };
        let selected = self.store.as_ref().and_then(|s| s.current());

        match event {
            PointerEvent::Enter => {
                let mut layers = self.layers.borrow_mut();
                let previous = layers.hovered.replace(idx);
                if let Some(prev) = previous.filter(|&p| p != idx) {
                    layers.refresh(prev, selected.as_deref());
                }
                layers.refresh(idx, selected.as_deref());
                self.surface.cursor = CursorIcon::Pointer;
            }
            PointerEvent::Leave => {
                let mut layers = self.layers.borrow_mut();
                if layers.hovered == Some(idx) {
                    layers.hovered = None;
                    self.surface.cursor = CursorIcon::Default;
                }
                layers.refresh(idx, selected.as_deref());
            }
            PointerEvent::Click => {
                // no layer borrow may be held here: the store calls back into restyle
                match &self.store {
                    Some(store) => store.toggle(&code),
                    None => return false,
                }
            }
        }
        true
    }

    /// Release the viewport, layers, handlers and store listener.
    /// Safe to call any number of times.
    pub fn destroy(&mut self) {
        if self.state == RendererState::Destroyed {
            return;
        }
        let was = self.state;
        self.subscription.take();
        self.layers.borrow_mut().clear();
        self.viewport = None;
        self.grid = None;
        self.extent = None;
        self.dataset = None;
        self.store = None;
        self.surface.cursor = CursorIcon::Default;
        self.surface.pointer = None;
        self.state = RendererState::Destroyed;
        debug!(from = ?was, "map destroyed");
    }
}

impl Drop for MapRenderer {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// First region (dataset order) whose geometry contains `p`
fn region_at(dataset: &BoundaryDataset, grid: &RegionGrid, p: DVec2) -> Option<usize> {
    grid.candidates(p).iter().copied().find(|&idx| {
        dataset
            .get(idx)
            .is_some_and(|region| region.geometry.contains(p))
    })
}

const LABEL_FG: Color = Color::White;
const LABEL_BG: Color = Color::Rgb(0x14, 0x14, 0x14);
const CURSOR_GLYPH: char = '╋';

impl Widget for &MapRenderer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.state != RendererState::Ready {
            return;
        }
        let (Some(viewport), Some(dataset), Some(grid)) = (
            self.viewport.as_ref(),
            self.dataset.as_deref(),
            self.grid.as_ref(),
        ) else {
            return;
        };
        let area = area.intersection(buf.area);
        let layers = self.layers.borrow();

        // Fill: every cell whose centre falls inside a region
        let width = area.width;
        let hits: Vec<Option<usize>> = (0..area.height)
            .into_par_iter()
            .flat_map_iter(|row| {
                (0..width).map(move |col| region_at(dataset, grid, viewport.cell_center(col, row)))
            })
            .collect();
        for (i, hit) in hits.into_iter().enumerate() {
            let Some(shape) = hit.and_then(|idx| layers.shapes.get(idx)) else {
                continue;
            };
            let x = area.x + (i % width as usize) as u16;
            let y = area.y + (i / width as usize) as u16;
            buf[(x, y)].set_bg(shape.style.composited_fill());
        }

        // Outlines: heavier strokes go on a second canvas so both stay visible
        let mut thin = BrailleCanvas::new(area.width as usize, area.height as usize);
        let mut thick = BrailleCanvas::new(area.width as usize, area.height as usize);
        let stroke = layers
            .shapes
            .first()
            .map(|s| blend_over_black(s.style.stroke, s.style.stroke_opacity))
            .unwrap_or(layers.palette.stroke);
        for shape in &layers.shapes {
            let Some(region) = dataset.get(shape.region) else {
                continue;
            };
            let canvas = if shape.style.weight > 2 { &mut thick } else { &mut thin };
            for poly in region.geometry.parts() {
                for ring in &poly.rings {
                    let mut dots: Vec<(i32, i32)> =
                        ring.iter().map(|&p| viewport.project(p)).collect();
                    dots.dedup();
                    stroke_ring(canvas, &dots, shape.style.weight);
                }
            }
        }
        for canvas in [&thin, &thick] {
            for (cx, cy, glyph) in canvas.glyphs() {
                buf[(area.x + cx as u16, area.y + cy as u16)]
                    .set_char(glyph)
                    .set_fg(stroke);
            }
        }

        // Labels centred on their anchors
        let label_style = Style::default()
            .fg(LABEL_FG)
            .bg(LABEL_BG)
            .add_modifier(Modifier::BOLD);
        for label in &layers.labels {
            let (px, py) = viewport.project(label.anchor);
            if px < 0 || py < 0 {
                continue;
            }
            let (Ok(col), Ok(row)) = (u16::try_from(px / 2), u16::try_from(py / 4)) else {
                continue;
            };
            if row >= area.height || col >= area.width {
                continue;
            }
            let text = format!(" {} ", label.text);
            let len = text.chars().count() as u16;
            let start = col.saturating_sub(len / 2);
            let room = area.width.saturating_sub(start) as usize;
            let shown: String = text.chars().take(room).collect();
            buf.set_string(area.x + start, area.y + row, shown, label_style);
        }

        if self.surface.cursor == CursorIcon::Pointer {
            if let Some((col, row)) = self.surface.pointer {
                if area.contains((col, row).into()) {
                    buf[(col, row)].set_char(CURSOR_GLYPH).set_fg(Color::Red);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_dataset;
    use crate::data::tests::TWO_REGIONS;

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 40,
        height: 20,
    };
    // cells whose centres land inside square A, inside triangle B only, and outside both
    const IN_A: (u16, u16) = (10, 15);
    const IN_B: (u16, u16) = (30, 17);
    const OUTSIDE: (u16, u16) = (39, 0);
    // inside A, clear of outlines and label chips
    const FILL_A: (u16, u16) = (5, 17);

    fn dataset(body: &str) -> Rc<BoundaryDataset> {
        Rc::new(parse_dataset(body.as_bytes().to_vec()).unwrap())
    }

    fn ready_renderer() -> (MapRenderer, Rc<SelectionStore>) {
        let store = Rc::new(SelectionStore::new());
        let mut renderer = MapRenderer::new(Surface::new(AREA), DEFAULT_MAX_ZOOM, Palette::default());
        renderer
            .initialize(dataset(TWO_REGIONS), store.clone())
            .unwrap();
        (renderer, store)
    }

    fn row_text(buf: &Buffer, row: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, row)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_initialize_builds_one_layer_per_region() {
        let (renderer, store) = ready_renderer();
        assert_eq!(renderer.state(), RendererState::Ready);
        assert_eq!(renderer.shape_count(), 2);
        assert_eq!(renderer.label_count(), 2);
        assert_eq!(renderer.handler_count(), 2 * 3 + 1);
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn test_degenerate_region_has_shape_but_no_label() {
        let body = TWO_REGIONS.replace(
            "\"features\": [",
            r#""features": [
            {"type":"Feature","properties":{"code":"C","nom":"Sliver"},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,1]]]}},"#,
        );
        let store = Rc::new(SelectionStore::new());
        let mut renderer = MapRenderer::new(Surface::new(AREA), DEFAULT_MAX_ZOOM, Palette::default());
        renderer.initialize(dataset(&body), store).unwrap();
        assert_eq!(renderer.shape_count(), 3);
        assert_eq!(renderer.label_count(), 2);
    }

    #[test]
    fn test_initial_style_follows_store() {
        let store = Rc::new(SelectionStore::new());
        store.toggle("B");
        let mut renderer = MapRenderer::new(Surface::new(AREA), DEFAULT_MAX_ZOOM, Palette::default());
        renderer.initialize(dataset(TWO_REGIONS), store).unwrap();
        let palette = Palette::default();
        assert_eq!(renderer.shape_style(0), Some(palette.base(false)));
        assert_eq!(renderer.shape_style(1), Some(palette.base(true)));
    }

    #[test]
    fn test_click_toggles_selection_and_restyles() {
        let (mut renderer, store) = ready_renderer();
        let palette = Palette::default();

        assert_eq!(renderer.click(IN_A.0, IN_A.1).as_deref(), Some("A"));
        assert_eq!(store.current().as_deref(), Some("A"));
        assert_eq!(renderer.shape_style(0).unwrap().fill, palette.active);
        assert_eq!(renderer.shape_style(1), Some(palette.base(false)));

        renderer.click(IN_A.0, IN_A.1);
        assert_eq!(store.current(), None);
        assert_eq!(renderer.shape_style(0), Some(palette.base(false)));
        assert_eq!(renderer.shape_style(1), Some(palette.base(false)));
        assert_eq!(renderer.shape_count(), 2);
    }

    #[test]
    fn test_click_other_region_replaces() {
        let (mut renderer, store) = ready_renderer();
        renderer.click(IN_A.0, IN_A.1);
        renderer.click(IN_B.0, IN_B.1);
        assert_eq!(store.current().as_deref(), Some("B"));
        let palette = Palette::default();
        assert_eq!(renderer.shape_style(0), Some(palette.base(false)));
        assert_eq!(renderer.shape_style(1), Some(palette.base(true)));
    }

    #[test]
    fn test_click_outside_is_noop() {
        let (mut renderer, store) = ready_renderer();
        assert_eq!(renderer.click(OUTSIDE.0, OUTSIDE.1), None);
        assert_eq!(renderer.click(200, 200), None);
        assert_eq!(store.current(), None);
    }

    #[test]
    fn test_external_toggle_restyles_without_rebuild() {
        let (renderer, store) = ready_renderer();
        store.toggle("B");
        assert_eq!(renderer.shape_style(1).unwrap().fill, Palette::default().active);
        assert_eq!(renderer.shape_count(), 2);
        assert_eq!(renderer.label_count(), 2);
    }

    #[test]
    fn test_hover_does_not_touch_selection() {
        let (mut renderer, store) = ready_renderer();
        let palette = Palette::default();

        assert!(renderer.pointer_move(IN_A.0, IN_A.1));
        assert_eq!(renderer.hovered(), Some(0));
        assert_eq!(renderer.surface().cursor(), CursorIcon::Pointer);
        assert_eq!(renderer.shape_style(0), Some(palette.resolve(false, true)));
        assert_eq!(store.current(), None);

        // same shape again: nothing changes
        assert!(!renderer.pointer_move(IN_A.0, IN_A.1));

        assert!(renderer.pointer_move(IN_B.0, IN_B.1));
        assert_eq!(renderer.hovered(), Some(1));
        assert_eq!(renderer.shape_style(0), Some(palette.base(false)));
        assert_eq!(renderer.shape_style(1), Some(palette.resolve(false, true)));

        renderer.pointer_move(OUTSIDE.0, OUTSIDE.1);
        assert_eq!(renderer.hovered(), None);
        assert_eq!(renderer.surface().cursor(), CursorIcon::Default);
        assert_eq!(renderer.shape_style(1), Some(palette.base(false)));
    }

    #[test]
    fn test_hover_reverts_to_selected_base() {
        let (mut renderer, _store) = ready_renderer();
        let palette = Palette::default();

        renderer.pointer_move(IN_A.0, IN_A.1);
        renderer.click(IN_A.0, IN_A.1);
        assert_eq!(renderer.shape_style(0), Some(palette.resolve(true, true)));

        renderer.pointer_exit();
        assert_eq!(renderer.shape_style(0), Some(palette.base(true)));
        assert_eq!(renderer.surface().pointer(), None);
    }

    #[test]
    fn test_events_ignored_before_ready() {
        let mut renderer = MapRenderer::new(Surface::new(AREA), DEFAULT_MAX_ZOOM, Palette::default());
        assert!(!renderer.pointer_move(IN_A.0, IN_A.1));
        assert_eq!(renderer.click(IN_A.0, IN_A.1), None);
        assert!(!renderer.dispatch(0, PointerEvent::Click));
        assert_eq!(renderer.handler_count(), 0);
    }

    #[test]
    fn test_initialize_twice_rejected() {
        let (mut renderer, store) = ready_renderer();
        assert_eq!(
            renderer.initialize(dataset(TWO_REGIONS), store),
            Err(RenderError::InvalidState(RendererState::Ready))
        );
        assert_eq!(renderer.shape_count(), 2);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let mut renderer = MapRenderer::new(Surface::new(AREA), DEFAULT_MAX_ZOOM, Palette::default());
        let empty = Rc::new(BoundaryDataset::default());
        assert_eq!(
            renderer.initialize(empty, Rc::new(SelectionStore::new())),
            Err(RenderError::EmptyDataset)
        );
        assert_eq!(renderer.state(), RendererState::Uninitialized);
    }

    #[test]
    fn test_destroy_twice_releases_everything() {
        let (mut renderer, store) = ready_renderer();
        renderer.pointer_move(IN_A.0, IN_A.1);
        renderer.destroy();
        renderer.destroy();
        assert_eq!(renderer.state(), RendererState::Destroyed);
        assert_eq!(renderer.handler_count(), 0);
        assert_eq!(renderer.shape_count(), 0);
        assert_eq!(store.listener_count(), 0);
        assert!(renderer.viewport().is_none());
        assert_eq!(renderer.surface().cursor(), CursorIcon::Default);

        // store keeps working with nobody listening
        store.toggle("A");
        assert_eq!(renderer.click(IN_A.0, IN_A.1), None);
    }

    #[test]
    fn test_drop_detaches_listener() {
        let (renderer, store) = ready_renderer();
        drop(renderer);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_fit_respects_max_zoom() {
        let store = Rc::new(SelectionStore::new());
        let mut renderer = MapRenderer::new(Surface::new(AREA), 2.0, Palette::default());
        renderer.initialize(dataset(TWO_REGIONS), store).unwrap();
        assert_eq!(renderer.viewport().unwrap().zoom, 2.0);

        let (renderer, _store) = ready_renderer();
        let vp = renderer.viewport().unwrap();
        assert!((vp.scale() - 20.0).abs() < 1e-9);
        assert_eq!(vp.center, DVec2::new(2.0, 2.0));
    }

    #[test]
    fn test_resize_refits() {
        let (mut renderer, _store) = ready_renderer();
        renderer.resize(Rect::new(0, 0, 80, 40));
        let vp = renderer.viewport().unwrap();
        assert_eq!((vp.width, vp.height), (160, 160));
        assert!((vp.scale() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_fill_and_labels() {
        let (mut renderer, _store) = ready_renderer();
        let palette = Palette::default();

        let mut buf = Buffer::empty(AREA);
        (&renderer).render(AREA, &mut buf);
        assert_eq!(buf[FILL_A].bg, palette.base(false).composited_fill());
        assert_eq!(buf[OUTSIDE].bg, Color::Reset);
        // anchors (0.8, 0.8) and (1, 1) land on rows 16 and 15
        assert!(row_text(&buf, 16).contains("Alpha"));
        assert!(row_text(&buf, 15).contains("Beta"));

        renderer.click(IN_B.0, IN_B.1);
        let mut buf = Buffer::empty(AREA);
        (&renderer).render(AREA, &mut buf);
        assert_eq!(buf[IN_B].bg, palette.base(true).composited_fill());
    }

    #[test]
    fn test_render_cursor_marker_while_hovering() {
        let (mut renderer, _store) = ready_renderer();
        renderer.pointer_move(IN_B.0, IN_B.1);
        let mut buf = Buffer::empty(AREA);
        (&renderer).render(AREA, &mut buf);
        assert_eq!(buf[IN_B].symbol(), CURSOR_GLYPH.to_string());
    }

    #[test]
    fn test_far_off_label_is_skipped_not_wrapped() {
        let (mut renderer, _store) = ready_renderer();
        // Anchors project past u16::MAX columns; a truncating cast would wrap
        // them back to about column 10
        renderer.viewport = Some(Viewport::new(DVec2::new(-131_051.2, -19.2), 0.0, 80, 80));

        let mut buf = Buffer::empty(AREA);
        (&renderer).render(AREA, &mut buf);
        for row in 0..AREA.height {
            let text = row_text(&buf, row);
            assert!(!text.contains("Alpha"), "row {row}: {text}");
            assert!(!text.contains("Beta"), "row {row}: {text}");
        }
    }

    #[test]
    fn test_render_after_destroy_draws_nothing() {
        let (mut renderer, _store) = ready_renderer();
        renderer.destroy();
        let mut buf = Buffer::empty(AREA);
        (&renderer).render(AREA, &mut buf);
        assert_eq!(buf, Buffer::empty(AREA));
    }
}
