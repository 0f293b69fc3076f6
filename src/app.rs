use std::io;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use ratatui::layout::Rect;
use tracing::{debug, error, info};

use crate::backdrop::Backdrop;
use crate::data::{BoundaryDataset, DataLoader, LoadError, Region};
use crate::map::{MapRenderer, Palette, Surface};
use crate::selection::SelectionStore;

/// What the host should show for this view
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Error(String),
    Ready,
}

type LoadResult = Result<BoundaryDataset, LoadError>;

/// One mounted map view: load once, then render and route input.
///
/// Dropping the controller is the unmount. It tears the renderer down and
/// closes the result channel, so a load still in flight is discarded when it
/// finishes. `Error` is final; a fresh attempt needs a fresh mount.
pub struct ViewController {
    state: ViewState,
    store: Rc<SelectionStore>,
    renderer: MapRenderer,
    backdrop: Backdrop,
    pending: Option<Receiver<LoadResult>>,
    dataset: Option<Rc<BoundaryDataset>>,
}

impl ViewController {
    /// Start loading in the background and return in `Loading`
    pub fn mount(loader: DataLoader, surface: Surface, backdrop: Backdrop, max_zoom: f64) -> Self {
        let mut view = Self {
            state: ViewState::Loading,
            store: Rc::new(SelectionStore::new()),
            renderer: MapRenderer::new(surface, max_zoom, Palette::default()),
            backdrop,
            pending: None,
            dataset: None,
        };

        let source = loader.describe();
        let (tx, rx) = mpsc::channel();

        match spawn_loader(loader, tx) {
            Ok(_) => {
                info!(%source, "loading region data");
                view.pending = Some(rx);
            }
            Err(e) => {
                error!(error = %e, "could not start loader thread");
                view.state = ViewState::Error(format!("Failed to load region data: {e}"));
            }
        }
        view
    }

    /// Pick up a finished load, if any. Returns true when the state changed.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.pending = None;
                self.apply(result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                error!("loader thread ended without a result");
                self.state = ViewState::Error("Failed to load region data".to_string());
                true
            }
        }
    }

    fn apply(&mut self, result: LoadResult) {
        let dataset = match result {
            Ok(dataset) => Rc::new(dataset),
            Err(e) => {
                error!(error = %e, "region data load failed");
                self.state = ViewState::Error(format!("Failed to load region data: {e}"));
                return;
            }
        };

        match self.renderer.initialize(dataset.clone(), self.store.clone()) {
            Ok(()) => {
                self.dataset = Some(dataset);
                self.state = ViewState::Ready;
            }
            Err(e) => {
                error!(error = %e, "map could not be initialised");
                self.state = ViewState::Error(format!("Failed to load region data: {e}"));
            }
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn renderer(&self) -> &MapRenderer {
        &self.renderer
    }

    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }

    pub fn store(&self) -> &Rc<SelectionStore> {
        &self.store
    }

    pub fn region_count(&self) -> usize {
        self.dataset.as_ref().map_or(0, |d| d.len())
    }

    pub fn selected_region(&self) -> Option<&Region> {
        let code = self.store.current()?;
        self.dataset.as_ref()?.find(&code)
    }

    pub fn hovered_region(&self) -> Option<&Region> {
        let idx = self.renderer.hovered()?;
        self.dataset.as_ref()?.get(idx)
    }

    pub fn pointer_move(&mut self, col: u16, row: u16) -> bool {
        self.renderer.pointer_move(col, row)
    }

    pub fn pointer_exit(&mut self) {
        self.renderer.pointer_exit();
    }

    pub fn click(&mut self, col: u16, row: u16) -> Option<String> {
        self.renderer.click(col, row)
    }

    pub fn resize(&mut self, area: Rect) {
        self.renderer.resize(area);
    }

    /// Explicit unmount; same as dropping the controller
    pub fn unmount(self) {}

    /// Block until the load settles or `timeout` passes
    #[cfg(test)]
    pub fn settle(&mut self, timeout: std::time::Duration) -> &ViewState {
        let deadline = std::time::Instant::now() + timeout;
        while self.state == ViewState::Loading && std::time::Instant::now() < deadline {
            if !self.poll() {
                thread::sleep(std::time::Duration::from_millis(2));
            }
        }
        &self.state
    }
}

/// Run one load on a worker thread. The thread yields false when the receiving
/// view was already gone and the result was discarded.
fn spawn_loader(loader: DataLoader, tx: Sender<LoadResult>) -> io::Result<JoinHandle<bool>> {
    thread::Builder::new()
        .name("dataset-loader".into())
        .spawn(move || {
            let result = loader.load();
            let delivered = tx.send(result).is_ok();
            if !delivered {
                debug!("view unmounted before region data arrived, result discarded");
            }
            delivered
        })
}

impl Drop for ViewController {
    fn drop(&mut self) {
        self.pending.take();
        self.renderer.destroy();
        debug!("view unmounted");
    }
}
