use crate::index::{IndexError, RowIndex};
use crate::options::ViewerOptions;
use crate::populate::populate;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use xmlview_core::{
    DetailView, Document, DocumentSource, ErrorView, FileSystemSource, Node, ParseError, RowId,
    TreeWidget,
};

const SLOW_LOAD_MS: u128 = 500;
const IN_MEMORY_ORIGIN: &str = "<memory>";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open document '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open document '{origin}': {source}")]
    Parse {
        origin: String,
        #[source]
        source: ParseError,
    },
    #[error("failed to open document: {0}")]
    Populate(#[from] IndexError),
    #[error("failed to open document: another document is still loading")]
    Busy,
}

/// Coarse lifecycle of a [`Viewer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerStatus {
    Empty,
    Loading,
    Loaded,
}

#[derive(Debug)]
struct Loaded {
    document: Document,
    index: RowIndex,
    path: Option<PathBuf>,
}

#[derive(Debug)]
enum ViewerState {
    Empty,
    Loading,
    Loaded(Loaded),
}

/// Binds a parsed document to a tree widget and routes row selections to a
/// detail view.
///
/// All operations take `&self`. The internal state lock is never held while
/// a collaborator is called, so widgets that call back into the viewer from
/// `insert_row` see a consistent `Loading` state instead of deadlocking.
pub struct Viewer {
    widget: Arc<dyn TreeWidget>,
    detail: Arc<dyn DetailView>,
    errors: Arc<dyn ErrorView>,
    source: Arc<dyn DocumentSource>,
    options: ViewerOptions,
    state: Mutex<ViewerState>,
}

impl Viewer {
    /// Creates an empty viewer that reads documents from the file system.
    pub fn new(
        widget: Arc<dyn TreeWidget>,
        detail: Arc<dyn DetailView>,
        errors: Arc<dyn ErrorView>,
    ) -> Self {
        Self {
            widget,
            detail,
            errors,
            source: Arc::new(FileSystemSource),
            options: ViewerOptions::default(),
            state: Mutex::new(ViewerState::Empty),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn DocumentSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_options(mut self, options: ViewerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    /// Reads, parses and renders the document at `path`.
    ///
    /// On failure the error view receives one message and the previously
    /// loaded document (if any) stays current and selectable.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        self.load(Some(path), || {
            let bytes = self
                .source
                .read(path)
                .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
            Document::from_bytes(&bytes)
                .map_err(|source| LoadError::Parse { origin: path.display().to_string(), source })
        })
    }

    /// Same as [`Viewer::open`] for markup that is already in memory.
    pub fn load_str(&self, markup: &str) -> Result<(), LoadError> {
        self.load(None, || {
            Document::parse(markup)
                .map_err(|source| LoadError::Parse { origin: IN_MEMORY_ORIGIN.to_owned(), source })
        })
    }

    /// Shows the item bound to `row` in the detail view and returns the
    /// element behind it. Comment and declaration rows are shown with an
    /// empty name and return `None`.
    ///
    /// Rows that are not bound in the current document are ignored, as are
    /// selections while nothing is loaded or a load is in progress.
    pub fn on_select(&self, row: RowId) -> Option<Arc<Node>> {
        let resolved = match &*self.lock_state() {
            ViewerState::Loaded(loaded) => loaded.index.target(row).cloned(),
            ViewerState::Loading => {
                debug!(%row, "selection ignored while a document is loading");
                return None;
            }
            ViewerState::Empty => {
                debug!(%row, "selection ignored, no document loaded");
                return None;
            }
        };

        match resolved {
            Ok(target) => {
                debug!(%row, name = target.name(), element = target.element().is_some(), "row selected");
                self.detail.show_detail(target.name(), target.text());
                target.element().cloned()
            }
            Err(err) => {
                debug!(%err, "selection ignored");
                None
            }
        }
    }

    /// Drops the current document and removes all rows from the widget.
    pub fn clear(&self) {
        {
            let mut state = self.lock_state();
            if matches!(*state, ViewerState::Loading) {
                warn!("clear ignored while a document is loading");
                return;
            }
            *state = ViewerState::Empty;
        }
        self.widget.clear_rows();
        debug!("viewer cleared");
    }

    pub fn status(&self) -> ViewerStatus {
        match *self.lock_state() {
            ViewerState::Empty => ViewerStatus::Empty,
            ViewerState::Loading => ViewerStatus::Loading,
            ViewerState::Loaded(_) => ViewerStatus::Loaded,
        }
    }

    /// The current document. Cloning shares the underlying node tree.
    pub fn document(&self) -> Option<Document> {
        match &*self.lock_state() {
            ViewerState::Loaded(loaded) => Some(loaded.document.clone()),
            _ => None,
        }
    }

    /// Path of the current document, `None` when it came from [`Viewer::load_str`].
    pub fn current_path(&self) -> Option<PathBuf> {
        match &*self.lock_state() {
            ViewerState::Loaded(loaded) => loaded.path.clone(),
            _ => None,
        }
    }

    pub fn row_for(&self, node: &Arc<Node>) -> Option<RowId> {
        match &*self.lock_state() {
            ViewerState::Loaded(loaded) => loaded.index.row_for(node),
            _ => None,
        }
    }

    /// Bound rows, comment and declaration rows included.
    pub fn row_count(&self) -> usize {
        match &*self.lock_state() {
            ViewerState::Loaded(loaded) => loaded.index.len(),
            _ => 0,
        }
    }

    /// Element rows of the current document with their nodes, in insertion
    /// order.
    pub fn rows(&self) -> Vec<(RowId, Arc<Node>)> {
        match &*self.lock_state() {
            ViewerState::Loaded(loaded) => loaded
                .index
                .entries()
                .filter_map(|(row, target)| target.element().map(|node| (row, Arc::clone(node))))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn load(
        &self,
        path: Option<&Path>,
        produce: impl FnOnce() -> Result<Document, LoadError>,
    ) -> Result<(), LoadError> {
        let started = Instant::now();
        let origin = path.map_or_else(|| IN_MEMORY_ORIGIN.to_owned(), |p| p.display().to_string());
        let previous = {
            let mut state = self.lock_state();
            if matches!(*state, ViewerState::Loading) {
                warn!(origin = origin.as_str(), "load rejected, another document is still loading");
                return Err(LoadError::Busy);
            }
            std::mem::replace(&mut *state, ViewerState::Loading)
        };
        debug!(origin = origin.as_str(), "loading document");
        let mut guard = LoadGuard { viewer: self, fallback: Some(previous) };

        let document = match produce() {
            Ok(document) => document,
            Err(err) => return Err(self.fail(guard.disarm(), err)),
        };

        // once the widget is cleared the previous rows are gone
        let previous = guard.replace_fallback(ViewerState::Empty);
        self.widget.clear_rows();
        let index = match populate(&document, self.widget.as_ref(), &self.options) {
            Ok(index) => index,
            Err(err) => {
                let restored = self.restore(previous);
                guard.disarm();
                return Err(self.fail(restored, LoadError::Populate(err)));
            }
        };

        let nodes = document.node_count();
        let rows = index.len();
        guard.disarm();
        *self.lock_state() =
            ViewerState::Loaded(Loaded { document, index, path: path.map(Path::to_path_buf) });

        let elapsed_ms = started.elapsed().as_millis();
        info!(origin = origin.as_str(), nodes, rows, elapsed_ms, "document loaded");
        if elapsed_ms > SLOW_LOAD_MS {
            warn!(origin = origin.as_str(), nodes, elapsed_ms, "slow document load");
        }
        Ok(())
    }

    /// Puts `restored` back as the current state and reports `error`.
    fn fail(&self, restored: ViewerState, error: LoadError) -> LoadError {
        warn!(%error, "document load failed");
        *self.lock_state() = restored;
        self.errors.show_error(&error.to_string());
        error
    }

    /// Re-renders the previous document after a failed populate left the
    /// widget with a partial tree.
    fn restore(&self, previous: ViewerState) -> ViewerState {
        self.widget.clear_rows();
        let ViewerState::Loaded(mut loaded) = previous else {
            return ViewerState::Empty;
        };
        match populate(&loaded.document, self.widget.as_ref(), &self.options) {
            Ok(index) => {
                loaded.index = index;
                ViewerState::Loaded(loaded)
            }
            Err(err) => {
                error!(%err, "previous document could not be restored");
                self.widget.clear_rows();
                ViewerState::Empty
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ViewerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resets the viewer out of `Loading` when a load unwinds, e.g. because a
/// collaborator panicked.
struct LoadGuard<'v> {
    viewer: &'v Viewer,
    fallback: Option<ViewerState>,
}

impl LoadGuard<'_> {
    fn replace_fallback(&mut self, state: ViewerState) -> ViewerState {
        self.fallback.replace(state).unwrap_or(ViewerState::Empty)
    }

    fn disarm(mut self) -> ViewerState {
        self.fallback.take().unwrap_or(ViewerState::Empty)
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.fallback.take() {
            error!("document load aborted");
            *self.viewer.lock_state() = state;
        }
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("options", &self.options)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
