use crate::util::CliResult;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use xmlview_core::{DetailView, ErrorView, RowId, TreeWidget};
use xmlview_runtime::{Viewer, ViewerOptions};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ConsoleRow {
    pub id: u64,
    pub parent: Option<u64>,
    pub depth: usize,
    pub label: String,
}

/// Row buffer standing in for a tree widget. Ids start at 1.
#[derive(Debug)]
pub struct ConsoleTree {
    state: Mutex<TreeState>,
}

#[derive(Debug)]
struct TreeState {
    rows: Vec<ConsoleRow>,
    depths: HashMap<u64, usize>,
    next_id: u64,
}

impl Default for ConsoleTree {
    fn default() -> Self {
        Self { state: Mutex::new(TreeState { rows: Vec::new(), depths: HashMap::new(), next_id: 1 }) }
    }
}

impl ConsoleTree {
    pub fn rows(&self) -> Vec<ConsoleRow> {
        lock(&self.state).rows.clone()
    }

    pub fn label(&self, id: u64) -> Option<String> {
        lock(&self.state).rows.iter().find(|row| row.id == id).map(|row| row.label.clone())
    }
}

impl TreeWidget for ConsoleTree {
    fn clear_rows(&self) {
        let mut state = lock(&self.state);
        state.rows.clear();
        state.depths.clear();
    }

    fn insert_row(&self, parent: Option<RowId>, label: &str) -> RowId {
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        let parent = parent.map(RowId::get);
        let depth = parent.and_then(|parent| state.depths.get(&parent)).map_or(0, |depth| depth + 1);
        state.depths.insert(id, depth);
        state.rows.push(ConsoleRow { id, parent, depth, label: label.to_owned() });
        RowId::new(id)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ConsoleDetail {
    pub name: String,
    pub text: String,
}

/// Collects detail updates in the order they were shown.
#[derive(Debug, Default)]
pub struct ConsoleDetails {
    shown: Mutex<Vec<ConsoleDetail>>,
}

impl ConsoleDetails {
    pub fn take(&self) -> Vec<ConsoleDetail> {
        lock(&self.shown).drain(..).collect()
    }
}

impl DetailView for ConsoleDetails {
    fn show_detail(&self, name: &str, text: &str) {
        lock(&self.shown).push(ConsoleDetail { name: name.to_owned(), text: text.to_owned() });
    }
}

/// Prints error messages to stderr. This is the only place a failed load
/// is reported to the user.
#[derive(Debug, Default)]
pub struct ConsoleErrors;

impl ErrorView for ConsoleErrors {
    fn show_error(&self, message: &str) {
        let prefix = "error:".if_supports_color(Stream::Stderr, |t| t.bold().red().to_string());
        eprintln!("{prefix} {message}");
    }
}

/// A viewer wired to the console collaborators.
pub struct ConsoleSession {
    pub viewer: Viewer,
    pub tree: Arc<ConsoleTree>,
    pub details: Arc<ConsoleDetails>,
}

impl ConsoleSession {
    pub fn new(options: ViewerOptions) -> Self {
        let tree = Arc::new(ConsoleTree::default());
        let details = Arc::new(ConsoleDetails::default());
        let viewer =
            Viewer::new(tree.clone(), details.clone(), Arc::new(ConsoleErrors)).with_options(options);
        Self { viewer, tree, details }
    }

    pub fn open(path: &Path, options: ViewerOptions) -> CliResult<Self> {
        let session = Self::new(options);
        session.viewer.open(path)?;
        Ok(session)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
