use std::fmt;
use std::sync::Mutex;
use tracing::trace;
use xmlview_core::{RowId, TreeWidget};

type InsertHook = Box<dyn Fn(RowId) + Send + Sync>;

/// A row as the widget recorded it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockRow {
    pub id: RowId,
    pub parent: Option<RowId>,
    pub label: String,
}

#[derive(Debug)]
struct WidgetState {
    rows: Vec<MockRow>,
    next_id: u64,
    clear_calls: usize,
    insert_calls: usize,
    duplicate_at: Option<usize>,
}

/// Tree widget that records inserted rows.
///
/// Ids come from a counter that keeps running across `clear_rows`, so rows
/// of an earlier document never reappear after a reload.
pub struct MockTreeWidget {
    state: Mutex<WidgetState>,
    step: u64,
    on_insert: Option<InsertHook>,
}

impl MockTreeWidget {
    /// Hands out ids 1, 2, 3, ...
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out `start`, `start + step`, `start + 2 * step`, ...
    pub fn with_ids(mut self, start: u64, step: u64) -> Self {
        self.state.get_mut().expect("widget state poisoned").next_id = start;
        self.step = step.max(1);
        self
    }

    /// Runs `hook` after every insertion, outside of the widget's own lock.
    /// Lets tests emulate widgets that fire selection events while rows are
    /// being added.
    pub fn with_insert_hook(mut self, hook: impl Fn(RowId) + Send + Sync + 'static) -> Self {
        self.on_insert = Some(Box::new(hook));
        self
    }

    /// The next insertion that lands at position `at` among the currently
    /// shown rows repeats the id of the row before it. Fires only once.
    pub fn inject_duplicate_once(&self, at: usize) {
        self.lock().duplicate_at = Some(at);
    }

    pub fn rows(&self) -> Vec<MockRow> {
        self.lock().rows.clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.lock().rows.iter().map(|row| row.label.clone()).collect()
    }

    /// First row carrying `label`.
    pub fn find(&self, label: &str) -> Option<RowId> {
        self.lock().rows.iter().find(|row| row.label == label).map(|row| row.id)
    }

    pub fn children_of(&self, parent: Option<RowId>) -> Vec<MockRow> {
        self.lock().rows.iter().filter(|row| row.parent == parent).cloned().collect()
    }

    pub fn clear_count(&self) -> usize {
        self.lock().clear_calls
    }

    /// Total `insert_row` calls since creation, including cleared rows.
    pub fn insert_count(&self) -> usize {
        self.lock().insert_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WidgetState> {
        self.state.lock().expect("widget state poisoned")
    }
}

impl Default for MockTreeWidget {
    fn default() -> Self {
        Self {
            state: Mutex::new(WidgetState {
                rows: Vec::new(),
                next_id: 1,
                clear_calls: 0,
                insert_calls: 0,
                duplicate_at: None,
            }),
            step: 1,
            on_insert: None,
        }
    }
}

impl fmt::Debug for MockTreeWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTreeWidget")
            .field("state", &self.state)
            .field("step", &self.step)
            .field("on_insert", &self.on_insert.is_some())
            .finish()
    }
}

impl TreeWidget for MockTreeWidget {
    fn clear_rows(&self) {
        let mut state = self.lock();
        state.rows.clear();
        state.clear_calls += 1;
    }

    fn insert_row(&self, parent: Option<RowId>, label: &str) -> RowId {
        let id = {
            let mut state = self.lock();
            state.insert_calls += 1;
            let position = state.rows.len();
            let repeat = match (state.duplicate_at, state.rows.last()) {
                (Some(at), Some(last)) if at == position => Some(last.id),
                _ => None,
            };
            let id = match repeat {
                Some(previous) => {
                    state.duplicate_at = None;
                    previous
                }
                None => {
                    let id = RowId::new(state.next_id);
                    state.next_id += self.step;
                    id
                }
            };
            state.rows.push(MockRow { id, parent, label: label.to_owned() });
            id
        };
        trace!(%id, label, "mock row inserted");
        if let Some(hook) = &self.on_insert {
            hook(id);
        }
        id
    }
}
