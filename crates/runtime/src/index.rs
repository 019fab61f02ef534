use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use xmlview_core::{Misc, Node, RowId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("row {0} is already bound")]
    DuplicateRow(RowId),
    #[error("no node bound to row {0}")]
    UnknownRow(RowId),
    #[error("row {0} is bound to a comment or declaration, not an element")]
    NotAnElement(RowId),
    #[error("element <{name}> (document position {order}) is already bound to row {row}")]
    NodeAlreadyBound { name: String, order: usize, row: RowId },
}

/// What a row stands for: an element, or one of the comments and
/// declarations inside an element.
#[derive(Debug, Clone)]
pub enum RowTarget {
    Element(Arc<Node>),
    Misc { owner: Arc<Node>, index: usize },
}

impl RowTarget {
    pub fn element(&self) -> Option<&Arc<Node>> {
        match self {
            RowTarget::Element(node) => Some(node),
            RowTarget::Misc { .. } => None,
        }
    }

    pub fn misc(&self) -> Option<&Misc> {
        match self {
            RowTarget::Element(_) => None,
            RowTarget::Misc { owner, index } => owner.misc().get(*index),
        }
    }

    /// Tag name of an element; empty for comments and declarations.
    pub fn name(&self) -> &str {
        match self {
            RowTarget::Element(node) => node.name(),
            RowTarget::Misc { .. } => "",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            RowTarget::Element(node) => node.text(),
            RowTarget::Misc { .. } => self.misc().map_or("", Misc::text),
        }
    }

    fn key(&self) -> TargetKey {
        match self {
            RowTarget::Element(node) => (Arc::as_ptr(node).addr(), None),
            RowTarget::Misc { owner, index } => (Arc::as_ptr(owner).addr(), Some(*index)),
        }
    }
}

/// Node address plus the misc position. Addresses stay unique while the
/// index keeps its nodes alive.
type TargetKey = (usize, Option<usize>);

/// Mapping between widget rows and document nodes.
///
/// The index holds strong references to the nodes it maps, so an entry can
/// never outlive its node. It belongs to exactly one document and is
/// rebuilt from scratch for every load.
#[derive(Debug, Default, Clone)]
pub struct RowIndex {
    targets: HashMap<RowId, RowTarget>,
    rows: HashMap<TargetKey, RowId>,
    bound: Vec<RowId>,
}

impl RowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            targets: HashMap::with_capacity(capacity),
            rows: HashMap::with_capacity(capacity),
            bound: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.targets.clear();
        self.rows.clear();
        self.bound.clear();
    }

    /// Registers `row` for `node`. Both sides must be unbound.
    pub fn bind(&mut self, row: RowId, node: Arc<Node>) -> Result<(), IndexError> {
        self.insert(row, RowTarget::Element(node))
    }

    /// Registers `row` for the `index`-th comment or declaration of `owner`.
    pub fn bind_misc(&mut self, row: RowId, owner: Arc<Node>, index: usize) -> Result<(), IndexError> {
        self.insert(row, RowTarget::Misc { owner, index })
    }

    fn insert(&mut self, row: RowId, target: RowTarget) -> Result<(), IndexError> {
        if self.targets.contains_key(&row) {
            return Err(IndexError::DuplicateRow(row));
        }
        let key = target.key();
        if let Some(existing) = self.rows.get(&key) {
            let (RowTarget::Element(node) | RowTarget::Misc { owner: node, .. }) = &target;
            return Err(IndexError::NodeAlreadyBound {
                name: node.name().to_owned(),
                order: node.order(),
                row: *existing,
            });
        }
        self.rows.insert(key, row);
        self.targets.insert(row, target);
        self.bound.push(row);
        Ok(())
    }

    /// The element bound to `row`.
    pub fn resolve(&self, row: RowId) -> Result<Arc<Node>, IndexError> {
        self.target(row)?.element().map(Arc::clone).ok_or(IndexError::NotAnElement(row))
    }

    pub fn target(&self, row: RowId) -> Result<&RowTarget, IndexError> {
        self.targets.get(&row).ok_or(IndexError::UnknownRow(row))
    }

    /// Reverse lookup by node identity. Nodes of other documents are never
    /// matched, even if they sit at the same document position.
    pub fn row_for(&self, node: &Arc<Node>) -> Option<RowId> {
        let row = self.rows.get(&(Arc::as_ptr(node).addr(), None))?;
        let bound = self.targets.get(row)?.element()?;
        Arc::ptr_eq(bound, node).then_some(*row)
    }

    pub fn contains_row(&self, row: RowId) -> bool {
        self.targets.contains_key(&row)
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Bound rows in binding order.
    pub fn rows(&self) -> impl Iterator<Item = RowId> + '_ {
        self.bound.iter().copied()
    }

    /// Bound rows with their targets, in binding order.
    pub fn entries(&self) -> impl Iterator<Item = (RowId, &RowTarget)> + '_ {
        self.bound.iter().filter_map(|row| self.targets.get(row).map(|target| (*row, target)))
    }
}
