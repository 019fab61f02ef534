//! Immutable in-memory XML document model.

mod error;
mod node;
mod parser;
mod serialize;

pub use error::{NodeError, ParseError, TextPosition};
pub use node::{Attribute, Content, Descendants, Misc, MiscKind, Node, NodeSpec};
pub use parser::{MAX_NESTING, parse};

use std::sync::Arc;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A loaded document: exactly one root element and the tree below it.
///
/// Cloning is cheap and shares the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    root: Arc<Node>,
    node_count: usize,
}

impl Document {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        parser::parse(source)
    }

    /// Parses raw file content. The bytes must be UTF-8; a leading byte
    /// order mark is skipped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(source) => parser::parse(source),
            Err(err) => {
                let valid = std::str::from_utf8(&bytes[..err.valid_up_to()]).unwrap_or_default();
                Err(ParseError::new(
                    TextPosition::locate(valid, err.valid_up_to()),
                    format!("document is not valid UTF-8: {err}"),
                ))
            }
        }
    }

    /// Builds a document from an element description without going through
    /// markup.
    pub fn from_spec(root: NodeSpec) -> Self {
        let node_count = root.node_count();
        Self { root: root.freeze(), node_count }
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Number of elements in the document, the root included.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// All elements in document order, root first.
    pub fn descendants(&self) -> Descendants<'_> {
        self.root.descendants()
    }

    /// Returns true when `node` belongs to this document's tree (identity,
    /// not structural equality).
    pub fn contains(&self, node: &Arc<Node>) -> bool {
        let mut current = Arc::clone(node);
        while let Some(parent) = current.parent() {
            current = parent;
        }
        Arc::ptr_eq(&current, &self.root)
    }
}
