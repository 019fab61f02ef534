//! Core types for xmlview.
//!
//! The crate holds the immutable XML document model ([`Document`], [`Node`])
//! and the collaborator traits the viewer runtime talks to: the tree widget
//! that renders rows, the detail and error displays, and the source that
//! supplies document bytes.

pub mod document;
pub mod view;

pub use document::{
    Attribute, Content, Descendants, Document, MAX_NESTING, Misc, MiscKind, Node, NodeError, NodeSpec,
    ParseError, TextPosition, parse,
};
pub use view::{DetailView, DocumentSource, ErrorView, FileSystemSource, RowId, TreeWidget};
