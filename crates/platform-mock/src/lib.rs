//! In-memory collaborators for driving an xmlview viewer in tests.
//!
//! Every mock records what it was asked to do so tests can assert on the
//! exact sequence of widget rows, detail updates and error messages.

mod display;
mod source;
mod widget;

pub use display::{MockDetailView, MockErrorView};
pub use source::MockDocumentSource;
pub use widget::{MockRow, MockTreeWidget};
