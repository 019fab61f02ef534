//! Boundary contracts between the viewer runtime and its surroundings.
//!
//! The runtime never touches widget internals, the file system or the
//! display directly; it only talks to these traits. All of them take `&self`
//! so implementations can be shared as `Arc<dyn Trait>` and keep their own
//! interior state.

mod display;
mod source;
mod widget;

pub use display::{DetailView, ErrorView};
pub use source::{DocumentSource, FileSystemSource};
pub use widget::{RowId, TreeWidget};
