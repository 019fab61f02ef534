mod index;
mod options;
mod populate;
mod viewer;

#[cfg(test)]
mod test_support;

pub use index::{IndexError, RowIndex, RowTarget};
pub use options::ViewerOptions;
pub use viewer::{LoadError, Viewer, ViewerStatus};
