/// Sink for the details of the selected node.
pub trait DetailView: Send + Sync {
    fn show_detail(&self, name: &str, text: &str);
}

/// User-facing error display. Receives the rendered message of a failed
/// load, e.g. `failed to open document 'a.xml': ...`.
pub trait ErrorView: Send + Sync {
    fn show_error(&self, message: &str);
}
