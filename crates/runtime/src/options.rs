use xmlview_core::{Misc, MiscKind, Node};

/// Presentation settings for a [`Viewer`](crate::Viewer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewerOptions {
    show_root: bool,
    show_comments: bool,
    show_declarations: bool,
    label_attribute: Option<String>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self { show_root: true, show_comments: false, show_declarations: false, label_attribute: None }
    }
}

impl ViewerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// When disabled, the root element gets no row and its children are
    /// rendered as top-level rows.
    pub fn with_show_root(mut self, show_root: bool) -> Self {
        self.show_root = show_root;
        self
    }

    /// Renders comments inside elements as `[comment]` rows.
    pub fn with_show_comments(mut self, show_comments: bool) -> Self {
        self.show_comments = show_comments;
        self
    }

    /// Renders processing instructions inside elements as `[declaration]` rows.
    pub fn with_show_declarations(mut self, show_declarations: bool) -> Self {
        self.show_declarations = show_declarations;
        self
    }

    /// Appends the value of this attribute to row labels, e.g. `item "42"`.
    pub fn with_label_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.label_attribute = Some(attribute.into());
        self
    }

    pub fn show_root(&self) -> bool {
        self.show_root
    }

    pub fn show_comments(&self) -> bool {
        self.show_comments
    }

    pub fn show_declarations(&self) -> bool {
        self.show_declarations
    }

    pub(crate) fn shows(&self, kind: MiscKind) -> bool {
        match kind {
            MiscKind::Comment => self.show_comments,
            MiscKind::Declaration => self.show_declarations,
        }
    }

    pub fn label_attribute(&self) -> Option<&str> {
        self.label_attribute.as_deref()
    }

    pub(crate) fn row_label(&self, node: &Node) -> String {
        match self.label_attribute().and_then(|key| node.attribute(key)) {
            Some(value) if !value.is_empty() => format!("{} \"{}\"", node.name(), value),
            _ => node.name().to_owned(),
        }
    }

    pub(crate) fn misc_label(misc: &Misc) -> &'static str {
        match misc.kind() {
            MiscKind::Comment => "[comment]",
            MiscKind::Declaration => "[declaration]",
        }
    }
}
