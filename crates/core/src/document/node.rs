use super::error::NodeError;
use std::fmt;
use std::mem;
use std::sync::{Arc, OnceLock, Weak};

/// A single `key="value"` pair in document order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Attribute {
    name: String,
    value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Attribute {
    fn from(value: (K, V)) -> Self {
        Attribute::new(value.0, value.1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MiscKind {
    Comment,
    /// `<?target data?>`, stored without the delimiters.
    Declaration,
}

/// A comment or declaration found inside an element.
///
/// `position` is the number of child elements that precede the item, so
/// `0` means it appears before the first child element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Misc {
    kind: MiscKind,
    text: String,
    position: usize,
}

impl Misc {
    pub fn new(kind: MiscKind, text: impl Into<String>, position: usize) -> Self {
        Self { kind, text: text.into(), position }
    }

    pub fn kind(&self) -> MiscKind {
        self.kind
    }

    /// Comment body, or the declaration content between `<?` and `?>`.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

/// One item of an element's content, see [`Node::content`].
#[derive(Clone, Copy, Debug)]
pub enum Content<'a> {
    Element(&'a Arc<Node>),
    /// The item together with its index in [`Node::misc`].
    Misc(usize, &'a Misc),
}

/// Mutable description of an element used while a tree is being assembled.
///
/// The parser collects `NodeSpec`s and freezes them into [`Node`]s once the
/// whole input was accepted. Tests and callers without markup can build a
/// spec tree directly and pass it to [`Document::from_spec`](super::Document::from_spec).
#[derive(Debug, Default)]
pub struct NodeSpec {
    pub(crate) name: String,
    pub(crate) text: String,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) children: Vec<NodeSpec>,
    pub(crate) misc: Vec<Misc>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        let mut spec = Self::default();
        spec.name = name.into();
        spec
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text.push_str(&text.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<Attribute>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Adds a comment after the children added so far.
    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        self.push_misc(MiscKind::Comment, text);
        self
    }

    pub(crate) fn push_misc(&mut self, kind: MiscKind, text: impl Into<String>) {
        let position = self.children.len();
        self.misc.push(Misc::new(kind, text, position));
    }

    pub(crate) fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(spec) = pending.pop() {
            count += 1;
            pending.extend(&spec.children);
        }
        count
    }

    /// Freezes this builder tree into immutable nodes.
    ///
    /// Orders are handed out when a spec is entered, so a parent always
    /// receives a smaller `order` than any of its descendants. Nodes are
    /// built bottom-up once all of their children are finished.
    pub(crate) fn freeze(self) -> Arc<Node> {
        let mut counter = 1;
        let mut ancestors: Vec<Frame> = Vec::new();
        let mut current = Frame::enter(self, 0, 0);
        loop {
            if let Some(child) = current.pending.next() {
                let depth = current.depth + 1;
                ancestors.push(mem::replace(&mut current, Frame::enter(child, counter, depth)));
                counter += 1;
                continue;
            }
            let node = current.build();
            match ancestors.pop() {
                Some(mut parent) => {
                    parent.built.push(node);
                    current = parent;
                }
                None => return node,
            }
        }
    }
}

impl Drop for NodeSpec {
    fn drop(&mut self) {
        let mut pending = mem::take(&mut self.children);
        while let Some(mut spec) = pending.pop() {
            pending.append(&mut spec.children);
        }
    }
}

struct Frame {
    spec: NodeSpec,
    pending: std::vec::IntoIter<NodeSpec>,
    built: Vec<Arc<Node>>,
    order: usize,
    depth: usize,
}

impl Frame {
    fn enter(mut spec: NodeSpec, order: usize, depth: usize) -> Self {
        let children = mem::take(&mut spec.children);
        let built = Vec::with_capacity(children.len());
        Self { spec, pending: children.into_iter(), built, order, depth }
    }

    fn build(self) -> Arc<Node> {
        let Frame { mut spec, built, order, depth, .. } = self;
        let node = Arc::new(Node {
            name: mem::take(&mut spec.name),
            text: mem::take(&mut spec.text),
            attributes: mem::take(&mut spec.attributes),
            misc: mem::take(&mut spec.misc),
            children: built,
            parent: OnceLock::new(),
            order,
            depth,
        });
        for child in &node.children {
            let _ = child.parent.set(Arc::downgrade(&node));
        }
        node
    }
}

/// One XML element of a loaded document.
///
/// Nodes are immutable once built. Children are owned through `Arc`, the
/// parent link is a `Weak` back-reference used for navigation only.
/// Walking, comparing and dropping a tree never recurses, so the nesting
/// depth is bounded by [`MAX_NESTING`](super::MAX_NESTING) only.
pub struct Node {
    name: String,
    text: String,
    attributes: Vec<Attribute>,
    misc: Vec<Misc>,
    children: Vec<Arc<Node>>,
    parent: OnceLock<Weak<Node>>,
    order: usize,
    depth: usize,
}

impl Node {
    /// Tag name as written in the source, including a namespace prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Concatenated direct text content. Text of nested elements is not
    /// included; the result is empty if the element has no own text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks up an attribute value. When a key occurs more than once the
    /// last occurrence wins.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.iter().rev().find(|attr| attr.name == key).map(Attribute::value)
    }

    pub fn require_attribute(&self, key: &str) -> Result<&str, NodeError> {
        self.attribute(key).ok_or_else(|| NodeError::AttributeNotFound {
            element: self.name.clone(),
            key: key.to_owned(),
        })
    }

    pub fn children(&self) -> &[Arc<Node>] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Comments and declarations inside this element, in document order.
    pub fn misc(&self) -> &[Misc] {
        &self.misc
    }

    /// Child elements interleaved with comments and declarations, in
    /// document order.
    pub fn content(&self) -> impl Iterator<Item = Content<'_>> + '_ {
        let mut child = 0;
        let mut misc = 0;
        std::iter::from_fn(move || {
            if let Some(item) = self.misc.get(misc)
                && (item.position <= child || child == self.children.len())
            {
                misc += 1;
                return Some(Content::Misc(misc - 1, item));
            }
            let element = self.children.get(child)?;
            child += 1;
            Some(Content::Element(element))
        })
    }

    pub fn parent(&self) -> Option<Arc<Node>> {
        self.parent.get().and_then(Weak::upgrade)
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Zero-based position of the element in document (pre-order) order.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Pre-order walk over this node and all of its descendants.
    pub fn descendants(self: &Arc<Self>) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

impl PartialEq for Node {
    /// Structural equality: name, text, attributes, comments and children.
    /// Position in the owning document is not compared.
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if left.name != right.name
                || left.text != right.text
                || left.attributes != right.attributes
                || left.misc != right.misc
                || left.children.len() != right.children.len()
            {
                return false;
            }
            pending.extend(left.children.iter().zip(&right.children).map(|(l, r)| (&**l, &**r)));
        }
        true
    }
}

impl Eq for Node {}

impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            if let Some(mut node) = Arc::into_inner(child) {
                pending.append(&mut node.children);
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("text", &self.text)
            .field("attributes", &self.attributes)
            .field("misc", &self.misc)
            .field("order", &self.order)
            .field("depth", &self.depth)
            .field("children", &self.children.len())
            .finish()
    }
}

/// Iterator returned by [`Node::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Arc<Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Arc<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
