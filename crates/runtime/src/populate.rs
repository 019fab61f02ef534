use crate::index::{IndexError, RowIndex};
use crate::options::ViewerOptions;
use std::sync::Arc;
use tracing::{error, trace};
use xmlview_core::{Content, Document, Node, RowId, TreeWidget};

#[derive(Clone, Copy)]
enum Pending<'a> {
    Element(&'a Arc<Node>),
    Misc(&'a Arc<Node>, usize),
}

/// Inserts one widget row per element, depth-first pre-order in document
/// order, and returns the index binding every inserted row to its node.
/// Comments and declarations get rows in place when the options ask for
/// them.
///
/// A parent row is always inserted before any of its descendants.
pub(crate) fn populate(
    document: &Document,
    widget: &dyn TreeWidget,
    options: &ViewerOptions,
) -> Result<RowIndex, IndexError> {
    let mut index = RowIndex::with_capacity(document.node_count());
    let root = document.root();
    let mut pending: Vec<(Pending<'_>, Option<RowId>)> = Vec::new();
    if options.show_root() {
        pending.push((Pending::Element(root), None));
    } else {
        push_content(&mut pending, root, None, options);
    }

    while let Some((item, parent)) = pending.pop() {
        let (label, owner) = match item {
            Pending::Element(node) => (options.row_label(node), node),
            Pending::Misc(owner, position) => match owner.misc().get(position) {
                Some(misc) => (ViewerOptions::misc_label(misc).to_owned(), owner),
                None => continue,
            },
        };
        let row = widget.insert_row(parent, &label);
        trace!(%row, parent = ?parent.map(RowId::get), label = label.as_str(), "row inserted");
        let bound = match item {
            Pending::Element(node) => index.bind(row, Arc::clone(node)),
            Pending::Misc(owner, position) => index.bind_misc(row, Arc::clone(owner), position),
        };
        if let Err(err) = bound {
            error!(%err, order = owner.order(), "widget returned an inconsistent row id");
            return Err(err);
        }
        if let Pending::Element(node) = item {
            push_content(&mut pending, node, Some(row), options);
        }
    }

    Ok(index)
}

/// Queues the visible content of `node` so that it pops in document order.
fn push_content<'a>(
    pending: &mut Vec<(Pending<'a>, Option<RowId>)>,
    node: &'a Arc<Node>,
    row: Option<RowId>,
    options: &ViewerOptions,
) {
    let start = pending.len();
    pending.extend(node.content().filter_map(|item| match item {
        Content::Element(child) => Some((Pending::Element(child), row)),
        Content::Misc(position, misc) => options.shows(misc.kind()).then_some((Pending::Misc(node, position), row)),
    }));
    pending[start..].reverse();
}
