use super::Document;
use super::node::{Content, Misc, MiscKind, Node};
use quick_xml::escape::escape;
use std::fmt::Write;

impl Node {
    /// Serializes the element and its subtree as compact markup.
    ///
    /// Own text is written before the children, so mixed content comes back
    /// with the same `text()` but not with its original interleaving.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        write_tree(&mut out, self, None);
        out
    }

    /// Like [`Node::to_xml`] but puts child elements on indented lines.
    /// Elements that carry own text keep their children inline so that the
    /// indentation does not become part of the text.
    pub fn to_xml_pretty(&self, indent: usize) -> String {
        let mut out = String::new();
        write_tree(&mut out, self, Some(indent));
        out
    }
}

impl Document {
    pub fn to_xml(&self) -> String {
        self.root().to_xml()
    }

    pub fn to_xml_pretty(&self, indent: usize) -> String {
        self.root().to_xml_pretty(indent)
    }
}

/// `level` is the indentation level of an item, `None` when it is written
/// inline.
enum Step<'a> {
    Open(&'a Node, Option<usize>),
    Misc(&'a Misc, Option<usize>),
    Close(&'a Node, Option<usize>),
}

fn write_tree(out: &mut String, root: &Node, indent: Option<usize>) {
    let mut steps = vec![Step::Open(root, indent.map(|_| 0))];
    while let Some(step) = steps.pop() {
        match step {
            Step::Open(node, level) => {
                start_line(out, indent, level);
                out.push('<');
                out.push_str(node.name());
                for attribute in node.attributes() {
                    let _ = write!(out, " {}=\"{}\"", attribute.name(), escape(attribute.value()));
                }
                if node.text().is_empty() && !has_content(node) {
                    out.push_str("/>");
                    continue;
                }
                out.push('>');
                out.push_str(&escape(node.text()));

                let inner = level.filter(|_| node.text().is_empty()).map(|level| level + 1);
                steps.push(Step::Close(node, inner));
                let content: Vec<Content<'_>> = node.content().collect();
                steps.extend(content.into_iter().rev().map(|item| match item {
                    Content::Element(child) => Step::Open(child, inner),
                    Content::Misc(_, misc) => Step::Misc(misc, inner),
                }));
            }
            Step::Misc(misc, level) => {
                start_line(out, indent, level);
                let _ = match misc.kind() {
                    MiscKind::Comment => write!(out, "<!--{}-->", misc.text()),
                    MiscKind::Declaration => write!(out, "<?{}?>", misc.text()),
                };
            }
            Step::Close(node, inner) => {
                if let (Some(indent), Some(level)) = (indent, inner)
                    && has_content(node)
                {
                    push_line(out, indent * (level - 1));
                }
                let _ = write!(out, "</{}>", node.name());
            }
        }
    }
}

fn has_content(node: &Node) -> bool {
    node.has_children() || !node.misc().is_empty()
}

fn start_line(out: &mut String, indent: Option<usize>, level: Option<usize>) {
    if let (Some(indent), Some(level)) = (indent, level)
        && level > 0
    {
        push_line(out, indent * level);
    }
}

fn push_line(out: &mut String, width: usize) {
    out.push('\n');
    out.extend(std::iter::repeat_n(' ', width));
}

#[cfg(test)]
mod tests {
    use crate::document::{Document, NodeSpec};
    use rstest::rstest;

    #[rstest]
    fn compact_output_escapes_text_and_attributes() {
        let document = Document::from_spec(
            NodeSpec::new("r")
                .with_attribute(("q", "a\"<b>&"))
                .with_child(NodeSpec::new("t").with_text("1 < 2 & 3"))
                .with_child(NodeSpec::new("e")),
        );
        assert_eq!(
            document.to_xml(),
            "<r q=\"a&quot;&lt;b&gt;&amp;\"><t>1 &lt; 2 &amp; 3</t><e/></r>"
        );
    }

    #[rstest]
    fn pretty_output_indents_element_only_content() {
        let document = Document::parse("<r><a><b>x</b></a><c/></r>").expect("ok");
        assert_eq!(document.to_xml_pretty(2), "<r>\n  <a>\n    <b>x</b>\n  </a>\n  <c/>\n</r>");
    }

    #[rstest]
    fn comments_are_written_in_place() {
        let document = Document::parse("<r><!--a--><x/><!-- b --></r>").expect("ok");
        assert_eq!(document.to_xml(), "<r><!--a--><x/><!-- b --></r>");
        assert_eq!(document.to_xml_pretty(2), "<r>\n  <!--a-->\n  <x/>\n  <!-- b -->\n</r>");
    }

    #[rstest]
    #[case("<root><a>hello</a><b/></root>")]
    #[case("<catalog v=\"1\"><book id=\"b1\" id=\"b2\"><title>Dune &amp; more</title></book></catalog>")]
    #[case("<r>lead<x>inner</x>tail<y a=\"&lt;&gt;\"/></r>")]
    #[case("<p:r xmlns:p=\"urn:p\"><![CDATA[<raw>]]><p:c/></p:r>")]
    #[case("<r><!-- lead --><a>x<!--in--></a>mid<!--tail--></r>")]
    fn reparsing_serialized_output_preserves_structure(#[case] source: &str) {
        let original = Document::parse(source).expect("well-formed");
        let compact = Document::parse(&original.to_xml()).expect("compact output parses");
        let pretty = Document::parse(&original.to_xml_pretty(4)).expect("pretty output parses");
        assert_eq!(compact, original);
        assert_eq!(pretty, original);
    }
}
