use super::Document;
use super::error::{ParseError, TextPosition};
use super::node::{Attribute, MiscKind, NodeSpec};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Nesting limit for elements. Deeper documents are rejected instead of
/// risking stack exhaustion while the tree is frozen or dropped.
pub const MAX_NESTING: usize = 1024;

/// Parses XML markup into a [`Document`].
///
/// The tree is only built when the whole input was accepted; any malformed
/// markup yields a [`ParseError`] and no partial tree.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    let mut reader = Reader::from_str(source);
    let mut builder = TreeBuilder::new(source);

    loop {
        let offset = reader.buffer_position() as usize;
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                return Err(builder.error(reader.error_position() as usize, err.to_string()));
            }
        };
        match event {
            Event::Start(start) => builder.open(&start, offset)?,
            Event::Empty(start) => {
                builder.open(&start, offset)?;
                builder.close(None, offset)?;
            }
            Event::End(end) => builder.close(Some(end.name().as_ref()), offset)?,
            Event::Text(text) => builder.text(&text, offset, true)?,
            Event::CData(data) => builder.text(&data, offset, false)?,
            Event::GeneralRef(reference) => builder.reference(&reference, offset)?,
            Event::Comment(comment) => builder.misc(MiscKind::Comment, &comment, offset)?,
            Event::Decl(_) | Event::PI(_) => {
                let end = reader.buffer_position() as usize;
                builder.declaration(offset, end)?;
            }
            Event::Eof => break,
            // the doctype is not part of the element tree
            _ => {}
        }
    }

    builder.finish(reader.buffer_position() as usize)
}

struct TreeBuilder<'s> {
    source: &'s str,
    open: Vec<NodeSpec>,
    root: Option<NodeSpec>,
    run: String,
    run_start: usize,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        Self { source, open: Vec::new(), root: None, run: String::new(), run_start: 0 }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(TextPosition::locate(self.source, offset), message)
    }

    fn utf8<'b>(&self, bytes: &'b [u8], offset: usize) -> Result<&'b str, ParseError> {
        std::str::from_utf8(bytes).map_err(|err| self.error(offset, err.to_string()))
    }

    fn open(&mut self, start: &BytesStart<'_>, offset: usize) -> Result<(), ParseError> {
        self.flush_run()?;
        let name = self.utf8(start.name().as_ref(), offset)?.to_owned();
        if self.open.is_empty() && self.root.is_some() {
            return Err(self.error(offset, format!("multiple root elements: unexpected <{name}>")));
        }
        if self.open.len() >= MAX_NESTING {
            return Err(self.error(offset, format!("elements nested deeper than {MAX_NESTING}")));
        }

        let mut spec = NodeSpec::new(name);
        let mut attributes = start.attributes();
        attributes.with_checks(false);
        for attribute in attributes {
            let attribute = attribute.map_err(|err| self.error(offset, err.to_string()))?;
            let key = self.utf8(attribute.key.as_ref(), offset)?;
            let raw = self.utf8(&attribute.value, offset)?;
            let value = resolve_references(raw).map_err(|message| self.error(offset, message))?;
            spec.attributes.push(Attribute::new(key, value));
        }
        self.open.push(spec);
        Ok(())
    }

    fn close(&mut self, name: Option<&[u8]>, offset: usize) -> Result<(), ParseError> {
        self.flush_run()?;
        let Some(spec) = self.open.pop() else {
            let name = name.map(String::from_utf8_lossy).unwrap_or_default();
            return Err(self.error(offset, format!("unexpected closing tag </{name}>")));
        };
        if let Some(name) = name
            && name != spec.name.as_bytes()
        {
            let found = String::from_utf8_lossy(name);
            return Err(self.error(
                offset,
                format!("mismatched closing tag: expected </{}>, found </{found}>", spec.name),
            ));
        }
        match self.open.last_mut() {
            Some(parent) => parent.children.push(spec),
            None => self.root = Some(spec),
        }
        Ok(())
    }

    /// Appends character data to the current text run. `escaped` is false
    /// for CDATA sections, whose content is taken literally.
    fn text(&mut self, raw: &[u8], offset: usize, escaped: bool) -> Result<(), ParseError> {
        let text = self.utf8(raw, offset)?;
        if self.run.is_empty() {
            self.run_start = offset;
        }
        if escaped {
            let resolved = resolve_references(text).map_err(|message| self.error(offset, message))?;
            self.run.push_str(&resolved);
        } else {
            self.run.push_str(text);
        }
        Ok(())
    }

    fn reference(&mut self, name: &[u8], offset: usize) -> Result<(), ParseError> {
        let name = self.utf8(name, offset)?;
        if self.run.is_empty() {
            self.run_start = offset;
        }
        push_reference(&mut self.run, name).map_err(|message| self.error(offset, message))
    }

    /// Records a comment or declaration inside the current element. Items
    /// in the prolog or after the root element are not kept.
    fn misc(&mut self, kind: MiscKind, raw: &[u8], offset: usize) -> Result<(), ParseError> {
        let text = self.utf8(raw, offset)?.to_owned();
        if let Some(current) = self.open.last_mut() {
            current.push_misc(kind, text);
        }
        Ok(())
    }

    /// Takes the declaration or processing instruction content between `<?` and `?>` from the source.
    fn declaration(&mut self, offset: usize, end: usize) -> Result<(), ParseError> {
        let markup = self.source.get(offset..end).unwrap_or_default();
        let content = markup.trim_start_matches("<?").trim_end_matches("?>").trim();
        self.misc(MiscKind::Declaration, content.as_bytes(), offset)
    }

    /// Ends the current text run at a markup boundary. Whitespace-only runs
    /// are indentation and are dropped.
    fn flush_run(&mut self) -> Result<(), ParseError> {
        if self.run.is_empty() {
            return Ok(());
        }
        let run = std::mem::take(&mut self.run);
        if run.chars().all(char::is_whitespace) {
            return Ok(());
        }
        match self.open.last_mut() {
            Some(current) => {
                current.text.push_str(&run);
                Ok(())
            }
            None => Err(self.error(self.run_start, "text outside of the root element")),
        }
    }

    fn finish(mut self, offset: usize) -> Result<Document, ParseError> {
        self.flush_run()?;
        if let Some(unclosed) = self.open.last() {
            return Err(self.error(offset, format!("unclosed element <{}>", unclosed.name)));
        }
        match self.root.take() {
            Some(root) => Ok(Document::from_spec(root)),
            None => Err(self.error(offset, "document has no root element")),
        }
    }
}

/// Replaces entity and character references in `raw` with the characters
/// they denote.
pub(crate) fn resolve_references(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let Some(semicolon) = after.find(';') else {
            return Err(format!("unterminated reference '&{after}'"));
        };
        push_reference(&mut out, &after[..semicolon])?;
        rest = &after[semicolon + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn push_reference(out: &mut String, name: &str) -> Result<(), String> {
    let Some(number) = name.strip_prefix('#') else {
        let ch = match name {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "apos" => '\'',
            "quot" => '"',
            _ => return Err(format!("unknown entity reference '&{name};'")),
        };
        out.push(ch);
        return Ok(());
    };

    let (digits, radix) = match number.strip_prefix('x') {
        Some(hex) => (hex, 16),
        None => (number, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(format!("invalid character reference '&{name};'"));
    }
    let ch = u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
        .filter(|ch| is_xml_char(*ch))
        .ok_or_else(|| format!("character reference '&{name};' is not a valid XML character"))?;
    out.push(ch);
    Ok(())
}

fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{9}'
            | '\u{A}'
            | '\u{D}'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_nested_elements_with_own_text() {
        let document = parse("<root><a>hello</a><b/></root>").expect("well-formed");
        let root = document.root();
        assert_eq!(root.name(), "root");
        assert_eq!(root.text(), "");
        let names: Vec<_> = root.children().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(root.children()[0].text(), "hello");
        assert_eq!(root.children()[1].text(), "");
        assert_eq!(document.node_count(), 3);
    }

    #[rstest]
    fn own_text_excludes_nested_text_and_drops_indentation() {
        let source = "<?xml version=\"1.0\"?>\n<!-- header -->\n<doc>\n  intro\n  <p>inner</p>\n  tail\n</doc>\n";
        let document = parse(source).expect("well-formed");
        let root = document.root();
        assert_eq!(root.text(), "\n  intro\n  \n  tail\n");
        assert_eq!(root.children()[0].text(), "inner");
    }

    #[rstest]
    fn whitespace_only_runs_between_children_are_dropped() {
        let document = parse("<r>\n  <a/>\n  <b/>\n</r>").expect("well-formed");
        assert_eq!(document.root().text(), "");
        assert_eq!(document.root().children().len(), 2);
    }

    #[rstest]
    fn resolves_entity_and_character_references() {
        let document =
            parse("<r q=\"&quot;a&amp;b&quot;\">x &lt; y &#65;&#x42; &apos;z&apos;</r>").expect("ok");
        let root = document.root();
        assert_eq!(root.text(), "x < y AB 'z'");
        assert_eq!(root.attribute("q"), Some("\"a&b\""));
    }

    #[rstest]
    fn cdata_is_taken_literally() {
        let document = parse("<r>a<![CDATA[<b> &amp;]]>c</r>").expect("ok");
        assert_eq!(document.root().text(), "a<b> &amp;c");
    }

    #[rstest]
    fn attributes_keep_order_and_duplicates() {
        let document = parse("<r b=\"1\" a=\"2\" b=\"3\"/>").expect("ok");
        let root = document.root();
        let keys: Vec<_> = root.attributes().iter().map(|a| (a.name(), a.value())).collect();
        assert_eq!(keys, [("b", "1"), ("a", "2"), ("b", "3")]);
        assert_eq!(root.attribute("b"), Some("3"));
    }

    #[rstest]
    fn qualified_names_are_kept_verbatim() {
        let document = parse("<x:r xmlns:x=\"urn:x\"><x:c/></x:r>").expect("ok");
        assert_eq!(document.root().name(), "x:r");
        assert_eq!(document.root().children()[0].name(), "x:c");
    }

    #[rstest]
    #[case::mismatched_close("<root><a></b></root>")]
    #[case::unterminated_tag("<root><a")]
    #[case::unclosed_element("<root><a>text</a>")]
    #[case::unexpected_close("<root/></root>")]
    #[case::invalid_char_ref("<root>&#xZZ;</root>")]
    #[case::char_ref_out_of_range("<root>&#0;</root>")]
    #[case::unknown_entity("<root>&nbsp;</root>")]
    #[case::bad_attribute_reference("<root a=\"&#xD800;\"/>")]
    #[case::multiple_roots("<a/><b/>")]
    #[case::text_outside_root("<a/>trailing")]
    #[case::empty_input("")]
    #[case::only_comment("<!-- nothing -->")]
    fn rejects_malformed_markup(#[case] source: &str) {
        let error = parse(source).expect_err("malformed input must fail");
        assert!(!error.message.is_empty());
        assert!(error.position.offset <= source.len());
    }

    #[rstest]
    fn comments_inside_elements_are_kept_in_place() {
        let source = "<!-- prolog --><r>a<!-- one --><x/>b<!--two--></r><!-- epilog -->";
        let document = parse(source).expect("well-formed");
        let root = document.root();
        assert_eq!(root.text(), "ab");
        let misc: Vec<_> = root.misc().iter().map(|m| (m.kind(), m.text(), m.position())).collect();
        assert_eq!(misc, [(MiscKind::Comment, " one ", 0), (MiscKind::Comment, "two", 1)]);
    }

    #[rstest]
    fn processing_instructions_inside_elements_are_kept() {
        let source = "<?xml version=\"1.0\"?><r><?render fast?><a/><?cache off?></r>";
        let document = parse(source).expect("well-formed");
        let misc: Vec<_> = document.root().misc().iter().map(|m| (m.kind(), m.text(), m.position())).collect();
        assert_eq!(
            misc,
            [(MiscKind::Declaration, "render fast", 0), (MiscKind::Declaration, "cache off", 1)]
        );
    }

    #[rstest]
    fn documents_at_the_nesting_limit_round_trip() {
        let source = format!("{}{}", "<n>".repeat(MAX_NESTING), "</n>".repeat(MAX_NESTING));
        let document = parse(&source).expect("deepest accepted document");
        assert_eq!(document.node_count(), MAX_NESTING);
        let deepest = document.descendants().last().expect("leaf");
        assert_eq!(deepest.depth(), MAX_NESTING - 1);

        let compact = document.to_xml();
        let pretty = document.to_xml_pretty(1);
        assert_eq!(parse(&compact).expect("compact output parses"), document);
        assert_eq!(parse(&pretty).expect("pretty output parses"), document);
        drop(document);
    }

    #[rstest]
    fn mismatch_position_points_at_closing_tag() {
        let source = "<root>\n  <a>\n  </b>\n</root>";
        let error = parse(source).expect_err("mismatched");
        assert_eq!(error.position.line, 3);
    }

    #[rstest]
    fn nesting_limit_is_enforced() {
        let depth = MAX_NESTING + 1;
        let source = format!("{}{}", "<n>".repeat(depth), "</n>".repeat(depth));
        let error = parse(&source).expect_err("too deep");
        assert!(error.message.contains("nested"));
    }

    #[rstest]
    #[case("a&amp;b", "a&b")]
    #[case("&#x1F600;", "\u{1F600}")]
    #[case("plain", "plain")]
    fn resolve_references_cases(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(resolve_references(raw).as_deref(), Ok(expected));
    }

    #[rstest]
    #[case("a&amp")]
    #[case("&#;")]
    #[case("&#X41;")]
    #[case("&#+65;")]
    fn resolve_references_rejects(#[case] raw: &str) {
        assert!(resolve_references(raw).is_err());
    }
}
