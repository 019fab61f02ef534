use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Location inside the parsed source. `line` and `column` are 1-based, the
/// column counts characters, `offset` counts bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextPosition {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl TextPosition {
    /// Computes line and column for a byte offset into `source`. Offsets past
    /// the end are clamped to the end of the input.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut boundary = offset.min(source.len());
        while !source.is_char_boundary(boundary) {
            boundary -= 1;
        }
        let prefix = &source[..boundary];
        let line = prefix.matches('\n').count() + 1;
        let line_start = prefix.rfind('\n').map_or(0, |index| index + 1);
        let column = prefix[line_start..].chars().count() + 1;
        Self { offset: boundary, line, column }
    }
}

impl Display for TextPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Malformed markup. Parsing is all-or-nothing, so this is the only outcome
/// besides a complete [`Document`](super::Document).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message} at {position}")]
pub struct ParseError {
    pub position: TextPosition,
    pub message: String,
}

impl ParseError {
    pub fn new(position: TextPosition, message: impl Into<String>) -> Self {
        Self { position, message: message.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("element <{element}> has no attribute '{key}'")]
    AttributeNotFound { element: String, key: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abc", 0, 1, 1)]
    #[case("abc", 2, 1, 3)]
    #[case("a\nbc", 2, 2, 1)]
    #[case("a\nbc", 4, 2, 3)]
    #[case("ä\nöx", 5, 2, 2)]
    fn locate_reports_line_and_column(
        #[case] source: &str,
        #[case] offset: usize,
        #[case] line: usize,
        #[case] column: usize,
    ) {
        let position = TextPosition::locate(source, offset);
        assert_eq!((position.line, position.column), (line, column));
    }

    #[rstest]
    fn locate_clamps_past_end_and_inside_char() {
        assert_eq!(TextPosition::locate("ab", 10).offset, 2);
        // offset 1 falls inside the two-byte 'ä'
        assert_eq!(TextPosition::locate("äb", 1).offset, 0);
    }

    #[rstest]
    fn parse_error_display_includes_position() {
        let error = ParseError::new(TextPosition::locate("<a>\n</b>", 4), "mismatched closing tag");
        assert_eq!(error.to_string(), "mismatched closing tag at line 2, column 1");
    }
}
