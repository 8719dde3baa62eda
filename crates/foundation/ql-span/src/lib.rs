//! Source spans and line/column mapping

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A byte offset span in a source text
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start offset
    pub start: u32,
    /// Exclusive end offset
    pub end: u32,
}

impl Span {
    /// Creates a span from start and end offsets
    #[must_use]
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Byte range covered by this span
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Length in bytes
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Returns true when the span covers no bytes
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Smallest span covering both `self` and `other`
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A one-based line and column position
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TextLocation {
    /// Line number, starting at 1
    pub line: u32,
    /// Column number, starting at 1
    pub column: u32,
}

impl fmt::Display for TextLocation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "({}, {})", self.line, self.column)
    }
}

/// Source text of one compilation unit together with its line table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceText {
    name: String,
    text: String,
    line_starts: Vec<u32>,
}

impl SourceText {
    /// Creates a source text and computes its line table
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(u32::try_from(offset + 1).unwrap_or(u32::MAX));
            }
        }
        Self {
            name: name.into(),
            text,
            line_starts,
        }
    }

    /// Name of the originating file or buffer
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines in the text
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Zero-based index of the line containing `offset`
    pub fn line_index(&self, offset: u32) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        }
    }

    /// One-based line and column of `offset`
    pub fn location(&self, offset: u32) -> TextLocation {
        let line = self.line_index(offset);
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        TextLocation {
            line: u32::try_from(line + 1).unwrap_or(u32::MAX),
            column: offset.saturating_sub(line_start) + 1,
        }
    }

    /// Text covered by `span`, or `None` when the span is out of bounds
    pub fn slice(&self, span: Span) -> Option<&str> {
        self.text.get(span.range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_of_first_line() {
        let source = SourceText::new("main.ql", "var x = 10;\nvar x = 5;\n");
        assert_eq!(source.location(4), TextLocation { line: 1, column: 5 });
    }

    #[test]
    fn test_location_after_newline() {
        let source = SourceText::new("main.ql", "var x = 10;\nvar x = 5;\n");
        let location = source.location(16);
        assert_eq!(location, TextLocation { line: 2, column: 5 });
        assert_eq!(location.to_string(), "(2, 5)");
    }

    #[test]
    fn test_slice_and_line_count() {
        let source = SourceText::new("main.ql", "a\nbc\n");
        assert_eq!(source.line_count(), 3);
        assert_eq!(source.slice(Span::new(2, 4)), Some("bc"));
        assert_eq!(source.slice(Span::new(2, 40)), None);
    }

    #[test]
    fn test_span_serializes_as_offsets() {
        let json = serde_json::to_string(&Span::new(3, 7)).expect("serialize span");
        assert_eq!(json, r#"{"start":3,"end":7}"#);
    }

    #[test]
    fn test_cover() {
        let span = Span::new(5, 8).cover(Span::new(2, 6));
        assert_eq!(span, Span::new(2, 8));
        assert_eq!(span.len(), 6);
        assert!(!span.is_empty());
    }
}
