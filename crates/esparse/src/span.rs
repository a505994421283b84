//! Source location tracking.
//!
//! Every AST node and token has a `Span` of byte offsets into the source.
//! Line/column positions are computed lazily through a [`LineIndex`], only
//! when the ESTree builder is asked for `loc` or when an error is reported.

use serde::Serialize;

/// A span in the source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// Byte offset of the start.
    pub start: u32,
    /// Byte offset of the end (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create an empty span at a position.
    #[inline]
    pub const fn empty(pos: u32) -> Self {
        Self { start: pos, end: pos }
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if the span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both.
    #[inline]
    pub const fn merge(self, other: Span) -> Span {
        Span {
            start: if self.start < other.start { self.start } else { other.start },
            end: if self.end > other.end { self.end } else { other.end },
        }
    }

    /// Check if this span contains a byte offset.
    #[inline]
    pub const fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Slice the source text covered by this span.
    #[inline]
    pub fn source_text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start as usize..self.end as usize).unwrap_or("")
    }
}

/// A line/column pair. Lines are 1-based, columns are 0-based and counted
/// in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Start and end positions of a node or error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

/// Convert byte offsets to line/column positions.
#[derive(Debug)]
pub struct LineIndex<'a> {
    source: &'a str,
    /// Byte offsets of the start of each line.
    line_starts: Vec<u32>,
}

impl<'a> LineIndex<'a> {
    /// Build a line index from source code. `\r\n`, `\n`, `\r`, U+2028 and
    /// U+2029 all terminate a line.
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        let bytes = source.as_bytes();
        let mut chars = source.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\r' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        chars.next();
                        line_starts.push((i + 2) as u32);
                    } else {
                        line_starts.push((i + 1) as u32);
                    }
                }
                '\n' | '\u{2028}' | '\u{2029}' => {
                    line_starts.push((i + c.len_utf8()) as u32);
                }
                _ => {}
            }
        }
        Self { source, line_starts }
    }

    /// Convert a byte offset to a position.
    pub fn position(&self, offset: u32) -> Position {
        let offset = offset.min(self.source.len() as u32);
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i.saturating_sub(1));
        let line_start = self.line_starts[line] as usize;
        let column = self
            .source
            .get(line_start..offset as usize)
            .map_or(offset as usize - line_start, |s| s.chars().count());
        Position {
            line: line as u32 + 1,
            column: column as u32,
        }
    }

    /// Convert a span to a source location.
    pub fn location(&self, span: Span) -> SourceLocation {
        SourceLocation {
            start: self.position(span.start),
            end: self.position(span.end),
        }
    }

    /// Get the total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
