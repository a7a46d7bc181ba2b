//! Source location tracking

use serde::{Deserialize, Serialize};

/// A position in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// 1-based line number
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
    /// Byte offset from the start of the source
    pub offset: usize,
}

impl Location {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::start()
    }
}

/// A span representing a range in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Location,
    /// Exclusive end
    pub end: Location,
}

impl Span {
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// Zero-width span at a location
    pub fn at(location: Location) -> Self {
        Self { start: location, end: location }
    }

    pub fn dummy() -> Self {
        Self::at(Location::start())
    }

    /// Merge two spans into one that covers both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether the span touches the given 1-based line
    pub fn contains_line(&self, line: usize) -> bool {
        self.start.line <= line && line <= self.end.line
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start.offset..self.end.offset
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

/// Maps byte offsets of one source text to line/column locations
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { source, line_starts }
    }

    pub fn location(&self, offset: usize) -> Location {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - line_start);
        Location::new(line + 1, column + 1, offset)
    }

    pub fn span(&self, range: std::ops::Range<usize>) -> Span {
        Span::new(self.location(range.start), self.location(range.end))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
