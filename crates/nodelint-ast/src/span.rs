//! Source location tracking for AST nodes and diagnostics.
//!
//! Positions count characters, not bytes - they come straight from the
//! parser front-end, which reports JavaScript string indices.

/// A position in the original source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourcePosition {
    /// Character offset from the start of the file.
    pub offset: u32,
    /// 1-based line number.
    pub line: u32,
    /// 0-based column number.
    pub column: u32,
}

impl SourcePosition {
    pub const fn new(offset: u32, line: u32, column: u32) -> Self {
        SourcePosition {
            offset,
            line,
            column,
        }
    }
}

impl PartialOrd for SourcePosition {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourcePosition {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.offset.cmp(&other.offset)
    }
}

/// A half-open span of source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceSpan {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceSpan {
    pub const fn new(start: SourcePosition, end: SourcePosition) -> Self {
        SourceSpan { start, end }
    }

    pub const fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }
}
