// span.rs
//
// Source location span for diagnostics.

/// Source location span.
///
/// Synthesized nodes carry the default span (line 0); diagnostics attached to
/// such nodes are dropped by the checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: usize,  // Byte offset
    pub end: usize,    // Byte offset (exclusive)
    pub line: u32,     // Start line (1-indexed)
    pub column: u32,   // Start column (1-indexed)
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// True when the span points at real source text.
    pub fn has_position(&self) -> bool {
        self.line > 0 && self.column > 0
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
            line: self.line,
            column: self.column,
        }
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.end.saturating_sub(span.start)).into()
    }
}

impl From<&Span> for miette::SourceSpan {
    fn from(span: &Span) -> Self {
        (*span).into()
    }
}
