//! Source location tracking for diagnostics.
//!
//! - `Span`: byte range into the kernel source (macro bodies are offset so
//!   their spans point into the same text)
//! - `SourceFile`: one source text with a line index for `line:column`
//!   rendering
//!
//! # Examples
//!
//! ```
//! # use pbk_ast::foundation::span::*;
//! let file = SourceFile::new("blur.pbk", "kernel K\n< >\n{ }");
//! let span = Span::new(9, 12);
//!
//! assert_eq!(file.line_col(span.start), (2, 1));
//! assert_eq!(file.snippet(&span), "< >");
//! ```

use serde::{Deserialize, Serialize};

/// Byte range `start..end` into a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Convert a lexer byte range.
    pub fn from_range(range: &std::ops::Range<usize>) -> Self {
        Self::new(range.start as u32, range.end as u32)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Span covering both `self` and `other`.
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Shift the span by `offset` bytes.
    ///
    /// Used for macro bodies, which are lexed on their own but live inside
    /// the kernel source.
    pub fn offset(&self, offset: u32) -> Span {
        Span {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

/// A single source text with line indexing.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Display name (usually the input path)
    pub name: String,
    pub source: String,
    /// Byte offsets of each line start, `line_starts[0] == 0`.
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = compute_line_starts(&source);
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// 1-based `(line, column)` for a byte offset. Offsets past the end clamp
    /// to the last position.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(self.source.len() as u32);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.max(1) - 1,
        };
        let line_start = self.line_starts.get(line_idx).copied().unwrap_or(0);
        (line_idx as u32 + 1, offset - line_start + 1)
    }

    /// Source text covered by `span`, empty when the span is out of range.
    pub fn snippet(&self, span: &Span) -> &str {
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

fn compute_line_starts(source: &str) -> Vec<u32> {
    std::iter::once(0)
        .chain(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i as u32 + 1),
        )
        .collect()
}
