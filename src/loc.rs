//! Source positions.
//!
//! Every node carries a [`Loc`]. Positions are 1-based line/column pairs, and a [`Span`]'s end is
//! exclusive: it points at the column just past the node's last character. The printer relies on
//! these to reproduce the original layout, and the resolver relies on them to map a diagnostic back
//! to the node it talks about.

use derive_more::Display;

/// A line/column position in a source file. Both components are 1-based.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("L{line}:{col}")]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Returns the position `n` columns to the right on the same line.
    pub const fn right(self, n: u32) -> Self {
        Self {
            line: self.line,
            col: self.col + n,
        }
    }

    /// Moves the position by the given deltas, clamping both components at 1.
    pub fn shifted(self, lines: i64, cols: i64) -> Self {
        let clamp = |v: i64| v.clamp(1, u32::MAX as i64) as u32;

        Self {
            line: clamp(self.line as i64 + lines),
            col: clamp(self.col as i64 + cols),
        }
    }
}

/// A contiguous range of text, from `begin` (inclusive) to `end` (exclusive).
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[display("{begin}-{end}")]
pub struct Span {
    pub begin: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(begin: Pos, end: Pos) -> Self {
        Self { begin, end }
    }

    /// An empty span at `pos`.
    pub const fn point(pos: Pos) -> Self {
        Self {
            begin: pos,
            end: pos,
        }
    }

    /// A single-line span starting at `begin` and covering `len` columns.
    pub const fn of_len(begin: Pos, len: u32) -> Self {
        Self {
            begin,
            end: begin.right(len),
        }
    }

    pub fn shifted(self, lines: i64, cols: i64) -> Self {
        Self {
            begin: self.begin.shifted(lines, cols),
            end: self.end.shifted(lines, cols),
        }
    }
}

/// A location in a source file.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Display, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Loc {
    /// No location information available, for example for synthesized glue.
    ///
    /// The printer emits such nodes wherever its cursor happens to be.
    #[default]
    #[display("<synthetic>")]
    Synthetic,

    /// The location corresponds to a span in the source file.
    #[display("{_0}")]
    Span(Span),
}

impl Loc {
    /// Returns `true` if the location is synthetic and has no span.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic)
    }

    /// Returns the span associated with this location, or `None` if the location is synthetic.
    pub fn span(&self) -> Option<Span> {
        match *self {
            Self::Synthetic => None,
            Self::Span(span) => Some(span),
        }
    }

    pub fn begin(&self) -> Option<Pos> {
        self.span().map(|span| span.begin)
    }

    pub fn end(&self) -> Option<Pos> {
        self.span().map(|span| span.end)
    }

    pub fn shifted(self, lines: i64, cols: i64) -> Self {
        match self {
            Self::Synthetic => Self::Synthetic,
            Self::Span(span) => Self::Span(span.shifted(lines, cols)),
        }
    }
}

impl From<Span> for Loc {
    fn from(span: Span) -> Self {
        Self::Span(span)
    }
}

impl From<Pos> for Loc {
    fn from(pos: Pos) -> Self {
        Self::Span(Span::point(pos))
    }
}

impl From<Option<Span>> for Loc {
    fn from(span: Option<Span>) -> Self {
        span.map(Loc::Span).unwrap_or_default()
    }
}

impl From<Loc> for Option<Span> {
    fn from(loc: Loc) -> Self {
        loc.span()
    }
}
