// Source spans
//
//  Copyright (C) 2014-2023 Ryan Specialty, LLC.
//
//  This file is part of Weft.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Mapping to source input byte intervals.
//!
//! A [`Span`] is a mapping to a byte interval within a source file,
//!   representing primarily where some IR entity originated.
//! This underpins both the diagnostic system and the
//!   [source map](crate::emit::SourceMap),
//!     which must be able to answer questions such as "what exists at my
//!     cursor position within this file?" long after the template has been
//!     compiled into host-language source text.
//!
//! A span contains a [`Context`] representing the source location,
//!   a byte offset and length,
//!   and the 0-indexed line and column of its first byte.
//! Lines and columns are redundant with the offset given the source text,
//!   but editors speak in lines and columns,
//!     and the upstream parser already knows them;
//!   carrying them avoids a line index lookup for every mapped span.
//!
//! ```
//! use weft::span::{Context, Span};
//!
//! let ctx = Context::new(1);
//! let span = Span::new(2, 6, 0, 2, ctx);
//!
//! assert_eq!(2, span.offset());
//! assert_eq!(6, span.len());
//! assert_eq!(8, span.end());
//! assert_eq!(ctx, span.context());
//! ```
//!
//! A span is ordered as such:
//!
//!   1. Spans group by [`Context`],
//!        though the relative ordering of each [`Context`] isn't
//!        necessarily meaningful;
//!   2. Spans are then ordered relative to their offset; and
//!   3. Spans are finally ordered by their length.
//!
//! Note that this means that a span beginning after but ending before
//!   another span will still order higher,
//!     as shown in the example below.
//!
//! ```
//! # use weft::span::Context;
//! #
//! # let ctx = Context::new(1);
//! #
//! // Visualization of spans:
//! // [....,....,....,....,]
//! //    [A-+-]  [B-+]|
//! //       |    [C-] |
//! //       |    [D-+-]
//! //       |     [E]
//! //       [F----] |
//! //       [G------]
//!
//! let A = ctx.span(2,  6);
//! let B = ctx.span(10, 5);
//! let C = ctx.span(10, 4);
//! let D = ctx.span(10, 6);
//! let E = ctx.span(11, 3);
//! let F = ctx.span(5,  7);
//! let G = ctx.span(5,  8);
//!
//! let mut spans = vec![A, B, C, D, E, F, G];
//! spans.sort();
//!
//! assert_eq!(spans, vec![A, F, G, C, B, D, E]);
//! ```
//!
//! Synthetic Spans
//! ===============
//! Nodes that are produced by the compiler rather than the user
//!   (e.g. injected property declarations)
//!   have no span at all;
//!     they are represented as `Option<Span>` rather than by a sentinel
//!     value,
//!       since a sentinel would eventually leak into the source map.
//! [`UNKNOWN_SPAN`] exists only for diagnostic fallbacks.

use crate::global::{ContextSize, LineSize, SourceFileSize, TokenLength};
use std::{
    cmp::Ordering,
    fmt::{self, Display},
};

/// Description of a source location and byte interval for some object.
///
/// Spans represent byte intervals within a given source context.
/// A span should map to useful positions for helping users debug error
///   messages.
/// If code is generated, desugared, or otherwise manipulated,
///   the span ought to reference the original location of the code that can
///   be referenced and modified to correct any problems.
///
/// See the [module-level documentation](self) for more information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Starting 0-indexed byte position, inclusive.
    offset: SourceFileSize,

    /// Token length (ending byte offset - `offset`).
    len: TokenLength,

    /// 0-indexed line of `offset`.
    line: LineSize,

    /// 0-indexed byte column of `offset` relative to the start of `line`.
    col: LineSize,

    /// Context onto which byte offsets are mapped,
    ///   such as a source file.
    ctx: Context,
}

assert_eq_size!(Span, [u32; 5]);

impl Span {
    /// Create a new span from its constituent parts.
    pub const fn new(
        offset: SourceFileSize,
        len: TokenLength,
        line: LineSize,
        col: LineSize,
        ctx: Context,
    ) -> Self {
        Self {
            offset,
            len,
            line,
            col,
            ctx,
        }
    }

    /// Byte offset of the beginning of the span relative to its context.
    pub const fn offset(&self) -> SourceFileSize {
        self.offset
    }

    /// Length of the span in bytes.
    ///
    /// The interval of the span is `[offset, offset+len)`.
    pub const fn len(&self) -> TokenLength {
        self.len
    }

    /// Whether this span is zero-length.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte offset immediately following the span,
    ///   saturating at [`SourceFileSize::MAX`].
    pub const fn end(&self) -> SourceFileSize {
        self.offset.saturating_add(self.len)
    }

    /// 0-indexed line number of the first byte of the span.
    pub const fn line(&self) -> LineSize {
        self.line
    }

    /// 0-indexed column of the first byte of the span.
    pub const fn col(&self) -> LineSize {
        self.col
    }

    /// The context to which the span applies.
    ///
    /// The context is, for example, a file.
    pub const fn context(&self) -> Context {
        self.ctx
    }

    /// Further offset a span.
    ///
    /// This attempts to offset a span relative to its current offset by the
    ///   provided value.
    /// If the resulting offset exceeds [`SourceFileSize`],
    ///   the result will be [`None`].
    ///
    /// The column is adjusted by the same amount,
    ///   which is only meaningful if the span does not cross a newline;
    ///     this is intended for dummy spans and single-line tokens.
    pub const fn offset_add(self, value: SourceFileSize) -> Option<Self> {
        match (self.offset.checked_add(value), self.col.checked_add(value))
        {
            (Some(offset), Some(col)) => Some(Self {
                offset,
                col,
                ..self
            }),
            _ => None,
        }
    }

    /// Whether `other` lies entirely within this span.
    ///
    /// Spans of different [`Context`]s never contain one another.
    /// A zero-length span at the end of this span is contained by it,
    ///   since it represents a position and not a byte.
    pub fn contains(&self, other: Span) -> bool {
        self.ctx == other.ctx
            && other.offset >= self.offset
            && other.end() <= self.end()
    }

    /// Whether this span shares at least one byte with `other`.
    pub fn overlaps(&self, other: Span) -> bool {
        self.ctx == other.ctx
            && self.offset < other.end()
            && other.offset < self.end()
    }

    /// Whether `offset` falls within `[offset, end)` of this span.
    pub fn contains_offset(&self, offset: SourceFileSize) -> bool {
        offset >= self.offset && offset < self.end()
    }

    /// Merge with another span `b` such that the combined span begins at
    ///   the offset of the earlier of the two spans and extends to the end
    ///   of the later of the two.
    ///
    /// Both spans must have the same [`Context`],
    ///   otherwise the result will be [`None`].
    /// The line and column of the result are those of the earlier span.
    ///
    /// This properly handles overlapping spans,
    ///   including the case where one of the spans is entirely contained
    ///   within another.
    pub fn merge(self, other: Span) -> Option<Span> {
        if self.context() != other.context() {
            return None;
        }

        // Order arguments such that `self` is placed at or before `other`
        //   rather than having to worry about confounding accommodations
        //   below.
        if self.offset() > other.offset() {
            return other.merge(self);
        }

        Some(Self {
            len: self.end().max(other.end()) - self.offset,
            ..self
        })
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Span {
    fn cmp(&self, other: &Self) -> Ordering {
        // Line and column are derived from the offset for well-formed
        //   spans,
        //     but must still participate to remain consistent with `Eq`.
        (self.ctx, self.offset, self.len, self.line, self.col).cmp(&(
            other.ctx,
            other.offset,
            other.len,
            other.line,
            other.col,
        ))
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} offset {}-{} ({}:{})]",
            self.ctx,
            self.offset,
            self.end(),
            self.line + 1,
            self.col + 1,
        )
    }
}

/// A placeholder span indicating that a span is expected but is not yet
///   known.
///
/// This should only ever be used as a diagnostic fallback;
///   nodes without a known origin have no span at all.
pub const UNKNOWN_SPAN: Span = UNKNOWN_CONTEXT.span(0, 0);

/// Context for byte offsets (e.g. a source file).
///
/// A context is a small [`Copy`]-able identifier assigned by whoever
///   supplies the [`SourceDocument`](crate::source::SourceDocument);
///     it is resolved back into a path only in a diagnostic context.
///
/// Since this is used within [`Span`],
///   it must be kept as small as possible.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Context(ContextSize);

impl Context {
    /// Create a context from a caller-assigned identifier.
    ///
    /// The identifier `0` is reserved for [`UNKNOWN_CONTEXT`].
    pub const fn new(id: ContextSize) -> Self {
        Self(id)
    }

    /// Caller-assigned identifier of this context.
    pub const fn id(self) -> ContextSize {
        self.0
    }

    /// Produce a [`Span`] within the given context with an unknown line
    ///   and column.
    ///
    /// This is useful when the line and column are not needed,
    ///   such as for tests;
    ///     use [`SourceDocument::span`](crate::source::SourceDocument::span)
    ///     to produce a span with an accurate position.
    #[inline]
    pub const fn span(self, offset: SourceFileSize, len: TokenLength) -> Span {
        Span::new(offset, len, 0, 0, self)
    }
}

/// A placeholder context indicating that a context is expected but is not
///   yet known.
pub const UNKNOWN_CONTEXT: Context = Context(0);

impl Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self(0) => write!(f, "<unknown>"),
            Self(id) => write!(f, "ctx#{id}"),
        }
    }
}
