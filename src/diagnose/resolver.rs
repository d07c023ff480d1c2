// Diagnostic span resolver
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

//! Resolve [`Span`]s into line:column source locations.

use crate::{
    source::SourceDocument,
    span::{Context, Span},
};
use fxhash::FxHashMap;
use std::{error::Error, fmt::Display, num::NonZeroU32};
use unicode_width::UnicodeWidthChar;

/// Resolves [`Span`]s into line:column source locations.
///
/// A [`Span`] contains a [`Context`] and raw byte offsets gathered during
///   parsing.
/// These byte offsets can be used to go back to the source text referred
///   to by a [`Context`] to resolve the byte offsets to line and column
///   numbers,
///     and to provide snippets of the source to annotate with diagnostic
///     information.
///
/// Lines stored within a [`Span`] are byte-based;
///   columns produced by a resolver are instead _visual_,
///     measured in terminal cells.
pub trait SpanResolver {
    /// Resolve the provided [`Span`] into line:column source locations.
    ///
    /// See [`SpanResolver`] for more information.
    fn resolve(
        &mut self,
        span: Span,
    ) -> Result<ResolvedSpan, SpanResolverError>;
}

/// Wrapper around a non-empty [`Vec`].
///
/// This is for correctness,
///   not performance.
/// This type is half-assed and is only what we need for this module.
#[derive(Debug, PartialEq, Eq)]
struct NonEmptyVec<T>(Vec<T>);

impl<T> NonEmptyVec<T> {
    fn new(from: Vec<T>) -> Option<Self> {
        if from.is_empty() {
            return None;
        }

        Some(NonEmptyVec(from))
    }

    /// Returns the first element of the [`Vec`].
    fn first(&self) -> &T {
        &self.0[0]
    }
}

/// A [`Span`] resolved to its source location.
///
/// This represents the useful information a human would want to know about
///   a [`Span`],
///     having read its source text to determine the range of lines relevant
///     to the original span.
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedSpan {
    /// The original [`Span`] whose resolution was requested.
    span: Span,

    /// Path of the source document.
    path: String,

    /// The lines of source code that correspond to this [`Span`].
    ///
    /// _This vector will always have at least one line._
    lines: NonEmptyVec<SourceLine>,
}

/// Data interpreted from a [`ResolvedSpan`] or equivalent.
pub trait ResolvedSpanData {
    /// Line number representing the offset of the [`Span`].
    ///
    /// This is the line number expected to appear in a report heading
    ///   alongside the path
    ///     (e.g. "path/to/file:1:2").
    fn line_num(&self) -> NonZeroU32;

    /// Column number(s) relative to the beginning of the first line
    ///   representing the offset of the [`Span`].
    fn col_num(&self) -> Column;

    /// Path of the document containing the [`Span`].
    fn path(&self) -> &str;

    /// The original [`Span`] before resolution.
    fn unresolved_span(&self) -> Span;

    /// Consume self and yield owned inner [`SourceLine`]s.
    fn into_lines(self) -> Vec<SourceLine>;
}

impl ResolvedSpanData for ResolvedSpan {
    fn line_num(&self) -> NonZeroU32 {
        self.lines.first().num
    }

    fn col_num(&self) -> Column {
        self.lines.first().column
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn unresolved_span(&self) -> Span {
        self.span
    }

    fn into_lines(self) -> Vec<SourceLine> {
        self.lines.0
    }
}

/// Source column offsets.
///
/// A "column" is somewhat loosely defined as a terminal cell.
/// Certain unicode characters occupy more than one cell,
///   while others occupy none.
/// Consequently,
///   a column can be thought of a "visual [`Span`]",
///     representing what the user would perceive as a column in a fixed
///     with font rather than a byte offset.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Column {
    /// A range of 1-indexed columns, inclusive.
    Endpoints(NonZeroU32, NonZeroU32),

    /// Immediately before a column.
    ///
    /// This is conceptually like a bar cursor
    ///   (non-block)
    ///   that places itself between two columns.
    /// It is caused by a zero-length [`Span`].
    Before(NonZeroU32),
}

impl Column {
    /// First column.
    pub fn start(self) -> NonZeroU32 {
        match self {
            Self::Endpoints(at, _) | Self::Before(at) => at,
        }
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Coerces to a single column number.
        Display::fmt(&self.start(), f)
    }
}

/// A line of source code touched by a [`Span`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SourceLine {
    /// 1-indexed line number relative to the entire source [`Context`].
    num: NonZeroU32,

    /// 1-indexed column number(s) of the portion of the span falling on
    ///   this line.
    column: Column,

    /// Source code text of the line _excluding_ the newline.
    text: String,
}

impl SourceLine {
    pub fn num(&self) -> NonZeroU32 {
        self.num
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Resolve [`Span`]s against in-memory [`SourceDocument`]s.
///
/// Templates are held in memory by editor tooling,
///   so unlike a compiler reading from disk,
///   there is never any reason to go back to the filesystem.
#[derive(Debug, Default)]
pub struct SourceSpanResolver<'a> {
    docs: FxHashMap<Context, &'a SourceDocument>,
}

impl<'a> SourceSpanResolver<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `doc` available for resolution.
    pub fn with_document(mut self, doc: &'a SourceDocument) -> Self {
        self.docs.insert(doc.context(), doc);
        self
    }
}

impl<'a> From<&'a SourceDocument> for SourceSpanResolver<'a> {
    fn from(doc: &'a SourceDocument) -> Self {
        Self::new().with_document(doc)
    }
}

impl<'a> SpanResolver for SourceSpanResolver<'a> {
    fn resolve(
        &mut self,
        span: Span,
    ) -> Result<ResolvedSpan, SpanResolverError> {
        let doc = self
            .docs
            .get(&span.context())
            .ok_or(SpanResolverError::UnknownContext(span.context()))?;

        if !doc.contains(span) {
            return Err(SpanResolverError::OutOfRange {
                span,
                len: doc.len(),
            });
        }

        let index = doc.lines();
        let (first, _) = index.position(span.offset());
        let (last, _) = match span.is_empty() {
            true => (first, 0),
            false => index.position(span.end() - 1),
        };

        let lines = (first..=last)
            .map(|line| resolve_line(doc, line, span))
            .collect::<Result<Vec<_>, _>>()?;

        let lines = NonEmptyVec::new(lines)
            .ok_or(SpanResolverError::OutOfRange { span, len: doc.len() })?;

        Ok(ResolvedSpan {
            span,
            path: doc.path().to_string(),
            lines,
        })
    }
}

/// Resolve the portion of `span` that falls on the 0-indexed `line`.
fn resolve_line(
    doc: &SourceDocument,
    line: u32,
    span: Span,
) -> Result<SourceLine, SpanResolverError> {
    let index = doc.lines();
    let text = doc.text();

    let start = index.line_start(line).unwrap_or(0) as usize;
    let end = index
        .line_start(line + 1)
        .map(|next| next as usize - 1)
        .unwrap_or(text.len());

    let line_text = text
        .get(start..end)
        .ok_or(SpanResolverError::InvalidBoundary { span })?
        .trim_end_matches('\r');

    let rel_start = (span.offset() as usize).saturating_sub(start);
    let rel_end = (span.end() as usize)
        .saturating_sub(start)
        .min(line_text.len());

    let width_to = |rel: usize| -> Result<u32, SpanResolverError> {
        let prefix = line_text
            .get(..rel.min(line_text.len()))
            .ok_or(SpanResolverError::InvalidBoundary { span })?;

        Ok(prefix
            .chars()
            .map(|c| c.width().unwrap_or(0) as u32)
            .sum())
    };

    let col_start = width_to(rel_start)?;
    let col_end = width_to(rel_end)?;

    let one = NonZeroU32::MIN;
    let column = match (NonZeroU32::new(col_start + 1), col_end > col_start) {
        (Some(at), true) => Column::Endpoints(
            at,
            NonZeroU32::new(col_end).unwrap_or(at),
        ),
        (Some(at), false) => Column::Before(at),
        (None, _) => Column::Before(one),
    };

    Ok(SourceLine {
        num: NonZeroU32::new(line + 1).unwrap_or(one),
        column,
        text: line_text.to_string(),
    })
}

/// An error occurring while attempting to resolve a [`Span`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SpanResolverError {
    /// No document is known for the span's [`Context`].
    UnknownContext(Context),

    /// The span extends beyond the end of its document.
    ///
    /// This likely means that the span is from a different version of the
    ///   document.
    OutOfRange { span: Span, len: u32 },

    /// The span does not fall on UTF-8 character boundaries.
    InvalidBoundary { span: Span },
}

impl Display for SpanResolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownContext(ctx) => {
                write!(f, "no source document is known for {ctx}")
            }
            Self::OutOfRange { span, len } => write!(
                f,
                "span {span} exceeds the length of its document ({len} bytes)"
            ),
            Self::InvalidBoundary { span } => write!(
                f,
                "span {span} does not fall on a character boundary"
            ),
        }
    }
}

impl Error for SpanResolverError {}
