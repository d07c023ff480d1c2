// Correlation of template and generated positions
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

//! Bidirectional mapping between a template and its generated text.
//!
//! A [`SourceMap`] is made of two kinds of records:
//!
//!   - a [`MapEntry`] correlates an original [`Span`] with a
//!       [`GeneratedSpan`] of identical length whose text was copied
//!       verbatim; and
//!   - a [`Construct`] correlates the span of a template construct,
//!       such as a bound element,
//!       with the whole of the generated text produced for it,
//!         most of which is synthetic.
//!
//! Only entries are used for exact translation in either direction.
//! Synthetic text has no entry;
//!   a position within it cannot be mapped exactly,
//!   and a diagnostic produced there by a host-language compiler should
//!   either be suppressed or attributed to an enclosing construct
//!     (see [`SourceMap::remap_or_enclosing`]).
//!
//! Entries are ordered by their original span.
//! Adjacent entries that are contiguous in both the original and
//!   generated text are coalesced,
//!     so a consumer must not rely on any particular entry
//!     granularity.

use crate::{
    global::SourceFileSize,
    source::LineIndex,
    span::Span,
};
use std::{
    fmt::{self, Display},
    ops::Range,
};

/// A region of generated text.
///
/// Generated text has no [`Context`](crate::span::Context) of its own,
///   so its positions are kept separately from [`Span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeneratedSpan {
    offset: usize,
    len: usize,

    /// 0-indexed line of `offset`.
    line: usize,

    /// 0-indexed byte column of `offset`.
    col: usize,
}

impl GeneratedSpan {
    pub fn new(offset: usize, len: usize, line: usize, col: usize) -> Self {
        Self {
            offset,
            len,
            line,
            col,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

impl Display for GeneratedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.offset, self.end())
    }
}

/// Verbatim copy of original text into generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEntry {
    pub original: Span,
    pub generated: GeneratedSpan,
}

impl MapEntry {
    /// Offset within generated text of the original `offset`,
    ///   if it falls within this entry.
    fn generated_offset(&self, offset: SourceFileSize) -> Option<usize> {
        self.original.contains_offset(offset).then(|| {
            self.generated.offset + (offset - self.original.offset()) as usize
        })
    }

    /// Offset within original text of the generated `offset`,
    ///   if it falls within this entry.
    fn original_offset(&self, offset: usize) -> Option<SourceFileSize> {
        self.generated
            .range()
            .contains(&offset)
            .then(|| self.original.offset())
            .and_then(|base| {
                let rel = (offset - self.generated.offset).try_into().ok()?;
                base.checked_add(rel)
            })
    }

    /// Whether `next` continues this entry in both texts.
    fn is_contiguous_with(&self, next: &MapEntry) -> bool {
        self.original.context() == next.original.context()
            && self.original.end() == next.original.offset()
            && self.generated.end() == next.generated.offset
    }
}

/// A template construct and all text generated for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Construct {
    pub original: Span,
    pub generated: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMap {
    /// Ordered by original span.
    entries: Vec<MapEntry>,

    /// Indexes into `entries` ordered by generated offset.
    by_generated: Vec<usize>,

    /// Ordered by start of generated range,
    ///   outermost first.
    constructs: Vec<Construct>,

    /// Lines of the original text,
    ///   for positions within an entry.
    lines: LineIndex,
}

impl SourceMap {
    pub fn new(
        mut entries: Vec<MapEntry>,
        mut constructs: Vec<Construct>,
        lines: LineIndex,
    ) -> Self {
        entries.sort_by_key(|e| (e.original, e.generated));
        let entries = coalesce(entries);

        let mut by_generated = (0..entries.len()).collect::<Vec<_>>();
        by_generated.sort_by_key(|i| entries[*i].generated.offset);

        constructs.sort_by_key(|c| {
            (c.generated.start, std::cmp::Reverse(c.generated.end))
        });

        Self {
            entries,
            by_generated,
            constructs,
            lines,
        }
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    pub fn constructs(&self) -> &[Construct] {
        &self.constructs
    }

    /// Total length of verbatim text.
    ///
    /// This is the same whether measured in the original or generated
    ///   text.
    pub fn mapped_len(&self) -> usize {
        self.entries.iter().map(|e| e.generated.len).sum()
    }

    /// Generated offset of the original `offset`,
    ///   if it lies within verbatim text.
    pub fn to_generated(&self, offset: SourceFileSize) -> Option<usize> {
        let i = self
            .entries
            .partition_point(|e| e.original.end() <= offset);

        self.entries.get(i)?.generated_offset(offset)
    }

    /// Original offset of the generated `offset`,
    ///   if it lies within verbatim text.
    pub fn to_original(&self, offset: usize) -> Option<SourceFileSize> {
        self.entry_at_generated(offset)?.original_offset(offset)
    }

    /// Generated span of an original span lying entirely within one
    ///   entry.
    pub fn map_original_span(&self, span: Span) -> Option<GeneratedSpan> {
        let entry = self.entries.iter().find(|e| e.original.contains(span))?;

        let offset = entry.generated.offset
            + (span.offset() - entry.original.offset()) as usize;

        // Lines are shared with the original text from the start of the
        //   entry.
        let (line, col) = if span.line() == entry.original.line() {
            let cols = (span.col() - entry.original.col()) as usize;
            (entry.generated.line, entry.generated.col + cols)
        } else {
            let lines = (span.line() - entry.original.line()) as usize;
            (entry.generated.line + lines, span.col() as usize)
        };

        Some(GeneratedSpan::new(offset, span.len() as usize, line, col))
    }

    /// Original span of the generated range `[offset, offset + len)`.
    ///
    /// Yields [`None`] unless the range lies entirely within verbatim
    ///   text,
    ///     meaning that the range is synthetic.
    pub fn map_generated_range(
        &self,
        offset: usize,
        len: usize,
    ) -> Option<Span> {
        let entry = self.entry_at_generated(offset)?;

        if offset + len > entry.generated.end() {
            return None;
        }

        let start = entry.original_offset(offset)?;
        let len = len.try_into().ok()?;
        let (line, col) = self.lines.position(start);

        Some(Span::new(start, len, line, col, entry.original.context()))
    }

    /// Original span for the generated range `[offset, offset + len)`,
    ///   attributing synthetic text to its innermost enclosing construct,
    ///   or failing that to the nearest preceding verbatim text.
    ///
    /// Yields [`None`] only if nothing precedes the range at all.
    pub fn remap_or_enclosing(
        &self,
        offset: usize,
        len: usize,
    ) -> Option<Span> {
        if let Some(span) = self.map_generated_range(offset, len) {
            return Some(span);
        }

        let end = offset + len;
        let construct = self
            .constructs
            .iter()
            .filter(|c| c.generated.start <= offset && end <= c.generated.end)
            .last();

        if let Some(construct) = construct {
            return Some(construct.original);
        }

        let preceding = self
            .by_generated
            .partition_point(|i| self.entries[*i].generated.offset <= offset);

        preceding
            .checked_sub(1)
            .and_then(|i| self.by_generated.get(i))
            .map(|i| self.entries[*i].original)
    }

    fn entry_at_generated(&self, offset: usize) -> Option<&MapEntry> {
        let i = self
            .by_generated
            .partition_point(|i| self.entries[*i].generated.end() <= offset);

        self.by_generated
            .get(i)
            .map(|i| &self.entries[*i])
            .filter(|e| e.generated.range().contains(&offset))
    }
}

fn coalesce(entries: Vec<MapEntry>) -> Vec<MapEntry> {
    let mut out = Vec::<MapEntry>::with_capacity(entries.len());

    for entry in entries {
        match out.last_mut() {
            Some(prev) if prev.is_contiguous_with(&entry) => {
                if let Some(original) = prev.original.merge(entry.original) {
                    prev.original = original;
                    prev.generated.len += entry.generated.len;
                    continue;
                }

                out.push(entry);
            }
            _ => out.push(entry),
        }
    }

    out
}
