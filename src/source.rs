// Template source documents
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

//! Immutable template source text and its identity.
//!
//! A [`SourceDocument`] is a single version of a template as it was handed
//!   to the upstream parser.
//! Everything produced by the compiler for that version---IR,
//!   bindings,
//!   diagnostics,
//!   and the source map---is
//!   only meaningful relative to that exact text,
//!     and so a document carries both a caller-assigned `version` and a
//!     [`Checksum`] of its contents;
//!       see [`CompiledDocument::is_current_for`][is_current_for].
//!
//! The document also owns a [`LineIndex`] so that byte offsets may be
//!   converted into the line/column pairs that [`Span`]s carry.
//!
//! [is_current_for]: crate::compile::CompiledDocument::is_current_for

use crate::{
    global::{LineSize, SourceFileSize, TokenLength},
    span::{Context, Span},
};
use memchr::memchr_iter;
use std::fmt::{self, Display};

/// One version of a template source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    ctx: Context,
    path: String,
    text: String,
    checksum: Checksum,
    version: u64,
    lines: LineIndex,
}

impl SourceDocument {
    /// Create a document from its path and text,
    ///   computing its checksum.
    ///
    /// The `path` is used for class name derivation,
    ///   document classification,
    ///   and diagnostic output;
    ///     it is never read from the filesystem.
    pub fn new<P: Into<String>, T: Into<String>>(
        ctx: Context,
        path: P,
        text: T,
    ) -> Self {
        let text = text.into();
        let lines = LineIndex::new(&text);
        let checksum = Checksum::compute(&text);

        Self {
            ctx,
            path: path.into(),
            text,
            checksum,
            version: 0,
            lines,
        }
    }

    /// Associate a caller-defined version with this document.
    pub fn with_version(self, version: u64) -> Self {
        Self { version, ..self }
    }

    /// Use an externally supplied checksum rather than the computed one.
    ///
    /// Hosts that already hash their documents
    ///   (e.g. for a build cache)
    ///   may supply that hash so that it appears in the generated checksum
    ///   pragma.
    pub fn with_checksum(self, checksum: Checksum) -> Self {
        Self { checksum, ..self }
    }

    pub fn context(&self) -> Context {
        self.ctx
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    /// Length of the source text in bytes.
    pub fn len(&self) -> SourceFileSize {
        self.text.len().try_into().unwrap_or(SourceFileSize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Produce a span of `len` bytes at `offset` with an accurate line and
    ///   column.
    pub fn span(&self, offset: SourceFileSize, len: TokenLength) -> Span {
        let (line, col) = self.lines.position(offset);
        Span::new(offset, len, line, col, self.ctx)
    }

    /// A span covering the entire document.
    ///
    /// This is the span used for document-level diagnostics.
    pub fn full_span(&self) -> Span {
        self.span(0, self.len())
    }

    /// Whether `span` is a valid byte interval of this document.
    pub fn contains(&self, span: Span) -> bool {
        span.context() == self.ctx && span.end() <= self.len()
    }

    /// Source text of the provided span.
    ///
    /// Yields [`None`] if the span does not belong to this document,
    ///   exceeds its bounds,
    ///   or does not fall on UTF-8 character boundaries.
    pub fn slice(&self, span: Span) -> Option<&str> {
        if span.context() != self.ctx {
            return None;
        }

        self.text
            .get(span.offset() as usize..span.end() as usize)
    }
}

/// Identity of the contents of a [`SourceDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    algorithm: String,
    hex: String,
}

impl Checksum {
    /// Algorithm identifier used by [`Checksum::compute`].
    pub const FXHASH64: &'static str = "fxhash64";

    /// Externally computed checksum.
    pub fn new<A: Into<String>, H: Into<String>>(algorithm: A, hex: H) -> Self {
        Self {
            algorithm: algorithm.into(),
            hex: hex.into(),
        }
    }

    /// Compute a checksum of `text`.
    ///
    /// This is not a cryptographic hash;
    ///   it is used only to detect that a compiled artifact is stale.
    pub fn compute(text: &str) -> Self {
        Self {
            algorithm: Self::FXHASH64.into(),
            hex: format!("{:016x}", fxhash::hash64(text.as_bytes())),
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

/// Byte offsets of the start of each line of a source text.
///
/// The first line always begins at offset `0`,
///   so the index is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex(Vec<SourceFileSize>);

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(memchr_iter(b'\n', text.as_bytes()).map(|nl| {
                (nl + 1).try_into().unwrap_or(SourceFileSize::MAX)
            }))
            .collect();

        Self(starts)
    }

    /// Number of lines.
    ///
    /// A text ending in a newline has an empty final line.
    pub fn line_count(&self) -> usize {
        self.0.len()
    }

    /// 0-indexed line and byte column of `offset`.
    ///
    /// Offsets beyond the end of the text resolve relative to the last
    ///   line.
    pub fn position(&self, offset: SourceFileSize) -> (LineSize, LineSize) {
        let Self(starts) = self;

        let line = match starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        };

        let line_start = starts.get(line).copied().unwrap_or(0);

        (
            line.try_into().unwrap_or(LineSize::MAX),
            offset - line_start,
        )
    }

    /// Byte offset of the start of the 0-indexed `line`,
    ///   if it exists.
    pub fn line_start(&self, line: LineSize) -> Option<SourceFileSize> {
        self.0.get(line as usize).copied()
    }
}
