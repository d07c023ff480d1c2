// Diagnostic system
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

//! Diagnostic system for error reporting.
//!
//! This system is heavily motivated by Rust's.
//! While the data structures and organization may differ,
//!   the diagnostic output is visually similar.
//!
//! There are two representations of a diagnostic:
//!
//!   1. Errors implementing [`Diagnostic`],
//!        which describe themselves using a series of [`AnnotatedSpan`]s
//!        and can be rendered by a [`Reporter`]; and
//!   2. [`Record`]s,
//!        which are the owned and flattened form carried in the compiled
//!        artifact for consumption by editor tooling.
//!
//! Every stage of the compiler reports into a [`Diagnostics`] sink using
//!   [`Diagnostics::report`],
//!     which performs that flattening.

mod report;
mod resolver;

pub mod panic;

pub use report::{Report, Reporter, VisualReporter};
pub use resolver::{
    Column, ResolvedSpan, ResolvedSpanData, SourceLine, SourceSpanResolver,
    SpanResolver, SpanResolverError,
};

use crate::span::Span;
use core::fmt;
use std::{borrow::Cow, error::Error, fmt::Display};

/// Diagnostic report.
///
/// This describes an error condition or other special event using a series
///   of [`Span`]s to describe the source, cause, and circumstances around
///   an event.
pub trait Diagnostic: Error + Sized {
    /// Stable identifier of this kind of diagnostic.
    ///
    /// Codes are never reused for a different condition,
    ///   allowing editor tooling to filter or link to documentation.
    fn code(&self) -> DiagnosticCode;

    /// Produce a series of [`AnnotatedSpan`]s describing the source and
    ///   circumstances of the diagnostic event.
    fn describe(&self) -> Vec<AnnotatedSpan>;
}

/// Stable identifier of a kind of diagnostic,
///   such as `WF2001`.
///
/// Code ranges by subsystem:
///
///   - `WF1xxx`: lowering of the syntax tree;
///   - `WF2xxx`: directives;
///   - `WF3xxx`: binding;
///   - `WF4xxx`: expression rewriting; and
///   - `WF9xxx`: internal structural inconsistencies.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct DiagnosticCode(pub u16);

impl Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WF{:04}", self.0)
    }
}

/// Diagnostic severity level.
///
/// Levels are used both for entire reports and for styling of individual
///   [`AnnotatedSpan`]s.
///
/// Lower levels are more severe
///   (e.g. level 1 is the worst).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default, Hash)]
#[repr(u8)]
pub enum Level {
    /// An error internal to the compiler that the user cannot resolve,
    ///   but may be able to work around.
    ///
    /// Records of this level are _fatal_:
    ///   they indicate that the output is a best-effort partial document.
    InternalError = 1,

    /// A user-resolvable error.
    ///
    /// These represent errors resulting from the user's input.
    #[default]
    Error,

    /// A condition that does not prevent compilation but likely does not
    ///   do what the user intended.
    Warning,

    /// Useful information that supplements other messages.
    ///
    /// This is most often used when multiple spans are in play for a given
    ///   diagnostic report.
    Note,

    /// Additional advice to the user that may help in debugging or fixing a
    ///   problem.
    ///
    /// These messages may suggest concrete fixes and are intended to
    ///   hopefully replace having to request advice from a human.
    /// Unlike other severity levels which provide concrete factual
    ///   information,
    ///     help messages may be more speculative.
    Help,
}

impl Level {
    /// Whether this level indicates a failed compilation.
    pub fn is_error(self) -> bool {
        self <= Level::Error
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::InternalError => write!(f, "internal error"),
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
            Level::Help => write!(f, "help"),
        }
    }
}

/// A label associated with a report or [`Span`].
///
/// See [`AnnotatedSpan`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Label<'a>(Cow<'a, str>);

impl<'a> Display for Label<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<'a> From<String> for Label<'a> {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

impl<'a> From<&'a str> for Label<'a> {
    fn from(s: &'a str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

/// A span with an associated severity level and optional label.
///
/// Annotated spans are intended to guide users through debugging a
///   diagnostic message by describing important source locations that
///   contribute to a given diagnostic event.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AnnotatedSpan<'l>(Span, Level, Option<Label<'l>>);

impl<'l> AnnotatedSpan<'l> {
    pub fn span(&self) -> Span {
        self.0
    }

    pub fn level(&self) -> Level {
        self.1
    }

    pub fn label(&self) -> Option<&Label<'l>> {
        self.2.as_ref()
    }

    pub fn with_help<L: Into<Label<'l>>>(
        self,
        label: L,
    ) -> [AnnotatedSpan<'l>; 2] {
        let span = self.0;
        [self, span.help(label)]
    }
}

impl<'l> From<AnnotatedSpan<'l>> for Vec<AnnotatedSpan<'l>> {
    fn from(x: AnnotatedSpan<'l>) -> Self {
        vec![x]
    }
}

pub trait Annotate: Sized {
    /// Annotate a [`Span`] with a severity [`Level`] and an optional
    ///   [`Label`] to display alongside of it.
    ///
    /// You may wish to use one of the more specific methods that provide a
    ///   more pleasent interface.
    fn annotate(self, level: Level, label: Option<Label>) -> AnnotatedSpan;

    /// Annotate a span as an internal error that the user is not expected
    ///   to be able to resolve,
    ///     but may be able to work around.
    fn internal_error<'l, L: Into<Label<'l>>>(
        self,
        label: L,
    ) -> AnnotatedSpan<'l> {
        self.annotate(Level::InternalError, Some(label.into()))
    }

    /// Annotate a span with a clarifying label styled as an error.
    ///
    /// This label is intended to augment the error message to help guide
    ///   the user to a resolution.
    /// If the label does not include additional _useful_ information over
    ///   the generic message,
    ///     then it may be omitted in favor of `Annotate::mark_error` to
    ///     simply mark the location of the error.
    ///
    /// (This is not named `err` since it does not return an [`Err`].)
    fn error<'l, L: Into<Label<'l>>>(self, label: L) -> AnnotatedSpan<'l> {
        self.annotate(Level::Error, Some(label.into()))
    }

    /// Like [`Annotate::error`],
    ///   but only styles the span as a [`Level::Error`] without attaching a
    ///   label.
    fn mark_error(self) -> AnnotatedSpan<'static> {
        self.annotate(Level::Error, None)
    }

    /// Annotate a span with a label styled as a warning.
    fn warning<'l, L: Into<Label<'l>>>(self, label: L) -> AnnotatedSpan<'l> {
        self.annotate(Level::Warning, Some(label.into()))
    }

    /// Supplemental annotated span providing additional context for another
    ///   span.
    ///
    /// For example,
    ///   if an attribute is bound by two descriptors that disagree on its
    ///     type,
    ///     then a note span may indicate the attribute that was used to
    ///     decide.
    fn note<'l, L: Into<Label<'l>>>(self, label: L) -> AnnotatedSpan<'l> {
        self.annotate(Level::Note, Some(label.into()))
    }

    /// Provide additional information that may be used to help the user in
    ///   debugging or fixing a diagnostic.
    ///
    /// While the other severity levels denote factual information,
    ///   this provides more loose guidance.
    /// It may also include concrete suggested fixes.
    fn help<'l, L: Into<Label<'l>>>(self, label: L) -> AnnotatedSpan<'l> {
        self.annotate(Level::Help, Some(label.into()))
    }
}

impl<S: Into<Span>> Annotate for S {
    fn annotate(self, level: Level, label: Option<Label>) -> AnnotatedSpan {
        AnnotatedSpan(self.into(), level, label)
    }
}

/// Owned and flattened form of a [`Diagnostic`].
///
/// This is what editor tooling receives:
///   a stable code,
///   a severity,
///   a message,
///   and the primary span.
/// Supplemental labels are folded into the message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    code: DiagnosticCode,
    level: Level,
    message: String,
    span: Span,
}

impl Record {
    pub fn new<M: Into<String>>(
        code: DiagnosticCode,
        level: Level,
        message: M,
        span: Span,
    ) -> Self {
        Self {
            code,
            level,
            message: message.into(),
            span,
        }
    }

    /// Flatten a [`Diagnostic`] into a record.
    ///
    /// The primary span is the first described span;
    ///   if the diagnostic describes no spans,
    ///   `fallback` is used
    ///     (typically the span of the whole document).
    /// The level is the most severe level of any described span,
    ///   defaulting to [`Level::Error`].
    pub fn from_diagnostic<D: Diagnostic>(diag: &D, fallback: Span) -> Self {
        let desc = diag.describe();

        let span = desc.first().map(AnnotatedSpan::span).unwrap_or(fallback);
        let level = desc
            .iter()
            .map(AnnotatedSpan::level)
            .min()
            .filter(|level| *level <= Level::Warning)
            .unwrap_or_default();

        let mut message = diag.to_string();
        for ann in desc.iter().filter(|ann| ann.level() >= Level::Note) {
            if let Some(label) = ann.label() {
                message.push_str(&format!("\n{}: {label}", ann.level()));
            }
        }

        Self {
            code: diag.code(),
            level,
            message,
            span,
        }
    }

    pub fn code(&self) -> DiagnosticCode {
        self.code
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Whether this record indicates that output is a best-effort partial
    ///   document.
    pub fn is_fatal(&self) -> bool {
        self.level == Level::InternalError
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{level}[{code}]: {msg} {span}",
            level = self.level,
            code = self.code,
            msg = self.message,
            span = self.span,
        )
    }
}

/// Ordered sink of [`Record`]s.
///
/// Records are kept in the order they are reported;
///   [`Diagnostics::into_sorted`] produces the final deterministic
///   ordering for the compiled artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    records: Vec<Record>,
    fallback: Option<Span>,
}

impl Diagnostics {
    /// Create a sink whose document-level span is `fallback`.
    pub fn new(fallback: Span) -> Self {
        Self {
            records: Vec::new(),
            fallback: Some(fallback),
        }
    }

    /// Span used for diagnostics that describe no span of their own.
    pub fn fallback_span(&self) -> Span {
        self.fallback.unwrap_or(crate::span::UNKNOWN_SPAN)
    }

    /// Flatten and record a [`Diagnostic`].
    pub fn report<D: Diagnostic>(&mut self, diag: &D) {
        let record = Record::from_diagnostic(diag, self.fallback_span());
        self.records.push(record);
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn extend<I: IntoIterator<Item = Record>>(&mut self, records: I) {
        self.records.extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.records.iter().any(|r| r.level().is_error())
    }

    pub fn has_fatal(&self) -> bool {
        self.records.iter().any(Record::is_fatal)
    }

    /// Consume the sink,
    ///   yielding records ordered by span.
    ///
    /// The sort is stable,
    ///   so records sharing a span retain the order in which they were
    ///   reported.
    pub fn into_sorted(self) -> Vec<Record> {
        let mut records = self.records;
        records.sort_by_key(|r| (r.span.offset(), r.span.len()));
        records
    }
}
