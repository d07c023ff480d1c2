// Diagnostic system rendering
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

//! Human-readable rendering of diagnostics.
//!
//! Editor tooling consumes [`Record`](super::Record)s directly;
//!   rendering is for command-line hosts,
//!   logs,
//!   and [`diagnostic_panic!`](crate::diagnostic_panic).
//!
//! A report opens with the level,
//!   code,
//!   and message of the diagnostic,
//!   followed by one section per described span:
//!
//! ```text
//! error[WF2001]: directive `model` expects 1 token but found 2
//!   --> Views/Home/Index.cshtml:1:10
//!    |
//!    | @model A B
//!    |          ^ error: unexpected token
//! ```

// NB: `write!` with `\n` is used in place of `writeln!` throughout so that
//   newlines can be found with a single search.

use super::{
    resolver::{
        Column, ResolvedSpanData, SourceLine, SpanResolver, SpanResolverError,
    },
    AnnotatedSpan, Diagnostic, DiagnosticCode, Label, Level,
};
use crate::span::Span;
use std::fmt::{self, Display};

pub trait Reporter {
    /// Render a report of `diagnostic`.
    ///
    /// Rendering does not fail;
    ///   spans that cannot be resolved are reported by offset along with
    ///   the reason,
    ///     so that the diagnostic itself is never lost.
    fn render<'d, D: Diagnostic>(&mut self, diagnostic: &'d D) -> Report<'d, D>;
}

/// Render reports that quote and underline the source text of each span.
pub struct VisualReporter<R: SpanResolver> {
    resolver: R,
}

impl<R: SpanResolver> VisualReporter<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    fn section<'d>(&mut self, aspan: AnnotatedSpan<'d>) -> Section<'d> {
        let AnnotatedSpan(span, level, label) = aspan;
        let label = label.map(|label| (level, label));

        match self.resolver.resolve(span) {
            Ok(rspan) => Section {
                heading: Heading::Resolved {
                    path: rspan.path().to_string(),
                    line: rspan.line_num().get(),
                    col: rspan.col_num(),
                },
                span,
                level: label.as_ref().map_or_else(Level::default, |(l, _)| *l),
                lines: rspan.into_lines(),
                labels: label.into_iter().collect(),
            },

            Err(e) => Section {
                heading: Heading::Unresolved(span),
                span,
                level: label.as_ref().map_or_else(Level::default, |(l, _)| *l),
                lines: vec![],
                labels: std::iter::once(unresolved_label(e))
                    .chain(label)
                    .collect(),
            },
        }
    }
}

impl<R: SpanResolver> Reporter for VisualReporter<R> {
    fn render<'d, D: Diagnostic>(
        &mut self,
        diagnostic: &'d D,
    ) -> Report<'d, D> {
        let mut report = Report {
            diagnostic,
            sections: Vec::new(),
            level: None,
        };

        for aspan in diagnostic.describe() {
            let sec = self.section(aspan);
            report.push(sec);
        }

        report
    }
}

fn unresolved_label(e: SpanResolverError) -> (Level, Label<'static>) {
    (
        Level::Help,
        format!(
            "an error occurred while trying to look up information about \
             this span: {e}"
        )
        .into(),
    )
}

/// A rendered diagnostic.
///
/// The report is produced by its [`Display`] implementation.
#[derive(Debug)]
pub struct Report<'d, D: Diagnostic> {
    diagnostic: &'d D,
    sections: Vec<Section<'d>>,
    level: Option<Level>,
}

impl<'d, D: Diagnostic> Report<'d, D> {
    /// Most severe level of any section,
    ///   or [`Level::Error`] if there are none.
    pub fn level(&self) -> Level {
        self.level.unwrap_or_default()
    }

    pub fn code(&self) -> DiagnosticCode {
        self.diagnostic.code()
    }

    /// Add `sec`,
    ///   merging it into the last section if both describe the same span.
    ///
    /// Only adjacent sections are merged so that a diagnostic may revisit
    ///   a span later in its description.
    fn push(&mut self, sec: Section<'d>) {
        self.level = Some(self.level.map_or(sec.level, |l| l.min(sec.level)));

        match self.sections.last_mut() {
            Some(last) if last.span == sec.span => {
                last.level = last.level.min(sec.level);
                last.labels.extend(sec.labels);
            }
            _ => self.sections.push(sec),
        }
    }
}

impl<'d, D: Diagnostic> Display for Report<'d, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}\n", self.level(), self.code(), self.diagnostic)?;

        for (i, sec) in self.sections.iter().enumerate() {
            if i > 0 {
                write!(f, "\n")?;
            }

            sec.fmt(f)?;
        }

        Ok(())
    }
}

/// Portion of a [`Report`] describing a single [`Span`].
#[derive(Debug, PartialEq, Eq)]
struct Section<'d> {
    heading: Heading,
    span: Span,
    level: Level,
    lines: Vec<SourceLine>,

    /// The first label is placed beside the underline of the last line;
    ///   any others follow the quoted source.
    labels: Vec<(Level, Label<'d>)>,
}

impl<'d> Display for Section<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}\n", self.heading)?;

        let mut labels = self.labels.iter();

        if let Some(last) = self.lines.len().checked_sub(1) {
            write!(f, "   |\n")?;

            for (i, line) in self.lines.iter().enumerate() {
                write!(f, "   | {}\n", line.text())?;
                write!(f, "   | {}", Marks(line.column(), self.level))?;

                match (i == last).then(|| labels.next()).flatten() {
                    Some((level, label)) => write!(f, " {level}: {label}\n")?,
                    None => write!(f, "\n")?,
                }
            }
        }

        for (level, label) in labels {
            write!(f, "   = {level}: {label}\n")?;
        }

        Ok(())
    }
}

/// Location of a section,
///   falling back to offsets when the span could not be resolved.
#[derive(Debug, PartialEq, Eq)]
enum Heading {
    Resolved { path: String, line: u32, col: Column },
    Unresolved(Span),
}

impl Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved { path, line, col } => {
                write!(f, "--> {path}:{line}:{col}")
            }
            Self::Unresolved(span) => write!(
                f,
                "--> {} offset {}--{}",
                span.context(),
                span.offset(),
                span.end()
            ),
        }
    }
}

/// Underline of the columns of a line covered by a span.
///
/// Internal errors are marked with `!` to set them apart from problems
///   with the template.
struct Marks(Column, Level);

impl Display for Marks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(col, level) = self;

        let mark = match level {
            Level::InternalError => "!",
            Level::Error | Level::Warning => "^",
            Level::Note | Level::Help => "-",
        };

        let (start, width) = match *col {
            Column::Endpoints(start, end) => {
                (start.get(), end.get().saturating_sub(start.get()) + 1)
            }
            Column::Before(at) => (at.get(), 1),
        };

        write!(
            f,
            "{}{}",
            " ".repeat(start.saturating_sub(1) as usize),
            mark.repeat(width as usize)
        )
    }
}
