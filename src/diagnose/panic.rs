// Diagnostic system panics
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

//! Panics carrying diagnostic information.
//!
//! Compilation never panics on account of a template;
//!   problems with input are reported as [`Record`](super::Record)s and
//!   structural inconsistencies in the IR as
//!   [`Level::InternalError`](super::Level::InternalError) records,
//!     so that the host always receives a document.
//! What remains are violations of invariants that Weft maintains for
//!   itself,
//!     such as a built-in directive grammar failing validation.
//! For those,
//!   [`diagnostic_panic!`] renders the offending spans before panicking
//!   so that the report is still useful to someone trying to work around
//!   the bug.

use super::{
    AnnotatedSpan, Diagnostic, DiagnosticCode, SourceSpanResolver,
    VisualReporter,
};
use std::{
    cell::Cell,
    error::Error,
    fmt::{self, Debug, Display},
};

// Macro exports are unintuitive.
#[cfg(doc)]
use crate::diagnostic_panic;

/// Reporter used to render panics.
///
/// No source document is available where a panic is raised,
///   so spans are rendered by offset.
pub type PanicReporter = VisualReporter<SourceSpanResolver<'static>>;

/// Code of every diagnostic panic.
pub const PANIC_CODE: DiagnosticCode = DiagnosticCode(9999);

/// Summary and spans of a panic.
///
/// Public only for the expansion of [`diagnostic_panic!`].
/// The spans are taken when first described.
pub struct PanicDesc<'a>(pub String, pub Cell<Vec<AnnotatedSpan<'a>>>);

impl<'a> Debug for PanicDesc<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("PanicDesc")
    }
}

impl<'a> Display for PanicDesc<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'a> Error for PanicDesc<'a> {}

impl<'a> Diagnostic for PanicDesc<'a> {
    fn code(&self) -> DiagnosticCode {
        PANIC_CODE
    }

    fn describe(&self) -> Vec<AnnotatedSpan> {
        self.1.take()
    }
}

/// Panic with a rendered report of the given spans.
///
/// The first argument has the form of [`Diagnostic::describe`];
///   the remainder are [`format!`] arguments summarizing the problem.
#[macro_export]
macro_rules! diagnostic_panic {
    ($desc:expr, $($fmt:tt)*) => {{
        use $crate::diagnose::Reporter;

        let mut reporter =
            $crate::diagnose::panic::PanicReporter::new(Default::default());

        let desc = $crate::diagnose::panic::PanicDesc(
            format!($($fmt)*),
            std::cell::Cell::new($desc),
        );

        panic!(
            "internal error:\n{}\n\
             This is a bug in Weft.  Please report it along with the \
             output above.",
            reporter.render(&desc),
        )
    }};
}

/// An alternative to `expect` that reports through
///   [`diagnostic_panic!`].
pub trait DiagnosticPanic {
    type Inner;

    /// Yield the inner value or panic with `msg` and a report of `desc`.
    fn diagnostic_expect(
        self,
        desc: Vec<AnnotatedSpan>,
        msg: &str,
    ) -> Self::Inner;
}

impl<T> DiagnosticPanic for Option<T> {
    type Inner = T;

    fn diagnostic_expect(self, desc: Vec<AnnotatedSpan>, msg: &str) -> T {
        match self {
            Some(val) => val,
            None => diagnostic_panic!(desc, "{msg}"),
        }
    }
}

impl<T, E: Debug> DiagnosticPanic for Result<T, E> {
    type Inner = T;

    fn diagnostic_expect(self, desc: Vec<AnnotatedSpan>, msg: &str) -> T {
        match self {
            Ok(val) => val,
            Err(e) => diagnostic_panic!(desc, "{msg}: {e:?}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::DiagnosticPanic;
    use crate::{diagnose::Annotate, span::dummy::S1};

    #[test]
    fn present_value_is_yielded() {
        assert_eq!(5, Some(5).diagnostic_expect(vec![], "unused"));
        assert_eq!(5, Ok::<_, ()>(5).diagnostic_expect(vec![], "unused"));
    }

    #[should_panic = "grammar rejected"]
    #[test]
    fn missing_value_panics_with_message() {
        None::<()>.diagnostic_expect(
            vec![S1.internal_error("here")],
            "grammar rejected",
        )
    }

    #[should_panic = "This is a bug in Weft"]
    #[test]
    fn error_panics_as_bug() {
        Err::<(), _>("oops")
            .diagnostic_expect(vec![S1.internal_error("here")], "failed")
    }
}
