// IR transformation passes
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

//! Ordered transformation of an [`IrDocument`] in place.
//!
//! A [`Pass`] is a named unit of work with an integer
//!   [order key](Pass::order) and optional declared dependencies on other
//!   passes by name
//!     ([`Pass::after`] and [`Pass::before`]).
//! A [`Pipeline`] validates those declarations when it is constructed and
//!   fixes a run order that honors every declared edge,
//!     breaking ties by order key and then by registration order.
//! Numeric order alone is therefore sufficient for passes with no
//!   dependencies,
//!     but a pass that reads the result of another must say so.
//!
//! The canonical passes,
//!   in the order they run,
//!   are:
//!
//!   1. [`DirectiveClassificationPass`];
//!   2. [`DirectiveUsagePass`];
//!   3. [`DocumentClassificationPass`];
//!   4. [`BindingPass`]; and
//!   5. [`ExpressionRewritePass`].
//!
//! Each pass mutates only the IR it is given;
//!   passes share no state with one another or across documents.
//!
//! Failure
//! =======
//! Recoverable problems with the template are attached to the IR as
//!   diagnostics and the pass continues.
//! A pass returns a [`PassError`] only when it cannot continue at all;
//!   the pipeline then records a fatal diagnostic and runs no further
//!   passes,
//!     leaving the IR as it was for the emitter to produce what output it
//!     can.
//! The same is true if the IR fails [`IrDocument::validate`] after any
//!   pass.

mod binding;
mod classify;
mod directives;
mod rewrite;
mod usage;

pub use binding::BindingPass;
pub use classify::{
    page_classifier, DocumentClassificationPass, DocumentClassifier,
    DocumentKind, PredicateClassifier,
};
pub use directives::DirectiveClassificationPass;
pub use rewrite::{ExpressionRewritePass, RewriteError, WrapperRule};
pub use usage::DirectiveUsagePass;

use crate::{
    diagnose::{Annotate, AnnotatedSpan, Diagnostic, DiagnosticCode},
    ir::IrDocument,
    span::Span,
};
use fxhash::FxHashMap;
use petgraph::{algo::tarjan_scc, graph::DiGraph, graph::NodeIndex, Direction};
use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    error::Error,
    fmt::{self, Display},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing::{debug, debug_span, warn};

/// A transformation of an [`IrDocument`].
pub trait Pass: Send + Sync {
    /// Unique name by which other passes may refer to this one.
    fn name(&self) -> &'static str;

    /// Order key;
    ///   lower runs earlier among passes not otherwise constrained.
    fn order(&self) -> i32;

    /// Passes that must run before this one.
    fn after(&self) -> &'static [&'static str] {
        &[]
    }

    /// Passes that must run after this one.
    fn before(&self) -> &'static [&'static str] {
        &[]
    }

    fn execute(&self, doc: &mut IrDocument) -> Result<(), PassError>;
}

/// Passes in validated run order.
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("passes", &self.names())
            .finish()
    }
}

impl Pipeline {
    /// Validate `passes` and fix their run order.
    ///
    /// `passes` is in registration order.
    pub fn new(passes: Vec<Box<dyn Pass>>) -> Result<Self, PipelineError> {
        let mut graph = DiGraph::<usize, ()>::with_capacity(passes.len(), 0);
        let mut by_name = FxHashMap::<&'static str, NodeIndex>::default();

        for (i, pass) in passes.iter().enumerate() {
            let node = graph.add_node(i);

            if by_name.insert(pass.name(), node).is_some() {
                return Err(PipelineError::Duplicate(pass.name()));
            }
        }

        for (i, pass) in passes.iter().enumerate() {
            let node = NodeIndex::new(i);
            let lookup = |dep: &'static str| {
                by_name.get(dep).copied().ok_or(
                    PipelineError::UnknownDependency {
                        pass: pass.name(),
                        dependency: dep,
                    },
                )
            };

            for dep in pass.after() {
                graph.add_edge(lookup(*dep)?, node, ());
            }

            for dep in pass.before() {
                graph.add_edge(node, lookup(*dep)?, ());
            }
        }

        check_cycles(&graph, &passes)?;

        let order = run_order(&graph, &passes);
        let mut slots = passes.into_iter().map(Some).collect::<Vec<_>>();
        let passes = order
            .into_iter()
            .filter_map(|i| slots.get_mut(i).and_then(Option::take))
            .collect();

        Ok(Self { passes })
    }

    /// Names of passes in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run each pass over `doc`.
    ///
    /// Cancellation is checked before each pass.
    /// A failing pass or a structural inconsistency stops the pipeline with
    ///   a fatal diagnostic on `doc`;
    ///     this is not an `Err`,
    ///     since the document remains usable for best-effort output.
    pub fn run(
        &self,
        doc: &mut IrDocument,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        for pass in &self.passes {
            cancel.check()?;

            let span = debug_span!("pass", name = pass.name());
            let _enter = span.enter();

            if let Err(e) = pass.execute(doc) {
                warn!(error = %e, "pass failed; remaining passes skipped");
                doc.report(&e);
                return Ok(());
            }

            if let Err(e) = doc.validate() {
                warn!(error = %e, "structural inconsistency after pass");
                doc.report(&e);
                return Ok(());
            }

            debug!(
                nodes = doc.len(),
                diagnostics = doc.collect_diagnostics().len(),
                "pass complete"
            );
        }

        Ok(())
    }
}

/// Every non-trivial strongly connected component is a cycle.
fn check_cycles(
    graph: &DiGraph<usize, ()>,
    passes: &[Box<dyn Pass>],
) -> Result<(), PipelineError> {
    let name = |node: NodeIndex| passes[graph[node]].name();

    let cycle = tarjan_scc(graph).into_iter().find(|scc| {
        scc.len() > 1 || graph.neighbors(scc[0]).any(|n| n == scc[0])
    });

    match cycle {
        None => Ok(()),
        Some(scc) => {
            let mut names = scc.into_iter().map(name).collect::<Vec<_>>();
            names.sort_unstable();
            Err(PipelineError::Cycle(names))
        }
    }
}

/// Topological order of an acyclic `graph`,
///   choosing among ready passes by `(order, registration)`.
fn run_order(
    graph: &DiGraph<usize, ()>,
    passes: &[Box<dyn Pass>],
) -> Vec<usize> {
    let key = |node: NodeIndex| {
        let i = graph[node];
        Reverse((passes[i].order(), i))
    };

    let mut pending = graph
        .node_indices()
        .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect::<Vec<_>>();

    let mut ready = graph
        .node_indices()
        .filter(|n| pending[n.index()] == 0)
        .map(key)
        .collect::<BinaryHeap<_>>();

    let mut order = Vec::with_capacity(passes.len());

    while let Some(Reverse((_, i))) = ready.pop() {
        order.push(i);

        let dependents =
            graph.neighbors_directed(NodeIndex::new(i), Direction::Outgoing);

        for next in dependents {
            pending[next.index()] -= 1;
            if pending[next.index()] == 0 {
                ready.push(key(next));
            }
        }
    }

    order
}

/// Cooperative cancellation of a compilation.
///
/// Clones share state;
///   cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A compilation was cancelled before completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compilation cancelled")
    }
}

impl Error for Cancelled {}

/// A pass could not continue.
///
/// This represents an internal error rather than a problem with the
///   template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassError {
    /// The pass found the IR in a state it cannot handle.
    ///
    /// The span is that of the offending node,
    ///   or of the whole document.
    Aborted {
        pass: &'static str,
        reason: String,
        span: Span,
    },
}

impl Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted { pass, reason, .. } => {
                write!(f, "pass `{pass}` aborted: {reason}")
            }
        }
    }
}

impl Error for PassError {}

impl Diagnostic for PassError {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode(9002)
    }

    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            Self::Aborted { span, .. } => vec![
                span.internal_error("while processing this"),
                span.note("output is incomplete"),
            ],
        }
    }
}

/// Invalid pass declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Two passes share a name.
    Duplicate(&'static str),

    /// A pass declared a dependency on a pass that was not registered.
    UnknownDependency {
        pass: &'static str,
        dependency: &'static str,
    },

    /// Declared dependencies form a cycle among the named passes.
    Cycle(Vec<&'static str>),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PipelineError::*;

        match self {
            Duplicate(name) => write!(f, "duplicate pass `{name}`"),
            UnknownDependency { pass, dependency } => write!(
                f,
                "pass `{pass}` depends on unknown pass `{dependency}`"
            ),
            Cycle(names) => write!(
                f,
                "pass dependencies form a cycle: {}",
                names.join(", ")
            ),
        }
    }
}

impl Error for PipelineError {}
