// Template compilation
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

//! Compile a [`SyntaxTree`] into a [`CompiledDocument`].
//!
//! A [`Compiler`] is configured once using a [`CompilerBuilder`] and may
//!   then compile any number of documents,
//!     including concurrently;
//!     it holds no state between compilations.
//! Compilation proceeds in stages:
//!
//!   1. the tree is [lowered](crate::lower) into an [`IrDocument`];
//!   2. the [pass pipeline](crate::pass) transforms the IR in place;
//!   3. the IR is [emitted](crate::emit) as text with a
//!        [`SourceMap`];
//!        and
//!   4. diagnostics of every stage are merged in span order.
//!
//! Cancellation is checked between stages and between passes.
//!
//! Every compilation produces output,
//!   even if stages fail;
//!     see [`CompiledDocument::is_complete`].

use crate::{
    bind::{DescriptorCatalog, DescriptorSource},
    config::CompilerOptions,
    diagnose::{panic::DiagnosticPanic, Annotate, Record},
    directive::DirectiveRegistry,
    emit::emit,
    lower::lower,
    pass::{
        page_classifier, BindingPass, CancellationToken, Cancelled,
        DirectiveClassificationPass, DirectiveUsagePass,
        DocumentClassificationPass, DocumentClassifier, DocumentKind,
        ExpressionRewritePass, Pass, Pipeline, PipelineError,
    },
    source::{Checksum, SourceDocument},
    span::Context,
    srcmap::SourceMap,
    syntax::SyntaxTree,
};
use std::sync::Arc;
use tracing::{debug, debug_span};

/// Output of compiling one version of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDocument {
    text: String,

    /// Ordered by span.
    diagnostics: Vec<Record>,

    source_map: SourceMap,

    ctx: Context,
    version: u64,
    checksum: Checksum,
}

impl CompiledDocument {
    /// Generated host-language text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn diagnostics(&self) -> &[Record] {
        &self.diagnostics
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|r| r.level().is_error())
    }

    /// Whether every stage ran to completion.
    ///
    /// If not,
    ///   [`CompiledDocument::text`] is a best-effort partial document and
    ///   at least one fatal diagnostic explains why.
    pub fn is_complete(&self) -> bool {
        !self.diagnostics.iter().any(Record::is_fatal)
    }

    /// Whether this output was compiled from `source` as it is now.
    ///
    /// Output is stale once its document has a new version or content.
    pub fn is_current_for(&self, source: &SourceDocument) -> bool {
        self.ctx == source.context()
            && self.version == source.version()
            && &self.checksum == source.checksum()
    }

    pub fn into_parts(self) -> (String, Vec<Record>, SourceMap) {
        (self.text, self.diagnostics, self.source_map)
    }
}

/// Compiles templates using a fixed configuration.
#[derive(Debug)]
pub struct Compiler {
    pipeline: Pipeline,
    options: CompilerOptions,
}

impl Compiler {
    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::default()
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Names of passes in the order they run.
    pub fn passes(&self) -> Vec<&'static str> {
        self.pipeline.names()
    }

    /// Compile `tree`.
    pub fn compile(&self, tree: &SyntaxTree) -> CompiledDocument {
        // The token is never cancelled.
        self.compile_with_cancellation(tree, &CancellationToken::new())
            .diagnostic_expect(
                vec![tree
                    .source()
                    .full_span()
                    .internal_error("while compiling this template")],
                "compilation cancelled without request",
            )
    }

    /// Compile `tree`,
    ///   abandoning compilation if `cancel` is cancelled before any stage.
    pub fn compile_with_cancellation(
        &self,
        tree: &SyntaxTree,
        cancel: &CancellationToken,
    ) -> Result<CompiledDocument, Cancelled> {
        let source = tree.source();

        let span = debug_span!(
            "compile",
            path = source.path(),
            version = source.version()
        );
        let _enter = span.enter();

        cancel.check()?;
        let mut doc = lower(tree);

        self.pipeline.run(&mut doc, cancel)?;

        cancel.check()?;
        let emitted = emit(&doc, source, &self.options);

        let mut diagnostics = doc.collect_diagnostics();
        diagnostics.extend(emitted.diagnostics.iter().cloned());
        let diagnostics = diagnostics.into_sorted();

        debug!(
            len = emitted.text.len(),
            diagnostics = diagnostics.len(),
            "compilation complete"
        );

        Ok(CompiledDocument {
            text: emitted.text,
            diagnostics,
            source_map: emitted.source_map,
            ctx: source.context(),
            version: source.version(),
            checksum: source.checksum().clone(),
        })
    }
}

/// Configuration of a [`Compiler`].
///
/// Unless otherwise configured,
///   a compiler uses the [built-in directives](DirectiveRegistry::builtin),
///   classifies documents with a `page` directive as pages and all others
///     as views,
///   and binds against an empty descriptor catalog.
pub struct CompilerBuilder {
    registry: Arc<DirectiveRegistry>,
    classifiers: Vec<Arc<dyn DocumentClassifier>>,
    default_kind: DocumentKind,
    descriptors: Arc<dyn DescriptorSource>,
    options: CompilerOptions,
    passes: Vec<Box<dyn Pass>>,
}

impl Default for CompilerBuilder {
    fn default() -> Self {
        Self {
            registry: Arc::new(DirectiveRegistry::builtin()),
            classifiers: vec![
                Arc::new(page_classifier()) as Arc<dyn DocumentClassifier>
            ],
            default_kind: DocumentKind::default(),
            descriptors: Arc::new(Arc::new(DescriptorCatalog::default())),
            options: CompilerOptions::default(),
            passes: vec![],
        }
    }
}

impl CompilerBuilder {
    pub fn registry(mut self, registry: DirectiveRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Replace all document classifiers.
    ///
    /// Classifiers are consulted in the order given.
    pub fn classifiers<I>(mut self, classifiers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn DocumentClassifier>>,
    {
        self.classifiers = classifiers.into_iter().collect();
        self
    }

    /// Consult `classifier` after those already configured.
    pub fn classifier<C: DocumentClassifier + 'static>(
        mut self,
        classifier: C,
    ) -> Self {
        self.classifiers.push(Arc::new(classifier));
        self
    }

    /// Kind of documents that no classifier matches.
    pub fn default_kind(mut self, kind: DocumentKind) -> Self {
        self.default_kind = kind;
        self
    }

    pub fn descriptors<S: DescriptorSource + 'static>(
        mut self,
        source: S,
    ) -> Self {
        self.descriptors = Arc::new(source);
        self
    }

    /// Bind against a fixed catalog.
    pub fn catalog(self, catalog: DescriptorCatalog) -> Self {
        self.descriptors(Arc::new(catalog))
    }

    pub fn options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Run `pass` in addition to the canonical passes.
    ///
    /// Its position is determined by its order key and declared
    ///   dependencies,
    ///     which may name the canonical passes.
    pub fn pass<P: Pass + 'static>(mut self, pass: P) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Validate the pass configuration and produce a [`Compiler`].
    pub fn build(self) -> Result<Compiler, PipelineError> {
        let Self {
            registry,
            classifiers,
            default_kind,
            descriptors,
            options,
            passes: extra,
        } = self;

        let mut passes: Vec<Box<dyn Pass>> = vec![
            Box::new(DirectiveClassificationPass::new(registry.clone())),
            Box::new(DirectiveUsagePass::new(registry)),
            Box::new(DocumentClassificationPass::new(
                classifiers,
                default_kind,
                options.root_namespace().map(String::from),
            )),
            Box::new(BindingPass::new(
                descriptors,
                options.require_descriptor_import(),
            )),
            Box::new(ExpressionRewritePass::new(
                options.wrapper_rules().to_vec(),
            )),
        ];
        passes.extend(extra);

        let pipeline = Pipeline::new(passes)?;
        debug!(passes = ?pipeline.names(), "compiler configured");

        Ok(Compiler { pipeline, options })
    }
}
