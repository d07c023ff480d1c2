// Lowering of the syntax tree into IR
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

//! Lower a [`SyntaxTree`] into an [`IrDocument`].
//!
//! Lowering is a single depth-first walk of the syntax tree.
//! It makes no decisions that require configuration:
//!
//!   - markup text becomes [`IrNode::Literal`];
//!   - every element becomes an unbound [`IrNode::ComponentUsage`]
//!       placeholder whose attributes are [`IrNode::HtmlAttribute`]s,
//!         leaving binding to a later pass;
//!   - embedded code becomes [`IrNode::EmbeddedExpression`] or
//!       [`IrNode::EmbeddedStatement`] holding the verbatim code and its
//!       span;
//!   - directives become [`IrNode::RawDirective`]s holding their raw
//!       tokens,
//!         to be classified against the directive registry later; and
//!   - template comments are discarded.
//!
//! Code blocks (`@{ ... }`) have no node of their own;
//!   their statements and markup are lowered in place as siblings.
//!
//! Malformed input that the parser recovered from is lowered as usual with
//!   a [`LowerError`] attached;
//!     lowering never fails.

use crate::{
    diagnose::{Annotate, AnnotatedSpan, Diagnostic, DiagnosticCode},
    fmt::{DisplayWrapper, TtDirective},
    ir::{
        CodeNode as IrCode, CodeToken, ComponentUsage, HtmlAttribute,
        IrDocument, IrNode, LiteralNode, NodeId, RawDirective, RawToken,
    },
    source::SourceDocument,
    span::Span,
    syntax::{
        AttributeNode, CodeKind, CodeNode, DirectiveNode, ElementNode,
        SyntaxNode, SyntaxTree, ValuePart,
    },
};
use std::{
    error::Error,
    fmt::{self, Display},
};
use tracing::{debug, debug_span};

/// Lower `tree` into a new [`IrDocument`].
pub fn lower(tree: &SyntaxTree) -> IrDocument {
    let span = debug_span!("lower", path = tree.source().path());
    let _enter = span.enter();

    let source = tree.source();
    let mut doc = IrDocument::new(source.path(), source.full_span());

    if let Some(class) = doc.class_node_mut() {
        class.name = class_name_for(source.path());
    }

    let mut lowerer = Lowerer { source, doc };
    let method = lowerer.doc.method();
    lowerer.lower_nodes(method, tree.nodes());

    debug!(nodes = lowerer.doc.len(), "lowered syntax tree");
    lowerer.doc
}

/// Derive a host-language class name from a template path.
///
/// The extension is removed and every character that cannot appear in an
///   identifier becomes `_`.
pub fn class_name_for(path: &str) -> String {
    let stem = match path.rfind('.') {
        Some(i) if !path[i..].contains(['/', '\\']) => &path[..i],
        _ => path,
    };

    let mut name = stem
        .trim_start_matches(['/', '\\'])
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();

    match name.chars().next() {
        None => "Template".into(),
        Some(c) if c.is_numeric() => {
            name.insert(0, '_');
            name
        }
        Some(_) => name,
    }
}

struct Lowerer<'a> {
    source: &'a SourceDocument,
    doc: IrDocument,
}

impl<'a> Lowerer<'a> {
    /// Source text of `span`.
    ///
    /// A span outside of the source is a broken parser contract;
    ///   it lowers to empty text and is caught by
    ///   [`IrDocument::validate`] at the stage boundary.
    fn text(&self, span: Span) -> String {
        self.source.slice(span).unwrap_or_default().to_string()
    }

    fn lower_nodes(&mut self, parent: NodeId, nodes: &[SyntaxNode]) {
        for node in nodes {
            self.lower_node(parent, node);
        }
    }

    fn lower_node(&mut self, parent: NodeId, node: &SyntaxNode) {
        match node {
            SyntaxNode::Text(span) => {
                self.literal(parent, *span);
            }

            SyntaxNode::Comment(_) => (),

            SyntaxNode::Code(code) => {
                self.code(parent, code);
            }

            SyntaxNode::Block(block) => {
                if !block.terminated {
                    self.doc.report(&LowerError::UnterminatedBlock(block.span));
                }

                self.lower_nodes(parent, &block.children);
            }

            SyntaxNode::Element(el) => self.element(parent, el),
            SyntaxNode::Directive(dir) => self.directive(parent, dir),
        }
    }

    fn literal(&mut self, parent: NodeId, span: Span) -> NodeId {
        let text = self.text(span);
        self.doc
            .push(parent, IrNode::Literal(LiteralNode { text }), Some(span))
    }

    fn code(&mut self, parent: NodeId, code: &CodeNode) -> NodeId {
        let tokens =
            vec![CodeToken::source(self.text(code.content), code.content)];

        let node = match code.kind {
            CodeKind::ImplicitExpression | CodeKind::ExplicitExpression => {
                IrNode::EmbeddedExpression(IrCode::new(tokens))
            }
            CodeKind::Statement => {
                IrNode::EmbeddedStatement(IrCode::new(tokens))
            }
        };

        let id = self.doc.push(parent, node, Some(code.span));

        if !code.terminated {
            self.doc.attach(id, &LowerError::UnterminatedCode(code.span));
        }

        id
    }

    fn element(&mut self, parent: NodeId, el: &ElementNode) {
        let usage = ComponentUsage {
            tag_name: el.name.clone(),
            name_span: el.name_span,
            start_tag: el.start_tag,
            end_tag: el.end_tag,
            self_closing: el.self_closing,
            opt_out: el.opt_out,
            binding: None,
            structure: None,
        };

        let id = self
            .doc
            .push(parent, IrNode::ComponentUsage(usage), Some(el.span));

        for attr in &el.attributes {
            self.attribute(id, attr);
        }

        self.lower_nodes(id, &el.children);
    }

    fn attribute(&mut self, parent: NodeId, attr: &AttributeNode) {
        let node = HtmlAttribute {
            name: attr.name.clone(),
            name_span: attr.name_span,
            quote: attr.value.as_ref().and_then(|v| v.quote),
            value: attr.value.as_ref().map(|v| v.span),
        };

        let id = self
            .doc
            .push(parent, IrNode::HtmlAttribute(node), Some(attr.span));

        let parts = attr.value.iter().flat_map(|v| v.parts.iter());
        for part in parts {
            match part {
                ValuePart::Literal(span) => {
                    self.literal(id, *span);
                }
                ValuePart::Code(code) => {
                    self.code(id, code);
                }
            }
        }
    }

    fn directive(&mut self, parent: NodeId, dir: &DirectiveNode) {
        let raw = RawDirective {
            name: dir.name.clone(),
            keyword: dir.keyword,
            tokens: dir
                .tokens
                .iter()
                .map(|span| RawToken {
                    text: self.text(*span),
                    span: *span,
                })
                .collect(),
            body: dir.body.as_ref().map(|body| body.content),
        };

        let id = self
            .doc
            .push(parent, IrNode::RawDirective(raw), Some(dir.span));

        let Some(body) = &dir.body else {
            return;
        };

        if !body.terminated {
            self.doc.attach(
                id,
                &LowerError::UnterminatedBody(dir.name.clone(), body.span),
            );
        }

        // A body without markup children is host-language code
        //   (e.g. `functions`).
        if body.children.is_empty() {
            if !body.content.is_empty() {
                let tokens = vec![CodeToken::source(
                    self.text(body.content),
                    body.content,
                )];
                self.doc.push(
                    id,
                    IrNode::CodeBlock(IrCode::new(tokens)),
                    Some(body.content),
                );
            }
        } else {
            self.lower_nodes(id, &body.children);
        }
    }
}

/// Malformed input recovered by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LowerError {
    /// Embedded code is missing its closing delimiter.
    UnterminatedCode(Span),

    /// A code block is missing its closing brace.
    UnterminatedBlock(Span),

    /// The body of the named directive is missing its closing brace.
    UnterminatedBody(String, Span),
}

impl Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use LowerError::*;

        match self {
            UnterminatedCode(_) => write!(f, "unterminated code"),
            UnterminatedBlock(_) => write!(f, "unterminated code block"),
            UnterminatedBody(name, _) => write!(
                f,
                "unterminated body of directive {}",
                TtDirective::wrap(name)
            ),
        }
    }
}

impl Error for LowerError {}

impl Diagnostic for LowerError {
    fn code(&self) -> DiagnosticCode {
        use LowerError::*;

        DiagnosticCode(match self {
            UnterminatedCode(_) => 1001,
            UnterminatedBlock(_) | UnterminatedBody(..) => 1002,
        })
    }

    fn describe(&self) -> Vec<AnnotatedSpan> {
        use LowerError::*;

        match self {
            UnterminatedCode(span) => span
                .error("missing closing delimiter")
                .with_help("this code continues to the end of the document")
                .into(),
            UnterminatedBlock(span) | UnterminatedBody(_, span) => {
                vec![span.error("missing closing `}`")]
            }
        }
    }
}

#[cfg(test)]
mod test;
