// Template syntax tree
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

//! Concrete syntax tree handed to the compiler by the template parser.
//!
//! The parser itself lives outside of this crate;
//!   this module defines only the contract that it must satisfy.
//! Every node carries the exact [`Span`] of the source text it was parsed
//!   from,
//!     and children are ordered as they appear in the source.
//! The tree is plain data:
//!   fields are public so that any parser may construct it,
//!   and nothing in the compiler mutates it.
//!
//! Malformed input that the parser was still able to recover from is
//!   represented in the tree rather than rejected
//!     (e.g. a code block missing its closing brace has
//!       [`CodeNode::terminated`] unset).
//! It is the job of the [lowerer](crate::lower) to turn such nodes into
//!   diagnostics.
//!
//! Tests and tools that have no parser available may use [`TreeBuilder`],
//!   which writes template source text and its syntax tree at the same
//!   time.

mod build;

pub use build::{AttrSpec, PartSpec, TreeBuilder};

use crate::{source::SourceDocument, span::Span};

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    source: SourceDocument,
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    pub fn new(source: SourceDocument, nodes: Vec<SyntaxNode>) -> Self {
        Self { source, nodes }
    }

    pub fn source(&self) -> &SourceDocument {
        &self.source
    }

    /// Top-level nodes of the document,
    ///   in source order.
    pub fn nodes(&self) -> &[SyntaxNode] {
        &self.nodes
    }
}

/// A node of the concrete syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    /// Markup text outside of any element tag,
    ///   including whitespace.
    Text(Span),

    /// Template comment (`@* ... *@`),
    ///   which produces no output.
    Comment(Span),

    Element(ElementNode),
    Code(CodeNode),
    Block(BlockNode),
    Directive(DirectiveNode),
}

impl SyntaxNode {
    /// Span of the entire node,
    ///   including any delimiters.
    pub fn span(&self) -> Span {
        match self {
            Self::Text(span) | Self::Comment(span) => *span,
            Self::Element(el) => el.span,
            Self::Code(code) => code.span,
            Self::Block(block) => block.span,
            Self::Directive(dir) => dir.span,
        }
    }
}

/// A markup element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementNode {
    /// Tag name exactly as written,
    ///   including any tag helper prefix but excluding a leading `!`.
    pub name: String,
    pub name_span: Span,

    /// The start tag from `<` through `>` or `/>`.
    pub start_tag: Span,

    /// The entire element from the start of its start tag through the end
    ///   of its end tag,
    ///     or the end of its last child if the end tag is missing.
    pub span: Span,

    pub attributes: Vec<AttributeNode>,
    pub children: Vec<SyntaxNode>,

    /// End tag,
    ///   if one was written.
    pub end_tag: Option<Span>,

    /// Whether the start tag ends with `/>`.
    pub self_closing: bool,

    /// Whether the tag name was prefixed with `!`,
    ///   opting the element out of binding.
    pub opt_out: bool,
}

/// An attribute within a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeNode {
    pub name: String,
    pub name_span: Span,

    /// The entire attribute,
    ///   including its value and any quotes.
    pub span: Span,

    /// Value of the attribute;
    ///   [`None`] if the attribute is minimized
    ///     (e.g. `<input disabled>`).
    pub value: Option<AttributeValue>,
}

/// Value of an [`AttributeNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    /// The value between its quotes.
    pub span: Span,

    /// Quote character,
    ///   if any.
    pub quote: Option<char>,

    /// Literal and code parts of the value,
    ///   in source order.
    pub parts: Vec<ValuePart>,
}

/// A segment of an [`AttributeValue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuePart {
    Literal(Span),
    Code(CodeNode),
}

impl ValuePart {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(span) => *span,
            Self::Code(code) => code.span,
        }
    }
}

/// Kind of embedded code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    /// `@expr`
    ImplicitExpression,

    /// `@(expr)`
    ExplicitExpression,

    /// `@{ statements }`,
    ///   or a run of statements within a [`BlockNode`].
    Statement,
}

/// Embedded host-language code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeNode {
    pub kind: CodeKind,

    /// Entire node including the transition (`@`) and delimiters.
    pub span: Span,

    /// The code itself,
    ///   excluding delimiters.
    pub content: Span,

    /// Whether the closing delimiter was found.
    ///
    /// Always `true` for implicit expressions,
    ///   which have no closing delimiter.
    pub terminated: bool,
}

/// A code block (`@{ ... }`) interleaving code and markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNode {
    pub span: Span,

    /// [`SyntaxNode::Code`] statement runs and markup,
    ///   in source order.
    pub children: Vec<SyntaxNode>,

    /// Whether the closing brace was found.
    pub terminated: bool,
}

/// A directive such as `@model Foo` or `@section Scripts { ... }`.
///
/// The parser knows only the directive's shape,
///   not its grammar;
///     tokens are split on whitespace and classified later against the
///     [directive registry](crate::directive::DirectiveRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveNode {
    /// Directive name without the transition.
    pub name: String,

    /// Entire directive including its body and any trailing newline.
    pub span: Span,

    /// `@name`.
    pub keyword: Span,

    /// Raw token spans following the keyword.
    pub tokens: Vec<Span>,

    pub body: Option<DirectiveBody>,
}

/// Braced body of a block directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveBody {
    /// Body including braces.
    pub span: Span,

    /// Body between the braces.
    pub content: Span,

    /// Markup children for markup bodies (e.g. `section`);
    ///   empty for code bodies (e.g. `functions`),
    ///     whose code is `content`.
    pub children: Vec<SyntaxNode>,

    /// Whether the closing brace was found.
    pub terminated: bool,
}
