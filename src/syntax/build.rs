// Syntax tree builder
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

//! Write template source and its syntax tree simultaneously.
//!
//! ```
//! use weft::{span::Context, syntax::{AttrSpec, SyntaxNode, TreeBuilder}};
//!
//! let mut b = TreeBuilder::new(Context::new(1), "Views/Index.cshtml");
//! b.directive("model", &["MyApp.Person"]);
//! b.element("p", &[AttrSpec::Literal("class", "name")], |b| {
//!     b.expr("Model.Name");
//! });
//!
//! let tree = b.finish();
//!
//! assert_eq!(
//!     "@model MyApp.Person\n<p class=\"name\">@Model.Name</p>",
//!     tree.source().text(),
//! );
//! assert!(matches!(tree.nodes()[1], SyntaxNode::Element(_)));
//! ```

use super::{
    AttributeNode, AttributeValue, BlockNode, CodeKind, CodeNode,
    DirectiveBody, DirectiveNode, ElementNode, SyntaxNode, SyntaxTree,
    ValuePart,
};
use crate::{
    global::{LineSize, SourceFileSize},
    source::SourceDocument,
    span::{Context, Span},
};

/// Attribute to be written by [`TreeBuilder`].
#[derive(Debug, Clone, Copy)]
pub enum AttrSpec<'a> {
    /// `name="value"`
    Literal(&'a str, &'a str),

    /// `name="@code"`
    Code(&'a str, &'a str),

    /// `name`
    Minimized(&'a str),

    /// `name="..."` with interleaved literal and code parts.
    Parts(&'a str, &'a [PartSpec<'a>]),
}

/// Part of an [`AttrSpec::Parts`] value.
#[derive(Debug, Clone, Copy)]
pub enum PartSpec<'a> {
    Literal(&'a str),

    /// Written as `@code`.
    Code(&'a str),

    /// Written as `@{code}`.
    Statement(&'a str),
}

/// Position within the text being written.
#[derive(Debug, Clone, Copy)]
struct Mark(SourceFileSize, LineSize, LineSize);

/// Builder for a [`SyntaxTree`] and its source text.
///
/// Each method appends both source text and the corresponding node to the
///   current level of the tree;
///     methods accepting a closure descend into a new level for the
///     duration of that closure.
pub struct TreeBuilder {
    ctx: Context,
    path: String,
    text: String,
    line: LineSize,
    col: LineSize,
    frames: Vec<Vec<SyntaxNode>>,
}

impl TreeBuilder {
    pub fn new<P: Into<String>>(ctx: Context, path: P) -> Self {
        Self {
            ctx,
            path: path.into(),
            text: String::new(),
            line: 0,
            col: 0,
            frames: vec![vec![]],
        }
    }

    /// Complete the tree.
    pub fn finish(mut self) -> SyntaxTree {
        let nodes = self.frames.drain(..).next().unwrap_or_default();
        let source = SourceDocument::new(self.ctx, self.path, self.text);

        SyntaxTree::new(source, nodes)
    }

    /// Markup text.
    pub fn text(&mut self, text: &str) -> &mut Self {
        let span = self.write(text);
        self.push(SyntaxNode::Text(span))
    }

    /// `@*comment*@`
    pub fn comment(&mut self, comment: &str) -> &mut Self {
        let start = self.mark();
        self.write("@*");
        self.write(comment);
        self.write("*@");

        let span = self.since(start);
        self.push(SyntaxNode::Comment(span))
    }

    /// `@code`
    pub fn expr(&mut self, code: &str) -> &mut Self {
        let node = self.implicit_expr(code);
        self.push(SyntaxNode::Code(node))
    }

    /// `@(code)`
    pub fn explicit_expr(&mut self, code: &str) -> &mut Self {
        let node =
            self.delimited(CodeKind::ExplicitExpression, "@(", code, Some(")"));
        self.push(SyntaxNode::Code(node))
    }

    /// `@{code}`
    pub fn statement(&mut self, code: &str) -> &mut Self {
        let node = self.block_stmt(code);
        self.push(SyntaxNode::Code(node))
    }

    /// `@{code` with no closing brace.
    pub fn unterminated_statement(&mut self, code: &str) -> &mut Self {
        let node = self.delimited(CodeKind::Statement, "@{", code, None);
        self.push(SyntaxNode::Code(node))
    }

    /// A run of statements within a [`TreeBuilder::block`],
    ///   written without delimiters.
    pub fn code(&mut self, code: &str) -> &mut Self {
        let span = self.write(code);

        self.push(SyntaxNode::Code(CodeNode {
            kind: CodeKind::Statement,
            span,
            content: span,
            terminated: true,
        }))
    }

    /// `@{ ... }` interleaving [`TreeBuilder::code`] and markup.
    pub fn block<F: FnOnce(&mut Self)>(&mut self, f: F) -> &mut Self {
        let start = self.mark();
        self.write("@{");
        let children = self.descend(f);
        self.write("}");

        let span = self.since(start);
        self.push(SyntaxNode::Block(BlockNode {
            span,
            children,
            terminated: true,
        }))
    }

    /// `<name attrs>...</name>`
    pub fn element<F: FnOnce(&mut Self)>(
        &mut self,
        name: &str,
        attrs: &[AttrSpec],
        f: F,
    ) -> &mut Self {
        self.build_element(name, attrs, ElementShape::Closed, false, f)
    }

    /// `<!name attrs>...</!name>`,
    ///   opting out of binding.
    pub fn opt_out<F: FnOnce(&mut Self)>(
        &mut self,
        name: &str,
        attrs: &[AttrSpec],
        f: F,
    ) -> &mut Self {
        self.build_element(name, attrs, ElementShape::Closed, true, f)
    }

    /// `<name attrs>...` with no end tag.
    pub fn unclosed<F: FnOnce(&mut Self)>(
        &mut self,
        name: &str,
        attrs: &[AttrSpec],
        f: F,
    ) -> &mut Self {
        self.build_element(name, attrs, ElementShape::Unclosed, false, f)
    }

    /// `<name attrs>` with neither children nor an end tag.
    pub fn void_element(
        &mut self,
        name: &str,
        attrs: &[AttrSpec],
    ) -> &mut Self {
        self.build_element(name, attrs, ElementShape::Unclosed, false, |_| ())
    }

    /// `<name attrs />`
    pub fn self_closing(
        &mut self,
        name: &str,
        attrs: &[AttrSpec],
    ) -> &mut Self {
        let shape = ElementShape::SelfClosing;
        self.build_element(name, attrs, shape, false, |_| ())
    }

    /// `@name tok1 tok2\n`
    pub fn directive(&mut self, name: &str, tokens: &[&str]) -> &mut Self {
        let start = self.mark();
        let (keyword, tokens) = self.directive_head(name, tokens);
        self.write("\n");

        let span = self.since(start);
        self.push(SyntaxNode::Directive(DirectiveNode {
            name: name.into(),
            span,
            keyword,
            tokens,
            body: None,
        }))
    }

    /// `@name tok1 tok2 { markup }\n`
    pub fn directive_block<F: FnOnce(&mut Self)>(
        &mut self,
        name: &str,
        tokens: &[&str],
        f: F,
    ) -> &mut Self {
        let start = self.mark();
        let (keyword, tokens) = self.directive_head(name, tokens);

        self.write(" ");
        let body_start = self.mark();
        self.write("{");
        let content_start = self.mark();
        let children = self.descend(f);
        let content = self.since(content_start);
        self.write("}");
        let body_span = self.since(body_start);
        self.write("\n");

        let span = self.since(start);
        self.push(SyntaxNode::Directive(DirectiveNode {
            name: name.into(),
            span,
            keyword,
            tokens,
            body: Some(DirectiveBody {
                span: body_span,
                content,
                children,
                terminated: true,
            }),
        }))
    }

    /// `@name {code}\n`
    pub fn code_directive(&mut self, name: &str, code: &str) -> &mut Self {
        self.build_code_directive(name, code, true)
    }

    /// `@name {code` with no closing brace.
    pub fn unterminated_code_directive(
        &mut self,
        name: &str,
        code: &str,
    ) -> &mut Self {
        self.build_code_directive(name, code, false)
    }

    fn build_code_directive(
        &mut self,
        name: &str,
        code: &str,
        terminated: bool,
    ) -> &mut Self {
        let start = self.mark();
        let (keyword, tokens) = self.directive_head(name, &[]);

        self.write(" ");
        let body_start = self.mark();
        self.write("{");
        let content = self.write(code);
        if terminated {
            self.write("}");
        }
        let body_span = self.since(body_start);
        if terminated {
            self.write("\n");
        }

        let span = self.since(start);
        self.push(SyntaxNode::Directive(DirectiveNode {
            name: name.into(),
            span,
            keyword,
            tokens,
            body: Some(DirectiveBody {
                span: body_span,
                content,
                children: vec![],
                terminated,
            }),
        }))
    }

    fn directive_head(
        &mut self,
        name: &str,
        tokens: &[&str],
    ) -> (Span, Vec<Span>) {
        let start = self.mark();
        self.write("@");
        self.write(name);
        let keyword = self.since(start);

        let tokens = tokens
            .iter()
            .map(|tok| {
                self.write(" ");
                self.write(tok)
            })
            .collect();

        (keyword, tokens)
    }

    fn build_element<F: FnOnce(&mut Self)>(
        &mut self,
        name: &str,
        attrs: &[AttrSpec],
        shape: ElementShape,
        opt_out: bool,
        f: F,
    ) -> &mut Self {
        let start = self.mark();

        self.write("<");
        if opt_out {
            self.write("!");
        }
        let name_span = self.write(name);

        let attributes = attrs
            .iter()
            .map(|attr| {
                self.write(" ");
                self.attribute(*attr)
            })
            .collect();

        let self_closing = matches!(shape, ElementShape::SelfClosing);
        self.write(if self_closing { " />" } else { ">" });
        let start_tag = self.since(start);

        let children = match shape {
            ElementShape::SelfClosing => vec![],
            _ => self.descend(f),
        };

        let end_tag = match shape {
            ElementShape::Closed => {
                let end_start = self.mark();
                self.write("</");
                if opt_out {
                    self.write("!");
                }
                self.write(name);
                self.write(">");
                Some(self.since(end_start))
            }
            _ => None,
        };

        let span = self.since(start);
        self.push(SyntaxNode::Element(ElementNode {
            name: name.into(),
            name_span,
            start_tag,
            span,
            attributes,
            children,
            end_tag,
            self_closing,
            opt_out,
        }))
    }

    fn attribute(&mut self, attr: AttrSpec) -> AttributeNode {
        let start = self.mark();

        let (name, parts): (&str, Option<Vec<PartSpec>>) = match attr {
            AttrSpec::Literal(name, value) => {
                (name, Some(vec![PartSpec::Literal(value)]))
            }
            AttrSpec::Code(name, code) => {
                (name, Some(vec![PartSpec::Code(code)]))
            }
            AttrSpec::Minimized(name) => (name, None),
            AttrSpec::Parts(name, parts) => (name, Some(parts.to_vec())),
        };

        let name_span = self.write(name);

        let value = parts.map(|parts| {
            self.write("=\"");
            let value_start = self.mark();

            let parts = parts
                .into_iter()
                .filter_map(|part| match part {
                    PartSpec::Literal("") => None,
                    PartSpec::Literal(text) => {
                        Some(ValuePart::Literal(self.write(text)))
                    }
                    PartSpec::Code(code) => {
                        Some(ValuePart::Code(self.implicit_expr(code)))
                    }
                    PartSpec::Statement(code) => {
                        Some(ValuePart::Code(self.block_stmt(code)))
                    }
                })
                .collect();

            let span = self.since(value_start);
            self.write("\"");

            AttributeValue {
                span,
                quote: Some('"'),
                parts,
            }
        });

        AttributeNode {
            name: name.into(),
            name_span,
            span: self.since(start),
            value,
        }
    }

    fn implicit_expr(&mut self, code: &str) -> CodeNode {
        self.delimited(CodeKind::ImplicitExpression, "@", code, Some(""))
    }

    fn block_stmt(&mut self, code: &str) -> CodeNode {
        self.delimited(CodeKind::Statement, "@{", code, Some("}"))
    }

    fn delimited(
        &mut self,
        kind: CodeKind,
        open: &str,
        code: &str,
        close: Option<&str>,
    ) -> CodeNode {
        let start = self.mark();
        self.write(open);
        let content = self.write(code);

        if let Some(close) = close {
            self.write(close);
        }

        CodeNode {
            kind,
            span: self.since(start),
            content,
            terminated: close.is_some(),
        }
    }

    fn descend<F: FnOnce(&mut Self)>(&mut self, f: F) -> Vec<SyntaxNode> {
        self.frames.push(vec![]);
        f(self);
        self.frames.pop().unwrap_or_default()
    }

    fn push(&mut self, node: SyntaxNode) -> &mut Self {
        match self.frames.last_mut() {
            Some(frame) => frame.push(node),
            None => self.frames.push(vec![node]),
        }

        self
    }

    fn mark(&self) -> Mark {
        Mark(self.offset(), self.line, self.col)
    }

    fn since(&self, Mark(offset, line, col): Mark) -> Span {
        Span::new(offset, self.offset() - offset, line, col, self.ctx)
    }

    fn offset(&self) -> SourceFileSize {
        self.text.len().try_into().unwrap_or(SourceFileSize::MAX)
    }

    fn write(&mut self, s: &str) -> Span {
        let start = self.mark();

        for byte in s.bytes() {
            match byte {
                b'\n' => {
                    self.line += 1;
                    self.col = 0;
                }
                _ => self.col += 1,
            }
        }

        self.text.push_str(s);
        self.since(start)
    }
}

#[derive(Debug, Clone, Copy)]
enum ElementShape {
    Closed,
    Unclosed,
    SelfClosing,
}
