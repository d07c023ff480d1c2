// Intermediate representation
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

//! Syntax-independent intermediate representation (IR) of a template.
//!
//! The IR is a tree of [`IrNode`]s stored in an arena owned by an
//!   [`IrDocument`] and addressed by [`NodeId`].
//! Passes rewrite the tree in place by detaching,
//!   inserting,
//!   replacing,
//!   and reparenting nodes;
//!     a detached node remains in the arena but is no longer reachable
//!     from the root,
//!       and so is invisible to every later stage.
//! No subtree is ever shared between two parents.
//!
//! Every document has the same skeleton,
//!   created by [`IrDocument::new`]:
//!
//! ```text
//!   Document (spans the entire source)
//!   `- Namespace
//!      |- Using*
//!      `- Class
//!         |- Member* / CodeBlock*
//!         `- Method
//!            `- (template body)
//! ```
//!
//! Spans
//! =====
//! Nodes originating from source text carry the [`Span`] of that text;
//!   synthetic nodes
//!     (the skeleton above,
//!       injected members,
//!       etc.)
//!   carry none.
//! [`IrDocument::validate`] enforces that every spanned node lies within
//!   the span of its nearest spanned ancestor and that spanned siblings do
//!   not overlap.
//! Tokens of embedded code ([`CodeToken`]) are likewise either spanned
//!   user code or synthetic text spliced in by a pass.

use crate::{
    bind::{BindingResult, DescriptorId, TagStructure},
    diagnose::{
        Annotate, AnnotatedSpan, Diagnostic, DiagnosticCode, Diagnostics,
        Record,
    },
    directive::{DirectiveKind, DirectiveToken, DirectiveTokens},
    span::Span,
};
use std::{
    error::Error,
    fmt::{self, Display},
};

/// Index of a node within its [`IrDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A fragment of embedded host-language code.
///
/// User code retains its original span so that it can be mapped verbatim;
///   text spliced in by the compiler has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeToken {
    text: String,
    span: Option<Span>,
}

impl CodeToken {
    /// Code copied from the source at `span`.
    pub fn source<S: Into<String>>(text: S, span: Span) -> Self {
        Self {
            text: text.into(),
            span: Some(span),
        }
    }

    /// Compiler-generated code with no source origin.
    pub fn synthetic<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            span: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn is_synthetic(&self) -> bool {
        self.span.is_none()
    }
}

/// A node of the intermediate representation.
#[derive(Debug, Clone, PartialEq)]
pub enum IrNode {
    Document,
    Namespace(NamespaceNode),

    /// A namespace import,
    ///   whose span is that of the imported namespace token.
    Using(UsingNode),

    Class(ClassNode),

    /// A synthetic class member,
    ///   such as an injected property.
    Member(MemberNode),

    Method(MethodNode),

    /// A directive as written,
    ///   prior to classification against the directive registry.
    RawDirective(RawDirective),

    /// A directive whose tokens have been validated and typed.
    Directive(TypedDirective),

    /// Markup to be written to the output as-is.
    Literal(LiteralNode),

    /// Code whose value is written to the output.
    EmbeddedExpression(CodeNode),

    /// Code executed for its effect.
    EmbeddedStatement(CodeNode),

    /// Code placed at class level
    ///   (e.g. the body of a `functions` directive).
    CodeBlock(CodeNode),

    /// A named markup section whose children are its body.
    Section(SectionNode),

    /// A markup element that may be bound to descriptors.
    ComponentUsage(ComponentUsage),

    /// An element attribute that is not bound to any descriptor;
    ///   children are its value parts.
    HtmlAttribute(HtmlAttribute),

    /// An element attribute bound to a descriptor property;
    ///   children are its value parts.
    Property(PropertyNode),
}

impl IrNode {
    /// Human-readable name of the node variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Namespace(..) => "Namespace",
            Self::Using(..) => "Using",
            Self::Class(..) => "Class",
            Self::Member(..) => "Member",
            Self::Method(..) => "Method",
            Self::RawDirective(..) => "RawDirective",
            Self::Directive(..) => "Directive",
            Self::Literal(..) => "Literal",
            Self::EmbeddedExpression(..) => "EmbeddedExpression",
            Self::EmbeddedStatement(..) => "EmbeddedStatement",
            Self::CodeBlock(..) => "CodeBlock",
            Self::Section(..) => "Section",
            Self::ComponentUsage(..) => "ComponentUsage",
            Self::HtmlAttribute(..) => "HtmlAttribute",
            Self::Property(..) => "Property",
        }
    }

    /// Whether this node is shaped like a markup tag.
    ///
    /// Closing behavior can only be inferred across tag-shaped nodes.
    pub fn is_tag(&self) -> bool {
        matches!(self, Self::ComponentUsage(..))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamespaceNode {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingNode {
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassNode {
    pub name: String,
    pub base: Option<String>,
    pub interfaces: Vec<String>,

    /// Host-language attributes applied to the class,
    ///   without brackets.
    pub attributes: Vec<String>,

    pub type_params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberNode {
    /// Host-language attributes applied to the member,
    ///   without brackets.
    pub attributes: Vec<String>,
    pub type_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodNode {
    /// Everything preceding the method name,
    ///   such as modifiers and return type.
    pub signature: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDirective {
    pub name: String,
    pub keyword: Span,
    pub tokens: Vec<RawToken>,

    /// Content of the braced body,
    ///   if any.
    pub body: Option<Span>,
}

/// An unclassified directive token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedDirective {
    pub name: String,
    pub kind: DirectiveKind,
    pub keyword: Span,
    pub tokens: DirectiveTokens,
}

impl TypedDirective {
    /// Content of the token at `index`,
    ///   if present.
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(DirectiveToken::content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralNode {
    pub text: String,
}

/// Embedded code as an ordered sequence of tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeNode {
    pub tokens: Vec<CodeToken>,
}

impl CodeNode {
    pub fn new(tokens: Vec<CodeToken>) -> Self {
        Self { tokens }
    }

    /// Concatenated text of all tokens.
    pub fn text(&self) -> String {
        self.tokens.iter().map(CodeToken::text).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionNode {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentUsage {
    /// Tag name as written,
    ///   including any prefix.
    pub tag_name: String,
    pub name_span: Span,
    pub start_tag: Span,
    pub end_tag: Option<Span>,
    pub self_closing: bool,
    pub opt_out: bool,

    /// Descriptors bound to this element;
    ///   [`None`] until binding has run or if nothing bound.
    pub binding: Option<BindingResult>,

    /// Resolved structural constraint of a bound element.
    pub structure: Option<TagStructure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlAttribute {
    pub name: String,
    pub name_span: Span,
    pub quote: Option<char>,

    /// Span of the value between its quotes;
    ///   [`None`] for minimized attributes.
    pub value: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNode {
    /// Attribute name as written.
    pub attribute_name: String,
    pub name_span: Span,
    pub quote: Option<char>,

    /// Descriptor properties assigned by this attribute,
    ///   in descriptor order.
    pub targets: Vec<PropertyTarget>,

    /// Host-language type of the value.
    ///
    /// If bound descriptors disagree,
    ///   this is the type of the first target.
    pub type_name: String,

    /// Span of the value between its quotes;
    ///   [`None`] for minimized attributes.
    pub value: Option<Span>,

    /// Whether the value is host-language code rather than a string.
    pub is_code: bool,
}

/// A descriptor property set by a bound attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTarget {
    pub descriptor: DescriptorId,

    /// Host-language property name.
    pub property_name: String,

    /// Key of an indexer assignment for attributes matched by prefix.
    pub indexer_key: Option<String>,
}

/// Arena entry for a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEntry {
    node: IrNode,
    span: Option<Span>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    diagnostics: Vec<Record>,
}

impl NodeEntry {
    pub fn node(&self) -> &IrNode {
        &self.node
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Diagnostics attached to this node.
    pub fn diagnostics(&self) -> &[Record] {
        &self.diagnostics
    }
}

/// The intermediate representation of one template document.
#[derive(Debug, Clone, PartialEq)]
pub struct IrDocument {
    nodes: Vec<NodeEntry>,
    path: String,
    source_span: Span,
    namespace: NodeId,
    class: NodeId,
    method: NodeId,
    kind: Option<String>,
    diagnostics: Diagnostics,
}

impl IrDocument {
    /// Create the document skeleton for a source of `path` spanning
    ///   `source_span`.
    pub fn new<P: Into<String>>(path: P, source_span: Span) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            path: path.into(),
            source_span,
            namespace: NodeId(0),
            class: NodeId(0),
            method: NodeId(0),
            kind: None,
            diagnostics: Diagnostics::new(source_span),
        };

        let root = doc.alloc(IrNode::Document, Some(source_span), None);
        doc.namespace =
            doc.push(root, IrNode::Namespace(NamespaceNode::default()), None);
        doc.class =
            doc.push(doc.namespace, IrNode::Class(ClassNode::default()), None);
        doc.method =
            doc.push(doc.class, IrNode::Method(MethodNode::default()), None);

        doc
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn namespace(&self) -> NodeId {
        self.namespace
    }

    pub fn class(&self) -> NodeId {
        self.class
    }

    /// The method whose body is the template.
    pub fn method(&self) -> NodeId {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Span of the entire source document.
    pub fn source_span(&self) -> Span {
        self.source_span
    }

    /// Name of the [`DocumentKind`](crate::pass::DocumentKind) assigned
    ///   by document classification.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn set_kind<S: Into<String>>(&mut self, kind: S) {
        self.kind = Some(kind.into());
    }

    /// Arena entry for `id`.
    ///
    /// Panics
    /// ======
    /// Panics if `id` was not allocated by this document.
    pub fn entry(&self, id: NodeId) -> &NodeEntry {
        &self.nodes[id.index()]
    }

    fn entry_mut(&mut self, id: NodeId) -> &mut NodeEntry {
        &mut self.nodes[id.index()]
    }

    pub fn node(&self, id: NodeId) -> &IrNode {
        &self.entry(id).node
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut IrNode {
        &mut self.entry_mut(id).node
    }

    pub fn span(&self, id: NodeId) -> Option<Span> {
        self.entry(id).span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.entry(id).children
    }

    /// Number of nodes reachable from the root,
    ///   including the root.
    pub fn len(&self) -> usize {
        self.descendants(self.root()).count()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    fn alloc(
        &mut self,
        node: IrNode,
        span: Option<Span>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);

        self.nodes.push(NodeEntry {
            node,
            span,
            parent,
            children: Vec::new(),
            diagnostics: Vec::new(),
        });

        id
    }

    /// Append a new node as the last child of `parent`.
    pub fn push(
        &mut self,
        parent: NodeId,
        node: IrNode,
        span: Option<Span>,
    ) -> NodeId {
        let id = self.alloc(node, span, Some(parent));
        self.entry_mut(parent).children.push(id);
        id
    }

    /// Insert a new node as the child of `parent` at `index`,
    ///   shifting later siblings.
    ///
    /// An `index` past the end appends.
    pub fn insert(
        &mut self,
        parent: NodeId,
        index: usize,
        node: IrNode,
        span: Option<Span>,
    ) -> NodeId {
        let id = self.alloc(node, span, Some(parent));
        let children = &mut self.entry_mut(parent).children;
        children.insert(index.min(children.len()), id);
        id
    }

    /// Replace the node at `id`,
    ///   retaining its span,
    ///   children,
    ///   and position,
    ///     and returning the old node.
    pub fn replace(&mut self, id: NodeId, node: IrNode) -> IrNode {
        std::mem::replace(self.node_mut(id), node)
    }

    /// Unlink `id` from its parent.
    ///
    /// The node and its subtree become unreachable.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.entry_mut(id).parent.take() {
            self.entry_mut(parent).children.retain(|child| *child != id);
        }
    }

    /// Move `id` to be the last child of `parent`.
    pub fn reparent(&mut self, id: NodeId, parent: NodeId) {
        let index = self.children(parent).len();
        self.reparent_at(id, parent, index);
    }

    /// Move `id` to be the child of `parent` at `index`.
    pub fn reparent_at(&mut self, id: NodeId, parent: NodeId, index: usize) {
        self.detach(id);

        self.entry_mut(id).parent = Some(parent);
        let children = &mut self.entry_mut(parent).children;
        children.insert(index.min(children.len()), id);
    }

    /// Position of `id` among its siblings.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        self.parent(id).and_then(|parent| {
            self.children(parent).iter().position(|c| *c == id)
        })
    }

    /// `id` and every node reachable from it,
    ///   in depth-first pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// Parent of `id`,
    ///   its parent,
    ///   and so on up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root() || self.ancestors(id).any(|a| a == self.root())
    }

    /// Span of `id` or,
    ///   if it is synthetic,
    ///   that of its nearest spanned ancestor.
    ///
    /// Diagnostics on synthetic nodes are attributed to this span.
    pub fn nearest_span(&self, id: NodeId) -> Span {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|n| self.span(n))
            .unwrap_or(self.source_span)
    }

    /// Attach a diagnostic to `id`.
    pub fn attach<D: Diagnostic>(&mut self, id: NodeId, diag: &D) {
        let fallback = self.nearest_span(id);
        let record = Record::from_diagnostic(diag, fallback);
        self.entry_mut(id).diagnostics.push(record);
    }

    /// Report a diagnostic that is not attached to any node.
    ///
    /// This should be preferred for diagnostics about nodes that are
    ///   about to be detached,
    ///     since diagnostics of unreachable nodes are never collected.
    pub fn report<D: Diagnostic>(&mut self, diag: &D) {
        self.diagnostics.report(diag);
    }

    /// Diagnostics not attached to any node.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// All diagnostics:
    ///   those reported to the document followed by those attached to
    ///   reachable nodes in pre-order.
    pub fn collect_diagnostics(&self) -> Diagnostics {
        let mut all = self.diagnostics.clone();

        for id in self.descendants(self.root()) {
            all.extend(self.entry(id).diagnostics.iter().cloned());
        }

        all
    }

    /// Whether any diagnostic recorded so far is an error.
    pub fn has_errors(&self) -> bool {
        self.collect_diagnostics().has_errors()
    }

    /// Concatenated text of the children of `id` if every child is a
    ///   literal.
    pub fn literal_text(&self, id: NodeId) -> Option<String> {
        self.children(id)
            .iter()
            .map(|child| match self.node(*child) {
                IrNode::Literal(lit) => Some(lit.text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Reachable nodes matching `pred`,
    ///   in pre-order.
    pub fn find_all<F>(&self, pred: F) -> Vec<NodeId>
    where
        F: Fn(&IrNode) -> bool,
    {
        self.descendants(self.root())
            .filter(|id| pred(self.node(*id)))
            .collect()
    }

    /// Reachable typed directives named `name`,
    ///   in document order.
    pub fn directives<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (NodeId, &'a TypedDirective)> + 'a {
        self.descendants(self.root()).filter_map(move |id| match self.node(id) {
            IrNode::Directive(dir) if dir.name == name => Some((id, dir)),
            _ => None,
        })
    }

    /// First reachable typed directive named `name`.
    pub fn directive(&self, name: &str) -> Option<&TypedDirective> {
        self.descendants(self.root()).find_map(|id| match self.node(id) {
            IrNode::Directive(dir) if dir.name == name => Some(dir),
            _ => None,
        })
    }

    pub fn class_node(&self) -> Option<&ClassNode> {
        match self.node(self.class) {
            IrNode::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn class_node_mut(&mut self) -> Option<&mut ClassNode> {
        match self.node_mut(self.class) {
            IrNode::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Verify the span invariants of every reachable node.
    ///
    /// See the [module-level documentation](self).
    pub fn validate(&self) -> Result<(), StructuralError> {
        for id in self.descendants(self.root()) {
            let entry = self.entry(id);

            if let Some(span) = entry.span {
                if !self.source_span.contains(span) {
                    return Err(StructuralError::OutOfSource {
                        node: id,
                        kind: entry.node.kind_name(),
                        span,
                        source: self.source_span,
                    });
                }

                let enclosing = self.ancestors(id).find_map(|a| self.span(a));
                if let Some(enclosing) = enclosing {
                    if !enclosing.contains(span) {
                        return Err(StructuralError::OutsideParent {
                            node: id,
                            kind: entry.node.kind_name(),
                            span,
                            enclosing,
                        });
                    }
                }
            }

            let mut spans = entry
                .children
                .iter()
                .filter_map(|c| self.span(*c).map(|s| (s, *c)))
                .collect::<Vec<_>>();
            spans.sort_by_key(|(s, _)| (s.offset(), s.len()));

            for pair in spans.windows(2) {
                if let [(a, _), (b, node)] = pair {
                    if a.overlaps(*b) {
                        return Err(StructuralError::OverlappingSiblings {
                            node: *node,
                            span: *b,
                            sibling: *a,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// Pre-order traversal of a subtree.
///
/// See [`IrDocument::descendants`].
pub struct Descendants<'a> {
    doc: &'a IrDocument,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Walk toward the root.
///
/// See [`IrDocument::ancestors`].
pub struct Ancestors<'a> {
    doc: &'a IrDocument,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.doc.parent(id);
        Some(id)
    }
}

/// Violation of the span invariants of the IR.
///
/// This represents a bug in the compiler or in the upstream parser,
///   never an error in the template itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// A node's span lies outside of the source document.
    OutOfSource {
        node: NodeId,
        kind: &'static str,
        span: Span,
        source: Span,
    },

    /// A node's span is not a sub-span of its nearest spanned ancestor.
    OutsideParent {
        node: NodeId,
        kind: &'static str,
        span: Span,
        enclosing: Span,
    },

    /// Two spanned siblings share source text.
    OverlappingSiblings {
        node: NodeId,
        span: Span,
        sibling: Span,
    },
}

impl Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfSource {
                node, kind, span, ..
            } => write!(
                f,
                "{kind} node {node} has span {span} outside of its source"
            ),
            Self::OutsideParent {
                node, kind, span, ..
            } => write!(
                f,
                "{kind} node {node} has span {span} outside of its parent"
            ),
            Self::OverlappingSiblings { node, span, .. } => write!(
                f,
                "node {node} has span {span} overlapping a sibling"
            ),
        }
    }
}

impl Error for StructuralError {}

impl Diagnostic for StructuralError {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode(9001)
    }

    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            // The offending span may not be resolvable,
            //   so the source span is used as the primary.
            Self::OutOfSource { span, source, .. } => vec![
                source.internal_error("template compilation is incomplete"),
                span.note("this span does not belong to the document"),
            ],
            Self::OutsideParent { span, enclosing, .. } => vec![
                enclosing.internal_error("template compilation is incomplete"),
                span.note("this node escapes its enclosing node"),
            ],
            Self::OverlappingSiblings { span, sibling, .. } => vec![
                span.internal_error("template compilation is incomplete"),
                sibling.note("this sibling overlaps it"),
            ],
        }
    }
}
