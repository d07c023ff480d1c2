// Document classification pass
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

//! Decide what kind of artifact a document produces and configure the
//!   generated class accordingly.
//!
//! The [`DocumentKind`] is chosen by the first [`DocumentClassifier`]
//!   that matches,
//!     in registration order,
//!     falling back to a default kind.
//! The kind determines the base type,
//!   method signature,
//!   and namespace fallback of the generated class.
//!
//! File-scoped directives that survived [`DirectiveUsagePass`] are then
//!   applied to the class:
//!
//!   - `model` is the type argument of a generic base type;
//!   - `inherits` replaces the base type outright;
//!   - `namespace` replaces the namespace;
//!   - `implements`, `attribute`, and `typeparam` are added to the class;
//!   - `inject` adds a property member; and
//!   - `layout` assigns the layout at the start of the template body.
//!
//! [`DirectiveUsagePass`]: super::DirectiveUsagePass

use super::{DirectiveClassificationPass, DirectiveUsagePass, Pass, PassError};
use crate::ir::{
    CodeNode, CodeToken, IrDocument, IrNode, MemberNode, MethodNode,
    NamespaceNode,
};
use std::{fmt::Debug, sync::Arc};
use tracing::debug;

/// Attribute marking a member whose value is supplied by the host.
pub const INJECT_ATTRIBUTE: &str =
    "global::Microsoft.AspNetCore.Mvc.Razor.Internal.RazorInjectAttribute";

/// Shape of a generated artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentKind {
    pub name: String,

    /// Base type of the generated class.
    pub base_type: String,

    /// Type argument of [`DocumentKind::base_type`] when no `model`
    ///   directive is present;
    ///     [`None`] if the base type is not generic.
    pub default_model: Option<String>,

    /// Everything preceding the method name.
    pub method_signature: String,
    pub method_name: String,

    /// Namespace used when neither a `namespace` directive nor a root
    ///   namespace is available.
    pub namespace_fallback: String,
}

impl DocumentKind {
    /// A view rendered by a controller.
    pub fn view() -> Self {
        Self {
            name: "mvc.1.0-view".into(),
            base_type: "global::Microsoft.AspNetCore.Mvc.Razor.RazorPage"
                .into(),
            default_model: Some("dynamic".into()),
            method_signature:
                "public async override global::System.Threading.Tasks.Task"
                    .into(),
            method_name: "ExecuteAsync".into(),
            namespace_fallback: "AspNetCore".into(),
        }
    }

    /// A page routed to directly.
    pub fn page() -> Self {
        Self {
            name: "mvc.1.0-razor-page".into(),
            base_type: "global::Microsoft.AspNetCore.Mvc.RazorPages.Page"
                .into(),
            default_model: None,
            ..Self::view()
        }
    }

    /// Base type given the type declared by a `model` directive,
    ///   if any.
    pub fn base_for(&self, model: Option<&str>) -> String {
        match (&self.default_model, model) {
            (None, _) => self.base_type.clone(),
            (Some(_), Some(model)) => format!("{}<{model}>", self.base_type),
            (Some(default), None) => format!("{}<{default}>", self.base_type),
        }
    }
}

impl Default for DocumentKind {
    fn default() -> Self {
        Self::view()
    }
}

/// Decides whether a document is of a particular [`DocumentKind`].
pub trait DocumentClassifier: Debug + Send + Sync {
    fn kind(&self) -> &DocumentKind;

    fn matches(&self, doc: &IrDocument) -> bool;
}

/// A [`DocumentClassifier`] backed by a predicate.
pub struct PredicateClassifier<F> {
    kind: DocumentKind,
    predicate: F,
}

impl<F> PredicateClassifier<F>
where
    F: Fn(&IrDocument) -> bool + Send + Sync,
{
    pub fn new(kind: DocumentKind, predicate: F) -> Self {
        Self { kind, predicate }
    }
}

impl<F> Debug for PredicateClassifier<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateClassifier")
            .field("kind", &self.kind.name)
            .finish_non_exhaustive()
    }
}

impl<F> DocumentClassifier for PredicateClassifier<F>
where
    F: Fn(&IrDocument) -> bool + Send + Sync,
{
    fn kind(&self) -> &DocumentKind {
        &self.kind
    }

    fn matches(&self, doc: &IrDocument) -> bool {
        (self.predicate)(doc)
    }
}

fn has_page_directive(doc: &IrDocument) -> bool {
    doc.directive("page").is_some()
}

/// Classifies documents having a `page` directive as
///   [`DocumentKind::page`].
pub fn page_classifier() -> PredicateClassifier<fn(&IrDocument) -> bool> {
    PredicateClassifier::new(
        DocumentKind::page(),
        has_page_directive as fn(&IrDocument) -> bool,
    )
}

pub struct DocumentClassificationPass {
    classifiers: Vec<Arc<dyn DocumentClassifier>>,
    default_kind: DocumentKind,
    root_namespace: Option<String>,
}

impl DocumentClassificationPass {
    pub const NAME: &'static str = "document-classification";
    pub const ORDER: i32 = 200;

    pub fn new(
        classifiers: Vec<Arc<dyn DocumentClassifier>>,
        default_kind: DocumentKind,
        root_namespace: Option<String>,
    ) -> Self {
        Self {
            classifiers,
            default_kind,
            root_namespace,
        }
    }

    fn classify(&self, doc: &IrDocument) -> &DocumentKind {
        self.classifiers
            .iter()
            .find(|c| c.matches(doc))
            .map(|c| c.kind())
            .unwrap_or(&self.default_kind)
    }
}

impl Pass for DocumentClassificationPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn order(&self) -> i32 {
        Self::ORDER
    }

    fn after(&self) -> &'static [&'static str] {
        &[DirectiveClassificationPass::NAME, DirectiveUsagePass::NAME]
    }

    fn execute(&self, doc: &mut IrDocument) -> Result<(), PassError> {
        let kind = self.classify(doc).clone();
        debug!(kind = %kind.name, "document classified");

        doc.set_kind(kind.name.as_str());

        let first_token = |doc: &IrDocument, name: &str| {
            doc.directive(name)
                .and_then(|dir| dir.tokens.first())
                .map(|tok| tok.value().to_string())
        };
        let all_tokens = |doc: &IrDocument, name: &str| {
            doc.directives(name)
                .filter_map(|(_, dir)| dir.tokens.first())
                .map(|tok| tok.value().to_string())
                .collect::<Vec<_>>()
        };

        let model = first_token(doc, "model");
        let base = first_token(doc, "inherits")
            .unwrap_or_else(|| kind.base_for(model.as_deref()));

        let namespace = first_token(doc, "namespace").unwrap_or_else(|| {
            namespace_for(doc.path(), self.root_namespace.as_deref())
                .unwrap_or_else(|| kind.namespace_fallback.clone())
        });

        let interfaces = all_tokens(doc, "implements");
        let attributes = all_tokens(doc, "attribute")
            .into_iter()
            .map(|attr| unbracket(&attr).to_string())
            .collect::<Vec<_>>();
        let type_params = all_tokens(doc, "typeparam");

        let injects = doc
            .directives("inject")
            .filter_map(|(_, dir)| Some((dir.token(0)?, dir.token(1)?)))
            .map(|(ty, name)| MemberNode {
                attributes: vec![INJECT_ATTRIBUTE.into()],
                type_name: ty.into(),
                name: name.into(),
            })
            .collect::<Vec<_>>();

        // Quoted as written.
        let layout = doc
            .directive("layout")
            .and_then(|dir| dir.token(0))
            .map(str::to_string);

        if let Some(class) = doc.class_node_mut() {
            class.base = Some(base);
            class.interfaces.extend(interfaces);
            class.attributes.extend(attributes);
            class.type_params.extend(type_params);
        }

        if let IrNode::Namespace(ns) = doc.node_mut(doc.namespace()) {
            *ns = NamespaceNode { name: namespace };
        }

        if let IrNode::Method(method) = doc.node_mut(doc.method()) {
            *method = MethodNode {
                signature: kind.method_signature.clone(),
                name: kind.method_name.clone(),
            };
        }

        let class = doc.class();
        let mut at = doc.index_in_parent(doc.method()).unwrap_or(0);
        for member in injects {
            doc.insert(class, at, IrNode::Member(member), None);
            at += 1;
        }

        if let Some(layout) = layout {
            let stmt = CodeNode::new(vec![CodeToken::synthetic(format!(
                "Layout = {layout};"
            ))]);

            let method = doc.method();
            doc.insert(method, 0, IrNode::EmbeddedStatement(stmt), None);
        }

        Ok(())
    }
}

/// Namespace derived from the directory of `path` beneath `root`.
///
/// Returns [`None`] if there is no root namespace.
fn namespace_for(path: &str, root: Option<&str>) -> Option<String> {
    let root = root?;

    let mut segments = path
        .split(['/', '\\'])
        .filter(|seg| !seg.is_empty())
        .collect::<Vec<_>>();
    segments.pop();

    Some(
        std::iter::once(root.to_string())
            .chain(segments.into_iter().map(identifier))
            .collect::<Vec<_>>()
            .join("."),
    )
}

/// `segment` with every character that cannot appear in an identifier
///   replaced by `_`.
fn identifier(segment: &str) -> String {
    let mut ident = segment
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();

    if ident.starts_with(|c: char| c.is_numeric()) {
        ident.insert(0, '_');
    }

    ident
}

/// Strip the surrounding brackets of a host-language attribute,
///   if present.
fn unbracket(attr: &str) -> &str {
    attr.strip_prefix('[')
        .and_then(|a| a.strip_suffix(']'))
        .unwrap_or(attr)
}

#[cfg(test)]
mod test;
