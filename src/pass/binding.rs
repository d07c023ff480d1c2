// Binding pass
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

//! Bind every element of a document to descriptors.
//!
//! Elements are visited in document order,
//!   so an element's parent has always been bound before the element
//!   itself.
//! For each element that binds,
//!   this pass
//!
//!   - validates its end tag against its resolved [`TagStructure`];
//!   - converts each attribute matching a descriptor attribute into an
//!       [`IrNode::Property`],
//!         turning literal values into code unless the property is a
//!         string;
//!   - surfaces diagnostics recorded by each descriptor,
//!       once per document; and
//!   - records the [`BindingResult`] on the element.
//!
//! Children of a bound element are checked against the allow-lists of
//!   its descriptors whether or not the children themselves bind.
//!
//! If the catalog cannot be obtained,
//!   nothing binds and a single document-level diagnostic is reported.

use super::{
    DirectiveClassificationPass, DocumentClassificationPass, Pass, PassError,
};
use crate::{
    bind::{
        AttributeDescriptor, AttributeMatch, AttributeQuery, BindError,
        Binder, BindingDescriptor, BindingResult, DescriptorCatalog,
        DescriptorId, DescriptorSource, ImportFilter, TagQuery, TagStructure,
    },
    ir::{
        CodeNode, CodeToken, ComponentUsage, IrDocument, IrNode, NodeId,
        PropertyNode, PropertyTarget,
    },
    span::Span,
};
use fxhash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, trace, warn};

pub struct BindingPass {
    source: Arc<dyn DescriptorSource>,
    require_import: bool,
}

impl BindingPass {
    pub const NAME: &'static str = "binding";
    pub const ORDER: i32 = 300;

    /// Bind against the catalog provided by `source`.
    ///
    /// If `require_import` is set,
    ///   only descriptors admitted by the document's `addTagHelper` and
    ///   `removeTagHelper` directives may bind.
    pub fn new(
        source: Arc<dyn DescriptorSource>,
        require_import: bool,
    ) -> Self {
        Self {
            source,
            require_import,
        }
    }
}

impl Pass for BindingPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn order(&self) -> i32 {
        Self::ORDER
    }

    fn after(&self) -> &'static [&'static str] {
        &[DirectiveClassificationPass::NAME, DocumentClassificationPass::NAME]
    }

    fn execute(&self, doc: &mut IrDocument) -> Result<(), PassError> {
        let catalog = match self.source.snapshot() {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(
                    error = %e,
                    "descriptor catalog unavailable; binding skipped"
                );
                doc.report(&BindError::CatalogUnavailable(e));
                return Ok(());
            }
        };

        let mut binder = Binder::new(&catalog);

        let prefix = doc
            .directive("tagHelperPrefix")
            .and_then(|dir| dir.tokens.first())
            .map(|tok| tok.value().to_string());

        if let Some(prefix) = prefix {
            binder = binder.with_prefix(prefix);
        }

        if self.require_import {
            binder = binder.with_filter(import_filter(doc));
        }

        let mut ctx = BindContext {
            binder,
            catalog: &catalog,
            surfaced: FxHashSet::default(),
            bound: 0,
        };

        let elements =
            doc.find_all(|node| matches!(node, IrNode::ComponentUsage(_)));

        for id in elements {
            ctx.bind_element(doc, id);
        }

        debug!(
            descriptors = catalog.len(),
            bound = ctx.bound,
            "elements bound"
        );

        Ok(())
    }
}

/// Build an [`ImportFilter`] from the document's import directives in
///   document order.
fn import_filter(doc: &mut IrDocument) -> ImportFilter {
    let imports = doc
        .descendants(doc.root())
        .filter_map(|id| match doc.node(id) {
            IrNode::Directive(dir)
                if matches!(
                    dir.name.as_str(),
                    "addTagHelper" | "removeTagHelper"
                ) =>
            {
                let tok = dir.tokens.first()?;
                let value = tok.value().to_string();
                Some((id, dir.name.clone(), value, tok.span()))
            }
            _ => None,
        })
        .collect::<Vec<_>>();

    let mut filter = ImportFilter::default();

    for (id, directive, value, span) in imports {
        let valid = match directive.as_str() {
            "addTagHelper" => filter.add(&value),
            _ => filter.remove(&value),
        };

        if !valid {
            doc.attach(
                id,
                &BindError::InvalidImport {
                    directive,
                    value,
                    span,
                },
            );
        }
    }

    filter
}

/// An element attribute awaiting binding.
struct ElementAttr {
    id: NodeId,
    name: String,
    name_span: Span,
    quote: Option<char>,
    span: Span,
    value: Option<Span>,

    /// Value if it consists solely of literal text.
    literal: Option<String>,
}

struct BindContext<'c> {
    binder: Binder<'c>,
    catalog: &'c DescriptorCatalog,

    /// Descriptors whose diagnostics have been reported.
    surfaced: FxHashSet<DescriptorId>,

    bound: usize,
}

impl<'c> BindContext<'c> {
    fn bind_element(&mut self, doc: &mut IrDocument, id: NodeId) {
        let IrNode::ComponentUsage(usage) = doc.node(id) else {
            return;
        };

        if usage.opt_out {
            trace!(tag = %usage.tag_name, "element opted out of binding");
            return;
        }

        let usage = usage.clone();
        let parent = doc
            .ancestors(id)
            .find(|a| matches!(doc.node(*a), IrNode::ComponentUsage(_)));

        let parent_tag = parent.and_then(|p| match doc.node(p) {
            IrNode::ComponentUsage(p) => Some(p.tag_name.clone()),
            _ => None,
        });

        if let Some(parent) = parent {
            self.check_child(doc, id, parent, &usage);
        }

        let attrs = element_attrs(doc, id);
        let query = TagQuery {
            tag_name: &usage.tag_name,
            parent_tag: parent_tag.as_deref(),
            attributes: attrs
                .iter()
                .map(|attr| AttributeQuery {
                    name: &attr.name,
                    value: attr.literal.as_deref(),
                })
                .collect(),
        };

        let result = self.binder.bind(&query);

        if result.is_empty() {
            return;
        }

        self.bound += 1;
        self.surface_diagnostics(doc, id, &usage, &result);

        let structure = result.structure(self.catalog);
        trace!(tag = %usage.tag_name, %structure, "structure resolved");

        match (structure, usage.end_tag) {
            (TagStructure::SelfClosingOnly, Some(end)) => doc.attach(
                id,
                &BindError::EndTagNotAllowed {
                    tag: usage.tag_name.clone(),
                    span: end,
                },
            ),
            (TagStructure::NormalOnly, _) if usage.self_closing => doc.attach(
                id,
                &BindError::SelfClosingNotAllowed {
                    tag: usage.tag_name.clone(),
                    span: usage.start_tag,
                },
            ),
            _ => (),
        }

        for attr in &attrs {
            self.bind_attribute(doc, attr, &result);
        }

        if let IrNode::ComponentUsage(usage) = doc.node_mut(id) {
            usage.binding = Some(result);
            usage.structure = Some(structure);
        }
    }

    /// Check `id` against the allow-lists of its bound parent.
    fn check_child(
        &self,
        doc: &mut IrDocument,
        id: NodeId,
        parent: NodeId,
        usage: &ComponentUsage,
    ) {
        let IrNode::ComponentUsage(parent) = doc.node(parent) else {
            return;
        };

        let Some(binding) = &parent.binding else {
            return;
        };

        let restricting = binding
            .ids()
            .filter_map(|bound| self.catalog.get(bound))
            .filter(|desc| !desc.allowed_children().is_empty())
            .collect::<Vec<_>>();

        let child = self
            .binder
            .strip_prefix(&usage.tag_name)
            .unwrap_or(&usage.tag_name);

        if restricting.is_empty()
            || restricting.iter().any(|d| d.allows_child(child))
        {
            return;
        }

        let mut allowed = Vec::<String>::new();
        for name in restricting.iter().flat_map(|d| d.allowed_children()) {
            if !allowed.contains(name) {
                allowed.push(name.clone());
            }
        }

        let err = BindError::ChildNotAllowed {
            child: usage.tag_name.clone(),
            parent: parent.tag_name.clone(),
            allowed,
            span: usage.start_tag,
        };

        doc.attach(id, &err);
    }

    fn surface_diagnostics(
        &mut self,
        doc: &mut IrDocument,
        id: NodeId,
        usage: &ComponentUsage,
        result: &BindingResult,
    ) {
        for bound in result.ids() {
            if !self.surfaced.insert(bound) {
                continue;
            }

            let Some(desc) = self.catalog.get(bound) else {
                continue;
            };

            for diag in desc.diagnostics() {
                doc.attach(
                    id,
                    &BindError::DescriptorDiagnostic {
                        descriptor: desc.display_name().to_string(),
                        level: diag.level,
                        message: diag.message.clone(),
                        span: usage.name_span,
                    },
                );
            }
        }
    }

    fn bind_attribute(
        &self,
        doc: &mut IrDocument,
        attr: &ElementAttr,
        result: &BindingResult,
    ) {
        let matched = result
            .ids()
            .filter_map(|bound| Some((bound, self.catalog.get(bound)?)))
            .filter_map(|(bound, desc)| {
                desc.attributes().iter().find_map(|adesc| {
                    adesc
                        .match_name(&attr.name, desc.is_case_sensitive())
                        .map(|m| (bound, desc, adesc, m))
                })
            })
            .collect::<Vec<_>>();

        let Some(&(_, first_desc, first, _)) = matched.first() else {
            return;
        };

        for &(_, desc, adesc, _) in matched.iter().skip(1) {
            if adesc.type_name() != first.type_name() {
                doc.attach(
                    attr.id,
                    &type_conflict(attr, first_desc, first, desc, adesc),
                );
            }
        }

        let is_code = !first.is_string();

        match attr.value {
            None if !first.is_boolean() => doc.attach(
                attr.id,
                &BindError::MinimizedNonBoolean {
                    attribute: attr.name.clone(),
                    type_name: first.type_name().into(),
                    span: attr.span,
                },
            ),
            Some(value) if value.is_empty() && !first.is_string() => doc.attach(
                attr.id,
                &BindError::EmptyNonString {
                    attribute: attr.name.clone(),
                    type_name: first.type_name().into(),
                    span: attr.span,
                },
            ),
            _ => (),
        }

        let targets = matched
            .iter()
            .map(|(bound, _, adesc, m)| PropertyTarget {
                descriptor: *bound,
                property_name: adesc.property_name().into(),
                indexer_key: match m {
                    AttributeMatch::Property => None,
                    AttributeMatch::Indexer(key) => Some(key.clone()),
                },
            })
            .collect();

        trace!(
            attribute = %attr.name,
            type_name = first.type_name(),
            is_code,
            "attribute bound"
        );

        doc.replace(
            attr.id,
            IrNode::Property(PropertyNode {
                attribute_name: attr.name.clone(),
                name_span: attr.name_span,
                quote: attr.quote,
                targets,
                type_name: first.type_name().into(),
                value: attr.value,
                is_code,
            }),
        );

        if is_code {
            literals_to_code(doc, attr.id);
            drop_statements(doc, attr, first.type_name());
        }
    }
}

fn type_conflict(
    attr: &ElementAttr,
    chosen_desc: &BindingDescriptor,
    chosen: &AttributeDescriptor,
    other_desc: &BindingDescriptor,
    other: &AttributeDescriptor,
) -> BindError {
    BindError::TypeConflict {
        attribute: attr.name.clone(),
        span: attr.name_span,
        chosen: (
            chosen_desc.display_name().into(),
            chosen.type_name().into(),
        ),
        other: (other_desc.display_name().into(), other.type_name().into()),
    }
}

/// Attributes of the element `id` that have not yet been bound.
fn element_attrs(doc: &IrDocument, id: NodeId) -> Vec<ElementAttr> {
    doc.children(id)
        .iter()
        .filter_map(|child| match doc.node(*child) {
            IrNode::HtmlAttribute(attr) => Some(ElementAttr {
                id: *child,
                name: attr.name.clone(),
                name_span: attr.name_span,
                quote: attr.quote,
                span: doc.nearest_span(*child),
                value: attr.value,
                literal: attr.value.and_then(|_| doc.literal_text(*child)),
            }),
            _ => None,
        })
        .collect()
}

/// Treat the literal value parts of `attr` as host-language code,
///   retaining their spans.
fn literals_to_code(doc: &mut IrDocument, attr: NodeId) {
    for part in doc.children(attr).to_vec() {
        let IrNode::Literal(lit) = doc.node(part) else {
            continue;
        };

        let token = match doc.span(part) {
            Some(span) => CodeToken::source(lit.text.clone(), span),
            None => CodeToken::synthetic(lit.text.clone()),
        };

        doc.replace(
            part,
            IrNode::EmbeddedExpression(CodeNode::new(vec![token])),
        );
    }
}

/// Report and remove code blocks within a code-valued attribute.
///
/// Only expressions can be assigned to a property;
///   the remaining parts still form the value.
fn drop_statements(doc: &mut IrDocument, attr: &ElementAttr, type_name: &str) {
    for part in doc.children(attr.id).to_vec() {
        if !matches!(doc.node(part), IrNode::EmbeddedStatement(_)) {
            continue;
        }

        let span = doc.nearest_span(part);
        debug!(attribute = %attr.name, "statement in code-valued attribute");

        doc.attach(
            attr.id,
            &BindError::StatementInValue {
                attribute: attr.name.clone(),
                type_name: type_name.into(),
                span,
            },
        );
        doc.detach(part);
    }
}

#[cfg(test)]
mod test;
