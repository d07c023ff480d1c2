// Directive classification pass
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

//! Classify raw directives against a [`DirectiveRegistry`].
//!
//! Every [`IrNode::RawDirective`] is either rewritten into a typed
//!   [`IrNode::Directive`] or,
//!     if it does not satisfy its grammar,
//!     dropped with a [`DirectiveError`].
//! A few directives restructure the document as they are classified:
//!
//!   - `using` adds an [`IrNode::Using`] to the namespace;
//!   - the code of `functions` moves to class level; and
//!   - `section` becomes an [`IrNode::Section`] holding its markup.

use super::{Pass, PassError};
use crate::{
    directive::{DirectiveError, DirectiveRegistry},
    ir::{
        IrDocument, IrNode, NodeId, SectionNode, TypedDirective, UsingNode,
    },
};
use std::sync::Arc;
use tracing::trace;

pub struct DirectiveClassificationPass {
    registry: Arc<DirectiveRegistry>,
}

impl DirectiveClassificationPass {
    pub const NAME: &'static str = "directive-classification";
    pub const ORDER: i32 = 100;

    pub fn new(registry: Arc<DirectiveRegistry>) -> Self {
        Self { registry }
    }
}

impl Pass for DirectiveClassificationPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn order(&self) -> i32 {
        Self::ORDER
    }

    fn execute(&self, doc: &mut IrDocument) -> Result<(), PassError> {
        let raws = doc.find_all(|node| matches!(node, IrNode::RawDirective(_)));

        for id in raws {
            // Within the body of a dropped directive.
            if !doc.is_attached(id) {
                continue;
            }

            let IrNode::RawDirective(raw) = doc.node(id) else {
                continue;
            };

            let span = doc.nearest_span(id);

            let typed = match self.registry.try_parse(raw, span) {
                Ok((desc, tokens)) => TypedDirective {
                    name: desc.name().to_string(),
                    kind: desc.kind(),
                    keyword: raw.keyword,
                    tokens,
                },
                Err(e) => {
                    trace!(
                        directive = %raw.name,
                        error = %e,
                        "directive dropped"
                    );
                    drop_directive(doc, id, e);
                    continue;
                }
            };

            match typed.name.as_str() {
                "using" => {
                    if let Some(tok) = typed.tokens.first() {
                        let using = UsingNode {
                            namespace: tok.value().to_string(),
                        };
                        let ns = doc.namespace();
                        doc.push(ns, IrNode::Using(using), Some(tok.span()));
                    }
                }

                "functions" => {
                    let class = doc.class();
                    let code = doc
                        .children(id)
                        .iter()
                        .copied()
                        .filter(|child| {
                            matches!(doc.node(*child), IrNode::CodeBlock(_))
                        })
                        .collect::<Vec<_>>();

                    for child in code {
                        doc.reparent(child, class);
                    }
                }

                "section" => {
                    let name = typed
                        .tokens
                        .first()
                        .map(|tok| tok.value().to_string())
                        .unwrap_or_default();

                    doc.replace(id, IrNode::Section(SectionNode { name }));
                    continue;
                }

                _ => (),
            }

            doc.replace(id, IrNode::Directive(typed));
        }

        Ok(())
    }
}

/// Report `e` and remove the directive `id` along with its body.
///
/// The diagnostic is reported to the document since the node will no
///   longer be reachable.
fn drop_directive(doc: &mut IrDocument, id: NodeId, e: DirectiveError) {
    doc.report(&e);
    doc.detach(id);
}
