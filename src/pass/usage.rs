// Directive usage pass
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

//! Enforce [`DirectiveUsage`] constraints.
//!
//! A file-scoped directive must appear at the top level of the template,
//!   not within markup or a section.
//! A file-scoped singly-occurring directive may appear only once;
//!   the first occurrence remains in effect and later ones are dropped.
//!
//! The registry only describes grammar,
//!   so these constraints are enforced here rather than when directives
//!   are classified.

use super::{DirectiveClassificationPass, Pass, PassError};
use crate::{
    directive::{DirectiveError, DirectiveRegistry, DirectiveUsage},
    ir::{IrDocument, IrNode},
    span::Span,
};
use fxhash::FxHashMap;
use std::sync::Arc;
use tracing::trace;

pub struct DirectiveUsagePass {
    registry: Arc<DirectiveRegistry>,
}

impl DirectiveUsagePass {
    pub const NAME: &'static str = "directive-usage";
    pub const ORDER: i32 = 110;

    pub fn new(registry: Arc<DirectiveRegistry>) -> Self {
        Self { registry }
    }
}

impl Pass for DirectiveUsagePass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn order(&self) -> i32 {
        Self::ORDER
    }

    fn after(&self) -> &'static [&'static str] {
        &[DirectiveClassificationPass::NAME]
    }

    fn execute(&self, doc: &mut IrDocument) -> Result<(), PassError> {
        let mut first = FxHashMap::<String, Span>::default();
        let ids = doc.find_all(|node| matches!(node, IrNode::Directive(_)));

        for id in ids {
            let IrNode::Directive(dir) = doc.node(id) else {
                continue;
            };

            let Some(usage) = self.registry.get(&dir.name).map(|d| d.usage())
            else {
                continue;
            };

            if !usage.is_file_scoped() {
                continue;
            }

            let name = dir.name.clone();
            let span = doc.nearest_span(id);

            let err = if doc.parent(id) != Some(doc.method()) {
                DirectiveError::MisplacedDirective { name, span }
            } else if usage == DirectiveUsage::FileScopedSinglyOccurring {
                match first.get(&name) {
                    Some(first) => DirectiveError::DuplicateDirective {
                        name,
                        span,
                        first: *first,
                    },
                    None => {
                        first.insert(name, span);
                        continue;
                    }
                }
            } else {
                continue;
            };

            trace!(error = %err, "directive dropped");
            doc.report(&err);
            doc.detach(id);
        }

        Ok(())
    }
}
