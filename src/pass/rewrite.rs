// Expression rewrite pass
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

//! Wrap bound code values in a canonical form determined by the type of
//!   the property they are assigned to.
//!
//! A [`WrapperRule`] names a host-language type along with the text to
//!   splice before and after the user's expression.
//! The spliced text is synthetic;
//!   the user's own tokens are left untouched,
//!     so their spans continue to map exactly into the generated
//!     output.
//!
//! For example,
//!   given [`WrapperRule::model_expression`],
//!   the attribute `asp-for="Name"` of a property of that type becomes
//!
//! ```text
//! ModelExpressionProvider.CreateModelExpression(
//!     ViewData, __model => __model.Name)
//! ```
//!
//! where only `Name` maps back to the template.

use super::{BindingPass, Pass, PassError};
use crate::{
    diagnose::{Annotate, AnnotatedSpan, Diagnostic, DiagnosticCode},
    fmt::{DisplayWrapper, TtQuote},
    ir::{CodeToken, IrDocument, IrNode, NodeId, PropertyNode},
    span::Span,
};
use std::{
    error::Error,
    fmt::{self, Display},
};
use tracing::trace;

/// Text spliced around code values assigned to properties of a given
///   type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperRule {
    type_name: String,
    prefix: String,
    suffix: String,
}

impl WrapperRule {
    pub fn new<T, P, S>(type_name: T, prefix: P, suffix: S) -> Self
    where
        T: Into<String>,
        P: Into<String>,
        S: Into<String>,
    {
        Self {
            type_name: type_name.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Lambda-wrapped member access for model expressions.
    pub fn model_expression() -> Self {
        Self::new(
            "global::Microsoft.AspNetCore.Mvc.ViewFeatures.ModelExpression",
            "ModelExpressionProvider.CreateModelExpression(\
             ViewData, __model => __model.",
            ")",
        )
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Whether this rule applies to a property of type `type_name`.
    ///
    /// A leading `global::` qualifier is not significant.
    pub fn applies_to(&self, type_name: &str) -> bool {
        unqualified(&self.type_name) == unqualified(type_name)
    }
}

fn unqualified(type_name: &str) -> &str {
    type_name.strip_prefix("global::").unwrap_or(type_name)
}

pub struct ExpressionRewritePass {
    rules: Vec<WrapperRule>,
}

impl ExpressionRewritePass {
    pub const NAME: &'static str = "expression-rewrite";
    pub const ORDER: i32 = 400;

    pub fn new(rules: Vec<WrapperRule>) -> Self {
        Self { rules }
    }

    fn rule_for(&self, prop: &PropertyNode) -> Option<&WrapperRule> {
        self.rules.iter().find(|rule| rule.applies_to(&prop.type_name))
    }

    fn rewrite(
        &self,
        doc: &mut IrDocument,
        id: NodeId,
        rule: &WrapperRule,
    ) -> Result<(), RewriteError> {
        let parts = doc.children(id).to_vec();

        // An empty value has already been diagnosed by binding.
        let (Some(&first), Some(&last)) = (parts.first(), parts.last()) else {
            return Ok(());
        };

        if let Some(&stmt) = parts.iter().find(|part| {
            !matches!(doc.node(**part), IrNode::EmbeddedExpression(_))
        }) {
            return Err(RewriteError::UnwrappableValue {
                type_name: rule.type_name.clone(),
                span: doc.nearest_span(stmt),
            });
        }

        if let IrNode::EmbeddedExpression(code) = doc.node_mut(first) {
            code.tokens.insert(0, CodeToken::synthetic(rule.prefix.as_str()));
        }

        if let IrNode::EmbeddedExpression(code) = doc.node_mut(last) {
            code.tokens.push(CodeToken::synthetic(rule.suffix.as_str()));
        }

        Ok(())
    }
}

impl Pass for ExpressionRewritePass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn order(&self) -> i32 {
        Self::ORDER
    }

    fn after(&self) -> &'static [&'static str] {
        &[BindingPass::NAME]
    }

    fn execute(&self, doc: &mut IrDocument) -> Result<(), PassError> {
        let props = doc.find_all(|node| matches!(node, IrNode::Property(_)));

        for id in props {
            let IrNode::Property(prop) = doc.node(id) else {
                continue;
            };

            if !prop.is_code || prop.value.is_none() {
                continue;
            }

            let Some(rule) = self.rule_for(prop) else {
                continue;
            };

            trace!(
                attribute = %prop.attribute_name,
                type_name = %rule.type_name,
                "wrapping value"
            );

            if let Err(e) = self.rewrite(doc, id, rule) {
                doc.attach(id, &e);
            }
        }

        Ok(())
    }
}

/// A bound value could not be wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// Value contains a statement rather than only expressions.
    UnwrappableValue { type_name: String, span: Span },
}

impl Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnwrappableValue { type_name, .. } => write!(
                f,
                "value of type {} must be an expression",
                TtQuote::wrap(type_name),
            ),
        }
    }
}

impl Error for RewriteError {}

impl Diagnostic for RewriteError {
    fn code(&self) -> DiagnosticCode {
        match self {
            Self::UnwrappableValue { .. } => DiagnosticCode(4001),
        }
    }

    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            Self::UnwrappableValue { span, .. } => span
                .error("statements cannot appear here")
                .with_help("use an expression such as `@Model.Name`")
                .into(),
        }
    }
}
