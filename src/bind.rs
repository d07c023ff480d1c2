// Binding engine
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

//! Binding of markup elements to capability descriptors.
//!
//! An element binds to every [`BindingDescriptor`] in the
//!   [`DescriptorCatalog`] for which
//!
//!   1. at least one [`MatchingRule`] fires,
//!        meaning that its tag name equals the element's
//!          (or is the catch-all `*`),
//!        its parent tag constraint (if any) equals the element's parent,
//!        and each of its [`RequiredAttribute`]s is present; and
//!   2. every [`AttributeDescriptor`] marked required is present on the
//!        element,
//!          by name or by indexer prefix.
//!
//! A descriptor failing (2) is excluded outright,
//!   not down-ranked.
//! Names are compared under each descriptor's case sensitivity.
//! Binding to zero descriptors is not an error;
//!   the element remains plain markup.
//!
//! Structure
//! =========
//! Whether an element may,
//!   must,
//!   or cannot carry an end tag is its [`TagStructure`],
//!     resolved from the rules that fired by [`resolve_structure`] and
//!     falling back to the list of void elements.
//! [`closing_action`] uses the resolved structure to decide how editor
//!   tooling should complete a start tag.

mod catalog;
mod descriptor;

pub use catalog::{
    CatalogBuilder, CatalogError, DescriptorCatalog, DescriptorId,
    DescriptorSource,
};
pub use descriptor::{
    AttributeDescriptor, AttributeMatch, BindingDescriptor,
    DescriptorBuilder, DescriptorDiagnostic, DescriptorKind, MatchingRule,
    NameComparison, RequiredAttribute, ValueComparison,
};

use crate::{
    diagnose::{Annotate, AnnotatedSpan, Diagnostic, DiagnosticCode, Level},
    fmt::{
        DisplayWrapper, ListDisplayWrapper, OrList, TtDirective, TtQuote,
        TtTag,
    },
    global,
    ir::{IrDocument, IrNode, NodeId},
    span::Span,
};
use descriptor::eq_name;
use std::{
    error::Error,
    fmt::{self, Display},
};
use tracing::trace;

/// Whether an element may,
///   must,
///   or cannot carry an end tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagStructure {
    /// No opinion.
    #[default]
    Unspecified,

    /// An end tag is required;
    ///   the element may not self-close.
    NormalOnly,

    /// The element must not have an end tag.
    SelfClosingOnly,

    /// Either form is permitted.
    NormalOrSelfClosing,
}

impl Display for TagStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::NormalOnly => write!(f, "normal-only"),
            Self::SelfClosingOnly => write!(f, "self-closing-only"),
            Self::NormalOrSelfClosing => write!(f, "normal-or-self-closing"),
        }
    }
}

/// Markup elements that never have content or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

pub fn is_void_element(tag_name: &str, case_sensitive: bool) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| eq_name(void, tag_name, case_sensitive))
}

/// Resolve the structural constraint expressed by `rules`,
///   in the order encountered.
///
///   1. [`TagStructure::NormalOrSelfClosing`] wins outright,
///        since denying an end tag while any rule permits one would
///        contradict that rule;
///   2. otherwise the last other opinion is retained; and
///   3. [`TagStructure::Unspecified`] is ignored.
///
/// Returns [`None`] if no rule has an opinion.
pub fn resolve_structure<'a, I>(rules: I) -> Option<TagStructure>
where
    I: IntoIterator<Item = &'a MatchingRule>,
{
    let mut resolved = None;

    for rule in rules {
        match rule.tag_structure() {
            TagStructure::NormalOrSelfClosing => {
                return Some(TagStructure::NormalOrSelfClosing)
            }
            TagStructure::Unspecified => (),
            other => resolved = Some(other),
        }
    }

    resolved
}

/// Resolve the structure of an element named `tag_name`,
///   falling back to the void element list when `rules` have no opinion.
///
/// Plain markup (`case_sensitive` unset) is compared against the void
///   element list case-insensitively.
pub fn infer_structure<'a, I>(
    tag_name: &str,
    case_sensitive: bool,
    rules: I,
) -> TagStructure
where
    I: IntoIterator<Item = &'a MatchingRule>,
{
    resolve_structure(rules).unwrap_or_else(|| {
        if is_void_element(tag_name, case_sensitive) {
            TagStructure::SelfClosingOnly
        } else {
            TagStructure::NormalOrSelfClosing
        }
    })
}

/// An element attribute as seen by the binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeQuery<'a> {
    pub name: &'a str,

    /// Value of the attribute if it consists solely of literal text.
    pub value: Option<&'a str>,
}

/// An element as seen by the binder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQuery<'a> {
    /// Tag name as written,
    ///   including any prefix.
    pub tag_name: &'a str,

    /// Tag name of the nearest enclosing element,
    ///   including any prefix.
    pub parent_tag: Option<&'a str>,

    pub attributes: Vec<AttributeQuery<'a>>,
}

impl<'a> TagQuery<'a> {
    pub fn new(tag_name: &'a str) -> Self {
        Self {
            tag_name,
            parent_tag: None,
            attributes: vec![],
        }
    }

    pub fn parent(mut self, parent_tag: &'a str) -> Self {
        self.parent_tag = Some(parent_tag);
        self
    }

    pub fn attr(mut self, name: &'a str, value: Option<&'a str>) -> Self {
        self.attributes.push(AttributeQuery { name, value });
        self
    }
}

/// A descriptor bound to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundDescriptor {
    pub id: DescriptorId,

    /// Host-language type name of the descriptor.
    pub type_name: String,

    /// Indexes of the descriptor's rules that fired.
    pub rules: Vec<usize>,
}

/// Descriptors bound to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingResult {
    /// Tag name with any prefix removed.
    pub tag_name: String,

    /// Bound descriptors in registration order.
    pub descriptors: Vec<BoundDescriptor>,
}

impl BindingResult {
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DescriptorId> + '_ {
        self.descriptors.iter().map(|bound| bound.id)
    }

    pub fn contains(&self, id: DescriptorId) -> bool {
        self.ids().any(|bound| bound == id)
    }

    /// Every rule that fired,
    ///   in descriptor order and then rule order.
    pub fn fired_rules<'c>(
        &'c self,
        catalog: &'c DescriptorCatalog,
    ) -> impl Iterator<Item = &'c MatchingRule> + 'c {
        self.descriptors.iter().flat_map(move |bound| {
            let rules = catalog.get(bound.id).map(BindingDescriptor::rules);
            bound
                .rules
                .iter()
                .filter_map(move |i| rules.and_then(|rules| rules.get(*i)))
        })
    }

    /// Whether names should be compared case-sensitively for this element.
    ///
    /// This is the case if any bound descriptor is case-sensitive.
    pub fn is_case_sensitive(&self, catalog: &DescriptorCatalog) -> bool {
        self.ids()
            .filter_map(|id| catalog.get(id))
            .any(BindingDescriptor::is_case_sensitive)
    }

    /// Resolved structure of the bound element.
    pub fn structure(&self, catalog: &DescriptorCatalog) -> TagStructure {
        infer_structure(
            &self.tag_name,
            self.is_case_sensitive(catalog),
            self.fired_rules(catalog),
        )
    }
}

/// Admission of descriptors by `addTagHelper` and `removeTagHelper`
///   directives.
///
/// Each directive's value has the form `TypePattern, Origin`,
///   where `TypePattern` is `*`,
///   a type name,
///   or a type name prefix ending in `*`.
/// A descriptor is admitted if the last directive matching it was an
///   addition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportFilter {
    rules: Vec<ImportRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportRule {
    add: bool,
    type_pattern: String,
    origin: String,
}

impl ImportRule {
    fn matches(&self, desc: &BindingDescriptor) -> bool {
        let type_ok = match self.type_pattern.strip_suffix('*') {
            Some(prefix) => desc.name().starts_with(prefix),
            None => desc.name() == self.type_pattern,
        };

        type_ok && desc.origin() == self.origin
    }
}

impl ImportFilter {
    /// Parse `TypePattern, Origin`.
    fn parse(pattern: &str) -> Option<(String, String)> {
        let (ty, origin) = pattern.split_once(',')?;
        let (ty, origin) = (ty.trim(), origin.trim());

        (!ty.is_empty() && !origin.is_empty())
            .then(|| (ty.to_string(), origin.to_string()))
    }

    fn push(&mut self, add: bool, pattern: &str) -> bool {
        match Self::parse(pattern) {
            Some((type_pattern, origin)) => {
                self.rules.push(ImportRule {
                    add,
                    type_pattern,
                    origin,
                });
                true
            }
            None => false,
        }
    }

    /// Record an `addTagHelper` directive,
    ///   returning `false` if `pattern` is malformed.
    pub fn add(&mut self, pattern: &str) -> bool {
        self.push(true, pattern)
    }

    /// Record a `removeTagHelper` directive,
    ///   returning `false` if `pattern` is malformed.
    pub fn remove(&mut self, pattern: &str) -> bool {
        self.push(false, pattern)
    }

    pub fn admits(&self, desc: &BindingDescriptor) -> bool {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(desc))
            .map_or(false, |rule| rule.add)
    }
}

/// Binds elements against a catalog within the scope of one document.
#[derive(Debug, Clone)]
pub struct Binder<'c> {
    catalog: &'c DescriptorCatalog,
    prefix: Option<String>,
    filter: Option<ImportFilter>,
}

impl<'c> Binder<'c> {
    pub fn new(catalog: &'c DescriptorCatalog) -> Self {
        Self {
            catalog,
            prefix: None,
            filter: None,
        }
    }

    /// Only bind elements whose tag name begins with `prefix`,
    ///   matching on the remainder of the name.
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = Some(prefix.into()).filter(|p: &String| !p.is_empty());
        self
    }

    /// Only bind descriptors admitted by `filter`.
    pub fn with_filter(mut self, filter: ImportFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn catalog(&self) -> &'c DescriptorCatalog {
        self.catalog
    }

    /// Remove the prefix from `tag_name`,
    ///   returning [`None`] if a prefix is in effect and `tag_name` lacks
    ///   it.
    pub fn strip_prefix<'t>(&self, tag_name: &'t str) -> Option<&'t str> {
        match &self.prefix {
            None => Some(tag_name),
            Some(prefix) => tag_name
                .strip_prefix(prefix.as_str())
                .filter(|rest| !rest.is_empty()),
        }
    }

    pub fn bind(&self, query: &TagQuery) -> BindingResult {
        let Some(tag) = self.strip_prefix(query.tag_name) else {
            trace!(tag = query.tag_name, "tag lacks prefix; not bound");
            return BindingResult {
                tag_name: query.tag_name.to_string(),
                descriptors: vec![],
            };
        };

        let parent = query
            .parent_tag
            .map(|parent| self.strip_prefix(parent).unwrap_or(parent));

        let mut descriptors = vec![];

        for id in self.catalog.candidates(tag) {
            let Some(desc) = self.catalog.get(id) else {
                continue;
            };

            if let Some(filter) = &self.filter {
                if !filter.admits(desc) {
                    continue;
                }
            }

            let rules = desc
                .rules()
                .iter()
                .enumerate()
                .filter(|(_, rule)| {
                    rule_fires(desc, rule, tag, parent, &query.attributes)
                })
                .map(|(i, _)| i)
                .collect::<Vec<_>>();

            if rules.is_empty() {
                continue;
            }

            let missing = desc.attributes().iter().find(|attr| {
                attr.is_required()
                    && !query.attributes.iter().any(|q| {
                        attr.match_name(q.name, desc.is_case_sensitive())
                            .is_some()
                    })
            });

            if let Some(missing) = missing {
                trace!(
                    tag,
                    descriptor = desc.name(),
                    attribute = missing.name(),
                    "required attribute missing; descriptor excluded"
                );
                continue;
            }

            trace!(tag, descriptor = desc.name(), ?rules, "bound");
            descriptors.push(BoundDescriptor {
                id,
                type_name: desc.name().to_string(),
                rules,
            });
        }

        BindingResult {
            tag_name: tag.to_string(),
            descriptors,
        }
    }
}

fn rule_fires(
    desc: &BindingDescriptor,
    rule: &MatchingRule,
    tag: &str,
    parent: Option<&str>,
    attrs: &[AttributeQuery],
) -> bool {
    let cs = desc.is_case_sensitive();

    let tag_ok = rule.is_catch_all() || eq_name(rule.tag_name(), tag, cs);
    let parent_ok = match (rule.parent_tag(), parent) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(expected), Some(actual)) => eq_name(expected, actual, cs),
    };

    tag_ok
        && parent_ok
        && rule.required_attributes().iter().all(|req| {
            attrs.iter().any(|attr| req.matches(attr.name, attr.value, cs))
        })
}

/// Bind `query` against every descriptor of `catalog`,
///   with no prefix or import filter in effect.
pub fn bind(query: &TagQuery, catalog: &DescriptorCatalog) -> BindingResult {
    Binder::new(catalog).bind(query)
}

/// How editor tooling should complete a start tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosingAction {
    InsertEndTag,
    SelfClose,
    NoAction,
}

/// Decide how to complete the start tag of the element `id`.
///
/// An element whose resolved structure is
///   [`TagStructure::SelfClosingOnly`] is self-closed.
/// Otherwise an end tag is inserted only if the element,
///   or an enclosing element of the same name,
///   lacks one;
///     the walk toward the root passes over elements of other names but
///     stops with [`ClosingAction::NoAction`] at the first node that is
///     not an element,
///       since closing behavior cannot be inferred across code or other
///       constructs.
/// The walk is bounded by [`global::MAX_ANCESTOR_WALK`].
pub fn closing_action(
    doc: &IrDocument,
    id: NodeId,
    catalog: &DescriptorCatalog,
) -> ClosingAction {
    let IrNode::ComponentUsage(usage) = doc.node(id) else {
        return ClosingAction::NoAction;
    };

    if usage.self_closing {
        return ClosingAction::NoAction;
    }

    let (name, case_sensitive) = match &usage.binding {
        Some(binding) => {
            (binding.tag_name.as_str(), binding.is_case_sensitive(catalog))
        }
        None => (usage.tag_name.as_str(), false),
    };

    let structure = usage.structure.unwrap_or_else(|| match &usage.binding {
        Some(binding) => binding.structure(catalog),
        None => infer_structure(name, false, []),
    });

    if structure == TagStructure::SelfClosingOnly {
        return ClosingAction::SelfClose;
    }

    let walk = std::iter::once(id)
        .chain(doc.ancestors(id))
        .take(global::MAX_ANCESTOR_WALK);

    for node in walk {
        match doc.node(node) {
            IrNode::ComponentUsage(other) => {
                let other_name = other
                    .binding
                    .as_ref()
                    .map_or(other.tag_name.as_str(), |b| b.tag_name.as_str());

                if other.end_tag.is_none()
                    && !other.self_closing
                    && eq_name(other_name, name, case_sensitive)
                {
                    return ClosingAction::InsertEndTag;
                }
            }
            _ => return ClosingAction::NoAction,
        }
    }

    ClosingAction::NoAction
}

/// Binding diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// Descriptors bound to the same attribute disagree on its type.
    ///
    /// The type of the first-registered descriptor is used.
    TypeConflict {
        attribute: String,
        span: Span,
        chosen: (String, String),
        other: (String, String),
    },

    ChildNotAllowed {
        child: String,
        parent: String,
        allowed: Vec<String>,
        span: Span,
    },

    CatalogUnavailable(CatalogError),

    EndTagNotAllowed { tag: String, span: Span },

    SelfClosingNotAllowed { tag: String, span: Span },

    MinimizedNonBoolean {
        attribute: String,
        type_name: String,
        span: Span,
    },

    EmptyNonString {
        attribute: String,
        type_name: String,
        span: Span,
    },

    /// A diagnostic recorded by the descriptor itself.
    DescriptorDiagnostic {
        descriptor: String,
        level: Level,
        message: String,
        span: Span,
    },

    /// An `addTagHelper` or `removeTagHelper` value is not of the form
    ///   `TypePattern, Origin`.
    InvalidImport {
        directive: String,
        value: String,
        span: Span,
    },

    /// A code block within the value of an attribute bound to a
    ///   non-string property.
    StatementInValue {
        attribute: String,
        type_name: String,
        span: Span,
    },
}

impl Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BindError::*;

        match self {
            TypeConflict { attribute, .. } => write!(
                f,
                "conflicting types for bound attribute {}",
                TtQuote::wrap(attribute)
            ),
            ChildNotAllowed { child, parent, .. } => write!(
                f,
                "{} is not permitted as a child of {}",
                TtTag::wrap(child),
                TtTag::wrap(parent)
            ),
            CatalogUnavailable(e) => {
                write!(f, "elements cannot be bound: {e}")
            }
            EndTagNotAllowed { tag, .. } => {
                write!(f, "{} must not have an end tag", TtTag::wrap(tag))
            }
            SelfClosingNotAllowed { tag, .. } => {
                write!(f, "{} must not be self-closing", TtTag::wrap(tag))
            }
            MinimizedNonBoolean {
                attribute,
                type_name,
                ..
            } => write!(
                f,
                "attribute {} of type {} requires a value",
                TtQuote::wrap(attribute),
                TtQuote::wrap(type_name)
            ),
            EmptyNonString {
                attribute,
                type_name,
                ..
            } => write!(
                f,
                "attribute {} of type {} must not be empty",
                TtQuote::wrap(attribute),
                TtQuote::wrap(type_name)
            ),
            DescriptorDiagnostic {
                descriptor,
                message,
                ..
            } => write!(f, "{}: {message}", TtQuote::wrap(descriptor)),
            InvalidImport {
                directive, value, ..
            } => write!(
                f,
                "invalid value {} for {}",
                TtQuote::wrap(value),
                TtDirective::wrap(directive)
            ),
            StatementInValue {
                attribute,
                type_name,
                ..
            } => write!(
                f,
                "value of attribute {} of type {} must be an expression",
                TtQuote::wrap(attribute),
                TtQuote::wrap(type_name)
            ),
        }
    }
}

impl Error for BindError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CatalogUnavailable(e) => Some(e),
            _ => None,
        }
    }
}

impl Diagnostic for BindError {
    fn code(&self) -> DiagnosticCode {
        use BindError::*;

        DiagnosticCode(match self {
            TypeConflict { .. } => 3001,
            ChildNotAllowed { .. } => 3002,
            CatalogUnavailable(_) => 3003,
            EndTagNotAllowed { .. } => 3004,
            SelfClosingNotAllowed { .. } => 3005,
            MinimizedNonBoolean { .. } => 3006,
            EmptyNonString { .. } => 3007,
            DescriptorDiagnostic { .. } => 3008,
            InvalidImport { .. } => 3009,
            StatementInValue { .. } => 3010,
        })
    }

    fn describe(&self) -> Vec<AnnotatedSpan> {
        use BindError::*;

        match self {
            TypeConflict {
                span,
                chosen: (chosen_desc, chosen_ty),
                other: (other_desc, other_ty),
                ..
            } => vec![
                span.warning(format!(
                    "{} declares this as {}",
                    TtQuote::wrap(other_desc),
                    TtQuote::wrap(other_ty)
                )),
                span.note(format!(
                    "{} from {} is used",
                    TtQuote::wrap(chosen_ty),
                    TtQuote::wrap(chosen_desc)
                )),
            ],

            ChildNotAllowed { allowed, span, .. } => span
                .error("this element is not permitted here")
                .with_help(format!(
                    "expected {}",
                    OrList::<TtTag>::wrap(allowed)
                ))
                .into(),

            // Document-level.
            CatalogUnavailable(_) => vec![],

            EndTagNotAllowed { span, .. } => vec![
                span.error("remove this end tag"),
            ],

            SelfClosingNotAllowed { span, .. } => span
                .error("this element requires an end tag")
                .with_help("replace `/>` with `>` and add an end tag")
                .into(),

            MinimizedNonBoolean { span, .. } => vec![
                span.error("expected a value for this attribute"),
            ],

            EmptyNonString { span, .. } => vec![
                span.error("expected a non-empty value"),
            ],

            DescriptorDiagnostic { level, span, .. } if level.is_error() => {
                vec![span.error("reported while binding this element")]
            }
            DescriptorDiagnostic { span, .. } => {
                vec![span.warning("reported while binding this element")]
            }

            InvalidImport { span, .. } => span
                .error("this value is ignored")
                .with_help("expected `TypePattern, Origin`")
                .into(),

            StatementInValue { span, .. } => span
                .error("statements cannot appear in this value")
                .with_help("use an expression such as `@(...)` instead")
                .into(),
        }
    }
}
