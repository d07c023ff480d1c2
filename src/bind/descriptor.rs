// Binding descriptors
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

//! Capability descriptors to which markup elements bind.
//!
//! Descriptors are immutable values produced by discovery outside of this
//!   crate and collected into a
//!   [`DescriptorCatalog`](super::DescriptorCatalog).
//! They are constructed with [`DescriptorBuilder`].

use super::TagStructure;
use crate::diagnose::Level;
use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

/// What sort of capability a descriptor represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Server-side helper that augments an element's output.
    ///
    /// Tag and attribute names match case-insensitively by default.
    TagHelper,

    /// Component rendered in place of the element.
    ///
    /// Tag and attribute names match case-sensitively by default.
    Component,
}

impl Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagHelper => write!(f, "tag helper"),
            Self::Component => write!(f, "component"),
        }
    }
}

/// How a required attribute name is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameComparison {
    FullMatch,
    PrefixMatch,
}

/// How a required attribute value is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueComparison {
    FullMatch,
    PrefixMatch,
    SuffixMatch,
}

/// An attribute that must be present for a [`MatchingRule`] to fire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequiredAttribute {
    name: String,
    name_comparison: NameComparison,
    value: Option<(String, ValueComparison)>,
}

impl RequiredAttribute {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            name_comparison: NameComparison::FullMatch,
            value: None,
        }
    }

    /// Match any attribute whose name begins with this name.
    pub fn prefix(mut self) -> Self {
        self.name_comparison = NameComparison::PrefixMatch;
        self
    }

    /// Additionally require the attribute value to match `value`.
    ///
    /// Values are always compared case-sensitively.
    pub fn value<S: Into<String>>(
        mut self,
        value: S,
        cmp: ValueComparison,
    ) -> Self {
        self.value = Some((value.into(), cmp));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_comparison(&self) -> NameComparison {
        self.name_comparison
    }

    /// Whether an element attribute `name` with optional literal `value`
    ///   satisfies this requirement.
    pub fn matches(
        &self,
        name: &str,
        value: Option<&str>,
        case_sensitive: bool,
    ) -> bool {
        let name_ok = match self.name_comparison {
            NameComparison::FullMatch => {
                eq_name(&self.name, name, case_sensitive)
            }
            NameComparison::PrefixMatch => {
                starts_with_name(name, &self.name, case_sensitive)
            }
        };

        name_ok
            && match (&self.value, value) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some((expected, cmp)), Some(actual)) => match cmp {
                    ValueComparison::FullMatch => actual == expected,
                    ValueComparison::PrefixMatch => {
                        actual.starts_with(expected.as_str())
                    }
                    ValueComparison::SuffixMatch => {
                        actual.ends_with(expected.as_str())
                    }
                },
            }
    }
}

/// One clause of a descriptor describing when it applies to an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchingRule {
    tag_name: String,
    parent_tag: Option<String>,
    structure: TagStructure,
    attributes: Vec<RequiredAttribute>,
}

impl MatchingRule {
    /// Tag name that matches all elements.
    pub const CATCH_ALL: &'static str = "*";

    pub fn new<S: Into<String>>(tag_name: S) -> Self {
        Self {
            tag_name: tag_name.into(),
            parent_tag: None,
            structure: TagStructure::Unspecified,
            attributes: vec![],
        }
    }

    pub fn parent<S: Into<String>>(mut self, parent_tag: S) -> Self {
        self.parent_tag = Some(parent_tag.into());
        self
    }

    pub fn structure(mut self, structure: TagStructure) -> Self {
        self.structure = structure;
        self
    }

    pub fn require(mut self, attr: RequiredAttribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn is_catch_all(&self) -> bool {
        self.tag_name == Self::CATCH_ALL
    }

    pub fn parent_tag(&self) -> Option<&str> {
        self.parent_tag.as_deref()
    }

    pub fn tag_structure(&self) -> TagStructure {
        self.structure
    }

    pub fn required_attributes(&self) -> &[RequiredAttribute] {
        &self.attributes
    }
}

/// A bindable attribute of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeDescriptor {
    name: String,
    type_name: String,
    property_name: String,
    required: bool,
    indexer_prefix: Option<String>,
}

impl AttributeDescriptor {
    pub fn new<N: Into<String>, T: Into<String>, P: Into<String>>(
        name: N,
        type_name: T,
        property_name: P,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            property_name: property_name.into(),
            required: false,
            indexer_prefix: None,
        }
    }

    /// Elements lacking this attribute do not bind to the descriptor.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Also bind every attribute whose name begins with `prefix`,
    ///   assigning through the property's indexer with the remainder of
    ///   the name as its key.
    pub fn indexer<S: Into<String>>(mut self, prefix: S) -> Self {
        self.indexer_prefix = Some(prefix.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn indexer_prefix(&self) -> Option<&str> {
        self.indexer_prefix.as_deref()
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.type_name.as_str(), "bool" | "System.Boolean")
    }

    pub fn is_string(&self) -> bool {
        matches!(self.type_name.as_str(), "string" | "System.String")
    }

    /// How an element attribute `name` binds to this descriptor,
    ///   if at all.
    pub fn match_name(
        &self,
        name: &str,
        case_sensitive: bool,
    ) -> Option<AttributeMatch> {
        if eq_name(&self.name, name, case_sensitive) {
            return Some(AttributeMatch::Property);
        }

        self.indexer_prefix
            .as_deref()
            .filter(|prefix| {
                name.len() > prefix.len()
                    && starts_with_name(name, prefix, case_sensitive)
            })
            .map(|prefix| {
                AttributeMatch::Indexer(name[prefix.len()..].to_string())
            })
    }
}

/// Result of [`AttributeDescriptor::match_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeMatch {
    /// Assign the property directly.
    Property,

    /// Assign through the property's indexer with this key.
    Indexer(String),
}

/// A problem recorded while the descriptor was being constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorDiagnostic {
    pub level: Level,
    pub message: String,
}

/// An immutable capability description to which elements bind.
///
/// Two descriptors are equal if their kind,
///   origin,
///   and name are equal and they have the same sets of rules,
///   attributes,
///   allowed children,
///   and diagnostics,
///     irrespective of order.
#[derive(Debug, Clone)]
pub struct BindingDescriptor {
    kind: DescriptorKind,
    origin: String,
    name: String,
    display_name: String,
    case_sensitive: bool,
    rules: Vec<MatchingRule>,
    attributes: Vec<AttributeDescriptor>,
    allowed_children: Vec<String>,
    diagnostics: Vec<DescriptorDiagnostic>,
}

impl BindingDescriptor {
    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    /// Identity of the assembly or package providing the descriptor.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Fully qualified host-language type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn rules(&self) -> &[MatchingRule] {
        &self.rules
    }

    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// Tag names permitted as direct children;
    ///   empty if any child is permitted.
    pub fn allowed_children(&self) -> &[String] {
        &self.allowed_children
    }

    pub fn diagnostics(&self) -> &[DescriptorDiagnostic] {
        &self.diagnostics
    }

    /// Compare two names under this descriptor's case sensitivity.
    pub fn eq_name(&self, a: &str, b: &str) -> bool {
        eq_name(a, b, self.case_sensitive)
    }

    /// Whether a child with tag name `tag` is permitted.
    pub fn allows_child(&self, tag: &str) -> bool {
        self.allowed_children.is_empty()
            || self.allowed_children.iter().any(|c| self.eq_name(c, tag))
    }
}

impl PartialEq for BindingDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.origin == other.origin
            && self.name == other.name
            && same_elements(&self.rules, &other.rules)
            && same_elements(&self.attributes, &other.attributes)
            && same_elements(&self.allowed_children, &other.allowed_children)
            && same_elements(&self.diagnostics, &other.diagnostics)
    }
}

impl Eq for BindingDescriptor {}

// Must agree with `PartialEq`,
//   so only order-independent identity is hashed.
impl Hash for BindingDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.origin.hash(state);
        self.name.hash(state);
    }
}

impl Display for BindingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.kind, self.display_name)
    }
}

fn same_elements<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len()
        && a.iter().all(|x| b.contains(x))
        && b.iter().all(|x| a.contains(x))
}

pub(super) fn eq_name(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}

fn starts_with_name(name: &str, prefix: &str, case_sensitive: bool) -> bool {
    name.get(..prefix.len())
        .map_or(false, |head| eq_name(head, prefix, case_sensitive))
}

/// Builder for a [`BindingDescriptor`].
///
/// ```
/// # use weft::bind::*;
/// let desc = DescriptorBuilder::new(
///     DescriptorKind::TagHelper,
///     "App",
///     "App.FooTagHelper",
/// )
/// .rule(MatchingRule::new("foo"))
/// .attribute(
///     AttributeDescriptor::new("bar", "System.Int32", "Bar").required(),
/// )
/// .build();
///
/// assert_eq!("App.FooTagHelper", desc.display_name());
/// assert!(!desc.is_case_sensitive());
/// ```
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    desc: BindingDescriptor,
}

impl DescriptorBuilder {
    pub fn new<O: Into<String>, N: Into<String>>(
        kind: DescriptorKind,
        origin: O,
        name: N,
    ) -> Self {
        let name = name.into();

        Self {
            desc: BindingDescriptor {
                kind,
                origin: origin.into(),
                display_name: name.clone(),
                name,
                case_sensitive: matches!(kind, DescriptorKind::Component),
                rules: vec![],
                attributes: vec![],
                allowed_children: vec![],
                diagnostics: vec![],
            },
        }
    }

    pub fn display_name<S: Into<String>>(mut self, name: S) -> Self {
        self.desc.display_name = name.into();
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.desc.case_sensitive = case_sensitive;
        self
    }

    pub fn rule(mut self, rule: MatchingRule) -> Self {
        self.desc.rules.push(rule);
        self
    }

    pub fn attribute(mut self, attr: AttributeDescriptor) -> Self {
        self.desc.attributes.push(attr);
        self
    }

    pub fn allow_child<S: Into<String>>(mut self, tag: S) -> Self {
        self.desc.allowed_children.push(tag.into());
        self
    }

    pub fn diagnostic<S: Into<String>>(
        mut self,
        level: Level,
        message: S,
    ) -> Self {
        self.desc.diagnostics.push(DescriptorDiagnostic {
            level,
            message: message.into(),
        });
        self
    }

    pub fn build(self) -> BindingDescriptor {
        self.desc
    }
}
