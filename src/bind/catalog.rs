// Descriptor catalog
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

//! Read-only collection of [`BindingDescriptor`]s.
//!
//! A catalog is built once by the embedding application and shared,
//!   typically behind an [`Arc`],
//!   by any number of concurrent compilations.
//! Nothing in the compiler mutates a catalog.

use super::{BindingDescriptor, DescriptorKind};
use fxhash::FxHashMap;
use std::{
    error::Error,
    fmt::{self, Display},
    sync::Arc,
};

/// Index of a descriptor within its [`DescriptorCatalog`].
///
/// Identifiers are assigned in registration order,
///   which is the order used to break ties between descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DescriptorId(u32);

impl DescriptorId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "descriptor#{}", self.0)
    }
}

/// Immutable,
///   indexed collection of descriptors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorCatalog {
    descriptors: Vec<BindingDescriptor>,

    /// Descriptors by lowercase tag name of any of their rules.
    by_tag: FxHashMap<String, Vec<DescriptorId>>,

    /// Descriptors having a catch-all rule.
    catch_all: Vec<DescriptorId>,
}

impl DescriptorCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn get(&self, id: DescriptorId) -> Option<&BindingDescriptor> {
        self.descriptors.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (DescriptorId, &BindingDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(i, desc)| (DescriptorId(i as u32), desc))
    }

    /// Descriptors having a rule that may match `tag_name`,
    ///   in registration order.
    ///
    /// The index is case-insensitive;
    ///   callers must still compare names under each descriptor's case
    ///   sensitivity.
    pub fn candidates(&self, tag_name: &str) -> Vec<DescriptorId> {
        let mut ids = self
            .by_tag
            .get(&tag_name.to_ascii_lowercase())
            .into_iter()
            .flatten()
            .chain(self.catch_all.iter())
            .copied()
            .collect::<Vec<_>>();

        ids.sort();
        ids.dedup();
        ids
    }
}

/// Builder for a [`DescriptorCatalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: DescriptorCatalog,
    identities: FxHashMap<(DescriptorKind, String, String), Vec<DescriptorId>>,
}

impl CatalogBuilder {
    /// Add a descriptor,
    ///   returning its identifier.
    ///
    /// Adding a descriptor equal to one already present returns the
    ///   existing identifier.
    pub fn add(&mut self, desc: BindingDescriptor) -> DescriptorId {
        let key = (
            desc.kind(),
            desc.origin().to_string(),
            desc.name().to_string(),
        );

        let existing = self.identities.get(&key).and_then(|ids| {
            ids.iter()
                .copied()
                .find(|id| self.catalog.get(*id) == Some(&desc))
        });

        if let Some(id) = existing {
            return id;
        }

        let id = DescriptorId(self.catalog.descriptors.len() as u32);

        for rule in desc.rules() {
            if rule.is_catch_all() {
                if !self.catalog.catch_all.contains(&id) {
                    self.catalog.catch_all.push(id);
                }
            } else {
                let ids = self
                    .catalog
                    .by_tag
                    .entry(rule.tag_name().to_ascii_lowercase())
                    .or_default();

                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        self.identities.entry(key).or_default().push(id);
        self.catalog.descriptors.push(desc);

        id
    }

    pub fn with(mut self, desc: BindingDescriptor) -> Self {
        self.add(desc);
        self
    }

    pub fn build(self) -> DescriptorCatalog {
        self.catalog
    }
}

impl FromIterator<BindingDescriptor> for DescriptorCatalog {
    fn from_iter<I: IntoIterator<Item = BindingDescriptor>>(iter: I) -> Self {
        let mut builder = Self::builder();
        for desc in iter {
            builder.add(desc);
        }
        builder.build()
    }
}

/// Provider of a catalog snapshot for a single compilation.
///
/// Discovery of descriptors happens outside of the compiler;
///   a source may fail if that discovery did not complete.
pub trait DescriptorSource: Send + Sync {
    fn snapshot(&self) -> Result<Arc<DescriptorCatalog>, CatalogError>;
}

impl DescriptorSource for Arc<DescriptorCatalog> {
    fn snapshot(&self) -> Result<Arc<DescriptorCatalog>, CatalogError> {
        Ok(Arc::clone(self))
    }
}

/// The descriptor catalog could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Discovery has not produced a catalog.
    Unavailable(String),

    /// The catalog was produced but cannot be used.
    Corrupt(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(why) => {
                write!(f, "descriptor catalog is unavailable: {why}")
            }
            Self::Corrupt(why) => {
                write!(f, "descriptor catalog is corrupt: {why}")
            }
        }
    }
}

impl Error for CatalogError {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bind::{DescriptorBuilder, MatchingRule};

    fn desc(name: &str, tags: &[&str]) -> BindingDescriptor {
        tags.iter()
            .fold(
                DescriptorBuilder::new(DescriptorKind::TagHelper, "App", name),
                |b, tag| b.rule(MatchingRule::new(*tag)),
            )
            .build()
    }

    #[test]
    fn candidates_in_registration_order_with_catch_all() {
        let mut builder = DescriptorCatalog::builder();
        let star = builder.add(desc("Star", &["*"]));
        let a = builder.add(desc("A", &["Input", "select"]));
        let b = builder.add(desc("B", &["input"]));
        let catalog = builder.build();

        assert_eq!(vec![star, a, b], catalog.candidates("input"));
        assert_eq!(vec![star, a], catalog.candidates("SELECT"));
        assert_eq!(vec![star], catalog.candidates("div"));
    }

    #[test]
    fn equal_descriptors_are_deduplicated() {
        let mut builder = DescriptorCatalog::builder();
        let first = builder.add(desc("A", &["x", "y"]));
        let again = builder.add(desc("A", &["y", "x"]));
        let other = builder.add(desc("A", &["z"]));

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(2, builder.build().len());
    }

    #[test]
    fn arc_catalog_is_a_source() {
        let catalog =
            Arc::new(DescriptorCatalog::from_iter([desc("A", &["a"])]));

        let snapshot = catalog.snapshot().expect("snapshot always succeeds");
        assert!(Arc::ptr_eq(&catalog, &snapshot));
    }
}
