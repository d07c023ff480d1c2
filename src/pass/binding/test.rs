// Tests for the binding pass
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

use super::*;
use crate::{
    bind::{CatalogError, DescriptorBuilder, DescriptorKind, MatchingRule},
    diagnose::{DiagnosticCode, Level},
    directive::DirectiveRegistry,
    lower::lower,
    span::Context,
    syntax::{AttrSpec, PartSpec, SyntaxTree, TreeBuilder},
};

fn tag_helper(name: &str) -> DescriptorBuilder {
    DescriptorBuilder::new(DescriptorKind::TagHelper, "App", name)
}

fn foo_helper() -> DescriptorBuilder {
    tag_helper("App.FooTagHelper")
        .rule(MatchingRule::new("foo"))
}

fn run_with(
    sut: BindingPass,
    f: impl FnOnce(&mut TreeBuilder),
) -> (SyntaxTree, IrDocument) {
    let mut b = TreeBuilder::new(Context::new(1), "Index.cshtml");
    f(&mut b);

    let tree = b.finish();
    let mut doc = lower(&tree);

    DirectiveClassificationPass::new(Arc::new(DirectiveRegistry::builtin()))
        .execute(&mut doc)
        .expect("classification does not fail");
    sut.execute(&mut doc).expect("binding does not fail");

    (tree, doc)
}

fn run(
    descs: impl IntoIterator<Item = BindingDescriptor>,
    f: impl FnOnce(&mut TreeBuilder),
) -> (SyntaxTree, IrDocument) {
    let catalog = Arc::new(DescriptorCatalog::from_iter(descs));
    run_with(BindingPass::new(Arc::new(catalog), false), f)
}

fn elements(doc: &IrDocument) -> Vec<&ComponentUsage> {
    doc.find_all(|node| matches!(node, IrNode::ComponentUsage(_)))
        .into_iter()
        .filter_map(|id| match doc.node(id) {
            IrNode::ComponentUsage(usage) => Some(usage),
            _ => None,
        })
        .collect()
}

fn properties(doc: &IrDocument) -> Vec<(NodeId, &PropertyNode)> {
    doc.find_all(|node| matches!(node, IrNode::Property(_)))
        .into_iter()
        .filter_map(|id| match doc.node(id) {
            IrNode::Property(prop) => Some((id, prop)),
            _ => None,
        })
        .collect()
}

fn codes(doc: &IrDocument) -> Vec<DiagnosticCode> {
    doc.collect_diagnostics().iter().map(|r| r.code()).collect()
}

#[test]
fn bound_element_records_binding_and_structure() {
    let (_, doc) = run([foo_helper().build()], |b| {
        b.element("foo", &[], |_| ()).element("bar", &[], |_| ());
    });

    let els = elements(&doc);
    assert_eq!(2, els.len());

    let binding = els[0].binding.as_ref().expect("foo is bound");
    assert_eq!("foo", binding.tag_name);
    assert_eq!(Some(TagStructure::NormalOrSelfClosing), els[0].structure);

    assert_eq!(None, els[1].binding);
    assert_eq!(None, els[1].structure);

    assert!(codes(&doc).is_empty());
}

#[test]
fn string_attribute_remains_literal() {
    let desc = foo_helper()
        .attribute(AttributeDescriptor::new("title", "string", "Title"))
        .build();

    let (_, doc) = run([desc], |b| {
        b.element("foo", &[AttrSpec::Literal("title", "Hello")], |_| ());
    });

    let bound = elements(&doc)[0]
        .binding
        .as_ref()
        .and_then(|b| b.ids().next())
        .expect("foo is bound");

    let props = properties(&doc);
    assert_eq!(1, props.len());

    let (id, prop) = props[0];
    assert_eq!("title", prop.attribute_name);
    assert_eq!("string", prop.type_name);
    assert!(!prop.is_code);
    assert_eq!(
        vec![PropertyTarget {
            descriptor: bound,
            property_name: "Title".into(),
            indexer_key: None,
        }],
        prop.targets
    );

    let children = doc.children(id);
    assert_eq!(1, children.len());
    assert!(matches!(
        doc.node(children[0]),
        IrNode::Literal(lit) if lit.text == "Hello"
    ));
}

#[test]
fn non_string_literal_becomes_code_with_source_span() {
    let desc = foo_helper()
        .attribute(AttributeDescriptor::new("count", "int", "Count"))
        .build();

    let (tree, doc) = run([desc], |b| {
        b.element("foo", &[AttrSpec::Literal("count", "42")], |_| ());
    });

    let (id, prop) = properties(&doc)[0];
    assert!(prop.is_code);

    let child = doc.children(id)[0];
    match doc.node(child) {
        IrNode::EmbeddedExpression(code) => {
            assert_eq!("42", code.text());

            let span = code.tokens[0].span().expect("token has source span");
            assert_eq!(Some("42"), tree.source().slice(span));
            assert_eq!(doc.span(child), Some(span));
        }
        other => panic!("expected expression, got {other:?}"),
    }

    assert_eq!(Ok(()), doc.validate());
}

#[test]
fn unmatched_attribute_is_left_alone() {
    let desc = foo_helper()
        .attribute(AttributeDescriptor::new("count", "int", "Count"))
        .build();

    let (_, doc) = run([desc], |b| {
        b.element("foo", &[AttrSpec::Literal("class", "x")], |_| ());
    });

    assert!(properties(&doc).is_empty());
    assert_eq!(
        1,
        doc.find_all(|node| matches!(node, IrNode::HtmlAttribute(_))).len()
    );
}

#[test]
fn indexer_attribute_carries_key() {
    let desc = foo_helper()
        .attribute(
            AttributeDescriptor::new(
                "route",
                "IDictionary<string, string>",
                "Routes",
            )
            .indexer("route-"),
        )
        .build();

    let (_, doc) = run([desc], |b| {
        b.element("foo", &[AttrSpec::Literal("route-id", "7")], |_| ());
    });

    let (_, prop) = properties(&doc)[0];
    assert_eq!(Some("id".to_string()), prop.targets[0].indexer_key);
    assert_eq!("Routes", prop.targets[0].property_name);
}

#[test]
fn conflicting_types_warn_and_first_descriptor_wins() {
    let a = foo_helper()
        .attribute(AttributeDescriptor::new("value", "int", "Value"))
        .build();
    let b = tag_helper("App.Other")
        .rule(MatchingRule::new("foo"))
        .attribute(AttributeDescriptor::new("value", "string", "Text"))
        .build();

    let (_, doc) = run([a, b], |b| {
        b.element("foo", &[AttrSpec::Literal("value", "1")], |_| ());
    });

    let (_, prop) = properties(&doc)[0];
    assert_eq!("int", prop.type_name);
    assert!(prop.is_code);
    assert_eq!(2, prop.targets.len());
    assert_eq!("Text", prop.targets[1].property_name);

    let diags = doc.collect_diagnostics();
    let record = diags.iter().next().expect("conflict reported");
    assert_eq!(DiagnosticCode(3001), record.code());
    assert_eq!(Level::Warning, record.level());
    assert!(!doc.has_errors());
}

#[test]
fn minimized_attribute_must_be_boolean() {
    let desc = foo_helper()
        .attribute(AttributeDescriptor::new("disabled", "bool", "Disabled"))
        .attribute(AttributeDescriptor::new("count", "int", "Count"))
        .build();

    let (_, doc) = run([desc], |b| {
        b.element(
            "foo",
            &[AttrSpec::Minimized("disabled"), AttrSpec::Minimized("count")],
            |_| (),
        );
    });

    assert_eq!(2, properties(&doc).len());
    assert_eq!(vec![DiagnosticCode(3006)], codes(&doc));
}

#[test]
fn empty_value_must_be_string() {
    let desc = foo_helper()
        .attribute(AttributeDescriptor::new("title", "string", "Title"))
        .attribute(AttributeDescriptor::new("count", "int", "Count"))
        .build();

    let (_, doc) = run([desc], |b| {
        b.element(
            "foo",
            &[AttrSpec::Literal("title", ""), AttrSpec::Literal("count", "")],
            |_| (),
        );
    });

    assert_eq!(vec![DiagnosticCode(3007)], codes(&doc));
}

#[test]
fn statement_in_code_value_is_reported_and_dropped() {
    let desc = foo_helper()
        .attribute(AttributeDescriptor::new("title", "string", "Title"))
        .attribute(AttributeDescriptor::new("count", "int", "Count"))
        .build();

    let (tree, doc) = run([desc], |b| {
        b.element(
            "foo",
            &[
                AttrSpec::Parts(
                    "title",
                    &[PartSpec::Literal("a"), PartSpec::Statement("b();")],
                ),
                AttrSpec::Parts(
                    "count",
                    &[PartSpec::Code("x"), PartSpec::Statement("y = 1;")],
                ),
            ],
            |_| (),
        );
    });

    let props = properties(&doc);
    assert_eq!(2, props.len());

    // String values keep their statements.
    let (title, _) = props[0];
    assert_eq!(2, doc.children(title).len());

    let (count, prop) = props[1];
    assert!(prop.is_code);

    let parts = doc.children(count);
    assert_eq!(1, parts.len());
    assert!(matches!(
        doc.node(parts[0]),
        IrNode::EmbeddedExpression(code) if code.text() == "x"
    ));

    let diags = doc.collect_diagnostics();
    let record = diags.iter().next().expect("statement reported");
    assert_eq!(1, diags.iter().count());
    assert_eq!(DiagnosticCode(3010), record.code());
    assert_eq!(Level::Error, record.level());
    assert_eq!(Some("@{y = 1;}"), tree.source().slice(record.span()));

    assert_eq!(Ok(()), doc.validate());
}

#[test]
fn structure_violations() {
    let void = tag_helper("App.Input")
        .rule(
            MatchingRule::new("input").structure(TagStructure::SelfClosingOnly),
        )
        .build();
    let normal = tag_helper("App.Panel")
        .rule(MatchingRule::new("panel").structure(TagStructure::NormalOnly))
        .build();

    let (tree, doc) = run([void, normal], |b| {
        b.element("input", &[], |_| ()).self_closing("panel", &[]);
    });

    let diags = doc.collect_diagnostics();
    let found = diags
        .iter()
        .map(|r| (r.code(), tree.source().slice(r.span())))
        .collect::<Vec<_>>();

    assert_eq!(
        vec![
            (DiagnosticCode(3004), Some("</input>")),
            (DiagnosticCode(3005), Some("<panel />")),
        ],
        found
    );
}

#[test]
fn children_are_checked_against_parent() {
    let list = tag_helper("App.List")
        .rule(MatchingRule::new("list"))
        .allow_child("item")
        .build();

    let (_, doc) = run([list], |b| {
        b.element("list", &[], |b| {
            b.element("item", &[], |_| ())
                .element("p", &[], |b| {
                    // Only direct children of the bound parent matter.
                    b.element("span", &[], |_| ());
                });
        });
    });

    let diags = doc.collect_diagnostics();
    assert_eq!(1, diags.len());

    let record = diags.iter().next().expect("one diagnostic");
    assert_eq!(DiagnosticCode(3002), record.code());
    assert!(record.message().contains("`<item>`"));
}

#[test]
fn descriptor_diagnostics_are_surfaced_once() {
    let desc = foo_helper()
        .diagnostic(Level::Warning, "FooTagHelper is obsolete")
        .build();

    let (_, doc) = run([desc], |b| {
        b.element("foo", &[], |_| ()).element("foo", &[], |_| ());
    });

    let diags = doc.collect_diagnostics();
    assert_eq!(1, diags.len());

    let record = diags.iter().next().expect("one diagnostic");
    assert_eq!(DiagnosticCode(3008), record.code());
    assert_eq!(Level::Warning, record.level());
}

#[test]
fn opted_out_element_is_not_bound() {
    let (_, doc) = run([foo_helper().build()], |b| {
        b.opt_out("foo", &[], |_| ());
    });

    assert_eq!(None, elements(&doc)[0].binding);
}

#[test]
fn prefix_is_required_when_declared() {
    let (_, doc) = run([foo_helper().build()], |b| {
        b.directive("tagHelperPrefix", &["\"th:\""])
            .element("th:foo", &[], |_| ())
            .element("foo", &[], |_| ());
    });

    let els = elements(&doc);
    assert_eq!(
        Some("foo"),
        els[0].binding.as_ref().map(|b| b.tag_name.as_str())
    );
    assert_eq!(None, els[1].binding);
}

#[test]
fn imports_filter_descriptors_when_required() {
    let catalog =
        Arc::new(DescriptorCatalog::from_iter([foo_helper().build()]));
    let sut = || BindingPass::new(Arc::new(catalog.clone()), true);

    let (_, doc) = run_with(sut(), |b| {
        b.element("foo", &[], |_| ());
    });
    assert_eq!(None, elements(&doc)[0].binding);

    let (_, doc) = run_with(sut(), |b| {
        b.directive("addTagHelper", &["\"*, App\""])
            .element("foo", &[], |_| ());
    });
    assert!(elements(&doc)[0].binding.is_some());

    let (_, doc) = run_with(sut(), |b| {
        b.directive("addTagHelper", &["\"*, App\""])
            .directive("removeTagHelper", &["\"App.Foo*, App\""])
            .element("foo", &[], |_| ());
    });
    assert_eq!(None, elements(&doc)[0].binding);

    let (tree, doc) = run_with(sut(), |b| {
        b.directive("addTagHelper", &["\"App\""]);
    });
    let diags = doc.collect_diagnostics();
    let record = diags.iter().next().expect("malformed import reported");
    assert_eq!(DiagnosticCode(3009), record.code());
    assert_eq!(Some("\"App\""), tree.source().slice(record.span()));
}

#[derive(Debug)]
struct Unavailable;

impl DescriptorSource for Unavailable {
    fn snapshot(&self) -> Result<Arc<DescriptorCatalog>, CatalogError> {
        Err(CatalogError::Unavailable("discovery failed".into()))
    }
}

#[test]
fn missing_catalog_binds_nothing() {
    let sut = BindingPass::new(Arc::new(Unavailable), false);
    let (_, doc) = run_with(sut, |b| {
        b.element("foo", &[AttrSpec::Literal("count", "1")], |_| ());
    });

    assert_eq!(None, elements(&doc)[0].binding);
    assert!(properties(&doc).is_empty());

    assert_eq!(vec![DiagnosticCode(3003)], codes(&doc));
    assert_eq!(1, doc.diagnostics().len());
}
