// End-to-end compilation tests
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

use std::sync::Arc;
use weft::{
    bind::{
        bind, closing_action, infer_structure, resolve_structure,
        AttributeDescriptor, BindingDescriptor, CatalogError, ClosingAction,
        DescriptorBuilder, DescriptorCatalog, DescriptorKind,
        DescriptorSource, MatchingRule, TagQuery, TagStructure,
    },
    compile::{CompiledDocument, Compiler},
    config::CompilerOptions,
    diagnose::DiagnosticCode,
    ir::{IrNode, NodeId},
    lower::lower,
    span::Context,
    syntax::{AttrSpec, PartSpec, SyntaxTree, TreeBuilder},
};

fn tree(f: impl FnOnce(&mut TreeBuilder)) -> SyntaxTree {
    let mut b = TreeBuilder::new(Context::new(1), "Views/Home/Index.cshtml");
    f(&mut b);
    b.finish()
}

fn helper(name: &str, rules: Vec<MatchingRule>) -> DescriptorBuilder {
    rules.into_iter().fold(
        DescriptorBuilder::new(DescriptorKind::TagHelper, "App", name),
        DescriptorBuilder::rule,
    )
}

fn catalog() -> DescriptorCatalog {
    DescriptorCatalog::from_iter([
        helper("App.AnchorTagHelper", vec![MatchingRule::new("a")])
            .attribute(AttributeDescriptor::new(
                "asp-action",
                "string",
                "Action",
            ))
            .attribute(
                AttributeDescriptor::new("asp-route-", "string", "RouteValues")
                    .indexer("asp-route-"),
            )
            .build(),
        helper("App.InputTagHelper", vec![MatchingRule::new("input")])
            .attribute(AttributeDescriptor::new(
                "asp-for",
                "global::Microsoft.AspNetCore.Mvc.ViewFeatures.ModelExpression",
                "For",
            ))
            .build(),
    ])
}

fn compiler() -> Compiler {
    Compiler::builder()
        .catalog(catalog())
        .options(
            CompilerOptions::builder()
                .root_namespace("App")
                .emit_line_pragmas(true)
                .build(),
        )
        .build()
        .expect("valid configuration")
}

/// A template exercising most constructs.
fn kitchen_sink() -> SyntaxTree {
    tree(|b| {
        b.directive("using", &["System.Linq"])
            .directive("model", &["HomeModel"])
            .directive("inject", &["IClock", "Clock"])
            .text("<h1>")
            .expr("Model.Title")
            .text("</h1>\n")
            .element(
                "a",
                &[
                    AttrSpec::Literal("asp-action", "Index"),
                    AttrSpec::Literal("asp-route-id", "7"),
                    AttrSpec::Parts(
                        "class",
                        &[
                            PartSpec::Literal("btn "),
                            PartSpec::Code("Model.Style"),
                        ],
                    ),
                ],
                |b| {
                    b.text("Home");
                },
            )
            .self_closing("input", &[AttrSpec::Literal("asp-for", "Title")])
            .statement(" var n = Model.Items.Count(); ")
            .block(|b| {
                b.code(" if (n > 0) { ").text("<p>many</p>").code(" } ");
            })
            .directive_block("section", &["Scripts"], |b| {
                let src = AttrSpec::Code("src", "Model.Script");
                b.element("script", &[src], |_| ());
            })
            .code_directive("functions", " string Greet() => \"hi\"; ");
    })
}

fn codes(out: &CompiledDocument) -> Vec<DiagnosticCode> {
    out.diagnostics().iter().map(|r| r.code()).collect()
}

#[test]
fn compilation_is_deterministic() {
    let tree = kitchen_sink();

    let first = compiler().compile(&tree);
    let second = compiler().compile(&tree);

    assert_eq!(first, second);
    assert_eq!(first.text(), second.text());
    assert!(first.is_complete());
}

#[test]
fn concurrent_compilations_share_configuration() {
    let sut = compiler();
    let tree = kitchen_sink();
    let expected = sut.compile(&tree);

    std::thread::scope(|s| {
        let handles = (0..4)
            .map(|_| s.spawn(|| sut.compile(&tree)))
            .collect::<Vec<_>>();

        for handle in handles {
            assert_eq!(expected, handle.join().expect("compilation panicked"));
        }
    });
}

#[test]
fn every_mapping_is_verbatim_and_ordered() {
    let tree = kitchen_sink();
    let out = compiler().compile(&tree);
    let map = out.source_map();

    let mut original_len = 0;
    let mut generated_len = 0;

    for entry in map.entries() {
        let original = tree.source().slice(entry.original);
        let generated = out.text().get(entry.generated.range());

        assert!(original.is_some());
        assert_eq!(original, generated, "entry {entry:?}");

        original_len += entry.original.len() as usize;
        generated_len += entry.generated.len();
    }

    assert_eq!(original_len, generated_len);
    assert_eq!(original_len, map.mapped_len());

    let offsets = map
        .entries()
        .iter()
        .map(|e| e.original.offset())
        .collect::<Vec<_>>();
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));

    // Code the user wrote is always mapped.
    let mapped = map
        .entries()
        .iter()
        .filter_map(|e| tree.source().slice(e.original))
        .collect::<String>();

    for code in [
        "System.Linq",
        "Model.Title",
        "Model.Style",
        "Title",
        " var n = Model.Items.Count(); ",
        " if (n > 0) { ",
        "Model.Script",
        " string Greet() => \"hi\"; ",
    ] {
        assert!(mapped.contains(code), "`{code}` is not mapped");
    }
}

#[test]
fn positions_translate_in_both_directions() {
    let tree = kitchen_sink();
    let out = compiler().compile(&tree);
    let map = out.source_map();

    let src = tree.source().text();
    let at = src.find("Model.Title").expect("expression in source") as u32;

    let generated = map.to_generated(at).expect("expression is mapped");
    assert_eq!(Some("Model.Title"), out.text().get(generated..generated + 11));
    assert_eq!(Some(at), map.to_original(generated));

    let span = map
        .map_generated_range(generated + 6, 5)
        .expect("within mapping");
    assert_eq!(Some("Title"), tree.source().slice(span));
}

#[test]
fn synthetic_text_is_attributed_to_its_element() {
    let tree = kitchen_sink();
    let out = compiler().compile(&tree);

    let anchor = tree
        .nodes()
        .iter()
        .map(|node| node.span())
        .find(|span| {
            tree.source()
                .slice(*span)
                .map_or(false, |s| s.starts_with("<a "))
        })
        .expect("anchor element");

    let at = out
        .text()
        .find("CreateTagHelper<global::App.AnchorTagHelper>")
        .expect("anchor helper created");

    assert_eq!(None, out.source_map().map_generated_range(at, 15));
    assert_eq!(Some(anchor), out.source_map().remap_or_enclosing(at, 15));
}

#[test]
fn bound_attributes_are_assigned() {
    let out = compiler().compile(&kitchen_sink());
    let text = out.text();

    assert!(text.contains("__App_AnchorTagHelper.Action = \"Index\";"));
    assert!(
        text.contains("__App_AnchorTagHelper.RouteValues[\"id\"] = \"7\";")
    );
    assert!(text.contains("__App_InputTagHelper.For = "));
    assert!(text.contains(
        "ModelExpressionProvider.CreateModelExpression(\
         ViewData, __model => __model.Title)"
    ));
    assert!(text.contains(
        "AddHtmlAttribute(\"class\", Html.Raw(__tagHelperStringValueBuffer)"
    ));
    assert!(text.contains("namespace App.Views.Home\n"));
}

#[test]
fn extra_directive_token_is_dropped_with_one_diagnostic() {
    let out = compiler().compile(&tree(|b| {
        b.directive("model", &["A", "B"]).text("<p>");
    }));

    assert_eq!(vec![DiagnosticCode(2001)], codes(&out));

    // The directive had no effect.
    assert!(out.text().contains("RazorPage<dynamic>"));
    assert!(!out.text().contains("RazorPage<A>"));
}

#[test]
fn open_structure_wins_regardless_of_order() {
    use TagStructure::*;

    let rules = [Unspecified, SelfClosingOnly, NormalOrSelfClosing];
    let orders = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    for order in orders {
        let descs = order
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let rule = MatchingRule::new("x").structure(rules[*r]);
                helper(&format!("App.X{i}"), vec![rule]).build()
            })
            .collect::<Vec<BindingDescriptor>>();

        let catalog = DescriptorCatalog::from_iter(descs);
        let result = bind(&TagQuery::new("x"), &catalog);

        assert_eq!(3, result.ids().count());
        assert_eq!(
            NormalOrSelfClosing,
            result.structure(&catalog),
            "{order:?}"
        );
    }

    let rules = order_rules(&[SelfClosingOnly, Unspecified]);
    assert_eq!(Some(SelfClosingOnly), resolve_structure(&rules));
}

fn order_rules(structures: &[TagStructure]) -> Vec<MatchingRule> {
    structures
        .iter()
        .map(|s| MatchingRule::new("x").structure(*s))
        .collect()
}

fn element_ids(tree: &SyntaxTree) -> (weft::ir::IrDocument, Vec<NodeId>) {
    let doc = lower(tree);
    let ids = doc.find_all(|node| matches!(node, IrNode::ComponentUsage(_)));
    (doc, ids)
}

#[test]
fn nested_unclosed_element_guard() {
    let catalog = DescriptorCatalog::default();

    // `<div><div>`
    let (doc, ids) = element_ids(&tree(|b| {
        b.unclosed("div", &[], |b| {
            b.unclosed("div", &[], |_| ());
        });
    }));
    assert_eq!(
        ClosingAction::InsertEndTag,
        closing_action(&doc, ids[1], &catalog)
    );

    // `<div><div></div>`, with only the outer element left open.
    let (doc, ids) = element_ids(&tree(|b| {
        b.unclosed("div", &[], |b| {
            b.element("div", &[], |_| ());
        });
    }));
    assert_eq!(
        ClosingAction::InsertEndTag,
        closing_action(&doc, ids[0], &catalog)
    );
    // The open ancestor of the same name still needs closing.
    assert_eq!(
        ClosingAction::InsertEndTag,
        closing_action(&doc, ids[1], &catalog)
    );

    // `<div><div></div></div>`
    let (doc, ids) = element_ids(&tree(|b| {
        b.element("div", &[], |b| {
            b.element("div", &[], |_| ());
        });
    }));
    assert_eq!(
        ClosingAction::NoAction,
        closing_action(&doc, ids[0], &catalog)
    );
    assert_eq!(
        ClosingAction::NoAction,
        closing_action(&doc, ids[1], &catalog)
    );
}

#[test]
fn required_attribute_gates_binding() {
    let catalog = DescriptorCatalog::from_iter([helper(
        "App.FooTagHelper",
        vec![MatchingRule::new("Foo")],
    )
    .attribute(AttributeDescriptor::new("bar", "int", "Bar").required())
    .build()]);

    let without = bind(&TagQuery::new("Foo"), &catalog);
    assert!(without.is_empty());

    let with = bind(&TagQuery::new("Foo").attr("bar", Some("1")), &catalog);
    assert_eq!(
        vec!["App.FooTagHelper"],
        with.descriptors
            .iter()
            .map(|d| d.type_name.as_str())
            .collect::<Vec<_>>()
    );

    // Neither case is diagnosed.
    let sut = Compiler::builder()
        .catalog(catalog)
        .build()
        .expect("valid configuration");

    let out = sut.compile(&tree(|b| {
        b.element("Foo", &[], |_| ())
            .element("Foo", &[AttrSpec::Literal("bar", "1")], |_| ());
    }));

    assert!(out.diagnostics().is_empty());
    assert_eq!(1, out.text().matches("CreateTagHelper<").count());
}

#[test]
fn void_markup_self_closes_without_descriptors() {
    assert_eq!(
        TagStructure::SelfClosingOnly,
        infer_structure("input", false, [])
    );

    let (doc, ids) = element_ids(&tree(|b| {
        b.void_element("input", &[]);
    }));

    assert_eq!(
        ClosingAction::SelfClose,
        closing_action(&doc, ids[0], &DescriptorCatalog::default())
    );
}

struct Corrupt;

impl DescriptorSource for Corrupt {
    fn snapshot(&self) -> Result<Arc<DescriptorCatalog>, CatalogError> {
        Err(CatalogError::Corrupt("truncated".into()))
    }
}

#[test]
fn catalog_failure_is_confined_to_binding() {
    let sut = Compiler::builder()
        .descriptors(Corrupt)
        .build()
        .expect("valid configuration");

    let out = sut.compile(&tree(|b| {
        b.directive("model", &["HomeModel"])
            .element("a", &[AttrSpec::Literal("asp-action", "Index")], |_| ());
    }));

    assert_eq!(vec![DiagnosticCode(3003)], codes(&out));

    // Earlier stages took effect and output was produced.
    assert!(out.text().contains("RazorPage<HomeModel>"));
    assert!(out
        .text()
        .contains("WriteLiteral(\"<a asp-action=\\\"Index\\\"></a>\");"));
    assert!(out.is_complete());
}
