// Tests for lowering
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
    span::Context,
    syntax::{AttrSpec, PartSpec, TreeBuilder},
};

fn builder() -> TreeBuilder {
    TreeBuilder::new(Context::new(1), "Views/Home/Index.cshtml")
}

/// Kind names of the template body in pre-order.
fn body_kinds(doc: &IrDocument) -> Vec<&'static str> {
    doc.descendants(doc.method())
        .skip(1)
        .map(|id| doc.node(id).kind_name())
        .collect()
}

#[test]
fn class_name_from_path() {
    assert_eq!("Views_Home_Index", class_name_for("Views/Home/Index.cshtml"));
    assert_eq!("_404", class_name_for("/404.cshtml"));
    assert_eq!("dir_v1_2_page", class_name_for("dir.v1/2-page"));
    assert_eq!("Template", class_name_for(""));
}

#[test]
fn lowers_text_and_code() {
    let mut b = builder();
    b.text("<p>Hi ")
        .expr("Model.Name")
        .comment(" ignored ")
        .statement("var x = 1;")
        .text("</p>");

    let tree = b.finish();
    let doc = lower(&tree);

    assert_eq!(
        vec!["Literal", "EmbeddedExpression", "EmbeddedStatement", "Literal"],
        body_kinds(&doc)
    );

    let expr = doc.children(doc.method())[1];
    match doc.node(expr) {
        IrNode::EmbeddedExpression(code) => {
            assert_eq!("Model.Name", code.text());
            assert_eq!(
                Some("Model.Name"),
                code.tokens[0].span().and_then(|s| tree.source().slice(s))
            );
        }
        other => panic!("expected expression, got {other:?}"),
    }

    assert_eq!(
        Some("@Model.Name"),
        doc.span(expr).and_then(|s| tree.source().slice(s))
    );

    assert_eq!(
        Some("Views_Home_Index"),
        doc.class_node().map(|c| c.name.as_str())
    );
    assert_eq!(Ok(()), doc.validate());
    assert!(doc.collect_diagnostics().is_empty());
}

#[test]
fn lowers_elements_to_unbound_placeholders() {
    let mut b = builder();
    b.element(
        "Foo",
        &[
            AttrSpec::Literal("bar", "1"),
            AttrSpec::Parts(
                "class",
                &[PartSpec::Literal("a "), PartSpec::Code("cls")],
            ),
        ],
        |b| {
            b.text("body");
        },
    );

    let tree = b.finish();
    let doc = lower(&tree);

    assert_eq!(
        vec![
            "ComponentUsage",
            "HtmlAttribute",
            "Literal",
            "HtmlAttribute",
            "Literal",
            "EmbeddedExpression",
            "Literal",
        ],
        body_kinds(&doc)
    );

    let el = doc.children(doc.method())[0];
    match doc.node(el) {
        IrNode::ComponentUsage(usage) => {
            assert_eq!("Foo", usage.tag_name);
            assert!(usage.binding.is_none());
            assert!(usage.end_tag.is_some());
            assert!(!usage.self_closing);
        }
        other => panic!("expected component usage, got {other:?}"),
    }

    let class = doc.children(el)[1];
    match doc.node(class) {
        IrNode::HtmlAttribute(attr) => {
            assert_eq!("class", attr.name);
            assert_eq!(Some('"'), attr.quote);
            assert_eq!(
                Some("a @cls"),
                attr.value.and_then(|s| tree.source().slice(s))
            );
        }
        other => panic!("expected attribute, got {other:?}"),
    }

    assert_eq!(Ok(()), doc.validate());
}

#[test]
fn block_children_lowered_in_place() {
    let mut b = builder();
    b.block(|b| {
        b.code("if (x) { ").element("b", &[], |b| {
            b.text("yes");
        });
        b.code(" }");
    });

    let tree = b.finish();
    let doc = lower(&tree);

    assert_eq!(
        vec![
            "EmbeddedStatement",
            "ComponentUsage",
            "Literal",
            "EmbeddedStatement"
        ],
        body_kinds(&doc)
    );
    assert_eq!(Ok(()), doc.validate());
}

#[test]
fn lowers_directives_with_raw_tokens() {
    let mut b = builder();
    b.directive("model", &["MyApp.Person"]);
    b.code_directive("functions", " int x; ");
    b.directive_block("section", &["Scripts"], |b| {
        b.text("<script></script>");
    });

    let tree = b.finish();
    let doc = lower(&tree);

    assert_eq!(
        vec![
            "RawDirective",
            "RawDirective",
            "CodeBlock",
            "RawDirective",
            "Literal"
        ],
        body_kinds(&doc)
    );

    let ids = doc.children(doc.method()).to_vec();

    match doc.node(ids[0]) {
        IrNode::RawDirective(raw) => {
            assert_eq!("model", raw.name);
            assert_eq!(
                vec!["MyApp.Person"],
                raw.tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>()
            );
            assert_eq!(None, raw.body);
        }
        other => panic!("expected raw directive, got {other:?}"),
    }

    let functions_code = doc.children(ids[1])[0];
    match doc.node(functions_code) {
        IrNode::CodeBlock(code) => assert_eq!(" int x; ", code.text()),
        other => panic!("expected code block, got {other:?}"),
    }

    assert_eq!(Ok(()), doc.validate());
}

#[test]
fn unterminated_code_is_diagnosed_not_fatal() {
    let mut b = builder();
    b.text("a").unterminated_statement("var x = 1;");

    let tree = b.finish();
    let doc = lower(&tree);

    assert_eq!(vec!["Literal", "EmbeddedStatement"], body_kinds(&doc));

    let diags = doc.collect_diagnostics();
    assert_eq!(1, diags.len());

    let record = diags.iter().next().expect("one diagnostic");
    assert_eq!(DiagnosticCode(1001), record.code());
    assert!(!record.is_fatal());
    assert_eq!(Some("@{var x = 1;"), tree.source().slice(record.span()));
}

#[test]
fn unterminated_directive_body() {
    let mut b = builder();
    b.unterminated_code_directive("functions", " int y;");

    let tree = b.finish();
    let doc = lower(&tree);

    let diags = doc.collect_diagnostics();
    assert_eq!(
        vec![DiagnosticCode(1002)],
        diags.iter().map(|r| r.code()).collect::<Vec<_>>()
    );
    assert!(diags.iter().all(|r| r
        .message()
        .starts_with("unterminated body of directive `@functions`")));
}
