// Tests for the generated text emitter
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
    bind::{
        AttributeDescriptor, BindingDescriptor, DescriptorBuilder,
        DescriptorCatalog, DescriptorKind, MatchingRule,
    },
    directive::DirectiveRegistry,
    ir::{LiteralNode, UsingNode},
    lower::lower,
    pass::{
        BindingPass, CancellationToken, DirectiveClassificationPass,
        DirectiveUsagePass, DocumentClassificationPass, ExpressionRewritePass,
        Pass, Pipeline,
    },
    span::Context,
    syntax::{AttrSpec, SyntaxTree, TreeBuilder},
};
use std::sync::Arc;

const MODEL_EXPR: &str =
    "global::Microsoft.AspNetCore.Mvc.ViewFeatures.ModelExpression";

fn foo_helper() -> DescriptorBuilder {
    DescriptorBuilder::new(DescriptorKind::TagHelper, "App", "App.FooTagHelper")
        .rule(MatchingRule::new("foo"))
}

fn lowered(
    descs: Vec<BindingDescriptor>,
    options: &CompilerOptions,
    f: impl FnOnce(&mut TreeBuilder),
) -> (SyntaxTree, IrDocument) {
    let mut b = TreeBuilder::new(Context::new(1), "Index.cshtml");
    f(&mut b);

    let tree = b.finish();
    let mut doc = lower(&tree);

    let registry = Arc::new(DirectiveRegistry::builtin());
    let catalog = Arc::new(DescriptorCatalog::from_iter(descs));

    let passes: Vec<Box<dyn Pass>> = vec![
        Box::new(DirectiveClassificationPass::new(registry.clone())),
        Box::new(DirectiveUsagePass::new(registry)),
        Box::new(DocumentClassificationPass::new(
            vec![],
            DocumentKind::view(),
            None,
        )),
        Box::new(BindingPass::new(Arc::new(catalog), false)),
        Box::new(ExpressionRewritePass::new(options.wrapper_rules().to_vec())),
    ];

    let pipeline = Pipeline::new(passes).expect("valid pipeline");

    pipeline
        .run(&mut doc, &CancellationToken::new())
        .expect("not cancelled");

    (tree, doc)
}

fn emitted_with(
    descs: Vec<BindingDescriptor>,
    options: CompilerOptions,
    f: impl FnOnce(&mut TreeBuilder),
) -> (SyntaxTree, Emitted) {
    let (tree, doc) = lowered(descs, &options, f);
    let out = emit(&doc, tree.source(), &options);

    assert_verbatim(&tree, &out);
    (tree, out)
}

fn emitted(f: impl FnOnce(&mut TreeBuilder)) -> (SyntaxTree, Emitted) {
    emitted_with(vec![], no_checksum(), f)
}

fn no_checksum() -> CompilerOptions {
    CompilerOptions::builder().emit_checksum(false).build()
}

/// Every mapping must correlate identical text.
fn assert_verbatim(tree: &SyntaxTree, out: &Emitted) {
    for entry in out.source_map.entries() {
        assert_eq!(
            tree.source().slice(entry.original),
            out.text.get(entry.generated.range()),
            "mapping {entry:?} is not verbatim",
        );
    }
}

/// Arguments of every `WriteLiteral` call,
///   concatenated.
fn literals(text: &str) -> String {
    text.lines()
        .filter_map(|line| line.trim_start().strip_prefix("WriteLiteral(\""))
        .filter_map(|rest| rest.strip_suffix("\");"))
        .collect()
}

fn mapped_texts<'a>(tree: &'a SyntaxTree, out: &Emitted) -> Vec<&'a str> {
    out.source_map
        .entries()
        .iter()
        .filter_map(|e| tree.source().slice(e.original))
        .collect()
}

#[test]
fn markup_and_expressions_are_mapped() {
    let (_, out) = emitted(|b| {
        b.text("<p>").expr("Model.Name").text("</p>");
    });

    assert!(out.text.contains("WriteLiteral(\"<p>\");\n"));
    assert!(out.text.contains("Write(Model.Name);\n"));
    assert!(out.text.contains("WriteLiteral(\"</p>\");\n"));

    assert_eq!(17, out.source_map.mapped_len());
    assert!(out.diagnostics.is_empty());
}

#[test]
fn contiguous_markup_is_written_once() {
    let (_, out) = emitted(|b| {
        b.text("<ul>").comment("hidden").text("<li>").text("item");
    });

    // The comment separates the first literal from the rest.
    assert_eq!("<ul><li>item", literals(&out.text));
    assert_eq!(2, out.text.matches("WriteLiteral(").count());
}

#[test]
fn escaped_markup_is_mapped_around_escapes() {
    let markup = "<p class=\"a\">Hello</p>\n<b>bold</b>";

    let (tree, out) = emitted(|b| {
        b.text(markup);
    });

    assert!(out.text.contains(
        r#"WriteLiteral("<p class=\"a\">Hello</p>\n<b>bold</b>");"#
    ));

    let source = tree.source();
    assert_eq!(source.text(), markup);

    for (offset, c) in markup.char_indices() {
        let generated = out.source_map.to_generated(offset as u32);

        match c {
            '"' | '\n' => assert_eq!(None, generated, "{c:?} at {offset}"),
            _ => {
                let at = generated.expect("markup is mapped");
                let expected = &markup[offset..offset + 1];
                assert_eq!(Some(expected), out.text.get(at..at + 1));
            }
        }
    }

    // Positions of each run are those of the source.
    for entry in out.source_map.entries() {
        let o = entry.original;
        assert_eq!(source.span(o.offset(), o.len()), o);
    }

    assert_eq!(4, out.source_map.entries().len());
}

#[test]
fn unbound_element_interleaves_attribute_code() {
    let (tree, out) = emitted(|b| {
        b.element("a", &[AttrSpec::Code("href", "Model.Url")], |b| {
            b.text("x");
        });
    });

    assert_eq!(r#"<a href=\"\">x</a>"#, literals(&out.text));
    assert!(out.text.contains("Write(Model.Url);\n"));
    assert!(mapped_texts(&tree, &out).contains(&"Model.Url"));
}

#[test]
fn opted_out_element_omits_marker() {
    let (_, out) = emitted(|b| {
        b.opt_out("p", &[], |b| {
            b.text("hi");
        });
    });

    assert_eq!("<p>hi</p>", literals(&out.text));
    assert!(out.diagnostics.is_empty());
}

#[test]
fn class_layout_follows_classification() {
    let (tree, out) = emitted(|b| {
        b.directive("using", &["System.Linq"])
            .directive("model", &["Person"])
            .directive("inject", &["IClock", "Clock"])
            .text("<p>");
    });

    let text = &out.text;

    assert!(text.starts_with(
        "// <auto-generated/>\n#pragma warning disable 1591\n"
    ));
    assert!(text.contains("namespace AspNetCore\n{\n#line hidden\n"));
    assert!(text.contains("    using System.Linq;\n"));
    assert!(text.contains(
        "    public class Index : \
         global::Microsoft.AspNetCore.Mvc.Razor.RazorPage<Person>\n"
    ));
    assert!(
        text.contains("        public IClock Clock { get; private set; }\n")
    );
    assert!(text.contains(
        "        public async override \
         global::System.Threading.Tasks.Task ExecuteAsync()\n"
    ));
    assert!(text.ends_with("#pragma warning restore 1591\n"));

    // Usings precede the class.
    let using = text.find("using System.Linq").expect("using emitted");
    let class = text.find("public class").expect("class emitted");
    assert!(using < class);

    assert!(mapped_texts(&tree, &out).contains(&"System.Linq"));
}

#[test]
fn checksum_identifies_source() {
    let (tree, out) = emitted_with(vec![], CompilerOptions::default(), |b| {
        b.text("<p>");
    });

    let sum = tree.source().checksum();
    let expected = format!(
        "#pragma checksum \"Index.cshtml\" \"{}\" \"{}\"\n",
        sum.algorithm(),
        sum.hex()
    );

    assert!(out.text.starts_with(&expected));

    let (_, out) = emitted(|b| {
        b.text("<p>");
    });
    assert!(!out.text.contains("#pragma checksum"));
}

#[test]
fn line_pragmas_surround_mapped_code() {
    let options = CompilerOptions::builder()
        .emit_checksum(false)
        .emit_line_pragmas(true)
        .build();

    let (_, out) = emitted_with(vec![], options, |b| {
        b.text("<p>\n").expr("Model.Name");
    });

    let expected = [
        "#line 2 \"Index.cshtml\"",
        "            Write(Model.Name);",
        "#line default",
        "#line hidden\n",
    ]
    .join("\n");
    assert!(out.text.contains(&expected));
}

#[test]
fn functions_are_class_members() {
    let (tree, out) = emitted(|b| {
        b.code_directive("functions", " int Count() => 1; ");
    });

    // Appended to the class after the method.
    let code = out.text.find("int Count() => 1;").expect("code emitted");
    let method_end = out
        .text
        .find("#pragma warning restore 1998")
        .expect("method emitted");
    assert!(method_end < code);

    assert!(mapped_texts(&tree, &out).contains(&" int Count() => 1; "));
}

#[test]
fn sections_define_callbacks() {
    let (_, out) = emitted(|b| {
        b.directive_block("section", &["Scripts"], |b| {
            b.text("<script>");
        });
    });

    assert!(out.text.contains("DefineSection(\"Scripts\", async() => {\n"));
    assert!(out.text.contains("WriteLiteral(\"<script>\");\n"));
    assert!(out.text.contains("}\n            );\n"));
}

#[test]
fn design_time_maps_directive_tokens() {
    let options = CompilerOptions::builder()
        .emit_checksum(false)
        .design_time(true)
        .build();

    let (tree, out) = emitted_with(vec![], options, |b| {
        b.directive("model", &["Person"]).directive("using", &["System"]);
    });

    assert!(out.text.contains("private void __RazorDirectiveTokenHelpers__()"));
    assert!(out.text.contains("Person __typeHelper = default;"));

    // Usings are already mapped by the using itself.
    assert_eq!(1, out.text.matches("global::System.Action").count());

    let mapped = mapped_texts(&tree, &out);
    assert!(mapped.contains(&"Person"));
    assert!(mapped.contains(&"System"));
}

#[test]
fn bound_element_runs_helpers() {
    let desc = foo_helper()
        .attribute(AttributeDescriptor::new("count", "int", "Count"))
        .attribute(AttributeDescriptor::new("title", "string", "Title"))
        .attribute(AttributeDescriptor::new("hidden", "bool", "Hidden"))
        .build();

    let (tree, out) = emitted_with(vec![desc], no_checksum(), |b| {
        b.element(
            "foo",
            &[
                AttrSpec::Literal("count", "3"),
                AttrSpec::Literal("title", "Hi"),
                AttrSpec::Minimized("hidden"),
                AttrSpec::Literal("class", "x"),
            ],
            |b| {
                b.text("body");
            },
        );
    });

    let text = &out.text;
    let helpers = "global::Microsoft.AspNetCore.Razor.TagHelpers";
    let style = format!("{helpers}.HtmlAttributeValueStyle");
    let foo = "__App_FooTagHelper";

    for expected in [
        format!("private global::App.FooTagHelper {foo};"),
        format!(
            "__tagHelperScopeManager.Begin(\"foo\", \
             {helpers}.TagMode.StartTagAndEndTag, "
        ),
        "WriteLiteral(\"body\");".into(),
        format!("{foo} = CreateTagHelper<global::App.FooTagHelper>();"),
        format!("__tagHelperExecutionContext.Add({foo});"),
        format!("{foo}.Count = 3;"),
        format!(
            "AddTagHelperAttribute(\"count\", {foo}.Count, \
             {style}.DoubleQuotes);"
        ),
        format!("{foo}.Title = \"Hi\";"),
        format!("{foo}.Hidden = true;"),
        format!(
            "AddTagHelperAttribute(\"hidden\", {foo}.Hidden, \
             {style}.Minimized);"
        ),
        format!(
            "AddHtmlAttribute(\"class\", Html.Raw(\"x\"), \
             {style}.DoubleQuotes);"
        ),
        "await __tagHelperRunner.RunAsync(__tagHelperExecutionContext);".into(),
        "Write(__tagHelperExecutionContext.Output);".into(),
    ] {
        assert!(text.contains(&expected), "missing `{expected}` in:\n{text}");
    }

    // The element's own markup is replaced by the helper.
    assert_eq!("body", literals(text));

    // Values copied from the template remain mapped.
    assert!(mapped_texts(&tree, &out).contains(&"3"));

    // Synthetic text is attributed to the element.
    let el = tree.nodes()[0].span();
    let at = text.find("CreateTagHelper").expect("helper created");
    assert_eq!(Some(el), out.source_map.remap_or_enclosing(at, 15));
}

#[test]
fn bound_self_closing_element_has_no_content() {
    let (_, out) = emitted_with(vec![foo_helper().build()], no_checksum(), |b| {
        b.self_closing("foo", &[]);
    });

    assert!(out.text.contains("TagMode.SelfClosing, "));
    assert_eq!("", literals(&out.text));
}

#[test]
fn model_expressions_are_wrapped() {
    let desc = foo_helper()
        .attribute(AttributeDescriptor::new("for", MODEL_EXPR, "For"))
        .build();

    let (tree, out) = emitted_with(vec![desc], no_checksum(), |b| {
        b.self_closing("foo", &[AttrSpec::Literal("for", "Name")]);
    });

    assert!(out.text.contains(
        "__App_FooTagHelper.For = \
         ModelExpressionProvider.CreateModelExpression(\
         ViewData, __model => __model.Name);"
    ));
    assert!(mapped_texts(&tree, &out).contains(&"Name"));
}

#[test]
fn unexpected_node_is_reported_and_emission_continues() {
    let options = no_checksum();
    let (tree, mut doc) = lowered(vec![], &options, |b| {
        b.text("<p>");
    });

    let method = doc.method();
    doc.push(
        method,
        IrNode::Using(UsingNode {
            namespace: "System".into(),
        }),
        None,
    );
    doc.push(
        method,
        IrNode::Literal(LiteralNode {
            text: "after".into(),
        }),
        None,
    );

    let out = emit(&doc, tree.source(), &options);

    assert!(out.diagnostics.has_fatal());
    assert_eq!(
        vec![DiagnosticCode(9003)],
        out.diagnostics.iter().map(|r| r.code()).collect::<Vec<_>>()
    );

    // Synthetic markup is never mapped but is still written.
    assert_eq!("<p>after", literals(&out.text));
}

#[test]
fn escape_borrows_unless_needed() {
    assert!(matches!(escape("plain <b>"), Cow::Borrowed("plain <b>")));
    assert_eq!("a\\\\b\\\"\\t\\u0001", escape("a\\b\"\t\u{1}"));
}
