// Tests for document classification
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
    directive::DirectiveRegistry, lower::lower, span::Context,
    syntax::TreeBuilder,
};

fn run_with(
    sut: DocumentClassificationPass,
    path: &str,
    f: impl FnOnce(&mut TreeBuilder),
) -> IrDocument {
    let registry = Arc::new(DirectiveRegistry::builtin());

    let mut b = TreeBuilder::new(Context::new(1), path);
    f(&mut b);

    let mut doc = lower(&b.finish());
    DirectiveClassificationPass::new(registry.clone())
        .execute(&mut doc)
        .expect("classification does not fail");
    DirectiveUsagePass::new(registry)
        .execute(&mut doc)
        .expect("usage does not fail");
    sut.execute(&mut doc).expect("pass does not fail");

    doc
}

fn default_sut() -> DocumentClassificationPass {
    DocumentClassificationPass::new(
        vec![Arc::new(page_classifier())],
        DocumentKind::view(),
        Some("MyApp".into()),
    )
}

fn namespace(doc: &IrDocument) -> &str {
    match doc.node(doc.namespace()) {
        IrNode::Namespace(ns) => &ns.name,
        other => panic!("expected namespace, got {other:?}"),
    }
}

#[test]
fn view_is_the_default_kind() {
    let doc = run_with(default_sut(), "Views/Home/Index.cshtml", |b| {
        b.text("<p>hi</p>");
    });

    assert_eq!(Some("mvc.1.0-view"), doc.kind());

    let class = doc.class_node().expect("class exists");
    assert_eq!(
        Some("global::Microsoft.AspNetCore.Mvc.Razor.RazorPage<dynamic>"),
        class.base.as_deref()
    );
    assert_eq!("MyApp.Views.Home", namespace(&doc));

    match doc.node(doc.method()) {
        IrNode::Method(method) => {
            assert_eq!("ExecuteAsync", method.name);
            assert_eq!(
                "public async override global::System.Threading.Tasks.Task",
                method.signature
            );
        }
        other => panic!("expected method, got {other:?}"),
    }
}

#[test]
fn model_is_base_type_argument() {
    let doc = run_with(default_sut(), "Index.cshtml", |b| {
        b.directive("model", &["MyApp.Person"]);
    });

    assert_eq!(
        Some("global::Microsoft.AspNetCore.Mvc.Razor.RazorPage<MyApp.Person>"),
        doc.class_node().and_then(|c| c.base.as_deref())
    );
    assert_eq!("MyApp", namespace(&doc));
}

#[test]
fn inherits_replaces_base() {
    let doc = run_with(default_sut(), "Index.cshtml", |b| {
        b.directive("model", &["MyApp.Person"])
            .directive("inherits", &["MyApp.CustomBase<MyApp.Person>"]);
    });

    assert_eq!(
        Some("MyApp.CustomBase<MyApp.Person>"),
        doc.class_node().and_then(|c| c.base.as_deref())
    );
}

#[test]
fn page_directive_selects_page_kind() {
    let doc = run_with(default_sut(), "Pages/About.cshtml", |b| {
        b.directive("page", &["\"/about\""]);
    });

    assert_eq!(Some("mvc.1.0-razor-page"), doc.kind());
    assert_eq!(
        Some("global::Microsoft.AspNetCore.Mvc.RazorPages.Page"),
        doc.class_node().and_then(|c| c.base.as_deref())
    );
}

#[test]
fn first_matching_classifier_wins() {
    let custom = DocumentKind {
        name: "custom".into(),
        base_type: "CustomBase".into(),
        default_model: None,
        method_signature: "public void".into(),
        method_name: "Render".into(),
        namespace_fallback: "Custom".into(),
    };

    let sut = DocumentClassificationPass::new(
        vec![
            Arc::new(PredicateClassifier::new(custom, |doc: &IrDocument| {
                doc.path().starts_with("Custom/")
            })),
            Arc::new(page_classifier()),
        ],
        DocumentKind::view(),
        None,
    );

    let doc = run_with(sut, "Custom/Thing.cshtml", |b| {
        b.directive("page", &[]);
    });

    assert_eq!(Some("custom"), doc.kind());
    assert_eq!("Custom", namespace(&doc));
}

#[test]
fn namespace_directive_and_fallback() {
    let doc = run_with(default_sut(), "Views/Index.cshtml", |b| {
        b.directive("namespace", &["Other.Place"]);
    });
    assert_eq!("Other.Place", namespace(&doc));

    let no_root =
        DocumentClassificationPass::new(vec![], DocumentKind::view(), None);
    let doc = run_with(no_root, "Views/Index.cshtml", |_| ());
    assert_eq!("AspNetCore", namespace(&doc));
}

#[test]
fn namespace_segments_become_identifiers() {
    assert_eq!(
        Some("Root.Views._2023.my_dir".to_string()),
        namespace_for("Views/2023/my-dir/Index.cshtml", Some("Root"))
    );
    assert_eq!(
        Some("Root".to_string()),
        namespace_for("/Index.cshtml", Some("Root"))
    );
    assert_eq!(None, namespace_for("Views/Index.cshtml", None));
}

#[test]
fn class_configuration_directives() {
    let doc = run_with(default_sut(), "Index.cshtml", |b| {
        b.directive("implements", &["System.IDisposable"])
            .directive("attribute", &["[Authorize]"])
            .directive("typeparam", &["TItem"])
            .directive("inject", &["ILogger<Index>", "Log"])
            .directive("layout", &["\"_Layout\""])
            .text("<p>body</p>");
    });

    let class = doc.class_node().expect("class exists");
    assert_eq!(vec!["System.IDisposable"], class.interfaces);
    assert_eq!(vec!["Authorize"], class.attributes);
    assert_eq!(vec!["TItem"], class.type_params);

    let members = doc
        .children(doc.class())
        .iter()
        .filter_map(|id| match doc.node(*id) {
            IrNode::Member(member) => Some(member.clone()),
            _ => None,
        })
        .collect::<Vec<_>>();

    assert_eq!(
        vec![MemberNode {
            attributes: vec![INJECT_ATTRIBUTE.into()],
            type_name: "ILogger<Index>".into(),
            name: "Log".into(),
        }],
        members
    );

    // Members precede the method.
    assert_eq!(
        Some(1),
        doc.index_in_parent(doc.method())
    );

    let first = doc.children(doc.method())[0];
    match doc.node(first) {
        IrNode::EmbeddedStatement(code) => {
            assert_eq!("Layout = \"_Layout\";", code.text());
            assert!(code.tokens.iter().all(CodeToken::is_synthetic));
            assert_eq!(None, doc.span(first));
        }
        other => panic!("expected layout statement, got {other:?}"),
    }

    assert_eq!(Ok(()), doc.validate());
}
