// Tests for the directive registry
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
use crate::{diagnose::Record, ir::RawToken, span::dummy::*};

fn raw(name: &str, tokens: &[&str], body: Option<Span>) -> RawDirective {
    RawDirective {
        name: name.into(),
        keyword: S1,
        tokens: tokens
            .iter()
            .zip([S2, S3, S4, S5, S6])
            .map(|(text, span)| RawToken {
                text: text.to_string(),
                span,
            })
            .collect(),
        body,
    }
}

#[test]
fn builtin_registry_contents() {
    let sut = DirectiveRegistry::builtin();

    assert_eq!(15, sut.len());

    let model = sut.get("model").expect("model is built in");
    assert_eq!(DirectiveKind::SingleLine, model.kind());
    assert_eq!(DirectiveUsage::FileScopedSinglyOccurring, model.usage());
    assert_eq!((1, 1), model.arity());

    assert_eq!(Some((0, 1)), sut.get("page").map(DirectiveDescriptor::arity));
    assert_eq!(
        Some(DirectiveKind::CodeBlock),
        sut.get("functions").map(DirectiveDescriptor::kind)
    );
}

#[test]
fn parses_tokens_with_kinds() {
    let sut = DirectiveRegistry::builtin();

    let (desc, tokens) = sut
        .try_parse(&raw("inject", &["ILogger<Home>", "Log"], None), S10)
        .expect("inject should parse");

    assert_eq!("inject", desc.name());
    assert_eq!(
        vec![
            (TokenKind::Type, "ILogger<Home>", S2),
            (TokenKind::Member, "Log", S3),
        ],
        tokens
            .iter()
            .map(|t| (t.kind(), t.content(), t.span()))
            .collect::<Vec<_>>(),
    );
}

#[test]
fn too_many_tokens_is_wrong_arity() {
    let sut = DirectiveRegistry::builtin();

    let err = sut
        .try_parse(&raw("model", &["A", "B"], None), S10)
        .unwrap_err();

    assert_eq!(
        DirectiveError::WrongArity {
            name: "model".into(),
            expected: (1, 1),
            found: 2,
            span: S10,
        },
        err
    );

    let record = Record::from_diagnostic(&err, S9);
    assert_eq!(DiagnosticCode(2001), record.code());
    assert_eq!(S10, record.span());
    assert!(record
        .message()
        .starts_with("wrong argument count for `@model`: expected 1, found 2"));
}

#[test]
fn too_few_tokens_is_wrong_arity() {
    let sut = DirectiveRegistry::builtin();

    assert!(matches!(
        sut.try_parse(&raw("inject", &["ILogger"], None), S10),
        Err(DirectiveError::WrongArity { found: 1, expected: (2, 2), .. })
    ));
}

#[test]
fn optional_trailing_token() {
    let sut = DirectiveRegistry::builtin();

    assert!(sut.try_parse(&raw("page", &[], None), S10).is_ok());
    assert!(sut.try_parse(&raw("page", &["\"/home\""], None), S10).is_ok());

    let err = sut
        .try_parse(&raw("page", &["\"/a\"", "\"/b\""], None), S10)
        .unwrap_err();
    assert_eq!(
        "wrong argument count for `@page`: expected 0 to 1, found 2",
        err.to_string()
    );
}

#[test]
fn unknown_directive() {
    let sut = DirectiveRegistry::builtin();

    assert_eq!(
        Err(DirectiveError::UnknownDirective {
            name: "frobnicate".into(),
            span: S1,
        }),
        sut.try_parse(&raw("frobnicate", &[], None), S10)
    );
}

#[test]
fn body_presence_is_validated() {
    let sut = DirectiveRegistry::builtin();

    assert!(matches!(
        sut.try_parse(&raw("section", &["Scripts"], None), S10),
        Err(DirectiveError::MissingBody { .. })
    ));

    assert_eq!(
        Err(DirectiveError::UnexpectedBody {
            name: "model".into(),
            span: S7,
        }),
        sut.try_parse(&raw("model", &["Foo"], Some(S7)), S10)
    );

    assert!(sut
        .try_parse(&raw("section", &["Scripts"], Some(S7)), S10)
        .is_ok());
}

#[test]
fn invalid_token_reports_token_span() {
    let sut = DirectiveRegistry::builtin();

    let err = sut
        .try_parse(&raw("namespace", &["My..App"], None), S10)
        .unwrap_err();

    assert_eq!(
        DirectiveError::InvalidToken {
            name: "namespace".into(),
            expected: TokenKind::Namespace,
            found: "My..App".into(),
            span: S2,
        },
        err
    );

    assert_eq!(
        "invalid argument `My..App` for `@namespace`: expected namespace",
        err.to_string()
    );
}

#[test]
fn token_kind_lexical_rules() {
    use TokenKind::*;

    assert!(Type.accepts("Dictionary<string,int>"));
    assert!(Type.accepts("global::System.String"));
    assert!(Type.accepts("int?"));
    assert!(!Type.accepts("1Foo"));

    assert!(Member.accepts("_name1"));
    assert!(Member.accepts("@class"));
    assert!(!Member.accepts("a.b"));

    assert!(Namespace.accepts("A.B.C"));
    assert!(!Namespace.accepts("A."));

    assert!(String.accepts("\"\""));
    assert!(!String.accepts("\""));
    assert!(!String.accepts("unquoted"));

    assert!(Attribute.accepts("[Authorize]"));
    assert!(!Attribute.accepts("[]"));

    assert!(Boolean.accepts("false"));
    assert!(!Boolean.accepts("False"));
}

#[test]
fn string_token_value_is_unquoted() {
    let tok = DirectiveToken::new(TokenKind::String, "\"*, Weft\"", S1);
    assert_eq!("*, Weft", tok.value());
    assert_eq!("\"*, Weft\"", tok.content());

    let tok = DirectiveToken::new(TokenKind::Type, "Foo", S1);
    assert_eq!("Foo", tok.value());
}

#[test]
fn registry_rejects_duplicate_names() {
    let mut builder = DirectiveRegistry::builder();

    builder
        .register(DirectiveDescriptor::new(
            "x",
            DirectiveKind::SingleLine,
            DirectiveUsage::Unrestricted,
        ))
        .expect("first registration succeeds");

    assert_eq!(
        Err(RegistryError::DuplicateName("x".into())),
        builder
            .register(DirectiveDescriptor::new(
                "x",
                DirectiveKind::CodeBlock,
                DirectiveUsage::Unrestricted,
            ))
            .map(|_| ())
    );
}

#[test]
fn registry_rejects_required_after_optional() {
    let desc = DirectiveDescriptor::new(
        "x",
        DirectiveKind::SingleLine,
        DirectiveUsage::Unrestricted,
    )
    .optional_token(TokenKind::Member)
    .token(TokenKind::Type);

    assert_eq!(
        Err(RegistryError::OptionalNotTrailing("x".into())),
        DirectiveRegistry::builder().register(desc).map(|_| ())
    );
}

#[test]
fn registry_rejects_too_many_tokens() {
    let desc = (0..=global::MAX_DIRECTIVE_TOKENS).fold(
        DirectiveDescriptor::new(
            "long",
            DirectiveKind::SingleLine,
            DirectiveUsage::Unrestricted,
        ),
        |desc, _| desc.token(TokenKind::Member),
    );

    assert!(matches!(
        DirectiveRegistry::builder().register(desc),
        Err(RegistryError::TooManyTokens { .. })
    ));
}

#[test]
fn extending_builtin_registry() {
    let mut builder = DirectiveRegistry::builder();

    builder
        .extend(&DirectiveRegistry::builtin())
        .and_then(|b| {
            b.register(
                DirectiveDescriptor::new(
                    "rendermode",
                    DirectiveKind::SingleLine,
                    DirectiveUsage::FileScopedSinglyOccurring,
                )
                .token(TokenKind::Member),
            )
        })
        .expect("registration succeeds");

    let sut = builder.build();
    assert_eq!(16, sut.len());
    assert!(sut.get("rendermode").is_some());
}
