// Directive registry
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

//! Grammar and lookup of template directives.
//!
//! A directive is a line such as `@model MyApp.Person` or a block such as
//!   `@section Scripts { ... }`.
//! The parser knows only a directive's shape;
//!   the [`DirectiveRegistry`] knows its grammar:
//!     the ordered [`TokenKind`]s it accepts,
//!     whether it has a body,
//!     and where in a document it may appear ([`DirectiveUsage`]).
//!
//! The registry is pure grammar and lookup.
//! It is built once per compiler configuration using a
//!   [`DirectiveRegistryBuilder`] and is immutable thereafter;
//!     usage constraints are enforced by the
//!     [usage pass](crate::pass::DirectiveUsagePass),
//!     not here.

use crate::{
    diagnose::{
        panic::DiagnosticPanic, Annotate, AnnotatedSpan, Diagnostic,
        DiagnosticCode,
    },
    fmt::{DisplayWrapper, TtDirective, TtQuote},
    global,
    ir::RawDirective,
    span::Span,
};
use arrayvec::ArrayVec;
use fxhash::FxHashMap;
use std::{
    error::Error,
    fmt::{self, Display},
};

/// Shape of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// Tokens only,
    ///   terminated by the end of the line.
    SingleLine,

    /// Tokens followed by a braced markup body.
    RazorBlock,

    /// Tokens followed by a braced body of host-language code.
    CodeBlock,
}

impl DirectiveKind {
    pub fn has_body(self) -> bool {
        !matches!(self, Self::SingleLine)
    }
}

/// Where and how often a directive may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveUsage {
    /// Anywhere,
    ///   any number of times.
    Unrestricted,

    /// Top level of the document only,
    ///   at most once.
    FileScopedSinglyOccurring,

    /// Top level of the document only,
    ///   any number of times.
    FileScopedMultipleOccurring,
}

impl DirectiveUsage {
    pub fn is_file_scoped(self) -> bool {
        !matches!(self, Self::Unrestricted)
    }
}

/// Kind of a directive token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A host-language type name,
    ///   such as `List<Person>`.
    Type,

    /// A host-language identifier.
    Member,

    /// A dotted namespace name.
    Namespace,

    /// A double-quoted string.
    String,

    /// A bracketed host-language attribute,
    ///   such as `[Authorize]`.
    Attribute,

    /// `true` or `false`.
    Boolean,
}

impl TokenKind {
    /// Whether `text` is lexically valid for this kind.
    pub fn accepts(self, text: &str) -> bool {
        match self {
            Self::Type => is_type_name(text),
            Self::Member => {
                is_identifier(text.strip_prefix('@').unwrap_or(text))
            }
            Self::Namespace => {
                !text.is_empty() && text.split('.').all(is_identifier)
            }
            Self::String => {
                text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
            }
            Self::Attribute => {
                text.len() >= 3 && text.starts_with('[') && text.ends_with(']')
            }
            Self::Boolean => matches!(text, "true" | "false"),
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type => write!(f, "type name"),
            Self::Member => write!(f, "member name"),
            Self::Namespace => write!(f, "namespace"),
            Self::String => write!(f, "quoted string"),
            Self::Attribute => write!(f, "bracketed attribute"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();

    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_type_name(text: &str) -> bool {
    let mut chars = text.chars();

    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| {
            c.is_alphanumeric()
                || matches!(
                    c,
                    '_' | '.' | ':' | '<' | '>' | ',' | '[' | ']' | '?'
                )
        })
}

/// One position in a directive's token grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDescriptor {
    kind: TokenKind,
    optional: bool,
}

impl TokenDescriptor {
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Grammar and usage of a single directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveDescriptor {
    name: String,
    kind: DirectiveKind,
    usage: DirectiveUsage,
    tokens: Vec<TokenDescriptor>,
}

impl DirectiveDescriptor {
    pub fn new<S: Into<String>>(
        name: S,
        kind: DirectiveKind,
        usage: DirectiveUsage,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            usage,
            tokens: Vec::new(),
        }
    }

    /// Append a required token to the grammar.
    pub fn token(mut self, kind: TokenKind) -> Self {
        self.tokens.push(TokenDescriptor {
            kind,
            optional: false,
        });
        self
    }

    /// Append an optional token to the grammar.
    ///
    /// Only trailing tokens may be optional;
    ///   this is verified on registration.
    pub fn optional_token(mut self, kind: TokenKind) -> Self {
        self.tokens.push(TokenDescriptor {
            kind,
            optional: true,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DirectiveKind {
        self.kind
    }

    pub fn usage(&self) -> DirectiveUsage {
        self.usage
    }

    pub fn tokens(&self) -> &[TokenDescriptor] {
        &self.tokens
    }

    /// Inclusive range of accepted token counts.
    pub fn arity(&self) -> (usize, usize) {
        let required = self.tokens.iter().filter(|t| !t.optional).count();
        (required, self.tokens.len())
    }
}

/// A validated directive token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveToken {
    kind: TokenKind,
    content: String,
    span: Span,
}

impl DirectiveToken {
    pub fn new<S: Into<String>>(
        kind: TokenKind,
        content: S,
        span: Span,
    ) -> Self {
        Self {
            kind,
            content: content.into(),
            span,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Token text exactly as written.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Token text with the quotes of a [`TokenKind::String`] removed.
    pub fn value(&self) -> &str {
        match self.kind {
            TokenKind::String => self
                .content
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(&self.content),
            _ => &self.content,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Tokens of a successfully parsed directive.
pub type DirectiveTokens =
    ArrayVec<DirectiveToken, { global::MAX_DIRECTIVE_TOKENS }>;

/// Immutable collection of [`DirectiveDescriptor`]s.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectiveRegistry {
    directives: FxHashMap<String, DirectiveDescriptor>,
}

impl DirectiveRegistry {
    pub fn builder() -> DirectiveRegistryBuilder {
        DirectiveRegistryBuilder::default()
    }

    /// Registry of the directives understood by every template.
    pub fn builtin() -> Self {
        use DirectiveKind::*;
        use DirectiveUsage::*;
        use TokenKind::*;

        let mut builder = Self::builder();
        let line = |name: &str, usage: DirectiveUsage| {
            DirectiveDescriptor::new(name, SingleLine, usage)
        };

        for desc in [
            line("model", FileScopedSinglyOccurring).token(Type),
            line("inherits", FileScopedSinglyOccurring).token(Type),
            line("namespace", FileScopedSinglyOccurring).token(Namespace),
            line("using", Unrestricted).token(Namespace),
            line("inject", FileScopedMultipleOccurring)
                .token(Type)
                .token(Member),
            line("implements", FileScopedMultipleOccurring).token(Type),
            line("layout", FileScopedSinglyOccurring).token(String),
            line("page", FileScopedSinglyOccurring).optional_token(String),
            line("attribute", FileScopedMultipleOccurring).token(Attribute),
            line("typeparam", FileScopedMultipleOccurring).token(Member),
            DirectiveDescriptor::new("functions", CodeBlock, Unrestricted),
            DirectiveDescriptor::new("section", RazorBlock, Unrestricted)
                .token(Member),
            line("addTagHelper", FileScopedMultipleOccurring).token(String),
            line("removeTagHelper", FileScopedMultipleOccurring).token(String),
            line("tagHelperPrefix", FileScopedSinglyOccurring).token(String),
        ] {
            builder.register(desc).diagnostic_expect(
                vec![],
                "built-in directive grammar rejected",
            );
        }

        builder.build()
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveDescriptor> {
        self.directives.get(name)
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Validate a raw directive against its registered grammar.
    ///
    /// `span` is the span of the entire directive,
    ///   to which arity and body errors are attributed.
    ///
    /// Checks are performed in this order,
    ///   returning the first failure:
    ///     the name must be registered;
    ///     a body must be present if and only if the kind has one;
    ///     the token count must be within [`DirectiveDescriptor::arity`];
    ///     and each token must be accepted by its [`TokenKind`].
    pub fn try_parse(
        &self,
        raw: &RawDirective,
        span: Span,
    ) -> Result<(&DirectiveDescriptor, DirectiveTokens), DirectiveError> {
        use DirectiveError::*;

        let desc = self.get(&raw.name).ok_or_else(|| UnknownDirective {
            name: raw.name.clone(),
            span: raw.keyword,
        })?;

        match (desc.kind.has_body(), raw.body) {
            (true, None) => {
                return Err(MissingBody {
                    name: raw.name.clone(),
                    span,
                })
            }
            (false, Some(body)) => {
                return Err(UnexpectedBody {
                    name: raw.name.clone(),
                    span: body,
                })
            }
            _ => (),
        }

        let (min, max) = desc.arity();
        let found = raw.tokens.len();

        if found < min || found > max {
            return Err(WrongArity {
                name: raw.name.clone(),
                expected: (min, max),
                found,
                span,
            });
        }

        let mut tokens = DirectiveTokens::new();

        for (tok, tdesc) in raw.tokens.iter().zip(desc.tokens.iter()) {
            if !tdesc.kind.accepts(&tok.text) {
                return Err(InvalidToken {
                    name: raw.name.clone(),
                    expected: tdesc.kind,
                    found: tok.text.clone(),
                    span: tok.span,
                });
            }

            // Capacity is guaranteed by registration.
            tokens.push(DirectiveToken::new(tdesc.kind, &tok.text, tok.span));
        }

        Ok((desc, tokens))
    }
}

/// Builder for a [`DirectiveRegistry`].
#[derive(Debug, Default)]
pub struct DirectiveRegistryBuilder {
    directives: FxHashMap<String, DirectiveDescriptor>,
}

impl DirectiveRegistryBuilder {
    /// Add every directive of an existing registry.
    pub fn extend(
        &mut self,
        registry: &DirectiveRegistry,
    ) -> Result<&mut Self, RegistryError> {
        let mut descs =
            registry.directives.values().cloned().collect::<Vec<_>>();
        descs.sort_by(|a, b| a.name.cmp(&b.name));

        for desc in descs {
            self.register(desc)?;
        }

        Ok(self)
    }

    pub fn register(
        &mut self,
        desc: DirectiveDescriptor,
    ) -> Result<&mut Self, RegistryError> {
        use RegistryError::*;

        if self.directives.contains_key(&desc.name) {
            return Err(DuplicateName(desc.name));
        }

        if desc.tokens.len() > global::MAX_DIRECTIVE_TOKENS {
            return Err(TooManyTokens {
                count: desc.tokens.len(),
                name: desc.name,
            });
        }

        let first_optional = desc.tokens.iter().position(|t| t.optional);
        if let Some(i) = first_optional {
            if desc.tokens[i..].iter().any(|t| !t.optional) {
                return Err(OptionalNotTrailing(desc.name));
            }
        }

        self.directives.insert(desc.name.clone(), desc);
        Ok(self)
    }

    pub fn build(self) -> DirectiveRegistry {
        DirectiveRegistry {
            directives: self.directives,
        }
    }
}

/// A directive grammar could not be registered.
///
/// These are configuration errors of the embedding application,
///   not of any template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateName(String),
    OptionalNotTrailing(String),
    TooManyTokens { name: String, count: usize },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RegistryError::*;

        match self {
            DuplicateName(name) => write!(
                f,
                "directive {} is already registered",
                TtDirective::wrap(name)
            ),
            OptionalNotTrailing(name) => write!(
                f,
                "directive {} declares a required token \
                 after an optional token",
                TtDirective::wrap(name)
            ),
            TooManyTokens { name, count } => write!(
                f,
                "directive {} declares {count} tokens, \
                 but at most {} are supported",
                TtDirective::wrap(name),
                global::MAX_DIRECTIVE_TOKENS,
            ),
        }
    }
}

impl Error for RegistryError {}

/// A directive in a template does not satisfy its grammar or usage.
///
/// A directive with any of these errors is dropped;
///   the document continues compiling without its effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    WrongArity {
        name: String,
        expected: (usize, usize),
        found: usize,
        span: Span,
    },

    UnknownDirective {
        name: String,
        span: Span,
    },

    InvalidToken {
        name: String,
        expected: TokenKind,
        found: String,
        span: Span,
    },

    MissingBody {
        name: String,
        span: Span,
    },

    UnexpectedBody {
        name: String,
        span: Span,
    },

    /// A file-scoped singly-occurring directive appeared again;
    ///   `first` is the occurrence that remains in effect.
    DuplicateDirective {
        name: String,
        span: Span,
        first: Span,
    },

    /// A file-scoped directive appeared within markup or code.
    MisplacedDirective {
        name: String,
        span: Span,
    },
}

impl Display for DirectiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use DirectiveError::*;

        match self {
            WrongArity {
                name,
                expected: (min, max),
                found,
                ..
            } if min == max => write!(
                f,
                "wrong argument count for {}: expected {min}, found {found}",
                TtDirective::wrap(name),
            ),
            WrongArity {
                name,
                expected: (min, max),
                found,
                ..
            } => write!(
                f,
                "wrong argument count for {}: \
                 expected {min} to {max}, found {found}",
                TtDirective::wrap(name),
            ),
            UnknownDirective { name, .. } => {
                write!(f, "unknown directive {}", TtDirective::wrap(name))
            }
            InvalidToken {
                name,
                expected,
                found,
                ..
            } => write!(
                f,
                "invalid argument {} for {}: expected {expected}",
                TtQuote::wrap(found),
                TtDirective::wrap(name),
            ),
            MissingBody { name, .. } => write!(
                f,
                "directive {} requires a body",
                TtDirective::wrap(name)
            ),
            UnexpectedBody { name, .. } => write!(
                f,
                "directive {} does not accept a body",
                TtDirective::wrap(name)
            ),
            DuplicateDirective { name, .. } => write!(
                f,
                "directive {} may only appear once per document",
                TtDirective::wrap(name)
            ),
            MisplacedDirective { name, .. } => write!(
                f,
                "directive {} must appear at the top level of the document",
                TtDirective::wrap(name)
            ),
        }
    }
}

impl Error for DirectiveError {}

impl Diagnostic for DirectiveError {
    fn code(&self) -> DiagnosticCode {
        use DirectiveError::*;

        DiagnosticCode(match self {
            WrongArity { .. } => 2001,
            UnknownDirective { .. } => 2002,
            InvalidToken { .. } => 2003,
            MissingBody { .. } => 2004,
            UnexpectedBody { .. } => 2005,
            DuplicateDirective { .. } => 2006,
            MisplacedDirective { .. } => 2007,
        })
    }

    fn describe(&self) -> Vec<AnnotatedSpan> {
        use DirectiveError::*;

        match self {
            WrongArity { found: 0, span, .. } => {
                vec![span.error("this directive requires arguments")]
            }
            WrongArity { span, .. } => {
                span.error("this directive is ignored").with_help(
                    "arguments are separated by whitespace",
                ).into()
            }
            UnknownDirective { span, .. } => vec![span.mark_error()],
            InvalidToken { expected, span, .. } => {
                vec![span.error(format!("expected a {expected} here"))]
            }
            MissingBody { span, .. } => vec![span.error(
                "expected `{ ... }` following this directive",
            )],
            UnexpectedBody { span, .. } => {
                vec![span.error("this body is not permitted")]
            }
            DuplicateDirective { span, first, .. } => vec![
                span.error("this directive is ignored"),
                first.note("the first occurrence is used"),
            ],
            MisplacedDirective { span, .. } => vec![
                span.error("this directive is ignored"),
                span.help(
                    "move this directive outside of any element or code block",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod test;
