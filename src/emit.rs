// Generated text emitter
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

//! Emit host-language source text from a finished [`IrDocument`].
//!
//! The emitter walks the IR once,
//!   depth-first,
//!   producing generated text along with a [`SourceMap`].
//! Text taken from the template is copied verbatim and recorded as a
//!   mapping;
//!     everything else is synthetic.
//!
//! Markup
//! ======
//! Adjacent markup that is contiguous in the template is written by a
//!   single `WriteLiteral` call.
//! The literal is mapped only if it needs no escaping,
//!   since otherwise its generated text differs from its source.
//! Markup of an unbound element is written from the template text of its
//!   tags,
//!     so that whitespace and quoting are preserved;
//!     code within its attribute values interrupts the literal.
//!
//! Bound Elements
//! ==============
//! A bound element opens a helper scope whose body renders the element's
//!   content,
//!     creates each bound helper,
//!     assigns bound attributes to helper properties,
//!     and passes unbound attributes through as markup attributes.
//! All text generated for a bound element is recorded as a
//!   [`Construct`](crate::srcmap::Construct) of the element,
//!     and likewise for each of its attributes,
//!     so that host-language diagnostics within synthetic text can be
//!     attributed to them.
//!
//! Failure
//! =======
//! Emission always produces text.
//! If the IR is inconsistent with the template,
//!   the offending node is skipped and a fatal [`EmitError`] is
//!   reported.

mod writer;

use crate::{
    bind::BindingResult,
    config::CompilerOptions,
    diagnose::{
        Annotate, AnnotatedSpan, Diagnostic, DiagnosticCode, Diagnostics,
    },
    directive::TokenKind,
    global::{LineSize, SourceFileSize},
    ir::{
        ClassNode, CodeNode, ComponentUsage, HtmlAttribute, IrDocument, IrNode,
        MemberNode, MethodNode, NodeId, PropertyNode, PropertyTarget,
    },
    pass::DocumentKind,
    source::SourceDocument,
    span::Span,
    srcmap::SourceMap,
};
use fxhash::FxHashSet;
use std::{
    borrow::Cow,
    error::Error,
    fmt::{self, Display},
};
use tracing::{debug, debug_span, warn};
use writer::CodeWriter;

/// Namespace of the helper runtime.
const RUNTIME: &str = "global::Microsoft.AspNetCore.Razor.Runtime.TagHelpers";

/// Namespace of helper types shared with helper implementations.
const HELPERS: &str = "global::Microsoft.AspNetCore.Razor.TagHelpers";

/// Result of emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub text: String,

    /// Problems encountered during emission only.
    pub diagnostics: Diagnostics,

    pub source_map: SourceMap,
}

/// Emit `doc`,
///   which was lowered from `source`.
pub fn emit(
    doc: &IrDocument,
    source: &SourceDocument,
    options: &CompilerOptions,
) -> Emitted {
    let span = debug_span!("emit", path = doc.path());
    let _enter = span.enter();

    let mut emitter = Emitter {
        doc,
        source,
        options,
        w: CodeWriter::new(options.indent()),
        diagnostics: Diagnostics::new(doc.source_span()),
        pending: None,
        scopes: 0,
    };

    emitter.document();

    let Emitter { w, diagnostics, .. } = emitter;
    let (text, entries, constructs) = w.finish();
    let source_map =
        SourceMap::new(entries, constructs, source.lines().clone());

    debug!(
        len = text.len(),
        mapped = source_map.mapped_len(),
        entries = source_map.entries().len(),
        "document emitted"
    );

    Emitted {
        text,
        diagnostics,
        source_map,
    }
}

/// Markup awaiting a `WriteLiteral` call.
struct PendingLiteral {
    text: String,

    /// Template text that `text` was copied from,
    ///   if any.
    span: Option<Span>,
}

struct Emitter<'a> {
    doc: &'a IrDocument,
    source: &'a SourceDocument,
    options: &'a CompilerOptions,
    w: CodeWriter,
    diagnostics: Diagnostics,
    pending: Option<PendingLiteral>,

    /// Number of helper scopes opened so far.
    scopes: usize,
}

impl<'a> Emitter<'a> {
    fn document(&mut self) {
        let doc = self.doc;

        if self.options.emit_checksum() {
            let sum = self.source.checksum();
            self.w.pragma(&format!(
                "#pragma checksum \"{}\" \"{}\" \"{}\"",
                escape(doc.path()),
                sum.algorithm(),
                sum.hex()
            ));
        }

        self.w.writeln("// <auto-generated/>");
        self.w.pragma("#pragma warning disable 1591");

        for &child in doc.children(doc.root()) {
            match doc.node(child) {
                IrNode::Namespace(ns) => {
                    self.w
                        .writeln(&format!("namespace {}", ns.name))
                        .open_block();
                    self.namespace(child);
                    self.w.close_block();
                }
                _ => self.unexpected(child),
            }
        }

        self.w.pragma("#pragma warning restore 1591");
    }

    fn namespace(&mut self, id: NodeId) {
        let doc = self.doc;
        self.w.pragma("#line hidden");

        // Usings precede everything regardless of where they were
        //   declared.
        for &child in doc.children(id) {
            if let IrNode::Using(using) = doc.node(child) {
                match doc.span(child) {
                    Some(span) => self.with_pragma(Some(span), |e| {
                        e.w.write("using ")
                            .write_mapped(&using.namespace, span)
                            .writeln(";");
                    }),
                    None => {
                        self.w.writeln(&format!("using {};", using.namespace));
                    }
                }
            }
        }

        for &child in doc.children(id) {
            match doc.node(child) {
                IrNode::Using(_) => (),
                IrNode::Class(class) => self.class(child, class),
                _ => self.unexpected(child),
            }
        }
    }

    fn class(&mut self, id: NodeId, class: &ClassNode) {
        let doc = self.doc;

        for attr in &class.attributes {
            self.w.writeln(&format!("[{attr}]"));
        }

        let mut head = format!("public class {}", class.name);

        if !class.type_params.is_empty() {
            head.push_str(&format!("<{}>", class.type_params.join(", ")));
        }

        let bases = class
            .base
            .iter()
            .chain(class.interfaces.iter())
            .map(String::as_str)
            .collect::<Vec<_>>();

        if !bases.is_empty() {
            head.push_str(&format!(" : {}", bases.join(", ")));
        }

        self.w.writeln(&head).open_block();
        self.helper_fields();

        for &child in doc.children(id) {
            match doc.node(child) {
                IrNode::Member(member) => self.member(member),
                IrNode::CodeBlock(code) => {
                    self.with_pragma(doc.span(child), |e| {
                        e.code(code);
                        e.w.ensure_line();
                    });
                }
                IrNode::Method(method) => self.method(child, method),
                _ => self.unexpected(child),
            }
        }

        if self.options.design_time() {
            self.directive_token_helpers();
        }

        self.w.close_block();
    }

    fn member(&mut self, member: &MemberNode) {
        for attr in &member.attributes {
            self.w.writeln(&format!("[{attr}]"));
        }

        self.w.writeln(&format!(
            "public {} {} {{ get; private set; }}",
            member.type_name, member.name
        ));
    }

    /// Fields used by bound elements,
    ///   if there are any.
    fn helper_fields(&mut self) {
        let doc = self.doc;

        let mut seen = FxHashSet::<String>::default();
        let helpers = doc
            .find_all(|node| matches!(node, IrNode::ComponentUsage(_)))
            .into_iter()
            .filter_map(|id| match doc.node(id) {
                IrNode::ComponentUsage(usage) => usage.binding.as_ref(),
                _ => None,
            })
            .flat_map(|binding| binding.descriptors.iter())
            .filter(|bound| seen.insert(bound.type_name.clone()))
            .map(|bound| {
                (helper_field(&bound.type_name), qualified(&bound.type_name))
            })
            .collect::<Vec<_>>();

        if helpers.is_empty() {
            return;
        }

        self.w
            .pragma("#pragma warning disable 0649")
            .writeln(&format!(
                "private {RUNTIME}.TagHelperExecutionContext \
                 __tagHelperExecutionContext;"
            ))
            .pragma("#pragma warning restore 0649")
            .writeln(&format!(
                "private {RUNTIME}.TagHelperRunner __tagHelperRunner = \
                 new {RUNTIME}.TagHelperRunner();"
            ))
            .pragma("#pragma warning disable 0169")
            .writeln("private string __tagHelperStringValueBuffer;")
            .pragma("#pragma warning restore 0169")
            .writeln(&format!(
                "private {RUNTIME}.TagHelperScopeManager \
                 __backed__tagHelperScopeManager = null;"
            ))
            .writeln(&format!(
                "private {RUNTIME}.TagHelperScopeManager \
                 __tagHelperScopeManager"
            ))
            .open_block()
            .writeln("get")
            .open_block()
            .writeln("if (__backed__tagHelperScopeManager == null)")
            .open_block()
            .writeln(&format!(
                "__backed__tagHelperScopeManager = \
                 new {RUNTIME}.TagHelperScopeManager(\
                 StartTagHelperWritingScope, EndTagHelperWritingScope);"
            ))
            .close_block()
            .writeln("return __backed__tagHelperScopeManager;")
            .close_block()
            .close_block();

        for (field, ty) in helpers {
            self.w.writeln(&format!("private {ty} {field};"));
        }
    }

    fn method(&mut self, id: NodeId, method: &MethodNode) {
        let fallback = DocumentKind::default();
        let signature = Some(method.signature.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback.method_signature.as_str());
        let name = Some(method.name.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback.method_name.as_str());

        self.w
            .pragma("#pragma warning disable 1998")
            .writeln(&format!("{signature} {name}()"))
            .open_block();

        self.content(id);
        self.flush();

        self.w.close_block().pragma("#pragma warning restore 1998");
    }

    /// Content children of `id`,
    ///   which excludes attributes.
    fn content(&mut self, id: NodeId) {
        let doc = self.doc;

        for &child in doc.children(id) {
            match doc.node(child) {
                IrNode::Literal(lit) => {
                    self.literal(&lit.text, doc.span(child))
                }

                IrNode::EmbeddedExpression(code) => {
                    self.flush();
                    self.with_pragma(doc.span(child), |e| {
                        e.w.write("Write(");
                        e.code(code);
                        e.w.writeln(");");
                    });
                }

                IrNode::EmbeddedStatement(code) | IrNode::CodeBlock(code) => {
                    self.flush();
                    self.with_pragma(doc.span(child), |e| {
                        e.code(code);
                        e.w.ensure_line();
                    });
                }

                IrNode::ComponentUsage(usage) => match &usage.binding {
                    Some(binding) => self.bound_element(child, usage, binding),
                    None => self.markup_element(child, usage),
                },

                IrNode::Section(section) => {
                    self.flush();
                    self.w.writeln(&format!(
                        "DefineSection(\"{}\", async() => {{",
                        escape(&section.name)
                    ));
                    self.w.indent();
                    self.content(child);
                    self.flush();
                    self.w.dedent().writeln("}").writeln(");");
                }

                // Configuration only,
                //   or already diagnosed.
                IrNode::Directive(_) | IrNode::RawDirective(_) => (),

                // Handled by the element.
                IrNode::HtmlAttribute(_) | IrNode::Property(_) => (),

                IrNode::Document
                | IrNode::Namespace(_)
                | IrNode::Using(_)
                | IrNode::Class(_)
                | IrNode::Member(_)
                | IrNode::Method(_) => self.unexpected(child),
            }
        }
    }

    /// Write the tokens of `code`,
    ///   mapping those copied from the template.
    fn code(&mut self, code: &CodeNode) {
        for tok in &code.tokens {
            match tok.span() {
                Some(span) => self.w.write_mapped(tok.text(), span),
                None => self.w.write(tok.text()),
            };
        }
    }

    fn markup_element(&mut self, id: NodeId, usage: &ComponentUsage) {
        let doc = self.doc;
        let start = usage.start_tag;

        // Code within attribute values interrupts the start tag.
        let code = doc
            .children(id)
            .iter()
            .filter(|attr| matches!(doc.node(**attr), IrNode::HtmlAttribute(_)))
            .flat_map(|attr| doc.children(*attr).iter().copied())
            .filter(|part| !matches!(doc.node(*part), IrNode::Literal(_)))
            .collect::<Vec<_>>();

        let mut cursor = start.offset();

        // The opt-out marker follows `<`.
        if usage.opt_out {
            self.markup(cursor, cursor + 1, id);
            cursor += 2;
        }

        for part in code {
            let Some(span) = doc.span(part) else {
                self.unexpected(part);
                continue;
            };

            self.markup(cursor, span.offset(), id);
            cursor = span.end();

            match doc.node(part) {
                IrNode::EmbeddedExpression(code) => {
                    self.flush();
                    self.with_pragma(Some(span), |e| {
                        e.w.write("Write(");
                        e.code(code);
                        e.w.writeln(");");
                    });
                }
                IrNode::EmbeddedStatement(code) => {
                    self.flush();
                    self.with_pragma(Some(span), |e| {
                        e.code(code);
                        e.w.ensure_line();
                    });
                }
                _ => self.unexpected(part),
            }
        }

        self.markup(cursor, start.end(), id);
        self.content(id);

        if let Some(end) = usage.end_tag {
            if usage.opt_out {
                self.markup(end.offset(), end.offset() + 2, id);
                self.markup(end.offset() + 3, end.end(), id);
            } else {
                self.markup(end.offset(), end.end(), id);
            }
        }
    }

    /// Template text `[from, to)` of the element `id` as markup.
    fn markup(&mut self, from: u32, to: u32, id: NodeId) {
        if to <= from {
            return;
        }

        let span = self.source.span(from, to - from);

        match self.source.slice(span) {
            Some(text) => self.literal(text, Some(span)),
            None => self.error(EmitError::UnresolvableSpan {
                kind: self.doc.node(id).kind_name(),
                span,
            }),
        }
    }

    fn bound_element(
        &mut self,
        id: NodeId,
        usage: &ComponentUsage,
        binding: &BindingResult,
    ) {
        let doc = self.doc;

        self.flush();
        let start = self.w.offset();

        let mode = match (usage.self_closing, usage.end_tag) {
            (true, _) => "SelfClosing",
            (false, Some(_)) => "StartTagAndEndTag",
            (false, None) => "StartTagOnly",
        };

        let uid =
            format!("{:016x}", fxhash::hash64(&(doc.path(), self.scopes)));
        self.scopes += 1;

        self.w.writeln(&format!(
            "__tagHelperExecutionContext = __tagHelperScopeManager.Begin(\
             \"{}\", {HELPERS}.TagMode.{mode}, \"{uid}\", async() => {{",
            escape(&binding.tag_name),
        ));
        self.w.indent();
        self.content(id);
        self.flush();
        self.w.dedent().writeln("}").writeln(");");

        for bound in &binding.descriptors {
            let field = helper_field(&bound.type_name);

            self.w
                .writeln(&format!(
                    "{field} = CreateTagHelper<{}>();",
                    qualified(&bound.type_name)
                ))
                .writeln(&format!("__tagHelperExecutionContext.Add({field});"));
        }

        for &child in doc.children(id) {
            let attr_start = self.w.offset();

            match doc.node(child) {
                IrNode::Property(prop) => self.property(child, prop, binding),
                IrNode::HtmlAttribute(attr) => self.html_attribute(child, attr),
                _ => continue,
            }

            if let Some(span) = doc.span(child) {
                self.w.construct(span, attr_start);
            }
        }

        const CONTEXT: &str = "__tagHelperExecutionContext";

        self.w
            .writeln(&format!("await __tagHelperRunner.RunAsync({CONTEXT});"))
            .writeln(&format!("if (!{CONTEXT}.Output.IsContentModified)"))
            .open_block()
            .writeln(&format!("await {CONTEXT}.SetOutputContentAsync();"))
            .close_block()
            .writeln(&format!("Write({CONTEXT}.Output);"))
            .writeln(&format!("{CONTEXT} = __tagHelperScopeManager.End();"));

        if let Some(span) = doc.span(id) {
            self.w.construct(span, start);
        }
    }

    /// Assign a bound attribute to each of its helper properties.
    fn property(
        &mut self,
        id: NodeId,
        prop: &PropertyNode,
        binding: &BindingResult,
    ) {
        let doc = self.doc;

        let targets = prop
            .targets
            .iter()
            .map(|target| self.target_expr(target, binding))
            .collect::<Option<Vec<_>>>();

        let Some((first, rest)) =
            targets.as_deref().and_then(|t| t.split_first())
        else {
            self.error(EmitError::UnknownDescriptor {
                attribute: prop.attribute_name.clone(),
                span: doc.nearest_span(id),
            });
            return;
        };

        let parts = doc.children(id);

        match prop.value {
            None => {
                self.w.writeln(&format!("{first} = true;"));
            }

            Some(_) if prop.is_code => {
                self.w.write(&format!("{first} = "));

                if parts.is_empty() {
                    self.w.write("default");
                }

                for &part in parts {
                    match doc.node(part) {
                        IrNode::EmbeddedExpression(code) => {
                            self.with_pragma(doc.span(part), |e| e.code(code))
                        }
                        _ => self.unexpected(part),
                    }
                }

                self.w.writeln(";");
            }

            Some(_) => match doc.literal_text(id) {
                Some(text) => {
                    self.w.writeln(&format!(
                        "{first} = \"{}\";",
                        escape(&text)
                    ));
                }
                None => {
                    self.buffered_value(id);
                    self.w.writeln(&format!(
                        "{first} = __tagHelperStringValueBuffer;"
                    ));
                }
            },
        }

        for other in rest {
            self.w.writeln(&format!("{other} = {first};"));
        }

        self.w.writeln(&format!(
            "__tagHelperExecutionContext.AddTagHelperAttribute(\
             \"{}\", {first}, {HELPERS}.HtmlAttributeValueStyle.{});",
            escape(&prop.attribute_name),
            value_style(prop.value.is_some(), prop.quote),
        ));
    }

    /// Pass an unbound attribute of a bound element through as markup.
    fn html_attribute(&mut self, id: NodeId, attr: &HtmlAttribute) {
        let name = escape(&attr.name);
        let style = value_style(attr.value.is_some(), attr.quote);

        if attr.value.is_none() {
            self.w.writeln(&format!(
                "__tagHelperExecutionContext.AddHtmlAttribute(\
                 new {HELPERS}.TagHelperAttribute(\"{name}\"));"
            ));
            return;
        }

        let value = match self.doc.literal_text(id) {
            Some(text) => format!("\"{}\"", escape(&text)),
            None => {
                self.buffered_value(id);
                "__tagHelperStringValueBuffer".into()
            }
        };

        self.w.writeln(&format!(
            "__tagHelperExecutionContext.AddHtmlAttribute(\"{name}\", \
             Html.Raw({value}), {HELPERS}.HtmlAttributeValueStyle.{style});"
        ));
    }

    /// Render the value parts of `id` into `__tagHelperStringValueBuffer`.
    fn buffered_value(&mut self, id: NodeId) {
        self.w.writeln("BeginWriteTagHelperAttribute();");
        self.content(id);
        self.flush();
        self.w.writeln(
            "__tagHelperStringValueBuffer = EndWriteTagHelperAttribute();",
        );
    }

    /// Host-language expression assigned by `target`.
    fn target_expr(
        &self,
        target: &PropertyTarget,
        binding: &BindingResult,
    ) -> Option<String> {
        let bound = binding
            .descriptors
            .iter()
            .find(|bound| bound.id == target.descriptor)?;

        let field = helper_field(&bound.type_name);

        Some(match &target.indexer_key {
            None => format!("{field}.{}", target.property_name),
            Some(key) => format!(
                "{field}.{}[\"{}\"]",
                target.property_name,
                escape(key)
            ),
        })
    }

    /// Map directive tokens that are otherwise emitted only as synthetic
    ///   text,
    ///     so that tooling can resolve them in the host language.
    fn directive_token_helpers(&mut self) {
        let doc = self.doc;

        let tokens = doc
            .find_all(|node| {
                matches!(node, IrNode::Directive(dir) if dir.name != "using")
            })
            .into_iter()
            .filter_map(|id| match doc.node(id) {
                IrNode::Directive(dir) => Some(dir),
                _ => None,
            })
            .flat_map(|dir| dir.tokens.iter())
            .collect::<Vec<_>>();

        self.w
            .pragma("#pragma warning disable 219")
            .writeln("private void __RazorDirectiveTokenHelpers__()")
            .open_block();

        for tok in tokens {
            let (before, after) = match tok.kind() {
                TokenKind::Type => ("", " __typeHelper = default;"),
                TokenKind::Member => ("global::System.Object ", " = null;"),
                TokenKind::Namespace => {
                    ("global::System.Object __typeHelper = nameof(", ");")
                }
                TokenKind::String | TokenKind::Boolean => {
                    ("global::System.Object __typeHelper = ", ";")
                }
                TokenKind::Attribute => continue,
            };

            self.w.writeln("((global::System.Action)(() => {");
            self.with_pragma(Some(tok.span()), |e| {
                e.w.write(before)
                    .write_mapped(tok.content(), tok.span())
                    .writeln(after);
            });
            self.w.writeln("}").writeln("))();");
        }

        self.w
            .close_block()
            .pragma("#pragma warning restore 219");
    }

    /// Queue markup for a `WriteLiteral` call,
    ///   merging with queued markup that it continues.
    fn literal(&mut self, text: &str, span: Option<Span>) {
        if text.is_empty() {
            return;
        }

        let merged = match (self.pending.as_mut(), span) {
            (Some(p), Some(span)) => match p.span {
                Some(prev) if prev.end() == span.offset() => {
                    match prev.merge(span) {
                        Some(merged) => {
                            p.text.push_str(text);
                            p.span = Some(merged);
                            true
                        }
                        None => false,
                    }
                }
                _ => false,
            },
            (Some(p), None) if p.span.is_none() => {
                p.text.push_str(text);
                true
            }
            _ => false,
        };

        if !merged {
            self.flush();
            self.pending = Some(PendingLiteral {
                text: text.into(),
                span,
            });
        }
    }

    fn flush(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        self.w.write("WriteLiteral(\"");

        match pending.span {
            Some(span) if pending.text.len() == span.len() as usize => {
                self.verbatim_markup(&pending.text, span)
            }
            _ => {
                self.w.write(&escape(&pending.text));
            }
        }

        self.w.writeln("\");");
    }

    /// Write markup copied verbatim from `span`,
    ///   mapping each run of characters that need no escape.
    fn verbatim_markup(&mut self, text: &str, span: Span) {
        let mut start = 0;
        let mut pos = (span.line(), span.col());
        let mut run_pos = pos;

        for (i, c) in text.char_indices() {
            let next = match c {
                '\n' => (pos.0 + 1, 0),
                _ => (pos.0, pos.1 + c.len_utf8() as LineSize),
            };

            if needs_escape(c) {
                self.markup_run(&text[start..i], span, start, run_pos);
                self.w.write(&escape(&text[i..i + c.len_utf8()]));

                start = i + c.len_utf8();
                run_pos = next;
            }

            pos = next;
        }

        self.markup_run(&text[start..], span, start, run_pos);
    }

    /// Write `run`,
    ///   found at byte `start` of `span` and at `(line, col)`.
    fn markup_run(
        &mut self,
        run: &str,
        span: Span,
        start: usize,
        (line, col): (LineSize, LineSize),
    ) {
        if run.is_empty() {
            return;
        }

        let sub = Span::new(
            span.offset() + start as SourceFileSize,
            run.len() as SourceFileSize,
            line,
            col,
            span.context(),
        );

        self.w.write_mapped(run, sub);
    }

    /// Surround what `f` writes with line pragmas for `span`,
    ///   if enabled.
    fn with_pragma<F: FnOnce(&mut Self)>(&mut self, span: Option<Span>, f: F) {
        let span = span.filter(|_| self.options.emit_line_pragmas());

        let Some(span) = span else {
            return f(self);
        };

        self.w.pragma(&format!(
            "#line {} \"{}\"",
            span.line() + 1,
            escape(self.doc.path())
        ));
        f(self);
        self.w.pragma("#line default").pragma("#line hidden");
    }

    fn unexpected(&mut self, id: NodeId) {
        self.error(EmitError::UnexpectedNode {
            kind: self.doc.node(id).kind_name(),
            span: self.doc.nearest_span(id),
        });
    }

    fn error(&mut self, err: EmitError) {
        warn!(error = %err, "emitting partial output");
        self.diagnostics.report(&err);
    }
}

fn value_style(has_value: bool, quote: Option<char>) -> &'static str {
    match (has_value, quote) {
        (false, _) => "Minimized",
        (true, Some('\'')) => "SingleQuotes",
        (true, Some(_)) => "DoubleQuotes",
        (true, None) => "NoQuotes",
    }
}

/// Field holding the helper of type `type_name`.
fn helper_field(type_name: &str) -> String {
    let unqualified = type_name.strip_prefix("global::").unwrap_or(type_name);
    let sanitized = unqualified
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();

    format!("__{sanitized}")
}

fn qualified(type_name: &str) -> Cow<str> {
    if type_name.starts_with("global::") {
        Cow::Borrowed(type_name)
    } else {
        Cow::Owned(format!("global::{type_name}"))
    }
}

fn needs_escape(c: char) -> bool {
    matches!(c, '"' | '\\') || c.is_control()
}

/// Escape `text` for a host-language string literal.
///
/// Text needing no escape is borrowed.
fn escape(text: &str) -> Cow<str> {
    if !text.chars().any(needs_escape) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);

    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04x}", c as u32))
            }
            c => out.push(c),
        }
    }

    Cow::Owned(out)
}

/// The IR could not be emitted faithfully.
///
/// These represent bugs in the compiler,
///   never errors in the template;
///     the generated text is incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// A node's span cannot be resolved in the template.
    UnresolvableSpan { kind: &'static str, span: Span },

    /// A node appeared where it has no meaning.
    UnexpectedNode { kind: &'static str, span: Span },

    /// A bound attribute refers to a descriptor not bound to its element.
    UnknownDescriptor { attribute: String, span: Span },
}

impl Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use EmitError::*;

        match self {
            UnresolvableSpan { kind, .. } => {
                write!(f, "{kind} node refers to text outside of the template")
            }
            UnexpectedNode { kind, .. } => {
                write!(f, "unexpected {kind} node during emission")
            }
            UnknownDescriptor { attribute, .. } => write!(
                f,
                "attribute `{attribute}` is bound to an unknown descriptor"
            ),
        }
    }
}

impl Error for EmitError {}

impl Diagnostic for EmitError {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode(9003)
    }

    fn describe(&self) -> Vec<AnnotatedSpan> {
        use EmitError::*;

        match self {
            UnresolvableSpan { span, .. }
            | UnexpectedNode { span, .. }
            | UnknownDescriptor { span, .. } => vec![
                span.internal_error("generated output for this is incomplete"),
                span.help("this is a bug in the compiler"),
            ],
        }
    }
}

#[cfg(test)]
mod test;
