// Compiler configuration
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

//! Options affecting the shape of generated output.
//!
//! Options are fixed for the lifetime of a
//!   [`Compiler`](crate::compile::Compiler) and shared by every
//!   compilation it performs.

use crate::pass::WrapperRule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    root_namespace: Option<String>,
    emit_line_pragmas: bool,
    emit_checksum: bool,
    design_time: bool,
    indent: usize,
    wrapper_rules: Vec<WrapperRule>,
    require_descriptor_import: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            root_namespace: None,
            emit_line_pragmas: false,
            emit_checksum: true,
            design_time: false,
            indent: 4,
            wrapper_rules: vec![WrapperRule::model_expression()],
            require_descriptor_import: false,
        }
    }
}

impl CompilerOptions {
    pub fn builder() -> CompilerOptionsBuilder {
        CompilerOptionsBuilder::default()
    }

    /// Namespace prefixed to the directory of a template to form the
    ///   namespace of its generated class,
    ///     unless overridden by a `namespace` directive.
    pub fn root_namespace(&self) -> Option<&str> {
        self.root_namespace.as_deref()
    }

    /// Whether `#line` pragmas are emitted around mapped code.
    pub fn emit_line_pragmas(&self) -> bool {
        self.emit_line_pragmas
    }

    /// Whether a checksum pragma identifying the source is emitted.
    pub fn emit_checksum(&self) -> bool {
        self.emit_checksum
    }

    /// Whether output is intended for editor tooling rather than a build.
    ///
    /// Design-time output additionally maps directive type tokens.
    pub fn design_time(&self) -> bool {
        self.design_time
    }

    /// Spaces per level of indentation in generated output.
    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn wrapper_rules(&self) -> &[WrapperRule] {
        &self.wrapper_rules
    }

    /// Whether only descriptors admitted by `addTagHelper` directives may
    ///   bind.
    pub fn require_descriptor_import(&self) -> bool {
        self.require_descriptor_import
    }
}

/// Builder for [`CompilerOptions`].
#[derive(Debug, Clone, Default)]
pub struct CompilerOptionsBuilder {
    opts: CompilerOptions,
}

impl CompilerOptionsBuilder {
    pub fn root_namespace<S: Into<String>>(mut self, ns: S) -> Self {
        self.opts.root_namespace = Some(ns.into()).filter(|ns| !ns.is_empty());
        self
    }

    pub fn emit_line_pragmas(mut self, emit: bool) -> Self {
        self.opts.emit_line_pragmas = emit;
        self
    }

    pub fn emit_checksum(mut self, emit: bool) -> Self {
        self.opts.emit_checksum = emit;
        self
    }

    pub fn design_time(mut self, design_time: bool) -> Self {
        self.opts.design_time = design_time;
        self
    }

    pub fn indent(mut self, width: usize) -> Self {
        self.opts.indent = width;
        self
    }

    /// Replace the default wrapper rules.
    pub fn wrapper_rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = WrapperRule>,
    {
        self.opts.wrapper_rules = rules.into_iter().collect();
        self
    }

    pub fn wrapper_rule(mut self, rule: WrapperRule) -> Self {
        self.opts.wrapper_rules.push(rule);
        self
    }

    pub fn require_descriptor_import(mut self, require: bool) -> Self {
        self.opts.require_descriptor_import = require;
        self
    }

    pub fn build(self) -> CompilerOptions {
        self.opts
    }
}
