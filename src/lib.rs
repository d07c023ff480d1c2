// Weft template compiler
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

//! Compiler from markup templates with embedded code into host-language
//!   source text.
//!
//! Weft does not parse templates itself;
//!   it accepts a [`SyntaxTree`](syntax::SyntaxTree) with exact spans
//!   from an external parser and produces a
//!   [`CompiledDocument`](compile::CompiledDocument):
//!     generated text,
//!     diagnostics,
//!     and a [`SourceMap`](srcmap::SourceMap) correlating the two.
//!
//! The stages of compilation are,
//!   in order:
//!
//!   - [`lower`],
//!       producing an [`IrDocument`](ir::IrDocument);
//!   - [`pass`],
//!       transforming the IR in place,
//!       including element [binding](bind);
//!       and
//!   - [`emit`],
//!       producing text.
//!
//! Start with [`compile::Compiler`].

// We build docs for private items.
#![allow(rustdoc::private_intra_doc_links)]

pub mod global;

#[macro_use]
extern crate static_assertions;

#[macro_use]
pub mod diagnose;

pub mod bind;
pub mod compile;
pub mod config;
pub mod directive;
pub mod emit;
pub mod fmt;
pub mod ir;
pub mod lower;
pub mod pass;
pub mod source;
pub mod span;
pub mod srcmap;
pub mod syntax;
