// Global configuration
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

//! System-wide static configuration.
//!
//! This module provides a system-wide configuration.
//! Subsystems should reference these values rather than defining their own
//!   and risk incompatibilities or maintenance issues as requirements
//!   change.
//!
//! By convention,
//!   import this entire module rather than individual members and reference
//!   them as `global::foo` to emphasize their nature and risk.

/// A size capable of representing any byte offset within a single
///   template source file.
///
/// Template documents are edited interactively by humans;
///   4GiB is well beyond anything we expect to see.
pub type SourceFileSize = u32;

/// A size capable of representing the byte length of any single
///   syntax node.
///
/// Unlike a token stream,
///   syntax nodes may span an entire document
///     (e.g. the root element of a page),
///   so this must be able to represent [`SourceFileSize`].
pub type TokenLength = SourceFileSize;

/// A size capable of representing a 0-indexed line or column number.
pub type LineSize = u32;

/// Size of the [`Context`](crate::span::Context) identifier.
///
/// A compilation session is not expected to hold more than this many
///   distinct source files at once.
pub type ContextSize = u16;

/// Maximum number of tokens accepted by any single directive grammar.
///
/// Directive token lists are stack-allocated;
///   a grammar declaring more tokens than this will be rejected when the
///   registry is built.
pub const MAX_DIRECTIVE_TOKENS: usize = 8;

/// Maximum depth of element nesting that will be inspected when walking
///   ancestors to determine closing behavior.
///
/// Walks exceeding this depth are treated as having reached a non-tag
///   boundary.
pub const MAX_ANCESTOR_WALK: usize = 256;
