// Generated text writer
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

//! Indentation-aware text buffer that records verbatim copies.
//!
//! Synthetic text is indented at the start of each line.
//! Mapped text is written exactly as given,
//!   since indenting within it would break length preservation;
//!     only its first line is indented,
//!     and only if it begins a line.

use crate::{
    span::Span,
    srcmap::{Construct, GeneratedSpan, MapEntry},
};

#[derive(Debug)]
pub struct CodeWriter {
    buf: String,
    width: usize,
    depth: usize,

    /// 0-indexed line of the end of `buf`.
    line: usize,

    /// Offset of the start of `line`.
    line_start: usize,

    entries: Vec<MapEntry>,
    constructs: Vec<Construct>,
}

impl CodeWriter {
    /// New writer indenting by `width` spaces per level.
    pub fn new(width: usize) -> Self {
        Self {
            buf: String::new(),
            width,
            depth: 0,
            line: 0,
            line_start: 0,
            entries: vec![],
            constructs: vec![],
        }
    }

    pub fn offset(&self) -> usize {
        self.buf.len()
    }

    fn at_line_start(&self) -> bool {
        self.buf.len() == self.line_start
    }

    fn pad(&mut self) {
        if self.at_line_start() {
            let n = self.width * self.depth;
            self.buf.extend(std::iter::repeat(' ').take(n));
        }
    }

    /// Append raw text,
    ///   tracking line starts.
    fn push(&mut self, text: &str) {
        let base = self.buf.len();
        self.buf.push_str(text);

        for nl in memchr::memchr_iter(b'\n', text.as_bytes()) {
            self.line += 1;
            self.line_start = base + nl + 1;
        }
    }

    /// Write synthetic text.
    pub fn write(&mut self, text: &str) -> &mut Self {
        let mut lines = text.split('\n').peekable();

        while let Some(line) = lines.next() {
            if !line.is_empty() {
                self.pad();
                self.push(line);
            }

            if lines.peek().is_some() {
                self.push("\n");
            }
        }

        self
    }

    /// Write synthetic text followed by a newline.
    pub fn writeln(&mut self, text: &str) -> &mut Self {
        self.write(text).newline()
    }

    /// Write text copied verbatim from `span`.
    ///
    /// If `text` does not have the length of `span`,
    ///   it cannot have been copied verbatim and is written as synthetic
    ///   text.
    pub fn write_mapped(&mut self, text: &str, span: Span) -> &mut Self {
        if text.len() != span.len() as usize {
            return self.write(text);
        }

        self.pad();

        let generated = GeneratedSpan::new(
            self.buf.len(),
            text.len(),
            self.line,
            self.buf.len() - self.line_start,
        );

        if !text.is_empty() {
            self.entries.push(MapEntry {
                original: span,
                generated,
            });
        }

        self.push(text);
        self
    }

    pub fn newline(&mut self) -> &mut Self {
        self.push("\n");
        self
    }

    /// Begin a new line unless already at the start of one.
    pub fn ensure_line(&mut self) -> &mut Self {
        if !self.at_line_start() {
            self.newline();
        }

        self
    }

    /// Write a preprocessor line,
    ///   which is never indented.
    pub fn pragma(&mut self, text: &str) -> &mut Self {
        self.ensure_line();
        self.push(text);
        self.newline()
    }

    pub fn indent(&mut self) -> &mut Self {
        self.depth += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }

    /// Open a brace-delimited block on its own line.
    pub fn open_block(&mut self) -> &mut Self {
        self.ensure_line().writeln("{").indent()
    }

    /// Close a block opened by [`CodeWriter::open_block`].
    pub fn close_block(&mut self) -> &mut Self {
        self.ensure_line().dedent().writeln("}")
    }

    /// Record that everything written from `start` to the current offset
    ///   was generated for the construct at `original`.
    pub fn construct(&mut self, original: Span, start: usize) {
        self.constructs.push(Construct {
            original,
            generated: start..self.buf.len(),
        });
    }

    pub fn finish(self) -> (String, Vec<MapEntry>, Vec<Construct>) {
        (self.buf, self.entries, self.constructs)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::span::Context;

    #[test]
    fn indents_synthetic_lines_only() {
        let ctx = Context::new(1);
        let mut sut = CodeWriter::new(2);

        sut.writeln("class C").open_block();
        sut.write("int x = ")
            .write_mapped("a\n+ b", ctx.span(5, 5))
            .writeln(";");
        sut.pragma("#line hidden");
        sut.writeln("a\nb").close_block();

        let (text, entries, _) = sut.finish();

        assert_eq!(
            "class C\n{\n  int x = a\n+ b;\n#line hidden\n  a\n  b\n}\n",
            text
        );

        assert_eq!(1, entries.len());
        assert_eq!(GeneratedSpan::new(20, 5, 2, 10), entries[0].generated);
        assert_eq!(Some("a\n+ b"), text.get(entries[0].generated.range()));
    }

    #[test]
    fn mismatched_length_is_not_mapped() {
        let mut sut = CodeWriter::new(4);
        sut.write_mapped("abc", Context::new(1).span(0, 2));

        let (text, entries, _) = sut.finish();
        assert_eq!("abc", text);
        assert!(entries.is_empty());
    }

    #[test]
    fn constructs_cover_written_text() {
        let ctx = Context::new(1);
        let mut sut = CodeWriter::new(4);

        sut.write("before ");
        let start = sut.offset();
        sut.write("inside");
        sut.construct(ctx.span(3, 4), start);

        let (_, _, constructs) = sut.finish();
        assert_eq!(
            vec![Construct {
                original: ctx.span(3, 4),
                generated: 7..13
            }],
            constructs
        );
    }
}
