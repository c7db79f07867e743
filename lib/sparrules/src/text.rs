//! Plain text report renderer, using Markdown conventions.

use crate::protocol::ReportWriter;
use std::borrow::Cow;
use std::io::{self, Write};

/// Renders a report as Markdown-flavoured text.
pub struct TextWriter<W: Write> {
    write: W,
    depth: usize,
}

impl<W: Write> TextWriter<W> {
    pub fn new(write: W) -> Self {
        Self { write, depth: 0 }
    }

    pub fn into_inner(self) -> W {
        self.write
    }

    fn cells(&mut self, values: &[String]) -> io::Result<()> {
        self.write.write_all(b"|")?;
        for value in values {
            let value = escape(value).replace('|', "\\|").replace(['\r', '\n'], " ");
            write!(self.write, " {value} |")?;
        }
        self.write.write_all(b"\n")
    }
}

impl<W: Write> ReportWriter for TextWriter<W> {
    fn open(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn title(&mut self, title: &str) -> io::Result<()> {
        write!(self.write, "# {}\n\n", escape_line(title))
    }

    fn text(&mut self, text: &str) -> io::Result<()> {
        write!(self.write, "{}\n\n", escape(text))
    }

    fn start_section(&mut self, heading: &str) -> io::Result<()> {
        self.depth += 1;
        let marker = "#".repeat((self.depth + 1).min(6));
        write!(self.write, "{marker} {}\n\n", escape_line(heading))
    }

    fn end_section(&mut self) -> io::Result<()> {
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    fn code(&mut self, code: &str) -> io::Result<()> {
        let newline = if code.ends_with('\n') { "" } else { "\n" };
        let fence = "`".repeat(longest_backtick_run(code).max(2) + 1);
        write!(self.write, "{fence}\n{code}{newline}{fence}\n\n")
    }

    fn start_table(&mut self, caption: &str) -> io::Result<()> {
        if caption.is_empty() {
            Ok(())
        } else {
            write!(self.write, "**{}**\n\n", escape_line(caption))
        }
    }

    fn column_header(&mut self, names: &[String]) -> io::Result<()> {
        self.cells(names)?;
        writeln!(self.write, "|{}", " --- |".repeat(names.len()))
    }

    fn row(&mut self, values: &[String]) -> io::Result<()> {
        self.cells(values)
    }

    fn end_table(&mut self) -> io::Result<()> {
        writeln!(self.write)
    }

    fn close(&mut self) -> io::Result<()> {
        self.write.flush()
    }
}

/// Escapes the characters with an inline Markdown meaning, and `#` starting a line.
fn escape(text: &str) -> Cow<'_, str> {
    let is_special = |c: char| matches!(c, '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>');
    if !text.contains(is_special) && !text.lines().any(|line| line.starts_with('#')) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    let mut line_start = true;
    for c in text.chars() {
        if is_special(c) || (line_start && c == '#') {
            escaped.push('\\');
        }
        escaped.push(c);
        line_start = c == '\n';
    }
    Cow::Owned(escaped)
}

/// Escapes a text that must fit on a single line.
fn escape_line(text: &str) -> String {
    escape(text).replace(['\r', '\n'], " ")
}

fn longest_backtick_run(code: &str) -> usize {
    code.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ReportDocument;

    #[test]
    fn markdown_layout() {
        let mut document = ReportDocument::new(TextWriter::new(Vec::new()));
        document.open().unwrap();
        document.title("RDF Validation").unwrap();
        document.start_section("builtin://x").unwrap();
        document.start_section("Rule a").unwrap();
        document.code("SELECT ?s\nWHERE {}").unwrap();
        document.start_table("").unwrap();
        document
            .column_header(&["s".into(), "label".into()])
            .unwrap();
        document
            .row(&["http://example.com/s".into(), "a|b\nc".into()])
            .unwrap();
        document.end_table().unwrap();
        document.end_section().unwrap();
        document.end_section().unwrap();
        document.text("Number of violations: 1").unwrap();
        document.close().unwrap();
        let text = String::from_utf8(document.into_inner().into_inner()).unwrap();
        assert_eq!(
            text,
            "# RDF Validation\n\n\
             ## builtin://x\n\n\
             ### Rule a\n\n\
             ```\nSELECT ?s\nWHERE {}\n```\n\n\
             | s | label |\n| --- | --- |\n\
             | http://example.com/s | a\\|b c |\n\n\
             Number of violations: 1\n\n"
        );
    }

    #[test]
    fn markup_is_escaped() {
        let mut document = ReportDocument::new(TextWriter::new(Vec::new()));
        document.open().unwrap();
        document.title("*Report*").unwrap();
        document.start_section("Rule dct_title\n# injected").unwrap();
        document.code("# ```\nSELECT ?s WHERE {}\n```").unwrap();
        document.start_table("[caption]").unwrap();
        document.column_header(&["s".into()]).unwrap();
        document.row(&["<b>`x`</b>".into()]).unwrap();
        document.end_table().unwrap();
        document.end_section().unwrap();
        document.text("#1 of a_b").unwrap();
        document.close().unwrap();
        let text = String::from_utf8(document.into_inner().into_inner()).unwrap();
        assert_eq!(
            text,
            "# \\*Report\\*\n\n\
             ## Rule dct\\_title \\# injected\n\n\
             ````\n# ```\nSELECT ?s WHERE {}\n```\n````\n\n\
             **\\[caption\\]**\n\n\
             | s |\n| --- |\n\
             | \\<b\\>\\`x\\`\\</b\\> |\n\n\
             \\#1 of a\\_b\n\n"
        );
    }
}
