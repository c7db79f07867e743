//! HTML report renderer.

use crate::protocol::ReportWriter;
use std::borrow::Cow;
use std::io::{self, Write};

const STYLESHEET: &str = include_str!("../templates/report.css");

/// Renders a report as a standalone HTML5 document.
///
/// Sections are collapsible `<details>` elements whose heading level follows the nesting depth.
/// All the text is escaped.
///
/// ```
/// use sparrules::{HtmlWriter, ReportDocument};
///
/// let mut document = ReportDocument::new(HtmlWriter::new(Vec::new()));
/// document.open()?;
/// document.title("Report")?;
/// document.text("a < b")?;
/// document.close()?;
/// let html = String::from_utf8(document.into_inner().into_inner())?;
/// assert!(html.contains("<h1>Report</h1>"));
/// assert!(html.contains("<p>a &lt; b</p>"));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct HtmlWriter<W: Write> {
    write: W,
    depth: usize,
}

impl<W: Write> HtmlWriter<W> {
    pub fn new(write: W) -> Self {
        Self { write, depth: 0 }
    }

    pub fn into_inner(self) -> W {
        self.write
    }

    fn heading_level(&self) -> usize {
        (self.depth + 1).min(6)
    }

    fn cells(&mut self, values: &[String], tag: &str) -> io::Result<()> {
        self.write.write_all(b"<tr>")?;
        for value in values {
            write!(self.write, "<{tag}>{}</{tag}>", escape(value))?;
        }
        self.write.write_all(b"</tr>\n")
    }
}

impl<W: Write> ReportWriter for HtmlWriter<W> {
    fn open(&mut self) -> io::Result<()> {
        writeln!(
            self.write,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>\n{STYLESHEET}</style>\n<title>RDF Validation Report</title>\n</head>\n<body>"
        )
    }

    fn title(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.write, "<h1>{}</h1>", escape(title))
    }

    fn text(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.write, "<p>{}</p>", escape(text))
    }

    fn start_section(&mut self, heading: &str) -> io::Result<()> {
        self.depth += 1;
        let level = self.heading_level();
        writeln!(
            self.write,
            "<details open>\n<summary><h{level}>{}</h{level}></summary>",
            escape(heading)
        )
    }

    fn end_section(&mut self) -> io::Result<()> {
        self.depth = self.depth.saturating_sub(1);
        writeln!(self.write, "</details>")
    }

    fn code(&mut self, code: &str) -> io::Result<()> {
        writeln!(self.write, "<pre><code>{}</code></pre>", escape(code))
    }

    fn start_table(&mut self, caption: &str) -> io::Result<()> {
        writeln!(self.write, "<table>")?;
        if !caption.is_empty() {
            writeln!(self.write, "<caption>{}</caption>", escape(caption))?;
        }
        Ok(())
    }

    fn column_header(&mut self, names: &[String]) -> io::Result<()> {
        writeln!(self.write, "<thead>")?;
        self.cells(names, "th")?;
        writeln!(self.write, "</thead>")
    }

    fn row(&mut self, values: &[String]) -> io::Result<()> {
        self.cells(values, "td")
    }

    fn end_table(&mut self) -> io::Result<()> {
        writeln!(self.write, "</table>")
    }

    fn close(&mut self) -> io::Result<()> {
        writeln!(self.write, "</body>\n</html>")?;
        self.write.flush()
    }
}

fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
