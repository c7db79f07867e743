//! JSON report renderer.

use crate::protocol::ReportWriter;
use serde_json::{Map, Value, json};
use std::io::{self, Write};

/// Renders a report as a JSON document.
///
/// The document is a tree of nodes, each one having a `type` (`title`, `text`, `section`, `code` or `table`).
/// Sections have a `heading` and a `content` array, tables a `caption`, `columns` and `rows`.
/// Nothing is written before [`close`](ReportWriter::close).
pub struct JsonWriter<W: Write> {
    write: W,
    stack: Vec<Map<String, Value>>,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(write: W) -> Self {
        Self {
            write,
            stack: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.write
    }

    fn push(&mut self, node: Value) {
        if let Value::Object(node) = node {
            self.stack.push(node);
        }
    }

    fn pop(&mut self) -> io::Result<Map<String, Value>> {
        self.stack
            .pop()
            .ok_or_else(|| io::Error::other("no open JSON node"))
    }

    fn top(&mut self) -> io::Result<&mut Map<String, Value>> {
        self.stack
            .last_mut()
            .ok_or_else(|| io::Error::other("no open JSON node"))
    }

    fn field(&mut self, name: &str) -> io::Result<&mut Vec<Value>> {
        self.top()?
            .get_mut(name)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| io::Error::other(format!("the current JSON node has no {name}")))
    }

    fn append(&mut self, node: Value) -> io::Result<()> {
        self.field("content")?.push(node);
        Ok(())
    }

    fn pop_into_parent(&mut self) -> io::Result<()> {
        let node = self.pop()?;
        self.append(Value::Object(node))
    }
}

impl<W: Write> ReportWriter for JsonWriter<W> {
    fn open(&mut self) -> io::Result<()> {
        self.push(json!({ "content": [] }));
        Ok(())
    }

    fn title(&mut self, title: &str) -> io::Result<()> {
        self.append(json!({ "type": "title", "text": title }))
    }

    fn text(&mut self, text: &str) -> io::Result<()> {
        self.append(json!({ "type": "text", "text": text }))
    }

    fn start_section(&mut self, heading: &str) -> io::Result<()> {
        self.push(json!({ "type": "section", "heading": heading, "content": [] }));
        Ok(())
    }

    fn end_section(&mut self) -> io::Result<()> {
        self.pop_into_parent()
    }

    fn code(&mut self, code: &str) -> io::Result<()> {
        self.append(json!({ "type": "code", "code": code }))
    }

    fn start_table(&mut self, caption: &str) -> io::Result<()> {
        self.push(json!({ "type": "table", "caption": caption, "columns": [], "rows": [] }));
        Ok(())
    }

    fn column_header(&mut self, names: &[String]) -> io::Result<()> {
        *self.field("columns")? = names.iter().map(|name| json!(name)).collect();
        Ok(())
    }

    fn row(&mut self, values: &[String]) -> io::Result<()> {
        self.field("rows")?.push(json!(values));
        Ok(())
    }

    fn end_table(&mut self) -> io::Result<()> {
        self.pop_into_parent()
    }

    fn close(&mut self) -> io::Result<()> {
        let root = self.pop()?;
        serde_json::to_writer_pretty(&mut self.write, &root)?;
        writeln!(self.write)?;
        self.write.flush()
    }
}
