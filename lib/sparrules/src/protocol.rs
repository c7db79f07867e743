//! The report writing protocol.
//!
//! [`ReportWriter`] is implemented by renderers (HTML, text, JSON...).
//! The pipeline never calls a renderer directly: it goes through [`ReportDocument`], which checks
//! that the calls form a well-formed document and rejects any out of order call with a
//! [`ProtocolViolation`] before it reaches the renderer.
//!
//! A document is built as follows:
//! ```text
//! open (title | text | section | table)* close
//! section := start_section (title | text | code | section | table)* end_section
//! table := start_table column_header? row* end_table
//! ```

use crate::error::{ProtocolViolation, ReportError};
use std::io;

/// A renderer of validation reports.
///
/// Implementations may assume that the calls follow the protocol described in the module
/// documentation: they are driven through a [`ReportDocument`].
pub trait ReportWriter {
    /// Starts the document.
    fn open(&mut self) -> io::Result<()>;

    fn title(&mut self, title: &str) -> io::Result<()>;

    /// A paragraph of plain text.
    fn text(&mut self, text: &str) -> io::Result<()>;

    fn start_section(&mut self, heading: &str) -> io::Result<()>;

    fn end_section(&mut self) -> io::Result<()>;

    /// A verbatim block, e.g. a query. The renderer is responsible for any escaping.
    fn code(&mut self, code: &str) -> io::Result<()>;

    /// Starts a table with an optional caption (empty for none).
    fn start_table(&mut self, caption: &str) -> io::Result<()>;

    fn column_header(&mut self, names: &[String]) -> io::Result<()>;

    fn row(&mut self, values: &[String]) -> io::Result<()>;

    fn end_table(&mut self) -> io::Result<()>;

    /// Ends the document and flushes the output.
    fn close(&mut self) -> io::Result<()>;
}

impl<W: ReportWriter + ?Sized> ReportWriter for &mut W {
    fn open(&mut self) -> io::Result<()> {
        (**self).open()
    }

    fn title(&mut self, title: &str) -> io::Result<()> {
        (**self).title(title)
    }

    fn text(&mut self, text: &str) -> io::Result<()> {
        (**self).text(text)
    }

    fn start_section(&mut self, heading: &str) -> io::Result<()> {
        (**self).start_section(heading)
    }

    fn end_section(&mut self) -> io::Result<()> {
        (**self).end_section()
    }

    fn code(&mut self, code: &str) -> io::Result<()> {
        (**self).code(code)
    }

    fn start_table(&mut self, caption: &str) -> io::Result<()> {
        (**self).start_table(caption)
    }

    fn column_header(&mut self, names: &[String]) -> io::Result<()> {
        (**self).column_header(names)
    }

    fn row(&mut self, values: &[String]) -> io::Result<()> {
        (**self).row(values)
    }

    fn end_table(&mut self) -> io::Result<()> {
        (**self).end_table()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<W: ReportWriter + ?Sized> ReportWriter for Box<W> {
    fn open(&mut self) -> io::Result<()> {
        (**self).open()
    }

    fn title(&mut self, title: &str) -> io::Result<()> {
        (**self).title(title)
    }

    fn text(&mut self, text: &str) -> io::Result<()> {
        (**self).text(text)
    }

    fn start_section(&mut self, heading: &str) -> io::Result<()> {
        (**self).start_section(heading)
    }

    fn end_section(&mut self) -> io::Result<()> {
        (**self).end_section()
    }

    fn code(&mut self, code: &str) -> io::Result<()> {
        (**self).code(code)
    }

    fn start_table(&mut self, caption: &str) -> io::Result<()> {
        (**self).start_table(caption)
    }

    fn column_header(&mut self, names: &[String]) -> io::Result<()> {
        (**self).column_header(names)
    }

    fn row(&mut self, values: &[String]) -> io::Result<()> {
        (**self).row(values)
    }

    fn end_table(&mut self) -> io::Result<()> {
        (**self).end_table()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unopened,
    Opened,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Section,
    Table {
        columns: Option<usize>,
        has_header: bool,
    },
}

/// A [`ReportWriter`] wrapper enforcing the call order of the protocol.
#[must_use]
pub struct ReportDocument<W: ReportWriter> {
    writer: W,
    state: State,
    open_elements: Vec<Element>,
}

impl<W: ReportWriter> ReportDocument<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            state: State::Unopened,
            open_elements: Vec::new(),
        }
    }

    pub fn open(&mut self) -> Result<(), ReportError> {
        match self.state {
            State::Unopened => {
                self.writer.open()?;
                self.state = State::Opened;
                Ok(())
            }
            State::Opened => Err(violation("open", "twice").into()),
            State::Closed => Err(violation("open", "after the document is closed").into()),
        }
    }

    pub fn title(&mut self, title: &str) -> Result<(), ReportError> {
        self.ensure_opened("title")?;
        Ok(self.writer.title(title)?)
    }

    pub fn text(&mut self, text: &str) -> Result<(), ReportError> {
        self.ensure_opened("text")?;
        Ok(self.writer.text(text)?)
    }

    pub fn start_section(&mut self, heading: &str) -> Result<(), ReportError> {
        self.ensure_opened("start_section")?;
        self.ensure_not_in_table("start_section")?;
        self.writer.start_section(heading)?;
        self.open_elements.push(Element::Section);
        Ok(())
    }

    pub fn end_section(&mut self) -> Result<(), ReportError> {
        self.ensure_opened("end_section")?;
        match self.open_elements.last() {
            Some(Element::Section) => {
                self.writer.end_section()?;
                self.open_elements.pop();
                Ok(())
            }
            Some(Element::Table { .. }) => {
                Err(violation("end_section", "while a table is open").into())
            }
            None => Err(violation("end_section", "without an open section").into()),
        }
    }

    pub fn code(&mut self, code: &str) -> Result<(), ReportError> {
        self.ensure_opened("code")?;
        if self.open_elements.last() != Some(&Element::Section) {
            return Err(violation("code", "outside of a section").into());
        }
        Ok(self.writer.code(code)?)
    }

    pub fn start_table(&mut self, caption: &str) -> Result<(), ReportError> {
        self.ensure_opened("start_table")?;
        self.ensure_not_in_table("start_table")?;
        self.writer.start_table(caption)?;
        self.open_elements.push(Element::Table {
            columns: None,
            has_header: false,
        });
        Ok(())
    }

    pub fn column_header(&mut self, names: &[String]) -> Result<(), ReportError> {
        self.ensure_opened("column_header")?;
        let Some(Element::Table {
            columns,
            has_header,
        }) = self.open_elements.last_mut()
        else {
            return Err(violation("column_header", "without an open table").into());
        };
        if *has_header {
            return Err(violation("column_header", "more than once per table").into());
        }
        if columns.is_some() {
            return Err(violation("column_header", "after rows were written").into());
        }
        if names
            .iter()
            .enumerate()
            .any(|(i, name)| names[..i].contains(name))
        {
            return Err(violation("column_header", "with duplicate column names").into());
        }
        self.writer.column_header(names)?;
        *columns = Some(names.len());
        *has_header = true;
        Ok(())
    }

    pub fn row(&mut self, values: &[String]) -> Result<(), ReportError> {
        self.ensure_opened("row")?;
        let Some(Element::Table { columns, .. }) = self.open_elements.last_mut() else {
            return Err(violation("row", "without an open table").into());
        };
        if let Some(expected) = *columns {
            if values.len() != expected {
                return Err(violation(
                    "row",
                    format!(
                        "with {} values in a table of {expected} columns",
                        values.len()
                    ),
                )
                .into());
            }
        }
        self.writer.row(values)?;
        *columns = Some(values.len());
        Ok(())
    }

    pub fn end_table(&mut self) -> Result<(), ReportError> {
        self.ensure_opened("end_table")?;
        if !matches!(self.open_elements.last(), Some(Element::Table { .. })) {
            return Err(violation("end_table", "without an open table").into());
        }
        self.writer.end_table()?;
        self.open_elements.pop();
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), ReportError> {
        self.ensure_opened("close")?;
        if !self.open_elements.is_empty() {
            return Err(violation(
                "close",
                format!("with {} unclosed sections or tables", self.open_elements.len()),
            )
            .into());
        }
        self.writer.close()?;
        self.state = State::Closed;
        Ok(())
    }

    /// Number of currently open sections.
    pub fn depth(&self) -> usize {
        self.open_elements
            .iter()
            .filter(|element| **element == Element::Section)
            .count()
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ensure_opened(&self, operation: &'static str) -> Result<(), ProtocolViolation> {
        match self.state {
            State::Opened => Ok(()),
            State::Unopened => Err(violation(operation, "before the document is opened")),
            State::Closed => Err(violation(operation, "after the document is closed")),
        }
    }

    fn ensure_not_in_table(&self, operation: &'static str) -> Result<(), ProtocolViolation> {
        if matches!(self.open_elements.last(), Some(Element::Table { .. })) {
            Err(violation(operation, "inside a table"))
        } else {
            Ok(())
        }
    }
}

fn violation(operation: &'static str, reason: impl Into<String>) -> ProtocolViolation {
    ProtocolViolation::new(operation, reason)
}
