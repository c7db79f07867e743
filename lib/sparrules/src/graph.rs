//! Access to the graph to validate.
//!
//! The pipeline only talks to the graph through [`GraphLoader`] and [`QueryableGraph`].
//! [`OxigraphLoader`] implements them on top of an in-memory [`Store`].

use crate::error::{InputError, QueryError};
use flate2::read::MultiGzDecoder;
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::Term;
use oxigraph::sparql::{QueryResults, SparqlEvaluator};
use oxigraph::store::{LoaderError, Store};
use std::ffi::OsStr;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Loads an input into a queryable graph.
pub trait GraphLoader {
    type Graph: QueryableGraph;

    fn load(&self, source: &InputSource) -> Result<Self::Graph, InputError>;
}

/// A loaded, read-only graph.
pub trait QueryableGraph {
    /// Number of statements in the graph.
    fn statement_count(&self) -> Result<usize, InputError>;

    /// Evaluates a SPARQL SELECT query.
    fn evaluate(&self, query: &str) -> Result<Solutions, QueryError>;
}

/// The rows returned by a query, every value rendered as a string.
///
/// Column names are unique and every row has exactly one value per column, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solutions {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Solutions {
    /// Creates empty solutions, failing if a column name is repeated.
    pub fn new(columns: Vec<String>) -> Result<Self, QueryError> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(QueryError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Builds solutions from rows, checking the columns and that every row matches them.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, QueryError> {
        let mut solutions = Self::new(columns)?;
        for row in rows {
            solutions.push_row(row)?;
        }
        Ok(solutions)
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), QueryError> {
        if row.len() != self.columns.len() {
            return Err(QueryError::RowArity {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The value of `column` in the row at `index`.
    pub fn get(&self, index: usize, column: &str) -> Option<&str> {
        let position = self.columns.iter().position(|c| c == column)?;
        Some(self.rows.get(index)?[position].as_str())
    }
}

/// Description of the input to validate.
#[derive(Debug, Clone)]
pub struct InputSource {
    path: PathBuf,
    format: Option<String>,
    base_iri: Option<String>,
    lenient: bool,
}

impl InputSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
            base_iri: None,
            lenient: false,
        }
    }

    /// Forces the format, given as an extension like `ttl` or a media type like `text/turtle`.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }

    /// Skips invalid statements instead of failing.
    #[must_use]
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_iri(&self) -> Option<&str> {
        self.base_iri.as_deref()
    }

    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    /// The identifier shown in logs and reports.
    pub fn identifier(&self) -> String {
        self.path.display().to_string()
    }

    /// Reads the full content, decompressing it if the file name ends with `.gz`.
    pub fn read(&self) -> Result<Vec<u8>, InputError> {
        let read_error = |source| InputError::Read {
            path: self.path.clone(),
            source,
        };
        let raw = fs::read(&self.path).map_err(read_error)?;
        if !self.is_gzipped() {
            return Ok(raw);
        }
        let mut content = Vec::new();
        MultiGzDecoder::new(raw.as_slice())
            .read_to_end(&mut content)
            .map_err(read_error)?;
        Ok(content)
    }

    /// Detects the RDF format from the explicit format, the file name or the content, in that order.
    pub fn detect_format(&self, content: &[u8]) -> Result<RdfFormat, InputError> {
        if let Some(name) = &self.format {
            return RdfFormat::from_extension(name)
                .or_else(|| RdfFormat::from_media_type(name))
                .ok_or_else(|| {
                    InputError::unknown_format(
                        self.identifier(),
                        format!("the format '{name}' is unknown"),
                    )
                });
        }
        let path = if self.is_gzipped() {
            self.path.with_extension("")
        } else {
            self.path.clone()
        };
        if let Some(ext) = path.extension().and_then(OsStr::to_str) {
            if let Some(format) = RdfFormat::from_extension(ext) {
                return Ok(format);
            }
            debug!("Unknown file extension '{ext}', looking at the content");
        }
        sniff_format(content).ok_or_else(|| {
            InputError::unknown_format(
                self.identifier(),
                "neither the file name nor the content match a known format",
            )
        })
    }

    fn is_gzipped(&self) -> bool {
        self.path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
    }
}

/// Guesses the format from the first significant characters.
fn sniff_format(content: &[u8]) -> Option<RdfFormat> {
    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
    let start = content.iter().position(|b| !b.is_ascii_whitespace())?;
    let content = &content[start..];
    let starts_with_ignore_case = |prefix: &[u8]| {
        content
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    if content.starts_with(b"<?xml") || content.starts_with(b"<rdf:RDF") {
        Some(RdfFormat::RdfXml)
    } else if content.starts_with(b"{") || content.starts_with(b"[") {
        RdfFormat::from_extension("jsonld")
    } else if content.starts_with(b"@prefix")
        || content.starts_with(b"@base")
        || starts_with_ignore_case(b"prefix")
        || starts_with_ignore_case(b"base")
        || content.starts_with(b"<")
        || content.starts_with(b"_:")
        || content.starts_with(b"#")
    {
        Some(RdfFormat::Turtle)
    } else {
        None
    }
}

/// Loads inputs into an in-memory oxigraph [`Store`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OxigraphLoader;

impl GraphLoader for OxigraphLoader {
    type Graph = OxigraphGraph;

    fn load(&self, source: &InputSource) -> Result<OxigraphGraph, InputError> {
        let input = source.identifier();
        let content = source.read()?;
        let format = source.detect_format(&content)?;
        debug!("Parsing {input} as {}", format.name());
        let mut parser = RdfParser::from_format(format);
        if let Some(base_iri) = source.base_iri() {
            parser = parser
                .with_base_iri(base_iri)
                .map_err(|e| InputError::InvalidBaseIri {
                    iri: base_iri.to_owned(),
                    message: e.to_string(),
                })?;
        }
        let store = Store::new().map_err(|e| InputError::storage(&input, e))?;
        if source.is_lenient() {
            for quad in parser.for_reader(content.as_slice()) {
                match quad {
                    Ok(quad) => {
                        store
                            .insert(&quad)
                            .map_err(|e| InputError::storage(&input, e))?;
                    }
                    Err(e) => warn!("Skipping invalid statement in {input}: {e}"),
                }
            }
        } else {
            store
                .load_from_reader(parser, content.as_slice())
                .map_err(|e| {
                    if let LoaderError::Storage(e) = e {
                        InputError::storage(&input, e)
                    } else {
                        InputError::parse(&input, e)
                    }
                })?;
        }
        Ok(OxigraphGraph { input, store })
    }
}

/// A graph held by an oxigraph [`Store`].
pub struct OxigraphGraph {
    input: String,
    store: Store,
}

impl OxigraphGraph {
    /// Wraps an existing store.
    pub fn new(input: impl Into<String>, store: Store) -> Self {
        Self {
            input: input.into(),
            store,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl QueryableGraph for OxigraphGraph {
    fn statement_count(&self) -> Result<usize, InputError> {
        self.store
            .len()
            .map_err(|e| InputError::storage(&self.input, e))
    }

    fn evaluate(&self, query: &str) -> Result<Solutions, QueryError> {
        let mut prepared = SparqlEvaluator::new()
            .parse_query(query)
            .map_err(QueryError::syntax)?;
        // Statements of named graphs are validated too
        prepared.dataset_mut().set_default_graph_as_union();
        match prepared
            .on_store(&self.store)
            .execute()
            .map_err(QueryError::evaluation)?
        {
            QueryResults::Solutions(solutions) => {
                let variables = solutions.variables().to_vec();
                let mut result =
                    Solutions::new(variables.iter().map(|v| v.as_str().to_owned()).collect())?;
                for solution in solutions {
                    let solution = solution.map_err(QueryError::evaluation)?;
                    result.push_row(
                        variables
                            .iter()
                            .map(|variable| solution.get(variable).map(term_value).unwrap_or_default())
                            .collect(),
                    )?;
                }
                Ok(result)
            }
            QueryResults::Boolean(_) => Err(QueryError::UnsupportedForm { form: "ASK" }),
            QueryResults::Graph(_) => Err(QueryError::UnsupportedForm {
                form: "CONSTRUCT or DESCRIBE",
            }),
        }
    }
}

/// The lexical value of a term: the IRI, the literal value or the N-Triples form otherwise.
fn term_value(term: &Term) -> String {
    if let Term::NamedNode(node) = term {
        node.as_str().to_owned()
    } else if let Term::Literal(literal) = term {
        literal.value().to_owned()
    } else {
        term.to_string()
    }
}
