//! Error types for rule resolution, rule execution and report generation.

use std::io;
use std::path::PathBuf;

/// Error returned by a validation run.
///
/// Only fatal failures are reported here: problems with a single ruleset or a single rule
/// are recorded in the [`ValidationReport`](crate::ValidationReport) instead.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// The input graph could not be loaded or is empty.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The report could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl From<ProtocolViolation> for ValidationError {
    fn from(error: ProtocolViolation) -> Self {
        Self::Report(error.into())
    }
}

/// Error raised while reading and loading the input graph.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum InputError {
    /// The input file could not be read.
    #[error("Not able to read the input file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The serialization format of the input could not be determined.
    #[error("Could not determine the RDF format of {input}: {reason}")]
    UnknownFormat { input: String, reason: String },

    /// The base IRI is not a valid IRI.
    #[error("Invalid base IRI {iri}: {message}")]
    InvalidBaseIri { iri: String, message: String },

    /// The input content is not valid for its format.
    #[error("Not able to parse {input}: {message}")]
    Parse { input: String, message: String },

    /// The graph store failed.
    #[error("Storage error while loading {input}: {message}")]
    Storage { input: String, message: String },

    /// The input contains no statement at all.
    #[error("No statements loaded from {input}")]
    EmptyGraph { input: String },
}

impl InputError {
    /// Creates an unknown format error.
    pub fn unknown_format(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnknownFormat {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(input: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            input: input.into(),
            message: message.to_string(),
        }
    }

    /// Creates a storage error.
    pub fn storage(input: impl Into<String>, message: impl ToString) -> Self {
        Self::Storage {
            input: input.into(),
            message: message.to_string(),
        }
    }
}

/// Error raised while turning a ruleset identifier into rules.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ResolutionError {
    /// The identifier is syntactically invalid.
    #[error("Invalid ruleset identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: &'static str },

    /// No built-in ruleset has the requested name.
    #[error("Unknown built-in ruleset '{name}', available rulesets are: {available}")]
    UnknownBuiltin { name: String, available: String },

    /// The path does not exist.
    #[error("Ruleset path {} does not exist", path.display())]
    NotFound { path: PathBuf },

    /// The path exists but is neither a directory nor an archive.
    #[error("Ruleset path {} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    /// The archive could not be opened.
    #[error("Not able to mount the archive {}: {message}", archive.display())]
    Mount { archive: PathBuf, message: String },

    /// A rule entry could not be read.
    #[error("Not able to read the rule {entry}: {source}")]
    Read {
        entry: String,
        #[source]
        source: io::Error,
    },

    /// A rule entry is not valid UTF-8 text.
    #[error("The rule {entry} is not valid UTF-8 text")]
    NotUtf8 { entry: String },
}

impl ResolutionError {
    /// Creates a mount error.
    pub fn mount(archive: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Mount {
            archive: archive.into(),
            message: message.to_string(),
        }
    }

    /// Creates a read error for an entry.
    pub fn read(entry: impl Into<String>, source: io::Error) -> Self {
        Self::Read {
            entry: entry.into(),
            source,
        }
    }
}

/// Error raised while executing the query of a rule.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryError {
    /// The query is not valid SPARQL.
    #[error("Invalid query syntax: {message}")]
    Syntax { message: String },

    /// The query evaluation failed.
    #[error("Query evaluation failed: {message}")]
    Evaluation { message: String },

    /// Only SELECT queries produce violation rows.
    #[error("Rules must be SELECT queries, found a {form} query")]
    UnsupportedForm { form: &'static str },

    /// The query engine returned a row that does not match the columns.
    #[error("A result row has {actual} values but the query has {expected} columns")]
    RowArity { expected: usize, actual: usize },

    /// The query engine returned the same column twice.
    #[error("The column '{column}' is returned more than once")]
    DuplicateColumn { column: String },
}

impl QueryError {
    /// Creates a syntax error.
    pub fn syntax(message: impl ToString) -> Self {
        Self::Syntax {
            message: message.to_string(),
        }
    }

    /// Creates an evaluation error.
    pub fn evaluation(message: impl ToString) -> Self {
        Self::Evaluation {
            message: message.to_string(),
        }
    }
}

/// A report writer operation was called in a state where it is not allowed.
///
/// This always denotes a bug in the code driving the writer, never a problem with the data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Report protocol violation: {operation} is not allowed {reason}")]
pub struct ProtocolViolation {
    operation: &'static str,
    reason: String,
}

impl ProtocolViolation {
    pub(crate) fn new(operation: &'static str, reason: impl Into<String>) -> Self {
        Self {
            operation,
            reason: reason.into(),
        }
    }

    /// The rejected operation.
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

/// Error raised while writing a report.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReportError {
    /// The writer was driven in an invalid order.
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),

    /// The underlying output failed.
    #[error("Not able to write the report: {0}")]
    Io(#[from] io::Error),
}
