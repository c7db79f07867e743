//! Settings of a validation run.

use crate::builtin::DEFAULT_RULESETS;
use crate::graph::InputSource;
use std::path::{Path, PathBuf};

/// Base IRI used to resolve relative IRIs of the input when none is given.
pub const DEFAULT_BASE_IRI: &str = "http://data.gov.be";

/// Configuration of a validation run.
///
/// ```
/// use sparrules::ValidationConfig;
///
/// let config = ValidationConfig::new("catalog.ttl")
///     .with_ruleset("rules/dcat")
///     .with_ruleset("builtin://rdf-basics")
///     .lenient();
/// assert_eq!(config.rulesets(), ["rules/dcat", "builtin://rdf-basics"]);
/// assert_eq!(config.base_iri(), Some("http://data.gov.be"));
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct ValidationConfig {
    input: PathBuf,
    format: Option<String>,
    base_iri: Option<String>,
    lenient: bool,
    rulesets: Vec<String>,
    builtin_location: Option<PathBuf>,
}

impl ValidationConfig {
    /// A configuration validating `input` against the default rulesets.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            format: None,
            base_iri: Some(DEFAULT_BASE_IRI.to_owned()),
            lenient: false,
            rulesets: Vec::new(),
            builtin_location: None,
        }
    }

    /// Forces the input format, as a file extension or a media type.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }

    /// Does not resolve relative IRIs against any base.
    pub fn without_base_iri(mut self) -> Self {
        self.base_iri = None;
        self
    }

    /// Skips invalid statements of the input instead of failing.
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    /// Adds a ruleset. Rulesets run in the order they are added.
    pub fn with_ruleset(mut self, id: impl Into<String>) -> Self {
        self.rulesets.push(id.into());
        self
    }

    pub fn with_rulesets<I: IntoIterator<Item = S>, S: Into<String>>(mut self, ids: I) -> Self {
        self.rulesets.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Resolves `builtin://` references against a directory or an archive.
    pub fn with_builtin_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.builtin_location = Some(location.into());
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn base_iri(&self) -> Option<&str> {
        self.base_iri.as_deref()
    }

    /// The requested rulesets, or the default ones if none was added.
    pub fn rulesets(&self) -> Vec<String> {
        if self.rulesets.is_empty() {
            DEFAULT_RULESETS.iter().map(|id| (*id).to_owned()).collect()
        } else {
            self.rulesets.clone()
        }
    }

    pub fn builtin_location(&self) -> Option<&Path> {
        self.builtin_location.as_deref()
    }

    pub(crate) fn input_source(&self) -> InputSource {
        let mut source = InputSource::new(&self.input);
        if let Some(format) = &self.format {
            source = source.with_format(format);
        }
        if let Some(base_iri) = &self.base_iri {
            source = source.with_base_iri(base_iri);
        }
        if self.lenient {
            source = source.lenient();
        }
        source
    }
}
