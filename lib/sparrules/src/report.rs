//! Results of a validation run.

use crate::graph::Solutions;
use crate::html::HtmlWriter;
use crate::json::JsonWriter;
use crate::protocol::ReportWriter;
use crate::text::TextWriter;
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Outcome of a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleStatus {
    /// The query ran: every row is a violation.
    Executed(Solutions),
    /// The query could not be run. It counts no violation.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleResult {
    pub name: String,
    pub title: String,
    pub body: String,
    pub status: RuleStatus,
}

impl RuleResult {
    pub fn violation_count(&self) -> usize {
        match &self.status {
            RuleStatus::Executed(solutions) => solutions.len(),
            RuleStatus::Failed(_) => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, RuleStatus::Failed(_))
    }

    /// `true` if the rule ran and found no violation.
    pub fn is_passed(&self) -> bool {
        matches!(&self.status, RuleStatus::Executed(solutions) if solutions.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesetResult {
    /// The identifier as requested.
    pub id: String,
    /// Set when the ruleset could not be resolved, in which case there is no rule.
    pub resolution_error: Option<String>,
    pub rules: Vec<RuleResult>,
}

impl RulesetResult {
    pub fn violation_count(&self) -> usize {
        self.rules.iter().map(RuleResult::violation_count).sum()
    }
}

/// The result of a validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub input: String,
    pub statement_count: usize,
    pub timestamp: OffsetDateTime,
    pub rulesets: Vec<RulesetResult>,
}

impl ValidationReport {
    /// The sum of the violations of every rule.
    pub fn total_violations(&self) -> usize {
        self.rulesets.iter().map(RulesetResult::violation_count).sum()
    }

    /// Number of rules whose query could not be run.
    pub fn failed_rules(&self) -> usize {
        self.rules().filter(|rule| rule.is_failed()).count()
    }

    /// Number of rulesets that could not be resolved.
    pub fn unresolved_rulesets(&self) -> usize {
        self.rulesets
            .iter()
            .filter(|ruleset| ruleset.resolution_error.is_some())
            .count()
    }

    /// `true` if every requested rule ran, so that the violation count is complete.
    pub fn is_complete(&self) -> bool {
        self.failed_rules() == 0 && self.unresolved_rulesets() == 0
    }

    pub fn rules(&self) -> impl Iterator<Item = &RuleResult> {
        self.rulesets.iter().flat_map(|ruleset| &ruleset.rules)
    }

    /// A serializable overview, without the violation rows.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            input: self.input.clone(),
            statement_count: self.statement_count,
            timestamp: format_timestamp(self.timestamp),
            total_violations: self.total_violations(),
            failed_rules: self.failed_rules(),
            unresolved_rulesets: self.unresolved_rulesets(),
            rulesets: self
                .rulesets
                .iter()
                .map(|ruleset| RulesetSummary {
                    id: ruleset.id.clone(),
                    error: ruleset.resolution_error.clone(),
                    violations: ruleset.violation_count(),
                    rules: ruleset
                        .rules
                        .iter()
                        .map(|rule| RuleSummary {
                            name: rule.name.clone(),
                            title: rule.title.trim().to_owned(),
                            violations: rule.violation_count(),
                            error: match &rule.status {
                                RuleStatus::Failed(message) => Some(message.clone()),
                                RuleStatus::Executed(_) => None,
                            },
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Formats a timestamp as RFC 3339, falling back to the `Display` form.
pub(crate) fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| timestamp.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub input: String,
    pub statement_count: usize,
    pub timestamp: String,
    pub total_violations: usize,
    pub failed_rules: usize,
    pub unresolved_rulesets: usize,
    pub rulesets: Vec<RulesetSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulesetSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub violations: usize,
    pub rules: Vec<RuleSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    pub name: String,
    pub title: String,
    pub violations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The available report renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReportFormat {
    #[default]
    Html,
    Text,
    Json,
}

impl ReportFormat {
    pub const ALL: [Self; 3] = [Self::Html, Self::Text, Self::Json];

    pub fn name(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Guesses the format from a file extension (`html`, `htm`, `txt`, `md` or `json`).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "html" | "htm" => Some(Self::Html),
            "txt" | "md" | "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Guesses the format from the extension of an output file.
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(path.extension().and_then(OsStr::to_str)?)
    }

    /// Builds the renderer writing to `write`.
    pub fn writer<'a, W: Write + 'a>(self, write: W) -> Box<dyn ReportWriter + 'a> {
        match self {
            Self::Html => Box::new(HtmlWriter::new(write)),
            Self::Text => Box::new(TextWriter::new(write)),
            Self::Json => Box::new(JsonWriter::new(write)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportFormat {
    type Err = UnknownReportFormat;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownReportFormat(name.to_owned()))
    }
}

/// Error returned when parsing an unknown [`ReportFormat`] name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown report format '{0}', expected html, text or json")]
pub struct UnknownReportFormat(String);
