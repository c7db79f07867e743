#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod archive;
mod builtin;
mod config;
mod error;
mod executor;
mod graph;
mod html;
mod json;
mod pipeline;
mod protocol;
mod report;
mod resolver;
mod rule;
mod text;

pub use archive::{ARCHIVE_EXTENSION, ArchiveMounts, MountedArchive};
pub use builtin::{BUILTIN_SCHEME, BuiltinRuleset, DEFAULT_RULESETS};
pub use config::{DEFAULT_BASE_IRI, ValidationConfig};
pub use error::{
    InputError, ProtocolViolation, QueryError, ReportError, ResolutionError, ValidationError,
};
pub use executor::RuleExecutor;
pub use graph::{
    GraphLoader, InputSource, OxigraphGraph, OxigraphLoader, QueryableGraph, Solutions,
};
pub use html::HtmlWriter;
pub use json::JsonWriter;
pub use pipeline::{PreparedValidation, REPORT_TITLE, ValidationPipeline};
pub use protocol::{ReportDocument, ReportWriter};
pub use report::{
    ReportFormat, ReportSummary, RuleResult, RuleStatus, RuleSummary, RulesetResult,
    RulesetSummary, UnknownReportFormat, ValidationReport,
};
pub use resolver::{ResourceResolver, RulesetId};
pub use rule::RuleDefinition;
pub use text::TextWriter;
