use clap::{Parser, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "sparrules")]
/// Validates RDF files against rulesets of SPARQL queries
///
/// Every result row of a rule is a violation.
/// The exit status is the number of violations (at most 254) or 255 if the validation could not be done.
pub struct Args {
    /// File to validate
    ///
    /// The format is guessed from the file extension (.ttl, .nt, .nq, .trig, .rdf, .jsonld, .n3...),
    /// optionally followed by .gz, or else from the content.
    #[arg(short, long, value_hint = ValueHint::FilePath, required_unless_present = "list_builtins")]
    pub input: Option<PathBuf>,
    /// File in which the report is written
    ///
    /// It is not created if the input can't be loaded.
    #[arg(short, long, value_hint = ValueHint::FilePath, required_unless_present = "list_builtins")]
    pub output: Option<PathBuf>,
    /// Ruleset(s) to validate against
    ///
    /// A ruleset is a directory of SPARQL queries, a zip archive, a directory inside a zip archive (e.g. rules.zip/dcat)
    /// or a built-in ruleset (e.g. builtin://dcatap11be).
    /// If none is given, builtin://dcatap11be is used.
    #[arg(short, long = "ruleset", value_name = "ID", num_args = 1..)]
    pub rulesets: Vec<String>,
    /// The format of the input
    ///
    /// It can be an extension like "nt" or a MIME type like "application/n-triples".
    #[arg(long)]
    pub format: Option<String>,
    /// Base IRI used to resolve the relative IRIs of the input
    ///
    /// By default, the IRI of the Belgian open data portal is used.
    #[arg(long, value_hint = ValueHint::Url)]
    pub base: Option<String>,
    /// Skips the invalid statements of the input instead of failing
    #[arg(long)]
    pub lenient: bool,
    /// The format of the report
    ///
    /// By default, it is guessed from the output file extension and falls back to HTML.
    #[arg(long, value_enum)]
    pub report_format: Option<ReportFormatArg>,
    /// Directory or zip archive in which built-in rulesets are looked for
    ///
    /// builtin://name is then resolved to <location>/name instead of the rulesets shipped with the tool.
    #[arg(long, value_hint = ValueHint::AnyPath)]
    pub builtin_location: Option<PathBuf>,
    /// File in which a JSON summary of the validation is written
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub summary: Option<PathBuf>,
    /// Lists the built-in rulesets and exits
    #[arg(long)]
    pub list_builtins: bool,
    /// The format of the logs written to the standard error
    ///
    /// The verbosity is set with the RUST_LOG environment variable (default: info).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportFormatArg {
    Html,
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
