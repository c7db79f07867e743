//! The validation pipeline: load the input, run every ruleset and write the report.

use crate::config::ValidationConfig;
use crate::error::{InputError, ReportError, ValidationError};
use crate::executor::RuleExecutor;
use crate::graph::{GraphLoader, OxigraphLoader, QueryableGraph};
use crate::protocol::{ReportDocument, ReportWriter};
use crate::report::{RuleResult, RuleStatus, RulesetResult, ValidationReport, format_timestamp};
use crate::resolver::ResourceResolver;
use crate::rule::RuleDefinition;
use time::OffsetDateTime;
use tracing::{info, warn};

/// Title of every report.
pub const REPORT_TITLE: &str = "RDF Validation";

/// Validates an input against rulesets.
///
/// Validation happens in two steps so that nothing is written if the input can't be loaded:
/// [`load`](Self::load) reads the input and [`PreparedValidation::validate`] writes the report.
///
/// ```
/// use sparrules::{HtmlWriter, ValidationConfig, ValidationPipeline};
/// # let dir = tempfile::tempdir()?;
/// # let input = dir.path().join("catalog.ttl");
/// # std::fs::write(&input, "<http://example.com/c> a <http://www.w3.org/ns/dcat#Catalog> .")?;
///
/// let pipeline = ValidationPipeline::with_oxigraph(ValidationConfig::new(&input));
/// let prepared = pipeline.load()?;
/// assert_eq!(prepared.statement_count(), 1);
/// let mut html = HtmlWriter::new(Vec::new());
/// let report = prepared.validate(&mut html)?;
/// assert!(report.total_violations() > 0);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct ValidationPipeline<L: GraphLoader> {
    config: ValidationConfig,
    loader: L,
}

impl ValidationPipeline<OxigraphLoader> {
    /// A pipeline using an in-memory oxigraph store.
    pub fn with_oxigraph(config: ValidationConfig) -> Self {
        Self::new(config, OxigraphLoader)
    }
}

impl<L: GraphLoader> ValidationPipeline<L> {
    pub fn new(config: ValidationConfig, loader: L) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Loads the input graph.
    ///
    /// Fails if the input can't be read or parsed, or if it contains no statement.
    pub fn load(&self) -> Result<PreparedValidation<L::Graph>, ValidationError> {
        let source = self.config.input_source();
        let input = source.identifier();
        let graph = self.loader.load(&source)?;
        let statement_count = graph.statement_count()?;
        if statement_count == 0 {
            return Err(InputError::EmptyGraph { input }.into());
        }
        info!("Loaded {statement_count} statements from {input}");
        Ok(PreparedValidation {
            config: self.config.clone(),
            input,
            graph,
            statement_count,
        })
    }

    /// Loads the input and writes the report in one go.
    pub fn run<W: ReportWriter>(&self, writer: W) -> Result<ValidationReport, ValidationError> {
        self.load()?.validate(writer)
    }
}

/// A loaded input, ready to be validated.
pub struct PreparedValidation<G: QueryableGraph> {
    config: ValidationConfig,
    input: String,
    graph: G,
    statement_count: usize,
}

impl<G: QueryableGraph> PreparedValidation<G> {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn statement_count(&self) -> usize {
        self.statement_count
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Runs every ruleset against the graph and writes the report to `writer`.
    ///
    /// Rulesets that can't be resolved and rules that can't be executed are reported but do not
    /// stop the validation. Archives mounted during the run are released before returning.
    pub fn validate<W: ReportWriter>(&self, writer: W) -> Result<ValidationReport, ValidationError> {
        let mut resolver = ResourceResolver::new();
        if let Some(location) = self.config.builtin_location() {
            resolver = resolver.with_builtin_location(location);
        }
        let mut document = ReportDocument::new(writer);
        let result = self.write_report(&mut resolver, &mut document);
        resolver.release();
        let report = result?;
        info!(
            "Validation of {} done: {} violations, {} failed rules, {} unresolved rulesets",
            self.input,
            report.total_violations(),
            report.failed_rules(),
            report.unresolved_rulesets()
        );
        Ok(report)
    }

    fn write_report<W: ReportWriter>(
        &self,
        resolver: &mut ResourceResolver,
        document: &mut ReportDocument<W>,
    ) -> Result<ValidationReport, ReportError> {
        let timestamp = OffsetDateTime::now_utc();
        let ids = self.config.rulesets();
        document.open()?;
        document.title(REPORT_TITLE)?;
        document.text(&format!("File to validate: {}", self.input))?;
        document.text(&format!("Number of triples: {}", self.statement_count))?;
        document.text(&format!("Current time: {}", format_timestamp(timestamp)))?;
        document.text(&format!("Rulesets: {}", ids.join(", ")))?;

        let executor = RuleExecutor::new(&self.graph);
        let mut rulesets = Vec::with_capacity(ids.len());
        for id in ids {
            rulesets.push(validate_ruleset(document, resolver, &executor, id)?);
        }
        let report = ValidationReport {
            input: self.input.clone(),
            statement_count: self.statement_count,
            timestamp,
            rulesets,
        };

        document.text(&format!(
            "Number of violations: {}",
            report.total_violations()
        ))?;
        if !report.is_complete() {
            document.text(&format!(
                "WARNING: {} rule(s) failed and {} ruleset(s) could not be resolved; the violation count is incomplete",
                report.failed_rules(),
                report.unresolved_rulesets()
            ))?;
        }
        document.close()?;
        Ok(report)
    }
}

fn validate_ruleset<W: ReportWriter, G: QueryableGraph>(
    document: &mut ReportDocument<W>,
    resolver: &mut ResourceResolver,
    executor: &RuleExecutor<'_, G>,
    id: String,
) -> Result<RulesetResult, ReportError> {
    document.start_section(&id)?;
    let (rules, resolution_error) = match resolver.resolve(&id) {
        Ok(rules) => (rules, None),
        Err(e) => {
            warn!("Ruleset {id} could not be resolved: {e}");
            document.text(&format!("WARNING: ruleset could not be resolved: {e}"))?;
            (Vec::new(), Some(e.to_string()))
        }
    };
    document.text(&format!("Rules: {}", rules.len()))?;
    let rules = rules
        .into_iter()
        .map(|rule| validate_rule(document, executor, rule))
        .collect::<Result<Vec<_>, _>>()?;
    document.end_section()?;
    Ok(RulesetResult {
        id,
        resolution_error,
        rules,
    })
}

fn validate_rule<W: ReportWriter, G: QueryableGraph>(
    document: &mut ReportDocument<W>,
    executor: &RuleExecutor<'_, G>,
    rule: RuleDefinition,
) -> Result<RuleResult, ReportError> {
    document.start_section(&rule.heading())?;
    document.code(rule.body())?;
    let status = match executor.execute(&rule) {
        Ok(solutions) if solutions.is_empty() => {
            document.text("PASSED")?;
            RuleStatus::Executed(solutions)
        }
        Ok(solutions) => {
            document.start_table("")?;
            document.column_header(solutions.columns())?;
            for row in solutions.rows() {
                document.row(row)?;
            }
            document.end_table()?;
            document.text(&format!("Violations: {}", solutions.len()))?;
            RuleStatus::Executed(solutions)
        }
        Err(e) => {
            warn!("Rule {} failed: {e}", rule.name());
            document.text(&format!("FAILED: {e}"))?;
            RuleStatus::Failed(e.to_string())
        }
    };
    document.end_section()?;
    Ok(RuleResult {
        name: rule.name().to_owned(),
        title: rule.title().to_owned(),
        body: rule.body().to_owned(),
        status,
    })
}
