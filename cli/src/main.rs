#![allow(clippy::print_stderr)]
use crate::cli::{Args, LogFormat, ReportFormatArg};
use anyhow::{Context, anyhow};
use clap::Parser;
use sparrules::{BuiltinRuleset, ReportFormat, ValidationConfig, ValidationPipeline};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

/// Exit status of runs that could not validate the input.
const FATAL_EXIT_STATUS: u8 = 255;
/// Highest exit status used to report a number of violations.
const MAX_VIOLATIONS_EXIT_STATUS: u8 = 254;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version are "errors" printed on stdout
            let status = if e.use_stderr() {
                ExitCode::from(FATAL_EXIT_STATUS)
            } else {
                ExitCode::SUCCESS
            };
            if e.print().is_err() {
                return ExitCode::from(FATAL_EXIT_STATUS);
            }
            return status;
        }
    };
    if let Err(e) = init_logging(args.log_format) {
        eprintln!("Error: {e:?}");
        return ExitCode::from(FATAL_EXIT_STATUS);
    }
    match run(&args) {
        Ok(violations) => exit_status(violations),
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(FATAL_EXIT_STATUS)
        }
    }
}

fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);
    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow!(e).context("Not able to set up logging"))
}

/// Runs the validation and returns the number of violations.
fn run(args: &Args) -> anyhow::Result<usize> {
    if args.list_builtins {
        list_builtins()?;
        return Ok(0);
    }
    let (Some(input), Some(output)) = (&args.input, &args.output) else {
        anyhow::bail!("Both --input and --output are required");
    };

    let mut config = ValidationConfig::new(input).with_rulesets(&args.rulesets);
    if let Some(base) = &args.base {
        config = config.with_base_iri(base);
    }
    if let Some(format) = &args.format {
        config = config.with_format(format);
    }
    if args.lenient {
        config = config.lenient();
    }
    if let Some(location) = &args.builtin_location {
        config = config.with_builtin_location(location);
    }
    let report_format = match args.report_format {
        Some(ReportFormatArg::Html) => ReportFormat::Html,
        Some(ReportFormatArg::Text) => ReportFormat::Text,
        Some(ReportFormatArg::Json) => ReportFormat::Json,
        None => ReportFormat::from_path(output).unwrap_or_default(),
    };

    let prepared = ValidationPipeline::with_oxigraph(config)
        .load()
        .with_context(|| format!("Not able to load {}", input.display()))?;

    let mut writer = BufWriter::new(
        File::create(output)
            .with_context(|| format!("Not able to create the report file {}", output.display()))?,
    );
    let result = prepared.validate(report_format.writer(&mut writer));
    let report = match result {
        Ok(report) => {
            close_file_writer(writer)
                .with_context(|| format!("Not able to write {}", output.display()))?;
            report
        }
        Err(e) => {
            drop(writer);
            remove_partial_report(output);
            return Err(e).with_context(|| format!("Not able to write {}", output.display()));
        }
    };
    info!(
        "{} report written to {}",
        report_format,
        output.display()
    );

    if let Some(path) = &args.summary {
        let mut writer = BufWriter::new(
            File::create(path)
                .with_context(|| format!("Not able to create the summary file {}", path.display()))?,
        );
        serde_json::to_writer_pretty(&mut writer, &report.summary())?;
        writeln!(writer)?;
        close_file_writer(writer)
            .with_context(|| format!("Not able to write {}", path.display()))?;
    }
    Ok(report.total_violations())
}

fn list_builtins() -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    for ruleset in BuiltinRuleset::all() {
        writeln!(stdout, "{}: {}", ruleset.reference(), ruleset.description())?;
        for name in ruleset.rule_names() {
            writeln!(stdout, "    {name}")?;
        }
    }
    stdout.flush()?;
    Ok(())
}

fn exit_status(violations: usize) -> ExitCode {
    match u8::try_from(violations) {
        Ok(status) if status <= MAX_VIOLATIONS_EXIT_STATUS => ExitCode::from(status),
        _ => {
            warn!(
                "{violations} violations found, the exit status is capped to {MAX_VIOLATIONS_EXIT_STATUS}"
            );
            ExitCode::from(MAX_VIOLATIONS_EXIT_STATUS)
        }
    }
}

fn remove_partial_report(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("Not able to remove the incomplete report {}: {e}", path.display());
    }
}

fn close_file_writer(writer: BufWriter<File>) -> io::Result<()> {
    let mut file = writer
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?;
    file.flush()?;
    file.sync_all()
}
