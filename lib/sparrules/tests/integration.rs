//! Integration tests of the validation pipeline.

use sparrules::{
    GraphLoader, HtmlWriter, InputError, InputSource, JsonWriter, QueryError, QueryableGraph,
    ReportError, RuleStatus, Solutions, TextWriter, ValidationConfig, ValidationError,
    ValidationPipeline, ValidationReport,
};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const DATA: &str = r#"
@prefix ex: <http://example.com/> .
@prefix dct: <http://purl.org/dc/terms/> .

ex:a ex:bad "1" ; ex:good "x" .
ex:b ex:bad "2" ; ex:good "y" .
ex:c ex:bad "3" ; ex:good "z" .
ex:d ex:good "w" ; dct:title "D" .
ex:e ex:good "v" ; dct:title "E" .
"#;

const PASSING_RULE: &str = "# Nothing to see\nSELECT ?s WHERE { ?s <http://example.com/missing> ?o }";

const FAILING_RULE: &str = "# Bad values\nPREFIX ex: <http://example.com/>\nSELECT ?s ?o WHERE { ?s ex:bad ?o } ORDER BY ?s";

fn write_input(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write the input");
    path
}

fn write_rules(dir: &Path, name: &str, rules: &[(&str, &str)]) -> String {
    let path = dir.join(name);
    fs::create_dir(&path).expect("Failed to create the ruleset");
    for (file, text) in rules {
        fs::write(path.join(file), text).expect("Failed to write a rule");
    }
    path.display().to_string()
}

fn validate_as_text<L: GraphLoader>(
    pipeline: &ValidationPipeline<L>,
) -> (ValidationReport, String) {
    let mut writer = TextWriter::new(Vec::new());
    let report = pipeline
        .run(&mut writer)
        .expect("Validation failed");
    let text = String::from_utf8(writer.into_inner()).expect("The report is not UTF-8");
    (report, text)
}

/// A graph answering queries from keywords found in them.
struct Scripted;

impl QueryableGraph for Scripted {
    fn statement_count(&self) -> Result<usize, InputError> {
        Ok(10)
    }

    fn evaluate(&self, query: &str) -> Result<Solutions, QueryError> {
        if query.contains("broken") {
            return Err(QueryError::syntax("unexpected token"));
        }
        if query.contains("duplicate") {
            return Solutions::from_rows(vec!["a".into(), "a".into()], Vec::new());
        }
        let count = ["one", "two", "three"]
            .iter()
            .position(|word| query.contains(word))
            .map_or(0, |i| i + 1);
        Solutions::from_rows(
            vec!["s".into(), "o".into()],
            (0..count)
                .map(|i| vec![format!("http://example.com/{i}"), i.to_string()])
                .collect(),
        )
    }
}

struct ScriptedLoader;

impl GraphLoader for ScriptedLoader {
    type Graph = Scripted;

    fn load(&self, _: &InputSource) -> Result<Scripted, InputError> {
        Ok(Scripted)
    }
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Outcomes of rules
// =============================================================================

#[test]
fn test_passing_rule() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "data.ttl", DATA);
    let rules = write_rules(dir.path(), "rules", &[("pass.rq", PASSING_RULE)]);
    let pipeline = ValidationPipeline::with_oxigraph(ValidationConfig::new(input).with_ruleset(&rules));

    let (report, text) = validate_as_text(&pipeline);
    assert_eq!(report.statement_count, 10);
    assert_eq!(report.total_violations(), 0);
    assert!(report.is_complete());
    assert!(report.rulesets[0].rules[0].is_passed());
    assert!(text.contains("Number of triples: 10"));
    assert!(text.contains("### Nothing to see\n\n"));
    assert!(text.contains("PASSED"));
    assert!(text.contains("Number of violations: 0"));
    assert!(!text.contains("WARNING"));
}

#[test]
fn test_violations_are_tabulated() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "data.ttl", DATA);
    let rules = write_rules(dir.path(), "rules", &[("bad.rq", FAILING_RULE)]);
    let pipeline = ValidationPipeline::with_oxigraph(ValidationConfig::new(input).with_ruleset(&rules));

    let mut writer = HtmlWriter::new(Vec::new());
    let report = pipeline.run(&mut writer).unwrap();
    assert_eq!(report.total_violations(), 3);
    let RuleStatus::Executed(solutions) = &report.rulesets[0].rules[0].status else {
        panic!("The rule should have been executed");
    };
    assert_eq!(solutions.columns(), ["s", "o"]);
    assert_eq!(
        solutions.rows(),
        [
            vec!["http://example.com/a".to_owned(), "1".into()],
            vec!["http://example.com/b".to_owned(), "2".into()],
            vec!["http://example.com/c".to_owned(), "3".into()],
        ]
    );

    let html = String::from_utf8(writer.into_inner()).unwrap();
    assert!(html.contains("<h1>RDF Validation</h1>"));
    assert!(html.contains("<summary><h3>Bad values</h3></summary>"));
    assert!(html.contains("<thead>\n<tr><th>s</th><th>o</th></tr>\n</thead>"));
    assert!(html.contains("<tr><td>http://example.com/b</td><td>2</td></tr>"));
    assert_eq!(html.matches("<tr><td>").count(), 3);
    assert!(html.contains("<p>Violations: 3</p>"));
    assert!(html.contains("<p>Number of violations: 3</p>"));
}

#[test]
fn test_invalid_rule_does_not_stop_the_ruleset() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "data.ttl", DATA);
    let rules = write_rules(
        dir.path(),
        "rules",
        &[
            ("01-broken.rq", "# Broken\nSELEC ?s WHERE {"),
            ("02-ask.rq", "ASK { ?s ?p ?o }"),
            ("03-bad.rq", FAILING_RULE),
        ],
    );
    let pipeline = ValidationPipeline::with_oxigraph(ValidationConfig::new(input).with_ruleset(&rules));

    let (report, text) = validate_as_text(&pipeline);
    let rules = &report.rulesets[0].rules;
    assert_eq!(rules.len(), 3);
    assert!(rules[0].is_failed());
    assert!(rules[1].is_failed());
    assert_eq!(rules[2].violation_count(), 3);
    assert_eq!(report.total_violations(), 3);
    assert_eq!(report.failed_rules(), 2);
    assert!(text.contains("FAILED: Invalid query syntax"));
    assert!(text.contains("### Rule 02-ask.rq"));
    assert!(text.contains("FAILED: Rules must be SELECT queries, found a ASK query"));
    assert!(text.contains(
        "WARNING: 2 rule(s) failed and 0 ruleset(s) could not be resolved; the violation count is incomplete"
    ));
}

#[test]
fn test_unbound_values_are_empty() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "data.ttl", DATA);
    let rules = write_rules(
        dir.path(),
        "rules",
        &[(
            "optional.rq",
            "SELECT ?s ?title WHERE { ?s <http://example.com/bad> ?o OPTIONAL { ?s <http://purl.org/dc/terms/title> ?title } }",
        )],
    );
    let pipeline = ValidationPipeline::with_oxigraph(ValidationConfig::new(input).with_ruleset(&rules));

    let (report, _) = validate_as_text(&pipeline);
    let RuleStatus::Executed(solutions) = &report.rulesets[0].rules[0].status else {
        panic!("The rule should have been executed");
    };
    assert_eq!(solutions.len(), 3);
    assert!(solutions.rows().iter().all(|row| row[1].is_empty()));
}

#[test]
fn test_duplicate_columns_fail_only_the_rule() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(
        dir.path(),
        "rules",
        &[("1.rq", "# duplicate\nSELECT"), ("2.rq", "# two\nSELECT")],
    );
    let pipeline = ValidationPipeline::new(
        ValidationConfig::new("unused.ttl").with_ruleset(&rules),
        ScriptedLoader,
    );

    let (report, text) = validate_as_text(&pipeline);
    let rules = &report.rulesets[0].rules;
    assert!(rules[0].is_failed());
    assert_eq!(rules[1].violation_count(), 2);
    assert_eq!(report.total_violations(), 2);
    assert!(text.contains("FAILED: The column 'a' is returned more than once"));
    assert!(text.contains("Number of violations: 2"));
}

#[test]
fn test_named_graphs_are_validated() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        dir.path(),
        "data.nq",
        "<http://example.com/s> <http://example.com/bad> \"1\" <http://example.com/g> .\n",
    );
    let rules = write_rules(dir.path(), "rules", &[("bad.rq", FAILING_RULE)]);
    let pipeline = ValidationPipeline::with_oxigraph(ValidationConfig::new(input).with_ruleset(&rules));

    let (report, text) = validate_as_text(&pipeline);
    assert_eq!(report.statement_count, 1);
    assert_eq!(report.total_violations(), 1);
    assert!(text.contains("Violations: 1"));
    assert!(!text.contains("PASSED"));
}

// =============================================================================
// Rulesets
// =============================================================================

#[test]
fn test_missing_ruleset_is_reported() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing").display().to_string();
    let rules = write_rules(
        dir.path(),
        "rules",
        &[("a.rq", "# two\nSELECT"), ("b.rq", "# nothing\nSELECT")],
    );
    let pipeline = ValidationPipeline::new(
        ValidationConfig::new("unused.ttl")
            .with_ruleset(&missing)
            .with_ruleset(&rules),
        ScriptedLoader,
    );

    let (report, text) = validate_as_text(&pipeline);
    assert_eq!(report.rulesets.len(), 2);
    assert_eq!(report.rulesets[0].id, missing);
    assert!(report.rulesets[0].resolution_error.is_some());
    assert!(report.rulesets[0].rules.is_empty());
    assert_eq!(report.rulesets[1].rules.len(), 2);
    assert_eq!(report.total_violations(), 2);
    assert_eq!(report.unresolved_rulesets(), 1);
    assert!(text.contains("WARNING: ruleset could not be resolved: Ruleset path"));
    assert!(text.contains("Rules: 0"));
    assert!(text.contains("Rules: 2"));
    assert!(text.contains("0 rule(s) failed and 1 ruleset(s) could not be resolved"));
}

#[test]
fn test_rulesets_run_in_request_order() {
    let dir = TempDir::new().unwrap();
    let first = write_rules(dir.path(), "z-first", &[("r.rq", "# three\nSELECT")]);
    let second = write_rules(dir.path(), "a-second", &[("r.rq", "# one\nSELECT")]);
    let pipeline = ValidationPipeline::new(
        ValidationConfig::new("unused.ttl").with_rulesets([&first, &second]),
        ScriptedLoader,
    );

    let (report, text) = validate_as_text(&pipeline);
    let ids = report
        .rulesets
        .iter()
        .map(|ruleset| ruleset.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, [first.as_str(), second.as_str()]);
    assert!(text.find("z-first") < text.find("a-second"));
    assert_eq!(report.total_violations(), 4);
}

#[test]
fn test_total_is_the_sum_of_all_rules() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(
        dir.path(),
        "rules",
        &[
            ("1.rq", "# three\nSELECT"),
            ("2.rq", "# broken\nSELECT"),
            ("3.rq", "# nothing\nSELECT"),
            ("4.rq", "# two\nSELECT"),
        ],
    );
    let pipeline = ValidationPipeline::new(
        ValidationConfig::new("unused.ttl")
            .with_ruleset(&rules)
            .with_ruleset("builtin://unknown")
            .with_ruleset(&rules),
        ScriptedLoader,
    );

    let (report, _) = validate_as_text(&pipeline);
    let sum = report
        .rulesets
        .iter()
        .flat_map(|ruleset| &ruleset.rules)
        .map(|rule| rule.violation_count())
        .sum::<usize>();
    assert_eq!(report.total_violations(), sum);
    assert_eq!(report.total_violations(), 10);
    assert_eq!(report.failed_rules(), 2);
    assert_eq!(report.unresolved_rulesets(), 1);
}

#[test]
fn test_archive_ruleset() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "data.ttl", DATA);
    let archive = dir.path().join("rules.zip");
    let mut zip = ZipWriter::new(File::create(&archive).unwrap());
    for (name, text) in [
        ("dcat/2-bad.rq", FAILING_RULE),
        ("dcat/1-pass.rq", PASSING_RULE),
        ("other/ignored.rq", "broken"),
    ] {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(text.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    let id = archive.join("dcat").display().to_string();
    let pipeline = ValidationPipeline::with_oxigraph(ValidationConfig::new(input).with_ruleset(&id));

    let (report, _) = validate_as_text(&pipeline);
    let names = report.rulesets[0]
        .rules
        .iter()
        .map(|rule| rule.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["1-pass.rq", "2-bad.rq"]);
    assert_eq!(report.total_violations(), 3);
}

#[test]
fn test_default_builtin_ruleset() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        dir.path(),
        "catalog.ttl",
        "@prefix dcat: <http://www.w3.org/ns/dcat#> .\n<http://example.com/catalog> a dcat:Catalog .\n",
    );
    let pipeline = ValidationPipeline::with_oxigraph(ValidationConfig::new(input));

    let (report, text) = validate_as_text(&pipeline);
    assert_eq!(report.rulesets[0].id, "builtin://dcatap11be");
    assert_eq!(report.failed_rules(), 0);
    let title_rule = &report.rulesets[0].rules[0];
    assert_eq!(title_rule.name, "01-catalog-title.rq");
    assert_eq!(title_rule.violation_count(), 1);
    assert!(text.contains("## builtin://dcatap11be"));
}

#[test]
fn test_builtin_rules_are_valid_queries() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "data.ttl", DATA);
    let pipeline = ValidationPipeline::with_oxigraph(
        ValidationConfig::new(input)
            .with_ruleset("builtin://dcatap11be")
            .with_ruleset("builtin://rdf-basics"),
    );

    let (report, _) = validate_as_text(&pipeline);
    assert_eq!(report.failed_rules(), 0);
    assert_eq!(report.rulesets[1].rules.len(), 3);
    // every subject of the data is untyped
    assert_eq!(report.rulesets[1].rules[2].violation_count(), 5);
}

// =============================================================================
// Input
// =============================================================================

#[test]
fn test_empty_input_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "empty.ttl", "# no statement\n");
    let pipeline = ValidationPipeline::with_oxigraph(ValidationConfig::new(input));

    let mut writer = HtmlWriter::new(Vec::new());
    let error = pipeline.run(&mut writer).unwrap_err();
    assert!(matches!(
        error,
        ValidationError::Input(InputError::EmptyGraph { .. })
    ));
    assert!(writer.into_inner().is_empty());
}

#[test]
fn test_unknown_input_format() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "data.bin", "\u{1}\u{2}");
    let pipeline = ValidationPipeline::with_oxigraph(ValidationConfig::new(input));
    assert!(matches!(
        pipeline.load(),
        Err(ValidationError::Input(InputError::UnknownFormat { .. }))
    ));
}

#[test]
fn test_invalid_input_and_lenient_mode() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        dir.path(),
        "data.nt",
        "<http://example.com/s> <http://example.com/p> \"o\" .\nnot a statement\n",
    );
    let strict = ValidationPipeline::with_oxigraph(ValidationConfig::new(&input));
    assert!(matches!(
        strict.load(),
        Err(ValidationError::Input(InputError::Parse { .. }))
    ));
    let lenient = ValidationPipeline::with_oxigraph(ValidationConfig::new(&input).lenient());
    assert_eq!(lenient.load().unwrap().statement_count(), 1);
}

#[test]
fn test_relative_iris_use_the_base() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "data.ttl", "<a> <http://example.com/p> \"o\" .\n");
    let rules = write_rules(dir.path(), "rules", &[("s.rq", "SELECT ?s WHERE { ?s ?p ?o }")]);

    let pipeline =
        ValidationPipeline::with_oxigraph(ValidationConfig::new(&input).with_ruleset(&rules));
    let (report, _) = validate_as_text(&pipeline);
    let RuleStatus::Executed(solutions) = &report.rulesets[0].rules[0].status else {
        panic!("The rule should have been executed");
    };
    assert_eq!(solutions.get(0, "s"), Some("http://data.gov.be/a"));

    let pipeline = ValidationPipeline::with_oxigraph(
        ValidationConfig::new(&input)
            .with_base_iri("http://example.org/base/")
            .with_ruleset(&rules),
    );
    let (report, _) = validate_as_text(&pipeline);
    let RuleStatus::Executed(solutions) = &report.rulesets[0].rules[0].status else {
        panic!("The rule should have been executed");
    };
    assert_eq!(solutions.get(0, "s"), Some("http://example.org/base/a"));
}

// =============================================================================
// Output
// =============================================================================

#[test]
fn test_write_failure_is_fatal() {
    let pipeline = ValidationPipeline::new(ValidationConfig::new("unused.ttl"), ScriptedLoader);
    let error = pipeline.run(HtmlWriter::new(BrokenPipe)).unwrap_err();
    assert!(matches!(
        error,
        ValidationError::Report(ReportError::Io(_))
    ));
}

#[test]
fn test_json_report() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(dir.path(), "rules", &[("r.rq", "# two\nSELECT")]);
    let pipeline = ValidationPipeline::new(
        ValidationConfig::new("unused.ttl").with_ruleset(&rules),
        ScriptedLoader,
    );

    let mut writer = JsonWriter::new(Vec::new());
    pipeline.run(&mut writer).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&writer.into_inner()).unwrap();
    let content = json["content"].as_array().unwrap();
    assert_eq!(content[0]["type"], "title");
    assert_eq!(content[0]["text"], "RDF Validation");
    let ruleset = content
        .iter()
        .find(|node| node["type"] == "section")
        .unwrap();
    assert_eq!(ruleset["heading"], rules.as_str());
    let rule = &ruleset["content"][1];
    assert_eq!(rule["heading"], "two");
    assert_eq!(rule["content"][0]["type"], "code");
    assert_eq!(rule["content"][1]["columns"], serde_json::json!(["s", "o"]));
    assert_eq!(rule["content"][1]["rows"].as_array().unwrap().len(), 2);
    assert_eq!(rule["content"][2]["text"], "Violations: 2");
}
