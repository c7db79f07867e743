//! Rulesets compiled into the library.
//!
//! They are referenced with the `builtin://` scheme, e.g. `builtin://dcatap11be`.

use crate::rule::RuleDefinition;

/// Scheme prefix of built-in ruleset references.
pub const BUILTIN_SCHEME: &str = "builtin://";

/// Rulesets used when the caller does not request any.
pub const DEFAULT_RULESETS: &[&str] = &["builtin://dcatap11be"];

/// A named set of rules shipped with the library.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinRuleset {
    name: &'static str,
    description: &'static str,
    rules: &'static [(&'static str, &'static str)],
}

impl BuiltinRuleset {
    /// Name used after the `builtin://` scheme.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// The full reference to this ruleset.
    pub fn reference(&self) -> String {
        format!("{BUILTIN_SCHEME}{}", self.name)
    }

    /// Entry names of the rules, in execution order.
    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> {
        self.rules.iter().map(|(name, _)| *name)
    }

    pub fn rules(&self) -> Vec<RuleDefinition> {
        self.rules
            .iter()
            .map(|(name, text)| RuleDefinition::new(*name, *text))
            .collect()
    }

    /// Looks up a built-in ruleset by name.
    pub fn get(name: &str) -> Option<&'static Self> {
        BUILTIN_RULESETS.iter().find(|ruleset| ruleset.name == name)
    }

    pub fn all() -> &'static [Self] {
        BUILTIN_RULESETS
    }
}

macro_rules! rule {
    ($dir:literal, $file:literal) => {
        ($file, include_str!(concat!("../rules/", $dir, "/", $file)))
    };
}

// Entries are kept in lexicographic order, as directory rulesets are.
static BUILTIN_RULESETS: &[BuiltinRuleset] = &[
    BuiltinRuleset {
        name: "dcatap11be",
        description: "DCAT-AP 1.1 Belgian profile",
        rules: &[
            rule!("dcatap11be", "01-catalog-title.rq"),
            rule!("dcatap11be", "02-catalog-publisher.rq"),
            rule!("dcatap11be", "03-dataset-title.rq"),
            rule!("dcatap11be", "04-dataset-description.rq"),
            rule!("dcatap11be", "05-dataset-title-language.rq"),
            rule!("dcatap11be", "06-dataset-in-catalog.rq"),
            rule!("dcatap11be", "07-distribution-access-url.rq"),
            rule!("dcatap11be", "08-distribution-access-url-iri.rq"),
        ],
    },
    BuiltinRuleset {
        name: "rdf-basics",
        description: "Generic literal and typing hygiene",
        rules: &[
            rule!("rdf-basics", "01-empty-literal.rq"),
            rule!("rdf-basics", "02-untrimmed-literal.rq"),
            rule!("rdf-basics", "03-untyped-resource.rq"),
        ],
    },
];
