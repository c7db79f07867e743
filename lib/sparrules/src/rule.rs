//! Rule definitions.

/// Marker of a SPARQL line comment.
const COMMENT_MARKER: char = '#';

/// A validation rule: a SPARQL `SELECT` query whose solutions are violations.
///
/// The first line of the query may be a comment giving a human-readable title:
/// ```
/// use sparrules::RuleDefinition;
///
/// let rule = RuleDefinition::new(
///     "title.rq",
///     "# Dataset without title\nSELECT ?d WHERE { ?d a <http://www.w3.org/ns/dcat#Dataset> }",
/// );
/// assert_eq!(rule.title(), " Dataset without title");
/// assert!(rule.body().starts_with("# Dataset"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDefinition {
    name: String,
    text: String,
}

impl RuleDefinition {
    /// Creates a rule from its entry name in the ruleset and its full text.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Name of the rule in its ruleset, usually a file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The title written as a comment on the first line.
    ///
    /// It is the text between the leading `#` and the first line terminator (`\n`, `\r` or `\r\n`).
    /// It is empty if the rule does not start with a comment or if the text has no line terminator.
    pub fn title(&self) -> &str {
        let Some(rest) = self.text.strip_prefix(COMMENT_MARKER) else {
            return "";
        };
        match rest.find(['\r', '\n']) {
            Some(eol) => &rest[..eol],
            None => "",
        }
    }

    /// The query to execute.
    ///
    /// This is the full original text, comments included.
    pub fn body(&self) -> &str {
        &self.text
    }

    /// The heading to display for this rule: the trimmed title, or a label built from the name.
    pub fn heading(&self) -> String {
        let title = self.title().trim();
        if title.is_empty() {
            format!("Rule {}", self.name)
        } else {
            title.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_of_commented_rule() {
        let rule = RuleDefinition::new("a.rq", "#Missing title\nSELECT * WHERE {}");
        assert_eq!(rule.title(), "Missing title");
        assert_eq!(rule.heading(), "Missing title");
    }

    #[test]
    fn title_with_crlf_and_cr() {
        assert_eq!(
            RuleDefinition::new("a.rq", "# crlf\r\nSELECT * {}").title(),
            " crlf"
        );
        assert_eq!(
            RuleDefinition::new("a.rq", "# cr\rSELECT * {}").title(),
            " cr"
        );
    }

    #[test]
    fn no_title_without_leading_marker() {
        let rule = RuleDefinition::new("a.rq", " # indented\nSELECT * WHERE {}");
        assert_eq!(rule.title(), "");
        assert_eq!(rule.heading(), "Rule a.rq");
    }

    #[test]
    fn no_title_without_line_terminator() {
        let rule = RuleDefinition::new("b.rq", "# only a comment");
        assert_eq!(rule.title(), "");
    }

    #[test]
    fn empty_comment_falls_back_to_name() {
        let rule = RuleDefinition::new("c.rq", "#   \nSELECT * WHERE {}");
        assert_eq!(rule.title(), "   ");
        assert_eq!(rule.heading(), "Rule c.rq");
    }

    #[test]
    fn body_is_the_original_text() {
        for text in ["", "#", "# t\nSELECT * {}", "SELECT * {}\r\n", "#x\r\n#y\n"] {
            assert_eq!(RuleDefinition::new("r", text).body(), text);
        }
    }
}
