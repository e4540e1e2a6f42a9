// Rules
// Conditional policies shared by jobs and pipelines

use serde::Serialize;
use std::collections::BTreeMap;

/// A single `rules:` entry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rule {
    /// Condition expression, e.g. `$CI_COMMIT_BRANCH == "main"`
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Files whose existence makes the rule match
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exists: Vec<String>,

    /// Files whose modification makes the rule match
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_failure: Option<bool>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn when(mut self, when: impl Into<String>) -> Self {
        self.when = Some(when.into());
        self
    }

    pub fn allow_failure(mut self, allow_failure: bool) -> Self {
        self.allow_failure = Some(allow_failure);
        self
    }

    pub fn exists<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exists
            .extend(files.into_iter().map(|f| f.as_ref().to_string()));
        self
    }

    pub fn changes<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.changes
            .extend(files.into_iter().map(|f| f.as_ref().to_string()));
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

/// Rule shorthands available on anything that owns a rule list.
///
/// Implemented by [`Job`](crate::Job) and [`Pipeline`](crate::Pipeline); a
/// pipeline's rules end up on the trigger job that starts it.
pub trait RuleBuilder {
    fn rules_mut(&mut self) -> &mut Vec<Rule>;

    /// Append a fully built rule
    fn push_rule(&mut self, rule: Rule) -> &mut Self {
        self.rules_mut().push(rule);
        self
    }

    /// `if` + `when` + `allow_failure`
    fn add_rule(
        &mut self,
        condition: impl Into<String>,
        when: impl Into<String>,
        allow_failure: bool,
    ) -> &mut Self {
        self.push_rule(
            Rule::new()
                .condition(condition)
                .when(when)
                .allow_failure(allow_failure),
        )
    }

    fn add_if_when_rule(&mut self, condition: impl Into<String>, when: impl Into<String>) -> &mut Self {
        self.push_rule(Rule::new().condition(condition).when(when))
    }

    fn add_if_rule(&mut self, condition: impl Into<String>) -> &mut Self {
        self.push_rule(Rule::new().condition(condition))
    }

    fn add_when_rule(&mut self, when: impl Into<String>) -> &mut Self {
        self.push_rule(Rule::new().when(when))
    }

    fn add_exists_when_rule<I, S>(&mut self, exists: I, when: impl Into<String>) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.push_rule(Rule::new().exists(exists).when(when))
    }

    fn add_changes_when_rule<I, S>(&mut self, changes: I, when: impl Into<String>) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.push_rule(Rule::new().changes(changes).when(when))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Rules(Vec<Rule>);

    impl RuleBuilder for Rules {
        fn rules_mut(&mut self) -> &mut Vec<Rule> {
            &mut self.0
        }
    }

    #[test]
    fn test_rule_variants() {
        let mut rules = Rules::default();
        rules
            .add_rule("$CI_COMMIT_TAG", "always", true)
            .add_if_when_rule("$SKIP == 'true'", "never")
            .add_if_rule("$CI_MERGE_REQUEST_ID")
            .add_when_rule("manual")
            .add_exists_when_rule(["Dockerfile"], "on_success")
            .add_changes_when_rule(vec!["src/**/*".to_string()], "always");

        let rules = rules.0;
        assert_eq!(rules.len(), 6);
        assert_eq!(rules[0].allow_failure, Some(true));
        assert_eq!(rules[1].allow_failure, None);
        assert_eq!(rules[2].when, None);
        assert_eq!(rules[3].condition, None);
        assert_eq!(rules[3].when.as_deref(), Some("manual"));
        assert_eq!(rules[4].exists, vec!["Dockerfile"]);
        assert_eq!(rules[5].changes, vec!["src/**/*"]);
    }

    #[test]
    fn test_rule_serializes_if_key_and_omits_empty_fields() {
        let rule = Rule::new().condition("$CI_COMMIT_TAG").when("never");
        let yaml = serde_yaml::to_string(&rule).unwrap();

        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["if"].as_str(), Some("$CI_COMMIT_TAG"));
        assert_eq!(value["when"].as_str(), Some("never"));
        assert!(value.get("exists").is_none());
        assert!(value.get("allow_failure").is_none());
        assert!(value.get("variables").is_none());
    }
}
