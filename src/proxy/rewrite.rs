//! Regex path rewriting for outbound requests.

use regex::Regex;

use crate::config::schema::RewriteRule;

/// A compiled `pattern -> replacement` rule.
#[derive(Debug, Clone)]
pub struct PathRewrite {
    pattern: Regex,
    replacement: String,
}

impl PathRewrite {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    pub fn compile(rule: &RewriteRule) -> Result<Self, regex::Error> {
        Self::new(&rule.pattern, rule.replacement.clone())
    }

    pub fn apply(&self, path: &str) -> String {
        self.pattern
            .replace_all(path, self.replacement.as_str())
            .into_owned()
    }

    /// The rule in its configuration form.
    pub fn to_rule(&self) -> RewriteRule {
        RewriteRule {
            pattern: self.pattern.as_str().to_string(),
            replacement: self.replacement.clone(),
        }
    }
}

/// Apply every rule in order, each to the output of the previous one.
pub fn rewrite_path(rules: &[PathRewrite], path: &str) -> String {
    rules
        .iter()
        .fold(path.to_string(), |current, rule| rule.apply(&current))
}
