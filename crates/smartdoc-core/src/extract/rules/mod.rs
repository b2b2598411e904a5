//! Pattern rules for labeled document fields.

pub mod patterns;

pub use patterns::DEFAULT_PATTERNS;

use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;
use crate::models::config::PatternRule;

/// A compiled pattern rule.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    field: String,
    regex: Regex,
}

impl CompiledRule {
    /// Compile `pattern` case-insensitively.
    pub fn new(field: impl Into<String>, pattern: &str) -> Result<Self, ConfigError> {
        let field = field.into();
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::MalformedPattern {
                field: field.clone(),
                message: e.to_string(),
            })?;

        if regex.captures_len() < 2 {
            return Err(ConfigError::NoCaptureGroup(field));
        }

        Ok(Self { field, regex })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Value of the last capture group of the first match, trimmed.
    pub fn apply(&self, text: &str) -> Option<String> {
        let caps = self.regex.captures(text)?;
        let value = caps.get(caps.len() - 1)?.as_str().trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

/// Ordered, compiled pattern table.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile every rule; the first malformed one aborts.
    pub fn compile(rules: &[PatternRule]) -> Result<Self, ConfigError> {
        let mut compiled: Vec<CompiledRule> = Vec::with_capacity(rules.len());
        for rule in rules {
            if compiled.iter().any(|r| r.field == rule.field) {
                return Err(ConfigError::DuplicateField(rule.field.clone()));
            }
            compiled.push(CompiledRule::new(rule.field.clone(), &rule.pattern)?);
        }
        Ok(Self { rules: compiled })
    }

    /// The built-in table.
    pub fn defaults() -> Result<Self, ConfigError> {
        let rules: Vec<PatternRule> = DEFAULT_PATTERNS
            .iter()
            .map(|(field, pattern)| PatternRule {
                field: (*field).to_string(),
                pattern: (*pattern).to_string(),
            })
            .collect();
        Self::compile(&rules)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompiledRule> {
        self.rules.iter()
    }
}
