//! Field extraction from cleaned document text.
//!
//! Two independent sources feed the field mapping:
//! - an [`EntityDetector`] whose mentions are grouped per category into
//!   comma-joined fields (`Organizations`, `Persons`, ...)
//! - the ordered pattern [`RuleSet`], one field per rule
//!
//! The two namespaces are disjoint, so the result is a plain union.

mod detector;
pub mod rules;
pub mod schema;

pub use detector::HeuristicDetector;
pub use rules::{CompiledRule, RuleSet};
pub use schema::FieldSchema;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::models::config::SmartdocConfig;
use crate::models::document::FieldValues;

/// Coarse category of a detected mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Organization,
    Person,
    Location,
    Date,
    Money,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 5] = [
        EntityCategory::Organization,
        EntityCategory::Person,
        EntityCategory::Location,
        EntityCategory::Date,
        EntityCategory::Money,
    ];

    /// Field name the category's mentions are reported under.
    pub fn field_name(&self) -> &'static str {
        match self {
            EntityCategory::Organization => "Organizations",
            EntityCategory::Person => "Persons",
            EntityCategory::Location => "Addresses",
            EntityCategory::Date => "Dates",
            EntityCategory::Money => "Amounts",
        }
    }
}

/// One mention found by a detector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetectedEntity {
    pub text: String,
    pub category: EntityCategory,
}

/// Trait for pluggable statistical entity detectors.
pub trait EntityDetector: Send + Sync {
    /// Human-readable detector identifier.
    fn detector_id(&self) -> &str;

    /// All mentions in `text`. Duplicates are allowed.
    fn detect(&self, text: &str) -> Vec<DetectedEntity>;
}

/// Combines entity detection with pattern rules. Pure function of the text
/// and the static tables it was built with.
pub struct FieldExtractor {
    rules: RuleSet,
    detector: Option<Box<dyn EntityDetector>>,
}

impl FieldExtractor {
    /// Extractor with the given rules and the heuristic detector.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            detector: Some(Box::new(HeuristicDetector::new())),
        }
    }

    /// Replace the entity detector.
    pub fn with_detector(mut self, detector: Box<dyn EntityDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Run pattern rules only.
    pub fn without_detector(mut self) -> Self {
        self.detector = None;
        self
    }

    /// Build from configuration. A malformed pattern is fatal here.
    pub fn from_config(config: &SmartdocConfig) -> Result<Self, ConfigError> {
        let extractor = Self::new(config.rule_set()?);
        Ok(if config.extraction.detect_entities {
            extractor
        } else {
            extractor.without_detector()
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Extract every known field from `text`. Fields that were looked for
    /// but not found are present with a `None` value.
    pub fn extract(&self, text: &str) -> FieldValues {
        let mut fields = FieldValues::new();

        if let Some(detector) = &self.detector {
            trace!("Running detector {}", detector.detector_id());
            let mut grouped: BTreeMap<EntityCategory, BTreeSet<String>> = EntityCategory::ALL
                .iter()
                .map(|c| (*c, BTreeSet::new()))
                .collect();

            for entity in detector.detect(text) {
                grouped.entry(entity.category).or_default().insert(entity.text);
            }

            for (category, mentions) in grouped {
                let joined = if mentions.is_empty() {
                    None
                } else {
                    Some(mentions.into_iter().collect::<Vec<_>>().join(", "))
                };
                fields.insert(category.field_name(), joined);
            }
        }

        for rule in self.rules.iter() {
            fields.insert(rule.field(), rule.apply(text));
        }

        debug!("Extracted {} of {} fields", fields.found(), fields.len());

        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FixedDetector(Vec<DetectedEntity>);

    impl EntityDetector for FixedDetector {
        fn detector_id(&self) -> &str {
            "fixed"
        }

        fn detect(&self, _text: &str) -> Vec<DetectedEntity> {
            self.0.clone()
        }
    }

    fn entity(text: &str, category: EntityCategory) -> DetectedEntity {
        DetectedEntity {
            text: text.to_string(),
            category,
        }
    }

    #[test]
    fn test_extract_combines_rules_and_detector() {
        let extractor = FieldExtractor::new(RuleSet::defaults().unwrap());
        let text = "Invoice No: INV-1040\nAmount Paid: $1528.61\nDate: 31 May 2025";
        let fields = extractor.extract(text);

        assert_eq!(fields.get("Invoice Number"), Some("INV-1040"));
        assert_eq!(fields.get("Dates"), Some("31 May 2025"));
        assert_eq!(fields.get("Amounts"), Some("$1528.61"));
        assert!(fields.contains("IBAN"));
        assert_eq!(fields.get("IBAN"), None);
        assert_eq!(fields.len(), 43 + 5);
    }

    #[test]
    fn test_categories_are_deduplicated_and_joined() {
        let extractor = FieldExtractor::new(RuleSet::default()).with_detector(Box::new(FixedDetector(vec![
            entity("Acme Ltd", EntityCategory::Organization),
            entity("Beta Inc", EntityCategory::Organization),
            entity("Acme Ltd", EntityCategory::Organization),
        ])));
        let fields = extractor.extract("ignored");

        let orgs: BTreeSet<&str> = fields.get("Organizations").unwrap().split(", ").collect();
        assert_eq!(orgs, BTreeSet::from(["Acme Ltd", "Beta Inc"]));
        assert_eq!(fields.get("Persons"), None);
    }

    #[test]
    fn test_without_detector_only_runs_rules() {
        let extractor = FieldExtractor::new(RuleSet::defaults().unwrap()).without_detector();
        let fields = extractor.extract("Invoice No: A-1");
        assert!(!fields.contains("Organizations"));
        assert_eq!(fields.len(), 43);
    }

    #[test]
    fn test_from_config_rejects_malformed_pattern() {
        let mut config = SmartdocConfig::default();
        config.extraction.rules[0].pattern = "((".to_string();
        assert!(FieldExtractor::from_config(&config).is_err());
    }
}
