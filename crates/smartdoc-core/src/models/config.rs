//! Configuration structures for the training-data pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::extract::rules::{RuleSet, DEFAULT_PATTERNS};
use crate::extract::schema::{FieldSchema, DEFAULT_FIELD_LABELS};

/// Main configuration for the smartdoc pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartdocConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Field to label schema.
    pub schema: SchemaConfig,

    /// Model training configuration.
    pub training: TrainingConfig,

    /// Artifact locations.
    pub paths: PathsConfig,
}

/// A named pattern rule. The value is taken from the last capture group of
/// the first case-insensitive match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub field: String,
    pub pattern: String,
}

/// One entry of the field to label schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field: String,
    pub label: String,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Ordered pattern rules.
    pub rules: Vec<PatternRule>,

    /// Run the statistical entity detector alongside the rules.
    pub detect_entities: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            rules: DEFAULT_PATTERNS
                .iter()
                .map(|(field, pattern)| PatternRule {
                    field: (*field).to_string(),
                    pattern: (*pattern).to_string(),
                })
                .collect(),
            detect_entities: true,
        }
    }
}

/// Field to label schema configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Ordered field to label mappings.
    pub fields: Vec<FieldMapping>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            fields: DEFAULT_FIELD_LABELS
                .iter()
                .map(|(field, label)| FieldMapping {
                    field: (*field).to_string(),
                    label: (*label).to_string(),
                })
                .collect(),
        }
    }
}

/// Model training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of full passes over the corpus.
    pub epochs: usize,

    /// Feature dropout rate in `[0, 1)`.
    pub dropout: f32,

    /// SGD learning rate.
    pub learn_rate: f32,

    /// Seed for dropout and shuffling.
    pub seed: u64,

    /// Shuffle examples at the start of every epoch.
    pub shuffle: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 30,
            dropout: 0.3,
            learn_rate: 0.05,
            seed: 0,
            shuffle: false,
        }
    }
}

impl TrainingConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.epochs == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "epochs",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ConfigError::InvalidParameter {
                name: "dropout",
                reason: format!("{} is outside [0, 1)", self.dropout),
            });
        }
        if !(self.learn_rate > 0.0 && self.learn_rate.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "learn_rate",
                reason: format!("{} is not a positive number", self.learn_rate),
            });
        }
        Ok(())
    }
}

/// Artifact locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Training corpus artifact.
    pub corpus: PathBuf,

    /// Model artifact directory.
    pub model_dir: PathBuf,

    /// Directory holding cleaned `.txt` files for records without text.
    pub text_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            corpus: PathBuf::from("artifacts/ner_training_data_clean.json"),
            model_dir: PathBuf::from("artifacts/trained_invoice_ner"),
            text_dir: PathBuf::from("artifacts/extracted_texts"),
        }
    }
}

impl SmartdocConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Compile the pattern table.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        RuleSet::compile(&self.extraction.rules)
    }

    /// Build the validated field schema.
    pub fn field_schema(&self) -> Result<FieldSchema, ConfigError> {
        FieldSchema::new(self.schema.fields.clone())
    }

    /// Validate every section. Meant to run once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rule_set()?;
        self.field_schema()?;
        self.training.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SmartdocConfig::default();
        config.validate().unwrap();
        assert_eq!(config.extraction.rules.len(), 43);
        assert_eq!(config.schema.fields.len(), 43);
    }

    #[test]
    fn test_invalid_dropout_is_rejected() {
        let mut config = SmartdocConfig::default();
        config.training.dropout = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "dropout", .. })
        ));
    }

    #[test]
    fn test_malformed_pattern_is_rejected() {
        let mut config = SmartdocConfig::default();
        config.extraction.rules.push(PatternRule {
            field: "Broken".to_string(),
            pattern: r"(Broken[:]\s*(.+)".to_string(),
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MalformedPattern { .. })
        ));
    }

    #[test]
    fn test_config_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = SmartdocConfig::default();
        config.training.epochs = 5;
        config.save(&path).unwrap();

        let loaded = SmartdocConfig::from_file(&path).unwrap();
        assert_eq!(loaded.training.epochs, 5);
        assert_eq!(loaded.schema.fields, config.schema.fields);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: SmartdocConfig =
            serde_json::from_str(r#"{"training": {"epochs": 2}}"#).unwrap();
        assert_eq!(config.training.epochs, 2);
        assert_eq!(config.training.dropout, 0.3);
        assert_eq!(config.extraction.rules.len(), 43);
    }
}
