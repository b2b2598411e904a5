//! Heuristic entity detector for business documents.

use std::collections::HashSet;

use regex::Regex;

use super::rules::patterns::{
    DATE_DAY_MONTH, DATE_MONTH_DAY, DATE_NUMERIC, LOCATION_CITY_STATE, LOCATION_LABELED,
    MONEY_PREFIXED, MONEY_SUFFIXED, ORGANIZATION, PERSON,
};
use super::{DetectedEntity, EntityCategory, EntityDetector};

/// Pattern-driven detector for organizations, persons, locations, dates
/// and money amounts. No model files, no runtime dependencies.
pub struct HeuristicDetector;

impl HeuristicDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeuristicDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityDetector for HeuristicDetector {
    fn detector_id(&self) -> &str {
        "heuristic"
    }

    fn detect(&self, text: &str) -> Vec<DetectedEntity> {
        let mut seen = HashSet::new();
        let mut entities = Vec::new();

        let passes: [(&Regex, EntityCategory); 9] = [
            (&ORGANIZATION, EntityCategory::Organization),
            (&PERSON, EntityCategory::Person),
            (&LOCATION_CITY_STATE, EntityCategory::Location),
            (&LOCATION_LABELED, EntityCategory::Location),
            (&DATE_DAY_MONTH, EntityCategory::Date),
            (&DATE_MONTH_DAY, EntityCategory::Date),
            (&DATE_NUMERIC, EntityCategory::Date),
            (&MONEY_PREFIXED, EntityCategory::Money),
            (&MONEY_SUFFIXED, EntityCategory::Money),
        ];

        for (regex, category) in passes {
            for caps in regex.captures_iter(text) {
                let Some(m) = caps.get(1) else { continue };
                let mention = m.as_str().trim();
                if mention.is_empty() {
                    continue;
                }
                if seen.insert((category, mention.to_string())) {
                    entities.push(DetectedEntity {
                        text: mention.to_string(),
                        category,
                    });
                }
            }
        }

        entities
    }
}
