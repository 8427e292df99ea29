//! Trigger condition extraction for reflex rules.

use docingest_shared::{AppConfig, TriggerCondition};

use crate::keywords::KeywordTable;

/// Tags a rule's text with the kind of engineering change it reacts to.
#[derive(Debug, Clone)]
pub struct TriggerExtractor {
    table: KeywordTable<TriggerCondition>,
}

impl TriggerExtractor {
    pub fn new(table: KeywordTable<TriggerCondition>) -> Self {
        Self { table }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.triggers.clone().into())
    }

    /// First matching keyword group wins; no match is [`TriggerCondition::Unknown`].
    pub fn extract(&self, rule_text: &str) -> TriggerCondition {
        self.table.first_match(rule_text).unwrap_or_default()
    }
}

impl Default for TriggerExtractor {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
