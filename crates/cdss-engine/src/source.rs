//! Rule Sources
//!
//! Anything that can produce a complete rule set. The engine itself never
//! reads files; callers load from a source and hand the result to
//! [`RuleEngine::load_rules`](crate::RuleEngine::load_rules).

use crate::catalog::default_rules;
use crate::error::RuleError;
use crate::model::Rule;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Supplier of an ordered rule set
pub trait RuleSource: Send + Sync {
    /// Produce the full rule set
    fn load(&self) -> Result<Vec<Rule>, RuleError>;

    /// Human readable origin, used in logs
    fn describe(&self) -> String;
}

/// The built-in catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCatalog;

impl RuleSource for DefaultCatalog {
    fn load(&self) -> Result<Vec<Rule>, RuleError> {
        default_rules()
    }

    fn describe(&self) -> String {
        "built-in catalog".to_string()
    }
}

/// JSON file holding an array of rules
#[derive(Debug, Clone)]
pub struct JsonRuleFile {
    path: PathBuf,
}

impl JsonRuleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleSource for JsonRuleFile {
    fn load(&self) -> Result<Vec<Rule>, RuleError> {
        let raw = std::fs::read_to_string(&self.path)?;
        let rules = parse_rules(&raw)?;
        info!("Read {} rules from {}", rules.len(), self.path.display());
        Ok(rules)
    }

    fn describe(&self) -> String {
        format!("rule file {}", self.path.display())
    }
}

/// Parse a JSON rule array and reject duplicate ids
pub fn parse_rules(json: &str) -> Result<Vec<Rule>, RuleError> {
    let rules: Vec<Rule> = serde_json::from_str(json)?;
    ensure_unique_ids(&rules)?;
    Ok(rules)
}

/// Fail on the first id that appears twice
pub fn ensure_unique_ids(rules: &[Rule]) -> Result<(), RuleError> {
    let mut seen = HashSet::with_capacity(rules.len());
    for rule in rules {
        if !seen.insert(rule.id()) {
            return Err(RuleError::DuplicateId(rule.id().to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DEFAULT_RULE_IDS;

    const RULES_JSON: &str = r#"[
        {
            "id": "inr_high",
            "name": "Supratherapeutic INR",
            "category": "critical_lab",
            "priority": 1,
            "conditions": [{"field": "labs.INR", "operator": "greater_than", "value": 4.5}],
            "actions": [{"type": "alert", "message": "INR above 4.5", "suggestion": "Hold warfarin"}],
            "evidence_link": "https://example.org/inr"
        },
        {
            "id": "flu_vaccine",
            "name": "Influenza vaccination due",
            "category": "preventive_care",
            "priority": 5,
            "enabled": false,
            "actions": [{"type": "suggest", "message": "Offer influenza vaccine"}]
        }
    ]"#;

    #[test]
    fn test_default_catalog_source() {
        let rules = DefaultCatalog.load().unwrap();
        assert_eq!(rules.len(), DEFAULT_RULE_IDS.len());
    }

    #[test]
    fn test_parse_rules() {
        let rules = parse_rules(RULES_JSON).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].evidence_link(), Some("https://example.org/inr"));
        assert!(!rules[1].is_enabled());
        assert!(rules[1].conditions().is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id": "a", "name": "A", "category": "best_practice", "priority": 3},
            {"id": "a", "name": "A again", "category": "best_practice", "priority": 4}
        ]"#;
        assert!(matches!(parse_rules(json), Err(RuleError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn test_json_file_source() {
        let path = std::env::temp_dir().join(format!("cdss-rules-{}.json", std::process::id()));
        std::fs::write(&path, RULES_JSON).unwrap();

        let source = JsonRuleFile::new(&path);
        let rules = source.load().unwrap();
        assert_eq!(rules[0].id(), "inr_high");
        assert!(source.describe().contains("cdss-rules"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let source = JsonRuleFile::new("/nonexistent/cdss/rules.json");
        assert!(matches!(source.load(), Err(RuleError::Io(_))));
    }

    #[test]
    fn test_serialized_catalog_round_trips_through_parser() {
        let json = serde_json::to_string(&DefaultCatalog.load().unwrap()).unwrap();
        let rules = parse_rules(&json).unwrap();
        assert_eq!(rules, DefaultCatalog.load().unwrap());
    }
}
