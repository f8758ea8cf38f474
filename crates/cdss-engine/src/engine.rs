//! Rule Engine Implementation

use crate::context::build_context;
use crate::model::Rule;
use crate::operators::condition_holds;
use crate::request::{Alert, EvaluationRequest, EvaluationResponse};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Shared rule engine.
///
/// Holds the active rule set behind an `Arc` that `load_rules` swaps
/// wholesale, so an evaluation always sees one complete rule set.
pub struct RuleEngine {
    rules: RwLock<Arc<Vec<Rule>>>,
}

impl RuleEngine {
    /// Create an engine with no rules loaded
    pub fn new() -> Self {
        Self::with_rules(Vec::new())
    }

    /// Create an engine with an initial rule set
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        info!("Creating rule engine with {} rules", rules.len());
        Self {
            rules: RwLock::new(Arc::new(rules)),
        }
    }

    /// Replace the active rule set
    pub fn load_rules(&self, rules: Vec<Rule>) {
        let rules = Arc::new(rules);
        let count = rules.len();
        // the swap cannot leave a half-written set, so a poisoned lock is safe to reuse
        let mut active = self.rules.write().unwrap_or_else(|e| e.into_inner());
        *active = rules;
        info!("Loaded {} rules", count);
    }

    /// Snapshot of the active rule set
    pub fn rules(&self) -> Arc<Vec<Rule>> {
        self.rules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of loaded rules
    pub fn rule_count(&self) -> usize {
        self.rules().len()
    }

    /// Evaluate the active rules against a request
    pub fn evaluate(&self, request: &EvaluationRequest) -> EvaluationResponse {
        self.evaluate_at(request, Utc::now())
    }

    /// Evaluate with a fixed alert timestamp
    pub fn evaluate_at(
        &self,
        request: &EvaluationRequest,
        now: DateTime<Utc>,
    ) -> EvaluationResponse {
        let rules = self.rules();
        let context = build_context(request);
        let response = evaluate_rules(&rules, &context, now);

        debug!(
            event = request.context_event.as_deref().unwrap_or("unspecified"),
            rules = rules.len(),
            alerts = response.alerts.len(),
            valid = response.valid,
            "Evaluation complete"
        );

        response
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate `rules` in order against a prepared context
pub fn evaluate_rules(rules: &[Rule], context: &Value, now: DateTime<Utc>) -> EvaluationResponse {
    let mut alerts = Vec::new();

    for rule in rules.iter().filter(|r| r.is_enabled()) {
        if !rule.conditions().iter().all(|c| condition_holds(c, context)) {
            continue;
        }

        debug!("Rule fired: {} ({})", rule.id(), rule.priority());
        alerts.extend(rule.actions().iter().map(|action| Alert {
            rule_id: rule.id().to_string(),
            rule_name: rule.name().to_string(),
            category: rule.category(),
            priority: rule.priority(),
            action: action.kind,
            message: action.message.clone(),
            suggestion: action.suggestion.clone(),
            evidence_link: rule.evidence_link().map(str::to_string),
            timestamp: now,
        }));
    }

    EvaluationResponse::from_alerts(alerts)
}
