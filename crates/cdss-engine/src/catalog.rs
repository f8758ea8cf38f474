//! Default Rule Catalog
//!
//! Seed rules used when no rule file is configured. Drug classes are
//! approximated by generic names; this is illustrative data, not a
//! clinical rule set.

use crate::error::RuleError;
use crate::model::{Action, Category, Condition, Operator, Priority, Rule};

/// Ids of the built-in rules, in load order
pub const DEFAULT_RULE_IDS: [&str; 5] = [
    "critical_potassium",
    "nsaid_older_adult",
    "asthma_nonselective_beta_blocker",
    "acetaminophen_daily_max",
    "diabetes_statin",
];

/// Build the default catalog
pub fn default_rules() -> Result<Vec<Rule>, RuleError> {
    Ok(vec![
        Rule::new(
            DEFAULT_RULE_IDS[0],
            "Critical potassium level",
            Category::CriticalLab,
            Priority::Critical,
        )?
        .with_condition(Condition::new("labs.K", Operator::GreaterEqual, 6.0)?)
        .with_action(
            Action::alert("Serum potassium at or above 6.0 mmol/L")
                .with_suggestion("Repeat level, obtain ECG and start hyperkalemia protocol"),
        ),
        Rule::new(
            DEFAULT_RULE_IDS[1],
            "NSAID use in older adult",
            Category::BestPractice,
            Priority::Moderate,
        )?
        .with_condition(Condition::new("patient.age", Operator::GreaterEqual, 65)?)
        .with_condition(Condition::new("medications", Operator::Contains, "ibuprofen")?)
        .with_action(
            Action::suggest("Avoid chronic NSAID use in adults 65 and older")
                .with_suggestion("Consider acetaminophen or topical therapy"),
        )
        .with_evidence_link("https://doi.org/10.1111/jgs.18372"),
        Rule::new(
            DEFAULT_RULE_IDS[2],
            "Non-selective beta blocker with asthma",
            Category::Contraindication,
            Priority::High,
        )?
        .with_condition(Condition::new("conditions_names", Operator::Contains, "asthma")?)
        .with_condition(Condition::new("medications", Operator::Contains, "propranolol")?)
        .with_action(
            Action::alert("Propranolol can precipitate bronchospasm in asthma")
                .with_suggestion("Switch to a cardioselective agent such as metoprolol"),
        ),
        Rule::new(
            DEFAULT_RULE_IDS[3],
            "Acetaminophen daily maximum exceeded",
            Category::DoseRange,
            Priority::Critical,
        )?
        .with_condition(Condition::new(
            "medication_objects.acetaminophen.total_daily_dose_mg",
            Operator::GreaterThan,
            4000,
        )?)
        .with_action(
            Action::block("Total daily acetaminophen exceeds 4 g")
                .with_suggestion("Reduce dose or review combination products"),
        ),
        Rule::new(
            DEFAULT_RULE_IDS[4],
            "Statin for adults with type 2 diabetes",
            Category::BestPractice,
            Priority::Low,
        )?
        .with_condition(Condition::new("conditions", Operator::Contains, "E11.9")?)
        .with_condition(Condition::new("patient.age", Operator::GreaterEqual, 40)?)
        .with_condition(Condition::new("labs.LDL", Operator::GreaterEqual, 70)?)
        .with_action(
            Action::suggest("Adult with type 2 diabetes and LDL at or above 70 mg/dL")
                .with_suggestion("Consider moderate-intensity statin therapy"),
        )
        .with_evidence_link("https://doi.org/10.2337/dc24-S010"),
    ])
}
