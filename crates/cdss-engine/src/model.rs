//! Rule Data Model
//!
//! Rules, conditions and actions are validated when they are built, so a
//! rule that reaches the engine can always be evaluated.

use crate::error::RuleError;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Clinical category of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    CriticalLab,
    DrugAllergy,
    DrugInteraction,
    DuplicateTherapy,
    DoseRange,
    Contraindication,
    PreventiveCare,
    BestPractice,
    QualityMetric,
}

impl Category {
    /// All categories in declaration order
    pub const ALL: [Category; 9] = [
        Category::CriticalLab,
        Category::DrugAllergy,
        Category::DrugInteraction,
        Category::DuplicateTherapy,
        Category::DoseRange,
        Category::Contraindication,
        Category::PreventiveCare,
        Category::BestPractice,
        Category::QualityMetric,
    ];

    /// Wire name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CriticalLab => "critical_lab",
            Category::DrugAllergy => "drug_allergy",
            Category::DrugInteraction => "drug_interaction",
            Category::DuplicateTherapy => "duplicate_therapy",
            Category::DoseRange => "dose_range",
            Category::Contraindication => "contraindication",
            Category::PreventiveCare => "preventive_care",
            Category::BestPractice => "best_practice",
            Category::QualityMetric => "quality_metric",
        }
    }
}

impl FromStr for Category {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| RuleError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Alert priority. Lower value is more severe, so the derived ordering
/// sorts Critical first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Priority {
    Critical = 1,
    High = 2,
    Moderate = 3,
    Low = 4,
    Info = 5,
}

impl Priority {
    /// Lowercase display label
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Moderate => "moderate",
            Priority::Low => "low",
            Priority::Info => "info",
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = RuleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Critical),
            2 => Ok(Priority::High),
            3 => Ok(Priority::Moderate),
            4 => Ok(Priority::Low),
            5 => Ok(Priority::Info),
            other => Err(RuleError::UnknownPriority(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Condition operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    In,
    NotIn,
    Contains,
    Exists,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::GreaterEqual,
        Operator::LessEqual,
        Operator::In,
        Operator::NotIn,
        Operator::Contains,
        Operator::Exists,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::GreaterEqual => "greater_equal",
            Operator::LessEqual => "less_equal",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Contains => "contains",
            Operator::Exists => "exists",
        }
    }

    /// Check that `value` is a literal this operator can compare against
    fn check_literal(&self, value: &Literal) -> Result<(), RuleError> {
        let expected = match self {
            Operator::GreaterThan
            | Operator::LessThan
            | Operator::GreaterEqual
            | Operator::LessEqual => {
                matches!(value, Literal::Number(_)).then_some(()).ok_or("number")
            }
            Operator::In | Operator::NotIn => {
                matches!(value, Literal::List(_)).then_some(()).ok_or("list")
            }
            Operator::Exists => matches!(value, Literal::Bool(_)).then_some(()).ok_or("boolean"),
            Operator::Equals | Operator::NotEquals | Operator::Contains => Ok(()),
        };

        expected.map_err(|expected| RuleError::LiteralMismatch {
            operator: self.as_str(),
            expected,
        })
    }
}

impl FromStr for Operator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == wanted)
            .ok_or_else(|| RuleError::UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Literal a condition compares against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Literal>),
}

impl Literal {
    /// Build a list literal from anything convertible to literals
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Literal>,
    {
        Literal::List(items.into_iter().map(Into::into).collect())
    }

    /// Value equality against a context value. Numbers compare as f64 and
    /// booleans equal the numbers 1 and 0.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Literal::Bool(a), Value::Bool(b)) => a == b,
            (Literal::Number(a), Value::Number(b)) => b.as_f64() == Some(*a),
            (Literal::Bool(a), Value::Number(b)) => b.as_f64() == Some(bool_number(*a)),
            (Literal::Number(a), Value::Bool(b)) => *a == bool_number(*b),
            (Literal::Text(a), Value::String(b)) => a == b,
            (Literal::List(items), Value::Array(values)) => {
                items.len() == values.len()
                    && items.iter().zip(values).all(|(item, v)| item.matches(v))
            }
            _ => false,
        }
    }

    /// Literal as a JSON value
    pub fn to_json(&self) -> Value {
        match self {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Literal::Text(s) => Value::String(s.clone()),
            Literal::List(items) => Value::Array(items.iter().map(Literal::to_json).collect()),
        }
    }

    /// Text used for substring checks. Integral numbers print without a
    /// fraction, so `9` reads as "9".
    pub fn text_form(&self) -> String {
        match self {
            Literal::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Literal::Text(s) => s.clone(),
            other => other.to_json().to_string(),
        }
    }
}

fn bool_number(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Number(value as f64)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Number(f64::from(value))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<Vec<Literal>> for Literal {
    fn from(value: Vec<Literal>) -> Self {
        Literal::List(value)
    }
}

/// A single test of one context field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCondition")]
pub struct Condition {
    field: String,
    operator: Operator,
    value: Literal,
}

#[derive(Deserialize)]
struct RawCondition {
    field: String,
    operator: Operator,
    value: Literal,
}

impl TryFrom<RawCondition> for Condition {
    type Error = RuleError;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        Condition::new(raw.field, raw.operator, raw.value)
    }
}

impl Condition {
    /// Build a condition, rejecting malformed paths and literals the
    /// operator cannot use
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Literal>,
    ) -> Result<Self, RuleError> {
        let field = field.into();
        if field.is_empty() || field.split('.').any(str::is_empty) {
            return Err(RuleError::InvalidField(field));
        }

        let value = value.into();
        operator.check_literal(&value)?;

        Ok(Self {
            field,
            operator,
            value,
        })
    }

    /// Dotted path into the evaluation context
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &Literal {
        &self.value
    }
}

/// What the consumer should do with an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Informational
    Alert,
    /// Hard stop
    Block,
    /// Non-blocking recommendation
    Suggest,
}

/// One alert template emitted when a rule fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Action {
    pub fn new(kind: ActionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn alert(message: impl Into<String>) -> Self {
        Self::new(ActionKind::Alert, message)
    }

    pub fn block(message: impl Into<String>) -> Self {
        Self::new(ActionKind::Block, message)
    }

    pub fn suggest(message: impl Into<String>) -> Self {
        Self::new(ActionKind::Suggest, message)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// A declarative decision-support rule
///
/// Conditions are ANDed. A rule with no conditions fires on every
/// evaluation while enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    id: String,
    name: String,
    category: Category,
    priority: Priority,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evidence_link: Option<String>,
    enabled: bool,
}

#[derive(Deserialize)]
struct RawRule {
    id: String,
    name: String,
    category: Category,
    priority: Priority,
    #[serde(default)]
    conditions: Vec<Condition>,
    #[serde(default)]
    actions: Vec<Action>,
    #[serde(default)]
    evidence_link: Option<String>,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl TryFrom<RawRule> for Rule {
    type Error = RuleError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let mut rule = Rule::new(raw.id, raw.name, raw.category, raw.priority)?;
        rule.conditions = raw.conditions;
        rule.actions = raw.actions;
        rule.evidence_link = raw.evidence_link;
        rule.enabled = raw.enabled;
        Ok(rule)
    }
}

impl Rule {
    /// Create an enabled rule with no conditions or actions yet
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        priority: Priority,
    ) -> Result<Self, RuleError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RuleError::EmptyId);
        }

        Ok(Self {
            id,
            name: name.into(),
            category,
            priority,
            conditions: Vec::new(),
            actions: Vec::new(),
            evidence_link: None,
            enabled: true,
        })
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_evidence_link(mut self, link: impl Into<String>) -> Self {
        self.evidence_link = Some(link.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn evidence_link(&self) -> Option<&str> {
        self.evidence_link.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
