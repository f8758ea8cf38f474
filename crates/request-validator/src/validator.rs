//! Request Validator

use crate::error::ValidationError;
use cdss_engine::EvaluationRequest;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject requests without any patient data
    pub require_patient_data: bool,
    /// Maximum medication records per request
    pub max_medications: usize,
    /// Maximum diagnosis records per request
    pub max_conditions: usize,
    /// Maximum lab results per request
    pub max_lab_results: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_patient_data: true,
            max_medications: 200,
            max_conditions: 200,
            max_lab_results: 1000,
        }
    }
}

/// Result of validation
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Whether the request can be evaluated
    pub valid: bool,
    /// Every problem found
    pub errors: Vec<ValidationError>,
    /// Number of records inspected
    pub records_checked: usize,
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>, records_checked: usize) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            records_checked,
        }
    }
}

/// Validator for evaluation requests
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Check a whole request, collecting all errors
    pub fn validate(&self, request: &EvaluationRequest) -> ValidationResult {
        let mut errors = Vec::new();

        if let Err(e) = self.validate_patient(request) {
            errors.push(e);
        }

        let names = request.medications.iter().map(|m| m.name.as_str());
        errors.extend(self.validate_records(
            "medications",
            names,
            self.config.max_medications,
            "name is blank",
        ));

        let names = request.conditions.iter().map(|c| c.name.as_str());
        errors.extend(self.validate_records(
            "conditions",
            names,
            self.config.max_conditions,
            "name is blank",
        ));

        let codes = request.lab_results.iter().map(|l| l.code.as_str());
        errors.extend(self.validate_records(
            "lab_results",
            codes,
            self.config.max_lab_results,
            "code is blank",
        ));

        let records_checked =
            request.medications.len() + request.conditions.len() + request.lab_results.len();
        if !errors.is_empty() {
            debug!("Request rejected with {} validation errors", errors.len());
        }

        ValidationResult::from_errors(errors, records_checked)
    }

    /// Validate presence of patient data
    pub fn validate_patient(&self, request: &EvaluationRequest) -> Result<(), ValidationError> {
        if self.config.require_patient_data && request.patient_data.is_empty() {
            Err(ValidationError::MissingField {
                field: "patient_data",
            })
        } else {
            Ok(())
        }
    }

    fn validate_records<'a>(
        &self,
        field: &'static str,
        keys: impl ExactSizeIterator<Item = &'a str>,
        max: usize,
        blank_reason: &str,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let count = keys.len();
        if count > max {
            errors.push(ValidationError::TooMany { field, count, max });
        }

        for (index, key) in keys.enumerate() {
            if key.trim().is_empty() {
                errors.push(ValidationError::InvalidRecord {
                    field,
                    index,
                    reason: blank_reason.to_string(),
                });
            }
        }

        errors
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdss_engine::{Diagnosis, Medication};
    use proptest::prelude::*;

    fn patient() -> EvaluationRequest {
        EvaluationRequest::new().with_patient("age", 54)
    }

    #[test]
    fn test_valid_request() {
        let request = patient()
            .with_medication(Medication::named("Metformin"))
            .with_condition(Diagnosis::new("Type 2 diabetes mellitus", Some("E11.9")))
            .with_lab("HbA1c", 7.9);

        let result = Validator::default().validate(&request);
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.records_checked, 3);
    }

    #[test]
    fn test_missing_patient_data() {
        let result = Validator::default().validate(&EvaluationRequest::new());
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![ValidationError::MissingField {
                field: "patient_data"
            }]
        );
    }

    #[test]
    fn test_patient_data_optional() {
        let validator = Validator::new(ValidationConfig {
            require_patient_data: false,
            ..Default::default()
        });
        assert!(validator.validate(&EvaluationRequest::new()).valid);
    }

    #[test]
    fn test_blank_records_collected() {
        let request = patient()
            .with_medication(Medication::named("Warfarin"))
            .with_medication(Medication::named("  "))
            .with_condition(Diagnosis::new("", Some("I10")))
            .with_lab("", 1.0);

        let result = Validator::default().validate(&request);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 3);
        assert!(matches!(
            &result.errors[0],
            ValidationError::InvalidRecord { field: "medications", index: 1, .. }
        ));
        assert!(result.errors[2].to_string().contains("lab_results[0]"));
    }

    #[test]
    fn test_collection_limits() {
        let validator = Validator::new(ValidationConfig {
            max_lab_results: 2,
            ..Default::default()
        });
        let request = patient().with_lab("A", 1).with_lab("B", 2).with_lab("C", 3);

        let result = validator.validate(&request);
        assert_eq!(
            result.errors,
            vec![ValidationError::TooMany {
                field: "lab_results",
                count: 3,
                max: 2
            }]
        );
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_value(ValidationError::MissingField {
            field: "patient_data",
        })
        .unwrap();
        assert_eq!(json["kind"], "missing_field");
        assert_eq!(json["field"], "patient_data");
    }

    proptest! {
        #[test]
        fn prop_named_records_always_pass(names in proptest::collection::vec("[a-z]{1,12}", 0..20)) {
            let mut request = patient();
            for name in &names {
                request = request.with_medication(Medication::named(name.clone()));
            }
            let result = Validator::default().validate(&request);
            prop_assert!(result.valid);
            prop_assert_eq!(result.records_checked, names.len());
        }
    }
}
