//! Evaluation Context
//!
//! Flattens a request into a JSON tree that rule conditions address by
//! dotted path:
//!
//! | key                  | contents                                   |
//! |----------------------|--------------------------------------------|
//! | `patient`            | `patient_data` verbatim                    |
//! | `medications`        | lowercased medication names                |
//! | `medication_objects` | medication fields merged by lowercased name |
//! | `conditions`         | diagnosis codes                            |
//! | `conditions_names`   | lowercased diagnosis names                 |
//! | `labs`               | lab code to value, last write wins         |

use crate::request::EvaluationRequest;
use serde_json::{Map, Value};

/// Build the evaluation context for a request
pub fn build_context(request: &EvaluationRequest) -> Value {
    let medications = request
        .medications
        .iter()
        .map(|m| Value::String(m.name.to_lowercase()))
        .collect();

    // repeated names merge field by field, later records winning per field
    let mut medication_objects = Map::new();
    for medication in &request.medications {
        let entry = medication_objects
            .entry(medication.name.to_lowercase())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(record) = entry {
            for (key, value) in &medication.details {
                record.insert(key.clone(), value.clone());
            }
            record.insert("name".to_string(), Value::String(medication.name.clone()));
        }
    }

    let conditions = request
        .conditions
        .iter()
        .filter_map(|c| c.code.clone())
        .map(Value::String)
        .collect();

    let conditions_names = request
        .conditions
        .iter()
        .map(|c| Value::String(c.name.to_lowercase()))
        .collect();

    let mut labs = Map::new();
    for lab in &request.lab_results {
        labs.insert(lab.code.clone(), lab.value.clone());
    }

    let mut root = Map::new();
    root.insert("patient".to_string(), Value::Object(request.patient_data.clone()));
    root.insert("medications".to_string(), Value::Array(medications));
    root.insert("medication_objects".to_string(), Value::Object(medication_objects));
    root.insert("conditions".to_string(), Value::Array(conditions));
    root.insert("conditions_names".to_string(), Value::Array(conditions_names));
    root.insert("labs".to_string(), Value::Object(labs));
    Value::Object(root)
}

/// Resolve a dotted path against the context.
///
/// Returns `None` when a segment is missing, when an intermediate value is
/// not an object, or when the value found is JSON null.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }

    (!current.is_null()).then_some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Diagnosis, Medication};
    use serde_json::json;

    fn sample_request() -> EvaluationRequest {
        EvaluationRequest::new()
            .with_patient("age", 67)
            .with_patient("vitals", json!({"sbp": 150, "hr": 88}))
            .with_medication(Medication::named("Propranolol"))
            .with_medication(Medication::named("Acetaminophen").with("total_daily_dose_mg", 3000))
            .with_condition(Diagnosis::new("Asthma", Some("J45.909")))
            .with_condition(Diagnosis::new("Hypertension", None))
            .with_lab("K", 5.1)
            .with_lab("HbA1c", 7.2)
            .with_lab("K", 6.3)
    }

    #[test]
    fn test_context_shape() {
        let ctx = build_context(&sample_request());

        assert_eq!(ctx["patient"]["age"], json!(67));
        assert_eq!(ctx["medications"], json!(["propranolol", "acetaminophen"]));
        assert_eq!(ctx["conditions"], json!(["J45.909"]));
        assert_eq!(ctx["conditions_names"], json!(["asthma", "hypertension"]));
        assert_eq!(
            ctx["medication_objects"]["acetaminophen"]["total_daily_dose_mg"],
            json!(3000)
        );
        assert_eq!(
            ctx["medication_objects"]["propranolol"]["name"],
            json!("Propranolol")
        );
    }

    #[test]
    fn test_repeated_medication_fields_merge() {
        let request = EvaluationRequest::new()
            .with_medication(Medication::named("Acetaminophen").with("total_daily_dose_mg", 5000))
            .with_medication(
                Medication::named("acetaminophen")
                    .with("route", "iv")
                    .with("frequency", "q6h"),
            )
            .with_medication(Medication::named("ACETAMINOPHEN").with("frequency", "q8h"));
        let ctx = build_context(&request);

        let record = &ctx["medication_objects"]["acetaminophen"];
        assert_eq!(record["total_daily_dose_mg"], json!(5000));
        assert_eq!(record["route"], json!("iv"));
        assert_eq!(record["frequency"], json!("q8h"));
        assert_eq!(record["name"], json!("ACETAMINOPHEN"));
        assert_eq!(ctx["medications"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_labs_last_write_wins() {
        let ctx = build_context(&sample_request());
        assert_eq!(ctx["labs"]["K"], json!(6.3));
        assert_eq!(ctx["labs"]["HbA1c"], json!(7.2));
    }

    #[test]
    fn test_resolve_nested() {
        let ctx = build_context(&sample_request());
        assert_eq!(resolve(&ctx, "patient.vitals.sbp"), Some(&json!(150)));
        assert_eq!(resolve(&ctx, "labs.K"), Some(&json!(6.3)));
        assert!(resolve(&ctx, "medications").unwrap().is_array());
    }

    #[test]
    fn test_resolve_missing() {
        let ctx = build_context(&sample_request());
        assert_eq!(resolve(&ctx, "labs.INR"), None);
        assert_eq!(resolve(&ctx, "patient.weight.kg"), None);
        assert_eq!(resolve(&ctx, "nothing"), None);
    }

    #[test]
    fn test_resolve_through_non_object() {
        let ctx = build_context(&sample_request());
        // age is a number, medications is a list
        assert_eq!(resolve(&ctx, "patient.age.value"), None);
        assert_eq!(resolve(&ctx, "medications.0"), None);
    }

    #[test]
    fn test_resolve_null_is_absent() {
        let ctx = json!({"patient": {"weight": null}});
        assert_eq!(resolve(&ctx, "patient.weight"), None);
    }
}
