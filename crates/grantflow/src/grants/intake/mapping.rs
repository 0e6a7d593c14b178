use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grants::validation::FieldError;

/// Binds CSV columns to intake fields: which column holds the applicant
/// name, which the email, and which column answers each question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub name: String,
    pub email: String,
    /// Question id to source column.
    #[serde(default)]
    pub questions: BTreeMap<String, String>,
}

impl ColumnMapping {
    /// Every mapped target must draw from a distinct source column, and
    /// every named source must exist in the CSV header.
    pub fn validate(&self, headers: &[String]) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        let mut targets: Vec<(String, &str)> = vec![
            ("name".to_string(), self.name.as_str()),
            ("email".to_string(), self.email.as_str()),
        ];
        for (question_id, source) in &self.questions {
            targets.push((format!("question-{question_id}"), source.as_str()));
        }

        for (target, source) in &targets {
            if !headers.iter().any(|header| header == source) {
                errors.push(FieldError::new(
                    target.clone(),
                    format!("Unknown column '{source}' in uploaded CSV."),
                ));
            }
        }

        for (index, (target, source)) in targets.iter().enumerate() {
            for (other_target, other_source) in targets.iter().skip(index + 1) {
                if source == other_source {
                    errors.push(FieldError::new(
                        other_target.clone(),
                        format!(
                            "You cannot choose the same source ({source}) for more than one question ({target} and {other_target})."
                        ),
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
