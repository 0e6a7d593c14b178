//! Bulk applicant import from CSV exports.
//!
//! Rows flow through the same intake validation as single submissions, so a
//! duplicate email or missing required answer fails that row without
//! aborting the import; malformed CSV or a bad column mapping fails the
//! whole request.

mod mapping;
mod parser;

pub use mapping::ColumnMapping;

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::repository::{GrantRepository, NotificationPublisher};
use super::service::{ApplicationSubmission, GrantProgramService, GrantServiceError};
use super::validation::FieldError;

#[derive(Debug)]
pub enum BulkImportError {
    Csv(csv::Error),
    Mapping(Vec<FieldError>),
    Service(GrantServiceError),
}

impl std::fmt::Display for BulkImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BulkImportError::Csv(err) => write!(f, "invalid CSV data: {}", err),
            BulkImportError::Mapping(errors) => {
                write!(f, "invalid column mapping ({} errors)", errors.len())
            }
            BulkImportError::Service(err) => write!(f, "import failed: {}", err),
        }
    }
}

impl std::error::Error for BulkImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BulkImportError::Csv(err) => Some(err),
            BulkImportError::Mapping(_) => None,
            BulkImportError::Service(err) => Some(err),
        }
    }
}

impl From<csv::Error> for BulkImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<GrantServiceError> for BulkImportError {
    fn from(err: GrantServiceError) -> Self {
        Self::Service(err)
    }
}

impl IntoResponse for BulkImportError {
    fn into_response(self) -> Response {
        match self {
            BulkImportError::Csv(err) => {
                let payload = json!({ "error": format!("invalid CSV data: {err}") });
                (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
            }
            BulkImportError::Mapping(errors) => {
                let payload = json!({ "errors": errors });
                (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
            }
            BulkImportError::Service(error) => {
                let payload = json!({ "error": error.to_string() });
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
            }
        }
    }
}

/// Inline CSV payload plus the column mapping describing it.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkImportRequest {
    pub csv: String,
    pub mapping: ColumnMapping,
}

/// Outcome of a bulk import: how many applicants were created and which
/// rows were rejected by intake validation.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub failures: Vec<RowFailure>,
}

/// A rejected row, numbered from 1 (excluding the header line).
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    pub row: usize,
    pub errors: Vec<FieldError>,
}

pub struct BulkImporter<R, N> {
    service: Arc<GrantProgramService<R, N>>,
}

impl<R, N> BulkImporter<R, N>
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(service: Arc<GrantProgramService<R, N>>) -> Self {
        Self { service }
    }

    pub fn import(
        &self,
        slug: &str,
        request: BulkImportRequest,
    ) -> Result<ImportReport, BulkImportError> {
        let (headers, rows) = parser::parse_rows(Cursor::new(request.csv.into_bytes()))?;
        request
            .mapping
            .validate(&headers)
            .map_err(BulkImportError::Mapping)?;

        let mut created = 0usize;
        let mut failures = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            let lookup = |column: &str| row.get(column).cloned().unwrap_or_default();

            let mut answers = BTreeMap::new();
            for (question_id, column) in &request.mapping.questions {
                answers.insert(question_id.clone(), lookup(column));
            }

            let submission = ApplicationSubmission {
                name: lookup(&request.mapping.name),
                email: lookup(&request.mapping.email),
                answers,
            };

            match self.service.apply(slug, submission) {
                Ok(_) => created += 1,
                Err(GrantServiceError::Validation(errors)) => failures.push(RowFailure {
                    row: index + 1,
                    errors,
                }),
                Err(other) => return Err(other.into()),
            }
        }

        Ok(ImportReport { created, failures })
    }
}
