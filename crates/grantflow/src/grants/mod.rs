//! Grant program domain: provisioning, question management, applicant
//! intake, reviewer scoring with history, and resource-allocation
//! accounting.

pub mod domain;
pub mod intake;
pub mod provisioning;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    Allocation, AllocationId, Answer, Applicant, ApplicantId, Program, ProgramId, Question,
    QuestionId, QuestionKind, Resource, ResourceId, ReviewerId, Score,
};
pub use intake::{BulkImportError, BulkImportRequest, BulkImporter, ColumnMapping, ImportReport};
pub use repository::{
    GrantRepository, NotificationError, NotificationPublisher, ProgramNotification,
    RepositoryError,
};
pub use router::grant_router;
pub use scoring::ScoreSheet;
pub use service::{
    AllocationRequest, ApplicationSubmission, GrantProgramService, GrantServiceError,
    QuestionDraft, ResourceDraft, ScoreSubmission,
};
pub use validation::{FieldError, FieldValue, ValidationRegistry};
pub use views::{ApplicantDetailView, ApplicantSummaryView, ProgramView, ResourceView, ScoreView};
