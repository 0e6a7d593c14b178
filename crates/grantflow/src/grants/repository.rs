use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    Allocation, AllocationId, Answer, Applicant, ApplicantId, Program, ProgramId, Question,
    QuestionId, Resource, ResourceId, ReviewerId, Score,
};

/// Storage abstraction so the service module can be exercised in isolation.
/// Each method is a single-record read or write; transactional coordination
/// beyond that is not part of the contract.
pub trait GrantRepository: Send + Sync {
    fn insert_program(&self, program: Program) -> Result<Program, RepositoryError>;
    fn update_program(&self, program: Program) -> Result<(), RepositoryError>;
    fn program_by_slug(&self, slug: &str) -> Result<Option<Program>, RepositoryError>;
    fn program_by_join_code(&self, code: &str) -> Result<Option<Program>, RepositoryError>;
    fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError>;
    fn join_code_exists(&self, code: &str) -> Result<bool, RepositoryError>;

    fn insert_question(&self, question: Question) -> Result<Question, RepositoryError>;
    fn update_question(&self, question: Question) -> Result<(), RepositoryError>;
    fn delete_question(&self, id: &QuestionId) -> Result<(), RepositoryError>;
    fn question(&self, id: &QuestionId) -> Result<Option<Question>, RepositoryError>;
    /// Questions for a program in display order.
    fn questions(&self, program_id: &ProgramId) -> Result<Vec<Question>, RepositoryError>;
    fn question_has_answers(&self, id: &QuestionId) -> Result<bool, RepositoryError>;

    fn insert_applicant(
        &self,
        applicant: Applicant,
        answers: Vec<Answer>,
    ) -> Result<Applicant, RepositoryError>;
    fn applicant(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError>;
    fn applicants(&self, program_id: &ProgramId) -> Result<Vec<Applicant>, RepositoryError>;
    fn applicant_email_exists(
        &self,
        program_id: &ProgramId,
        email: &str,
    ) -> Result<bool, RepositoryError>;
    fn answers(&self, applicant_id: &ApplicantId) -> Result<Vec<Answer>, RepositoryError>;

    fn score(
        &self,
        applicant_id: &ApplicantId,
        reviewer_id: &ReviewerId,
    ) -> Result<Option<Score>, RepositoryError>;
    fn scores(&self, applicant_id: &ApplicantId) -> Result<Vec<Score>, RepositoryError>;
    /// Last write wins for a given (applicant, reviewer) pair.
    fn upsert_score(&self, score: Score) -> Result<(), RepositoryError>;

    fn insert_resource(&self, resource: Resource) -> Result<Resource, RepositoryError>;
    fn resource(&self, id: &ResourceId) -> Result<Option<Resource>, RepositoryError>;
    fn resources(&self, program_id: &ProgramId) -> Result<Vec<Resource>, RepositoryError>;

    fn insert_allocation(&self, allocation: Allocation) -> Result<Allocation, RepositoryError>;
    fn delete_allocation(&self, id: &AllocationId) -> Result<(), RepositoryError>;
    fn allocations_for_resource(
        &self,
        resource_id: &ResourceId,
    ) -> Result<Vec<Allocation>, RepositoryError>;
    fn allocations_for_applicant(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Vec<Allocation>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Trait describing outbound notification hooks (e-mail adapters and the
/// like); the service publishes events, delivery is someone else's job.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: ProgramNotification) -> Result<(), NotificationError>;
}

/// Notification payload so routes and tests can assert integration
/// boundaries without a live mail transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramNotification {
    pub template: String,
    pub program_id: ProgramId,
    pub details: BTreeMap<String, String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification queue full (depth {0})")]
    QueueFull(usize),
}
