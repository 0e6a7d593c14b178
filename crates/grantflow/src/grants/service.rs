use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::domain::{
    Allocation, AllocationId, Answer, Applicant, ApplicantId, Program, ProgramId, Question,
    QuestionId, QuestionKind, Resource, ResourceId, ReviewerId, Score,
};
use super::provisioning::{generate_join_code, unique_slug};
use super::repository::{
    GrantRepository, NotificationError, NotificationPublisher, ProgramNotification,
    RepositoryError,
};
use super::validation::{self, FieldError, FieldValue};
use super::views::{ApplicantDetailView, ApplicantSummaryView, ProgramView, ResourceView};

/// Service composing provisioning, intake validation, scoring, and the
/// allocation ledger over a storage backend and a notification hook.
pub struct GrantProgramService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
}

static PROGRAM_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static QUESTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APPLICANT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static RESOURCE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static ALLOCATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id(sequence: &AtomicU64, prefix: &str) -> String {
    let id = sequence.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

/// Incoming question payload; the id and display order are assigned here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub prompt: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub required: bool,
}

/// A public application submission: identity plus per-question answers keyed
/// by question id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

/// One reviewer's score submission. A `None` score is a valid "no rating".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub reviewer: String,
    pub score: Option<f64>,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDraft {
    pub name: String,
    pub kind: String,
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub resource_id: String,
    pub amount: u32,
}

impl<R, N> GrantProgramService<R, N>
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>) -> Self {
        Self {
            repository,
            notifications,
        }
    }

    fn program_by_slug(&self, slug: &str) -> Result<Program, GrantServiceError> {
        Ok(self
            .repository
            .program_by_slug(slug)?
            .ok_or(RepositoryError::NotFound)?)
    }

    fn applicant_in_program(
        &self,
        program: &Program,
        applicant_id: &ApplicantId,
    ) -> Result<Applicant, GrantServiceError> {
        let applicant = self
            .repository
            .applicant(applicant_id)?
            .ok_or(RepositoryError::NotFound)?;
        if applicant.program_id != program.id {
            return Err(RepositoryError::NotFound.into());
        }
        Ok(applicant)
    }

    /// Provision a program: derive a unique slug from the name and generate
    /// a join code, regenerating until the code is globally unique.
    pub fn create_program(&self, name: &str) -> Result<Program, GrantServiceError> {
        let registry =
            validation::ValidationRegistry::new().register("name", validation::required_text);
        let mut fields = BTreeMap::new();
        fields.insert("name", FieldValue::Text(name.to_string()));
        registry
            .validate(&fields)
            .map_err(GrantServiceError::Validation)?;

        let slug = unique_slug(name, |candidate| self.repository.slug_exists(candidate))?;

        let mut join_code = generate_join_code();
        while self.repository.join_code_exists(&join_code)? {
            join_code = generate_join_code();
        }

        let program = Program {
            id: ProgramId(next_id(&PROGRAM_SEQUENCE, "prog")),
            name: name.trim().to_string(),
            slug,
            join_code,
            members: Default::default(),
        };

        Ok(self.repository.insert_program(program)?)
    }

    /// Self-registration: a reviewer presenting the secret join code becomes
    /// a member of the program.
    pub fn join_program(
        &self,
        join_code: &str,
        reviewer: ReviewerId,
    ) -> Result<Program, GrantServiceError> {
        let mut program = self
            .repository
            .program_by_join_code(join_code.trim())?
            .ok_or(RepositoryError::NotFound)?;
        program.members.insert(reviewer);
        self.repository.update_program(program.clone())?;
        Ok(program)
    }

    pub fn program_view(&self, slug: &str) -> Result<ProgramView, GrantServiceError> {
        let program = self.program_by_slug(slug)?;
        Ok(ProgramView::from_program(&program))
    }

    pub fn questions(&self, slug: &str) -> Result<Vec<Question>, GrantServiceError> {
        let program = self.program_by_slug(slug)?;
        Ok(self.repository.questions(&program.id)?)
    }

    /// Add a question at the end of the display order.
    pub fn add_question(
        &self,
        slug: &str,
        draft: QuestionDraft,
    ) -> Result<Question, GrantServiceError> {
        let program = self.program_by_slug(slug)?;
        let order = self
            .repository
            .questions(&program.id)?
            .iter()
            .map(|question| question.order)
            .max()
            .unwrap_or(0)
            + 1;

        let question = Question {
            id: QuestionId(next_id(&QUESTION_SEQUENCE, "ques")),
            program_id: program.id,
            prompt: draft.prompt,
            kind: draft.kind,
            required: draft.required,
            order,
        };
        Ok(self.repository.insert_question(question)?)
    }

    /// Edit a question. The kind is immutable once any answer references the
    /// question.
    pub fn update_question(
        &self,
        slug: &str,
        question_id: &QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, GrantServiceError> {
        let program = self.program_by_slug(slug)?;
        let mut question = self
            .repository
            .question(question_id)?
            .filter(|question| question.program_id == program.id)
            .ok_or(RepositoryError::NotFound)?;

        if draft.kind != question.kind && self.repository.question_has_answers(question_id)? {
            return Err(GrantServiceError::Validation(vec![FieldError::new(
                "type",
                "Cannot change once this question has answers",
            )]));
        }

        question.prompt = draft.prompt;
        question.kind = draft.kind;
        question.required = draft.required;
        self.repository.update_question(question.clone())?;
        Ok(question)
    }

    pub fn delete_question(
        &self,
        slug: &str,
        question_id: &QuestionId,
    ) -> Result<(), GrantServiceError> {
        let program = self.program_by_slug(slug)?;
        let question = self
            .repository
            .question(question_id)?
            .filter(|question| question.program_id == program.id)
            .ok_or(RepositoryError::NotFound)?;

        if self.repository.question_has_answers(&question.id)? {
            return Err(GrantServiceError::Validation(vec![FieldError::new(
                "question",
                "Cannot delete a question that already has answers.",
            )]));
        }

        Ok(self.repository.delete_question(&question.id)?)
    }

    /// Public intake: validate the submission, create the applicant with
    /// their answers, and notify the program.
    pub fn apply(
        &self,
        slug: &str,
        submission: ApplicationSubmission,
    ) -> Result<Applicant, GrantServiceError> {
        let program = self.program_by_slug(slug)?;

        let mut fields = BTreeMap::new();
        fields.insert("name", FieldValue::Text(submission.name.clone()));
        fields.insert("email", FieldValue::Text(submission.email.clone()));
        let mut errors = match validation::application_form().validate(&fields) {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };

        let email = submission.email.trim().to_string();
        if !email.is_empty() && self.repository.applicant_email_exists(&program.id, &email)? {
            errors.push(FieldError::new(
                "email",
                "An application with that email address has already been submitted.",
            ));
        }

        let questions = self.repository.questions(&program.id)?;
        for question in &questions {
            if !question.required {
                continue;
            }
            let blank = submission
                .answers
                .get(&question.id.0)
                .map(|answer| answer.trim().is_empty())
                .unwrap_or(true);
            if blank {
                errors.push(FieldError::new(
                    format!("question-{}", question.id.0),
                    "This field is required.",
                ));
            }
        }

        if !errors.is_empty() {
            return Err(GrantServiceError::Validation(errors));
        }

        let applicant = Applicant {
            id: ApplicantId(next_id(&APPLICANT_SEQUENCE, "appl")),
            program_id: program.id.clone(),
            name: submission.name.trim().to_string(),
            email,
            applied_at: Utc::now(),
        };

        let answers = questions
            .iter()
            .filter_map(|question| {
                submission
                    .answers
                    .get(&question.id.0)
                    .filter(|answer| !answer.trim().is_empty())
                    .map(|answer| Answer {
                        applicant_id: applicant.id.clone(),
                        question_id: question.id.clone(),
                        answer: answer.clone(),
                    })
            })
            .collect();

        let stored = self.repository.insert_applicant(applicant, answers)?;

        let mut details = BTreeMap::new();
        details.insert("name".to_string(), stored.name.clone());
        details.insert("email".to_string(), stored.email.clone());
        self.notifications.publish(ProgramNotification {
            template: "application_received".to_string(),
            program_id: program.id,
            details,
        })?;

        Ok(stored)
    }

    pub fn applicant_summaries(
        &self,
        slug: &str,
    ) -> Result<Vec<ApplicantSummaryView>, GrantServiceError> {
        let program = self.program_by_slug(slug)?;
        let mut summaries = Vec::new();
        for applicant in self.repository.applicants(&program.id)? {
            let scores = self.repository.scores(&applicant.id)?;
            summaries.push(ApplicantSummaryView::build(&applicant, scores));
        }
        Ok(summaries)
    }

    pub fn applicant_detail(
        &self,
        slug: &str,
        applicant_id: &ApplicantId,
    ) -> Result<ApplicantDetailView, GrantServiceError> {
        let program = self.program_by_slug(slug)?;
        let applicant = self.applicant_in_program(&program, applicant_id)?;
        let answers = self.repository.answers(&applicant.id)?;
        let scores = self.repository.scores(&applicant.id)?;
        let allocations = self.repository.allocations_for_applicant(&applicant.id)?;
        Ok(ApplicantDetailView::build(
            &applicant,
            answers,
            scores,
            allocations,
        ))
    }

    /// Create or update the reviewer's score for an applicant. On update the
    /// prior non-null value is appended to the history string before being
    /// overwritten; a rejected submission leaves the record untouched.
    pub fn submit_score(
        &self,
        slug: &str,
        applicant_id: &ApplicantId,
        submission: ScoreSubmission,
    ) -> Result<Score, GrantServiceError> {
        let program = self.program_by_slug(slug)?;
        let reviewer = ReviewerId(submission.reviewer.clone());
        if !program.user_allowed(&reviewer) {
            return Err(GrantServiceError::NotAMember);
        }
        let applicant = self.applicant_in_program(&program, applicant_id)?;

        let mut fields = BTreeMap::new();
        fields.insert("score", FieldValue::from_optional_number(submission.score));
        validation::score_form()
            .validate(&fields)
            .map_err(GrantServiceError::Validation)?;

        let mut score = match self.repository.score(&applicant.id, &reviewer)? {
            Some(mut existing) => {
                if let Some(prior) = existing.value {
                    existing.push_history(prior);
                }
                existing
            }
            None => Score::new(applicant.id.clone(), reviewer),
        };
        score.value = submission.score;
        score.comment = submission.comment;

        self.repository.upsert_score(score.clone())?;
        Ok(score)
    }

    pub fn create_resource(
        &self,
        slug: &str,
        draft: ResourceDraft,
    ) -> Result<Resource, GrantServiceError> {
        let program = self.program_by_slug(slug)?;
        let resource = Resource {
            id: ResourceId(next_id(&RESOURCE_SEQUENCE, "rsrc")),
            program_id: program.id,
            name: draft.name,
            kind: draft.kind,
            amount: draft.amount,
        };
        Ok(self.repository.insert_resource(resource)?)
    }

    pub fn resource_summaries(&self, slug: &str) -> Result<Vec<ResourceView>, GrantServiceError> {
        let program = self.program_by_slug(slug)?;
        let mut views = Vec::new();
        for resource in self.repository.resources(&program.id)? {
            let allocations = self.repository.allocations_for_resource(&resource.id)?;
            views.push(ResourceView::build(&resource, &allocations));
        }
        Ok(views)
    }

    /// Grant an amount of a resource to an applicant. At most one allocation
    /// may exist per (applicant, resource); total capacity is advisory and
    /// not enforced here.
    pub fn allocate(
        &self,
        slug: &str,
        applicant_id: &ApplicantId,
        request: AllocationRequest,
    ) -> Result<Allocation, GrantServiceError> {
        let program = self.program_by_slug(slug)?;
        let applicant = self.applicant_in_program(&program, applicant_id)?;

        let resource_id = ResourceId(request.resource_id);
        let resource = self
            .repository
            .resource(&resource_id)?
            .filter(|resource| resource.program_id == program.id);
        if resource.is_none() {
            return Err(GrantServiceError::Validation(vec![FieldError::new(
                "resource",
                "Select a resource that belongs to this program.",
            )]));
        }

        let existing = self.repository.allocations_for_applicant(&applicant.id)?;
        if existing
            .iter()
            .any(|allocation| allocation.resource_id == resource_id)
        {
            return Err(GrantServiceError::Validation(vec![FieldError::new(
                "resource",
                "That resource is already allocated. Delete it if you wish to change it.",
            )]));
        }

        let allocation = Allocation {
            id: AllocationId(next_id(&ALLOCATION_SEQUENCE, "aloc")),
            applicant_id: applicant.id,
            resource_id,
            amount: request.amount,
        };
        Ok(self.repository.insert_allocation(allocation)?)
    }

    /// Remove an allocation, freeing the (applicant, resource) pair for a
    /// replacement grant.
    pub fn deallocate(
        &self,
        slug: &str,
        applicant_id: &ApplicantId,
        allocation_id: &AllocationId,
    ) -> Result<(), GrantServiceError> {
        let program = self.program_by_slug(slug)?;
        let applicant = self.applicant_in_program(&program, applicant_id)?;

        let owned = self
            .repository
            .allocations_for_applicant(&applicant.id)?
            .iter()
            .any(|allocation| &allocation.id == allocation_id);
        if !owned {
            return Err(RepositoryError::NotFound.into());
        }

        Ok(self.repository.delete_allocation(allocation_id)?)
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error raised by the grant program service.
#[derive(Debug, thiserror::Error)]
pub enum GrantServiceError {
    #[error("invalid submission: {}", summarize(.0))]
    Validation(Vec<FieldError>),
    #[error("reviewer is not a member of this program")]
    NotAMember,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
