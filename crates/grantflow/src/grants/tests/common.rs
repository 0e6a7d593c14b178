use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::grants::domain::{
    Allocation, AllocationId, Answer, Applicant, ApplicantId, Program, ProgramId, Question,
    QuestionId, QuestionKind, Resource, ResourceId, ReviewerId, Score,
};
use crate::grants::repository::{
    GrantRepository, NotificationError, NotificationPublisher, ProgramNotification,
    RepositoryError,
};
use crate::grants::service::{ApplicationSubmission, GrantProgramService, QuestionDraft};

/// Vec-backed test double; linear scans are fine at test sizes.
#[derive(Default)]
struct MemoryStore {
    programs: Vec<Program>,
    questions: Vec<Question>,
    applicants: Vec<Applicant>,
    answers: Vec<Answer>,
    scores: Vec<Score>,
    resources: Vec<Resource>,
    allocations: Vec<Allocation>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    store: Arc<Mutex<MemoryStore>>,
}

impl MemoryRepository {
    fn with_store<T>(&self, body: impl FnOnce(&mut MemoryStore) -> T) -> T {
        let mut guard = self.store.lock().expect("repository mutex poisoned");
        body(&mut guard)
    }
}

impl GrantRepository for MemoryRepository {
    fn insert_program(&self, program: Program) -> Result<Program, RepositoryError> {
        self.with_store(|store| {
            if store.programs.iter().any(|existing| {
                existing.slug == program.slug || existing.join_code == program.join_code
            }) {
                return Err(RepositoryError::Conflict);
            }
            store.programs.push(program.clone());
            Ok(program)
        })
    }

    fn update_program(&self, program: Program) -> Result<(), RepositoryError> {
        self.with_store(|store| {
            let slot = store
                .programs
                .iter_mut()
                .find(|existing| existing.id == program.id)
                .ok_or(RepositoryError::NotFound)?;
            *slot = program;
            Ok(())
        })
    }

    fn program_by_slug(&self, slug: &str) -> Result<Option<Program>, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .programs
                .iter()
                .find(|program| program.slug == slug)
                .cloned())
        })
    }

    fn program_by_join_code(&self, code: &str) -> Result<Option<Program>, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .programs
                .iter()
                .find(|program| program.join_code == code)
                .cloned())
        })
    }

    fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError> {
        self.with_store(|store| Ok(store.programs.iter().any(|program| program.slug == slug)))
    }

    fn join_code_exists(&self, code: &str) -> Result<bool, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .programs
                .iter()
                .any(|program| program.join_code == code))
        })
    }

    fn insert_question(&self, question: Question) -> Result<Question, RepositoryError> {
        self.with_store(|store| {
            store.questions.push(question.clone());
            Ok(question)
        })
    }

    fn update_question(&self, question: Question) -> Result<(), RepositoryError> {
        self.with_store(|store| {
            let slot = store
                .questions
                .iter_mut()
                .find(|existing| existing.id == question.id)
                .ok_or(RepositoryError::NotFound)?;
            *slot = question;
            Ok(())
        })
    }

    fn delete_question(&self, id: &QuestionId) -> Result<(), RepositoryError> {
        self.with_store(|store| {
            let before = store.questions.len();
            store.questions.retain(|question| &question.id != id);
            if store.questions.len() == before {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
    }

    fn question(&self, id: &QuestionId) -> Result<Option<Question>, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .questions
                .iter()
                .find(|question| &question.id == id)
                .cloned())
        })
    }

    fn questions(&self, program_id: &ProgramId) -> Result<Vec<Question>, RepositoryError> {
        self.with_store(|store| {
            let mut questions: Vec<Question> = store
                .questions
                .iter()
                .filter(|question| &question.program_id == program_id)
                .cloned()
                .collect();
            questions.sort_by_key(|question| question.order);
            Ok(questions)
        })
    }

    fn question_has_answers(&self, id: &QuestionId) -> Result<bool, RepositoryError> {
        self.with_store(|store| Ok(store.answers.iter().any(|answer| &answer.question_id == id)))
    }

    fn insert_applicant(
        &self,
        applicant: Applicant,
        answers: Vec<Answer>,
    ) -> Result<Applicant, RepositoryError> {
        self.with_store(|store| {
            store.applicants.push(applicant.clone());
            store.answers.extend(answers);
            Ok(applicant)
        })
    }

    fn applicant(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .applicants
                .iter()
                .find(|applicant| &applicant.id == id)
                .cloned())
        })
    }

    fn applicants(&self, program_id: &ProgramId) -> Result<Vec<Applicant>, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .applicants
                .iter()
                .filter(|applicant| &applicant.program_id == program_id)
                .cloned()
                .collect())
        })
    }

    fn applicant_email_exists(
        &self,
        program_id: &ProgramId,
        email: &str,
    ) -> Result<bool, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .applicants
                .iter()
                .any(|applicant| &applicant.program_id == program_id && applicant.email == email))
        })
    }

    fn answers(&self, applicant_id: &ApplicantId) -> Result<Vec<Answer>, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .answers
                .iter()
                .filter(|answer| &answer.applicant_id == applicant_id)
                .cloned()
                .collect())
        })
    }

    fn score(
        &self,
        applicant_id: &ApplicantId,
        reviewer_id: &ReviewerId,
    ) -> Result<Option<Score>, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .scores
                .iter()
                .find(|score| {
                    &score.applicant_id == applicant_id && &score.reviewer_id == reviewer_id
                })
                .cloned())
        })
    }

    fn scores(&self, applicant_id: &ApplicantId) -> Result<Vec<Score>, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .scores
                .iter()
                .filter(|score| &score.applicant_id == applicant_id)
                .cloned()
                .collect())
        })
    }

    fn upsert_score(&self, score: Score) -> Result<(), RepositoryError> {
        self.with_store(|store| {
            store.scores.retain(|existing| {
                !(existing.applicant_id == score.applicant_id
                    && existing.reviewer_id == score.reviewer_id)
            });
            store.scores.push(score);
            Ok(())
        })
    }

    fn insert_resource(&self, resource: Resource) -> Result<Resource, RepositoryError> {
        self.with_store(|store| {
            store.resources.push(resource.clone());
            Ok(resource)
        })
    }

    fn resource(&self, id: &ResourceId) -> Result<Option<Resource>, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .resources
                .iter()
                .find(|resource| &resource.id == id)
                .cloned())
        })
    }

    fn resources(&self, program_id: &ProgramId) -> Result<Vec<Resource>, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .resources
                .iter()
                .filter(|resource| &resource.program_id == program_id)
                .cloned()
                .collect())
        })
    }

    fn insert_allocation(&self, allocation: Allocation) -> Result<Allocation, RepositoryError> {
        self.with_store(|store| {
            store.allocations.push(allocation.clone());
            Ok(allocation)
        })
    }

    fn delete_allocation(&self, id: &AllocationId) -> Result<(), RepositoryError> {
        self.with_store(|store| {
            let before = store.allocations.len();
            store.allocations.retain(|allocation| &allocation.id != id);
            if store.allocations.len() == before {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
    }

    fn allocations_for_resource(
        &self,
        resource_id: &ResourceId,
    ) -> Result<Vec<Allocation>, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .allocations
                .iter()
                .filter(|allocation| &allocation.resource_id == resource_id)
                .cloned()
                .collect())
        })
    }

    fn allocations_for_applicant(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Vec<Allocation>, RepositoryError> {
        self.with_store(|store| {
            Ok(store
                .allocations
                .iter()
                .filter(|allocation| &allocation.applicant_id == applicant_id)
                .cloned()
                .collect())
        })
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<ProgramNotification>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<ProgramNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifier {
    fn publish(&self, notification: ProgramNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) type TestService = GrantProgramService<MemoryRepository, MemoryNotifier>;

pub(super) fn build_service() -> (Arc<TestService>, MemoryRepository, MemoryNotifier) {
    let repository = MemoryRepository::default();
    let notifier = MemoryNotifier::default();
    let service = Arc::new(GrantProgramService::new(
        Arc::new(repository.clone()),
        Arc::new(notifier.clone()),
    ));
    (service, repository, notifier)
}

/// Program with one member reviewer, ready for scoring tests.
pub(super) fn seeded_program(service: &TestService, reviewer: &str) -> Program {
    let program = service
        .create_program("Test Program")
        .expect("program created");
    service
        .join_program(&program.join_code, ReviewerId(reviewer.to_string()))
        .expect("reviewer joins")
}

pub(super) fn submission(name: &str, email: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        name: name.to_string(),
        email: email.to_string(),
        answers: BTreeMap::new(),
    }
}

pub(super) fn text_question(prompt: &str, required: bool) -> QuestionDraft {
    QuestionDraft {
        prompt: prompt.to_string(),
        kind: QuestionKind::Text,
        required,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
