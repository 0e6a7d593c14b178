use grantflow::config::NotificationConfig;
use grantflow::grants::{
    Allocation, AllocationId, Answer, Applicant, ApplicantId, GrantRepository, NotificationError,
    NotificationPublisher, Program, ProgramId, ProgramNotification, Question, QuestionId,
    RepositoryError, Resource, ResourceId, ReviewerId, Score,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct GrantStore {
    programs: HashMap<ProgramId, Program>,
    questions: HashMap<QuestionId, Question>,
    applicants: HashMap<ApplicantId, Applicant>,
    answers: HashMap<ApplicantId, Vec<Answer>>,
    scores: HashMap<(ApplicantId, ReviewerId), Score>,
    resources: HashMap<ResourceId, Resource>,
    allocations: HashMap<AllocationId, Allocation>,
}

/// Process-local storage backend. A relational store can replace this
/// behind the same trait without touching the service layer.
#[derive(Default, Clone)]
pub(crate) struct InMemoryGrantRepository {
    store: Arc<Mutex<GrantStore>>,
}

impl InMemoryGrantRepository {
    fn guard(&self) -> MutexGuard<'_, GrantStore> {
        self.store.lock().expect("repository mutex poisoned")
    }
}

impl GrantRepository for InMemoryGrantRepository {
    fn insert_program(&self, program: Program) -> Result<Program, RepositoryError> {
        let mut guard = self.guard();
        if guard.programs.contains_key(&program.id)
            || guard.programs.values().any(|existing| {
                existing.slug == program.slug || existing.join_code == program.join_code
            })
        {
            return Err(RepositoryError::Conflict);
        }
        guard.programs.insert(program.id.clone(), program.clone());
        Ok(program)
    }

    fn update_program(&self, program: Program) -> Result<(), RepositoryError> {
        let mut guard = self.guard();
        if guard.programs.contains_key(&program.id) {
            guard.programs.insert(program.id.clone(), program);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn program_by_slug(&self, slug: &str) -> Result<Option<Program>, RepositoryError> {
        let guard = self.guard();
        Ok(guard
            .programs
            .values()
            .find(|program| program.slug == slug)
            .cloned())
    }

    fn program_by_join_code(&self, code: &str) -> Result<Option<Program>, RepositoryError> {
        let guard = self.guard();
        Ok(guard
            .programs
            .values()
            .find(|program| program.join_code == code)
            .cloned())
    }

    fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError> {
        Ok(self.guard().programs.values().any(|p| p.slug == slug))
    }

    fn join_code_exists(&self, code: &str) -> Result<bool, RepositoryError> {
        Ok(self.guard().programs.values().any(|p| p.join_code == code))
    }

    fn insert_question(&self, question: Question) -> Result<Question, RepositoryError> {
        let mut guard = self.guard();
        if guard.questions.contains_key(&question.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.questions.insert(question.id.clone(), question.clone());
        Ok(question)
    }

    fn update_question(&self, question: Question) -> Result<(), RepositoryError> {
        let mut guard = self.guard();
        if guard.questions.contains_key(&question.id) {
            guard.questions.insert(question.id.clone(), question);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn delete_question(&self, id: &QuestionId) -> Result<(), RepositoryError> {
        let mut guard = self.guard();
        match guard.questions.remove(id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn question(&self, id: &QuestionId) -> Result<Option<Question>, RepositoryError> {
        Ok(self.guard().questions.get(id).cloned())
    }

    fn questions(&self, program_id: &ProgramId) -> Result<Vec<Question>, RepositoryError> {
        let guard = self.guard();
        let mut questions: Vec<Question> = guard
            .questions
            .values()
            .filter(|question| &question.program_id == program_id)
            .cloned()
            .collect();
        questions.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(questions)
    }

    fn question_has_answers(&self, id: &QuestionId) -> Result<bool, RepositoryError> {
        let guard = self.guard();
        Ok(guard
            .answers
            .values()
            .flatten()
            .any(|answer| &answer.question_id == id))
    }

    fn insert_applicant(
        &self,
        applicant: Applicant,
        answers: Vec<Answer>,
    ) -> Result<Applicant, RepositoryError> {
        let mut guard = self.guard();
        if guard.applicants.contains_key(&applicant.id) {
            return Err(RepositoryError::Conflict);
        }
        guard
            .applicants
            .insert(applicant.id.clone(), applicant.clone());
        guard.answers.insert(applicant.id.clone(), answers);
        Ok(applicant)
    }

    fn applicant(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        Ok(self.guard().applicants.get(id).cloned())
    }

    fn applicants(&self, program_id: &ProgramId) -> Result<Vec<Applicant>, RepositoryError> {
        let guard = self.guard();
        let mut applicants: Vec<Applicant> = guard
            .applicants
            .values()
            .filter(|applicant| &applicant.program_id == program_id)
            .cloned()
            .collect();
        applicants.sort_by(|a, b| a.applied_at.cmp(&b.applied_at).then_with(|| a.id.cmp(&b.id)));
        Ok(applicants)
    }

    fn applicant_email_exists(
        &self,
        program_id: &ProgramId,
        email: &str,
    ) -> Result<bool, RepositoryError> {
        let guard = self.guard();
        Ok(guard
            .applicants
            .values()
            .any(|applicant| &applicant.program_id == program_id && applicant.email == email))
    }

    fn answers(&self, applicant_id: &ApplicantId) -> Result<Vec<Answer>, RepositoryError> {
        Ok(self.guard().answers.get(applicant_id).cloned().unwrap_or_default())
    }

    fn score(
        &self,
        applicant_id: &ApplicantId,
        reviewer_id: &ReviewerId,
    ) -> Result<Option<Score>, RepositoryError> {
        let key = (applicant_id.clone(), reviewer_id.clone());
        Ok(self.guard().scores.get(&key).cloned())
    }

    fn scores(&self, applicant_id: &ApplicantId) -> Result<Vec<Score>, RepositoryError> {
        let guard = self.guard();
        let mut scores: Vec<Score> = guard
            .scores
            .values()
            .filter(|score| &score.applicant_id == applicant_id)
            .cloned()
            .collect();
        scores.sort_by(|a, b| a.reviewer_id.cmp(&b.reviewer_id));
        Ok(scores)
    }

    fn upsert_score(&self, score: Score) -> Result<(), RepositoryError> {
        let key = (score.applicant_id.clone(), score.reviewer_id.clone());
        self.guard().scores.insert(key, score);
        Ok(())
    }

    fn insert_resource(&self, resource: Resource) -> Result<Resource, RepositoryError> {
        let mut guard = self.guard();
        if guard.resources.contains_key(&resource.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.resources.insert(resource.id.clone(), resource.clone());
        Ok(resource)
    }

    fn resource(&self, id: &ResourceId) -> Result<Option<Resource>, RepositoryError> {
        Ok(self.guard().resources.get(id).cloned())
    }

    fn resources(&self, program_id: &ProgramId) -> Result<Vec<Resource>, RepositoryError> {
        let guard = self.guard();
        let mut resources: Vec<Resource> = guard
            .resources
            .values()
            .filter(|resource| &resource.program_id == program_id)
            .cloned()
            .collect();
        resources.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(resources)
    }

    fn insert_allocation(&self, allocation: Allocation) -> Result<Allocation, RepositoryError> {
        let mut guard = self.guard();
        if guard.allocations.contains_key(&allocation.id) {
            return Err(RepositoryError::Conflict);
        }
        guard
            .allocations
            .insert(allocation.id.clone(), allocation.clone());
        Ok(allocation)
    }

    fn delete_allocation(&self, id: &AllocationId) -> Result<(), RepositoryError> {
        let mut guard = self.guard();
        match guard.allocations.remove(id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn allocations_for_resource(
        &self,
        resource_id: &ResourceId,
    ) -> Result<Vec<Allocation>, RepositoryError> {
        let guard = self.guard();
        Ok(guard
            .allocations
            .values()
            .filter(|allocation| &allocation.resource_id == resource_id)
            .cloned()
            .collect())
    }

    fn allocations_for_applicant(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Vec<Allocation>, RepositoryError> {
        let guard = self.guard();
        Ok(guard
            .allocations
            .values()
            .filter(|allocation| &allocation.applicant_id == applicant_id)
            .cloned()
            .collect())
    }
}

/// Holds published notifications in a bounded buffer until a delivery
/// worker drains them. Rejects once the configured depth is reached so
/// the caller sees backpressure instead of silent loss. Only `queue_depth`
/// applies here; the retry and timeout settings belong to the worker on
/// the draining side.
pub(crate) struct BufferedNotificationPublisher {
    config: NotificationConfig,
    queue: Mutex<Vec<ProgramNotification>>,
}

impl BufferedNotificationPublisher {
    pub(crate) fn new(config: NotificationConfig) -> Self {
        Self {
            config,
            queue: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn pending(&self) -> Vec<ProgramNotification> {
        self.queue.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for BufferedNotificationPublisher {
    fn publish(&self, notification: ProgramNotification) -> Result<(), NotificationError> {
        let mut queue = self.queue.lock().expect("notification mutex poisoned");
        if queue.len() >= self.config.queue_depth {
            return Err(NotificationError::QueueFull(self.config.queue_depth));
        }
        queue.push(notification);
        Ok(())
    }
}
