//! Serialized projections returned by the service and router. Statistics are
//! computed at view-build time from the rows passed in; nothing is cached.

use serde::Serialize;

use super::domain::{
    Allocation, Answer, Applicant, ApplicantId, Program, Resource, Score,
};
use super::scoring::ScoreSheet;

/// Public shape of a program, join code withheld.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramView {
    pub name: String,
    pub slug: String,
    pub member_count: usize,
}

impl ProgramView {
    pub fn from_program(program: &Program) -> Self {
        Self {
            name: program.name.clone(),
            slug: program.slug.clone(),
            member_count: program.members.len(),
        }
    }
}

/// List-row projection of an applicant with aggregate score statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantSummaryView {
    pub applicant_id: ApplicantId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    pub variance: f64,
    pub stdev: f64,
    pub reviewed_count: usize,
}

impl ApplicantSummaryView {
    pub fn build(applicant: &Applicant, scores: Vec<Score>) -> Self {
        let sheet = ScoreSheet::new(scores);
        Self {
            applicant_id: applicant.id.clone(),
            name: applicant.name.clone(),
            email: applicant.email.clone(),
            average_score: sheet.average_score(),
            variance: sheet.variance(),
            stdev: sheet.stdev(),
            reviewed_count: sheet.reviewed_count(),
        }
    }
}

/// One reviewer's score as shown on the applicant detail page.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreView {
    pub reviewer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub comment: String,
    pub score_history: String,
}

impl ScoreView {
    pub fn from_score(score: &Score) -> Self {
        Self {
            reviewer: score.reviewer_id.0.clone(),
            score: score.value,
            comment: score.comment.clone(),
            score_history: score.history_human(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerView {
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationView {
    pub allocation_id: String,
    pub resource_id: String,
    pub amount: u32,
}

/// Full applicant record: answers, every reviewer's score, allocations, and
/// the same aggregate statistics as the list view.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantDetailView {
    #[serde(flatten)]
    pub summary: ApplicantSummaryView,
    pub answers: Vec<AnswerView>,
    pub scores: Vec<ScoreView>,
    pub allocations: Vec<AllocationView>,
}

impl ApplicantDetailView {
    pub fn build(
        applicant: &Applicant,
        answers: Vec<Answer>,
        scores: Vec<Score>,
        allocations: Vec<Allocation>,
    ) -> Self {
        let score_views = scores.iter().map(ScoreView::from_score).collect();
        Self {
            summary: ApplicantSummaryView::build(applicant, scores),
            answers: answers
                .into_iter()
                .map(|answer| AnswerView {
                    question_id: answer.question_id.0,
                    answer: answer.answer,
                })
                .collect(),
            scores: score_views,
            allocations: allocations
                .into_iter()
                .map(|allocation| AllocationView {
                    allocation_id: allocation.id.0,
                    resource_id: allocation.resource_id.0,
                    amount: allocation.amount,
                })
                .collect(),
        }
    }
}

/// Resource row with its ledger totals.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    pub resource_id: String,
    pub name: String,
    pub kind: String,
    pub icon: &'static str,
    pub amount: u32,
    pub amount_allocated: u64,
    pub amount_remaining: i64,
}

impl ResourceView {
    pub fn build(resource: &Resource, allocations: &[Allocation]) -> Self {
        Self {
            resource_id: resource.id.0.clone(),
            name: resource.name.clone(),
            kind: resource.kind.clone(),
            icon: resource.fa_icon(),
            amount: resource.amount,
            amount_allocated: resource.amount_allocated(allocations),
            amount_remaining: resource.amount_remaining(allocations),
        }
    }
}
