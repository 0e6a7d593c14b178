use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for grant programs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramId(pub String);

/// Identifier wrapper for application questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(pub String);

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

/// Identifier for a reviewing user. Authentication lives outside this
/// crate; callers hand us an opaque reviewer identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReviewerId(pub String);

/// Identifier wrapper for allocatable resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub String);

/// Identifier wrapper for allocation records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllocationId(pub String);

/// An organization or conference running a grant-application cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    /// Globally unique, URL-safe, derived from the name at provisioning time.
    pub slug: String,
    /// Globally unique 8-character secret letting reviewers self-register.
    pub join_code: String,
    pub members: BTreeSet<ReviewerId>,
}

impl Program {
    pub fn user_allowed(&self, reviewer: &ReviewerId) -> bool {
        self.members.contains(reviewer)
    }
}

/// Supported answer shapes for application questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    Boolean,
}

impl QuestionKind {
    pub const fn label(self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::Boolean => "boolean",
        }
    }
}

/// One question on a program's application form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub program_id: ProgramId,
    pub prompt: String,
    pub kind: QuestionKind,
    pub required: bool,
    pub order: u32,
}

/// A submitted application under review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: ApplicantId,
    pub program_id: ProgramId,
    pub name: String,
    /// Unique within a program, not globally.
    pub email: String,
    pub applied_at: DateTime<Utc>,
}

/// An applicant's free-text answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub applicant_id: ApplicantId,
    pub question_id: QuestionId,
    pub answer: String,
}

/// One reviewer's numeric judgment of one applicant.
///
/// The value is bounded to [1, 5] when present; `None` means the reviewer
/// saved a comment without committing to a rating. `history` holds prior
/// values as a comma-separated string, oldest first, appended only when an
/// existing value is overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub applicant_id: ApplicantId,
    pub reviewer_id: ReviewerId,
    pub value: Option<f64>,
    pub comment: String,
    pub history: Option<String>,
}

impl Score {
    pub fn new(applicant_id: ApplicantId, reviewer_id: ReviewerId) -> Self {
        Self {
            applicant_id,
            reviewer_id,
            value: None,
            comment: String::new(),
            history: None,
        }
    }
}

/// A finite allocatable benefit (money, tickets, swag) owned by a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub program_id: ProgramId,
    pub name: String,
    /// Category tag, e.g. "money" or "ticket"; drives the display icon.
    pub kind: String,
    pub amount: u32,
}

impl Resource {
    /// Font Awesome icon name for the resource category.
    pub fn fa_icon(&self) -> &'static str {
        match self.kind.as_str() {
            "money" => "money",
            "ticket" => "ticket",
            _ => "gift",
        }
    }

    /// Sum of all allocations recorded against this resource. Allocations
    /// belonging to other resources are ignored so callers can pass an
    /// unfiltered list. Widened to u64: individual amounts are u32 but
    /// nothing caps their total.
    pub fn amount_allocated(&self, allocations: &[Allocation]) -> u64 {
        allocations
            .iter()
            .filter(|allocation| allocation.resource_id == self.id)
            .map(|allocation| u64::from(allocation.amount))
            .sum()
    }

    /// Capacity left after existing allocations. Signed: nothing below the
    /// per-applicant uniqueness check enforces ledger-level capacity, so an
    /// over-allocated resource reports a negative remainder rather than a
    /// silently floored zero.
    pub fn amount_remaining(&self, allocations: &[Allocation]) -> i64 {
        let allocated = i64::try_from(self.amount_allocated(allocations)).unwrap_or(i64::MAX);
        i64::from(self.amount).saturating_sub(allocated)
    }
}

/// The grant of a specific amount of one resource to one applicant.
/// At most one allocation may exist per (applicant, resource) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub applicant_id: ApplicantId,
    pub resource_id: ResourceId,
    pub amount: u32,
}
