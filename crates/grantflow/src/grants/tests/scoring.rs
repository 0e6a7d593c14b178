//! Service-level scenarios for intake, scoring, and history tracking.

use super::common::{build_service, seeded_program, submission, text_question};
use crate::grants::domain::QuestionKind;
use crate::grants::service::{GrantServiceError, QuestionDraft, ScoreSubmission};

fn score(reviewer: &str, value: Option<f64>, comment: &str) -> ScoreSubmission {
    ScoreSubmission {
        reviewer: reviewer.to_string(),
        score: value,
        comment: comment.to_string(),
    }
}

#[test]
fn apply_creates_applicant_and_notifies_program() {
    let (service, _, notifier) = build_service();
    let program = seeded_program(&service, "reviewer@example.com");

    let applicant = service
        .apply(&program.slug, submission("Ada Lovelace", "ada@example.com"))
        .expect("application accepted");
    assert_eq!(applicant.email, "ada@example.com");

    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "application_received");
    assert_eq!(events[0].details["email"], "ada@example.com");
}

#[test]
fn apply_rejects_duplicate_email_within_program() {
    let (service, _, _) = build_service();
    let program = seeded_program(&service, "reviewer@example.com");
    service
        .apply(&program.slug, submission("Ada", "ada@example.com"))
        .expect("first application accepted");

    let error = service
        .apply(&program.slug, submission("Also Ada", "ada@example.com"))
        .expect_err("duplicate rejected");
    match error {
        GrantServiceError::Validation(errors) => {
            assert_eq!(errors[0].field, "email");
            assert_eq!(
                errors[0].message,
                "An application with that email address has already been submitted."
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let summaries = service
        .applicant_summaries(&program.slug)
        .expect("summaries");
    assert_eq!(summaries.len(), 1);
}

#[test]
fn same_email_is_fine_across_programs() {
    let (service, _, _) = build_service();
    let first = seeded_program(&service, "reviewer@example.com");
    let second = service.create_program("Other Program").expect("created");

    service
        .apply(&first.slug, submission("Ada", "ada@example.com"))
        .expect("accepted");
    service
        .apply(&second.slug, submission("Ada", "ada@example.com"))
        .expect("accepted in the other program too");
}

#[test]
fn apply_requires_answers_to_required_questions() {
    let (service, _, _) = build_service();
    let program = seeded_program(&service, "reviewer@example.com");
    let question = service
        .add_question(&program.slug, text_question("Why do you want this grant?", true))
        .expect("question added");

    let error = service
        .apply(&program.slug, submission("Ada", "ada@example.com"))
        .expect_err("missing required answer");
    match error {
        GrantServiceError::Validation(errors) => {
            assert_eq!(errors[0].field, format!("question-{}", question.id.0));
            assert_eq!(errors[0].message, "This field is required.");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let mut filled = submission("Ada", "ada@example.com");
    filled
        .answers
        .insert(question.id.0.clone(), "Travel funding".to_string());
    service.apply(&program.slug, filled).expect("accepted");
}

#[test]
fn submit_score_creates_record_without_history() {
    let (service, _, _) = build_service();
    let program = seeded_program(&service, "reviewer@example.com");
    let applicant = service
        .apply(&program.slug, submission("Ada", "ada@example.com"))
        .expect("accepted");

    let stored = service
        .submit_score(
            &program.slug,
            &applicant.id,
            score("reviewer@example.com", Some(4.0), "Great application"),
        )
        .expect("score accepted");

    assert_eq!(stored.value, Some(4.0));
    assert_eq!(stored.comment, "Great application");
    assert_eq!(stored.history, None);
}

#[test]
fn updating_a_score_appends_prior_value_to_history() {
    let (service, _, _) = build_service();
    let program = seeded_program(&service, "reviewer@example.com");
    let applicant = service
        .apply(&program.slug, submission("Ada", "ada@example.com"))
        .expect("accepted");

    service
        .submit_score(
            &program.slug,
            &applicant.id,
            score("reviewer@example.com", Some(3.0), ""),
        )
        .expect("first score");
    let updated = service
        .submit_score(
            &program.slug,
            &applicant.id,
            score("reviewer@example.com", Some(5.0), "Changed my mind"),
        )
        .expect("second score");

    assert_eq!(updated.value, Some(5.0));
    assert_eq!(updated.history.as_deref(), Some("3.0"));
    assert_eq!(updated.history_human(), "3.0");

    let third = service
        .submit_score(
            &program.slug,
            &applicant.id,
            score("reviewer@example.com", Some(4.5), ""),
        )
        .expect("third score");
    assert_eq!(third.history.as_deref(), Some("3.0,5.0"));
    assert_eq!(third.history_human(), "3.0, 5.0");
}

#[test]
fn out_of_range_score_leaves_record_unchanged() {
    let (service, _, _) = build_service();
    let program = seeded_program(&service, "reviewer@example.com");
    let applicant = service
        .apply(&program.slug, submission("Ada", "ada@example.com"))
        .expect("accepted");
    service
        .submit_score(
            &program.slug,
            &applicant.id,
            score("reviewer@example.com", Some(3.0), "keep me"),
        )
        .expect("initial score");

    for invalid in [0.5, -2.0, 6.0] {
        let error = service
            .submit_score(
                &program.slug,
                &applicant.id,
                score("reviewer@example.com", Some(invalid), "should not stick"),
            )
            .expect_err("rejected");
        match error {
            GrantServiceError::Validation(errors) => {
                assert_eq!(errors[0].message, "Score must be between 1 and 5.");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    let detail = service
        .applicant_detail(&program.slug, &applicant.id)
        .expect("detail");
    assert_eq!(detail.scores.len(), 1);
    assert_eq!(detail.scores[0].score, Some(3.0));
    assert_eq!(detail.scores[0].comment, "keep me");
    assert_eq!(detail.scores[0].score_history, "");
}

#[test]
fn blank_score_is_a_valid_null_submission() {
    let (service, _, _) = build_service();
    let program = seeded_program(&service, "reviewer@example.com");
    let applicant = service
        .apply(&program.slug, submission("Ada", "ada@example.com"))
        .expect("accepted");

    let stored = service
        .submit_score(
            &program.slug,
            &applicant.id,
            score("reviewer@example.com", None, "No score yet"),
        )
        .expect("null score accepted");
    assert_eq!(stored.value, None);

    let summaries = service
        .applicant_summaries(&program.slug)
        .expect("summaries");
    assert_eq!(summaries[0].average_score, None);
    assert_eq!(summaries[0].variance, 0.0);
}

#[test]
fn non_members_cannot_score() {
    let (service, _, _) = build_service();
    let program = seeded_program(&service, "reviewer@example.com");
    let applicant = service
        .apply(&program.slug, submission("Ada", "ada@example.com"))
        .expect("accepted");

    let error = service
        .submit_score(
            &program.slug,
            &applicant.id,
            score("stranger@example.com", Some(3.0), ""),
        )
        .expect_err("not a member");
    assert!(matches!(error, GrantServiceError::NotAMember));
}

#[test]
fn statistics_aggregate_across_reviewers() {
    let (service, _, _) = build_service();
    let program = seeded_program(&service, "first@example.com");
    service
        .join_program(
            &program.join_code,
            crate::grants::domain::ReviewerId("second@example.com".to_string()),
        )
        .expect("second reviewer joins");
    let applicant = service
        .apply(&program.slug, submission("Ada", "ada@example.com"))
        .expect("accepted");

    service
        .submit_score(
            &program.slug,
            &applicant.id,
            score("first@example.com", Some(2.0), ""),
        )
        .expect("first score");
    service
        .submit_score(
            &program.slug,
            &applicant.id,
            score("second@example.com", Some(4.0), ""),
        )
        .expect("second score");

    let summaries = service
        .applicant_summaries(&program.slug)
        .expect("summaries");
    assert_eq!(summaries[0].average_score, Some(3.0));
    assert_eq!(summaries[0].variance, 1.0);
    assert_eq!(summaries[0].stdev, 1.0);
    assert_eq!(summaries[0].reviewed_count, 2);
}

#[test]
fn question_kind_is_immutable_once_answered() {
    let (service, _, _) = build_service();
    let program = seeded_program(&service, "reviewer@example.com");
    let question = service
        .add_question(&program.slug, text_question("First time attending?", true))
        .expect("question added");

    let mut filled = submission("Ada", "ada@example.com");
    filled.answers.insert(question.id.0.clone(), "Yes".to_string());
    service.apply(&program.slug, filled).expect("accepted");

    let retyped = QuestionDraft {
        prompt: "First time attending?".to_string(),
        kind: QuestionKind::Boolean,
        required: true,
    };
    let error = service
        .update_question(&program.slug, &question.id, retyped)
        .expect_err("kind change rejected");
    match error {
        GrantServiceError::Validation(errors) => {
            assert_eq!(errors[0].field, "type");
            assert_eq!(errors[0].message, "Cannot change once this question has answers");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn question_with_answers_cannot_be_deleted() {
    let (service, _, _) = build_service();
    let program = seeded_program(&service, "reviewer@example.com");
    let question = service
        .add_question(&program.slug, text_question("Why?", true))
        .expect("question added");

    let mut filled = submission("Ada", "ada@example.com");
    filled
        .answers
        .insert(question.id.0.clone(), "Because".to_string());
    service.apply(&program.slug, filled).expect("accepted");

    assert!(service
        .delete_question(&program.slug, &question.id)
        .is_err());

    let unanswered = service
        .add_question(&program.slug, text_question("Optional extra", false))
        .expect("question added");
    service
        .delete_question(&program.slug, &unanswered.id)
        .expect("unanswered question deletes cleanly");
}
