use crate::infra::{BufferedNotificationPublisher, InMemoryGrantRepository};
use clap::Args;
use grantflow::config::NotificationConfig;
use grantflow::error::AppError;
use grantflow::grants::{
    AllocationRequest, ApplicationSubmission, GrantProgramService, QuestionDraft, QuestionKind,
    ResourceDraft, ReviewerId, ScoreSubmission,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Name of the demo program to provision
    #[arg(long, default_value = "Travel Grants 2026")]
    pub(crate) program_name: String,
    /// Skip the resource allocation portion of the demo
    #[arg(long)]
    pub(crate) skip_allocation: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let repository = Arc::new(InMemoryGrantRepository::default());
    let notifications = Arc::new(BufferedNotificationPublisher::new(NotificationConfig {
        queue_depth: 64,
        retry_count: 3,
        timeout: Duration::from_secs(5),
    }));
    let service = Arc::new(GrantProgramService::new(repository, notifications.clone()));

    println!("Grant program demo");

    let program = service.create_program(&args.program_name)?;
    println!(
        "- Provisioned '{}' at /{} (join code {})",
        program.name, program.slug, program.join_code
    );

    let motivation = service.add_question(
        &program.slug,
        QuestionDraft {
            prompt: "Why do you need this grant?".to_string(),
            kind: QuestionKind::Text,
            required: true,
        },
    )?;
    service.add_question(
        &program.slug,
        QuestionDraft {
            prompt: "First time applying?".to_string(),
            kind: QuestionKind::Boolean,
            required: false,
        },
    )?;
    for question in service.questions(&program.slug)? {
        println!(
            "- Question [{}] {}{}",
            question.kind.label(),
            question.prompt,
            if question.required { " (required)" } else { "" }
        );
    }

    let reviewers = ["dana@example.com", "sam@example.com"];
    for reviewer in reviewers {
        service.join_program(&program.join_code, ReviewerId(reviewer.to_string()))?;
    }
    println!("- {} reviewers joined via the code", reviewers.len());

    let applicants = [
        ("Ada Lovelace", "ada@example.com", "Conference travel"),
        ("Grace Hopper", "grace@example.com", "Compiler workshop"),
    ];
    let mut applicant_ids = Vec::new();
    for (name, email, motivation_answer) in applicants {
        let mut answers = BTreeMap::new();
        answers.insert(motivation.id.0.clone(), motivation_answer.to_string());
        let applicant = service.apply(
            &program.slug,
            ApplicationSubmission {
                name: name.to_string(),
                email: email.to_string(),
                answers,
            },
        )?;
        println!("- Application received from {} ({})", applicant.name, applicant.email);
        applicant_ids.push(applicant.id);
    }

    let scores = [(&applicant_ids[0], 4.0, 5.0), (&applicant_ids[1], 3.0, 4.0)];
    for (applicant_id, first, second) in scores {
        for (reviewer, value) in reviewers.iter().zip([first, second]) {
            service.submit_score(
                &program.slug,
                applicant_id,
                ScoreSubmission {
                    reviewer: reviewer.to_string(),
                    score: Some(value),
                    comment: String::new(),
                },
            )?;
        }
    }
    // Revise one score so the history trail shows up in the detail view.
    service.submit_score(
        &program.slug,
        &applicant_ids[0],
        ScoreSubmission {
            reviewer: reviewers[0].to_string(),
            score: Some(5.0),
            comment: "Stronger on a second read".to_string(),
        },
    )?;

    println!("\nApplicant standings");
    for summary in service.applicant_summaries(&program.slug)? {
        let average = summary
            .average_score
            .map(|value| format!("{value:.2}"))
            .unwrap_or_else(|| "unscored".to_string());
        println!(
            "- {} | avg {} | stdev {:.2} | {} reviews",
            summary.name, average, summary.stdev, summary.reviewed_count
        );
    }

    let detail = service.applicant_detail(&program.slug, &applicant_ids[0])?;
    for score in &detail.scores {
        if !score.score_history.is_empty() {
            println!(
                "- {} revised their score for {} (history: {})",
                score.reviewer, detail.summary.name, score.score_history
            );
        }
    }

    if !args.skip_allocation {
        println!("\nResource ledger");
        let resource = service.create_resource(
            &program.slug,
            ResourceDraft {
                name: "Travel Fund".to_string(),
                kind: "money".to_string(),
                amount: 1000,
            },
        )?;
        service.allocate(
            &program.slug,
            &applicant_ids[0],
            AllocationRequest {
                resource_id: resource.id.0.clone(),
                amount: 600,
            },
        )?;
        if let Err(err) = service.allocate(
            &program.slug,
            &applicant_ids[0],
            AllocationRequest {
                resource_id: resource.id.0.clone(),
                amount: 100,
            },
        ) {
            println!("- Duplicate allocation rejected: {err}");
        }
        for view in service.resource_summaries(&program.slug)? {
            println!(
                "- {} [{}]: {} allocated, {} remaining of {}",
                view.name, view.kind, view.amount_allocated, view.amount_remaining, view.amount
            );
        }
    }

    let pending = notifications.pending();
    if pending.is_empty() {
        println!("\nOutbound notifications: none queued");
    } else {
        println!("\nOutbound notifications");
        for notification in pending {
            println!(
                "- template={} program={}",
                notification.template, notification.program_id.0
            );
        }
    }

    Ok(())
}
