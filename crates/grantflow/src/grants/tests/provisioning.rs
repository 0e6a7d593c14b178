use super::common::build_service;
use crate::grants::domain::ReviewerId;
use crate::grants::service::GrantServiceError;

#[test]
fn create_program_derives_slug_from_name() {
    let (service, _, _) = build_service();
    let program = service.create_program("Test Program").expect("created");
    assert_eq!(program.slug, "test-program");
    assert_eq!(program.name, "Test Program");
}

#[test]
fn duplicate_names_get_numeric_suffixes() {
    let (service, _, _) = build_service();
    let first = service.create_program("Test Program").expect("created");
    let second = service.create_program("Test Program").expect("created");
    let third = service.create_program("Test Program").expect("created");

    assert_eq!(first.slug, "test-program");
    assert_eq!(second.slug, "test-program-1");
    assert_eq!(third.slug, "test-program-2");
}

#[test]
fn join_code_is_eight_uppercase_alphanumerics() {
    let (service, _, _) = build_service();
    let program = service.create_program("Test Program").expect("created");
    assert_eq!(program.join_code.len(), 8);
    assert!(program
        .join_code
        .chars()
        .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit()));
}

#[test]
fn blank_name_is_rejected() {
    let (service, _, _) = build_service();
    let error = service.create_program("   ").expect_err("name required");
    match error {
        GrantServiceError::Validation(errors) => {
            assert_eq!(errors[0].field, "name");
            assert_eq!(errors[0].message, "This field is required.");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn join_code_admits_reviewers() {
    let (service, _, _) = build_service();
    let program = service.create_program("Test Program").expect("created");
    let reviewer = ReviewerId("reviewer@example.com".to_string());

    let joined = service
        .join_program(&program.join_code, reviewer.clone())
        .expect("joined");
    assert!(joined.user_allowed(&reviewer));
}

#[test]
fn unknown_join_code_is_rejected() {
    let (service, _, _) = build_service();
    service.create_program("Test Program").expect("created");

    let error = service
        .join_program("NOPE0000", ReviewerId("reviewer@example.com".to_string()))
        .expect_err("unknown code");
    assert!(matches!(
        error,
        GrantServiceError::Repository(crate::grants::repository::RepositoryError::NotFound)
    ));
}
