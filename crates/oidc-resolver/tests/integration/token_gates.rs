//! Validation, decoding and claim checks that run before any directory call.

use oidc_resolver::{AuthError, Claims, DirectoryError, RejectionCause, ResolutionOutcome};

use crate::common::{existing_user, Scenario, EMAIL, TOKEN};

#[tokio::test]
async fn test_validation_failure_rejects_without_further_calls() {
    let harness = Scenario {
        validate_error: Some("jwt expired".to_string()),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    let rejection = outcome.rejection().expect("should be rejected");
    assert!(
        rejection
            .message()
            .starts_with("Cannot validate OpenID Connect accessToken")
    );
    assert!(rejection.message().contains("jwt expired"));
    assert_eq!(harness.log.calls(), vec![format!("validate:{TOKEN}")]);
}

#[tokio::test]
async fn test_validation_failure_ignores_existing_user() {
    let harness = Scenario {
        validate_error: Some("bad signature".to_string()),
        existing_user: Some(existing_user()),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    assert!(!outcome.is_authenticated());
    assert!(!harness.log.called("decode"));
    assert!(!harness.log.called("find_by_email"));
}

#[tokio::test]
async fn test_decode_failure_rejects_and_receives_exact_token() {
    let harness = Scenario {
        claims: Err("payload is not JSON".to_string()),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    let rejection = outcome.rejection().expect("should be rejected");
    assert!(matches!(
        rejection.cause(),
        RejectionCause::UndecodableToken(AuthError::InvalidClaims(_))
    ));
    assert!(rejection.message().contains("payload is not JSON"));
    assert_eq!(
        harness.log.calls(),
        vec![format!("validate:{TOKEN}"), format!("decode:{TOKEN}")]
    );
}

#[tokio::test]
async fn test_claims_without_email_reject() {
    let harness = Scenario {
        claims: Ok(Claims::new().with("sub", "sub_123")),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    let rejection = outcome.rejection().expect("should be rejected");
    assert!(
        rejection
            .message()
            .contains(r#"Payload must contain required "email" field"#)
    );
    assert!(!harness.log.called("find_by_email"));
}

#[tokio::test]
async fn test_claims_with_empty_email_reject() {
    let harness = Scenario {
        claims: Ok(Claims::new().with("email", "")),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    assert!(matches!(
        outcome.rejection().map(|r| r.cause()),
        Some(RejectionCause::MissingEmail)
    ));
}

#[tokio::test]
async fn test_claims_with_unusable_email_reject() {
    let harness = Scenario {
        claims: Ok(Claims::new().with("email", "chamerling")),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    assert!(matches!(
        outcome.rejection().map(|r| r.cause()),
        Some(RejectionCause::InvalidEmail)
    ));
    assert!(!harness.log.called("find_by_email"));
}

#[tokio::test]
async fn test_empty_token_is_a_protocol_error() {
    let harness = Scenario::default().build();

    let result = harness.resolver.resolve("").await;

    assert!(matches!(result, Err(AuthError::MissingToken)));
    assert!(harness.log.calls().is_empty());
}

#[tokio::test]
async fn test_existing_user_short_circuits() {
    let user = existing_user();
    let harness = Scenario {
        existing_user: Some(user.clone()),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    match outcome {
        ResolutionOutcome::Authenticated(found) => assert_eq!(found, user),
        ResolutionOutcome::Rejected(r) => panic!("unexpected rejection: {r}"),
    }
    assert_eq!(
        harness.log.calls(),
        vec![
            format!("validate:{TOKEN}"),
            format!("decode:{TOKEN}"),
            format!("find_by_email:{EMAIL}"),
        ]
    );
    assert!(harness.users.provisioned_profiles().is_empty());
}

#[tokio::test]
async fn test_user_lookup_failure_rejects_with_its_message() {
    let harness = Scenario {
        lookup_error: Some(DirectoryError::backend("user collection unreachable")),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    let rejection = outcome.rejection().expect("should be rejected");
    assert_eq!(
        rejection.message(),
        "Cannot validate OpenID Connect accessToken: user collection unreachable"
    );
    assert!(!harness.log.called("bound_domains"));
    assert!(!harness.log.called("provision"));
}
