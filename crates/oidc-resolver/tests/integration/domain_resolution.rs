//! Choosing the domain a first-time user is provisioned into.

use oidc_resolver::{Domain, DomainId, RejectionCause};

use crate::common::{open_paas, Binding, Scenario, EMAIL, TOKEN};

fn ids(values: &[u64]) -> Vec<DomainId> {
    values.iter().copied().map(DomainId::from).collect()
}

#[tokio::test]
async fn test_empty_binding_falls_back_to_email_suffix() {
    let harness = Scenario {
        binding: Binding::Ids(Vec::new()),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    assert!(outcome.is_authenticated());
    assert_eq!(harness.log.count("get_by_name"), 1);
    assert!(harness.log.calls().contains(&"get_by_name:open-paas.org".to_string()));
    assert!(!harness.log.called("load"));
}

#[tokio::test]
async fn test_absent_binding_falls_back_to_email_suffix() {
    let harness = Scenario {
        binding: Binding::Absent,
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    assert!(outcome.is_authenticated());
    assert!(harness.log.calls().contains(&"get_by_name:open-paas.org".to_string()));
    assert!(!harness.log.called("load"));
}

#[tokio::test]
async fn test_failing_binding_falls_back_to_email_suffix() {
    let harness = Scenario {
        binding: Binding::Fail,
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    assert!(outcome.is_authenticated());
    assert!(harness.log.calls().contains(&"get_by_name:open-paas.org".to_string()));
    assert!(!harness.log.called("load"));
}

#[tokio::test]
async fn test_bound_domain_preferred_over_suffix() {
    let harness = Scenario {
        binding: Binding::Ids(ids(&[1, 2])),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    assert!(outcome.is_authenticated());
    assert_eq!(harness.log.count("load"), 1);
    assert!(harness.log.calls().contains(&"load:1".to_string()));
    assert!(!harness.log.called("get_by_name"));
}

#[tokio::test]
async fn test_only_first_bound_domain_is_tried() {
    let second = Domain::new(2u64, "linagora.com");
    let harness = Scenario {
        binding: Binding::Ids(ids(&[9, 2])),
        loadable: vec![second],
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    // Falls back to the email suffix, never to the second candidate.
    assert!(outcome.is_authenticated());
    assert_eq!(harness.log.count("load"), 1);
    assert!(harness.log.calls().contains(&"load:9".to_string()));
    assert!(harness.log.calls().contains(&"get_by_name:open-paas.org".to_string()));
    assert_eq!(
        harness.users.provisioned_profiles()[0].domain_id,
        DomainId::from(1u64)
    );
}

#[tokio::test]
async fn test_unloadable_bound_domain_falls_back_to_suffix() {
    let harness = Scenario {
        binding: Binding::Ids(ids(&[1])),
        loadable: Vec::new(),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    assert!(outcome.is_authenticated());
    let calls = harness.log.calls();
    let load = calls.iter().position(|c| c == "load:1").unwrap();
    let by_name = calls
        .iter()
        .position(|c| c == "get_by_name:open-paas.org")
        .unwrap();
    assert!(load < by_name);
}

#[tokio::test]
async fn test_double_fallback_failure_rejects() {
    let harness = Scenario {
        binding: Binding::Ids(ids(&[1])),
        loadable: Vec::new(),
        named: Vec::new(),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    let rejection = outcome.rejection().expect("should be rejected");
    assert!(matches!(rejection.cause(), RejectionCause::NoDomain { .. }));
    assert!(
        rejection
            .message()
            .contains(&format!("Can not find any valid domain for {EMAIL}"))
    );
    assert!(!harness.log.called("provision"));
}

#[tokio::test]
async fn test_unknown_suffix_without_binding_rejects() {
    let harness = Scenario {
        named: Vec::new(),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    assert!(matches!(
        outcome.rejection().map(|r| r.cause()),
        Some(RejectionCause::NoDomain { .. })
    ));
    assert!(!harness.log.called("load"));
}

#[tokio::test]
async fn test_open_paas_scenario() {
    let harness = Scenario {
        binding: Binding::Ids(ids(&[1, 2])),
        loadable: vec![open_paas()],
        named: Vec::new(),
        ..Default::default()
    }
    .build();

    let outcome = harness.resolver.resolve(TOKEN).await.unwrap();

    assert!(outcome.is_authenticated());
    assert!(!harness.log.called("get_by_name"));
    assert_eq!(harness.log.count("load"), 1);
    assert!(harness.log.calls().contains(&"load:1".to_string()));
}
