//! Contract tests for the in-memory identity provider

use bridge_desktop::InMemoryIdentityProvider;
use bridge_traits::{AuthErrorKind, AuthResult, AuthState, IdentityProvider};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn observe(provider: &dyn IdentityProvider) -> Arc<Mutex<Vec<AuthState>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    provider.observe_auth_state(Arc::new(move |state| sink.lock().unwrap().push(state)));
    seen
}

#[tokio::test]
async fn test_usable_as_trait_object() {
    let provider: Arc<dyn IdentityProvider> =
        Arc::new(InMemoryIdentityProvider::new().with_account("a@b.com", "secret1"));
    assert!(provider.is_ready());

    let seen = observe(provider.as_ref());
    let user = match provider.login_with_email("a@b.com", "secret1").await {
        AuthResult::Success(user) => user,
        other => panic!("Expected success, got {:?}", other),
    };

    assert_eq!(provider.current_user(), Some(user.clone()));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![AuthState::Unauthenticated, AuthState::Authenticated(user)]
    );
}

#[tokio::test]
async fn test_callback_fires_with_restored_session() {
    let provider = InMemoryIdentityProvider::new();
    provider.sign_in_with_google("id-token", None).await;

    let seen = observe(&provider);
    let first = seen.lock().unwrap()[0].clone();
    assert!(first.is_authenticated());
}

#[tokio::test]
async fn test_every_failure_is_classified() {
    let provider = InMemoryIdentityProvider::new().with_account("a@b.com", "secret1");

    let cases = vec![
        (
            provider.login_with_email("a@b.com", "wrong").await,
            AuthErrorKind::InvalidCredentials,
        ),
        (
            provider.login_with_email("missing@b.com", "secret1").await,
            AuthErrorKind::UserNotFound,
        ),
        (
            provider.sign_up_with_email("a@b.com", "secret1").await,
            AuthErrorKind::EmailAlreadyInUse,
        ),
        (
            provider.sign_up_with_email("b@b.com", "abc").await,
            AuthErrorKind::WeakPassword,
        ),
        (
            provider.sign_in_with_google("", None).await,
            AuthErrorKind::GoogleSignInCancelled,
        ),
    ];

    for (result, expected) in cases {
        let failure = result.failure().cloned().expect("operation should fail");
        assert_eq!(failure.kind, expected);
        assert_eq!(failure.message, expected.default_message());
    }
}

#[tokio::test(start_paused = true)]
async fn test_latency_is_applied() {
    let provider = InMemoryIdentityProvider::new()
        .with_account("a@b.com", "secret1")
        .with_latency(Duration::from_secs(3));

    let started = tokio::time::Instant::now();
    assert!(provider
        .login_with_email("a@b.com", "secret1")
        .await
        .is_success());
    assert!(started.elapsed() >= Duration::from_secs(3));
}
