//! End-to-end tests of the bootstrapped core against the in-memory provider

use bridge_desktop::InMemoryIdentityProvider;
use core_service::{
    AuthConfig, AuthCore, AuthErrorKind, AuthResult, AuthState, AuthUiState, ConcurrencyPolicy,
    IdentityProvider,
};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn core_with(provider: Arc<InMemoryIdentityProvider>) -> AuthCore {
    let config = AuthConfig::builder()
        .identity_provider(provider)
        .build()
        .unwrap();
    AuthCore::bootstrap(config).unwrap()
}

async fn settled_stream_state(core: &AuthCore, expected: AuthState) -> AuthUiState {
    let mut receiver = core.view_model().ui_state().watch();
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        receiver.wait_for(|s| s.auth_state == expected),
    )
    .await
    .expect("state not reached in time")
    .expect("view model stopped")
    .clone();
    state
}

#[tokio::test]
async fn test_restored_session_reaches_ui_state() {
    let provider = Arc::new(InMemoryIdentityProvider::new());
    assert!(provider.sign_in_with_google("id-token", None).await.is_success());

    let core = core_with(Arc::clone(&provider));
    let user = provider.current_user().unwrap();
    let state = settled_stream_state(&core, AuthState::Authenticated(user)).await;

    assert!(!state.is_loading);
    assert!(core.view_model().is_authenticated());
}

#[tokio::test]
async fn test_sign_up_login_logout_round_trip() {
    let provider = Arc::new(InMemoryIdentityProvider::new());
    let core = core_with(Arc::clone(&provider));
    let vm = core.view_model();

    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&snapshots);
    let _subscription = vm.subscribe(move |state| sink.lock().unwrap().push(state.clone()));

    let user = match vm.sign_up("ada@example.com", "secret1").await {
        AuthResult::Success(user) => user,
        other => panic!("Expected success, got {:?}", other),
    };
    assert_eq!(vm.current_user(), Some(user.clone()));
    assert!(vm.state().error_message.is_none());

    assert!(vm.logout().await.is_success());
    assert_eq!(vm.current_auth_state(), AuthState::Unauthenticated);

    assert_eq!(
        vm.login("ada@example.com", "secret1").await,
        AuthResult::Success(user.clone())
    );
    assert_eq!(vm.provider_current_user(), Some(user));

    // Loading is never left set after a settled operation
    let last = snapshots.lock().unwrap().last().cloned().unwrap();
    assert!(!last.is_loading);
    assert!(last.is_authenticated());
}

#[tokio::test]
async fn test_wrong_password_surfaces_message() {
    let provider = Arc::new(InMemoryIdentityProvider::new().with_account("a@b.com", "secret1"));
    let core = core_with(provider);
    let vm = core.view_model();
    settled_stream_state(&core, AuthState::Unauthenticated).await;

    let result = vm.login("a@b.com", "x").await;
    assert_eq!(
        result.failure().map(|f| f.kind),
        Some(AuthErrorKind::InvalidCredentials)
    );

    let state = vm.state();
    assert!(!state.is_loading);
    assert_eq!(state.auth_state, AuthState::Unauthenticated);
    assert_eq!(
        state.error_message.as_deref(),
        Some("Invalid email or password")
    );

    vm.clear_error().await;
    assert!(vm.state().error_message.is_none());
}

#[tokio::test]
async fn test_offline_provider_reports_network_error() {
    let provider = Arc::new(InMemoryIdentityProvider::new().with_account("a@b.com", "secret1"));
    provider.set_offline(true);
    let core = core_with(Arc::clone(&provider));

    let result = core.view_model().login("a@b.com", "secret1").await;
    assert_eq!(
        result.failure().map(|f| f.message.as_str()),
        Some("Network error occurred")
    );
}

#[tokio::test(start_paused = true)]
async fn test_stuck_provider_times_out() {
    let provider = Arc::new(
        InMemoryIdentityProvider::new()
            .with_account("a@b.com", "secret1")
            .with_latency(Duration::from_secs(600)),
    );
    let config = AuthConfig::builder()
        .identity_provider(provider)
        .operation_timeout(Duration::from_secs(30))
        .build()
        .unwrap();
    let core = AuthCore::bootstrap(config).unwrap();

    let result = core.view_model().login("a@b.com", "secret1").await;
    let failure = result.failure().cloned().unwrap();
    assert_eq!(failure.kind, AuthErrorKind::NetworkError);
    assert_eq!(failure.message, "Authentication request timed out");
    assert!(!core.view_model().state().is_loading);
}

#[tokio::test]
async fn test_reject_while_busy_policy() {
    let provider = Arc::new(
        InMemoryIdentityProvider::new()
            .with_account("a@b.com", "secret1")
            .with_latency(Duration::from_millis(200)),
    );
    let config = AuthConfig::builder()
        .identity_provider(provider)
        .concurrency_policy(ConcurrencyPolicy::RejectWhileBusy)
        .build()
        .unwrap();
    let core = AuthCore::bootstrap(config).unwrap();
    let vm = core.view_model();

    let pending_vm = Arc::clone(&vm);
    let pending = tokio::spawn(async move { pending_vm.login("a@b.com", "secret1").await });

    let mut receiver = vm.ui_state().watch();
    receiver.wait_for(|s| s.is_loading).await.unwrap();

    let rejected = vm.sign_in_with_google("token", None).await;
    assert_eq!(
        rejected.failure().map(|f| f.message.as_str()),
        Some("Another authentication request is already in progress")
    );

    assert!(pending.await.unwrap().is_success());
    assert!(vm.is_authenticated());
}

#[tokio::test]
async fn test_session_stream_as_async_stream() {
    let provider = Arc::new(InMemoryIdentityProvider::new());
    let core = core_with(Arc::clone(&provider));

    let mut states = Box::pin(core.repository().auth_state_flow().stream());
    assert_eq!(states.next().await, Some(AuthState::Unauthenticated));

    core.view_model().sign_in_with_google("id-token", None).await;
    let next = states.next().await.unwrap();
    assert!(next.is_authenticated());
}

#[tokio::test]
async fn test_shutdown_stops_updates() {
    let provider = Arc::new(InMemoryIdentityProvider::new().with_account("a@b.com", "secret1"));
    let core = core_with(Arc::clone(&provider));
    settled_stream_state(&core, AuthState::Unauthenticated).await;

    core.shutdown();
    let before = core.view_model().state();

    // Session changes made behind the core's back no longer reach the UI
    provider.login_with_email("a@b.com", "secret1").await;
    tokio::task::yield_now().await;

    assert_eq!(core.view_model().state(), before);
    assert!(core.view_model().logout().await.is_error());
}

#[cfg(not(feature = "desktop-shims"))]
#[test]
fn test_missing_provider_is_reported() {
    use core_service::CoreError;

    match AuthConfig::builder().build().map_err(CoreError::from) {
        Err(CoreError::CapabilityMissing { capability, .. }) => {
            assert_eq!(capability, "IdentityProvider")
        }
        other => panic!("Expected capability error, got {:?}", other.map(|_| ())),
    }
}

#[cfg(feature = "desktop-shims")]
#[tokio::test]
async fn test_desktop_bootstrap() {
    let core = AuthCore::bootstrap_desktop().unwrap();
    let vm = core.view_model();

    assert!(vm.sign_up("new@example.com", "secret1").await.is_success());
    assert!(vm.is_authenticated());
}
