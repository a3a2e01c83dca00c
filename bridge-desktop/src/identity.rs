//! In-Process Identity Provider
//!
//! Account table kept in memory, for desktop hosts, demos and tests.

use async_trait::async_trait;
use bridge_traits::{
    AuthFailure, AuthResult, AuthState, AuthStateCallback, AuthUser, IdentityProvider,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Shortest password accepted at sign-up
pub const MIN_PASSWORD_LENGTH: usize = 6;

struct Account {
    user: AuthUser,
    password: String,
}

#[derive(Default)]
struct Directory {
    /// Keyed by lower-cased e-mail
    accounts: HashMap<String, Account>,
    /// Keyed by Google id token
    google_accounts: HashMap<String, AuthUser>,
    current: Option<AuthUser>,
}

/// In-memory identity provider implementation
///
/// Behaves like a hosted identity SDK without leaving the process:
/// - e-mail accounts with password checks
/// - Google sign-in keyed by id token (the same token always yields the same
///   user, an empty token means the user cancelled)
/// - session notifications on every identity change
/// - a simulated offline mode and optional per-call latency
///
/// Failures are raised as native error codes and classified through
/// [`AuthFailure::from_provider_code`], the same path a real SDK adapter takes.
pub struct InMemoryIdentityProvider {
    directory: Mutex<Directory>,
    callback: Mutex<Option<AuthStateCallback>>,
    offline: AtomicBool,
    next_id: AtomicU64,
    latency: Option<Duration>,
}

impl InMemoryIdentityProvider {
    /// Create an empty provider with no session
    pub fn new() -> Self {
        Self {
            directory: Mutex::new(Directory::default()),
            callback: Mutex::new(None),
            offline: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            latency: None,
        }
    }

    /// Delay every credential exchange by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seed an e-mail account
    pub fn with_account(self, email: &str, password: &str) -> Self {
        let user = self.new_user("local").with_email(email);
        self.directory().accounts.insert(
            email.to_lowercase(),
            Account {
                user,
                password: password.to_string(),
            },
        );
        self
    }

    /// Simulate loss of connectivity. Credential exchanges then fail with a
    /// network error; logout still succeeds locally.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        debug!(offline, "Identity provider connectivity changed");
    }

    pub fn account_count(&self) -> usize {
        self.directory().accounts.len()
    }

    fn directory(&self) -> MutexGuard<'_, Directory> {
        self.directory.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn new_user(&self, prefix: &str) -> AuthUser {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        AuthUser {
            id: format!("{}-{}", prefix, n),
            email: None,
            display_name: None,
            photo_url: None,
            is_email_verified: false,
            is_anonymous: false,
        }
    }

    async fn exchange(&self) -> Result<(), AuthFailure> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(native_error(
                "ERROR_NETWORK_REQUEST_FAILED",
                "A network error has occurred",
            ));
        }
        Ok(())
    }

    /// Record the new session and notify when identity changed.
    fn start_session(&self, user: AuthUser) {
        let changed = {
            let mut directory = self.directory();
            let changed = directory.current.as_ref() != Some(&user);
            directory.current = Some(user.clone());
            changed
        };

        if changed {
            self.notify(AuthState::Authenticated(user));
        }
    }

    fn notify(&self, state: AuthState) {
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        if let Some(callback) = callback {
            callback(state);
        }
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn native_error(code: &str, message: &str) -> AuthFailure {
    AuthFailure::from_provider_code(code, message)
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, rest)| !host.is_empty() && !rest.is_empty() && !rest.ends_with('.'))
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn current_user(&self) -> Option<AuthUser> {
        self.directory().current.clone()
    }

    fn observe_auth_state(&self, on_change: AuthStateCallback) {
        *self.callback.lock().unwrap_or_else(|e| e.into_inner()) = Some(on_change.clone());

        let current = AuthState::from_user(self.current_user());
        on_change(current);
    }

    async fn sign_up_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        if let Err(failure) = self.exchange().await {
            return AuthResult::Error(failure);
        }

        if !is_valid_email(email) {
            return AuthResult::Error(native_error(
                "ERROR_INVALID_EMAIL",
                "The email address is badly formatted.",
            ));
        }

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return AuthResult::Error(native_error(
                "ERROR_WEAK_PASSWORD",
                "Password should be at least 6 characters",
            ));
        }

        let user = {
            let mut directory = self.directory();
            let key = email.to_lowercase();
            if directory.accounts.contains_key(&key) {
                return AuthResult::Error(native_error(
                    "ERROR_EMAIL_ALREADY_IN_USE",
                    "The email address is already in use by another account.",
                ));
            }

            let user = self.new_user("local").with_email(email);
            directory.accounts.insert(
                key,
                Account {
                    user: user.clone(),
                    password: password.to_string(),
                },
            );
            user
        };

        info!(user_id = %user.id, "Account created");
        self.start_session(user.clone());
        AuthResult::Success(user)
    }

    async fn login_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        if let Err(failure) = self.exchange().await {
            return AuthResult::Error(failure);
        }

        if !is_valid_email(email) {
            return AuthResult::Error(native_error(
                "ERROR_INVALID_EMAIL",
                "The email address is badly formatted.",
            ));
        }

        let user = {
            let directory = self.directory();
            match directory.accounts.get(&email.to_lowercase()) {
                None => {
                    return AuthResult::Error(native_error(
                        "ERROR_USER_NOT_FOUND",
                        "There is no user record corresponding to this identifier.",
                    ))
                }
                Some(account) if account.password != password => {
                    return AuthResult::Error(native_error(
                        "ERROR_WRONG_PASSWORD",
                        "The password is invalid or the user does not have a password.",
                    ))
                }
                Some(account) => account.user.clone(),
            }
        };

        debug!(user_id = %user.id, "Password verified");
        self.start_session(user.clone());
        AuthResult::Success(user)
    }

    async fn sign_in_with_google(
        &self,
        id_token: &str,
        access_token: Option<&str>,
    ) -> AuthResult<AuthUser> {
        if id_token.is_empty() {
            return AuthResult::Error(native_error("canceled", "The user canceled the sign-in flow."));
        }

        if let Err(failure) = self.exchange().await {
            return AuthResult::Error(failure);
        }

        let user = {
            let mut directory = self.directory();
            match directory.google_accounts.get(id_token) {
                Some(user) => user.clone(),
                None => {
                    let user = self.new_user("google").email_verified(true);
                    directory
                        .google_accounts
                        .insert(id_token.to_string(), user.clone());
                    user
                }
            }
        };

        debug!(
            user_id = %user.id,
            has_access_token = access_token.is_some(),
            "Google credential accepted"
        );
        self.start_session(user.clone());
        AuthResult::Success(user)
    }

    async fn logout(&self) -> AuthResult<()> {
        let previous = self.directory().current.take();

        if let Some(user) = previous {
            info!(user_id = %user.id, "Signed out");
            self.notify(AuthState::Unauthenticated);
        }
        AuthResult::Success(())
    }
}
