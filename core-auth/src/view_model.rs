//! # Auth View-Model
//!
//! Orchestrates the authentication use-cases into one UI-facing
//! [`AuthUiState`].
//!
//! ## Overview
//!
//! The UI state has a single owner: a task spawned at construction that
//! applies mutations one message at a time. Session-stream notifications,
//! operation starts and settlements, and `clear_error` all travel to it over
//! one channel, so they are applied atomically and in the order they arrive.
//! Observers only ever see whole snapshots.
//!
//! ```text
//!  login() ──Begin──┐                         ┌──> ui_state observers
//!                   │      ┌─────────────┐    │
//!  stream ──Stream──┼─────>│ owning task ├────┘
//!                   │      └─────────────┘
//!  login() ─Settle──┘   (one message at a time)
//! ```
//!
//! ## Operation protocol
//!
//! Every operation first sets `is_loading = true` and clears the error, then
//! calls its use-case. On settlement:
//!
//! - `Success` clears loading and sets the session (`Authenticated(user)` or,
//!   for logout, `Unauthenticated`)
//! - `Error` clears loading and records the message; the session is untouched
//! - `Loading` changes nothing
//!
//! The operation method returns only after its settlement has been applied.
//! A caller that drops the operation future before it settles (a timeout or a
//! losing `select!` branch) abandons it: the operation stops counting as in
//! flight, and loading clears once nothing else is pending.
//!
//! ## Overlapping operations
//!
//! Under [`ConcurrencyPolicy::LastSettlementWins`] nothing stops a second
//! call while one is pending; whichever settles last determines the state.
//! In-flight operations are never cancelled. Under
//! [`ConcurrencyPolicy::RejectWhileBusy`] a call made while another is
//! pending fails immediately and leaves the state alone.
//!
//! ## Teardown
//!
//! [`dispose`](AuthViewModel::dispose) cancels the stream subscription and
//! stops the owning task. Afterwards no mutation reaches the UI state and
//! every operation fails without calling into the provider.

use bridge_traits::{AuthErrorKind, AuthFailure, AuthResult, AuthState, AuthUser};
use core_runtime::logging::redact_if_sensitive;
use core_runtime::{ConcurrencyPolicy, Observable, ReadOnlyObservable, Subscription};
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{AuthError, Result};
use crate::ui_state::AuthUiState;
use crate::usecase::AuthUseCases;

/// Message returned when an operation is refused under `RejectWhileBusy`.
pub const BUSY_MESSAGE: &str = "Another authentication request is already in progress";

/// Message returned by operations invoked after teardown.
pub const DISPOSED_MESSAGE: &str = "Authentication view model has been disposed";

/// Outcome of an operation as seen by the owning task.
#[derive(Debug)]
enum Settlement {
    SignedIn(AuthUser),
    SignedOut,
    Failed(String),
    Pending,
    Abandoned,
}

impl Settlement {
    fn from_sign_in(result: &AuthResult<AuthUser>) -> Self {
        match result {
            AuthResult::Success(user) => Settlement::SignedIn(user.clone()),
            AuthResult::Error(failure) => Settlement::Failed(failure.message.clone()),
            AuthResult::Loading => Settlement::Pending,
        }
    }

    fn from_logout(result: &AuthResult<()>) -> Self {
        match result {
            AuthResult::Success(()) => Settlement::SignedOut,
            AuthResult::Error(failure) => Settlement::Failed(failure.message.clone()),
            AuthResult::Loading => Settlement::Pending,
        }
    }
}

enum Command {
    Begin {
        ack: oneshot::Sender<bool>,
    },
    Settle {
        settlement: Settlement,
        ack: oneshot::Sender<()>,
    },
    StreamUpdate(AuthState),
    ClearError {
        ack: oneshot::Sender<()>,
    },
}

/// Owning task state. Only this struct ever writes the UI state.
struct Orchestrator {
    state: Observable<AuthUiState>,
    policy: ConcurrencyPolicy,
    in_flight: usize,
}

impl Orchestrator {
    fn apply(&mut self, command: Command) {
        match command {
            Command::Begin { ack } => {
                let admitted = self.begin();
                // Caller went away before learning it was admitted
                if ack.send(admitted).is_err() && admitted {
                    self.settle(Settlement::Abandoned);
                }
            }
            Command::Settle { settlement, ack } => {
                self.settle(settlement);
                let _ = ack.send(());
            }
            Command::StreamUpdate(auth_state) => {
                debug!(state = %auth_state, "Applying session update");
                self.transition(|current| current.with_stream_state(auth_state));
            }
            Command::ClearError { ack } => {
                self.transition(AuthUiState::without_error);
                let _ = ack.send(());
            }
        }
    }

    fn begin(&mut self) -> bool {
        if self.policy == ConcurrencyPolicy::RejectWhileBusy && self.in_flight > 0 {
            warn!(in_flight = self.in_flight, "Rejecting operation while busy");
            return false;
        }

        self.in_flight += 1;
        self.transition(AuthUiState::started);
        true
    }

    fn settle(&mut self, settlement: Settlement) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match settlement {
            Settlement::SignedIn(user) => {
                self.transition(|current| current.succeeded(AuthState::Authenticated(user)));
            }
            Settlement::SignedOut => {
                self.transition(|current| current.succeeded(AuthState::Unauthenticated));
            }
            Settlement::Failed(message) => {
                self.transition(|current| current.failed(message));
            }
            Settlement::Pending => {}
            Settlement::Abandoned => {
                debug!(in_flight = self.in_flight, "Operation abandoned before settling");
                if self.in_flight == 0 {
                    self.transition(AuthUiState::idle);
                }
            }
        }
    }

    /// Publish the derived snapshot unless it renders the same as the current one.
    fn transition<F>(&self, next: F)
    where
        F: FnOnce(&AuthUiState) -> AuthUiState,
    {
        let current = self.state.get();
        let next = next(&current);
        if !next.same_snapshot(&current) {
            self.state.set(next);
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                command = commands.recv() => match command {
                    // Teardown may race with a queued message
                    Some(_) if cancel.is_cancelled() => break,
                    Some(command) => self.apply(command),
                    None => break,
                },
            }
        }

        debug!("Auth view model task stopped");
    }
}

/// Stateful orchestrator exposing a single subscribable UI state.
pub struct AuthViewModel {
    use_cases: AuthUseCases,
    ui_state: ReadOnlyObservable<AuthUiState>,
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    stream_subscription: Mutex<Option<Subscription>>,
}

impl AuthViewModel {
    /// Creates the view-model and subscribes to the session stream.
    ///
    /// Must be called inside a Tokio runtime; the owning task is spawned on
    /// the current one.
    pub fn new(use_cases: AuthUseCases, policy: ConcurrencyPolicy) -> Result<Self> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| AuthError::RuntimeUnavailable(e.to_string()))?;

        let state = Observable::new(AuthUiState::default());
        let ui_state = state.read_only();
        let (commands, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let orchestrator = Orchestrator {
            state,
            policy,
            in_flight: 0,
        };
        handle.spawn(orchestrator.run(receiver, cancel.clone()));

        let forward = commands.clone();
        let stream_subscription = use_cases
            .observe_auth_state
            .execute()
            .subscribe(move |auth_state: &AuthState| {
                let _ = forward.send(Command::StreamUpdate(auth_state.clone()));
            });

        info!(?policy, "Auth view model created");

        Ok(Self {
            use_cases,
            ui_state,
            commands,
            cancel,
            stream_subscription: Mutex::new(Some(stream_subscription)),
        })
    }

    /// Read-only handle to the UI state.
    pub fn ui_state(&self) -> ReadOnlyObservable<AuthUiState> {
        self.ui_state.clone()
    }

    /// Subscribe to UI state snapshots; the current one is delivered first.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&AuthUiState) + Send + Sync + 'static,
    {
        self.ui_state.subscribe(on_change)
    }

    pub fn state(&self) -> AuthUiState {
        self.ui_state.get()
    }

    pub fn current_auth_state(&self) -> AuthState {
        self.ui_state.get().auth_state
    }

    pub fn is_authenticated(&self) -> bool {
        self.ui_state.get().is_authenticated()
    }

    /// User from the UI state, if signed in.
    pub fn current_user(&self) -> Option<AuthUser> {
        self.ui_state.get().user().cloned()
    }

    /// User snapshot straight from the provider, bypassing the UI state.
    pub fn provider_current_user(&self) -> Option<AuthUser> {
        self.use_cases.get_current_user.execute()
    }

    #[instrument(skip_all, fields(email = %redact_if_sensitive("email", email)))]
    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let operation = match self.begin().await {
            Ok(operation) => operation,
            Err(failure) => return AuthResult::Error(failure),
        };

        let result = self.use_cases.sign_up.execute(email, password).await;
        operation.settle(Settlement::from_sign_in(&result)).await;
        result
    }

    #[instrument(skip_all, fields(email = %redact_if_sensitive("email", email)))]
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let operation = match self.begin().await {
            Ok(operation) => operation,
            Err(failure) => return AuthResult::Error(failure),
        };

        let result = self.use_cases.login.execute(email, password).await;
        operation.settle(Settlement::from_sign_in(&result)).await;
        result
    }

    #[instrument(skip_all)]
    pub async fn sign_in_with_google(
        &self,
        id_token: &str,
        access_token: Option<&str>,
    ) -> AuthResult<AuthUser> {
        let operation = match self.begin().await {
            Ok(operation) => operation,
            Err(failure) => return AuthResult::Error(failure),
        };

        let result = self
            .use_cases
            .google_sign_in
            .execute(id_token, access_token)
            .await;
        operation.settle(Settlement::from_sign_in(&result)).await;
        result
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> AuthResult<()> {
        let operation = match self.begin().await {
            Ok(operation) => operation,
            Err(failure) => return AuthResult::Error(failure),
        };

        let result = self.use_cases.logout.execute().await;
        operation.settle(Settlement::from_logout(&result)).await;
        result
    }

    /// Reset the error message. Loading flag and session are untouched.
    pub async fn clear_error(&self) {
        let (ack, applied) = oneshot::channel();
        if self.commands.send(Command::ClearError { ack }).is_ok() {
            let _ = applied.await;
        }
    }

    /// Cancel the stream subscription and stop the owning task.
    ///
    /// Idempotent.
    pub fn dispose(&self) {
        if self.cancel.is_cancelled() {
            return;
        }

        self.cancel.cancel();
        let subscription = self
            .stream_subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }

        info!("Auth view model disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn begin(&self) -> std::result::Result<PendingOperation, AuthFailure> {
        if self.is_disposed() {
            return Err(AuthFailure::new(AuthErrorKind::Unknown, DISPOSED_MESSAGE));
        }

        let (ack, admitted) = oneshot::channel();
        if self.commands.send(Command::Begin { ack }).is_err() {
            return Err(AuthFailure::new(AuthErrorKind::Unknown, DISPOSED_MESSAGE));
        }

        match admitted.await {
            Ok(true) => Ok(PendingOperation {
                commands: self.commands.clone(),
                settled: false,
            }),
            Ok(false) => Err(AuthFailure::new(AuthErrorKind::Unknown, BUSY_MESSAGE)),
            Err(_) => Err(AuthFailure::new(AuthErrorKind::Unknown, DISPOSED_MESSAGE)),
        }
    }

}

/// An admitted operation that still owes the owning task a settlement.
///
/// Dropping it unsettled reports the operation as abandoned.
struct PendingOperation {
    commands: mpsc::UnboundedSender<Command>,
    settled: bool,
}

impl PendingOperation {
    async fn settle(mut self, settlement: Settlement) {
        self.settled = true;

        let (ack, applied) = oneshot::channel();
        if self
            .commands
            .send(Command::Settle { settlement, ack })
            .is_err()
        {
            debug!("Settlement dropped after teardown");
            return;
        }
        let _ = applied.await;
    }
}

impl Drop for PendingOperation {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let (ack, _) = oneshot::channel();
        let _ = self.commands.send(Command::Settle {
            settlement: Settlement::Abandoned,
            ack,
        });
    }
}

impl Drop for AuthViewModel {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for AuthViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthViewModel")
            .field("state", &self.ui_state.get())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
