//! Authentication Value Types
//!
//! Values exchanged across the identity-provider boundary. Everything in this
//! module is a plain value: cheap to clone, never shared mutably, and safe to
//! hand to any number of observers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// A user produced by a successful identity-provider operation.
///
/// Identity is carried by `id` alone: two values with the same `id` compare
/// equal even when the remaining fields differ, since providers refresh those
/// fields over the lifetime of a session.
///
/// # Examples
///
/// ```
/// use bridge_traits::AuthUser;
///
/// let user = AuthUser::new("u1")
///     .unwrap()
///     .with_email("a@b.com")
///     .email_verified(true);
///
/// let refreshed = AuthUser::new("u1").unwrap().with_display_name("Ada");
/// assert_eq!(user, refreshed);
/// assert!(AuthUser::new("").is_none());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider-assigned stable identifier (never empty)
    pub id: String,
    /// E-mail address, if the provider exposes one
    pub email: Option<String>,
    /// Human-readable name
    pub display_name: Option<String>,
    /// Avatar URI
    pub photo_url: Option<String>,
    /// Whether the provider has verified the e-mail address
    pub is_email_verified: bool,
    /// Whether this is an anonymous session
    pub is_anonymous: bool,
}

impl AuthUser {
    /// Create a user with the given provider id.
    ///
    /// Returns `None` for an empty id.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            return None;
        }

        Some(Self {
            id,
            email: None,
            display_name: None,
            photo_url: None,
            is_email_verified: false,
            is_anonymous: false,
        })
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    pub fn email_verified(mut self, verified: bool) -> Self {
        self.is_email_verified = verified;
        self
    }

    pub fn anonymous(mut self, anonymous: bool) -> Self {
        self.is_anonymous = anonymous;
        self
    }

    /// Field-by-field comparison, unlike `==` which looks at `id` only.
    ///
    /// ```
    /// use bridge_traits::AuthUser;
    ///
    /// let user = AuthUser::new("u1").unwrap();
    /// let refreshed = user.clone().email_verified(true);
    /// assert_eq!(user, refreshed);
    /// assert!(!user.same_profile(&refreshed));
    /// ```
    pub fn same_profile(&self, other: &Self) -> bool {
        self.id == other.id
            && self.email == other.email
            && self.display_name == other.display_name
            && self.photo_url == other.photo_url
            && self.is_email_verified == other.is_email_verified
            && self.is_anonymous == other.is_anonymous
    }
}

impl PartialEq for AuthUser {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AuthUser {}

impl Hash for AuthUser {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// E-mail addresses are PII; keep them out of debug output and logs.
impl fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthUser")
            .field("id", &self.id)
            .field("email", &self.email.as_ref().map(|_| "[REDACTED]"))
            .field("display_name", &self.display_name)
            .field("photo_url", &self.photo_url)
            .field("is_email_verified", &self.is_email_verified)
            .field("is_anonymous", &self.is_anonymous)
            .finish()
    }
}

/// Session status as reported by the identity provider.
///
/// # State Transitions
///
/// ```text
/// Loading -> Authenticated(user) <-> Unauthenticated
///    |                                    ^
///    +------------------------------------+
/// ```
///
/// `Loading` is only the initial value; providers never return to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", content = "user")]
pub enum AuthState {
    /// No session information yet
    #[default]
    Loading,
    /// A user is signed in
    Authenticated(AuthUser),
    /// No user is signed in
    Unauthenticated,
}

impl AuthState {
    /// Map an optional provider user into a settled state.
    pub fn from_user(user: Option<AuthUser>) -> Self {
        match user {
            Some(user) => AuthState::Authenticated(user),
            None => AuthState::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Like `==`, but an authenticated user's profile fields must match too.
    pub fn same_snapshot(&self, other: &Self) -> bool {
        match (self, other) {
            (AuthState::Authenticated(a), AuthState::Authenticated(b)) => a.same_profile(b),
            _ => self == other,
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Loading => write!(f, "Loading..."),
            AuthState::Authenticated(user) => write!(f, "Authenticated ({})", user.id),
            AuthState::Unauthenticated => write!(f, "Unauthenticated"),
        }
    }
}

/// Closed taxonomy of authentication failures.
///
/// Every provider-specific error is mapped to exactly one of these kinds
/// before it crosses into the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthErrorKind {
    InvalidCredentials,
    UserNotFound,
    EmailAlreadyInUse,
    WeakPassword,
    NetworkError,
    GoogleSignInCancelled,
    GoogleSignInFailed,
    Unknown,
}

impl AuthErrorKind {
    /// Message shown when the provider did not supply a better one.
    pub fn default_message(&self) -> &'static str {
        match self {
            AuthErrorKind::InvalidCredentials => "Invalid email or password",
            AuthErrorKind::UserNotFound => "User not found",
            AuthErrorKind::EmailAlreadyInUse => "Email already in use",
            AuthErrorKind::WeakPassword => "Password is too weak",
            AuthErrorKind::NetworkError => "Network error occurred",
            AuthErrorKind::GoogleSignInCancelled => "Google Sign-In was cancelled",
            AuthErrorKind::GoogleSignInFailed => "Google Sign-In failed",
            AuthErrorKind::Unknown => "An unknown error occurred",
        }
    }

    /// Identifier used in structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorKind::InvalidCredentials => "invalid_credentials",
            AuthErrorKind::UserNotFound => "user_not_found",
            AuthErrorKind::EmailAlreadyInUse => "email_already_in_use",
            AuthErrorKind::WeakPassword => "weak_password",
            AuthErrorKind::NetworkError => "network_error",
            AuthErrorKind::GoogleSignInCancelled => "google_sign_in_cancelled",
            AuthErrorKind::GoogleSignInFailed => "google_sign_in_failed",
            AuthErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure with a human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct AuthFailure {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl AuthFailure {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Failure carrying the kind's default message.
    pub fn from_kind(kind: AuthErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }

    /// Translate a native provider error code into the closed taxonomy.
    ///
    /// This is the single translation point for provider errors. Codes are
    /// matched case-insensitively with `_`/`-` separators and an `ERROR_`
    /// prefix ignored, so `wrongPassword`, `WRONG_PASSWORD` and
    /// `ERROR_WRONG_PASSWORD` all map the same way. Unrecognised codes fall
    /// into [`AuthErrorKind::Unknown`] and keep the native message.
    ///
    /// # Examples
    ///
    /// ```
    /// use bridge_traits::{AuthErrorKind, AuthFailure};
    ///
    /// let failure = AuthFailure::from_provider_code("wrongPassword", "The password is invalid.");
    /// assert_eq!(failure.kind, AuthErrorKind::InvalidCredentials);
    /// assert_eq!(failure.message, "Invalid email or password");
    ///
    /// let failure = AuthFailure::from_provider_code("quotaExceeded", "Too many requests");
    /// assert_eq!(failure.kind, AuthErrorKind::Unknown);
    /// assert_eq!(failure.message, "Too many requests");
    /// ```
    pub fn from_provider_code(code: &str, native_message: &str) -> Self {
        let normalized: String = code
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        let normalized = normalized.strip_prefix("error").unwrap_or(&normalized);

        match normalized {
            "wrongpassword" | "invalidcredential" | "invalidcredentials" => {
                Self::from_kind(AuthErrorKind::InvalidCredentials)
            }
            "invalidemail" => Self::new(AuthErrorKind::InvalidCredentials, "Invalid email address"),
            "usernotfound" => Self::from_kind(AuthErrorKind::UserNotFound),
            "emailalreadyinuse" => Self::from_kind(AuthErrorKind::EmailAlreadyInUse),
            "weakpassword" => Self::from_kind(AuthErrorKind::WeakPassword),
            "networkerror" | "networkrequestfailed" => Self::from_kind(AuthErrorKind::NetworkError),
            "googlesignincancelled" | "googlesignincanceled" | "canceled" | "cancelled" => {
                Self::from_kind(AuthErrorKind::GoogleSignInCancelled)
            }
            "googlesigninfailed" => Self::from_kind(AuthErrorKind::GoogleSignInFailed),
            _ if native_message.trim().is_empty() => Self::from_kind(AuthErrorKind::Unknown),
            _ => Self::new(AuthErrorKind::Unknown, native_message),
        }
    }
}

/// Outcome of an asynchronous authentication operation.
///
/// `Loading` is an intermediate signal only; a completed call always rests on
/// `Success` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthResult<T> {
    Success(T),
    Error(AuthFailure),
    Loading,
}

impl<T> AuthResult<T> {
    /// Shorthand for an `Error` outcome.
    pub fn error(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        AuthResult::Error(AuthFailure::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuthResult::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AuthResult::Error(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthResult::Loading)
    }

    pub fn failure(&self) -> Option<&AuthFailure> {
        match self {
            AuthResult::Error(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> AuthResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            AuthResult::Success(value) => AuthResult::Success(f(value)),
            AuthResult::Error(failure) => AuthResult::Error(failure),
            AuthResult::Loading => AuthResult::Loading,
        }
    }

    /// Convert a settled outcome into a standard `Result`.
    ///
    /// `Loading` has no value yet and yields `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, AuthFailure> {
        match self {
            AuthResult::Success(value) => Ok(Some(value)),
            AuthResult::Error(failure) => Err(failure),
            AuthResult::Loading => Ok(None),
        }
    }
}

impl<T> From<Result<T, AuthFailure>> for AuthResult<T> {
    fn from(result: Result<T, AuthFailure>) -> Self {
        match result {
            Ok(value) => AuthResult::Success(value),
            Err(failure) => AuthResult::Error(failure),
        }
    }
}
