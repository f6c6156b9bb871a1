//! Explicit session context threaded into every backend call.
//!
//! The identity provider itself lives outside this crate. Callers hand a
//! [`SessionContext`] (or any other [`AuthProvider`]) to each request binding so the
//! token lookup is visible at the call site and trivially faked in tests.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Bearer credential issued by the identity provider.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role claim chosen during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Candidate,
    Recruiter,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Candidate => "candidate",
            UserRole::Recruiter => "recruiter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub full_name: String,
    pub role: Option<UserRole>,
}

impl SessionUser {
    pub fn is_recruiter(&self) -> bool {
        self.role == Some(UserRole::Recruiter)
    }
}

/// Source of the current session, as seen by a request binding.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves the token for the current session; `None` when signed out.
    async fn session_token(&self) -> Option<AccessToken>;

    async fn current_user(&self) -> Option<SessionUser>;
}

/// Backend-side token verification used by stores to apply row-level rules.
pub trait IdentityDirectory: Send + Sync {
    fn resolve(&self, token: &AccessToken) -> Option<SessionUser>;
}

/// Snapshot of one signed-in (or anonymous) session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    token: Option<AccessToken>,
    user: Option<SessionUser>,
}

impl SessionContext {
    pub fn signed_in(token: AccessToken, user: SessionUser) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Builds a context from a raw bearer token, resolving the user through `directory`.
    /// Unknown tokens still travel to the backend so it can reject them itself.
    pub fn from_token<D>(token: AccessToken, directory: &D) -> Self
    where
        D: IdentityDirectory + ?Sized,
    {
        let user = directory.resolve(&token);
        Self {
            token: Some(token),
            user,
        }
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }
}

#[async_trait]
impl AuthProvider for SessionContext {
    async fn session_token(&self) -> Option<AccessToken> {
        self.token.clone()
    }

    async fn current_user(&self) -> Option<SessionUser> {
        self.user.clone()
    }
}

/// Why a page-level guard refused to proceed. Carries the redirect target instead of an
/// error message; these never flow through request state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardRejection {
    #[error("sign in required")]
    Unauthenticated { redirect: &'static str },
    #[error("recruiter role required")]
    NotRecruiter { redirect: &'static str },
}

impl GuardRejection {
    pub fn redirect(&self) -> &'static str {
        match self {
            GuardRejection::Unauthenticated { redirect }
            | GuardRejection::NotRecruiter { redirect } => redirect,
        }
    }
}

pub const SIGN_IN_REDIRECT: &str = "/?sign-in=true";
pub const LISTING_REDIRECT: &str = "/jobs";

pub async fn require_user<P>(auth: &P) -> Result<SessionUser, GuardRejection>
where
    P: AuthProvider + ?Sized,
{
    auth.current_user()
        .await
        .ok_or(GuardRejection::Unauthenticated {
            redirect: SIGN_IN_REDIRECT,
        })
}

pub async fn require_recruiter<P>(auth: &P) -> Result<SessionUser, GuardRejection>
where
    P: AuthProvider + ?Sized,
{
    let user = require_user(auth).await?;
    if user.is_recruiter() {
        Ok(user)
    } else {
        Err(GuardRejection::NotRecruiter {
            redirect: LISTING_REDIRECT,
        })
    }
}
