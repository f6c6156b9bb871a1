use std::fmt;

use serde::Serialize;

/// Observable progress and outcome of one call-site binding.
///
/// `data` and `error` describe the most recently applied settlement. A new dispatch only
/// raises `loading`; earlier `data`/`error` stay visible until it settles. A failed
/// settlement records `error` and keeps whatever `data` was already there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestState<T> {
    pub data: Option<T>,
    pub error: Option<ActionError>,
    pub loading: bool,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
        }
    }
}

impl<T> RequestState<T> {
    pub fn is_settled(&self) -> bool {
        !self.loading
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Broad failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionErrorKind {
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    Invalid,
    Upload,
    Unavailable,
}

impl ActionErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ActionErrorKind::Unauthenticated => "unauthenticated",
            ActionErrorKind::Forbidden => "forbidden",
            ActionErrorKind::NotFound => "not_found",
            ActionErrorKind::Conflict => "conflict",
            ActionErrorKind::Invalid => "invalid",
            ActionErrorKind::Upload => "upload",
            ActionErrorKind::Unavailable => "unavailable",
        }
    }
}

/// Structured failure stored in [`RequestState::error`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionError {
    pub kind: ActionErrorKind,
    pub message: String,
}

impl ActionError {
    pub fn new(kind: ActionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ActionErrorKind::Unavailable, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ActionErrorKind::Invalid, message)
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::error::Error for ActionError {}
