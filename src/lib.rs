#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod api;
pub mod app;
pub mod capabilities;
pub mod dedup;
pub mod event;
pub mod guard;
pub mod html;
pub mod model;
pub mod view;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;

/// Window within which re-submitting byte-identical text is treated as an
/// accidental double submit. Tunable per control via
/// [`guard::SubmissionGuard::with_window_ms`].
pub const DUPLICATE_SUBMIT_WINDOW_MS: u64 = 2000;
pub const MAX_COMMENT_LENGTH: usize = 500;
pub const MAX_IMAGES_PER_POST: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const THEME_STORAGE_KEY: &str = "picstream-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    Permission,
    NotFound,
    RateLimited,
    Storage,
    Deserialization,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Validation => "VALIDATION_ERROR",
            Self::Permission => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::Storage => "STORAGE_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::RateLimited | Self::Storage | Self::Internal => {
                ErrorSeverity::Transient
            }
            Self::Validation
            | Self::Permission
            | Self::NotFound
            | Self::Deserialization
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }
}

/// Application-level error surfaced to the shell as a blocking notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => "Network error. Please check your connection.".into(),
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Permission => {
                "You do not have permission to perform this action.".into()
            }
            ErrorKind::NotFound => "The requested item could not be found.".into(),
            ErrorKind::RateLimited => {
                "Too many requests. Please wait a moment and try again.".into()
            }
            ErrorKind::Internal => "Server error. Please try again later.".into(),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::Storage | ErrorKind::Deserialization | ErrorKind::Unknown => {
                if self.message.is_empty() {
                    "Something went wrong. Please try again.".into()
                } else {
                    self.message.clone()
                }
            }
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 => ErrorKind::Validation,
            401 | 403 => ErrorKind::Permission,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        };

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorBody>(b).ok())
            .and_then(|e| e.error.or(e.message))
            .unwrap_or_else(|| format!("Request failed with status {status}."));

        Self::new(kind, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub type AppResult<T> = Result<T, AppError>;

// --- Typed ids ---

macro_rules! numeric_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(PostId);
numeric_id!(CommentId);
numeric_id!(ImageId);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(pub String);

impl Username {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Time ---

#[must_use]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    #[must_use]
    pub fn now() -> Self {
        Self(get_current_time_ms())
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn elapsed_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}
