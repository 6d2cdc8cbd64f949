use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct UploadError {
    pub kind: UploadFailureKind,
    pub message: String,
}

impl UploadError {
    pub(crate) fn new(kind: UploadFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFailureKind {
    InvalidEndpoint,
    /// The store refused the object size (HTTP 413).
    TooLarge,
    HttpStatus(u16),
    Network,
    InvalidResponse,
}

impl fmt::Display for UploadFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadFailureKind::InvalidEndpoint => write!(f, "invalid storage endpoint"),
            UploadFailureKind::TooLarge => write!(f, "object too large"),
            UploadFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            UploadFailureKind::Network => write!(f, "network error"),
            UploadFailureKind::InvalidResponse => write!(f, "invalid storage response"),
        }
    }
}

/// `message` is what the user sees: the server's own text when it sent one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmitError {
    pub kind: SubmitFailureKind,
    pub message: String,
}

impl SubmitError {
    pub(crate) fn new(kind: SubmitFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitFailureKind {
    InvalidEndpoint,
    Rejected(u16),
    Network,
    InvalidResponse,
}
