// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;

/// Workspace-wide error type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PerfError {
    InvalidInput(String),
    NotSupported(String),
    NumericalIssue(String),
    /// The server answered, but with a non-`OK` status.
    Remote(String),
    /// The request never produced a usable answer (connection, HTTP status, decoding).
    Transport(String),
    Cancelled,
}

impl PerfError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    pub fn numerical_issue(msg: impl Into<String>) -> Self {
        Self::NumericalIssue(msg.into())
    }

    pub fn remote(status: impl Into<String>) -> Self {
        Self::Remote(status.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }

    /// Stable machine-readable code, used by the CLI error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotSupported(_) => "not_supported",
            Self::NumericalIssue(_) => "numerical_issue",
            Self::Remote(_) => "remote_error",
            Self::Transport(_) => "transport_error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PerfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::NotSupported(msg) => write!(f, "not supported: {msg}"),
            Self::NumericalIssue(msg) => write!(f, "numerical issue: {msg}"),
            Self::Remote(status) => write!(f, "{status}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for PerfError {}
