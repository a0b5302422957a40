// src/bulletin/error.rs
use thiserror::Error;

/// Cycle-level failures. Any of these aborts the current fetch.
#[derive(Debug, Error)]
pub enum BulletinError {
    #[error("bulletin fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("bulletin source answered with status {0}")]
    Status(u16),

    #[error("bulletin could not be decoded as {encoding}")]
    Decode { encoding: &'static str },
}

/// Line-level failures. Counted and logged, never fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("expected at least {min} fields, got {tokens}")]
    Malformed { tokens: usize, min: usize },

    #[error("field `{field}` is not parseable: {token:?}")]
    Parse { field: &'static str, token: String },

    #[error("record rejected: {0}")]
    Invalid(&'static str),
}

impl LineError {
    /// Label used for the `reason` metric dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            LineError::Malformed { .. } => "malformed",
            LineError::Parse { .. } => "parse",
            LineError::Invalid(_) => "invalid",
        }
    }
}
