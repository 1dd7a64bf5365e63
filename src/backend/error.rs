// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Failures talking to the analytics API or its token endpoint.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("cannot read key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid service account key: {0}")]
    InvalidKey(String),

    #[error("failed to sign token assertion: {0}")]
    Signing(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: HTTP {0}")]
    Status(u16),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("report for {0} contained no rows")]
    EmptyResult(String),
}
