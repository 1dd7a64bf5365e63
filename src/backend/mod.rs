// SPDX-License-Identifier: GPL-3.0-only

pub mod analytics;
pub mod auth;
pub mod error;
pub mod refresh;

use analytics::{AnalyticsClient, ProfileId};
use anyhow::Context;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An authenticated client together with the profile it reports on.
#[derive(Debug, Clone)]
pub struct Connection {
    pub client: AnalyticsClient,
    pub profile: Option<ProfileId>,
}

/// Authenticate with the key file and resolve the profile to report on.
pub async fn connect(key_file: &Path, api_base_url: &str) -> anyhow::Result<Connection> {
    let http = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("building HTTP client")?;

    let session = auth::authenticate(http, key_file, &[auth::ANALYTICS_READONLY_SCOPE])
        .await
        .with_context(|| format!("authenticating with {}", key_file.display()))?;

    let client = AnalyticsClient::new(session, api_base_url);
    let profile = client
        .resolve_profile()
        .await
        .context("resolving analytics profile")?;

    match &profile {
        Some(id) => info!(profile = %id, "Reporting on analytics profile"),
        None => warn!("Account hierarchy has no profile; refreshes will fail"),
    }

    Ok(Connection { client, profile })
}
