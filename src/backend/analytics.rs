// SPDX-License-Identifier: GPL-3.0-only

//! Read-only calls against the Core Reporting and Management APIs (v3).

use super::auth::Session;
use super::error::{AnalyticsError, Result};
use crate::snapshot::{RangeKey, Report};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use tracing::debug;

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/analytics/v3";
pub const METRICS: &str = "ga:pageviews,ga:adsenseRevenue";

/// A reporting view ("profile") id, without the `ga:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileId(pub String);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can answer a report query for one profile and date range.
pub trait ReportSource {
    fn report(&self, profile: &ProfileId, range: RangeKey) -> impl Future<Output = Result<Report>> + Send;
}

#[derive(Debug, Deserialize)]
struct ItemList {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GaData {
    profile_info: Option<ProfileInfo>,
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileInfo {
    #[serde(default)]
    profile_name: String,
}

#[derive(Debug, Clone)]
pub struct AnalyticsClient {
    session: Session,
    base_url: String,
}

impl AnalyticsClient {
    pub fn new(session: Session, base_url: impl Into<String>) -> Self {
        Self {
            session,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let token = self.session.bearer().await?;
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "GET");

        let response = self
            .session
            .http()
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyticsError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| AnalyticsError::Parse(e.to_string()))
    }

    async fn first_id(&self, path: &str) -> Result<Option<String>> {
        let list: ItemList = self.get(path, &[]).await?;
        Ok(list.items.into_iter().next().map(|item| item.id))
    }

    /// First account, then its first web property, then that property's first profile.
    pub async fn resolve_profile(&self) -> Result<Option<ProfileId>> {
        let Some(account) = self.first_id("management/accounts").await? else {
            debug!("No analytics accounts visible to this service account");
            return Ok(None);
        };

        let Some(property) = self
            .first_id(&format!("management/accounts/{account}/webproperties"))
            .await?
        else {
            debug!(%account, "Account has no web properties");
            return Ok(None);
        };

        let profile = self
            .first_id(&format!("management/accounts/{account}/webproperties/{property}/profiles"))
            .await?;
        if profile.is_none() {
            debug!(%account, %property, "Web property has no profiles");
        }

        Ok(profile.map(ProfileId))
    }

    /// Page views and revenue for `profile` over `range`.
    pub async fn query(&self, profile: &ProfileId, range: RangeKey) -> Result<Report> {
        let ids = format!("ga:{profile}");
        let (start, end) = range.dates();
        let data: GaData = self
            .get(
                "data/ga",
                &[("ids", ids.as_str()), ("start-date", start), ("end-date", end), ("metrics", METRICS)],
            )
            .await?;

        report_from(range, data)
    }
}

impl ReportSource for AnalyticsClient {
    async fn report(&self, profile: &ProfileId, range: RangeKey) -> Result<Report> {
        self.query(profile, range).await
    }
}

fn report_from(range: RangeKey, data: GaData) -> Result<Report> {
    let row = data
        .rows
        .into_iter()
        .next()
        .ok_or_else(|| AnalyticsError::EmptyResult(range.to_string()))?;

    let [views, revenue] = <[String; 2]>::try_from(row)
        .map_err(|row| AnalyticsError::Parse(format!("expected 2 columns, got {}", row.len())))?;

    let revenue = revenue
        .parse::<f64>()
        .map_err(|e| AnalyticsError::Parse(format!("revenue {revenue:?}: {e}")))?;

    Ok(Report {
        profile_name: data.profile_info.map(|p| p.profile_name).unwrap_or_default(),
        views,
        revenue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GaData {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn report_takes_first_row() {
        let data = parse(
            r#"{"profileInfo": {"profileName": "Site A", "profileId": "1"},
                "rows": [["42", "1.5"]]}"#,
        );

        let report = report_from(RangeKey::Today, data).unwrap();
        assert_eq!(report.profile_name, "Site A");
        assert_eq!(report.views, "42");
        assert_eq!(report.revenue, 1.5);
    }

    #[test]
    fn missing_rows_is_an_empty_result() {
        let data = parse(r#"{"profileInfo": {"profileName": "Site A"}}"#);

        assert!(matches!(
            report_from(RangeKey::Week, data),
            Err(AnalyticsError::EmptyResult(ref range)) if range == "week"
        ));
    }

    #[test]
    fn non_numeric_revenue_is_a_parse_error() {
        let data = parse(r#"{"rows": [["42", "n/a"]]}"#);

        assert!(matches!(report_from(RangeKey::Today, data), Err(AnalyticsError::Parse(_))));
    }

    #[test]
    fn short_row_is_a_parse_error() {
        let data = parse(r#"{"rows": [["42"]]}"#);

        assert!(matches!(report_from(RangeKey::Today, data), Err(AnalyticsError::Parse(_))));
    }
}
