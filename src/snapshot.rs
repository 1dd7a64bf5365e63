// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

/// The three reporting windows shown by the dashlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeKey {
    Today,
    Yesterday,
    Week,
}

impl RangeKey {
    pub const ALL: [RangeKey; 3] = [RangeKey::Today, RangeKey::Yesterday, RangeKey::Week];

    /// `(start-date, end-date)` in the reporting API's relative-date syntax.
    pub fn dates(self) -> (&'static str, &'static str) {
        match self {
            RangeKey::Today => ("today", "today"),
            RangeKey::Yesterday => ("yesterday", "yesterday"),
            RangeKey::Week => ("7daysAgo", "today"),
        }
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RangeKey::Today => "today",
            RangeKey::Yesterday => "yesterday",
            RangeKey::Week => "week",
        })
    }
}

/// One query result.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub profile_name: String,
    /// Page views exactly as the API returned them.
    pub views: String,
    pub revenue: f64,
}

/// Latest results for every [`RangeKey`]. Always complete.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub today: Report,
    pub yesterday: Report,
    pub week: Report,
}

impl Snapshot {
    pub fn get(&self, key: RangeKey) -> &Report {
        match key {
            RangeKey::Today => &self.today,
            RangeKey::Yesterday => &self.yesterday,
            RangeKey::Week => &self.week,
        }
    }

    /// Display name of the profile the snapshot was taken for.
    pub fn profile_name(&self) -> &str {
        &self.today.profile_name
    }
}
