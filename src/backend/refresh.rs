// SPDX-License-Identifier: GPL-3.0-only

use super::analytics::{ProfileId, ReportSource};
use super::error::Result;
use crate::snapshot::{RangeKey, Snapshot};
use cosmic::iced::futures::SinkExt;
use cosmic::iced::{stream, Subscription};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Query every range for `profile` and assemble a complete snapshot.
///
/// Fails as a whole if any of the three queries fails.
pub async fn refresh<S: ReportSource>(source: &S, profile: &ProfileId) -> Result<Snapshot> {
    debug!(%profile, "Refreshing analytics snapshot");

    let today = source.report(profile, RangeKey::Today).await?;
    let yesterday = source.report(profile, RangeKey::Yesterday).await?;
    let week = source.report(profile, RangeKey::Week).await?;

    debug!(
        "Fetched views: today={}, yesterday={}, week={}",
        today.views, yesterday.views, week.views
    );

    Ok(Snapshot { today, yesterday, week })
}

/// Emits one tick per interval. The startup tick is dispatched by the shell itself.
pub fn tick_subscription(interval_secs: u64) -> Subscription<Instant> {
    let interval = if interval_secs > 0 {
        interval_secs
    } else {
        DEFAULT_POLL_INTERVAL_SECS
    };

    Subscription::run_with_id(
        std::sync::Arc::new(("ga-dashlet-refresh", interval)),
        stream::channel(1, move |mut sender| async move {
            let period = Duration::from_secs(interval);
            loop {
                tokio::time::sleep(period).await;
                let _ = sender.send(Instant::now()).await;
            }
        }),
    )
}
