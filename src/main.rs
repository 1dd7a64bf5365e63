// SPDX-License-Identifier: GPL-3.0-only

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "warn,ga_dashlet=info";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::registry().with(filter).with(fmt::layer());

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {err}");
        return;
    }
    // Forward `log` records from the toolkit and HTTP stack.
    if let Err(err) = tracing_log::LogTracer::init() {
        tracing::warn!(%err, "failed to bridge log records");
    }
}

fn main() -> cosmic::iced::Result {
    init_logging();
    ga_dashlet::run()
}
