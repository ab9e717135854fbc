//! Glance - keep a dashboard page current from the command line
//!
//! Usage: glance <config.json> <page-url> [seconds]

use std::time::Duration;

use anyhow::Context;
use glance::{Config, CycleOutcome, Dashboard};

fn main() -> anyhow::Result<()> {
    glance::init_logging();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().context("usage: glance <config.json> <page-url> [seconds]")?;
    let page_url = args.next().context("missing page url")?;
    let run_for = args
        .next()
        .map(|s| s.parse::<u64>().map(Duration::from_secs))
        .transpose()
        .context("seconds must be a whole number")?;

    let config = Config::from_file(&config_path).with_context(|| format!("loading {config_path}"))?;
    let transport = config.http_transport()?;

    tracing::info!("Opening {}...", page_url);
    let dashboard = smol::block_on(Dashboard::open(&config, &page_url, transport))?;

    for (name, outcome) in smol::block_on(dashboard.restart()) {
        match outcome {
            CycleOutcome::Applied(report) => tracing::info!(
                "{}: {} replaced, {} inserted, {} removed",
                name,
                report.replaced.len(),
                report.inserted.len(),
                report.removed.len()
            ),
            CycleOutcome::Failed(err) => tracing::warn!("{}: {}", name, err),
            other => tracing::debug!("{}: {:?}", name, other),
        }
    }

    match run_for {
        Some(duration) => {
            dashboard.run_until(smol::Timer::after(duration));
        }
        None => dashboard.run_until(smol::future::pending::<()>()),
    }

    dashboard.stop();
    tracing::info!("Stopped after refreshing {}", dashboard.url());
    Ok(())
}
