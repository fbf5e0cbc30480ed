//! GitHub activity collector
//!
//! Single-binary service that:
//! 1. Loads configuration and the API token
//! 2. Builds one quota ledger shared by the REST and GraphQL transports and
//!    seeds it from the live rate limit
//! 3. Collects events, searches and commit histories for one account
//! 4. Writes the aggregate as JSON to stdout (logs go to stderr)

mod config;
mod preflight;
mod report;

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use activity::{ActivitySummary, Collector, Window, fetch_contributions, fetch_yearly};
use anyhow::{Context, Result};
use quota::{QuotaLedger, QuotaPool, TimeRemaining};
use tracing::{Instrument, info, info_span, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::{QueryTransport, RestTransport, Transport};
use uuid::Uuid;

use crate::config::Config;
use crate::report::{QuotaStatus, Report};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output on stderr and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    // CLI: simple --config / --user flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = flag_value(&args, "--config");
    let cli_login = flag_value(&args, "--user");

    let (config_path, explicit) = Config::resolve_path(cli_config_path);
    let config = if explicit || config_path.exists() {
        info!(path = %config_path.display(), "loading configuration");
        Config::load(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else {
        info!("no config file found, using defaults");
        Config::from_env().context("invalid environment configuration")?
    };

    let login = cli_login
        .map(str::to_owned)
        .or_else(|| config.collection.login.clone())
        .context("no account given: pass --user <login> or set collection.login")?;

    let client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let run_id = Uuid::new_v4().to_string();
    let span = info_span!("run", run_id = %run_id, login = %login);
    let report = run(config, client, login, run_id).instrument(span).await?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report).context("failed to write report")?;
    writeln!(stdout)?;
    Ok(())
}

async fn run(
    config: Config,
    client: reqwest::Client,
    login: String,
    run_id: String,
) -> Result<Report> {
    let token = config.api.token.clone();
    let primary = if token.is_some() {
        QuotaPool::primary_default()
    } else {
        warn!("no token configured: anonymous quota applies and searches are skipped");
        QuotaPool::primary_anonymous()
    };
    let ledger = Arc::new(QuotaLedger::with_pools(
        config.quota.policy,
        primary,
        QuotaPool::search_default(),
        QuotaPool::query_default(),
    ));

    let timeout = Duration::from_secs(config.api.timeout_secs);

    let rest = RestTransport::new(
        client.clone(),
        config.api.base_url.clone(),
        token.clone(),
        Arc::clone(&ledger),
    )
    .with_timeout(timeout);
    if config.quota.check_rate_limit {
        preflight::check_rate_limit(&rest).await?;
    }
    let rest: Arc<dyn Transport> = Arc::new(rest);

    info!(
        base_url = %config.api.base_url,
        depth = ?config.collection.depth,
        days = config.collection.days,
        repositories = config.collection.repositories.len(),
        policy = ?config.quota.policy,
        "starting collection"
    );

    let window = Window::last_days(config.collection.days);
    let activity = Collector::new(rest)
        .with_settings(config.collection.settings())
        .collect(
            &login,
            &window,
            config.collection.depth,
            &config.collection.repositories,
        )
        .await
        .with_context(|| format!("activity collection failed for {login}"))?;
    let summary = ActivitySummary::from_activity(&login, &activity, &window);

    let mut contributions = None;
    let mut yearly_contributions = BTreeMap::new();
    if config.collection.contributions {
        match QueryTransport::new(
            client,
            &config.api.graphql_url,
            token,
            Arc::clone(&ledger),
        ) {
            Ok(query) => {
                let query = query.with_timeout(timeout);
                match fetch_contributions(
                    &query,
                    &login,
                    window.since.map(|t| t.date_naive()),
                    window.until.map(|t| t.date_naive()),
                )
                .await
                {
                    Ok(stats) => contributions = Some(stats.into()),
                    Err(e) => warn!(error = %e, "contribution calendar unavailable"),
                }

                if !config.collection.years.is_empty() {
                    yearly_contributions =
                        fetch_yearly(&query, &login, &config.collection.years)
                            .await
                            .into_iter()
                            .map(|(year, stats)| (year, stats.summary()))
                            .collect();
                }
            }
            Err(e) => warn!(error = %e, "skipping contribution calendar"),
        }
    }

    let quota_status = QuotaStatus::all(&ledger);
    for status in &quota_status {
        info!(
            pool = %status.pool,
            remaining = status.remaining,
            ceiling = status.ceiling,
            reset_in = %TimeRemaining(Duration::from_secs(status.reset_in_secs)),
            "quota status"
        );
    }

    Ok(Report {
        run_id,
        login,
        window,
        summary,
        activity,
        contributions,
        yearly_contributions,
        quota: quota_status,
    })
}

/// Value following `flag` on the command line.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
