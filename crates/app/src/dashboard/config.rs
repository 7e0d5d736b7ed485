use std::{net::SocketAddr, path::PathBuf, time::Duration};

use alert_ingest::BackendConfig;
use anyhow::{Context, Result, bail};
use clap::Args;
use incident_core::AlertFilter;

pub(crate) const MIN_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Feed is flagged stale after this many poll intervals without a successful pass.
pub(crate) const STALE_POLL_MULTIPLIER: u32 = 3;

/// Where the alert backend lives. Shared by every subcommand.
#[derive(Args, Clone, Debug)]
pub struct BackendArgs {
    /// Backend base URL, optionally with a path prefix.
    #[arg(long = "backend", env = "DASHBOARD_BACKEND", default_value = "http://127.0.0.1:8000")]
    pub base_url: String,
    /// Alerts collection path relative to the backend URL.
    #[arg(long, env = "DASHBOARD_ALERTS_PATH", default_value = "/alerts/")]
    pub alerts_path: String,
    /// Ledger routes prefix relative to the backend URL.
    #[arg(long, env = "DASHBOARD_CHAIN_PATH", default_value = "/blockchain")]
    pub chain_path: String,
    /// Per-request timeout, e.g. `8s` or `1500ms`.
    #[arg(
        long,
        env = "DASHBOARD_REQUEST_TIMEOUT",
        default_value = "8s",
        value_parser = humantime::parse_duration
    )]
    pub request_timeout: Duration,
}

impl BackendArgs {
    pub(crate) fn backend_config(&self) -> Result<BackendConfig> {
        if self.request_timeout.is_zero() {
            bail!("--request-timeout must be greater than zero");
        }
        if self.base_url.trim().is_empty() {
            bail!("--backend must not be empty");
        }
        Ok(BackendConfig {
            base_url: self.base_url.trim().to_string(),
            alerts_path: self.alerts_path.clone(),
            chain_path: self.chain_path.clone(),
            request_timeout: self.request_timeout,
        })
    }
}

/// Options for `incident-dashboard serve`.
#[derive(Args, Clone, Debug)]
pub struct DashboardCliArgs {
    #[command(flatten)]
    pub backend: BackendArgs,
    /// Time between background passes.
    #[arg(
        long,
        env = "DASHBOARD_POLL_INTERVAL",
        default_value = "15s",
        value_parser = humantime::parse_duration
    )]
    pub poll_interval: Duration,
    /// Flag the feed stale after this long without a successful pass
    /// (defaults to three poll intervals).
    #[arg(long, env = "DASHBOARD_STALE_AFTER", value_parser = humantime::parse_duration)]
    pub stale_after: Option<Duration>,
    /// Initial filter: `all`, `unresolved` or `resolved`.
    #[arg(long, env = "DASHBOARD_FILTER", default_value = "all")]
    pub filter: String,
    /// Resolver identity used when a resolve request does not name one.
    #[arg(long, env = "DASHBOARD_RESOLVER")]
    pub resolver: Option<String>,
    /// Address for the dashboard web server.
    #[arg(long, env = "DASHBOARD_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,
    /// Write a Chrome trace of every span to this file.
    #[arg(long, env = "DASHBOARD_CHROME_TRACE")]
    pub chrome_trace: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct TelemetryOptions {
    pub chrome_trace_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub backend: BackendConfig,
    pub poll_interval: Duration,
    pub stale_after: Duration,
    pub filter: AlertFilter,
    pub resolver: Option<String>,
    pub bind: SocketAddr,
    pub telemetry: TelemetryOptions,
}

impl TryFrom<DashboardCliArgs> for DashboardConfig {
    type Error = anyhow::Error;

    fn try_from(args: DashboardCliArgs) -> Result<Self> {
        let backend = args.backend.backend_config()?;

        if args.poll_interval < MIN_POLL_INTERVAL {
            bail!(
                "--poll-interval must be at least {}",
                humantime::format_duration(MIN_POLL_INTERVAL)
            );
        }
        let stale_after = args
            .stale_after
            .unwrap_or(args.poll_interval * STALE_POLL_MULTIPLIER);
        if stale_after < args.poll_interval {
            bail!("--stale-after must not be shorter than --poll-interval");
        }

        let bind: SocketAddr = args
            .bind
            .parse()
            .with_context(|| format!("--bind {:?} is not a socket address", args.bind))?;

        let resolver = args
            .resolver
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let filter = args.filter.parse::<AlertFilter>().unwrap_or_default();

        Ok(Self {
            backend,
            poll_interval: args.poll_interval,
            stale_after,
            filter,
            resolver,
            bind,
            telemetry: TelemetryOptions {
                chrome_trace_path: args.chrome_trace,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: DashboardCliArgs,
    }

    fn parse(argv: &[&str]) -> Result<DashboardConfig> {
        let argv = std::iter::once("serve").chain(argv.iter().copied());
        let harness = Harness::try_parse_from(argv)?;
        DashboardConfig::try_from(harness.args)
    }

    #[test]
    fn defaults_are_usable() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.stale_after, Duration::from_secs(45));
        assert_eq!(config.filter, AlertFilter::All);
        assert_eq!(config.bind, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.backend.alerts_path, "/alerts/");
        assert_eq!(config.backend.request_timeout, Duration::from_secs(8));
        assert!(config.resolver.is_none());
    }

    #[test]
    fn durations_use_human_units() {
        let config = parse(&[
            "--poll-interval",
            "2s 500ms",
            "--request-timeout",
            "750ms",
            "--stale-after",
            "1m",
        ])
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(2500));
        assert_eq!(config.backend.request_timeout, Duration::from_millis(750));
        assert_eq!(config.stale_after, Duration::from_secs(60));
    }

    #[test]
    fn rejects_too_fast_polling() {
        let err = parse(&["--poll-interval", "100ms"]).unwrap_err();
        assert!(err.to_string().contains("--poll-interval"), "{err}");
    }

    #[test]
    fn rejects_bad_bind_address() {
        let err = parse(&["--bind", "localhost"]).unwrap_err();
        assert!(err.to_string().contains("--bind"), "{err}");
    }

    #[test]
    fn unknown_filter_means_all() {
        assert_eq!(parse(&["--filter", "bogus"]).unwrap().filter, AlertFilter::All);
        assert_eq!(
            parse(&["--filter", "Resolved"]).unwrap().filter,
            AlertFilter::ResolvedOnly
        );
    }

    #[test]
    fn blank_resolver_is_ignored() {
        assert!(parse(&["--resolver", "  "]).unwrap().resolver.is_none());
        assert_eq!(
            parse(&["--resolver", " kim "]).unwrap().resolver.as_deref(),
            Some("kim")
        );
    }
}
