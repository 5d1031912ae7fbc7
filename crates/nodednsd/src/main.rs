// # nodednsd - Node Annotation DNS Sync Daemon
//
// The nodednsd daemon keeps a PowerDNS address record converged with the
// external IPs advertised on cluster node annotations. It is a thin
// integration layer:
//
// 1. Reads configuration from environment variables
// 2. Initializes the runtime and tracing
// 3. Wires the Kubernetes node source and the PowerDNS record store
// 4. Verifies both collaborators and the target zone (fatal on failure)
// 5. Starts the sync engine (initial cycle first, then the interval loop)
//
// All sync logic lives in nodedns-core; this binary adds no DNS or
// reconciliation behavior of its own.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### PowerDNS
// - `POWERDNS_URL`: API base URL (required)
// - `POWERDNS_API_KEY`: API key (required)
// - `POWERDNS_VHOST`: Virtual host / server id (default: localhost)
//
// ### Target record
// - `DNS_ZONE`: Target zone (required)
// - `DNS_RECORD`: Target record name (required)
// - `DNS_TTL_SECS`: Record TTL in seconds (default: 300)
//
// ### Sync
// - `SYNC_INTERVAL_SECS`: Interval between cycles (default: 30)
// - `NODE_ANNOTATION`: Annotation key carrying external IPs
//   (default: k3s.io/external-ip)
//
// ### Logging
// - `NODEDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export POWERDNS_URL=http://powerdns:8081
// export POWERDNS_API_KEY=changeme
// export DNS_ZONE=example.com
// export DNS_RECORD=cluster.example.com
//
// nodednsd
// ```

use anyhow::{Context, Result};
use nodedns_core::{RecordStore, SyncConfig, SyncEngine, ensure_fqdn};
use nodedns_core::config::{
    DEFAULT_EXTERNAL_IP_ANNOTATION, DEFAULT_SYNC_INTERVAL_SECS, DEFAULT_TTL_SECS,
};
use nodedns_source_kube::KubeNodeSource;
use nodedns_store_powerdns::PowerDnsStore;
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Build information baked in at compile time
///
/// Immutable values injected at process start; logged once for
/// diagnostics and never mutated.
const VERSION: &str = env!("CARGO_PKG_VERSION");
const COMMIT: &str = match option_env!("NODEDNS_BUILD_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};
const BUILD_DATE: &str = match option_env!("NODEDNS_BUILD_DATE") {
    Some(date) => date,
    None => "unknown",
};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error (including a failed initial sync)
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    powerdns_url: String,
    powerdns_api_key: String,
    powerdns_vhost: Option<String>,
    dns_zone: String,
    dns_record: String,
    ttl_secs: u32,
    sync_interval_secs: u64,
    annotation_key: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let powerdns_url = env::var("POWERDNS_URL")
            .context("POWERDNS_URL environment variable is required")?;
        let powerdns_api_key = env::var("POWERDNS_API_KEY")
            .context("POWERDNS_API_KEY environment variable is required")?;
        let dns_zone =
            env::var("DNS_ZONE").context("DNS_ZONE environment variable is required")?;
        let dns_record =
            env::var("DNS_RECORD").context("DNS_RECORD environment variable is required")?;

        let ttl_secs = match env::var("DNS_TTL_SECS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                eprintln!(
                    "warning: invalid DNS_TTL_SECS '{raw}', using default: {DEFAULT_TTL_SECS}"
                );
                DEFAULT_TTL_SECS
            }),
            Err(_) => DEFAULT_TTL_SECS,
        };

        let sync_interval_secs = match env::var("SYNC_INTERVAL_SECS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                eprintln!(
                    "warning: invalid SYNC_INTERVAL_SECS '{raw}', using default: {DEFAULT_SYNC_INTERVAL_SECS}"
                );
                DEFAULT_SYNC_INTERVAL_SECS
            }),
            Err(_) => DEFAULT_SYNC_INTERVAL_SECS,
        };

        Ok(Self {
            powerdns_url,
            powerdns_api_key,
            powerdns_vhost: env::var("POWERDNS_VHOST").ok(),
            dns_zone,
            dns_record,
            ttl_secs,
            sync_interval_secs,
            annotation_key: env::var("NODE_ANNOTATION")
                .unwrap_or_else(|_| DEFAULT_EXTERNAL_IP_ANNOTATION.to_string()),
            log_level: env::var("NODEDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !self.powerdns_url.starts_with("http://") && !self.powerdns_url.starts_with("https://")
        {
            anyhow::bail!(
                "POWERDNS_URL must use an http or https scheme. Got: {}",
                self.powerdns_url
            );
        }

        if self.powerdns_api_key.is_empty() {
            anyhow::bail!(
                "POWERDNS_API_KEY cannot be empty. \
                Set it via: export POWERDNS_API_KEY=your_key"
            );
        }

        validate_domain_name(&self.dns_zone)
            .with_context(|| format!("DNS_ZONE '{}' is not a valid zone name", self.dns_zone))?;
        validate_domain_name(&self.dns_record).with_context(|| {
            format!("DNS_RECORD '{}' is not a valid record name", self.dns_record)
        })?;

        if self.ttl_secs == 0 {
            anyhow::bail!("DNS_TTL_SECS must be > 0");
        }
        if self.sync_interval_secs == 0 {
            anyhow::bail!("SYNC_INTERVAL_SECS must be > 0");
        }
        if self.annotation_key.is_empty() {
            anyhow::bail!("NODE_ANNOTATION cannot be empty");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "NODEDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Validate that a string is a valid domain name
///
/// Basic DNS name validation per RFC 1035; a single trailing dot (FQDN
/// form) is accepted.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    let unqualified = domain.strip_suffix('.').unwrap_or(domain);
    for label in unqualified.split('.') {
        if label.is_empty() {
            anyhow::bail!("domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return DaemonExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e:#}");
        return DaemonExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return DaemonExitCode::ConfigError.into();
    }

    info!(
        version = VERSION,
        commit = COMMIT,
        build_date = BUILD_DATE,
        "starting nodednsd"
    );
    info!(
        powerdns_url = config.powerdns_url,
        powerdns_vhost = config.powerdns_vhost.as_deref().unwrap_or("localhost"),
        zone = config.dns_zone,
        record = config.dns_record,
        ttl_secs = config.ttl_secs,
        interval_secs = config.sync_interval_secs,
        annotation = config.annotation_key,
        "configuration loaded"
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => DaemonExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {e:#}");
                DaemonExitCode::ConfigError
            }
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    // Wire the collaborators
    let store = PowerDnsStore::new(
        config.powerdns_url.as_str(),
        config.powerdns_api_key.as_str(),
        config.powerdns_vhost.clone(),
    )
    .context("failed to create PowerDNS client")?;

    let source = KubeNodeSource::try_default()
        .await
        .context("failed to create Kubernetes client")?;

    // Verify both collaborators before entering steady state; running
    // with unverified dependencies would silently fail to converge.
    info!("verifying Kubernetes node access");
    source
        .probe()
        .await
        .context("failed to access Kubernetes nodes - check service account permissions")?;
    info!("Kubernetes permissions verified");

    let server_count = store
        .check_connectivity()
        .await
        .context("failed to connect to PowerDNS API")?;
    info!(servers = server_count, "connected to PowerDNS API");

    let zone = ensure_fqdn(&config.dns_zone);
    store
        .verify_zone(&zone)
        .await
        .with_context(|| format!("failed to access DNS zone {zone}"))?;

    // Build and run the engine; the initial cycle failure propagates
    // out of run_with_shutdown and terminates the process.
    let sync_config = SyncConfig::new(config.dns_zone.as_str(), config.dns_record.as_str())
        .with_ttl_secs(config.ttl_secs)
        .with_interval_secs(config.sync_interval_secs)
        .with_annotation_key(config.annotation_key.as_str());

    let (engine, mut event_rx) =
        SyncEngine::new(Box::new(source), Box::new(store), sync_config)
            .context("failed to build sync engine")?;

    // Drain engine events for debug visibility; exits when the engine
    // drops its sender.
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "engine event");
        }
    });

    let shutdown_rx = spawn_signal_listener()?;
    engine.run_with_shutdown(Some(shutdown_rx)).await?;

    info!("shutdown complete");
    Ok(())
}

/// Wire SIGTERM/SIGINT to a oneshot shutdown signal
///
/// The engine honors the signal between cycles, so an in-flight store
/// call is never abandoned halfway through one family.
#[cfg(unix)]
fn spawn_signal_listener() -> Result<tokio::sync::oneshot::Receiver<()>> {
    let (tx, rx) = tokio::sync::oneshot::channel();

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to setup SIGTERM handler: {e}"))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to setup SIGINT handler: {e}"))?;

    tokio::spawn(async move {
        let received = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!(signal = received, "received shutdown signal");
        let _ = tx.send(());
    });

    Ok(rx)
}

/// Wire CTRL-C to a oneshot shutdown signal (non-Unix platforms)
#[cfg(not(unix))]
fn spawn_signal_listener() -> Result<tokio::sync::oneshot::Receiver<()>> {
    let (tx, rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received shutdown signal");
        }
        let _ = tx.send(());
    });

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_fqdn_names() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name("cluster.example.com.").is_ok());
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("bad..name").is_err());
        assert!(validate_domain_name("-leading.example.com").is_err());
        assert!(validate_domain_name("under_score.example.com").is_err());
        assert!(validate_domain_name(&"a".repeat(254)).is_err());
    }
}
