use std::net::SocketAddr;

const LOG_ENV: &str = "TRADESIM_LOG";
const WORKSPACE_TARGETS: &[&str] = &[
    "tradesim",
    "tradesim_application",
    "tradesim_domain",
    "tradesim_infrastructure",
];

/// Workspace crates log at `level`; dependencies stay at `warn`.
fn default_directives(level: &str) -> String {
    let level = level.trim().to_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        WORKSPACE_TARGETS
            .iter()
            .map(|target| format!("{target}={level}")),
    );
    directives.join(",")
}

/// Installs the global subscriber on stderr so stdout stays free for reports.
/// `TRADESIM_LOG`, when set, replaces the directives derived from `log_level`.
pub fn init_tracing(log_level: &str, json: bool) -> Result<(), String> {
    let directives = std::env::var(LOG_ENV)
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .unwrap_or_else(|| default_directives(log_level));
    let env_filter = tracing_subscriber::EnvFilter::try_new(&directives)
        .map_err(|err| format!("invalid log filter `{directives}`: {err}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn parse_metrics_addr(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    let Some(raw) = metrics_addr.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    raw.parse()
        .map(Some)
        .map_err(|err| format!("invalid --metrics-addr `{raw}` (expected host:port): {err}"))
}

#[cfg(feature = "prometheus")]
pub fn init_metrics(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(addr) = parse_metrics_addr(metrics_addr)? else {
        return Ok(None);
    };
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to install prometheus exporter on {addr}: {err}"))?;

    tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    match parse_metrics_addr(metrics_addr)? {
        Some(addr) => Err(format!(
            "cannot serve metrics on {addr}: tradesim was built without feature `prometheus`"
        )),
        None => Ok(None),
    }
}
