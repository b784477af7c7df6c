use anyhow::Result;
use sreagent_agent::config::AgentConfig;
use sreagent_agent::host::{self, TickSchedule};
use sreagent_agent::http;
use sreagent_agent::plugin::{LoadPlugin, MeasurementPlugin};
use sreagent_collector::exporter::LoadExporter;
use sreagent_collector::load::SysinfoSampler;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sreagent=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/agent.toml".to_string());

    let config = AgentConfig::load_or_default(&config_path)?;
    let plugin_config = config.plugin_config()?;
    tracing::info!(config = ?config, "sreagent-agent starting");

    let exporter = LoadExporter::new()?;

    let listener = TcpListener::bind(&config.listen_addr).await?;
    let router = http::metrics_router(&config.metrics_path, exporter.registry().clone());
    tracing::info!(
        addr = %config.listen_addr,
        path = %config.metrics_path,
        "Serving metrics"
    );
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "Metrics endpoint stopped");
        }
    });

    let mut plugin = LoadPlugin::new(SysinfoSampler::new(), exporter);
    plugin.init(&plugin_config)?;

    let schedule = TickSchedule {
        interval: config.tick_interval(),
        iterations: config.iterations,
    };
    let ticks = host::run(&mut plugin, schedule, async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await;

    tracing::info!(ticks, "sreagent-agent finished");
    Ok(())
}
