use chrono::{DateTime, Utc};
use serde::Serialize;
use sreagent_alert::config::ConfigStore;
use sreagent_alert::engine::AlertEvaluator;
use sreagent_alert::error::AlertError;
use sreagent_collector::exporter::LoadExporter;
use sreagent_collector::load::derive;
use sreagent_collector::LoadSampler;
use sreagent_common::types::{AlertVerdict, CoreCount, LoadSample, MetricsSnapshot};

/// Thresholds used when the host supplies no plugin config of its own.
pub const DEFAULT_PLUGIN_CONFIG: &str = r#"
{
    "alert": {
        "load": {
            "low": 2,
            "design": 60.0,
            "engineered": 80.0
        }
    }
}
"#;

/// Appended to the verdict message when the snapshot came from a failed sample.
pub const DEGRADED_NOTE: &str = "degraded sample";

/// Errors surfaced across the plugin lifecycle boundary.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Threshold lookup or evaluation failed.
    #[error("Plugin: {0}")]
    Alert(#[from] AlertError),

    /// A snapshot could not be encoded, or the bytes handed to `alert` are
    /// not a snapshot.
    #[error("Plugin: snapshot codec error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Gauge families could not be registered with the metric sink.
    #[error("Plugin: metric registration failed: {0}")]
    Export(#[from] prometheus::Error),

    /// `measure` was called before `init`.
    #[error("Plugin: measure called before init")]
    NotInitialized,
}

/// Convenience `Result` alias for lifecycle calls.
pub type Result<T> = std::result::Result<T, PluginError>;

/// What one `measure` call hands back to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// JSON-encoded [`MetricsSnapshot`].
    pub snapshot: Vec<u8>,
    /// JSON-encoded [`LoadSample`] the snapshot was derived from.
    pub raw: Vec<u8>,
    /// Seconds since the Unix epoch, with sub-second precision.
    pub timestamp: f64,
}

/// The lifecycle a host drives: `init` once, then `measure` followed by
/// `alert` on every tick.
pub trait MeasurementPlugin: Send {
    /// State the host includes in its per-tick log record.
    type State: Serialize;

    /// One-time setup. Threshold config errors are logged and never escape
    /// this call; a second call only reloads the thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if the metric families cannot be registered.
    fn init(&mut self, config: &str) -> Result<()>;

    /// Samples, derives and publishes this tick's metrics.
    fn measure(&mut self) -> Result<Measurement>;

    /// Evaluates the encoded snapshot returned by `measure`.
    fn alert(&self, snapshot: &[u8]) -> Result<AlertVerdict>;

    fn state(&self) -> &Self::State;
}

/// Everything the load plugin keeps between ticks.
#[derive(Debug, Default, Serialize)]
pub struct PluginState {
    pub config: ConfigStore,
    pub cores: CoreCount,
    pub snapshot: Option<MetricsSnapshot>,
    pub raw: Option<LoadSample>,
}

/// Load-average measurement plugin.
pub struct LoadPlugin<S> {
    sampler: S,
    exporter: LoadExporter,
    state: PluginState,
    initialized: bool,
}

impl<S: LoadSampler> LoadPlugin<S> {
    pub fn new(sampler: S, exporter: LoadExporter) -> Self {
        Self {
            sampler,
            exporter,
            state: PluginState::default(),
            initialized: false,
        }
    }

    pub fn exporter(&self) -> &LoadExporter {
        &self.exporter
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl<S: LoadSampler> MeasurementPlugin for LoadPlugin<S> {
    type State = PluginState;

    fn init(&mut self, config: &str) -> Result<()> {
        if self.state.config.load(config).is_err() {
            tracing::warn!(
                empty = self.state.config.config().is_empty(),
                "Continuing with previous threshold config"
            );
        }

        if self.initialized {
            tracing::debug!("Plugin already initialized, thresholds reloaded");
            return Ok(());
        }

        self.state.cores = match self.sampler.core_count() {
            Ok(cores) => CoreCount::from(cores),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to detect core count, assuming one");
                CoreCount::default()
            }
        };

        self.exporter.register()?;
        self.initialized = true;

        tracing::info!(
            cores = self.state.cores.get(),
            config = ?self.state.config.config(),
            "Load plugin initialized"
        );
        Ok(())
    }

    fn measure(&mut self) -> Result<Measurement> {
        if !self.initialized {
            return Err(PluginError::NotInitialized);
        }

        let (sample, degraded) = match self.sampler.sample() {
            Ok(sample) => (sample, false),
            Err(e) => {
                tracing::warn!(error = %e, "Load sample unavailable, metrics derived from zeros");
                (LoadSample::default(), true)
            }
        };

        let mut snapshot = derive(&sample, self.state.cores);
        snapshot.degraded = degraded;
        self.exporter.publish(&snapshot);

        let measurement = Measurement {
            snapshot: serde_json::to_vec(&snapshot)?,
            raw: serde_json::to_vec(&sample)?,
            timestamp: unix_seconds(Utc::now()),
        };

        self.state.snapshot = Some(snapshot);
        self.state.raw = Some(sample);
        Ok(measurement)
    }

    fn alert(&self, snapshot: &[u8]) -> Result<AlertVerdict> {
        // The bytes handed back by the host are authoritative, not state.snapshot.
        let snapshot: MetricsSnapshot = serde_json::from_slice(snapshot)?;

        let evaluator = AlertEvaluator::from_config(self.state.config.config())?;
        let evaluation = evaluator.evaluate(&snapshot)?;
        tracing::debug!(
            rules_checked = evaluation.rules_checked,
            matched = evaluation.matched.len(),
            degraded = snapshot.degraded,
            "Alert evaluated"
        );

        let mut verdict = evaluation.verdict;
        if snapshot.degraded {
            verdict.message = if verdict.message.is_empty() {
                DEGRADED_NOTE.to_string()
            } else {
                format!("{} ({DEGRADED_NOTE})", verdict.message)
            };
        }
        Ok(verdict)
    }

    fn state(&self) -> &PluginState {
        &self.state
    }
}

fn unix_seconds(now: DateTime<Utc>) -> f64 {
    now.timestamp_micros() as f64 / 1e6
}
