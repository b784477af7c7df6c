use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use sreagent_common::types::MetricsSnapshot;

pub const LOAD_METRICS_FAMILY: &str = "sreagent_load_metrics";
pub const LOAD_AVERAGE_FAMILY: &str = "sreagent_load_average";

/// `use` label values written on every publish.
pub const PUBLISHED_LABELS: [&str; 7] = [
    "load1m",
    "load5m",
    "load15m",
    "utilization",
    "saturation",
    "throughput",
    "errors",
];

/// Prometheus sink for load snapshots.
///
/// Gauges are atomic, so the exposition endpoint can gather from the
/// registry while the tick loop publishes without any extra locking.
#[derive(Clone)]
pub struct LoadExporter {
    registry: Registry,
    load_metrics: GaugeVec,
    load_average: GaugeVec,
}

impl LoadExporter {
    /// Creates the gauge families on a fresh registry. Nothing is exposed
    /// until [`register`](Self::register) is called.
    pub fn new() -> prometheus::Result<Self> {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> prometheus::Result<Self> {
        let load_metrics = GaugeVec::new(
            Opts::new(
                LOAD_METRICS_FAMILY,
                "OS Load Utilization Saturation Errors Throughput Latency",
            ),
            &["use"],
        )?;
        // Declared for exposition parity; nothing publishes to it yet.
        let load_average = GaugeVec::new(
            Opts::new(LOAD_AVERAGE_FAMILY, "Host OS Load Average"),
            &["load"],
        )?;

        Ok(Self {
            registry,
            load_metrics,
            load_average,
        })
    }

    /// Registers both gauge families with the registry.
    ///
    /// # Errors
    ///
    /// Fails with `AlreadyReg` if the families were registered before.
    pub fn register(&self) -> prometheus::Result<()> {
        self.registry.register(Box::new(self.load_metrics.clone()))?;
        self.registry.register(Box::new(self.load_average.clone()))?;
        tracing::debug!(
            families = ?[LOAD_METRICS_FAMILY, LOAD_AVERAGE_FAMILY],
            "Registered load gauge families"
        );
        Ok(())
    }

    /// Overwrites the `use`-labelled gauges with the snapshot's values.
    pub fn publish(&self, snapshot: &MetricsSnapshot) {
        let values = [
            snapshot.load1m,
            snapshot.load5m,
            snapshot.load15m,
            snapshot.utilization,
            snapshot.saturation,
            snapshot.throughput,
            snapshot.errors,
        ];

        for (label, value) in PUBLISHED_LABELS.into_iter().zip(values) {
            self.load_metrics.with_label_values(&[label]).set(value);
        }
    }

    /// Current value of one published `use` gauge. Labels outside
    /// [`PUBLISHED_LABELS`] yield `None` and never create a series.
    pub fn observed(&self, label: &str) -> Option<f64> {
        if !PUBLISHED_LABELS.contains(&label) {
            return None;
        }
        Some(self.load_metrics.with_label_values(&[label]).get())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Renders every registered family in the text exposition format.
    pub fn render(&self) -> prometheus::Result<String> {
        render_registry(&self.registry)
    }
}

/// Encodes a registry's families in the Prometheus text format.
pub fn render_registry(registry: &Registry) -> prometheus::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
