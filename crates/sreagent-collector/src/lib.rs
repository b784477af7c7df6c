//! Load sampling, metric derivation and gauge export for the sreagent load
//! plugin.
//!
//! A [`LoadSampler`] reads raw load-average figures from the host,
//! [`load::derive`] turns them into a normalized [`MetricsSnapshot`], and
//! [`exporter::LoadExporter`] publishes the snapshot as Prometheus gauges.
//!
//! [`MetricsSnapshot`]: sreagent_common::types::MetricsSnapshot

pub mod exporter;
pub mod load;

use sreagent_common::types::LoadSample;

/// Errors raised by a [`LoadSampler`].
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// The host platform does not expose a load average.
    #[error("load average is not available on this platform")]
    Unsupported,

    /// The sampling facility returned nothing usable.
    #[error("sampling failed: {0}")]
    Unavailable(String),
}

/// Convenience `Result` alias for sampling operations.
pub type Result<T> = std::result::Result<T, SampleError>;

/// Source of raw load figures for the plugin.
///
/// The plugin asks for the core count once at initialization and for a fresh
/// sample on every tick. `Send` lets the host move the plugin onto its tick
/// task.
pub trait LoadSampler: Send {
    /// Number of logical CPUs on the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the CPU list cannot be read.
    fn core_count(&mut self) -> Result<usize>;

    /// Reads the current 1/5/15-minute load averages.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform has no load average or the read fails.
    fn sample(&mut self) -> Result<LoadSample>;
}
