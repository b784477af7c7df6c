use serde::{Deserialize, Serialize};

/// Raw load-average figures as the OS reports them, before normalization.
///
/// `stats` is only filled in where the kernel exposes run-queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSample {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<LoadStats>,
}

/// Scheduler counters sampled alongside the load average.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub procs_running: u64,
    pub procs_blocked: u64,
    /// Context switches since boot
    pub ctxt: u64,
}

/// Number of logical CPUs used to normalize load figures.
///
/// Construction clamps anything below one up to one, so dividing by a
/// `CoreCount` can never fault.
///
/// # Examples
///
/// ```
/// use sreagent_common::types::CoreCount;
///
/// assert_eq!(CoreCount::new(8).get(), 8);
/// assert_eq!(CoreCount::new(0).get(), 1);
/// assert_eq!(CoreCount::new(-4).get(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CoreCount(u32);

impl CoreCount {
    pub fn new(cores: i64) -> Self {
        Self(cores.clamp(1, i64::from(u32::MAX)) as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for CoreCount {
    fn default() -> Self {
        Self(1)
    }
}

impl From<usize> for CoreCount {
    fn from(cores: usize) -> Self {
        Self::new(i64::try_from(cores).unwrap_or(i64::MAX))
    }
}

/// Normalized load metrics for a single tick, laid out along the USE axes.
///
/// Every field is recomputed on each measurement. `degraded` is set when the
/// sample behind the snapshot could not be read and zeros were used instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub load1m: f64,
    pub load5m: f64,
    pub load15m: f64,
    #[serde(rename = "use")]
    pub utilization: f64,
    pub load: f64,
    pub latency: f64,
    pub throughput: f64,
    pub throughputmax: f64,
    pub saturation: f64,
    pub errors: f64,
    #[serde(default)]
    pub degraded: bool,
}

impl MetricsSnapshot {
    /// Looks up a metric by the name it is serialized under.
    pub fn get(&self, metric: &str) -> Option<f64> {
        let value = match metric {
            "load1m" => self.load1m,
            "load5m" => self.load5m,
            "load15m" => self.load15m,
            "use" | "utilization" => self.utilization,
            "load" => self.load,
            "latency" => self.latency,
            "throughput" => self.throughput,
            "throughputmax" => self.throughputmax,
            "saturation" => self.saturation,
            "errors" => self.errors,
            _ => return None,
        };
        Some(value)
    }
}

/// Alert level attached to a verdict, ordered from quietest to most severe.
///
/// # Examples
///
/// ```
/// use sreagent_common::types::AlertLevel;
///
/// let level: AlertLevel = "fatal".parse().unwrap();
/// assert_eq!(level, AlertLevel::Fatal);
/// assert_eq!(level.to_string(), "fatal");
/// assert!(AlertLevel::Fatal > AlertLevel::Warn);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    #[default]
    None,
    Warn,
    Fatal,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertLevel::None => write!(f, "none"),
            AlertLevel::Warn => write!(f, "warn"),
            AlertLevel::Fatal => write!(f, "fatal"),
        }
    }
}

impl std::str::FromStr for AlertLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "none" => Ok(AlertLevel::None),
            "warn" | "warning" => Ok(AlertLevel::Warn),
            "fatal" => Ok(AlertLevel::Fatal),
            _ => Err(format!("unknown alert level: {s}")),
        }
    }
}

/// The condition behind a raised alert, e.g. `"excessive load"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{0}")]
pub struct AlertCause(String);

impl AlertCause {
    pub fn new(cause: impl Into<String>) -> Self {
        Self(cause.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of one alert evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertVerdict {
    pub message: String,
    pub level: AlertLevel,
    pub flag: bool,
    pub cause: Option<AlertCause>,
}

impl AlertVerdict {
    /// A verdict that raises nothing.
    pub fn quiet() -> Self {
        Self::default()
    }

    pub fn is_alert(&self) -> bool {
        self.flag
    }
}
