use crate::error::{AlertError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Rule group holding the alerting bands.
pub const ALERT_GROUP: &str = "alert";

/// One of the three points of a [`ThresholdBand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Low,
    Design,
    Engineered,
}

impl FromStr for Bound {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Self::Low),
            "design" => Ok(Self::Design),
            "engineered" => Ok(Self::Engineered),
            _ => Err(AlertError::UnknownBound(s.to_string())),
        }
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Design => write!(f, "design"),
            Self::Engineered => write!(f, "engineered"),
        }
    }
}

/// Ordered thresholds for one metric: below `low` is under-used, above
/// `design` is busy, above `engineered` is overloaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdBand {
    pub low: f64,
    pub design: f64,
    pub engineered: f64,
}

impl ThresholdBand {
    pub fn get(&self, bound: Bound) -> f64 {
        match bound {
            Bound::Low => self.low,
            Bound::Design => self.design,
            Bound::Engineered => self.engineered,
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.low < self.design && self.design < self.engineered
    }
}

/// Threshold document: rule group → metric → band.
///
/// # Examples
///
/// ```
/// use sreagent_alert::config::{Bound, Config};
///
/// let config = Config::parse(
///     r#"{"alert": {"load": {"low": 2, "design": 60.0, "engineered": 80.0}}}"#,
/// ).unwrap();
/// assert_eq!(config.lookup("alert", "load", Bound::Design).unwrap(), 60.0);
/// assert!(config.lookup("alert", "memory", Bound::Low).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    groups: BTreeMap<String, BTreeMap<String, ThresholdBand>>,
}

impl Config {
    /// Parses and validates a JSON threshold document.
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (group, metrics) in &self.groups {
            for (metric, band) in metrics {
                if !band.is_ordered() {
                    return Err(AlertError::InvalidBand {
                        group: group.clone(),
                        metric: metric.clone(),
                        low: band.low,
                        design: band.design,
                        engineered: band.engineered,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn band(&self, group: &str, metric: &str) -> Result<&ThresholdBand> {
        self.groups
            .get(group)
            .and_then(|metrics| metrics.get(metric))
            .ok_or_else(|| AlertError::MissingThreshold {
                group: group.to_string(),
                metric: metric.to_string(),
                bound: "*".to_string(),
            })
    }

    pub fn lookup(&self, group: &str, metric: &str, bound: Bound) -> Result<f64> {
        self.band(group, metric)
            .map(|band| band.get(bound))
            .map_err(|_| AlertError::MissingThreshold {
                group: group.to_string(),
                metric: metric.to_string(),
                bound: bound.to_string(),
            })
    }

    /// Metrics configured under `group`, in name order.
    pub fn metrics<'a>(&'a self, group: &str) -> impl Iterator<Item = (&'a str, &'a ThresholdBand)> {
        self.groups
            .get(group)
            .into_iter()
            .flat_map(|metrics| metrics.iter().map(|(name, band)| (name.as_str(), band)))
    }
}

/// Holds the active threshold config.
///
/// A failed [`load`](Self::load) is logged and leaves the previous config in
/// place (empty if nothing was loaded yet).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ConfigStore {
    config: Config,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, text: &str) -> Result<&Config> {
        match Config::parse(text) {
            Ok(config) => {
                self.config = config;
                tracing::info!(config = ?self.config, "Threshold config loaded");
                Ok(&self.config)
            }
            Err(e) => {
                tracing::error!(error = %e, config = %text, "Failed to load threshold config, keeping previous");
                Err(e)
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Looks up one threshold by its group, metric and bound name.
    pub fn lookup(&self, group: &str, metric: &str, bound: &str) -> Result<f64> {
        self.config.lookup(group, metric, bound.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_DOC: &str = r#"
        {
            "alert": {
                "load": { "low": 2, "design": 60.0, "engineered": 80.0 }
            }
        }
    "#;

    #[test]
    fn parse_accepts_integer_and_float_bounds() {
        let config = Config::parse(DEFAULT_DOC).unwrap();
        let band = config.band(ALERT_GROUP, "load").unwrap();
        assert_eq!(band.low, 2.0);
        assert_eq!(band.design, 60.0);
        assert_eq!(band.engineered, 80.0);
    }

    #[test]
    fn parse_rejects_unordered_band() {
        let err = Config::parse(r#"{"alert":{"load":{"low":70,"design":60,"engineered":80}}}"#)
            .unwrap_err();
        assert!(matches!(err, AlertError::InvalidBand { ref metric, .. } if metric == "load"));

        let err = Config::parse(r#"{"alert":{"load":{"low":2,"design":80,"engineered":80}}}"#)
            .unwrap_err();
        assert!(matches!(err, AlertError::InvalidBand { .. }));
    }

    #[test]
    fn parse_rejects_missing_or_unknown_bound_keys() {
        assert!(matches!(
            Config::parse(r#"{"alert":{"load":{"low":2,"design":60}}}"#),
            Err(AlertError::Parse(_))
        ));
        assert!(matches!(
            Config::parse(r#"{"alert":{"load":{"low":2,"design":60,"engineered":80,"max":99}}}"#),
            Err(AlertError::Parse(_))
        ));
    }

    #[test]
    fn lookup_missing_key_is_typed_error() {
        let config = Config::parse(DEFAULT_DOC).unwrap();
        match config.lookup("alert", "memory", Bound::Engineered) {
            Err(AlertError::MissingThreshold {
                group,
                metric,
                bound,
            }) => {
                assert_eq!(group, "alert");
                assert_eq!(metric, "memory");
                assert_eq!(bound, "engineered");
            }
            other => panic!("expected MissingThreshold, got {other:?}"),
        }
        assert!(config.lookup("notify", "load", Bound::Low).is_err());
    }

    #[test]
    fn store_lookup_by_bound_name() {
        let mut store = ConfigStore::new();
        store.load(DEFAULT_DOC).unwrap();
        assert_eq!(store.lookup("alert", "load", "low").unwrap(), 2.0);
        assert_eq!(store.lookup("alert", "load", "engineered").unwrap(), 80.0);
        assert!(matches!(
            store.lookup("alert", "load", "critical"),
            Err(AlertError::UnknownBound(_))
        ));
    }

    #[test]
    fn failed_load_keeps_previous_config() {
        let mut store = ConfigStore::new();
        store.load(DEFAULT_DOC).unwrap();
        let before = store.config().clone();

        assert!(store.load("{ not json").is_err());
        assert_eq!(store.config(), &before);

        assert!(store
            .load(r#"{"alert":{"load":{"low":90,"design":60,"engineered":80}}}"#)
            .is_err());
        assert_eq!(store.config(), &before);
    }

    #[test]
    fn failed_first_load_leaves_store_empty() {
        let mut store = ConfigStore::new();
        assert!(store.load("").is_err());
        assert!(store.config().is_empty());
    }

    #[test]
    fn metrics_iterates_in_name_order() {
        let config = Config::parse(
            r#"{"alert":{
                "saturation":{"low":1,"design":70,"engineered":90},
                "load":{"low":2,"design":60,"engineered":80},
                "load15m":{"low":1,"design":50,"engineered":75}
            }}"#,
        )
        .unwrap();
        let names: Vec<&str> = config.metrics(ALERT_GROUP).map(|(name, _)| name).collect();
        assert_eq!(names, vec!["load", "load15m", "saturation"]);
        assert_eq!(config.metrics("missing").count(), 0);
    }
}
