use crate::config::ThresholdBand;
use sreagent_common::types::AlertLevel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    Below(f64),
    Above(f64),
}

impl Predicate {
    pub fn matches(&self, value: f64) -> bool {
        match self {
            Self::Below(threshold) => value < *threshold,
            Self::Above(threshold) => value > *threshold,
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Below(threshold) => write!(f, "< {threshold}"),
            Self::Above(threshold) => write!(f, "> {threshold}"),
        }
    }
}

/// A single threshold rule on one metric.
///
/// `short_circuit` marks a finding severe enough to end the whole
/// evaluation and stand as the verdict on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct BandRule {
    pub predicate: Predicate,
    pub level: AlertLevel,
    pub message: String,
    pub cause: String,
    pub short_circuit: bool,
}

/// An ordered rule list for one metric. The first matching rule ends the
/// chain.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleChain {
    pub metric: String,
    pub rules: Vec<BandRule>,
}

impl RuleChain {
    /// Builds the low / engineered / design chain for a band.
    ///
    /// The low check runs first so under-use always wins; the engineered
    /// check runs before design so overload preempts the busy warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use sreagent_alert::config::ThresholdBand;
    /// use sreagent_alert::rules::band::RuleChain;
    ///
    /// let band = ThresholdBand { low: 2.0, design: 60.0, engineered: 80.0 };
    /// let chain = RuleChain::from_band("load", &band);
    /// let causes: Vec<&str> = chain.rules.iter().map(|r| r.cause.as_str()).collect();
    /// assert_eq!(causes, ["low load", "excessive load", "moderately high load"]);
    /// ```
    pub fn from_band(metric: &str, band: &ThresholdBand) -> Self {
        let rules = vec![
            BandRule {
                predicate: Predicate::Below(band.low),
                level: AlertLevel::Warn,
                message: format!("{metric} below low design point"),
                cause: format!("low {metric}"),
                short_circuit: false,
            },
            BandRule {
                predicate: Predicate::Above(band.engineered),
                level: AlertLevel::Fatal,
                message: format!("{metric} above engineered point"),
                cause: format!("excessive {metric}"),
                short_circuit: true,
            },
            BandRule {
                predicate: Predicate::Above(band.design),
                level: AlertLevel::Warn,
                message: format!("{metric} above design point"),
                cause: format!("moderately high {metric}"),
                short_circuit: false,
            },
        ];

        Self {
            metric: metric.to_string(),
            rules,
        }
    }
}
