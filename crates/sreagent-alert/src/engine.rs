use crate::config::{Config, ALERT_GROUP};
use crate::error::{AlertError, Result};
use crate::rules::band::{BandRule, RuleChain};
use sreagent_common::types::{AlertCause, AlertVerdict, MetricsSnapshot};

/// Metric every threshold config must carry a band for.
pub const PRIMARY_METRIC: &str = "load";

/// A rule that fired: the metric it belongs to and its position in that
/// metric's chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub metric: String,
    pub rule: usize,
}

/// Verdict plus a record of how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub verdict: AlertVerdict,
    pub rules_checked: usize,
    pub matched: Vec<RuleMatch>,
}

pub struct AlertEvaluator {
    chains: Vec<RuleChain>,
}

impl AlertEvaluator {
    pub fn new(chains: Vec<RuleChain>) -> Self {
        Self { chains }
    }

    /// Builds one chain per metric in the `alert` group, with the
    /// [`PRIMARY_METRIC`] chain first and the rest in name order.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::MissingThreshold`] when no `load` band is
    /// configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let primary = config.band(ALERT_GROUP, PRIMARY_METRIC)?;

        let mut chains = vec![RuleChain::from_band(PRIMARY_METRIC, primary)];
        chains.extend(
            config
                .metrics(ALERT_GROUP)
                .filter(|(metric, _)| *metric != PRIMARY_METRIC)
                .map(|(metric, band)| RuleChain::from_band(metric, band)),
        );

        Ok(Self::new(chains))
    }

    pub fn chains(&self) -> &[RuleChain] {
        &self.chains
    }

    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> Result<Evaluation> {
        let mut rules_checked = 0;
        let mut matched = Vec::new();
        let mut fired: Vec<&BandRule> = Vec::new();

        for chain in &self.chains {
            let value = snapshot
                .get(&chain.metric)
                .ok_or_else(|| AlertError::UnknownMetric(chain.metric.clone()))?;

            for (index, rule) in chain.rules.iter().enumerate() {
                rules_checked += 1;
                if !rule.predicate.matches(value) {
                    continue;
                }

                matched.push(RuleMatch {
                    metric: chain.metric.clone(),
                    rule: index,
                });

                if rule.short_circuit {
                    tracing::debug!(
                        metric = %chain.metric,
                        value,
                        predicate = %rule.predicate,
                        "Short-circuit rule matched, stopping evaluation"
                    );
                    return Ok(Evaluation {
                        verdict: verdict_from(&[rule]),
                        rules_checked,
                        matched,
                    });
                }

                fired.push(rule);
                break;
            }
        }

        Ok(Evaluation {
            verdict: verdict_from(&fired),
            rules_checked,
            matched,
        })
    }
}

/// Evaluates a snapshot against the thresholds in `config`.
pub fn evaluate(snapshot: &MetricsSnapshot, config: &Config) -> Result<AlertVerdict> {
    let evaluation = AlertEvaluator::from_config(config)?.evaluate(snapshot)?;
    Ok(evaluation.verdict)
}

fn verdict_from(fired: &[&BandRule]) -> AlertVerdict {
    let Some(mut top) = fired.first().copied() else {
        return AlertVerdict::quiet();
    };
    for &rule in fired {
        if rule.level > top.level {
            top = rule;
        }
    }

    AlertVerdict {
        message: fired
            .iter()
            .map(|rule| rule.message.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        level: top.level,
        flag: true,
        cause: Some(AlertCause::new(top.cause.clone())),
    }
}
