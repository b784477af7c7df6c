use crate::plugin::{Measurement, MeasurementPlugin, Result};
use sreagent_common::types::{AlertLevel, AlertVerdict};
use std::future::Future;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// How often and how many times the host ticks the plugin.
#[derive(Debug, Clone, Copy)]
pub struct TickSchedule {
    pub interval: Duration,
    /// 0 runs until shutdown
    pub iterations: u64,
}

/// Drives `measure` then `alert` once per tick until the schedule is
/// exhausted or `shutdown` resolves. Returns the number of ticks run.
pub async fn run<P, F>(plugin: &mut P, schedule: TickSchedule, shutdown: F) -> u64
where
    P: MeasurementPlugin,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut tick = interval(schedule.interval);
    // a slow tick pushes the next one back instead of bunching the backlog
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut completed = 0;

    tracing::info!(
        interval_secs = schedule.interval.as_secs_f64(),
        iterations = schedule.iterations,
        "Starting tick loop"
    );

    while schedule.iterations == 0 || completed < schedule.iterations {
        tokio::select! {
            _ = tick.tick() => {
                completed += 1;
                if let Err(e) = run_tick(plugin, completed) {
                    tracing::error!(iteration = completed, error = %e, "Tick failed");
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutting down gracefully");
                break;
            }
        }
    }

    completed
}

/// One measure/alert cycle, logged as a single record.
///
/// Once `measure` succeeds the record is written even if `alert` fails, with
/// the alert error as its cause.
pub fn run_tick<P: MeasurementPlugin>(plugin: &mut P, iteration: u64) -> Result<AlertVerdict> {
    let measurement = plugin.measure()?;
    let outcome = plugin.alert(&measurement.snapshot);
    log_tick(iteration, &measurement, plugin.state(), &outcome);
    outcome
}

fn log_tick<S: serde::Serialize>(
    iteration: u64,
    measurement: &Measurement,
    state: &S,
    outcome: &Result<AlertVerdict>,
) {
    let measure = String::from_utf8_lossy(&measurement.snapshot);
    let raw = String::from_utf8_lossy(&measurement.raw);
    let state = serde_json::to_string(state).unwrap_or_else(|e| format!("<unserializable: {e}>"));

    let verdict = match outcome {
        Ok(verdict) => verdict,
        Err(e) => {
            tracing::error!(
                iteration,
                timestamp = measurement.timestamp,
                measure = %measure,
                raw = %raw,
                state = %state,
                is_alert = false,
                alert_cause = %e,
                "Tick"
            );
            return;
        }
    };

    let cause = verdict
        .cause
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();

    // fatal verdicts need someone to act on them
    match verdict.level {
        AlertLevel::Fatal => tracing::error!(
            iteration,
            timestamp = measurement.timestamp,
            measure = %measure,
            raw = %raw,
            state = %state,
            alert_msg = %verdict.message,
            alert_lvl = %verdict.level,
            is_alert = verdict.flag,
            alert_cause = %cause,
            "Tick"
        ),
        AlertLevel::Warn => tracing::warn!(
            iteration,
            timestamp = measurement.timestamp,
            measure = %measure,
            raw = %raw,
            state = %state,
            alert_msg = %verdict.message,
            alert_lvl = %verdict.level,
            is_alert = verdict.flag,
            alert_cause = %cause,
            "Tick"
        ),
        AlertLevel::None => tracing::info!(
            iteration,
            timestamp = measurement.timestamp,
            measure = %measure,
            raw = %raw,
            state = %state,
            alert_msg = %verdict.message,
            alert_lvl = %verdict.level,
            is_alert = verdict.flag,
            "Tick"
        ),
    }
}
