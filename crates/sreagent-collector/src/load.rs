use crate::{LoadSampler, Result, SampleError};
use sreagent_common::types::{CoreCount, LoadSample, LoadStats, MetricsSnapshot};
use sysinfo::System;

/// Upper bound of the throughput axis; load is expressed as a percentage.
pub const THROUGHPUT_MAX: f64 = 100.0;

/// [`LoadSampler`] backed by `sysinfo`.
pub struct SysinfoSampler {
    system: System,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadSampler for SysinfoSampler {
    fn core_count(&mut self) -> Result<usize> {
        self.system.refresh_cpu_all();
        match self.system.cpus().len() {
            0 => Err(SampleError::Unavailable("no CPUs reported".to_string())),
            n => Ok(n),
        }
    }

    fn sample(&mut self) -> Result<LoadSample> {
        // sysinfo reports zeros on Windows rather than failing
        if !sysinfo::IS_SUPPORTED_SYSTEM || cfg!(windows) {
            return Err(SampleError::Unsupported);
        }

        let load_avg = System::load_average();
        let mut sample = LoadSample {
            load1: load_avg.one,
            load5: load_avg.five,
            load15: load_avg.fifteen,
            stats: None,
        };

        if [sample.load1, sample.load5, sample.load15]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(SampleError::Unavailable(format!(
                "implausible load average {sample:?}"
            )));
        }

        sample.stats = match read_load_stats() {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::debug!(error = %e, "Run-queue counters unavailable");
                None
            }
        };
        Ok(sample)
    }
}

/// Reads run-queue and context-switch counters from `/proc/stat`.
#[cfg(target_os = "linux")]
pub fn read_load_stats() -> Result<LoadStats> {
    let text = std::fs::read_to_string("/proc/stat")
        .map_err(|e| SampleError::Unavailable(format!("/proc/stat: {e}")))?;
    parse_proc_stat(&text)
        .ok_or_else(|| SampleError::Unavailable("/proc/stat lacks scheduler counters".to_string()))
}

#[cfg(not(target_os = "linux"))]
pub fn read_load_stats() -> Result<LoadStats> {
    Err(SampleError::Unsupported)
}

/// Pulls `procs_running`, `procs_blocked` and `ctxt` out of `/proc/stat`
/// text. Returns `None` unless all three are present.
pub fn parse_proc_stat(text: &str) -> Option<LoadStats> {
    let mut running = None;
    let mut blocked = None;
    let mut ctxt = None;

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("procs_running ") {
            running = rest.trim().parse().ok();
        } else if let Some(rest) = line.strip_prefix("procs_blocked ") {
            blocked = rest.trim().parse().ok();
        } else if let Some(rest) = line.strip_prefix("ctxt ") {
            ctxt = rest.trim().parse().ok();
        }
    }

    Some(LoadStats {
        procs_running: running?,
        procs_blocked: blocked?,
        ctxt: ctxt?,
    })
}

/// Normalizes a raw load sample against the core count and maps it onto the
/// USE axes.
///
/// Each window becomes `100 * load / cores`. The 1-minute figure doubles as
/// utilization, saturation, throughput and the alerting `load` value; load
/// has no latency or error analogue, so both stay at zero.
///
/// # Examples
///
/// ```
/// use sreagent_collector::load::derive;
/// use sreagent_common::types::{CoreCount, LoadSample};
///
/// let sample = LoadSample { load1: 2.0, load5: 1.0, load15: 0.5, stats: None };
/// let snapshot = derive(&sample, CoreCount::new(4));
/// assert_eq!(snapshot.load1m, 50.0);
/// assert_eq!(snapshot.load5m, 25.0);
/// assert_eq!(snapshot.saturation, snapshot.load1m);
/// ```
pub fn derive(sample: &LoadSample, cores: CoreCount) -> MetricsSnapshot {
    let cores = f64::from(cores.get());
    let percent = |raw: f64| 100.0 * raw / cores;

    let load1m = percent(sample.load1);
    MetricsSnapshot {
        load1m,
        load5m: percent(sample.load5),
        load15m: percent(sample.load15),
        utilization: load1m,
        load: load1m,
        latency: 0.0,
        throughput: load1m,
        throughputmax: THROUGHPUT_MAX,
        saturation: load1m,
        errors: 0.0,
        degraded: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(load1: f64, load5: f64, load15: f64) -> LoadSample {
        LoadSample {
            load1,
            load5,
            load15,
            stats: None,
        }
    }

    const PROC_STAT: &str = "\
cpu  10132153 290696 3084719 46828483 16683 0 25195 0 0 0
cpu0 1393280 32966 572056 13343292 6130 0 17875 0 0 0
intr 199292 0 9 0 0 0 0 3 0 1 0 0 0 0
ctxt 1990473
btime 1062191376
processes 2915
procs_running 3
procs_blocked 1
softirq 229245 0 3 0 0 0 0 0 0 0 0
";

    #[test]
    fn parse_proc_stat_reads_scheduler_counters() {
        let stats = parse_proc_stat(PROC_STAT).unwrap();
        assert_eq!(stats.procs_running, 3);
        assert_eq!(stats.procs_blocked, 1);
        assert_eq!(stats.ctxt, 1990473);
    }

    #[test]
    fn parse_proc_stat_requires_every_counter() {
        let without_blocked: String = PROC_STAT
            .lines()
            .filter(|line| !line.starts_with("procs_blocked"))
            .map(|line| format!("{line}\n"))
            .collect();
        assert_eq!(parse_proc_stat(&without_blocked), None);
        assert_eq!(parse_proc_stat("procs_running x\nprocs_blocked 0\nctxt 1\n"), None);
        assert_eq!(parse_proc_stat(""), None);
    }

    #[test]
    fn derive_normalizes_by_core_count() {
        let snapshot = derive(&sample(2.0, 4.0, 6.0), CoreCount::new(4));
        assert_eq!(snapshot.load1m, 50.0);
        assert_eq!(snapshot.load5m, 100.0);
        assert_eq!(snapshot.load15m, 150.0);
    }

    #[test]
    fn derive_maps_use_axes_from_one_minute_load() {
        let snapshot = derive(&sample(3.0, 1.0, 1.0), CoreCount::new(6));
        assert_eq!(snapshot.load1m, 50.0);
        assert_eq!(snapshot.utilization, 50.0);
        assert_eq!(snapshot.load, 50.0);
        assert_eq!(snapshot.throughput, 50.0);
        assert_eq!(snapshot.saturation, 50.0);
        assert_eq!(snapshot.throughputmax, 100.0);
        assert_eq!(snapshot.latency, 0.0);
        assert_eq!(snapshot.errors, 0.0);
        assert!(!snapshot.degraded);
    }

    #[test]
    fn derive_is_deterministic() {
        let raw = sample(0.37, 0.41, 0.29);
        let first = serde_json::to_vec(&derive(&raw, CoreCount::new(3))).unwrap();
        let second = serde_json::to_vec(&derive(&raw, CoreCount::new(3))).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn derive_with_zero_or_negative_cores_uses_one() {
        for cores in [0, -1, -64] {
            let snapshot = derive(&sample(1.5, 1.0, 0.5), CoreCount::new(cores));
            assert!(snapshot.load1m.is_finite());
            assert_eq!(snapshot.load1m, 150.0);
            assert_eq!(snapshot.load15m, 50.0);
        }
    }

    #[test]
    fn derive_zero_sample_yields_zero_metrics() {
        let snapshot = derive(&LoadSample::default(), CoreCount::new(8));
        assert_eq!(snapshot.load1m, 0.0);
        assert_eq!(snapshot.load, 0.0);
        assert_eq!(snapshot.throughputmax, 100.0);
    }

    #[test]
    fn sysinfo_sampler_reports_at_least_one_core() {
        let mut sampler = SysinfoSampler::new();
        let cores = sampler.core_count().unwrap();
        assert!(cores >= 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn sysinfo_sampler_reads_load_on_linux() {
        let mut sampler = SysinfoSampler::new();
        let raw = sampler.sample().unwrap();
        assert!(raw.load1 >= 0.0);
        assert!(raw.load15.is_finite());
        let stats = raw.stats.expect("linux exposes /proc/stat");
        assert!(stats.ctxt > 0);
    }

    #[cfg(not(target_os = "linux"))]
    #[test]
    fn load_stats_unsupported_off_linux() {
        assert!(matches!(read_load_stats(), Err(SampleError::Unsupported)));
    }
}
