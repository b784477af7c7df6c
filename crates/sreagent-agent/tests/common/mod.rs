#![allow(dead_code)]

use sreagent_agent::plugin::{LoadPlugin, MeasurementPlugin};
use sreagent_collector::exporter::LoadExporter;
use sreagent_collector::{LoadSampler, SampleError};
use sreagent_common::types::{LoadSample, LoadStats};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const THRESHOLDS: &str = r#"{"alert":{"load":{"low":2,"design":60.0,"engineered":80.0}}}"#;

/// Sampler that replays queued results, then repeats the last good sample.
pub struct ScriptedSampler {
    cores: Option<usize>,
    script: VecDeque<Option<LoadSample>>,
    last: LoadSample,
    stall: Option<Duration>,
    started: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedSampler {
    pub fn new(cores: usize) -> Self {
        Self {
            cores: Some(cores),
            script: VecDeque::new(),
            last: LoadSample::default(),
            stall: None,
            started: Arc::default(),
        }
    }

    pub fn without_cores() -> Self {
        Self {
            cores: None,
            ..Self::new(1)
        }
    }

    pub fn then_load(mut self, load1: f64) -> Self {
        self.script.push_back(Some(sample(load1)));
        self
    }

    pub fn then_fail(mut self) -> Self {
        self.script.push_back(None);
        self
    }

    /// Blocks the first `sample` call for `stall`.
    pub fn stalling_once(mut self, stall: Duration) -> Self {
        self.stall = Some(stall);
        self
    }

    /// Instants at which `sample` was entered, shared with the caller.
    pub fn sample_starts(&self) -> Arc<Mutex<Vec<Instant>>> {
        Arc::clone(&self.started)
    }
}

impl LoadSampler for ScriptedSampler {
    fn core_count(&mut self) -> sreagent_collector::Result<usize> {
        self.cores
            .ok_or_else(|| SampleError::Unavailable("no cpu list".to_string()))
    }

    fn sample(&mut self) -> sreagent_collector::Result<LoadSample> {
        self.started.lock().unwrap().push(Instant::now());
        if let Some(stall) = self.stall.take() {
            std::thread::sleep(stall);
        }
        match self.script.pop_front() {
            Some(Some(sample)) => {
                self.last = sample;
                Ok(sample)
            }
            Some(None) => Err(SampleError::Unsupported),
            None => Ok(self.last),
        }
    }
}

pub fn sample(load1: f64) -> LoadSample {
    LoadSample {
        load1,
        load5: load1 / 2.0,
        load15: load1 / 4.0,
        stats: Some(LoadStats {
            procs_running: 2,
            procs_blocked: 0,
            ctxt: 4096,
        }),
    }
}

/// `io::Write` sink that tracing output can be captured into.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber that records every event into the returned buffer.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, buffer.contents())
}

pub fn build_plugin(sampler: ScriptedSampler) -> LoadPlugin<ScriptedSampler> {
    let exporter = LoadExporter::new().expect("gauge families should build");
    LoadPlugin::new(sampler, exporter)
}

pub fn init_plugin(sampler: ScriptedSampler) -> LoadPlugin<ScriptedSampler> {
    let mut plugin = build_plugin(sampler);
    plugin.init(THRESHOLDS).expect("init should succeed");
    plugin
}
