//! Aggregation sinks, one per metric type.
//!
//! A sink is the only place where a metric's evolving state lives. Every sink
//! guards its state with a mutex so samples can be added from many producers
//! while a reporter formats the current summary.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::StatsConfig;
use crate::types::MetricType;
use crate::Sample;

/// Incorporates samples and reports statistics over them.
pub trait Sink: Send + Sync + Debug {
    /// Incorporate one sample's value
    fn add(&self, sample: &Sample);

    /// Statistic name to value, given the time window the samples span
    fn format(&self, window: Duration) -> BTreeMap<String, f64>;
}

/// Builds the sink matching a metric type.
pub fn for_type(typ: MetricType, config: &StatsConfig) -> Box<dyn Sink> {
    match typ {
        MetricType::Counter => Box::<CounterSink>::default(),
        MetricType::Gauge => Box::<GaugeSink>::default(),
        MetricType::Trend => Box::new(TrendSink::with_percentiles(
            config.trend_percentiles.clone(),
        )),
        MetricType::Rate => Box::<RateSink>::default(),
    }
}

// a poisoned sink still holds plain numbers, keep using them
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Default)]
struct CounterState {
    value: f64,
    first: Option<DateTime<Utc>>,
}

/// Sums its values.
#[derive(Debug, Default)]
pub struct CounterSink {
    state: Mutex<CounterState>,
}

impl CounterSink {
    pub fn value(&self) -> f64 {
        lock(&self.state).value
    }

    /// Time of the first sample seen
    pub fn first(&self) -> Option<DateTime<Utc>> {
        lock(&self.state).first
    }
}

impl Sink for CounterSink {
    fn add(&self, sample: &Sample) {
        let mut state = lock(&self.state);
        state.value += sample.value;
        if state.first.is_none() {
            state.first = Some(sample.time);
        }
    }

    fn format(&self, window: Duration) -> BTreeMap<String, f64> {
        let value = lock(&self.state).value;
        BTreeMap::from([
            ("count".to_string(), value),
            ("rate".to_string(), value / window.as_secs_f64()),
        ])
    }
}

#[derive(Debug, Default)]
struct GaugeState {
    value: f64,
    min: f64,
    max: f64,
    min_set: bool,
}

/// Keeps the latest value.
#[derive(Debug, Default)]
pub struct GaugeSink {
    state: Mutex<GaugeState>,
}

impl GaugeSink {
    pub fn min(&self) -> f64 {
        lock(&self.state).min
    }

    pub fn max(&self) -> f64 {
        lock(&self.state).max
    }
}

impl Sink for GaugeSink {
    fn add(&self, sample: &Sample) {
        let mut state = lock(&self.state);
        state.value = sample.value;
        if sample.value > state.max {
            state.max = sample.value;
        }
        if sample.value < state.min || !state.min_set {
            state.min = sample.value;
            state.min_set = true;
        }
    }

    fn format(&self, _window: Duration) -> BTreeMap<String, f64> {
        BTreeMap::from([("value".to_string(), lock(&self.state).value)])
    }
}

#[derive(Debug, Default)]
struct TrendState {
    values: Vec<f64>,
    sorted: bool,
    min: f64,
    max: f64,
    sum: f64,
}

impl TrendState {
    fn sort(&mut self) {
        if !self.sorted {
            self.values.sort_by(f64::total_cmp);
            self.sorted = true;
        }
    }

    fn percentile(&mut self, pct: f64) -> f64 {
        let pct = pct.clamp(0.0, 1.0);
        match self.values.len() {
            0 => 0.0,
            1 => self.values[0],
            2 => {
                self.sort();
                if pct < 0.5 {
                    self.values[0]
                } else {
                    self.values[1]
                }
            }
            n => {
                self.sort();
                let i = pct * (n as f64 - 1.0);
                let lo = self.values[i.floor() as usize];
                let hi = self.values[i.ceil() as usize];
                lo + (hi - lo) * (i - i.floor())
            }
        }
    }

    fn median(&mut self) -> f64 {
        let n = self.values.len();
        if n == 0 {
            return 0.0;
        }
        self.sort();
        if n % 2 == 0 {
            (self.values[n / 2 - 1] + self.values[n / 2]) / 2.0
        } else {
            self.values[n / 2]
        }
    }
}

/// Keeps every value to report the distribution.
#[derive(Debug)]
pub struct TrendSink {
    percentiles: Vec<f64>,
    state: Mutex<TrendState>,
}

impl Default for TrendSink {
    fn default() -> Self {
        TrendSink::with_percentiles(StatsConfig::default().trend_percentiles)
    }
}

impl TrendSink {
    /// Percentiles are given in `[0, 100]`.
    pub fn with_percentiles(percentiles: Vec<f64>) -> Self {
        TrendSink {
            percentiles,
            state: Mutex::new(TrendState::default()),
        }
    }

    pub fn count(&self) -> usize {
        lock(&self.state).values.len()
    }

    /// Value at `pct` in `[0, 1]`, interpolated between the closest ranks.
    /// Out of range `pct` is clamped.
    pub fn p(&self, pct: f64) -> f64 {
        lock(&self.state).percentile(pct)
    }
}

impl Sink for TrendSink {
    fn add(&self, sample: &Sample) {
        let mut state = lock(&self.state);
        let v = sample.value;
        if state.values.is_empty() {
            state.min = v;
            state.max = v;
        } else {
            state.min = state.min.min(v);
            state.max = state.max.max(v);
        }
        state.sum += v;
        state.values.push(v);
        state.sorted = false;
    }

    fn format(&self, _window: Duration) -> BTreeMap<String, f64> {
        let mut state = lock(&self.state);
        let count = state.values.len();
        let avg = if count == 0 { 0.0 } else { state.sum / count as f64 };

        let mut out = BTreeMap::from([
            ("min".to_string(), state.min),
            ("max".to_string(), state.max),
            ("avg".to_string(), avg),
            ("med".to_string(), state.median()),
        ]);
        for pct in &self.percentiles {
            out.insert(format!("p({pct})"), state.percentile(pct / 100.0));
        }
        out
    }
}

#[derive(Debug, Default)]
struct RateState {
    trues: u64,
    total: u64,
}

/// Share of non-zero values.
#[derive(Debug, Default)]
pub struct RateSink {
    state: Mutex<RateState>,
}

impl Sink for RateSink {
    fn add(&self, sample: &Sample) {
        let mut state = lock(&self.state);
        state.total += 1;
        if sample.value != 0.0 {
            state.trues += 1;
        }
    }

    fn format(&self, _window: Duration) -> BTreeMap<String, f64> {
        let state = lock(&self.state);
        let rate = if state.total == 0 {
            0.0
        } else {
            state.trues as f64 / state.total as f64
        };
        BTreeMap::from([("rate".to_string(), rate)])
    }
}
