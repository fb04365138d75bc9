//! # loadstats
//!
//! In-memory representation of load test measurements: metrics and their
//! types, immutable tag sets, submetrics derived from filter expressions,
//! samples and summaries.
//!
//! Producers resolve a [`Metric`] (usually through a [`Registry`]), stamp each
//! observation as a [`Sample`] carrying a shared [`SampleTags`], and route it
//! into the metric's [`Sink`]. Consumers ask for a [`Summary`] when reporting.

pub mod config;
pub mod error;
pub mod humanize;
pub mod metrics;
pub mod registry;
pub mod sink;
pub mod submetric;
pub mod tags;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use config::StatsConfig;
pub use error::StatsError;
pub use metrics::{Metric, Threshold, Thresholds};
pub use registry::{Registry, RegistryBuilder};
pub use sink::Sink;
pub use submetric::Submetric;
pub use tags::{SampleTags, TagMap};
pub use types::{MetricType, ValueType};

/// A single measurement.
#[derive(Debug, Clone)]
pub struct Sample {
    pub metric: Arc<Metric>,
    pub time: DateTime<Utc>,
    pub tags: SampleTags,
    pub value: f64,
}

impl Sample {
    pub fn new(metric: Arc<Metric>, time: DateTime<Utc>, tags: SampleTags, value: f64) -> Self {
        Self {
            metric,
            time,
            tags,
            value,
        }
    }
}

/// Statistics of a metric's sink at the time it was requested
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub metric: Arc<Metric>,
    pub summary: BTreeMap<String, f64>,
}
