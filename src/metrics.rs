//! Metric definitions.

use std::sync::Arc;
use std::time::Duration;

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

use crate::config::StatsConfig;
use crate::humanize;
use crate::sink::{self, Sink};
use crate::submetric::Submetric;
use crate::types::{MetricType, ValueType};
use crate::{Sample, Summary};

/// A threshold rule on a metric. Evaluation happens elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub source: String,
    pub failed: bool,
}

/// Threshold rules of a metric, serialized as their source strings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thresholds {
    pub thresholds: Vec<Threshold>,
}

impl Thresholds {
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn any_failed(&self) -> bool {
        self.thresholds.iter().any(|t| t.failed)
    }
}

impl Serialize for Thresholds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.thresholds.len()))?;
        for t in &self.thresholds {
            seq.serialize_element(&t.source)?;
        }
        seq.end()
    }
}

/// A named, typed stream of measurements and its aggregation sink.
#[derive(Debug, Serialize)]
pub struct Metric {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: MetricType,
    pub contains: ValueType,
    /// Unset until a threshold has been evaluated
    pub tainted: Option<bool>,
    pub thresholds: Thresholds,
    pub submetrics: Vec<Arc<Submetric>>,
    /// Set when this metric materializes a submetric
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<Submetric>,
    #[serde(skip)]
    pub sink: Box<dyn Sink>,
}

impl Metric {
    /// Creates a metric with the sink its type calls for.
    /// `contains` defaults to [`ValueType::Default`].
    pub fn new(name: impl Into<String>, typ: MetricType, contains: Option<ValueType>) -> Self {
        Self::with_config(name, typ, contains, &StatsConfig::default())
    }

    pub fn with_config(
        name: impl Into<String>,
        typ: MetricType,
        contains: Option<ValueType>,
        config: &StatsConfig,
    ) -> Self {
        Metric {
            name: name.into(),
            typ,
            contains: contains.unwrap_or_default(),
            tainted: None,
            thresholds: Thresholds::default(),
            submetrics: Vec::new(),
            sub: None,
            sink: sink::for_type(typ, config),
        }
    }

    /// Like [`Metric::new`] but from a raw type discriminant, `None` when it
    /// does not name a metric type.
    pub fn from_raw(name: impl Into<String>, raw_type: u8, contains: Option<ValueType>) -> Option<Self> {
        let typ = MetricType::try_from(raw_type).ok()?;
        Some(Metric::new(name, typ, contains))
    }

    pub fn add_threshold(&mut self, source: impl Into<String>) {
        self.thresholds.thresholds.push(Threshold {
            source: source.into(),
            failed: false,
        });
    }

    pub fn set_tainted(&mut self, tainted: bool) {
        self.tainted = Some(tainted);
    }

    /// Formats a value according to the metric and value types.
    pub fn humanize_value(&self, v: f64) -> String {
        if self.typ == MetricType::Rate {
            // truncate to two decimals, never round up
            let truncated = (v * 100.0 * 100.0) as i64 as f64 / 100.0;
            return format!("{truncated:.2}%");
        }
        match self.contains {
            ValueType::Time => {
                let mut d = v as i64;
                const MICRO: i64 = 1_000;
                const MILLI: i64 = 1_000_000;
                const SECOND: i64 = 1_000_000_000;
                const MINUTE: i64 = 60 * SECOND;
                if d > MINUTE {
                    d -= d % SECOND;
                } else if d > SECOND {
                    d -= d % (10 * MILLI);
                } else if d > MILLI {
                    d -= d % (10 * MICRO);
                } else if d > MICRO {
                    d -= d % 10;
                }
                humanize::format_duration(d)
            }
            ValueType::Data => humanize::format_bytes(v as u64),
            ValueType::Default => humanize::format_float(v),
        }
    }

    /// Incorporates a sample into this metric and every submetric it matches.
    pub fn add(&self, sample: &Sample) {
        self.sink.add(sample);
        for sm in &self.submetrics {
            let Some(metric) = &sm.metric else {
                continue;
            };
            if sm.matches(&sample.tags) {
                tracing::trace!(submetric = %sm.name, value = sample.value, "sample matched submetric");
                metric.sink.add(sample);
            }
        }
    }

    /// Snapshot of the sink's statistics over `window`.
    pub fn summary(self: &Arc<Self>, window: Duration) -> Summary {
        Summary {
            metric: Arc::clone(self),
            summary: self.sink.format(window),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::tags::SampleTags;

    #[test]
    fn test_new_defaults() {
        let m = Metric::new("http_reqs", MetricType::Counter, None);
        assert_eq!(m.name, "http_reqs");
        assert_eq!(m.contains, ValueType::Default);
        assert_eq!(m.tainted, None);
        assert!(m.thresholds.is_empty());
        assert!(m.submetrics.is_empty());
        assert!(m.sub.is_none());

        let m = Metric::new("http_req_duration", MetricType::Trend, Some(ValueType::Time));
        assert_eq!(m.contains, ValueType::Time);
    }

    #[test]
    fn test_from_raw() {
        let m = Metric::from_raw("vus", 1, None).unwrap();
        assert_eq!(m.typ, MetricType::Gauge);
        assert!(Metric::from_raw("vus", 4, None).is_none());
        assert!(Metric::from_raw("vus", u8::MAX, Some(ValueType::Data)).is_none());
    }

    #[test]
    fn test_sink_follows_type() {
        let cases = [
            (MetricType::Counter, vec!["count", "rate"]),
            (MetricType::Gauge, vec!["value"]),
            (MetricType::Trend, vec!["avg", "max", "med", "min", "p(90)", "p(95)"]),
            (MetricType::Rate, vec!["rate"]),
        ];
        for (typ, keys) in cases {
            let m = Metric::new("m", typ, None);
            let formatted = m.sink.format(Duration::from_secs(1));
            let names: Vec<_> = formatted.keys().map(String::as_str).collect();
            assert_eq!(names, keys, "{typ}");
        }
    }

    #[test]
    fn test_humanize_rate_truncates() {
        let m = Metric::new("checks", MetricType::Rate, None);
        assert_eq!(m.humanize_value(0.12345), "12.34%");
        assert_eq!(m.humanize_value(0.99999), "99.99%");
        assert_eq!(m.humanize_value(1.0), "100.00%");
        assert_eq!(m.humanize_value(0.0), "0.00%");
    }

    #[test]
    fn test_humanize_time() {
        let m = Metric::new("iteration_duration", MetricType::Trend, Some(ValueType::Time));
        assert_eq!(m.humanize_value(0.0), "0s");
        assert_eq!(m.humanize_value(500.0), "500ns");
        assert_eq!(m.humanize_value(1_234_567.0), "1.23ms");
        assert_eq!(m.humanize_value(2_345_678_901.0), "2.34s");
        assert_eq!(m.humanize_value(61_500_000_000.0), "1m1s");
    }

    #[test]
    fn test_humanize_data_and_default() {
        let m = Metric::new("data_received", MetricType::Counter, Some(ValueType::Data));
        assert_eq!(m.humanize_value(1_500.0), "1.5 kB");

        let m = Metric::new("iterations", MetricType::Counter, None);
        assert_eq!(m.humanize_value(42.0), "42");
        assert_eq!(m.humanize_value(3.14159), "3.14159");
    }

    #[test]
    fn test_serialize() {
        let mut m = Metric::new("http_req_duration", MetricType::Trend, Some(ValueType::Time));
        m.add_threshold("p(95)<500");
        let json: serde_json::Value = serde_json::to_value(&m).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "http_req_duration",
                "type": "trend",
                "contains": "time",
                "tainted": null,
                "thresholds": ["p(95)<500"],
                "submetrics": [],
            })
        );

        m.set_tainted(true);
        let json: serde_json::Value = serde_json::to_value(&m).unwrap();
        assert_eq!(json["tainted"], true);
        assert!(json.get("sink").is_none());
    }

    #[test]
    fn test_summary() {
        let m = Arc::new(Metric::new("iterations", MetricType::Counter, None));
        for _ in 0..3 {
            m.add(&Sample::new(m.clone(), Utc::now(), SampleTags::unset(), 2.0));
        }
        let summary = m.summary(Duration::from_secs(3));
        assert!(Arc::ptr_eq(&summary.metric, &m));
        assert_eq!(summary.summary["count"], 6.0);
        assert_eq!(summary.summary["rate"], 2.0);

        m.add(&Sample::new(m.clone(), Utc::now(), SampleTags::unset(), 4.0));
        assert_eq!(m.summary(Duration::from_secs(1)).summary["count"], 10.0);
    }

    #[test]
    fn test_thresholds_any_failed() {
        let mut t = Thresholds::default();
        assert!(!t.any_failed());
        t.thresholds.push(Threshold {
            source: "rate>0.9".to_string(),
            failed: true,
        });
        assert!(t.any_failed());
    }
}
