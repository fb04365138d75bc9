use thiserror::Error;

use crate::types::MetricType;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Invalid metric type")]
    InvalidMetricType,

    #[error("Invalid value type")]
    InvalidValueType,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Metric {name} already declared as {existing}, not {requested}")]
    MetricConflict {
        name: String,
        existing: MetricType,
        requested: MetricType,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_kinds_are_distinct() {
        assert_eq!(StatsError::InvalidMetricType.to_string(), "Invalid metric type");
        assert_eq!(StatsError::InvalidValueType.to_string(), "Invalid value type");
    }

    #[test]
    fn test_conflict_message() {
        let err = StatsError::MetricConflict {
            name: "iterations".to_string(),
            existing: MetricType::Counter,
            requested: MetricType::Trend,
        };
        assert_eq!(
            err.to_string(),
            r#"Metric iterations already declared as "counter", not "trend""#
        );
    }
}
