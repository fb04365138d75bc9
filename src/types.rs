//! Metric and value type enumerations with their JSON literals.

use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::StatsError;

const COUNTER: &str = r#""counter""#;
const GAUGE: &str = r#""gauge""#;
const TREND: &str = r#""trend""#;
const RATE: &str = r#""rate""#;

const DEFAULT: &str = r#""default""#;
const TIME: &str = r#""time""#;
const DATA: &str = r#""data""#;

const INVALID: &str = "[INVALID]";

/// The kind of a metric, which decides how its samples are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    /// Sums its data points
    Counter,
    /// Keeps the latest value
    Gauge,
    /// Keeps the distribution: min, max, avg, med, percentiles
    Trend,
    /// Share of values that are not zero
    Rate,
}

impl MetricType {
    /// Quoted JSON literal, e.g. `"counter"`.
    pub fn marshal_json(&self) -> &'static str {
        match self {
            MetricType::Counter => COUNTER,
            MetricType::Gauge => GAUGE,
            MetricType::Trend => TREND,
            MetricType::Rate => RATE,
        }
    }

    /// Decodes an exact quoted JSON literal.
    pub fn unmarshal_json(data: &[u8]) -> Result<Self, StatsError> {
        match data {
            b"\"counter\"" => Ok(MetricType::Counter),
            b"\"gauge\"" => Ok(MetricType::Gauge),
            b"\"trend\"" => Ok(MetricType::Trend),
            b"\"rate\"" => Ok(MetricType::Rate),
            _ => Err(StatsError::InvalidMetricType),
        }
    }

    /// Display string for a raw discriminant, `[INVALID]` when out of range.
    pub fn describe(raw: u8) -> &'static str {
        MetricType::try_from(raw)
            .map(|t| t.marshal_json())
            .unwrap_or(INVALID)
    }

    fn as_str(&self) -> &'static str {
        let quoted = self.marshal_json();
        &quoted[1..quoted.len() - 1]
    }
}

impl TryFrom<u8> for MetricType {
    type Error = StatsError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(MetricType::Counter),
            1 => Ok(MetricType::Gauge),
            2 => Ok(MetricType::Trend),
            3 => Ok(MetricType::Rate),
            _ => Err(StatsError::InvalidMetricType),
        }
    }
}

impl FromStr for MetricType {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(MetricType::Counter),
            "gauge" => Ok(MetricType::Gauge),
            "trend" => Ok(MetricType::Trend),
            "rate" => Ok(MetricType::Rate),
            _ => Err(StatsError::InvalidMetricType),
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.marshal_json())
    }
}

impl Serialize for MetricType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MetricType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// What the values of a metric represent, used when humanizing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    /// Plain numbers
    #[default]
    Default,
    /// Durations in nanoseconds
    Time,
    /// Amounts of bytes
    Data,
}

impl ValueType {
    /// Quoted JSON literal, e.g. `"time"`.
    pub fn marshal_json(&self) -> &'static str {
        match self {
            ValueType::Default => DEFAULT,
            ValueType::Time => TIME,
            ValueType::Data => DATA,
        }
    }

    /// Decodes an exact quoted JSON literal.
    pub fn unmarshal_json(data: &[u8]) -> Result<Self, StatsError> {
        match data {
            b"\"default\"" => Ok(ValueType::Default),
            b"\"time\"" => Ok(ValueType::Time),
            b"\"data\"" => Ok(ValueType::Data),
            _ => Err(StatsError::InvalidValueType),
        }
    }

    /// Display string for a raw discriminant, `[INVALID]` when out of range.
    pub fn describe(raw: u8) -> &'static str {
        ValueType::try_from(raw)
            .map(|t| t.marshal_json())
            .unwrap_or(INVALID)
    }

    fn as_str(&self) -> &'static str {
        let quoted = self.marshal_json();
        &quoted[1..quoted.len() - 1]
    }
}

impl TryFrom<u8> for ValueType {
    type Error = StatsError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(ValueType::Default),
            1 => Ok(ValueType::Time),
            2 => Ok(ValueType::Data),
            _ => Err(StatsError::InvalidValueType),
        }
    }
}

impl FromStr for ValueType {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(ValueType::Default),
            "time" => Ok(ValueType::Time),
            "data" => Ok(ValueType::Data),
            _ => Err(StatsError::InvalidValueType),
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.marshal_json())
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRIC_TYPES: [MetricType; 4] = [
        MetricType::Counter,
        MetricType::Gauge,
        MetricType::Trend,
        MetricType::Rate,
    ];
    const VALUE_TYPES: [ValueType; 3] = [ValueType::Default, ValueType::Time, ValueType::Data];

    #[test]
    fn test_metric_type_round_trip() {
        for t in METRIC_TYPES {
            let encoded = t.marshal_json();
            assert_eq!(MetricType::unmarshal_json(encoded.as_bytes()).unwrap(), t);
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, encoded);
            assert_eq!(serde_json::from_str::<MetricType>(&json).unwrap(), t);
        }
    }

    #[test]
    fn test_value_type_round_trip() {
        for t in VALUE_TYPES {
            let encoded = t.marshal_json();
            assert_eq!(ValueType::unmarshal_json(encoded.as_bytes()).unwrap(), t);
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, encoded);
            assert_eq!(serde_json::from_str::<ValueType>(&json).unwrap(), t);
        }
    }

    #[test]
    fn test_invalid_literals() {
        let bad_metric_types: [&[u8]; 5] = [b"\"histogram\"", b"counter", b"\"Counter\"", b"", b"null"];
        for bad in bad_metric_types {
            assert!(matches!(
                MetricType::unmarshal_json(bad),
                Err(StatsError::InvalidMetricType)
            ));
        }
        let bad_value_types: [&[u8]; 4] = [b"\"bytes\"", b"time", b"\"\"", b"1"];
        for bad in bad_value_types {
            assert!(matches!(
                ValueType::unmarshal_json(bad),
                Err(StatsError::InvalidValueType)
            ));
        }

        let err = serde_json::from_str::<MetricType>(r#""histogram""#).unwrap_err();
        assert!(err.to_string().contains("Invalid metric type"));
        let err = serde_json::from_str::<ValueType>(r#""bytes""#).unwrap_err();
        assert!(err.to_string().contains("Invalid value type"));
    }

    #[test]
    fn test_display() {
        assert_eq!(MetricType::Trend.to_string(), r#""trend""#);
        assert_eq!(ValueType::Data.to_string(), r#""data""#);
        assert_eq!(MetricType::describe(3), r#""rate""#);
        assert_eq!(MetricType::describe(42), "[INVALID]");
        assert_eq!(ValueType::describe(1), r#""time""#);
        assert_eq!(ValueType::describe(3), "[INVALID]");
    }

    #[test]
    fn test_out_of_range_discriminant() {
        assert!(matches!(
            MetricType::try_from(4),
            Err(StatsError::InvalidMetricType)
        ));
        assert!(matches!(
            ValueType::try_from(200),
            Err(StatsError::InvalidValueType)
        ));
        assert_eq!(ValueType::default(), ValueType::Default);
    }
}
