//! Validated categorical values taken from the configuration document.
//!
//! Each type parses from the literal used in configuration files and
//! displays back to the same literal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ForecastError;

/// Business domain shared by a dataset group and its member datasets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetDomain {
    Retail,
    Custom,
    InventoryPlanning,
    Ec2Capacity,
    WorkForce,
    WebTraffic,
    Metrics,
}

impl DatasetDomain {
    pub const ALL: [DatasetDomain; 7] = [
        DatasetDomain::Retail,
        DatasetDomain::Custom,
        DatasetDomain::InventoryPlanning,
        DatasetDomain::Ec2Capacity,
        DatasetDomain::WorkForce,
        DatasetDomain::WebTraffic,
        DatasetDomain::Metrics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetDomain::Retail => "RETAIL",
            DatasetDomain::Custom => "CUSTOM",
            DatasetDomain::InventoryPlanning => "INVENTORY_PLANNING",
            DatasetDomain::Ec2Capacity => "EC2_CAPACITY",
            DatasetDomain::WorkForce => "WORK_FORCE",
            DatasetDomain::WebTraffic => "WEB_TRAFFIC",
            DatasetDomain::Metrics => "METRICS",
        }
    }

    /// Parses a configured domain literal; `None` if it is not a known domain.
    pub fn from_literal(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.as_str() == value)
    }
}

impl fmt::Display for DatasetDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observation frequency of a time-series dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataFrequency {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
    Minutes30,
    Minutes15,
    Minutes10,
    Minutes5,
    Minutes1,
}

impl DataFrequency {
    pub const ALL: [DataFrequency; 10] = [
        DataFrequency::Yearly,
        DataFrequency::Monthly,
        DataFrequency::Weekly,
        DataFrequency::Daily,
        DataFrequency::Hourly,
        DataFrequency::Minutes30,
        DataFrequency::Minutes15,
        DataFrequency::Minutes10,
        DataFrequency::Minutes5,
        DataFrequency::Minutes1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataFrequency::Yearly => "Y",
            DataFrequency::Monthly => "M",
            DataFrequency::Weekly => "W",
            DataFrequency::Daily => "D",
            DataFrequency::Hourly => "H",
            DataFrequency::Minutes30 => "30min",
            DataFrequency::Minutes15 => "15min",
            DataFrequency::Minutes10 => "10min",
            DataFrequency::Minutes5 => "5min",
            DataFrequency::Minutes1 => "1min",
        }
    }
}

impl FromStr for DataFrequency {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ForecastError::InvalidFrequency {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for DataFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamp layout of the rows in a time-series artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimestampFormat {
    Date,
    DateTime,
}

impl TimestampFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampFormat::Date => "yyyy-MM-dd",
            TimestampFormat::DateTime => "yyyy-MM-dd HH:mm:ss",
        }
    }
}

impl FromStr for TimestampFormat {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yyyy-MM-dd" => Ok(TimestampFormat::Date),
            "yyyy-MM-dd HH:mm:ss" => Ok(TimestampFormat::DateTime),
            other => Err(ForecastError::InvalidTimestampFormat {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_literals() {
        assert_eq!(
            DatasetDomain::from_literal("RETAIL"),
            Some(DatasetDomain::Retail)
        );
        assert_eq!(
            DatasetDomain::from_literal("WORK_FORCE"),
            Some(DatasetDomain::WorkForce)
        );
        assert_eq!(DatasetDomain::from_literal("retail"), None);
    }

    #[test]
    fn frequency_rejects_near_misses() {
        for bad in ["Monthly", "30", "2min", "", "h", "Y "] {
            assert!(bad.parse::<DataFrequency>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn timestamp_formats() {
        assert_eq!(
            "yyyy-MM-dd".parse::<TimestampFormat>().unwrap(),
            TimestampFormat::Date
        );
        assert!("dd/MM/yyyy".parse::<TimestampFormat>().is_err());
    }
}
