use serde::{Deserialize, Serialize};

use crate::numeric::{deserialize_f64, deserialize_label};

/// One point of the hourly portfolio-value series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    #[serde(deserialize_with = "deserialize_label")]
    pub time: String,
    #[serde(deserialize_with = "deserialize_f64")]
    pub total_portfolio_usd: f64,
}

impl HourlySample {
    pub fn new(time: impl Into<String>, total_portfolio_usd: f64) -> Self {
        Self {
            time: time.into(),
            total_portfolio_usd,
        }
    }
}

/// The samples of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySeries {
    pub day: String,
    pub samples: Vec<HourlySample>,
}

/// Multi-day hourly series, days in upstream (chronological) order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub days: Vec<DaySeries>,
}

impl DailySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a day (builder style, handy for tests and fixtures).
    pub fn with_day(mut self, day: impl Into<String>, samples: Vec<HourlySample>) -> Self {
        self.days.push(DaySeries {
            day: day.into(),
            samples,
        });
        self
    }

    pub fn total_samples(&self) -> usize {
        self.days.iter().map(|d| d.samples.len()).sum()
    }
}

/// 24-hour portfolio-level change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodChange {
    /// Percent change over the window, floored to 2 decimals
    pub percent_change_24h: f64,

    /// Absolute P&L in USD over the window, floored to 2 decimals
    pub absolute_pnl_24h: f64,

    /// Number of samples the window actually contained
    pub sample_count: usize,
}
