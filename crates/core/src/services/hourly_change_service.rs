use crate::errors::CoreError;
use crate::models::hourly::{DailySeries, PeriodChange};
use crate::numeric::floor_to_cents;

/// Computes the 24-hour portfolio change from the hourly value series.
///
/// The window is the last `window` samples of the last `days` days, in
/// series order. Results are floored (not rounded) to 2 decimals so gains are
/// never overstated.
pub struct HourlyChangeCalculator {
    window: usize,
    days: usize,
}

impl HourlyChangeCalculator {
    pub fn new(window: usize, days: usize) -> Self {
        Self { window, days }
    }

    pub fn compute_change(&self, series: &DailySeries) -> Result<PeriodChange, CoreError> {
        let skip_days = series.days.len().saturating_sub(self.days);
        let flattened: Vec<f64> = series
            .days
            .iter()
            .skip(skip_days)
            .flat_map(|day| day.samples.iter().map(|s| s.total_portfolio_usd))
            .collect();

        let start = flattened.len().saturating_sub(self.window);
        let window = &flattened[start..];

        let (first, last) = match (window.first(), window.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => {
                return Err(CoreError::malformed(
                    "hourly series",
                    "no samples in the last days of the series",
                ))
            }
        };

        if first == 0.0 {
            return Err(CoreError::DivisionByZero(
                "hourly window starts at a zero portfolio value".into(),
            ));
        }

        let pnl = last - first;
        let percent = (pnl / first) * 100.0;

        Ok(PeriodChange {
            percent_change_24h: floor_to_cents(percent),
            absolute_pnl_24h: floor_to_cents(pnl),
            sample_count: window.len(),
        })
    }
}

impl Default for HourlyChangeCalculator {
    fn default() -> Self {
        Self::new(24, 2)
    }
}
