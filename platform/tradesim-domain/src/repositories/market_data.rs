use crate::errors::SimulationError;
use crate::value_objects::interval::Interval;
use crate::value_objects::price_series::PriceSeries;
use chrono::NaiveDate;

/// Supplies historical bars for a symbol. Implementations return
/// `DataUnavailable` when fewer than 2 bars fall inside the window.
pub trait MarketDataProvider: Send + Sync {
    fn historical_series(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        interval: &Interval,
    ) -> Result<PriceSeries, SimulationError>;
}
