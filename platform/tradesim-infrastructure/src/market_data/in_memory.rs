use crate::timestamps::day_window;
use chrono::NaiveDate;
use std::collections::HashMap;
use tradesim_domain::errors::SimulationError;
use tradesim_domain::repositories::market_data::MarketDataProvider;
use tradesim_domain::value_objects::bar::PriceBar;
use tradesim_domain::value_objects::interval::Interval;
use tradesim_domain::value_objects::price_series::PriceSeries;

/// Bars held in memory, keyed by symbol. The requested interval is not resampled.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketData {
    series: HashMap<String, Vec<PriceBar>>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        self.insert(symbol, bars);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, mut bars: Vec<PriceBar>) {
        bars.sort_by_key(|bar| bar.timestamp);
        self.series.insert(symbol.into(), bars);
    }
}

impl MarketDataProvider for InMemoryMarketData {
    fn historical_series(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        _interval: &Interval,
    ) -> Result<PriceSeries, SimulationError> {
        let bars = self.series.get(symbol).ok_or_else(|| {
            SimulationError::DataUnavailable(format!("no bars loaded for {symbol}"))
        })?;
        let (start_ts, end_ts) = day_window(from, to);
        let window: Vec<PriceBar> = bars
            .iter()
            .filter(|bar| bar.timestamp >= start_ts && bar.timestamp <= end_ts)
            .cloned()
            .collect();
        if window.len() < 2 {
            return Err(SimulationError::DataUnavailable(format!(
                "{symbol} has {} bars between {from} and {to}",
                window.len()
            )));
        }
        PriceSeries::new(symbol, window)
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryMarketData;
    use chrono::NaiveDate;
    use tradesim_domain::errors::SimulationError;
    use tradesim_domain::repositories::market_data::MarketDataProvider;
    use tradesim_domain::value_objects::bar::PriceBar;
    use tradesim_domain::value_objects::interval::Interval;

    #[test]
    fn serves_window_and_rejects_short_ranges() {
        let day = 86_400;
        let start = 1_704_067_200;
        let bars = (0..5)
            .map(|i| PriceBar::flat(start + i * day, 100.0 + i as f64))
            .collect();
        let provider = InMemoryMarketData::new().with_series("BTCUSD", bars);
        let date = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();

        let series = provider
            .historical_series("BTCUSD", date(2), date(4), &Interval::daily())
            .expect("series");
        assert_eq!(series.len(), 3);

        let err = provider
            .historical_series("BTCUSD", date(5), date(6), &Interval::daily())
            .expect_err("one bar");
        assert!(matches!(err, SimulationError::DataUnavailable(_)));
    }
}
