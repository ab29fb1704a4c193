use crate::errors::SimulationError;
use crate::value_objects::bar::PriceBar;

/// Bars for one instrument, strictly increasing by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SimulationError> {
        for bar in &bars {
            bar.validate()?;
        }
        if let Some(pair) = bars
            .windows(2)
            .find(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(SimulationError::validation(format!(
                "price series not strictly increasing at timestamp {}",
                pair[1].timestamp
            )));
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Convenience constructor for close-only data, one bar per `step_seconds`.
    pub fn from_closes(
        symbol: impl Into<String>,
        start_timestamp: i64,
        step_seconds: i64,
        closes: &[f64],
    ) -> Result<Self, SimulationError> {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(idx, close)| PriceBar::flat(start_timestamp + idx as i64 * step_seconds, *close))
            .collect();
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}
