use crate::errors::SimulationError;
use serde::{Deserialize, Deserializer, Serialize};

/// Bar cadence of a price series, e.g. `1d` or `4h`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct Interval {
    label: &'static str,
    step_seconds: i64,
}

const KNOWN: &[(&[&str], &str, i64)] = &[
    (&["1m", "1min"], "1m", 60),
    (&["5m", "5min"], "5m", 300),
    (&["15m", "15min"], "15m", 900),
    (&["30m", "30min"], "30m", 1_800),
    (&["1h", "1hour"], "1h", 3_600),
    (&["4h", "4hour"], "4h", 14_400),
    (&["12h", "12hour"], "12h", 43_200),
    (&["1d", "1day", "daily"], "1d", 86_400),
    (&["1w", "1week", "weekly"], "1w", 604_800),
];

impl Interval {
    pub fn daily() -> Self {
        Self {
            label: "1d",
            step_seconds: 86_400,
        }
    }

    pub fn parse(value: &str) -> Result<Self, SimulationError> {
        let normalized = value.trim().to_lowercase();
        KNOWN
            .iter()
            .find(|(aliases, _, _)| aliases.contains(&normalized.as_str()))
            .map(|(_, label, step_seconds)| Self {
                label,
                step_seconds: *step_seconds,
            })
            .ok_or_else(|| SimulationError::validation(format!("unsupported interval: {value}")))
    }

    pub fn label(&self) -> &str {
        self.label
    }

    pub fn step_seconds(&self) -> i64 {
        self.step_seconds
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::daily()
    }
}

impl TryFrom<String> for Interval {
    type Error = SimulationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Interval::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.label.to_string()
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label)
    }
}
