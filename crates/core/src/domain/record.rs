use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One daily market record. Unique by `date` within a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRecord {
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub market_cap: f64,
}

impl HistoricalRecord {
    /// Intraday change of the record in percent.
    pub fn price_change_pct(&self) -> f64 {
        (self.close - self.open) / self.open * 100.0
    }

    pub(crate) fn numeric_fields(&self) -> [(&'static str, f64); 6] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
            ("marketCap", self.market_cap),
        ]
    }
}
