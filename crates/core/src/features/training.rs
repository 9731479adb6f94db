use crate::dataset::HistoricalSeries;
use crate::domain::FeatureVector;
use crate::features::window::{assemble, closes, rolling_stats};
use crate::features::MAX_WINDOW;
use chrono::{DateTime, Utc};

/// One supervised example: the day's features and its own close.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub date: DateTime<Utc>,
    pub features: FeatureVector,
    pub target: f64,
}

/// Offline feature table over the whole series. Rows without a full
/// `MAX_WINDOW` history (or with any undefined statistic) are dropped
/// rather than filled.
pub fn training_rows(series: &HistoricalSeries) -> Vec<TrainingRow> {
    let records = series.records();
    if records.len() < MAX_WINDOW {
        return Vec::new();
    }

    let mut rows = Vec::with_capacity(records.len() + 1 - MAX_WINDOW);
    for end in MAX_WINDOW..=records.len() {
        let window = &records[end - MAX_WINDOW..end];
        let anchor = &window[window.len() - 1];
        let stats = rolling_stats(&closes(window));
        if stats.has_undefined() {
            continue;
        }

        rows.push(TrainingRow {
            date: anchor.date,
            features: assemble(anchor, stats),
            target: anchor.close,
        });
    }
    rows
}
