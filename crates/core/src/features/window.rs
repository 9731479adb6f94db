use crate::domain::{FeatureVector, HistoricalRecord};
use crate::features::fallback::RollingStats;
use crate::features::stats::{mean, trailing_mean, trailing_sample_std};
use crate::features::{MAX_WINDOW, MIN_WINDOW};

/// Up to `MAX_WINDOW` records ending at (and including) `anchor_idx`.
pub(crate) fn trailing_window(records: &[HistoricalRecord], anchor_idx: usize) -> &[HistoricalRecord] {
    let end = anchor_idx + 1;
    let start = end.saturating_sub(MAX_WINDOW);
    &records[start..end]
}

pub(crate) fn closes(window: &[HistoricalRecord]) -> Vec<f64> {
    window.iter().map(|r| r.close).collect()
}

/// Raw rolling statistics over an ascending window of closes. Values that
/// cannot be computed come back as NaN.
pub(crate) fn rolling_stats(closes: &[f64]) -> RollingStats {
    RollingStats {
        ma7: trailing_mean(closes, MIN_WINDOW).unwrap_or(f64::NAN),
        // Short windows use whatever history exists.
        ma30: trailing_mean(closes, MAX_WINDOW).unwrap_or_else(|| mean(closes)),
        volatility: trailing_sample_std(closes, MIN_WINDOW).unwrap_or(f64::NAN),
    }
}

pub(crate) fn assemble(anchor: &HistoricalRecord, stats: RollingStats) -> FeatureVector {
    FeatureVector {
        open: anchor.open,
        high: anchor.high,
        low: anchor.low,
        volume: anchor.volume,
        market_cap: anchor.market_cap,
        price_change: anchor.price_change_pct(),
        ma7: stats.ma7,
        ma30: stats.ma30,
        volatility: stats.volatility,
    }
}
