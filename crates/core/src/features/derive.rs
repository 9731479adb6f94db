use crate::dataset::HistoricalSeries;
use crate::domain::FeatureVector;
use crate::error::FeatureError;
use crate::features::fallback::fill_undefined;
use crate::features::window::{assemble, closes, rolling_stats, trailing_window};
use crate::features::MIN_WINDOW;
use crate::time::{format_day, parse_query_date};
use chrono::{DateTime, Utc};

/// A feature vector together with the record that grounded it.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFeatures {
    pub features: FeatureVector,
    pub anchor_date: DateTime<Utc>,
    /// `anchor_date` as `YYYY-MM-DD`; may be earlier than the query date.
    pub selected_date: String,
}

/// Derives the model input for `query_date` from the latest record on or
/// before it.
pub fn derive(query_date: &str, series: &HistoricalSeries) -> Result<DerivedFeatures, FeatureError> {
    let query = query_date.trim();
    let at = parse_query_date(query).ok_or_else(|| FeatureError::InvalidDate(query.to_string()))?;

    let Some(anchor_idx) = series.anchor_index(at) else {
        tracing::warn!(query, "query date precedes the historical series");
        return Err(FeatureError::NoHistoricalData(query.to_string()));
    };

    tracing::debug!(
        query,
        selected = %format_day(series.records()[anchor_idx].date),
        "resolved anchor record"
    );

    derive_for_anchor(series, anchor_idx)
}

/// Derives the vector for the record at `anchor_idx`, which must be a valid
/// index into `series`.
pub(crate) fn derive_for_anchor(
    series: &HistoricalSeries,
    anchor_idx: usize,
) -> Result<DerivedFeatures, FeatureError> {
    let records = series.records();
    let anchor = &records[anchor_idx];
    let window = trailing_window(records, anchor_idx);

    if window.len() < MIN_WINDOW {
        tracing::warn!(
            anchor = %format_day(anchor.date),
            available = window.len(),
            "not enough trailing records for rolling features"
        );
        return Err(FeatureError::InsufficientHistory {
            required: MIN_WINDOW,
            available: window.len(),
        });
    }

    let closes = closes(window);
    let stats = fill_undefined(rolling_stats(&closes), &closes);
    let features = assemble(anchor, stats);

    tracing::debug!(?features, window = window.len(), "derived feature vector");

    Ok(DerivedFeatures {
        features,
        anchor_date: anchor.date,
        selected_date: format_day(anchor.date),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HistoricalRecord;
    use crate::features::stats::{mean, sample_std};
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()
    }

    /// Daily series with closes 100, 101, 102, ... and open one below close.
    fn series(days: usize) -> HistoricalSeries {
        let records = (0..days)
            .map(|i| {
                let close = 100.0 + i as f64;
                HistoricalRecord {
                    date: start() + Duration::days(i as i64),
                    open: close - 1.0,
                    high: close + 2.0,
                    low: close - 2.0,
                    close,
                    volume: 1_000.0 + i as f64,
                    market_cap: 1.0e9 + i as f64,
                }
            })
            .collect();
        HistoricalSeries::new(records).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn before_first_record_is_no_historical_data() {
        let s = series(40);
        for q in ["2014-12-31", "2000-01-01", "2014-12-31T23:59:59Z"] {
            assert_eq!(
                derive(q, &s).unwrap_err(),
                FeatureError::NoHistoricalData(q.to_string())
            );
        }
    }

    #[test]
    fn unparseable_date_is_invalid() {
        let s = series(10);
        assert_eq!(
            derive(" tomorrow ", &s).unwrap_err(),
            FeatureError::InvalidDate("tomorrow".into())
        );
    }

    #[test]
    fn fewer_than_seven_prior_records_is_insufficient() {
        let s = series(5);
        assert_eq!(
            derive("2015-01-05", &s).unwrap_err(),
            FeatureError::InsufficientHistory {
                required: 7,
                available: 5
            }
        );

        let s = series(40);
        // 6th record: only 6 records at or before it.
        assert!(matches!(
            derive("2015-01-06", &s),
            Err(FeatureError::InsufficientHistory { available: 6, .. })
        ));
    }

    #[test]
    fn every_date_from_seventh_record_succeeds() {
        let s = series(45);
        for i in 6..60 {
            let q = format_day(start() + Duration::days(i));
            let derived = derive(&q, &s).unwrap();
            assert!(derived.features.is_finite(), "{q}");
            assert!(derived.anchor_date <= start() + Duration::days(i));
        }
    }

    #[test]
    fn exact_match_selects_requested_day() {
        let s = series(40);
        let derived = derive("2015-01-20", &s).unwrap();
        assert_eq!(derived.selected_date, "2015-01-20");

        let midday = derive("2015-01-20T15:00:00Z", &s).unwrap();
        assert_eq!(midday.selected_date, "2015-01-20");
        assert_eq!(midday.features, derived.features);
    }

    #[test]
    fn short_iso_forms_resolve_to_the_same_day() {
        let s = series(40);
        for q in [
            "2015-01-20T12:30",
            "2015-01-20T12:30Z",
            "2015-01-20T12:30:00+0000",
            "20150120",
            "2015-01-20T12",
        ] {
            assert_eq!(derive(q, &s).unwrap().selected_date, "2015-01-20", "{q}");
        }
    }

    #[test]
    fn far_future_matches_last_record() {
        let s = series(40);
        let last = format_day(s.last().date);
        let future = derive("2030-01-01", &s).unwrap();
        let exact = derive(&last, &s).unwrap();
        assert_eq!(future.selected_date, last);
        assert_eq!(future.features, exact.features);
    }

    #[test]
    fn gap_in_series_uses_previous_record() {
        let mut records = series(20).records().to_vec();
        records.remove(15); // 2015-01-16 missing
        let s = HistoricalSeries::new(records).unwrap();
        let derived = derive("2015-01-16", &s).unwrap();
        assert_eq!(derived.selected_date, "2015-01-15");
    }

    #[test]
    fn feature_values_follow_window_formulas() {
        let s = series(40);
        // Anchor index 34: close 134, window of 30 ending there.
        let derived = derive("2015-02-04", &s).unwrap();
        let f = derived.features;

        assert_eq!(f.open, 133.0);
        assert_eq!(f.high, 136.0);
        assert_eq!(f.low, 132.0);
        assert_eq!(f.volume, 1_034.0);
        assert_eq!(f.market_cap, 1.0e9 + 34.0);
        assert!(approx(f.price_change, 1.0 / 133.0 * 100.0));

        let last7: Vec<f64> = (128..=134).map(|c| c as f64).collect();
        assert!(approx(f.ma7, mean(&last7)));
        assert!(approx(f.volatility, sample_std(&last7)));
        let last30: Vec<f64> = (105..=134).map(|c| c as f64).collect();
        assert!(approx(f.ma30, mean(&last30)));
    }

    #[test]
    fn short_history_ma30_is_plain_mean() {
        let s = series(40);
        // Anchor index 11: only 12 records available.
        let f = derive("2015-01-12", &s).unwrap().features;
        let all: Vec<f64> = (100..=111).map(|c| c as f64).collect();
        assert!(approx(f.ma30, mean(&all)));
    }

    #[test]
    fn rederiving_at_selected_date_is_identical() {
        let s = series(40);
        for q in ["2015-01-09", "2015-01-31T12:00:00Z", "2099-06-01"] {
            let first = derive(q, &s).unwrap();
            let again = derive(&first.selected_date, &s).unwrap();
            assert_eq!(first, again);
        }
    }
}
