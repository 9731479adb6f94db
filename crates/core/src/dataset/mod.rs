use crate::domain::HistoricalRecord;
use crate::time::{format_day, parse_query_date};
use anyhow::{bail, ensure, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const FIELD_DELIMITER: u8 = b';';

/// Row shape of the exported market-data file. Columns not listed here
/// (`timeClose`, `name`, `timestamp`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "timeOpen")]
    time_open: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(rename = "marketCap")]
    market_cap: f64,
}

impl CsvRow {
    fn into_record(self) -> Result<HistoricalRecord> {
        let date = parse_query_date(&self.time_open)
            .with_context(|| format!("invalid timeOpen '{}'", self.time_open))?;
        Ok(HistoricalRecord {
            date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            market_cap: self.market_cap,
        })
    }
}

/// Daily records sorted ascending by date, unique by date. Immutable once
/// built; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct HistoricalSeries {
    records: Vec<HistoricalRecord>,
}

impl HistoricalSeries {
    pub fn new(mut records: Vec<HistoricalRecord>) -> Result<Self> {
        ensure!(!records.is_empty(), "historical series must be non-empty");

        for record in &records {
            for (name, value) in record.numeric_fields() {
                ensure!(
                    value.is_finite(),
                    "non-finite {name} ({value}) on {}",
                    format_day(record.date)
                );
            }
            let day = format_day(record.date);
            for (name, price) in [
                ("open", record.open),
                ("high", record.high),
                ("low", record.low),
                ("close", record.close),
            ] {
                ensure!(price > 0.0, "{name} must be positive on {day} (got {price})");
            }
            ensure!(
                record.volume >= 0.0,
                "volume must be non-negative on {day} (got {})",
                record.volume
            );
            ensure!(
                record.market_cap >= 0.0,
                "marketCap must be non-negative on {day} (got {})",
                record.market_cap
            );
        }

        records.sort_by_key(|r| r.date);
        if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
            bail!("duplicate record for {}", pair[0].date.to_rfc3339());
        }

        Ok(Self { records })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (idx, row) in reader.deserialize::<CsvRow>().enumerate() {
            // +2: header line plus 1-based numbering.
            let line = idx + 2;
            let row = row.with_context(|| format!("failed to parse dataset row at line {line}"))?;
            records.push(row.into_record().with_context(|| format!("line {line}"))?);
        }

        Self::new(records)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open dataset {}", path.display()))?;
        let series = Self::from_reader(file)
            .with_context(|| format!("failed to load dataset {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            records = series.len(),
            first = %format_day(series.first().date),
            last = %format_day(series.last().date),
            "loaded historical series"
        );
        Ok(series)
    }

    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn first(&self) -> &HistoricalRecord {
        &self.records[0]
    }

    pub fn last(&self) -> &HistoricalRecord {
        &self.records[self.records.len() - 1]
    }

    /// Index of the latest record whose date is `<= at`.
    pub fn anchor_index(&self, at: DateTime<Utc>) -> Option<usize> {
        self.records.partition_point(|r| r.date <= at).checked_sub(1)
    }

    /// Records with `start <= date <= end`; open bounds are unbounded.
    pub fn range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> &[HistoricalRecord] {
        let lo = start.map_or(0, |s| self.records.partition_point(|r| r.date < s));
        let hi = end.map_or(self.records.len(), |e| {
            self.records.partition_point(|r| r.date <= e)
        });
        if lo >= hi {
            return &[];
        }
        &self.records[lo..hi]
    }
}
