// CSV loader - turns a tabular export into a cleaned, time-ordered dataset
use crate::domain::record::{Dataset, Record};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("time column `{0}` not found in header")]
    MissingTimeColumn(String),
    #[error("no columns start with channel prefix `{0}`")]
    NoChannels(String),
}

/// Counts of what the loader repaired or discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub values_coerced: usize,
}

pub fn load_dataset(
    path: &Path,
    time_column: &str,
    channel_prefix: &str,
) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let (dataset, report) = read_dataset(file, time_column, channel_prefix)?;

    info!(
        path = %path.display(),
        records = dataset.len(),
        channels = ?dataset.channels(),
        read = report.rows_read,
        dropped = report.rows_dropped,
        coerced = report.values_coerced,
        "Loaded dataset"
    );
    Ok(dataset)
}

/// Reads rows with a header. Rows whose timestamp does not parse are
/// dropped; missing, unparsable or non-finite channel values become 0.0.
/// Channels are the columns starting with `channel_prefix`, in header order.
pub fn read_dataset<R: Read>(
    reader: R,
    time_column: &str,
    channel_prefix: &str,
) -> Result<(Dataset, LoadReport), LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let time_idx = headers
        .iter()
        .position(|h| h == time_column)
        .ok_or_else(|| LoadError::MissingTimeColumn(time_column.to_string()))?;

    let (channel_idx, channels): (Vec<usize>, Vec<String>) = headers
        .iter()
        .enumerate()
        .filter(|(idx, h)| *idx != time_idx && h.starts_with(channel_prefix))
        .map(|(idx, h)| (idx, h.to_string()))
        .unzip();
    if channels.is_empty() {
        return Err(LoadError::NoChannels(channel_prefix.to_string()));
    }

    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let row_data = result?;
        report.rows_read += 1;

        let Some(timestamp) = row_data.get(time_idx).and_then(parse_timestamp) else {
            debug!(row, value = ?row_data.get(time_idx), "Dropping row with unparsable timestamp");
            report.rows_dropped += 1;
            continue;
        };

        let values = channel_idx
            .iter()
            .map(|&idx| match row_data.get(idx).and_then(parse_value) {
                Some(v) => v,
                None => {
                    report.values_coerced += 1;
                    0.0
                }
            })
            .collect();

        records.push(Record::new(timestamp, values));
    }

    Ok((Dataset::new(channels, records), report))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
