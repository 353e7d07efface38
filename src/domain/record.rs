// Record and dataset domain models
use crate::domain::window::Window;
use chrono::{DateTime, Utc};

/// One timestamped sample. `values` is indexed by channel position in the
/// owning [`Dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub values: Vec<f64>,
}

impl Record {
    pub fn new(timestamp: DateTime<Utc>, values: Vec<f64>) -> Self {
        Self { timestamp, values }
    }
}

/// Cleaned, time-ordered and immutable collection of records sharing one
/// channel set.
#[derive(Debug, Clone)]
pub struct Dataset {
    channels: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Builds a dataset, stable-sorting records by timestamp and replacing
    /// non-finite values with 0.0.
    ///
    /// Panics if a record's value count differs from the channel count.
    pub fn new(channels: Vec<String>, mut records: Vec<Record>) -> Self {
        for record in &mut records {
            assert_eq!(
                record.values.len(),
                channels.len(),
                "record at {} has {} values for {} channels",
                record.timestamp,
                record.values.len(),
                channels.len()
            );
            for value in &mut record.values {
                if !value.is_finite() {
                    *value = 0.0;
                }
            }
        }
        records.sort_by_key(|r| r.timestamp);

        Self { channels, records }
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn slice(&self, window: Window) -> &[Record] {
        &self.records[window.range()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_650_618_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_new_sorts_stably_by_timestamp() {
        let dataset = Dataset::new(
            vec!["Axis1".to_string()],
            vec![
                Record::new(at(2), vec![3.0]),
                Record::new(at(0), vec![1.0]),
                Record::new(at(2), vec![4.0]),
                Record::new(at(1), vec![2.0]),
            ],
        );

        let values: Vec<f64> = dataset.records().iter().map(|r| r.values[0]).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_new_replaces_non_finite_values() {
        let dataset = Dataset::new(
            vec!["Axis1".to_string(), "Axis2".to_string()],
            vec![Record::new(at(0), vec![f64::NAN, f64::INFINITY])],
        );

        assert_eq!(dataset.records()[0].values, vec![0.0, 0.0]);
    }

    #[test]
    #[should_panic]
    fn test_new_rejects_mismatched_channel_count() {
        Dataset::new(
            vec!["Axis1".to_string()],
            vec![Record::new(at(0), vec![1.0, 2.0])],
        );
    }

    #[test]
    fn test_slice() {
        let dataset = Dataset::new(
            vec!["Axis1".to_string(), "Axis2".to_string()],
            (0..5).map(|i| Record::new(at(i), vec![i as f64, 0.0])).collect(),
        );

        let slice = dataset.slice(Window::new(1, 3));
        assert_eq!(slice.len(), 2);
        assert_eq!(slice[0].values[0], 1.0);
        assert_eq!(slice[1].timestamp, at(2));
    }
}
