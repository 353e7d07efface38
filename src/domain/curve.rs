// Dense curve and stacked band domain models
use chrono::{DateTime, Utc};

/// Smoothed per-channel values evaluated on a dense time grid. Every
/// channel's sequence has the same length as `timestamps`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseCurve {
    pub timestamps: Vec<DateTime<Utc>>,
    pub channels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl DenseCurve {
    pub fn new(timestamps: Vec<DateTime<Utc>>, channels: Vec<String>, values: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(channels.len(), values.len());
        debug_assert!(values.iter().all(|v| v.len() == timestamps.len()));
        Self {
            timestamps,
            channels,
            values,
        }
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels
            .iter()
            .position(|c| c == name)
            .map(|idx| self.values[idx].as_slice())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }
}

/// Cumulative bands in stacking order: `bands[k]` is the running sum of
/// channels `0..=k`.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedBands {
    pub timestamps: Vec<DateTime<Utc>>,
    pub channels: Vec<String>,
    pub bands: Vec<Vec<f64>>,
}

impl StackedBands {
    /// Upper curve of the topmost band.
    pub fn top(&self) -> Option<&[f64]> {
        self.bands.last().map(Vec::as_slice)
    }

    /// Stacked total at the newest dense point.
    pub fn final_total(&self) -> f64 {
        self.top().and_then(|t| t.last().copied()).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.channels
            .iter()
            .map(String::as_str)
            .zip(self.bands.iter().map(Vec::as_slice))
    }
}
