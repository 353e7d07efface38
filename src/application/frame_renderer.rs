// Render collaborator trait and the immutable per-frame payload
use crate::domain::curve::StackedBands;
use crate::domain::record::Record;
use crate::domain::window::Window;
use chrono::{DateTime, Duration, Utc};

/// Display interval for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn span_seconds(&self) -> f64 {
        self.offset_seconds(self.end)
    }

    /// Seconds from the range start to `t`, at nanosecond resolution.
    pub fn offset_seconds(&self, t: DateTime<Utc>) -> f64 {
        let delta = t - self.start;
        match delta.num_nanoseconds() {
            Some(ns) => ns as f64 * 1e-9,
            None => delta.num_milliseconds() as f64 * 1e-3,
        }
    }
}

/// First to last timestamp of `records`, widened to one second when the
/// window covers a single instant.
pub fn window_time_range(records: &[Record]) -> TimeRange {
    assert!(!records.is_empty(), "time range of an empty window");
    let start = records[0].timestamp;
    let mut end = records[records.len() - 1].timestamp;
    if end <= start {
        end = start + Duration::seconds(1);
    }
    TimeRange { start, end }
}

#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub index: usize,
    pub frame_count: usize,
    pub window: Window,
    pub time_range: TimeRange,
    pub bands: StackedBands,
}

impl RenderFrame {
    /// Channel names in stacking order, bottom band first.
    pub fn channel_order(&self) -> &[String] {
        &self.bands.channels
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.bands.timestamps
    }
}

/// Draws one frame. Implementations own any surface state and clear it
/// before drawing.
pub trait FrameRenderer: Send {
    fn render(&mut self, frame: &RenderFrame) -> anyhow::Result<()>;
}
