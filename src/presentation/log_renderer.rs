// Log renderer - summarises each frame through tracing
use crate::application::frame_renderer::{FrameRenderer, RenderFrame};
use tracing::info;

/// Top of each cumulative band at the newest dense point, in stacking order.
pub fn band_tops(frame: &RenderFrame) -> Vec<(String, f64)> {
    frame
        .bands
        .iter()
        .map(|(name, band)| (name.to_string(), band.last().copied().unwrap_or(0.0)))
        .collect()
}

pub struct LogFrameRenderer;

impl FrameRenderer for LogFrameRenderer {
    fn render(&mut self, frame: &RenderFrame) -> anyhow::Result<()> {
        let tops = band_tops(frame)
            .iter()
            .map(|(name, top)| format!("{}={:.2}", name, top))
            .collect::<Vec<_>>()
            .join(" ");

        info!(
            frame = frame.index + 1,
            total = frame.frame_count,
            window = %frame.window,
            from = %frame.time_range.start.format("%H:%M:%S"),
            to = %frame.time_range.end.format("%H:%M:%S"),
            points = frame.timestamps().len(),
            "{}",
            tops
        );
        Ok(())
    }
}

/// Discards frames, for headless runs that only feed the sink.
pub struct NullRenderer;

impl FrameRenderer for NullRenderer {
    fn render(&mut self, _frame: &RenderFrame) -> anyhow::Result<()> {
        Ok(())
    }
}
