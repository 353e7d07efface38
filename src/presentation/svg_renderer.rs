// SVG renderer - one stacked-area chart file per frame
use crate::application::frame_renderer::{FrameRenderer, RenderFrame};
use anyhow::{Context, Result};
use chrono::Duration;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::PathBuf;
use tracing::debug;

const BAND_ALPHA: f64 = 0.6;

/// Windows shorter than this get fractional-second axis labels.
const SUB_SECOND_LABEL_SPAN: f64 = 10.0;

pub struct SvgFrameRenderer {
    output_dir: PathBuf,
    size: (u32, u32),
    y_range: (f64, f64),
    title: String,
}

impl SvgFrameRenderer {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        size: (u32, u32),
        y_range: (f64, f64),
        title: impl Into<String>,
    ) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        Ok(Self {
            output_dir,
            size,
            y_range,
            title: title.into(),
        })
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("frame_{:05}.svg", index))
    }

    fn draw(&self, root: &DrawingArea<SVGBackend<'_>, Shift>, frame: &RenderFrame) -> Result<()> {
        root.fill(&WHITE)?;

        let range = frame.time_range;
        let xs: Vec<f64> = frame
            .timestamps()
            .iter()
            .map(|t| range.offset_seconds(*t))
            .collect();

        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, ("sans-serif", 20))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..range.span_seconds(), self.y_range.0..self.y_range.1)?;

        let start = range.start;
        let label_format = if range.span_seconds() < SUB_SECOND_LABEL_SPAN {
            "%H:%M:%S%.6f"
        } else {
            "%H:%M:%S"
        };
        let clock_label = |v: &f64| {
            (start + Duration::nanoseconds((v * 1e9).round() as i64))
                .format(label_format)
                .to_string()
        };
        chart
            .configure_mesh()
            .x_desc("Time")
            .y_desc("Amps")
            .x_label_formatter(&clock_label)
            .draw()?;

        // The first band fills down to zero; each later band fills down to
        // the previous cumulative curve.
        let mut lower = vec![0.0; xs.len()];
        for (k, (name, upper)) in frame
            .channel_order()
            .iter()
            .zip(&frame.bands.bands)
            .enumerate()
        {
            let color = Palette99::pick(k);
            let fill = color.mix(BAND_ALPHA);

            let outline: Vec<(f64, f64)> = xs
                .iter()
                .copied()
                .zip(upper.iter().copied())
                .chain(xs.iter().rev().copied().zip(lower.iter().rev().copied()))
                .collect();

            chart
                .draw_series(std::iter::once(Polygon::new(outline, fill.filled())))?
                .label(name)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], fill.filled()));
            chart.draw_series(LineSeries::new(
                xs.iter().copied().zip(upper.iter().copied()),
                color.stroke_width(2),
            ))?;

            lower = upper.to_vec();
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.7))
            .border_style(&BLACK.mix(0.3))
            .draw()?;

        Ok(())
    }
}

impl FrameRenderer for SvgFrameRenderer {
    fn render(&mut self, frame: &RenderFrame) -> Result<()> {
        let path = self.frame_path(frame.index);
        {
            let root = SVGBackend::new(&path, self.size).into_drawing_area();
            self.draw(&root, frame)?;
            root.present()
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        debug!(path = %path.display(), "Wrote frame");
        Ok(())
    }
}
