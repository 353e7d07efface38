// Main entry point - Dependency injection and replay setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::application::frame_renderer::FrameRenderer;
use crate::application::frame_scheduler::FrameScheduler;
use crate::infrastructure::config::{load_settings, RenderKind, Settings};
use crate::infrastructure::csv_loader::load_dataset;
use crate::infrastructure::sqlite_repository::SqliteFeedRepository;
use crate::presentation::log_renderer::{LogFrameRenderer, NullRenderer};
use crate::presentation::svg_renderer::SvgFrameRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = load_settings()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load dataset (infrastructure layer)
    let input = &settings.input;
    let dataset = load_dataset(&input.csv_path, &input.time_column, &input.channel_prefix)
        .with_context(|| format!("Failed to load {}", input.csv_path.display()))?;
    if dataset.is_empty() {
        tracing::warn!("Dataset has no usable records, nothing to replay");
    }

    // Create repository (infrastructure layer)
    let repository = Arc::new(SqliteFeedRepository::open(&settings.database.url)?);

    // Create renderer (presentation layer)
    let renderer = build_renderer(&settings)?;

    // Create scheduler (application layer)
    let scheduler = FrameScheduler::start(
        dataset,
        settings.scheduler_settings(),
        renderer,
        repository.clone(),
    )
    .await?;
    tracing::info!(
        frames = scheduler.frame_count(),
        cadence_ms = settings.replay.cadence_ms,
        "Starting replay"
    );

    // Ctrl-C stops the replay between frames
    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let summary = scheduler
        .run_until(settings.replay.cadence(), shutdown)
        .await?;

    let stored = repository.count().await?;
    tracing::info!(
        stored,
        frames = summary.frames_rendered,
        failed_inserts = summary.inserts_failed,
        "Replay complete"
    );

    Ok(())
}

fn build_renderer(settings: &Settings) -> anyhow::Result<Box<dyn FrameRenderer>> {
    let render = &settings.render;
    let renderer: Box<dyn FrameRenderer> = match render.kind {
        RenderKind::Svg => Box::new(SvgFrameRenderer::new(
            render.output_dir.clone(),
            (render.width, render.height),
            (render.y_min, render.y_max),
            render.title.clone(),
        )?),
        RenderKind::Log => Box::new(LogFrameRenderer),
        RenderKind::None => Box::new(NullRenderer),
    };
    Ok(renderer)
}
