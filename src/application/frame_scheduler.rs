// Frame scheduler - one select/smooth/stack/render/persist pass per tick
use crate::application::feed_repository::FeedRepository;
use crate::application::frame_renderer::{window_time_range, FrameRenderer, RenderFrame};
use crate::application::smoother::Smoother;
use crate::application::stacker::stack;
use crate::application::window_selector::select_window;
use crate::domain::feed::{FeedEvent, FeedIdentity};
use crate::domain::record::Dataset;
use crate::domain::window::Window;
use crate::infrastructure::config::PersistMode;
use anyhow::Context;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// `tokio::time::interval` rejects a zero period.
const MIN_CADENCE: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub window_size: usize,
    pub smoother: Smoother,
    pub feed: FeedIdentity,
    pub persist_mode: PersistMode,
    pub queue_capacity: usize,
    pub truncate_on_start: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStatus {
    Inserted(i64),
    Queued,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub index: usize,
    pub window: Window,
    pub reading: f64,
    pub persisted: PersistStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_rendered: usize,
    pub inserts_succeeded: usize,
    pub inserts_failed: usize,
    pub cancelled: bool,
}

struct QueuedEvent {
    frame: usize,
    event: FeedEvent,
}

#[derive(Debug, Default)]
struct WriterTally {
    succeeded: usize,
    failed: usize,
}

enum FeedSink {
    Inline(Arc<dyn FeedRepository>),
    Queued {
        tx: mpsc::Sender<QueuedEvent>,
        writer: JoinHandle<WriterTally>,
    },
}

/// One-shot replay over a dataset. Each frame runs to completion before
/// the next begins; after the last frame the scheduler is terminal.
pub struct FrameScheduler {
    dataset: Dataset,
    settings: SchedulerSettings,
    renderer: Box<dyn FrameRenderer>,
    sink: FeedSink,
    next_frame: usize,
    summary: RunSummary,
}

impl FrameScheduler {
    /// Enters the initial state at frame 0. Truncates the feed sink first
    /// when configured to; a failed truncate aborts startup.
    pub async fn start(
        dataset: Dataset,
        settings: SchedulerSettings,
        renderer: Box<dyn FrameRenderer>,
        repository: Arc<dyn FeedRepository>,
    ) -> anyhow::Result<Self> {
        assert!(settings.window_size >= 1, "window size must be at least 1");

        if settings.truncate_on_start {
            repository
                .truncate()
                .await
                .context("Failed to truncate feed table before replay")?;
            info!("Truncated feed table before replay");
        }

        let sink = match settings.persist_mode {
            PersistMode::Inline => FeedSink::Inline(repository),
            PersistMode::Queued => {
                let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
                let writer = tokio::spawn(drain_feed_queue(repository, rx));
                FeedSink::Queued { tx, writer }
            }
        };

        let records = dataset.records();
        let clip = settings.smoother.clip();
        info!(
            records = records.len(),
            channels = dataset.channels().len(),
            first = ?records.first().map(|r| r.timestamp),
            last = ?records.last().map(|r| r.timestamp),
            window_size = settings.window_size,
            clip_min = clip.min,
            clip_max = clip.max,
            persist_mode = ?settings.persist_mode,
            "Replay starting"
        );

        Ok(Self {
            dataset,
            settings,
            renderer,
            sink,
            next_frame: 0,
            summary: RunSummary::default(),
        })
    }

    pub fn frame_count(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_finished(&self) -> bool {
        self.next_frame >= self.dataset.len()
    }

    /// Processes the current frame and advances. Returns `None` once every
    /// frame has run. Render errors propagate; persistence errors are logged
    /// and reported in the outcome.
    pub async fn step(&mut self) -> anyhow::Result<Option<FrameOutcome>> {
        if self.is_finished() {
            return Ok(None);
        }

        let index = self.next_frame;
        let total = self.dataset.len();
        let window = select_window(index, self.settings.window_size, total);
        let records = self.dataset.slice(window);

        let curve = self.settings.smoother.smooth(self.dataset.channels(), records);
        let bands = stack(&curve, self.dataset.channels());
        let time_range = window_time_range(records);
        let newest = records[records.len() - 1].timestamp;

        for channel in self.dataset.channels() {
            debug!("Frame {}/{}, plotting {}", index + 1, total, channel);
        }
        debug!(
            frame = index + 1,
            points = curve.len(),
            start = %time_range.start,
            end = %time_range.end,
            "Smoothed window"
        );

        let frame = RenderFrame {
            index,
            frame_count: total,
            window,
            time_range,
            bands,
        };
        self.renderer
            .render(&frame)
            .with_context(|| format!("Failed to render frame {}", index))?;
        self.summary.frames_rendered += 1;

        let reading = frame.bands.final_total();
        let event = self.settings.feed.event(reading, newest.naive_utc());
        let persisted = self.persist(index, event).await;

        self.next_frame += 1;
        info!(
            frame = index + 1,
            total,
            window = %window,
            window_len = window.len(),
            reading,
            "Frame complete"
        );

        Ok(Some(FrameOutcome {
            index,
            window,
            reading,
            persisted,
        }))
    }

    /// Runs every remaining frame at the given cadence, stopping between
    /// frames once `shutdown` resolves.
    pub async fn run_until<F>(mut self, cadence: Duration, shutdown: F) -> anyhow::Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = time::interval(cadence.max(MIN_CADENCE));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut failure = None;
        while !self.is_finished() {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(next_frame = self.next_frame, "Replay cancelled");
                    self.summary.cancelled = true;
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.step().await {
                        failure = Some(e);
                        break;
                    }
                }
            }
        }

        let summary = self.finish().await;
        match failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    async fn persist(&mut self, frame: usize, event: FeedEvent) -> PersistStatus {
        match &self.sink {
            FeedSink::Inline(repository) => match repository.insert(&event).await {
                Ok(record) => {
                    debug!(frame, id = record.id, "Inserted feed record");
                    self.summary.inserts_succeeded += 1;
                    PersistStatus::Inserted(record.id)
                }
                Err(e) => {
                    warn!(frame, error = %format!("{:#}", e), "Feed insert failed, continuing");
                    self.summary.inserts_failed += 1;
                    PersistStatus::Failed
                }
            },
            FeedSink::Queued { tx, .. } => match tx.send(QueuedEvent { frame, event }).await {
                Ok(()) => PersistStatus::Queued,
                Err(_) => {
                    warn!(frame, "Feed writer stopped, dropping event");
                    self.summary.inserts_failed += 1;
                    PersistStatus::Failed
                }
            },
        }
    }

    async fn finish(self) -> RunSummary {
        let mut summary = self.summary;

        if let FeedSink::Queued { tx, writer } = self.sink {
            drop(tx);
            match writer.await {
                Ok(tally) => {
                    summary.inserts_succeeded += tally.succeeded;
                    summary.inserts_failed += tally.failed;
                }
                Err(e) => warn!(error = %e, "Feed writer task failed"),
            }
        }

        info!(
            frames = summary.frames_rendered,
            inserted = summary.inserts_succeeded,
            failed = summary.inserts_failed,
            cancelled = summary.cancelled,
            "Replay finished"
        );
        summary
    }
}

async fn drain_feed_queue(
    repository: Arc<dyn FeedRepository>,
    mut rx: mpsc::Receiver<QueuedEvent>,
) -> WriterTally {
    let mut tally = WriterTally::default();

    while let Some(QueuedEvent { frame, event }) = rx.recv().await {
        match repository.insert(&event).await {
            Ok(record) => {
                debug!(frame, id = record.id, "Inserted feed record");
                tally.succeeded += 1;
            }
            Err(e) => {
                warn!(frame, error = %format!("{:#}", e), "Queued feed insert failed");
                tally.failed += 1;
            }
        }
    }

    tally
}
