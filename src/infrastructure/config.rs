use crate::application::frame_scheduler::SchedulerSettings;
use crate::application::smoother::{ClipRange, Smoother};
use crate::domain::feed::FeedIdentity;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_FILE: &str = "config/replay";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SettingsError {
    #[error("replay.window_size must be at least 1")]
    ZeroWindow,
    #[error("replay.cadence_ms must be at least 1")]
    ZeroCadence,
    #[error("replay.dense_sample_floor must be at least 2, got {0}")]
    DenseFloorTooSmall(usize),
    #[error("clip range [{min}, {max}] must be finite with min < max")]
    InvalidClipRange { min: f64, max: f64 },
    #[error("database.queue_capacity must be at least 1")]
    ZeroQueueCapacity,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub input: InputSettings,
    pub replay: ReplaySettings,
    pub database: DatabaseSettings,
    pub feed: FeedSettings,
    pub render: RenderSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputSettings {
    pub csv_path: PathBuf,
    pub time_column: String,
    pub channel_prefix: String,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data/currents.csv"),
            time_column: "Time".to_string(),
            channel_prefix: "Axis".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReplaySettings {
    pub window_size: usize,
    pub cadence_ms: u64,
    pub dense_sample_floor: usize,
    pub clip_min: f64,
    pub clip_max: f64,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            window_size: 10,
            cadence_ms: 2000,
            dense_sample_floor: 200,
            clip_min: -10.0,
            clip_max: 100.0,
        }
    }
}

impl ReplaySettings {
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// Insert within the tick, before the next frame may start
    #[default]
    Inline,
    /// Hand events to a single writer task through a bounded queue
    Queued,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub truncate_on_start: bool,
    pub persist_mode: PersistMode,
    pub queue_capacity: usize,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "data/feed.db".to_string(),
            truncate_on_start: false,
            persist_mode: PersistMode::Inline,
            queue_capacity: 16,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedSettings {
    pub part_id: i64,
    pub type_id: i64,
    pub source_id: i64,
    pub feed_id: i64,
    pub state: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            part_id: 1,
            type_id: 1,
            source_id: 1,
            feed_id: 2,
            state: "RUNNING".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderKind {
    #[default]
    Svg,
    Log,
    None,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RenderSettings {
    pub kind: RenderKind,
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub y_min: f64,
    pub y_max: f64,
    pub title: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            kind: RenderKind::Svg,
            output_dir: PathBuf::from("frames"),
            width: 1200,
            height: 500,
            y_min: -10.0,
            y_max: 200.0,
            title: "Streaming stacked area, grow then slide".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let replay = &self.replay;
        if replay.window_size == 0 {
            return Err(SettingsError::ZeroWindow);
        }
        if replay.cadence_ms == 0 {
            return Err(SettingsError::ZeroCadence);
        }
        if replay.dense_sample_floor < 2 {
            return Err(SettingsError::DenseFloorTooSmall(replay.dense_sample_floor));
        }
        if !(replay.clip_min.is_finite() && replay.clip_max.is_finite())
            || replay.clip_min >= replay.clip_max
        {
            return Err(SettingsError::InvalidClipRange {
                min: replay.clip_min,
                max: replay.clip_max,
            });
        }
        if self.database.queue_capacity == 0 {
            return Err(SettingsError::ZeroQueueCapacity);
        }
        Ok(())
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            window_size: self.replay.window_size,
            smoother: Smoother::new(
                self.replay.dense_sample_floor,
                ClipRange::new(self.replay.clip_min, self.replay.clip_max),
            ),
            feed: FeedIdentity {
                part_id: self.feed.part_id,
                type_id: self.feed.type_id,
                source_id: self.feed.source_id,
                feed_id: self.feed.feed_id,
                state: self.feed.state.clone(),
            },
            persist_mode: self.database.persist_mode,
            queue_capacity: self.database.queue_capacity,
            truncate_on_start: self.database.truncate_on_start,
        }
    }
}

/// Loads `config/replay.*` (optional), then `REPLAY__SECTION__KEY`
/// environment overrides, then `DATABASE_URL`.
pub fn load_settings() -> anyhow::Result<Settings> {
    let builder = config::Config::builder()
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(
            Environment::with_prefix("REPLAY")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?;

    settings_from(builder)
}

fn settings_from(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Settings> {
    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
