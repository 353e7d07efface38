// Feed event domain models - one persisted row per rendered frame
use chrono::NaiveDateTime;

/// Static identifiers stamped onto every feed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedIdentity {
    pub part_id: i64,
    pub type_id: i64,
    pub source_id: i64,
    pub feed_id: i64,
    pub state: String,
}

impl FeedIdentity {
    pub fn event(&self, reading: f64, timestamp: NaiveDateTime) -> FeedEvent {
        FeedEvent {
            part_id: self.part_id,
            type_id: self.type_id,
            source_id: self.source_id,
            feed_id: self.feed_id,
            reading,
            timestamp,
            state: self.state.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEvent {
    pub part_id: i64,
    pub type_id: i64,
    pub source_id: i64,
    pub feed_id: i64,
    pub reading: f64,
    pub timestamp: NaiveDateTime,
    pub state: String,
}

/// Row echoed back by the sink after an insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertedFeedRecord {
    pub id: i64,
    pub event: FeedEvent,
}
