use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Most recent video reported for a channel at probe time. Never persisted;
/// only the id survives the cycle (in the snapshot).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// A video newly detected in the current cycle, paired with its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideo {
    pub channel_id: String,
    pub video: VideoInfo,
}

/// Human-readable result of one completed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Quiet,
    Notified { videos: usize, recipients: usize },
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Quiet => write!(f, "No new videos found."),
            CycleOutcome::Notified { videos, recipients } => {
                write!(f, "Alerted {recipients} recipient(s) about {videos} new video(s).")
            }
        }
    }
}
