//! Per-cycle pipeline: probe every channel, diff against the snapshot, and
//! dispatch one batched alert when anything advanced.
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::mailer::{DeliveryError, Mailer};
use crate::model::{CycleOutcome, NewVideo, VideoInfo};
use crate::store::{Snapshot, SnapshotStore, StoreError};
use crate::youtube::VideoSource;

pub const ALERT_SUBJECT: &str = "New YouTube Video Alert";

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("state store failure: {0}")]
    Store(#[from] StoreError),
    #[error("alert delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Result of diffing one cycle's probes against the stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub new_videos: Vec<NewVideo>,
    pub merged: Snapshot,
    pub body: String,
}

/// A channel is new when the snapshot holds no entry for it or a different
/// video id. Probe order is preserved in both the batch and the body; failed
/// probes are simply absent from `probed` and contribute nothing.
pub fn detect_new(snapshot: &Snapshot, probed: &[(String, VideoInfo)]) -> Detection {
    let mut new_videos = Vec::new();
    let mut merged = snapshot.clone();
    let mut body = String::new();

    for (channel_id, video) in probed {
        if snapshot.get(channel_id).map(String::as_str) == Some(video.id.as_str()) {
            continue;
        }
        merged.insert(channel_id.clone(), video.id.clone());
        body.push_str(&format!(
            "New video uploaded: {}\nWatch here: {}\n\n",
            video.title, video.url
        ));
        new_videos.push(NewVideo {
            channel_id: channel_id.clone(),
            video: video.clone(),
        });
    }

    Detection {
        new_videos,
        merged,
        body,
    }
}

/// Everything one cycle needs, bundled so the monitor can own it.
pub struct Pipeline {
    pub source: Arc<dyn VideoSource>,
    pub store: SnapshotStore,
    pub mailer: Arc<dyn Mailer>,
    pub channels: Vec<String>,
    pub recipients: Vec<String>,
}

impl Pipeline {
    pub async fn run_once(&self) -> Result<CycleOutcome, CycleError> {
        run_cycle(
            self.source.as_ref(),
            &self.store,
            self.mailer.as_ref(),
            &self.channels,
            &self.recipients,
        )
        .await
    }
}

/// One full cycle: probe all channels in caller order, diff, and if anything
/// advanced, dispatch one alert and persist the merged snapshot.
///
/// Delivery happens before persistence: a failed send leaves the snapshot
/// untouched, so the same videos are announced again on the next successful
/// cycle instead of being silently marked notified.
#[instrument(skip_all)]
pub async fn run_cycle(
    source: &dyn VideoSource,
    store: &SnapshotStore,
    mailer: &dyn Mailer,
    channels: &[String],
    recipients: &[String],
) -> Result<CycleOutcome, CycleError> {
    let snapshot = store.load().await?;

    let mut probed = Vec::with_capacity(channels.len());
    for channel_id in channels {
        match source.latest_video(channel_id).await {
            Ok(video) => probed.push((channel_id.clone(), video)),
            Err(err) => {
                // Non-fatal: the channel keeps its stored entry and is
                // retried next cycle.
                warn!(channel = %channel_id, error = %err, "probe failed; skipping channel");
            }
        }
    }

    let detection = detect_new(&snapshot, &probed);
    if detection.new_videos.is_empty() {
        info!("no new videos found");
        return Ok(CycleOutcome::Quiet);
    }

    for new in &detection.new_videos {
        info!(
            channel = %new.channel_id,
            video = %new.video.id,
            published = ?new.video.published_at,
            "new video detected"
        );
    }

    mailer
        .send(ALERT_SUBJECT, &detection.body, recipients)
        .await?;
    store.save(&detection.merged).await?;

    Ok(CycleOutcome::Notified {
        videos: detection.new_videos.len(),
        recipients: recipients.len(),
    })
}
