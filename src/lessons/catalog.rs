use crate::error::Result;
use crate::lessons::{LessonVideo, VideoEvent, VideoStatus};
use crate::webhooks::{WebhookHandler, WebhookOutcome};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory catalog of lesson videos keyed by asset id
///
/// Kept current by video host webhooks; read by the lesson routes.
#[derive(Debug, Default)]
pub struct VideoCatalog {
    videos: RwLock<HashMap<String, LessonVideo>>,
}

impl VideoCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a video record
    pub async fn insert(&self, video: LessonVideo) {
        self.videos.write().await.insert(video.asset_id.clone(), video);
    }

    pub async fn get(&self, asset_id: &str) -> Option<LessonVideo> {
        self.videos.read().await.get(asset_id).cloned()
    }

    /// Playable videos for a lesson, ordered by asset id
    pub async fn playable_for(&self, lesson_id: &str) -> Vec<LessonVideo> {
        let videos = self.videos.read().await;
        let mut found: Vec<LessonVideo> = crate::lessons::playable(videos.values())
            .filter(|video| video.lesson_id.as_deref() == Some(lesson_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        found
    }

    /// Every playable video across lessons, ordered by asset id
    pub async fn all_playable(&self) -> Vec<LessonVideo> {
        let videos = self.videos.read().await;
        let mut found: Vec<LessonVideo> = crate::lessons::playable(videos.values()).cloned().collect();
        found.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        found
    }

    /// Apply a video host event to the catalog
    pub async fn apply(&self, event: &VideoEvent) -> WebhookOutcome {
        let Some(next) = event.status() else {
            return WebhookOutcome::Ignored;
        };

        let mut videos = self.videos.write().await;
        let video = videos
            .entry(event.data.id.clone())
            .or_insert_with(|| LessonVideo::new(event.data.id.clone(), next));

        if video.status != next && !video.status.can_transition_to(next) {
            tracing::debug!(
                asset_id = %video.asset_id,
                from = ?video.status,
                to = ?next,
                "Ignoring out-of-order video event"
            );
            return WebhookOutcome::Ignored;
        }

        video.status = next;
        if let Some(lesson_id) = event.data.passthrough.as_deref().filter(|l| !l.is_empty()) {
            video.lesson_id = Some(lesson_id.to_string());
        }
        if let Some(playback_id) = event.playback_id() {
            video.playback_id = Some(playback_id.to_string());
        }
        if event.data.duration.is_some() {
            video.duration_seconds = event.data.duration;
        }
        if next == VideoStatus::Deleted {
            video.playback_id = None;
        }

        tracing::info!(
            asset_id = %video.asset_id,
            lesson_id = ?video.lesson_id,
            status = ?video.status,
            playable = video.is_playable(),
            "Lesson video updated"
        );

        WebhookOutcome::Processed
    }
}

#[async_trait]
impl WebhookHandler<VideoEvent> for VideoCatalog {
    async fn handle(&self, event: &VideoEvent) -> Result<WebhookOutcome> {
        Ok(self.apply(event).await)
    }
}
