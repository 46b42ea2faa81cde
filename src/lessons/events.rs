use serde::Deserialize;
use crate::lessons::VideoStatus;
use crate::webhooks::WebhookEvent;

/// Webhook envelope sent by the video host
#[derive(Debug, Clone, Deserialize)]
pub struct VideoEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: VideoAsset,
}

/// The asset an event is about
#[derive(Debug, Clone, Deserialize)]
pub struct VideoAsset {
    pub id: String,
    #[serde(default)]
    pub playback_ids: Vec<PlaybackId>,
    /// Free-form field set at upload time; carries the lesson id
    #[serde(default)]
    pub passthrough: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackId {
    pub id: String,
    #[serde(default)]
    pub policy: Option<String>,
}

impl VideoEvent {
    /// Status an asset moves to for this event type, or `None` if the type is not tracked
    pub fn status(&self) -> Option<VideoStatus> {
        match self.event_type.as_str() {
            "video.asset.created" => Some(VideoStatus::Preparing),
            "video.asset.ready" => Some(VideoStatus::Ready),
            "video.asset.errored" => Some(VideoStatus::Errored),
            "video.asset.deleted" => Some(VideoStatus::Deleted),
            _ => None,
        }
    }

    /// First playback id, preferring public ones
    pub fn playback_id(&self) -> Option<&str> {
        let ids = &self.data.playback_ids;
        ids.iter()
            .find(|p| p.policy.as_deref() == Some("public"))
            .or_else(|| ids.first())
            .map(|p| p.id.as_str())
    }
}

impl WebhookEvent for VideoEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn event_type(&self) -> &str {
        &self.event_type
    }
}
