use serde::{Deserialize, Serialize};

/// Processing state of a lesson video on the video host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Preparing,
    Ready,
    Errored,
    Deleted,
}

impl VideoStatus {
    /// Whether a late or replayed event may move a video from `self` to `next`
    ///
    /// Deleted is terminal, and a ready video never goes back to preparing.
    pub fn can_transition_to(self, next: VideoStatus) -> bool {
        match (self, next) {
            (VideoStatus::Deleted, _) => false,
            (VideoStatus::Ready, VideoStatus::Preparing) => false,
            _ => true,
        }
    }
}

/// A video attached to a lesson
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LessonVideo {
    pub asset_id: String,
    #[serde(default)]
    pub lesson_id: Option<String>,
    #[serde(default)]
    pub playback_id: Option<String>,
    pub status: VideoStatus,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

impl LessonVideo {
    pub fn new(asset_id: impl Into<String>, status: VideoStatus) -> Self {
        Self {
            asset_id: asset_id.into(),
            lesson_id: None,
            playback_id: None,
            status,
            duration_seconds: None,
        }
    }

    pub fn with_lesson(mut self, lesson_id: impl Into<String>) -> Self {
        self.lesson_id = Some(lesson_id.into());
        self
    }

    pub fn with_playback_id(mut self, playback_id: impl Into<String>) -> Self {
        self.playback_id = Some(playback_id.into());
        self
    }

    /// A video can be shown to learners once it is ready and has a playback id
    pub fn is_playable(&self) -> bool {
        self.status == VideoStatus::Ready
            && self.playback_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// Keep only playable videos
pub fn playable<'a, I>(videos: I) -> impl Iterator<Item = &'a LessonVideo>
where
    I: IntoIterator<Item = &'a LessonVideo>,
{
    videos.into_iter().filter(|video| video.is_playable())
}
