//! Lesson videos.
//!
//! Tracks the processing state of lesson videos from video host webhooks and
//! decides which of them learners can play.

mod catalog;
mod events;
mod routes;
mod video;

pub use catalog::VideoCatalog;
pub use events::{PlaybackId, VideoAsset, VideoEvent};
pub use routes::{LessonsModule, WebhookAck};
pub use video::{LessonVideo, VideoStatus, playable};
