use crate::app::AppContext;
use crate::error::Result;
use crate::http::RouteModule;
use crate::lessons::{LessonVideo, VideoEvent};
use crate::webhooks::{WebhookOutcome, WebhookRouter, verified_event};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
};
use serde::Serialize;

/// Lesson video listing and the video host webhook
pub struct LessonsModule;

impl RouteModule for LessonsModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/lessons/{lesson_id}/videos", get(list_playable_videos))
            .route("/webhooks/video", post(receive_video_webhook))
    }
}

/// Acknowledgement body for webhook deliveries
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: WebhookOutcome,
}

async fn list_playable_videos(
    State(ctx): State<AppContext>,
    Path(lesson_id): Path<String>,
) -> Json<Vec<LessonVideo>> {
    Json(ctx.videos.playable_for(&lesson_id).await)
}

async fn receive_video_webhook(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let event: VideoEvent = verified_event(
        ctx.webhook_verifier.as_ref(),
        &ctx.signature_header,
        &headers,
        &body,
    )?;

    let status = WebhookRouter::new(ctx.idempotency.as_ref())
        .process(&event, ctx.videos.as_ref())
        .await?;

    Ok(Json(WebhookAck { status }))
}
