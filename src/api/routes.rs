use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::{
    error::{ApiError, ApiResult},
    files::{resolve_download_path, stream_file},
    models::{
        DownloadQuery, FileEntry, ListDownloadsResponse, ProgressResponse, StartDownloadBody,
        StartDownloadResponse,
    },
};
use crate::{
    application::DownloadCoordinator,
    domain::{normalize_video_id, DownloadRequest, ProgressKey, Quality},
};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: DownloadCoordinator,
}

pub fn router(state: AppState) -> Router {
    let files_route = format!("{}/{{file}}", state.coordinator.settings().public_path);

    Router::new()
        .route("/api/download", get(download_status).post(start_download))
        .route(&files_route, get(serve_download))
        .fallback(not_found)
        .with_state(state)
}

async fn start_download(
    State(state): State<AppState>,
    payload: Result<Json<StartDownloadBody>, JsonRejection>,
) -> ApiResult<Json<StartDownloadResponse>> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::warn!("rejected download request: {}", rejection.body_text());
        ApiError::bad_request(rejection.body_text())
    })?;

    let request = DownloadRequest::new(body.video_id, body.video_title, body.quality.as_deref())?;
    let outcome = state.coordinator.start(request).await?;
    Ok(Json(outcome.into()))
}

/// Progress for one download when `videoId` is given, otherwise the listing.
async fn download_status(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    match normalize_video_id(query.video_id) {
        Some(video_id) => {
            // an empty quality parameter means the default, like an absent one
            let quality =
                Quality::parse_lenient(query.quality.as_deref().filter(|q| !q.is_empty()));
            let snapshot = state
                .coordinator
                .progress(&ProgressKey::new(video_id.clone(), quality));
            Ok(Json(ProgressResponse::new(video_id, quality.to_string(), snapshot)).into_response())
        }
        None => {
            let files = state.coordinator.list_downloads().await.map_err(|e| {
                tracing::error!("error listing downloads: {}", e);
                ApiError::internal("Failed to list downloads")
            })?;
            Ok(Json(ListDownloadsResponse {
                ok: true,
                files: files.into_iter().map(FileEntry::from).collect(),
            })
            .into_response())
        }
    }
}

async fn serve_download(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let path = resolve_download_path(&state.coordinator.settings().output_dir, &file)?;
    stream_file(path, &headers).await
}

async fn not_found() -> ApiError {
    ApiError::not_found("endpoint not found")
}
