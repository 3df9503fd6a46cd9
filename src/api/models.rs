use serde::{Deserialize, Serialize};

use crate::domain::{DownloadOutcome, DownloadedFile, ProgressSnapshot};

/// Body of `POST /api/download`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StartDownloadBody {
    #[serde(rename = "videoId", default)]
    pub video_id: Option<String>,
    #[serde(rename = "videoTitle", default)]
    pub video_title: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
}

/// Query of `GET /api/download`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartDownloadResponse {
    pub ok: bool,
    pub message: String,
    pub download_url: String,
    pub file_name: String,
    pub file_size: u64,
    pub quality: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

impl From<DownloadOutcome> for StartDownloadResponse {
    fn from(outcome: DownloadOutcome) -> Self {
        let message = if outcome.cached {
            "Video already downloaded"
        } else {
            "Video downloaded successfully"
        };
        Self {
            ok: true,
            message: message.to_string(),
            download_url: outcome.download_url,
            file_name: outcome.file_name,
            file_size: outcome.file_size,
            quality: outcome.quality.to_string(),
            cached: outcome.cached,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub ok: bool,
    pub video_id: String,
    pub quality: String,
    pub progress: f64,
    pub is_downloading: bool,
}

impl ProgressResponse {
    pub fn new(video_id: String, quality: String, snapshot: ProgressSnapshot) -> Self {
        Self {
            ok: true,
            video_id,
            quality,
            progress: snapshot.progress,
            is_downloading: snapshot.is_downloading,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub url: String,
    pub size: u64,
    pub size_formatted: String,
}

impl From<DownloadedFile> for FileEntry {
    fn from(file: DownloadedFile) -> Self {
        Self {
            name: file.name,
            url: file.url,
            size: file.size,
            size_formatted: file.size_formatted,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListDownloadsResponse {
    pub ok: bool,
    pub files: Vec<FileEntry>,
}
