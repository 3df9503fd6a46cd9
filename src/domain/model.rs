use std::fmt;

use url::Url;

use super::error::DownloadError;
use crate::utils::sanitize_filename;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const MAX_TITLE_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    Audio,
    Low,
    Medium,
    Best,
}

impl Quality {
    /// Absent means `low`; anything unrecognized is treated as `best`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value {
            None => Quality::Low,
            Some("audio") => Quality::Audio,
            Some("low") => Quality::Low,
            Some("medium") => Quality::Medium,
            Some(_) => Quality::Best,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Audio => "audio",
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::Best => "best",
        }
    }

    /// yt-dlp `-f` selector for this tier.
    pub fn format_selector(&self) -> &'static str {
        match self {
            Quality::Audio => "bestaudio[ext=m4a]/bestaudio",
            Quality::Low => "worst[ext=mp4]/worst",
            Quality::Medium => "best[height<=480][ext=mp4]/best[height<=480]",
            Quality::Best => "best[ext=mp4]/best",
        }
    }

    pub fn file_suffix(&self) -> &'static str {
        match self {
            Quality::Audio => "_audio",
            Quality::Low => "_low",
            Quality::Medium => "_medium",
            Quality::Best => "",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Quality::Audio => "m4a",
            _ => "mp4",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trimmed video id, or `None` when nothing but whitespace was supplied.
/// Starting a download and polling its progress both key on this form.
pub fn normalize_video_id(raw: Option<String>) -> Option<String> {
    raw.map(|id| id.trim().to_string()).filter(|id| !id.is_empty())
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub video_id: String,
    pub title: String,
    pub quality: Quality,
}

impl DownloadRequest {
    pub fn new(
        video_id: Option<String>,
        title: Option<String>,
        quality: Option<&str>,
    ) -> Result<Self, DownloadError> {
        let video_id = normalize_video_id(video_id)
            .ok_or_else(|| DownloadError::Validation("Video ID is required".to_string()))?;

        let title = title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| video_id.clone());

        Ok(Self {
            video_id,
            title,
            quality: Quality::parse_lenient(quality),
        })
    }

    /// Output file name. Derived from the title and quality only, so two
    /// videos whose sanitized titles match share a file.
    pub fn file_name(&self) -> String {
        let stem: String = sanitize_filename(&self.title)
            .chars()
            .take(MAX_TITLE_CHARS)
            .collect();
        format!(
            "{}{}.{}",
            stem,
            self.quality.file_suffix(),
            self.quality.extension()
        )
    }

    pub fn watch_url(&self) -> Result<Url, DownloadError> {
        Url::parse_with_params(WATCH_URL, &[("v", self.video_id.as_str())])
            .map_err(|e| DownloadError::Validation(format!("Invalid video ID: {}", e)))
    }

    pub fn progress_key(&self) -> ProgressKey {
        ProgressKey::new(self.video_id.clone(), self.quality)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub video_id: String,
    pub quality: Quality,
}

impl ProgressKey {
    pub fn new(video_id: impl Into<String>, quality: Quality) -> Self {
        Self {
            video_id: video_id.into(),
            quality,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Percentage, 0 to 100
    pub progress: f64,
    pub is_downloading: bool,
}

impl ProgressSnapshot {
    pub fn idle() -> Self {
        Self {
            progress: 0.0,
            is_downloading: false,
        }
    }

    pub fn from_progress(progress: f64) -> Self {
        Self {
            progress,
            is_downloading: progress > 0.0 && progress < 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    pub file_name: String,
    pub download_url: String,
    pub file_size: u64,
    pub quality: Quality,
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedFile {
    pub name: String,
    pub url: String,
    pub size: u64,
    pub size_formatted: String,
}
