use std::{ffi::OsString, net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;

use crate::application::{CoordinatorSettings, ToolLocator, DEFAULT_TIMEOUT};

#[derive(Debug, Clone, Parser)]
#[command(name = "lesson-video-downloads")]
#[command(version)]
#[command(about = "Downloads lesson videos with yt-dlp and serves them for offline playback")]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[arg(long, env = "DOWNLOADS_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Directory produced files are written to
    #[arg(long, env = "DOWNLOADS_DIR", default_value = "public/downloads")]
    pub download_dir: PathBuf,

    /// URL prefix the download directory is served under
    #[arg(long, env = "DOWNLOADS_PUBLIC_PATH", default_value = "/downloads")]
    pub public_path: String,

    /// Explicit yt-dlp executable
    #[arg(long, env = "YT_DLP_PATH")]
    pub tool_path: Option<PathBuf>,

    /// PATH-style list of directories searched for yt-dlp instead of PATH
    #[arg(long, env = "YT_DLP_SEARCH_PATH")]
    pub tool_search_path: Option<OsString>,

    /// Hard limit for a single download
    #[arg(long, env = "DOWNLOADS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Enable verbose logging (use RUST_LOG for finer control)
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServerConfig {
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            output_dir: self.download_dir.clone(),
            public_path: normalize_public_path(&self.public_path),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn tool_locator(&self) -> ToolLocator {
        ToolLocator {
            explicit: self.tool_path.clone(),
            search_path: self.tool_search_path.clone(),
            ..ToolLocator::default()
        }
    }
}

/// Leading slash, no trailing slash; the root collapses to an empty prefix.
fn normalize_public_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
