use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DownloadError {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to download: {0} not found in PATH or common install locations")]
    ToolNotFound(String),

    #[error("Process error: {0}")]
    Spawn(String),

    #[error("Download failed with exit code {}", exit_code_label(.0))]
    NonZeroExit(Option<i32>),

    #[error("Download failed - file not created")]
    OutputMissing,

    #[error("Download timed out after {0} seconds")]
    TimedOut(u64),

    #[error("I/O error: {0}")]
    Io(String),
}

impl DownloadError {
    /// True for errors caused by the caller rather than the tool or host.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DownloadError::Validation(_))
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
