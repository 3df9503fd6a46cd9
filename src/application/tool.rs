use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};
use tokio_util::io::ReaderStream;

use crate::domain::{DownloadError, DownloadRequest};

pub const TOOL_NAME: &str = "yt-dlp";

const FALLBACK_LOCATIONS: [&str; 3] = [
    "/usr/local/bin/yt-dlp",
    "/opt/homebrew/bin/yt-dlp",
    "/usr/bin/yt-dlp",
];

/// Where to look for the downloader executable.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    /// Used as-is when it points at a file
    pub explicit: Option<PathBuf>,
    /// PATH-style list searched instead of the process `PATH`
    pub search_path: Option<OsString>,
    pub fallbacks: Vec<PathBuf>,
}

impl Default for ToolLocator {
    fn default() -> Self {
        Self {
            explicit: None,
            search_path: None,
            fallbacks: FALLBACK_LOCATIONS.iter().map(PathBuf::from).collect(),
        }
    }
}

impl ToolLocator {
    pub fn locate(&self) -> Result<PathBuf, DownloadError> {
        if let Some(path) = self.explicit.as_ref().filter(|p| p.is_file()) {
            return Ok(path.clone());
        }

        let searched = match &self.search_path {
            Some(paths) => which::which_in(TOOL_NAME, Some(paths), current_dir()),
            None => which::which(TOOL_NAME),
        };
        if let Ok(path) = searched {
            return Ok(path);
        }

        self.fallbacks
            .iter()
            .find(|p| p.exists())
            .cloned()
            .ok_or_else(|| DownloadError::ToolNotFound(TOOL_NAME.to_string()))
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// A fully resolved command line for one download.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn for_request(
        program: PathBuf,
        request: &DownloadRequest,
        output: &Path,
    ) -> Result<Self, DownloadError> {
        let args = vec![
            "-f".to_string(),
            request.quality.format_selector().to_string(),
            "-o".to_string(),
            output.to_string_lossy().into_owned(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--progress".to_string(),
            request.watch_url()?.to_string(),
        ];
        Ok(Self { program, args })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolExit {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl ToolExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Seam between the coordinator and the external downloader.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    fn locate(&self) -> Result<PathBuf, DownloadError>;

    /// Run to completion, passing every chunk of standard output to `on_stdout`.
    async fn run(
        &self,
        invocation: &ToolInvocation,
        on_stdout: &(dyn for<'a> Fn(&'a str) + Send + Sync),
    ) -> Result<ToolExit, DownloadError>;
}

/// Spawns the real yt-dlp process.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    locator: ToolLocator,
}

impl ProcessRunner {
    pub fn new(locator: ToolLocator) -> Self {
        Self { locator }
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    fn locate(&self) -> Result<PathBuf, DownloadError> {
        self.locator.locate()
    }

    async fn run(
        &self,
        invocation: &ToolInvocation,
        on_stdout: &(dyn for<'a> Fn(&'a str) + Send + Sync),
    ) -> Result<ToolExit, DownloadError> {
        tracing::debug!(program = %invocation.program.display(), args = ?invocation.args, "spawning downloader");

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::Spawn(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::Spawn("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::Spawn("stderr was not captured".to_string()))?;

        let read_stdout = async {
            let mut chunks = ReaderStream::new(stdout);
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(bytes) => on_stdout(&String::from_utf8_lossy(&bytes)),
                    Err(e) => {
                        tracing::warn!("reading downloader stdout failed: {}", e);
                        break;
                    }
                }
            }
        };

        let read_stderr = async {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                log_stderr_line(&line);
            }
        };

        tokio::join!(read_stdout, read_stderr);

        let status = child
            .wait()
            .await
            .map_err(|e| DownloadError::Spawn(e.to_string()))?;

        Ok(ToolExit {
            code: status.code(),
        })
    }
}

fn log_stderr_line(line: &str) {
    if line.trim().is_empty() {
        return;
    }
    if line.contains("WARNING") {
        tracing::debug!("yt-dlp: {}", line);
    } else {
        tracing::warn!("yt-dlp stderr: {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn locator_in(dir: &Path, fallbacks: Vec<PathBuf>) -> ToolLocator {
        ToolLocator {
            explicit: None,
            search_path: Some(dir.as_os_str().to_owned()),
            fallbacks,
        }
    }

    #[test]
    fn test_invocation_arguments() {
        let request =
            DownloadRequest::new(Some("abc123".into()), Some("Lesson".into()), Some("medium"))
                .unwrap();
        let output = PathBuf::from("/srv/downloads/Lesson_medium.mp4");
        let invocation =
            ToolInvocation::for_request(PathBuf::from("/usr/bin/yt-dlp"), &request, &output)
                .unwrap();

        assert_eq!(
            invocation.args,
            vec![
                "-f",
                "best[height<=480][ext=mp4]/best[height<=480]",
                "-o",
                "/srv/downloads/Lesson_medium.mp4",
                "--quiet",
                "--no-warnings",
                "--progress",
                "https://www.youtube.com/watch?v=abc123",
            ]
        );
    }

    #[test]
    fn test_locate_uses_fallbacks_when_search_path_is_empty() {
        let empty = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        let installed = elsewhere.path().join("yt-dlp");
        std::fs::write(&installed, b"").unwrap();

        let locator = locator_in(
            empty.path(),
            vec![elsewhere.path().join("missing"), installed.clone()],
        );
        assert_eq!(locator.locate().unwrap(), installed);
    }

    #[test]
    fn test_locate_reports_missing_tool() {
        let empty = tempdir().unwrap();
        let locator = locator_in(empty.path(), vec![empty.path().join("yt-dlp")]);
        assert_eq!(
            locator.locate().unwrap_err(),
            DownloadError::ToolNotFound("yt-dlp".to_string())
        );
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempdir().unwrap();
        let explicit = dir.path().join("custom-yt-dlp");
        std::fs::write(&explicit, b"").unwrap();

        let locator = ToolLocator {
            explicit: Some(explicit.clone()),
            ..locator_in(dir.path(), Vec::new())
        };
        assert_eq!(locator.locate().unwrap(), explicit);
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_searches_configured_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let tool = dir.path().join("yt-dlp");
        std::fs::write(&tool, b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let locator = locator_in(dir.path(), Vec::new());
        assert_eq!(locator.locate().unwrap(), tool);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_streams_stdout_and_exit_code() {
        use parking_lot::Mutex;

        let invocation = ToolInvocation {
            program: PathBuf::from("/bin/sh"),
            args: vec![
                "-c".to_string(),
                "printf '[download]  12.5%%\\n'; echo 'ERROR: boom' >&2; exit 3".to_string(),
            ],
        };
        let seen = Mutex::new(String::new());
        let exit = ProcessRunner::default()
            .run(&invocation, &|chunk: &str| seen.lock().push_str(chunk))
            .await
            .unwrap();

        assert_eq!(exit.code, Some(3));
        assert!(!exit.success());
        assert!(seen.lock().contains("12.5%"));
    }

    #[tokio::test]
    async fn test_process_runner_spawn_failure() {
        let invocation = ToolInvocation {
            program: PathBuf::from("/definitely/not/a/real/yt-dlp"),
            args: Vec::new(),
        };
        let err = ProcessRunner::default()
            .run(&invocation, &|_: &str| {})
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Spawn(_)));
    }
}
