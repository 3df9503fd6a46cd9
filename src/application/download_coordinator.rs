use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use crate::{
    application::{
        keyed_lock::KeyedLocks,
        progress::ProgressTable,
        tool::{ToolInvocation, ToolRunner},
    },
    domain::{
        DownloadError, DownloadOutcome, DownloadRequest, DownloadedFile, ProgressKey,
        ProgressSnapshot,
    },
    utils::format_bytes,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub output_dir: PathBuf,
    /// URL prefix the output directory is served under, e.g. `/downloads`
    pub public_path: String,
    pub timeout: Duration,
}

impl CoordinatorSettings {
    pub fn file_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.public_path, file_name)
    }
}

#[derive(Clone)]
pub struct DownloadCoordinator {
    settings: Arc<CoordinatorSettings>,
    runner: Arc<dyn ToolRunner>,
    progress: ProgressTable,
    locks: KeyedLocks,
}

impl DownloadCoordinator {
    pub fn new(
        settings: CoordinatorSettings,
        runner: Arc<dyn ToolRunner>,
        progress: ProgressTable,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            runner,
            progress,
            locks: KeyedLocks::new(),
        }
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// Produce a local copy of the requested video, or return the cached one.
    ///
    /// Requests that resolve to the same output file are serialized; later
    /// callers wait for the first one and then see its file as cached.
    pub async fn start(&self, request: DownloadRequest) -> Result<DownloadOutcome, DownloadError> {
        tokio::fs::create_dir_all(&self.settings.output_dir)
            .await
            .map_err(|e| DownloadError::Io(format!("Failed to create download directory: {}", e)))?;

        let file_name = request.file_name();
        let output = self.settings.output_dir.join(&file_name);

        let _lock = self.locks.acquire(&file_name).await;

        if let Some(size) = existing_file_size(&output).await {
            tracing::info!(video_id = %request.video_id, file = %file_name, "serving cached download");
            return Ok(self.outcome(file_name, size, &request, true));
        }

        let program = self.runner.locate()?;
        let invocation = ToolInvocation::for_request(program, &request, &output)?;

        tracing::info!(
            video_id = %request.video_id,
            quality = %request.quality,
            file = %file_name,
            active = self.progress.len(),
            "starting download"
        );

        let exit = {
            let entry = self.progress.begin(request.progress_key());
            let on_stdout = |chunk: &str| entry.observe(chunk);
            tokio::time::timeout(
                self.settings.timeout,
                self.runner.run(&invocation, &on_stdout),
            )
            .await
        };

        let exit = match exit {
            Ok(Ok(exit)) => exit,
            Ok(Err(e)) => {
                tracing::error!(video_id = %request.video_id, "downloader process error: {}", e);
                return Err(e);
            }
            Err(_) => {
                let secs = self.settings.timeout.as_secs();
                tracing::error!(video_id = %request.video_id, "downloader timed out after {}s", secs);
                return Err(DownloadError::TimedOut(secs));
            }
        };

        if !exit.success() {
            tracing::error!(video_id = %request.video_id, code = ?exit.code, "downloader exited with failure");
            return Err(DownloadError::NonZeroExit(exit.code));
        }

        let size = existing_file_size(&output).await.ok_or_else(|| {
            tracing::error!(video_id = %request.video_id, file = %file_name, "downloader exited cleanly without output");
            DownloadError::OutputMissing
        })?;

        tracing::info!(video_id = %request.video_id, file = %file_name, size, "download finished");
        Ok(self.outcome(file_name, size, &request, false))
    }

    pub fn progress(&self, key: &ProgressKey) -> ProgressSnapshot {
        self.progress.snapshot(key)
    }

    /// Files in the output directory, sorted by name. A missing directory is
    /// an empty listing.
    pub async fn list_downloads(&self) -> Result<Vec<DownloadedFile>, DownloadError> {
        let mut entries = match tokio::fs::read_dir(&self.settings.output_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DownloadError::Io(e.to_string())),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DownloadError::Io(e.to_string()))?
        {
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| DownloadError::Io(e.to_string()))?;
            if !metadata.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            files.push(DownloadedFile {
                url: self.settings.file_url(&name),
                size: metadata.len(),
                size_formatted: format_bytes(metadata.len()),
                name,
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn outcome(
        &self,
        file_name: String,
        file_size: u64,
        request: &DownloadRequest,
        cached: bool,
    ) -> DownloadOutcome {
        DownloadOutcome {
            download_url: self.settings.file_url(&file_name),
            file_name,
            file_size,
            quality: request.quality,
            cached,
        }
    }
}

async fn existing_file_size(path: &Path) -> Option<u64> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => Some(metadata.len()),
        _ => None,
    }
}
