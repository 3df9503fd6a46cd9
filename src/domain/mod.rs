pub mod error;
pub mod model;

pub use error::DownloadError;
pub use model::{
    normalize_video_id, DownloadOutcome, DownloadRequest, DownloadedFile, ProgressKey,
    ProgressSnapshot, Quality,
};
