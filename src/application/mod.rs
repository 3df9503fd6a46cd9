pub mod download_coordinator;
pub mod keyed_lock;
pub mod progress;
pub mod tool;

pub use download_coordinator::{CoordinatorSettings, DownloadCoordinator, DEFAULT_TIMEOUT};
pub use progress::ProgressTable;
pub use tool::{ProcessRunner, ToolLocator, ToolRunner};
