pub mod error;
pub mod files;
pub mod models;
pub mod routes;

pub use routes::{router, AppState};
