pub mod config;
pub mod debug_capture;
pub mod detector;
pub mod models;
pub mod plugins;
pub mod poller;
pub mod retry;
pub mod scraper;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use poller::{PollerHandle, PollerSettings, StockPoller};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
