pub mod catalog;
pub mod cli;
pub mod config;
pub mod export;
pub mod store;
pub mod transcode;

pub use catalog::{SessionCatalog, SessionFilter, SessionSummary};
pub use config::Config;
pub use export::{ExportError, ExportOptions, OutputFormat};
pub use store::{ChatStore, StoreError};
