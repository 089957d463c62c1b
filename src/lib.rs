//! Threadscan - incremental forum thread ingestion
//!
//! This library repeatedly scans a community's recent posts, stores every
//! post and comment it has not seen before, re-walks posts whose comment
//! count grew, and keeps a normalized word index of all stored text.

pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod ingest;
pub mod remote;
pub mod storage;

/// Re-export commonly used types
pub use config::Config;
pub use content::{ContentObject, ObjectKind, Token};
pub use error::IngestError;
pub use ingest::{IngestConfig, Ingestor, PassReport};
pub use remote::{RedditClient, RemoteSource};
pub use storage::Database;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "threadscan";
