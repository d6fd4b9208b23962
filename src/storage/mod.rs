//! Statistics Store
//!
//! The analytical side of the service:
//!
//! - **types**: Time ranges and the records the store produces
//! - **store**: Pooled SQLite access and schema bootstrap
//! - **import**: CSV loader for the `stats` relation
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use hashtag_stats::storage::{CsvImporter, StatsStore};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = StatsStore::open("./data/stats.db", 4).await?;
//!     let summary = CsvImporter::new()
//!         .import_path(&store, Path::new("edits.csv"))
//!         .await?;
//!
//!     println!("Loaded {} rows", summary.rows_inserted);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod import;
pub mod store;
pub mod types;

pub use error::{StorageError, StorageResult};
pub use import::{CsvImporter, ImportSummary};
pub use store::StatsStore;
pub use types::{
    epoch, parse_timestamp, HashtagUsage, IntervalStats, Metadata, ResolvedRange, StatsRow,
    TimeRange, TimeSpanStats, TIMESTAMP_FORMAT,
};
