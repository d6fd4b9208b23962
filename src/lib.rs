//! # hashtag-stats
//!
//! Aggregate statistics for hashtagged map edits: how many changesets,
//! users, road kilometres and buildings a hashtag accounts for over any
//! time window, optionally broken down into time buckets.
//!
//! ## Modules
//!
//! - [`query`]: Hashtag expressions, interval tokens and SQL rendering
//! - [`storage`]: SQLite store, record types and CSV import
//! - [`repository`]: Runs the statistics queries and maps rows
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration and logging setup
//! - [`clock`]: Injectable source of "now"
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hashtag_stats::query::HashtagExpression;
//! use hashtag_stats::repository::StatsRepository;
//! use hashtag_stats::storage::{StatsStore, TimeRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = StatsStore::open("./data/stats.db", 4).await?;
//!     let repository = StatsRepository::new(store);
//!
//!     // Every hashtag starting with "hotosm-project-"
//!     let expr = HashtagExpression::parse("hotosm-project-*");
//!     let stats = repository.stats_for_time_span(&expr, TimeRange::all()).await?;
//!     println!("{} edits by {} users", stats.edits, stats.users);
//!
//!     let monthly = repository
//!         .stats_for_time_span_interval(&expr, TimeRange::all(), "P1M")
//!         .await?;
//!     println!("{} active months", monthly.len());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod clock;
pub mod config;
pub mod query;
pub mod repository;
pub mod storage;

// Re-export top-level types for convenience
pub use storage::{
    HashtagUsage, IntervalStats, Metadata, StatsStore, StorageError, StorageResult, TimeRange,
    TimeSpanStats,
};

pub use query::{
    translate_interval, Dialect, HashtagExpression, Interval, QueryError, QueryResult,
};

pub use repository::StatsRepository;

pub use clock::{Clock, FixedClock, SystemClock};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{ApiConfig, Config, ConfigError, DatabaseConfig, LoggingConfig};
