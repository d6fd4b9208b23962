//! hashtag-stats CLI
//!
//! Operator tool for the hashtag statistics service:
//! - Run the API server
//! - Load CSV exports into the stats database
//! - Run the four statistics queries locally
//! - Print the SQL a query renders to, per dialect

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hashtag_stats::api::{self, AppState};
use hashtag_stats::clock::SystemClock;
use hashtag_stats::config::{generate_default_config, Config};
use hashtag_stats::query::{builder, dialect_for, HashtagExpression, Interval, DEFAULT_TOP_LIMIT};
use hashtag_stats::repository::StatsRepository;
use hashtag_stats::storage::{parse_timestamp, CsvImporter, StatsStore, TimeRange};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hashtag-stats")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Aggregate statistics for hashtagged map edits")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: standard locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output format for query results
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Clone, Copy, ValueEnum)]
enum QueryKind {
    Stats,
    Interval,
    Top,
    Metadata,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve,

    /// Import edits from CSV
    Import {
        /// Path to CSV file
        path: PathBuf,
        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,
        /// Validate only, don't write
        #[arg(long)]
        dry_run: bool,
    },

    /// Aggregates for a hashtag (`name*` for prefix match)
    Stats {
        hashtag: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },

    /// Aggregates for a hashtag per interval bucket
    Interval {
        hashtag: String,
        /// ISO-8601 duration such as P1M, P1W or PT6H
        #[arg(short, long, default_value = "P1M")]
        interval: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },

    /// Hashtags with the most distinct users
    Top {
        #[arg(short, long)]
        limit: Option<u32>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },

    /// Earliest and latest timestamp in the dataset
    Metadata,

    /// Print the SQL a query renders to
    Explain {
        #[arg(value_enum)]
        kind: QueryKind,
        /// Hashtag for stats / interval queries
        #[arg(long, default_value = "")]
        hashtag: String,
        #[arg(short, long, default_value = "P1M")]
        interval: String,
        #[arg(short, long)]
        limit: Option<u32>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// sqlite or clickhouse
        #[arg(long, default_value = "sqlite")]
        dialect: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(db) = &cli.db {
        config.database.path = db.to_string_lossy().to_string();
    }

    match cli.command {
        Commands::Config { output } => write_default_config(output),

        Commands::Explain {
            kind,
            hashtag,
            interval,
            limit,
            start,
            end,
            dialect,
        } => {
            let dialect =
                dialect_for(&dialect).ok_or_else(|| anyhow!("unknown dialect '{}'", dialect))?;
            let range = parse_range(start.as_deref(), end.as_deref())?.resolve(&SystemClock);
            let expr = HashtagExpression::parse(&hashtag);

            let query = match kind {
                QueryKind::Stats => builder::time_span(&expr, &range),
                QueryKind::Interval => {
                    builder::time_span_interval(&expr, &range, Interval::parse(&interval)?)
                }
                QueryKind::Top => {
                    builder::most_used_hashtags(&range, limit.unwrap_or(DEFAULT_TOP_LIMIT))
                }
                QueryKind::Metadata => builder::metadata(),
            };

            print!("{}", dialect.render(&query));
            Ok(())
        }

        command => {
            config.logging.init_tracing();
            run(command, &config, cli.format).await
        }
    }
}

/// Commands that need the database
async fn run(command: Commands, config: &Config, format: OutputFormat) -> Result<()> {
    let store = StatsStore::open(&config.database.path, config.database.pool_size)
        .await
        .with_context(|| format!("opening database {}", config.database.path))?;

    match command {
        Commands::Serve => {
            tracing::info!(
                "Starting hashtag-stats API server v{}",
                env!("CARGO_PKG_VERSION")
            );
            let state = AppState::new(StatsRepository::new(store), config.api.clone());
            api::serve(state).await?;
        }

        Commands::Import {
            path,
            delimiter,
            dry_run,
        } => {
            let delimiter = u8::try_from(delimiter)
                .map_err(|_| anyhow!("delimiter must be a single-byte character"))?;
            let importer = CsvImporter::new().with_delimiter(delimiter);

            if dry_run {
                let rows = importer.parse_path(&path)?;
                println!("{} rows valid, nothing written (dry run)", rows.len());
            } else {
                let summary = importer.import_path(&store, &path).await?;
                println!(
                    "Imported {} rows into {}",
                    summary.rows_inserted,
                    store.path().display()
                );
            }
        }

        Commands::Stats { hashtag, start, end } => {
            let repository = StatsRepository::new(store);
            let range = parse_range(start.as_deref(), end.as_deref())?;
            let stats = repository
                .stats_for_time_span(&HashtagExpression::parse(&hashtag), range)
                .await?;
            print_record(format, &stats)?;
        }

        Commands::Interval {
            hashtag,
            interval,
            start,
            end,
        } => {
            let repository = StatsRepository::new(store);
            let range = parse_range(start.as_deref(), end.as_deref())?;
            let buckets = repository
                .stats_for_time_span_interval(&HashtagExpression::parse(&hashtag), range, &interval)
                .await?;
            print_records(format, &buckets)?;
        }

        Commands::Top { limit, start, end } => {
            let repository = StatsRepository::new(store);
            let range = parse_range(start.as_deref(), end.as_deref())?;
            let usage = repository.most_used_hashtags(range, limit).await?;
            print_records(format, &usage)?;
        }

        Commands::Metadata => {
            let repository = StatsRepository::new(store);
            let metadata = repository.metadata().await?;
            print_record(format, &metadata)?;
        }

        Commands::Config { .. } | Commands::Explain { .. } => {
            bail!("command does not use the database")
        }
    }

    Ok(())
}

fn write_default_config(output: Option<PathBuf>) -> Result<()> {
    let content = generate_default_config();
    match output {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote default config to {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn parse_range(start: Option<&str>, end: Option<&str>) -> Result<TimeRange> {
    let parse = |name: &str, value: Option<&str>| -> Result<_> {
        value
            .map(|raw| {
                parse_timestamp(raw).ok_or_else(|| anyhow!("invalid {} date '{}'", name, raw))
            })
            .transpose()
    };

    let range = TimeRange::new(parse("start", start)?, parse("end", end)?);
    if let (Some(s), Some(e)) = (range.start, range.end) {
        if s >= e {
            tracing::warn!("start is not before end, results will be empty");
        }
    }
    Ok(range)
}

/// Print a single record: a JSON object, or a one-row table
fn print_record<T: Serialize>(format: OutputFormat, record: &T) -> Result<()> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(record)?,
        OutputFormat::Table => render_table(std::slice::from_ref(record))?,
    };
    println!("{}", output);
    Ok(())
}

/// Print a record list
fn print_records<T: Serialize>(format: OutputFormat, records: &[T]) -> Result<()> {
    println!("{}", render_records(format, records)?);
    Ok(())
}

/// A record list is always a JSON array, whatever its length
fn render_records<T: Serialize>(format: OutputFormat, records: &[T]) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Table => render_table(records),
    }
}

/// Whitespace-aligned table, columns in the records' key order
fn render_table<T: Serialize>(records: &[T]) -> Result<String> {
    let rows = records
        .iter()
        .map(|r| -> Result<serde_json::Map<String, serde_json::Value>> {
            match serde_json::to_value(r)? {
                serde_json::Value::Object(map) => Ok(map),
                _ => bail!("record is not an object"),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let Some(first) = rows.first() else {
        return Ok("(no rows)".to_string());
    };

    let headers: Vec<&String> = first.keys().collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|h| match row.get(h.as_str()) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(serde_json::Value::Null) | None => "-".to_string(),
                    Some(other) => other.to_string(),
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![line(headers.iter().map(|h| h.as_str()).collect())];
    lines.extend(
        cells
            .iter()
            .map(|row| line(row.iter().map(String::as_str).collect())),
    );
    Ok(lines.join("\n"))
}
