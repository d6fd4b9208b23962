//! CSV Import
//!
//! Loads edit rows into the `stats` relation. Columns are matched by header
//! name:
//!
//! ```text
//! changeset_id,user_id,road_length,building_area,hashtag,changeset_timestamp
//! ```
//!
//! Empty measurement cells become NULL. Any bad row aborts the whole import,
//! so a file is either loaded completely or not at all.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::store::StatsStore;
use crate::storage::types::{parse_timestamp, StatsRow};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// Record as it appears in the file
#[derive(Debug, Deserialize)]
struct CsvRecord {
    changeset_id: i64,
    user_id: i64,
    road_length: Option<f64>,
    building_area: Option<f64>,
    hashtag: String,
    changeset_timestamp: String,
}

/// Outcome of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows_read: usize,
    pub rows_inserted: usize,
}

/// CSV loader for the stats store
#[derive(Debug, Clone, Copy)]
pub struct CsvImporter {
    delimiter: u8,
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvImporter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse every record from a reader
    ///
    /// Row numbers in errors are file line numbers, counting the header as 1.
    pub fn parse<R: Read>(&self, input: R) -> StorageResult<Vec<StatsRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(input);

        let mut rows = Vec::new();

        for (index, result) in reader.deserialize::<CsvRecord>().enumerate() {
            let line = index as u64 + 2;

            let record = result.map_err(|e| {
                if e.is_io_error() {
                    StorageError::Csv(e)
                } else {
                    StorageError::InvalidRecord {
                        row: line,
                        message: e.to_string(),
                    }
                }
            })?;

            rows.push(Self::to_row(record, line)?);
        }

        Ok(rows)
    }

    /// Parse a CSV file
    pub fn parse_path(&self, path: &Path) -> StorageResult<Vec<StatsRow>> {
        let file = std::fs::File::open(path)?;
        self.parse(file)
    }

    /// Parse a CSV file and load it in one transaction
    ///
    /// The file is read and parsed on the blocking thread pool.
    pub async fn import_path(&self, store: &StatsStore, path: &Path) -> StorageResult<ImportSummary> {
        let importer = *self;
        let owned = path.to_path_buf();
        let rows = tokio::task::spawn_blocking(move || importer.parse_path(&owned))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
        let rows_read = rows.len();
        let rows_inserted = store.insert_rows(rows).await?;

        tracing::info!(path = ?path, rows_inserted, "CSV import complete");

        Ok(ImportSummary {
            rows_read,
            rows_inserted,
        })
    }

    fn to_row(record: CsvRecord, line: u64) -> StorageResult<StatsRow> {
        if record.hashtag.is_empty() {
            return Err(StorageError::InvalidRecord {
                row: line,
                message: "hashtag is empty".to_string(),
            });
        }

        let timestamp = parse_timestamp(&record.changeset_timestamp).ok_or_else(|| {
            StorageError::InvalidRecord {
                row: line,
                message: format!("unparseable timestamp '{}'", record.changeset_timestamp),
            }
        })?;

        Ok(StatsRow {
            changeset_id: record.changeset_id,
            user_id: record.user_id,
            road_length: record.road_length,
            building_area: record.building_area,
            hashtag: record.hashtag,
            changeset_timestamp: timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const HEADER: &str =
        "changeset_id,user_id,road_length,building_area,hashtag,changeset_timestamp\n";

    #[test]
    fn test_parse_rows() {
        let data = format!(
            "{}1,1,140,12.5,#&uganda,2017-12-19T00:52:03\n2,7,,,#hotosm-project-1,2018-01-02 10:00:00\n",
            HEADER
        );

        let rows = CsvImporter::new().parse(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].hashtag, "#&uganda");
        assert_eq!(rows[0].road_length, Some(140.0));
        assert_eq!(rows[0].building_area, Some(12.5));
        assert_eq!(
            rows[0].changeset_timestamp,
            parse_timestamp("2017-12-19T00:52:03").unwrap()
        );

        assert_eq!(rows[1].user_id, 7);
        assert!(rows[1].road_length.is_none());
        assert!(rows[1].building_area.is_none());
    }

    #[test]
    fn test_columns_matched_by_name() {
        let data = "hashtag,changeset_timestamp,user_id,changeset_id,building_area,road_length\n\
                    #a,2020-01-01,3,9,,1.5\n";

        let rows = CsvImporter::new().parse(data.as_bytes()).unwrap();
        assert_eq!(rows[0].changeset_id, 9);
        assert_eq!(rows[0].user_id, 3);
        assert_eq!(rows[0].road_length, Some(1.5));
    }

    #[test]
    fn test_bad_timestamp_reports_line() {
        let data = format!(
            "{}1,1,,,#a,2020-01-01\n2,1,,,#a,not-a-date\n",
            HEADER
        );

        let err = CsvImporter::new().parse(data.as_bytes()).unwrap_err();
        match err {
            StorageError::InvalidRecord { row, message } => {
                assert_eq!(row, 3);
                assert!(message.contains("not-a-date"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_number_reports_line() {
        let data = format!("{}abc,1,,,#a,2020-01-01\n", HEADER);

        let err = CsvImporter::new().parse(data.as_bytes()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidRecord { row: 2, .. }));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stream closed"))
        }
    }

    #[test]
    fn test_read_failure_is_csv_error() {
        let err = CsvImporter::new().parse(FailingReader).unwrap_err();
        assert!(matches!(err, StorageError::Csv(_)), "unexpected error: {err}");
        assert!(err.to_string().contains("stream closed"));
    }

    #[test]
    fn test_empty_hashtag_rejected() {
        let data = format!("{}1,1,,,,2020-01-01\n", HEADER);

        let err = CsvImporter::new().parse(data.as_bytes()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidRecord { row: 2, .. }));
    }

    #[test]
    fn test_custom_delimiter() {
        let data = "changeset_id;user_id;road_length;building_area;hashtag;changeset_timestamp\n\
                    1;2;;;#b;2020-01-01T00:00:00\n";

        let rows = CsvImporter::new()
            .with_delimiter(b';')
            .parse(data.as_bytes())
            .unwrap();
        assert_eq!(rows[0].hashtag, "#b");
    }

    #[tokio::test]
    async fn test_import_path() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("stats.csv");
        let mut file = std::fs::File::create(&csv_path).unwrap();
        write!(
            file,
            "{}1,1,140,1,#&uganda,2017-12-19T00:52:03\n2,2,,,#&uganda,2017-12-20T00:00:00\n",
            HEADER
        )
        .unwrap();

        let store = StatsStore::open(dir.path().join("stats.db"), 1).await.unwrap();
        let summary = CsvImporter::new().import_path(&store, &csv_path).await.unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                rows_read: 2,
                rows_inserted: 2
            }
        );
        assert_eq!(store.row_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failed_import_loads_nothing() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("bad.csv");
        std::fs::write(
            &csv_path,
            format!("{}1,1,,,#a,2020-01-01\n2,1,,,#a,garbage\n", HEADER),
        )
        .unwrap();

        let store = StatsStore::open(dir.path().join("stats.db"), 1).await.unwrap();
        assert!(CsvImporter::new().import_path(&store, &csv_path).await.is_err());
        assert_eq!(store.row_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_import_missing_file() {
        let dir = tempdir().unwrap();
        let store = StatsStore::open(dir.path().join("stats.db"), 1).await.unwrap();

        let err = CsvImporter::new()
            .import_path(&store, &dir.path().join("missing.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(store.row_count().await.unwrap(), 0);
    }
}
