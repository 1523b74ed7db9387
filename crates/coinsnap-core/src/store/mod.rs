//! # Snapshot Store
//!
//! Append-only CSV partitions laid out as
//! `<base>/<YYYY>/<MM>/<DD>/prices-<HH><MM>.csv`.
//!
//! Every fetch appends one row per asset. All rows of one fetch share the
//! fetch-start timestamp (full precision) and the same source/meta columns;
//! the file name only carries that instant truncated to the minute, so every
//! fetch within one UTC minute lands in the same partition.
//!
//! Column order is a durable contract:
//!
//! ```text
//! timestamp_utc,source,asset,price_usd,http_status,latency_ms,attempt
//! ```

mod codec;
mod scan;

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AssetId, FetchMeta, FetchResult, PriceBook, UtcDateTime};

/// Partition header columns, in file order.
pub const COLUMNS: [&str; 7] = [
    "timestamp_utc",
    "source",
    "asset",
    "price_usd",
    "http_status",
    "latency_ms",
    "attempt",
];

/// Store failure. Only filesystem and schema problems surface here.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("partition {} has an incompatible header: {message}", path.display())]
    Schema { path: PathBuf, message: String },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One persisted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub timestamp_utc: UtcDateTime,
    pub source: String,
    pub asset: AssetId,
    pub price_usd: f64,
    pub http_status: u16,
    pub latency_ms: u64,
    pub attempt: u32,
}

impl SnapshotRecord {
    fn field(&self, column: &str) -> String {
        match column {
            "timestamp_utc" => self.timestamp_utc.format_rfc3339(),
            "source" => self.source.clone(),
            "asset" => self.asset.as_str().to_owned(),
            // Debug keeps the shortest round-trip form and a trailing `.0`
            "price_usd" => format!("{:?}", self.price_usd),
            "http_status" => self.http_status.to_string(),
            "latency_ms" => self.latency_ms.to_string(),
            "attempt" => self.attempt.to_string(),
            _ => String::new(),
        }
    }
}

/// Derived view of the newest partition.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestSnapshot {
    pub path: PathBuf,
    /// Final row in file order; `None` for a header-only partition.
    pub last_record: Option<SnapshotRecord>,
    /// Last row per asset by file position.
    pub by_asset: BTreeMap<AssetId, SnapshotRecord>,
}

/// Append-only snapshot store rooted at `base_dir`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    base_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Partition file for an instant.
    pub fn partition_path(&self, at: UtcDateTime) -> PathBuf {
        self.base_dir.join(at.minute_partition())
    }

    /// Append a fetch result stamped with the current instant.
    pub fn append(
        &self,
        source: &str,
        quotes: &PriceBook,
        meta: FetchMeta,
    ) -> Result<PathBuf, StoreError> {
        self.append_at(UtcDateTime::now(), source, quotes, meta)
    }

    pub fn append_result(&self, result: &FetchResult) -> Result<PathBuf, StoreError> {
        self.append(&result.source_name, &result.quotes, result.meta)
    }

    /// Append rows for one fetch started at `at`.
    ///
    /// The header is written only when the partition is new (or empty). Rows
    /// follow the column order already established in the file, and the whole
    /// batch goes out in a single write.
    pub fn append_at(
        &self,
        at: UtcDateTime,
        source: &str,
        quotes: &PriceBook,
        meta: FetchMeta,
    ) -> Result<PathBuf, StoreError> {
        let path = self.partition_path(at);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::io(parent, source))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StoreError::io(&path, source))?;
        let is_new = file
            .metadata()
            .map_err(|source| StoreError::io(&path, source))?
            .len()
            == 0;

        let columns = if is_new {
            COLUMNS.iter().map(|column| (*column).to_owned()).collect()
        } else {
            established_columns(&path)?
        };

        let mut buffer = String::new();
        if is_new {
            buffer.push_str(&codec::encode_line(COLUMNS));
        }
        for quote in quotes.iter() {
            let record = SnapshotRecord {
                timestamp_utc: at,
                source: source.to_owned(),
                asset: quote.asset.clone(),
                price_usd: quote.price_usd,
                http_status: meta.http_status,
                latency_ms: meta.latency_ms,
                attempt: meta.attempts,
            };
            let fields = columns
                .iter()
                .map(|column| record.field(column))
                .collect::<Vec<_>>();
            buffer.push_str(&codec::encode_line(fields.iter().map(String::as_str)));
        }

        file.write_all(buffer.as_bytes())
            .map_err(|source| StoreError::io(&path, source))?;

        tracing::debug!(
            path = %path.display(),
            source,
            rows = quotes.len(),
            new_partition = is_new,
            "appended snapshot rows"
        );
        Ok(path)
    }

    /// Most recently modified partition, without reading it.
    pub fn latest_path(&self) -> Result<Option<PathBuf>, StoreError> {
        scan::newest_partition(&self.base_dir)
    }

    /// Scan the newest partition. `Ok(None)` when no partition exists yet.
    pub fn latest(&self) -> Result<Option<LatestSnapshot>, StoreError> {
        let Some(path) = self.latest_path()? else {
            return Ok(None);
        };
        read_partition(&path).map(Some)
    }
}

/// Header of an existing partition; it must name every known column.
fn established_columns(path: &Path) -> Result<Vec<String>, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::io(path, source))?;
    let header = content.lines().next().unwrap_or_default();
    let columns = codec::decode_line(header).ok_or_else(|| StoreError::Schema {
        path: path.to_path_buf(),
        message: String::from("unterminated quote in header"),
    })?;

    let missing = COLUMNS
        .iter()
        .filter(|column| !columns.iter().any(|existing| existing == *column))
        .copied()
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(StoreError::Schema {
            path: path.to_path_buf(),
            message: format!("missing columns: {}", missing.join(", ")),
        });
    }
    Ok(columns)
}

fn read_partition(path: &Path) -> Result<LatestSnapshot, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::io(path, source))?;
    let mut lines = content.lines();

    // A partition created but not yet written reads as present with no rows.
    let header = match lines.next().filter(|line| !line.trim().is_empty()) {
        Some(line) => codec::decode_line(line).unwrap_or_default(),
        None => {
            return Ok(LatestSnapshot {
                path: path.to_path_buf(),
                last_record: None,
                by_asset: BTreeMap::new(),
            })
        }
    };
    let index_of = |column: &str| header.iter().position(|name| name == column);
    let positions = COLUMNS
        .iter()
        .map(|column| index_of(*column))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| StoreError::Schema {
            path: path.to_path_buf(),
            message: format!("expected columns {}", COLUMNS.join(",")),
        })?;

    let mut last_record = None;
    let mut by_asset = BTreeMap::new();
    for (offset, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_record(line, &positions) {
            Some(record) => {
                by_asset.insert(record.asset.clone(), record.clone());
                last_record = Some(record);
            }
            None => tracing::warn!(
                path = %path.display(),
                line = offset + 2,
                "skipping unreadable snapshot row"
            ),
        }
    }

    Ok(LatestSnapshot {
        path: path.to_path_buf(),
        last_record,
        by_asset,
    })
}

fn parse_record(line: &str, positions: &[usize]) -> Option<SnapshotRecord> {
    let fields = codec::decode_line(line)?;
    let field = |column: usize| fields.get(positions[column]).map(String::as_str);

    Some(SnapshotRecord {
        timestamp_utc: UtcDateTime::parse(field(0)?).ok()?,
        source: field(1)?.to_owned(),
        asset: AssetId::parse(field(2)?).ok()?,
        price_usd: field(3)?.parse().ok()?,
        http_status: field(4)?.parse().ok()?,
        latency_ms: field(5)?.parse().ok()?,
        attempt: field(6)?.parse().ok()?,
    })
}
