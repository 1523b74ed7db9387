//! Point lookups against the newest snapshot partition.
//!
//! Reads never take the fetch lock. A lookup racing an append may see the
//! partition before or after that append's single write.

use std::path::PathBuf;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::store::{LatestSnapshot, SnapshotRecord, SnapshotStore, StoreError};
use crate::{AssetId, UtcDateTime};

pub const MISSING_PRICE: &str = "price not available in latest snapshot";
pub const NO_SNAPSHOT: &str = "no snapshot available";

/// One asset named by a caller, keeping the spelling it was asked with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedAsset {
    pub original: String,
    pub normalized: String,
}

/// Collect requested assets from raw parameter values.
///
/// Each value may hold several comma separated names. Blank pieces are
/// dropped. Names that differ only by case collapse into one entry, which
/// keeps the position of the first occurrence and the spelling of the last.
pub fn requested_assets<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<RequestedAsset> {
    let mut requested: Vec<RequestedAsset> = Vec::new();
    for piece in raw.into_iter().flat_map(|value| value.split(',')) {
        let original = piece.trim();
        if original.is_empty() {
            continue;
        }
        let normalized = original.to_lowercase();
        match requested.iter_mut().find(|entry| entry.normalized == normalized) {
            Some(entry) => entry.original = original.to_owned(),
            None => requested.push(RequestedAsset {
                original: original.to_owned(),
                normalized,
            }),
        }
    }
    requested
}

/// Lookup result for one requested asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CoinLookup {
    Found(SnapshotRecord),
    Missing { error: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LatestResponse {
    /// No assets requested: the final row of the newest partition.
    Snapshot {
        file: PathBuf,
        last: Option<SnapshotRecord>,
    },
    /// Per-asset rows keyed by the caller's spelling.
    Coins {
        file: PathBuf,
        #[serde(serialize_with = "lookups_as_object")]
        coins: Vec<(String, CoinLookup)>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        missing: Vec<String>,
    },
}

impl LatestResponse {
    /// `false` when any requested asset has no row.
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Snapshot { .. } => true,
            Self::Coins { missing, .. } => missing.is_empty(),
        }
    }

    pub fn from_snapshot(snapshot: LatestSnapshot, requested: &[RequestedAsset]) -> Self {
        if requested.is_empty() {
            return Self::Snapshot {
                file: snapshot.path,
                last: snapshot.last_record,
            };
        }

        let mut coins = Vec::with_capacity(requested.len());
        let mut missing = Vec::new();
        for entry in requested {
            let record = AssetId::parse(&entry.normalized)
                .ok()
                .and_then(|asset| snapshot.by_asset.get(&asset).cloned());
            let lookup = match record {
                Some(record) => CoinLookup::Found(record),
                None => {
                    missing.push(entry.original.clone());
                    CoinLookup::Missing {
                        error: MISSING_PRICE,
                    }
                }
            };
            coins.push((entry.original.clone(), lookup));
        }

        Self::Coins {
            file: snapshot.path,
            coins,
            missing,
        }
    }
}

fn lookups_as_object<S>(coins: &[(String, CoinLookup)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(coins.len()))?;
    for (name, lookup) in coins {
        map.serialize_entry(name, lookup)?;
    }
    map.end()
}

/// Latest rows for `requested`, or `Ok(None)` when no partition exists.
pub fn get_latest(
    store: &SnapshotStore,
    requested: &[RequestedAsset],
) -> Result<Option<LatestResponse>, StoreError> {
    Ok(store
        .latest()?
        .map(|snapshot| LatestResponse::from_snapshot(snapshot, requested)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryHealth {
    pub time: UtcDateTime,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// `ok` with the newest partition path, `degraded` when there is none.
pub fn health(store: &SnapshotStore) -> Result<QueryHealth, StoreError> {
    let time = UtcDateTime::now();
    Ok(match store.latest_path()? {
        Some(path) => QueryHealth {
            time,
            status: HealthStatus::Ok,
            snapshot: Some(path),
            error: None,
        },
        None => QueryHealth {
            time,
            status: HealthStatus::Degraded,
            snapshot: None,
            error: Some(NO_SNAPSHOT),
        },
    })
}
