//! Newest-partition discovery by modification time.
//!
//! The walk is top-down. A directory whose own mtime is not newer than the
//! best file found so far has its files skipped, but its subdirectories are
//! still visited. This is O(partitions) per call.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::store::StoreError;

const PARTITION_EXTENSION: &str = "csv";

#[derive(Debug)]
struct Best {
    modified: SystemTime,
    path: Option<PathBuf>,
}

/// Most recently modified `*.csv` file under `base`, if any.
pub(crate) fn newest_partition(base: &Path) -> Result<Option<PathBuf>, StoreError> {
    if !base.is_dir() {
        return Ok(None);
    }

    let mut best = Best {
        modified: SystemTime::UNIX_EPOCH,
        path: None,
    };
    visit(base, &mut best)?;
    Ok(best.path)
}

fn visit(dir: &Path, best: &mut Best) -> Result<(), StoreError> {
    let dir_modified = modified(dir)?;

    let mut entries = fs::read_dir(dir)
        .map_err(|source| StoreError::io(dir, source))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| StoreError::io(dir, source))?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut subdirs = Vec::new();
    for entry in entries {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|source| StoreError::io(&path, source))?;

        if file_type.is_dir() {
            subdirs.push(path);
            continue;
        }

        if dir_modified <= best.modified || !file_type.is_file() || !is_partition(&path) {
            continue;
        }

        let file_modified = modified(&path)?;
        if file_modified > best.modified {
            best.modified = file_modified;
            best.path = Some(path);
        }
    }

    for subdir in subdirs {
        visit(&subdir, best)?;
    }
    Ok(())
}

fn is_partition(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == PARTITION_EXTENSION)
}

fn modified(path: &Path) -> Result<SystemTime, StoreError> {
    fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(|source| StoreError::io(path, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn touch(path: &Path, modified: SystemTime) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        let file = File::create(path).expect("create file");
        file.set_modified(modified).expect("set mtime");
    }

    fn set_dir_mtime(path: &Path, modified: SystemTime) {
        File::open(path)
            .expect("open dir")
            .set_modified(modified)
            .expect("set dir mtime");
    }

    #[test]
    fn missing_base_has_no_partition() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = newest_partition(&dir.path().join("absent")).expect("scan");
        assert_eq!(result, None);
    }

    #[test]
    fn picks_newest_csv_and_ignores_other_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let now = SystemTime::now();
        let older = dir.path().join("2024/01/01/prices-0000.csv");
        let newer = dir.path().join("2024/01/02/prices-0001.csv");
        let noise = dir.path().join("2024/01/02/notes.txt");
        touch(&older, now - Duration::from_secs(120));
        touch(&newer, now - Duration::from_secs(60));
        touch(&noise, now);

        let result = newest_partition(dir.path()).expect("scan");
        assert_eq!(result, Some(newer));
    }

    #[test]
    fn stale_directory_files_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let now = SystemTime::now();
        let fresh = dir.path().join("a/prices-0000.csv");
        let hidden = dir.path().join("b/prices-0001.csv");
        touch(&fresh, now - Duration::from_secs(30));
        touch(&hidden, now);
        // directory b looks older than the best file found in a
        set_dir_mtime(&dir.path().join("b"), now - Duration::from_secs(300));

        let result = newest_partition(dir.path()).expect("scan");
        assert_eq!(result, Some(fresh));
    }
}
