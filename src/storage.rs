//! Where export archives land on disk.
//!
//! A removable/external volume is preferred when mounted; otherwise the
//! archive goes to an application-private directory.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use tracing::debug;

use crate::config::StorageConfig;

/// Build the archive name, `WigleWifi_<yyyyMMddHHmmss>.csv.gz`.
pub fn export_filename<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("WigleWifi_{}.csv.gz", now.format("%Y%m%d%H%M%S"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLocation {
    External,
    Private,
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageLocation::External => write!(f, "external"),
            StorageLocation::Private => write!(f, "private"),
        }
    }
}

/// A writable file path chosen by a [`StorageResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub location: StorageLocation,
}

/// Picks the destination for an export archive.
///
/// Implementations create any missing directories and the file itself, so
/// the returned path is writable when `resolve` succeeds.
pub trait StorageResolver: Send + Sync {
    fn resolve(&self, file_name: &str) -> io::Result<ResolvedPath>;
}

/// External volume first, private directory as fallback.
#[derive(Debug, Clone)]
pub struct FallbackStorage {
    external_root: PathBuf,
    external_subdir: PathBuf,
    private_dir: PathBuf,
}

impl FallbackStorage {
    pub fn new(
        external_root: impl Into<PathBuf>,
        external_subdir: impl Into<PathBuf>,
        private_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            external_root: external_root.into(),
            external_subdir: external_subdir.into(),
            private_dir: private_dir.into(),
        }
    }

    pub fn from_config(cfg: &StorageConfig) -> Self {
        Self::new(&cfg.external_root, &cfg.external_subdir, &cfg.private_dir)
    }

    fn pick_dir(&self) -> (PathBuf, StorageLocation) {
        if self.external_root.is_dir() {
            (
                self.external_root.join(&self.external_subdir),
                StorageLocation::External,
            )
        } else {
            (self.private_dir.clone(), StorageLocation::Private)
        }
    }
}

impl StorageResolver for FallbackStorage {
    fn resolve(&self, file_name: &str) -> io::Result<ResolvedPath> {
        let (dir, location) = self.pick_dir();
        fs::create_dir_all(&dir)?;

        let path = dir.join(file_name);
        touch(&path)?;

        debug!(path = %path.display(), %location, "resolved export path");
        Ok(ResolvedPath { path, location })
    }
}

fn touch(path: &Path) -> io::Result<()> {
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_export_filename_pattern() {
        let now = Utc.with_ymd_and_hms(2010, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(export_filename(&now), "WigleWifi_20100307090502.csv.gz");
    }

    #[test]
    fn test_prefers_external_when_mounted() {
        let tmp = tempfile::tempdir().unwrap();
        let sdcard = tmp.path().join("sdcard");
        fs::create_dir(&sdcard).unwrap();

        let storage = FallbackStorage::new(&sdcard, "wiglewifi", tmp.path().join("private"));
        let resolved = storage.resolve("a.csv.gz").unwrap();

        assert_eq!(resolved.location, StorageLocation::External);
        assert_eq!(resolved.path, sdcard.join("wiglewifi").join("a.csv.gz"));
        assert!(resolved.path.is_file());
        assert!(!tmp.path().join("private").exists());
    }

    #[test]
    fn test_falls_back_to_private_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let private = tmp.path().join("app").join("files");

        let storage = FallbackStorage::new(tmp.path().join("missing"), "wiglewifi", &private);
        let resolved = storage.resolve("b.csv.gz").unwrap();

        assert_eq!(resolved.location, StorageLocation::Private);
        assert_eq!(resolved.path, private.join("b.csv.gz"));
        assert!(resolved.path.is_file());
    }

    #[test]
    fn test_resolve_keeps_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FallbackStorage::new(tmp.path().join("missing"), "w", tmp.path());
        fs::write(tmp.path().join("c.csv.gz"), b"old").unwrap();

        let resolved = storage.resolve("c.csv.gz").unwrap();
        assert_eq!(fs::read(&resolved.path).unwrap(), b"old");
    }
}
