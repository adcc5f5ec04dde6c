//! Raw provider payloads on disk, one file per series.
//!
//! Freshness is judged by file modification time against a fixed TTL. A TTL of
//! zero disables cache hits entirely (files are still written).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DiskCache {
    pub fn new(dir: impl AsRef<Path>, ttl: Duration) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Payload of `name` if the file exists and is younger than the TTL.
    pub fn load_fresh(&self, name: &str) -> Option<String> {
        let path = self.path(name);
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        if !self.is_fresh(modified, SystemTime::now()) {
            debug!(path = %path.display(), "cache stale");
            return None;
        }
        fs::read_to_string(&path).ok()
    }

    pub fn store(&self, name: &str, body: &str) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| AppError::Io(format!("Failed to create cache dir {}: {e}", self.dir.display())))?;
        let path = self.path(name);
        fs::write(&path, body).map_err(|e| AppError::Io(format!("Failed to write {}: {e}", path.display())))?;
        debug!(path = %path.display(), bytes = body.len(), "cache stored");
        Ok(())
    }

    fn is_fresh(&self, modified: SystemTime, now: SystemTime) -> bool {
        if self.ttl.is_zero() {
            return false;
        }
        // A modification time in the future counts as just written.
        match now.duration_since(modified) {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        }
    }
}

/// File name for a FRED series cache.
pub fn fred_cache_name(series_id: &str) -> String {
    format!("{}.json", series_id.to_uppercase())
}

pub fn bls_cache_name(series_id: &str) -> String {
    format!("bls_{series_id}.json")
}

pub const TREASURY_CACHE_NAME: &str = "treasury_debt_to_penny.json";

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn store_then_load() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path().join("nested"), Duration::from_secs(60));
        assert!(cache.load_fresh("a.json").is_none());
        cache.store("a.json", "{}").unwrap();
        assert_eq!(cache.load_fresh("a.json").as_deref(), Some("{}"));
    }

    #[test]
    fn age_against_ttl() {
        let cache = DiskCache::new("unused", Duration::from_secs(60));
        let now = SystemTime::now();
        assert!(cache.is_fresh(now - Duration::from_secs(59), now));
        assert!(!cache.is_fresh(now - Duration::from_secs(61), now));
        assert!(cache.is_fresh(now + Duration::from_secs(5), now));
    }

    #[test]
    fn zero_ttl_never_hits() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path(), Duration::ZERO);
        cache.store("a.json", "{}").unwrap();
        assert!(cache.load_fresh("a.json").is_none());
    }

    #[test]
    fn cache_names_per_provider() {
        assert_eq!(fred_cache_name("cpiaucsl"), "CPIAUCSL.json");
        assert_eq!(bls_cache_name("CES0500000003"), "bls_CES0500000003.json");
    }
}
