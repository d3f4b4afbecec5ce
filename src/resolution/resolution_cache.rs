
use chrono::{Duration, Local, NaiveDate};
use indexmap::IndexMap;
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::data_types::run_id::RunIdentifier;
use crate::util::json_io::{load_json, save_json};

/// Default number of days after the run date during which a failed lookup is retried
pub const DEFAULT_RETRY_DAYS: i64 = 90;

/// What the cache knows about a run
#[derive(Clone, Debug, PartialEq, Eq, strum_macros::AsRefStr)]
pub enum CacheState {
    /// A report was found previously
    Resolved(PathBuf),
    /// No report was found, but the run is recent enough that one may still appear
    NegativeFresh,
    /// No report was found and the retry window has passed
    NegativeStale,
    /// The run was never looked up
    Unknown
}

/// Persistent storage of resolution outcomes
pub trait ResolutionStore {
    /// Returns the cached state for a run
    fn lookup(&self, run: &RunIdentifier) -> CacheState;

    /// Records a resolution outcome, `None` marks the run as not found.
    /// Implementations persist the change before returning.
    /// # Errors
    /// * if the outcome could not be persisted
    fn record(&mut self, run: &RunIdentifier, report: Option<&Path>) -> anyhow::Result<()>;
}

/// A JSON file of run name -> report path, where an empty path marks a run without a report
#[derive(Debug)]
pub struct JsonResolutionCache {
    filename: PathBuf,
    entries: IndexMap<String, String>,
    retry_window: Duration
}

impl JsonResolutionCache {
    /// Loads the cache from `filename`.
    /// A missing or unreadable file gives an empty cache, the file is created on the first write.
    /// # Arguments
    /// * `filename` - the JSON store, optionally gzipped
    /// * `retry_days` - days after the run date during which negative results are retried
    pub fn load(filename: PathBuf, retry_days: i64) -> Self {
        let entries: IndexMap<String, String> = if filename.exists() {
            match load_json(&filename) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring unreadable resolution cache {filename:?}: {e:#}");
                    IndexMap::new()
                }
            }
        } else {
            warn!("Resolution cache {filename:?} not found, starting with an empty cache");
            IndexMap::new()
        };
        debug!("Loaded {} cached resolutions from {filename:?}", entries.len());

        Self {
            filename,
            entries,
            retry_window: Duration::days(retry_days)
        }
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Same as `lookup`, but with an explicit notion of today
    pub fn lookup_at(&self, run: &RunIdentifier, today: NaiveDate) -> CacheState {
        match self.entries.get(run.name()) {
            None => CacheState::Unknown,
            Some(path) if !path.is_empty() => CacheState::Resolved(PathBuf::from(path)),
            Some(_negative) => {
                if today >= run.date() + self.retry_window {
                    CacheState::NegativeStale
                } else {
                    CacheState::NegativeFresh
                }
            }
        }
    }
}

impl ResolutionStore for JsonResolutionCache {
    fn lookup(&self, run: &RunIdentifier) -> CacheState {
        self.lookup_at(run, Local::now().date_naive())
    }

    fn record(&mut self, run: &RunIdentifier, report: Option<&Path>) -> anyhow::Result<()> {
        let value = report
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        self.entries.insert(run.name().to_string(), value);
        save_json(&self.entries, &self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(name: &str) -> RunIdentifier {
        RunIdentifier::parse(name).unwrap()
    }

    #[test]
    fn test_negative_staleness() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = JsonResolutionCache::load(tmp.path().join("cache.json"), DEFAULT_RETRY_DAYS);
        assert!(cache.is_empty());

        let old_run = run("230101_NB501289_0700_AHAAAAAAAA");
        let new_run = run("230101_NB501289_0701_AHBBBBBBBB");
        cache.record(&old_run, None).unwrap();
        cache.record(&new_run, None).unwrap();

        let run_date = old_run.date();
        assert_eq!(cache.lookup_at(&old_run, run_date + Duration::days(200)), CacheState::NegativeStale);
        assert_eq!(cache.lookup_at(&new_run, run_date + Duration::days(10)), CacheState::NegativeFresh);

        // the window boundary itself is already stale
        assert_eq!(cache.lookup_at(&old_run, run_date + Duration::days(89)), CacheState::NegativeFresh);
        assert_eq!(cache.lookup_at(&old_run, run_date + Duration::days(90)), CacheState::NegativeStale);
    }

    #[test]
    fn test_persistence() {
        let tmp = tempfile::tempdir().unwrap();
        let filename = tmp.path().join("cache.json");
        let resolved = run("230515_NB501289_0712_AHGTJ5BGXY");
        let unknown = run("230516_NB501289_0713_AHGTJ5BGXZ");
        let report = Path::new("reports/230515_NB501289_mRNAseq.csv");

        let mut cache = JsonResolutionCache::load(filename.clone(), DEFAULT_RETRY_DAYS);
        cache.record(&resolved, None).unwrap();
        // entries are overwritten, not duplicated
        cache.record(&resolved, Some(report)).unwrap();

        let reloaded = JsonResolutionCache::load(filename, DEFAULT_RETRY_DAYS);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.lookup(&resolved), CacheState::Resolved(report.to_path_buf()));
        assert_eq!(reloaded.lookup(&unknown), CacheState::Unknown);
    }

    #[test]
    fn test_corrupt_store() {
        let tmp = tempfile::tempdir().unwrap();
        let filename = tmp.path().join("cache.json");
        std::fs::write(&filename, "{ not json").unwrap();
        let cache = JsonResolutionCache::load(filename, DEFAULT_RETRY_DAYS);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_write_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let filename = tmp.path().join("missing_folder").join("cache.json");
        let mut cache = JsonResolutionCache::load(filename, DEFAULT_RETRY_DAYS);
        assert!(cache.record(&run("230515_NB501289_0712_AHGTJ5BGXY"), None).is_err());
    }
}
