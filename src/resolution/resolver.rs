
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::data_types::run_id::RunIdentifier;
use crate::resolution::matcher::Matcher;
use crate::resolution::resolution_cache::{CacheState, ResolutionStore};

/// How the report of a run was (or was not) found
#[derive(Clone, Debug, PartialEq, Eq, strum_macros::AsRefStr)]
pub enum ResolutionOutcome {
    /// Taken from the cache without scanning
    #[strum(serialize = "cache")]
    Cached(PathBuf),
    /// Found by scanning the report folder
    #[strum(serialize = "search")]
    Matched(PathBuf),
    /// Scanned without success
    #[strum(serialize = "not found")]
    NotFound,
    /// Given up on, a report is no longer expected for this run
    #[strum(serialize = "expired")]
    Expired
}

impl ResolutionOutcome {
    pub fn report_path(&self) -> Option<&Path> {
        match self {
            ResolutionOutcome::Cached(path) |
            ResolutionOutcome::Matched(path) => Some(path),
            ResolutionOutcome::NotFound |
            ResolutionOutcome::Expired => None
        }
    }

    pub fn is_found(&self) -> bool {
        self.report_path().is_some()
    }
}

/// Cache-aware report resolution.
/// Every scan result is recorded right away so that an interrupted batch does not rescan finished runs.
pub struct ReportResolver {
    matcher: Matcher,
    store: Box<dyn ResolutionStore>
}

impl ReportResolver {
    pub fn new(matcher: Matcher, store: Box<dyn ResolutionStore>) -> Self {
        Self { matcher, store }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Resolves the report for a run, consulting and then updating the cache.
    /// A failed cache write is logged and otherwise ignored.
    pub fn resolve(&mut self, run: &RunIdentifier) -> ResolutionOutcome {
        let cache_state = self.store.lookup(run);
        debug!("{run}: cache state {}", cache_state.as_ref());
        match cache_state {
            CacheState::Resolved(path) => return ResolutionOutcome::Cached(path),
            CacheState::NegativeStale => return ResolutionOutcome::Expired,
            CacheState::NegativeFresh |
            CacheState::Unknown => {}
        };

        let matched = self.matcher.resolve(run);
        if let Err(e) = self.store.record(run, matched.as_deref()) {
            warn!("Failed to update the resolution cache for {run}, repeated scans will occur on the next invocation: {e:#}");
        }

        match matched {
            Some(path) => ResolutionOutcome::Matched(path),
            None => ResolutionOutcome::NotFound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::document::FileDocumentLoader;
    use crate::resolution::candidate_index::CandidateIndex;
    use crate::resolution::matcher::MatchConfig;
    use crate::resolution::resolution_cache::{DEFAULT_RETRY_DAYS, JsonResolutionCache};

    fn test_matcher() -> Matcher {
        Matcher::new(
            CandidateIndex::new(PathBuf::from("test_data/reports")),
            Box::new(FileDocumentLoader),
            MatchConfig::default()
        )
    }

    /// Store with a fixed answer that remembers what was recorded
    struct FixedStore {
        state: CacheState,
        recorded: std::rc::Rc<std::cell::RefCell<Vec<(String, Option<PathBuf>)>>>
    }

    impl ResolutionStore for FixedStore {
        fn lookup(&self, _run: &RunIdentifier) -> CacheState {
            self.state.clone()
        }

        fn record(&mut self, run: &RunIdentifier, report: Option<&Path>) -> anyhow::Result<()> {
            self.recorded.borrow_mut().push((run.name().to_string(), report.map(Path::to_path_buf)));
            Ok(())
        }
    }

    fn fixed_resolver(state: CacheState) -> (ReportResolver, std::rc::Rc<std::cell::RefCell<Vec<(String, Option<PathBuf>)>>>) {
        let recorded = std::rc::Rc::new(std::cell::RefCell::new(vec![]));
        let store = FixedStore { state, recorded: recorded.clone() };
        (ReportResolver::new(test_matcher(), Box::new(store)), recorded)
    }

    #[test]
    fn test_cached_and_expired_skip_scan() {
        let run = RunIdentifier::parse("230515_NB501289_0712_AHGTJ5BGXY").unwrap();

        let cached_path = PathBuf::from("somewhere/else.csv");
        let (mut resolver, recorded) = fixed_resolver(CacheState::Resolved(cached_path.clone()));
        assert_eq!(resolver.resolve(&run), ResolutionOutcome::Cached(cached_path));
        assert!(recorded.borrow().is_empty());

        // a matching report exists on disk, but a stale negative is never searched again
        let (mut resolver, recorded) = fixed_resolver(CacheState::NegativeStale);
        assert_eq!(resolver.resolve(&run), ResolutionOutcome::Expired);
        assert!(recorded.borrow().is_empty());
    }

    #[test]
    fn test_fresh_negative_rescans() {
        let run = RunIdentifier::parse("230515_NB501289_0712_AHGTJ5BGXY").unwrap();
        let expected = PathBuf::from("test_data/reports/2023/230515_NB501289_mRNAseq.csv");
        let (mut resolver, recorded) = fixed_resolver(CacheState::NegativeFresh);
        assert_eq!(resolver.resolve(&run), ResolutionOutcome::Matched(expected.clone()));
        assert_eq!(*recorded.borrow(), vec![(run.name().to_string(), Some(expected))]);
    }

    #[test]
    fn test_json_cache_round() {
        let tmp = tempfile::tempdir().unwrap();
        let filename = tmp.path().join("report_cache.json");
        let found = RunIdentifier::parse("230515_NB501289_0712_AHGTJ5BGXY").unwrap();
        let missing = RunIdentifier::parse("230720_NB501289_0730_AHNONE0000").unwrap();

        let cache = JsonResolutionCache::load(filename.clone(), DEFAULT_RETRY_DAYS);
        let mut resolver = ReportResolver::new(test_matcher(), Box::new(cache));
        let first = resolver.resolve(&found);
        assert!(matches!(first, ResolutionOutcome::Matched(_)));
        assert_eq!(first.as_ref(), "search");
        assert_eq!(resolver.resolve(&missing), ResolutionOutcome::NotFound);

        // the second pass is served from the cache; the 2023 negative is long past its retry window
        let cache = JsonResolutionCache::load(filename, DEFAULT_RETRY_DAYS);
        let mut resolver = ReportResolver::new(test_matcher(), Box::new(cache));
        let second = resolver.resolve(&found);
        assert_eq!(second.report_path(), first.report_path());
        assert_eq!(second.as_ref(), "cache");
        assert_eq!(resolver.resolve(&missing), ResolutionOutcome::Expired);
    }

    #[test]
    fn test_cache_write_failure_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = JsonResolutionCache::load(tmp.path().join("no_folder").join("cache.json"), DEFAULT_RETRY_DAYS);
        let mut resolver = ReportResolver::new(test_matcher(), Box::new(cache));
        let run = RunIdentifier::parse("240201_A01742_0155_BHFLWCDRX3").unwrap();
        assert!(resolver.resolve(&run).is_found());
    }
}
