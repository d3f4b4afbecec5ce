/*!
# Resolution module
Links a sequencing run to the lab report that describes it.
Resolution is two-tiered: reports are first filtered by the run date they declare, and only when several remain
is the flowcell ID searched for inside them, tolerating a single transcription error.
Outcomes are kept in a persistent cache so resolved runs are never rescanned.
*/
/// Lazy, deterministic listing of report files
pub mod candidate_index;
/// Date tier and identifier tier matching
pub mod matcher;
/// Persistent run -> report cache with negative-result staleness
pub mod resolution_cache;
/// Cache-aware resolution entry point
pub mod resolver;
