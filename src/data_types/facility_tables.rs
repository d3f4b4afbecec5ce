
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::util::json_io::load_json;

/// Minimum similarity for a filename token to count as a known application
pub const APPLICATION_MATCH_CUTOFF: f32 = 0.6;
/// Application label used when the filename token matches nothing
pub const UNKNOWN_APPLICATION: &str = "unknown";

/// Facility-maintained lookup tables.
/// Every table can be overridden from a JSON file; tables missing from that file keep the built-in values.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct FacilityTables {
    /// Lower-case kit name -> rated maximum number of clusters
    pub kit_max_clusters: IndexMap<String, u64>,
    /// Lower-case kit name -> human readable expected cluster range
    pub kit_expected_clusters: IndexMap<String, String>,
    /// Canonical application -> minimum reads per sample, null when there is no requirement
    pub application_min_reads: IndexMap<String, Option<u64>>,
    /// Lower-case application token -> canonical application name
    pub application_aliases: IndexMap<String, String>,
    /// Instrument ID prefix -> sequencer name
    pub sequencer_prefixes: IndexMap<String, String>
}

/// (kit, max clusters, expected cluster label)
const KIT_TABLE: [(&str, u64, &str); 25] = [
    ("nextseq 500/550 high output kit v2.5 (75 cycles)", 400_000_000, "400 mio."),
    ("nextseq 500/550 high output kit v2.5 (150 cycles)", 400_000_000, "400 mio."),
    ("nextseq 500/550 mid output kit v2.5 (300 cycles)", 130_000_000, "130 mio."),
    ("nextseq 500/550 mid output kit v2.5 (150 cycles)", 130_000_000, "130 mio."),
    ("miseq reagent kit v3 (150-cycle)", 25_000_000, "22–25 million"),
    ("miseq reagent kit v3 (600-cycles)", 25_000_000, "22–25 million"),
    ("miseq reagent kit v2 (50-cycles)", 15_000_000, "12-15 million"),
    ("miseq reagent kit v2 (300-cycles)", 15_000_000, "12-15 million"),
    ("miseq reagent kit v2 (500-cycles)", 15_000_000, "12-15 million"),
    ("miseq reagent micro kit v2 (300-cycles)", 4_000_000, "4 million"),
    ("miseq reagent nano kit v2 (300-cycles)", 1_000_000, "1 million"),
    ("miseq reagent nano kit v2 (500-cycles)", 1_000_000, "1 million"),
    ("novaseq 6000 s4 reagent kit v1.5 (300 cycles)", 10_000_000_000, "8–10 billion"),
    ("novaseq 6000 s4 reagent kit v1.5 (200 cycles)", 10_000_000_000, "8–10 billion"),
    ("novaseq 6000 s4 reagent kit v1.5 (35 cycles)", 10_000_000_000, "8–10 billion"),
    ("novaseq 6000 s2 reagent kit v1.5 (300 cycles)", 4_100_000_000, "3.3–4.1 billion"),
    ("novaseq 6000 s2 reagent kit v1.5 (200 cycles)", 4_100_000_000, "3.3–4.1 billion"),
    ("novaseq 6000 s2 reagent kit v1.5 (100 cycles)", 4_100_000_000, "3.3–4.1 billion"),
    ("novaseq 6000 s1 reagent kit v1.5 (300 cycles)", 1_600_000_000, "1.3–1.6 billion"),
    ("novaseq 6000 s1 reagent kit v1.5 (200 cycles)", 1_600_000_000, "1.3–1.6 billion"),
    ("novaseq 6000 s1 reagent kit v1.5 (100 cycles)", 1_600_000_000, "1.3–1.6 billion"),
    ("novaseq 6000 sp 500 cycles", 800_000_000, "650–800 million"),
    ("novaseq 6000 sp 300 cycles", 800_000_000, "650–800 million"),
    ("novaseq 6000 sp 200 cycles", 800_000_000, "650–800 million"),
    ("novaseq 6000 sp 100 cycles", 800_000_000, "650–800 million"),
];

/// (canonical application, minimum reads per sample)
const APPLICATION_TABLE: [(&str, Option<u64>); 16] = [
    ("RNAseq", None),
    ("tRNAseq", Some(50_000_000)),
    ("mRNAseq", Some(30_000_000)),
    ("3mRNAseq", Some(10_000_000)),
    ("ChIPseq", None),
    ("ATACseq", Some(50_000_000)),
    ("ampliseq", None),
    ("scRNAseq", None),
    ("scVDJseq", None),
    ("scATACseq", None),
    ("miRNAseq", Some(10_000_000)),
    ("BWGS", None),
    ("WES", None),
    ("fastq", None),
    ("16S", None),
    ("MAG", None),
];

const SEQUENCER_TABLE: [(&str, &str); 4] = [
    ("NB501289", "nextseq500"),
    ("M00818", "miseq1"),
    ("M04404", "miseq2"),
    ("A01742", "novaseq"),
];

impl Default for FacilityTables {
    fn default() -> Self {
        Self {
            kit_max_clusters: KIT_TABLE.iter()
                .map(|&(kit, max_clusters, _label)| (kit.to_string(), max_clusters))
                .collect(),
            kit_expected_clusters: KIT_TABLE.iter()
                .map(|&(kit, _max_clusters, label)| (kit.to_string(), label.to_string()))
                .collect(),
            application_min_reads: APPLICATION_TABLE.iter()
                .map(|&(application, min_reads)| (application.to_string(), min_reads))
                .collect(),
            application_aliases: APPLICATION_TABLE.iter()
                .map(|&(application, _min_reads)| (application.to_lowercase(), application.to_string()))
                .collect(),
            sequencer_prefixes: SEQUENCER_TABLE.iter()
                .map(|&(prefix, name)| (prefix.to_string(), name.to_string()))
                .collect()
        }
    }
}

impl FacilityTables {
    /// Loads table overrides from a JSON file.
    /// # Errors
    /// * if the file cannot be opened or is not valid JSON for this structure
    pub fn from_json(filename: &Path) -> anyhow::Result<Self> {
        let tables: Self = load_json(filename)?;
        Ok(tables)
    }

    /// Rated maximum clusters for a kit, key matched case-insensitively
    pub fn max_clusters(&self, kit: &str) -> Option<u64> {
        self.kit_max_clusters.get(&normalize_kit(kit)).copied()
    }

    /// Human readable expected cluster range for a kit
    pub fn expected_clusters(&self, kit: &str) -> Option<&str> {
        self.kit_expected_clusters.get(&normalize_kit(kit)).map(|s| s.as_str())
    }

    /// Minimum reads per sample for an application; None when the application is unknown or has no requirement
    pub fn min_reads_per_sample(&self, application: &str) -> Option<u64> {
        self.application_min_reads.get(application).copied().flatten()
    }

    /// Maps a free-form application token (usually the last part of a report filename) onto the canonical name.
    /// Returns `UNKNOWN_APPLICATION` when nothing is close enough.
    pub fn canonical_application(&self, token: &str) -> &str {
        let token = token.to_lowercase();
        closest_application_alias(&token, self.application_aliases.keys().map(|k| k.as_str()))
            .and_then(|alias| self.application_aliases.get(alias))
            .map(|s| s.as_str())
            .unwrap_or(UNKNOWN_APPLICATION)
    }

    /// Sequencer name from the instrument ID prefix, empty if unknown
    pub fn sequencer_name(&self, instrument_id: &str) -> &str {
        self.sequencer_prefixes.iter()
            .find(|(prefix, _name)| instrument_id.starts_with(prefix.as_str()))
            .map(|(_prefix, name)| name.as_str())
            .unwrap_or_default()
    }
}

/// Best alias by difflib ratio at or above `APPLICATION_MATCH_CUTOFF`.
/// Equal ratios go to the lexicographically largest alias.
fn closest_application_alias<'a>(token: &str, aliases: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    // get_close_matches keeps input order among equal ratios
    let mut possibilities: Vec<&'a str> = aliases.collect();
    if possibilities.is_empty() {
        return None;
    }
    possibilities.sort_unstable_by(|a, b| b.cmp(a));
    difflib::get_close_matches(token, possibilities, 1, APPLICATION_MATCH_CUTOFF)
        .into_iter()
        .next()
}

fn normalize_kit(kit: &str) -> String {
    kit.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_tables() {
        let tables = FacilityTables::default();
        assert_eq!(tables.max_clusters("NextSeq 500/550 High Output Kit v2.5 (75 Cycles)"), Some(400_000_000));
        assert_eq!(tables.max_clusters("  miseq reagent nano kit v2 (300-cycles) "), Some(1_000_000));
        assert_eq!(tables.max_clusters("brand new kit"), None);
        assert_eq!(tables.expected_clusters("novaseq 6000 sp 100 cycles"), Some("650–800 million"));

        assert_eq!(tables.min_reads_per_sample("mRNAseq"), Some(30_000_000));
        assert_eq!(tables.min_reads_per_sample("RNAseq"), None);
        assert_eq!(tables.min_reads_per_sample("unknown"), None);

        assert_eq!(tables.sequencer_name("NB501289"), "nextseq500");
        assert_eq!(tables.sequencer_name("A01742X"), "novaseq");
        assert_eq!(tables.sequencer_name("ZZ0001"), "");
    }

    #[test]
    fn test_canonical_application() {
        let tables = FacilityTables::default();
        assert_eq!(tables.canonical_application("mRNAseq"), "mRNAseq");
        assert_eq!(tables.canonical_application("3mRNAseq"), "3mRNAseq");
        assert_eq!(tables.canonical_application("ATAC-seq"), "ATACseq");
        assert_eq!(tables.canonical_application("16s"), "16S");
        assert_eq!(tables.canonical_application("proteomics"), UNKNOWN_APPLICATION);
    }

    #[test]
    fn test_canonical_application_noisy_tokens() {
        let tables = FacilityTables::default();
        // scrnaseq and scvdjseq score the same, the larger alias wins
        assert_eq!(tables.canonical_application("scbseq"), "scVDJseq");
        assert_eq!(tables.canonical_application("3mirnseq"), "miRNAseq");
        assert_eq!(tables.canonical_application("sracse"), "scATACseq");
        assert_eq!(tables.canonical_application("chipseq2"), "ChIPseq");
        assert_eq!(tables.canonical_application("scnmsrq"), UNKNOWN_APPLICATION);
    }

    #[test]
    fn test_canonical_application_empty_vocabulary() {
        let tables = FacilityTables {
            application_aliases: IndexMap::new(),
            ..Default::default()
        };
        assert_eq!(tables.canonical_application("mRNAseq"), UNKNOWN_APPLICATION);
    }

    #[test]
    fn test_partial_override() {
        let tmp = tempfile::tempdir().unwrap();
        let tables_fn = tmp.path().join("tables.json");
        let mut fp = std::fs::File::create(&tables_fn).unwrap();
        write!(fp, r#"{{"kit_max_clusters": {{"custom kit": 5000}}}}"#).unwrap();
        fp.flush().unwrap();

        let tables = FacilityTables::from_json(&tables_fn).unwrap();
        assert_eq!(tables.max_clusters("Custom Kit"), Some(5000));
        assert_eq!(tables.max_clusters("novaseq 6000 sp 100 cycles"), None);
        // untouched tables keep the built-in values
        assert_eq!(tables.min_reads_per_sample("ATACseq"), Some(50_000_000));
    }
}
