
/// Loosely typed spreadsheet cell values
pub mod cell_value;
/// Facility lookup tables for kits, applications, and sequencers
pub mod facility_tables;
/// Values extracted from a lab report
pub mod report_fields;
/// Run folder name parsing
pub mod run_id;
/// All collected values for a single run
pub mod run_record;
