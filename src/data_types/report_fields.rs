
/// Values pulled from a resolved lab report.
/// Anything the report does not declare stays `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportFields {
    /// Sequencing kit, lower-cased
    pub sequencing_kit: Option<String>,
    /// Project name as entered in the report
    pub project_name: Option<String>,
    /// `<report date>_<application token>` from the report filename
    pub protocol_name: Option<String>,
    /// Canonical application, or "unknown"
    pub application: Option<String>,
    pub cycles_read_1: Option<String>,
    pub cycles_index_1: Option<String>,
    pub cycles_read_2: Option<String>,
    pub cycles_index_2: Option<String>,
    pub density: Option<String>,
    pub clusters_pf: Option<String>,
    /// Yield with decimal commas converted and units removed
    pub yields: Option<String>,
    /// Percentage of bases >= Q30, always on the 0-100 scale
    pub q30: Option<f64>,
    /// Declared PhiX loading percentage, before any protocol-date filtering
    pub phix_input: Option<f64>
}
