
use std::path::Path;

use crate::data_types::cell_value::CellValue;
use crate::data_types::facility_tables::FacilityTables;
use crate::data_types::report_fields::ReportFields;
use crate::parsing::document::Document;

/// Extracts the kit, cycle, and QC fields from a loaded report.
/// Labels may repeat across sheets, in which case the last occurrence wins.
/// # Arguments
/// * `report_path` - path of the report, the filename carries the date and application token
/// * `document` - the loaded report
/// * `tables` - facility tables used to canonicalize the application
pub fn extract_report_fields(report_path: &Path, document: &Document, tables: &FacilityTables) -> ReportFields {
    let mut fields = ReportFields::default();

    // filename is expected to look like <YYMMDD>_..._<application>
    let file_stem = report_path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let parts: Vec<&str> = file_stem.split('_').collect();
    if let (Some(date_part), Some(application_part)) = (parts.first(), parts.last()) {
        fields.protocol_name = Some(format!("{date_part}_{application_part}"));
        fields.application = Some(tables.canonical_application(application_part).to_string());
    }

    for cell in document.cells() {
        let Some(label) = cell.value.as_text() else {
            continue;
        };
        let neighbour = document.lookup_next_cell_in_row(cell.sheet, cell.row, cell.col);
        let neighbour_string = || neighbour.and_then(|v| v.to_display_string());

        match label.trim() {
            "Cycles Read 1" => fields.cycles_read_1 = neighbour_string(),
            "Cycles Index 1" => fields.cycles_index_1 = neighbour_string(),
            "Cycles Index 2" => fields.cycles_index_2 = neighbour_string(),
            "Cycles Read 2" => fields.cycles_read_2 = neighbour_string(),
            "Density" => fields.density = neighbour_string(),
            "Clusters PF" => fields.clusters_pf = neighbour_string(),
            "Yield" => fields.yields = neighbour.and_then(normalize_yield),
            "% >= Q30" => {
                if let Some(q30) = neighbour.and_then(normalize_q30) {
                    fields.q30 = Some(q30);
                }
            },
            _ => {
                let lower = label.to_lowercase();
                if lower.contains("phix") {
                    fields.phix_input = neighbour.and_then(|v| v.to_number());
                } else if lower.contains("kit") {
                    if let Some(kit) = value_after_colon(label) {
                        fields.sequencing_kit = Some(kit.to_lowercase());
                    }
                } else if lower.contains("project") {
                    if let Some(project) = value_after_colon(label) {
                        fields.project_name = Some(project.to_string());
                    }
                }
            }
        }
    }

    fields
}

/// Returns the trimmed text after the first `:`, e.g. "Kit: NextSeq ..." -> "NextSeq ..."
fn value_after_colon(label: &str) -> Option<&str> {
    label.split_once(':')
        .map(|(_key, value)| value.trim())
}

/// Yield cells come as numbers or as text like "31,5 Gb"; text keeps only digits and the decimal point
fn normalize_yield(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Text(text) => {
            let cleaned: String = text.chars()
                .map(|c| if c == ',' { '.' } else { c })
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                Some(cleaned)
            }
        },
        CellValue::Number(_) => value.to_display_string(),
        CellValue::Empty => None
    }
}

/// Q30 is entered either as a fraction or a percentage, we always report the percentage
fn normalize_q30(value: &CellValue) -> Option<f64> {
    let q30 = value.to_number()?;
    if q30 < 1.0 {
        Some(q30 * 100.0)
    } else {
        Some(q30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    use crate::parsing::document::{DocumentLoader, FileDocumentLoader};

    #[test]
    fn test_extract_csv_report() {
        let report_fn = Path::new("test_data/reports/2023/230515_NB501289_mRNAseq.csv");
        let document = FileDocumentLoader.open(report_fn).unwrap();
        let fields = extract_report_fields(report_fn, &document, &FacilityTables::default());

        assert_eq!(fields.protocol_name.as_deref(), Some("230515_mRNAseq"));
        assert_eq!(fields.application.as_deref(), Some("mRNAseq"));
        assert_eq!(fields.project_name.as_deref(), Some("Liver RNA study"));
        assert_eq!(fields.sequencing_kit.as_deref(), Some("nextseq 500/550 high output kit v2.5 (75 cycles)"));
        assert_eq!(fields.cycles_read_1.as_deref(), Some("75"));
        assert_eq!(fields.cycles_index_1.as_deref(), Some("8"));
        assert_eq!(fields.cycles_index_2.as_deref(), Some("8"));
        assert_eq!(fields.cycles_read_2.as_deref(), Some("0"));
        assert_eq!(fields.density.as_deref(), Some("215"));
        assert_eq!(fields.clusters_pf.as_deref(), Some("91,2%"));
        assert_eq!(fields.yields.as_deref(), Some("31.5"));
        assert_approx_eq!(fields.q30.unwrap(), 92.35);
        assert_approx_eq!(fields.phix_input.unwrap(), 1.2);
    }

    #[test]
    fn test_extract_json_report() {
        let report_fn = Path::new("test_data/reports/2024/240201_A01742_3mRNAseq.json");
        let document = FileDocumentLoader.open(report_fn).unwrap();
        let fields = extract_report_fields(report_fn, &document, &FacilityTables::default());

        assert_eq!(fields.protocol_name.as_deref(), Some("240201_3mRNAseq"));
        assert_eq!(fields.application.as_deref(), Some("3mRNAseq"));
        assert_eq!(fields.sequencing_kit.as_deref(), Some("novaseq 6000 sp 100 cycles"));
        assert_eq!(fields.cycles_read_1.as_deref(), Some("101"));
        assert_eq!(fields.yields.as_deref(), Some("95.4"));
        assert_approx_eq!(fields.q30.unwrap(), 94.1);
        assert_approx_eq!(fields.phix_input.unwrap(), 1.5);
    }

    #[test]
    fn test_normalizers() {
        assert_eq!(value_after_colon("Sequencing Kit:  MiSeq Reagent Kit v3 "), Some("MiSeq Reagent Kit v3"));
        assert_eq!(value_after_colon("Sequencing Kit"), None);

        assert_eq!(normalize_yield(&CellValue::Text("12,7 Gbp".to_string())), Some("12.7".to_string()));
        assert_eq!(normalize_yield(&CellValue::Text("n/a".to_string())), None);
        assert_eq!(normalize_yield(&CellValue::Number(40.0)), Some("40".to_string()));

        assert_approx_eq!(normalize_q30(&CellValue::Text("93 %".to_string())).unwrap(), 93.0);
        assert_approx_eq!(normalize_q30(&CellValue::Number(0.5)).unwrap(), 50.0);
        assert_eq!(normalize_q30(&CellValue::Empty), None);
    }
}
