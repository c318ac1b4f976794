//! Wire and view entity structs.
//!
//! The backend speaks French status labels on the wire; the enums here keep
//! English variant names with serde aliases so both spellings decode.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome class for one compared cell or row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DiffStatus {
    #[serde(rename = "Ajoutée", alias = "Added")]
    Added,
    #[serde(rename = "Supprimée", alias = "Removed")]
    Removed,
    #[serde(rename = "Modifiée", alias = "Modified")]
    Modified,
    #[serde(
        rename = "Similaire",
        alias = "Similar",
        alias = "Contenu Similaire",
        alias = "Orthographe Similaire"
    )]
    Similar,
}

impl DiffStatus {
    /// Display label as the backend emits it.
    pub fn label(&self) -> &'static str {
        match self {
            DiffStatus::Added => "Ajoutée",
            DiffStatus::Removed => "Supprimée",
            DiffStatus::Modified => "Modifiée",
            DiffStatus::Similar => "Similaire",
        }
    }
}

/// One detected mismatch between base and comparison workbook cells.
///
/// `key` is the composite row identity (stable across files) and is never
/// empty in well-formed backend output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DifferenceRecord {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Column", default)]
    pub column: Option<String>,
    #[serde(rename = "Base Value", default)]
    pub base_value: String,
    #[serde(rename = "Comparison Value", default)]
    pub comparison_value: String,
    #[serde(rename = "Status")]
    pub status: DiffStatus,
}

/// Which file a duplicate group was found in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DuplicateSource {
    Base,
    Comparison,
}

/// Rows sharing a key within one file. `occurrences` is at least 2.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DuplicateGroup {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Occurrences")]
    pub occurrences: u32,
    #[serde(rename = "Source")]
    pub source: DuplicateSource,
}

/// Aggregate counters for one comparison run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonSummary {
    #[serde(default)]
    pub total_sheets_compared: u32,
    #[serde(default)]
    pub total_rows_compared: u64,
    #[serde(default)]
    pub total_cells_compared: u64,
    #[serde(default)]
    pub total_differences: u64,
    #[serde(default)]
    pub total_duplicates: u64,
    #[serde(default)]
    pub execution_time_seconds: f64,
}

impl ComparisonSummary {
    /// Percentage of compared cells without a difference, floored at zero.
    pub fn match_rate(&self) -> f64 {
        let cells = self.total_cells_compared.max(1) as f64;
        (100.0 - (self.total_differences as f64 / cells) * 100.0).max(0.0)
    }
}

/// Results for one base sheet compared against one comparison file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileComparison {
    pub comparison_file: String,
    #[serde(default)]
    pub differences: Vec<DifferenceRecord>,
    #[serde(default)]
    pub differences_columns: Vec<String>,
    #[serde(default)]
    pub duplicates_base: Vec<DuplicateGroup>,
    #[serde(default)]
    pub duplicates_base_columns: Vec<String>,
    #[serde(default)]
    pub duplicates_comp: Vec<DuplicateGroup>,
    #[serde(default)]
    pub base_rows: u64,
    #[serde(default)]
    pub comp_rows: u64,
}

/// Full payload of `GET /api/get-comparison-results`.
///
/// Sheet order must be stable across refreshes, hence the BTreeMap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonResults {
    #[serde(default)]
    pub results: BTreeMap<String, Vec<FileComparison>>,
    #[serde(default)]
    pub summary: ComparisonSummary,
    #[serde(default)]
    pub timestamp: String,
}

/// Summary block of the maintenance-schedule analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(default)]
    pub total_rdv: u64,
    #[serde(default)]
    pub total_clients: u64,
    #[serde(default)]
    pub total_series: u64,
    #[serde(default)]
    pub total_hours: f64,
    #[serde(default)]
    pub total_days_with_rdv: u64,
    #[serde(default)]
    pub conflict_count: u64,
}

/// Per-week aggregates of the maintenance planning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyPlanning {
    #[serde(default)]
    pub rdv_count: u64,
    #[serde(default)]
    pub client_count: u64,
    #[serde(default)]
    pub equipment_count: u64,
    #[serde(default)]
    pub total_hours: f64,
    #[serde(default)]
    pub avg_rdv_duration_hours: f64,
}

/// Per-equipment immobilization aggregates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentUsage {
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub rdv_count: u64,
    #[serde(default)]
    pub valid_rdv_count: u64,
    #[serde(default)]
    pub invalid_rdv_count: u64,
    #[serde(default)]
    pub total_immobilization_days: u64,
    #[serde(default)]
    pub total_immobilization_hours: f64,
    #[serde(default)]
    pub operations_count: u64,
    #[serde(default)]
    pub clients_count: u64,
}

/// One concatenated maintenance entry (a contiguous shop visit).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcatenatedEntry {
    #[serde(default)]
    pub index: u64,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub material_number: String,
    #[serde(default)]
    pub date_debut: String,
    #[serde(default)]
    pub date_fin: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub operations_summary: String,
    #[serde(default)]
    pub duration_days: u64,
    #[serde(default)]
    pub duration_hours: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    #[default]
    Low,
    Medium,
    High,
}

/// Anomaly detected during the schedule analysis (missing dates, inverted
/// ranges, excessive immobilization).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub severity: ConflictSeverity,
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "one")]
    pub occurrence_count: u64,
}

fn one() -> u64 {
    1
}

/// Full payload of `GET /api/get-analysis-results`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResults {
    #[serde(default)]
    pub summary: AnalysisSummary,
    #[serde(default)]
    pub weekly_planning: BTreeMap<String, WeeklyPlanning>,
    #[serde(default)]
    pub equipment_analysis: BTreeMap<String, EquipmentUsage>,
    #[serde(default)]
    pub concatenated_data: Vec<ConcatenatedEntry>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
}

/// A saved report as listed on the reports page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportEntry {
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub base_file: String,
    #[serde(default)]
    pub comparison_files: Vec<String>,
    #[serde(default)]
    pub differences: u64,
    #[serde(default)]
    pub match_rate: String,
}

/// Export formats the backend can produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Excel,
    Csv,
    Pdf,
}

impl ExportFormat {
    /// File extension for downloads, inferred from the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_decodes_french_and_english_labels() {
        let rec: DifferenceRecord = serde_json::from_value(serde_json::json!({
            "Key": "L123_OP4",
            "Column": "Date Butee",
            "Base Value": "2024-01-02",
            "Comparison Value": "2024-01-09",
            "Status": "Modifiée"
        }))
        .unwrap();
        assert_eq!(rec.status, DiffStatus::Modified);

        let rec: DifferenceRecord = serde_json::from_value(serde_json::json!({
            "Key": "L123_OP4",
            "Status": "Similar"
        }))
        .unwrap();
        assert_eq!(rec.status, DiffStatus::Similar);
    }

    #[test]
    fn test_match_rate_floors_at_zero_and_survives_zero_cells() {
        let summary = ComparisonSummary {
            total_cells_compared: 0,
            total_differences: 50,
            ..Default::default()
        };
        assert_eq!(summary.match_rate(), 0.0);

        let summary = ComparisonSummary {
            total_cells_compared: 200,
            total_differences: 10,
            ..Default::default()
        };
        assert!((summary.match_rate() - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Excel.extension(), "xlsx");
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Pdf.extension(), "pdf");
        assert_eq!("EXCEL".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
    }

    #[test]
    fn test_comparison_results_decode_shape() {
        let payload = serde_json::json!({
            "results": {
                "Lens": [{
                    "comparison_file": "planning_s12.xlsx",
                    "differences": [
                        {"Key": "L1_OP1", "Column": "Commentaire",
                         "Base Value": "a", "Comparison Value": "b",
                         "Status": "Modifiée"}
                    ],
                    "differences_columns": ["Key", "Column", "Base Value", "Comparison Value", "Status"],
                    "base_rows": 40,
                    "comp_rows": 38
                }]
            },
            "summary": {"total_sheets_compared": 1, "total_differences": 1,
                        "total_cells_compared": 240, "execution_time_seconds": 0.4},
            "timestamp": "2025-03-02 10:00:00"
        });
        let decoded: ComparisonResults = serde_json::from_value(payload).unwrap();
        assert_eq!(decoded.results["Lens"][0].differences.len(), 1);
        assert_eq!(decoded.summary.total_sheets_compared, 1);
    }
}
