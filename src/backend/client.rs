//! HTTP client for the comparison backend.
//!
//! Every call is one request/response; the only retry loop in the program
//! is the readiness probe in the supervisor. Action endpoints (POST)
//! answer `{"success": bool, ...}` with `error` carrying the backend's
//! message; plain GET endpoints return their payload bare, with no
//! success flag at all, so its absence on a 2xx means success.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use super::BackendError;
use crate::model::{AnalysisResults, ComparisonResults, ExportFormat, ReportEntry};

/// Timeout for ordinary API calls. Uploads and comparisons of large
/// workbooks get a longer one.
const REQUEST_TIMEOUT_SECS: u64 = 30;
const LONG_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Options forwarded to `POST /api/start-comparison`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ComparisonRequest {
    pub selected_sheets: Vec<String>,
    pub comparison_mode: String,
    pub use_dynamic_detection: bool,
}

/// Options forwarded to `POST /api/start-analysis`.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AnalysisRequest {
    pub filename: String,
    pub sheet_name: String,
    pub analysis_options: Value,
}

/// Thin typed wrapper over the backend's REST surface.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<BackendClient, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(BackendClient {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// One readiness probe. Success means HTTP 200 on `/health`.
    pub async fn health(&self) -> Result<(), BackendError> {
        let response = self
            .http
            .get(self.url("/health"))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Unavailable(format!(
                "health endpoint returned HTTP {}",
                response.status().as_u16()
            )))
        }
    }

    /// Upload the base workbook. Returns the sheet names the backend found.
    pub async fn upload_base_file(&self, path: &Path) -> Result<Vec<String>, BackendError> {
        let form = file_form("file", path).await?;
        let body = self.post_multipart("/api/upload-base-file", form).await?;
        let payload: SheetsPayload = decode(body)?;
        info!(sheets = payload.sheets.len(), "base file accepted");
        Ok(payload.sheets)
    }

    /// Upload one or more comparison workbooks.
    pub async fn upload_comparison_files(&self, paths: &[&Path]) -> Result<usize, BackendError> {
        let mut form = multipart::Form::new();
        for path in paths {
            form = merge_file(form, "files", path).await?;
        }
        let body = self
            .post_multipart("/api/upload-comparison-files", form)
            .await?;
        let payload: FilesPayload = decode(body)?;
        info!(files = payload.file_count, "comparison files accepted");
        Ok(payload.file_count)
    }

    /// Launch a comparison run and return its results.
    ///
    /// The run's payload arrives wrapped under a `results` key, unlike the
    /// bare re-fetch endpoint.
    pub async fn start_comparison(
        &self,
        request: &ComparisonRequest,
    ) -> Result<ComparisonResults, BackendError> {
        info!(
            sheets = request.selected_sheets.len(),
            mode = %request.comparison_mode,
            "starting comparison"
        );
        let response = self
            .http
            .post(self.url("/api/start-comparison"))
            .timeout(Duration::from_secs(LONG_REQUEST_TIMEOUT_SECS))
            .json(request)
            .send()
            .await?;
        let body = unwrap_envelope(response).await?;
        let payload: ResultsPayload<ComparisonResults> = decode(body)?;
        Ok(payload.results)
    }

    /// Re-fetch the results of the last comparison run. The response body
    /// IS the results object (no wrapper).
    pub async fn comparison_results(&self) -> Result<ComparisonResults, BackendError> {
        decode(self.get("/api/get-comparison-results").await?)
    }

    /// Launch the maintenance-schedule analysis over one uploaded sheet.
    pub async fn start_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResults, BackendError> {
        info!(file = %request.filename, sheet = %request.sheet_name, "starting analysis");
        let response = self
            .http
            .post(self.url("/api/start-analysis"))
            .timeout(Duration::from_secs(LONG_REQUEST_TIMEOUT_SECS))
            .json(request)
            .send()
            .await?;
        let body = unwrap_envelope(response).await?;
        let payload: ResultsPayload<AnalysisResults> = decode(body)?;
        Ok(payload.results)
    }

    pub async fn analysis_results(&self) -> Result<AnalysisResults, BackendError> {
        decode(self.get("/api/get-analysis-results").await?)
    }

    /// Download the analysis export in the requested format.
    pub async fn export_analysis(
        &self,
        format: ExportFormat,
        filename: &str,
        export_options: &Value,
    ) -> Result<Vec<u8>, BackendError> {
        self.download(
            "/api/export-analysis",
            &serde_json::json!({
                "format": format,
                "filename": filename,
                "export_options": export_options,
            }),
        )
        .await
    }

    /// Download a saved report in the requested format.
    pub async fn export_report(
        &self,
        report_id: &str,
        format: ExportFormat,
        filename: &str,
    ) -> Result<Vec<u8>, BackendError> {
        self.download(
            "/api/export-report",
            &serde_json::json!({
                "report_id": report_id,
                "format": format,
                "filename": filename,
            }),
        )
        .await
    }

    /// Persist the current comparison as a named report.
    pub async fn save_report(&self) -> Result<String, BackendError> {
        let response = self
            .http
            .post(self.url("/api/save-report"))
            .send()
            .await?;
        let body = unwrap_envelope(response).await?;
        let payload: SavedReportPayload = decode(body)?;
        info!(report_id = %payload.report_id, "report saved");
        Ok(payload.report_id)
    }

    /// List previously saved reports, in save order.
    pub async fn reports(&self) -> Result<Vec<ReportEntry>, BackendError> {
        let payload: ReportsPayload = decode(self.get("/api/get-reports").await?)?;
        Ok(payload.reports)
    }

    /// Current site-name mappings used by the analysis.
    pub async fn site_mappings(&self) -> Result<Value, BackendError> {
        let payload: MappingsPayload = decode(self.get("/api/get-site-mappings").await?)?;
        Ok(payload.mappings)
    }

    pub async fn set_site_mappings(&self, mappings: &Value) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url("/api/set-site-mappings"))
            .json(&serde_json::json!({ "mappings": mappings }))
            .send()
            .await?;
        unwrap_envelope(response).await?;
        Ok(())
    }

    /// Fetch a backend-served markdown document (help, legal notices).
    pub async fn fetch_doc(&self, name: &str) -> Result<String, BackendError> {
        let response = self
            .http
            .get(self.url(&format!("/api/docs/{name}")))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                code: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    async fn get(&self, path: &str) -> Result<Value, BackendError> {
        let response = self.http.get(self.url(path)).send().await?;
        unwrap_envelope(response).await
    }

    async fn post_multipart(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<Value, BackendError> {
        let response = self
            .http
            .post(self.url(path))
            .timeout(Duration::from_secs(LONG_REQUEST_TIMEOUT_SECS))
            .multipart(form)
            .send()
            .await?;
        unwrap_envelope(response).await
    }

    async fn download(&self, path: &str, body: &Value) -> Result<Vec<u8>, BackendError> {
        debug!(path, "requesting export");
        let response = self
            .http
            .post(self.url(path))
            .timeout(Duration::from_secs(LONG_REQUEST_TIMEOUT_SECS))
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                code: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Check status and the optional success flag, producing the typed error
/// taxonomy, and hand back the parsed body.
async fn unwrap_envelope(response: reqwest::Response) -> Result<Value, BackendError> {
    let status = response.status();
    let body = response.text().await?;
    accept_body(status.as_u16(), status.is_success(), &body)
}

/// Envelope rules on a raw body. `success` is only meaningful when the
/// backend sends it; bare GET payloads have no such flag.
fn accept_body(code: u16, http_ok: bool, body: &str) -> Result<Value, BackendError> {
    let value: Value = serde_json::from_str(body)?;
    let error = value
        .get("error")
        .and_then(Value::as_str)
        .map(String::from);

    if !http_ok {
        if let Some(message) = error {
            return Err(BackendError::Rejected { message });
        }
        return Err(BackendError::Status { code });
    }

    if value.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(BackendError::Rejected {
            message: error.unwrap_or_else(|| "unspecified backend error".to_string()),
        });
    }

    Ok(value)
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, BackendError> {
    Ok(serde_json::from_value(body)?)
}

async fn file_form(field: &str, path: &Path) -> Result<multipart::Form, BackendError> {
    merge_file(multipart::Form::new(), field, path).await
}

async fn merge_file(
    form: multipart::Form,
    field: &str,
    path: &Path,
) -> Result<multipart::Form, BackendError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| BackendError::Rejected {
            message: format!("cannot read {}: {err}", path.display()),
        })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.xlsx".to_string());
    let part = multipart::Part::bytes(bytes).file_name(file_name);
    Ok(form.part(field.to_string(), part))
}

#[derive(Debug, Deserialize)]
struct SheetsPayload {
    #[serde(default)]
    sheets: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FilesPayload {
    #[serde(default)]
    file_count: usize,
}

#[derive(Debug, Deserialize)]
struct ResultsPayload<T> {
    results: T,
}

#[derive(Debug, Deserialize)]
struct SavedReportPayload {
    report_id: String,
}

#[derive(Debug, Deserialize)]
struct ReportsPayload {
    #[serde(default)]
    reports: Vec<ReportEntry>,
}

#[derive(Debug, Deserialize)]
struct MappingsPayload {
    #[serde(default)]
    mappings: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_get_body_without_success_flag_is_accepted() {
        // get-comparison-results answers the results object directly.
        let body = r#"{
            "results": {
                "Lens": [{
                    "comparison_file": "planning_s12.xlsx",
                    "differences": [
                        {"Key": "L1_OP1", "Column": "Commentaire",
                         "Base Value": "a", "Comparison Value": "b",
                         "Status": "Modifiée"}
                    ],
                    "base_rows": 40,
                    "comp_rows": 38
                }]
            },
            "summary": {"total_sheets_compared": 1, "total_differences": 1,
                        "total_cells_compared": 240, "execution_time_seconds": 0.4},
            "timestamp": "2025-03-02 10:00:00"
        }"#;
        let decoded: ComparisonResults = decode(accept_body(200, true, body).unwrap()).unwrap();
        assert_eq!(decoded.results["Lens"][0].differences.len(), 1);
        assert_eq!(decoded.summary.total_sheets_compared, 1);
        assert_eq!(decoded.timestamp, "2025-03-02 10:00:00");
    }

    #[test]
    fn test_reports_and_mappings_get_bodies_decode() {
        let body = r#"{"reports": [{"id": "report_001", "date": "2025-03-02 10:00",
            "base_file": "base.xlsx", "comparison_files": ["a.xlsx"],
            "differences": 3, "match_rate": "98.8%"}]}"#;
        let payload: ReportsPayload = decode(accept_body(200, true, body).unwrap()).unwrap();
        assert_eq!(payload.reports.len(), 1);
        assert_eq!(payload.reports[0].id, "report_001");

        let body = r#"{"mappings": {"LE": "Lens"}}"#;
        let payload: MappingsPayload = decode(accept_body(200, true, body).unwrap()).unwrap();
        assert_eq!(payload.mappings["LE"], "Lens");
    }

    #[test]
    fn test_explicit_success_false_is_rejected_with_message() {
        let err = accept_body(200, true, r#"{"success": false, "error": "Aucun fichier de base"}"#)
            .unwrap_err();
        match err {
            BackendError::Rejected { message } => assert_eq!(message, "Aucun fichier de base"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrapped_action_response_plucks_results_key() {
        // start-comparison wraps its payload under "results".
        let body = r#"{"success": true, "results": {
            "results": {}, "summary": {"total_sheets_compared": 2}, "timestamp": "t"}}"#;
        let payload: ResultsPayload<ComparisonResults> =
            decode(accept_body(200, true, body).unwrap()).unwrap();
        assert_eq!(payload.results.summary.total_sheets_compared, 2);
    }

    #[test]
    fn test_http_error_prefers_backend_message_over_code() {
        let err = accept_body(400, false, r#"{"error": "No sheets selected"}"#).unwrap_err();
        assert!(matches!(err, BackendError::Rejected { .. }));

        let err = accept_body(500, false, r#"{}"#).unwrap_err();
        assert!(matches!(err, BackendError::Status { code: 500 }));
    }

    #[test]
    fn test_client_builds_urls_from_base() {
        let client = BackendClient::new("http://127.0.0.1:5000").unwrap();
        assert_eq!(client.url("/health"), "http://127.0.0.1:5000/health");
    }
}
