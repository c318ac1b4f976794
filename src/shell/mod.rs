//! Shell orchestration: pages, notifications, and the render pipeline
//! that turns stored results plus user input into view models.
//!
//! All view builders here are pure functions over the store; the `Shell`
//! struct only sequences backend calls and routes their failures into the
//! right surface (fatal error view vs transient notification).

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::backend::{BackendClient, BackendError, ProcessSupervisor};
use crate::config::ShellConfig;
use crate::model::{ComparisonSummary, DiffStatus, ExportFormat};
use crate::paginate::{PageControls, paginate};
use crate::render::{TableView, apply_highlight};
use crate::search::{SearchPredicate, SearchScope};
use crate::store::ResultStore;

/// Navigable pages of the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Home,
    Upload,
    Comparison,
    Analysis,
    Reports,
    Help,
    Legal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient banner message. Fatal failures use [`ErrorView`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Full-page failure surface shown when the backend is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorView {
    pub title: String,
    pub detail: String,
}

/// User input driving one render of the comparison page.
#[derive(Debug, Clone, Default)]
pub struct ComparisonQuery {
    pub sheet: String,
    pub file: Option<String>,
    pub status: Option<DiffStatus>,
    pub query: String,
    pub scope: SearchScope,
    pub case_sensitive: bool,
    pub exact_match: bool,
    pub page: usize,
}

/// Everything the comparison page needs to draw itself.
#[derive(Debug, Clone)]
pub struct ComparisonView {
    pub table_html: String,
    pub controls: PageControls,
    pub page_number: usize,
    pub total_pages: usize,
    pub filtered_rows: usize,
    pub summary: ComparisonSummary,
}

/// Build the comparison page view: filter, paginate, render, highlight.
///
/// Pure over the store; called on every keystroke, page turn or filter
/// change.
pub fn comparison_view(
    store: &ResultStore,
    query: &ComparisonQuery,
    page_size: usize,
) -> ComparisonView {
    let predicate = SearchPredicate::compile(&query.query, query.case_sensitive, query.exact_match);
    let rows = store.filtered_differences(
        &query.sheet,
        query.file.as_deref(),
        query.status,
        &predicate,
        &query.scope,
    );
    let filtered_rows = rows.len();

    let page = paginate(&rows, query.page, page_size);
    let page_records: Vec<_> = page.items.iter().map(|rec| (*rec).clone()).collect();
    let mut table = TableView::differences(&page_records);
    apply_highlight(&mut table, &predicate);

    debug!(
        sheet = %query.sheet,
        filtered_rows,
        page = page.page_number,
        total_pages = page.total_pages,
        "comparison view rebuilt"
    );

    ComparisonView {
        table_html: table.to_html(),
        controls: PageControls::build(page.page_number, page.total_pages),
        page_number: page.page_number,
        total_pages: page.total_pages,
        filtered_rows,
        summary: store
            .comparison()
            .map(|c| c.summary.clone())
            .unwrap_or_default(),
    }
}

/// Accepted workbook extensions for uploads.
const WORKBOOK_EXTENSIONS: [&str; 3] = ["xlsx", "xlsm", "xls"];

/// Client-side check of an upload path before it goes on the wire.
pub fn validate_workbook_path(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("fichier introuvable: {}", path.display()));
    }
    let ok = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        });
    if ok {
        Ok(())
    } else {
        Err(format!(
            "format non supporté: {} (attendu: {})",
            path.display(),
            WORKBOOK_EXTENSIONS.join(", ")
        ))
    }
}

/// Client-side check of a comparison request.
pub fn validate_comparison_request(
    selected_sheets: &[String],
    site_mapping_count: usize,
) -> Result<(), String> {
    if selected_sheets.is_empty() {
        return Err("sélectionnez au moins une feuille à comparer".to_string());
    }
    if site_mapping_count == 0 {
        return Err("configurez au moins une correspondance de site".to_string());
    }
    Ok(())
}

/// Client-side check of an analysis request.
pub fn validate_analysis_request(filename: &str, sheet_name: &str) -> Result<(), String> {
    if filename.trim().is_empty() {
        return Err("sélectionnez un fichier à analyser".to_string());
    }
    if sheet_name.trim().is_empty() {
        return Err("sélectionnez une feuille à analyser".to_string());
    }
    Ok(())
}

/// Write exported bytes to `dir` as `{stem}.{ext}` and return the path.
pub async fn write_export(
    dir: &Path,
    stem: &str,
    format: ExportFormat,
    bytes: &[u8],
) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{stem}.{}", format.extension()));
    tokio::fs::write(&path, bytes).await?;
    info!(path = %path.display(), bytes = bytes.len(), "export written");
    Ok(path)
}

/// Session orchestrator: owns the supervisor, the client and the store.
pub struct Shell {
    pub config: ShellConfig,
    pub store: ResultStore,
    pub page: Page,
    pub notifications: Vec<Notification>,
    pub error: Option<ErrorView>,
    supervisor: ProcessSupervisor,
    client: Option<BackendClient>,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Shell {
        let supervisor = ProcessSupervisor::new(config.clone());
        Shell {
            config,
            store: ResultStore::new(),
            page: Page::Home,
            notifications: Vec::new(),
            error: None,
            supervisor,
            client: None,
        }
    }

    /// Bring the backend up and connect the client. The supervisor's base
    /// URL is consumed here, once.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        if let Err(err) = self.supervisor.start().await {
            self.handle_backend_error(&err);
            return Err(err.into());
        }
        let base_url = self
            .supervisor
            .take_base_url()
            .ok_or_else(|| anyhow::anyhow!("supervisor ready but base URL already consumed"))?;
        self.client = Some(BackendClient::new(base_url)?);
        Ok(())
    }

    pub fn client(&self) -> Option<&BackendClient> {
        self.client.as_ref()
    }

    pub async fn shutdown(&mut self) {
        self.client = None;
        self.supervisor.shutdown().await;
    }

    /// Switch pages. Transient banners do not follow the user around; a
    /// fatal error view does, until the session is relaunched.
    pub fn navigate(&mut self, page: Page) {
        if self.page != page {
            debug!(?page, "navigating");
            self.page = page;
            self.notifications.clear();
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification {
            level,
            message: message.into(),
        });
    }

    /// Route a backend failure to the surface its class demands.
    pub fn handle_backend_error(&mut self, err: &BackendError) {
        match err {
            BackendError::Unavailable(detail) => {
                warn!(detail = %detail, "backend unavailable, showing error view");
                self.error = Some(ErrorView {
                    title: "Le moteur de comparaison est indisponible".to_string(),
                    detail: detail.clone(),
                });
            }
            BackendError::Rejected { message } => {
                self.notify(NotificationLevel::Warning, message.clone());
            }
            BackendError::Http(_) | BackendError::Status { .. } | BackendError::Decode(_) => {
                self.notify(NotificationLevel::Error, err.to_string());
            }
        }
    }
}
