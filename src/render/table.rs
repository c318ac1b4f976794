//! Table construction for the comparison and duplicate views.
//!
//! Rows are kept as runs of text rather than flat strings so the highlight
//! pass can mark sub-spans without re-deriving the table.

use crate::model::{DifferenceRecord, DuplicateGroup, DuplicateSource};

/// A contiguous span of cell text, highlighted or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub highlighted: bool,
}

/// One rendered cell. Concatenating the runs yields the cell text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub runs: Vec<Run>,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Cell {
        Cell {
            runs: vec![Run {
                text: text.into(),
                highlighted: false,
            }],
        }
    }

    /// The cell content with highlight structure flattened away.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Collapse back to a single plain run, dropping any highlight spans.
    pub fn reset(&mut self) {
        let text = self.text();
        self.runs = vec![Run {
            text,
            highlighted: false,
        }];
    }
}

/// An already-rendered table: header plus rows of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub css_class: String,
}

impl TableView {
    /// Difference rows with the display column names the UI uses.
    pub fn differences(records: &[DifferenceRecord]) -> TableView {
        let columns = [
            "Clé",
            "Colonne",
            "Valeur de base",
            "Valeur de comparaison",
            "Statut",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let rows = records
            .iter()
            .map(|rec| {
                vec![
                    Cell::plain(&rec.key),
                    Cell::plain(rec.column.as_deref().unwrap_or("")),
                    Cell::plain(&rec.base_value),
                    Cell::plain(&rec.comparison_value),
                    Cell::plain(rec.status.label()),
                ]
            })
            .collect();

        TableView {
            columns,
            rows,
            css_class: "data-table differences-table".to_string(),
        }
    }

    /// Duplicate groups for either file.
    pub fn duplicates(groups: &[DuplicateGroup]) -> TableView {
        let columns = ["Clé", "Occurrences", "Source"]
            .into_iter()
            .map(String::from)
            .collect();

        let rows = groups
            .iter()
            .map(|group| {
                let source = match group.source {
                    DuplicateSource::Base => "Fichier de base",
                    DuplicateSource::Comparison => "Fichier de comparaison",
                };
                vec![
                    Cell::plain(&group.key),
                    Cell::plain(group.occurrences.to_string()),
                    Cell::plain(source),
                ]
            })
            .collect();

        TableView {
            columns,
            rows,
            css_class: "data-table duplicates-table".to_string(),
        }
    }

    /// Serialize to HTML. All cell text is escaped; highlighted runs are
    /// wrapped in `<span class="search-highlight">`.
    pub fn to_html(&self) -> String {
        if self.rows.is_empty() {
            return r#"<p class="no-data">Aucune donnée disponible</p>"#.to_string();
        }

        let mut html = format!(
            r#"<div class="table-scroll-wrapper"><table class="{}">"#,
            html_escape(&self.css_class)
        );
        html.push_str("<thead><tr>");
        for col in &self.columns {
            html.push_str("<th>");
            html.push_str(&html_escape(col));
            html.push_str("</th>");
        }
        html.push_str("</tr></thead><tbody>");
        for row in &self.rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str("<td>");
                for run in &cell.runs {
                    if run.highlighted {
                        html.push_str(r#"<span class="search-highlight">"#);
                        html.push_str(&html_escape(&run.text));
                        html.push_str("</span>");
                    } else {
                        html.push_str(&html_escape(&run.text));
                    }
                }
                html.push_str("</td>");
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table></div>");
        html
    }

    /// Concatenated visible text of the whole table, highlight-agnostic.
    /// Used by tests to assert the highlight pass never alters content.
    pub fn text_content(&self) -> String {
        self.rows
            .iter()
            .flat_map(|row| row.iter().map(|cell| cell.text()))
            .collect::<Vec<_>>()
            .join("\u{1f}")
    }
}

/// Minimal HTML escaping for text nodes and attribute values.
pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DiffStatus;

    fn sample() -> Vec<DifferenceRecord> {
        vec![DifferenceRecord {
            key: "L123_OP4".to_string(),
            column: Some("Commentaire".to_string()),
            base_value: "<script>".to_string(),
            comparison_value: "ok & fine".to_string(),
            status: DiffStatus::Modified,
        }]
    }

    #[test]
    fn test_differences_table_has_translated_header() {
        let table = TableView::differences(&sample());
        assert_eq!(table.columns[0], "Clé");
        assert_eq!(table.columns[4], "Statut");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][4].text(), "Modifiée");
    }

    #[test]
    fn test_to_html_escapes_cell_content() {
        let html = TableView::differences(&sample()).to_html();
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("ok &amp; fine"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_empty_table_renders_no_data_notice() {
        let html = TableView::differences(&[]).to_html();
        assert!(html.contains("Aucune donnée disponible"));
    }

    #[test]
    fn test_cell_reset_flattens_runs() {
        let mut cell = Cell {
            runs: vec![
                Run {
                    text: "ab".to_string(),
                    highlighted: false,
                },
                Run {
                    text: "cd".to_string(),
                    highlighted: true,
                },
            ],
        };
        cell.reset();
        assert_eq!(cell.runs.len(), 1);
        assert_eq!(cell.text(), "abcd");
        assert!(!cell.runs[0].highlighted);
    }
}
