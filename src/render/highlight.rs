//! Post-render highlight pass over the current page.
//!
//! This runs after the table is built, mirrors the matching rules of the
//! search predicate, and is idempotent: every invocation first resets each
//! cell to plain text before reapplying spans. The target pattern prefers
//! the global term and falls back to the FIRST field clause only; that
//! asymmetry with the matching logic is long-observed behavior and must
//! stay.

use regex::RegexBuilder;
use tracing::debug;

use super::table::{Run, TableView};
use crate::search::{SearchPredicate, check_match};

/// Apply highlight spans for the predicate's target pattern.
///
/// Degrades silently: an unusable pattern leaves the table plain.
pub fn apply_highlight(table: &mut TableView, predicate: &SearchPredicate) {
    for row in &mut table.rows {
        for cell in row {
            cell.reset();
        }
    }

    let Some(target) = predicate.highlight_target() else {
        return;
    };

    if target.contains('*') || target.contains('?') {
        // Anchored wildcard patterns match whole cells, so highlight at
        // cell granularity.
        for row in &mut table.rows {
            for cell in row {
                let text = cell.text();
                if check_match(&text, target, predicate.case_sensitive, false) {
                    for run in &mut cell.runs {
                        run.highlighted = true;
                    }
                }
            }
        }
        return;
    }

    let needle = target
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(target);
    if needle.is_empty() {
        return;
    }

    let finder = match RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(!predicate.case_sensitive)
        .build()
    {
        Ok(re) => re,
        Err(err) => {
            debug!(target = %target, error = %err, "highlight pattern rejected");
            return;
        }
    };

    for row in &mut table.rows {
        for cell in row {
            let text = cell.text();
            let mut runs = Vec::new();
            let mut cursor = 0;
            for hit in finder.find_iter(&text) {
                if hit.start() > cursor {
                    runs.push(Run {
                        text: text[cursor..hit.start()].to_string(),
                        highlighted: false,
                    });
                }
                runs.push(Run {
                    text: text[hit.range()].to_string(),
                    highlighted: true,
                });
                cursor = hit.end();
            }
            if runs.is_empty() {
                continue;
            }
            if cursor < text.len() {
                runs.push(Run {
                    text: text[cursor..].to_string(),
                    highlighted: false,
                });
            }
            cell.runs = runs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiffStatus, DifferenceRecord};
    use crate::render::table::TableView;

    fn table() -> TableView {
        TableView::differences(&[DifferenceRecord {
            key: "L123_OP4".to_string(),
            column: Some("Commentaire".to_string()),
            base_value: "revision urgente".to_string(),
            comparison_value: "revision reportee".to_string(),
            status: DiffStatus::Modified,
        }])
    }

    fn highlighted_texts(table: &TableView) -> Vec<String> {
        table
            .rows
            .iter()
            .flat_map(|row| row.iter())
            .flat_map(|cell| cell.runs.iter())
            .filter(|run| run.highlighted)
            .map(|run| run.text.clone())
            .collect()
    }

    #[test]
    fn test_highlight_marks_each_occurrence() {
        let mut t = table();
        let p = SearchPredicate::compile("revision", false, false);
        apply_highlight(&mut t, &p);
        assert_eq!(highlighted_texts(&t), vec!["revision", "revision"]);
    }

    #[test]
    fn test_highlight_is_idempotent() {
        let mut t = table();
        let p = SearchPredicate::compile("revision", false, false);
        apply_highlight(&mut t, &p);
        let first = t.clone();
        apply_highlight(&mut t, &p);
        assert_eq!(t, first);
        assert_eq!(t.text_content(), table().text_content());
    }

    #[test]
    fn test_highlight_case_insensitive_by_default() {
        let mut t = table();
        let p = SearchPredicate::compile("REVISION", false, false);
        apply_highlight(&mut t, &p);
        assert_eq!(highlighted_texts(&t).len(), 2);
    }

    #[test]
    fn test_highlight_uses_first_field_clause_only() {
        let mut t = table();
        let p = SearchPredicate::compile("cle:L123* colonne:Commentaire", false, false);
        apply_highlight(&mut t, &p);
        // First clause is a wildcard on the key; only the key cell lights up.
        let marked = highlighted_texts(&t);
        assert_eq!(marked, vec!["L123_OP4"]);
    }

    #[test]
    fn test_highlight_clears_previous_spans_when_target_changes() {
        let mut t = table();
        apply_highlight(&mut t, &SearchPredicate::compile("revision", false, false));
        apply_highlight(&mut t, &SearchPredicate::compile("urgente", false, false));
        assert_eq!(highlighted_texts(&t), vec!["urgente"]);
    }

    #[test]
    fn test_empty_predicate_strips_all_highlights() {
        let mut t = table();
        apply_highlight(&mut t, &SearchPredicate::compile("revision", false, false));
        apply_highlight(&mut t, &SearchPredicate::compile("", false, false));
        assert!(highlighted_texts(&t).is_empty());
    }

    #[test]
    fn test_quoted_target_is_unquoted_before_lookup() {
        let mut t = table();
        let p = SearchPredicate::compile("\"revision urgente\"", false, false);
        apply_highlight(&mut t, &p);
        assert_eq!(highlighted_texts(&t), vec!["revision urgente"]);
    }
}
