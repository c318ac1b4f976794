//! Query grammar and matching for the comparison result tables.
//!
//! A query is a mix of `field:term` clauses and free text. Field names go
//! through a fixed synonym table (French and English spellings); whatever
//! free text remains after clause extraction becomes the global term. The
//! grammar is load-bearing for saved user queries, so the quirks below are
//! contractual, not accidental:
//!
//! - field clauses AND together, and their presence disables the global
//!   term entirely for that search pass;
//! - an unrecognized field name matches nothing (no fallback to global);
//! - `date:` fans out across both value columns (OR).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::DifferenceRecord;

/// A search-addressable attribute of a [`DifferenceRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchField {
    Key,
    Column,
    BaseValue,
    ComparisonValue,
    /// Matches against both value fields (OR).
    Date,
    Status,
    /// Unmapped name, kept verbatim. Never matches.
    Unknown(String),
}

impl SearchField {
    /// Map a user-supplied field name through the synonym table.
    pub fn parse(name: &str) -> SearchField {
        match name.to_lowercase().as_str() {
            "clé" | "cle" | "key" => SearchField::Key,
            "colonne" | "column" => SearchField::Column,
            "valeur" | "value" | "origine" | "base" => SearchField::BaseValue,
            "comparaison" | "comparison" | "nouvelle" | "new" => SearchField::ComparisonValue,
            "date" => SearchField::Date,
            "status" | "statut" | "état" | "etat" | "type" => SearchField::Status,
            _ => SearchField::Unknown(name.to_string()),
        }
    }
}

/// Which fields a search pass looks at.
///
/// `Field` is the dropdown override: it wins over any field names written
/// in the query itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchScope {
    #[default]
    All,
    Field(SearchField),
}

/// Compiled matcher built from a raw query string.
///
/// Recompiled on every keystroke or submit; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPredicate {
    pub field_clauses: Vec<(SearchField, String)>,
    pub global_term: Option<String>,
    pub case_sensitive: bool,
    pub exact_match: bool,
}

static CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([\p{L}\p{N}_]+):("[^"]*"|\S+)"#).expect("clause regex"));

impl SearchPredicate {
    /// Parse `query` into field clauses plus a residual global term.
    pub fn compile(query: &str, case_sensitive: bool, exact_match: bool) -> SearchPredicate {
        let mut field_clauses = Vec::new();
        for cap in CLAUSE_RE.captures_iter(query) {
            field_clauses.push((SearchField::parse(&cap[1]), cap[2].to_string()));
        }

        let global_term = if field_clauses.is_empty() {
            let trimmed = query.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        } else {
            let residue = CLAUSE_RE.replace_all(query, " ");
            let collapsed = residue.split_whitespace().collect::<Vec<_>>().join(" ");
            (!collapsed.is_empty()).then_some(collapsed)
        };

        SearchPredicate {
            field_clauses,
            global_term,
            case_sensitive,
            exact_match,
        }
    }

    /// True when the predicate constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.field_clauses.is_empty() && self.global_term.is_none()
    }

    /// Evaluate the predicate against one record.
    ///
    /// Field clauses AND together and short-circuit the global term; with
    /// no clauses, the global term must match any of key, column, base
    /// value or comparison value.
    pub fn matches(&self, record: &DifferenceRecord, scope: &SearchScope) -> bool {
        if !self.field_clauses.is_empty() {
            return self.field_clauses.iter().all(|(field, term)| {
                let effective = match scope {
                    SearchScope::All => field,
                    SearchScope::Field(forced) => forced,
                };
                self.field_matches(record, effective, term)
            });
        }

        let Some(term) = self.global_term.as_deref() else {
            return true;
        };

        match scope {
            SearchScope::Field(field) => self.field_matches(record, field, term),
            SearchScope::All => {
                let column = record.column.as_deref().unwrap_or("");
                [
                    record.key.as_str(),
                    column,
                    record.base_value.as_str(),
                    record.comparison_value.as_str(),
                ]
                .iter()
                .any(|text| check_match(text, term, self.case_sensitive, self.exact_match))
            }
        }
    }

    fn field_matches(&self, record: &DifferenceRecord, field: &SearchField, term: &str) -> bool {
        let hit = |text: &str| check_match(text, term, self.case_sensitive, self.exact_match);
        match field {
            SearchField::Key => hit(&record.key),
            SearchField::Column => hit(record.column.as_deref().unwrap_or("")),
            SearchField::BaseValue => hit(&record.base_value),
            SearchField::ComparisonValue => hit(&record.comparison_value),
            SearchField::Date => hit(&record.base_value) || hit(&record.comparison_value),
            SearchField::Status => hit(record.status.label()),
            SearchField::Unknown(_) => false,
        }
    }

    /// Pattern used by the highlight pass: the global term when present,
    /// otherwise the first field clause's term only.
    pub fn highlight_target(&self) -> Option<&str> {
        self.global_term
            .as_deref()
            .or_else(|| self.field_clauses.first().map(|(_, term)| term.as_str()))
    }
}

/// The matching primitive shared by every clause.
///
/// Wildcard patterns (`*`, `?`) compile to an anchored regex; a pattern
/// that fails to compile matches nothing rather than erroring out of the
/// search pass. Double-quoted patterns are phrases. Everything else is
/// equality (exact) or containment.
pub fn check_match(text: &str, pattern: &str, case_sensitive: bool, exact_match: bool) -> bool {
    let (text, pattern) = if case_sensitive {
        (text.to_string(), pattern.to_string())
    } else {
        (text.to_lowercase(), pattern.to_lowercase())
    };

    if pattern.contains('*') || pattern.contains('?') {
        return match wildcard_regex(&pattern) {
            Ok(re) => re.is_match(&text),
            Err(err) => {
                tracing::debug!(pattern = %pattern, error = %err, "wildcard pattern rejected");
                false
            }
        };
    }

    if pattern.len() >= 2 && pattern.starts_with('"') && pattern.ends_with('"') {
        let phrase = &pattern[1..pattern.len() - 1];
        return if exact_match {
            text == phrase
        } else {
            text.contains(phrase)
        };
    }

    if exact_match {
        text == pattern
    } else {
        text.contains(&pattern)
    }
}

/// Translate a wildcard pattern to an anchored regex: `*` spans anything,
/// `?` one character, a whitespace run any whitespace run.
fn wildcard_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut in_space = false;
    for ch in pattern.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push_str(r"\s+");
                in_space = true;
            }
            continue;
        }
        in_space = false;
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out)
}
