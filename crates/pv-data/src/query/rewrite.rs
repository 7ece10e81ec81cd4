//! Placeholder binding and statement classification

use regex::{NoExpand, Regex};

/// Replaces the placeholder word in user statements with the bound relation
///
/// Matching is case-insensitive and whole-word only, so `tbl` is replaced
/// but `tbl2` and `mytbl` are left alone. Replacement is purely textual.
#[derive(Debug, Clone)]
pub struct RelationBinder {
    pattern: Regex,
}

impl RelationBinder {
    pub fn new(placeholder: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(placeholder)))?;
        Ok(Self { pattern })
    }

    /// Substitute every standalone occurrence of the placeholder
    pub fn bind(&self, statement: &str, relation: &str) -> String {
        self.pattern
            .replace_all(statement, NoExpand(relation))
            .into_owned()
    }
}

/// How a statement is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT` / `WITH`: described, executed and materialized as rows
    Projecting,
    /// Anything else: executed for effect, result cleared
    Effect,
}

impl StatementKind {
    /// Classify by the leading keyword of the trimmed statement
    pub fn classify(statement: &str) -> Self {
        let keyword: String = statement
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();

        if keyword.eq_ignore_ascii_case("select") || keyword.eq_ignore_ascii_case("with") {
            StatementKind::Projecting
        } else {
            StatementKind::Effect
        }
    }
}
