//! INSERT clauses.
//!
//! `insert_into(entity, columns)` is the canonical form; `insert(columns).into(entity)` stashes
//! the columns and re-dispatches to it, so both end in the same state. Recording a column list
//! switches the command into insert mode: [`Command::go`] then bulk-loads the rows given to
//! [`Command::values`] instead of running the text.

use super::{Command, Draft};
use crate::error::BuildError;
use crate::placeholder::MARKER;
use crate::relation::Relation;
use crate::value::Value;

/// Postgres' limit on columns per table.
pub const POSTGRES_MAX_COLUMNS: usize = 1600;

impl Command {
    /// First half of `insert(columns).into(entity)`.
    ///
    /// Sets the text to the parenthesized column list until [`Command::into`] completes it.
    pub fn insert<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.apply(move |draft| {
            draft.text = format!("({})", columns.join(", "));
            draft.pending_columns = Some(columns);
            Ok(())
        })
    }

    /// Second half of `insert(columns).into(entity)`.
    ///
    /// Without a preceding [`Command::insert`] this is `insert_into(entity, [])`.
    pub fn into(self, entity: impl Relation) -> Self {
        let entity = entity.display_name();
        self.apply(move |draft| {
            let columns = draft.pending_columns.take().unwrap_or_default();
            insert_into(draft, entity, columns)
        })
    }

    /// Start an `INSERT INTO entity (columns...)`.
    ///
    /// - With columns and `?` markers in `entity` (`"customers (?, ?, ?)"`), the markers are
    ///   replaced by the column names in order.
    /// - With columns and no markers, ` (a, b, c)` is appended.
    /// - Without columns, the inline `(...)` list of `entity` is parsed as the column list.
    pub fn insert_into<I, S>(self, entity: impl Relation, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entity = entity.display_name();
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.apply(move |draft| insert_into(draft, entity, columns))
    }

    /// Record rows to insert and append ` VALUES (?, ...), (?, ...)`.
    ///
    /// The values are not bound as arguments; they travel through the bulk-load path when the
    /// command runs, so [`Command::pp`] shows the markers. Repeated calls extend the list.
    pub fn values<I, R, V>(self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let rows: Vec<Vec<Value>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self.apply(move |draft| {
            if rows.is_empty() {
                return Ok(());
            }
            let expected = draft.columns.len();
            if expected > 0 {
                if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
                    return Err(BuildError::ArityMismatch {
                        row: draft.rows.len() + idx,
                        expected,
                        found: row.len(),
                    });
                }
            }

            let tuples: Vec<String> = rows.iter().map(|row| marker_tuple(row.len())).collect();
            draft
                .text
                .push_str(if draft.rows.is_empty() { " VALUES " } else { ", " });
            draft.text.push_str(&tuples.join(", "));
            draft.rows.extend(rows);
            Ok(())
        })
    }
}

fn insert_into(draft: &mut Draft, entity: String, columns: Vec<String>) -> Result<(), BuildError> {
    let (target, columns) = if columns.is_empty() {
        let columns = parse_inline_columns(&entity).ok_or_else(|| BuildError::MissingColumns {
            entity: entity.clone(),
        })?;
        (entity, columns)
    } else if entity.contains(MARKER) {
        let mut target = entity;
        for column in &columns {
            target = target.replacen(MARKER, column, 1);
        }
        (target, columns)
    } else {
        let target = format!("{} ({})", entity, columns.join(", "));
        (target, columns)
    };

    if columns.len() > POSTGRES_MAX_COLUMNS {
        return Err(BuildError::TooManyColumns {
            count: columns.len(),
            max: POSTGRES_MAX_COLUMNS,
        });
    }

    draft.table = Some(table_name(&target));
    draft.columns = columns;
    draft.text = format!("INSERT INTO {target}");
    Ok(())
}

/// `"actor (name, age)"` -> `["name", "age"]`.
fn parse_inline_columns(entity: &str) -> Option<Vec<String>> {
    let (_, rest) = entity.split_once('(')?;
    let inner = rest.trim_end();
    let inner = inner.strip_suffix(')').unwrap_or(inner);
    let columns: Vec<String> = inner
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    (!columns.is_empty()).then_some(columns)
}

/// The bare table name: no column list, no alias.
fn table_name(target: &str) -> String {
    let head = target.split('(').next().unwrap_or(target);
    head.split_whitespace().next().unwrap_or_default().to_string()
}

fn marker_tuple(len: usize) -> String {
    let markers = vec![MARKER.to_string(); len];
    format!("({})", markers.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_column_list() {
        assert_eq!(
            parse_inline_columns("actor (name, age ,email)"),
            Some(vec!["name".into(), "age".into(), "email".into()])
        );
        assert_eq!(parse_inline_columns("actor"), None);
        assert_eq!(parse_inline_columns("actor ()"), None);
    }

    #[test]
    fn table_name_strips_alias_and_columns() {
        assert_eq!(table_name("actor (name, age)"), "actor");
        assert_eq!(table_name("public.actor a (name)"), "public.actor");
        assert_eq!(table_name("customers(name)"), "customers");
    }

    #[test]
    fn marker_tuples() {
        assert_eq!(marker_tuple(3), "(?, ?, ?)");
        assert_eq!(marker_tuple(1), "(?)");
    }
}
