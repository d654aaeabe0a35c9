// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! SQL procedures declared over a table.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::column::Column;

/// Named SQL operation with typed input and output fields.
///
/// `sql` maps a dialect name to SQL text. The [`Procedure::STD_SQL`] entry is
/// used for any dialect without its own text. Bind parameters are written as
/// `:name` and resolved against `in_fields`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Procedure {
    /// Procedure name, unique within its table.
    pub name: String,

    /// Input fields, in bind order.
    #[serde(default, rename = "in")]
    pub in_fields: Vec<Column>,

    /// Output fields, in select order.
    #[serde(default, rename = "out")]
    pub out_fields: Vec<Column>,

    /// SQL text per dialect.
    #[serde(default)]
    pub sql: BTreeMap<String, String>,

    /// Synthesized from table capability flags rather than declared.
    #[serde(skip)]
    pub is_standard: bool,

    /// Record name the input binds to, instead of a generated query record.
    #[serde(skip)]
    pub in_override_name: Option<String>,

    /// Record name the output binds to, instead of a generated query record.
    #[serde(skip)]
    pub out_override_name: Option<String>
}

impl Procedure {
    /// Dialect key whose SQL applies to every dialect without its own.
    pub const STD_SQL: &'static str = "std";

    /// Create a declared procedure with no fields and no SQL.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:              name.into(),
            in_fields:         Vec::new(),
            out_fields:        Vec::new(),
            sql:               BTreeMap::new(),
            is_standard:       false,
            in_override_name:  None,
            out_override_name: None
        }
    }

    /// Append an input field.
    #[must_use]
    pub fn with_in_field(mut self, field: Column) -> Self {
        self.in_fields.push(field);
        self
    }

    /// Append an output field.
    #[must_use]
    pub fn with_out_field(mut self, field: Column) -> Self {
        self.out_fields.push(field);
        self
    }

    /// Set the SQL text for a dialect (or [`Procedure::STD_SQL`]).
    #[must_use]
    pub fn with_sql(mut self, dialect: impl Into<String>, sql: impl Into<String>) -> Self {
        self.sql.insert(dialect.into(), sql.into());
        self
    }

    /// SQL for `dialect`, falling back to the `std` entry.
    #[must_use]
    pub fn sql_for(&self, dialect: &str) -> Option<&str> {
        self.sql
            .get(dialect)
            .or_else(|| self.sql.get(Self::STD_SQL))
            .map(String::as_str)
    }

    /// The input field when the input is exactly one `dbrec`.
    #[must_use]
    pub fn single_record_input(&self) -> Option<&Column> {
        single_record(&self.in_fields)
    }

    /// The output field when the output is exactly one `dbrec`.
    #[must_use]
    pub fn single_record_output(&self) -> Option<&Column> {
        single_record(&self.out_fields)
    }
}

fn single_record(fields: &[Column]) -> Option<&Column> {
    match fields {
        [only] if only.is_record() => Some(only),
        _ => None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lookup, TypeTag};

    #[test]
    fn sql_falls_back_to_std() {
        let proc = Procedure::new("ByName")
            .with_sql("std", "select 1")
            .with_sql("mssql", "select top 1 1");
        assert_eq!(proc.sql_for("mssql"), Some("select top 1 1"));
        assert_eq!(proc.sql_for("postgres"), Some("select 1"));
        assert_eq!(Procedure::new("Empty").sql_for("postgres"), None);
    }

    #[test]
    fn single_record_detection() {
        let rec = Procedure::new("P").with_in_field(Column::record("r", Lookup::This));
        assert!(rec.single_record_input().is_some());

        let mixed = rec
            .clone()
            .with_in_field(Column::new("extra", TypeTag::Int32));
        assert!(mixed.single_record_input().is_none());

        let scalar = Procedure::new("S").with_out_field(Column::new("a", TypeTag::Int32));
        assert!(scalar.single_record_output().is_none());
    }

    #[test]
    fn from_yaml() {
        let proc: Procedure = serde_yaml::from_str(
            "name: ByStatus\nin:\n  - { name: status, type: char }\nout:\n  - { name: id, type: int64 }\nsql:\n  std: select id from orders where status = :status\n"
        )
        .unwrap();
        assert_eq!(proc.in_fields.len(), 1);
        assert_eq!(proc.out_fields[0].type_tag, TypeTag::Int64);
        assert!(!proc.is_standard);
    }
}
