// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Table definitions.
//!
//! # Capability Flags
//!
//! Each flag enables one standard procedure. Procedures working on a single
//! row additionally need a primary key.
//!
//! | Flag | Procedure | Needs key |
//! |------|-----------|-----------|
//! | `select_one` | `SelectOne` | yes |
//! | `lock_one` | `LockOne` | yes |
//! | `update` | `Update` | yes |
//! | `delete_one` | `DeleteOne` | yes |
//! | `insert` | `Insert` | no |
//! | `delete_all` | `DeleteAll` | no |
//! | `select_all` | `SelectAll` | no |

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::{column::Column, error::SchemaError, procedure::Procedure};

/// Standard procedures a table asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Select one row by key.
    pub select_one: bool,

    /// Select one row by key, locking it.
    pub lock_one: bool,

    /// Update one row by key.
    pub update: bool,

    /// Insert one row.
    pub insert: bool,

    /// Delete one row by key.
    pub delete_one: bool,

    /// Delete every row.
    pub delete_all: bool,

    /// Select every row.
    pub select_all: bool
}

impl Capabilities {
    /// Every flag set.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            select_one: true,
            lock_one:   true,
            update:     true,
            insert:     true,
            delete_one: true,
            delete_all: true,
            select_all: true
        }
    }
}

/// Table with its columns, key and procedures.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Table {
    /// Table name, unique within the schema.
    pub name: String,

    /// Columns in declaration order.
    #[serde(default)]
    pub columns: Vec<Column>,

    /// Names of the primary key columns.
    #[serde(default, alias = "primary_key")]
    pub primary_keys: Vec<String>,

    /// Standard procedure flags.
    #[serde(flatten)]
    pub capabilities: Capabilities,

    /// Declared procedures.
    #[serde(default)]
    pub procedures: Vec<Procedure>
}

impl Table {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:         name.into(),
            columns:      Vec::new(),
            primary_keys: Vec::new(),
            capabilities: Capabilities::default(),
            procedures:   Vec::new()
        }
    }

    /// Append a column.
    #[must_use]
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Append a primary key column name.
    #[must_use]
    pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_keys.push(name.into());
        self
    }

    /// Replace the capability flags.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Append a declared procedure.
    #[must_use]
    pub fn with_procedure(mut self, procedure: Procedure) -> Self {
        self.procedures.push(procedure);
        self
    }

    /// Column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary key columns, in column declaration order.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| self.is_primary_key(&c.name))
            .collect()
    }

    /// Columns the standard procedures read and write: every column except
    /// `dbrec` ones, in declaration order.
    pub fn stored_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_record())
    }

    /// True when the named column is part of the primary key.
    #[must_use]
    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_keys.iter().any(|k| k == name)
    }

    /// True when the table has at least one primary key column.
    #[must_use]
    pub fn has_primary_key(&self) -> bool {
        !self.primary_keys.is_empty()
    }

    /// Check table-local invariants.
    ///
    /// Lookup targets are checked by [`Schema`](crate::Schema), which can
    /// see the other tables.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), SchemaError> {
        check_fields(&self.name, &self.columns)?;
        for key in &self.primary_keys {
            if self.column(key).is_none() {
                return Err(SchemaError::UnknownPrimaryKey {
                    table:  self.name.clone(),
                    column: key.clone()
                });
            }
        }
        for proc in &self.procedures {
            let owner = format!("{}.{}", self.name, proc.name);
            check_fields(&owner, &proc.in_fields)?;
            check_fields(&owner, &proc.out_fields)?;
        }
        Ok(())
    }

    /// Every `dbrec` column of the table and its procedures, with its owner.
    pub(crate) fn record_fields(&self) -> impl Iterator<Item = (String, &Column)> {
        let own = self
            .columns
            .iter()
            .map(move |c| (self.name.clone(), c));
        let procs = self.procedures.iter().flat_map(move |p| {
            p.in_fields
                .iter()
                .chain(&p.out_fields)
                .map(move |c| (format!("{}.{}", self.name, p.name), c))
        });
        own.chain(procs).filter(|(_, c)| c.is_record())
    }
}

fn check_fields(owner: &str, fields: &[Column]) -> Result<(), SchemaError> {
    let mut names = BTreeSet::new();
    for field in fields {
        if !names.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateColumn {
                owner:  owner.to_string(),
                column: field.name.clone()
            });
        }
        if field.is_record() && field.lookup.is_none() {
            return Err(SchemaError::MissingLookup {
                owner:  owner.to_string(),
                column: field.name.clone()
            });
        }
        let mut keys = BTreeSet::new();
        for couplet in &field.couplets {
            if !keys.insert(couplet.key.as_str()) {
                return Err(SchemaError::DuplicateCouplet {
                    owner:  owner.to_string(),
                    column: field.name.clone(),
                    key:    couplet.key.clone()
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lookup, TypeTag};

    fn orders() -> Table {
        Table::new("Orders")
            .with_column(Column::new("total", TypeTag::Double))
            .with_column(Column::new("id", TypeTag::Seq64))
            .with_column(Column::new("region", TypeTag::Char))
            .with_primary_key("region")
            .with_primary_key("id")
    }

    #[test]
    fn primary_key_columns_follow_column_order() {
        let table = orders();
        let names: Vec<_> = table
            .primary_key_columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "region"]);
        assert!(table.has_primary_key());
    }

    #[test]
    fn validate_rejects_duplicate_column() {
        let table = orders().with_column(Column::new("id", TypeTag::Int32));
        assert!(matches!(
            table.validate(),
            Err(SchemaError::DuplicateColumn { column, .. }) if column == "id"
        ));
    }

    #[test]
    fn validate_rejects_unknown_key() {
        let table = Table::new("T")
            .with_column(Column::new("a", TypeTag::Int32))
            .with_primary_key("b");
        assert!(matches!(
            table.validate(),
            Err(SchemaError::UnknownPrimaryKey { column, .. }) if column == "b"
        ));
    }

    #[test]
    fn validate_rejects_duplicate_couplet() {
        let table = Table::new("T").with_column(
            Column::new("status", TypeTag::Char)
                .with_couplet("A", "Active")
                .with_couplet("A", "Again")
        );
        assert!(matches!(
            table.validate(),
            Err(SchemaError::DuplicateCouplet { key, .. }) if key == "A"
        ));
    }

    #[test]
    fn validate_rejects_record_without_lookup() {
        let table = Table::new("T").with_column(Column::new("r", TypeTag::DbRec));
        assert!(matches!(
            table.validate(),
            Err(SchemaError::MissingLookup { .. })
        ));
    }

    #[test]
    fn record_fields_cover_table_and_procedures() {
        let table = Table::new("T")
            .with_column(Column::new("a", TypeTag::Int32))
            .with_column(Column::record("parent", Lookup::This))
            .with_procedure(Procedure::new("ByRec").with_in_field(Column::record("r", Lookup::This)));
        let fields: Vec<_> = table
            .record_fields()
            .map(|(o, c)| (o, c.name.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![("T".to_string(), "parent"), ("T.ByRec".to_string(), "r")]
        );
    }

    #[test]
    fn stored_columns_skip_records() {
        let table = orders().with_column(Column::record("parent", Lookup::This));
        let names: Vec<_> = table.stored_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["total", "id", "region"]);
    }

    #[test]
    fn capabilities_flatten_from_yaml() {
        let table: Table = serde_yaml::from_str(
            "name: T\ninsert: true\nselect_all: true\ncolumns:\n  - { name: a, type: int32 }\n"
        )
        .unwrap();
        assert!(table.capabilities.insert);
        assert!(table.capabilities.select_all);
        assert!(!table.capabilities.update);
    }
}
