// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Schema-wide table registry.
//!
//! The registry is read-only once built. Construction checks every table and
//! every `dbrec` lookup, so generators can resolve lookups without handling
//! dangling names beyond the error path of [`Schema::lookup_table`].

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{
    column::{Column, Lookup},
    error::SchemaError,
    table::Table
};

#[derive(Deserialize)]
struct RawSchema {
    #[serde(default)]
    tables: Vec<Table>
}

/// Validated set of tables keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    tables: BTreeMap<String, Table>
}

impl Schema {
    /// Build a schema from tables, checking every invariant.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateTable`], [`SchemaError::TableNotFound`]
    /// or any error of [`Table::validate`].
    pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> Result<Self, SchemaError> {
        let mut map = BTreeMap::new();
        for table in tables {
            table.validate()?;
            if map.contains_key(&table.name) {
                return Err(SchemaError::DuplicateTable {
                    name: table.name
                });
            }
            map.insert(table.name.clone(), table);
        }
        let schema = Self {
            tables: map
        };
        schema.check_lookups()?;
        Ok(schema)
    }

    /// Parse and validate a YAML (or JSON) schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] for malformed documents, otherwise as
    /// [`Schema::from_tables`].
    pub fn from_yaml(source: &str) -> Result<Self, SchemaError> {
        let raw: RawSchema = serde_yaml::from_str(source)?;
        Self::from_tables(raw.tables)
    }

    /// Table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Tables ordered by name.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when the schema has no tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Resolve a lookup seen while processing `current`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::TableNotFound`] when the named table is absent.
    pub fn lookup_table<'a>(
        &'a self,
        lookup: &Lookup,
        current: &'a Table
    ) -> Result<&'a Table, SchemaError> {
        match lookup {
            Lookup::This => Ok(current),
            Lookup::Table(name) if *name == current.name => Ok(current),
            Lookup::Table(name) => {
                self.tables
                    .get(name)
                    .ok_or_else(|| SchemaError::TableNotFound {
                        owner:  current.name.clone(),
                        column: String::new(),
                        lookup: name.clone()
                    })
            }
        }
    }

    /// Columns of the table a `dbrec` field refers to.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingLookup`] for a field without lookup and
    /// [`SchemaError::TableNotFound`] for a dangling one.
    pub fn record_columns<'a>(
        &'a self,
        field: &Column,
        current: &'a Table
    ) -> Result<&'a [Column], SchemaError> {
        let lookup = field
            .lookup
            .as_ref()
            .ok_or_else(|| SchemaError::MissingLookup {
                owner:  current.name.clone(),
                column: field.name.clone()
            })?;
        self.lookup_table(lookup, current)
            .map(|t| t.columns.as_slice())
            .map_err(|e| match e {
                SchemaError::TableNotFound {
                    owner, lookup, ..
                } => SchemaError::TableNotFound {
                    owner,
                    column: field.name.clone(),
                    lookup
                },
                other => other
            })
    }

    fn check_lookups(&self) -> Result<(), SchemaError> {
        for table in self.tables.values() {
            for (owner, field) in table.record_fields() {
                if let Some(Lookup::Table(name)) = &field.lookup
                    && !self.tables.contains_key(name)
                {
                    return Err(SchemaError::TableNotFound {
                        owner,
                        column: field.name.clone(),
                        lookup: name.clone()
                    });
                }
            }
        }
        Ok(())
    }
}
