// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Standard procedures derived from table capability flags.
//!
//! # Derived Procedures
//!
//! | Procedure | Input | Output | Needs key |
//! |-----------|-------|--------|-----------|
//! | `LockOne` | key columns (`<T>Key`) | all columns (`<T>`) | yes |
//! | `SelectOne` | key columns (`<T>Key`) | all columns (`<T>`) | yes |
//! | `Update` | all columns (`<T>`) | all columns (`<T>`) | yes |
//! | `Insert` | all columns (`<T>`) | none | no |
//! | `DeleteOne` | key columns (`<T>Key`) | none | yes |
//! | `DeleteAll` | none | none | no |
//! | `SelectAll` | none | all columns (`<T>`) | no |
//!
//! Synthesized procedures bind to the table's own key and main records
//! through `in_override_name` / `out_override_name` instead of getting query
//! records of their own.
//!
//! "All columns" means the stored columns: `dbrec` columns are neither
//! selected, written nor bound by derived procedures, so the SQL text and
//! the bound fields always come from the same column list.

use std::collections::BTreeMap;

use schemagen_core::{Capabilities, Column, Procedure, Table};
use tracing::debug;

use crate::dialect::{Dialect, FragmentContext, SqlFragments, stored_key};

/// Standard procedure kind.
///
/// Declaration order is DAO emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardProc {
    /// Select and lock one row by key.
    LockOne,
    /// Select one row by key.
    SelectOne,
    /// Update one row by key.
    Update,
    /// Insert one row.
    Insert,
    /// Delete one row by key.
    DeleteOne,
    /// Delete every row.
    DeleteAll,
    /// Select every row.
    SelectAll
}

impl StandardProc {
    /// Every kind, in emission order.
    pub const ALL: [Self; 7] = [
        Self::LockOne,
        Self::SelectOne,
        Self::Update,
        Self::Insert,
        Self::DeleteOne,
        Self::DeleteAll,
        Self::SelectAll
    ];

    /// Procedure name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LockOne => "LockOne",
            Self::SelectOne => "SelectOne",
            Self::Update => "Update",
            Self::Insert => "Insert",
            Self::DeleteOne => "DeleteOne",
            Self::DeleteAll => "DeleteAll",
            Self::SelectAll => "SelectAll"
        }
    }

    /// True for kinds that address one row by primary key.
    #[must_use]
    pub const fn needs_key(self) -> bool {
        matches!(
            self,
            Self::LockOne | Self::SelectOne | Self::Update | Self::DeleteOne
        )
    }

    /// True when the kind returns rows.
    #[must_use]
    pub const fn fetches(self) -> bool {
        matches!(self, Self::LockOne | Self::SelectOne | Self::SelectAll)
    }

    const fn enabled(self, caps: &Capabilities) -> bool {
        match self {
            Self::LockOne => caps.lock_one,
            Self::SelectOne => caps.select_one,
            Self::Update => caps.update,
            Self::Insert => caps.insert,
            Self::DeleteOne => caps.delete_one,
            Self::DeleteAll => caps.delete_all,
            Self::SelectAll => caps.select_all
        }
    }

    fn sql(self, fragments: &dyn SqlFragments, ctx: &FragmentContext<'_>) -> String {
        match self {
            Self::LockOne => fragments.lock_one(ctx),
            Self::SelectOne => fragments.select_one(ctx),
            Self::Update => fragments.update(ctx),
            Self::Insert => fragments.insert(ctx),
            Self::DeleteOne => fragments.delete_one(ctx),
            Self::DeleteAll => fragments.delete_all(ctx),
            Self::SelectAll => fragments.select_all(ctx)
        }
    }
}

/// Where synthesized procedures get their SQL.
#[derive(Clone, Copy)]
pub struct SqlSource<'a> {
    /// Dialect the SQL is keyed by.
    pub dialect: Dialect,

    /// Fragment producer.
    pub fragments: &'a dyn SqlFragments,

    /// Table name as written in SQL.
    pub qualified_name: &'a str
}

impl<'a> SqlSource<'a> {
    /// Source using the dialect's own fragments.
    #[must_use]
    pub fn dialect(dialect: &'a Dialect, qualified_name: &'a str) -> Self {
        Self {
            dialect: *dialect,
            fragments: dialect,
            qualified_name
        }
    }
}

/// Synthesized procedures of one table, ordered by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardProcs {
    procs: BTreeMap<StandardProc, Procedure>
}

impl StandardProcs {
    /// Procedure of a kind.
    #[must_use]
    pub fn get(&self, kind: StandardProc) -> Option<&Procedure> {
        self.procs.get(&kind)
    }

    /// True when a kind was synthesized.
    #[must_use]
    pub fn contains(&self, kind: StandardProc) -> bool {
        self.procs.contains_key(&kind)
    }

    /// Procedures in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (StandardProc, &Procedure)> {
        self.procs.iter().map(|(k, p)| (*k, p))
    }

    /// Synthesized kinds in emission order.
    #[must_use]
    pub fn kinds(&self) -> Vec<StandardProc> {
        self.procs.keys().copied().collect()
    }

    /// Number of procedures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.procs.len()
    }

    /// True when nothing was synthesized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }
}

/// Name of a table's key record.
#[must_use]
pub fn key_record_name(table: &str) -> String {
    format!("{table}Key")
}

/// Derive the standard procedures `table` asks for.
///
/// Without `sql` the procedures carry no SQL text, which is enough for
/// record generation.
#[must_use]
pub fn synthesize(table: &Table, sql: Option<SqlSource<'_>>) -> StandardProcs {
    let has_key = table.has_primary_key();
    let ctx = sql.map(|s| FragmentContext::new(table, s.qualified_name));
    let mut procs = BTreeMap::new();

    for kind in StandardProc::ALL {
        if !kind.enabled(&table.capabilities) || (kind.needs_key() && !has_key) {
            continue;
        }
        let mut proc = build(kind, table);
        if let (Some(source), Some(ctx)) = (sql, ctx.as_ref()) {
            proc.sql
                .insert(source.dialect.name().to_string(), kind.sql(source.fragments, ctx));
        }
        debug!(table = %table.name, procedure = kind.name(), "synthesized standard procedure");
        procs.insert(kind, proc);
    }
    StandardProcs {
        procs
    }
}

fn build(kind: StandardProc, table: &Table) -> Procedure {
    let key: Vec<Column> = stored_key(table).into_iter().cloned().collect();
    let all: Vec<Column> = table.stored_columns().cloned().collect();
    let key_name = Some(key_record_name(&table.name));
    let main_name = Some(table.name.clone());

    let mut proc = Procedure::new(kind.name());
    proc.is_standard = true;
    match kind {
        StandardProc::LockOne | StandardProc::SelectOne => {
            proc.in_fields = key;
            proc.out_fields = all;
            proc.in_override_name = key_name;
            proc.out_override_name = main_name;
        }
        StandardProc::Update => {
            proc.in_fields = all.clone();
            proc.out_fields = all;
            proc.in_override_name = main_name.clone();
            proc.out_override_name = main_name;
        }
        StandardProc::Insert => {
            proc.in_fields = all;
            proc.in_override_name = main_name;
        }
        StandardProc::DeleteOne => {
            proc.in_fields = key;
            proc.in_override_name = key_name;
        }
        StandardProc::DeleteAll => {}
        StandardProc::SelectAll => {
            proc.out_fields = all;
            proc.out_override_name = main_name;
        }
    }
    proc
}

#[cfg(test)]
mod tests {
    use schemagen_core::TypeTag;

    use super::*;

    fn orders(caps: Capabilities) -> Table {
        Table::new("Orders")
            .with_column(Column::new("id", TypeTag::Seq64))
            .with_column(Column::new("total", TypeTag::Double))
            .with_column(Column::new("created", TypeTag::Timestamp))
            .with_primary_key("id")
            .with_capabilities(caps)
    }

    #[test]
    fn insert_and_select_one_only() {
        let table = orders(Capabilities {
            insert: true,
            select_one: true,
            ..Capabilities::default()
        });
        let procs = synthesize(&table, None);
        assert_eq!(procs.kinds(), vec![StandardProc::SelectOne, StandardProc::Insert]);

        let insert = procs.get(StandardProc::Insert).unwrap();
        let names: Vec<_> = insert.in_fields.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "total", "created"]);
        assert!(insert.out_fields.is_empty());
        assert!(insert.is_standard);
        assert_eq!(insert.in_override_name.as_deref(), Some("Orders"));

        let select = procs.get(StandardProc::SelectOne).unwrap();
        assert_eq!(select.in_fields.len(), 1);
        assert_eq!(select.in_fields[0].name, "id");
        assert_eq!(select.out_fields.len(), 3);
        assert_eq!(select.in_override_name.as_deref(), Some("OrdersKey"));
        assert_eq!(select.out_override_name.as_deref(), Some("Orders"));
    }

    #[test]
    fn keyless_table_skips_row_procedures() {
        let mut table = orders(Capabilities::all());
        table.primary_keys.clear();
        let procs = synthesize(&table, None);
        assert_eq!(
            procs.kinds(),
            vec![StandardProc::Insert, StandardProc::DeleteAll, StandardProc::SelectAll]
        );
    }

    #[test]
    fn all_flags_in_emission_order() {
        let procs = synthesize(&orders(Capabilities::all()), None);
        assert_eq!(procs.kinds(), StandardProc::ALL.to_vec());
        let delete_all = procs.get(StandardProc::DeleteAll).unwrap();
        assert!(delete_all.in_fields.is_empty() && delete_all.out_fields.is_empty());
    }

    #[test]
    fn sql_keyed_by_dialect() {
        let table = orders(Capabilities {
            delete_one: true,
            ..Capabilities::default()
        });
        let dialect = Dialect::Mssql;
        let procs = synthesize(&table, Some(SqlSource::dialect(&dialect, "dbo.orders")));
        let proc = procs.get(StandardProc::DeleteOne).unwrap();
        assert_eq!(
            proc.sql_for("mssql"),
            Some("delete from dbo.orders\nwhere\n  id = :id")
        );
        assert_eq!(proc.sql_for("postgres"), None);
    }

    #[test]
    fn no_flags_no_procedures() {
        assert!(synthesize(&orders(Capabilities::default()), None).is_empty());
    }
}
