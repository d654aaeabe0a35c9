// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Default SQL text for standard procedures.
//!
//! Fragments use `:name` bind tokens like declared procedures do, so they pass
//! through the same binder before reaching generated code.
//!
//! | Procedure | Shape |
//! |-----------|-------|
//! | `SelectOne` | `select <cols> from <t> where <key> = :<key>` |
//! | `LockOne` | `SelectOne` plus the dialect's row lock |
//! | `Update` | `update <t> set <non-key> = :<non-key> where <key> = :<key>` |
//! | `Insert` | `insert into <t> (<cols>) values (:<cols>)` |
//! | `DeleteOne` | `delete from <t> where <key> = :<key>` |
//! | `DeleteAll` | `delete from <t>` |
//! | `SelectAll` | `select <cols> from <t>` |

use schemagen_core::{Column, Table};

use super::{Dialect, SequenceMode};

/// What a fragment needs to know about the table.
#[derive(Debug, Clone, Copy)]
pub struct FragmentContext<'a> {
    /// Table the procedure works on.
    pub table: &'a Table,

    /// Table name as written in SQL (schema-qualified when configured).
    pub qualified_name: &'a str
}

impl<'a> FragmentContext<'a> {
    /// Context for `table` written as `qualified_name`.
    #[must_use]
    pub fn new(table: &'a Table, qualified_name: &'a str) -> Self {
        Self {
            table,
            qualified_name
        }
    }

    fn columns(&self) -> impl Iterator<Item = &'a Column> {
        self.table.stored_columns()
    }

    fn key_columns(&self) -> Vec<&'a Column> {
        stored_key(self.table)
    }

    fn non_key_columns(&self) -> Vec<&'a Column> {
        self.columns()
            .filter(|c| !self.table.is_primary_key(&c.name))
            .collect()
    }
}

/// Producer of standard procedure SQL for one dialect.
pub trait SqlFragments {
    /// Select one row by primary key.
    fn select_one(&self, ctx: &FragmentContext<'_>) -> String {
        format!(
            "select\n{}\nfrom\n  {}\nwhere\n{}",
            column_list(ctx.columns()),
            ctx.qualified_name,
            key_condition(&ctx.key_columns())
        )
    }

    /// Select one row by primary key, locking it.
    fn lock_one(&self, ctx: &FragmentContext<'_>) -> String;

    /// Update one row by primary key.
    fn update(&self, ctx: &FragmentContext<'_>) -> String {
        let mut set = ctx.non_key_columns();
        if set.is_empty() {
            set = ctx.key_columns();
        }
        let assignments = set
            .iter()
            .map(|c| format!("  {} = :{}", c.name, c.name))
            .collect::<Vec<_>>()
            .join(",\n");
        format!(
            "update {} set\n{}\nwhere\n{}",
            ctx.qualified_name,
            assignments,
            key_condition(&ctx.key_columns())
        )
    }

    /// Insert one row.
    fn insert(&self, ctx: &FragmentContext<'_>) -> String;

    /// Delete one row by primary key.
    fn delete_one(&self, ctx: &FragmentContext<'_>) -> String {
        format!(
            "delete from {}\nwhere\n{}",
            ctx.qualified_name,
            key_condition(&ctx.key_columns())
        )
    }

    /// Delete every row.
    fn delete_all(&self, ctx: &FragmentContext<'_>) -> String {
        format!("delete from {}", ctx.qualified_name)
    }

    /// Select every row.
    fn select_all(&self, ctx: &FragmentContext<'_>) -> String {
        format!(
            "select\n{}\nfrom\n  {}",
            column_list(ctx.columns()),
            ctx.qualified_name
        )
    }
}

impl SqlFragments for Dialect {
    fn lock_one(&self, ctx: &FragmentContext<'_>) -> String {
        match self {
            Self::Postgres => format!("{}\nfor update nowait", self.select_one(ctx)),
            Self::Mssql => format!(
                "select\n{}\nfrom\n  {} with (updlock, rowlock)\nwhere\n{}",
                column_list(ctx.columns()),
                ctx.qualified_name,
                key_condition(&ctx.key_columns())
            ),
            Self::Sqlite => self.select_one(ctx)
        }
    }

    fn insert(&self, ctx: &FragmentContext<'_>) -> String {
        let skip_sequences = self.sequence_mode() == SequenceMode::PostInsert;
        let cols: Vec<&Column> = ctx
            .columns()
            .filter(|c| !(skip_sequences && c.type_tag.is_sequence()))
            .collect();
        let names = cols
            .iter()
            .map(|c| format!("  {}", c.name))
            .collect::<Vec<_>>()
            .join(",\n");
        let binds = cols
            .iter()
            .map(|c| format!("  :{}", c.name))
            .collect::<Vec<_>>()
            .join(",\n");
        format!(
            "insert into {} (\n{}\n) values (\n{}\n)",
            ctx.qualified_name, names, binds
        )
    }
}

/// Primary key columns the standard procedures bind: `dbrec` key columns
/// are left out as they are everywhere else.
pub(crate) fn stored_key(table: &Table) -> Vec<&Column> {
    table
        .primary_key_columns()
        .into_iter()
        .filter(|c| !c.is_record())
        .collect()
}

/// One column per line, indented.
fn column_list<'a>(columns: impl Iterator<Item = &'a Column>) -> String {
    columns
        .map(|c| format!("  {}", c.name))
        .collect::<Vec<_>>()
        .join(",\n")
}

/// `key = :key` conditions joined with `and`.
fn key_condition(keys: &[&Column]) -> String {
    keys.iter()
        .map(|c| format!("  {} = :{}", c.name, c.name))
        .collect::<Vec<_>>()
        .join("\n  and\n")
}

#[cfg(test)]
mod tests {
    use schemagen_core::TypeTag;

    use super::*;

    fn orders() -> Table {
        Table::new("orders")
            .with_column(Column::new("id", TypeTag::Seq64))
            .with_column(Column::new("total", TypeTag::Double))
            .with_column(Column::new("created", TypeTag::Timestamp))
            .with_primary_key("id")
    }

    #[test]
    fn select_one_filters_by_key() {
        let table = orders();
        let ctx = FragmentContext::new(&table, "sales.orders");
        let sql = Dialect::Postgres.select_one(&ctx);
        assert!(sql.contains("from\n  sales.orders"));
        assert!(sql.ends_with("where\n  id = :id"));
        assert!(sql.contains("  total,\n"));
    }

    #[test]
    fn lock_one_per_dialect() {
        let table = orders();
        let ctx = FragmentContext::new(&table, "orders");
        assert!(Dialect::Postgres.lock_one(&ctx).ends_with("for update nowait"));
        assert!(Dialect::Mssql.lock_one(&ctx).contains("with (updlock, rowlock)"));
        assert_eq!(Dialect::Sqlite.lock_one(&ctx), Dialect::Sqlite.select_one(&ctx));
    }

    #[test]
    fn insert_skips_sequences_when_post_insert() {
        let table = orders();
        let ctx = FragmentContext::new(&table, "orders");
        assert!(Dialect::Postgres.insert(&ctx).contains(":id"));
        assert!(!Dialect::Mssql.insert(&ctx).contains(":id"));
        assert!(Dialect::Mssql.insert(&ctx).contains(":total"));
    }

    #[test]
    fn update_sets_non_key_columns() {
        let table = orders();
        let ctx = FragmentContext::new(&table, "orders");
        let sql = Dialect::Postgres.update(&ctx);
        assert!(sql.contains("total = :total"));
        assert!(!sql.contains("  id = :id,"));
        assert!(sql.ends_with("where\n  id = :id"));
    }

    #[test]
    fn composite_key_joins_with_and() {
        let table = Table::new("t")
            .with_column(Column::new("a", TypeTag::Int32))
            .with_column(Column::new("b", TypeTag::Int32))
            .with_primary_key("a")
            .with_primary_key("b");
        let ctx = FragmentContext::new(&table, "t");
        assert_eq!(
            Dialect::Postgres.delete_one(&ctx),
            "delete from t\nwhere\n  a = :a\n  and\n  b = :b"
        );
        assert_eq!(Dialect::Postgres.delete_all(&ctx), "delete from t");
    }
}
