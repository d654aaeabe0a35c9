// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Schema invariant violations.

use thiserror::Error;

/// Errors raised while loading or validating a [`Schema`](crate::Schema).
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Column type tag outside the closed set.
    #[error("unknown column type [{tag}]")]
    UnknownType {
        /// Tag as written.
        tag: String
    },

    /// Validation directive name outside the known set.
    #[error("unknown validation directive [{name}]")]
    UnknownDirective {
        /// Directive as written.
        name: String
    },

    /// Validation directive declared twice on one column.
    #[error("duplicate validation directive [{name}]")]
    DuplicateDirective {
        /// Directive name.
        name: String
    },

    /// Malformed `lookup` value.
    #[error("invalid lookup [{value}]")]
    InvalidLookup {
        /// Lookup as written.
        value: String
    },

    /// Two tables share a name.
    #[error("duplicate table [{name}]")]
    DuplicateTable {
        /// Table name.
        name: String
    },

    /// Two columns (or two fields of one procedure side) share a name.
    #[error("duplicate column [{column}] in [{owner}]")]
    DuplicateColumn {
        /// Table or `table.procedure` owning the columns.
        owner: String,
        /// Column name.
        column: String
    },

    /// Primary key names a column the table does not have.
    #[error("primary key column [{column}] not found in table [{table}]")]
    UnknownPrimaryKey {
        /// Table name.
        table: String,
        /// Missing column.
        column: String
    },

    /// `dbrec` column without a lookup.
    #[error("dbrec column [{column}] in [{owner}] has no lookup")]
    MissingLookup {
        /// Table or `table.procedure` owning the column.
        owner: String,
        /// Column name.
        column: String
    },

    /// Lookup names a table the schema does not contain.
    #[error("table lookup [{lookup}] not found, source [{owner}.{column}]")]
    TableNotFound {
        /// Table or `table.procedure` owning the column.
        owner: String,
        /// Column name.
        column: String,
        /// Referenced table.
        lookup: String
    },

    /// Couplet key repeated within one column.
    #[error("duplicate couplet key [{key}] on [{owner}.{column}]")]
    DuplicateCouplet {
        /// Table owning the column.
        owner: String,
        /// Column name.
        column: String,
        /// Repeated key.
        key: String
    },

    /// Document could not be parsed.
    #[error("schema parse error: {0}")]
    Parse(#[from] serde_yaml::Error)
}
