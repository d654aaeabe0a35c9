// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Database dialects.
//!
//! This module defines [`Dialect`], which controls the placeholder syntax the
//! SQL binder writes and how sequence columns are filled on insert. Default
//! SQL text for standard procedures comes from the [`SqlFragments`]
//! implementation of each dialect.
//!
//! # Supported Databases
//!
//! | Dialect | Placeholder | Sequences | Row lock |
//! |---------|-------------|-----------|----------|
//! | PostgreSQL | `$1, $2, ...` | fetched before insert | `for update nowait` |
//! | SQL Server | `@name` | read back after insert | `with (updlock, rowlock)` |
//! | SQLite | `?1, ?2, ...` | read back after insert | none |

mod fragments;

use std::{fmt, str::FromStr};

pub use fragments::{FragmentContext, SqlFragments};
pub(crate) use fragments::stored_key;
use serde::{Deserialize, Deserializer, de};

use crate::error::{Error, Result};

/// Database dialect for generated SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Dialect {
    /// PostgreSQL.
    ///
    /// - Placeholders: `$1, $2, $3, ...`
    /// - Sequences: `nextval` before insert
    #[default]
    Postgres,

    /// Microsoft SQL Server.
    ///
    /// - Placeholders: `@name`
    /// - Sequences: identity read back after insert
    Mssql,

    /// SQLite.
    ///
    /// - Placeholders: `?1, ?2, ?3, ...`
    /// - Sequences: rowid read back after insert
    Sqlite
}

/// When a sequence column gets its value relative to the insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMode {
    /// The DAO fetches the next value and binds it.
    PreInsert,

    /// The database assigns the value; the DAO reads it back and the column
    /// is left out of the insert.
    PostInsert
}

impl Dialect {
    /// Every dialect.
    pub const ALL: [Self; 3] = [Self::Postgres, Self::Mssql, Self::Sqlite];

    /// Dialect name, also the key of per-dialect procedure SQL.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mssql => "mssql",
            Self::Sqlite => "sqlite"
        }
    }

    /// Placeholder for the input field at `index` (0-based) named `name`.
    #[must_use]
    pub fn placeholder(self, index: usize, name: &str) -> String {
        match self {
            Self::Postgres => format!("${}", index + 1),
            Self::Mssql => format!("@{}", name.replace('.', "_")),
            Self::Sqlite => format!("?{}", index + 1)
        }
    }

    /// How sequence columns are filled.
    #[must_use]
    pub const fn sequence_mode(self) -> SequenceMode {
        match self {
            Self::Postgres => SequenceMode::PreInsert,
            Self::Mssql | Self::Sqlite => SequenceMode::PostInsert
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mssql" | "sqlserver" => Ok(Self::Mssql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(Error::InvalidOption {
                name:   "databases".to_string(),
                reason: format!("names unknown dialect [{value}]")
            })
        }
    }
}

impl<'de> Deserialize<'de> for Dialect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_placeholders() {
        let d = Dialect::Postgres;
        assert_eq!(d.placeholder(0, "id"), "$1");
        assert_eq!(d.placeholder(9, "id"), "$10");
    }

    #[test]
    fn mssql_placeholders_are_named() {
        assert_eq!(Dialect::Mssql.placeholder(3, "cust_id"), "@cust_id");
        assert_eq!(Dialect::Mssql.placeholder(0, "a.b"), "@a_b");
    }

    #[test]
    fn sqlite_placeholders() {
        assert_eq!(Dialect::Sqlite.placeholder(1, "x"), "?2");
    }

    #[test]
    fn from_str_aliases() {
        assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("pg".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("sqlserver".parse::<Dialect>().unwrap(), Dialect::Mssql);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn sequence_modes() {
        assert_eq!(Dialect::Postgres.sequence_mode(), SequenceMode::PreInsert);
        assert_eq!(Dialect::Sqlite.sequence_mode(), SequenceMode::PostInsert);
    }

    #[test]
    fn default_is_postgres() {
        assert_eq!(Dialect::default(), Dialect::Postgres);
    }
}
