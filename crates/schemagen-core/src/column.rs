// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Column definitions.
//!
//! A [`Column`] is the unit every generator walks: table columns, procedure
//! input fields and procedure output fields all share this shape.
//!
//! # Type Tags
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `bool` | Boolean |
//! | `int8` .. `int64` | Signed integers |
//! | `seq32`, `seq64` | Integers filled from a database sequence |
//! | `char` | Single character |
//! | `string` | Text, optionally bounded by `length` |
//! | `date`, `time`, `datetime` | Calendar values |
//! | `timestamp` | Date-time stamped by the DAO on insert/update |
//! | `memblock` | Raw bytes |
//! | `uuid`, `json`, `double` | As named |
//! | `dynamic` | Text substituted into SQL, never bound |
//! | `dbrec` | Nested record of another table (see [`Lookup`]) |

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, de};

use crate::{dav::DavMap, error::SchemaError, ordered};

/// Closed set of column type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    /// `bool`
    Bool,
    /// `int8`
    Int8,
    /// `int16`
    Int16,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `seq32`
    Seq32,
    /// `seq64`
    Seq64,
    /// `char`
    Char,
    /// `string`
    String,
    /// `date`
    Date,
    /// `time`
    Time,
    /// `datetime`
    DateTime,
    /// `timestamp`
    Timestamp,
    /// `memblock`
    Memblock,
    /// `uuid`
    Uuid,
    /// `json`
    Json,
    /// `double`
    Double,
    /// `dynamic`
    Dynamic,
    /// `dbrec`
    DbRec
}

impl TypeTag {
    /// Every tag, in declaration order.
    pub const ALL: [Self; 19] = [
        Self::Bool,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Seq32,
        Self::Seq64,
        Self::Char,
        Self::String,
        Self::Date,
        Self::Time,
        Self::DateTime,
        Self::Timestamp,
        Self::Memblock,
        Self::Uuid,
        Self::Json,
        Self::Double,
        Self::Dynamic,
        Self::DbRec
    ];

    /// Tag as written in a schema document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Seq32 => "seq32",
            Self::Seq64 => "seq64",
            Self::Char => "char",
            Self::String => "string",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Memblock => "memblock",
            Self::Uuid => "uuid",
            Self::Json => "json",
            Self::Double => "double",
            Self::Dynamic => "dynamic",
            Self::DbRec => "dbrec"
        }
    }

    /// `seq32` or `seq64`.
    #[must_use]
    pub const fn is_sequence(self) -> bool {
        matches!(self, Self::Seq32 | Self::Seq64)
    }

    /// Any integer-shaped tag, sequences included.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 | Self::Seq32 | Self::Seq64
        )
    }

    /// `date`, `time`, `datetime` or `timestamp`.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::DateTime | Self::Timestamp
        )
    }

    /// `char`, `string` or `dynamic`.
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::Char | Self::String | Self::Dynamic)
    }

    /// `double`.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Double)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownType {
                tag: s.to_string()
            })
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Target of a `dbrec` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lookup {
    /// The table that owns the column (or procedure).
    This,

    /// Another table, by name.
    Table(String)
}

impl Lookup {
    /// Table name this lookup resolves to, given the owning table.
    #[must_use]
    pub fn table_name<'a>(&'a self, current: &'a str) -> &'a str {
        match self {
            Self::This => current,
            Self::Table(name) => name
        }
    }
}

impl FromStr for Lookup {
    type Err = SchemaError;

    /// Accepts `this`, `Name`, `table:this`, `table:Name` and
    /// `table:Name.column`; the column part is informational only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SchemaError::InvalidLookup {
            value: s.to_string()
        };
        let body = s.trim();
        let body = body.strip_prefix("table:").unwrap_or(body);
        let name = body.split('.').next().unwrap_or_default().trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(invalid());
        }
        if name == "this" {
            Ok(Self::This)
        } else {
            Ok(Self::Table(name.to_string()))
        }
    }
}

impl<'de> Deserialize<'de> for Lookup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// One enumerated value of a column: stored key and display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Couplet {
    /// Stored value.
    pub key: String,

    /// Display label, also the source of generated member names.
    pub label: String
}

impl Couplet {
    /// Create a couplet.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key:   key.into(),
            label: label.into()
        }
    }
}

/// Column of a table, or field of a procedure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Column {
    /// Column name, unique within its owner.
    pub name: String,

    /// Type tag.
    #[serde(rename = "type")]
    pub type_tag: TypeTag,

    /// Maximum length for `string` columns.
    #[serde(default)]
    pub length: Option<u32>,

    /// Nullability. `None` means the schema did not say.
    #[serde(default, rename = "notnull", alias = "not_null")]
    pub not_null: Option<bool>,

    /// Enumerated values, in declaration order.
    #[serde(default, deserialize_with = "ordered::couplets")]
    pub couplets: Vec<Couplet>,

    /// Validation directives, in declaration order.
    #[serde(default)]
    pub dav: DavMap,

    /// Target table of a `dbrec` column.
    #[serde(default)]
    pub lookup: Option<Lookup>
}

impl Column {
    /// Create a column with no length, nullability, couplets or directives.
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            type_tag,
            length: None,
            not_null: None,
            couplets: Vec::new(),
            dav: DavMap::default(),
            lookup: None
        }
    }

    /// Create a `dbrec` column looking up `lookup`.
    pub fn record(name: impl Into<String>, lookup: Lookup) -> Self {
        Self {
            lookup: Some(lookup),
            ..Self::new(name, TypeTag::DbRec)
        }
    }

    /// Set the maximum length.
    #[must_use]
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Set nullability.
    #[must_use]
    pub fn with_not_null(mut self, not_null: bool) -> Self {
        self.not_null = Some(not_null);
        self
    }

    /// Append a couplet.
    #[must_use]
    pub fn with_couplet(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.couplets.push(Couplet::new(key, label));
        self
    }

    /// Replace the validation directives.
    #[must_use]
    pub fn with_dav(mut self, dav: DavMap) -> Self {
        self.dav = dav;
        self
    }

    /// True for `dbrec` columns.
    #[must_use]
    pub fn is_record(&self) -> bool {
        self.type_tag == TypeTag::DbRec
    }

    /// True when the column declares enumerated values.
    #[must_use]
    pub fn has_couplets(&self) -> bool {
        !self.couplets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_parses_every_name() {
        for tag in TypeTag::ALL {
            assert_eq!(tag.as_str().parse::<TypeTag>().unwrap(), tag);
        }
    }

    #[test]
    fn type_tag_rejects_unknown() {
        let err = "varchar".parse::<TypeTag>().unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { tag } if tag == "varchar"));
    }

    #[test]
    fn type_tag_groups() {
        assert!(TypeTag::Seq32.is_sequence());
        assert!(TypeTag::Seq64.is_integer());
        assert!(!TypeTag::Double.is_integer());
        assert!(TypeTag::Timestamp.is_temporal());
        assert!(TypeTag::Char.is_textual());
        assert!(TypeTag::Double.is_float());
    }

    #[test]
    fn lookup_forms() {
        assert_eq!("this".parse::<Lookup>().unwrap(), Lookup::This);
        assert_eq!("table:this".parse::<Lookup>().unwrap(), Lookup::This);
        assert_eq!(
            "table:Customer".parse::<Lookup>().unwrap(),
            Lookup::Table("Customer".into())
        );
        assert_eq!(
            "table:Customer.id".parse::<Lookup>().unwrap(),
            Lookup::Table("Customer".into())
        );
        assert_eq!(
            "Customer".parse::<Lookup>().unwrap(),
            Lookup::Table("Customer".into())
        );
    }

    #[test]
    fn lookup_rejects_blank() {
        assert!("".parse::<Lookup>().is_err());
        assert!("table:".parse::<Lookup>().is_err());
        assert!("table:two words".parse::<Lookup>().is_err());
    }

    #[test]
    fn lookup_table_name_uses_current_for_this() {
        assert_eq!(Lookup::This.table_name("Orders"), "Orders");
        assert_eq!(Lookup::Table("Items".into()).table_name("Orders"), "Items");
    }

    #[test]
    fn column_from_yaml() {
        let col: Column = serde_yaml::from_str(
            "name: status\ntype: char\nnotnull: true\ncouplets:\n  A: Active\n  X: Closed\n"
        )
        .unwrap();
        assert_eq!(col.type_tag, TypeTag::Char);
        assert_eq!(col.not_null, Some(true));
        assert_eq!(
            col.couplets,
            vec![Couplet::new("A", "Active"), Couplet::new("X", "Closed")]
        );
    }

    #[test]
    fn column_numeric_couplet_keys() {
        let col: Column =
            serde_yaml::from_str("name: level\ntype: int32\ncouplets:\n  1: Low\n  2: High\n")
                .unwrap();
        assert_eq!(col.couplets[0].key, "1");
        assert_eq!(col.couplets[1].label, "High");
    }

    #[test]
    fn column_builder() {
        let col = Column::new("name", TypeTag::String)
            .with_length(40)
            .with_not_null(true);
        assert_eq!(col.length, Some(40));
        assert!(!col.is_record());
        assert!(Column::record("cust", Lookup::This).is_record());
    }
}
