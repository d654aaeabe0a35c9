// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Column type tags to target language types.
//!
//! Each target builds one [`TypeCatalog`] at construction. Generators ask it
//! for the type name and default literal of every field they write; a tag
//! the target does not map aborts generation with
//! [`Error::UnknownType`].
//!
//! ```text
//! TypeTag::Int32 ──► TypeCatalog (python3) ──► FieldMap { "int", Int, "0" }
//! ```

use std::collections::BTreeMap;

use schemagen_core::TypeTag;

use crate::error::{Error, Result};

/// Coarse classification of a target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFlag {
    /// Boolean.
    Bool,
    /// Integer, sequences included.
    Int,
    /// Text.
    Str,
    /// Date, time or date-time.
    Date,
    /// UUID.
    Uuid,
    /// Raw bytes.
    Memblock,
    /// Floating point.
    Double,
    /// JSON document.
    Json,
    /// Nested record.
    DbRec
}

/// Target type of one column type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    /// Target type name.
    pub name: String,

    /// Coarse classification.
    pub type_flag: TypeFlag,

    /// Default value literal in the target language.
    pub default_value: String
}

impl FieldMap {
    /// Create a mapping.
    pub fn new(name: impl Into<String>, type_flag: TypeFlag, default_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_flag,
            default_value: default_value.into()
        }
    }
}

/// Per-target mapping from column type tags to [`FieldMap`]s.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    target: &'static str,

    entries: BTreeMap<TypeTag, FieldMap>
}

impl TypeCatalog {
    /// Empty catalog for `target`.
    #[must_use]
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            entries: BTreeMap::new()
        }
    }

    /// Add (or replace) the mapping of `tag`.
    #[must_use]
    pub fn with(mut self, tag: TypeTag, map: FieldMap) -> Self {
        self.entries.insert(tag, map);
        self
    }

    /// Target this catalog belongs to.
    #[must_use]
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Mapping of `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] when the target does not map `tag`.
    pub fn resolve(&self, tag: TypeTag) -> Result<&FieldMap> {
        self.entries.get(&tag).ok_or_else(|| Error::UnknownType {
            target: self.target,
            tag:    tag.as_str().to_string()
        })
    }

    /// Mapping of a textual tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] when `tag` is not a known tag or the
    /// target does not map it.
    pub fn resolve_name(&self, tag: &str) -> Result<&FieldMap> {
        let parsed: TypeTag = tag.parse().map_err(|_| Error::UnknownType {
            target: self.target,
            tag:    tag.to_string()
        })?;
        self.resolve(parsed)
    }

    /// True when `tag` is mapped.
    #[must_use]
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.entries.contains_key(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TypeCatalog {
        TypeCatalog::new("test")
            .with(TypeTag::Int32, FieldMap::new("int", TypeFlag::Int, "0"))
            .with(TypeTag::String, FieldMap::new("str", TypeFlag::Str, "''"))
    }

    #[test]
    fn resolves_mapped_tag() {
        let c = catalog();
        assert_eq!(c.resolve(TypeTag::Int32).unwrap().name, "int");
        assert_eq!(c.resolve_name("string").unwrap().default_value, "''");
    }

    #[test]
    fn unmapped_tag_is_unknown_type() {
        let err = catalog().resolve(TypeTag::Uuid).unwrap_err();
        assert!(matches!(err, Error::UnknownType { target: "test", tag } if tag == "uuid"));
    }

    #[test]
    fn unparsable_name_is_unknown_type() {
        let err = catalog().resolve_name("money").unwrap_err();
        assert!(matches!(err, Error::UnknownType { tag, .. } if tag == "money"));
    }
}
