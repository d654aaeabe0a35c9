// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Validation directives ("DAV") attached to columns.
//!
//! Directives keep their declaration order; generators emit them in that
//! order after the implicit ones derived from the column type.

use std::{fmt, str::FromStr};

use serde::{
    Deserialize, Deserializer,
    de::{self, MapAccess, SeqAccess, Visitor}
};

use crate::error::SchemaError;

/// Directive name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DavKind {
    /// Lower bound (value, length or date).
    Min,
    /// Upper bound.
    Max,
    /// Nullability; `null: false` means the value is required.
    Null,
    /// Regular expression the value must match.
    Regex,
    /// Name of a validation function.
    Func,
    /// Allowed values.
    In,
    /// Forbidden values.
    NotIn
}

impl DavKind {
    /// Directive name as written in a schema document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Null => "null",
            Self::Regex => "regex",
            Self::Func => "func",
            Self::In => "in",
            Self::NotIn => "notin"
        }
    }
}

impl fmt::Display for DavKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DavKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "null" => Ok(Self::Null),
            "regex" => Ok(Self::Regex),
            "func" => Ok(Self::Func),
            "in" => Ok(Self::In),
            "notin" | "not_in" => Ok(Self::NotIn),
            _ => Err(SchemaError::UnknownDirective {
                name: s.to_string()
            })
        }
    }
}

/// Directive argument as written.
#[derive(Debug, Clone, PartialEq)]
pub enum DavValue {
    /// `true` / `false`
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// Text: dates, patterns, function names.
    Text(String),
    /// Value list for `in` / `notin`, each element as text.
    List(Vec<String>)
}

impl DavValue {
    /// Text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None
        }
    }
}

impl<'de> Deserialize<'de> for DavValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DavValueVisitor)
    }
}

struct DavValueVisitor;

impl<'de> Visitor<'de> for DavValueVisitor {
    type Value = DavValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, a list of scalars or a mapping")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<DavValue, E> {
        Ok(DavValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<DavValue, E> {
        Ok(DavValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<DavValue, E> {
        i64::try_from(v)
            .map(DavValue::Int)
            .map_err(|_| E::custom(format!("integer {v} out of range")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<DavValue, E> {
        Ok(DavValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<DavValue, E> {
        Ok(DavValue::Text(v.to_string()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<DavValue, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<crate::ordered::Scalar>()? {
            items.push(item.0);
        }
        Ok(DavValue::List(items))
    }

    // A mapping contributes its keys, matching how couplets feed `in`.
    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<DavValue, A::Error> {
        let mut items = Vec::new();
        while let Some((key, _)) =
            map.next_entry::<crate::ordered::Scalar, de::IgnoredAny>()?
        {
            items.push(key.0);
        }
        Ok(DavValue::List(items))
    }
}

/// Ordered directive map of one column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DavMap {
    entries: Vec<(DavKind, DavValue)>
}

impl DavMap {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directive, replacing an earlier one of the same kind in place.
    #[must_use]
    pub fn with(mut self, kind: DavKind, value: DavValue) -> Self {
        self.insert(kind, value);
        self
    }

    /// Add a directive, replacing an earlier one of the same kind in place.
    pub fn insert(&mut self, kind: DavKind, value: DavValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((kind, value))
        }
    }

    /// Value of a directive.
    #[must_use]
    pub fn get(&self, kind: DavKind) -> Option<&DavValue> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| v)
    }

    /// True when the directive is declared.
    #[must_use]
    pub fn contains(&self, kind: DavKind) -> bool {
        self.get(kind).is_some()
    }

    /// Directives in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (DavKind, &DavValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Number of directives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no directive is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for DavMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DavMapVisitor)
    }
}

struct DavMapVisitor;

impl<'de> Visitor<'de> for DavMapVisitor {
    type Value = DavMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of validation directives")
    }

    fn visit_unit<E: de::Error>(self) -> Result<DavMap, E> {
        Ok(DavMap::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<DavMap, E> {
        Ok(DavMap::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<DavMap, A::Error> {
        let mut dav = DavMap::default();
        while let Some(name) = map.next_key::<String>()? {
            let kind: DavKind = name.parse().map_err(de::Error::custom)?;
            if dav.contains(kind) {
                return Err(de::Error::custom(SchemaError::DuplicateDirective {
                    name
                }));
            }
            let value = map.next_value::<DavValue>()?;
            dav.entries.push((kind, value));
        }
        Ok(dav)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declaration_order() {
        let dav: DavMap = serde_yaml::from_str("max: 10\nmin: 2\nregex: '^[a-z]+$'\n").unwrap();
        let kinds: Vec<_> = dav.iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![DavKind::Max, DavKind::Min, DavKind::Regex]);
    }

    #[test]
    fn parses_value_shapes() {
        let dav: DavMap =
            serde_yaml::from_str("null: false\nmin: 1.5\nin: [a, b]\nnotin: {1: x, 2: y}\n")
                .unwrap();
        assert_eq!(dav.get(DavKind::Null), Some(&DavValue::Bool(false)));
        assert_eq!(dav.get(DavKind::Min), Some(&DavValue::Float(1.5)));
        assert_eq!(
            dav.get(DavKind::In),
            Some(&DavValue::List(vec!["a".into(), "b".into()]))
        );
        assert_eq!(
            dav.get(DavKind::NotIn),
            Some(&DavValue::List(vec!["1".into(), "2".into()]))
        );
    }

    #[test]
    fn rejects_unknown_directive() {
        let err = serde_yaml::from_str::<DavMap>("between: 3\n").unwrap_err();
        assert!(err.to_string().contains("between"));
    }

    #[test]
    fn insert_replaces_in_place() {
        let dav = DavMap::new()
            .with(DavKind::Min, DavValue::Int(1))
            .with(DavKind::Max, DavValue::Int(9))
            .with(DavKind::Min, DavValue::Int(3));
        assert_eq!(dav.len(), 2);
        assert_eq!(dav.iter().next(), Some((DavKind::Min, &DavValue::Int(3))));
    }
}
