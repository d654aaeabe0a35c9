// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Logical name to target identifier.

use std::collections::BTreeMap;

use super::Casing;
use crate::config::{AffixMask, CasingConfig, TargetOptions};

/// Casing category an identifier kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Types.
    Class,
    /// Fields and attributes.
    Member,
    /// Functions and methods.
    Method,
    /// File stems.
    File
}

/// Kind of identifier being produced.
///
/// The kind picks the casing (through its [`Category`]) and the affix mask
/// (through its option key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentKind {
    /// Any other type name.
    Class,
    /// Record field.
    Member,
    /// Method or function.
    Method,
    /// Any other file stem.
    File,
    /// Table record type (`class.table`).
    TableClass,
    /// Procedure input record type (`class.qryin`).
    QryInClass,
    /// Procedure output record type (`class.qryout`).
    QryOutClass,
    /// Couplet lookup type (`class.couplet`).
    CoupletClass,
    /// DAO type (`class.dao`).
    DaoClass,
    /// DAO file stem (`file.dao`).
    DaoFile,
    /// Table record file stem (`file.table`).
    TableFile,
    /// Procedure input record file stem (`file.qryin`).
    QryInFile,
    /// Procedure output record file stem (`file.qryout`).
    QryOutFile
}

impl IdentKind {
    /// Kinds that accept an affix mask, with their option keys.
    pub const AFFIXED: [(Self, &'static str); 9] = [
        (Self::TableClass, "class.table"),
        (Self::QryInClass, "class.qryin"),
        (Self::QryOutClass, "class.qryout"),
        (Self::CoupletClass, "class.couplet"),
        (Self::DaoClass, "class.dao"),
        (Self::DaoFile, "file.dao"),
        (Self::TableFile, "file.table"),
        (Self::QryInFile, "file.qryin"),
        (Self::QryOutFile, "file.qryout")
    ];

    /// Casing category.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Class
            | Self::TableClass
            | Self::QryInClass
            | Self::QryOutClass
            | Self::CoupletClass
            | Self::DaoClass => Category::Class,
            Self::Member => Category::Member,
            Self::Method => Category::Method,
            Self::File | Self::DaoFile | Self::TableFile | Self::QryInFile | Self::QryOutFile => {
                Category::File
            }
        }
    }
}

/// Turns logical names into target identifiers.
///
/// Steps, in order: casing for the kind's category, the kind's affix mask,
/// then every doubled `_` collapsed to one.
#[derive(Debug, Clone, Default)]
pub struct IdentifierPolicy {
    casing: CasingConfig,

    affixes: BTreeMap<IdentKind, AffixMask>
}

impl IdentifierPolicy {
    /// Policy from explicit casing and affixes.
    #[must_use]
    pub fn new(casing: CasingConfig, affixes: BTreeMap<IdentKind, AffixMask>) -> Self {
        Self {
            casing,
            affixes
        }
    }

    /// Policy described by validated target options.
    #[must_use]
    pub fn from_options(options: &TargetOptions) -> Self {
        Self::new(options.casing, options.affixes.clone())
    }

    /// Identifier of `kind` for logical name `raw`.
    #[must_use]
    pub fn identifier(&self, kind: IdentKind, raw: &str) -> String {
        let cased = match self.casing.for_category(kind.category()) {
            Some(casing) => casing.apply(raw),
            None => raw.to_string()
        };
        let wrapped = match self.affixes.get(&kind) {
            Some(mask) => mask.apply(&cased),
            None => cased
        };
        collapse_underscores(wrapped)
    }

    /// Shorthand for [`IdentKind::Member`].
    #[must_use]
    pub fn member(&self, raw: &str) -> String {
        self.identifier(IdentKind::Member, raw)
    }

    /// Shorthand for [`IdentKind::Method`].
    #[must_use]
    pub fn method(&self, raw: &str) -> String {
        self.identifier(IdentKind::Method, raw)
    }

    /// Shorthand for [`IdentKind::Class`].
    #[must_use]
    pub fn class(&self, raw: &str) -> String {
        self.identifier(IdentKind::Class, raw)
    }

    /// Casing configured for a category.
    #[must_use]
    pub fn casing(&self, category: Category) -> Option<Casing> {
        self.casing.for_category(category)
    }
}

fn collapse_underscores(mut name: String) -> String {
    while name.contains("__") {
        name = name.replace("__", "_");
    }
    name
}
