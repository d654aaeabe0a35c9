// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Configuration as written, before validation.

use std::path::PathBuf;

use serde::Deserialize;

use crate::{dialect::Dialect, generator::TargetKind, naming::IdentKind};

/// Whole configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawGenerationConfig {
    /// Dialects DAOs are generated for.
    #[serde(default)]
    pub databases: Vec<Dialect>,

    /// Targets to generate.
    #[serde(default)]
    pub targets: Vec<RawTargetEntry>
}

/// One target as written.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTargetEntry {
    /// Target language.
    pub target: TargetKind,

    /// Disabled targets are skipped.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    /// Output root, relative paths resolve against the caller's root.
    #[serde(default)]
    pub dest: PathBuf,

    /// Target options.
    #[serde(default)]
    pub options: RawTargetOptions
}

fn enabled_by_default() -> bool {
    true
}

/// Target options with their dotted keys.
///
/// Field names mirror the keys (`class.dao` is `class_dao`).
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawTargetOptions {
    #[serde(rename = "class.table")]
    pub class_table: Option<String>,

    #[serde(rename = "class.qryin")]
    pub class_qryin: Option<String>,

    #[serde(rename = "class.qryout")]
    pub class_qryout: Option<String>,

    #[serde(rename = "class.couplet")]
    pub class_couplet: Option<String>,

    #[serde(rename = "class.dao")]
    pub class_dao: Option<String>,

    #[serde(rename = "file.table")]
    pub file_table: Option<String>,

    #[serde(rename = "file.qryin")]
    pub file_qryin: Option<String>,

    #[serde(rename = "file.qryout")]
    pub file_qryout: Option<String>,

    #[serde(rename = "file.dao")]
    pub file_dao: Option<String>,

    #[serde(rename = "dir.tables")]
    pub dir_tables: Option<String>,

    #[serde(rename = "dir.dao")]
    pub dir_dao: Option<String>,

    pub namespace: Option<String>,

    #[serde(rename = "db.schema")]
    pub db_schema: Option<String>,

    pub casing: RawCasing,

    pub standard: RawFlavour,

    #[serde(rename = "async")]
    pub asynchronous: RawFlavour
}

impl RawTargetOptions {
    /// Affix mask as written for an affixed identifier kind.
    #[must_use]
    pub fn affix(&self, kind: IdentKind) -> Option<&str> {
        let value = match kind {
            IdentKind::TableClass => &self.class_table,
            IdentKind::QryInClass => &self.class_qryin,
            IdentKind::QryOutClass => &self.class_qryout,
            IdentKind::CoupletClass => &self.class_couplet,
            IdentKind::DaoClass => &self.class_dao,
            IdentKind::DaoFile => &self.file_dao,
            IdentKind::TableFile => &self.file_table,
            IdentKind::QryInFile => &self.file_qryin,
            IdentKind::QryOutFile => &self.file_qryout,
            IdentKind::Class | IdentKind::Member | IdentKind::Method | IdentKind::File => {
                return None;
            }
        };
        value.as_deref()
    }
}

/// `casing.*` options, one casing name per category.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawCasing {
    pub class: Option<String>,

    pub member: Option<String>,

    pub method: Option<String>,

    pub file: Option<String>
}

/// `standard.*` and `async.*` options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawFlavour {
    /// Generate DAOs of this flavour.
    pub enabled: Option<bool>,

    /// Output root for this flavour, relative to the target dest.
    pub dir: Option<String>,

    /// Affix mask applied to the DAO directory name.
    #[serde(rename = "ns.dao")]
    pub ns_dao: Option<String>
}
