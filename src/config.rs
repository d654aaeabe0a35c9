// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generation configuration.
//!
//! Configuration is read once from YAML (or JSON) into the `Raw*` types and
//! validated into [`TargetOptions`] when a target is built. Nothing
//! downstream looks at raw option strings.
//!
//! # Document Shape
//!
//! ```yaml
//! databases: [postgres, mssql]
//! targets:
//!   - target: python3
//!     dest: gen/py
//!     options:
//!       namespace: bs.orders
//!       class.dao: "|Dao"
//!       dir.tables: tables
//!       dir.dao: dao
//!       db.schema: sales
//!       casing: { member: snake }
//!       async: { enabled: true, ns.dao: "|_async" }
//! ```
//!
//! # Target Options
//!
//! | Key | Default | Meaning |
//! |-----|---------|---------|
//! | `class.table`, `class.qryin`, `class.qryout`, `class.couplet`, `class.dao` | none | `prefix\|suffix` for type names |
//! | `file.table`, `file.qryin`, `file.qryout`, `file.dao` | none | `prefix\|suffix` for file stems |
//! | `dir.tables` | `tables` | Record directory |
//! | `dir.dao` | `dao` | DAO directory, one subdirectory per dialect |
//! | `namespace` | blank | Package/module path of the output |
//! | `db.schema` | blank | Qualifies table names in generated SQL |
//! | `casing.{class,member,method,file}` | per target | Casing names |
//! | `standard.enabled` | `true` | Generate blocking DAOs |
//! | `async.enabled` | `false` | Generate async DAOs |
//! | `{standard,async}.dir` | blank | Extra output root for the flavour |
//! | `{standard,async}.ns.dao` | none | `prefix\|suffix` for the DAO directory |

mod affix;
mod raw;

use std::{collections::BTreeMap, fmt, path::PathBuf};

pub use affix::AffixMask;
pub use raw::{RawCasing, RawFlavour, RawGenerationConfig, RawTargetEntry, RawTargetOptions};

use crate::{
    dialect::Dialect,
    diagnostics::Diagnostics,
    error::{Error, Result},
    generator::TargetKind,
    naming::{Casing, Category, IdentKind}
};

/// Casing per identifier category; `None` leaves names untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CasingConfig {
    /// Type names.
    pub class: Option<Casing>,

    /// Fields.
    pub member: Option<Casing>,

    /// Methods and functions.
    pub method: Option<Casing>,

    /// File stems.
    pub file: Option<Casing>
}

impl CasingConfig {
    /// Same casing for every category.
    #[must_use]
    pub const fn new(class: Casing, member: Casing, method: Casing, file: Casing) -> Self {
        Self {
            class:  Some(class),
            member: Some(member),
            method: Some(method),
            file:   Some(file)
        }
    }

    /// Casing of a category.
    #[must_use]
    pub const fn for_category(&self, category: Category) -> Option<Casing> {
        match category {
            Category::Class => self.class,
            Category::Member => self.member,
            Category::Method => self.method,
            Category::File => self.file
        }
    }

    /// Override with the raw options that are set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCasing`] for an unknown casing name.
    pub fn merge(mut self, raw: &RawCasing) -> Result<Self> {
        let slots = [
            ("class", &raw.class, &mut self.class),
            ("member", &raw.member, &mut self.member),
            ("method", &raw.method, &mut self.method),
            ("file", &raw.file, &mut self.file)
        ];
        for (key, value, slot) in slots {
            if let Some(name) = value.as_deref()
                && !name.trim().is_empty()
            {
                *slot = Some(Casing::parse(key, name)?);
            }
        }
        Ok(self)
    }
}

/// DAO flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flavour {
    /// Blocking methods.
    Standard,
    /// `async` methods.
    Async
}

impl Flavour {
    /// Option prefix (`standard`, `async`).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Async => "async"
        }
    }
}

impl fmt::Display for Flavour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Validated `standard.*` / `async.*` options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlavourOptions {
    /// Generate DAOs of this flavour.
    pub enabled: bool,

    /// Extra output root, relative to the target dest.
    pub dir: Option<PathBuf>,

    /// Mask applied to the DAO directory name.
    pub dao_mask: Option<AffixMask>
}

impl FlavourOptions {
    fn from_raw(
        flavour: Flavour,
        raw: &RawFlavour,
        enabled_default: bool,
        diagnostics: &mut Diagnostics
    ) -> Self {
        let mask_key = format!("{}.ns.dao", flavour.key());
        Self {
            enabled:  raw.enabled.unwrap_or(enabled_default),
            dir:      non_blank(raw.dir.as_deref()).map(PathBuf::from),
            dao_mask: raw
                .ns_dao
                .as_deref()
                .and_then(|v| AffixMask::parse(&mask_key, v, diagnostics))
        }
    }
}

/// Validated options of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOptions {
    /// Casing per category, target defaults overridden by the user.
    pub casing: CasingConfig,

    /// Affix masks per identifier kind.
    pub affixes: BTreeMap<IdentKind, AffixMask>,

    /// Record directory name.
    pub dir_tables: String,

    /// DAO directory name, before flavour masks.
    pub dir_dao: String,

    /// Package path of the output; may be blank.
    pub namespace: String,

    /// Schema qualifying table names in SQL.
    pub db_schema: Option<String>,

    /// Blocking DAO options.
    pub standard: FlavourOptions,

    /// Async DAO options.
    pub asynchronous: FlavourOptions
}

impl TargetOptions {
    /// Default directory for records.
    pub const DEFAULT_DIR_TABLES: &'static str = "tables";

    /// Default directory for DAOs.
    pub const DEFAULT_DIR_DAO: &'static str = "dao";

    /// Validate raw options over the target's casing defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCasing`] for unknown casings and
    /// [`Error::InvalidOption`] for blank directories or colliding DAO
    /// directories. Malformed affix masks are reported to `diagnostics`.
    pub fn from_raw(
        raw: &RawTargetOptions,
        casing_defaults: CasingConfig,
        diagnostics: &mut Diagnostics
    ) -> Result<Self> {
        let casing = casing_defaults.merge(&raw.casing)?;

        let mut affixes = BTreeMap::new();
        for (kind, key) in IdentKind::AFFIXED {
            if let Some(value) = raw.affix(kind)
                && let Some(mask) = AffixMask::parse(key, value, diagnostics)
            {
                affixes.insert(kind, mask);
            }
        }

        let options = Self {
            casing,
            affixes,
            dir_tables: required_dir("dir.tables", raw.dir_tables.as_deref(), Self::DEFAULT_DIR_TABLES)?,
            dir_dao: required_dir("dir.dao", raw.dir_dao.as_deref(), Self::DEFAULT_DIR_DAO)?,
            namespace: raw
                .namespace
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            db_schema: non_blank(raw.db_schema.as_deref()).map(str::to_string),
            standard: FlavourOptions::from_raw(Flavour::Standard, &raw.standard, true, diagnostics),
            asynchronous: FlavourOptions::from_raw(
                Flavour::Async,
                &raw.asynchronous,
                false,
                diagnostics
            )
        };

        if options.standard.enabled
            && options.asynchronous.enabled
            && options.dao_dir(Flavour::Standard) == options.dao_dir(Flavour::Async)
        {
            return Err(Error::InvalidOption {
                name:   "async".to_string(),
                reason: "writes async DAOs over the standard ones, set async.dir or async.ns.dao"
                    .to_string()
            });
        }
        Ok(options)
    }

    /// Options of a flavour.
    #[must_use]
    pub fn flavour(&self, flavour: Flavour) -> &FlavourOptions {
        match flavour {
            Flavour::Standard => &self.standard,
            Flavour::Async => &self.asynchronous
        }
    }

    /// Enabled flavours, standard first.
    #[must_use]
    pub fn flavours(&self) -> Vec<Flavour> {
        [Flavour::Standard, Flavour::Async]
            .into_iter()
            .filter(|f| self.flavour(*f).enabled)
            .collect()
    }

    /// DAO directory of a flavour, relative to the target dest.
    #[must_use]
    pub fn dao_dir(&self, flavour: Flavour) -> PathBuf {
        let opts = self.flavour(flavour);
        let name = match &opts.dao_mask {
            Some(mask) => mask.apply(&self.dir_dao),
            None => self.dir_dao.clone()
        };
        match &opts.dir {
            Some(root) => root.join(name),
            None => PathBuf::from(name)
        }
    }

    /// Table name as written in SQL, schema-qualified when configured.
    #[must_use]
    pub fn qualified_table(&self, table: &str) -> String {
        match &self.db_schema {
            Some(schema) => format!("{schema}.{table}"),
            None => table.to_string()
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required_dir(key: &str, value: Option<&str>, default: &str) -> Result<String> {
    match value {
        None => Ok(default.to_string()),
        Some(v) => non_blank(Some(v))
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidOption {
                name:   key.to_string(),
                reason: "must not be blank".to_string()
            })
    }
}

/// One configured target.
#[derive(Debug, Clone)]
pub struct TargetEntry {
    /// Target language.
    pub kind: TargetKind,

    /// Disabled entries are skipped by [`GenerationConfig::enabled_targets`].
    pub enabled: bool,

    /// Output root.
    pub dest: PathBuf,

    /// Options, validated when the target is built.
    pub options: RawTargetOptions
}

/// Parsed configuration document.
#[derive(Debug, Clone, Default)]
pub struct GenerationConfig {
    /// Dialects DAOs are generated for, duplicates removed.
    pub databases: Vec<Dialect>,

    /// Targets in document order.
    pub targets: Vec<TargetEntry>
}

impl GenerationConfig {
    /// Parse a YAML (or JSON) configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the document does not parse.
    pub fn from_yaml(source: &str) -> Result<Self> {
        let raw: RawGenerationConfig = serde_yaml::from_str(source)?;
        Ok(Self::from(raw))
    }

    /// Targets with `enabled: true`.
    pub fn enabled_targets(&self) -> impl Iterator<Item = &TargetEntry> {
        self.targets.iter().filter(|t| t.enabled)
    }
}

impl From<RawGenerationConfig> for GenerationConfig {
    fn from(raw: RawGenerationConfig) -> Self {
        let mut databases = Vec::new();
        for db in raw.databases {
            if !databases.contains(&db) {
                databases.push(db);
            }
        }
        Self {
            databases,
            targets: raw
                .targets
                .into_iter()
                .map(|t| TargetEntry {
                    kind:    t.target,
                    enabled: t.enabled,
                    dest:    t.dest,
                    options: t.options
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> CasingConfig {
        CasingConfig::new(Casing::Pascal, Casing::Camel, Casing::Camel, Casing::Pascal)
    }

    fn options(yaml: &str) -> Result<(TargetOptions, Diagnostics)> {
        let raw: RawTargetOptions = serde_yaml::from_str(yaml)?;
        let mut diag = Diagnostics::default();
        let opts = TargetOptions::from_raw(&raw, defaults(), &mut diag)?;
        Ok((opts, diag))
    }

    #[test]
    fn defaults_apply() {
        let (opts, diag) = options("{}").unwrap();
        assert_eq!(opts.dir_tables, "tables");
        assert_eq!(opts.dir_dao, "dao");
        assert_eq!(opts.namespace, "");
        assert_eq!(opts.db_schema, None);
        assert!(opts.standard.enabled);
        assert!(!opts.asynchronous.enabled);
        assert_eq!(opts.casing.member, Some(Casing::Camel));
        assert!(diag.is_empty());
    }

    #[test]
    fn user_casing_overrides_defaults() {
        let (opts, _) = options("casing: { member: snake }").unwrap();
        assert_eq!(opts.casing.member, Some(Casing::Snake));
        assert_eq!(opts.casing.class, Some(Casing::Pascal));
    }

    #[test]
    fn invalid_casing_is_fatal() {
        let err = options("casing: { class: shouty }").unwrap_err();
        assert!(matches!(err, Error::InvalidCasing { key, .. } if key == "class"));
    }

    #[test]
    fn malformed_affix_degrades_with_warning() {
        let (opts, diag) = options("class.dao: Dao\nclass.table: \"|Rec\"").unwrap();
        assert!(!opts.affixes.contains_key(&IdentKind::DaoClass));
        assert_eq!(opts.affixes[&IdentKind::TableClass].apply("Orders"), "OrdersRec");
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn blank_dir_is_fatal() {
        let err = options("dir.dao: ' '").unwrap_err();
        assert!(matches!(err, Error::InvalidOption { name, .. } if name == "dir.dao"));
    }

    #[test]
    fn blank_schema_means_unqualified() {
        let (opts, _) = options("db.schema: ''").unwrap();
        assert_eq!(opts.qualified_table("orders"), "orders");
        let (opts, _) = options("db.schema: sales").unwrap();
        assert_eq!(opts.qualified_table("orders"), "sales.orders");
    }

    #[test]
    fn async_dir_uses_mask() {
        let (opts, _) = options("async: { enabled: true, ns.dao: \"|_async\" }").unwrap();
        assert_eq!(opts.dao_dir(Flavour::Standard), PathBuf::from("dao"));
        assert_eq!(opts.dao_dir(Flavour::Async), PathBuf::from("dao_async"));
        assert_eq!(opts.flavours(), vec![Flavour::Standard, Flavour::Async]);
    }

    #[test]
    fn async_collision_is_fatal() {
        let err = options("async: { enabled: true }").unwrap_err();
        assert!(matches!(err, Error::InvalidOption { name, .. } if name == "async"));
    }

    #[test]
    fn unknown_option_is_rejected() {
        assert!(options("dir.tabels: x").is_err());
    }

    #[test]
    fn parses_document() {
        let config = GenerationConfig::from_yaml(
            "databases: [postgres, mssql, postgres]\ntargets:\n  - target: python3\n    dest: out/py\n  - target: typescript\n    enabled: false\n"
        )
        .unwrap();
        assert_eq!(config.databases, vec![Dialect::Postgres, Dialect::Mssql]);
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.enabled_targets().count(), 1);
        assert_eq!(config.targets[0].dest, PathBuf::from("out/py"));
    }
}
