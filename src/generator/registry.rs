// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Compile-time target registry and the concurrent driver.

use std::{fmt, path::PathBuf, str::FromStr, thread};

use schemagen_core::Schema;
use serde::{Deserialize, Deserializer};
use tracing::{error, info};

use super::{
    Generator,
    run::{GenerationRun, Mode, Outcome}
};
use crate::{
    config::{RawTargetOptions, TargetEntry, TargetOptions},
    diagnostics::Diagnostics,
    dialect::Dialect,
    error::{Error, Result},
    naming::IdentifierPolicy,
    targets::{PythonGenerator, RustGenerator, TypeScriptGenerator}
};

/// Bundled target languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Python 3 records and DAOs.
    Python3,
    /// Rust records and sqlx DAOs.
    Rust,
    /// TypeScript records.
    TypeScript
}

impl TargetKind {
    /// Every kind.
    pub const ALL: [Self; 3] = [Self::Python3, Self::Rust, Self::TypeScript];

    /// Canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Python3 => "python3",
            Self::Rust => "rust",
            Self::TypeScript => "typescript"
        }
    }

    /// Generator of this kind.
    #[must_use]
    pub fn generator(self) -> Box<dyn Generator> {
        match self {
            Self::Python3 => Box::new(PythonGenerator::new()),
            Self::Rust => Box::new(RustGenerator::new()),
            Self::TypeScript => Box::new(TypeScriptGenerator::new())
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "python3" | "py3" | "python" => Ok(Self::Python3),
            "rust" | "rs" => Ok(Self::Rust),
            "typescript" | "ts" => Ok(Self::TypeScript),
            other => Err(Error::InvalidOption {
                name:   "target".to_string(),
                reason: format!(
                    "unknown target [{other}], select one of [{}]",
                    Self::ALL.map(Self::name).join(", ")
                )
            })
        }
    }
}

impl<'de> Deserialize<'de> for TargetKind {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A target ready to generate: validated options and its generator.
pub struct Target {
    kind: TargetKind,

    dest: PathBuf,

    options: TargetOptions,

    policy: IdentifierPolicy,

    generator: Box<dyn Generator>,

    diagnostics: Diagnostics
}

impl Target {
    /// Build a target from raw options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCasing`] or [`Error::InvalidOption`].
    pub fn new(kind: TargetKind, dest: impl Into<PathBuf>, raw: &RawTargetOptions) -> Result<Self> {
        let generator = kind.generator();
        let mut diagnostics = Diagnostics::default();
        let options = TargetOptions::from_raw(raw, generator.default_casing(), &mut diagnostics)?;
        Ok(Self {
            kind,
            dest: dest.into(),
            policy: IdentifierPolicy::from_options(&options),
            options,
            generator,
            diagnostics
        })
    }

    /// Build a target from a configuration entry.
    ///
    /// # Errors
    ///
    /// As [`Target::new`].
    pub fn from_entry(entry: &TargetEntry) -> Result<Self> {
        Self::new(entry.kind, entry.dest.clone(), &entry.options)
    }

    /// Target kind.
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Output root.
    #[must_use]
    pub fn dest(&self) -> &PathBuf {
        &self.dest
    }

    /// Validated options.
    #[must_use]
    pub const fn options(&self) -> &TargetOptions {
        &self.options
    }

    /// Identifier policy built from the options.
    #[must_use]
    pub const fn policy(&self) -> &IdentifierPolicy {
        &self.policy
    }

    /// Findings of option validation.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Run this target over `schema`.
    ///
    /// # Errors
    ///
    /// Returns the first error met; the target produces nothing then.
    pub fn generate(&self, schema: &Schema, databases: &[Dialect], mode: Mode) -> Result<Outcome> {
        let mut run = GenerationRun::new(self.generator.as_ref(), &self.options, &self.policy, mode);
        run.generate(schema, databases)?;
        Ok(run.finish(self.dest.clone(), self.diagnostics.clone()))
    }

    /// Append index documents built from the outcome's manifest.
    ///
    /// Does nothing for clean runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] when an index cannot be rendered.
    pub fn finalize(&self, outcome: &mut Outcome) -> Result<()> {
        if outcome.mode == Mode::Clean {
            return Ok(());
        }
        let indexes = self.generator.emit_index(&self.options, &outcome.manifest)?;
        for doc in indexes {
            info!(
                target_name = self.generator.name(),
                path = %doc.relative_path().display(),
                "generated index"
            );
            outcome.documents.push(doc);
        }
        Ok(())
    }
}

/// Run every target concurrently, then finalize each finished run.
///
/// Results are in target order. A failing or panicking target does not
/// affect the others.
#[must_use]
pub fn generate_all(targets: &[Target], schema: &Schema, databases: &[Dialect], mode: Mode) -> Vec<Result<Outcome>> {
    let joined: Vec<Result<Outcome>> = thread::scope(|scope| {
        let handles: Vec<_> = targets
            .iter()
            .map(|target| {
                let handle = scope.spawn(move || target.generate(schema, databases, mode));
                (target, handle)
            })
            .collect();
        handles
            .into_iter()
            .map(|(target, handle)| {
                handle.join().unwrap_or_else(|_| {
                    Err(Error::Panicked {
                        target: target.kind.name()
                    })
                })
            })
            .collect()
    });

    targets
        .iter()
        .zip(joined)
        .map(|(target, result)| {
            let mut outcome = result?;
            target.finalize(&mut outcome)?;
            Ok(outcome)
        })
        .inspect(|result| {
            if let Err(e) = result {
                error!(error = %e, "target failed");
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_aliases() {
        assert_eq!("py3".parse::<TargetKind>().unwrap(), TargetKind::Python3);
        assert_eq!("Rust".parse::<TargetKind>().unwrap(), TargetKind::Rust);
        assert_eq!("ts".parse::<TargetKind>().unwrap(), TargetKind::TypeScript);
        let err = "cobol".parse::<TargetKind>().unwrap_err();
        assert!(err.to_string().contains("python3, rust, typescript"));
    }

    #[test]
    fn defaults_follow_target() {
        let raw = RawTargetOptions::default();
        let py = Target::new(TargetKind::Python3, "out", &raw).unwrap();
        assert_eq!(py.policy().member("order_id"), "orderId");
        let rs = Target::new(TargetKind::Rust, "out", &raw).unwrap();
        assert_eq!(rs.policy().member("orderId"), "order_id");
    }

    #[test]
    fn bad_casing_fails_the_target() {
        let raw: RawTargetOptions = serde_yaml::from_str("casing: { class: wobbly }").unwrap();
        assert!(matches!(
            Target::new(TargetKind::Python3, "out", &raw),
            Err(Error::InvalidCasing { .. })
        ));
    }
}
