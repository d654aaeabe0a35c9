// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generation driver and the target seam.
//!
//! A [`Generator`] knows how to render one language. Everything else (which
//! artifacts exist, their names, field types, bound SQL and validation
//! rules) is decided here and handed to the generator as plain
//! descriptions from [`model`].
//!
//! # Run Phases
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!   Idle ──► Tables ──► Daos(dialect, flavour) ──► ... ──► Idle
//!            │           │
//!            │           ├─ DAO shell
//!            │           ├─ LockOne .. SelectAll
//!            │           └─ declared procedures
//!            ├─ key record
//!            ├─ main record
//!            └─ query records
//! ```
//!
//! Every table goes through `Tables` before any DAO phase starts. In
//! [`Mode::Clean`] the same walk yields [`Cleanup`]s instead of documents.
//!
//! # Targets
//!
//! | Kind | Extension | DAOs | Index |
//! |------|-----------|------|-------|
//! | `python3` | `py` | yes | `__init__.py` |
//! | `rust` | `rs` | yes | `mod.rs` |
//! | `typescript` | `ts` | no | `index.ts` |

mod context;
mod document;
pub mod model;
mod output;
mod registry;
mod run;

pub use context::{DaoContext, GenerationContext};
pub use document::{Cleanup, Document, Manifest, ManifestEntry};
pub use output::write_outcome;
pub use registry::{Target, TargetKind, generate_all};
pub use run::{GenerationRun, Mode, Outcome, Phase};

use crate::{
    config::{CasingConfig, TargetOptions},
    dav::LiteralStyle,
    error::{Error, Result},
    types::TypeCatalog
};
use model::{DaoShellSpec, ProcedureSpec, RecordSpec};

/// One output language.
///
/// Implementations are stateless after construction and shared between
/// threads.
pub trait Generator: Send + Sync {
    /// Target name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Extension of generated files, without the dot.
    fn extension(&self) -> &'static str;

    /// Column type mapping.
    fn catalog(&self) -> &TypeCatalog;

    /// How validation literals are written.
    fn literal_style(&self) -> &dyn LiteralStyle;

    /// Casing applied when the configuration names none.
    fn default_casing(&self) -> CasingConfig;

    /// False for targets that only emit records.
    fn generates_dao(&self) -> bool {
        true
    }

    /// Render a record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] when the output cannot be produced.
    fn emit_record(&self, ctx: &GenerationContext<'_>, spec: &RecordSpec<'_>) -> Result<String>;

    /// Render the per-table DAO.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`]; the default does so unconditionally.
    fn emit_dao_shell(&self, ctx: &DaoContext<'_>, spec: &DaoShellSpec<'_>) -> Result<String> {
        let _ = ctx;
        Err(no_dao(self.name(), &spec.class_name))
    }

    /// Render one procedure DAO.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`]; the default does so unconditionally.
    fn emit_procedure(&self, ctx: &DaoContext<'_>, spec: &ProcedureSpec<'_>) -> Result<String> {
        let _ = ctx;
        Err(no_dao(self.name(), &spec.class_name))
    }

    /// Index documents for the files of a finished run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] when an index cannot be produced.
    fn emit_index(&self, options: &TargetOptions, manifest: &Manifest) -> Result<Vec<Document>> {
        let _ = (options, manifest);
        Ok(Vec::new())
    }
}

fn no_dao(target: &str, item: &str) -> Error {
    Error::Render {
        item:    item.to_string(),
        message: format!("target {target} does not generate DAOs")
    }
}
