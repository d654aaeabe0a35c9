// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Schema-driven code generator.
//!
//! schemagen reads a [`schemagen_core::Schema`] and emits, per target
//! language, data records with field validation, couplet lookup types and
//! data access objects whose SQL is bound to positional or named parameters
//! for each database dialect.
//!
//! # Overview
//!
//! - [`TypeCatalog`]: schema type tags mapped to target types
//! - [`IdentifierPolicy`]: casing and affixes for generated names
//! - [`procs::synthesize`]: standard procedures derived from a table
//! - [`DavCompiler`]: column directives compiled into validation rules
//! - [`SqlParamBinder`]: `:name` and `[name]` markers rewritten per dialect
//! - [`Generator`]: the trait every target implements
//! - [`Target`] and [`generate_all`]: the concurrent driver
//!
//! # Running
//!
//! ```rust,ignore
//! use std::path::Path;
//!
//! use schemagen::prelude::*;
//!
//! let schema = Schema::from_yaml(&std::fs::read_to_string("schema.yaml")?)?;
//! let config = GenerationConfig::from_yaml(&std::fs::read_to_string("gen.yaml")?)?;
//!
//! let targets = config
//!     .enabled_targets()
//!     .map(Target::from_entry)
//!     .collect::<Result<Vec<_>>>()?;
//!
//! for outcome in generate_all(&targets, &schema, &config.databases, Mode::Emit) {
//!     write_outcome(Path::new("."), &outcome?)?;
//! }
//! ```
//!
//! # Layout
//!
//! ```text
//! <dest>/
//! ├── tables/             records, key records, query records
//! │   └── <index file>
//! └── dao/<dialect>/      one file per procedure plus the table shell
//!     └── <index file>
//! ```
//!
//! Output carries no timestamps; generating twice writes identical files.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binder;
pub mod config;
pub mod dav;
pub mod diagnostics;
pub mod dialect;
pub mod error;
pub mod generator;
pub mod naming;
pub mod prelude;
pub mod procs;
pub mod targets;
pub mod types;

pub use binder::SqlParamBinder;
pub use config::{GenerationConfig, TargetEntry, TargetOptions};
pub use dav::DavCompiler;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use generator::{Generator, Mode, Outcome, Target, TargetKind, generate_all, write_outcome};
pub use naming::IdentifierPolicy;
pub use schemagen_core;
pub use types::TypeCatalog;
