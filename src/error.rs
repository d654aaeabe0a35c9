// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Error type for generation runs.
//!
//! Every variant is fatal for the target being generated. Recoverable
//! problems (malformed affix masks and similar) are reported through
//! [`Diagnostics`](crate::Diagnostics) instead.

use std::path::PathBuf;

use schemagen_core::SchemaError;
use thiserror::Error;

/// Errors that abort generation of one target.
#[derive(Debug, Error)]
pub enum Error {
    /// Schema invariant violated.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The target has no mapping for a column type.
    #[error("type [{tag}] is not supported by target [{target}]")]
    UnknownType {
        /// Target name.
        target: &'static str,

        /// Column type tag.
        tag: String
    },

    /// Casing option names an unknown casing.
    #[error("case type [{name}] not valid for key [{key}], select one of [{valid}]")]
    InvalidCasing {
        /// Option key (`class`, `member`, `method`, `file`).
        key: String,

        /// Casing as written.
        name: String,

        /// Comma-separated valid casing names.
        valid: String
    },

    /// A `:` bind marker is not followed by an identifier.
    #[error("no bind identifier after ':' at position {position} in sql: {sql}")]
    MissingIdentifier {
        /// Byte offset of the `:`.
        position: usize,

        /// Full SQL text.
        sql: String
    },

    /// A bind identifier matches no input field.
    #[error("bind identifier [{name}] at position {position} matches no input field in sql: {sql}")]
    UnknownIdentifier {
        /// Identifier as written.
        name: String,

        /// Byte offset of the `:`.
        position: usize,

        /// Full SQL text.
        sql: String
    },

    /// A path that must be a directory exists as something else.
    #[error("expected a directory at [{}]", path.display())]
    DirectoryConflict {
        /// Offending path.
        path: PathBuf
    },

    /// Required option missing or unusable.
    #[error("option [{name}] {reason}")]
    InvalidOption {
        /// Option key.
        name: String,

        /// What is wrong with it.
        reason: String
    },

    /// Validation directive value does not fit its column.
    #[error("directive [{directive}] on column [{column}]: {reason}")]
    InvalidDirective {
        /// Column name.
        column: String,

        /// Directive name.
        directive: &'static str,

        /// What is wrong with it.
        reason: String
    },

    /// Procedure has no SQL for the dialect and no `std` fallback.
    #[error("procedure [{table}.{procedure}] has no sql for dialect [{dialect}]")]
    MissingSql {
        /// Table name.
        table: String,

        /// Procedure name.
        procedure: String,

        /// Dialect name.
        dialect: &'static str
    },

    /// A document could not be rendered.
    #[error("cannot render [{item}]: {message}")]
    Render {
        /// Document being rendered.
        item: String,

        /// What went wrong.
        message: String
    },

    /// A generation thread panicked.
    #[error("generation of target [{target}] panicked")]
    Panicked {
        /// Target name.
        target: &'static str
    },

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration document could not be parsed.
    #[error("config parse error: {0}")]
    Config(#[from] serde_yaml::Error)
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
