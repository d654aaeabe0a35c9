// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Schema model for schemagen.
//!
//! This crate holds the data every generator consumes: tables, their columns
//! and primary keys, enumerated value sets (couplets), validation directives
//! and the SQL procedures declared over each table. It performs no code
//! generation itself.
//!
//! # Overview
//!
//! - [`Schema`]: Registry of tables keyed by name, validated on construction
//! - [`Table`]: Columns, primary key, capability flags, declared procedures
//! - [`Column`]: Name, [`TypeTag`], length, nullability, couplets, directives
//! - [`Procedure`]: Input/output fields plus SQL text per dialect
//! - [`DavMap`]: Ordered validation directives attached to a column
//!
//! # Loading
//!
//! ```rust,ignore
//! use schemagen_core::prelude::*;
//!
//! let schema = Schema::from_yaml(r#"
//! tables:
//!   - name: Orders
//!     primary_keys: [id]
//!     insert: true
//!     select_one: true
//!     columns:
//!       - { name: id, type: seq64 }
//!       - { name: total, type: double }
//!       - { name: created, type: timestamp }
//! "#)?;
//!
//! assert!(schema.table("Orders").is_some());
//! ```
//!
//! Cross-table references (`dbrec` columns) name their target table; they
//! are resolved through [`Schema::lookup_table`] and never stored as
//! pointers.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod column;
mod dav;
mod error;
mod ordered;
mod procedure;
mod schema;
mod table;

pub mod prelude;

pub use column::{Column, Couplet, Lookup, TypeTag};
pub use dav::{DavKind, DavMap, DavValue};
pub use error::SchemaError;
pub use procedure::Procedure;
pub use schema::Schema;
pub use table::{Capabilities, Table};
