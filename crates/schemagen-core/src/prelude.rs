// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use schemagen_core::prelude::*;
//! ```

pub use crate::{
    Capabilities, Column, Couplet, DavKind, DavMap, DavValue, Lookup, Procedure, Schema,
    SchemaError, Table, TypeTag
};
