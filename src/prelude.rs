// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use schemagen::prelude::*;
//! ```

pub use schemagen_core::prelude::*;

pub use crate::{
    Dialect, Error, GenerationConfig, Mode, Outcome, Result, Target, TargetKind, generate_all,
    write_outcome
};
