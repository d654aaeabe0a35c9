// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Identifier policy: casing, affixes, and couplet member names.
//!
//! Every name a generator writes (types, fields, methods, file stems) goes
//! through [`IdentifierPolicy::identifier`], so options such as
//! `casing.member: snake` or `class.dao: "|Dao"` take effect uniformly across
//! targets.
//!
//! ```text
//! "order_line" ──► casing (pascal) ──► "OrderLine"
//!                                         │
//!                     class.dao "|Dao" ───┘──► "OrderLineDao"
//!                                                  │
//!                                      collapse "__" ──► "OrderLineDao"
//! ```

mod casing;
mod policy;

pub use casing::Casing;
pub(crate) use casing::capitalize;
pub use policy::{Category, IdentKind, IdentifierPolicy};

/// Identifier fragment for a couplet label.
///
/// Every non-alphanumeric character becomes `_` and the first character is
/// upper-cased, so `"on hold"` gives `On_hold`.
#[must_use]
pub fn couplet_name(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    capitalize(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn couplet_names() {
        assert_eq!(couplet_name("on hold"), "On_hold");
        assert_eq!(couplet_name("Active"), "Active");
        assert_eq!(couplet_name("n/a"), "N_a");
    }
}
