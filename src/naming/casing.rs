// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Named casing conventions.

use convert_case::{Case, Casing as _};

use crate::error::{Error, Result};

/// Casing applied to a logical name before affixes.
///
/// | Name | `order_line` becomes |
/// |------|----------------------|
/// | `pascal` | `OrderLine` |
/// | `camel` | `orderLine` |
/// | `snake` | `order_line` |
/// | `const` | `ORDER_LINE` |
/// | `spinal` / `kebab` | `order-line` |
/// | `train` | `Order-Line` |
/// | `cobol` | `ORDER-LINE` |
/// | `title` | `Order Line` |
/// | `flat` | `orderline` |
/// | `dot` | `order.line` |
/// | `path` | `order/line` |
/// | `capital` | `Order_line` |
/// | `lower` / `upper` | `order_line` / `ORDER_LINE` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Casing {
    /// `OrderLine`
    Pascal,
    /// `orderLine`
    Camel,
    /// `order_line`
    Snake,
    /// `ORDER_LINE`
    Constant,
    /// `order-line`
    Kebab,
    /// `Order-Line`
    Train,
    /// `ORDER-LINE`
    Cobol,
    /// `Order Line`
    Title,
    /// `orderline`
    Flat,
    /// `order.line`
    Dot,
    /// `order/line`
    Path,
    /// First character upper-cased, rest untouched.
    Capital,
    /// Lower-cased, separators untouched.
    Lower,
    /// Upper-cased, separators untouched.
    Upper
}

const NAMES: &[(&str, Casing)] = &[
    ("pascal", Casing::Pascal),
    ("camel", Casing::Camel),
    ("snake", Casing::Snake),
    ("const", Casing::Constant),
    ("spinal", Casing::Kebab),
    ("kebab", Casing::Kebab),
    ("train", Casing::Train),
    ("cobol", Casing::Cobol),
    ("title", Casing::Title),
    ("flat", Casing::Flat),
    ("dot", Casing::Dot),
    ("path", Casing::Path),
    ("capital", Casing::Capital),
    ("lower", Casing::Lower),
    ("upper", Casing::Upper)
];

impl Casing {
    /// Parse a casing name given for option `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCasing`] listing every accepted name.
    pub fn parse(key: &str, name: &str) -> Result<Self> {
        let wanted = name.trim().to_lowercase();
        NAMES
            .iter()
            .find(|(n, _)| *n == wanted)
            .map(|(_, c)| *c)
            .ok_or_else(|| Error::InvalidCasing {
                key:   key.to_string(),
                name:  name.to_string(),
                valid: NAMES
                    .iter()
                    .map(|(n, _)| *n)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
    }

    /// Apply the casing.
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Pascal => name.to_case(Case::Pascal),
            Self::Camel => name.to_case(Case::Camel),
            Self::Snake => name.to_case(Case::Snake),
            Self::Constant => name.to_case(Case::Snake).to_uppercase(),
            Self::Kebab => name.to_case(Case::Kebab),
            Self::Train => name.to_case(Case::Train),
            Self::Cobol => name.to_case(Case::Kebab).to_uppercase(),
            Self::Title => name.to_case(Case::Title),
            Self::Flat => name.to_case(Case::Flat),
            Self::Dot => name.to_case(Case::Snake).replace('_', "."),
            Self::Path => name.to_case(Case::Snake).replace('_', "/"),
            Self::Capital => capitalize(name),
            Self::Lower => name.to_lowercase(),
            Self::Upper => name.to_uppercase()
        }
    }
}

/// Upper-case the first character, leaving the rest as is.
pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new()
    }
}
