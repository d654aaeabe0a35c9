// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `prefix|suffix` masks.

use crate::diagnostics::Diagnostics;

/// Prefix and suffix wrapped around an identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffixMask {
    prefix: String,

    suffix: String
}

impl AffixMask {
    /// Mask from its parts.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into()
        }
    }

    /// Parse `value` given for `option`.
    ///
    /// Blank values mean no mask. A value that is not exactly one
    /// `prefix|suffix` pair is reported to `diagnostics` and ignored.
    pub fn parse(option: &str, value: &str, diagnostics: &mut Diagnostics) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match value.split_once('|') {
            Some((prefix, suffix)) if !suffix.contains('|') => Some(Self::new(prefix, suffix)),
            _ => {
                diagnostics.warn(
                    option,
                    format!(
                        "prefix/suffix option [{option}] value [{value}] is not in \"prefix|suffix\" format, ignoring it"
                    )
                );
                None
            }
        }
    }

    /// Wrap `name`.
    #[must_use]
    pub fn apply(&self, name: &str) -> String {
        format!("{}{}{}", self.prefix, name, self.suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pair() {
        let mut diag = Diagnostics::default();
        let mask = AffixMask::parse("class.dao", "|Dao", &mut diag).unwrap();
        assert_eq!(mask.apply("Orders"), "OrdersDao");
        assert!(diag.is_empty());
    }

    #[test]
    fn blank_is_silent() {
        let mut diag = Diagnostics::default();
        assert!(AffixMask::parse("class.dao", "  ", &mut diag).is_none());
        assert!(diag.is_empty());
    }

    #[test]
    fn malformed_warns() {
        let mut diag = Diagnostics::default();
        assert!(AffixMask::parse("class.dao", "Dao", &mut diag).is_none());
        assert!(AffixMask::parse("class.dao", "a|b|c", &mut diag).is_none());
        assert_eq!(diag.len(), 2);
        assert_eq!(diag.iter().next().unwrap().subject, "class.dao");
    }
}
