// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Non-fatal findings collected during configuration and generation.

use tracing::warn;

/// One recoverable problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Option or item the finding is about.
    pub subject: String,

    /// Human readable message.
    pub message: String
}

/// Ordered list of recoverable problems, returned with each run outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>
}

impl Diagnostics {
    /// Record a warning and log it.
    pub fn warn(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        let entry = Diagnostic {
            subject: subject.into(),
            message: message.into()
        };
        warn!(subject = %entry.subject, "{}", entry.message);
        self.entries.push(entry);
    }

    /// Append every entry of `other`.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Entries in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
