// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Bundled target languages.
//!
//! | Target | Records | DAOs | Rendering |
//! |--------|---------|------|-----------|
//! | [`PythonGenerator`] | `ISerializable` classes | statement classes | text |
//! | [`RustGenerator`] | structs with `validate` | sqlx query builders | `quote` |
//! | [`TypeScriptGenerator`] | interfaces and classes | none | text |
//!
//! Generated files start with a fixed header and carry no timestamps, so
//! running a target twice produces identical output.

mod python;
mod rust;
mod typescript;

pub use python::PythonGenerator;
pub use rust::RustGenerator;
pub use typescript::TypeScriptGenerator;

/// Header line written at the top of every generated file.
pub(crate) const HEADER: &str = "Generated by schemagen. Do not edit.";

/// Indented line writer for text templates.
#[derive(Debug, Default)]
pub(crate) struct Code {
    out: String,

    depth: usize,

    unit: &'static str
}

impl Code {
    /// Writer indenting with `unit` per level.
    pub(crate) fn new(unit: &'static str) -> Self {
        Self {
            out: String::new(),
            depth: 0,
            unit
        }
    }

    /// Write one line at the current depth.
    pub(crate) fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(self.unit);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
        self
    }

    /// Write an empty line.
    pub(crate) fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    /// Write lines one level deeper.
    pub(crate) fn indented(&mut self, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.depth += 1;
        body(self);
        self.depth -= 1;
        self
    }

    /// Finished text with exactly one trailing newline.
    pub(crate) fn finish(self) -> String {
        let mut out = self.out.trim_end().to_string();
        out.push('\n');
        out
    }
}
