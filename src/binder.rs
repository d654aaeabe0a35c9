// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Named bind parameter rewriting.
//!
//! Procedure SQL names its parameters as `:name`. [`SqlParamBinder`] scans the
//! text once, left to right, and hands every bind token to a substitution
//! callback together with the 0-based index of the input field it resolves
//! to. Tokens inside comments and string literals are copied untouched.
//!
//! # Scanner States
//!
//! ```text
//!            "--"                      "\n"
//!   Normal ───────► LineComment ─────────────► Normal
//!     │    "/*"                        "*/"
//!     ├───────────► BlockComment ────────────► Normal
//!     │   ' or "                 same quote
//!     ├───────────► StringLiteral ───────────► Normal
//!     │    "::"     copied as is
//!     └─── ":"      bind token [A-Za-z0-9_.]+
//! ```
//!
//! End of input ends the scan in any state; an unterminated comment or
//! literal is copied through as written.
//!
//! # Resolution
//!
//! Input fields are walked in order. A scalar field matches its own name. A
//! `dbrec` field `f` looking up a table with columns `a, b` matches `f_a` and
//! `f_b`, and each nested column takes its own index.

use schemagen_core::{Column, Schema, Table};
use tracing::debug;

use crate::{
    dialect::Dialect,
    error::{Error, Result}
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    LineComment,
    BlockComment,
    StringLiteral(char)
}

/// Rewrites `:name` tokens of SQL owned by one table.
#[derive(Debug, Clone, Copy)]
pub struct SqlParamBinder<'a> {
    schema: &'a Schema,

    table: &'a Table
}

impl<'a> SqlParamBinder<'a> {
    /// Binder resolving `dbrec` lookups through `schema`, with `this`
    /// meaning `table`.
    #[must_use]
    pub fn new(schema: &'a Schema, table: &'a Table) -> Self {
        Self {
            schema,
            table
        }
    }

    /// Rewrite every bind token of `sql`.
    ///
    /// `substitute` receives the 0-based input index and the token name and
    /// returns the replacement text.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingIdentifier`] when `:` is followed by no token
    ///   character
    /// - [`Error::UnknownIdentifier`] when a token matches no input field
    /// - [`Error::Schema`] when a `dbrec` lookup cannot be resolved
    pub fn bind<F>(&self, sql: &str, in_fields: &[Column], mut substitute: F) -> Result<String>
    where
        F: FnMut(usize, &str) -> String
    {
        let chars: Vec<(usize, char)> = sql.char_indices().collect();
        let mut out = String::with_capacity(sql.len());
        let mut state = ScanState::Normal;
        let mut i = 0;

        while i < chars.len() {
            let (position, c) = chars[i];
            let next = chars.get(i + 1).map(|&(_, n)| n);

            match state {
                ScanState::BlockComment => {
                    out.push(c);
                    i += 1;
                    if c == '*' && next == Some('/') {
                        out.push('/');
                        i += 1;
                        state = ScanState::Normal;
                    }
                }
                ScanState::LineComment => {
                    out.push(c);
                    i += 1;
                    if c == '\n' {
                        state = ScanState::Normal;
                    }
                }
                ScanState::StringLiteral(quote) => {
                    out.push(c);
                    i += 1;
                    if c == '\\' {
                        if let Some(escaped) = next {
                            out.push(escaped);
                            i += 1;
                        }
                    } else if c == quote {
                        state = ScanState::Normal;
                    }
                }
                ScanState::Normal => match (c, next) {
                    ('-', Some('-')) => {
                        out.push_str("--");
                        i += 2;
                        state = ScanState::LineComment;
                    }
                    ('/', Some('*')) => {
                        out.push_str("/*");
                        i += 2;
                        state = ScanState::BlockComment;
                    }
                    ('\'' | '"', _) => {
                        out.push(c);
                        i += 1;
                        state = ScanState::StringLiteral(c);
                    }
                    (':', Some(':')) => {
                        out.push_str("::");
                        i += 2;
                    }
                    (':', _) => {
                        let start = i + 1;
                        let end = chars[start..]
                            .iter()
                            .position(|&(_, t)| !is_token_char(t))
                            .map_or(chars.len(), |n| start + n);
                        if end == start {
                            return Err(Error::MissingIdentifier {
                                position,
                                sql: sql.to_string()
                            });
                        }
                        let name: String = chars[start..end].iter().map(|&(_, t)| t).collect();
                        let index =
                            self.resolve(&name, in_fields)?
                                .ok_or_else(|| Error::UnknownIdentifier {
                                    name: name.clone(),
                                    position,
                                    sql: sql.to_string()
                                })?;
                        let replacement = substitute(index, &name);
                        debug!(token = %name, index, %replacement, "bound sql parameter");
                        out.push_str(&replacement);
                        i = end;
                    }
                    _ => {
                        out.push(c);
                        i += 1;
                    }
                }
            }
        }
        Ok(out)
    }

    /// Rewrite every bind token into the placeholder syntax of `dialect`.
    ///
    /// # Errors
    ///
    /// As [`SqlParamBinder::bind`].
    pub fn bind_for(&self, sql: &str, in_fields: &[Column], dialect: Dialect) -> Result<String> {
        self.bind(sql, in_fields, |index, name| dialect.placeholder(index, name))
    }

    /// Flattened bind names of `in_fields`, in index order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] when a `dbrec` lookup cannot be resolved.
    pub fn bind_names(&self, in_fields: &[Column]) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for field in in_fields {
            if field.is_record() {
                for nested in self.schema.record_columns(field, self.table)? {
                    names.push(format!("{}_{}", field.name, nested.name));
                }
            } else {
                names.push(field.name.clone());
            }
        }
        Ok(names)
    }

    fn resolve(&self, name: &str, in_fields: &[Column]) -> Result<Option<usize>> {
        let mut index = 0;
        for field in in_fields {
            if field.is_record() {
                let nested = self.schema.record_columns(field, self.table)?;
                let suffix = name
                    .strip_prefix(field.name.as_str())
                    .and_then(|rest| rest.strip_prefix('_'));
                for column in nested {
                    if suffix == Some(column.name.as_str()) {
                        return Ok(Some(index));
                    }
                    index += 1;
                }
            } else {
                if field.name == name {
                    return Ok(Some(index));
                }
                index += 1;
            }
        }
        Ok(None)
    }
}

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}
