// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Validation directive ("DAV") compiler.
//!
//! Turns the directives of a column into an ordered list of
//! [`DavEmission`]s that a target renders into its validation code.
//!
//! # Emission Order
//!
//! 1. Implicit rules from the type: `seq*` gives `Min` (the declared `min`
//!    or `1`); `char` gives `Min 1` and `Max 1`
//! 2. `NotNull` when the column is declared not null
//! 3. Declared directives in declaration order, skipping kinds already
//!    emitted; `null: false` becomes `NotNull`
//! 4. `In` over the couplet keys when couplets exist and `in` was not
//!    declared
//!
//! `timestamp` columns emit nothing: the DAO stamps them.
//!
//! # Records
//!
//! [`DavCompiler::compile_record`] splits a record into its key block and
//! the rest. For a table's main record the key block is followed by a
//! key-only exit, and every rule of a sequence column is skipped when
//! validating for insert (the value does not exist yet).
//!
//! ```text
//! if !for_insert { id: Min 1 }      ◄── key block, sequence guarded
//! if key_only { return }
//! total: NotNull
//! status: Min 1, Max 1, In ['A','X']
//! ```

mod literal;

use std::collections::BTreeSet;

pub use literal::{ConstructorStyle, LiteralStyle};
use schemagen_core::{Column, DavKind, DavValue, TypeTag};

use crate::error::{Error, Result};

/// Validation rule as emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DavRule {
    /// Lower bound.
    Min,
    /// Upper bound.
    Max,
    /// Value required.
    NotNull,
    /// Pattern match.
    Regex,
    /// Named validation function.
    Func,
    /// Allowed values.
    In,
    /// Forbidden values.
    NotIn
}

impl DavRule {
    /// Rule name as used by generated runtimes.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Min => "Min",
            Self::Max => "Max",
            Self::NotNull => "NotNull",
            Self::Regex => "Regex",
            Self::Func => "Func",
            Self::In => "In",
            Self::NotIn => "NotIn"
        }
    }
}

/// Rule argument, already in target syntax where that matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DavArg {
    /// No argument (`NotNull`).
    None,

    /// Integer or fixed-point literal.
    Number(String),

    /// Date/time constant in target syntax.
    Temporal(String),

    /// Pattern or function name, unquoted.
    Text(String),

    /// Membership list; `quoted` for textual columns.
    List {
        /// Members as written.
        items: Vec<String>,

        /// Members are string literals.
        quoted: bool
    }
}

impl DavArg {
    /// Comma-joined list members, each wrapped in `quote` when quoted.
    ///
    /// Returns an empty string for non-list arguments.
    #[must_use]
    pub fn joined(&self, quote: char) -> String {
        match self {
            Self::List {
                items,
                quoted: true
            } => items
                .iter()
                .map(|i| format!("{quote}{}{quote}", escape(i, quote)))
                .collect::<Vec<_>>()
                .join(", "),
            Self::List {
                items,
                quoted: false
            } => items.join(", "),
            _ => String::new()
        }
    }
}

/// Escape backslashes and `quote` for a quoted literal.
#[must_use]
pub fn escape(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// When an emission applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DavGuard {
    /// Always.
    Always,
    /// Skipped when validating for insert.
    UnlessForInsert
}

/// One rule on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavEmission {
    /// Column name as declared.
    pub column: String,

    /// Rule.
    pub rule: DavRule,

    /// Argument.
    pub arg: DavArg,

    /// Applicability.
    pub guard: DavGuard
}

/// Rules of a whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DavBlock {
    /// Rules on key columns.
    pub key: Vec<DavEmission>,

    /// Stop after the key block when validating the key only.
    pub key_only_exit: bool,

    /// Rules on the other columns.
    pub rest: Vec<DavEmission>
}

impl DavBlock {
    /// Rules that apply for the given flags, in order.
    #[must_use]
    pub fn effective(&self, for_insert: bool, key_only: bool) -> Vec<&DavEmission> {
        let applies = |e: &&DavEmission| !(for_insert && e.guard == DavGuard::UnlessForInsert);
        let key = self.key.iter().filter(applies);
        if key_only && self.key_only_exit {
            return key.collect();
        }
        key.chain(self.rest.iter().filter(applies)).collect()
    }

    /// True when the block emits nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.rest.is_empty()
    }

    /// Every rule in order.
    pub fn iter(&self) -> impl Iterator<Item = &DavEmission> {
        self.key.iter().chain(&self.rest)
    }
}

/// Compiles column directives with one target's literal style.
#[derive(Clone, Copy)]
pub struct DavCompiler<'a> {
    style: &'a dyn LiteralStyle
}

impl<'a> DavCompiler<'a> {
    /// Compiler writing temporal literals with `style`.
    #[must_use]
    pub fn new(style: &'a dyn LiteralStyle) -> Self {
        Self {
            style
        }
    }

    /// Rules of one column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDirective`] when a directive value does not
    /// fit the column type.
    pub fn compile(&self, column: &Column, is_main_record: bool) -> Result<Vec<DavEmission>> {
        let tag = column.type_tag;
        if tag == TypeTag::Timestamp {
            return Ok(Vec::new());
        }
        let guard = if is_main_record && tag.is_sequence() {
            DavGuard::UnlessForInsert
        } else {
            DavGuard::Always
        };
        let emit = |rule: DavRule, arg: DavArg| DavEmission {
            column: column.name.clone(),
            rule,
            arg,
            guard
        };

        let mut out = Vec::new();
        let mut done = BTreeSet::new();

        if tag.is_sequence() {
            let min = match column.dav.get(DavKind::Min) {
                Some(value) => self.bound(column, DavKind::Min, value)?,
                None => DavArg::Number("1".to_string())
            };
            out.push(emit(DavRule::Min, min));
            done.insert(DavKind::Min);
        } else if tag == TypeTag::Char {
            out.push(emit(DavRule::Min, DavArg::Number("1".to_string())));
            out.push(emit(DavRule::Max, DavArg::Number("1".to_string())));
            done.extend([DavKind::Min, DavKind::Max]);
        }

        if column.not_null == Some(true) {
            out.push(emit(DavRule::NotNull, DavArg::None));
            done.insert(DavKind::Null);
        }

        for (kind, value) in column.dav.iter() {
            if !done.insert(kind) {
                continue;
            }
            let emission = match kind {
                DavKind::Null => match value {
                    DavValue::Bool(false) => Some((DavRule::NotNull, DavArg::None)),
                    DavValue::Bool(true) => None,
                    _ => return Err(invalid(column, kind, "expects true or false"))
                },
                DavKind::Min => Some((DavRule::Min, self.bound(column, kind, value)?)),
                DavKind::Max => Some((DavRule::Max, self.bound(column, kind, value)?)),
                DavKind::Regex => Some((DavRule::Regex, text(column, kind, value)?)),
                DavKind::Func => Some((DavRule::Func, text(column, kind, value)?)),
                DavKind::In => Some((DavRule::In, list(column, kind, value)?)),
                DavKind::NotIn => Some((DavRule::NotIn, list(column, kind, value)?))
            };
            if let Some((rule, arg)) = emission {
                out.push(emit(rule, arg));
            }
        }

        if column.has_couplets() && !done.contains(&DavKind::In) {
            out.push(emit(
                DavRule::In,
                DavArg::List {
                    items:  column.couplets.iter().map(|c| c.key.clone()).collect(),
                    quoted: tag.is_textual()
                }
            ));
        }
        Ok(out)
    }

    /// Rules of a record, split into key block and rest.
    ///
    /// `is_key` tells which columns belong to the key block; a main record
    /// with a non-empty key block gets a key-only exit.
    ///
    /// # Errors
    ///
    /// As [`DavCompiler::compile`].
    pub fn compile_record<'c>(
        &self,
        columns: impl IntoIterator<Item = &'c Column>,
        is_key: impl Fn(&Column) -> bool,
        is_main_record: bool
    ) -> Result<DavBlock> {
        let mut block = DavBlock::default();
        let mut has_key = false;
        for column in columns {
            let rules = self.compile(column, is_main_record)?;
            if is_key(column) {
                has_key = true;
                block.key.extend(rules);
            } else {
                block.rest.extend(rules);
            }
        }
        block.key_only_exit = is_main_record && has_key;
        Ok(block)
    }

    fn bound(&self, column: &Column, kind: DavKind, value: &DavValue) -> Result<DavArg> {
        let tag = column.type_tag;
        if tag.is_temporal() {
            let text = value
                .as_text()
                .ok_or_else(|| invalid(column, kind, "expects a date/time string"))?;
            let literal = match tag {
                TypeTag::Date => literal::parse_date(text).map(|d| self.style.date(d)),
                TypeTag::Time => literal::parse_time(text).map(|t| self.style.time(t)),
                _ => literal::parse_datetime(text).map(|dt| self.style.datetime(dt))
            };
            return literal
                .map(DavArg::Temporal)
                .ok_or_else(|| invalid(column, kind, &format!("cannot parse [{text}]")));
        }
        if tag.is_float() {
            let number = match value {
                DavValue::Int(i) => *i as f64,
                DavValue::Float(f) => *f,
                _ => return Err(invalid(column, kind, "expects a number"))
            };
            return Ok(DavArg::Number(format!("{number:.6}")));
        }
        match value {
            DavValue::Int(i) => Ok(DavArg::Number(i.to_string())),
            DavValue::Text(t) if t.trim().parse::<i64>().is_ok() => {
                Ok(DavArg::Number(t.trim().to_string()))
            }
            _ => Err(invalid(column, kind, "expects an integer"))
        }
    }
}

fn text(column: &Column, kind: DavKind, value: &DavValue) -> Result<DavArg> {
    value
        .as_text()
        .map(|t| DavArg::Text(t.to_string()))
        .ok_or_else(|| invalid(column, kind, "expects a string"))
}

fn list(column: &Column, kind: DavKind, value: &DavValue) -> Result<DavArg> {
    let items = match value {
        DavValue::List(items) => items.clone(),
        DavValue::Text(t) => vec![t.clone()],
        DavValue::Int(i) => vec![i.to_string()],
        DavValue::Float(f) => vec![f.to_string()],
        DavValue::Bool(_) => return Err(invalid(column, kind, "expects a list of values"))
    };
    Ok(DavArg::List {
        items,
        quoted: column.type_tag.is_textual()
    })
}

fn invalid(column: &Column, kind: DavKind, reason: &str) -> Error {
    Error::InvalidDirective {
        column:    column.name.clone(),
        directive: kind.as_str(),
        reason:    reason.to_string()
    }
}
