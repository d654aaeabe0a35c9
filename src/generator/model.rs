// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! What targets render.
//!
//! The driver resolves every name, type, bind and validation rule up front
//! and hands targets these plain descriptions, so a target is a template and
//! nothing more.

use std::path::PathBuf;

use schemagen_core::Column;

use crate::{dav::DavBlock, dialect::SequenceMode, procs::StandardProc, types::FieldMap};

/// A generated record type and where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordRef {
    /// Type name.
    pub class_name: String,

    /// File stem.
    pub file_stem: String,

    /// Directory, relative to the target dest.
    pub dir: PathBuf
}

/// Role of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Primary key columns of a table.
    Key,
    /// All columns of a table.
    Main,
    /// Input fields of a declared procedure.
    QueryIn,
    /// Output fields of a declared procedure.
    QueryOut
}

/// One field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec<'a> {
    /// Column the field comes from.
    pub column: &'a Column,

    /// Member name.
    pub member: String,

    /// Target type of the column tag.
    pub map: FieldMap,

    /// Record type of a `dbrec` field.
    pub record: Option<RecordRef>
}

impl FieldSpec<'_> {
    /// Type to declare: the record type for `dbrec`, otherwise the mapped
    /// type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match &self.record {
            Some(record) => &record.class_name,
            None => &self.map.name
        }
    }

    /// False for fields the DAO fills (`timestamp`).
    #[must_use]
    pub fn in_constructor(&self) -> bool {
        self.column.type_tag != schemagen_core::TypeTag::Timestamp
    }
}

/// One enumerated value of a couplet column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoupletEntry {
    /// Stored value.
    pub key: String,

    /// Display label.
    pub label: String,

    /// Member holding the key (`Key<Label>` through the policy).
    pub key_member: String,

    /// Member holding the label (`Value<Label>` through the policy).
    pub value_member: String
}

/// Lookup type generated for a couplet column.
#[derive(Debug, Clone, PartialEq)]
pub struct CoupletSpec<'a> {
    /// Column carrying the couplets.
    pub column: &'a Column,

    /// Lookup type name (`class.couplet` of the column name).
    pub class_name: String,

    /// Name of the key-to-label function.
    pub get_value: String,

    /// Values in declaration order.
    pub entries: Vec<CoupletEntry>
}

/// Link from a main record to its key record.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyLink<'a> {
    /// Key record.
    pub record: RecordRef,

    /// Key fields, in column order.
    pub fields: Vec<FieldSpec<'a>>
}

/// A record to render.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSpec<'a> {
    /// Role.
    pub kind: RecordKind,

    /// Type and location.
    pub record: RecordRef,

    /// Fields in declaration order.
    pub fields: Vec<FieldSpec<'a>>,

    /// Validation rules; empty for output records.
    pub davs: DavBlock,

    /// Couplet lookup types.
    pub couplets: Vec<CoupletSpec<'a>>,

    /// Key record link of a main record.
    pub key: Option<KeyLink<'a>>,

    /// Other records this one refers to, sorted and unique.
    pub imports: Vec<RecordRef>
}

/// One bound parameter of a procedure, in bind order.
#[derive(Debug, Clone, PartialEq)]
pub struct BindSpec<'a> {
    /// Token as written in SQL (`cust_id`).
    pub token: String,

    /// Member path from the input record (`["cust", "id"]`).
    pub path: Vec<String>,

    /// Column bound.
    pub column: &'a Column,

    /// Target type of the column.
    pub map: FieldMap
}

/// A `dynamic` input substituted into the SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicSpec {
    /// Marker in the SQL text (`[name]`).
    pub marker: String,

    /// Member path from the input record.
    pub path: Vec<String>
}

/// Sequence column of an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSpec {
    /// Member path from the input record.
    pub path: Vec<String>,

    /// Column name, used as the sequence name suffix.
    pub column: String,

    /// When the value is obtained.
    pub mode: SequenceMode
}

/// A procedure DAO to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureSpec<'a> {
    /// Procedure name.
    pub name: String,

    /// Standard kind, `None` for declared procedures.
    pub standard: Option<StandardProc>,

    /// DAO type name.
    pub class_name: String,

    /// DAO file stem.
    pub file_stem: String,

    /// Input record, when the procedure has inputs.
    pub input: Option<RecordRef>,

    /// Output record, when the procedure has outputs.
    pub output: Option<RecordRef>,

    /// Fields of the input record.
    pub input_fields: Vec<FieldSpec<'a>>,

    /// Fields of the output record.
    pub output_fields: Vec<FieldSpec<'a>>,

    /// Member paths of result columns, in select order.
    pub results: Vec<Vec<String>>,

    /// SQL with dialect placeholders.
    pub sql: String,

    /// Bound parameters in index order.
    pub binds: Vec<BindSpec<'a>>,

    /// Text substitutions.
    pub dynamics: Vec<DynamicSpec>,

    /// Sequence filled on insert.
    pub sequence: Option<SequenceSpec>,

    /// Member paths of `timestamp` inputs stamped before execution.
    pub stamps: Vec<Vec<String>>,

    /// Records used, sorted and unique.
    pub imports: Vec<RecordRef>
}

impl ProcedureSpec<'_> {
    /// True when the procedure returns rows. Standard updates carry the
    /// main record as output but return nothing.
    #[must_use]
    pub fn fetches(&self) -> bool {
        self.output.is_some() && self.standard.is_none_or(StandardProc::fetches)
    }
}

/// Reference from a DAO shell to one procedure DAO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureRef {
    /// Standard kind.
    pub standard: StandardProc,

    /// DAO type name.
    pub class_name: String,

    /// DAO file stem.
    pub file_stem: String
}

/// The per-table DAO to render.
#[derive(Debug, Clone, PartialEq)]
pub struct DaoShellSpec<'a> {
    /// DAO type name.
    pub class_name: String,

    /// DAO file stem.
    pub file_stem: String,

    /// Main record.
    pub table_record: RecordRef,

    /// Key record and fields, when the table has a key.
    pub key: Option<KeyLink<'a>>,

    /// Standard procedure DAOs, in emission order.
    pub procedures: Vec<ProcedureRef>
}
