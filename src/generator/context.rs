// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generation contexts.
//!
//! [`GenerationContext`] precomputes the names shared by every artifact of a
//! table; [`DaoContext`] adds what one DAO pass (dialect and flavour) needs.
//! Both are immutable once built and are the only way specs are produced.
//!
//! # Fields
//!
//! | Field | Example |
//! |-------|---------|
//! | `table_record` | `Orders` in `tables/orders` |
//! | `key_record` | `OrdersKey` in `tables/orders_key` |
//! | `dao.dir` | `dao/postgres` |
//! | `dao.qualified_table` | `sales.Orders` |

use std::{collections::BTreeSet, path::PathBuf};

use schemagen_core::{Column, Lookup, Procedure, Schema, Table, TypeTag};

use super::model::{
    BindSpec, CoupletEntry, CoupletSpec, DaoShellSpec, DynamicSpec, FieldSpec, KeyLink,
    ProcedureRef, ProcedureSpec, RecordKind, RecordRef, RecordSpec, SequenceSpec
};
use crate::{
    binder::SqlParamBinder,
    config::{Flavour, TargetOptions},
    dav::{DavBlock, DavCompiler, LiteralStyle},
    dialect::{Dialect, SequenceMode},
    error::{Error, Result},
    naming::{IdentKind, IdentifierPolicy, couplet_name},
    procs::{self, SqlSource, StandardProc, StandardProcs},
    types::TypeCatalog
};

/// Everything shared by the artifacts of one table.
pub struct GenerationContext<'a> {
    /// Schema registry, for lookups.
    pub schema: &'a Schema,

    /// Table being generated.
    pub table: &'a Table,

    /// Validated target options.
    pub options: &'a TargetOptions,

    /// Identifier policy of the target.
    pub policy: &'a IdentifierPolicy,

    /// Type catalog of the target.
    pub catalog: &'a TypeCatalog,

    /// Literal style for validation rules.
    pub style: &'a dyn LiteralStyle,

    /// Main record of the table.
    pub table_record: RecordRef,

    /// Key record, when the table has a primary key.
    pub key_record: Option<RecordRef>
}

impl<'a> GenerationContext<'a> {
    /// Build the context of `table`.
    pub fn new(
        schema: &'a Schema,
        table: &'a Table,
        options: &'a TargetOptions,
        policy: &'a IdentifierPolicy,
        catalog: &'a TypeCatalog,
        style: &'a dyn LiteralStyle
    ) -> Self {
        let tables_dir = PathBuf::from(&options.dir_tables);
        let record = |logical: &str| RecordRef {
            class_name: policy.identifier(IdentKind::TableClass, logical),
            file_stem:  policy.identifier(IdentKind::TableFile, logical),
            dir:        tables_dir.clone()
        };
        Self {
            schema,
            table,
            options,
            policy,
            catalog,
            style,
            table_record: record(&table.name),
            key_record: table
                .has_primary_key()
                .then(|| record(&procs::key_record_name(&table.name)))
        }
    }

    /// Record of a table (or key record) by logical name.
    #[must_use]
    pub fn table_ref(&self, logical: &str) -> RecordRef {
        RecordRef {
            class_name: self.policy.identifier(IdentKind::TableClass, logical),
            file_stem:  self.policy.identifier(IdentKind::TableFile, logical),
            dir:        PathBuf::from(&self.options.dir_tables)
        }
    }

    /// Query record of a declared procedure.
    #[must_use]
    pub fn query_ref(&self, proc: &Procedure, kind: RecordKind) -> RecordRef {
        let (class, file, side) = match kind {
            RecordKind::QueryOut => (IdentKind::QryOutClass, IdentKind::QryOutFile, "Out"),
            _ => (IdentKind::QryInClass, IdentKind::QryInFile, "In")
        };
        let logical = format!("{}{}{}", self.table.name, proc.name, side);
        RecordRef {
            class_name: self.policy.identifier(class, &logical),
            file_stem:  self.policy.identifier(file, &logical),
            dir:        PathBuf::from(&self.options.dir_tables)
        }
    }

    fn lookup_ref(&self, lookup: &Lookup) -> RecordRef {
        self.table_ref(lookup.table_name(&self.table.name))
    }

    fn lookup_ref_of(&self, field: &Column) -> RecordRef {
        match &field.lookup {
            Some(lookup) => self.lookup_ref(lookup),
            None => self.table_record.clone()
        }
    }

    /// Field description of a column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] when the target does not map the tag.
    pub fn field(&self, column: &'a Column) -> Result<FieldSpec<'a>> {
        let map = self.catalog.resolve(column.type_tag)?.clone();
        Ok(FieldSpec {
            column,
            member: self.policy.member(&column.name),
            map,
            record: column.lookup.as_ref().map(|l| self.lookup_ref(l))
        })
    }

    /// Field descriptions of columns.
    ///
    /// # Errors
    ///
    /// As [`GenerationContext::field`].
    pub fn fields(&self, columns: impl IntoIterator<Item = &'a Column>) -> Result<Vec<FieldSpec<'a>>> {
        columns.into_iter().map(|c| self.field(c)).collect()
    }

    /// Couplet lookup types of columns.
    #[must_use]
    pub fn couplets(&self, columns: impl IntoIterator<Item = &'a Column>) -> Vec<CoupletSpec<'a>> {
        columns
            .into_iter()
            .filter(|c| c.has_couplets())
            .map(|column| CoupletSpec {
                column,
                class_name: self.policy.identifier(IdentKind::CoupletClass, &column.name),
                get_value: self.policy.method("GetValue"),
                entries: column
                    .couplets
                    .iter()
                    .map(|c| {
                        let name = couplet_name(&c.label);
                        CoupletEntry {
                            key:          c.key.clone(),
                            label:        c.label.clone(),
                            key_member:   self.policy.member(&format!("Key{name}")),
                            value_member: self.policy.member(&format!("Value{name}"))
                        }
                    })
                    .collect()
            })
            .collect()
    }

    fn key_link(&self) -> Result<Option<KeyLink<'a>>> {
        match &self.key_record {
            Some(record) => Ok(Some(KeyLink {
                record: record.clone(),
                fields: self.fields(self.table.primary_key_columns())?
            })),
            None => Ok(None)
        }
    }

    fn record(
        &self,
        kind: RecordKind,
        record: RecordRef,
        columns: Vec<&'a Column>,
        davs: DavBlock
    ) -> Result<RecordSpec<'a>> {
        let fields = self.fields(columns.iter().copied())?;
        let key = match kind {
            RecordKind::Main => self.key_link()?,
            _ => None
        };
        let mut imports: BTreeSet<RecordRef> =
            fields.iter().filter_map(|f| f.record.clone()).collect();
        if let Some(link) = &key {
            imports.insert(link.record.clone());
        }
        imports.remove(&record);
        Ok(RecordSpec {
            kind,
            couplets: self.couplets(columns.iter().copied()),
            record,
            fields,
            davs,
            key,
            imports: imports.into_iter().collect()
        })
    }

    /// Records of the table phase: key record, main record, then query
    /// records of declared procedures whose fields are not a single `dbrec`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] or [`Error::InvalidDirective`].
    pub fn table_records(&self) -> Result<Vec<RecordSpec<'a>>> {
        let compiler = DavCompiler::new(self.style);
        let table = self.table;
        let is_key = |c: &Column| table.is_primary_key(&c.name);
        let mut out = Vec::new();

        if let Some(key_record) = &self.key_record {
            let cols = table.primary_key_columns();
            let davs = compiler.compile_record(cols.iter().copied(), is_key, false)?;
            out.push(self.record(RecordKind::Key, key_record.clone(), cols, davs)?);
        }

        let davs = compiler.compile_record(&table.columns, is_key, true)?;
        out.push(self.record(
            RecordKind::Main,
            self.table_record.clone(),
            table.columns.iter().collect(),
            davs
        )?);

        for proc in &table.procedures {
            if !proc.in_fields.is_empty() && proc.single_record_input().is_none() {
                let davs = compiler.compile_record(&proc.in_fields, |_| false, false)?;
                out.push(self.record(
                    RecordKind::QueryIn,
                    self.query_ref(proc, RecordKind::QueryIn),
                    proc.in_fields.iter().collect(),
                    davs
                )?);
            }
            if !proc.out_fields.is_empty() && proc.single_record_output().is_none() {
                out.push(self.record(
                    RecordKind::QueryOut,
                    self.query_ref(proc, RecordKind::QueryOut),
                    proc.out_fields.iter().collect(),
                    DavBlock::default()
                )?);
            }
        }
        Ok(out)
    }
}

/// One DAO pass: a table, a dialect and a flavour.
pub struct DaoContext<'a> {
    /// Table context.
    pub base: &'a GenerationContext<'a>,

    /// Dialect of the pass.
    pub dialect: Dialect,

    /// Flavour of the pass.
    pub flavour: Flavour,

    /// Output directory, relative to the target dest.
    pub dir: PathBuf,

    /// Table name as written in SQL.
    pub qualified_table: String
}

impl<'a> DaoContext<'a> {
    /// Context of a DAO pass.
    #[must_use]
    pub fn new(base: &'a GenerationContext<'a>, dialect: Dialect, flavour: Flavour) -> Self {
        Self {
            dir: base.options.dao_dir(flavour).join(dialect.name()),
            qualified_table: base.options.qualified_table(&base.table.name),
            base,
            dialect,
            flavour
        }
    }

    /// True for the async flavour.
    #[must_use]
    pub fn is_async(&self) -> bool {
        self.flavour == Flavour::Async
    }

    /// Standard procedures with this pass's SQL.
    #[must_use]
    pub fn standard_procs(&self) -> StandardProcs {
        procs::synthesize(
            self.base.table,
            Some(SqlSource::dialect(&self.dialect, &self.qualified_table))
        )
    }

    fn dao_names(&self, logical: &str) -> (String, String) {
        let policy = self.base.policy;
        (
            policy.identifier(IdentKind::DaoClass, logical),
            policy.identifier(IdentKind::DaoFile, logical)
        )
    }

    /// The per-table DAO.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] for unmapped key columns.
    pub fn shell(&self, procs: &StandardProcs) -> Result<DaoShellSpec<'a>> {
        let (class_name, file_stem) = self.dao_names(&self.base.table.name);
        Ok(DaoShellSpec {
            class_name,
            file_stem,
            table_record: self.base.table_record.clone(),
            key: self.base.key_link()?,
            procedures: procs
                .kinds()
                .into_iter()
                .map(|kind| {
                    let (class_name, file_stem) = self.proc_names(kind.name());
                    ProcedureRef {
                        standard: kind,
                        class_name,
                        file_stem
                    }
                })
                .collect()
        })
    }

    fn proc_names(&self, proc_name: &str) -> (String, String) {
        self.dao_names(&format!("{}{}", self.base.table.name, proc_name))
    }

    /// Description of one procedure DAO.
    ///
    /// `proc` is either declared on the table or comes from
    /// [`DaoContext::standard_procs`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSql`], binder errors, [`Error::UnknownType`]
    /// or schema lookup errors.
    pub fn procedure<'p>(&self, proc: &'p Procedure, standard: Option<StandardProc>) -> Result<ProcedureSpec<'p>>
    where
        'a: 'p
    {
        let base: &GenerationContext<'p> = self.base;
        let table = base.table;
        let (class_name, file_stem) = self.proc_names(&proc.name);

        let sql_text = proc
            .sql_for(self.dialect.name())
            .ok_or_else(|| Error::MissingSql {
                table:     table.name.clone(),
                procedure: proc.name.clone(),
                dialect:   self.dialect.name()
            })?;

        let mut imports = BTreeSet::new();
        let mut inputs = Inputs::default();
        let single_in = proc.single_record_input();

        for field in &proc.in_fields {
            if !field.is_record() {
                inputs.push(
                    self,
                    field.name.clone(),
                    vec![base.policy.member(&field.name)],
                    field,
                    standard,
                    true
                )?;
                continue;
            }
            if single_in.is_none() {
                imports.insert(base.lookup_ref_of(field));
            }
            for column in base.schema.record_columns(field, table)? {
                let mut path = Vec::with_capacity(2);
                if single_in.is_none() {
                    path.push(base.policy.member(&field.name));
                }
                path.push(base.policy.member(&column.name));
                inputs.push(
                    self,
                    format!("{}_{}", field.name, column.name),
                    path,
                    column,
                    standard,
                    false
                )?;
            }
        }

        let bound: Vec<Column> = proc
            .in_fields
            .iter()
            .filter(|f| binds_field(f, true, standard, self.dialect))
            .cloned()
            .collect();
        let sql = SqlParamBinder::new(base.schema, table).bind_for(sql_text, &bound, self.dialect)?;

        let input = self.side_record(proc, RecordKind::QueryIn)?;
        let output = self.side_record(proc, RecordKind::QueryOut)?;
        let input_fields = match single_in {
            Some(field) => base.fields(base.schema.record_columns(field, table)?)?,
            None => base.fields(&proc.in_fields)?
        };
        let output_fields = match proc.single_record_output() {
            Some(field) => base.fields(base.schema.record_columns(field, table)?)?,
            None => base.fields(&proc.out_fields)?
        };
        let mut results = Vec::new();
        for field in &output_fields {
            if field.column.is_record() {
                for column in base.schema.record_columns(field.column, table)? {
                    results.push(vec![field.member.clone(), base.policy.member(&column.name)]);
                }
            } else {
                results.push(vec![field.member.clone()]);
            }
        }
        imports.extend(input.iter().chain(&output).cloned());
        imports.extend(output_fields.iter().filter_map(|f| f.record.clone()));

        Ok(ProcedureSpec {
            name: proc.name.clone(),
            standard,
            class_name,
            file_stem,
            input,
            output,
            input_fields,
            output_fields,
            results,
            sql,
            binds: inputs.binds,
            dynamics: inputs.dynamics,
            sequence: inputs.sequence,
            stamps: inputs.stamps,
            imports: imports.into_iter().collect()
        })
    }

    fn side_record(&self, proc: &Procedure, side: RecordKind) -> Result<Option<RecordRef>> {
        let base = self.base;
        let (fields, single, override_name) = match side {
            RecordKind::QueryOut => (
                &proc.out_fields,
                proc.single_record_output(),
                &proc.out_override_name
            ),
            _ => (&proc.in_fields, proc.single_record_input(), &proc.in_override_name)
        };
        if fields.is_empty() {
            return Ok(None);
        }
        if let Some(field) = single {
            base.schema.record_columns(field, base.table)?;
            return Ok(Some(base.lookup_ref_of(field)));
        }
        if proc.is_standard
            && let Some(name) = override_name
        {
            return Ok(Some(base.table_ref(name)));
        }
        Ok(Some(base.query_ref(proc, side)))
    }
}

/// Inputs of a procedure sorted by how the DAO feeds them.
#[derive(Default)]
struct Inputs<'p> {
    binds: Vec<BindSpec<'p>>,

    dynamics: Vec<DynamicSpec>,

    stamps: Vec<Vec<String>>,

    sequence: Option<SequenceSpec>
}

impl<'p> Inputs<'p> {
    /// Record one flattened input. Only top-level `dynamic` fields are
    /// substituted and only a top-level sequence is filled by an insert;
    /// nested ones are bound like any other column. The binder sees the same
    /// selection through [`binds_field`].
    fn push(
        &mut self,
        ctx: &DaoContext<'_>,
        token: String,
        path: Vec<String>,
        column: &'p Column,
        standard: Option<StandardProc>,
        top_level: bool
    ) -> Result<()> {
        match column.type_tag {
            TypeTag::Dynamic if top_level => {
                self.dynamics.push(DynamicSpec {
                    marker: format!("[{}]", column.name),
                    path
                });
                return Ok(());
            }
            TypeTag::Timestamp
                if matches!(standard, Some(StandardProc::Insert | StandardProc::Update)) =>
            {
                self.stamps.push(path.clone());
            }
            tag if top_level && tag.is_sequence() && standard == Some(StandardProc::Insert) => {
                if self.sequence.is_none() {
                    self.sequence = Some(SequenceSpec {
                        path: path.clone(),
                        column: column.name.clone(),
                        mode: ctx.dialect.sequence_mode()
                    });
                }
            }
            _ => {}
        }
        if !binds_field(column, top_level, standard, ctx.dialect) {
            return Ok(());
        }
        self.binds.push(BindSpec {
            token,
            path,
            column,
            map: ctx.base.catalog.resolve(column.type_tag)?.clone()
        });
        Ok(())
    }
}

/// True when an input field gets a bind parameter: top-level `dynamic`
/// fields are substituted and a top-level sequence is left to a post-insert
/// read.
fn binds_field(column: &Column, top_level: bool, standard: Option<StandardProc>, dialect: Dialect) -> bool {
    if !top_level {
        return true;
    }
    match column.type_tag {
        TypeTag::Dynamic => false,
        tag if tag.is_sequence() && standard == Some(StandardProc::Insert) => {
            dialect.sequence_mode() != SequenceMode::PostInsert
        }
        _ => true
    }
}

#[cfg(test)]
mod tests;
