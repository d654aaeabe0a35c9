// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use schemagen_core::{Capabilities, Lookup};

use super::*;
use crate::{
    config::{CasingConfig, RawTargetOptions},
    dav::{ConstructorStyle, DavGuard},
    diagnostics::Diagnostics,
    generator::Generator,
    naming::Casing,
    targets::PythonGenerator
};

const STYLE: ConstructorStyle = ConstructorStyle {
    ctor_date:        "date",
    ctor_time:        "time",
    ctor_datetime:    "datetime",
    zero_based_month: false,
    quote:            '\''
};

fn schema() -> Schema {
    let orders = Table::new("Orders")
        .with_column(Column::new("id", TypeTag::Seq64))
        .with_column(Column::new("total", TypeTag::Double).with_not_null(true))
        .with_column(Column::new("status", TypeTag::Char).with_couplet("A", "Active"))
        .with_column(Column::new("created", TypeTag::Timestamp))
        .with_primary_key("id")
        .with_capabilities(Capabilities::all())
        .with_procedure(
            Procedure::new("ByStatus")
                .with_in_field(Column::new("status", TypeTag::Char))
                .with_in_field(Column::new("orderBy", TypeTag::Dynamic))
                .with_out_field(Column::new("id", TypeTag::Seq64))
                .with_out_field(Column::new("total", TypeTag::Double))
                .with_sql("std", "select id, total from Orders where status = :status order by [orderBy]")
        )
        .with_procedure(
            Procedure::new("Save")
                .with_in_field(Column::record("rec", Lookup::This))
                .with_sql("std", "update Orders set total = :rec_total where id = :rec_id")
        )
        .with_procedure(
            Procedure::new("Purge")
                .with_in_field(Column::new("before", TypeTag::Date))
                .with_sql("mssql", "delete from Orders where created < :before")
        );
    Schema::from_tables([orders]).unwrap()
}

struct Fixture {
    schema: Schema,

    options: TargetOptions,

    policy: IdentifierPolicy,

    generator: PythonGenerator
}

impl Fixture {
    fn new() -> Self {
        Self::with_schema(schema())
    }

    fn with_schema(schema: Schema) -> Self {
        let mut diagnostics = Diagnostics::default();
        let options = TargetOptions::from_raw(
            &RawTargetOptions::default(),
            CasingConfig::new(Casing::Pascal, Casing::Camel, Casing::Camel, Casing::Pascal),
            &mut diagnostics
        )
        .unwrap();
        Self {
            schema,
            policy: IdentifierPolicy::from_options(&options),
            options,
            generator: PythonGenerator::new()
        }
    }

    fn context(&self) -> GenerationContext<'_> {
        self.context_for("Orders")
    }

    fn context_for(&self, name: &str) -> GenerationContext<'_> {
        let table = self.schema.table(name).unwrap();
        GenerationContext::new(
            &self.schema,
            table,
            &self.options,
            &self.policy,
            self.generator.catalog(),
            &STYLE
        )
    }
}

fn declared<'a>(table: &'a Table, name: &str) -> &'a Procedure {
    table.procedures.iter().find(|p| p.name == name).unwrap()
}

#[test]
fn table_phase_records_in_order() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    let records = ctx.table_records().unwrap();
    let names: Vec<_> = records
        .iter()
        .map(|r| (r.kind, r.record.class_name.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![
            (RecordKind::Key, "OrdersKey"),
            (RecordKind::Main, "Orders"),
            (RecordKind::QueryIn, "OrdersByStatusIn"),
            (RecordKind::QueryOut, "OrdersByStatusOut"),
            (RecordKind::QueryIn, "OrdersPurgeIn"),
        ]
    );
    assert!(records.iter().all(|r| r.record.dir == PathBuf::from("tables")));
}

#[test]
fn main_record_links_key_and_guards_sequence() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    let records = ctx.table_records().unwrap();
    let main = &records[1];

    assert_eq!(main.key.as_ref().unwrap().record.class_name, "OrdersKey");
    assert_eq!(main.imports, vec![ctx.key_record.clone().unwrap()]);
    assert!(main.davs.key_only_exit);
    assert_eq!(main.davs.key[0].guard, DavGuard::UnlessForInsert);
    assert!(main.davs.rest.iter().all(|d| d.column != "created"));

    let couplet = &main.couplets[0];
    assert_eq!(couplet.class_name, "Status");
    assert_eq!(couplet.get_value, "getValue");
    assert_eq!(couplet.entries[0].key_member, "keyActive");

    let out = &records[3];
    assert!(out.davs.is_empty());
    let key = &records[0];
    assert!(!key.davs.key_only_exit);
    assert_eq!(key.davs.key[0].guard, DavGuard::Always);
}

#[test]
fn insert_binds_and_stamps() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    let dao = DaoContext::new(&ctx, Dialect::Postgres, Flavour::Standard);
    let procs = dao.standard_procs();
    let insert = procs.get(StandardProc::Insert).unwrap();
    let spec = dao.procedure(insert, Some(StandardProc::Insert)).unwrap();

    let tokens: Vec<_> = spec.binds.iter().map(|b| b.token.as_str()).collect();
    assert_eq!(tokens, vec!["id", "total", "status", "created"]);
    assert!(spec.sql.contains("$1") && spec.sql.contains("$4"));
    assert_eq!(spec.stamps, vec![vec!["created".to_string()]]);
    let sequence = spec.sequence.unwrap();
    assert_eq!(sequence.mode, SequenceMode::PreInsert);
    assert_eq!(sequence.path, vec!["id".to_string()]);
    assert_eq!(spec.input.unwrap().class_name, "Orders");
    assert!(spec.output.is_none());
    assert_eq!(dao.dir, PathBuf::from("dao/postgres"));
}

#[test]
fn post_insert_dialect_leaves_sequence_unbound() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    let dao = DaoContext::new(&ctx, Dialect::Sqlite, Flavour::Standard);
    let procs = dao.standard_procs();
    let insert = procs.get(StandardProc::Insert).unwrap();
    let spec = dao.procedure(insert, Some(StandardProc::Insert)).unwrap();

    let tokens: Vec<_> = spec.binds.iter().map(|b| b.token.as_str()).collect();
    assert_eq!(tokens, vec!["total", "status", "created"]);
    assert!(spec.sql.contains("?1") && spec.sql.contains("?3"));
    assert!(!spec.sql.contains("?4"));
    assert_eq!(spec.sequence.unwrap().mode, SequenceMode::PostInsert);
}

#[test]
fn update_returns_no_rows() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    let dao = DaoContext::new(&ctx, Dialect::Postgres, Flavour::Standard);
    let procs = dao.standard_procs();
    let update = dao
        .procedure(procs.get(StandardProc::Update).unwrap(), Some(StandardProc::Update))
        .unwrap();
    assert!(update.output.is_some());
    assert!(!update.fetches());
    assert!(update.sequence.is_none());

    let select = dao
        .procedure(procs.get(StandardProc::SelectOne).unwrap(), Some(StandardProc::SelectOne))
        .unwrap();
    assert!(select.fetches());
    assert_eq!(select.input.unwrap().class_name, "OrdersKey");
    assert_eq!(select.results.len(), 4);
}

#[test]
fn declared_procedure_substitutes_dynamics() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    let dao = DaoContext::new(&ctx, Dialect::Postgres, Flavour::Standard);
    let spec = dao.procedure(declared(ctx.table, "ByStatus"), None).unwrap();

    assert_eq!(spec.class_name, "OrdersByStatus");
    assert_eq!(spec.input.as_ref().unwrap().class_name, "OrdersByStatusIn");
    assert_eq!(spec.output.as_ref().unwrap().class_name, "OrdersByStatusOut");
    assert_eq!(spec.sql, "select id, total from Orders where status = $1 order by [orderBy]");
    assert_eq!(spec.binds.len(), 1);
    assert_eq!(spec.dynamics[0].marker, "[orderBy]");
    assert_eq!(spec.dynamics[0].path, vec!["orderBy".to_string()]);
    assert_eq!(spec.results, vec![vec!["id".to_string()], vec!["total".to_string()]]);
}

#[test]
fn single_record_input_uses_the_table_record() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    let dao = DaoContext::new(&ctx, Dialect::Postgres, Flavour::Standard);
    let spec = dao.procedure(declared(ctx.table, "Save"), None).unwrap();

    assert_eq!(spec.input.as_ref(), Some(&ctx.table_record));
    assert_eq!(spec.sql, "update Orders set total = $2 where id = $1");
    assert_eq!(spec.binds[0].token, "rec_id");
    assert_eq!(spec.binds[0].path, vec!["id".to_string()]);
    assert_eq!(spec.input_fields.len(), 4);
    assert!(spec.stamps.is_empty());
}

#[test]
fn missing_dialect_sql_is_an_error() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    let dao = DaoContext::new(&ctx, Dialect::Postgres, Flavour::Standard);
    let err = dao.procedure(declared(ctx.table, "Purge"), None).unwrap_err();
    assert!(matches!(
        err,
        Error::MissingSql { procedure, dialect: "postgres", .. } if procedure == "Purge"
    ));

    let mssql = DaoContext::new(&ctx, Dialect::Mssql, Flavour::Standard);
    let spec = mssql.procedure(declared(ctx.table, "Purge"), None).unwrap();
    assert_eq!(spec.sql, "delete from Orders where created < @before");
}

fn nested_schema() -> Schema {
    let customer = Table::new("Customer")
        .with_column(Column::new("cid", TypeTag::Seq32))
        .with_column(Column::new("name", TypeTag::String))
        .with_primary_key("cid");
    let orders = Table::new("Orders")
        .with_column(Column::new("id", TypeTag::Seq64))
        .with_column(Column::record("cust", Lookup::Table("Customer".to_string())))
        .with_column(Column::new("total", TypeTag::Double))
        .with_primary_key("id")
        .with_capabilities(Capabilities::all())
        .with_procedure(
            Procedure::new("ForCustomer")
                .with_in_field(Column::record("cust", Lookup::Table("Customer".to_string())))
                .with_in_field(Column::new("total", TypeTag::Double))
                .with_sql(
                    "std",
                    "update Orders set total = :total where cust_cid = :cust_cid and cust_name = :cust_name"
                )
        );
    Schema::from_tables([customer, orders]).unwrap()
}

/// Numbers of `$N` / `?N` placeholders, in order of appearance.
fn positional(sql: &str, marker: char) -> Vec<usize> {
    let mut out = Vec::new();
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c != marker {
            continue;
        }
        let mut digits = String::new();
        while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
            digits.push(*d);
            chars.next();
        }
        out.push(digits.parse().unwrap());
    }
    out
}

/// Names of `@name` placeholders, in order of appearance.
fn named(sql: &str) -> Vec<String> {
    sql.split('@')
        .skip(1)
        .map(|rest| {
            rest.chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect()
        })
        .collect()
}

fn assert_placeholders_match_binds(spec: &ProcedureSpec<'_>, dialect: Dialect) {
    let tokens: Vec<String> = spec.binds.iter().map(|b| b.token.clone()).collect();
    let used: BTreeSet<usize> = match dialect {
        Dialect::Mssql => named(&spec.sql)
            .iter()
            .map(|n| {
                tokens
                    .iter()
                    .position(|t| t == n)
                    .unwrap_or_else(|| panic!("{}: @{n} has no bind in {tokens:?}", spec.name))
                    + 1
            })
            .collect(),
        Dialect::Postgres => positional(&spec.sql, '$').into_iter().collect(),
        Dialect::Sqlite => positional(&spec.sql, '?').into_iter().collect()
    };
    let expected: BTreeSet<usize> = (1..=tokens.len()).collect();
    assert_eq!(used, expected, "{} on {dialect}: {} with binds {tokens:?}", spec.name, spec.sql);
}

#[test]
fn standard_sql_and_binds_share_columns_with_record_column() {
    let fixture = Fixture::with_schema(nested_schema());
    let ctx = fixture.context();
    for dialect in Dialect::ALL {
        let dao = DaoContext::new(&ctx, dialect, Flavour::Standard);
        let procs = dao.standard_procs();
        for (kind, proc) in procs.iter() {
            let spec = dao.procedure(proc, Some(kind)).unwrap();
            assert!(spec.binds.iter().all(|b| !b.token.starts_with("cust_")));
            assert!(!spec.sql.contains("cust"));
            assert_placeholders_match_binds(&spec, dialect);
        }
    }
}

#[test]
fn post_insert_binds_only_the_remaining_columns() {
    let fixture = Fixture::with_schema(nested_schema());
    let ctx = fixture.context();
    let dao = DaoContext::new(&ctx, Dialect::Sqlite, Flavour::Standard);
    let procs = dao.standard_procs();
    let spec = dao
        .procedure(procs.get(StandardProc::Insert).unwrap(), Some(StandardProc::Insert))
        .unwrap();
    let tokens: Vec<_> = spec.binds.iter().map(|b| b.token.as_str()).collect();
    assert_eq!(tokens, vec!["total"]);
    assert_eq!(positional(&spec.sql, '?'), vec![1]);
    assert_eq!(spec.sequence.unwrap().path, vec!["id".to_string()]);
}

#[test]
fn declared_record_input_binds_every_nested_column() {
    let fixture = Fixture::with_schema(nested_schema());
    let ctx = fixture.context();
    for dialect in Dialect::ALL {
        let dao = DaoContext::new(&ctx, dialect, Flavour::Standard);
        let spec = dao.procedure(declared(ctx.table, "ForCustomer"), None).unwrap();
        let tokens: Vec<_> = spec.binds.iter().map(|b| b.token.as_str()).collect();
        assert_eq!(tokens, vec!["cust_cid", "cust_name", "total"]);
        assert_eq!(spec.binds[0].path, vec!["cust".to_string(), "cid".to_string()]);
        assert!(spec.sequence.is_none());
        assert_placeholders_match_binds(&spec, dialect);
    }
}
