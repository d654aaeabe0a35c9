// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Python 3 target on the `mettle` runtime.
//!
//! # Output
//!
//! | Artifact | File | Shape |
//! |----------|------|-------|
//! | Record | `tables/Orders.py` | `class Orders(mettle.io.ISerializable)` with `List` |
//! | DAO shell | `dao/postgres/OrdersDao.py` | convenience methods over the procedure DAOs |
//! | Procedure DAO | `dao/postgres/OrdersSelectOne.py` | `exec`, `fetch`, `fetch_all` |
//! | Index | `__init__.py` per directory | re-exports every class |

use std::{collections::BTreeSet, path::PathBuf};

use schemagen_core::TypeTag;

use super::{Code, HEADER};
use crate::{
    config::{CasingConfig, Flavour, TargetOptions},
    dav::{ConstructorStyle, DavArg, DavEmission, DavGuard, LiteralStyle, escape},
    dialect::SequenceMode,
    error::Result,
    generator::{
        DaoContext, Document, GenerationContext, Generator, Manifest,
        model::{
            CoupletSpec, DaoShellSpec, FieldSpec, ProcedureSpec, RecordKind, RecordRef,
            RecordSpec
        }
    },
    naming::Casing,
    procs::StandardProc,
    types::{FieldMap, TypeCatalog, TypeFlag}
};

const STYLE: ConstructorStyle = ConstructorStyle {
    ctor_date:        "datetime.date",
    ctor_time:        "datetime.time",
    ctor_datetime:    "datetime.datetime",
    zero_based_month: false,
    quote:            '\''
};

const INDENT: &str = "    ";

/// Python 3 generator.
#[derive(Debug, Clone)]
pub struct PythonGenerator {
    catalog: TypeCatalog
}

impl PythonGenerator {
    /// Generator with the standard type mapping.
    #[must_use]
    pub fn new() -> Self {
        let int = || FieldMap::new("int", TypeFlag::Int, "0");
        let text = || FieldMap::new("str", TypeFlag::Str, "''");
        let datetime = || FieldMap::new("datetime.datetime", TypeFlag::Date, "datetime.datetime.min");
        Self {
            catalog: TypeCatalog::new("python3")
                .with(TypeTag::Bool, FieldMap::new("bool", TypeFlag::Bool, "False"))
                .with(TypeTag::Int8, int())
                .with(TypeTag::Int16, int())
                .with(TypeTag::Int32, int())
                .with(TypeTag::Int64, int())
                .with(TypeTag::Seq32, int())
                .with(TypeTag::Seq64, int())
                .with(TypeTag::Char, text())
                .with(TypeTag::String, text())
                .with(TypeTag::Dynamic, text())
                .with(TypeTag::Uuid, FieldMap::new("uuid.UUID", TypeFlag::Uuid, "None"))
                .with(
                    TypeTag::Date,
                    FieldMap::new("datetime.date", TypeFlag::Date, "datetime.date.min")
                )
                .with(
                    TypeTag::Time,
                    FieldMap::new("datetime.time", TypeFlag::Date, "datetime.time.min")
                )
                .with(TypeTag::DateTime, datetime())
                .with(TypeTag::Timestamp, datetime())
                .with(TypeTag::Memblock, FieldMap::new("bytearray", TypeFlag::Memblock, "b''"))
                .with(TypeTag::Double, FieldMap::new("float", TypeFlag::Double, "0.0"))
                .with(TypeTag::Json, FieldMap::new("dict", TypeFlag::Json, "None"))
                .with(TypeTag::DbRec, FieldMap::new("table", TypeFlag::DbRec, "None"))
        }
    }
}

impl Default for PythonGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for PythonGenerator {
    fn name(&self) -> &'static str {
        "python3"
    }

    fn extension(&self) -> &'static str {
        "py"
    }

    fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    fn literal_style(&self) -> &dyn LiteralStyle {
        &STYLE
    }

    fn default_casing(&self) -> CasingConfig {
        CasingConfig::new(Casing::Pascal, Casing::Camel, Casing::Camel, Casing::Pascal)
    }

    fn emit_record(&self, ctx: &GenerationContext<'_>, spec: &RecordSpec<'_>) -> Result<String> {
        let mut code = header();
        code.line("import copy")
            .line("import datetime")
            .line("import uuid")
            .line("import mettle.lib")
            .line("import mettle.io")
            .line("import mettle.db")
            .blank();
        if !spec.imports.is_empty() {
            for import in &spec.imports {
                code.line(format!("from .{} import {}", import.file_stem, import.class_name));
            }
            code.blank();
        }

        let class = &spec.record.class_name;
        let method = |raw: &str| ctx.policy.method(raw);
        let bases = if spec.key.is_some() {
            "mettle.io.ISerializable, mettle.db.IPrimaryKey"
        } else {
            "mettle.io.ISerializable"
        };
        code.blank().line(format!("class {class}({bases}):")).indented(|c| {
            c.blank();
            constructor(c, &spec.fields);
            c.line(format!("def {}(self):", method("Clear"))).indented(|c| {
                doc(c, "Clears all member variables for this database record.");
                for field in &spec.fields {
                    match &field.record {
                        Some(_) => c.line(format!("self.{}.{}()", field.member, method("Clear"))),
                        None => c.line(format!("self.{} = {}", field.member, field.map.default_value))
                    };
                }
                if spec.fields.is_empty() {
                    c.line("pass");
                }
            });
            c.blank();
            c.line("def _name(self) -> str:").indented(|c| {
                doc(c, "Name of the record.");
                c.line(format!("return '{class}'"));
            });
            c.blank();
            serializer(c, &spec.fields);
            c.line(format!("def _copy_from(self, rec: \"{class}\"):")).indented(|c| {
                doc(c, "Copies the columns from rec into this record.");
                copy_fields(c, "self.", &spec.fields, "rec.");
            });
            c.blank();
            if let Some(key) = &spec.key {
                let key_class = &key.record.class_name;
                c.line(format!("def _write_key(self, _key: {key_class}):")).indented(|c| {
                    doc(c, "Write the primary key columns to _key.");
                    copy_fields(c, "_key.", &key.fields, "self.");
                });
                c.blank();
                c.line(format!("def _read_key(self, _key: {key_class}):")).indented(|c| {
                    doc(c, "Read the primary key columns from _key.");
                    copy_fields(c, "self.", &key.fields, "_key.");
                });
                c.blank();
                c.line("def _serialize_key(self, _w: mettle.io.IWriter):").indented(|c| {
                    c.line(format!("_key = {key_class}()"))
                        .line("self._write_key(_key)")
                        .line("_key._serialize(_w)");
                });
                c.blank();
                c.line("def _deserialize_key(self, _r: mettle.io.IReader):").indented(|c| {
                    c.line(format!("_key = {key_class}()"))
                        .line("_key._deserialize(_r)")
                        .line("self._read_key(_key)");
                });
                c.blank();
            }
            match (spec.kind, &spec.key) {
                (RecordKind::Key, _) => key_compare(c, class, &spec.fields),
                (RecordKind::Main, Some(key)) => key_compare(c, class, &key.fields),
                _ => {}
            }
            if spec.kind != RecordKind::QueryOut {
                davs(c, spec);
            }
            for couplet in &spec.couplets {
                couplet_class(c, class, couplet);
            }
            c.line("def __repr__(self) -> str:").indented(|c| {
                let parts: Vec<String> = spec
                    .fields
                    .iter()
                    .map(|f| format!("{}:{{self.{}!r}}", f.member, f.member))
                    .collect();
                c.line(format!("return f'<{class} [{}]>'", parts.join(", ")));
            });
            c.blank();
            list_class(c, class, spec.kind != RecordKind::QueryOut, spec.kind == RecordKind::Main);
        });
        Ok(code.finish())
    }

    fn emit_dao_shell(&self, ctx: &DaoContext<'_>, spec: &DaoShellSpec<'_>) -> Result<String> {
        let flavour = Async::of(ctx.flavour);
        let options = ctx.base.options;
        let method = |raw: &str| ctx.base.policy.method(raw);
        let mut code = header();
        if flavour.on {
            code.line("import asyncio");
        }
        code.line("import mettle.db").blank();
        code.line(import_line(options, &spec.table_record));
        if let Some(key) = &spec.key {
            code.line(import_line(options, &key.record));
        }
        code.blank();
        for proc in &spec.procedures {
            code.line(format!("from .{} import {}", proc.file_stem, proc.class_name));
        }

        let rec = &spec.table_record.class_name;
        code.blank().blank().line(format!("class {}:", spec.class_name)).indented(|c| {
            c.blank();
            c.line(format!("def __init__(self, dbcon: mettle.db.{}):", flavour.conn))
                .indented(|c| {
                    doc(c, "Constructor.\n\n:param dbcon: Mettle database connection object.");
                    c.line(format!("self.rec = {rec}()")).line("self._dbcon = dbcon");
                });
            c.blank();
            c.line("def __enter__(self):").indented(|c| {
                c.line("return self");
            });
            c.blank();
            c.line("def __exit__(self, type, value, traceback):").indented(|c| {
                c.line("pass");
            });
            c.blank();

            let key_args = spec
                .key
                .as_ref()
                .map(|k| arguments(&k.fields, false))
                .unwrap_or_default();
            let key_names = spec
                .key
                .as_ref()
                .map(|k| k.fields.iter().map(|f| f.member.clone()).collect::<Vec<_>>().join(", "))
                .unwrap_or_default();

            for proc in &spec.procedures {
                let name = method(proc.standard.name());
                let qry = &proc.class_name;
                let (aw, def) = (flavour.await_, flavour.def());
                match proc.standard {
                    StandardProc::LockOne | StandardProc::SelectOne => {
                        c.line(format!("{def} {name}(self{key_args}) -> bool:")).indented(|c| {
                            c.line(format!("with {qry}(self._dbcon) as _qry:")).indented(|c| {
                                c.line(format!("{aw}_qry.{}({key_names})", method("ExecDeft")))
                                    .line(format!("if not {aw}_qry.{}():", method("Fetch")))
                                    .indented(|c| {
                                        c.line("return False");
                                    })
                                    .line("self.rec._copy_from(_qry.orec)")
                                    .line("return True");
                            });
                        });
                    }
                    StandardProc::Update | StandardProc::Insert => {
                        c.line(format!("{def} {name}(self, rec: {rec} = None) -> \"{}\":", spec.class_name))
                            .indented(|c| {
                                c.line("if rec:")
                                    .indented(|c| {
                                        c.line("self.rec._copy_from(rec)");
                                    })
                                    .line(format!("with {qry}(self._dbcon) as _qry:"))
                                    .indented(|c| {
                                        c.line(format!("{aw}_qry.{}(self.rec)", method("Exec")));
                                    })
                                    .line("if rec:")
                                    .indented(|c| {
                                        c.line("rec._copy_from(self.rec)");
                                    })
                                    .line("return self");
                            });
                    }
                    StandardProc::DeleteOne => {
                        c.line(format!("{def} {name}(self{key_args}) -> \"{}\":", spec.class_name))
                            .indented(|c| {
                                c.line(format!("with {qry}(self._dbcon) as _qry:"))
                                    .indented(|c| {
                                        c.line(format!("{aw}_qry.{}({key_names})", method("ExecDeft")));
                                    })
                                    .line("return self");
                            });
                    }
                    StandardProc::DeleteAll => {
                        c.line(format!("{def} {name}(self) -> \"{}\":", spec.class_name))
                            .indented(|c| {
                                c.line(format!("with {qry}(self._dbcon) as _qry:"))
                                    .indented(|c| {
                                        c.line(format!("{aw}_qry.{}()", method("Exec")));
                                    })
                                    .line("return self");
                            });
                    }
                    StandardProc::SelectAll => {
                        c.line(format!("{def} {name}(self, out_list: {rec}.List) -> int:"))
                            .indented(|c| {
                                c.line(format!("with {qry}(self._dbcon) as _qry:")).indented(|c| {
                                    c.line(format!("{aw}_qry.{}()", method("Exec"))).line(format!(
                                        "return {aw}_qry.{}(out_list)",
                                        method("FetchAll")
                                    ));
                                });
                            });
                    }
                }
                c.blank();
            }
        });
        Ok(code.finish())
    }

    fn emit_procedure(&self, ctx: &DaoContext<'_>, spec: &ProcedureSpec<'_>) -> Result<String> {
        let flavour = Async::of(ctx.flavour);
        let options = ctx.base.options;
        let method = |raw: &str| ctx.base.policy.method(raw);
        let (aw, def) = (flavour.await_, flavour.def());
        let statement = format!("{}{}", ctx.base.table.name, spec.name);
        let stmnt_type = if spec.fetches() { "STMNT_TYPE_READ" } else { "STMNT_TYPE_CUD" };

        let mut code = header();
        code.line("import copy")
            .line("import datetime")
            .line("import uuid")
            .line("import mettle.lib")
            .line("import mettle.db")
            .blank();
        for import in &spec.imports {
            code.line(import_line(options, import));
        }

        code.blank().blank().line(format!("class {}:", spec.class_name)).indented(|c| {
            c.blank();
            c.line(format!("def __init__(self, dbcon: mettle.db.{}):", flavour.conn))
                .indented(|c| {
                    doc(c, "Constructor.\n\n:param dbcon: Mettle database connection object.");
                    c.line("self._dbcon = dbcon").line("self._dbstmnt = None");
                    if let Some(input) = &spec.input {
                        c.line(format!("self.irec = {}()", input.class_name));
                    }
                    if let Some(output) = &spec.output {
                        c.line(format!("self.orec = {}()", output.class_name));
                    }
                });
            c.blank();
            c.line("def __del__(self):").indented(|c| {
                c.line("self._destroy()");
            });
            c.blank();
            c.line("def __enter__(self):").indented(|c| {
                c.line("return self");
            });
            c.blank();
            c.line("def __exit__(self, type, value, traceback):").indented(|c| {
                c.line("self._destroy()");
            });
            c.blank();
            c.line("def _destroy(self):").indented(|c| {
                c.line("if self._dbstmnt is None:")
                    .indented(|c| {
                        c.line("return");
                    })
                    .line("del self._dbstmnt")
                    .line("self._dbstmnt = None");
            });
            c.blank();

            if let Some(input) = &spec.input {
                let stamped = |f: &&FieldSpec<'_>| {
                    !(f.column.type_tag == TypeTag::Timestamp && !spec.stamps.is_empty())
                };
                let args: Vec<FieldSpec<'_>> =
                    spec.input_fields.iter().filter(stamped).cloned().collect();
                c.line(format!(
                    "{def} {}(self{}) -> \"{}\":",
                    method("ExecDeft"),
                    arguments(&args, false),
                    spec.class_name
                ))
                .indented(|c| {
                    doc(c, "Execute the query by setting all the inputs.");
                    copy_fields(c, "self.irec.", &args, "");
                    c.line(format!("return {aw}self.{}()", method("Exec")));
                });
                c.blank();
                c.line(format!(
                    "{def} {}(self, irec: {} = None) -> \"{}\":",
                    method("Exec"),
                    input.class_name,
                    spec.class_name
                ))
                .indented(|c| {
                    doc(c, "Execute the query, optionally passing in the input record.");
                    c.line("if irec:").indented(|c| {
                        c.line("self.irec._copy_from(irec)");
                    });
                    exec_body(c, ctx, spec, &statement, stmnt_type, aw);
                    c.line("if irec:").indented(|c| {
                        c.line("irec._copy_from(self.irec)");
                    });
                    c.line("return self");
                });
            } else {
                c.line(format!("{def} {}(self) -> \"{}\":", method("Exec"), spec.class_name))
                    .indented(|c| {
                        doc(c, "Execute the query.");
                        exec_body(c, ctx, spec, &statement, stmnt_type, aw);
                        c.line("return self");
                    });
            }
            c.blank();

            if let Some(output) = spec.output.as_ref().filter(|_| spec.fetches()) {
                c.line(format!("{def} {}(self) -> bool:", method("Fetch"))).indented(|c| {
                    doc(c, "Fetches the next row from the executed query.");
                    c.line(format!("if not {aw}self._dbcon.fetch(self._dbstmnt):"))
                        .indented(|c| {
                            c.line("return False");
                        });
                    for (index, path) in spec.results.iter().enumerate() {
                        c.line(format!("self.orec.{} = self._dbstmnt.result[{index}]", path.join(".")));
                    }
                    c.line("return True");
                });
                c.blank();
                c.line(format!(
                    "{def} {}(self, out_list: {}.List, clear_list: bool = True) -> int:",
                    method("FetchAll"),
                    output.class_name
                ))
                .indented(|c| {
                    doc(c, "Fetch all the rows into out_list and return the list count.");
                    c.line("if clear_list:")
                        .indented(|c| {
                            c.line("out_list.clear()");
                        })
                        .line(format!("while {aw}self.{}():", method("Fetch")))
                        .indented(|c| {
                            c.line("out_list.append(copy.deepcopy(self.orec))");
                        })
                        .line("return len(out_list)");
                });
                c.blank();
            }
        });
        Ok(code.finish())
    }

    fn emit_index(&self, options: &TargetOptions, manifest: &Manifest) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        let mut packages = BTreeSet::new();
        for (dir, entries) in manifest.dirs() {
            let mut code = header();
            for entry in entries {
                if let Some(class) = &entry.class_name {
                    code.line(format!("from .{} import {}", entry.stem, class));
                }
            }
            docs.push(index_doc(options, dir.to_path_buf(), code.finish()));
            for ancestor in dir.ancestors().skip(1) {
                packages.insert(ancestor.to_path_buf());
            }
        }
        for dir in packages {
            if manifest.dirs().any(|(d, _)| d == dir.as_path()) {
                continue;
            }
            docs.push(index_doc(options, dir, header().finish()));
        }
        Ok(docs)
    }
}

/// Keywords that differ between the flavours.
struct Async {
    on: bool,

    await_: &'static str,

    conn: &'static str
}

impl Async {
    fn of(flavour: Flavour) -> Self {
        match flavour {
            Flavour::Standard => Self {
                on:     false,
                await_: "",
                conn:   "IConnect"
            },
            Flavour::Async => Self {
                on:     true,
                await_: "await ",
                conn:   "IAConnect"
            }
        }
    }

    fn def(&self) -> &'static str {
        if self.on { "async def" } else { "def" }
    }
}

fn header() -> Code {
    let mut code = Code::new(INDENT);
    code.line(format!("# {HEADER}")).line("#").blank();
    code
}

fn doc(c: &mut Code, text: &str) {
    c.line("\"\"\"");
    for line in text.lines() {
        c.line(line);
    }
    c.line("\"\"\"");
}

fn index_doc(options: &TargetOptions, dir: PathBuf, body: String) -> Document {
    Document {
        namespace: Document::namespace_of(&options.namespace, &dir),
        dir,
        stem: "__init__".to_string(),
        extension: "py",
        class_name: None,
        body
    }
}

fn import_line(options: &TargetOptions, record: &RecordRef) -> String {
    let module = Document::namespace_of(&options.namespace, &record.dir);
    format!("from {module}.{} import {}", record.file_stem, record.class_name)
}

fn type_name(field: &FieldSpec<'_>) -> String {
    field.type_name().to_string()
}

fn arguments(fields: &[FieldSpec<'_>], with_defaults: bool) -> String {
    let mut out = String::new();
    for field in fields {
        out.push_str(&format!(", {}: {}", field.member, type_name(field)));
        if with_defaults {
            out.push_str(&format!(" = {}", field.map.default_value));
        }
    }
    out
}

fn constructor(c: &mut Code, fields: &[FieldSpec<'_>]) {
    let args: Vec<FieldSpec<'_>> = fields.iter().filter(|f| f.in_constructor()).cloned().collect();
    c.line(format!("def __init__(self{}):", arguments(&args, true)))
        .indented(|c| {
            doc(c, "Constructor.");
            for field in fields {
                match (&field.record, field.in_constructor()) {
                    (Some(record), _) => {
                        c.line(format!("self.{} = {}()", field.member, record.class_name))
                            .line(format!("if {}:", field.member))
                            .indented(|c| {
                                c.line(format!("self.{0}._copy_from({0})", field.member));
                            });
                    }
                    (None, true) => {
                        c.line(format!("self.{0} = {0}", field.member));
                    }
                    (None, false) => {
                        c.line(format!("self.{} = {}", field.member, field.map.default_value));
                    }
                }
            }
            if fields.is_empty() {
                c.line("pass");
            }
        })
        .blank();
}

fn copy_fields(c: &mut Code, to: &str, fields: &[FieldSpec<'_>], from: &str) {
    for field in fields {
        if field.record.is_some() {
            c.line(format!("{to}{0}._copy_from({from}{0})", field.member));
        } else {
            c.line(format!("{to}{0} = {from}{0}", field.member));
        }
    }
    if fields.is_empty() {
        c.line("pass");
    }
}

/// `_pk_compare` and the rich comparisons, ordering by the key fields in
/// column order. Numbers subtract; everything else compares.
fn key_compare(c: &mut Code, class: &str, key: &[FieldSpec<'_>]) {
    c.line("@staticmethod");
    c.line(format!("def _pk_compare(_a: \"{class}\", _b: \"{class}\") -> int:")).indented(|c| {
        doc(c, "Compares the primary key columns of _a and _b.");
        let Some((last, rest)) = key.split_last() else {
            c.line("return 0");
            return;
        };
        for field in rest {
            c.line(format!("_r = {}", key_difference(field)));
            c.line("if _r != 0:").indented(|c| {
                c.line("return _r");
            });
        }
        c.line(format!("return {}", key_difference(last)));
    });
    c.blank();
    for (dunder, op) in [
        ("__lt__", "<"),
        ("__gt__", ">"),
        ("__eq__", "=="),
        ("__le__", "<="),
        ("__ge__", ">="),
        ("__ne__", "!=")
    ] {
        c.line(format!("def {dunder}(self, _other: \"{class}\") -> bool:")).indented(|c| {
            c.line(format!("return {class}._pk_compare(self, _other) {op} 0"));
        });
        c.blank();
    }
}

fn key_difference(field: &FieldSpec<'_>) -> String {
    let member = &field.member;
    let tag = field.column.type_tag;
    if field.record.is_none() && (tag.is_integer() || tag.is_float()) {
        format!("_a.{member} - _b.{member}")
    } else {
        format!("(_a.{member} > _b.{member}) - (_a.{member} < _b.{member})")
    }
}

fn io_suffix(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::Int8 => "int8",
        TypeTag::Int16 => "int16",
        TypeTag::Int32 | TypeTag::Seq32 => "int32",
        TypeTag::Int64 | TypeTag::Seq64 => "int64",
        TypeTag::Char => "char",
        TypeTag::Bool => "bool",
        TypeTag::Double => "double",
        TypeTag::String | TypeTag::Dynamic | TypeTag::DbRec => "string",
        TypeTag::Json => "json",
        TypeTag::DateTime | TypeTag::Timestamp => "datetime",
        TypeTag::Date => "date",
        TypeTag::Time => "time",
        TypeTag::Memblock => "bytearray",
        TypeTag::Uuid => "guid"
    }
}

fn serializer(c: &mut Code, fields: &[FieldSpec<'_>]) {
    c.line("def _serialize(self, _w: mettle.io.IWriter, _oname: str = None):")
        .indented(|c| {
            doc(c, "Serialize record to a stream.");
            c.line("if _oname is None:")
                .indented(|c| {
                    c.line("_oname = self._name()");
                })
                .line("_w.write_start(_oname)");
            for field in fields {
                if field.record.is_some() {
                    c.line(format!("self.{}._serialize(_w)", field.member));
                } else {
                    c.line(format!(
                        "_w.write_{}(\"{}\", self.{})",
                        io_suffix(field.column.type_tag),
                        field.member,
                        field.member
                    ));
                }
            }
            c.line("_w.write_end(_oname)");
        })
        .blank();
    c.line("def _deserialize(self, _r: mettle.io.IReader, _oname: str = None):")
        .indented(|c| {
            doc(c, "Deserialize record from a stream.");
            c.line("if _oname is None:")
                .indented(|c| {
                    c.line("_oname = self._name()");
                })
                .line("_r.read_start(_oname)");
            for field in fields {
                if field.record.is_some() {
                    c.line(format!("self.{}._deserialize(_r)", field.member));
                } else {
                    c.line(format!(
                        "self.{} = _r.read_{}(\"{}\")",
                        field.member,
                        io_suffix(field.column.type_tag),
                        field.member
                    ));
                }
            }
            c.line("_r.read_end(_oname)");
        })
        .blank();
}

fn dav_line(emission: &DavEmission) -> String {
    let kind = format!("mettle.lib.Dav.eDavType.{}", emission.rule.name());
    let arg = match &emission.arg {
        DavArg::None => String::new(),
        DavArg::Number(n) | DavArg::Temporal(n) => format!(", {n}"),
        DavArg::Text(t) => format!(", \"{}\"", escape(t, '"')),
        list @ DavArg::List { .. } => format!(", [{}]", list.joined(STYLE.quote))
    };
    format!("dvc.add_targ(\"{}\", mettle.lib.Dav({kind}{arg}))", emission.column)
}

fn dav_lines(c: &mut Code, emissions: &[DavEmission]) {
    let mut i = 0;
    while i < emissions.len() {
        if emissions[i].guard == DavGuard::UnlessForInsert {
            let start = i;
            while i < emissions.len() && emissions[i].guard == DavGuard::UnlessForInsert {
                i += 1;
            }
            c.line("if not for_ins:").indented(|c| {
                for emission in &emissions[start..i] {
                    c.line(dav_line(emission));
                }
            });
        } else {
            c.line(dav_line(&emissions[i]));
            i += 1;
        }
    }
}

fn davs(c: &mut Code, spec: &RecordSpec<'_>) {
    let class = &spec.record.class_name;
    let main = spec.kind == RecordKind::Main;
    let (params, args) = if main {
        (", for_ins: bool = False, key_only: bool = False", ", for_ins, key_only")
    } else {
        ("", "")
    };
    c.line("@staticmethod")
        .line(format!("def _cache_davs(dvc=None{params}):"))
        .indented(|c| {
            doc(
                c,
                "Cache the DAV into the dav cache (or create one) and return it.\n\n\
                 :param dvc: (mettle.lib.DavCache), target cache, if None a new one is created."
            );
            c.line("if dvc is None:").indented(|c| {
                c.line("dvc = mettle.lib.DavCache()");
            });
            dav_lines(c, &spec.davs.key);
            if spec.davs.key_only_exit {
                c.line("if key_only:").indented(|c| {
                    c.line("return dvc");
                });
            }
            dav_lines(c, &spec.davs.rest);
            c.line("return dvc");
        })
        .blank();
    c.line(format!("def _get_davs(self, dvc=None{params}):"))
        .indented(|c| {
            c.line(format!("return {class}._cache_davs(dvc{args})"));
        })
        .blank();
}

fn couplet_class(c: &mut Code, record: &str, couplet: &CoupletSpec<'_>) {
    let quoted = couplet.column.type_tag.is_textual();
    let class = &couplet.class_name;
    c.line(format!("class {class}(dict):")).indented(|c| {
        for entry in &couplet.entries {
            let key = if quoted {
                format!("\"{}\"", escape(&entry.key, '"'))
            } else {
                entry.key.clone()
            };
            c.line(format!("{} = {key}", entry.key_member));
        }
        c.blank();
        for entry in &couplet.entries {
            c.line(format!("{} = \"{}\"", entry.value_member, escape(&entry.label, '"')));
        }
        c.blank();
        c.line("def __init__(self):").indented(|c| {
            for entry in &couplet.entries {
                c.line(format!("self[self.{}] = self.{}", entry.key_member, entry.value_member));
            }
        });
        c.blank();
        c.line("@staticmethod")
            .line(format!("def {}(key):", couplet.get_value))
            .indented(|c| {
                for entry in &couplet.entries {
                    c.line(format!("if key == {record}.{class}.{}:", entry.key_member))
                        .indented(|c| {
                            c.line(format!("return {record}.{class}.{}", entry.value_member));
                        });
                }
                c.line("return \"\"");
            });
    });
    c.blank();
}

fn list_class(c: &mut Code, class: &str, with_davs: bool, main: bool) {
    c.line("class List(list, mettle.io.ISerializable):").indented(|c| {
        c.blank();
        c.line("def _name(self) -> str:").indented(|c| {
            c.line(format!("return '{class}.List'"));
        });
        c.blank();
        c.line("def _serialize(self, _w: mettle.io.IWriter, _oname: str = None):")
            .indented(|c| {
                c.line("if _oname is None:")
                    .indented(|c| {
                        c.line("_oname = self._name()");
                    })
                    .line("_w.write_start_list(_oname, len(self))")
                    .line("for _rec in self:")
                    .indented(|c| {
                        c.line("_rec._serialize(_w)");
                    })
                    .line("_w.write_end(_oname)");
            });
        c.blank();
        c.line("def _deserialize(self, _r: mettle.io.IReader, _oname: str = None):")
            .indented(|c| {
                c.line("if _oname is None:")
                    .indented(|c| {
                        c.line("_oname = self._name()");
                    })
                    .line("_cnt = _r.read_start_list(_oname)")
                    .line("while _cnt >= 1:")
                    .indented(|c| {
                        c.line(format!("_rec = {class}()"))
                            .line("_cnt -= 1")
                            .line("_rec._deserialize(_r)")
                            .line("self.append(_rec)");
                    })
                    .line("_r.read_end(_oname)");
            });
        c.blank();
        c.line("def __repr__(self) -> str:").indented(|c| {
            c.line(format!("return '<{class}.List[%d]>' % (len(self))"));
        });
        if with_davs {
            let (params, args) = if main {
                (", for_ins: bool = False, key_only: bool = False", ", for_ins, key_only")
            } else {
                ("", "")
            };
            c.blank();
            c.line(format!("def _get_davs(self, dvc=None{params}):")).indented(|c| {
                c.line(format!("return {class}._cache_davs(dvc{args})"));
            });
        }
    });
}

fn exec_body(
    c: &mut Code,
    ctx: &DaoContext<'_>,
    spec: &ProcedureSpec<'_>,
    statement: &str,
    stmnt_type: &str,
    aw: &str
) {
    let table = &ctx.base.table.name;
    c.line("self._destroy()").line(format!(
        "self._dbstmnt = {aw}self._dbcon.statement(\"{statement}\", self._dbcon.{stmnt_type})"
    ));
    let sequence = |c: &mut Code, mode: SequenceMode, call: &str| {
        if let Some(seq) = &spec.sequence
            && seq.mode == mode
        {
            let size = if ctx
                .base
                .table
                .column(&seq.column)
                .is_some_and(|col| col.type_tag == TypeTag::Seq32)
            {
                4
            } else {
                8
            };
            c.line(format!(
                "self.irec.{} = {aw}self._dbcon.{call}(self._dbstmnt, \"{table}\", \"{}\", {size})",
                seq.path.join("."),
                seq.column
            ));
        }
    };
    sequence(c, SequenceMode::PreInsert, "pre_get_sequence");

    c.line(format!("self._dbstmnt.sql(\"\"\"{}\"\"\")", spec.sql.replace("\"\"\"", "\\\"\\\"\\\"")));
    for path in &spec.stamps {
        c.line(format!("self.irec.{} = {aw}self._dbcon.get_timestamp()", path.join(".")));
    }
    for dynamic in &spec.dynamics {
        c.line(format!(
            "self._dbstmnt.dynamic(\"{}\", self.irec.{})",
            dynamic.marker,
            dynamic.path.join(".")
        ));
    }
    for bind in &spec.binds {
        let value = format!("self.irec.{}", bind.path.join("."));
        let size = match (bind.column.type_tag, bind.column.length) {
            (TypeTag::Char, _) => ", 1".to_string(),
            (tag, Some(len)) if tag.is_textual() && len > 0 => format!(", {len}"),
            (TypeTag::Int8, _) => ", 1".to_string(),
            (TypeTag::Int16, _) => ", 2".to_string(),
            (TypeTag::Int32 | TypeTag::Seq32, _) => ", 4".to_string(),
            (TypeTag::Int64 | TypeTag::Seq64, _) => ", 8".to_string(),
            _ => String::new()
        };
        c.line(format!(
            "self._dbstmnt.bind_in(\"{}\", {value}, {}{size})",
            bind.token, bind.map.name
        ));
    }
    if spec.standard == Some(StandardProc::LockOne) {
        c.line(format!("{aw}self._dbcon.lock(self._dbstmnt)"));
    }
    c.line(format!("{aw}self._dbcon.execute(self._dbstmnt)"));
    sequence(c, SequenceMode::PostInsert, "post_get_sequence");
}

#[cfg(test)]
mod tests {
    use schemagen_core::{Capabilities, Column, Procedure, Schema, Table};

    use super::*;
    use crate::{config::RawTargetOptions, dialect::Dialect, generator::{Mode, Target, TargetKind}};

    fn schema() -> Schema {
        Schema::from_tables([Table::new("Orders")
            .with_column(Column::new("id", TypeTag::Seq64))
            .with_column(Column::new("total", TypeTag::Double).with_not_null(true))
            .with_column(
                Column::new("status", TypeTag::Char)
                    .with_couplet("A", "Active")
                    .with_couplet("X", "Closed")
            )
            .with_column(Column::new("created", TypeTag::Timestamp))
            .with_primary_key("id")
            .with_capabilities(Capabilities {
                insert: true,
                select_one: true,
                ..Capabilities::default()
            })
            .with_procedure(
                Procedure::new("ByStatus")
                    .with_in_field(Column::new("status", TypeTag::Char))
                    .with_out_field(Column::new("id", TypeTag::Seq64))
                    .with_sql("std", "select id from Orders where status = :status")
            )])
        .unwrap()
    }

    fn body<'a>(outcome: &'a crate::generator::Outcome, path: &str) -> &'a str {
        &outcome
            .documents
            .iter()
            .find(|d| d.relative_path() == std::path::Path::new(path))
            .unwrap_or_else(|| panic!("missing {path}"))
            .body
    }

    fn run() -> crate::generator::Outcome {
        let target = Target::new(TargetKind::Python3, "py", &RawTargetOptions::default()).unwrap();
        let mut outcome = target.generate(&schema(), &[Dialect::Postgres], Mode::Emit).unwrap();
        target.finalize(&mut outcome).unwrap();
        outcome
    }

    #[test]
    fn main_record_layout() {
        let outcome = run();
        let rec = body(&outcome, "tables/Orders.py");
        assert!(rec.starts_with("# Generated by schemagen. Do not edit."));
        assert!(rec.contains("class Orders(mettle.io.ISerializable, mettle.db.IPrimaryKey):"));
        assert!(rec.contains("def __init__(self, id: int = 0, total: float = 0.0, status: str = ''):"));
        assert!(rec.contains("self.created = datetime.datetime.min"));
        assert!(rec.contains("from .OrdersKey import OrdersKey"));
        assert!(rec.contains(
            "        if not for_ins:\n            dvc.add_targ(\"id\", mettle.lib.Dav(mettle.lib.Dav.eDavType.Min, 1))"
        ));
        assert!(rec.contains("        if key_only:\n            return dvc"));
        assert!(rec.contains("mettle.lib.Dav(mettle.lib.Dav.eDavType.In, ['A', 'X'])"));
        assert!(rec.contains("class StatusCouplet(dict):") || rec.contains("class Status(dict):"));
        assert!(rec.contains("keyActive = \"A\""));
        assert!(rec.contains("valueClosed = \"Closed\""));
    }

    #[test]
    fn key_records_compare_by_primary_key() {
        let outcome = run();
        let key = body(&outcome, "tables/OrdersKey.py");
        assert!(key.contains(
            "    @staticmethod\n    def _pk_compare(_a: \"OrdersKey\", _b: \"OrdersKey\") -> int:"
        ));
        assert!(key.contains("        return _a.id - _b.id"));
        assert!(key.contains("    def __le__(self, _other: \"OrdersKey\") -> bool:\n        return OrdersKey._pk_compare(self, _other) <= 0"));

        let rec = body(&outcome, "tables/Orders.py");
        assert!(rec.contains("def _pk_compare(_a: \"Orders\", _b: \"Orders\") -> int:"));
        for op in ["__lt__", "__gt__", "__eq__", "__le__", "__ge__", "__ne__"] {
            assert!(rec.contains(&format!("def {op}(self, _other: \"Orders\") -> bool:")), "{op}");
        }
        assert!(!body(&outcome, "tables/OrdersByStatusIn.py").contains("_pk_compare"));
    }

    #[test]
    fn composite_keys_chain_comparisons() {
        let schema = Schema::from_tables([Table::new("Rate")
            .with_column(Column::new("region", TypeTag::String))
            .with_column(Column::new("tier", TypeTag::Int32))
            .with_primary_key("region")
            .with_primary_key("tier")])
        .unwrap();
        let target = Target::new(TargetKind::Python3, "py", &RawTargetOptions::default()).unwrap();
        let outcome = target.generate(&schema, &[Dialect::Postgres], Mode::Emit).unwrap();
        let key = body(&outcome, "tables/RateKey.py");
        assert!(key.contains(
            "        _r = (_a.region > _b.region) - (_a.region < _b.region)\n        \
             if _r != 0:\n            return _r\n        return _a.tier - _b.tier"
        ));
    }

    #[test]
    fn query_records_and_daos() {
        let outcome = run();
        let qin = body(&outcome, "tables/OrdersByStatusIn.py");
        assert!(qin.contains("class OrdersByStatusIn(mettle.io.ISerializable):"));
        let qout = body(&outcome, "tables/OrdersByStatusOut.py");
        assert!(!qout.contains("_cache_davs"));

        let dao = body(&outcome, "dao/postgres/OrdersByStatus.py");
        assert!(dao.contains("self._dbstmnt.sql(\"\"\"select id from Orders where status = $1\"\"\")"));
        assert!(dao.contains("self._dbstmnt.bind_in(\"status\", self.irec.status, str, 1)"));
        assert!(dao.contains("self.orec.id = self._dbstmnt.result[0]"));

        let insert = body(&outcome, "dao/postgres/OrdersInsert.py");
        assert!(insert.contains("self.irec.id = self._dbcon.pre_get_sequence(self._dbstmnt, \"Orders\", \"id\", 8)"));
        assert!(insert.contains("self.irec.created = self._dbcon.get_timestamp()"));

        let shell = body(&outcome, "dao/postgres/Orders.py");
        assert!(shell.contains("def selectOne(self, id: int) -> bool:"));
        assert!(shell.contains("from .OrdersSelectOne import OrdersSelectOne"));
    }

    #[test]
    fn index_files_for_every_package() {
        let outcome = run();
        let tables = body(&outcome, "tables/__init__.py");
        assert!(tables.contains("from .Orders import Orders"));
        assert!(tables.contains("from .OrdersKey import OrdersKey"));
        assert!(body(&outcome, "dao/postgres/__init__.py").contains("from .OrdersInsert import OrdersInsert"));
        body(&outcome, "dao/__init__.py");
    }

    #[test]
    fn async_flavour_awaits() {
        let raw: RawTargetOptions =
            serde_yaml::from_str("standard: { enabled: false }\nasync: { enabled: true }").unwrap();
        let target = Target::new(TargetKind::Python3, "py", &raw).unwrap();
        let outcome = target.generate(&schema(), &[Dialect::Sqlite], Mode::Emit).unwrap();
        let insert = body(&outcome, "dao/sqlite/OrdersInsert.py");
        assert!(insert.contains("async def exec(self, irec: Orders = None)"));
        assert!(insert.contains("await self._dbcon.execute(self._dbstmnt)"));
        assert!(insert.contains("post_get_sequence"));
        assert!(!insert.contains("bind_in(\"id\""));
    }
}
