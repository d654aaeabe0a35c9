// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! TypeScript target. Records only.
//!
//! Couplet lookup types live in a namespace merged with the record class,
//! so `Orders.Status.keyActive` reads like the other targets.

use std::{collections::BTreeSet, path::PathBuf};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use schemagen_core::TypeTag;

use super::{Code, HEADER};
use crate::{
    config::{CasingConfig, TargetOptions},
    dav::{ConstructorStyle, DavArg, DavEmission, DavGuard, LiteralStyle, escape},
    error::Result,
    generator::{
        Document, GenerationContext, Generator, Manifest,
        model::{CoupletSpec, FieldSpec, RecordKind, RecordSpec}
    },
    naming::Casing,
    types::{FieldMap, TypeCatalog, TypeFlag}
};

const INDENT: &str = "  ";

const DAV_MODULE: &str = "dav";

/// `Date` constructors; a time of day is pinned to the epoch date.
#[derive(Debug, Clone, Copy)]
struct DateStyle(ConstructorStyle);

const STYLE: DateStyle = DateStyle(ConstructorStyle {
    ctor_date:        "new Date",
    ctor_time:        "new Date",
    ctor_datetime:    "new Date",
    zero_based_month: true,
    quote:            '\''
});

impl LiteralStyle for DateStyle {
    fn date(&self, value: NaiveDate) -> String {
        self.0.date(value)
    }

    fn time(&self, value: NaiveTime) -> String {
        format!(
            "{}(1970, 0, 1, {}, {}, {})",
            self.0.ctor_time,
            value.hour(),
            value.minute(),
            value.second()
        )
    }

    fn datetime(&self, value: NaiveDateTime) -> String {
        self.0.datetime(value)
    }

    fn quote(&self) -> char {
        self.0.quote
    }
}

/// TypeScript generator.
#[derive(Debug, Clone)]
pub struct TypeScriptGenerator {
    catalog: TypeCatalog
}

impl TypeScriptGenerator {
    /// Generator with the standard type mapping.
    #[must_use]
    pub fn new() -> Self {
        let number = || FieldMap::new("number", TypeFlag::Int, "0");
        let text = || FieldMap::new("string", TypeFlag::Str, "''");
        let date = || FieldMap::new("Date", TypeFlag::Date, "new Date(0)");
        Self {
            catalog: TypeCatalog::new("typescript")
                .with(TypeTag::Bool, FieldMap::new("boolean", TypeFlag::Bool, "false"))
                .with(TypeTag::Int8, number())
                .with(TypeTag::Int16, number())
                .with(TypeTag::Int32, number())
                .with(TypeTag::Int64, number())
                .with(TypeTag::Seq32, number())
                .with(TypeTag::Seq64, number())
                .with(TypeTag::Double, FieldMap::new("number", TypeFlag::Double, "0"))
                .with(TypeTag::Char, text())
                .with(TypeTag::String, text())
                .with(TypeTag::Dynamic, text())
                .with(TypeTag::Uuid, FieldMap::new("string", TypeFlag::Uuid, "''"))
                .with(TypeTag::Date, date())
                .with(TypeTag::Time, date())
                .with(TypeTag::DateTime, date())
                .with(TypeTag::Timestamp, date())
                .with(
                    TypeTag::Memblock,
                    FieldMap::new("Uint8Array", TypeFlag::Memblock, "new Uint8Array()")
                )
                .with(
                    TypeTag::Json,
                    FieldMap::new("Record<string, unknown>", TypeFlag::Json, "{}")
                )
                .with(TypeTag::DbRec, FieldMap::new("object", TypeFlag::DbRec, "null"))
        }
    }
}

impl Default for TypeScriptGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for TypeScriptGenerator {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn extension(&self) -> &'static str {
        "ts"
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

    fn generates_dao(&self) -> bool {
        false
    }

    fn emit_record(&self, ctx: &GenerationContext<'_>, spec: &RecordSpec<'_>) -> Result<String> {
        let class = &spec.record.class_name;
        let method = |raw: &str| ctx.policy.method(raw);
        let with_davs = spec.kind != RecordKind::QueryOut;

        let mut code = Code::new(INDENT);
        code.line(format!("// {HEADER}")).blank();
        if with_davs {
            code.line(format!("import {{ Dav }} from './{DAV_MODULE}';"));
        }
        for import in &spec.imports {
            code.line(format!(
                "import {{ {} }} from './{}';",
                import.class_name, import.file_stem
            ));
        }
        if with_davs || !spec.imports.is_empty() {
            code.blank();
        }

        code.line(format!("export class {class} {{")).indented(|c| {
            for field in &spec.fields {
                c.line(format!("{}: {};", field.member, field.type_name()));
            }
            c.blank();
            c.line(format!("constructor(init: Partial<{class}> = {{}}) {{"))
                .indented(|c| {
                    for field in &spec.fields {
                        if field.in_constructor() {
                            c.line(format!(
                                "this.{0} = init.{0} ?? {1};",
                                field.member,
                                default_value(field)
                            ));
                        } else {
                            c.line(format!("this.{} = {};", field.member, default_value(field)));
                        }
                    }
                })
                .line("}");
            c.blank();
            c.line(format!("{}(): void {{", method("Clear")))
                .indented(|c| {
                    for field in &spec.fields {
                        c.line(format!("this.{} = {};", field.member, default_value(field)));
                    }
                })
                .line("}");

            if let Some(key) = &spec.key {
                let key_class = &key.record.class_name;
                let members: Vec<String> = key
                    .fields
                    .iter()
                    .map(|f| format!("{0}: this.{0}", f.member))
                    .collect();
                c.blank();
                c.line(format!("{}(): {key_class} {{", method("Key")))
                    .indented(|c| {
                        c.line(format!("return new {key_class}({{ {} }});", members.join(", ")));
                    })
                    .line("}");
            }

            if with_davs {
                let params = if spec.kind == RecordKind::Main {
                    "forInsert = false, keyOnly = false"
                } else {
                    ""
                };
                c.blank();
                c.line(format!("static {}({params}): Dav[] {{", method("Davs")))
                    .indented(|c| {
                        c.line("const davs: Dav[] = [];");
                        dav_lines(c, spec, &spec.davs.key);
                        if spec.davs.key_only_exit {
                            c.line("if (keyOnly) {")
                                .indented(|c| {
                                    c.line("return davs;");
                                })
                                .line("}");
                        }
                        dav_lines(c, spec, &spec.davs.rest);
                        c.line("return davs;");
                    })
                    .line("}");
            }
        });
        code.line("}");

        if !spec.couplets.is_empty() {
            code.blank().line(format!("export namespace {class} {{")).indented(|c| {
                for (i, couplet) in spec.couplets.iter().enumerate() {
                    if i > 0 {
                        c.blank();
                    }
                    couplet_class(c, couplet);
                }
            });
            code.line("}");
        }
        Ok(code.finish())
    }

    fn emit_index(&self, options: &TargetOptions, manifest: &Manifest) -> Result<Vec<Document>> {
        let tables = PathBuf::from(&options.dir_tables);
        let mut docs = Vec::new();
        let mut children: BTreeSet<(PathBuf, String)> = BTreeSet::new();

        for (dir, entries) in manifest.dirs() {
            let mut code = header();
            for entry in entries {
                if let Some(class) = &entry.class_name {
                    code.line(format!("export {{ {class} }} from './{}';", entry.stem));
                }
            }
            if dir == tables.as_path() {
                code.line(format!("export * from './{DAV_MODULE}';"));
            }
            docs.push(doc(options, dir.to_path_buf(), "index", code.finish()));

            let mut current = dir;
            while let (Some(parent), Some(name)) = (current.parent(), current.file_name()) {
                children.insert((parent.to_path_buf(), name.to_string_lossy().into_owned()));
                current = parent;
            }
        }

        let parents: BTreeSet<&PathBuf> = children.iter().map(|(p, _)| p).collect();
        for parent in parents {
            if manifest.dirs().any(|(d, _)| d == parent.as_path()) {
                continue;
            }
            let mut code = header();
            for (_, child) in children.iter().filter(|(p, _)| p == parent) {
                code.line(format!("export * as {child} from './{child}';"));
            }
            docs.push(doc(options, parent.clone(), "index", code.finish()));
        }

        if manifest.dirs().any(|(d, _)| d == tables.as_path()) {
            docs.push(doc(options, tables, DAV_MODULE, dav_support()));
        }
        Ok(docs)
    }
}

fn header() -> Code {
    let mut code = Code::new(INDENT);
    code.line(format!("// {HEADER}")).blank();
    code
}

fn doc(options: &TargetOptions, dir: PathBuf, stem: &str, body: String) -> Document {
    Document {
        namespace: Document::namespace_of(&options.namespace, &dir),
        dir,
        stem: stem.to_string(),
        extension: "ts",
        class_name: None,
        body
    }
}

fn default_value(field: &FieldSpec<'_>) -> String {
    match &field.record {
        Some(record) => format!("new {}()", record.class_name),
        None => field.map.default_value.clone()
    }
}

fn dav_entry(spec: &RecordSpec<'_>, emission: &DavEmission) -> String {
    let member = spec
        .fields
        .iter()
        .find(|f| f.column.name == emission.column)
        .map_or(emission.column.as_str(), |f| f.member.as_str());
    let arg = match &emission.arg {
        DavArg::None => String::new(),
        DavArg::Number(n) | DavArg::Temporal(n) => format!(", arg: {n}"),
        DavArg::Text(t) => format!(", arg: '{}'", escape(t, '\'')),
        list @ DavArg::List { .. } => format!(", arg: [{}]", list.joined(STYLE.quote()))
    };
    format!(
        "davs.push({{ column: '{}', member: '{member}', rule: '{}'{arg} }});",
        emission.column,
        emission.rule.name()
    )
}

fn dav_lines(c: &mut Code, spec: &RecordSpec<'_>, emissions: &[DavEmission]) {
    let mut guarded = Vec::new();
    let flush = |c: &mut Code, guarded: &mut Vec<String>| {
        if guarded.is_empty() {
            return;
        }
        c.line("if (!forInsert) {")
            .indented(|c| {
                for line in guarded.drain(..) {
                    c.line(line);
                }
            })
            .line("}");
    };
    for emission in emissions {
        let line = dav_entry(spec, emission);
        match emission.guard {
            DavGuard::UnlessForInsert => guarded.push(line),
            DavGuard::Always => {
                flush(c, &mut guarded);
                c.line(line);
            }
        }
    }
    flush(c, &mut guarded);
}

fn couplet_class(c: &mut Code, couplet: &CoupletSpec<'_>) {
    let class = &couplet.class_name;
    let textual = couplet.column.type_tag.is_textual();
    let key_type = if textual { "string" } else { "number" };
    c.line(format!("export class {class} {{")).indented(|c| {
        for entry in &couplet.entries {
            let key = if textual {
                format!("'{}'", escape(&entry.key, '\''))
            } else {
                entry.key.clone()
            };
            c.line(format!("static readonly {} = {key};", entry.key_member));
            c.line(format!(
                "static readonly {} = '{}';",
                entry.value_member,
                escape(&entry.label, '\'')
            ));
        }
        c.blank();
        c.line(format!("static {}(key: {key_type}): string {{", couplet.get_value))
            .indented(|c| {
                c.line("switch (key) {").indented(|c| {
                    for entry in &couplet.entries {
                        c.line(format!(
                            "case {class}.{}: return {class}.{};",
                            entry.key_member, entry.value_member
                        ));
                    }
                });
                c.line("}").line("return '';");
            })
            .line("}");
    });
    c.line("}");
}

/// Rule descriptor type and the checker records feed it to.
fn dav_support() -> String {
    let mut code = header();
    code.line("export type DavRule = 'Min' | 'Max' | 'NotNull' | 'Regex' | 'Func' | 'In' | 'NotIn';")
        .blank()
        .line("export interface Dav {")
        .indented(|c| {
            c.line("column: string;")
                .line("member: string;")
                .line("rule: DavRule;")
                .line("arg?: unknown;");
        })
        .line("}")
        .blank()
        .line("export type DavFunc = (value: unknown) => boolean;")
        .blank()
        .line("function size(value: unknown): number | undefined {")
        .indented(|c| {
            c.line("if (typeof value === 'string' || value instanceof Uint8Array) {")
                .indented(|c| {
                    c.line("return value.length;");
                })
                .line("}")
                .line("return undefined;");
        })
        .line("}")
        .blank()
        .line("function order(value: unknown): number {")
        .indented(|c| {
            c.line("return value instanceof Date ? value.getTime() : Number(value);");
        })
        .line("}")
        .blank()
        .line("/** Failed rules of `rec`, one message each. */")
        .line("export function check(rec: object, davs: Dav[], funcs: Record<string, DavFunc> = {}): string[] {")
        .indented(|c| {
            c.line("const failed: string[] = [];")
                .line("for (const dav of davs) {")
                .indented(|c| {
                    c.line("const value = (rec as Record<string, unknown>)[dav.member];")
                        .line("const len = size(value);")
                        .line("let ok = true;")
                        .line("switch (dav.rule) {")
                        .indented(|c| {
                            c.line("case 'Min':")
                                .indented(|c| {
                                    c.line("ok = len !== undefined ? len >= Number(dav.arg) : order(value) >= order(dav.arg);")
                                        .line("break;");
                                })
                                .line("case 'Max':")
                                .indented(|c| {
                                    c.line("ok = len !== undefined ? len <= Number(dav.arg) : order(value) <= order(dav.arg);")
                                        .line("break;");
                                })
                                .line("case 'NotNull':")
                                .indented(|c| {
                                    c.line("ok = value !== null && value !== undefined && len !== 0;")
                                        .line("break;");
                                })
                                .line("case 'Regex':")
                                .indented(|c| {
                                    c.line("ok = new RegExp(String(dav.arg)).test(String(value));")
                                        .line("break;");
                                })
                                .line("case 'Func':")
                                .indented(|c| {
                                    c.line("ok = funcs[String(dav.arg)]?.(value) ?? true;")
                                        .line("break;");
                                })
                                .line("case 'In':")
                                .indented(|c| {
                                    c.line("ok = (dav.arg as unknown[]).includes(value);")
                                        .line("break;");
                                })
                                .line("case 'NotIn':")
                                .indented(|c| {
                                    c.line("ok = !(dav.arg as unknown[]).includes(value);")
                                        .line("break;");
                                });
                        })
                        .line("}")
                        .line("if (!ok) {")
                        .indented(|c| {
                            c.line("failed.push(`[${dav.column}] failed ${dav.rule}`);");
                        })
                        .line("}");
                })
                .line("}")
                .line("return failed;");
        })
        .line("}");
    code.finish()
}

#[cfg(test)]
mod tests {
    use schemagen_core::{Capabilities, Column, DavKind, DavMap, DavValue, Schema, Table};

    use super::*;
    use crate::{
        config::RawTargetOptions,
        dialect::Dialect,
        generator::{Mode, Outcome, Target, TargetKind}
    };

    fn run() -> Outcome {
        let table = Table::new("Orders")
            .with_column(Column::new("id", TypeTag::Seq32))
            .with_column(
                Column::new("placed", TypeTag::Date)
                    .with_dav(DavMap::new().with(DavKind::Min, DavValue::Text("2024-03-01".into())))
            )
            .with_column(
                Column::new("status", TypeTag::Char)
                    .with_couplet("A", "Active")
                    .with_couplet("X", "Closed")
            )
            .with_column(Column::new("created", TypeTag::Timestamp))
            .with_primary_key("id")
            .with_capabilities(Capabilities::all());
        let schema = Schema::from_tables([table]).unwrap();
        let target = Target::new(TargetKind::TypeScript, "ts", &RawTargetOptions::default()).unwrap();
        let mut outcome = target.generate(&schema, &[Dialect::Postgres], Mode::Emit).unwrap();
        target.finalize(&mut outcome).unwrap();
        outcome
    }

    fn body<'a>(outcome: &'a Outcome, path: &str) -> &'a str {
        &outcome
            .documents
            .iter()
            .find(|d| d.relative_path() == std::path::Path::new(path))
            .unwrap_or_else(|| panic!("missing {path}"))
            .body
    }

    #[test]
    fn records_only() {
        let outcome = run();
        assert!(outcome.documents.iter().all(|d| d.dir.starts_with("tables") || d.stem == "index"));
        assert!(!outcome.documents.iter().any(|d| d.dir.starts_with("dao")));
    }

    #[test]
    fn record_class() {
        let outcome = run();
        let rec = body(&outcome, "tables/Orders.ts");
        assert!(rec.contains("import { OrdersKey } from './OrdersKey';"));
        assert!(rec.contains("export class Orders {\n  id: number;\n  placed: Date;"));
        assert!(rec.contains("    this.id = init.id ?? 0;"));
        assert!(rec.contains("    this.created = new Date(0);"));
        assert!(rec.contains("    return new OrdersKey({ id: this.id });"));
        assert!(rec.contains(
            "    if (!forInsert) {\n      davs.push({ column: 'id', member: 'id', rule: 'Min', arg: 1 });\n    }"
        ));
        assert!(rec.contains("rule: 'Min', arg: new Date(2024, 2, 1) });"));
        assert!(rec.contains("rule: 'In', arg: ['A', 'X'] });"));
        assert!(rec.contains("export namespace Orders {\n  export class Status {"));
        assert!(rec.contains("    static readonly keyActive = 'A';"));
        assert!(rec.contains("case Status.keyClosed: return Status.valueClosed;"));
    }

    #[test]
    fn index_exports_records_and_support() {
        let outcome = run();
        let index = body(&outcome, "tables/index.ts");
        assert!(index.contains("export { Orders } from './Orders';"));
        assert!(index.contains("export * from './dav';"));
        assert!(body(&outcome, "index.ts").contains("export * as tables from './tables';"));
        assert!(body(&outcome, "tables/dav.ts").contains("export function check("));
    }

    #[test]
    fn time_literals_pin_the_epoch() {
        let time = NaiveTime::from_hms_opt(8, 30, 0).unwrap();
        assert_eq!(STYLE.time(time), "new Date(1970, 0, 1, 8, 30, 0)");
    }
}
