// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Rust target on `sqlx`.
//!
//! Items are built with [`quote`] and every file is parsed back with
//! [`syn`] before it is handed out, so a bad identifier or type surfaces as
//! [`Error::Render`] instead of as a broken file.
//!
//! # Output
//!
//! | Artifact | Shape |
//! |----------|-------|
//! | Record | `#[derive(sqlx::FromRow)] struct` with `validate` |
//! | Couplet | unit struct with `KEY_*` and `VALUE_*` consts |
//! | Procedure DAO | `SQL`, `sql()`, `query()`; async adds `execute` and `fetch_*` |
//! | DAO shell | standard: SQL consts; async: methods over a connection |
//! | Index | `mod.rs` per directory and `dav.rs` next to the records |
//!
//! # Flavours
//!
//! ```text
//! standard ──► OrdersInsert::query(&sql, &rec).execute(conn)   caller drives
//! async    ──► OrdersInsert::execute(conn, &mut rec).await      stamps, sequences
//! ```

use std::{collections::BTreeSet, path::PathBuf};

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use schemagen_core::TypeTag;

use super::HEADER;
use crate::{
    config::{CasingConfig, TargetOptions},
    dav::{ConstructorStyle, DavArg, DavEmission, DavGuard, DavRule, LiteralStyle},
    dialect::{Dialect, SequenceMode},
    error::{Error, Result},
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
    ctor_date:        "dav::date",
    ctor_time:        "dav::time",
    ctor_datetime:    "dav::datetime",
    zero_based_month: false,
    quote:            '"'
};

/// Stem of the validation support module written next to the records.
const DAV_MODULE: &str = "dav";

/// Rust generator.
#[derive(Debug, Clone)]
pub struct RustGenerator {
    catalog: TypeCatalog
}

impl RustGenerator {
    /// Generator with the standard type mapping.
    #[must_use]
    pub fn new() -> Self {
        let text = || FieldMap::new("String", TypeFlag::Str, "String::new()");
        Self {
            catalog: TypeCatalog::new("rust")
                .with(TypeTag::Bool, FieldMap::new("bool", TypeFlag::Bool, "false"))
                .with(TypeTag::Int8, FieldMap::new("i8", TypeFlag::Int, "0"))
                .with(TypeTag::Int16, FieldMap::new("i16", TypeFlag::Int, "0"))
                .with(TypeTag::Int32, FieldMap::new("i32", TypeFlag::Int, "0"))
                .with(TypeTag::Int64, FieldMap::new("i64", TypeFlag::Int, "0"))
                .with(TypeTag::Seq32, FieldMap::new("i32", TypeFlag::Int, "0"))
                .with(TypeTag::Seq64, FieldMap::new("i64", TypeFlag::Int, "0"))
                .with(TypeTag::Char, text())
                .with(TypeTag::String, text())
                .with(TypeTag::Dynamic, text())
                .with(
                    TypeTag::Date,
                    FieldMap::new("chrono::NaiveDate", TypeFlag::Date, "chrono::NaiveDate::MIN")
                )
                .with(
                    TypeTag::Time,
                    FieldMap::new("chrono::NaiveTime", TypeFlag::Date, "chrono::NaiveTime::MIN")
                )
                .with(
                    TypeTag::DateTime,
                    FieldMap::new(
                        "chrono::NaiveDateTime",
                        TypeFlag::Date,
                        "chrono::NaiveDateTime::MIN"
                    )
                )
                .with(
                    TypeTag::Timestamp,
                    FieldMap::new(
                        "chrono::DateTime<chrono::Utc>",
                        TypeFlag::Date,
                        "chrono::DateTime::<chrono::Utc>::MIN_UTC"
                    )
                )
                .with(TypeTag::Memblock, FieldMap::new("Vec<u8>", TypeFlag::Memblock, "Vec::new()"))
                .with(TypeTag::Uuid, FieldMap::new("uuid::Uuid", TypeFlag::Uuid, "uuid::Uuid::nil()"))
                .with(
                    TypeTag::Json,
                    FieldMap::new("serde_json::Value", TypeFlag::Json, "serde_json::Value::Null")
                )
                .with(TypeTag::Double, FieldMap::new("f64", TypeFlag::Double, "0.0"))
                .with(TypeTag::DbRec, FieldMap::new("Self", TypeFlag::DbRec, "Default::default()"))
        }
    }
}

impl Default for RustGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for RustGenerator {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn extension(&self) -> &'static str {
        "rs"
    }

    fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    fn literal_style(&self) -> &dyn LiteralStyle {
        &STYLE
    }

    fn default_casing(&self) -> CasingConfig {
        CasingConfig::new(Casing::Pascal, Casing::Snake, Casing::Snake, Casing::Snake)
    }

    fn emit_record(&self, ctx: &GenerationContext<'_>, spec: &RecordSpec<'_>) -> Result<String> {
        let item = &spec.record.class_name;
        let name = ident(item, item)?;
        let mut items = Vec::new();

        let mut uses = Vec::new();
        if spec.kind != RecordKind::QueryOut {
            let dav = ident(item, DAV_MODULE)?;
            uses.push(quote! { use super::#dav; });
        }
        for import in &spec.imports {
            let module = ident(item, &import.file_stem)?;
            let class = ident(item, &import.class_name)?;
            uses.push(quote! { use super::#module::#class; });
        }
        items.extend(uses);

        let mut fields = Vec::new();
        for field in &spec.fields {
            let member = ident(item, &field.member)?;
            let ty = field_type(item, field)?;
            let flatten = field.record.as_ref().map(|_| quote! { #[sqlx(flatten)] });
            fields.push(quote! {
                #flatten
                pub #member: #ty
            });
        }
        let doc = format!(" Record of `{}`.", ctx.table.name);
        items.push(quote! {
            #[doc = #doc]
            #[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
            pub struct #name {
                #(#fields),*
            }
        });

        let mut methods = Vec::new();
        match spec.kind {
            RecordKind::Main => {
                let key = validation_block(item, spec, &spec.davs.key)?;
                let rest = validation_block(item, spec, &spec.davs.rest)?;
                let exit = spec.davs.key_only_exit.then(|| {
                    quote! {
                        if key_only {
                            return Ok(());
                        }
                    }
                });
                methods.push(quote! {
                    /// Check every column rule. Sequence rules are skipped
                    /// for inserts; `key_only` stops after the key columns.
                    #[allow(unused_variables)]
                    pub fn validate(&self, for_insert: bool, key_only: bool) -> Result<(), dav::DavError> {
                        #key
                        #exit
                        #rest
                        Ok(())
                    }
                });
            }
            RecordKind::Key | RecordKind::QueryIn => {
                let all = validation_block(item, spec, &spec.davs.key)?;
                let rest = validation_block(item, spec, &spec.davs.rest)?;
                methods.push(quote! {
                    /// Check every column rule.
                    #[allow(unused_variables)]
                    pub fn validate(&self) -> Result<(), dav::DavError> {
                        #all
                        #rest
                        Ok(())
                    }
                });
            }
            RecordKind::QueryOut => {}
        }

        if let Some(key) = &spec.key {
            let key_type = ident(item, &key.record.class_name)?;
            let members = key
                .fields
                .iter()
                .map(|f| ident(item, &f.member))
                .collect::<Result<Vec<_>>>()?;
            methods.push(quote! {
                /// Primary key of this record.
                #[must_use]
                pub fn key(&self) -> #key_type {
                    #key_type {
                        #(#members: self.#members.clone()),*
                    }
                }

                /// Overwrite the primary key columns.
                pub fn set_key(&mut self, key: &#key_type) {
                    #(self.#members = key.#members.clone();)*
                }
            });
        }
        if !methods.is_empty() {
            items.push(quote! {
                impl #name {
                    #(#methods)*
                }
            });
        }

        for couplet in &spec.couplets {
            items.push(couplet_type(ctx, item, couplet)?);
        }
        render(item, items)
    }

    fn emit_dao_shell(&self, ctx: &DaoContext<'_>, spec: &DaoShellSpec<'_>) -> Result<String> {
        let item = &spec.class_name;
        let name = ident(item, item)?;
        let options = ctx.base.options;
        let policy = ctx.base.policy;
        let table = &ctx.qualified_table;
        let record = record_path(item, options, &spec.table_record)?;

        if !ctx.is_async() {
            let mut consts = Vec::new();
            for proc in &spec.procedures {
                let constant = ident(item, &policy.member(proc.standard.name()).to_uppercase())?;
                let module = ident(item, &proc.file_stem)?;
                let class = ident(item, &proc.class_name)?;
                consts.push(quote! {
                    pub const #constant: &'static str = super::#module::#class::SQL;
                });
            }
            let doc = format!(" Standard statements of `{}`.", ctx.base.table.name);
            return render(item, vec![quote! {
                #[doc = #doc]
                pub struct #name;

                impl #name {
                    /// Table as written in SQL.
                    pub const TABLE: &'static str = #table;

                    #(#consts)*
                }
            }]);
        }

        let db = database(ctx.dialect);
        let (key_args, key_value) = match &spec.key {
            Some(key) => {
                let key_type = record_path(item, options, &key.record)?;
                let mut args = Vec::new();
                let mut members = Vec::new();
                for field in &key.fields {
                    let member = ident(item, &field.member)?;
                    let ty = field_type(item, field)?;
                    args.push(quote! { #member: #ty });
                    members.push(member);
                }
                (args, Some(quote! { #key_type { #(#members),* } }))
            }
            None => (Vec::new(), None)
        };

        let mut methods = Vec::new();
        for proc in &spec.procedures {
            let method = ident(item, &policy.method(proc.standard.name()))?;
            let module = ident(item, &proc.file_stem)?;
            let class = ident(item, &proc.class_name)?;
            let dao = quote! { super::#module::#class };
            let execute = ident(item, &policy.method("Execute"))?;
            let fetch_optional = ident(item, &policy.method("FetchOptional"))?;
            let fetch_all = ident(item, &policy.method("FetchAll"))?;
            methods.push(match proc.standard {
                StandardProc::LockOne | StandardProc::SelectOne => quote! {
                    pub async fn #method(&mut self, #(#key_args),*) -> Result<Option<#record>, sqlx::Error> {
                        let key = #key_value;
                        #dao::#fetch_optional(&mut *self.conn, &key).await
                    }
                },
                StandardProc::Update | StandardProc::Insert => quote! {
                    pub async fn #method(&mut self, rec: &mut #record) -> Result<u64, sqlx::Error> {
                        #dao::#execute(&mut *self.conn, rec).await
                    }
                },
                StandardProc::DeleteOne => quote! {
                    pub async fn #method(&mut self, #(#key_args),*) -> Result<u64, sqlx::Error> {
                        let key = #key_value;
                        #dao::#execute(&mut *self.conn, &key).await
                    }
                },
                StandardProc::DeleteAll => quote! {
                    pub async fn #method(&mut self) -> Result<u64, sqlx::Error> {
                        #dao::#execute(&mut *self.conn).await
                    }
                },
                StandardProc::SelectAll => quote! {
                    pub async fn #method(&mut self) -> Result<Vec<#record>, sqlx::Error> {
                        #dao::#fetch_all(&mut *self.conn).await
                    }
                }
            });
        }

        let doc = format!(" Row operations on `{}`.", ctx.base.table.name);
        render(item, vec![quote! {
            #[doc = #doc]
            pub struct #name<'c> {
                conn: &'c mut <#db as sqlx::Database>::Connection
            }

            impl<'c> #name<'c> {
                /// Table as written in SQL.
                pub const TABLE: &'static str = #table;

                /// Operations over `conn`.
                pub fn new(conn: &'c mut <#db as sqlx::Database>::Connection) -> Self {
                    Self { conn }
                }

                #(#methods)*
            }
        }])
    }

    fn emit_procedure(&self, ctx: &DaoContext<'_>, spec: &ProcedureSpec<'_>) -> Result<String> {
        let item = &spec.class_name;
        let name = ident(item, item)?;
        let options = ctx.base.options;
        let policy = ctx.base.policy;
        let method = |raw: &str| ident(item, &policy.method(raw));
        let db = database(ctx.dialect);
        let sql = &spec.sql;

        let input = spec
            .input
            .as_ref()
            .map(|r| record_path(item, options, r))
            .transpose()?;
        let output = match (&spec.output, spec.fetches()) {
            (Some(r), true) => Some(record_path(item, options, r)?),
            _ => None
        };
        let mutates = !spec.stamps.is_empty() || spec.sequence.is_some();

        let sql_fn = method("Sql")?;
        let query_fn = method("Query")?;
        let stamp_fn = method("Stamp")?;
        let mut methods = Vec::new();

        let (in_param, in_arg, in_query_param, in_query_arg) = match &input {
            Some(ty) => (
                quote! { input: &#ty },
                quote! { input },
                quote! { input: &'q #ty },
                quote! { &*input }
            ),
            None => (quote! {}, quote! {}, quote! {}, quote! {})
        };

        let substitutions = spec
            .dynamics
            .iter()
            .map(|d| {
                let marker = &d.marker;
                let path = member_path(item, &d.path)?;
                Ok(quote! { sql = sql.replace(#marker, &input.#path); })
            })
            .collect::<Result<Vec<_>>>()?;
        if substitutions.is_empty() {
            methods.push(quote! {
                /// Statement text.
                #[allow(unused_variables)]
                pub fn #sql_fn(#in_param) -> std::borrow::Cow<'static, str> {
                    std::borrow::Cow::Borrowed(Self::SQL)
                }
            });
        } else {
            methods.push(quote! {
                /// Statement text with the dynamic inputs substituted.
                pub fn #sql_fn(#in_param) -> std::borrow::Cow<'static, str> {
                    let mut sql = Self::SQL.to_string();
                    #(#substitutions)*
                    std::borrow::Cow::Owned(sql)
                }
            });
        }

        if let Some(ty) = &input
            && !spec.stamps.is_empty()
        {
            let stamps = spec
                .stamps
                .iter()
                .map(|p| member_path(item, p))
                .collect::<Result<Vec<_>>>()?;
            methods.push(quote! {
                /// Set the timestamp inputs to now.
                pub fn #stamp_fn(input: &mut #ty) {
                    let now = chrono::Utc::now();
                    #(input.#stamps = now;)*
                }
            });
        }

        let binds = spec
            .binds
            .iter()
            .map(|b| {
                let path = member_path(item, &b.path)?;
                Ok(quote! { .bind(&input.#path) })
            })
            .collect::<Result<Vec<_>>>()?;
        let args = quote! { <#db as sqlx::Database>::Arguments<'q> };
        methods.push(match &output {
            Some(out) => quote! {
                /// Query with every input bound.
                pub fn #query_fn<'q>(sql: &'q str, #in_query_param) -> sqlx::query::QueryAs<'q, #db, #out, #args> {
                    sqlx::query_as(sql)
                        #(#binds)*
                }
            },
            None => quote! {
                /// Statement with every input bound.
                pub fn #query_fn<'q>(sql: &'q str, #in_query_param) -> sqlx::query::Query<'q, #db, #args> {
                    sqlx::query(sql)
                        #(#binds)*
                }
            }
        });

        if ctx.is_async() {
            methods.extend(async_methods(ctx, spec, &AsyncParts {
                item,
                input: input.as_ref(),
                output: output.as_ref(),
                mutates,
                in_arg,
                in_query_arg
            })?);
        }

        let sequence_sql = spec.sequence.as_ref().map(|seq| {
            let text = sequence_sql(ctx.dialect, &ctx.qualified_table, &seq.column);
            quote! {
                /// Statement reading the sequence value.
                pub const SEQUENCE_SQL: &'static str = #text;
            }
        });
        let doc = format!(" `{}` on `{}`.", spec.name, ctx.base.table.name);
        render(item, vec![quote! {
            #[doc = #doc]
            pub struct #name;

            impl #name {
                /// Statement with dialect placeholders.
                pub const SQL: &'static str = #sql;

                #sequence_sql

                #(#methods)*
            }
        }])
    }

    fn emit_index(&self, options: &TargetOptions, manifest: &Manifest) -> Result<Vec<Document>> {
        let tables = PathBuf::from(&options.dir_tables);
        let mut docs = Vec::new();
        let mut parents = BTreeSet::new();
        let mut children: BTreeSet<(PathBuf, String)> = BTreeSet::new();

        for (dir, entries) in manifest.dirs() {
            let item = format!("{}/mod.rs", dir.display());
            let mut items = Vec::new();
            if dir == tables.as_path() {
                let dav = ident(&item, DAV_MODULE)?;
                items.push(quote! { pub mod #dav; });
            }
            for entry in entries {
                let module = ident(&item, &entry.stem)?;
                items.push(quote! { pub mod #module; });
            }
            for entry in entries {
                if let Some(class) = &entry.class_name {
                    let module = ident(&item, &entry.stem)?;
                    let class = ident(&item, class)?;
                    items.push(quote! { pub use #module::#class; });
                }
            }
            docs.push(module_doc(options, dir.to_path_buf(), "mod", render(&item, items)?));
            for ancestor in dir.ancestors().skip(1) {
                parents.insert(ancestor.to_path_buf());
            }
            link_parents(dir, &mut children);
        }

        for dir in parents {
            if manifest.dirs().any(|(d, _)| d == dir.as_path()) {
                continue;
            }
            let item = format!("{}/mod.rs", dir.display());
            let modules = children
                .iter()
                .filter(|(parent, _)| *parent == dir)
                .map(|(_, child)| ident(&item, child))
                .collect::<Result<Vec<_>>>()?;
            let body = render(&item, vec![quote! { #(pub mod #modules;)* }])?;
            docs.push(module_doc(options, dir, "mod", body));
        }

        if manifest.dirs().any(|(d, _)| d == tables.as_path()) {
            let item = format!("{}/{DAV_MODULE}.rs", tables.display());
            docs.push(module_doc(options, tables, DAV_MODULE, render(&item, vec![dav_support()])?));
        }
        Ok(docs)
    }
}

/// Identifier, raw when it collides with a keyword.
fn ident(item: &str, name: &str) -> Result<Ident> {
    if name != "gen" && syn::parse_str::<Ident>(name).is_ok() {
        return Ok(Ident::new(name, Span::call_site()));
    }
    let rawable = !matches!(name, "self" | "Self" | "super" | "crate" | "_")
        && syn::parse_str::<Ident>(&format!("r#{name}")).is_ok();
    if rawable {
        return Ok(Ident::new_raw(name, Span::call_site()));
    }
    Err(Error::Render {
        item:    item.to_string(),
        message: format!("[{name}] is not a valid identifier")
    })
}

fn parse<T: syn::parse::Parse>(item: &str, what: &str, text: &str) -> Result<T> {
    syn::parse_str(text).map_err(|e| Error::Render {
        item:    item.to_string(),
        message: format!("invalid {what} [{text}]: {e}")
    })
}

fn field_type(item: &str, field: &FieldSpec<'_>) -> Result<syn::Type> {
    parse(item, "type", field.type_name())
}

fn member_path(item: &str, path: &[String]) -> Result<TokenStream> {
    let segments = path
        .iter()
        .map(|p| ident(item, p))
        .collect::<Result<Vec<_>>>()?;
    Ok(quote! { #(#segments).* })
}

/// Absolute path of a record type from a DAO module.
fn record_path(item: &str, options: &TargetOptions, record: &RecordRef) -> Result<TokenStream> {
    let module = Document::namespace_of(&options.namespace, &record.dir);
    let segments = module
        .split('.')
        .filter(|s| !s.is_empty())
        .chain([record.file_stem.as_str()])
        .map(|s| ident(item, s))
        .collect::<Result<Vec<_>>>()?;
    let class = ident(item, &record.class_name)?;
    Ok(quote! { crate #(::#segments)*::#class })
}

fn database(dialect: Dialect) -> TokenStream {
    match dialect {
        Dialect::Postgres => quote! { sqlx::Postgres },
        Dialect::Sqlite => quote! { sqlx::Sqlite },
        Dialect::Mssql => quote! { sqlx::Any }
    }
}

fn sequence_sql(dialect: Dialect, table: &str, column: &str) -> String {
    match dialect.sequence_mode() {
        SequenceMode::PreInsert => format!("select nextval('{table}_{column}_seq')"),
        SequenceMode::PostInsert => match dialect {
            Dialect::Mssql => "select cast(@@identity as bigint)".to_string(),
            _ => "select last_insert_rowid()".to_string()
        }
    }
}

/// Parse each item into a file and print it under the header.
fn render(item: &str, items: Vec<TokenStream>) -> Result<String> {
    let file = quote! { #(#items)* };
    syn::parse2::<syn::File>(file).map_err(|e| Error::Render {
        item:    item.to_string(),
        message: e.to_string()
    })?;
    let mut out = format!("// {HEADER}\n");
    for tokens in items {
        out.push('\n');
        out.push_str(&tokens.to_string());
        out.push('\n');
    }
    Ok(out)
}

fn module_doc(options: &TargetOptions, dir: PathBuf, stem: &str, body: String) -> Document {
    Document {
        namespace: Document::namespace_of(&options.namespace, &dir),
        dir,
        stem: stem.to_string(),
        extension: "rs",
        class_name: None,
        body
    }
}

fn link_parents(dir: &std::path::Path, children: &mut BTreeSet<(PathBuf, String)>) {
    let mut current = dir;
    while let (Some(parent), Some(name)) = (current.parent(), current.file_name()) {
        children.insert((parent.to_path_buf(), name.to_string_lossy().into_owned()));
        current = parent;
    }
}

struct AsyncParts<'x> {
    item: &'x str,

    input: Option<&'x TokenStream>,

    output: Option<&'x TokenStream>,

    mutates: bool,

    in_arg: TokenStream,

    in_query_arg: TokenStream
}

fn async_methods(ctx: &DaoContext<'_>, spec: &ProcedureSpec<'_>, parts: &AsyncParts<'_>) -> Result<Vec<TokenStream>> {
    let AsyncParts {
        item,
        input,
        output,
        mutates,
        in_arg,
        in_query_arg
    } = parts;
    let policy = ctx.base.policy;
    let method = |raw: &str| ident(item, &policy.method(raw));
    let db = database(ctx.dialect);
    let conn = quote! { conn: &mut <#db as sqlx::Database>::Connection };
    let sql_fn = method("Sql")?;
    let query_fn = method("Query")?;

    let param = match input {
        Some(ty) if *mutates => quote! { , input: &mut #ty },
        Some(ty) => quote! { , input: &#ty },
        None => quote! {}
    };

    let Some(out) = output else {
        let stamp = (!spec.stamps.is_empty()).then(|| {
            let stamp_fn = ident(item, &policy.method("Stamp"));
            stamp_fn.map(|f| quote! { Self::#f(input); })
        });
        let stamp = stamp.transpose()?;
        let (pre, post) = match &spec.sequence {
            Some(seq) => {
                let path = member_path(item, &seq.path)?;
                let ty: syn::Type = match ctx.base.table.column(&seq.column).map(|c| c.type_tag) {
                    Some(TypeTag::Seq32) => parse(item, "type", "i32")?,
                    _ => parse(item, "type", "i64")?
                };
                let read = quote! {
                    let next: i64 = sqlx::query_scalar(Self::SEQUENCE_SQL)
                        .fetch_one(&mut *conn)
                        .await?;
                    input.#path = next as #ty;
                };
                match seq.mode {
                    SequenceMode::PreInsert => (Some(read), None),
                    SequenceMode::PostInsert => (None, Some(read))
                }
            }
            None => (None, None)
        };
        let execute = method("Execute")?;
        return Ok(vec![quote! {
            /// Run the statement and return the affected row count.
            pub async fn #execute(#conn #param) -> Result<u64, sqlx::Error> {
                #stamp
                #pre
                let sql = Self::#sql_fn(#in_arg);
                let done = Self::#query_fn(&sql, #in_query_arg)
                    .execute(&mut *conn)
                    .await?;
                #post
                Ok(done.rows_affected())
            }
        }]);
    };

    let fetch_optional = method("FetchOptional")?;
    let fetch_all = method("FetchAll")?;
    Ok(vec![
        quote! {
            /// First row, if any.
            pub async fn #fetch_optional(#conn #param) -> Result<Option<#out>, sqlx::Error> {
                let sql = Self::#sql_fn(#in_arg);
                Self::#query_fn(&sql, #in_query_arg).fetch_optional(&mut *conn).await
            }
        },
        quote! {
            /// Every row.
            pub async fn #fetch_all(#conn #param) -> Result<Vec<#out>, sqlx::Error> {
                let sql = Self::#sql_fn(#in_arg);
                Self::#query_fn(&sql, #in_query_arg).fetch_all(&mut *conn).await
            }
        },
    ])
}

fn validation_block(item: &str, spec: &RecordSpec<'_>, emissions: &[DavEmission]) -> Result<TokenStream> {
    let mut out = Vec::new();
    let mut guarded = Vec::new();
    for emission in emissions {
        let Some(check) = dav_check(item, spec, emission)? else {
            continue;
        };
        match emission.guard {
            DavGuard::Always => {
                if !guarded.is_empty() {
                    out.push(unless_insert(&guarded));
                    guarded.clear();
                }
                out.push(check);
            }
            DavGuard::UnlessForInsert => guarded.push(check)
        }
    }
    if !guarded.is_empty() {
        out.push(unless_insert(&guarded));
    }
    Ok(quote! { #(#out)* })
}

fn unless_insert(checks: &[TokenStream]) -> TokenStream {
    quote! {
        if !for_insert {
            #(#checks)*
        }
    }
}

fn dav_check(item: &str, spec: &RecordSpec<'_>, emission: &DavEmission) -> Result<Option<TokenStream>> {
    let Some(field) = spec.fields.iter().find(|f| f.column.name == emission.column) else {
        return Ok(None);
    };
    let column = &emission.column;
    let member = ident(item, &field.member)?;
    let tag = field.column.type_tag;
    let value = quote! { &self.#member };
    let sized = tag.is_textual() || tag == TypeTag::Memblock;

    let check = match (emission.rule, &emission.arg) {
        (DavRule::Min | DavRule::Max, DavArg::Number(n)) if sized => {
            let f = if emission.rule == DavRule::Min { quote! { min_len } } else { quote! { max_len } };
            let bound: syn::Expr = parse(item, "bound", n)?;
            quote! { dav::#f(#column, #value, #bound)?; }
        }
        (DavRule::Min | DavRule::Max, DavArg::Number(n) | DavArg::Temporal(n)) => {
            let f = if emission.rule == DavRule::Min { quote! { min } } else { quote! { max } };
            let bound = literal(item, tag, n)?;
            quote! { dav::#f(#column, #value, &#bound)?; }
        }
        (DavRule::NotNull, _) if field.record.is_none() => {
            quote! { dav::not_null(#column, #value)?; }
        }
        (DavRule::Regex, DavArg::Text(pattern)) => {
            quote! { dav::regex(#column, #value, #pattern)?; }
        }
        (DavRule::Func, DavArg::Text(func)) => {
            let func: syn::Path = parse(item, "function", func)?;
            quote! { dav::check(#column, "Func", #func(#value))?; }
        }
        (DavRule::In | DavRule::NotIn, DavArg::List { items, quoted }) => {
            let f = if emission.rule == DavRule::In { quote! { one_of } } else { quote! { none_of } };
            let members = items
                .iter()
                .map(|i| if *quoted { Ok(quote! { #i }) } else { literal(item, tag, i) })
                .collect::<Result<Vec<_>>>()?;
            quote! { dav::#f(#column, #value, &[#(#members),*])?; }
        }
        _ => return Ok(None)
    };
    Ok(Some(check))
}

/// A bound written for a column of `tag`; integers become floats for
/// `double` columns.
fn literal(item: &str, tag: TypeTag, text: &str) -> Result<TokenStream> {
    let expr: syn::Expr = parse(item, "literal", text)?;
    if tag.is_float() {
        return Ok(quote! { (#expr as f64) });
    }
    Ok(quote! { #expr })
}

fn couplet_type(ctx: &GenerationContext<'_>, item: &str, couplet: &CoupletSpec<'_>) -> Result<TokenStream> {
    let name = ident(item, &couplet.class_name)?;
    let get_value = ident(item, &couplet.get_value)?;
    let textual = couplet.column.type_tag.is_textual();
    let key_type: syn::Type = if textual {
        parse(item, "type", "&'static str")?
    } else {
        parse(item, "type", &ctx.catalog.resolve(couplet.column.type_tag)?.name)?
    };

    let mut consts = Vec::new();
    let mut arms = Vec::new();
    for entry in &couplet.entries {
        let key_const = ident(item, &entry.key_member.to_uppercase())?;
        let value_const = ident(item, &entry.value_member.to_uppercase())?;
        let key = if textual {
            let key = &entry.key;
            quote! { #key }
        } else {
            literal(item, couplet.column.type_tag, &entry.key)?
        };
        let label = &entry.label;
        consts.push(quote! {
            pub const #key_const: #key_type = #key;
            pub const #value_const: &'static str = #label;
        });
        arms.push(quote! { Self::#key_const => Self::#value_const, });
    }
    let param: syn::Type = if textual { parse(item, "type", "&str")? } else { key_type.clone() };
    let doc = format!(" Values of `{}`.", couplet.column.name);
    Ok(quote! {
        #[doc = #doc]
        pub struct #name;

        impl #name {
            #(#consts)*

            /// Label of `key`, empty when unknown.
            #[must_use]
            pub fn #get_value(key: #param) -> &'static str {
                match key {
                    #(#arms)*
                    _ => ""
                }
            }
        }
    })
}

/// Support module the generated `validate` functions call into.
fn dav_support() -> TokenStream {
    quote! {
        /// A failed column rule.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct DavError {
            pub column: &'static str,
            pub rule: &'static str,
            pub message: String
        }

        impl std::fmt::Display for DavError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "[{}] failed {}: {}", self.column, self.rule, self.message)
            }
        }

        impl std::error::Error for DavError {}

        fn fail(column: &'static str, rule: &'static str, message: String) -> Result<(), DavError> {
            Err(DavError { column, rule, message })
        }

        /// Values that can be empty.
        pub trait Blank {
            fn is_blank(&self) -> bool;
        }

        impl Blank for String {
            fn is_blank(&self) -> bool {
                self.is_empty()
            }
        }

        impl Blank for Vec<u8> {
            fn is_blank(&self) -> bool {
                self.is_empty()
            }
        }

        impl Blank for uuid::Uuid {
            fn is_blank(&self) -> bool {
                self.is_nil()
            }
        }

        impl Blank for serde_json::Value {
            fn is_blank(&self) -> bool {
                self.is_null()
            }
        }

        macro_rules! never_blank {
            ($($t:ty),*) => {
                $(impl Blank for $t {
                    fn is_blank(&self) -> bool {
                        false
                    }
                })*
            };
        }

        never_blank!(
            bool, i8, i16, i32, i64, f64,
            chrono::NaiveDate, chrono::NaiveTime, chrono::NaiveDateTime,
            chrono::DateTime<chrono::Utc>
        );

        pub fn date(year: i32, month: u32, day: u32) -> chrono::NaiveDate {
            chrono::NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
        }

        pub fn time(hour: u32, minute: u32, second: u32) -> chrono::NaiveTime {
            chrono::NaiveTime::from_hms_opt(hour, minute, second).unwrap_or_default()
        }

        pub fn datetime(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> chrono::NaiveDateTime {
            date(year, month, day).and_time(time(hour, minute, second))
        }

        pub fn min<T: PartialOrd + std::fmt::Debug>(column: &'static str, value: &T, bound: &T) -> Result<(), DavError> {
            if value < bound {
                return fail(column, "Min", format!("{value:?} is below {bound:?}"));
            }
            Ok(())
        }

        pub fn max<T: PartialOrd + std::fmt::Debug>(column: &'static str, value: &T, bound: &T) -> Result<(), DavError> {
            if value > bound {
                return fail(column, "Max", format!("{value:?} is above {bound:?}"));
            }
            Ok(())
        }

        pub fn min_len<T: AsRef<[u8]> + ?Sized>(column: &'static str, value: &T, bound: usize) -> Result<(), DavError> {
            let len = value.as_ref().len();
            if len < bound {
                return fail(column, "Min", format!("length {len} is below {bound}"));
            }
            Ok(())
        }

        pub fn max_len<T: AsRef<[u8]> + ?Sized>(column: &'static str, value: &T, bound: usize) -> Result<(), DavError> {
            let len = value.as_ref().len();
            if len > bound {
                return fail(column, "Max", format!("length {len} is above {bound}"));
            }
            Ok(())
        }

        pub fn not_null<T: Blank>(column: &'static str, value: &T) -> Result<(), DavError> {
            if value.is_blank() {
                return fail(column, "NotNull", "value is empty".to_string());
            }
            Ok(())
        }

        pub fn regex(column: &'static str, value: &str, pattern: &str) -> Result<(), DavError> {
            match regex::Regex::new(pattern) {
                Ok(re) if re.is_match(value) => Ok(()),
                Ok(_) => fail(column, "Regex", format!("{value:?} does not match {pattern}")),
                Err(e) => fail(column, "Regex", e.to_string())
            }
        }

        pub fn check(column: &'static str, rule: &'static str, passed: bool) -> Result<(), DavError> {
            if !passed {
                return fail(column, rule, "check failed".to_string());
            }
            Ok(())
        }

        pub fn one_of<T: PartialEq<U> + std::fmt::Debug, U>(column: &'static str, value: &T, items: &[U]) -> Result<(), DavError> {
            if !items.iter().any(|i| value == i) {
                return fail(column, "In", format!("{value:?} is not allowed"));
            }
            Ok(())
        }

        pub fn none_of<T: PartialEq<U> + std::fmt::Debug, U>(column: &'static str, value: &T, items: &[U]) -> Result<(), DavError> {
            if items.iter().any(|i| value == i) {
                return fail(column, "NotIn", format!("{value:?} is not allowed"));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use schemagen_core::{Capabilities, Column, DavKind, DavMap, DavValue, Lookup, Procedure, Schema, Table};

    use super::*;
    use crate::{
        config::RawTargetOptions,
        generator::{Mode, Outcome, Target, TargetKind}
    };

    fn schema() -> Schema {
        let customer = Table::new("Customer")
            .with_column(Column::new("id", TypeTag::Int32))
            .with_column(Column::new("name", TypeTag::String).with_length(40))
            .with_primary_key("id");
        let orders = Table::new("Orders")
            .with_column(Column::new("id", TypeTag::Seq64))
            .with_column(
                Column::new("total", TypeTag::Double)
                    .with_dav(DavMap::new().with(DavKind::Max, DavValue::Int(1000)))
            )
            .with_column(
                Column::new("status", TypeTag::Char)
                    .with_couplet("A", "Active")
                    .with_couplet("X", "Closed")
            )
            .with_column(Column::new("type", TypeTag::String))
            .with_column(Column::new("created", TypeTag::Timestamp))
            .with_primary_key("id")
            .with_capabilities(Capabilities::all())
            .with_procedure(
                Procedure::new("ForCustomer")
                    .with_in_field(Column::record("cust", "Customer".parse::<Lookup>().unwrap()))
                    .with_in_field(Column::new("orderBy", TypeTag::Dynamic))
                    .with_out_field(Column::new("id", TypeTag::Seq64))
                    .with_sql("std", "select id from Orders where cust_id = :cust_id order by [orderBy]")
            );
        Schema::from_tables([customer, orders]).unwrap()
    }

    fn run(yaml: &str, dialects: &[Dialect]) -> Outcome {
        let raw: RawTargetOptions = serde_yaml::from_str(yaml).unwrap();
        let target = Target::new(TargetKind::Rust, "rs", &raw).unwrap();
        let mut outcome = target.generate(&schema(), dialects, Mode::Emit).unwrap();
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

    fn file(outcome: &Outcome, path: &str) -> syn::File {
        syn::parse_file(body(outcome, path)).unwrap()
    }

    fn compact(text: &str) -> String {
        text.split_whitespace().collect()
    }

    #[test]
    fn every_file_parses() {
        let outcome = run("{}", &Dialect::ALL);
        for doc in &outcome.documents {
            assert!(doc.body.starts_with("// Generated by schemagen. Do not edit."));
            syn::parse_file(&doc.body).unwrap_or_else(|e| panic!("{}: {e}", doc.relative_path().display()));
        }
    }

    #[test]
    fn record_struct_and_validation() {
        let outcome = run("{}", &[Dialect::Postgres]);
        let text = compact(body(&outcome, "tables/orders.rs"));
        assert!(text.contains("pubstructOrders{pubid:i64,pubtotal:f64,pubstatus:String,pubr#type:String"));
        assert!(text.contains("pubcreated:chrono::DateTime<chrono::Utc>"));
        assert!(text.contains("if!for_insert{dav::min(\"id\",&self.id,&1)?;}"));
        assert!(text.contains("ifkey_only{returnOk(());}"));
        assert!(text.contains("dav::max(\"total\",&self.total,&(1000.000000asf64))?;"));
        assert!(text.contains("dav::one_of(\"status\",&self.status,&[\"A\",\"X\"])?;"));
        assert!(text.contains("pubfnkey(&self)->OrdersKey"));
        assert!(text.contains("pubconstKEY_ACTIVE:&'staticstr=\"A\";"));
        assert!(text.contains("pubfnget_value(key:&str)->&'staticstr"));
        file(&outcome, "tables/orders.rs");
    }

    #[test]
    fn procedure_binds_nested_fields_and_substitutes() {
        let outcome = run("{}", &[Dialect::Postgres]);
        let text = compact(body(&outcome, "dao/postgres/orders_for_customer.rs"));
        assert!(text.contains("selectidfromOrderswherecust_id=$1orderby[orderBy]"));
        assert!(text.contains("sql=sql.replace(\"[orderBy]\",&input.order_by);"));
        assert!(text.contains(".bind(&input.cust.id)"));
        assert!(text.contains("crate::tables::orders_for_customer_out::OrdersForCustomerOut"));
        assert!(!text.contains("asyncfn"));
    }

    #[test]
    fn async_insert_reads_sequence_after_sqlite_insert() {
        let outcome = run(
            "standard: { enabled: false }\nasync: { enabled: true, ns.dao: \"|_async\" }",
            &[Dialect::Sqlite]
        );
        let text = compact(body(&outcome, "dao_async/sqlite/orders_insert.rs"));
        assert!(text.contains("pubasyncfnexecute(conn:&mut<sqlx::Sqliteassqlx::Database>::Connection,input:&mutcrate::tables::orders::Orders)"));
        assert!(text.contains("Self::stamp(input);"));
        assert!(!text.contains(".bind(&input.id)"));
        let execute = text.find(".execute(&mut*conn)").unwrap();
        let sequence = text.find("input.id=nextasi64;").unwrap();
        assert!(sequence > execute);

        let shell = compact(body(&outcome, "dao_async/sqlite/orders.rs"));
        assert!(shell.contains("pubasyncfnselect_one(&mutself,id:i64)->Result<Option<crate::tables::orders::Orders>,sqlx::Error>"));
    }

    #[test]
    fn index_modules_link_the_tree() {
        let outcome = run("namespace: gen", &[Dialect::Postgres]);
        let tables = compact(body(&outcome, "tables/mod.rs"));
        assert!(tables.contains("pubmoddav;"));
        assert!(tables.contains("pubmodorders;"));
        assert!(tables.contains("pubuseorders_key::OrdersKey;"));
        assert!(compact(body(&outcome, "dao/mod.rs")).contains("pubmodpostgres;"));
        let root = compact(body(&outcome, "mod.rs"));
        assert!(root.contains("pubmoddao;") && root.contains("pubmodtables;"));
        file(&outcome, "tables/dav.rs");
        let proc = compact(body(&outcome, "dao/postgres/orders_select_one.rs"));
        assert!(proc.contains("crate::r#gen::tables::orders_key::OrdersKey"));
    }

    #[test]
    fn invalid_function_name_is_a_render_error() {
        let table = Table::new("T")
            .with_column(
                Column::new("code", TypeTag::String)
                    .with_dav(DavMap::new().with(DavKind::Func, DavValue::Text("not a path!".into())))
            );
        let schema = Schema::from_tables([table]).unwrap();
        let target = Target::new(TargetKind::Rust, "rs", &RawTargetOptions::default()).unwrap();
        let err = target.generate(&schema, &[Dialect::Postgres], Mode::Emit).unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
    }
}
