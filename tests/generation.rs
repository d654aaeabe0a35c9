// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use std::{fs, path::Path};

use schemagen::{config::RawTargetOptions, prelude::*};

const SCHEMA: &str = r#"
tables:
  - name: Orders
    primary_keys: [id]
    select_one: true
    lock_one: true
    update: true
    insert: true
    delete_one: true
    select_all: true
    columns:
      - { name: id, type: seq64 }
      - { name: customer, type: string, length: 40, notnull: true }
      - { name: total, type: double, dav: { min: 0, max: 1000 } }
      - name: status
        type: char
        couplets: { A: Active, X: Closed }
      - { name: created, type: timestamp }
    procedures:
      - name: ByStatus
        in:
          - { name: status, type: char }
          - { name: orderBy, type: dynamic }
        out:
          - { name: id, type: seq64 }
          - { name: total, type: double }
        sql:
          std: select id, total from Orders where status = :status order by [orderBy]
"#;

const CONFIG: &str = r#"
databases: [postgres, sqlite, postgres]
targets:
  - target: python3
    dest: py
  - target: rust
    dest: rs
    options:
      namespace: gen
  - target: typescript
    dest: ts
  - target: rust
    enabled: false
    dest: skipped
"#;

fn schema() -> Schema {
    Schema::from_yaml(SCHEMA).unwrap()
}

fn targets(config: &GenerationConfig) -> Vec<Target> {
    config
        .enabled_targets()
        .map(Target::from_entry)
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

fn emit(root: &Path) -> Vec<Outcome> {
    let config = GenerationConfig::from_yaml(CONFIG).unwrap();
    let outcomes: Vec<Outcome> = generate_all(&targets(&config), &schema(), &config.databases, Mode::Emit)
        .into_iter()
        .collect::<Result<_>>()
        .unwrap();
    for outcome in &outcomes {
        write_outcome(root, outcome).unwrap();
    }
    outcomes
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap_or_else(|e| panic!("{path}: {e}"))
}

fn snapshot(root: &Path) -> Vec<(String, String)> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let rel = path.strip_prefix(root).unwrap().display().to_string();
                files.push((rel, fs::read_to_string(&path).unwrap()));
            }
        }
    }
    files.sort();
    files
}

#[test]
fn config_drives_every_enabled_target() {
    let config = GenerationConfig::from_yaml(CONFIG).unwrap();
    assert_eq!(config.databases, vec![Dialect::Postgres, Dialect::Sqlite]);
    let kinds: Vec<_> = targets(&config).iter().map(Target::kind).collect();
    assert_eq!(kinds, vec![TargetKind::Python3, TargetKind::Rust, TargetKind::TypeScript]);
}

#[test]
fn unknown_config_keys_are_rejected() {
    let err = GenerationConfig::from_yaml("databases: [postgres]\nverbose: true\n").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn python_tree_is_written() {
    let dir = tempfile::tempdir().unwrap();
    emit(dir.path());

    let record = read(dir.path(), "py/tables/Orders.py");
    assert!(record.starts_with("# Generated by schemagen. Do not edit."));
    assert!(record.contains("class Orders(mettle.io.ISerializable, mettle.db.IPrimaryKey):"));

    let pg = read(dir.path(), "py/dao/postgres/OrdersByStatus.py");
    assert!(pg.contains("where status = $1 order by [orderBy]"));
    let lite = read(dir.path(), "py/dao/sqlite/OrdersByStatus.py");
    assert!(lite.contains("where status = ?1 order by [orderBy]"));

    assert!(read(dir.path(), "py/tables/__init__.py").contains("from .OrdersKey import OrdersKey"));
    assert!(dir.path().join("py/dao/__init__.py").is_file());
}

#[test]
fn rust_tree_parses() {
    let dir = tempfile::tempdir().unwrap();
    let outcomes = emit(dir.path());
    let rust = outcomes.iter().find(|o| o.target == "rust").unwrap();
    assert!(!rust.documents.is_empty());
    for doc in &rust.documents {
        let path = Path::new("rs").join(doc.relative_path());
        let text = read(dir.path(), &path.display().to_string());
        syn::parse_file(&text).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
    }
    assert!(dir.path().join("rs/tables/dav.rs").is_file());
    assert!(dir.path().join("rs/dao/sqlite/orders_insert.rs").is_file());
}

#[test]
fn typescript_writes_records_only() {
    let dir = tempfile::tempdir().unwrap();
    let outcomes = emit(dir.path());
    let ts = outcomes.iter().find(|o| o.target == "typescript").unwrap();
    assert!(ts.documents.iter().all(|d| d.dir.starts_with("tables") || d.stem == "index"));
    assert!(!dir.path().join("ts/dao").exists());
    assert!(dir.path().join("ts/tables/index.ts").is_file());
}

#[test]
fn generating_twice_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    emit(dir.path());
    let first = snapshot(dir.path());
    emit(dir.path());
    assert_eq!(first, snapshot(dir.path()));
}

#[test]
fn clean_removes_generated_files() {
    let dir = tempfile::tempdir().unwrap();
    emit(dir.path());

    let target = Target::new(TargetKind::Python3, "py", &RawTargetOptions::default()).unwrap();
    let outcome = target
        .generate(&schema(), &[Dialect::Postgres, Dialect::Sqlite], Mode::Clean)
        .unwrap();
    assert!(outcome.documents.is_empty());
    let removed = write_outcome(dir.path(), &outcome).unwrap();

    assert!(removed.contains(&dir.path().join("py/tables/Orders.py")));
    assert!(!dir.path().join("py/tables/Orders.py").exists());
    assert!(!dir.path().join("py/dao/sqlite/OrdersInsert.py").exists());
    assert!(dir.path().join("rs/tables/orders.rs").is_file());
}

#[test]
fn file_in_place_of_a_directory_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("py")).unwrap();
    fs::write(dir.path().join("py/tables"), "not a directory").unwrap();

    let target = Target::new(TargetKind::Python3, "py", &RawTargetOptions::default()).unwrap();
    let outcome = target.generate(&schema(), &[Dialect::Postgres], Mode::Emit).unwrap();
    let err = write_outcome(dir.path(), &outcome).unwrap_err();
    assert!(matches!(err, Error::DirectoryConflict { path } if path.ends_with("py/tables")));
}

#[test]
fn failing_target_leaves_the_others_running() {
    let schema = Schema::from_yaml(
        r#"
tables:
  - name: T
    columns:
      - { name: code, type: string, dav: { func: "not a path!" } }
"#
    )
    .unwrap();
    let targets = [
        Target::new(TargetKind::Rust, "rs", &RawTargetOptions::default()).unwrap(),
        Target::new(TargetKind::Python3, "py", &RawTargetOptions::default()).unwrap()
    ];
    let results = generate_all(&targets, &schema, &[Dialect::Postgres], Mode::Emit);
    assert!(matches!(results[0], Err(Error::Render { .. })));
    assert!(results[1].is_ok());
}
