// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! One generation run of one target.

use std::{collections::BTreeSet, fmt, path::PathBuf};

use schemagen_core::{Schema, Table};
use tracing::{debug, info};

use super::{
    Generator,
    context::{DaoContext, GenerationContext},
    document::{Cleanup, Document, Manifest}
};
use crate::{
    config::{Flavour, TargetOptions},
    diagnostics::Diagnostics,
    dialect::Dialect,
    error::Result,
    naming::IdentifierPolicy
};

/// What a run produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Render documents.
    #[default]
    Emit,
    /// List the files a previous emit would have written.
    Clean
}

/// Where a run is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Between runs.
    #[default]
    Idle,
    /// Emitting records.
    Tables,
    /// Emitting DAOs for one dialect and flavour.
    Daos(Dialect, Flavour)
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Tables => f.write_str("tables"),
            Self::Daos(dialect, flavour) => write!(f, "dao {dialect} {flavour}")
        }
    }
}

/// Result of running one target.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Target name.
    pub target: &'static str,

    /// Output root of the target.
    pub dest: PathBuf,

    /// Mode the run was made in.
    pub mode: Mode,

    /// Documents in emission order; empty in clean mode.
    pub documents: Vec<Document>,

    /// Files per directory.
    pub manifest: Manifest,

    /// Deletions; empty in emit mode.
    pub cleanups: Vec<Cleanup>,

    /// Recoverable findings of configuration and generation.
    pub diagnostics: Diagnostics
}

/// Drives a [`Generator`] over a schema.
///
/// Accumulators belong to the run and are reset at the start of every
/// [`GenerationRun::generate`].
pub struct GenerationRun<'g> {
    generator: &'g dyn Generator,

    options: &'g TargetOptions,

    policy: &'g IdentifierPolicy,

    mode: Mode,

    phase: Phase,

    documents: Vec<Document>,

    manifest: Manifest,

    cleanups: BTreeSet<Cleanup>
}

impl<'g> GenerationRun<'g> {
    /// Idle run.
    #[must_use]
    pub fn new(
        generator: &'g dyn Generator,
        options: &'g TargetOptions,
        policy: &'g IdentifierPolicy,
        mode: Mode
    ) -> Self {
        Self {
            generator,
            options,
            policy,
            mode,
            phase: Phase::Idle,
            documents: Vec::new(),
            manifest: Manifest::default(),
            cleanups: BTreeSet::new()
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Walk every table of `schema`, records first, then DAOs for every
    /// dialect in `databases` and every enabled flavour.
    ///
    /// Every call starts from empty accumulators, so repeated runs do not
    /// see each other's files. The run is back in [`Phase::Idle`]
    /// afterwards, also on error.
    ///
    /// # Errors
    ///
    /// Returns the first error of any table; nothing after it is generated.
    pub fn generate(&mut self, schema: &Schema, databases: &[Dialect]) -> Result<()> {
        self.documents.clear();
        self.manifest = Manifest::default();
        self.cleanups.clear();
        let result = self.walk(schema, databases);
        self.enter(Phase::Idle);
        result
    }

    fn walk(&mut self, schema: &Schema, databases: &[Dialect]) -> Result<()> {
        self.enter(Phase::Tables);
        for table in schema.tables() {
            self.tables(schema, table)?;
        }
        if !self.generator.generates_dao() {
            return Ok(());
        }
        for &dialect in databases {
            for flavour in self.options.flavours() {
                self.enter(Phase::Daos(dialect, flavour));
                for table in schema.tables() {
                    self.daos(schema, table, dialect, flavour)?;
                }
            }
        }
        Ok(())
    }

    /// Consume the run.
    #[must_use]
    pub fn finish(self, dest: PathBuf, diagnostics: Diagnostics) -> Outcome {
        Outcome {
            target: self.generator.name(),
            dest,
            mode: self.mode,
            documents: self.documents,
            manifest: self.manifest,
            cleanups: self.cleanups.into_iter().collect(),
            diagnostics
        }
    }

    fn enter(&mut self, phase: Phase) {
        if self.phase != phase {
            info!(target_name = self.generator.name(), %phase, "entering phase");
            self.phase = phase;
        }
    }

    fn context<'s>(&'s self, schema: &'s Schema, table: &'s Table) -> GenerationContext<'s> {
        GenerationContext::new(
            schema,
            table,
            self.options,
            self.policy,
            self.generator.catalog(),
            self.generator.literal_style()
        )
    }

    fn tables(&mut self, schema: &Schema, table: &Table) -> Result<()> {
        if self.mode == Mode::Clean {
            self.clean(PathBuf::from(&self.options.dir_tables));
            return Ok(());
        }
        let ctx = self.context(schema, table);
        let mut rendered = Vec::new();
        for spec in ctx.table_records()? {
            let body = self.generator.emit_record(&ctx, &spec)?;
            rendered.push((spec.record.dir, spec.record.file_stem, spec.record.class_name, body));
        }
        for (dir, stem, class_name, body) in rendered {
            self.push(dir, stem, class_name, body);
        }
        Ok(())
    }

    fn daos(&mut self, schema: &Schema, table: &Table, dialect: Dialect, flavour: Flavour) -> Result<()> {
        let ctx = self.context(schema, table);
        let dao = DaoContext::new(&ctx, dialect, flavour);
        if self.mode == Mode::Clean {
            let dir = dao.dir;
            self.clean(dir);
            return Ok(());
        }

        let standard = dao.standard_procs();
        let mut rendered = Vec::new();

        let shell = dao.shell(&standard)?;
        let body = self.generator.emit_dao_shell(&dao, &shell)?;
        rendered.push((shell.file_stem, shell.class_name, body));

        for (kind, proc) in standard.iter() {
            let spec = dao.procedure(proc, Some(kind))?;
            let body = self.generator.emit_procedure(&dao, &spec)?;
            rendered.push((spec.file_stem, spec.class_name, body));
        }
        for proc in &table.procedures {
            let spec = dao.procedure(proc, None)?;
            let body = self.generator.emit_procedure(&dao, &spec)?;
            rendered.push((spec.file_stem, spec.class_name, body));
        }

        let dir = dao.dir.clone();
        for (stem, class_name, body) in rendered {
            self.push(dir.clone(), stem, class_name, body);
        }
        Ok(())
    }

    fn push(&mut self, dir: PathBuf, stem: String, class_name: String, body: String) {
        let doc = Document {
            namespace: Document::namespace_of(&self.options.namespace, &dir),
            dir,
            stem,
            extension: self.generator.extension(),
            class_name: Some(class_name),
            body
        };
        info!(
            target_name = self.generator.name(),
            path = %doc.relative_path().display(),
            "generated document"
        );
        self.manifest.record(&doc);
        self.documents.push(doc);
    }

    fn clean(&mut self, dir: PathBuf) {
        let cleanup = Cleanup {
            dir,
            extension: self.generator.extension()
        };
        debug!(dir = %cleanup.dir.display(), "scheduled cleanup");
        self.cleanups.insert(cleanup);
    }
}
