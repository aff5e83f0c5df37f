//! The bake pipeline: raw sheets in, a linked container and persisted artifacts out.
//!
//! Per sheet the engine loads the keys persisted by the previous bake, converts and dedups the source rows,
//! diffs their ids against those keys and adds the table to the container. Once every sheet is in, references
//! are resolved against the whole container and everything is saved in one redb transaction.

pub mod artifacts;
pub mod existing;
pub mod link;
pub mod report;

use crate::assets::{AssetResolver, NoAssets};
use crate::container::{Container, ContainerSchema};
use crate::error::BakeError;
use crate::sheet_name;
use crate::source::SheetSource;
use artifacts::{ArtifactStore, SheetPlan};
use existing::ExistingArtifacts;
use link::{Linker, RowIndex};
use report::{BakeReport, SheetReport};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakePhase {
    Start,
    ResolveExistingAssets,
    DiffRows,
    WriteRows,
    MapReferences,
    Save,
    Done,
    Failed,
}

/// Cancels a bake before it commits. A bake already saving runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct BakeOutput {
    pub container: Container,
    pub report: BakeReport,
}

#[derive(Clone)]
pub struct Baker {
    schema: Arc<ContainerSchema>,
    source: Arc<dyn SheetSource>,
    assets: Arc<dyn AssetResolver>,
    store: ArtifactStore,
    cancel: CancelToken,
}

impl Baker {
    pub fn new(schema: ContainerSchema, source: impl SheetSource + 'static, store: ArtifactStore) -> Self {
        Baker { schema: Arc::new(schema), source: Arc::new(source), assets: Arc::new(NoAssets), store, cancel: CancelToken::new() }
    }

    pub fn with_assets(mut self, assets: impl AssetResolver + 'static) -> Self {
        self.assets = Arc::new(assets);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn schema(&self) -> &ContainerSchema {
        &self.schema
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Runs the whole pipeline on the calling thread.
    pub fn bake(&self) -> Result<BakeOutput, BakeError> {
        let mut report = BakeReport::start();
        let mut phase = BakePhase::Start;
        match self.run(&mut report, &mut phase) {
            Ok(container) => {
                report.finish();
                info!(
                    sheets = container.len(),
                    rows = report.rows(),
                    row_issues = report.row_issues().count(),
                    reference_errors = report.reference_errors().count(),
                    "bake done"
                );
                Ok(BakeOutput { container, report })
            }
            Err(err) => {
                error!(failed_in = ?phase, error = %err, "bake failed");
                phase = BakePhase::Failed;
                debug!(?phase, "nothing committed");
                Err(err)
            }
        }
    }

    /// Runs the pipeline on tokio's blocking pool.
    pub async fn bake_async(&self) -> Result<BakeOutput, BakeError> {
        let baker = self.clone();
        tokio::task::spawn_blocking(move || baker.bake()).await.map_err(|e| BakeError::Join(e.to_string()))?
    }

    /// The container of the last committed bake.
    pub fn load(&self) -> Result<Container, BakeError> {
        self.store.load(&self.schema)
    }

    fn check_cancelled(&self) -> Result<(), BakeError> {
        if self.cancel.is_cancelled() {
            warn!("bake cancelled");
            return Err(BakeError::Cancelled);
        }
        Ok(())
    }

    fn enter(phase: &mut BakePhase, next: BakePhase, sheet: Option<&str>) {
        *phase = next;
        debug!(?phase, sheet, "bake phase");
    }

    fn run(&self, report: &mut BakeReport, phase: &mut BakePhase) -> Result<Container, BakeError> {
        let naming = self.schema.naming_strategy();
        let mut container = Container::new(naming);
        let mut existing = ExistingArtifacts::default();
        let mut plans = Vec::with_capacity(self.schema.sheets().len());
        let mut file_names = HashSet::new();

        for (position, decl) in self.schema.sheets().iter().enumerate() {
            self.check_cancelled()?;
            let name = decl.name();
            if name.trim().is_empty() {
                return Err(BakeError::InvalidSheetName(name.to_string()));
            }
            if sheet_name::is_pseudo(name) && !self.schema.allows_pseudo() {
                debug!(sheet = name, "pseudo sheet skipped");
                report.skipped.push(name.to_string());
                continue;
            }
            let file_name = sheet_name::file_name(name, Some(position)).ok_or_else(|| BakeError::InvalidSheetName(name.to_string()))?;
            if !file_names.insert(file_name.clone()) {
                return Err(BakeError::DuplicateSheet(name.to_string()));
            }
            let mut sheet = SheetReport::new(name, &file_name);

            Self::enter(phase, BakePhase::ResolveExistingAssets, Some(name));
            existing.load(&self.store, &file_name)?;

            Self::enter(phase, BakePhase::DiffRows, Some(name));
            let raw = match self.source.read(name)? {
                Some(rows) => rows,
                None => {
                    warn!(sheet = name, "sheet missing from source, baking it empty");
                    Vec::new()
                }
            };
            let table = (decl.ingest)(name, &raw, naming, &mut sheet.issues);
            let diff = existing.diff(table.keys());
            existing.clear();

            Self::enter(phase, BakePhase::WriteRows, Some(name));
            sheet.rows = table.len();
            sheet.created = diff.created.len();
            sheet.updated = diff.updated.len();
            sheet.removed = diff.removed.len();
            container.insert(table)?;
            plans.push(SheetPlan { file_name, removed: diff.removed });
            info!(sheet = name, rows = sheet.rows, created = sheet.created, updated = sheet.updated, removed = sheet.removed, issues = sheet.issues.len(), "sheet written");
            report.sheets.push(sheet);
        }

        Self::enter(phase, BakePhase::MapReferences, None);
        let index = RowIndex::build(&container);
        let linker = Linker::new(&index, self.assets.as_ref());
        for table in container.tables_mut() {
            let errors = table.map_references(&linker);
            if let Some(sheet) = report.sheet_mut(table.name()) {
                sheet.references = errors;
            }
        }

        self.check_cancelled()?;
        Self::enter(phase, BakePhase::Save, None);
        self.store.save(&container, &plans)?;
        Self::enter(phase, BakePhase::Done, None);
        Ok(container)
    }
}
