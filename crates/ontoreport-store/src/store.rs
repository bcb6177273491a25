//! Report store: read, merge and rewrite the shared report artifact
//!
//! Writers hold the report lease for the whole read-merge-write section.
//! Every write lands in a temporary file next to the artifact and is renamed
//! over it, so readers never observe a partial document.

use crate::lease::{acquire, LeaseBackend};
use ontoreport_core::{
    report_now, DiagnosticReport, LockConfig, ReportCollection, ReportError,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ReportStore {
    path: PathBuf,
    lock: LockConfig,
    lease: Arc<dyn LeaseBackend>,
}

impl ReportStore {
    pub fn new(path: impl Into<PathBuf>, lock: LockConfig, lease: Arc<dyn LeaseBackend>) -> Self {
        Self {
            path: path.into(),
            lock,
            lease,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted collection.
    ///
    /// A missing artifact is an error unless `suppress_missing` is set, in
    /// which case the empty collection is returned.
    pub fn read(&self, suppress_missing: bool) -> Result<ReportCollection, ReportError> {
        if !self.path.exists() {
            if suppress_missing {
                return Ok(ReportCollection::new());
            }
            return Err(ReportError::NotFound(self.path.clone()));
        }
        let json = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Merge `reports` into the artifact.
    ///
    /// An empty `targets` list is a full regeneration: the previous content is
    /// discarded and `report_date_generated` is stamped. Otherwise the existing
    /// collection is kept and only the given acronyms are replaced.
    pub fn refresh(
        &self,
        targets: &[String],
        reports: BTreeMap<String, DiagnosticReport>,
    ) -> Result<ReportCollection, ReportError> {
        let _guard = acquire(&*self.lease, &self.lock)?;

        let full = targets.is_empty();
        let mut collection = if full {
            ReportCollection::new()
        } else {
            self.read(true)?
        };

        let merged = reports.len();
        collection.merge(reports);
        if full {
            collection.report_date_generated = Some(report_now());
        }

        self.write(&collection)?;
        info!(
            path = %self.path.display(),
            merged,
            total = collection.ontologies.len(),
            full,
            "wrote ontologies report"
        );
        Ok(collection)
    }

    /// Drop the given acronyms from the artifact.
    pub fn delete_entities(&self, acronyms: &[String]) -> Result<(), ReportError> {
        if acronyms.is_empty() || !self.path.exists() {
            return Ok(());
        }

        let _guard = acquire(&*self.lease, &self.lock)?;
        let mut collection = self.read(true)?;
        if collection.ontologies.is_empty() {
            return Ok(());
        }

        let before = collection.ontologies.len();
        for acronym in acronyms {
            collection.ontologies.remove(acronym);
        }
        if collection.ontologies.len() == before {
            debug!("no listed ontology present in report");
            return Ok(());
        }

        self.write(&collection)?;
        info!(removed = before - collection.ontologies.len(), "removed ontologies from report");
        Ok(())
    }

    fn write(&self, collection: &ReportCollection) -> Result<(), ReportError> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(&mut temp, collection)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| ReportError::Io(e.error))?;
        Ok(())
    }
}
