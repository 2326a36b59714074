// Orchestrator: drives every plan entry's selected files through the fetcher

use crate::catalog::{PackageFile, PackageSource};
use crate::error::Error;
use crate::fetcher::{FetchOutcome, NoProgress, ProgressSink, ResumableFetcher};
use crate::http;
use crate::resolver::{FileSelection, PlanEntry, ResolvedDownloadPlan};
use futures::stream::{self, StreamExt};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Where and how a plan is downloaded
#[derive(Debug, Clone)]
pub struct DownloadJob {
    /// CDN base URL prepended to package paths
    pub cdn: String,
    pub destination_root: PathBuf,
    pub install_language: String,
    /// SAP-code groups processed at the same time
    pub concurrency: usize,
}

/// Receives run events, typically to drive terminal output
pub trait RunObserver: Send + Sync {
    fn entry_started(&self, _entry: &PlanEntry) {}

    fn files_selected(&self, _entry: &PlanEntry, _selection: &FileSelection) {}

    fn file_started(
        &self,
        _entry: &PlanEntry,
        _name: &str,
        _expected_size: Option<u64>,
    ) -> Box<dyn ProgressSink> {
        Box::new(NoProgress)
    }

    fn file_finished(&self, _entry: &PlanEntry, _report: &FileReport) {}

    fn entry_failed(&self, _entry: &PlanEntry, _error: &Error) {}
}

/// Observer that ignores everything
pub struct SilentObserver;

impl RunObserver for SilentObserver {}

/// A single file to retrieve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub destination: PathBuf,
    pub expected_size: Option<u64>,
}

impl DownloadTask {
    /// Task for a package file: `cdn + Path` into `product_dir/<basename>`
    pub fn for_package(cdn: &str, file: &PackageFile, product_dir: &Path) -> Self {
        let url = format!("{}{}", cdn, file.path);
        let destination = product_dir.join(http::file_name_from_url(&url));
        Self {
            url,
            destination,
            expected_size: file.download_size,
        }
    }

    pub fn file_name(&self) -> String {
        http::file_name_from_url(&self.url)
    }
}

#[derive(Debug)]
pub struct FileReport {
    pub name: String,
    pub url: String,
    pub destination: PathBuf,
    pub result: Result<FetchOutcome, String>,
}

impl FileReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug)]
pub enum EntryOutcome {
    /// Manifest could not be fetched or saved; no files were attempted
    ManifestFailed(String),
    Processed {
        core_count: usize,
        noncore_count: usize,
        files: Vec<FileReport>,
    },
}

#[derive(Debug)]
pub struct EntryReport {
    pub entry: PlanEntry,
    pub outcome: EntryOutcome,
}

impl EntryReport {
    pub fn files(&self) -> &[FileReport] {
        match &self.outcome {
            EntryOutcome::Processed { files, .. } => files,
            EntryOutcome::ManifestFailed(_) => &[],
        }
    }

    pub fn has_failures(&self) -> bool {
        match &self.outcome {
            EntryOutcome::ManifestFailed(_) => true,
            EntryOutcome::Processed { files, .. } => files.iter().any(|f| !f.is_success()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    CompletedWithFailures,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub entries: Vec<EntryReport>,
}

impl RunReport {
    pub fn status(&self) -> RunStatus {
        if self.entries.iter().any(EntryReport::has_failures) {
            RunStatus::CompletedWithFailures
        } else {
            RunStatus::Completed
        }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&PlanEntry, &FileReport)> {
        self.file_reports().filter(|(_, f)| f.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&PlanEntry, &FileReport)> {
        self.file_reports().filter(|(_, f)| !f.is_success())
    }

    /// Entries whose manifest could not be obtained, with the reason
    pub fn failed_entries(&self) -> impl Iterator<Item = (&PlanEntry, &str)> {
        self.entries.iter().filter_map(|r| match &r.outcome {
            EntryOutcome::ManifestFailed(reason) => Some((&r.entry, reason.as_str())),
            EntryOutcome::Processed { .. } => None,
        })
    }

    fn file_reports(&self) -> impl Iterator<Item = (&PlanEntry, &FileReport)> {
        self.entries
            .iter()
            .flat_map(|r| r.files().iter().map(move |f| (&r.entry, f)))
    }
}

/// Download every selected file of every plan entry.
///
/// Failures are recorded in the report and never stop other files or entries.
/// Entries sharing a SAP code are processed one after another so that a
/// destination directory only ever has one writer.
pub async fn run(
    plan: &ResolvedDownloadPlan,
    source: &dyn PackageSource,
    fetcher: &ResumableFetcher,
    job: &DownloadJob,
    observer: &dyn RunObserver,
) -> RunReport {
    let groups = group_by_sap_code(&plan.entries);

    let mut indexed: Vec<(usize, EntryReport)> = stream::iter(groups)
        .map(|group| async move {
            let mut reports = Vec::with_capacity(group.len());
            for (index, entry) in group {
                reports.push((index, run_entry(entry, source, fetcher, job, observer).await));
            }
            reports
        })
        .buffered(job.concurrency.max(1))
        .flat_map(stream::iter)
        .collect()
        .await;
    indexed.sort_by_key(|(index, _)| *index);

    let report = RunReport {
        entries: indexed.into_iter().map(|(_, report)| report).collect(),
    };
    info!(
        "Run finished: {} file(s) downloaded, {} failed",
        report.succeeded().count(),
        report.failed().count()
    );
    report
}

async fn run_entry(
    entry: &PlanEntry,
    source: &dyn PackageSource,
    fetcher: &ResumableFetcher,
    job: &DownloadJob,
    observer: &dyn RunObserver,
) -> EntryReport {
    observer.entry_started(entry);
    let product_dir = job.destination_root.join(&entry.sap_code);

    let manifest = match source.fetch_package_manifest(&entry.build_guid).await {
        Ok(manifest) => manifest,
        Err(e) => return entry_failed(entry, e, observer),
    };
    if let Err(e) = manifest.persist(&product_dir).await {
        return entry_failed(entry, e, observer);
    }

    let selection = manifest.select_files(&job.install_language);
    info!(
        "[{}] Selected {} core packages and {} non-core packages",
        entry, selection.core_count, selection.noncore_count
    );
    observer.files_selected(entry, &selection);

    let mut files = Vec::with_capacity(selection.files.len());
    for file in &selection.files {
        let report = fetch_file(entry, file, &product_dir, fetcher, job, observer).await;
        observer.file_finished(entry, &report);
        files.push(report);
    }

    EntryReport {
        entry: entry.clone(),
        outcome: EntryOutcome::Processed {
            core_count: selection.core_count,
            noncore_count: selection.noncore_count,
            files,
        },
    }
}

async fn fetch_file(
    entry: &PlanEntry,
    file: &PackageFile,
    product_dir: &Path,
    fetcher: &ResumableFetcher,
    job: &DownloadJob,
    observer: &dyn RunObserver,
) -> FileReport {
    let task = DownloadTask::for_package(&job.cdn, file, product_dir);
    let name = task.file_name();

    let progress = observer.file_started(entry, &name, task.expected_size);
    let result = fetcher
        .fetch(&task.destination, &task.url, task.expected_size, progress.as_ref())
        .await
        .map_err(|e| {
            warn!("[{}] Failed to download {}: {}", entry, name, e);
            e.to_string()
        });

    FileReport {
        name,
        url: task.url,
        destination: task.destination,
        result,
    }
}

fn entry_failed(entry: &PlanEntry, error: Error, observer: &dyn RunObserver) -> EntryReport {
    warn!("[{}] Skipping package set: {}", entry, error);
    observer.entry_failed(entry, &error);
    EntryReport {
        entry: entry.clone(),
        outcome: EntryOutcome::ManifestFailed(error.to_string()),
    }
}

/// Group entries by SAP code, keeping first-appearance order and each entry's plan index
fn group_by_sap_code(entries: &[PlanEntry]) -> Vec<Vec<(usize, &PlanEntry)>> {
    let mut groups: Vec<Vec<(usize, &PlanEntry)>> = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        match groups
            .iter_mut()
            .find(|g| g[0].1.sap_code == entry.sap_code)
        {
            Some(group) => group.push((index, entry)),
            None => groups.push(vec![(index, entry)]),
        }
    }
    groups
}
