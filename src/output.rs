//! JSON output for `--json` mode.
//!
//! Everything the human-readable output reports is gathered into a single
//! serializable document printed once at the end of the run.

use std::path::PathBuf;

use serde::Serialize;

use crate::{
    archiver::{ArchiveReport, Archiver},
    locator::{LocateReport, WalkWarning},
    project::ProjectSummary,
};

/// Top-level JSON document.
#[derive(Serialize, Debug)]
pub struct JsonOutput {
    /// `"dry_run"` or `"archive"`
    pub mode: &'static str,
    pub projects: Vec<JsonProject>,
    pub warnings: Vec<WalkWarning>,
    pub summary: JsonSummary,

    /// Per-project archive failures, empty in dry-run mode
    pub errors: Vec<JsonError>,
}

/// One discovered project and where its archive goes.
#[derive(Serialize, Debug)]
pub struct JsonProject {
    #[serde(flatten)]
    pub project: ProjectSummary,
    pub archive_path: PathBuf,
}

#[derive(Serialize, Debug, Default, PartialEq, Eq)]
pub struct JsonSummary {
    pub found: usize,
    pub archived: usize,
    pub failed: usize,
    pub bytes_written: u64,
}

#[derive(Serialize, Debug)]
pub struct JsonError {
    pub project: String,
    pub archive_path: PathBuf,
    pub message: String,
}

impl JsonOutput {
    fn projects(locate: &LocateReport, archiver: &Archiver) -> Vec<JsonProject> {
        locate
            .projects
            .iter()
            .map(|project| JsonProject {
                project: ProjectSummary::from(project),
                archive_path: archiver.archive_path_for(project),
            })
            .collect()
    }

    /// Document for a dry run: projects and planned archive paths only.
    #[must_use]
    pub fn from_dry_run(locate: &LocateReport, archiver: &Archiver) -> Self {
        Self {
            mode: "dry_run",
            projects: Self::projects(locate, archiver),
            warnings: locate.warnings.clone(),
            summary: JsonSummary {
                found: locate.projects.len(),
                ..JsonSummary::default()
            },
            errors: Vec::new(),
        }
    }

    /// Document for a real run.
    #[must_use]
    pub fn from_archive(locate: &LocateReport, archiver: &Archiver, report: &ArchiveReport) -> Self {
        Self {
            mode: "archive",
            projects: Self::projects(locate, archiver),
            warnings: locate.warnings.clone(),
            summary: JsonSummary {
                found: locate.projects.len(),
                archived: report.archived.len(),
                failed: report.failures.len(),
                bytes_written: report.total_size(),
            },
            errors: report
                .failures
                .iter()
                .map(|failure| JsonError {
                    project: failure.name.clone(),
                    archive_path: failure.archive_path.clone(),
                    message: failure.error.to_string(),
                })
                .collect(),
        }
    }
}
