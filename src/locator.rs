//! Directory scanning and Audacity project detection.
//!
//! This module walks a directory tree looking for project descriptors
//! (`*.aup` files) that sit next to a matching `<name>_data` directory. Data
//! directories are pruned from the walk so a project's own payload is never
//! scanned for nested projects.
//!
//! Discovery is best-effort: an unreadable entry never aborts the scan, it is
//! recorded as a [`WalkWarning`] and the walk moves on.

use std::{
    fmt::{Display, Formatter},
    fs,
    path::{Path, PathBuf},
};

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::{
    config::ScanOptions,
    project::{DATA_SUFFIX, DescriptorInfo, Project, Projects},
};

/// Recognizes project descriptor files by name.
///
/// Swapping the implementation changes which files anchor a project without
/// touching the traversal.
pub trait DescriptorPredicate {
    /// Return the project name for a descriptor file name, or `None` if the
    /// file is not a recognized descriptor.
    fn descriptor_stem<'a>(&self, file_name: &'a str) -> Option<&'a str>;

    /// Whether the file at `path` is a recognized descriptor.
    fn is_recognized_descriptor(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| self.descriptor_stem(n))
            .is_some()
    }
}

/// Audacity 1.x/2.x project descriptors: files ending in `.aup`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AudacityDescriptor;

impl AudacityDescriptor {
    pub const EXTENSION: &'static str = ".aup";
}

impl DescriptorPredicate for AudacityDescriptor {
    fn descriptor_stem<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name.strip_suffix(Self::EXTENSION)
    }
}

/// A filesystem error met during the walk.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct WalkWarning {
    /// Path the error relates to, when known
    pub path: Option<PathBuf>,

    /// Human-readable error message
    pub message: String,
}

impl Display for WalkWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path.display(), self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<walkdir::Error> for WalkWarning {
    fn from(err: walkdir::Error) -> Self {
        Self {
            path: err.path().map(Path::to_path_buf),
            message: err
                .io_error()
                .map_or_else(|| err.to_string(), ToString::to_string),
        }
    }
}

/// Result of a scan: the projects found plus every absorbed walk error.
#[derive(Debug, Default)]
pub struct LocateReport {
    /// Projects in the order their descriptors were met
    pub projects: Projects,

    /// Errors that cut a branch of the walk short
    pub warnings: Vec<WalkWarning>,
}

/// Directory walker detecting Audacity projects.
pub struct Locator {
    /// Configuration options for scanning behavior
    scan_options: ScanOptions,

    /// Decides which files are project descriptors
    predicate: Box<dyn DescriptorPredicate>,

    /// When `true`, suppresses the progress spinner (used by `--json` mode).
    quiet: bool,
}

impl Locator {
    /// Create a new locator recognizing `.aup` descriptors.
    #[must_use]
    pub fn new(scan_options: ScanOptions) -> Self {
        Self {
            scan_options,
            predicate: Box::new(AudacityDescriptor),
            quiet: false,
        }
    }

    /// Replace the descriptor predicate.
    #[must_use]
    pub fn with_predicate(mut self, predicate: impl DescriptorPredicate + 'static) -> Self {
        self.predicate = Box::new(predicate);
        self
    }

    /// Enable or disable quiet mode (suppresses progress spinner).
    #[must_use]
    pub const fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Walk `root` and collect every Audacity project below it.
    ///
    /// The walk is depth-first, pre-order, with directory entries sorted by
    /// name, so the result order is stable for a given tree. Symbolic links
    /// are not followed.
    ///
    /// A root that does not exist or cannot be read produces an empty project
    /// list and a warning; walk errors never escape this method.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::path::Path;
    /// # use aup_packer::{config::ScanOptions, locator::Locator};
    /// let report = Locator::new(ScanOptions::default()).locate(Path::new("/music"));
    /// println!("Found {} projects", report.projects.len());
    /// ```
    pub fn locate(&self, root: &Path) -> LocateReport {
        let progress = if self.quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("Scanning directories...");
            pb
        };

        let mut projects = Vec::new();
        let mut warnings = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.should_descend(entry));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if let Some(project) = self.detect_project(&entry, &mut warnings) {
                        progress.set_message(format!("Found {}", project.name()));
                        projects.push(project);
                    }
                }
                Err(err) => warnings.push(WalkWarning::from(err)),
            }
            progress.tick();
        }

        progress.finish_and_clear();

        if self.scan_options.verbose && !self.quiet {
            for warning in &warnings {
                eprintln!("{}", format!("Warning: {warning}").red());
            }
        }

        LocateReport {
            projects: projects.into(),
            warnings,
        }
    }

    /// Whether the walk should yield (and, for directories, enter) `entry`.
    fn should_descend(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return true;
        }

        let Some(name) = entry.file_name().to_str() else {
            return true;
        };

        if Self::is_data_directory(name) {
            return false;
        }

        entry.depth() == 0 || !self.is_in_skip_list(name)
    }

    /// Build a project from `entry` if it is a descriptor with a data directory.
    fn detect_project(&self, entry: &DirEntry, warnings: &mut Vec<WalkWarning>) -> Option<Project> {
        if !entry.file_type().is_file() {
            return None;
        }

        let file_name = entry.file_name().to_str()?;
        let name = self.predicate.descriptor_stem(file_name)?;
        let parent_directory = entry
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let data_directory = parent_directory.join(format!("{name}{DATA_SUFFIX}"));
        if !fs::metadata(&data_directory).is_ok_and(|m| m.is_dir()) {
            return None;
        }

        match entry.metadata() {
            Ok(metadata) => Some(Project::new(
                name,
                parent_directory,
                DescriptorInfo::from_metadata(file_name, &metadata),
            )),
            Err(err) => {
                warnings.push(WalkWarning::from(err));
                None
            }
        }
    }

    fn is_data_directory(name: &str) -> bool {
        name.ends_with(DATA_SUFFIX)
    }

    fn is_in_skip_list(&self, name: &str) -> bool {
        self.scan_options
            .skip
            .iter()
            .any(|skip| skip.as_os_str() == name)
    }
}
