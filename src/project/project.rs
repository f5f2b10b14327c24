//! Core project data structures and types.
//!
//! This module defines the data structures used to represent a discovered
//! Audacity project: its descriptor file (`.aup`) and the sibling data
//! directory holding the audio blocks.

use std::{
    fmt::{Display, Formatter, Result},
    fs::Metadata,
    path::{Path, PathBuf},
    time::SystemTime,
};

use serde::Serialize;

/// Suffix appended to a project name to get its data directory name.
pub const DATA_SUFFIX: &str = "_data";

/// Extension of the archives produced for each project.
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Filesystem metadata of a project descriptor, captured at discovery time.
///
/// The archive entry for the descriptor is built from these values so the
/// packed file keeps its original permissions and modification time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorInfo {
    /// File name of the descriptor, including its extension
    pub file_name: String,

    /// Permission bits
    pub mode: u32,

    /// Size in bytes when the project was discovered
    pub size: u64,

    /// Last modification time
    pub modified: SystemTime,
}

impl DescriptorInfo {
    /// Capture descriptor metadata from a directory listing.
    ///
    /// A missing modification time (unsupported platform) falls back to the
    /// Unix epoch.
    #[must_use]
    pub fn from_metadata(file_name: impl Into<String>, metadata: &Metadata) -> Self {
        Self {
            file_name: file_name.into(),
            mode: permission_bits(metadata),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Modification time as seconds since the Unix epoch, as stored in tar headers.
    #[must_use]
    pub fn modified_secs(&self) -> u64 {
        unix_secs(self.modified)
    }
}

/// Seconds since the Unix epoch; times before it clamp to `0`.
pub(crate) fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(unix)]
pub(crate) fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
pub(crate) fn permission_bits(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// A discovered Audacity project.
///
/// A project is only ever constructed by the locator once both the descriptor
/// file and its `<name>_data` sibling directory have been seen on disk. It is
/// read-only afterwards: the fields are private and the data directory name is
/// always derived from the project name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    name: String,
    parent_directory: PathBuf,
    descriptor: DescriptorInfo,
    data_directory_name: String,
}

impl Project {
    /// Create a new project instance.
    ///
    /// # Arguments
    ///
    /// * `name` - Project name (descriptor file name without its extension)
    /// * `parent_directory` - Directory containing the descriptor file
    /// * `descriptor` - Captured descriptor metadata
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::{path::PathBuf, time::SystemTime};
    /// # use aup_packer::project::{DescriptorInfo, Project};
    /// let descriptor = DescriptorInfo {
    ///     file_name: "song.aup".to_string(),
    ///     mode: 0o644,
    ///     size: 1024,
    ///     modified: SystemTime::now(),
    /// };
    ///
    /// let project = Project::new("song", PathBuf::from("/music"), descriptor);
    /// assert_eq!(project.data_directory_name(), "song_data");
    /// ```
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        parent_directory: PathBuf,
        descriptor: DescriptorInfo,
    ) -> Self {
        let name = name.into();
        let data_directory_name = format!("{name}{DATA_SUFFIX}");

        Self {
            name,
            parent_directory,
            descriptor,
            data_directory_name,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parent_directory(&self) -> &Path {
        &self.parent_directory
    }

    #[must_use]
    pub const fn descriptor(&self) -> &DescriptorInfo {
        &self.descriptor
    }

    #[must_use]
    pub fn data_directory_name(&self) -> &str {
        &self.data_directory_name
    }

    /// Full path of the `.aup` descriptor file.
    #[must_use]
    pub fn descriptor_path(&self) -> PathBuf {
        self.parent_directory.join(&self.descriptor.file_name)
    }

    /// Full path of the `<name>_data` directory.
    #[must_use]
    pub fn data_directory_path(&self) -> PathBuf {
        self.parent_directory.join(&self.data_directory_name)
    }

    /// File name of the archive produced for this project (`<name>.tar.gz`).
    #[must_use]
    pub fn archive_file_name(&self) -> String {
        format!("{}{ARCHIVE_EXTENSION}", self.name)
    }

    /// Path of the archive inside `output_dir`.
    #[must_use]
    pub fn archive_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.archive_file_name())
    }
}

impl Display for Project {
    /// Format the project as `🎵 name (parent directory)`.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "🎵 {} ({})", self.name, self.parent_directory.display())
    }
}

/// Serializable view of a project, used by the JSON output.
#[derive(Serialize, Debug)]
pub struct ProjectSummary {
    pub name: String,
    pub parent_directory: PathBuf,
    pub descriptor: String,
    pub descriptor_size: u64,
    pub data_directory: String,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            parent_directory: project.parent_directory.clone(),
            descriptor: project.descriptor.file_name.clone(),
            descriptor_size: project.descriptor.size,
            data_directory: project.data_directory_name.clone(),
        }
    }
}
