//! Project archiving.
//!
//! This module packs each discovered project into a gzip-compressed tarball
//! named `<project>.tar.gz`. The archive holds the `.aup` descriptor at its
//! root and the whole `<project>_data` tree below a directory of the same name.
//!
//! Projects are archived one after the other. A failing project is reported
//! and skipped; it never stops the rest of the batch.

use std::{
    fs::{self, File},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use colored::Colorize;
use flate2::{Compression, write::GzEncoder};
use humansize::{DECIMAL, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use tar::{Builder, EntryType, Header};
use thiserror::Error;
use walkdir::WalkDir;

use crate::{
    config::{ArchiveOptions, archive::MAX_COMPRESSION_LEVEL},
    project::{Project, Projects, permission_bits, unix_secs},
};

/// Errors raised while writing a project archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive file could not be created.
    #[error("cannot create archive {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },

    /// The project descriptor vanished or is unreadable.
    #[error("cannot open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    /// Reading a source entry or writing the archive failed.
    #[error("cannot write {} into the archive: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

impl ArchiveError {
    fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// A `.tar.gz` file being written.
///
/// The writer is closed exactly once: [`ArchiveWriter::close`] finishes the
/// tar stream and the gzip trailer, and any later call, including the one made
/// on drop, does nothing.
pub struct ArchiveWriter {
    path: PathBuf,
    builder: Option<Builder<GzEncoder<File>>>,
}

impl ArchiveWriter {
    /// Create (or truncate) the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Create`] if the file cannot be created, for
    /// example because the parent directory does not exist.
    pub fn create(path: &Path, compression_level: u32) -> Result<Self, ArchiveError> {
        let file = File::create(path).map_err(|source| ArchiveError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        let level = Compression::new(compression_level.min(MAX_COMPRESSION_LEVEL));

        Ok(Self {
            path: path.to_path_buf(),
            builder: Some(Builder::new(GzEncoder::new(file, level))),
        })
    }

    /// Path of the archive file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`ArchiveWriter::close`] already ran.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.builder.is_none()
    }

    fn builder(&mut self) -> Result<&mut Builder<GzEncoder<File>>, ArchiveError> {
        let path = self.path.clone();
        self.builder.as_mut().ok_or_else(|| {
            ArchiveError::write(path, io::Error::other("archive is already closed"))
        })
    }

    /// Append the project's descriptor under its bare file name.
    ///
    /// Mode and modification time come from the metadata captured at
    /// discovery; the size is read from the file as it is now.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Open`] if the descriptor cannot be opened and
    /// [`ArchiveError::Write`] if copying it into the archive fails.
    pub fn append_descriptor(&mut self, project: &Project) -> Result<(), ArchiveError> {
        let source_path = project.descriptor_path();
        let open_error = |source| ArchiveError::Open {
            path: source_path.clone(),
            source,
        };

        let file = File::open(&source_path).map_err(open_error)?;
        let len = file.metadata().map_err(open_error)?.len();

        let info = project.descriptor();
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(len);
        header.set_mode(info.mode);
        header.set_mtime(info.modified_secs());

        self.builder()?
            .append_data(&mut header, &info.file_name, file.take(len))
            .map_err(|source| ArchiveError::write(&source_path, source))
    }

    /// Append every entry below `dir`, hidden ones included, rooted at
    /// `archive_name` inside the archive.
    ///
    /// Entries are added in sorted order so the same tree always produces the
    /// same archive.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Write`] on the first entry that cannot be read
    /// or written.
    pub fn append_tree(&mut self, dir: &Path, archive_name: &str) -> Result<(), ArchiveError> {
        let builder = self.builder()?;

        for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let path = err.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                ArchiveError::write(path, err.into())
            })?;

            let Ok(relative) = entry.path().strip_prefix(dir) else {
                continue;
            };

            let name = if relative.as_os_str().is_empty() {
                PathBuf::from(archive_name)
            } else {
                Path::new(archive_name).join(relative)
            };

            let source_error = |source| ArchiveError::write(entry.path(), source);

            // Symlinks are stored as what they point to.
            let metadata = fs::metadata(entry.path()).map_err(source_error)?;

            if metadata.is_dir() {
                let mut header = entry_header(EntryType::Directory, 0, &metadata);
                builder
                    .append_data(&mut header, &name, io::empty())
                    .map_err(source_error)?;
            } else if metadata.is_file() {
                let file = File::open(entry.path()).map_err(source_error)?;
                let mut header = entry_header(EntryType::Regular, metadata.len(), &metadata);
                builder
                    .append_data(&mut header, &name, file.take(metadata.len()))
                    .map_err(source_error)?;
            }
        }

        Ok(())
    }

    /// Finish the archive and flush it to disk.
    ///
    /// Calling this more than once is harmless: only the first call writes.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Write`] if the trailing blocks cannot be written.
    pub fn close(&mut self) -> Result<(), ArchiveError> {
        let Some(builder) = self.builder.take() else {
            return Ok(());
        };

        let write_error = |source| ArchiveError::write(&self.path, source);

        let encoder = builder.into_inner().map_err(write_error)?;
        let mut file = encoder.finish().map_err(write_error)?;
        file.flush().map_err(write_error)
    }
}

/// Header carrying only type, size, permissions and mtime, so unchanged
/// sources always produce the same bytes.
fn entry_header(entry_type: EntryType, size: u64, metadata: &fs::Metadata) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(entry_type);
    header.set_size(size);
    header.set_mode(permission_bits(metadata));
    header.set_mtime(metadata.modified().map_or(0, unix_secs));
    header
}

impl Drop for ArchiveWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// An archive written successfully.
#[derive(Clone, Debug)]
pub struct ArchivedProject {
    pub name: String,
    pub archive_path: PathBuf,

    /// Size of the archive on disk, in bytes
    pub size: u64,
}

/// A project whose archive could not be written.
#[derive(Debug)]
pub struct ArchiveFailure {
    pub name: String,
    pub archive_path: PathBuf,
    pub error: ArchiveError,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct ArchiveReport {
    pub archived: Vec<ArchivedProject>,
    pub failures: Vec<ArchiveFailure>,
}

impl ArchiveReport {
    /// Total bytes written across all successful archives.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.archived.iter().map(|a| a.size).sum()
    }
}

/// Packs projects into `.tar.gz` archives.
pub struct Archiver {
    options: ArchiveOptions,

    /// When `true`, nothing is printed (used by `--json` mode).
    quiet: bool,
}

impl Archiver {
    #[must_use]
    pub const fn new(options: ArchiveOptions) -> Self {
        Self {
            options,
            quiet: false,
        }
    }

    /// Enable or disable quiet mode (no progress or error output).
    #[must_use]
    pub const fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Directory receiving the archive of `project`: the configured output
    /// directory, or the directory holding the descriptor.
    #[must_use]
    pub fn output_dir_for<'a>(&'a self, project: &'a Project) -> &'a Path {
        self.options
            .output_dir
            .as_deref()
            .unwrap_or_else(|| project.parent_directory())
    }

    /// Archive path `project` would be written to.
    #[must_use]
    pub fn archive_path_for(&self, project: &Project) -> PathBuf {
        project.archive_path(self.output_dir_for(project))
    }

    /// Archive `project` into its resolved output directory.
    ///
    /// # Errors
    ///
    /// See [`Archiver::archive_to`].
    pub fn archive(&self, project: &Project) -> Result<ArchivedProject, ArchiveError> {
        self.archive_to(project, self.output_dir_for(project))
    }

    /// Write `<output_dir>/<name>.tar.gz` for `project`.
    ///
    /// An existing archive is overwritten. The output directory must already
    /// exist. On failure a partial archive may be left behind.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::Create`] if the archive file cannot be created
    /// - [`ArchiveError::Open`] if the descriptor cannot be opened
    /// - [`ArchiveError::Write`] if any entry cannot be read or written
    pub fn archive_to(
        &self,
        project: &Project,
        output_dir: &Path,
    ) -> Result<ArchivedProject, ArchiveError> {
        let archive_path = project.archive_path(output_dir);

        let mut writer = ArchiveWriter::create(&archive_path, self.options.compression_level)?;
        writer.append_descriptor(project)?;
        writer.append_tree(&project.data_directory_path(), project.data_directory_name())?;
        writer.close()?;

        let size = fs::metadata(&archive_path)
            .map_err(|source| ArchiveError::write(&archive_path, source))?
            .len();

        Ok(ArchivedProject {
            name: project.name().to_string(),
            archive_path,
            size,
        })
    }

    /// Archive every project in order, continuing past failures.
    pub fn archive_projects(&self, projects: &Projects) -> ArchiveReport {
        let progress = if self.quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(projects.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▉▊▋▌▍▎▏  "),
            );
            pb
        };

        let mut report = ArchiveReport::default();

        for project in projects {
            self.print_line(&progress, || {
                println!(
                    "Packing Audacity project {:?} at {:?}",
                    project.name(),
                    project.parent_directory()
                );
            });

            match self.archive(project) {
                Ok(archived) => {
                    progress.set_message(format!(
                        "Packed {} ({})",
                        archived.name,
                        format_size(archived.size, DECIMAL)
                    ));
                    report.archived.push(archived);
                }
                Err(error) => {
                    self.print_line(&progress, || {
                        eprintln!(
                            "  {}",
                            format!("Unable to compress {}: {error}", project.name()).red()
                        );
                    });
                    report.failures.push(ArchiveFailure {
                        name: project.name().to_string(),
                        archive_path: self.archive_path_for(project),
                        error,
                    });
                }
            }

            progress.inc(1);
        }

        progress.finish_and_clear();

        report
    }

    fn print_line(&self, progress: &ProgressBar, print: impl FnOnce()) {
        if !self.quiet {
            progress.suspend(print);
        }
    }

    /// Print the outcome of a batch run.
    pub fn print_summary(report: &ArchiveReport) {
        println!("\n{}", "📊 Packing Summary:".bold());
        println!(
            "  ✅ Successfully packed: {} projects",
            report.archived.len().to_string().green()
        );

        if !report.failures.is_empty() {
            println!(
                "  ❌ Failed to pack: {} projects",
                report.failures.len().to_string().red()
            );
        }

        println!(
            "  💾 Total archive size: {}",
            format_size(report.total_size(), DECIMAL)
                .bright_green()
                .bold()
        );
    }
}
