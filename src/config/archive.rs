//! Archive configuration.
//!
//! This module defines the options that control where and how project
//! archives are written.

use std::path::PathBuf;

/// Default gzip compression level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Highest gzip compression level accepted.
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Configuration for archive creation.
#[derive(Clone, Debug)]
pub struct ArchiveOptions {
    /// Directory receiving every archive.
    ///
    /// `None` places each archive next to its project's descriptor file.
    pub output_dir: Option<PathBuf>,

    /// Gzip level, `0` (store) to `9` (best)
    pub compression_level: u32,

    /// Only report the archives that would be written
    pub dry_run: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            dry_run: false,
        }
    }
}
