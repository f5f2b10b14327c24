//! Scanning configuration for project discovery.

use std::path::PathBuf;

/// Configuration for directory scanning behavior.
#[derive(Clone, Debug, Default)]
pub struct ScanOptions {
    /// Whether to print the errors met while walking the tree
    pub verbose: bool,

    /// Directory names that are never descended into
    pub skip: Vec<PathBuf>,
}
