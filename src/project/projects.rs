//! Collection management for discovered projects.
//!
//! This module provides the `Projects` struct which wraps the ordered list of
//! projects returned by the locator and offers summary reporting on it.

use colored::Colorize;
use humansize::{DECIMAL, format_size};

use super::Project;

/// An ordered collection of discovered projects.
///
/// The order is the order in which the locator met the descriptor files and
/// is preserved through archiving.
#[derive(Clone, Debug, Default)]
pub struct Projects(Vec<Project>);

impl From<Vec<Project>> for Projects {
    fn from(projects: Vec<Project>) -> Self {
        Self(projects)
    }
}

impl IntoIterator for Projects {
    type Item = Project;
    type IntoIter = std::vec::IntoIter<Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Projects {
    type Item = &'a Project;
    type IntoIter = std::slice::Iter<'a, Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Projects {
    /// Total size of all descriptor files in the collection, in bytes.
    #[must_use]
    pub fn get_total_descriptor_size(&self) -> u64 {
        self.0.iter().map(|p| p.descriptor().size).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Project> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Project] {
        &self.0
    }

    /// Print every project followed by a one-line total.
    ///
    /// # Output Format
    ///
    /// ```text
    ///   🎵 song (/music/2019)
    ///   🎵 demo (/music/2020)
    ///   📁 2 Audacity projects (12.3 kB of descriptors)
    /// ```
    pub fn print_summary(&self) {
        for project in &self.0 {
            println!("  {project}");
        }

        println!(
            "  📁 {} Audacity projects ({} of descriptors)",
            self.0.len().to_string().bright_white(),
            format_size(self.get_total_descriptor_size(), DECIMAL).bright_white()
        );
    }
}
