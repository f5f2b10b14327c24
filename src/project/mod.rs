//! Project representation.
//!
//! This module contains the data structures describing discovered Audacity
//! projects.
//!
//! ## Main Parts
//!
//! - [`Project`] - A descriptor file paired with its `_data` directory
//! - [`DescriptorInfo`] - Metadata of the descriptor captured at discovery time
//! - [`Projects`] - The ordered collection returned by the locator

#[allow(clippy::module_inception)]
pub mod project;
pub mod projects;

pub use project::{ARCHIVE_EXTENSION, DATA_SUFFIX, DescriptorInfo, Project, ProjectSummary};
pub use projects::Projects;

pub(crate) use project::{permission_bits, unix_secs};
