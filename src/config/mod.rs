//! Configuration types and options for the application.
//!
//! This module contains the configuration structures built once at startup
//! and passed by reference to the locator and the archiver.

pub mod archive;
pub mod file;
pub mod scan;

pub use archive::ArchiveOptions;
pub use file::FileConfig;
pub use scan::ScanOptions;
