//! # aup-packer
//!
//! Finds Audacity projects in a directory tree and packs each one into a
//! `.tar.gz` archive.
//!
//! An Audacity project is a `<name>.aup` descriptor file sitting next to a
//! `<name>_data` directory. The [`locator`] finds them, the [`archiver`]
//! writes `<name>.tar.gz` holding the descriptor and the whole data tree.

pub mod archiver;
pub mod config;
pub mod locator;
pub mod output;
pub mod project;
