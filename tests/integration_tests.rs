//! Integration tests for aup-packer
//!
//! These tests create temporary Audacity project trees and run the locator and
//! the archiver against them, then unpack the produced archives to check their
//! contents.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tempfile::TempDir;

use aup_packer::archiver::{ArchiveError, Archiver};
use aup_packer::config::{ArchiveOptions, ScanOptions};
use aup_packer::locator::Locator;
use aup_packer::project::Project;

/// Helper function to create a temporary directory structure for testing
fn create_test_directory() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Helper function to create a file with specified content
fn create_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    fs::write(path, content).expect("Failed to write file");
}

/// Create a mock Audacity project with its descriptor and two tracks
fn create_audacity_project(base_path: &Path, name: &str) -> PathBuf {
    let descriptor = format!(
        r#"<?xml version="1.0" standalone="no" ?>
<project xmlns="http://audacity.sourceforge.net/xml/" projname="{name}_data" version="1.3.0">
</project>
"#
    );
    create_file(&base_path.join(format!("{name}.aup")), descriptor.as_bytes());

    let data_path = base_path.join(format!("{name}_data"));
    create_file(&data_path.join("track1.wav"), b"RIFF\x00\x01track-one");
    create_file(&data_path.join("track2.wav"), b"RIFF\x00\x02track-two");

    data_path
}

fn locator() -> Locator {
    Locator::new(ScanOptions::default()).with_quiet(true)
}

fn archiver(output_dir: Option<&Path>) -> Archiver {
    Archiver::new(ArchiveOptions {
        output_dir: output_dir.map(Path::to_path_buf),
        ..ArchiveOptions::default()
    })
    .with_quiet(true)
}

fn project_names(projects: &[Project]) -> Vec<&str> {
    projects.iter().map(Project::name).collect()
}

/// Unpack an archive into `path -> bytes` for regular files.
fn archive_files(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let file = File::open(path).expect("Failed to open archive");
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut files = BTreeMap::new();

    for entry in archive.entries().expect("Failed to read archive") {
        let mut entry = entry.expect("Failed to read entry");
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let name = entry.path().unwrap().to_string_lossy().into_owned();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        files.insert(name, content);
    }

    files
}

#[test]
fn test_song_scenario_end_to_end() {
    let temp_dir = create_test_directory();
    let base = temp_dir.path();
    create_audacity_project(base, "song");

    let report = locator().locate(base);
    assert_eq!(project_names(report.projects.as_slice()), ["song"]);

    let project = &report.projects.as_slice()[0];
    let archived = archiver(None).archive(project).unwrap();
    assert_eq!(archived.archive_path, base.join("song.tar.gz"));

    let files = archive_files(&archived.archive_path);
    let names: Vec<_> = files.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        ["song.aup", "song_data/track1.wav", "song_data/track2.wav"]
    );

    assert_eq!(files["song.aup"], fs::read(base.join("song.aup")).unwrap());
    assert_eq!(
        files["song_data/track1.wav"],
        fs::read(base.join("song_data/track1.wav")).unwrap()
    );
}

#[test]
fn test_orphan_descriptor_scenario() {
    let temp_dir = create_test_directory();
    create_file(&temp_dir.path().join("orphan.aup"), b"<project/>");

    let report = locator().locate(temp_dir.path());

    assert!(report.projects.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_nested_project_scenario() {
    let temp_dir = create_test_directory();
    let base = temp_dir.path();
    let data_path = create_audacity_project(base, "proj");
    create_audacity_project(&data_path, "nested");

    let report = locator().locate(base);
    assert_eq!(project_names(report.projects.as_slice()), ["proj"]);

    // The nested project still ships inside the outer archive.
    let archived = archiver(None)
        .archive(&report.projects.as_slice()[0])
        .unwrap();
    let files = archive_files(&archived.archive_path);
    assert!(files.contains_key("proj_data/nested.aup"));
    assert!(files.contains_key("proj_data/nested_data/track1.wav"));
}

#[test]
fn test_missing_output_directory_scenario() {
    let temp_dir = create_test_directory();
    let base = temp_dir.path();
    create_audacity_project(&base.join("a"), "first");
    create_audacity_project(&base.join("b"), "second");

    let projects = locator().locate(base).projects;
    assert_eq!(project_names(projects.as_slice()), ["first", "second"]);

    let missing = base.join("no-such-dir");
    let archiver = archiver(Some(&missing));

    let err = archiver.archive(&projects.as_slice()[0]).unwrap_err();
    assert!(matches!(err, ArchiveError::Create { .. }));

    // Other projects are unaffected by one failure
    let out = base.join("out");
    fs::create_dir(&out).unwrap();
    let archived = archiver
        .archive_to(&projects.as_slice()[1], &out)
        .unwrap();
    assert!(archived.archive_path.exists());
}

#[test]
fn test_batch_writes_one_archive_per_project() {
    let temp_dir = create_test_directory();
    let base = temp_dir.path();
    create_audacity_project(&base.join("2019"), "rehearsal");
    create_audacity_project(&base.join("2020"), "concert");
    create_audacity_project(&base.join("2020"), "encore");

    let out = create_test_directory();
    let projects = locator().locate(base).projects;
    let report = archiver(Some(out.path())).archive_projects(&projects);

    assert!(report.failures.is_empty());
    assert_eq!(report.archived.len(), 3);

    for name in ["rehearsal", "concert", "encore"] {
        let archive = out.path().join(format!("{name}.tar.gz"));
        assert!(archive.exists(), "missing {}", archive.display());
        assert!(archive_files(&archive).contains_key(&format!("{name}.aup")));
    }
}

#[test]
fn test_archives_next_to_projects_by_default() {
    let temp_dir = create_test_directory();
    let base = temp_dir.path();
    create_audacity_project(&base.join("deep").join("er"), "song");

    let projects = locator().locate(base).projects;
    let report = archiver(None).archive_projects(&projects);

    assert_eq!(report.archived.len(), 1);
    assert!(base.join("deep/er/song.tar.gz").exists());
    assert!(!base.join("song.tar.gz").exists());
}

#[test]
fn test_rearchiving_overwrites_with_identical_bytes() {
    let temp_dir = create_test_directory();
    let base = temp_dir.path();
    create_audacity_project(base, "song");
    let project = locator().locate(base).projects.as_slice()[0].clone();

    let out = create_test_directory();
    let archiver = archiver(Some(out.path()));

    let first = archiver.archive(&project).unwrap();
    let first_bytes = fs::read(&first.archive_path).unwrap();

    let second = archiver.archive(&project).unwrap();
    let second_bytes = fs::read(&second.archive_path).unwrap();

    assert_eq!(first.archive_path, second.archive_path);
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn test_source_project_is_left_untouched() {
    let temp_dir = create_test_directory();
    let base = temp_dir.path();
    create_audacity_project(base, "song");
    let before = fs::read(base.join("song_data/track2.wav")).unwrap();

    let projects = locator().locate(base).projects;
    archiver(None).archive_projects(&projects);

    assert!(base.join("song.aup").exists());
    assert_eq!(fs::read(base.join("song_data/track2.wav")).unwrap(), before);
}

#[test]
fn test_archive_output_is_not_rediscovered() {
    let temp_dir = create_test_directory();
    let base = temp_dir.path();
    create_audacity_project(base, "song");

    let projects = locator().locate(base).projects;
    archiver(None).archive_projects(&projects);

    // The new song.tar.gz is neither a descriptor nor a data directory
    let again = locator().locate(base);
    assert_eq!(project_names(again.projects.as_slice()), ["song"]);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_reported_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = create_test_directory();
    let base = temp_dir.path();
    create_audacity_project(&base.join("open"), "song");
    let locked = base.join("locked");
    create_audacity_project(&locked, "hidden");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let report = locator().locate(base);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    // Root can read anything, in which case both projects show up
    if report.warnings.is_empty() {
        assert_eq!(report.projects.len(), 2);
    } else {
        assert_eq!(project_names(report.projects.as_slice()), ["song"]);
        assert_eq!(report.warnings[0].path.as_deref(), Some(locked.as_path()));
    }
}
