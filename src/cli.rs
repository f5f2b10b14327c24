use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;

use aup_packer::config::{
    ArchiveOptions, FileConfig, ScanOptions,
    archive::{DEFAULT_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL},
    file::expand_tilde,
};

#[derive(Parser)]
struct ScanningArgs {
    /// Show access errors that occur while scanning
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Directory names to skip during scanning
    #[arg(long, action = clap::ArgAction::Append)]
    skip: Vec<PathBuf>,
}

#[derive(Parser)]
struct ArchiveArgs {
    /// Output directory. Omitted means next to each project
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Gzip compression level (0-9)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u32).range(0..=9))]
    level: Option<u32>,

    /// Only list the archives that would be written
    #[arg(long)]
    dry_run: bool,
}

#[derive(Parser)]
#[command(name = "aup-packer")]
#[command(about = "Locate Audacity projects and pack each one into a .tar.gz archive")]
#[command(version)]
pub(crate) struct Cli {
    /// Root path to scan for projects
    pub(crate) root: PathBuf,

    /// Print a single JSON document instead of human-readable output
    #[arg(long)]
    pub(crate) json: bool,

    /// Scanning options
    #[command(flatten)]
    scanning: ScanningArgs,

    /// Archive options
    #[command(flatten)]
    archive: ArchiveArgs,
}

impl Cli {
    pub(crate) fn scan_options(&self, file_config: &FileConfig) -> ScanOptions {
        let skip = if self.scanning.skip.is_empty() {
            file_config.scanning.skip.clone().unwrap_or_default()
        } else {
            self.scanning.skip.clone()
        };

        ScanOptions {
            verbose: self.scanning.verbose || file_config.scanning.verbose.unwrap_or(false),
            skip,
        }
    }

    pub(crate) fn archive_options(&self, file_config: &FileConfig) -> Result<ArchiveOptions> {
        let output_dir = self
            .archive
            .output
            .clone()
            .or_else(|| file_config.output.as_deref().map(expand_tilde))
            .filter(|dir| !dir.as_os_str().is_empty());

        let compression_level = self
            .archive
            .level
            .or(file_config.archive.compression_level)
            .unwrap_or(DEFAULT_COMPRESSION_LEVEL);

        if compression_level > MAX_COMPRESSION_LEVEL {
            bail!("compression_level must be between 0 and {MAX_COMPRESSION_LEVEL}, got {compression_level}");
        }

        Ok(ArchiveOptions {
            output_dir,
            compression_level,
            dry_run: self.archive.dry_run || file_config.archive.dry_run.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("aup-packer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_root_is_required() {
        assert!(Cli::try_parse_from(["aup-packer"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["/music"]);
        let config = FileConfig::default();

        assert_eq!(cli.root, PathBuf::from("/music"));
        assert!(!cli.json);

        let scan = cli.scan_options(&config);
        assert!(!scan.verbose);
        assert!(scan.skip.is_empty());

        let archive = cli.archive_options(&config).unwrap();
        assert!(archive.output_dir.is_none());
        assert_eq!(archive.compression_level, DEFAULT_COMPRESSION_LEVEL);
        assert!(!archive.dry_run);
    }

    #[test]
    fn test_flags() {
        let cli = parse(&[
            "/music", "-o", "/backup", "-l", "9", "--dry-run", "-v", "--skip", "old", "--json",
        ]);
        let config = FileConfig::default();

        let archive = cli.archive_options(&config).unwrap();
        assert_eq!(archive.output_dir, Some(PathBuf::from("/backup")));
        assert_eq!(archive.compression_level, 9);
        assert!(archive.dry_run);

        let scan = cli.scan_options(&config);
        assert!(scan.verbose);
        assert_eq!(scan.skip, vec![PathBuf::from("old")]);
        assert!(cli.json);
    }

    #[test]
    fn test_level_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["aup-packer", "/music", "-l", "10"]).is_err());
    }

    #[test]
    fn test_empty_output_means_next_to_project() {
        let config: FileConfig = toml::from_str("output = \"\"\n").unwrap();

        let archive = parse(&["/music"]).archive_options(&config).unwrap();
        assert!(archive.output_dir.is_none());
    }

    #[test]
    fn test_config_file_fills_missing_flags() {
        let config: FileConfig = toml::from_str(
            r#"
output = "/srv/backup"

[scanning]
verbose = true
skip = [".Trash"]

[archive]
compression_level = 1
"#,
        )
        .unwrap();

        let cli = parse(&["/music"]);
        let archive = cli.archive_options(&config).unwrap();
        assert_eq!(archive.output_dir, Some(PathBuf::from("/srv/backup")));
        assert_eq!(archive.compression_level, 1);

        let scan = cli.scan_options(&config);
        assert!(scan.verbose);
        assert_eq!(scan.skip, vec![PathBuf::from(".Trash")]);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let config: FileConfig = toml::from_str(
            r#"
output = "/srv/backup"

[archive]
compression_level = 1
"#,
        )
        .unwrap();

        let cli = parse(&["/music", "-o", "/elsewhere", "-l", "8"]);
        let archive = cli.archive_options(&config).unwrap();
        assert_eq!(archive.output_dir, Some(PathBuf::from("/elsewhere")));
        assert_eq!(archive.compression_level, 8);
    }

    #[test]
    fn test_invalid_config_level_is_an_error() {
        let config: FileConfig = toml::from_str("[archive]\ncompression_level = 12\n").unwrap();

        assert!(parse(&["/music"]).archive_options(&config).is_err());
    }
}
