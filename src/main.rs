//! # aup-packer
//!
//! A CLI tool that locates Audacity projects (`<name>.aup` next to a
//! `<name>_data` directory) and packs each one into `<name>.tar.gz`.
//!
//! ## Usage
//!
//! ```bash
//! # Pack every project below ~/Music, archives next to each project
//! aup-packer ~/Music
//!
//! # Collect all archives in one directory
//! aup-packer ~/Music --output /mnt/backup
//!
//! # See what would be written
//! aup-packer ~/Music --dry-run
//! ```

mod cli;

use anyhow::Result;
use aup_packer::{
    archiver::Archiver, config::FileConfig, locator::Locator, output::JsonOutput,
};
use clap::Parser;
use cli::Cli;
use colored::Colorize;
use std::process::exit;

/// Entry point for the aup-packer application.
///
/// Errors from [`inner_main`] are printed to stderr before exiting with a
/// non-zero status code. Failures to pack individual projects are not errors
/// here: they are reported and the run carries on.
fn main() {
    if let Err(err) = inner_main() {
        eprintln!("Error: {err}");

        exit(1);
    }
}

/// Main application logic that can return errors.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Loads the persistent configuration file (if present)
/// 3. Locates the projects below the root directory
/// 4. Either lists the planned archives (dry run) or writes them
/// 5. If `--json` is active, emits a single JSON document to stdout
///
/// # Errors
///
/// Returns an error for invalid configuration values or when the JSON
/// document cannot be serialized.
fn inner_main() -> Result<()> {
    let args = Cli::parse();
    let json_mode = args.json;

    let file_config = match FileConfig::load() {
        Ok(config) => config,
        Err(e) => {
            if !json_mode {
                eprintln!("{} {e}", "Warning: Failed to load config file:".yellow());
            }
            FileConfig::default()
        }
    };

    let scan_options = args.scan_options(&file_config);
    let archive_options = args.archive_options(&file_config)?;
    let dry_run = archive_options.dry_run;
    let verbose = scan_options.verbose;

    let locator = Locator::new(scan_options).with_quiet(json_mode);
    let archiver = Archiver::new(archive_options).with_quiet(json_mode);

    let located = locator.locate(&args.root);

    if !json_mode {
        println!("Found {} projects", located.projects.len());

        if !verbose && !located.warnings.is_empty() {
            eprintln!(
                "{}",
                format!(
                    "⚠️  {} paths could not be scanned (use --verbose to list them)",
                    located.warnings.len()
                )
                .yellow()
            );
        }
    }

    if located.projects.is_empty() {
        if json_mode {
            let output = JsonOutput::from_dry_run(&located, &archiver);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", "✨ No Audacity projects found!".green());
        }
        return Ok(());
    }

    if dry_run {
        if json_mode {
            let output = JsonOutput::from_dry_run(&located, &archiver);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            located.projects.print_summary();
            println!("\n{}", "🧪 Dry run complete! Would write:".yellow());
            for project in &located.projects {
                println!("  {}", archiver.archive_path_for(project).display());
            }
        }
        return Ok(());
    }

    let report = archiver.archive_projects(&located.projects);

    if json_mode {
        let output = JsonOutput::from_archive(&located, &archiver, &report);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        Archiver::print_summary(&report);
    }

    Ok(())
}
