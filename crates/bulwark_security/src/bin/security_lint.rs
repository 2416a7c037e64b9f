//! # Security Lint
//!
//! Offline check of a server directory's `security.toml` and `filters.txt`.
//! Nothing on disk is created or migrated.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use bulwark_security::catalog::{resolve, status_line};
use bulwark_security::service::{CONFIG_FILE_NAME, FILTER_FILE_NAME};
use bulwark_security::{PhraseSet, SecurityDocument, CURRENT_VERSION};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Command line: `<server_dir> [--verbose]`, flags in any position.
#[derive(Debug, PartialEq, Eq)]
struct LintArgs {
    server_dir: PathBuf,
    verbose: bool,
}

impl LintArgs {
    fn parse(args: &[String]) -> Option<Self> {
        let server_dir = args.iter().find(|a| !a.starts_with("--"))?;
        Some(Self {
            server_dir: PathBuf::from(server_dir),
            verbose: args.iter().any(|a| a == "--verbose"),
        })
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         BULWARK SECURITY LINT                                    ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(LintArgs { server_dir, verbose }) = LintArgs::parse(&args) else {
        println!("Usage: security_lint <server_dir> [--verbose]");
        println!();
        println!("Options:");
        println!("  --verbose    Show every check, not only active ones");
        return ExitCode::from(2);
    };

    let config_path = server_dir.join(CONFIG_FILE_NAME);
    let source = match fs::read_to_string(&config_path) {
        Ok(source) => source,
        Err(e) => {
            error!("Could not read {}: {e}", config_path.display());
            return ExitCode::FAILURE;
        }
    };
    let document = match SecurityDocument::parse(&source) {
        Ok(document) => document,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if document.version() < CURRENT_VERSION {
        warn!(
            "{} is version {}; the server will archive it and write version {CURRENT_VERSION}.",
            config_path.display(),
            document.version()
        );
    }

    let (defaults, checks) = match resolve(&document) {
        Ok(resolved) => resolved,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    println!("┌─ CHECKS ─────────────────────────────────────────────────────────┐");
    println!(
        "│ Defaults: [{:<6}] distance {:?}",
        defaults.mode.name(),
        defaults.distance
    );
    println!("│");
    let mut active = 0;
    for check in &checks {
        if check.settings.mode.is_active() {
            active += 1;
        } else if !verbose {
            continue;
        }
        println!("│ {}", status_line(check, &defaults));
    }
    println!("│");
    println!("│ Active: {active} of {}", checks.len());
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let filter_path = server_dir.join(FILTER_FILE_NAME);
    match fs::read_to_string(&filter_path) {
        Ok(source) => {
            let (phrases, rejected) = PhraseSet::parse(&source);
            println!("Filter phrases: {}", phrases.len());
            for phrase in rejected {
                println!("  ignored (too short): {phrase}");
            }
        }
        Err(e) => warn!("No filter loaded from {}: {e}", filter_path.display()),
    }

    println!();
    println!("✓ security.toml is valid");
    ExitCode::SUCCESS
}
