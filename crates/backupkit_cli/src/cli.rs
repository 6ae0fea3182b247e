//! Command-line arguments.

use std::path::PathBuf;

use backupkit_io_fs::{NAME_RULES_FILE_DEFAULT, SpecCopyOptions};
use clap::Parser;

/// Copy directory structures with `.ignorecopy` exclusions.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "backup-tree",
    version,
    about = "Copy directory structures with .ignorecopy exclusions"
)]
pub struct Cli {
    /// Source directory to copy from
    pub source: PathBuf,

    /// Destination directory to copy to
    pub destination: PathBuf,

    /// Override .ignorecopy filtering (copy everything)
    #[arg(long)]
    pub ignore_copy: bool,

    /// Display detailed operation messages
    #[arg(long)]
    pub verbose: bool,

    /// Name of the per-directory rules file
    #[arg(
        long,
        env = "BACKUPKIT_RULES_FILE",
        default_value = NAME_RULES_FILE_DEFAULT,
        value_parser = parse_rules_file_name
    )]
    pub rules_file: String,

    /// Emit debug diagnostics on stderr (RUST_LOG takes precedence)
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Engine options derived from the flags.
    pub fn to_copy_options(&self) -> SpecCopyOptions {
        SpecCopyOptions {
            if_ignore_rules: self.ignore_copy,
            name_rules_file: self.rules_file.clone(),
            flag_cancel: None,
        }
    }
}

fn parse_rules_file_name(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() || value == "." || value == ".." {
        return Err(format!("`{value}` is not a usable file name"));
    }
    if value.contains(['/', '\\']) {
        return Err("rules file name must not contain path separators".to_string());
    }
    Ok(value.to_string())
}
