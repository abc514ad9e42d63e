use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_LOG_FILE: &str = "/tmp/arch-installer.log";

/// Interactive Arch Linux installer: partitions a disk, installs the base
/// system and configures it to boot with systemd-boot.
#[derive(Debug, Parser)]
#[command(name = "arch-installer")]
#[command(version)]
pub struct Cli {
    /// Print every command instead of running it.
    ///
    /// Read-only queries (lsblk, timedatectl) still execute so the prompts
    /// show real choices. Files are written under a staging directory in the
    /// system temp dir instead of /mnt, and the root check is skipped.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Where the installation log is written.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["arch-installer"]);
        assert!(!cli.dry_run);
        assert_eq!(cli.log_level(), "info");
        assert_eq!(cli.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["arch-installer", "--dry-run", "-vv", "--log-file", "/tmp/x.log"]);
        assert!(cli.dry_run);
        assert_eq!(cli.log_level(), "trace");
        assert_eq!(cli.log_file, PathBuf::from("/tmp/x.log"));
    }

    #[test]
    fn test_command_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
