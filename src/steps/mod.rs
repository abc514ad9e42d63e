pub mod configure;
pub mod format;
pub mod fstab;
pub mod mount;
pub mod packages;
pub mod partition;

use std::{fs, io::Write, path::Path};

use tracing::debug;

use crate::{
    cmd::CommandRunner,
    config::{InstallConfig, Target},
    error::Result,
    host::HostProbe,
};

pub use configure::Configure;
pub use packages::{InstallBase, InstallPackages};
pub use partition::Partition;

/// Collaborators every step works through.
pub struct StepContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub host: &'a dyn HostProbe,
    pub target: &'a Target,
}

/// One stage of the installation. Steps keep no state of their own; each
/// `run` either finishes its work or returns the first error it hits.
pub trait ProvisioningStep {
    /// Short identifier used in errors and logs.
    fn name(&self) -> &'static str;

    /// Heading shown to the user.
    fn title(&self) -> &'static str {
        self.name()
    }

    fn run(&self, config: &InstallConfig, ctx: &StepContext<'_>) -> Result<()>;
}

// ── File helpers for the target tree ──────────────────────────────────────────

/// Replaces `path` with `contents`, creating parent directories.
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

/// Appends `contents` to `path`, creating it if needed.
pub(crate) fn append_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new().append(true).create(true).open(path)?;
    file.write_all(contents.as_bytes())?;
    debug!(path = %path.display(), bytes = contents.len(), "appended to file");
    Ok(())
}
