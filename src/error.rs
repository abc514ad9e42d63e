use thiserror::Error;

use crate::validation::ValidationError;

pub type Result<T> = std::result::Result<T, InstallerError>;

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command '{command}' failed with exit code {exit_code}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Command '{0}' not found; is it installed?")]
    CommandNotFound(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Step {ordinal} ({step}) failed: {source}")]
    StepFailed {
        step: &'static str,
        ordinal: usize,
        #[source]
        source: Box<InstallerError>,
    },

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Installation cancelled by user")]
    Cancelled,

    #[error("Installation interrupted by user")]
    Interrupted,

    #[error("This installer must be run as root (sudo)")]
    NotRoot,

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl InstallerError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Process exit status for this error. Declining the confirmation is a
    /// clean exit; everything else, including Ctrl-C, is a failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled => 0,
            _ => 1,
        }
    }

    /// `true` for Ctrl-C, whether it reached us as a signal or as an
    /// interrupted prompt read.
    pub fn is_interrupt(&self) -> bool {
        match self {
            Self::Interrupted => true,
            Self::Prompt(dialoguer::Error::IO(e)) => e.kind() == std::io::ErrorKind::Interrupted,
            Self::StepFailed { source, .. } => source.is_interrupt(),
            _ => false,
        }
    }

    /// Captured stderr of the command at the root of this error, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            Self::StepFailed { source, .. } => source.stderr(),
            _ => None,
        }
    }

    /// Unwraps `StepFailed` down to the error that actually happened.
    pub fn root_cause(&self) -> &InstallerError {
        match self {
            Self::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_mkfs() -> InstallerError {
        InstallerError::CommandFailed {
            command: "mkfs.ext4 -F /dev/sda3".to_string(),
            exit_code: 1,
            stderr: "mkfs.ext4: Device size reported to be zero.".to_string(),
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(InstallerError::Cancelled.exit_code(), 0);
        assert_eq!(InstallerError::Interrupted.exit_code(), 1);
        assert_eq!(InstallerError::NotRoot.exit_code(), 1);
        assert_eq!(failed_mkfs().exit_code(), 1);
    }

    #[test]
    fn test_step_failed_exposes_stderr_and_cause() {
        let err = InstallerError::StepFailed {
            step: "partition",
            ordinal: 1,
            source: Box::new(failed_mkfs()),
        };
        assert_eq!(err.stderr(), Some("mkfs.ext4: Device size reported to be zero."));
        assert!(matches!(err.root_cause(), InstallerError::CommandFailed { exit_code: 1, .. }));
        assert_eq!(
            err.to_string(),
            "Step 1 (partition) failed: Command 'mkfs.ext4 -F /dev/sda3' failed with exit code 1"
        );
    }

    #[test]
    fn test_interrupt_detection() {
        let prompt = InstallerError::Prompt(dialoguer::Error::IO(std::io::Error::new(
            std::io::ErrorKind::Interrupted,
            "read interrupted",
        )));
        assert!(prompt.is_interrupt());
        assert!(InstallerError::Interrupted.is_interrupt());
        assert!(!failed_mkfs().is_interrupt());
    }

    #[test]
    fn test_empty_stderr_is_none() {
        let err = InstallerError::CommandFailed {
            command: "swapon /dev/sda2".to_string(),
            exit_code: 255,
            stderr: String::new(),
        };
        assert_eq!(err.stderr(), None);
    }
}
