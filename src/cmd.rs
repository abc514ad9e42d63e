use std::{
    fmt,
    io::{self, Write},
    process::{Command, Stdio},
};

use tracing::{debug, info, warn};

use crate::{
    config::Target,
    error::{InstallerError, Result},
    ui,
};

// ── Command description ───────────────────────────────────────────────────────

/// A program plus its argument list. Nothing goes through a shell, so values
/// such as usernames or disk paths are never re-parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    stdin: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    /// `arch-chroot <root> <program>`: runs `program` inside the new system.
    pub fn chroot(target: &Target, program: impl Into<String>) -> Self {
        CommandSpec::new("arch-chroot")
            .arg(target.root_arg())
            .arg(program)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Data written to the child's stdin. Kept out of `Display`.
    pub fn stdin(mut self, data: impl Into<String>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn stdin_data(&self) -> Option<&str> {
        self.stdin.as_deref()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if self.stdin.is_some() {
            f.write_str(" <stdin>")?;
        }
        Ok(())
    }
}

// ── Command result ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `-1` when the process was killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Applies fail-fast classification: a non-zero exit becomes
    /// `CommandFailed` when `fail_on_non_zero` is set.
    pub fn check(self, spec: &CommandSpec, fail_on_non_zero: bool) -> Result<CommandOutput> {
        if fail_on_non_zero && !self.success() {
            return Err(InstallerError::CommandFailed {
                command: spec.to_string(),
                exit_code: self.exit_code,
                stderr: self.stderr,
            });
        }
        Ok(self)
    }
}

// ── Runner abstraction ────────────────────────────────────────────────────────

/// Executes one external command at a time, blocking until it exits.
pub trait CommandRunner {
    fn execute(&self, spec: &CommandSpec, fail_on_non_zero: bool) -> Result<CommandOutput>;

    /// Fail-fast execution; the common case.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.execute(spec, true)
    }

    /// Runs a command whose outcome must never stop the installer.
    fn run_best_effort(&self, spec: &CommandSpec) {
        match self.execute(spec, false) {
            Ok(out) if !out.success() => {
                warn!(command = %spec, exit_code = out.exit_code, "best-effort command failed")
            }
            Ok(_) => {}
            Err(e) => warn!(command = %spec, error = %e, "best-effort command failed"),
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn not_found_or_io(program: &str, err: io::Error) -> InstallerError {
    if err.kind() == io::ErrorKind::NotFound {
        InstallerError::CommandNotFound(program.to_string())
    } else {
        InstallerError::Io(err)
    }
}

fn print_captured_output(stdout: &str, stderr: &str) {
    if !stdout.is_empty() {
        eprintln!("{}", stdout);
    }
    if !stderr.is_empty() {
        eprintln!("{}", stderr);
    }
}

fn trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end().to_string()
}

/// Maps a binary name to the Arch package that ships it.
pub fn package_for(program: &str) -> &str {
    match program {
        "mkfs.fat" | "mkfs.vfat" | "fsck.fat" | "fatlabel" => "dosfstools",
        "mkfs.ext4" | "mkfs.ext3" | "mkfs.ext2" | "e2fsck" | "tune2fs" => "e2fsprogs",
        "mkfs.btrfs" | "btrfs" => "btrfs-progs",
        "mkfs.xfs" | "xfs_repair" => "xfsprogs",
        "mkswap" | "swapon" | "swapoff" | "mount" | "umount" | "lsblk" | "blkid"
        | "findmnt" => "util-linux",
        "pacstrap" | "genfstab" | "arch-chroot" => "arch-install-scripts",
        "parted" => "parted",
        "setfont" => "kbd",
        other => other,
    }
}

// ── Real subprocesses ─────────────────────────────────────────────────────────

/// Spawns real processes. Output is captured while a spinner is shown and
/// replayed on the terminal only when the command fails.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn spawn(spec: &CommandSpec) -> Result<CommandOutput> {
        let mut command = Command::new(spec.program());
        command
            .args(spec.arguments())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match spec.stdin_data() {
            None => command
                .stdin(Stdio::null())
                .output()
                .map_err(|e| not_found_or_io(spec.program(), e))?,
            Some(data) => {
                let mut child = command
                    .stdin(Stdio::piped())
                    .spawn()
                    .map_err(|e| not_found_or_io(spec.program(), e))?;
                if let Some(mut stdin) = child.stdin.take() {
                    // A child that exits without reading its input closes the
                    // pipe; its exit status and stderr are what gets reported.
                    match stdin.write_all(data.as_bytes()) {
                        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                            debug!(command = %spec, "child closed stdin early")
                        }
                        Err(e) => {
                            let _ = child.kill();
                            let _ = child.wait();
                            return Err(e.into());
                        }
                        Ok(()) => {}
                    }
                    // stdin drops here so the child sees EOF.
                }
                child.wait_with_output()?
            }
        };

        Ok(CommandOutput {
            stdout: trimmed(&output.stdout),
            stderr: trimmed(&output.stderr),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

impl CommandRunner for SystemRunner {
    fn execute(&self, spec: &CommandSpec, fail_on_non_zero: bool) -> Result<CommandOutput> {
        // Ctrl-C between two commands must not let the next one start.
        if crate::was_interrupted() {
            return Err(InstallerError::Interrupted);
        }
        debug!(command = %spec, "executing");

        let pb = ui::spinner(spec.to_string());
        let result = Self::spawn(spec);
        pb.finish_and_clear();

        let output = result?;
        debug!(command = %spec, exit_code = output.exit_code, "finished");

        if fail_on_non_zero && !output.success() {
            print_captured_output(&output.stdout, &output.stderr);
        }
        output.check(spec, fail_on_non_zero)
    }
}

// ── Dry run ───────────────────────────────────────────────────────────────────

/// UUID reported for every `blkid` query in dry-run mode.
pub const DRY_RUN_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Prints each command instead of running it. Queries the installer depends
/// on (`findmnt`, `blkid`) get plausible placeholder answers.
#[derive(Debug, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn execute(&self, spec: &CommandSpec, _fail_on_non_zero: bool) -> Result<CommandOutput> {
        info!(command = %spec, "dry-run: not executed");
        ui::print_info(&format!("[dry-run] {}", spec));

        let stdout = match spec.program() {
            "blkid" => DRY_RUN_UUID.to_string(),
            "findmnt" => "/dev/dry-run".to_string(),
            _ => String::new(),
        };

        Ok(CommandOutput {
            stdout,
            ..CommandOutput::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{atomic::Ordering, Mutex, MutexGuard};

    /// Serialises tests that spawn through `SystemRunner`, since one of them
    /// raises the process-wide interrupt flag.
    fn serial() -> MutexGuard<'static, ()> {
        static LOCK: Mutex<()> = Mutex::new(());
        LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_display_hides_stdin() {
        let spec = CommandSpec::new("chpasswd").stdin("root:hunter2\n");
        assert_eq!(spec.to_string(), "chpasswd <stdin>");
        assert_eq!(spec.stdin_data(), Some("root:hunter2\n"));
    }

    #[test]
    fn test_chroot_prefix() {
        let spec = CommandSpec::chroot(&Target::default(), "hwclock").arg("--systohc");
        assert_eq!(spec.program(), "arch-chroot");
        assert_eq!(spec.arguments(), ["/mnt", "hwclock", "--systohc"]);
    }

    #[test]
    fn test_check_classifies_exit_codes() {
        let spec = CommandSpec::new("mkswap").arg("/dev/sda2");
        let failed = CommandOutput {
            stdout: String::new(),
            stderr: "mkswap: cannot open /dev/sda2".to_string(),
            exit_code: 1,
        };

        assert!(failed.clone().check(&spec, false).is_ok());
        match failed.check(&spec, true) {
            Err(InstallerError::CommandFailed { command, exit_code, stderr }) => {
                assert_eq!(command, "mkswap /dev/sda2");
                assert_eq!(exit_code, 1);
                assert_eq!(stderr, "mkswap: cannot open /dev/sda2");
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_system_runner_captures_trimmed_stdout() {
        let _guard = serial();
        let out = SystemRunner
            .run(&CommandSpec::new("echo").args(["hello", "world"]))
            .expect("echo runs");
        assert_eq!(out.stdout, "hello world");
        assert!(out.success());
    }

    #[test]
    fn test_system_runner_feeds_stdin() {
        let _guard = serial();
        let out = SystemRunner
            .run(&CommandSpec::new("cat").stdin("user:pass\n"))
            .expect("cat runs");
        assert_eq!(out.stdout, "user:pass");
    }

    #[test]
    fn test_system_runner_reports_exit_when_stdin_is_not_read() {
        let _guard = serial();
        // Large enough to overflow the pipe buffer after the child is gone.
        let input = "x".repeat(1 << 20);
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo 'chpasswd: cannot open /etc/shadow' >&2; exit 3"])
            .stdin(input);

        match SystemRunner.run(&spec) {
            Err(InstallerError::CommandFailed { exit_code, stderr, .. }) => {
                assert_eq!(exit_code, 3);
                assert_eq!(stderr, "chpasswd: cannot open /etc/shadow");
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_system_runner_refuses_after_interrupt() {
        let _guard = serial();
        crate::INTERRUPTED.store(true, Ordering::Relaxed);
        let result = SystemRunner.run(&CommandSpec::new("definitely-not-a-real-binary-xyz"));
        crate::INTERRUPTED.store(false, Ordering::Relaxed);

        // A spawn attempt would have produced CommandNotFound.
        assert!(matches!(result, Err(InstallerError::Interrupted)));
    }

    #[test]
    fn test_system_runner_non_zero_exit() {
        let _guard = serial();
        let spec = CommandSpec::new("false");
        assert!(matches!(
            SystemRunner.run(&spec),
            Err(InstallerError::CommandFailed { exit_code: 1, .. })
        ));
        let out = SystemRunner.execute(&spec, false).expect("not checked");
        assert_eq!(out.exit_code, 1);
    }

    #[test]
    fn test_system_runner_missing_program() {
        let _guard = serial();
        let spec = CommandSpec::new("definitely-not-a-real-binary-xyz");
        assert!(matches!(
            SystemRunner.run(&spec),
            Err(InstallerError::CommandNotFound(p)) if p == "definitely-not-a-real-binary-xyz"
        ));
    }

    #[test]
    fn test_dry_run_answers_queries() {
        let out = DryRunRunner
            .run(&CommandSpec::new("blkid").args(["-s", "UUID", "-o", "value", "/dev/x"]))
            .expect("dry-run never fails");
        assert_eq!(out.stdout, DRY_RUN_UUID);
        let out = DryRunRunner
            .run(&CommandSpec::new("parted").args(["-s", "/dev/sda", "mklabel", "gpt"]))
            .expect("dry-run never fails");
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn test_package_hints() {
        assert_eq!(package_for("mkfs.fat"), "dosfstools");
        assert_eq!(package_for("arch-chroot"), "arch-install-scripts");
        assert_eq!(package_for("foo"), "foo");
    }
}
