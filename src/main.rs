use std::{env, fs, io, path::Path, process};

use clap::Parser;
use tracing::{error, info, warn};

use arch_installer::{
    cli::Cli,
    cmd::{self, CommandRunner, CommandSpec, DryRunRunner, SystemRunner},
    config::{Target, CONSOLE_FONT},
    error::{InstallerError, Result},
    host::{self, LinuxHost},
    logging,
    pipeline::InstallationPipeline,
    prompt,
    steps::StepContext,
    ui, was_interrupted,
};

const DRY_RUN_DIR: &str = "arch-installer-dry-run";

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_file, cli.log_level()) {
        ui::print_warning(&format!("Logging disabled: {}", e));
    }
    info!(dry_run = cli.dry_run, "installer starting");

    if let Err(e) = arch_installer::install_interrupt_handler() {
        warn!(error = %e, "could not install Ctrl-C handler");
    }

    let result = run(&cli).map_err(|e| {
        if was_interrupted() || e.is_interrupt() {
            InstallerError::Interrupted
        } else {
            e
        }
    });

    if let Err(e) = result {
        let code = e.exit_code();
        report(&e, &cli);
        process::exit(code);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // ── Guard ─────────────────────────────────────────────────────────────────
    if !cli.dry_run && !host::is_root() {
        return Err(InstallerError::NotRoot);
    }

    let system = SystemRunner;
    let dry = DryRunRunner;
    let runner: &dyn CommandRunner = if cli.dry_run { &dry } else { &system };

    let target = if cli.dry_run {
        let staging = env::temp_dir().join(DRY_RUN_DIR);
        reset_staging(&staging)?;
        Target::new(staging)
    } else {
        Target::default()
    };

    runner.run_best_effort(&CommandSpec::new("setfont").arg(CONSOLE_FONT));

    // ── Welcome ───────────────────────────────────────────────────────────────
    ui::print_banner();

    if cli.dry_run {
        ui::print_warning("DRY-RUN MODE: no disk will be touched, no command will run.");
        ui::print_info(&format!("Files go to {}.", target.root().display()));
    }

    ui::print_info("This wizard installs Arch Linux on a whole disk.");
    ui::print_warning("Run it from the Arch Linux live environment.");

    let linux = LinuxHost;
    let ctx = StepContext {
        runner,
        host: &linux,
        target: &target,
    };
    let pipeline = InstallationPipeline::default();
    // Checked again by `run`; failing here spares the user the prompts.
    pipeline.preflight(&ctx)?;

    // ── Choices ───────────────────────────────────────────────────────────────
    // Queries run for real even in dry-run so the choices are genuine.
    let config = prompt::collect(&system)?;
    prompt::confirm(&config)?;
    info!(?config, "configuration confirmed");

    // ── Install ───────────────────────────────────────────────────────────────
    let report = pipeline.run(&config, &ctx)?;

    // ── Done ──────────────────────────────────────────────────────────────────
    println!();
    ui::print_heading("Installation complete");
    ui::print_success(&format!(
        "Total installation time: {:.1} minutes",
        report.elapsed_minutes()
    ));
    ui::print_warning("A reboot is required.");

    if prompt::ask_reboot()? {
        runner.run_best_effort(&CommandSpec::new("reboot"));
    }
    Ok(())
}

/// Empties the dry-run tree so appended files start fresh on every run.
fn reset_staging(staging: &Path) -> Result<()> {
    match fs::remove_dir_all(staging) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(staging)?;
    info!(path = %staging.display(), "dry-run staging directory reset");
    Ok(())
}

// ── Error reporting ───────────────────────────────────────────────────────────

fn report(e: &InstallerError, cli: &Cli) {
    println!();
    match e {
        InstallerError::Cancelled => {
            info!("installation cancelled at confirmation");
            ui::print_warning("Installation cancelled.");
            return;
        }
        InstallerError::Interrupted => {
            warn!("installation interrupted by user");
            ui::print_warning("Installation interrupted by user.");
        }
        _ => {
            error!(error = %e, "installation failed");
            ui::print_error(&e.to_string());
        }
    }

    if let Some(stderr) = e.stderr() {
        ui::print_detail(stderr);
    }
    if let InstallerError::CommandNotFound(program) = e.root_cause() {
        ui::print_info(&format!(
            "'{}' is provided by the '{}' package.",
            program,
            cmd::package_for(program)
        ));
    }
    if matches!(e, InstallerError::StepFailed { .. }) {
        ui::print_warning("The disk was left as-is. Check the messages above, then start over from a clean disk.");
    }
    ui::print_info(&format!("Full log: {}", cli.log_file.display()));
}
