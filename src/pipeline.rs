use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::{
    cmd::CommandSpec,
    config::InstallConfig,
    error::{InstallerError, Result},
    layout,
    steps::{Configure, InstallBase, InstallPackages, Partition, ProvisioningStep, StepContext},
    ui,
};

/// Pseudo-step reported when the final unmount fails.
pub const UNMOUNT_STEP: &str = "unmount";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub steps: Vec<(&'static str, StepState)>,
    pub elapsed: Duration,
}

impl PipelineReport {
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }
}

pub struct InstallationPipeline {
    steps: Vec<Box<dyn ProvisioningStep>>,
}

impl Default for InstallationPipeline {
    /// Partition → InstallBase → Configure → InstallPackages.
    fn default() -> Self {
        let steps: Vec<Box<dyn ProvisioningStep>> = vec![
            Box::new(Partition),
            Box::new(InstallBase),
            Box::new(Configure),
            Box::new(InstallPackages),
        ];
        InstallationPipeline::with_steps(steps)
    }
}

impl InstallationPipeline {
    pub fn with_steps(steps: Vec<Box<dyn ProvisioningStep>>) -> Self {
        InstallationPipeline { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Refuses to start when the target root is already a mount point.
    pub fn preflight(&self, ctx: &StepContext<'_>) -> Result<()> {
        let root = ctx.target.root();
        if ctx.host.is_mount_point(root)? {
            return Err(InstallerError::precondition(format!(
                "{} is already mounted; unmount it before installing",
                root.display()
            )));
        }
        Ok(())
    }

    /// Runs every step once, in order, stopping at the first failure.
    /// Nothing is rolled back; a half-partitioned disk stays as it is.
    pub fn run(&self, config: &InstallConfig, ctx: &StepContext<'_>) -> Result<PipelineReport> {
        self.preflight(ctx)?;

        let started = Instant::now();
        let total = self.steps.len();
        let mut states: Vec<(&'static str, StepState)> =
            self.steps.iter().map(|s| (s.name(), StepState::Pending)).collect();

        info!(disk = config.disk(), filesystem = %config.filesystem(), steps = total, "pipeline started");

        for (idx, step) in self.steps.iter().enumerate() {
            let ordinal = idx + 1;
            ui::print_step(ordinal, total, step.title());
            states[idx].1 = StepState::Running;
            info!(step = step.name(), ordinal, "step started");

            if let Err(e) = step.run(config, ctx) {
                states[idx].1 = StepState::Failed;
                error!(step = step.name(), ordinal, error = %e, "step failed; halting");
                return Err(InstallerError::StepFailed {
                    step: step.name(),
                    ordinal,
                    source: Box::new(e),
                });
            }

            states[idx].1 = StepState::Succeeded;
            info!(step = step.name(), ordinal, "step succeeded");
        }

        self.unmount(config, ctx).map_err(|e| {
            error!(error = %e, "unmounting the target failed");
            InstallerError::StepFailed {
                step: UNMOUNT_STEP,
                ordinal: total + 1,
                source: Box::new(e),
            }
        })?;

        let elapsed = started.elapsed();
        info!(elapsed_secs = elapsed.as_secs(), "pipeline finished");
        Ok(PipelineReport { steps: states, elapsed })
    }

    /// Unmounts the whole target tree and deactivates the target's swap.
    fn unmount(&self, config: &InstallConfig, ctx: &StepContext<'_>) -> Result<()> {
        ctx.runner
            .run(&CommandSpec::new("umount").args(["-R", ctx.target.root_arg().as_str()]))?;
        let swap = layout::partition_device(config.disk(), layout::SWAP_PARTITION);
        ctx.runner.run(&CommandSpec::new("swapoff").arg(swap))?;
        ui::print_success(&format!("{} unmounted.", ctx.target.root().display()));
        Ok(())
    }
}
