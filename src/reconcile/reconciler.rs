//! Full reconciliation pass and destroy.

use tokio_util::sync::CancellationToken;

use crate::apply::{Applied, Coordinator, FailureCause};
use crate::coupling::CouplingTable;
use crate::plan::{Chunk, Chunks, Planner, PlannerPolicy};
use crate::remote::ControlPlane;
use crate::setting::{ParameterSet, SettingName};
use crate::time::{Sleeper, TokioSleeper};

use super::{ReconcileError, diff};

/// Outcome of [`Reconciler::reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// The parameter set did not exist and was created.
    pub created: bool,
    /// Chunks that set drifted values.
    pub set: Applied,
    /// Batches that reset removed user settings.
    pub reset: Applied,
}

impl Report {
    /// Returns true if nothing was created, set or reset.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        !self.created && self.set.chunks == 0 && self.reset.chunks == 0
    }

    /// Names of submitted settings that take effect after a restart.
    pub fn pending_reboot(&self) -> impl Iterator<Item = &SettingName> {
        self.set
            .pending_reboot
            .iter()
            .chain(&self.reset.pending_reboot)
    }

    /// Returns true if any submitted setting needs a restart.
    #[must_use]
    pub fn requires_restart(&self) -> bool {
        self.set.requires_restart() || self.reset.requires_restart()
    }
}

/// Chunks a pass would submit, computed without changing anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    /// Whether the parameter set exists remotely.
    pub exists: bool,
    /// Chunks that would set drifted values, in submission order.
    pub set_chunks: Vec<Chunk>,
    /// Batches that would reset removed user settings.
    pub reset_chunks: Vec<Chunk>,
}

impl Preview {
    /// Returns true if a pass would make no calls beyond describe.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exists && self.set_chunks.is_empty() && self.reset_chunks.is_empty()
    }
}

/// Result of [`Reconciler::destroy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// Retention was requested; no remote call was made.
    Retained,
    /// The parameter set was deleted.
    Deleted,
    /// The parameter set did not exist.
    AlreadyGone,
}

impl std::fmt::Display for DestroyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retained => write!(f, "retained"),
            Self::Deleted => write!(f, "deleted"),
            Self::AlreadyGone => write!(f, "already gone"),
        }
    }
}

/// Work derived from desired and observed state, before any submission.
struct Prepared {
    set: Chunks,
    reset: Vec<Chunk>,
}

/// Drives reconciliation passes for parameter sets.
///
/// Observed state is read fresh on every pass; nothing is cached between
/// passes. Passes for the same resource must not overlap.
#[derive(Debug)]
pub struct Reconciler<C, S = TokioSleeper> {
    coordinator: Coordinator<C, S>,
    policy: PlannerPolicy,
    coupling: CouplingTable,
}

impl<C, S> Reconciler<C, S> {
    /// Creates a reconciler.
    #[must_use]
    pub const fn new(
        coordinator: Coordinator<C, S>,
        policy: PlannerPolicy,
        coupling: CouplingTable,
    ) -> Self {
        Self {
            coordinator,
            policy,
            coupling,
        }
    }

    /// Returns the coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &Coordinator<C, S> {
        &self.coordinator
    }

    /// Returns the planner policy.
    #[must_use]
    pub const fn policy(&self) -> &PlannerPolicy {
        &self.policy
    }

    /// Builds the planner for an engine family.
    #[must_use]
    pub fn planner_for(&self, family: &str) -> Planner {
        Planner::new(self.policy, self.coupling.rules_for(family))
    }

    /// Builds the planner for reset batches.
    ///
    /// Coupled members removed together stay in one batch; the rest keep
    /// ascending name order regardless of the free-setting policy.
    fn reset_planner_for(&self, family: &str) -> Planner {
        Planner::new(
            PlannerPolicy::new().with_max_chunk_size(self.policy.max_chunk_size),
            self.coupling.rules_for(family),
        )
    }

    fn prepare(
        &self,
        desired: &ParameterSet,
        observed: Option<&ParameterSet>,
    ) -> Result<Prepared, ReconcileError> {
        let observed_settings = observed.map_or(&[][..], |set| set.settings.as_slice());
        let drift = diff(&desired.settings, observed_settings)?;
        tracing::debug!(
            "Drift on '{}': {} to set, {} to reset",
            desired.name,
            drift.to_set.len(),
            drift.to_reset.len()
        );

        let set = self.planner_for(&desired.family).plan(drift.to_set)?;
        let reset = self.reset_planner_for(&desired.family).plan(drift.to_reset)?;
        Ok(Prepared {
            set,
            reset: reset.collect(),
        })
    }

    /// Computes the chunks a pass would submit against `observed`
    /// (`None` meaning the set does not exist), without any remote call.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] for duplicate names or an invalid chunk
    /// size.
    pub fn preview_against(
        &self,
        desired: &ParameterSet,
        observed: Option<&ParameterSet>,
    ) -> Result<Preview, ReconcileError> {
        let prepared = self.prepare(desired, observed)?;
        Ok(Preview {
            exists: observed.is_some(),
            set_chunks: prepared.set.collect(),
            reset_chunks: prepared.reset,
        })
    }
}

impl<C: ControlPlane, S: Sleeper> Reconciler<C, S> {
    /// Reads the observed parameter set, `None` if it does not exist.
    async fn observe(
        &self,
        resource: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ParameterSet>, ReconcileError> {
        let plane = self.coordinator.plane();
        match self
            .coordinator
            .with_retry(cancel, || plane.describe_settings(resource))
            .await
        {
            Ok(set) => Ok(Some(set)),
            Err(FailureCause::NotFound(_)) => Ok(None),
            Err(cause) => Err(ReconcileError::Describe {
                resource: resource.to_string(),
                cause,
            }),
        }
    }

    /// Describes the remote set and computes the chunks a pass would
    /// submit, without changing anything.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] for invalid input or a failed describe.
    pub async fn preview(
        &self,
        desired: &ParameterSet,
        cancel: &CancellationToken,
    ) -> Result<Preview, ReconcileError> {
        let observed = self.observe(&desired.name, cancel).await?;
        self.preview_against(desired, observed.as_ref())
    }

    /// Runs one reconciliation pass for `desired`.
    ///
    /// Describes the remote set (creating it when missing), sets drifted
    /// values in planned chunks, then resets removed user settings in
    /// batches of at most the configured chunk size. Coupled settings are
    /// never split across batches.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] for invalid input or the first remote
    /// failure; nothing after the failing step is attempted.
    pub async fn reconcile(
        &self,
        desired: &ParameterSet,
        cancel: &CancellationToken,
    ) -> Result<Report, ReconcileError> {
        let resource = desired.name.as_str();
        let observed = self.observe(resource, cancel).await?;
        let prepared = self.prepare(desired, observed.as_ref())?;

        let mut report = Report::default();
        if observed.is_none() {
            tracing::info!(
                "Parameter set '{resource}' not found; creating it for family '{}'",
                desired.family
            );
            self.create(desired, cancel).await?;
            report.created = true;
        }

        report.set = self
            .coordinator
            .apply(resource, prepared.set, cancel)
            .await
            .map_err(ReconcileError::Apply)?;

        if !prepared.reset.is_empty() {
            report.reset = self
                .coordinator
                .reset(resource, prepared.reset, cancel)
                .await
                .map_err(ReconcileError::Reset)?;
        }

        tracing::info!(
            "Reconciled '{resource}': {} set chunk(s), {} reset batch(es)",
            report.set.chunks,
            report.reset.chunks
        );
        Ok(report)
    }

    async fn create(
        &self,
        desired: &ParameterSet,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcileError> {
        let plane = self.coordinator.plane();
        self.coordinator
            .with_retry(cancel, || {
                plane.create_parameter_set(&desired.name, &desired.family, &desired.description)
            })
            .await
            .map_err(|cause| ReconcileError::Create {
                resource: desired.name.clone(),
                cause,
            })
    }

    /// Deletes the parameter set, or leaves it in place when `retain` is set.
    ///
    /// Deleting a set that is already gone succeeds with
    /// [`DestroyOutcome::AlreadyGone`].
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Delete`] when the remote keeps failing or
    /// rejects the delete.
    pub async fn destroy(
        &self,
        resource: &str,
        retain: bool,
        cancel: &CancellationToken,
    ) -> Result<DestroyOutcome, ReconcileError> {
        if retain {
            tracing::info!("Retaining parameter set '{resource}'");
            return Ok(DestroyOutcome::Retained);
        }

        let plane = self.coordinator.plane();
        let outcome = match self
            .coordinator
            .with_retry(cancel, || plane.delete_parameter_set(resource))
            .await
        {
            Ok(()) => DestroyOutcome::Deleted,
            Err(FailureCause::NotFound(_)) => DestroyOutcome::AlreadyGone,
            Err(cause) => {
                return Err(ReconcileError::Delete {
                    resource: resource.to_string(),
                    cause,
                });
            }
        };

        tracing::info!("Parameter set '{resource}' {outcome}");
        Ok(outcome)
    }
}
