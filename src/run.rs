//! Command execution.
//!
//! Loads the desired state, builds the control plane and reconciler from
//! validated configuration, runs one command, and prints its outcome.

use thiserror::Error;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use paramsync::apply::Coordinator;
use paramsync::config::{Command, ConfigError, Desired, ValidatedConfig};
use paramsync::plan::Chunk;
use paramsync::reconcile::{Preview, ReconcileError, Reconciler, Report};
use paramsync::remote::{ControlPlane, HttpControlPlane, InMemoryControlPlane, ReqwestClient};
use paramsync::setting::ParameterSet;

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for command execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The desired-state file or a required option is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reconciliation failed.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl RunError {
    /// Returns true if the failure is an input problem rather than a
    /// remote or runtime one.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Reconcile(e) => e.is_invalid_configuration(),
        }
    }
}

/// Executes one command.
///
/// Ctrl+C cancels the running pass: no further call is started and any
/// backoff wait ends early.
///
/// # Errors
///
/// Returns an error if the desired-state file cannot be loaded, the
/// endpoint is missing, or reconciliation fails.
pub async fn execute(command: Command, config: ValidatedConfig) -> Result<(), RunError> {
    let Some(path) = command.desired_path() else {
        return Ok(());
    };
    let desired = Desired::load(path)?;

    let endpoint = if command.needs_remote() {
        Some(config.require_endpoint()?.clone())
    } else {
        None
    };

    let cancel = CancellationToken::new();
    let listener = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let result = if let Some(endpoint) = endpoint {
        tracing::debug!("Using control plane at {endpoint}");
        let plane = HttpControlPlane::new(ReqwestClient::new(), endpoint)
            .with_headers(config.headers.clone());
        run_command(&command, &config, plane, &desired, &cancel).await
    } else {
        tracing::info!(
            "Offline plan: treating '{}' as not yet created",
            desired.parameter_set.name
        );
        run_command(
            &command,
            &config,
            InMemoryControlPlane::new(),
            &desired,
            &cancel,
        )
        .await
    };

    listener.abort();
    result
}

/// Runs `command` against `plane` and prints the outcome to stdout.
async fn run_command<C: ControlPlane>(
    command: &Command,
    config: &ValidatedConfig,
    plane: C,
    desired: &Desired,
    cancel: &CancellationToken,
) -> Result<(), RunError> {
    let reconciler = build_reconciler(plane, config);
    let set = &desired.parameter_set;

    match command {
        Command::Init { .. } => {}
        Command::Plan { .. } => {
            let preview = reconciler.preview(set, cancel).await?;
            print!("{}", render_preview(set, &preview));
        }
        Command::Apply { .. } => {
            let report = reconciler.reconcile(set, cancel).await?;
            print!("{}", render_report(&set.name, &report));
        }
        Command::Destroy { retain, .. } => {
            let retain = *retain || desired.retain_on_destroy;
            let outcome = reconciler.destroy(&set.name, retain, cancel).await?;
            println!("Parameter set '{}' {outcome}", set.name);
        }
    }

    Ok(())
}

fn build_reconciler<C>(plane: C, config: &ValidatedConfig) -> Reconciler<C> {
    let coordinator = Coordinator::new(plane)
        .with_retry_policy(config.retry_policy.clone())
        .with_submit_timeout(Some(config.timeout));

    Reconciler::new(coordinator, config.planner, config.coupling.clone())
}

/// Formats a plan for display.
fn render_preview(set: &ParameterSet, preview: &Preview) -> String {
    if preview.is_empty() {
        return format!("No changes for '{}'\n", set.name);
    }

    let mut lines = vec![format!("Plan for '{}' ({}):", set.name, set.family)];
    if !preview.exists {
        lines.push("  create parameter set".to_string());
    }

    let total = preview.set_chunks.len();
    for (i, chunk) in preview.set_chunks.iter().enumerate() {
        lines.push(format!("  set chunk {}/{total}{}", i + 1, describe_chunk(chunk)));
    }

    let total = preview.reset_chunks.len();
    for (i, chunk) in preview.reset_chunks.iter().enumerate() {
        lines.push(format!("  reset batch {}/{total}{}", i + 1, describe_chunk(chunk)));
    }

    let restart: Vec<String> = preview
        .set_chunks
        .iter()
        .flat_map(|chunk| chunk.pending_reboot())
        .map(|setting| setting.name.to_string())
        .collect();
    if !restart.is_empty() {
        lines.push(format!("  restart required for: {}", restart.join(", ")));
    }

    lines.join("\n") + "\n"
}

fn describe_chunk(chunk: &Chunk) -> String {
    let names: Vec<&str> = chunk.names().map(|name| name.as_str()).collect();
    let marker = if chunk.is_oversized() {
        " [oversized]"
    } else {
        ""
    };
    format!("{marker}: {}", names.join(", "))
}

/// Formats the outcome of an apply for display.
fn render_report(resource: &str, report: &Report) -> String {
    if report.is_noop() {
        return format!("'{resource}' is up to date\n");
    }

    let mut lines = Vec::new();
    if report.created {
        lines.push(format!("Created parameter set '{resource}'"));
    }
    lines.push(format!(
        "Set {} setting(s) in {} chunk(s), reset {} setting(s) in {} batch(es)",
        report.set.settings, report.set.chunks, report.reset.settings, report.reset.chunks
    ));
    if !report.set.oversized.is_empty() {
        let indices: Vec<String> = report
            .set
            .oversized
            .iter()
            .map(|i| (i + 1).to_string())
            .collect();
        lines.push(format!("Oversized chunk(s): {}", indices.join(", ")));
    }
    if report.requires_restart() {
        let names: Vec<&str> = report.pending_reboot().map(|name| name.as_str()).collect();
        lines.push(format!("Restart required for: {}", names.join(", ")));
    }

    lines.join("\n") + "\n"
}

/// Cancels `cancel` when Ctrl+C is received.
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            tracing::warn!("Interrupt received, stopping after the call in flight");
            cancel.cancel();
        }
        Err(e) => tracing::warn!("Failed to install Ctrl+C handler: {e}"),
    }
}
