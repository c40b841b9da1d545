//! Sequential chunk submission with retry, timeout and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::plan::Chunk;
use crate::remote::{ControlPlane, IsRetryable, RemoteError};
use crate::setting::SettingName;
use crate::time::{Sleeper, TokioSleeper};

use super::{ApplyError, ApplyState, FailureCause, RetryPolicy};

/// Default bound for a single control plane call.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a successful pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    /// Chunks accepted by the remote.
    pub chunks: usize,
    /// Settings submitted across all chunks.
    pub settings: usize,
    /// Submitted settings that take effect only after a restart.
    pub pending_reboot: Vec<SettingName>,
    /// Positions of chunks that exceeded the size bound.
    pub oversized: Vec<usize>,
}

impl Applied {
    fn record(&mut self, chunk: &Chunk) {
        self.chunks += 1;
        self.settings += chunk.len();
        self.pending_reboot
            .extend(chunk.pending_reboot().map(|s| s.name.clone()));
    }

    /// Returns true if any submitted setting needs a restart.
    #[must_use]
    pub fn requires_restart(&self) -> bool {
        !self.pending_reboot.is_empty()
    }

    /// Folds another pass's outcome into this one.
    pub fn merge(&mut self, other: Self) {
        let offset = self.chunks;
        self.chunks += other.chunks;
        self.settings += other.settings;
        self.pending_reboot.extend(other.pending_reboot);
        self.oversized
            .extend(other.oversized.into_iter().map(|i| i + offset));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Submission {
    Apply,
    Reset,
}

impl Submission {
    const fn verb(self) -> &'static str {
        match self {
            Self::Apply => "Applying",
            Self::Reset => "Resetting",
        }
    }
}

/// Submits chunks to a [`ControlPlane`] one at a time, in order.
///
/// Transient failures are retried according to the [`RetryPolicy`];
/// any other failure stops the pass and later chunks are not attempted.
/// Each call is bounded by the submission timeout, and a timed-out call
/// counts as transient. The cancellation token is honoured between chunks
/// and during backoff, never in the middle of a call.
///
/// # Type Parameters
///
/// - `C`: the control plane
/// - `S`: the sleeper used for backoff (defaults to [`TokioSleeper`])
#[derive(Debug)]
pub struct Coordinator<C, S = TokioSleeper> {
    plane: C,
    sleeper: S,
    retry_policy: RetryPolicy,
    submit_timeout: Option<Duration>,
    state: watch::Sender<ApplyState>,
}

impl<C> Coordinator<C, TokioSleeper> {
    /// Creates a coordinator with the default retry policy and timeout.
    #[must_use]
    pub fn new(plane: C) -> Self {
        let (state, _) = watch::channel(ApplyState::Planned);
        Self {
            plane,
            sleeper: TokioSleeper,
            retry_policy: RetryPolicy::default(),
            submit_timeout: Some(DEFAULT_SUBMIT_TIMEOUT),
            state,
        }
    }
}

impl<C, S> Coordinator<C, S> {
    /// Replaces the backoff sleeper.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> Coordinator<C, S2> {
        Coordinator {
            plane: self.plane,
            sleeper,
            retry_policy: self.retry_policy,
            submit_timeout: self.submit_timeout,
            state: self.state,
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets the per-call timeout; `None` waits indefinitely.
    #[must_use]
    pub const fn with_submit_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.submit_timeout = timeout;
        self
    }

    /// Returns the control plane.
    #[must_use]
    pub const fn plane(&self) -> &C {
        &self.plane
    }

    /// Returns the sleeper.
    #[must_use]
    pub const fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub const fn submit_timeout(&self) -> Option<Duration> {
        self.submit_timeout
    }

    /// Subscribes to state changes of the current and future passes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ApplyState> {
        self.state.subscribe()
    }

    /// Returns the latest published state.
    #[must_use]
    pub fn state(&self) -> ApplyState {
        *self.state.borrow()
    }
}

impl<C: ControlPlane, S: Sleeper> Coordinator<C, S> {
    /// Sets every chunk's settings, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError`] naming the first chunk that could not be
    /// submitted and why.
    pub async fn apply<I>(
        &self,
        resource: &str,
        chunks: I,
        cancel: &CancellationToken,
    ) -> Result<Applied, ApplyError>
    where
        I: IntoIterator<Item = Chunk>,
    {
        self.submit_all(Submission::Apply, resource, chunks, cancel)
            .await
    }

    /// Resets every chunk's settings to engine defaults, in order.
    ///
    /// # Errors
    ///
    /// See [`apply`](Self::apply).
    pub async fn reset<I>(
        &self,
        resource: &str,
        chunks: I,
        cancel: &CancellationToken,
    ) -> Result<Applied, ApplyError>
    where
        I: IntoIterator<Item = Chunk>,
    {
        self.submit_all(Submission::Reset, resource, chunks, cancel)
            .await
    }

    /// Runs `operation` under the coordinator's timeout, retry and
    /// cancellation rules.
    ///
    /// # Errors
    ///
    /// Returns the [`FailureCause`] once retries are exhausted, a
    /// non-transient error occurs, or `cancel` fires.
    pub async fn with_retry<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, FailureCause>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let max_attempts = self.retry_policy.max_attempts;
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(FailureCause::Cancelled);
            }
            attempt += 1;

            let error = match self.bounded(operation()).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.is_retryable() || !self.retry_policy.should_retry(attempt) {
                return Err(FailureCause::from_remote(error, attempt));
            }

            let delay = self.retry_policy.jittered_delay(attempt - 1);
            tracing::warn!(
                "Attempt {attempt}/{max_attempts} failed: {error}; retrying in {:.1}s",
                delay.as_secs_f64()
            );

            tokio::select! {
                () = self.sleeper.sleep(delay) => {}
                () = cancel.cancelled() => return Err(FailureCause::Cancelled),
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, RemoteError> {
        let Some(limit) = self.submit_timeout else {
            return call.await;
        };
        tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
            Err(RemoteError::transient(format!(
                "Call timed out after {:.1}s",
                limit.as_secs_f64()
            )))
        })
    }

    async fn submit(
        &self,
        kind: Submission,
        resource: &str,
        chunk: &Chunk,
    ) -> Result<(), RemoteError> {
        match kind {
            Submission::Apply => self.plane.apply_settings(resource, chunk).await,
            Submission::Reset => self.plane.reset_settings(resource, chunk).await,
        }
    }

    async fn submit_all<I>(
        &self,
        kind: Submission,
        resource: &str,
        chunks: I,
        cancel: &CancellationToken,
    ) -> Result<Applied, ApplyError>
    where
        I: IntoIterator<Item = Chunk>,
    {
        let chunks = chunks.into_iter();
        let total = chunks.size_hint().0;
        self.state.send_replace(ApplyState::Planned);
        tracing::info!("{} {total} chunk(s) on '{resource}'", kind.verb());

        let mut applied = Applied::default();
        for (index, chunk) in chunks.enumerate() {
            self.state.send_replace(ApplyState::Applying {
                index,
                total: total.max(index + 1),
            });

            if chunk.is_oversized() {
                tracing::warn!(
                    "Chunk {index} holds {} coupled settings, above the size bound; submitting whole",
                    chunk.len()
                );
                applied.oversized.push(index);
            }
            tracing::debug!(
                "Chunk {index}: {}",
                chunk
                    .names()
                    .map(SettingName::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            if let Err(cause) = self
                .with_retry(cancel, || self.submit(kind, resource, &chunk))
                .await
            {
                tracing::error!("Chunk {index} on '{resource}' failed: {cause}");
                self.state.send_replace(ApplyState::Failed { index });
                return Err(ApplyError {
                    chunk_index: index,
                    names: chunk.names().cloned().collect(),
                    cause,
                });
            }
            applied.record(&chunk);
        }

        self.state.send_replace(ApplyState::Applied);
        tracing::info!(
            "Submitted {} chunk(s), {} setting(s) on '{resource}'",
            applied.chunks,
            applied.settings
        );
        Ok(applied)
    }
}
