//! Tests for `Coordinator`.

use super::{Applied, ApplyState, Coordinator, FailureCause, RetryPolicy};
use crate::plan::Chunk;
use crate::remote::{Call, ControlPlane, InMemoryControlPlane, Operation, RemoteError};
use crate::setting::{ParameterSet, Setting, SettingName};
use crate::time::{InstantSleeper, Sleeper};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const RESOURCE: &str = "app-mysql";

fn seeded() -> InMemoryControlPlane {
    InMemoryControlPlane::new().with_parameter_set(ParameterSet::new(RESOURCE, "mysql8.0"))
}

fn policy() -> RetryPolicy {
    RetryPolicy::new()
        .with_max_attempts(3)
        .with_initial_delay(Duration::from_millis(100))
        .with_jitter(0.0)
}

fn coordinator(plane: InMemoryControlPlane) -> Coordinator<InMemoryControlPlane, InstantSleeper> {
    Coordinator::new(plane)
        .with_retry_policy(policy())
        .with_sleeper(InstantSleeper)
}

fn chunks() -> Vec<Chunk> {
    vec![
        Chunk::new(vec![
            Setting::new("character_set_server", "utf8"),
            Setting::new("collation_server", "utf8_unicode_ci"),
        ]),
        Chunk::new(vec![
            Setting::new("tx_isolation", "repeatable-read"),
            Setting::pending_reboot("innodb_read_io_threads", "64"),
        ]),
        Chunk::new(vec![Setting::new("binlog_cache_size", "131072")]),
    ]
}

fn applied_names(plane: &InMemoryControlPlane) -> Vec<Vec<SettingName>> {
    plane
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Apply { names, .. } => Some(names),
            _ => None,
        })
        .collect()
}

/// Records requested backoff delays without waiting.
#[derive(Debug, Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Control plane whose calls take a long time.
#[derive(Debug, Default)]
struct SlowPlane {
    inner: InMemoryControlPlane,
    delay: Duration,
}

impl ControlPlane for SlowPlane {
    async fn describe_settings(&self, resource: &str) -> Result<ParameterSet, RemoteError> {
        self.inner.describe_settings(resource).await
    }

    async fn create_parameter_set(
        &self,
        resource: &str,
        family: &str,
        description: &str,
    ) -> Result<(), RemoteError> {
        self.inner
            .create_parameter_set(resource, family, description)
            .await
    }

    async fn apply_settings(&self, resource: &str, chunk: &Chunk) -> Result<(), RemoteError> {
        tokio::time::sleep(self.delay).await;
        self.inner.apply_settings(resource, chunk).await
    }

    async fn reset_settings(&self, resource: &str, chunk: &Chunk) -> Result<(), RemoteError> {
        self.inner.reset_settings(resource, chunk).await
    }

    async fn delete_parameter_set(&self, resource: &str) -> Result<(), RemoteError> {
        self.inner.delete_parameter_set(resource).await
    }
}

/// Control plane that rejects any chunk containing one setting.
#[derive(Debug)]
struct RejectingPlane {
    inner: InMemoryControlPlane,
    reject: &'static str,
}

impl ControlPlane for RejectingPlane {
    async fn describe_settings(&self, resource: &str) -> Result<ParameterSet, RemoteError> {
        self.inner.describe_settings(resource).await
    }

    async fn create_parameter_set(
        &self,
        resource: &str,
        family: &str,
        description: &str,
    ) -> Result<(), RemoteError> {
        self.inner
            .create_parameter_set(resource, family, description)
            .await
    }

    async fn apply_settings(&self, resource: &str, chunk: &Chunk) -> Result<(), RemoteError> {
        if chunk.names().any(|n| n.matches(self.reject)) {
            return Err(RemoteError::validation(format!(
                "Unknown parameter '{}'",
                self.reject
            )));
        }
        self.inner.apply_settings(resource, chunk).await
    }

    async fn reset_settings(&self, resource: &str, chunk: &Chunk) -> Result<(), RemoteError> {
        self.inner.reset_settings(resource, chunk).await
    }

    async fn delete_parameter_set(&self, resource: &str) -> Result<(), RemoteError> {
        self.inner.delete_parameter_set(resource).await
    }
}

/// Control plane that fires a cancellation token once an apply completes.
#[derive(Debug)]
struct CancellingPlane {
    inner: InMemoryControlPlane,
    token: CancellationToken,
}

impl ControlPlane for CancellingPlane {
    async fn describe_settings(&self, resource: &str) -> Result<ParameterSet, RemoteError> {
        self.inner.describe_settings(resource).await
    }

    async fn create_parameter_set(
        &self,
        resource: &str,
        family: &str,
        description: &str,
    ) -> Result<(), RemoteError> {
        self.inner
            .create_parameter_set(resource, family, description)
            .await
    }

    async fn apply_settings(&self, resource: &str, chunk: &Chunk) -> Result<(), RemoteError> {
        let result = self.inner.apply_settings(resource, chunk).await;
        self.token.cancel();
        result
    }

    async fn reset_settings(&self, resource: &str, chunk: &Chunk) -> Result<(), RemoteError> {
        self.inner.reset_settings(resource, chunk).await
    }

    async fn delete_parameter_set(&self, resource: &str) -> Result<(), RemoteError> {
        self.inner.delete_parameter_set(resource).await
    }
}

mod success {
    use super::*;

    #[tokio::test]
    async fn submits_chunks_in_order() {
        let plane = seeded();
        let coordinator = coordinator(plane.clone());

        coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap();

        let expected: Vec<Vec<SettingName>> = chunks()
            .iter()
            .map(|c| c.names().cloned().collect())
            .collect();
        assert_eq!(applied_names(&plane), expected);
    }

    #[tokio::test]
    async fn reports_counts_and_pending_reboot_names() {
        let coordinator = coordinator(seeded());

        let applied = coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(applied.chunks, 3);
        assert_eq!(applied.settings, 5);
        assert_eq!(
            applied.pending_reboot,
            vec![SettingName::new("innodb_read_io_threads")]
        );
        assert!(applied.requires_restart());
        assert!(applied.oversized.is_empty());
    }

    #[tokio::test]
    async fn oversized_chunk_is_submitted_and_reported() {
        let plane = seeded();
        let coordinator = coordinator(plane.clone());
        let oversized = Chunk::oversized(vec![Setting::new("a", "1"), Setting::new("b", "2")]);

        let applied = coordinator
            .apply(
                RESOURCE,
                vec![Chunk::new(vec![Setting::new("c", "3")]), oversized],
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(applied.oversized, vec![1]);
        assert_eq!(plane.count(Operation::Apply), 2);
    }

    #[tokio::test]
    async fn empty_sequence_is_applied() {
        let plane = seeded();
        let coordinator = coordinator(plane.clone());

        let applied = coordinator
            .apply(RESOURCE, Vec::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(applied, Applied::default());
        assert!(plane.calls().is_empty());
        assert_eq!(coordinator.state(), ApplyState::Applied);
    }

    #[tokio::test]
    async fn reset_uses_reset_call() {
        let plane = seeded();
        let coordinator = coordinator(plane.clone());

        coordinator
            .reset(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(plane.count(Operation::Reset), 3);
        assert_eq!(plane.count(Operation::Apply), 0);
    }
}

mod retries {
    use super::*;

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let plane = seeded();
        plane.fail_next(Operation::Apply, RemoteError::transient("throttled"));
        plane.fail_next(Operation::Apply, RemoteError::transient("busy"));
        let coordinator = coordinator(plane.clone());

        let applied = coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(applied.chunks, 3);
        assert_eq!(plane.count(Operation::Apply), 5);
    }

    #[tokio::test]
    async fn exhausted_retries_fail_with_attempt_count() {
        let plane = seeded();
        for _ in 0..3 {
            plane.fail_next(Operation::Apply, RemoteError::transient("throttled"));
        }
        let coordinator = coordinator(plane.clone());

        let error = coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(error.chunk_index, 0);
        assert_eq!(
            error.cause,
            FailureCause::Transient {
                attempts: 3,
                last: "throttled".to_string(),
            }
        );
        assert_eq!(plane.count(Operation::Apply), 3);
    }

    #[tokio::test]
    async fn backoff_follows_policy() {
        let plane = seeded();
        plane.fail_next(Operation::Apply, RemoteError::transient("a"));
        plane.fail_next(Operation::Apply, RemoteError::transient("b"));
        let coordinator = Coordinator::new(plane)
            .with_retry_policy(policy())
            .with_sleeper(RecordingSleeper::default());

        coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            *coordinator.sleeper().delays.lock().unwrap(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn validation_failure_aborts_without_retry() {
        let plane = seeded();
        plane.fail_next(Operation::Apply, RemoteError::transient("throttled"));
        plane.fail_next(Operation::Apply, RemoteError::validation("Unknown parameter"));
        let coordinator = coordinator(plane.clone());

        let error = coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(error.chunk_index, 0);
        assert_eq!(
            error.cause,
            FailureCause::Validation("Unknown parameter".to_string())
        );
        assert_eq!(plane.count(Operation::Apply), 2);
    }

    #[tokio::test]
    async fn later_chunks_are_not_attempted_after_failure() {
        let inner = seeded();
        let coordinator = Coordinator::new(RejectingPlane {
            inner: inner.clone(),
            reject: "tx_isolation",
        })
        .with_sleeper(InstantSleeper);

        let error = coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(error.chunk_index, 1);
        assert_eq!(
            error.names,
            vec![
                SettingName::new("tx_isolation"),
                SettingName::new("innodb_read_io_threads"),
            ]
        );
        assert_eq!(inner.count(Operation::Apply), 1);
    }

    #[tokio::test]
    async fn not_found_is_distinct_cause() {
        let coordinator = coordinator(InMemoryControlPlane::new());

        let error = coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(error.cause.is_not_found());
        assert_eq!(coordinator.plane().count(Operation::Apply), 1);
    }

    #[tokio::test]
    async fn failure_names_chunk_members() {
        let plane = seeded();
        let coordinator = coordinator(plane.clone());
        let sequence = chunks();
        plane.fail_next(Operation::Apply, RemoteError::validation("Invalid value for collation_server"));

        let error = coordinator
            .apply(RESOURCE, sequence, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            error.names,
            vec![
                SettingName::new("character_set_server"),
                SettingName::new("collation_server"),
            ]
        );
        let message = error.to_string();
        assert!(message.contains("character_set_server, collation_server"));
        assert!(message.contains("Invalid value for collation_server"));
    }

    #[tokio::test]
    async fn with_retry_serves_other_operations() {
        let plane = InMemoryControlPlane::new();
        plane.fail_next(Operation::Delete, RemoteError::transient("busy"));
        plane.insert(ParameterSet::new(RESOURCE, "mysql8.0"));
        let coordinator = coordinator(plane.clone());

        let cancel = CancellationToken::new();
        let result = coordinator
            .with_retry(&cancel, || plane.delete_parameter_set(RESOURCE))
            .await;

        assert_eq!(result, Ok(()));
        assert_eq!(plane.count(Operation::Delete), 2);
    }
}

mod timeouts {
    use super::*;

    fn slow(delay: Duration) -> SlowPlane {
        SlowPlane {
            inner: seeded(),
            delay,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_call_is_transient_and_retried() {
        let coordinator = Coordinator::new(slow(Duration::from_secs(60)))
            .with_retry_policy(policy().with_max_attempts(2))
            .with_sleeper(InstantSleeper)
            .with_submit_timeout(Some(Duration::from_secs(1)));

        let error = coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap_err();

        let FailureCause::Transient { attempts, last } = error.cause else {
            panic!("expected transient failure, got {:?}", error.cause);
        };
        assert_eq!(attempts, 2);
        assert!(last.contains("timed out"));
        assert!(coordinator.plane().inner.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn call_within_timeout_succeeds() {
        let coordinator = Coordinator::new(slow(Duration::from_millis(500)))
            .with_retry_policy(policy())
            .with_sleeper(InstantSleeper)
            .with_submit_timeout(Some(Duration::from_secs(1)));

        let applied = coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(applied.chunks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_timeout_waits_for_slow_call() {
        let coordinator = Coordinator::new(slow(Duration::from_secs(3600)))
            .with_sleeper(InstantSleeper)
            .with_submit_timeout(None);

        assert!(coordinator.submit_timeout().is_none());
        let applied = coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(applied.chunks, 3);
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn cancelled_before_start_submits_nothing() {
        let plane = seeded();
        let coordinator = coordinator(plane.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = coordinator.apply(RESOURCE, chunks(), &cancel).await.unwrap_err();

        assert_eq!(error.chunk_index, 0);
        assert_eq!(error.cause, FailureCause::Cancelled);
        assert!(plane.calls().is_empty());
    }

    #[tokio::test]
    async fn in_flight_call_completes_and_rest_is_abandoned() {
        let token = CancellationToken::new();
        let inner = seeded();
        let coordinator = Coordinator::new(CancellingPlane {
            inner: inner.clone(),
            token: token.clone(),
        })
        .with_sleeper(InstantSleeper);

        let error = coordinator.apply(RESOURCE, chunks(), &token).await.unwrap_err();

        assert_eq!(error.chunk_index, 1);
        assert_eq!(error.cause, FailureCause::Cancelled);
        assert_eq!(inner.count(Operation::Apply), 1);
        let stored = inner.parameter_set(RESOURCE).unwrap();
        assert!(stored.get("character_set_server").is_some());
        assert_eq!(coordinator.state(), ApplyState::Failed { index: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let plane = seeded();
        plane.fail_next(Operation::Apply, RemoteError::transient("throttled"));
        let coordinator = Coordinator::new(plane.clone()).with_retry_policy(
            policy()
                .with_initial_delay(Duration::from_secs(3600))
                .with_max_delay(Duration::from_secs(3600)),
        );

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let error = coordinator.apply(RESOURCE, chunks(), &cancel).await.unwrap_err();

        assert_eq!(error.cause, FailureCause::Cancelled);
        assert_eq!(plane.count(Operation::Apply), 1);
    }
}

mod state {
    use super::*;

    #[tokio::test]
    async fn starts_planned() {
        let coordinator = coordinator(seeded());
        assert_eq!(coordinator.state(), ApplyState::Planned);
        assert_eq!(*coordinator.subscribe().borrow(), ApplyState::Planned);
    }

    #[tokio::test]
    async fn subscriber_sees_applied() {
        let coordinator = coordinator(seeded());
        let receiver = coordinator.subscribe();

        coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*receiver.borrow(), ApplyState::Applied);
        assert!(receiver.borrow().is_terminal());
    }

    #[tokio::test]
    async fn subscriber_sees_failed_index() {
        let plane = seeded();
        plane.fail_next(Operation::Apply, RemoteError::validation("bad"));
        let coordinator = coordinator(plane);
        let receiver = coordinator.subscribe();

        let _ = coordinator
            .apply(RESOURCE, chunks(), &CancellationToken::new())
            .await;

        assert_eq!(*receiver.borrow(), ApplyState::Failed { index: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn applying_is_published_with_total() {
        let coordinator = Coordinator::new(SlowPlane {
            inner: seeded(),
            delay: Duration::from_secs(1),
        })
        .with_sleeper(InstantSleeper);
        let mut receiver = coordinator.subscribe();

        let observer = async {
            let mut seen = Vec::new();
            while receiver.changed().await.is_ok() {
                let state = *receiver.borrow_and_update();
                seen.push(state);
                if state.is_terminal() {
                    break;
                }
            }
            seen
        };
        let cancel = CancellationToken::new();
        let (result, seen) = tokio::join!(coordinator.apply(RESOURCE, chunks(), &cancel), observer);

        assert!(result.is_ok());
        assert!(seen.contains(&ApplyState::Applying { index: 0, total: 3 }));
        assert!(seen.contains(&ApplyState::Applying { index: 2, total: 3 }));
        assert_eq!(seen.last(), Some(&ApplyState::Applied));
    }

    #[test]
    fn display_is_one_based() {
        assert_eq!(
            ApplyState::Applying { index: 0, total: 4 }.to_string(),
            "applying chunk 1 of 4"
        );
        assert_eq!(
            ApplyState::Failed { index: 2 }.to_string(),
            "failed at chunk 3"
        );
    }
}

mod applied {
    use super::*;

    #[test]
    fn merge_offsets_oversized_positions() {
        let mut first = Applied {
            chunks: 2,
            settings: 4,
            pending_reboot: vec![SettingName::new("a")],
            oversized: vec![1],
        };
        let second = Applied {
            chunks: 1,
            settings: 5,
            pending_reboot: vec![SettingName::new("b")],
            oversized: vec![0],
        };

        first.merge(second);

        assert_eq!(first.chunks, 3);
        assert_eq!(first.settings, 9);
        assert_eq!(first.oversized, vec![1, 2]);
        assert_eq!(first.pending_reboot.len(), 2);
    }
}
