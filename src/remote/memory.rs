//! In-process control plane for tests and offline runs.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::plan::Chunk;
use crate::setting::{ParameterSet, SettingName, SettingSource};

use super::{ControlPlane, RemoteError};

/// Control plane operation kinds, used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`ControlPlane::describe_settings`]
    Describe,
    /// [`ControlPlane::create_parameter_set`]
    Create,
    /// [`ControlPlane::apply_settings`]
    Apply,
    /// [`ControlPlane::reset_settings`]
    Reset,
    /// [`ControlPlane::delete_parameter_set`]
    Delete,
}

/// A recorded call, in the order received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Describe of a resource.
    Describe(String),
    /// Creation with the given family.
    Create {
        /// Resource identifier.
        resource: String,
        /// Engine family.
        family: String,
    },
    /// Apply of the named settings, in chunk order.
    Apply {
        /// Resource identifier.
        resource: String,
        /// Setting names in the submitted chunk.
        names: Vec<SettingName>,
    },
    /// Reset of the named settings, in chunk order.
    Reset {
        /// Resource identifier.
        resource: String,
        /// Setting names in the submitted chunk.
        names: Vec<SettingName>,
    },
    /// Delete of a resource.
    Delete(String),
}

impl Call {
    /// Returns the operation kind of this call.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Describe(_) => Operation::Describe,
            Self::Create { .. } => Operation::Create,
            Self::Apply { .. } => Operation::Apply,
            Self::Reset { .. } => Operation::Reset,
            Self::Delete(_) => Operation::Delete,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    sets: HashMap<String, ParameterSet>,
    calls: Vec<Call>,
    failures: HashMap<Operation, VecDeque<RemoteError>>,
}

impl Inner {
    /// Records `call` and pops the next scripted failure for its kind.
    fn enter(&mut self, call: Call) -> Result<(), RemoteError> {
        let operation = call.operation();
        self.calls.push(call);
        match self.failures.get_mut(&operation).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn set_mut(&mut self, resource: &str) -> Result<&mut ParameterSet, RemoteError> {
        self.sets
            .get_mut(resource)
            .ok_or_else(|| RemoteError::not_found(resource))
    }
}

/// Thread-safe in-memory [`ControlPlane`].
///
/// Clones share state, so a test can hand one clone to a reconciler and
/// inspect another. Every call is recorded (see [`calls`](Self::calls)),
/// and failures can be queued per operation with
/// [`fail_next`](Self::fail_next); a failed call leaves state untouched.
///
/// Applied settings are stored as user-sourced; reset settings are removed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryControlPlane {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryControlPlane {
    /// Creates an empty control plane.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `set` under its name, replacing any existing set.
    #[must_use]
    pub fn with_parameter_set(self, set: ParameterSet) -> Self {
        self.insert(set);
        self
    }

    /// Stores `set` under its name, replacing any existing set.
    pub fn insert(&self, set: ParameterSet) {
        self.lock().sets.insert(set.name.clone(), set);
    }

    /// Queues `error` to be returned by the next `operation` call.
    ///
    /// Multiple queued failures are returned in order.
    pub fn fail_next(&self, operation: Operation, error: RemoteError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Returns the stored parameter set, if any.
    #[must_use]
    pub fn parameter_set(&self, resource: &str) -> Option<ParameterSet> {
        self.lock().sets.get(resource).cloned()
    }

    /// Returns every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Returns the number of calls of the given kind.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }
}

fn names(chunk: &Chunk) -> Vec<SettingName> {
    chunk.names().cloned().collect()
}

impl ControlPlane for InMemoryControlPlane {
    async fn describe_settings(&self, resource: &str) -> Result<ParameterSet, RemoteError> {
        let mut inner = self.lock();
        inner.enter(Call::Describe(resource.to_string()))?;
        inner
            .sets
            .get(resource)
            .cloned()
            .ok_or_else(|| RemoteError::not_found(resource))
    }

    async fn create_parameter_set(
        &self,
        resource: &str,
        family: &str,
        description: &str,
    ) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        inner.enter(Call::Create {
            resource: resource.to_string(),
            family: family.to_string(),
        })?;
        if inner.sets.contains_key(resource) {
            return Err(RemoteError::validation(format!(
                "Parameter set '{resource}' already exists"
            )));
        }
        let set = ParameterSet::new(resource, family).with_description(description);
        inner.sets.insert(resource.to_string(), set);
        Ok(())
    }

    async fn apply_settings(&self, resource: &str, chunk: &Chunk) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        inner.enter(Call::Apply {
            resource: resource.to_string(),
            names: names(chunk),
        })?;
        let set = inner.set_mut(resource)?;
        for setting in chunk {
            let stored = setting.clone().with_source(SettingSource::User);
            match set.settings.iter_mut().find(|s| s.name == setting.name) {
                Some(existing) => *existing = stored,
                None => set.settings.push(stored),
            }
        }
        Ok(())
    }

    async fn reset_settings(&self, resource: &str, chunk: &Chunk) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        inner.enter(Call::Reset {
            resource: resource.to_string(),
            names: names(chunk),
        })?;
        let set = inner.set_mut(resource)?;
        set.settings.retain(|s| !chunk.names().any(|n| *n == s.name));
        Ok(())
    }

    async fn delete_parameter_set(&self, resource: &str) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        inner.enter(Call::Delete(resource.to_string()))?;
        inner
            .sets
            .remove(resource)
            .map(|_| ())
            .ok_or_else(|| RemoteError::not_found(resource))
    }
}
