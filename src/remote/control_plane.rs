//! The remote control plane contract.

use std::future::Future;

use crate::plan::Chunk;
use crate::setting::ParameterSet;

use super::RemoteError;

/// Operations the reconciler and apply coordinator need from the service
/// that stores parameter sets.
///
/// `resource` is the parameter set's identifier on the remote side. Every
/// failure is reported as a normalized [`RemoteError`].
pub trait ControlPlane: Send + Sync {
    /// Reads the observed settings of a parameter set.
    ///
    /// # Errors
    ///
    /// [`RemoteError::NotFound`] if the set does not exist.
    fn describe_settings(
        &self,
        resource: &str,
    ) -> impl Future<Output = Result<ParameterSet, RemoteError>> + Send;

    /// Creates an empty parameter set.
    ///
    /// # Errors
    ///
    /// Any [`RemoteError`] reported by the remote.
    fn create_parameter_set(
        &self,
        resource: &str,
        family: &str,
        description: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Sets every setting in `chunk` in one call.
    ///
    /// # Errors
    ///
    /// Any [`RemoteError`] reported by the remote.
    fn apply_settings(
        &self,
        resource: &str,
        chunk: &Chunk,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Resets every setting in `chunk` to its engine default in one call.
    ///
    /// # Errors
    ///
    /// Any [`RemoteError`] reported by the remote.
    fn reset_settings(
        &self,
        resource: &str,
        chunk: &Chunk,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Deletes the parameter set.
    ///
    /// # Errors
    ///
    /// [`RemoteError::NotFound`] if the set is already gone.
    fn delete_parameter_set(
        &self,
        resource: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
