//! Error types used by the coordinator and its collaborators.
//!
//! This module defines the error enums surfaced by the crate:
//!
//! - [`CallError`]: the "unavailable" outcomes a public operation answers with.
//! - [`SetupError`]: the opaque failure produced by the subsystem's setup routine.
//! - [`SubsystemError`]: failures of individual [`Radio`](crate::Radio) calls.
//! - [`RuntimeError`]: errors raised while building the coordinator.
//!
//! [`CallError`] and [`SubsystemError`] provide `as_label` / `as_message` helpers
//! for logs and event payloads.

use std::sync::Arc;
use thiserror::Error;

/// # Outcomes of a public operation that carry no result.
///
/// These are reported to the caller as ordinary values. None of them is
/// raised as a fault: a disposed component or a radio that failed to start are
/// expected states for a plugin that outlives its host's interest in it.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The operation was invoked during or after teardown.
    #[error("component disposed")]
    Disposed,

    /// The subsystem's setup routine failed; the failure is stable for the
    /// lifetime of the coordinator and is not retried.
    #[error("subsystem initialization failed: {reason}")]
    InitializationFailed {
        /// Opaque failure code reported by the setup routine.
        reason: Arc<str>,
    },
}

impl CallError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use radiovisor::CallError;
    ///
    /// assert_eq!(CallError::Disposed.as_label(), "call_disposed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CallError::Disposed => "call_disposed",
            CallError::InitializationFailed { .. } => "call_init_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CallError::Disposed => "disposed".to_string(),
            CallError::InitializationFailed { reason } => format!("unavailable: {reason}"),
        }
    }

    /// True if the error reports teardown rather than a subsystem problem.
    pub fn is_disposed(&self) -> bool {
        matches!(self, CallError::Disposed)
    }
}

impl From<SetupError> for CallError {
    fn from(err: SetupError) -> Self {
        CallError::InitializationFailed { reason: err.reason }
    }
}

/// Failure reported by [`Subsystem::start`](crate::Subsystem::start).
///
/// Cheap to clone: the same value is fanned out verbatim to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("setup failed: {reason}")]
pub struct SetupError {
    /// Opaque failure code.
    pub reason: Arc<str>,
}

impl SetupError {
    /// Creates a setup error with the given opaque reason.
    pub fn new(reason: impl Into<Arc<str>>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// # Errors produced by calls on a live [`Radio`](crate::Radio).
///
/// During teardown these are logged and absorbed; they never reach a caller.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubsystemError {
    /// The registration token is unknown to the subsystem.
    #[error("unknown registration token {0}")]
    UnknownToken(u64),

    /// The subsystem rejected the call.
    #[error("subsystem call failed: {0}")]
    Call(String),
}

impl SubsystemError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubsystemError::UnknownToken(_) => "subsystem_unknown_token",
            SubsystemError::Call(_) => "subsystem_call_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SubsystemError::UnknownToken(id) => format!("unknown token: {id}"),
            SubsystemError::Call(error) => format!("error: {error}"),
        }
    }
}

/// # Errors produced while assembling the runtime pieces.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No tokio runtime was supplied and none is running on the calling thread.
    #[error("no tokio runtime available to host the coordinator")]
    NoRuntime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_error_converts_to_init_failed() {
        let err: CallError = SetupError::new("radio_missing").into();
        assert_eq!(
            err,
            CallError::InitializationFailed {
                reason: "radio_missing".into()
            }
        );
        assert_eq!(err.as_label(), "call_init_failed");
        assert_eq!(err.as_message(), "unavailable: radio_missing");
        assert!(!err.is_disposed());
    }

    #[test]
    fn subsystem_error_labels_are_stable() {
        assert_eq!(
            SubsystemError::UnknownToken(7).as_label(),
            "subsystem_unknown_token"
        );
        assert_eq!(
            SubsystemError::Call("busy".into()).as_message(),
            "error: busy"
        );
    }
}
