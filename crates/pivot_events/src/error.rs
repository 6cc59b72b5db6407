//! # Event Pipeline Error Types

use thiserror::Error;

use crate::bus::SubscriptionId;

/// Errors returned by registry management calls.
///
/// Dispatch itself never fails: subscriber faults are contained and reported
/// through the [`FaultSink`](crate::FaultSink) instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// No subscription with this id is registered.
    #[error("unknown subscription: {0}")]
    UnknownSubscription(SubscriptionId),

    /// No module with this name has been registered.
    #[error("unknown module: {0}")]
    UnknownModule(String),

    /// A module with this name already exists.
    #[error("duplicate module name: {0}")]
    DuplicateModule(String),
}

/// Result type for event pipeline operations.
pub type EventResult<T> = Result<T, EventError>;
