//! Failure policy per operation.
//!
//! Reads favor availability: a failed remote read is served from the
//! mirror. Writes favor correctness: a failed remote write reaches the
//! caller and the mirror is left alone.

use std::fmt;

/// The five repository operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// List all events.
    List,
    /// Fetch one event.
    Get,
    /// Create an event.
    Create,
    /// Partially update an event.
    Update,
    /// Delete an event.
    Delete,
}

/// What happens when the selected remote provider fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log and serve the same operation from the mirror.
    DegradeToMirror,
    /// Log and return the error to the caller.
    Propagate,
}

impl OperationKind {
    /// The failure policy governing this operation.
    #[must_use]
    pub const fn failure_policy(self) -> FailurePolicy {
        match self {
            Self::List | Self::Get => FailurePolicy::DegradeToMirror,
            Self::Create | Self::Update | Self::Delete => FailurePolicy::Propagate,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}
