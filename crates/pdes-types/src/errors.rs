//! # pdes-types::errors
//!
//! Defines the common error types used throughout the pdes workspace.
//! Using `thiserror` provides clean, descriptive error handling. All error
//! variants must have a deterministic `Debug` implementation for
//! reproducibility.

use crate::{
    ids::{ComponentId, LinkId},
    time::SimTime,
};
use thiserror::Error;

/// A general-purpose error for the simulation kernel.
#[derive(Error, Debug, Clone)]
pub enum SimError {
    #[error("invalid time base '{spec}': {reason}")]
    InvalidTimeBase { spec: String, reason: String },
    #[error("simulation time overflow: {base} + {offset}")]
    TimeOverflow { base: SimTime, offset: SimTime },
    #[error("component {0} not found")]
    ComponentNotFound(ComponentId),
    #[error("link {0} not found")]
    LinkNotFound(LinkId),
    #[error("link '{0}' already exists on this component")]
    DuplicateSelfLink(String),
    #[error("no link bound to port '{0}'")]
    PortUnbound(String),
    #[error("link {0} has no default time base; register one before sending")]
    NoTimeBase(LinkId),
    #[error("recv on a non-polling link {0}")]
    NotPolling(LinkId),
    #[error("unknown name '{kind}.{name}' in the factory registry")]
    Factory { kind: &'static str, name: String },
}

impl SimError {
    /// Shorthand for the time-string parser's failure paths.
    pub fn bad_time(spec: &str, reason: impl Into<String>) -> Self {
        SimError::InvalidTimeBase {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }
}

/// An error related to building or validating the configuration graph and
/// the files it is read from or dumped to.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("component {0} referenced before it was added")]
    UnknownComponent(ComponentId),
    #[error("link '{0}' already has two endpoints")]
    TooManyEndpoints(String),
    #[error("port '{port}' on component {comp} is already bound")]
    DuplicatePortBinding { comp: ComponentId, port: String },
    #[error("graph failed the structural check")]
    StructuralErrors,
    #[error("ranks outside [0, {num_ranks}) after partitioning")]
    BadRanks { num_ranks: i32 },
    #[error(transparent)]
    Time(#[from] SimError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
