//! Error types for the simulator.
//!
//! Every failure in the library is fatal for the run: either the input
//! could not be read, the parameters are unusable, or the worker gang lost
//! a channel. Bodies leaving the domain are not errors (see
//! `barnes_hut::Insertion`).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unable to open body file {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed body file at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("unable to write body file {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Comm(#[from] CommError),

    #[error("worker {rank} panicked")]
    WorkerPanicked { rank: usize },

    #[error("unable to start worker {rank}: {source}")]
    Spawn {
        rank: usize,
        #[source]
        source: io::Error,
    },
}

/// Rejected run parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("step count must be positive")]
    NoSteps,

    #[error("theta must be finite and >= 0, got {0}")]
    InvalidTheta(f64),

    #[error("dt must be finite and > 0, got {0}")]
    InvalidTimeStep(f64),

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("gravitational constant must be finite and > 0, got {0}")]
    InvalidGravity(f64),

    #[error("softening floor must be finite and > 0, got {0}")]
    InvalidSoftening(f64),

    #[error("invalid domain [{x_min}, {x_max}] x [{y_min}, {y_max}]")]
    InvalidDomain {
        x_min: f64,
        y_min: f64,
        x_max: f64,
        y_max: f64,
    },

    #[error("missing {0}: give it on the command line or in the run file")]
    Missing(&'static str),
}

/// Failures of the in-process message passing between workers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommError {
    #[error("broadcast channel closed")]
    BroadcastClosed,

    #[error("worker {rank} could not send to the coordinator")]
    SendClosed { rank: usize },

    #[error("worker {rank} lost its inbound channel")]
    ReceiveClosed { rank: usize },

    #[error("worker {rank} received an out-of-order message")]
    UnexpectedMessage { rank: usize },

    #[error("worker {rank} left before sending all of its bodies")]
    PeerLeft { rank: usize },
}

pub type Result<T> = std::result::Result<T, SimError>;
