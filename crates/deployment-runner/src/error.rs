/// Errors for each stage of a deployment. The stages are terminal, so every
/// error carries enough detail for the operator to decide what to do next.
use std::time::Duration;

use ethers::types::H256;
use thiserror::Error;

/// The stage a deployment failed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Resolution,
    Submission,
    Confirmation,
}

/// The contract identifier couldn't be turned into a deployable factory.
/// Nothing was broadcast.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("contract name must not be empty")]
    EmptyName,
    #[error("no artifact found for contract `{name}`")]
    NotFound { name: String },
    #[error("contract name `{name}` is ambiguous, candidates: {}", .candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },
    #[error("artifact for contract `{name}` is invalid: {reason}")]
    InvalidArtifact { name: String, reason: String },
    #[error("couldn't read artifacts: {0}")]
    Io(#[from] std::io::Error),
}

/// The deployment transaction was rejected before it reached the mempool.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("invalid constructor arguments: {0}")]
    InvalidArguments(String),
    #[error("deployment transaction rejected: {0}")]
    Rejected(String),
    /// The node simulated the creation and it reverted, usually while
    /// estimating gas. Sending it again won't change the outcome.
    #[error("deployment would revert: {0}")]
    WouldRevert(String),
}

/// The deployment transaction was broadcast, but it's unknown or known not to
/// have produced a contract.
#[derive(Debug, Error)]
pub enum ConfirmationError {
    #[error("timed out after {timeout:?} waiting for transaction {tx_hash:?}")]
    Timeout { tx_hash: H256, timeout: Duration },
    #[error("transaction {0:?} was dropped from the mempool")]
    Dropped(H256),
    #[error("transaction {0:?} reverted")]
    Reverted(H256),
    #[error("receipt for transaction {0:?} has no contract address")]
    MissingAddress(H256),
    #[error("provider error while waiting for confirmation: {0}")]
    Provider(String),
}

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Confirmation(#[from] ConfirmationError),
}

impl DeploymentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Resolution(_) => ErrorKind::Resolution,
            Self::Submission(_) => ErrorKind::Submission,
            Self::Confirmation(_) => ErrorKind::Confirmation,
        }
    }

    /// Whether re-running the same deployment might succeed without changing
    /// the input. Confirmation errors are never retryable here since the
    /// transaction may still land; the ledger has to be checked first. A
    /// creation the node already simulated as reverting fails the same way
    /// every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Submission(SubmissionError::Rejected(_)))
    }
}
