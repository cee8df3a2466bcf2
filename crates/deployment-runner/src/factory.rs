/// The capabilities the runner needs from a blockchain stack. They're traits so
/// the runner can be driven by an ethers client in production and by test
/// doubles everywhere else.
use async_trait::async_trait;
use ethers::types::H256;

use crate::{
    error::{ConfirmationError, ResolutionError, SubmissionError},
    request::DeployedContract,
};

/// Looks up the factory for a compiled contract by name.
pub trait ContractFactoryResolver: Send + Sync {
    type Factory: ContractFactory;

    fn get_factory(&self, name: &str) -> Result<Self::Factory, ResolutionError>;
}

/// Deploys one compiled contract.
#[async_trait]
pub trait ContractFactory: Send + Sync {
    type Pending: PendingContract;

    /// Broadcasts a creation transaction and returns once the network has
    /// accepted it. Every successful call creates a new contract.
    async fn deploy(&self, args: &[String]) -> Result<Self::Pending, SubmissionError>;
}

/// A creation transaction that has been broadcast but not yet confirmed.
#[async_trait]
pub trait PendingContract: Send {
    fn transaction_hash(&self) -> H256;

    async fn await_deployment(self) -> Result<DeployedContract, ConfirmationError>;
}
