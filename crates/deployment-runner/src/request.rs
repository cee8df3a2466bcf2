use std::fmt;

use ethers::{
    types::{Address, H256},
    utils::to_checksum,
};
use serde::{Deserialize, Serialize};

use crate::error::{DeploymentError, ResolutionError};

/// The outcome of a single deployment attempt.
pub type DeploymentResult = Result<DeployedContract, DeploymentError>;

/// A request to deploy one contract. The constructor arguments are opaque to
/// the runner; the factory interprets them against the contract's ABI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentRequest {
    contract_name: String,
    constructor_args: Vec<String>,
}

impl DeploymentRequest {
    pub fn new<S: Into<String>>(
        contract_name: S,
        constructor_args: Vec<String>,
    ) -> Result<Self, ResolutionError> {
        let contract_name = contract_name.into();
        if contract_name.trim().is_empty() {
            return Err(ResolutionError::EmptyName);
        }
        Ok(Self {
            contract_name,
            constructor_args,
        })
    }

    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    pub fn constructor_args(&self) -> &[String] {
        &self.constructor_args
    }
}

/// A contract whose creation transaction has been mined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeployedContract {
    pub address: Address,
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
}

impl fmt::Display for DeployedContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_checksum(&self.address, None))
    }
}
