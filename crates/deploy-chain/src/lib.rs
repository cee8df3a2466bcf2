pub mod artifacts;
pub mod chain;
pub mod config;
pub mod deployer;
pub mod factory;

pub use artifacts::{Artifacts, ContractArtifact};
pub use chain::{Chain, ChainClient};
pub use config::DeployConfig;
pub use deployer::Deployer;
pub use factory::{ArtifactResolver, EthersContractFactory, EthersPendingContract};
