use std::sync::Arc;

use deployment_runner::{DeploymentRequest, DeploymentResult, DeploymentRunner};
use ethers::signers::LocalWallet;
use eyre::Result;

use crate::{
    artifacts::Artifacts,
    chain::{Chain, ChainClient},
    config::DeployConfig,
    factory::ArtifactResolver,
};

/// A deployment runner wired to a live chain. The chain is kept alongside the
/// runner so that a spawned anvil node outlives every deployment made on it.
pub struct Deployer {
    chain: Chain,
    client: Arc<ChainClient<LocalWallet>>,
    runner: DeploymentRunner<ArtifactResolver<ChainClient<LocalWallet>>>,
}

impl Deployer {
    /// Connects to the configured chain and sets up the deployer's client.
    /// Without a private key the first anvil development account is used.
    pub async fn connect(config: &DeployConfig) -> Result<Self> {
        let chain = Chain::connect(config.ethereum_url.clone()).await?;
        let signer = match &config.private_key {
            Some(private_key) => private_key.parse::<LocalWallet>()?,
            None => chain.default_signer()?,
        };
        let client = chain.client(signer).await?;
        tracing::info!(deployer = ?client.address(), "connected");

        let artifacts = Artifacts::new(&config.artifacts_dir);
        let resolver =
            ArtifactResolver::new(artifacts, client.clone()).confirmations(config.confirmations);
        let mut runner = DeploymentRunner::new(resolver);
        if let Some(confirmation_timeout) = config.confirmation_timeout() {
            runner = runner.with_confirmation_timeout(confirmation_timeout);
        }

        Ok(Self {
            chain,
            client,
            runner,
        })
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn client(&self) -> Arc<ChainClient<LocalWallet>> {
        self.client.clone()
    }

    pub async fn deploy(&self, request: &DeploymentRequest) -> DeploymentResult {
        self.runner.deploy(request).await
    }
}
