use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    error::{ConfirmationError, DeploymentError},
    factory::{ContractFactory, ContractFactoryResolver, PendingContract},
    request::{DeployedContract, DeploymentRequest, DeploymentResult},
};

/// Runs a deployment through resolve -> submit -> confirm. Any failure ends
/// the run; nothing is retried since a second submission would create a second
/// contract.
#[derive(Debug)]
pub struct DeploymentRunner<R> {
    resolver: R,
    confirmation_timeout: Option<Duration>,
}

impl<R: ContractFactoryResolver> DeploymentRunner<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            confirmation_timeout: None,
        }
    }

    /// Bounds how long the runner waits for the creation transaction to be
    /// confirmed. Expiring the timeout doesn't cancel the transaction.
    pub fn with_confirmation_timeout(mut self, confirmation_timeout: Duration) -> Self {
        self.confirmation_timeout = Some(confirmation_timeout);
        self
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    #[tracing::instrument(skip_all, fields(contract = request.contract_name()))]
    pub async fn deploy(&self, request: &DeploymentRequest) -> DeploymentResult {
        let result = self.run(request).await;
        if let Err(err) = &result {
            warn!(kind = ?err.kind(), %err, "deployment failed");
        }
        result
    }

    async fn run(&self, request: &DeploymentRequest) -> DeploymentResult {
        let factory = self.resolver.get_factory(request.contract_name())?;
        debug!(args = ?request.constructor_args(), "resolved contract factory");

        let pending = factory.deploy(request.constructor_args()).await?;
        let tx_hash = pending.transaction_hash();
        info!(?tx_hash, "deployment transaction submitted");

        let deployed = self.confirm(pending).await?;
        info!(
            address = %deployed,
            block_number = ?deployed.block_number,
            "contract deployed"
        );
        Ok(deployed)
    }

    async fn confirm<P: PendingContract>(
        &self,
        pending: P,
    ) -> Result<DeployedContract, DeploymentError> {
        match self.confirmation_timeout {
            Some(confirmation_timeout) => {
                let tx_hash = pending.transaction_hash();
                match timeout(confirmation_timeout, pending.await_deployment()).await {
                    Ok(deployed) => Ok(deployed?),
                    Err(_) => Err(ConfirmationError::Timeout {
                        tx_hash,
                        timeout: confirmation_timeout,
                    }
                    .into()),
                }
            }
            None => Ok(pending.await_deployment().await?),
        }
    }
}
