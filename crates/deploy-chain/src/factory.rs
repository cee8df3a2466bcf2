/// Implementations of the deployment capabilities on top of an ethers
/// middleware stack. Signing, gas and nonces are left to the middleware.
use std::sync::Arc;

use async_trait::async_trait;
use deployment_runner::{
    ConfirmationError, ContractFactory, ContractFactoryResolver, DeployedContract,
    PendingContract, ResolutionError, SubmissionError,
};
use ethers::{
    providers::{Middleware, PendingTransaction},
    types::{transaction::eip2718::TypedTransaction, TransactionRequest, H256, U64},
};

use crate::artifacts::{Artifacts, ContractArtifact};

/// Resolves contract names to factories backed by compiled artifacts.
#[derive(Debug)]
pub struct ArtifactResolver<M> {
    artifacts: Artifacts,
    client: Arc<M>,
    confirmations: usize,
}

impl<M: Middleware + 'static> ArtifactResolver<M> {
    pub fn new(artifacts: Artifacts, client: Arc<M>) -> Self {
        Self {
            artifacts,
            client,
            confirmations: 1,
        }
    }

    /// The number of blocks the creation transaction must be buried under
    /// before a deployment counts as confirmed.
    pub fn confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations;
        self
    }
}

impl<M: Middleware + 'static> ContractFactoryResolver for ArtifactResolver<M> {
    type Factory = EthersContractFactory<M>;

    fn get_factory(&self, name: &str) -> Result<Self::Factory, ResolutionError> {
        let artifact = self.artifacts.find(name)?;
        Ok(EthersContractFactory {
            artifact,
            client: self.client.clone(),
            confirmations: self.confirmations,
        })
    }
}

#[derive(Debug)]
pub struct EthersContractFactory<M> {
    artifact: ContractArtifact,
    client: Arc<M>,
    confirmations: usize,
}

impl<M> EthersContractFactory<M> {
    pub fn artifact(&self) -> &ContractArtifact {
        &self.artifact
    }
}

#[async_trait]
impl<M: Middleware + 'static> ContractFactory for EthersContractFactory<M> {
    type Pending = EthersPendingContract<M>;

    async fn deploy(&self, args: &[String]) -> Result<Self::Pending, SubmissionError> {
        // Encode before touching the network so bad arguments never cost gas.
        let data = self.artifact.creation_code(args)?;
        let tx: TypedTransaction = TransactionRequest::new().data(data).into();
        let tx_hash = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|err| submission_error(err.to_string()))?
            .tx_hash();

        Ok(EthersPendingContract {
            client: self.client.clone(),
            tx_hash,
            confirmations: self.confirmations,
        })
    }
}

/// Reverts are reported by nodes as "execution reverted" (geth, anvil) or
/// "transaction reverted" (hardhat).
fn submission_error(message: String) -> SubmissionError {
    if message.contains("reverted") {
        SubmissionError::WouldRevert(message)
    } else {
        SubmissionError::Rejected(message)
    }
}

#[derive(Debug)]
pub struct EthersPendingContract<M> {
    client: Arc<M>,
    tx_hash: H256,
    confirmations: usize,
}

#[async_trait]
impl<M: Middleware + 'static> PendingContract for EthersPendingContract<M> {
    fn transaction_hash(&self) -> H256 {
        self.tx_hash
    }

    async fn await_deployment(self) -> Result<DeployedContract, ConfirmationError> {
        let receipt = PendingTransaction::new(self.tx_hash, self.client.provider())
            .confirmations(self.confirmations)
            .await
            .map_err(|err| ConfirmationError::Provider(err.to_string()))?
            .ok_or(ConfirmationError::Dropped(self.tx_hash))?;
        if receipt.status == Some(U64::zero()) {
            return Err(ConfirmationError::Reverted(self.tx_hash));
        }
        let address = receipt
            .contract_address
            .ok_or(ConfirmationError::MissingAddress(self.tx_hash))?;

        Ok(DeployedContract {
            address,
            transaction_hash: self.tx_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use deployment_runner::DeploymentError;
    use ethers::{
        providers::{JsonRpcError, MockProvider, MockResponse, Provider},
        types::{Address, Transaction, TransactionReceipt, U256},
    };
    use eyre::Result;

    use super::*;

    fn mocked() -> (Arc<Provider<MockProvider>>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        (Arc::new(provider.interval(Duration::from_millis(1))), mock)
    }

    fn factory(
        client: Arc<Provider<MockProvider>>,
    ) -> Result<EthersContractFactory<Provider<MockProvider>>> {
        Ok(EthersContractFactory {
            artifact: ContractArtifact {
                name: "GoldRush".to_string(),
                path: "GoldRush.json".into(),
                abi: serde_json::from_str("[]")?,
                bytecode: "0x6001600c60003960016000f300".parse()?,
            },
            client,
            confirmations: 1,
        })
    }

    fn pending(
        client: Arc<Provider<MockProvider>>,
        confirmations: usize,
    ) -> EthersPendingContract<Provider<MockProvider>> {
        EthersPendingContract {
            client,
            tx_hash: H256::repeat_byte(0x11),
            confirmations,
        }
    }

    fn error_response(code: i64, message: &str) -> MockResponse {
        MockResponse::Error(JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        })
    }

    fn mined() -> Transaction {
        Transaction {
            hash: H256::repeat_byte(0x11),
            block_number: Some(U64::from(7)),
            ..Default::default()
        }
    }

    fn receipt(status: u64, contract_address: Option<Address>) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: H256::repeat_byte(0x11),
            block_number: Some(U64::from(7)),
            status: Some(U64::from(status)),
            contract_address,
            ..Default::default()
        }
    }

    // The mock pops responses from the back, so they are pushed in reverse
    // order of the requests.

    #[tokio::test]
    async fn test_deploy_returns_transaction_hash() -> Result<()> {
        let (client, mock) = mocked();
        mock.push(H256::repeat_byte(0x11))?; // eth_sendTransaction
        mock.push(U256::from(100_000))?; // eth_estimateGas
        mock.push(U256::from(1_000_000_000))?; // eth_gasPrice

        let pending = factory(client)?.deploy(&[]).await?;
        assert_eq!(pending.transaction_hash(), H256::repeat_byte(0x11));

        Ok(())
    }

    #[tokio::test]
    async fn test_deploy_rejected() -> Result<()> {
        let (client, mock) = mocked();
        mock.push_response(error_response(
            -32000,
            "insufficient funds for gas * price + value",
        ));

        let err = factory(client)?
            .deploy(&[])
            .await
            .expect_err("deploy should fail");
        assert!(matches!(err, SubmissionError::Rejected(_)), "{:?}", err);
        assert!(DeploymentError::from(err).is_retryable());

        Ok(())
    }

    #[tokio::test]
    async fn test_deploy_that_would_revert_is_not_retryable() -> Result<()> {
        let (client, mock) = mocked();
        mock.push_response(error_response(3, "execution reverted")); // eth_estimateGas
        mock.push(U256::from(1_000_000_000))?; // eth_gasPrice

        let err = factory(client)?
            .deploy(&[])
            .await
            .expect_err("deploy should fail");
        assert!(matches!(err, SubmissionError::WouldRevert(_)), "{:?}", err);
        assert!(!DeploymentError::from(err).is_retryable());

        Ok(())
    }

    #[tokio::test]
    async fn test_await_deployment() -> Result<()> {
        let (client, mock) = mocked();
        let address = Address::repeat_byte(0x22);
        mock.push(receipt(1, Some(address)))?;
        mock.push(mined())?;

        let deployed = pending(client, 1).await_deployment().await?;
        assert_eq!(deployed.address, address);
        assert_eq!(deployed.transaction_hash, H256::repeat_byte(0x11));
        assert_eq!(deployed.block_number, Some(7));

        Ok(())
    }

    #[tokio::test]
    async fn test_await_deployment_reverted() -> Result<()> {
        let (client, mock) = mocked();
        mock.push(receipt(0, Some(Address::repeat_byte(0x22))))?;
        mock.push(mined())?;

        let err = pending(client, 1)
            .await_deployment()
            .await
            .expect_err("deployment should revert");
        assert!(
            matches!(err, ConfirmationError::Reverted(hash) if hash == H256::repeat_byte(0x11)),
            "{:?}",
            err
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_await_deployment_without_contract_address() -> Result<()> {
        let (client, mock) = mocked();
        mock.push(receipt(1, None))?;
        mock.push(mined())?;

        let err = pending(client, 1)
            .await_deployment()
            .await
            .expect_err("receipt has no address");
        assert!(matches!(err, ConfirmationError::MissingAddress(_)), "{:?}", err);

        Ok(())
    }

    #[tokio::test]
    async fn test_await_deployment_dropped() -> Result<()> {
        let (client, mock) = mocked();
        // One lookup plus three retries.
        for _ in 0..4 {
            mock.push(Option::<Transaction>::None)?;
        }

        let err = pending(client, 1)
            .await_deployment()
            .await
            .expect_err("transaction should be dropped");
        assert!(matches!(err, ConfirmationError::Dropped(_)), "{:?}", err);

        Ok(())
    }

    #[tokio::test]
    async fn test_await_deployment_provider_error() -> Result<()> {
        let (client, mock) = mocked();
        mock.push_response(error_response(-32603, "internal error")); // eth_blockNumber
        mock.push(receipt(1, Some(Address::repeat_byte(0x22))))?;
        mock.push(mined())?;

        let err = pending(client, 2)
            .await_deployment()
            .await
            .expect_err("block number lookup fails");
        assert!(matches!(err, ConfirmationError::Provider(_)), "{:?}", err);

        Ok(())
    }

    #[tokio::test]
    async fn test_lookup_errors_are_retried() -> Result<()> {
        let (client, mock) = mocked();
        mock.push(receipt(1, Some(Address::repeat_byte(0x22))))?;
        mock.push(mined())?;
        for _ in 0..3 {
            mock.push_response(error_response(-32603, "internal error"));
        }

        let deployed = tokio::time::timeout(
            Duration::from_secs(5),
            pending(client, 1).await_deployment(),
        )
        .await??;
        assert_eq!(deployed.address, Address::repeat_byte(0x22));

        Ok(())
    }
}
