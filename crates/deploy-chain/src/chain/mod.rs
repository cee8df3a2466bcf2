use std::{path::Path, process::Command, sync::Arc, time::Duration};

use async_trait::async_trait;
use ethers::{
    core::utils::Anvil,
    middleware::{
        gas_escalator::{Frequency, GeometricGasPrice},
        nonce_manager::NonceManagerError,
        GasEscalatorMiddleware, MiddlewareError, NonceManagerMiddleware, SignerMiddleware,
    },
    providers::{
        Http, HttpClientError, HttpRateLimitRetryPolicy, Middleware, PendingTransaction, Provider,
        RetryClient, RetryClientBuilder, RetryPolicy,
    },
    signers::{LocalWallet, Signer},
    types::{transaction::eip2718::TypedTransaction, Address, BlockId},
    utils::AnvilInstance,
};
use eyre::{eyre, Result};

/// How often a remote chain is polled for receipts. Anvil mines instantly, so
/// local chains are polled much more aggressively.
const REMOTE_POLL_INTERVAL: Duration = Duration::from_secs(1);
const ANVIL_POLL_INTERVAL: Duration = Duration::from_millis(10);

const ANVIL_BINARY: &str = "anvil";

/// A retry policy that will retry on rate limit errors, timeout errors, and
/// "intrinsic gas too high".
#[derive(Debug, Default)]
struct ChainRetryPolicy(HttpRateLimitRetryPolicy);

impl RetryPolicy<HttpClientError> for ChainRetryPolicy {
    fn should_retry(&self, error: &HttpClientError) -> bool {
        self.0.should_retry(error) || error.to_string().contains("intrinsic gas too high")
    }

    fn backoff_hint(&self, error: &HttpClientError) -> Option<Duration> {
        match self.0.backoff_hint(error) {
            Some(duration) => Some(duration),
            None => {
                if error.to_string().contains("intrinsic gas too high") {
                    Some(Duration::from_millis(1))
                } else {
                    None
                }
            }
        }
    }
}

type ChainClientProvider = Arc<RetryClient<Http>>;

type ChainClientInner<S> =
    NonceManagerMiddleware<SignerMiddleware<GasEscalatorMiddleware<Provider<ChainClientProvider>>, S>>;

/// A client with a provider stack that includes a retry policy, nonce manager,
/// signer, and gas escalator.
#[derive(Debug)]
pub struct ChainClient<S: Signer + 'static> {
    inner: ChainClientInner<S>,
    address: Address,
}

impl<S: Signer + 'static> ChainClient<S> {
    pub async fn new(provider: Provider<Http>, signer: S) -> Result<Self> {
        // Only transport-level failures are retried. A deployment that the
        // node rejects is never resubmitted.
        let interval = provider.get_interval();
        let provider = RetryClientBuilder::default()
            .rate_limit_retries(10)
            .timeout_retries(3)
            .initial_backoff(Duration::from_millis(1))
            .build(
                provider.as_ref().clone(),
                Box::<ChainRetryPolicy>::default(),
            );
        let provider = Provider::new(Arc::new(provider)).interval(interval);

        // Build a client with signer, nonce management, and gas escalator
        // middleware.
        let inner = GasEscalatorMiddleware::new(
            provider,
            GeometricGasPrice::new(1.125, 10u64, None::<u64>),
            Frequency::PerBlock,
        );
        let inner = SignerMiddleware::new_with_provider_chain(inner, signer).await?;
        let address = inner.address();
        let inner = NonceManagerMiddleware::new(inner, address);

        Ok(Self { inner, address })
    }

    /// Gets the client's address.
    pub fn address(&self) -> Address {
        self.address
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<S: Signer + 'static> Middleware for ChainClient<S> {
    // NOTE: This is a pass-through middleware implementation, so we just use
    // the error from the top of the middleware stack.
    type Error = NonceManagerError<Self::Inner>;

    type Provider = ChainClientProvider;
    type Inner = ChainClientInner<S>;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn send_transaction<T: Into<TypedTransaction> + Send + Sync>(
        &self,
        tx: T,
        block: Option<BlockId>,
    ) -> Result<PendingTransaction<'_, Self::Provider>, Self::Error> {
        Ok(self
            .inner
            .send_transaction(tx, block)
            .await
            .map_err(MiddlewareError::from_err)?)
    }
}

/// The chain that contracts are deployed to. This is either a remote node
/// reached over HTTP or a throwaway anvil node owned by this struct.
pub struct Chain {
    provider: Provider<Http>,
    client_version: String,
    maybe_anvil: Option<AnvilInstance>,
}

impl Chain {
    /// Constructs a new `Chain` from an Ethereum RPC URL. If the RPC URL is
    /// excluded, a local anvil node is spun up.
    pub async fn connect(maybe_rpc_url: Option<String>) -> Result<Self> {
        if let Some(rpc_url) = maybe_rpc_url {
            let provider = Provider::<Http>::try_from(rpc_url)?.interval(REMOTE_POLL_INTERVAL);
            let client_version = provider.client_version().await?;
            tracing::debug!(%client_version, "connected to remote chain");
            Ok(Self {
                provider,
                client_version,
                maybe_anvil: None,
            })
        } else {
            let anvil = spawn_anvil(Path::new(ANVIL_BINARY))?;
            let provider =
                Provider::<Http>::try_from(anvil.endpoint())?.interval(ANVIL_POLL_INTERVAL);
            let client_version = provider.client_version().await?;
            tracing::debug!(endpoint = %anvil.endpoint(), "spawned anvil chain");
            Ok(Self {
                provider,
                client_version,
                maybe_anvil: Some(anvil),
            })
        }
    }

    /// A provider that can access the chain.
    pub fn provider(&self) -> Provider<Http> {
        self.provider.clone()
    }

    /// A client that signs with `signer`.
    pub async fn client<S: Signer + 'static>(&self, signer: S) -> Result<Arc<ChainClient<S>>> {
        Ok(Arc::new(ChainClient::new(self.provider(), signer).await?))
    }

    /// The first pre-funded account of a spawned anvil node. Remote chains
    /// have no default signer.
    pub fn default_signer(&self) -> Result<LocalWallet> {
        let anvil = self.maybe_anvil.as_ref().ok_or(eyre!(
            "a private key is required to deploy to a remote chain ({})",
            self.client_version
        ))?;
        let key = anvil
            .keys()
            .first()
            .ok_or(eyre!("anvil didn't expose any development keys"))?;
        Ok(key.clone().into())
    }

    /// Checks to see if the underlying chain is an anvil chain.
    pub fn is_anvil(&self) -> bool {
        self.client_version.contains("anvil")
    }
}

/// Spawns an anvil node from `program`. `Anvil::spawn` panics when the binary
/// can't be started, so its presence is checked up front.
fn spawn_anvil(program: &Path) -> Result<AnvilInstance> {
    Command::new(program)
        .arg("--version")
        .output()
        .map_err(|err| {
            eyre!(
                "couldn't run {} ({}); install foundry or set DEPLOY_ETHEREUM_URL",
                program.display(),
                err
            )
        })?;
    Ok(Anvil::at(program).spawn())
}
