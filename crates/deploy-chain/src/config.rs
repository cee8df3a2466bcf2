use std::{fmt, path::PathBuf, time::Duration};

use deployment_runner::{
    constants::{DEFAULT_CONSTRUCTOR_ARGS, DEFAULT_CONTRACT},
    DeploymentRequest, ResolutionError,
};
use eyre::Result;
use serde::Deserialize;

const PREFIX: &str = "DEPLOY_";

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_contract() -> String {
    DEFAULT_CONTRACT.to_string()
}

fn default_constructor_args() -> Vec<String> {
    DEFAULT_CONSTRUCTOR_ARGS.clone()
}

fn default_confirmations() -> usize {
    1
}

/// The deployment configuration, read from `DEPLOY_*` environment variables.
/// Every field has a default, so an empty environment deploys GoldRush to a
/// fresh anvil node from `./artifacts`.
#[derive(Clone, Deserialize)]
pub struct DeployConfig {
    // chain configuration
    #[serde(default)]
    pub ethereum_url: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    // contract configuration
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
    #[serde(default = "default_contract")]
    pub contract: String,
    #[serde(default = "default_constructor_args")]
    pub constructor_args: Vec<String>,
    // confirmation configuration
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,
    #[serde(default)]
    pub confirmation_timeout_secs: Option<u64>,
    // reporting configuration
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl DeployConfig {
    pub fn from_env() -> Result<Self> {
        Ok(envy::prefixed(PREFIX).from_env::<Self>()?)
    }

    pub fn from_iter<I: IntoIterator<Item = (String, String)>>(vars: I) -> Result<Self> {
        Ok(envy::prefixed(PREFIX).from_iter::<_, Self>(vars)?)
    }

    /// The deployment this configuration describes. An empty
    /// `DEPLOY_CONSTRUCTOR_ARGS` means the constructor takes no arguments.
    pub fn request(&self) -> Result<DeploymentRequest, ResolutionError> {
        let args = match self.constructor_args.as_slice() {
            [only] if only.is_empty() => vec![],
            args => args.to_vec(),
        };
        DeploymentRequest::new(self.contract.clone(), args)
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            ethereum_url: None,
            private_key: None,
            artifacts_dir: default_artifacts_dir(),
            contract: default_contract(),
            constructor_args: default_constructor_args(),
            confirmations: default_confirmations(),
            confirmation_timeout_secs: None,
            output: None,
        }
    }
}

// The private key is deliberately left out of the debug output.
impl fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployConfig")
            .field("ethereum_url", &self.ethereum_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("artifacts_dir", &self.artifacts_dir)
            .field("contract", &self.contract)
            .field("constructor_args", &self.constructor_args)
            .field("confirmations", &self.confirmations)
            .field("confirmation_timeout_secs", &self.confirmation_timeout_secs)
            .field("output", &self.output)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_deploy_gold_rush() -> Result<()> {
        let config = DeployConfig::from_iter(vars(&[("PATH", "/usr/bin")]))?;

        assert_eq!(config.ethereum_url, None);
        assert_eq!(config.artifacts_dir, PathBuf::from("artifacts"));
        assert_eq!(config.confirmations, 1);
        assert_eq!(config.confirmation_timeout(), None);
        let request = config.request()?;
        assert_eq!(request.contract_name(), "GoldRush");
        assert_eq!(
            request.constructor_args(),
            &[
                "0xfD85b99A39A9f155B73b35d2b9AB224c3bEd8ee8".to_string(),
                "GoldRush".to_string(),
                "GR".to_string()
            ]
        );

        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<()> {
        let config = DeployConfig::from_iter(vars(&[
            ("DEPLOY_ETHEREUM_URL", "http://localhost:8545"),
            ("DEPLOY_PRIVATE_KEY", "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"),
            ("DEPLOY_ARTIFACTS_DIR", "out"),
            ("DEPLOY_CONTRACT", "SilverRush"),
            ("DEPLOY_CONSTRUCTOR_ARGS", "0x0000000000000000000000000000000000000001,Silver,SR"),
            ("DEPLOY_CONFIRMATIONS", "3"),
            ("DEPLOY_CONFIRMATION_TIMEOUT_SECS", "120"),
            ("DEPLOY_OUTPUT", "deployments/silver.json"),
        ]))?;

        assert_eq!(
            config.ethereum_url.as_deref(),
            Some("http://localhost:8545")
        );
        assert_eq!(config.artifacts_dir, PathBuf::from("out"));
        assert_eq!(config.confirmations, 3);
        assert_eq!(config.confirmation_timeout(), Some(Duration::from_secs(120)));
        assert_eq!(
            config.output,
            Some(PathBuf::from("deployments/silver.json"))
        );
        let request = config.request()?;
        assert_eq!(request.contract_name(), "SilverRush");
        assert_eq!(request.constructor_args().len(), 3);
        assert_eq!(request.constructor_args()[2], "SR");

        // The key never shows up in logs.
        assert!(!format!("{config:?}").contains("ac0974"));

        Ok(())
    }

    #[test]
    fn test_empty_arguments() -> Result<()> {
        let config = DeployConfig::from_iter(vars(&[
            ("DEPLOY_CONTRACT", "Counter"),
            ("DEPLOY_CONSTRUCTOR_ARGS", ""),
        ]))?;

        assert!(config.request()?.constructor_args().is_empty());

        Ok(())
    }

    #[test]
    fn test_invalid_values() {
        assert!(DeployConfig::from_iter(vars(&[("DEPLOY_CONFIRMATIONS", "many")])).is_err());
        let config = DeployConfig::from_iter(vars(&[("DEPLOY_CONTRACT", " ")])).unwrap();
        assert!(matches!(config.request(), Err(ResolutionError::EmptyName)));
    }
}
