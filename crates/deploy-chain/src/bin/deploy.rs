/// Deploys a compiled contract and prints its address. By default this
/// deploys `GoldRush` from `./artifacts`; see `DeployConfig` for the
/// `DEPLOY_*` variables that change the contract, its constructor arguments
/// and the chain it's deployed to.
use std::{
    io::{stderr, stdout},
    process::ExitCode,
};

use deploy_chain::{DeployConfig, Deployer};
use deployment_runner::finish;
use dotenvy::dotenv;
use eyre::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // The .env file is optional, the variables may already be exported.
    dotenv().ok();

    // Logs go to stderr so that stdout only carries the deployed address.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(stderr)
        .init();

    let config = DeployConfig::from_env()?;
    tracing::debug!(?config, "loaded configuration");
    let request = config.request()?;

    let deployer = Deployer::connect(&config).await?;
    let result = deployer.deploy(&request).await;

    let code = finish(
        &request,
        &result,
        config.output.as_deref(),
        &mut stdout().lock(),
        &mut stderr().lock(),
    )?;
    Ok(ExitCode::from(code))
}
