/// A JSON summary of a finished deployment, suitable for other tooling to
/// pick up the deployed address.
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};

use crate::request::{DeployedContract, DeploymentRequest};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract: String,
    pub address: Address,
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
    pub constructor_args: Vec<String>,
}

impl DeploymentRecord {
    pub fn new(request: &DeploymentRequest, deployed: &DeployedContract) -> Self {
        Self {
            contract: request.contract_name().to_string(),
            address: deployed.address,
            transaction_hash: deployed.transaction_hash,
            block_number: deployed.block_number,
            constructor_args: request.constructor_args().to_vec(),
        }
    }

    /// Writes the record to `path`, creating parent directories as needed.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut f = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut f, self)?;
        // Dropping the writer would swallow a failed flush.
        f.flush()?;
        Ok(())
    }
}
