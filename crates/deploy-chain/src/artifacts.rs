/// This module finds compiled contracts on disk. It understands the artifact
/// layouts written by Hardhat (`artifacts/contracts/<File>.sol/<Name>.json`)
/// and by Foundry (`out/<File>.sol/<Name>.json`).
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use deployment_runner::{ResolutionError, SubmissionError};
use ethers::{
    abi::{
        token::{LenientTokenizer, Tokenizer},
        Abi,
    },
    types::Bytes,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct RawArtifact {
    abi: Abi,
    bytecode: RawBytecode,
}

/// Hardhat stores the creation code as a hex string while Foundry nests it in
/// an object alongside the link references.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

/// A deployable contract: its ABI and creation code.
#[derive(Clone, Debug)]
pub struct ContractArtifact {
    pub name: String,
    pub path: PathBuf,
    pub abi: Abi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Loads the artifact at `path`, rejecting anything that can't be deployed
    /// as-is.
    pub fn load(name: &str, path: &Path) -> Result<Self, ResolutionError> {
        let invalid = |reason: String| ResolutionError::InvalidArtifact {
            name: name.to_string(),
            reason,
        };

        let raw: RawArtifact = serde_json::from_reader(BufReader::new(File::open(path)?))
            .map_err(|err| invalid(format!("{}: {}", path.display(), err)))?;
        let hex = match raw.bytecode {
            RawBytecode::Hex(hex) => hex,
            RawBytecode::Object { object } => object,
        };
        // Unlinked libraries show up as `__$<hash>$__` placeholders.
        if hex.contains("__") {
            return Err(invalid(
                "bytecode has unlinked library references".to_string(),
            ));
        }
        let bytecode = hex
            .parse::<Bytes>()
            .map_err(|err| invalid(format!("bytecode isn't valid hex: {}", err)))?;
        if bytecode.is_empty() {
            return Err(invalid(
                "bytecode is empty, abstract contracts and interfaces can't be deployed"
                    .to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            abi: raw.abi,
            bytecode,
        })
    }

    /// Builds the payload of the creation transaction: the bytecode followed
    /// by the ABI-encoded constructor arguments. The arguments are parsed
    /// leniently against the constructor's parameter types, so `"GR"` is a
    /// valid `string` and `"0xfD85...8ee8"` a valid `address`.
    pub fn creation_code(&self, args: &[String]) -> Result<Bytes, SubmissionError> {
        let constructor = match self.abi.constructor() {
            Some(constructor) => constructor,
            None if args.is_empty() => return Ok(self.bytecode.clone()),
            None => {
                return Err(SubmissionError::InvalidArguments(format!(
                    "`{}` has no constructor, got {} arguments",
                    self.name,
                    args.len()
                )))
            }
        };
        if constructor.inputs.len() != args.len() {
            return Err(SubmissionError::InvalidArguments(format!(
                "`{}` constructor expects {} arguments, got {}",
                self.name,
                constructor.inputs.len(),
                args.len()
            )));
        }

        let tokens = constructor
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                LenientTokenizer::tokenize(&param.kind, arg).map_err(|err| {
                    SubmissionError::InvalidArguments(format!(
                        "argument `{}` isn't a valid {}: {}",
                        param.name, param.kind, err
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let code = constructor
            .encode_input(self.bytecode.to_vec(), &tokens)
            .map_err(|err| SubmissionError::InvalidArguments(err.to_string()))?;

        Ok(code.into())
    }
}

/// A directory tree of compiled artifacts.
#[derive(Clone, Debug)]
pub struct Artifacts {
    root: PathBuf,
}

impl Artifacts {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Finds the artifact for `name`. The name is either a bare contract name
    /// (`GoldRush`) or a fully qualified one (`contracts/GoldRush.sol:GoldRush`)
    /// which only matches artifacts compiled from that source file.
    pub fn find(&self, name: &str) -> Result<ContractArtifact, ResolutionError> {
        let (maybe_source, contract) = match name.rsplit_once(':') {
            Some((source, contract)) => (Some(source), contract),
            None => (None, name),
        };
        if contract.trim().is_empty() {
            return Err(ResolutionError::EmptyName);
        }

        let mut candidates = artifact_paths(&self.root)?
            .into_iter()
            .filter(|path| is_match(path, maybe_source, contract))
            .collect::<Vec<_>>();
        match candidates.len() {
            0 => Err(ResolutionError::NotFound {
                name: name.to_string(),
            }),
            1 => {
                let path = candidates.remove(0);
                tracing::debug!(path = %path.display(), "found artifact");
                ContractArtifact::load(name, &path)
            }
            _ => {
                candidates.sort();
                Err(ResolutionError::Ambiguous {
                    name: name.to_string(),
                    candidates: candidates
                        .iter()
                        .map(|path| path.display().to_string())
                        .collect(),
                })
            }
        }
    }
}

fn is_match(path: &Path, maybe_source: Option<&str>, contract: &str) -> bool {
    if path.file_stem().and_then(|stem| stem.to_str()) != Some(contract) {
        return false;
    }
    match maybe_source {
        Some(source) => {
            let source_file = Path::new(source).file_name();
            source_file.is_some()
                && path.parent().and_then(|parent| parent.file_name()) == source_file
        }
        None => true,
    }
}

fn artifact_paths(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            // Hardhat's build info holds the full compiler input and output,
            // not per-contract artifacts.
            if path.file_name().and_then(|name| name.to_str()) != Some("build-info") {
                paths.extend(artifact_paths(&path)?);
            }
            continue;
        }
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        if file_name.ends_with(".json") && !file_name.ends_with(".dbg.json") {
            paths.push(path);
        }
    }
    Ok(paths)
}
