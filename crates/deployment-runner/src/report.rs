use std::{
    io::{self, Write},
    path::Path,
};

use crate::{
    record::DeploymentRecord,
    request::{DeploymentRequest, DeploymentResult},
};

/// Writes the outcome of a deployment and returns the process exit code. The
/// address goes to `stdout` so it can be piped; failures go to `stderr`.
pub fn report<O: Write, E: Write>(
    request: &DeploymentRequest,
    result: &DeploymentResult,
    stdout: &mut O,
    stderr: &mut E,
) -> io::Result<u8> {
    match result {
        Ok(deployed) => {
            writeln!(
                stdout,
                "{} is deployed to {}",
                request.contract_name(),
                deployed
            )?;
            Ok(0)
        }
        Err(err) => {
            writeln!(stderr, "error: {err}")?;
            Ok(1)
        }
    }
}

/// Reports the outcome and then, for a successful deployment, writes the
/// deployment record to `maybe_output`. The address is always printed before
/// the record is attempted. A failed write is reported on `stderr` together
/// with the address but doesn't change the exit code, since the contract
/// exists either way.
pub fn finish<O: Write, E: Write>(
    request: &DeploymentRequest,
    result: &DeploymentResult,
    maybe_output: Option<&Path>,
    stdout: &mut O,
    stderr: &mut E,
) -> io::Result<u8> {
    let code = report(request, result, stdout, stderr)?;
    stdout.flush()?;

    if let (Ok(deployed), Some(output)) = (result, maybe_output) {
        if let Err(err) = DeploymentRecord::new(request, deployed).write_to(output) {
            tracing::error!(
                address = %deployed,
                output = %output.display(),
                %err,
                "couldn't write deployment record"
            );
            writeln!(
                stderr,
                "warning: {} is deployed to {} but its record couldn't be written to {}: {err}",
                request.contract_name(),
                deployed,
                output.display()
            )?;
        }
    }

    Ok(code)
}
