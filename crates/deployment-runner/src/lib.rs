#[macro_use]
extern crate lazy_static;

pub mod constants;
pub mod error;
pub mod factory;
pub mod record;
pub mod report;
pub mod request;
pub mod runner;

pub use error::{ConfirmationError, DeploymentError, ErrorKind, ResolutionError, SubmissionError};
pub use factory::{ContractFactory, ContractFactoryResolver, PendingContract};
pub use record::DeploymentRecord;
pub use report::{finish, report};
pub use request::{DeployedContract, DeploymentRequest, DeploymentResult};
pub use runner::DeploymentRunner;
