// deployer/src/lib.rs
// Library interface: the init-code deployer plus the demo flow built on it.

pub mod bindings;
pub mod config;
pub mod deploy;
pub mod error;
pub mod factory;
pub mod poc;
pub mod resolver;
pub mod shape;
pub mod transaction;
pub mod value;

// Public types/constants re-exported for convenience
pub use deploy::{deploy, deploy_init_code, Deployment, PayloadMode, INIT_CODE_DROPPER};
pub use error::{DeployError, ErrorKind};
pub use factory::{ContractArtifact, InitCodeFactory};
pub use resolver::{resolve_addresses, resolve_name, NameResolver};
pub use transaction::Overrides;
pub use value::ArgValue;
// END OF FILE: deployer/src/lib.rs
