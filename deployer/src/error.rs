// deployer/src/error.rs
// Error type shared by the resolver and the deployer.

use ethers::types::TxHash;
use std::error::Error as StdError;
use std::fmt::Debug;
use thiserror::Error;

/// Coarse classification of a [`DeployError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    UnsupportedOperation,
    Transport,
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("{message} (argument={argument:?}, value={value})")]
    InvalidArgument {
        message: String,
        argument: &'static str,
        value: String,
    },

    #[error("{message} (operation={operation:?})")]
    UnsupportedOperation {
        message: String,
        operation: &'static str,
    },

    #[error("{context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    #[error("transaction {0:?} reverted (status 0)")]
    Reverted(TxHash),

    #[error("transaction {0:?} was dropped before confirmation")]
    Dropped(TxHash),
}

impl DeployError {
    pub fn invalid_argument(message: impl Into<String>, argument: &'static str, value: impl Debug) -> Self {
        DeployError::InvalidArgument {
            message: message.into(),
            argument,
            value: format!("{:?}", value),
        }
    }

    pub fn unsupported_operation(message: impl Into<String>, operation: &'static str) -> Self {
        DeployError::UnsupportedOperation { message: message.into(), operation }
    }

    pub fn transport<E>(context: &'static str, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        DeployError::Transport { context, source: Box::new(source) }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            DeployError::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            DeployError::Transport { .. } | DeployError::Reverted(_) | DeployError::Dropped(_) => {
                ErrorKind::Transport
            }
        }
    }
}

/// Fails unless `count == expected`. Messages follow the usual contract-call wording:
/// "missing argument" when short, "too many arguments" when long.
pub fn check_argument_count(count: usize, expected: usize, message: &str) -> Result<(), DeployError> {
    if count < expected {
        return Err(DeployError::invalid_argument(
            format!("missing argument{}", message),
            "count",
            (count, expected),
        ));
    }
    if count > expected {
        return Err(DeployError::invalid_argument(
            format!("too many arguments{}", message),
            "count",
            (count, expected),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(
            DeployError::invalid_argument("bad", "name", 1u8).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            DeployError::unsupported_operation("no signer", "resolveName").kind(),
            ErrorKind::UnsupportedOperation
        );
        assert_eq!(DeployError::Dropped(TxHash::zero()).kind(), ErrorKind::Transport);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        assert_eq!(DeployError::transport("send failed", io).kind(), ErrorKind::Transport);
    }

    #[test]
    fn argument_count_messages() {
        assert!(check_argument_count(2, 2, "").is_ok());

        let short = check_argument_count(1, 2, " in Contract constructor").unwrap_err();
        assert!(short.to_string().starts_with("missing argument in Contract constructor"));

        let long = check_argument_count(3, 2, "").unwrap_err();
        assert!(long.to_string().starts_with("too many arguments"));
        assert_eq!(long.kind(), ErrorKind::InvalidArgument);
    }
}
