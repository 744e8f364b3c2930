// deployer/src/transaction.rs

use crate::error::DeployError;
use ethers::{
    core::types::{transaction::eip2718::TypedTransaction, Address, TransactionReceipt, U256, U64},
    providers::Middleware,
};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use tracing::{debug, info, instrument};

// --- Constants ---
pub const TX_SUCCESS_STATUS: U64 = U64([1]);

/// Per-transaction overrides, applied on top of the unsigned deployment
/// transaction. Anything left `None` is filled in by the middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
    pub from: Option<Address>,
    pub value: Option<U256>,
    pub gas: Option<U256>,
    pub gas_price: Option<U256>,
    pub nonce: Option<U256>,
}

impl Overrides {
    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn value<T: Into<U256>>(mut self, value: T) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn gas<T: Into<U256>>(mut self, gas: T) -> Self {
        self.gas = Some(gas.into());
        self
    }

    pub fn gas_price<T: Into<U256>>(mut self, gas_price: T) -> Self {
        self.gas_price = Some(gas_price.into());
        self
    }

    pub fn nonce<T: Into<U256>>(mut self, nonce: T) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn apply(&self, tx: &mut TypedTransaction) {
        if let Some(from) = self.from {
            tx.set_from(from);
        }
        if let Some(value) = self.value {
            tx.set_value(value);
        }
        if let Some(gas) = self.gas {
            tx.set_gas(gas);
        }
        if let Some(gas_price) = self.gas_price {
            tx.set_gas_price(gas_price);
        }
        if let Some(nonce) = self.nonce {
            tx.set_nonce(nonce);
        }
    }
}

/// A confirmed transaction together with the sender/nonce pair it was sent with.
#[derive(Debug, Clone)]
pub struct SentTransaction {
    pub sender: Address,
    pub nonce: U256,
    pub receipt: TransactionReceipt,
}

/// Signs and broadcasts `tx` through `client` and waits for `confirmations`.
///
/// The sender and nonce are pinned before filling so that the caller can derive
/// the CREATE address from exactly what was sent.
#[instrument(skip_all, level = "debug", fields(confirmations = confirmations))]
pub async fn send_and_confirm<M: Middleware>(
    client: &M,
    mut tx: TypedTransaction,
    confirmations: usize,
) -> Result<SentTransaction, DeployError>
where
    <M as Middleware>::Error: StdError + Send + Sync + 'static,
{
    let sender = tx
        .from()
        .copied()
        .or_else(|| client.default_sender())
        .ok_or_else(|| DeployError::unsupported_operation("a signer is needed to send transactions", "sendTransaction"))?;
    tx.set_from(sender);

    let nonce = match tx.nonce() {
        Some(nonce) => *nonce,
        None => {
            let nonce = client
                .get_transaction_count(sender, None)
                .await
                .map_err(|e| DeployError::transport("Failed to fetch sender nonce", e))?;
            tx.set_nonce(nonce);
            nonce
        }
    };

    client
        .fill_transaction(&mut tx, None)
        .await
        .map_err(|e| DeployError::transport("Failed to fill transaction", e))?;
    debug!(%sender, %nonce, gas = ?tx.gas(), "Transaction filled");

    let pending = client
        .send_transaction(tx, None)
        .await
        .map_err(|e| DeployError::transport("Failed to send transaction", e))?;
    let tx_hash = pending.tx_hash();
    info!(?tx_hash, %sender, %nonce, "Transaction sent, awaiting confirmation...");

    let receipt = pending
        .confirmations(confirmations)
        .await
        .map_err(|e| DeployError::transport("Failed while awaiting confirmation", e))?
        .ok_or(DeployError::Dropped(tx_hash))?;

    if receipt.status != Some(TX_SUCCESS_STATUS) {
        return Err(DeployError::Reverted(tx_hash));
    }

    debug!(?tx_hash, block = ?receipt.block_number, gas_used = ?receipt.gas_used, "Transaction confirmed");
    Ok(SentTransaction { sender, nonce, receipt })
}
