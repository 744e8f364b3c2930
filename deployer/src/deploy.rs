// deployer/src/deploy.rs
//! Contract deployment, including the init-code variant that stores a
//! contract's creation code (instead of its runtime code) on chain.

use crate::error::{check_argument_count, DeployError};
use crate::factory::{decode_hex_bytecode, InitCodeFactory};
use crate::resolver::{resolve_addresses, NameResolver};
use crate::transaction::{send_and_confirm, Overrides};
use crate::value::{tokenize, ArgValue};
use ethers::{
    contract::Contract,
    providers::Middleware,
    types::{transaction::eip2718::TypedTransaction, Address, TransactionReceipt},
};
use std::error::Error as StdError;
use tracing::{debug, info, instrument, warn};

/// Copies everything after itself (`codesize - 0x0d` bytes from offset `0x0d`)
/// into memory and returns it, so the rest of the payload becomes the code.
pub const INIT_CODE_DROPPER: &str = "0x600d80380380916000396000f3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMode {
    /// Run the creation code; the chain stores what it returns.
    Standard,
    /// Store the creation code itself.
    InitCode,
}

/// A deployed contract and the receipt of the transaction that created it.
#[derive(Debug)]
pub struct Deployment<M> {
    contract: Contract<M>,
    receipt: TransactionReceipt,
}

impl<M> Deployment<M> {
    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub fn contract(&self) -> &Contract<M> {
        &self.contract
    }

    pub fn into_contract(self) -> Contract<M> {
        self.contract
    }

    pub fn deploy_transaction(&self) -> &TransactionReceipt {
        &self.receipt
    }
}

/// `INIT_CODE_DROPPER || payload[2..]`, on the hex string form.
pub fn splice_init_code_dropper(payload: &str) -> Result<String, DeployError> {
    let body = payload
        .strip_prefix("0x")
        .ok_or_else(|| DeployError::invalid_argument("payload must be a 0x-prefixed hex string", "data", payload))?;
    Ok(format!("{}{}", INIT_CODE_DROPPER, body))
}

/// Splits off a trailing overrides argument when exactly one argument more than
/// the constructor declares was passed, then checks the remaining count.
pub fn split_overrides(mut args: Vec<ArgValue>, expected: usize) -> Result<(Vec<ArgValue>, Overrides), DeployError> {
    let mut overrides = Overrides::default();

    if args.len() == expected + 1 {
        overrides = match args.pop() {
            Some(ArgValue::Overrides(o)) => *o,
            other => {
                return Err(DeployError::invalid_argument(
                    "trailing argument must be transaction overrides",
                    "overrides",
                    other,
                ))
            }
        };
    }

    check_argument_count(args.len(), expected, " in Contract constructor")?;
    Ok((args, overrides))
}

/// Rewrites the transaction payload for `mode`. `Standard` leaves it alone.
pub fn apply_payload_mode(tx: &mut TypedTransaction, mode: PayloadMode) -> Result<(), DeployError> {
    if mode == PayloadMode::Standard {
        return Ok(());
    }

    let payload = format!("0x{}", hex::encode(tx.data().map(|d| d.to_vec()).unwrap_or_default()));
    let spliced = splice_init_code_dropper(&payload)?;
    let data = decode_hex_bytecode(&spliced)
        .map_err(|e| DeployError::invalid_argument(format!("spliced payload is not hex: {}", e), "data", &spliced))?;

    debug!(original_len = payload.len() / 2 - 1, spliced_len = data.len(), "Prepended init code dropper");
    tx.set_data(data);
    Ok(())
}

/// Deploys the factory's creation code verbatim: the code stored at the
/// returned address is the init code (constructor arguments included), not the
/// runtime code it would produce.
///
/// `args` holds one value per constructor parameter, optionally followed by an
/// [`ArgValue::Overrides`].
pub async fn deploy_init_code<M>(factory: &InitCodeFactory<M>, args: Vec<ArgValue>) -> Result<Deployment<M>, DeployError>
where
    M: Middleware + NameResolver + 'static,
    <M as Middleware>::Error: StdError + Send + Sync + 'static,
{
    deploy_with(factory, args, PayloadMode::InitCode).await
}

/// Ordinary deployment; same argument handling as [`deploy_init_code`].
pub async fn deploy<M>(factory: &InitCodeFactory<M>, args: Vec<ArgValue>) -> Result<Deployment<M>, DeployError>
where
    M: Middleware + NameResolver + 'static,
    <M as Middleware>::Error: StdError + Send + Sync + 'static,
{
    deploy_with(factory, args, PayloadMode::Standard).await
}

#[instrument(skip_all, fields(mode = ?mode, args = args.len()))]
async fn deploy_with<M>(
    factory: &InitCodeFactory<M>,
    args: Vec<ArgValue>,
    mode: PayloadMode,
) -> Result<Deployment<M>, DeployError>
where
    M: Middleware + NameResolver + 'static,
    <M as Middleware>::Error: StdError + Send + Sync + 'static,
{
    let inputs = factory.constructor_inputs();
    let (args, overrides) = split_overrides(args, inputs.len())?;

    let client = factory.client();
    let resolved = resolve_addresses(Some(client.as_ref()), ArgValue::List(args), inputs).await?;
    let tokens = resolved
        .into_iter()
        .zip(inputs)
        .map(|(value, param)| tokenize(value, &param.shape))
        .collect::<Result<Vec<_>, _>>()?;

    let mut tx = factory.deploy_transaction(tokens, &overrides)?;
    apply_payload_mode(&mut tx, mode)?;

    let sent = send_and_confirm(client.as_ref(), tx, factory.required_confirmations()).await?;

    let address = InitCodeFactory::<M>::contract_address(sent.sender, sent.nonce);
    if let Some(reported) = sent.receipt.contract_address {
        if reported != address {
            warn!(%reported, derived = %address, "Receipt contract address differs from the CREATE derivation");
        }
    }

    info!(%address, tx_hash = ?sent.receipt.transaction_hash, ?mode, "✅ Contract deployed");
    Ok(Deployment { contract: factory.attach(address), receipt: sent.receipt })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ethers::{
        abi::Token,
        providers::{MockProvider, Provider},
        types::{Bytes, Transaction, TransactionRequest, H256, U256, U64},
        utils::get_contract_address,
    };
    use serde_json::json;
    use std::{sync::Arc, time::Duration};

    fn factory_with_two_params() -> InitCodeFactory<Provider<MockProvider>> {
        let abi = json!([
            { "type": "constructor", "inputs": [
                { "name": "value", "type": "uint256" },
                { "name": "prefix", "type": "string" }
            ] }
        ]);
        let (provider, _mock) = Provider::mocked();
        InitCodeFactory::new(&abi, Bytes::from(vec![0x60, 0x80]), Arc::new(provider)).unwrap()
    }

    #[test]
    fn splice_prepends_the_dropper() {
        for payload in ["0x", "0x00", "0x6080604052348015600f57600080fd5b50"] {
            let spliced = splice_init_code_dropper(payload).unwrap();
            assert_eq!(spliced, format!("0x600d80380380916000396000f3{}", &payload[2..]));
        }

        let long = format!("0x{}", "ab".repeat(4096));
        assert_eq!(splice_init_code_dropper(&long).unwrap().len(), INIT_CODE_DROPPER.len() + 8192);

        let err = splice_init_code_dropper("6080").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn dropper_offset_matches_its_length() {
        let dropper = hex::decode(&INIT_CODE_DROPPER[2..]).unwrap();
        // PUSH1 <offset> must point just past the dropper itself
        assert_eq!(dropper[0], 0x60);
        assert_eq!(dropper[1] as usize, dropper.len());
    }

    #[test]
    fn payload_mode_rewrites_only_init_code() {
        let original: TypedTransaction = TransactionRequest::new().data(Bytes::from(vec![0xaa, 0xbb])).into();

        let mut standard = original.clone();
        apply_payload_mode(&mut standard, PayloadMode::Standard).unwrap();
        assert_eq!(standard, original);

        let mut init = original.clone();
        apply_payload_mode(&mut init, PayloadMode::InitCode).unwrap();
        let mut expected = hex::decode(&INIT_CODE_DROPPER[2..]).unwrap();
        expected.extend([0xaa, 0xbb]);
        assert_eq!(init.data(), Some(&Bytes::from(expected)));
    }

    #[test]
    fn overrides_split_by_argument_count() {
        let (args, overrides) = split_overrides(vec![1u64.into(), "a".into()], 2).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(overrides, Overrides::default());

        let with_value = Overrides::default().value(10u64);
        let (args, overrides) =
            split_overrides(vec![1u64.into(), "a".into(), with_value.clone().into()], 2).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(overrides, with_value);

        let (args, overrides) = split_overrides(vec![Overrides::default().gas(1u64).into()], 0).unwrap();
        assert!(args.is_empty());
        assert_eq!(overrides.gas, Some(1u64.into()));
    }

    #[test]
    fn wrong_argument_counts_are_rejected() {
        for count in [0usize, 1, 4, 5] {
            let args = (0..count).map(|i| ArgValue::from(i as u64)).collect();
            let err = split_overrides(args, 2).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "count {}", count);
        }

        // one extra, but not an overrides object
        let err = split_overrides(vec![1u64.into(), "a".into(), "b".into()], 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn deploy_init_code_fails_fast_on_bad_arguments() {
        let factory = factory_with_two_params();

        let err = deploy_init_code(&factory, vec![456u64.into()]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = deploy_init_code(&factory, vec!["not a number".into(), "prefix".into()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = deploy(&factory, vec![456u64.into(), 7u64.into()]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn deploy_init_code_sends_the_spliced_payload() {
        let abi = json!([
            { "type": "constructor", "stateMutability": "payable", "inputs": [
                { "name": "seed", "type": "uint256" }
            ] }
        ]);
        let (provider, mock) = Provider::mocked();
        let client = Arc::new(provider.interval(Duration::from_millis(1)));
        let bytecode = Bytes::from(vec![0x60, 0x0a, 0x60, 0x0c]);
        let factory = InitCodeFactory::new(&abi, bytecode.clone(), client).unwrap();

        let sender = Address::repeat_byte(0x11);
        let nonce = U256::from(7);
        let gas = U256::from(90_000);
        let tx_hash = H256::repeat_byte(0xaa);
        let expected_address = get_contract_address(sender, nonce);

        let receipt = TransactionReceipt {
            transaction_hash: tx_hash,
            block_number: Some(U64::from(1)),
            status: Some(U64::from(1)),
            contract_address: Some(expected_address),
            ..Default::default()
        };
        let mined = Transaction { hash: tx_hash, block_number: Some(U64::from(1)), ..Default::default() };

        // responses are served last-in first-out
        mock.push::<TransactionReceipt, _>(receipt).unwrap();
        mock.push::<Transaction, _>(mined).unwrap();
        mock.push::<H256, _>(tx_hash).unwrap();
        mock.push::<U256, _>(gas).unwrap();
        mock.push::<U256, _>(nonce).unwrap();

        let overrides = Overrides::default().from(sender).value(5u64).gas_price(1u64);
        let deployment = deploy_init_code(&factory, vec![ArgValue::from(7u64), overrides.into()])
            .await
            .unwrap();

        assert_eq!(deployment.address(), expected_address);
        assert_eq!(deployment.deploy_transaction().transaction_hash, tx_hash);

        let mut payload = format!("0x{}", hex::encode(&bytecode));
        payload.push_str(&hex::encode(ethers::abi::encode(&[Token::Uint(U256::from(7))])));
        let spliced = splice_init_code_dropper(&payload).unwrap();
        assert!(spliced.starts_with(INIT_CODE_DROPPER));

        let unfilled: TypedTransaction = TransactionRequest::new()
            .from(sender)
            .data(decode_hex_bytecode(&spliced).unwrap())
            .value(5u64)
            .gas_price(1u64)
            .nonce(nonce)
            .into();
        let mut sent = unfilled.clone();
        sent.set_gas(gas);

        mock.assert_request("eth_getTransactionCount", [json!(sender), json!("latest")]).unwrap();
        mock.assert_request("eth_estimateGas", [&unfilled]).unwrap();
        mock.assert_request("eth_sendTransaction", [&sent]).unwrap();
        mock.assert_request("eth_getTransactionByHash", [tx_hash]).unwrap();
        mock.assert_request("eth_getTransactionReceipt", [tx_hash]).unwrap();
    }
}
