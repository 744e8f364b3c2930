// deployer/src/bindings.rs
#![allow(clippy::all)]
use ethers::prelude::abigen;

// The CREATE2 factory. `getAddrFromSalt(salt, true)` predicts the address used by
// `deployFromInitCode`, `false` the one used by `deployFromFinalCode`.
abigen!(
    AnyCode,
    r#"[
        function getAddrFromSalt(uint256 salt, bool fromInitCode) external view returns (address)
        function deployFromFinalCode(bytes finalCode, uint256 salt) external
        function deployFromInitCode(address initCodeHolder, uint256 salt) external payable
        function lastAddress() external view returns (address)
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

abigen!(
    Simple,
    r#"[
        function setValue(uint256 newValue) external
        function value() external view returns (uint256)
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

abigen!(
    SimpleWithCons,
    r#"[
        function value() external view returns (uint256)
        function consoleLog(string message) external
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

// END OF FILE: deployer/src/bindings.rs
