use ethers::{
    contract::{abigen, EthCall},
    types::Selector,
};
use lazy_static::lazy_static;
use std::collections::HashMap;

abigen!(
    EntryPointAPI,
    r#"[
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce)
        error FailedOp(uint256 opIndex, string reason)
        error FailedOpWithRevert(uint256 opIndex, string reason, bytes inner)
    ]"#
);

abigen!(
    SmartAccountAPI,
    r#"[
        struct Call {address target;uint256 value;bytes data;}
        function execute(address target,uint256 value,bytes data) external payable returns (bytes result)
        function executeBatch(Call[] calls) external payable returns (bytes[] results)
    ]"#
);

abigen!(
    SoladyFactoryAPI,
    r#"[
        function createAccount(address owner,bytes32 salt) external payable returns (address)
        function getAddress(bytes32 salt) external view returns (address)
    ]"#
);

lazy_static! {
    pub static ref SELECTORS_NAMES: HashMap<Selector, String> = {
        let mut map = HashMap::new();
        // entry point
        map.insert(
            entry_point_api::GetNonceCall::selector(),
            entry_point_api::GetNonceCall::function_name().into(),
        );
        // account
        map.insert(
            smart_account_api::ExecuteCall::selector(),
            smart_account_api::ExecuteCall::function_name().into(),
        );
        map.insert(
            smart_account_api::ExecuteBatchCall::selector(),
            smart_account_api::ExecuteBatchCall::function_name().into(),
        );
        // factory
        map.insert(
            solady_factory_api::CreateAccountCall::selector(),
            solady_factory_api::CreateAccountCall::function_name().into(),
        );
        map.insert(
            solady_factory_api::GetAddressCall::selector(),
            solady_factory_api::GetAddressCall::function_name().into(),
        );

        map
    };
}
