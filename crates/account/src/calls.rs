//! `execute` / `executeBatch` call data shared by the account implementations

use crate::error::AccountError;
use ethers::{
    abi::{AbiDecode, AbiEncode},
    contract::EthCall,
    types::{Bytes, Selector},
};
use userop_contracts::{smart_account_api, SmartAccountAPICalls};
use userop_primitives::Call;

/// Encodes calls as `execute` (exactly one call) or `executeBatch`
pub fn encode_calls(calls: &[Call]) -> Bytes {
    match calls {
        [call] => SmartAccountAPICalls::Execute(smart_account_api::ExecuteCall {
            target: call.to,
            value: call.value,
            data: call.data.clone(),
        })
        .encode()
        .into(),
        _ => SmartAccountAPICalls::ExecuteBatch(smart_account_api::ExecuteBatchCall {
            calls: calls
                .iter()
                .map(|call| smart_account_api::Call {
                    target: call.to,
                    value: call.value,
                    data: call.data.clone(),
                })
                .collect(),
        })
        .encode()
        .into(),
    }
}

/// Decodes `execute` / `executeBatch` call data back into calls
pub fn decode_calls(data: &Bytes) -> Result<Vec<Call>, AccountError> {
    let selector: Selector = data
        .get(..4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| AccountError::Decode {
            inner: format!("call data {data} has no selector"),
        })?;

    if selector != smart_account_api::ExecuteCall::selector() &&
        selector != smart_account_api::ExecuteBatchCall::selector()
    {
        return Err(AccountError::UnsupportedSelector { selector });
    }

    match SmartAccountAPICalls::decode(data)
        .map_err(|e| AccountError::Decode { inner: e.to_string() })?
    {
        SmartAccountAPICalls::Execute(call) => {
            Ok(vec![Call::new(call.target).value(call.value).data(call.data)])
        }
        SmartAccountAPICalls::ExecuteBatch(batch) => Ok(batch
            .calls
            .into_iter()
            .map(|call| Call::new(call.target).value(call.value).data(call.data))
            .collect()),
    }
}
