//! User operation request (optional fields)

use super::{UserOperation, UserOperationV0_6, UserOperationV0_7};
use crate::{
    authorization::SignedAuthorization,
    call::Call,
    entry_point::EntryPointVersion,
    utils::{
        as_checksum_addr_opt, pack_factory_data, unpack_factory_data, unpack_paymaster_data,
        PackError, PaymasterFields,
    },
};
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// User operation with all fields being optional
///
/// Carries the union of the fields of every entry point version; it is converted into a
/// [UserOperation](super::UserOperation) of a concrete version once all fields are resolved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationRequest {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "as_checksum_addr_opt"
    )]
    pub sender: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
    /// Nonce key (192 bits) used when the nonce has to be fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce_key: Option<U256>,
    /// Calls to encode with the smart account (takes precedence over `call_data`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calls: Option<Vec<Call>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_code: Option<Bytes>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "as_checksum_addr_opt"
    )]
    pub factory: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_verification_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_and_data: Option<Bytes>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "as_checksum_addr_opt"
    )]
    pub paymaster: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Bytes>,
    #[serde(default, rename = "eip7702Auth", skip_serializing_if = "Option::is_none")]
    pub authorization: Option<SignedAuthorization>,
    /// Context passed to the paymaster web service (overrides the client's context)
    #[serde(skip)]
    pub paymaster_context: Option<serde_json::Value>,
}

impl UserOperationRequest {
    /// Whether the request already carries deployment data (init code or factory and data)
    pub fn has_factory(&self) -> bool {
        self.init_code.is_some() || (self.factory.is_some() && self.factory_data.is_some())
    }

    /// Whether the request already carries paymaster data in any layout
    pub fn has_paymaster(&self) -> bool {
        self.paymaster_and_data.is_some() || self.paymaster.is_some()
    }

    /// Whether any gas limit still has to be estimated
    pub fn needs_gas(&self) -> bool {
        self.call_gas_limit.is_none() ||
            self.verification_gas_limit.is_none() ||
            self.pre_verification_gas.is_none() ||
            (self.paymaster.is_some() &&
                (self.paymaster_verification_gas_limit.is_none() ||
                    self.paymaster_post_op_gas_limit.is_none()))
    }

    /// Factory of the request in any layout
    pub fn factory_address(&self) -> Option<Address> {
        self.factory.or_else(|| {
            self.init_code
                .as_ref()
                .and_then(|init_code| unpack_factory_data(init_code).ok().flatten())
                .map(|(factory, _)| factory)
        })
    }

    /// Converts the request into a user operation of the given version. Missing numeric fields
    /// become zero and missing byte fields become empty.
    pub fn into_user_operation(
        self,
        version: EntryPointVersion,
    ) -> Result<UserOperation, PackError> {
        match version {
            EntryPointVersion::V0_6 => Ok(UserOperation::V0_6(self.into_v0_6())),
            EntryPointVersion::V0_7 => Ok(UserOperation::V0_7(self.into_v0_7()?)),
            EntryPointVersion::V0_8 => Ok(UserOperation::V0_8(self.into_v0_7()?)),
        }
    }

    fn into_v0_6(self) -> UserOperationV0_6 {
        let init_code = self
            .init_code
            .unwrap_or_else(|| pack_factory_data(self.factory, self.factory_data.as_ref()));
        // 0.6 has no paymaster gas limits: paymaster || paymaster data
        let paymaster_and_data = self
            .paymaster_and_data
            .unwrap_or_else(|| pack_factory_data(self.paymaster, self.paymaster_data.as_ref()));
        UserOperationV0_6 {
            sender: self.sender.unwrap_or_default(),
            nonce: self.nonce.unwrap_or_default(),
            init_code,
            call_data: self.call_data.unwrap_or_default(),
            call_gas_limit: self.call_gas_limit.unwrap_or_default(),
            verification_gas_limit: self.verification_gas_limit.unwrap_or_default(),
            pre_verification_gas: self.pre_verification_gas.unwrap_or_default(),
            max_fee_per_gas: self.max_fee_per_gas.unwrap_or_default(),
            max_priority_fee_per_gas: self.max_priority_fee_per_gas.unwrap_or_default(),
            paymaster_and_data,
            signature: self.signature.unwrap_or_default(),
        }
    }

    fn into_v0_7(self) -> Result<UserOperationV0_7, PackError> {
        let (factory, factory_data) = match (self.factory, &self.init_code) {
            (None, Some(init_code)) => match unpack_factory_data(init_code)? {
                Some((factory, factory_data)) => (Some(factory), Some(factory_data)),
                None => (None, None),
            },
            _ => (self.factory, self.factory_data),
        };
        let paymaster = match (self.paymaster, &self.paymaster_and_data) {
            (None, Some(paymaster_and_data)) => unpack_paymaster_data(paymaster_and_data)?,
            (Some(paymaster), _) => Some(PaymasterFields {
                paymaster,
                paymaster_verification_gas_limit: self
                    .paymaster_verification_gas_limit
                    .unwrap_or_default(),
                paymaster_post_op_gas_limit: self.paymaster_post_op_gas_limit.unwrap_or_default(),
                paymaster_data: self.paymaster_data.unwrap_or_default(),
            }),
            (None, None) => None,
        };
        Ok(UserOperationV0_7 {
            sender: self.sender.unwrap_or_default(),
            nonce: self.nonce.unwrap_or_default(),
            factory,
            factory_data,
            call_data: self.call_data.unwrap_or_default(),
            call_gas_limit: self.call_gas_limit.unwrap_or_default(),
            verification_gas_limit: self.verification_gas_limit.unwrap_or_default(),
            pre_verification_gas: self.pre_verification_gas.unwrap_or_default(),
            max_fee_per_gas: self.max_fee_per_gas.unwrap_or_default(),
            max_priority_fee_per_gas: self.max_priority_fee_per_gas.unwrap_or_default(),
            paymaster: paymaster.as_ref().map(|p| p.paymaster),
            paymaster_verification_gas_limit: paymaster
                .as_ref()
                .map(|p| p.paymaster_verification_gas_limit),
            paymaster_post_op_gas_limit: paymaster.as_ref().map(|p| p.paymaster_post_op_gas_limit),
            paymaster_data: paymaster.map(|p| p.paymaster_data),
            signature: self.signature.unwrap_or_default(),
            authorization: self.authorization,
        })
    }

    // Builder pattern helpers

    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn nonce_key(mut self, nonce_key: U256) -> Self {
        self.nonce_key = Some(nonce_key);
        self
    }

    pub fn calls(mut self, calls: Vec<Call>) -> Self {
        self.calls = Some(calls);
        self
    }

    pub fn call(self, call: Call) -> Self {
        self.calls(vec![call])
    }

    pub fn call_data(mut self, call_data: Bytes) -> Self {
        self.call_data = Some(call_data);
        self
    }

    pub fn init_code(mut self, init_code: Bytes) -> Self {
        self.init_code = Some(init_code);
        self
    }

    pub fn factory(mut self, factory: Address, factory_data: Bytes) -> Self {
        self.factory = Some(factory);
        self.factory_data = Some(factory_data);
        self
    }

    pub fn call_gas_limit(mut self, call_gas_limit: U256) -> Self {
        self.call_gas_limit = Some(call_gas_limit);
        self
    }

    pub fn verification_gas_limit(mut self, verification_gas_limit: U256) -> Self {
        self.verification_gas_limit = Some(verification_gas_limit);
        self
    }

    pub fn pre_verification_gas(mut self, pre_verification_gas: U256) -> Self {
        self.pre_verification_gas = Some(pre_verification_gas);
        self
    }

    pub fn max_fee_per_gas(mut self, max_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self
    }

    pub fn max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: U256) -> Self {
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }

    pub fn paymaster_and_data(mut self, paymaster_and_data: Bytes) -> Self {
        self.paymaster_and_data = Some(paymaster_and_data);
        self
    }

    pub fn paymaster(mut self, paymaster: Address, paymaster_data: Bytes) -> Self {
        self.paymaster = Some(paymaster);
        self.paymaster_data = Some(paymaster_data);
        self
    }

    pub fn signature(mut self, signature: Bytes) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn authorization(mut self, authorization: SignedAuthorization) -> Self {
        self.authorization = Some(authorization);
        self
    }

    pub fn paymaster_context(mut self, paymaster_context: serde_json::Value) -> Self {
        self.paymaster_context = Some(paymaster_context);
        self
    }
}

impl From<UserOperation> for UserOperationRequest {
    fn from(user_operation: UserOperation) -> Self {
        match user_operation {
            UserOperation::V0_6(uo) => Self {
                sender: Some(uo.sender),
                nonce: Some(uo.nonce),
                call_data: Some(uo.call_data),
                init_code: Some(uo.init_code),
                call_gas_limit: Some(uo.call_gas_limit),
                verification_gas_limit: Some(uo.verification_gas_limit),
                pre_verification_gas: Some(uo.pre_verification_gas),
                max_fee_per_gas: Some(uo.max_fee_per_gas),
                max_priority_fee_per_gas: Some(uo.max_priority_fee_per_gas),
                paymaster_and_data: Some(uo.paymaster_and_data),
                signature: Some(uo.signature),
                ..Default::default()
            },
            UserOperation::V0_7(uo) | UserOperation::V0_8(uo) => Self {
                sender: Some(uo.sender),
                nonce: Some(uo.nonce),
                call_data: Some(uo.call_data),
                factory: uo.factory,
                factory_data: uo.factory_data,
                call_gas_limit: Some(uo.call_gas_limit),
                verification_gas_limit: Some(uo.verification_gas_limit),
                pre_verification_gas: Some(uo.pre_verification_gas),
                max_fee_per_gas: Some(uo.max_fee_per_gas),
                max_priority_fee_per_gas: Some(uo.max_priority_fee_per_gas),
                paymaster: uo.paymaster,
                paymaster_verification_gas_limit: uo.paymaster_verification_gas_limit,
                paymaster_post_op_gas_limit: uo.paymaster_post_op_gas_limit,
                paymaster_data: uo.paymaster_data,
                signature: Some(uo.signature),
                authorization: uo.authorization,
                ..Default::default()
            },
        }
    }
}
