//! User operation layout of entry point 0.7 and 0.8 and its packed (on-chain) form

use super::UserOperationHash;
use crate::{
    authorization::SignedAuthorization,
    constants::{account::EIP7702_FACTORY, eip712},
    utils::{
        as_checksum_addr, as_checksum_addr_opt, pack_factory_data, pack_paymaster_data,
        pack_uint128, unpack_factory_data, unpack_paymaster_data, unpack_uint128, PackError,
        PaymasterFields,
    },
};
use ethers::{
    abi::{encode, AbiEncode, Token},
    contract::{EthAbiCodec, EthAbiType},
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
use serde::{Deserialize, Serialize};

/// User operation (entry point 0.7 and 0.8): factory and paymaster fields are split out
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationV0_7 {
    /// Sender of the user operation
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,

    /// Nonce (key in the high 192 bits, sequence in the low 64 bits)
    pub nonce: U256,

    /// Account factory (only for new accounts)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "as_checksum_addr_opt"
    )]
    pub factory: Option<Address>,

    /// Data for the account factory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<Bytes>,

    /// The data that is passed to the sender during the main execution call
    pub call_data: Bytes,

    /// The amount of gas to allocate for the main execution call
    pub call_gas_limit: U256,

    /// The amount of gas to allocate for the verification step
    pub verification_gas_limit: U256,

    /// Extra gas to pay the bundler
    pub pre_verification_gas: U256,

    /// Maximum fee per gas (similar to EIP-1559)
    pub max_fee_per_gas: U256,

    /// Maximum priority fee per gas (similar to EIP-1559)
    pub max_priority_fee_per_gas: U256,

    /// Address of the paymaster contract
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "as_checksum_addr_opt"
    )]
    pub paymaster: Option<Address>,

    /// The amount of gas to allocate for the paymaster validation code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,

    /// The amount of gas to allocate for the paymaster post-operation code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,

    /// Data for the paymaster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<Bytes>,

    /// Data passed to the account along with the nonce during the verification step
    pub signature: Bytes,

    /// EIP-7702 authorization of a delegated sender
    #[serde(default, rename = "eip7702Auth", skip_serializing_if = "Option::is_none")]
    pub authorization: Option<SignedAuthorization>,
}

/// Packed user operation (the EntryPoint ABI form of entry point 0.7 and 0.8)
#[derive(Default, Clone, Debug, PartialEq, Eq, EthAbiCodec, EthAbiType)]
pub struct PackedUserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    /// verificationGasLimit (16 bytes) || callGasLimit (16 bytes)
    pub account_gas_limits: [u8; 32],
    pub pre_verification_gas: U256,
    /// maxPriorityFeePerGas (16 bytes) || maxFeePerGas (16 bytes)
    pub gas_fees: [u8; 32],
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

impl UserOperationV0_7 {
    /// Paymaster fields (if a paymaster is set). Missing gas limits count as zero.
    pub fn paymaster_fields(&self) -> Option<PaymasterFields> {
        self.paymaster.map(|paymaster| PaymasterFields {
            paymaster,
            paymaster_verification_gas_limit: self
                .paymaster_verification_gas_limit
                .unwrap_or_default(),
            paymaster_post_op_gas_limit: self.paymaster_post_op_gas_limit.unwrap_or_default(),
            paymaster_data: self.paymaster_data.clone().unwrap_or_default(),
        })
    }

    /// Whether the factory is the EIP-7702 marker (delegated EOA)
    pub fn is_eip7702(&self) -> bool {
        self.factory.is_some_and(|factory| {
            EIP7702_FACTORY.parse::<Address>().is_ok_and(|marker| marker == factory)
        })
    }

    /// Init code (factory || factory data)
    pub fn init_code(&self) -> Bytes {
        pack_factory_data(self.factory, self.factory_data.as_ref())
    }

    /// Init code as hashed by entry point 0.8: a delegated EOA commits to its delegation
    /// target instead of the 0x7702 marker
    fn init_code_for_hash(&self) -> Bytes {
        match &self.authorization {
            Some(authorization) if self.is_eip7702() => {
                pack_factory_data(Some(authorization.address), self.factory_data.as_ref())
            }
            _ => self.init_code(),
        }
    }

    /// Packs the user operation into the EntryPoint ABI form
    pub fn pack(&self) -> Result<PackedUserOperation, PackError> {
        Ok(PackedUserOperation {
            sender: self.sender,
            nonce: self.nonce,
            init_code: self.init_code(),
            call_data: self.call_data.clone(),
            account_gas_limits: pack_uint128(
                ("verificationGasLimit", self.verification_gas_limit),
                ("callGasLimit", self.call_gas_limit),
            )?,
            pre_verification_gas: self.pre_verification_gas,
            gas_fees: pack_uint128(
                ("maxPriorityFeePerGas", self.max_priority_fee_per_gas),
                ("maxFeePerGas", self.max_fee_per_gas),
            )?,
            paymaster_and_data: pack_paymaster_data(self.paymaster_fields().as_ref())?,
            signature: self.signature.clone(),
        })
    }

    /// ABI encoding of the packed user operation without signature, dynamic fields hashed
    fn encode_for_hash(&self, init_code: &Bytes) -> Result<Vec<Token>, PackError> {
        let packed = self.pack()?;
        Ok(vec![
            Token::Address(packed.sender),
            Token::Uint(packed.nonce),
            Token::FixedBytes(keccak256(init_code).to_vec()),
            Token::FixedBytes(keccak256(&packed.call_data).to_vec()),
            Token::FixedBytes(packed.account_gas_limits.to_vec()),
            Token::Uint(packed.pre_verification_gas),
            Token::FixedBytes(packed.gas_fees.to_vec()),
            Token::FixedBytes(keccak256(&packed.paymaster_and_data).to_vec()),
        ])
    }

    /// Calculates the hash of the user operation (entry point 0.7)
    pub fn hash_v0_7(
        &self,
        entry_point: &Address,
        chain_id: u64,
    ) -> Result<UserOperationHash, PackError> {
        let inner = keccak256(encode(&self.encode_for_hash(&self.init_code())?));
        Ok(H256::from(keccak256(
            [inner.to_vec(), entry_point.encode(), U256::from(chain_id).encode()].concat(),
        ))
        .into())
    }

    /// Calculates the hash of the user operation (entry point 0.8, EIP-712 typed data digest)
    pub fn hash_v0_8(
        &self,
        entry_point: &Address,
        chain_id: u64,
    ) -> Result<UserOperationHash, PackError> {
        let mut struct_tokens = vec![Token::FixedBytes(
            keccak256(eip712::PACKED_USER_OPERATION_TYPE).to_vec(),
        )];
        struct_tokens.extend(self.encode_for_hash(&self.init_code_for_hash())?);
        let struct_hash = keccak256(encode(&struct_tokens));

        let domain_separator = keccak256(encode(&[
            Token::FixedBytes(keccak256(eip712::DOMAIN_TYPE).to_vec()),
            Token::FixedBytes(keccak256(eip712::DOMAIN_NAME).to_vec()),
            Token::FixedBytes(keccak256(eip712::DOMAIN_VERSION).to_vec()),
            Token::Uint(U256::from(chain_id)),
            Token::Address(*entry_point),
        ]));

        Ok(H256::from(keccak256(
            [&[0x19, 0x01][..], &domain_separator[..], &struct_hash[..]].concat(),
        ))
        .into())
    }

    // Builder pattern helpers

    /// Sets the sender of the user operation
    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = sender;
        self
    }

    /// Sets the nonce of the user operation
    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets the factory and factory data of the user operation
    pub fn factory(mut self, factory: Address, factory_data: Bytes) -> Self {
        self.factory = Some(factory);
        self.factory_data = Some(factory_data);
        self
    }

    /// Sets the call data of the user operation
    pub fn call_data(mut self, call_data: Bytes) -> Self {
        self.call_data = call_data;
        self
    }

    /// Sets the gas limits of the user operation
    pub fn gas_limits(
        mut self,
        call_gas_limit: U256,
        verification_gas_limit: U256,
        pre_verification_gas: U256,
    ) -> Self {
        self.call_gas_limit = call_gas_limit;
        self.verification_gas_limit = verification_gas_limit;
        self.pre_verification_gas = pre_verification_gas;
        self
    }

    /// Sets the fees of the user operation
    pub fn fees(mut self, max_fee_per_gas: U256, max_priority_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = max_fee_per_gas;
        self.max_priority_fee_per_gas = max_priority_fee_per_gas;
        self
    }

    /// Sets the paymaster fields of the user operation
    pub fn paymaster(mut self, fields: PaymasterFields) -> Self {
        self.paymaster = Some(fields.paymaster);
        self.paymaster_verification_gas_limit = Some(fields.paymaster_verification_gas_limit);
        self.paymaster_post_op_gas_limit = Some(fields.paymaster_post_op_gas_limit);
        self.paymaster_data = Some(fields.paymaster_data);
        self
    }

    /// Sets the signature of the user operation
    pub fn signature(mut self, signature: Bytes) -> Self {
        self.signature = signature;
        self
    }

    /// Sets the EIP-7702 authorization of the user operation
    pub fn authorization(mut self, authorization: SignedAuthorization) -> Self {
        self.authorization = Some(authorization);
        self
    }
}

impl PackedUserOperation {
    /// Unpacks into the logical user operation. No paymaster (empty or zero) unpacks to `None`.
    pub fn unpack(&self) -> Result<UserOperationV0_7, PackError> {
        let (verification_gas_limit, call_gas_limit) = unpack_uint128(&self.account_gas_limits);
        let (max_priority_fee_per_gas, max_fee_per_gas) = unpack_uint128(&self.gas_fees);
        let (factory, factory_data) = match unpack_factory_data(&self.init_code)? {
            Some((factory, factory_data)) => (Some(factory), Some(factory_data)),
            None => (None, None),
        };
        let paymaster = unpack_paymaster_data(&self.paymaster_and_data)?;
        Ok(UserOperationV0_7 {
            sender: self.sender,
            nonce: self.nonce,
            factory,
            factory_data,
            call_data: self.call_data.clone(),
            call_gas_limit,
            verification_gas_limit,
            pre_verification_gas: self.pre_verification_gas,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            paymaster: paymaster.as_ref().map(|p| p.paymaster),
            paymaster_verification_gas_limit: paymaster
                .as_ref()
                .map(|p| p.paymaster_verification_gas_limit),
            paymaster_post_op_gas_limit: paymaster.as_ref().map(|p| p.paymaster_post_op_gas_limit),
            paymaster_data: paymaster.map(|p| p.paymaster_data),
            signature: self.signature.clone(),
            authorization: None,
        })
    }
}
