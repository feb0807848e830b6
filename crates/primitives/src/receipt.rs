//! User operation receipts: the wire form returned by bundlers and its normalized form

use crate::{user_operation::UserOperationHash, utils::as_checksum_addr};
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors when normalizing a wire receipt
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReceiptError {
    #[error("{field} is not a valid hex quantity: {value:?}")]
    InvalidQuantity { field: &'static str, value: String },
    #[error("{field} does not fit into 64 bits: {value}")]
    QuantityOverflow { field: &'static str, value: String },
    #[error("unknown transaction type {0}")]
    UnknownTransactionType(String),
}

/// Receipt of the user operation as returned from the RPC endpoint eth_getUserOperationReceipt
/// (integers are hex quantities)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUserOperationReceipt {
    #[serde(rename = "userOpHash")]
    pub user_operation_hash: UserOperationHash,
    pub entry_point: Address,
    pub sender: Address,
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    pub actual_gas_cost: String,
    pub actual_gas_used: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub logs: Vec<RawLog>,
    pub receipt: RawTransactionReceipt,
}

/// Log as returned on the wire
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
    #[serde(default)]
    pub block_hash: Option<H256>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<H256>,
    #[serde(default)]
    pub transaction_index: Option<String>,
    #[serde(default)]
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: Option<bool>,
}

/// Transaction receipt as returned on the wire
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionReceipt {
    pub transaction_hash: H256,
    pub transaction_index: String,
    pub block_hash: H256,
    pub block_number: String,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    pub cumulative_gas_used: String,
    pub gas_used: String,
    #[serde(default)]
    pub effective_gas_price: Option<String>,
    #[serde(default)]
    pub blob_gas_price: Option<String>,
    #[serde(default)]
    pub blob_gas_used: Option<String>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    pub logs: Vec<RawLog>,
    pub logs_bloom: Bytes,
    pub status: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
}

/// Outcome of the bundle transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Envelope type of the bundle transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Legacy,
    Eip2930,
    Eip1559,
    Eip4844,
    Eip7702,
}

impl TransactionType {
    fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Legacy),
            1 => Some(Self::Eip2930),
            2 => Some(Self::Eip1559),
            3 => Some(Self::Eip4844),
            4 => Some(Self::Eip7702),
            _ => None,
        }
    }
}

/// Normalized receipt of the user operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    #[serde(rename = "userOpHash")]
    pub user_operation_hash: UserOperationHash,
    #[serde(serialize_with = "as_checksum_addr")]
    pub entry_point: Address,
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,
    pub nonce: U256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    pub actual_gas_cost: U256,
    pub actual_gas_used: U256,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub logs: Vec<Log>,
    pub receipt: TransactionReceipt,
}

/// Normalized log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
    pub block_hash: Option<H256>,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<H256>,
    pub transaction_index: Option<u64>,
    pub log_index: Option<u64>,
    pub removed: bool,
}

/// Normalized transaction receipt of the bundle transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: H256,
    pub transaction_index: u64,
    pub block_hash: H256,
    pub block_number: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub cumulative_gas_used: U256,
    pub gas_used: U256,
    pub effective_gas_price: Option<U256>,
    pub blob_gas_price: Option<U256>,
    pub blob_gas_used: Option<U256>,
    pub contract_address: Option<Address>,
    pub logs: Vec<Log>,
    pub logs_bloom: Bytes,
    pub status: ReceiptStatus,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
}

fn parse_u256(field: &'static str, value: &str) -> Result<U256, ReceiptError> {
    let invalid = || ReceiptError::InvalidQuantity { field, value: value.to_owned() };
    let digits = value.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.is_empty() {
        return Err(invalid());
    }
    U256::from_str_radix(digits, 16).map_err(|_| invalid())
}

fn parse_u64(field: &'static str, value: &str) -> Result<u64, ReceiptError> {
    let quantity = parse_u256(field, value)?;
    if quantity.bits() > 64 {
        return Err(ReceiptError::QuantityOverflow { field, value: value.to_owned() });
    }
    Ok(quantity.as_u64())
}

fn parse_opt<T>(
    field: &'static str,
    value: Option<&String>,
    parse: fn(&'static str, &str) -> Result<T, ReceiptError>,
) -> Result<Option<T>, ReceiptError> {
    value.map(|value| parse(field, value)).transpose()
}

impl RawLog {
    pub fn normalize(self) -> Result<Log, ReceiptError> {
        Ok(Log {
            block_number: parse_opt("blockNumber", self.block_number.as_ref(), parse_u64)?,
            transaction_index: parse_opt(
                "transactionIndex",
                self.transaction_index.as_ref(),
                parse_u64,
            )?,
            log_index: parse_opt("logIndex", self.log_index.as_ref(), parse_u64)?,
            address: self.address,
            topics: self.topics,
            data: self.data,
            block_hash: self.block_hash,
            transaction_hash: self.transaction_hash,
            removed: self.removed.unwrap_or_default(),
        })
    }
}

impl RawTransactionReceipt {
    pub fn normalize(self) -> Result<TransactionReceipt, ReceiptError> {
        let type_code = parse_u64("type", &self.transaction_type)?;
        let transaction_type = TransactionType::from_code(type_code)
            .ok_or_else(|| ReceiptError::UnknownTransactionType(self.transaction_type.clone()))?;
        let status = if parse_u64("status", &self.status)? == 1 {
            ReceiptStatus::Success
        } else {
            ReceiptStatus::Reverted
        };
        Ok(TransactionReceipt {
            transaction_hash: self.transaction_hash,
            transaction_index: parse_u64("transactionIndex", &self.transaction_index)?,
            block_hash: self.block_hash,
            block_number: parse_u64("blockNumber", &self.block_number)?,
            from: self.from,
            to: self.to,
            cumulative_gas_used: parse_u256("cumulativeGasUsed", &self.cumulative_gas_used)?,
            gas_used: parse_u256("gasUsed", &self.gas_used)?,
            effective_gas_price: parse_opt(
                "effectiveGasPrice",
                self.effective_gas_price.as_ref(),
                parse_u256,
            )?,
            blob_gas_price: parse_opt("blobGasPrice", self.blob_gas_price.as_ref(), parse_u256)?,
            blob_gas_used: parse_opt("blobGasUsed", self.blob_gas_used.as_ref(), parse_u256)?,
            contract_address: self.contract_address,
            logs: self.logs.into_iter().map(RawLog::normalize).collect::<Result<_, _>>()?,
            logs_bloom: self.logs_bloom,
            status,
            transaction_type,
        })
    }
}

impl RawUserOperationReceipt {
    /// Converts every hex quantity into an integer. Malformed quantities fail, they never
    /// default to zero.
    pub fn normalize(self) -> Result<UserOperationReceipt, ReceiptError> {
        Ok(UserOperationReceipt {
            user_operation_hash: self.user_operation_hash,
            entry_point: self.entry_point,
            sender: self.sender,
            nonce: parse_u256("nonce", &self.nonce)?,
            paymaster: self.paymaster,
            actual_gas_cost: parse_u256("actualGasCost", &self.actual_gas_cost)?,
            actual_gas_used: parse_u256("actualGasUsed", &self.actual_gas_used)?,
            success: self.success,
            reason: self.reason,
            logs: self.logs.into_iter().map(RawLog::normalize).collect::<Result<_, _>>()?,
            receipt: self.receipt.normalize()?,
        })
    }
}

impl TryFrom<RawUserOperationReceipt> for UserOperationReceipt {
    type Error = ReceiptError;

    fn try_from(value: RawUserOperationReceipt) -> Result<Self, Self::Error> {
        value.normalize()
    }
}
