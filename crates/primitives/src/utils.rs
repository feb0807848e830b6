//! Misc utils (serde helpers, fixed-width packing of user operation fields)

use ethers::{
    types::{Address, Bytes, U256},
    utils::to_checksum,
};
use thiserror::Error;

/// Converts address to checksum address
pub fn as_checksum_addr<S>(val: &Address, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&to_checksum(val, None))
}

/// Converts Option address to checksum
pub fn as_checksum_addr_opt<S>(val: &Option<Address>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if let Some(addr) = val {
        s.serialize_str(&to_checksum(addr, None))
    } else {
        s.serialize_none()
    }
}

/// If possible, parses address from the first 20 bytes
pub fn get_address(buf: &[u8]) -> Option<Address> {
    if buf.len() >= 20 {
        Some(Address::from_slice(&buf[0..20]))
    } else {
        None
    }
}

/// Errors when packing or unpacking user operation fields
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PackError {
    /// Value does not fit into the 16 bytes reserved for it
    #[error("{field} value {value} does not fit into 128 bits")]
    Uint128Overflow {
        /// Name of the packed field
        field: &'static str,
        /// The offending value
        value: U256,
    },

    /// Buffer is shorter than its fixed-width components
    #[error("{field} is too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Name of the packed field
        field: &'static str,
        /// Minimum length
        expected: usize,
        /// Actual length
        actual: usize,
    },
}

fn to_uint128(field: &'static str, value: U256) -> Result<[u8; 16], PackError> {
    if value.bits() > 128 {
        return Err(PackError::Uint128Overflow { field, value });
    }
    let mut tem = [0u8; 32];
    value.to_big_endian(&mut tem);
    let mut res = [0u8; 16];
    res.copy_from_slice(&tem[16..32]);
    Ok(res)
}

/// Packs two uint128 (high, low) into 32 bytes. Fails if any of them overflows 128 bits.
pub fn pack_uint128(
    (high_field, high): (&'static str, U256),
    (low_field, low): (&'static str, U256),
) -> Result<[u8; 32], PackError> {
    let mut res = [0u8; 32];
    res[0..16].copy_from_slice(&to_uint128(high_field, high)?);
    res[16..32].copy_from_slice(&to_uint128(low_field, low)?);
    Ok(res)
}

/// Unpacks two uint128 from 32 bytes
pub fn unpack_uint128(buf: &[u8; 32]) -> (U256, U256) {
    (U256::from_big_endian(&buf[0..16]), U256::from_big_endian(&buf[16..32]))
}

/// Paymaster fields of the packed layout (entry point 0.7 and later)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaymasterFields {
    pub paymaster: Address,
    pub paymaster_verification_gas_limit: U256,
    pub paymaster_post_op_gas_limit: U256,
    pub paymaster_data: Bytes,
}

/// Packs paymaster || verification gas (16 bytes) || post-op gas (16 bytes) || data.
/// No paymaster packs to empty bytes.
pub fn pack_paymaster_data(fields: Option<&PaymasterFields>) -> Result<Bytes, PackError> {
    match fields {
        Some(fields) if !fields.paymaster.is_zero() => {
            let gas_data = pack_uint128(
                ("paymasterVerificationGasLimit", fields.paymaster_verification_gas_limit),
                ("paymasterPostOpGasLimit", fields.paymaster_post_op_gas_limit),
            )?;
            Ok([fields.paymaster.as_bytes(), &gas_data[..], &fields.paymaster_data[..]]
                .concat()
                .into())
        }
        _ => Ok(Bytes::default()),
    }
}

/// Unpacks paymaster fields. Empty bytes (or a zero paymaster) mean no paymaster.
pub fn unpack_paymaster_data(buf: &[u8]) -> Result<Option<PaymasterFields>, PackError> {
    if buf.is_empty() {
        return Ok(None);
    }
    if buf.len() < 52 {
        return Err(PackError::TooShort {
            field: "paymasterAndData",
            expected: 52,
            actual: buf.len(),
        });
    }
    let paymaster = Address::from_slice(&buf[0..20]);
    if paymaster.is_zero() {
        return Ok(None);
    }
    let mut gas = [0u8; 32];
    gas.copy_from_slice(&buf[20..52]);
    let (paymaster_verification_gas_limit, paymaster_post_op_gas_limit) = unpack_uint128(&gas);
    Ok(Some(PaymasterFields {
        paymaster,
        paymaster_verification_gas_limit,
        paymaster_post_op_gas_limit,
        paymaster_data: Bytes::from(buf[52..].to_vec()),
    }))
}

/// Packs factory || factory data. No factory packs to empty bytes.
pub fn pack_factory_data(factory: Option<Address>, factory_data: Option<&Bytes>) -> Bytes {
    match factory {
        Some(factory) if !factory.is_zero() => [
            factory.as_bytes(),
            factory_data.map(|data| &data[..]).unwrap_or_default(),
        ]
        .concat()
        .into(),
        _ => Bytes::default(),
    }
}

/// Splits init code into factory and factory data
pub fn unpack_factory_data(init_code: &[u8]) -> Result<Option<(Address, Bytes)>, PackError> {
    if init_code.is_empty() {
        return Ok(None);
    }
    match get_address(init_code) {
        Some(factory) => Ok(Some((factory, Bytes::from(init_code[20..].to_vec())))),
        None => Err(PackError::TooShort {
            field: "initCode",
            expected: 20,
            actual: init_code.len(),
        }),
    }
}
