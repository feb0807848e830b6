//! EIP-7702 authorizations attached to user operations of delegated accounts

use crate::constants::authorization::{STUB_R, STUB_S, STUB_Y_PARITY};
use ethers::{
    types::{Address, Signature, H256, U256, U64},
    utils::{keccak256, rlp::RlpStream},
};
use serde::{Deserialize, Serialize};

/// Magic prefix of the EIP-7702 authorization signing hash
const MAGIC: u8 = 0x05;

/// Unsigned EIP-7702 authorization (delegate `address` code to the signer account)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub chain_id: U64,
    pub address: Address,
    pub nonce: U64,
}

impl Authorization {
    /// Hash the authority signs: keccak256(0x05 || rlp([chain_id, address, nonce]))
    pub fn signature_hash(&self) -> H256 {
        let mut rlp = RlpStream::new_list(3);
        rlp.append(&self.chain_id);
        rlp.append(&self.address);
        rlp.append(&self.nonce);
        let encoded = [&[MAGIC][..], rlp.as_raw()].concat();
        keccak256(encoded).into()
    }

    /// Attaches a signature over [signature_hash](Authorization::signature_hash)
    pub fn into_signed(self, signature: Signature) -> SignedAuthorization {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        signature.r.to_big_endian(&mut r);
        signature.s.to_big_endian(&mut s);
        let y_parity = if signature.v >= 27 { signature.v - 27 } else { signature.v };
        SignedAuthorization {
            chain_id: self.chain_id,
            address: self.address,
            nonce: self.nonce,
            y_parity: y_parity.into(),
            r: H256::from(r),
            s: H256::from(s),
        }
    }

    /// Attaches the pessimistic stub signature used while estimating gas
    pub fn into_stub(self) -> SignedAuthorization {
        SignedAuthorization {
            chain_id: self.chain_id,
            address: self.address,
            nonce: self.nonce,
            y_parity: STUB_Y_PARITY.into(),
            r: STUB_R.parse().unwrap_or_default(),
            s: STUB_S.parse().unwrap_or_default(),
        }
    }
}

/// Signed EIP-7702 authorization (`eip7702Auth` on the wire)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAuthorization {
    pub chain_id: U64,
    pub address: Address,
    pub nonce: U64,
    pub y_parity: U64,
    pub r: H256,
    pub s: H256,
}

impl SignedAuthorization {
    /// Whether the authorization carries the stub signature
    pub fn is_stub(&self) -> bool {
        self.r == STUB_R.parse().unwrap_or_default() && self.s == STUB_S.parse().unwrap_or_default()
    }

    /// The authorization without its signature
    pub fn unsigned(&self) -> Authorization {
        Authorization { chain_id: self.chain_id, address: self.address, nonce: self.nonce }
    }

    /// Signature components as a [Signature](Signature)
    pub fn signature(&self) -> Signature {
        Signature {
            r: U256::from_big_endian(self.r.as_bytes()),
            s: U256::from_big_endian(self.s.as_bytes()),
            v: self.y_parity.as_u64() + 27,
        }
    }
}
