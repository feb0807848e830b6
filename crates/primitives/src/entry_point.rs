//! Entry point versions and descriptors

use crate::{constants::entry_point, utils::as_checksum_addr};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Version of the entry point smart contract. Selects the user operation layout and ABI.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum EntryPointVersion {
    #[strum(serialize = "0.6")]
    #[serde(rename = "0.6")]
    V0_6,
    #[strum(serialize = "0.7")]
    #[serde(rename = "0.7")]
    V0_7,
    #[strum(serialize = "0.8")]
    #[serde(rename = "0.8")]
    V0_8,
}

impl EntryPointVersion {
    /// Canonical (deterministically deployed) address of the entry point with this version
    pub fn canonical_address(&self) -> Address {
        let address = match self {
            Self::V0_6 => entry_point::ADDRESS_V0_6,
            Self::V0_7 => entry_point::ADDRESS_V0_7,
            Self::V0_8 => entry_point::ADDRESS_V0_8,
        };
        address.parse().unwrap_or_default()
    }

    /// Recovers the version from a canonical entry point address
    pub fn from_canonical_address(address: &Address) -> Option<Self> {
        [Self::V0_6, Self::V0_7, Self::V0_8]
            .into_iter()
            .find(|version| version.canonical_address() == *address)
    }

    /// Whether user operations of this version use the packed (factory/paymaster split) layout
    pub fn is_packed(&self) -> bool {
        !matches!(self, Self::V0_6)
    }
}

/// Entry point the smart account is bound to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Address of the entry point smart contract
    #[serde(serialize_with = "as_checksum_addr")]
    pub address: Address,
    /// Version of the entry point smart contract
    pub version: EntryPointVersion,
}

impl EntryPoint {
    pub fn new(address: Address, version: EntryPointVersion) -> Self {
        Self { address, version }
    }

    /// Entry point deployed at the canonical address of the version
    pub fn canonical(version: EntryPointVersion) -> Self {
        Self { address: version.canonical_address(), version }
    }
}

impl From<EntryPointVersion> for EntryPoint {
    fn from(version: EntryPointVersion) -> Self {
        Self::canonical(version)
    }
}
