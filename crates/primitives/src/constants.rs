//! Account abstraction (ERC-4337)-related constants

/// Entry point smart contracts
pub mod entry_point {
    /// Address of the entry point smart contract (version 0.6)
    pub const ADDRESS_V0_6: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    /// Address of the entry point smart contract (version 0.7)
    pub const ADDRESS_V0_7: &str = "0x0000000071727De22E5E9d8BAf0edAc6f37da032";
    /// Address of the entry point smart contract (version 0.8)
    pub const ADDRESS_V0_8: &str = "0x4337084D9E255Ff0702461CF8895CE9E3b5Ff108";
}

/// Smart accounts
pub mod account {
    /// Placeholder signature used for gas estimation (never submitted for execution)
    pub const STUB_SIGNATURE: &str = "0xfffffffffffffffffffffffffffffff0000000000000000000000000000000007aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1c";
    /// Factory marker of an EIP-7702 delegated account (left-padded to 20 bytes)
    pub const EIP7702_FACTORY: &str = "0x0000000000000000000000000000000000007702";
    /// Simple7702 account implementation (delegation target)
    pub const SIMPLE_7702_IMPLEMENTATION: &str = "0xe6Cae83BdE06E4c305530e199D7217f42808555B";
    /// Solady account factory
    pub const SOLADY_FACTORY: &str = "0x5d82735936c6Cd5DE57cC3c1A799f6B2E6F933Df";
}

/// EIP-7702 authorization stubs
pub mod authorization {
    /// `r` value of the stub authorization signature
    pub const STUB_R: &str = "0xfffffffffffffffffffffffffffffff000000000000000000000000000000000";
    /// `s` value of the stub authorization signature
    pub const STUB_S: &str = "0x7aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    /// `yParity` of the stub authorization signature
    pub const STUB_Y_PARITY: u8 = 1;
}

/// Fee estimation
pub mod fees {
    /// Multiplier applied to the network fee estimate
    pub const MULTIPLIER: u64 = 2;
    /// Floor of `maxFeePerGas` (3 gwei)
    pub const MIN_MAX_FEE_PER_GAS: u64 = 3_000_000_000;
    /// Floor of `maxPriorityFeePerGas` (1 gwei)
    pub const MIN_MAX_PRIORITY_FEE_PER_GAS: u64 = 1_000_000_000;
}

/// Nonce channels (entry point nonce manager)
pub mod nonce {
    /// Width of the nonce key (high bits of the nonce)
    pub const KEY_BITS: usize = 192;
    /// Width of the sequence number (low bits of the nonce)
    pub const SEQUENCE_BITS: usize = 64;
}

/// User operation receipt polling
pub mod receipt {
    /// Default interval between two polls (in milliseconds)
    pub const POLL_INTERVAL_MS: u64 = 1000;
    /// Default deadline for waiting on a receipt (in seconds)
    pub const TIMEOUT_SECS: u64 = 180;
}

/// EIP-712 domain of user operation hashes (entry point 0.8)
pub mod eip712 {
    pub const DOMAIN_NAME: &str = "ERC4337";
    pub const DOMAIN_VERSION: &str = "1";
    pub const DOMAIN_TYPE: &str =
        "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
    pub const PACKED_USER_OPERATION_TYPE: &str = "PackedUserOperation(address sender,uint256 nonce,bytes initCode,bytes callData,bytes32 accountGasLimits,uint256 preVerificationGas,bytes32 gasFees,bytes paymasterAndData)";
}

/// RPC error codes returned by bundlers
pub mod rpc_error_codes {
    pub const REJECTED_BY_ENTRY_POINT: i32 = -32500;
    pub const REJECTED_BY_PAYMASTER: i32 = -32501;
    pub const REJECTED_BY_OPCODE: i32 = -32502;
    pub const OUT_OF_TIME_RANGE: i32 = -32503;
    pub const PAYMASTER_RATE_LIMIT: i32 = -32504;
    pub const PAYMASTER_STAKE_TOO_LOW: i32 = -32505;
    pub const UNSUPPORTED_SIGNATURE_AGGREGATOR: i32 = -32506;
    pub const SIGNATURE_CHECK_FAILED: i32 = -32507;
    pub const PAYMASTER_DEPOSIT_TOO_LOW: i32 = -32508;
    pub const EXECUTION_REVERTED: i32 = -32521;
    pub const INVALID_FIELDS: i32 = -32602;
}
