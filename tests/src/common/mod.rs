use async_trait::async_trait;
use ethers::types::{
    transaction::eip712::TypedData, Address, Bytes, H256, U256, U64,
};
use jsonrpsee::{
    core::RpcResult,
    http_client::{HttpClient, HttpClientBuilder},
    server::{ServerBuilder, ServerHandle},
    types::{ErrorObject, ErrorObjectOwned},
    RpcModule,
};
use parking_lot::Mutex;
use serde_json::json;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use userop_account::{AccountError, FactoryArgs, GasLimits, SmartAccount};
use userop_client::{BundlerClient, FeeEstimator, Fees, PaymasterSource};
use userop_primitives::{
    Authorization, Call, EntryPoint, EntryPointVersion, RawUserOperationReceipt,
    SignedAuthorization, UserOperation, UserOperationByHash, UserOperationGasEstimation,
    UserOperationHash, UserOperationRequest,
};
use userop_rpc::{BundlerApiServer, PaymasterApiServer, PaymasterData, PaymasterStubData};

pub const CHAIN_ID: u64 = 0x7a69;

/// Gas limits returned by the mock bundler
pub fn estimation() -> UserOperationGasEstimation {
    UserOperationGasEstimation {
        pre_verification_gas: 50_000.into(),
        verification_gas_limit: 150_000.into(),
        call_gas_limit: 80_000.into(),
        paymaster_verification_gas_limit: Some(40_000.into()),
        paymaster_post_op_gas_limit: Some(20_000.into()),
    }
}

/// What the mock bundler answers and what it received
#[derive(Default)]
pub struct BundlerState {
    pub estimate_error: Option<ErrorObjectOwned>,
    pub send_error: Option<ErrorObjectOwned>,
    pub estimated: Vec<UserOperation>,
    pub sent: Vec<UserOperation>,
    pub receipts: HashMap<UserOperationHash, RawUserOperationReceipt>,
    /// Polls answered with `null` before a known receipt is returned
    pub pending_polls: usize,
    /// Poll answered with an internal error
    pub failing_poll: Option<usize>,
    pub receipt_polls: usize,
    pub user_operations: HashMap<UserOperationHash, UserOperationByHash>,
    pub chain_id_calls: usize,
}

pub struct MockBundler {
    pub entry_point: EntryPoint,
    pub state: Arc<Mutex<BundlerState>>,
}

#[async_trait]
impl BundlerApiServer for MockBundler {
    async fn chain_id(&self) -> RpcResult<U64> {
        self.state.lock().chain_id_calls += 1;
        Ok(CHAIN_ID.into())
    }

    async fn supported_entry_points(&self) -> RpcResult<Vec<Address>> {
        Ok(vec![self.entry_point.address])
    }

    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<UserOperationHash> {
        let mut state = self.state.lock();
        if let Some(err) = state.send_error.clone() {
            return Err(err);
        }
        if entry_point != self.entry_point.address {
            return Err(ErrorObject::owned(-32602, "unsupported entry point", None::<bool>));
        }
        let user_operation = user_operation.into_version(self.entry_point.version);
        let hash = user_operation
            .hash(&entry_point, CHAIN_ID)
            .map_err(|e| ErrorObject::owned(-32602, e.to_string(), None::<bool>))?;
        state.sent.push(user_operation);
        Ok(hash)
    }

    async fn estimate_user_operation_gas(
        &self,
        user_operation: UserOperation,
        _entry_point: Address,
    ) -> RpcResult<UserOperationGasEstimation> {
        let mut state = self.state.lock();
        state.estimated.push(user_operation.into_version(self.entry_point.version));
        match state.estimate_error.clone() {
            Some(err) => Err(err),
            None => Ok(estimation()),
        }
    }

    async fn get_user_operation_receipt(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> RpcResult<Option<RawUserOperationReceipt>> {
        let mut state = self.state.lock();
        state.receipt_polls += 1;
        if state.failing_poll == Some(state.receipt_polls) {
            return Err(ErrorObject::owned(-32603, "receipt lookup failed", None::<bool>));
        }
        if state.receipt_polls <= state.pending_polls {
            return Ok(None);
        }
        Ok(state.receipts.get(&user_operation_hash).cloned())
    }

    async fn get_user_operation_by_hash(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> RpcResult<Option<UserOperationByHash>> {
        Ok(self.state.lock().user_operations.get(&user_operation_hash).cloned())
    }
}

/// Paymaster web service recording the contexts it was called with
#[derive(Default)]
pub struct PaymasterState {
    pub stub_calls: usize,
    pub data_calls: usize,
    pub contexts: Vec<Option<serde_json::Value>>,
}

pub struct MockPaymaster {
    pub paymaster: Address,
    pub is_final: bool,
    pub state: Arc<Mutex<PaymasterState>>,
}

pub const PAYMASTER_STUB_DATA: [u8; 1] = [0x01];
pub const PAYMASTER_DATA: [u8; 4] = [0xca, 0xfe, 0xca, 0xfe];

#[async_trait]
impl PaymasterApiServer for MockPaymaster {
    async fn get_paymaster_stub_data(
        &self,
        user_operation: UserOperation,
        _entry_point: Address,
        chain_id: U64,
        context: Option<serde_json::Value>,
    ) -> RpcResult<PaymasterStubData> {
        if chain_id != U64::from(CHAIN_ID) {
            return Err(ErrorObject::owned(-32602, "unsupported chain", None::<bool>));
        }
        if user_operation.sender().is_zero() {
            return Err(ErrorObject::owned(-32602, "missing sender", None::<bool>));
        }
        let mut state = self.state.lock();
        state.stub_calls += 1;
        state.contexts.push(context);
        Ok(PaymasterStubData {
            paymaster: Some(self.paymaster),
            paymaster_data: Some(PAYMASTER_STUB_DATA.to_vec().into()),
            paymaster_verification_gas_limit: Some(60_000.into()),
            paymaster_post_op_gas_limit: Some(30_000.into()),
            is_final: Some(self.is_final),
            ..Default::default()
        })
    }

    async fn get_paymaster_data(
        &self,
        _user_operation: UserOperation,
        _entry_point: Address,
        _chain_id: U64,
        context: Option<serde_json::Value>,
    ) -> RpcResult<PaymasterData> {
        let mut state = self.state.lock();
        state.data_calls += 1;
        state.contexts.push(context);
        Ok(PaymasterData {
            paymaster: Some(self.paymaster),
            paymaster_data: Some(PAYMASTER_DATA.to_vec().into()),
            ..Default::default()
        })
    }
}

pub const FACTORY: Address = ethers::types::H160([0xfa; 20]);
pub const FACTORY_DATA: [u8; 2] = [0xab, 0xcd];

/// Smart account without any eth client: deployment state, nonces and signatures are local
pub struct MockAccount {
    pub address: Address,
    pub entry_point: EntryPoint,
    pub deployed: bool,
    pub authorization: Option<Authorization>,
    pub gas_limits: Option<GasLimits>,
    /// Keys the nonce was requested with
    pub nonce_keys: Mutex<Vec<Option<U256>>>,
    pub deployment_checks: Mutex<usize>,
}

impl MockAccount {
    pub fn new(version: EntryPointVersion) -> Self {
        Self {
            address: Address::repeat_byte(0xaa),
            entry_point: EntryPoint::canonical(version),
            deployed: true,
            authorization: None,
            gas_limits: None,
            nonce_keys: Mutex::new(Vec::new()),
            deployment_checks: Mutex::new(0),
        }
    }

    pub fn undeployed(mut self) -> Self {
        self.deployed = false;
        self
    }

    pub fn with_authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = Some(authorization);
        self
    }

    pub fn with_gas_limits(mut self, gas_limits: GasLimits) -> Self {
        self.gas_limits = Some(gas_limits);
        self
    }

    /// Signature the account produces for a user operation hash
    pub fn signature_of(hash: UserOperationHash) -> Bytes {
        let hash = H256::from(hash);
        [hash.as_bytes(), hash.as_bytes(), &[0x1b]].concat().into()
    }
}

#[async_trait]
impl SmartAccount for MockAccount {
    async fn address(&self) -> Result<Address, AccountError> {
        Ok(self.address)
    }

    fn entry_point(&self) -> EntryPoint {
        self.entry_point
    }

    async fn get_nonce(&self, key: Option<U256>) -> Result<U256, AccountError> {
        self.nonce_keys.lock().push(key);
        // sequence 5 of every key
        Ok((key.unwrap_or_default() << 64) + 5)
    }

    async fn get_factory_args(&self) -> Result<FactoryArgs, AccountError> {
        Ok(FactoryArgs {
            factory: Some(FACTORY),
            factory_data: Some(FACTORY_DATA.to_vec().into()),
        })
    }

    fn get_stub_signature(&self) -> Bytes {
        vec![0xff; 65].into()
    }

    fn encode_calls(&self, calls: &[Call]) -> Result<Bytes, AccountError> {
        Ok(userop_account::encode_calls(calls))
    }

    fn decode_calls(&self, data: &Bytes) -> Result<Vec<Call>, AccountError> {
        userop_account::decode_calls(data)
    }

    async fn sign_user_operation(
        &self,
        uo: &UserOperation,
        chain_id: u64,
    ) -> Result<Bytes, AccountError> {
        Ok(Self::signature_of(uo.hash(&self.entry_point.address, chain_id)?))
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, AccountError> {
        Ok(message.to_vec().into())
    }

    async fn sign_typed_data(&self, _payload: &TypedData) -> Result<Bytes, AccountError> {
        Ok(Bytes::default())
    }

    async fn is_deployed(&self) -> Result<bool, AccountError> {
        *self.deployment_checks.lock() += 1;
        Ok(self.deployed)
    }

    async fn authorization(&self) -> Result<Option<Authorization>, AccountError> {
        Ok(self.authorization.clone())
    }

    async fn sign_authorization(
        &self,
        authorization: Authorization,
    ) -> Result<SignedAuthorization, AccountError> {
        Ok(SignedAuthorization {
            chain_id: authorization.chain_id,
            address: authorization.address,
            nonce: authorization.nonce,
            y_parity: U64::zero(),
            r: H256::repeat_byte(0x01),
            s: H256::repeat_byte(0x02),
        })
    }

    async fn estimate_gas(
        &self,
        _request: &UserOperationRequest,
    ) -> Result<Option<GasLimits>, AccountError> {
        Ok(self.gas_limits.clone())
    }
}

/// Fee estimator with a fixed answer (fails when there is none)
#[derive(Default)]
pub struct MockFeeEstimator {
    pub fees: Option<Fees>,
    pub calls: Mutex<usize>,
}

impl MockFeeEstimator {
    pub fn new(max_fee_per_gas: u64, max_priority_fee_per_gas: u64) -> Self {
        Self {
            fees: Some(Fees {
                max_fee_per_gas: max_fee_per_gas.into(),
                max_priority_fee_per_gas: max_priority_fee_per_gas.into(),
            }),
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl FeeEstimator for MockFeeEstimator {
    async fn estimate_fees(&self) -> eyre::Result<Fees> {
        *self.calls.lock() += 1;
        self.fees.ok_or_else(|| eyre::eyre!("no fee data"))
    }
}

pub async fn start_server<T: Send + Sync + 'static>(
    module: RpcModule<T>,
) -> eyre::Result<(SocketAddr, ServerHandle)> {
    let server = ServerBuilder::default().build("127.0.0.1:0").await?;
    let addr = server.local_addr()?;
    Ok((addr, server.start(module)))
}

/// Mock bundler bound to a client of the given account
pub struct Context {
    pub client: BundlerClient<HttpClient>,
    pub bundler: Arc<Mutex<BundlerState>>,
    pub account: Arc<MockAccount>,
    _handle: ServerHandle,
}

impl Context {
    pub async fn new(account: MockAccount) -> eyre::Result<Self> {
        let bundler = Arc::new(Mutex::new(BundlerState::default()));
        let server =
            MockBundler { entry_point: account.entry_point, state: bundler.clone() };
        let (addr, handle) = start_server(server.into_rpc()).await?;

        let account = Arc::new(account);
        let rpc = HttpClientBuilder::default().build(format!("http://{addr}"))?;
        let client = BundlerClient::new(rpc).with_account(account.clone());
        Ok(Self { client, bundler, account, _handle: handle })
    }

    pub fn map_client(
        mut self,
        f: impl FnOnce(BundlerClient<HttpClient>) -> BundlerClient<HttpClient>,
    ) -> Self {
        self.client = f(self.client);
        self
    }
}

/// Paymaster web service with its source for the client
pub async fn start_paymaster(
    is_final: bool,
    context: Option<serde_json::Value>,
) -> eyre::Result<(PaymasterSource, Arc<Mutex<PaymasterState>>, ServerHandle)> {
    let state = Arc::new(Mutex::new(PaymasterState::default()));
    let server =
        MockPaymaster { paymaster: Address::repeat_byte(0xbe), is_final, state: state.clone() };
    let (addr, handle) = start_server(server.into_rpc()).await?;
    let source = PaymasterSource::rpc(&format!("http://{addr}"), context)?;
    Ok((source, state, handle))
}

/// Request calling `to` with empty data
pub fn request(to: Address) -> UserOperationRequest {
    UserOperationRequest::default().call(Call::new(to))
}

/// Receipt of an included user operation as a bundler returns it
pub fn raw_receipt(
    hash: UserOperationHash,
    sender: Address,
    entry_point: Address,
) -> eyre::Result<RawUserOperationReceipt> {
    let log = json!({
        "address": entry_point,
        "topics": [H256::repeat_byte(0x01)],
        "data": "0x",
        "blockHash": H256::repeat_byte(0x02),
        "blockNumber": "0x10",
        "transactionHash": H256::repeat_byte(0x03),
        "transactionIndex": "0x0",
        "logIndex": "0x1",
        "removed": false
    });
    Ok(serde_json::from_value(json!({
        "userOpHash": hash,
        "entryPoint": entry_point,
        "sender": sender,
        "nonce": "0x5",
        "actualGasCost": "0x2386f26fc10000",
        "actualGasUsed": "0x1d4c0",
        "success": true,
        "logs": [log],
        "receipt": {
            "transactionHash": H256::repeat_byte(0x03),
            "transactionIndex": "0x0",
            "blockHash": H256::repeat_byte(0x02),
            "blockNumber": "0x10",
            "from": Address::repeat_byte(0x0b),
            "to": entry_point,
            "cumulativeGasUsed": "0x30d40",
            "gasUsed": "0x1d4c0",
            "effectiveGasPrice": "0x3b9aca00",
            "logs": [log],
            "logsBloom": "0x00",
            "status": "0x1",
            "type": "0x2"
        }
    }))?)
}
