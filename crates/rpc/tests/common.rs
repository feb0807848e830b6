use async_trait::async_trait;
use ethers::types::{Address, H256, U256, U64};
use jsonrpsee::{
    core::{ClientError, RpcResult},
    http_client::{HttpClient, HttpClientBuilder},
    server::{ServerBuilder, ServerHandle},
    types::ErrorObject,
    ws_client::{WsClient, WsClientBuilder},
    RpcModule,
};
use serde_json::json;
use std::net::SocketAddr;
use userop_primitives::{
    RawUserOperationReceipt, UserOperation, UserOperationByHash, UserOperationGasEstimation,
    UserOperationHash,
};
use userop_rpc::{BundlerApiServer, PaymasterApiServer, PaymasterData, PaymasterStubData};

pub const CHAIN_ID: u64 = 0x7a69;

/// Bundler answering with fixed values; operations signed with an empty signature are rejected
pub struct DummyBundler {
    pub entry_point: Address,
}

#[async_trait]
impl BundlerApiServer for DummyBundler {
    async fn chain_id(&self) -> RpcResult<U64> {
        Ok(CHAIN_ID.into())
    }

    async fn supported_entry_points(&self) -> RpcResult<Vec<Address>> {
        Ok(vec![self.entry_point])
    }

    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<UserOperationHash> {
        if user_operation.signature().is_empty() {
            return Err(ErrorObject::owned(-32507, "AA24 signature error", None::<bool>));
        }
        user_operation
            .hash(&entry_point, CHAIN_ID)
            .map_err(|e| ErrorObject::owned(-32602, e.to_string(), None::<bool>))
    }

    async fn estimate_user_operation_gas(
        &self,
        _user_operation: UserOperation,
        _entry_point: Address,
    ) -> RpcResult<UserOperationGasEstimation> {
        Err(ErrorObject::owned(
            -32521,
            "execution reverted",
            Some(json!({ "revertData": "0xdeadbeef" })),
        ))
    }

    async fn get_user_operation_receipt(
        &self,
        _user_operation_hash: UserOperationHash,
    ) -> RpcResult<Option<RawUserOperationReceipt>> {
        Ok(None)
    }

    async fn get_user_operation_by_hash(
        &self,
        _user_operation_hash: UserOperationHash,
    ) -> RpcResult<Option<UserOperationByHash>> {
        Ok(None)
    }
}

pub struct DummyPaymaster {
    pub paymaster: Address,
}

#[async_trait]
impl PaymasterApiServer for DummyPaymaster {
    async fn get_paymaster_stub_data(
        &self,
        _user_operation: UserOperation,
        _entry_point: Address,
        chain_id: U64,
        context: Option<serde_json::Value>,
    ) -> RpcResult<PaymasterStubData> {
        if chain_id != U64::from(CHAIN_ID) {
            return Err(ErrorObject::owned(-32602, "unsupported chain", None::<bool>));
        }
        Ok(PaymasterStubData {
            paymaster: Some(self.paymaster),
            paymaster_data: Some(vec![0x01].into()),
            paymaster_verification_gas_limit: Some(U256::from(50_000)),
            paymaster_post_op_gas_limit: Some(U256::from(10_000)),
            is_final: context.map(|c| c["final"].as_bool().unwrap_or_default()),
            ..Default::default()
        })
    }

    async fn get_paymaster_data(
        &self,
        _user_operation: UserOperation,
        _entry_point: Address,
        _chain_id: U64,
        _context: Option<serde_json::Value>,
    ) -> RpcResult<PaymasterData> {
        Ok(PaymasterData {
            paymaster: Some(self.paymaster),
            paymaster_data: Some(H256::repeat_byte(0x02).as_bytes().to_vec().into()),
            ..Default::default()
        })
    }
}

pub async fn start_server<T: Send + Sync + 'static>(
    module: RpcModule<T>,
) -> eyre::Result<(SocketAddr, ServerHandle)> {
    let server = ServerBuilder::default().build("127.0.0.1:0").await?;
    let addr = server.local_addr()?;
    Ok((addr, server.start(module)))
}

pub fn build_http_client(addr: SocketAddr) -> Result<HttpClient, ClientError> {
    HttpClientBuilder::default().build(format!("http://{addr}"))
}

pub async fn build_ws_client(addr: SocketAddr) -> Result<WsClient, ClientError> {
    WsClientBuilder::default().build(format!("ws://{addr}")).await
}
