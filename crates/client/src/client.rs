use crate::{
    config::BundlerClientConfig,
    error::ClientError,
    fees::FeeEstimator,
    nonce::NonceKeyManager,
    paymaster::PaymasterSource,
    prepare::PrepareParameter,
};
use enumset::EnumSet;
use ethers::types::Address;
use jsonrpsee::{
    core::client::ClientT,
    http_client::{HttpClient, HttpClientBuilder},
};
use std::{sync::Arc, time::Duration};
use tokio::{sync::OnceCell, time::Instant};
use tracing::{debug, info, trace};
use userop_account::SmartAccount;
use userop_primitives::{
    SignedAuthorization, UserOperation, UserOperationByHash, UserOperationGasEstimation,
    UserOperationHash, UserOperationReceipt, UserOperationRequest,
};
use userop_rpc::{BundlerApiClient, BundlerError, ErrorContext};

/// Client of an ERC-4337 bundler.
///
/// Prepares user operations of the bound [SmartAccount](SmartAccount), submits them and tracks
/// their receipts.
pub struct BundlerClient<C: ClientT + Send + Sync = HttpClient> {
    pub(crate) rpc: C,
    pub(crate) account: Option<Arc<dyn SmartAccount>>,
    pub(crate) fee_estimator: Option<Arc<dyn FeeEstimator>>,
    pub(crate) paymaster: Option<PaymasterSource>,
    pub(crate) nonce_key_manager: Option<Arc<dyn NonceKeyManager>>,
    pub(crate) config: BundlerClientConfig,
    chain_id: OnceCell<u64>,
}

impl BundlerClient<HttpClient> {
    /// Client of the bundler listening on `url` (HTTP)
    pub fn http(url: &str) -> Result<Self, ClientError> {
        Ok(Self::new(HttpClientBuilder::default().build(url)?))
    }
}

impl<C: ClientT + Send + Sync> BundlerClient<C> {
    pub fn new(rpc: C) -> Self {
        Self {
            rpc,
            account: None,
            fee_estimator: None,
            paymaster: None,
            nonce_key_manager: None,
            config: BundlerClientConfig::default(),
            chain_id: OnceCell::new(),
        }
    }

    /// Binds the smart account used to prepare, sign and send user operations
    pub fn with_account(mut self, account: Arc<dyn SmartAccount>) -> Self {
        self.account = Some(account);
        self
    }

    /// Source of network fees (without it, fees must be set on requests)
    pub fn with_fee_estimator(mut self, fee_estimator: Arc<dyn FeeEstimator>) -> Self {
        self.fee_estimator = Some(fee_estimator);
        self
    }

    pub fn with_paymaster(mut self, paymaster: PaymasterSource) -> Self {
        self.paymaster = Some(paymaster);
        self
    }

    pub fn with_nonce_key_manager(mut self, nonce_key_manager: Arc<dyn NonceKeyManager>) -> Self {
        self.nonce_key_manager = Some(nonce_key_manager);
        self
    }

    pub fn with_config(mut self, config: BundlerClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn account(&self) -> Option<&Arc<dyn SmartAccount>> {
        self.account.as_ref()
    }

    pub fn config(&self) -> &BundlerClientConfig {
        &self.config
    }

    pub(crate) fn require_account(&self) -> Result<Arc<dyn SmartAccount>, ClientError> {
        self.account.clone().ok_or(ClientError::AccountNotFound)
    }

    /// Chain ID reported by the bundler (fetched once)
    pub async fn chain_id(&self) -> Result<u64, ClientError> {
        self.chain_id
            .get_or_try_init(|| async {
                let chain_id = BundlerApiClient::chain_id(&self.rpc).await?;
                debug!("Bundler chain id {chain_id}");
                Ok::<_, ClientError>(chain_id.as_u64())
            })
            .await
            .copied()
    }

    /// Entry points supported by the bundler
    pub async fn supported_entry_points(&self) -> Result<Vec<Address>, ClientError> {
        Ok(self.rpc.supported_entry_points().await?)
    }

    /// Estimates the gas limits of a request of the bound account. The request is prepared
    /// first (authorization, factory, nonce, paymaster and stub signature) and estimated with
    /// zeroed gas limits.
    pub async fn estimate_user_operation_gas(
        &self,
        request: UserOperationRequest,
    ) -> Result<UserOperationGasEstimation, ClientError> {
        let account = self.require_account()?;
        let parameters = PrepareParameter::Authorization |
            PrepareParameter::Factory |
            PrepareParameter::Nonce |
            PrepareParameter::Paymaster |
            PrepareParameter::Signature;
        let request = self.prepare_request(account.as_ref(), request, parameters).await?;
        let uo = request.into_user_operation(account.entry_point().version)?;
        self.estimate_user_operation_gas_at(&uo, &account.entry_point().address).await
    }

    /// Estimates the gas limits of an assembled user operation
    pub async fn estimate_user_operation_gas_at(
        &self,
        uo: &UserOperation,
        entry_point: &Address,
    ) -> Result<UserOperationGasEstimation, ClientError> {
        trace!("Estimating gas of user operation of {:?} at {entry_point:?}", uo.sender());
        self.rpc
            .estimate_user_operation_gas(uo.clone(), *entry_point)
            .await
            .map_err(|err| BundlerError::from_client_error(err, &ErrorContext::from(uo)).into())
    }

    /// Prepares (unless complete), signs (unless a signature is given) and sends a request of
    /// the bound account. A stub EIP-7702 authorization attached during preparation is replaced
    /// by one signed by the account.
    pub async fn send_user_operation(
        &self,
        request: UserOperationRequest,
    ) -> Result<UserOperationHash, ClientError> {
        let account = self.require_account()?;
        let entry_point = account.entry_point();
        let signature = request.signature.clone();

        let mut request = self
            .prepare_request(account.as_ref(), request, PrepareParameter::defaults())
            .await?;
        // the stub authorization only serves gas estimation
        let stub = request
            .authorization
            .as_ref()
            .filter(|authorization| authorization.is_stub())
            .map(SignedAuthorization::unsigned);
        if let Some(authorization) = stub {
            debug!("Signing EIP-7702 authorization to {:?}", authorization.address);
            request.authorization = Some(account.sign_authorization(authorization).await?);
        }
        let uo = request.into_user_operation(entry_point.version)?;

        let uo = match signature {
            Some(signature) => uo.with_signature(signature),
            None => {
                let chain_id = self.chain_id().await?;
                let signature = account.sign_user_operation(&uo, chain_id).await?;
                uo.with_signature(signature)
            }
        };

        self.send_user_operation_at(&uo, &entry_point.address).await
    }

    /// Sends a signed user operation
    pub async fn send_user_operation_at(
        &self,
        uo: &UserOperation,
        entry_point: &Address,
    ) -> Result<UserOperationHash, ClientError> {
        let hash = self
            .rpc
            .send_user_operation(uo.clone(), *entry_point)
            .await
            .map_err(|err| BundlerError::from_client_error(err, &ErrorContext::from(uo)))?;
        info!(
            "Sent user operation {hash} (sender {:?}, nonce {}) to entry point {entry_point:?}",
            uo.sender(),
            uo.nonce()
        );
        Ok(hash)
    }

    /// User operation with the given hash, re-tagged with the version of its entry point
    pub async fn get_user_operation(
        &self,
        hash: UserOperationHash,
    ) -> Result<Option<UserOperationByHash>, ClientError> {
        Ok(self
            .rpc
            .get_user_operation_by_hash(hash)
            .await?
            .map(UserOperationByHash::with_entry_point_version))
    }

    /// Receipt of the user operation with the given hash, None if not included yet
    pub async fn get_user_operation_receipt(
        &self,
        hash: UserOperationHash,
    ) -> Result<Option<UserOperationReceipt>, ClientError> {
        match self.rpc.get_user_operation_receipt(hash).await? {
            Some(receipt) => Ok(Some(receipt.normalize()?)),
            None => Ok(None),
        }
    }

    /// Polls the receipt of the user operation until it is included or the deadline passes.
    ///
    /// # Arguments
    /// * `hash` - Hash of the user operation
    /// * `poll_interval` - Interval between polls (configured default if None)
    /// * `timeout` - Deadline of the wait (configured default if None)
    ///
    /// # Returns
    /// * `UserOperationReceipt` - The first receipt observed
    pub async fn wait_for_user_operation_receipt(
        &self,
        hash: UserOperationHash,
        poll_interval: Option<Duration>,
        timeout: Option<Duration>,
    ) -> Result<UserOperationReceipt, ClientError> {
        let poll_interval = poll_interval.unwrap_or(self.config.receipt.poll_interval);
        let deadline = timeout.or(self.config.receipt.timeout).map(|t| Instant::now() + t);

        loop {
            if let Some(receipt) = self.get_user_operation_receipt(hash).await? {
                info!(
                    "User operation {hash} included in transaction {:?} (success: {})",
                    receipt.receipt.transaction_hash, receipt.success
                );
                return Ok(receipt);
            }

            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(ClientError::Timeout { hash });
                }
                // never sleep past the deadline
                tokio::time::sleep(poll_interval.min(deadline - now)).await;
            } else {
                tokio::time::sleep(poll_interval).await;
            }
            trace!("Polling receipt of user operation {hash}");
        }
    }
}
