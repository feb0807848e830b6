//! User operation preparation: fills every field of a partial request

use crate::{client::BundlerClient, error::ClientError, fees::Fees, paymaster::PaymasterSource};
use enumset::{enum_set, EnumSet, EnumSetType};
use ethers::types::{Bytes, U256};
use jsonrpsee::core::client::ClientT;
use tokio::sync::OnceCell;
use tracing::{debug, trace, warn};
use userop_account::{FactoryArgs, GasLimits, SmartAccount};
use userop_primitives::{
    pack_factory_data, Call, EntryPointVersion, SignedAuthorization, UserOperation,
    UserOperationRequest,
};
use userop_rpc::PaymasterApiClient;

/// Fields the preparation pipeline is allowed to fill
#[derive(EnumSetType, Debug)]
pub enum PrepareParameter {
    Authorization,
    Factory,
    Fees,
    Gas,
    Nonce,
    Paymaster,
    Signature,
}

impl PrepareParameter {
    /// Everything except the (stub) signature
    pub fn defaults() -> EnumSet<PrepareParameter> {
        enum_set!(
            PrepareParameter::Authorization |
                PrepareParameter::Factory |
                PrepareParameter::Fees |
                PrepareParameter::Gas |
                PrepareParameter::Nonce |
                PrepareParameter::Paymaster
        )
    }
}

impl<C: ClientT + Send + Sync> BundlerClient<C> {
    /// Prepares a user operation of the bound account.
    ///
    /// # Arguments
    /// * `request` - Partial user operation; fields set by the caller are never overwritten
    /// * `parameters` - Fields to fill ([defaults](PrepareParameter::defaults) if None)
    ///
    /// # Returns
    /// * `UserOperation` - The user operation of the account's entry point version (unsigned
    ///   unless a signature was given or requested)
    pub async fn prepare_user_operation(
        &self,
        request: UserOperationRequest,
        parameters: Option<EnumSet<PrepareParameter>>,
    ) -> Result<UserOperation, ClientError> {
        let account = self.require_account()?;
        let request = self
            .prepare_request(
                account.as_ref(),
                request,
                parameters.unwrap_or_else(PrepareParameter::defaults),
            )
            .await?;
        Ok(request.into_user_operation(account.entry_point().version)?)
    }

    pub(crate) async fn prepare_request(
        &self,
        account: &dyn SmartAccount,
        request: UserOperationRequest,
        parameters: EnumSet<PrepareParameter>,
    ) -> Result<UserOperationRequest, ClientError> {
        let entry_point = account.entry_point();
        let version = entry_point.version;
        let fixed_paymaster = self.paymaster.as_ref().and_then(PaymasterSource::address);
        let caller_paymaster = request.has_paymaster();

        let mut request = self.with_defaults(request);
        if !caller_paymaster {
            request.paymaster = fixed_paymaster;
        }
        request.sender = Some(account.address().await?);
        let mut request = account.prepare_user_operation(request).await?;

        if let Some(calls) = request.calls.take() {
            let calls = calls.into_iter().map(Call::encode).collect::<Result<Vec<_>, _>>()?;
            request.call_data = Some(account.encode_calls(&calls)?);
        }

        // factory and authorization both depend on the deployment state
        let deployed = OnceCell::new();
        let (factory, fees, nonce, authorization) = tokio::join!(
            self.resolve_factory(account, &request, parameters, &deployed),
            self.resolve_fees(&request, parameters),
            self.resolve_nonce(account, &request, parameters),
            self.resolve_authorization(account, &request, parameters, &deployed),
        );

        if let Some(FactoryArgs { factory, factory_data }) = factory? {
            if version == EntryPointVersion::V0_6 {
                request.init_code = Some(match (factory, factory_data.as_ref()) {
                    (Some(factory), Some(data)) => pack_factory_data(Some(factory), Some(data)),
                    _ => Bytes::default(),
                });
            } else {
                request.factory = factory;
                request.factory_data = factory_data;
            }
        }
        if let Some(fees) = fees {
            request.max_fee_per_gas = request.max_fee_per_gas.or(Some(fees.max_fee_per_gas));
            request.max_priority_fee_per_gas =
                request.max_priority_fee_per_gas.or(Some(fees.max_priority_fee_per_gas));
        }
        if let Some(nonce) = nonce? {
            request.nonce = Some(nonce);
        }
        if let Some(authorization) = authorization? {
            request.authorization = Some(authorization);
        }
        if parameters.contains(PrepareParameter::Signature) && request.signature.is_none() {
            request.signature = Some(account.get_stub_signature());
        }

        // paymaster stub data is needed to estimate paymaster gas
        let mut paymaster_final = false;
        let rpc_paymaster = match &self.paymaster {
            Some(PaymasterSource::Rpc { client, context })
                if parameters.contains(PrepareParameter::Paymaster) && !caller_paymaster =>
            {
                Some((client, request.paymaster_context.clone().or_else(|| context.clone())))
            }
            _ => None,
        };
        if let Some((client, context)) = &rpc_paymaster {
            let chain_id = self.chain_id().await?;
            let uo = request.clone().into_user_operation(version)?;
            let stub = client
                .get_paymaster_stub_data(uo, entry_point.address, chain_id.into(), context.clone())
                .await
                .map_err(ClientError::Paymaster)?;
            debug!("Paymaster stub data {stub:?}");
            paymaster_final = stub.is_final.unwrap_or_default();
            stub.apply(&mut request);
        }

        if parameters.contains(PrepareParameter::Gas) && request.needs_gas() {
            if let Some(gas) = account.estimate_gas(&request).await? {
                trace!("Account estimated gas {gas:?}");
                apply_gas_limits(&mut request, gas);
            }
        }
        if parameters.contains(PrepareParameter::Gas) && request.needs_gas() {
            let mut estimation = request.clone();
            if estimation.signature.is_none() {
                estimation.signature = Some(account.get_stub_signature());
            }
            let uo = estimation.into_user_operation(version)?;
            let gas = self.estimate_user_operation_gas_at(&uo, &entry_point.address).await?;
            trace!("Estimated gas {gas:?}");

            let paymaster = request.paymaster.is_some();
            apply_gas_limits(
                &mut request,
                GasLimits {
                    call_gas_limit: Some(gas.call_gas_limit),
                    verification_gas_limit: Some(gas.verification_gas_limit),
                    pre_verification_gas: Some(gas.pre_verification_gas),
                    paymaster_verification_gas_limit: gas
                        .paymaster_verification_gas_limit
                        .filter(|_| paymaster),
                    paymaster_post_op_gas_limit: gas
                        .paymaster_post_op_gas_limit
                        .filter(|_| paymaster),
                },
            );
        }

        if let Some((client, context)) = rpc_paymaster.filter(|_| !paymaster_final) {
            let chain_id = self.chain_id().await?;
            let uo = request.clone().into_user_operation(version)?;
            let data = client
                .get_paymaster_data(uo, entry_point.address, chain_id.into(), context)
                .await
                .map_err(ClientError::Paymaster)?;
            data.apply(&mut request);
        }

        debug!(
            "Prepared user operation of {:?} (nonce {:?}) for entry point {:?}",
            request.sender, request.nonce, entry_point.address
        );
        request.paymaster_context = None;
        Ok(request)
    }

    fn with_defaults(&self, mut request: UserOperationRequest) -> UserOperationRequest {
        let defaults = &self.config.user_operation_defaults;
        request.call_gas_limit = request.call_gas_limit.or(defaults.call_gas_limit);
        request.verification_gas_limit =
            request.verification_gas_limit.or(defaults.verification_gas_limit);
        request.pre_verification_gas =
            request.pre_verification_gas.or(defaults.pre_verification_gas);
        request.max_fee_per_gas = request.max_fee_per_gas.or(defaults.max_fee_per_gas);
        request.max_priority_fee_per_gas =
            request.max_priority_fee_per_gas.or(defaults.max_priority_fee_per_gas);
        request
    }

    async fn resolve_factory(
        &self,
        account: &dyn SmartAccount,
        request: &UserOperationRequest,
        parameters: EnumSet<PrepareParameter>,
        deployed: &OnceCell<bool>,
    ) -> Result<Option<FactoryArgs>, ClientError> {
        if !parameters.contains(PrepareParameter::Factory) || request.has_factory() {
            return Ok(None);
        }
        if is_deployed(account, deployed).await? {
            return Ok(Some(FactoryArgs::default()));
        }
        Ok(Some(account.get_factory_args().await?))
    }

    /// Fees are best effort: estimation failures leave them unset
    async fn resolve_fees(
        &self,
        request: &UserOperationRequest,
        parameters: EnumSet<PrepareParameter>,
    ) -> Option<Fees> {
        if !parameters.contains(PrepareParameter::Fees) ||
            (request.max_fee_per_gas.is_some() && request.max_priority_fee_per_gas.is_some())
        {
            return None;
        }
        let Some(estimator) = &self.fee_estimator else {
            warn!("No fee estimator configured, fees of {:?} are left unset", request.sender);
            return None;
        };
        match estimator.estimate_fees().await {
            Ok(fees) => Some(fees.with_margin(&self.config.fees)),
            Err(err) => {
                warn!("Fee estimation failed: {err:?}");
                None
            }
        }
    }

    async fn resolve_nonce(
        &self,
        account: &dyn SmartAccount,
        request: &UserOperationRequest,
        parameters: EnumSet<PrepareParameter>,
    ) -> Result<Option<U256>, ClientError> {
        if !parameters.contains(PrepareParameter::Nonce) || request.nonce.is_some() {
            return Ok(None);
        }
        let key = match (request.nonce_key, &self.nonce_key_manager) {
            (Some(key), _) => Some(key),
            (None, Some(manager)) => {
                let sender = request.sender.unwrap_or_default();
                let chain_id = self.chain_id().await?;
                Some(manager.next_key(sender, account.entry_point().address, chain_id))
            }
            (None, None) => None,
        };
        Ok(Some(account.get_nonce(key).await?))
    }

    async fn resolve_authorization(
        &self,
        account: &dyn SmartAccount,
        request: &UserOperationRequest,
        parameters: EnumSet<PrepareParameter>,
        deployed: &OnceCell<bool>,
    ) -> Result<Option<SignedAuthorization>, ClientError> {
        if !parameters.contains(PrepareParameter::Authorization) || request.authorization.is_some()
        {
            return Ok(None);
        }
        if is_deployed(account, deployed).await? {
            return Ok(None);
        }
        Ok(account.authorization().await?.map(|authorization| authorization.into_stub()))
    }
}

/// Deployment state of the account, read once per preparation
async fn is_deployed(
    account: &dyn SmartAccount,
    deployed: &OnceCell<bool>,
) -> Result<bool, ClientError> {
    Ok(*deployed.get_or_try_init(|| account.is_deployed()).await?)
}

/// Fills the gas limits the request does not carry yet
fn apply_gas_limits(request: &mut UserOperationRequest, gas: GasLimits) {
    request.call_gas_limit = request.call_gas_limit.or(gas.call_gas_limit);
    request.verification_gas_limit = request.verification_gas_limit.or(gas.verification_gas_limit);
    request.pre_verification_gas = request.pre_verification_gas.or(gas.pre_verification_gas);
    request.paymaster_verification_gas_limit =
        request.paymaster_verification_gas_limit.or(gas.paymaster_verification_gas_limit);
    request.paymaster_post_op_gas_limit =
        request.paymaster_post_op_gas_limit.or(gas.paymaster_post_op_gas_limit);
}
