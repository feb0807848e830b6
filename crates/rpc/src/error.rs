//! Classification of bundler failures into typed errors

use ethers::types::{Address, Bytes, U256};
use jsonrpsee::{core::ClientError, types::ErrorObjectOwned};
use std::error::Error;
use thiserror::Error;
use userop_contracts::{decode_revert_reason, revert_data_from_str};
use userop_primitives::{
    constants::rpc_error_codes::{
        EXECUTION_REVERTED, INVALID_FIELDS, OUT_OF_TIME_RANGE, PAYMASTER_DEPOSIT_TOO_LOW,
        PAYMASTER_RATE_LIMIT, PAYMASTER_STAKE_TOO_LOW, REJECTED_BY_ENTRY_POINT,
        REJECTED_BY_OPCODE, REJECTED_BY_PAYMASTER, SIGNATURE_CHECK_FAILED,
        UNSUPPORTED_SIGNATURE_AGGREGATOR,
    },
    pack_factory_data,
    UserOperation, UserOperationRequest,
};

/// Boxed error cause
pub type BoxedCause = Box<dyn Error + Send + Sync + 'static>;

/// Errors reported by bundlers (entry point `AAxx` reasons and ERC-4337 RPC codes)
#[derive(Debug, Error)]
pub enum BundlerError {
    #[error("Smart Account is not deployed.")]
    AccountNotDeployed,

    #[error("{}", execution_reverted_message(.reason))]
    ExecutionReverted { reason: Option<String>, data: Option<Bytes> },

    #[error("Failed to send funds to beneficiary.")]
    FailedToSendToBeneficiary,

    #[error("Gas value overflowed.")]
    GasValuesOverflow,

    #[error("The `handleOps` function was called by the Bundler with a gas limit too low.")]
    HandleOpsOutOfGas,

    #[error("Failed to simulate deployment for Smart Account.")]
    InitCodeFailed {
        factory: Option<Address>,
        factory_data: Option<Bytes>,
        init_code: Option<Bytes>,
    },

    #[error("Smart Account initialization implementation did not create an account.")]
    InitCodeMustCreateSender {
        factory: Option<Address>,
        factory_data: Option<Bytes>,
        init_code: Option<Bytes>,
    },

    #[error("Smart Account initialization implementation does not return the expected sender.")]
    InitCodeMustReturnSender {
        factory: Option<Address>,
        factory_data: Option<Bytes>,
        init_code: Option<Bytes>,
        sender: Option<Address>,
    },

    #[error("Smart Account does not have sufficient funds to execute the User Operation.")]
    InsufficientPrefund,

    #[error("Bundler attempted to call an invalid function on the EntryPoint.")]
    InternalCallOnly,

    #[error("Bundler used an invalid aggregator for handling aggregated User Operations.")]
    InvalidAggregator,

    #[error("Invalid Smart Account nonce used for User Operation.")]
    InvalidAccountNonce { nonce: Option<U256> },

    #[error("Bundler has not set a beneficiary address.")]
    InvalidBeneficiary,

    #[error("Invalid fields set on User Operation.")]
    InvalidFields,

    #[error("Paymaster properties provided are invalid.")]
    InvalidPaymasterAndData,

    #[error("Paymaster deposit for the User Operation is too low.")]
    PaymasterDepositTooLow,

    #[error("The `validatePaymasterUserOp` function on the Paymaster reverted.")]
    PaymasterFunctionReverted,

    #[error("The Paymaster contract has not been deployed.")]
    PaymasterNotDeployed,

    #[error("UserOperation rejected because paymaster (or signature aggregator) is throttled/banned.")]
    PaymasterRateLimit,

    #[error("UserOperation rejected because paymaster (or signature aggregator) is throttled/banned.")]
    PaymasterStakeTooLow,

    #[error("Paymaster `postOp` function reverted.")]
    PaymasterPostOpFunctionReverted,

    #[error("Smart Account has already been deployed.")]
    SenderAlreadyConstructed {
        factory: Option<Address>,
        factory_data: Option<Bytes>,
        init_code: Option<Bytes>,
    },

    #[error("UserOperation rejected because account signature check failed (or paymaster signature, if the paymaster uses its data as signature).")]
    SignatureCheckFailed,

    #[error("The `validateUserOp` function on the Smart Account reverted.")]
    SmartAccountFunctionReverted,

    #[error("UserOperation rejected because account specified unsupported signature aggregator.")]
    UnsupportedSignatureAggregator,

    #[error("User Operation expired.")]
    UserOperationExpired,

    #[error("Paymaster for User Operation expired.")]
    UserOperationPaymasterExpired,

    #[error("Signature provided for the User Operation is invalid.")]
    UserOperationPaymasterSignature,

    #[error("Signature provided for the User Operation is invalid.")]
    UserOperationSignature,

    #[error("UserOperation out of time-range: either wallet or paymaster returned a time-range, and it is already expired (or will expire soon).")]
    UserOperationOutOfTimeRange,

    #[error("User Operation rejected by EntryPoint's `simulateValidation` during account creation or validation.")]
    RejectedByEntryPoint,

    #[error("User Operation rejected by Paymaster's `validatePaymasterUserOp`.")]
    RejectedByPaymaster,

    #[error("User Operation rejected with op code validation error.")]
    RejectedByOpCode,

    #[error("User Operation verification gas limit exceeded.")]
    VerificationGasLimitExceeded,

    #[error("User Operation verification gas limit is too low.")]
    VerificationGasLimitTooLow,

    #[error("An error occurred while executing user operation: {cause}")]
    Unknown {
        #[source]
        cause: BoxedCause,
    },
}

/// User operation fields attached to classified errors
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub sender: Option<Address>,
    pub nonce: Option<U256>,
    pub factory: Option<Address>,
    pub factory_data: Option<Bytes>,
    pub init_code: Option<Bytes>,
}

impl From<&UserOperationRequest> for ErrorContext {
    fn from(request: &UserOperationRequest) -> Self {
        let init_code = request.init_code.clone().or_else(|| {
            request
                .factory
                .map(|factory| pack_factory_data(Some(factory), request.factory_data.as_ref()))
        });
        Self {
            sender: request.sender,
            nonce: request.nonce,
            factory: request.factory_address(),
            factory_data: request.factory_data.clone(),
            init_code,
        }
    }
}

impl From<&UserOperation> for ErrorContext {
    fn from(uo: &UserOperation) -> Self {
        let init_code = uo.init_code();
        let factory_data = uo.factory().and(init_code.get(20..)).map(|data| data.to_vec().into());
        Self {
            sender: Some(uo.sender()),
            nonce: Some(uo.nonce()),
            factory: uo.factory(),
            factory_data,
            init_code: (!init_code.is_empty()).then_some(init_code),
        }
    }
}

type MessageRule = fn(&ErrorContext) -> BundlerError;
type CodeRule = fn(&ErrorContext, &ErrorObjectOwned) -> BundlerError;

/// Entry point reasons, matched in order against the lowercased error message
static MESSAGE_RULES: &[(&str, MessageRule)] = &[
    ("aa20", |_| BundlerError::AccountNotDeployed),
    ("aa91", |_| BundlerError::FailedToSendToBeneficiary),
    ("aa94", |_| BundlerError::GasValuesOverflow),
    ("aa95", |_| BundlerError::HandleOpsOutOfGas),
    ("aa13", |ctx| BundlerError::InitCodeFailed {
        factory: ctx.factory,
        factory_data: ctx.factory_data.clone(),
        init_code: ctx.init_code.clone(),
    }),
    ("aa15", |ctx| BundlerError::InitCodeMustCreateSender {
        factory: ctx.factory,
        factory_data: ctx.factory_data.clone(),
        init_code: ctx.init_code.clone(),
    }),
    ("aa14", |ctx| BundlerError::InitCodeMustReturnSender {
        factory: ctx.factory,
        factory_data: ctx.factory_data.clone(),
        init_code: ctx.init_code.clone(),
        sender: ctx.sender,
    }),
    ("aa21", |_| BundlerError::InsufficientPrefund),
    ("aa92", |_| BundlerError::InternalCallOnly),
    ("aa25", |ctx| BundlerError::InvalidAccountNonce { nonce: ctx.nonce }),
    ("aa96", |_| BundlerError::InvalidAggregator),
    ("aa90", |_| BundlerError::InvalidBeneficiary),
    ("aa93", |_| BundlerError::InvalidPaymasterAndData),
    ("aa31", |_| BundlerError::PaymasterDepositTooLow),
    ("aa33", |_| BundlerError::PaymasterFunctionReverted),
    ("aa30", |_| BundlerError::PaymasterNotDeployed),
    ("aa50", |_| BundlerError::PaymasterPostOpFunctionReverted),
    ("aa23", |_| BundlerError::SmartAccountFunctionReverted),
    ("aa10", |ctx| BundlerError::SenderAlreadyConstructed {
        factory: ctx.factory,
        factory_data: ctx.factory_data.clone(),
        init_code: ctx.init_code.clone(),
    }),
    ("aa22", |_| BundlerError::UserOperationExpired),
    ("aa32", |_| BundlerError::UserOperationPaymasterExpired),
    ("aa34", |_| BundlerError::UserOperationPaymasterSignature),
    ("aa24", |_| BundlerError::UserOperationSignature),
    ("aa40", |_| BundlerError::VerificationGasLimitExceeded),
    ("aa41", |_| BundlerError::VerificationGasLimitTooLow),
];

/// ERC-4337 RPC error codes
static CODE_RULES: &[(i32, CodeRule)] = &[
    (EXECUTION_REVERTED, |_, obj| execution_reverted(obj)),
    (INVALID_FIELDS, |_, _| BundlerError::InvalidFields),
    (PAYMASTER_DEPOSIT_TOO_LOW, |_, _| BundlerError::PaymasterDepositTooLow),
    (PAYMASTER_RATE_LIMIT, |_, _| BundlerError::PaymasterRateLimit),
    (PAYMASTER_STAKE_TOO_LOW, |_, _| BundlerError::PaymasterStakeTooLow),
    (SIGNATURE_CHECK_FAILED, |_, _| BundlerError::SignatureCheckFailed),
    (UNSUPPORTED_SIGNATURE_AGGREGATOR, |_, _| BundlerError::UnsupportedSignatureAggregator),
    (OUT_OF_TIME_RANGE, |_, _| BundlerError::UserOperationOutOfTimeRange),
    (REJECTED_BY_ENTRY_POINT, |_, _| BundlerError::RejectedByEntryPoint),
    (REJECTED_BY_PAYMASTER, |_, _| BundlerError::RejectedByPaymaster),
    (REJECTED_BY_OPCODE, |_, _| BundlerError::RejectedByOpCode),
];

impl BundlerError {
    /// Classifies a failed bundler call.
    ///
    /// The error message is matched against entry point reasons (`AAxx`) first, then the cause
    /// chain is searched for a known RPC error code. Anything else ends up in
    /// [Unknown](BundlerError::Unknown) with the original error as its source.
    pub fn classify(err: impl Into<BoxedCause>, ctx: &ErrorContext) -> Self {
        let cause: BoxedCause = err.into();
        let root: &(dyn Error + 'static) = cause.as_ref();

        let mut objects = Vec::new();
        collect_error_objects(root, &mut objects);

        let message = objects
            .first()
            .map(|obj| obj.message().to_string())
            .unwrap_or_else(|| cause.to_string())
            .to_lowercase();

        if let Some((_, rule)) = MESSAGE_RULES.iter().find(|(reason, _)| message.contains(reason))
        {
            return rule(ctx);
        }

        for obj in objects {
            if let Some((_, rule)) = CODE_RULES.iter().find(|(code, _)| *code == obj.code()) {
                return rule(ctx, obj);
            }
        }

        Self::Unknown { cause }
    }

    /// Classifies a failed [jsonrpsee](jsonrpsee) client call
    pub fn from_client_error(err: ClientError, ctx: &ErrorContext) -> Self {
        Self::classify(err, ctx)
    }
}

/// Collects JSON-RPC error objects found along the cause chain (outermost first)
fn collect_error_objects<'a>(err: &'a (dyn Error + 'static), out: &mut Vec<&'a ErrorObjectOwned>) {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(obj) = err.downcast_ref::<ErrorObjectOwned>() {
            out.push(obj);
        } else if let Some(client_err) = err.downcast_ref::<ClientError>() {
            match client_err {
                ClientError::Call(obj) => out.push(obj),
                ClientError::RestartNeeded(inner) => collect_error_objects(inner.as_ref(), out),
                _ => {}
            }
        }
        current = err.source();
    }
}

fn execution_reverted_message(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!("Execution reverted with reason: {reason}."),
        None => "Execution reverted for an unknown reason.".to_string(),
    }
}

fn execution_reverted(obj: &ErrorObjectOwned) -> BundlerError {
    let data = obj
        .data()
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(raw.get()).ok())
        .and_then(|value| match value {
            serde_json::Value::Object(map) => {
                map.get("revertData").and_then(|d| d.as_str()).and_then(|d| d.parse().ok())
            }
            serde_json::Value::String(s) => revert_data_from_str(&s).ok(),
            _ => None,
        });

    let message = obj.message();
    let stripped = message
        .strip_prefix("execution reverted: ")
        .or_else(|| message.strip_prefix("execution reverted"))
        .unwrap_or(message)
        .trim();
    let reason = if stripped.is_empty() {
        data.clone().and_then(decode_revert_reason)
    } else {
        Some(stripped.to_string())
    };

    BundlerError::ExecutionReverted { reason, data }
}
