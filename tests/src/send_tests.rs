use crate::common::{request, Context, MockAccount, MockFeeEstimator, CHAIN_ID};
use ethers::types::{Address, Bytes, U256};
use futures::future::try_join_all;
use jsonrpsee::types::ErrorObject;
use serde_json::json;
use std::sync::Arc;
use userop_client::{ClientError, MemoryNonceKeyManager};
use userop_primitives::{Authorization, EntryPointVersion, UserOperation};
use userop_rpc::BundlerError;

fn sent(ctx: &Context) -> Vec<UserOperation> {
    ctx.bundler.lock().sent.clone()
}

#[tokio::test]
async fn send_signs_the_prepared_operation() -> eyre::Result<()> {
    for version in [EntryPointVersion::V0_6, EntryPointVersion::V0_7, EntryPointVersion::V0_8] {
        let ctx = Context::new(MockAccount::new(version))
            .await?
            .map_client(|client| {
                client.with_fee_estimator(Arc::new(MockFeeEstimator::new(1, 1)))
            });

        let hash = ctx.client.send_user_operation(request(Address::zero())).await?;

        let sent = sent(&ctx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].version(), version);
        let expected = sent[0].hash(&ctx.account.entry_point.address, CHAIN_ID)?;
        assert_eq!(hash, expected);
        assert_eq!(sent[0].signature(), &MockAccount::signature_of(expected));
    }
    Ok(())
}

#[tokio::test]
async fn given_signature_is_kept() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7)).await?;

    let signature = Bytes::from(vec![0x12, 0x34]);
    ctx.client.send_user_operation(request(Address::zero()).signature(signature.clone())).await?;
    assert_eq!(sent(&ctx)[0].signature(), &signature);
    Ok(())
}

#[tokio::test]
async fn chain_id_is_fetched_once() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7)).await?;

    ctx.client.send_user_operation(request(Address::zero())).await?;
    ctx.client.send_user_operation(request(Address::zero())).await?;
    assert_eq!(ctx.client.chain_id().await?, CHAIN_ID);
    assert_eq!(ctx.bundler.lock().chain_id_calls, 1);
    Ok(())
}

#[tokio::test]
async fn stub_authorization_is_signed_before_sending() -> eyre::Result<()> {
    let authorization = Authorization {
        chain_id: CHAIN_ID.into(),
        address: Address::repeat_byte(0xe6),
        nonce: 0.into(),
    };
    let account = MockAccount::new(EntryPointVersion::V0_8)
        .undeployed()
        .with_authorization(authorization.clone());
    let ctx = Context::new(account).await?;

    ctx.client.send_user_operation(request(Address::zero())).await?;

    // estimated with the stub, sent with the authorization signed by the account
    let estimated = ctx.bundler.lock().estimated[0].authorization().cloned();
    assert!(estimated.is_some_and(|authorization| authorization.is_stub()));
    let sent = sent(&ctx)[0].authorization().cloned().expect("authorization");
    assert!(!sent.is_stub());
    assert_eq!(sent.unsigned(), authorization);
    Ok(())
}

#[tokio::test]
async fn concurrent_sends_use_distinct_nonce_keys() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7))
        .await?
        .map_client(|client| {
            client.with_nonce_key_manager(Arc::new(MemoryNonceKeyManager::default()))
        });

    let sends = (0..4).map(|_| ctx.client.send_user_operation(request(Address::zero())));
    let hashes = try_join_all(sends).await?;

    let mut nonces: Vec<U256> = sent(&ctx).iter().map(UserOperation::nonce).collect();
    nonces.sort();
    let expected: Vec<U256> = (0..4u64).map(|key| (U256::from(key) << 64) + 5).collect();
    assert_eq!(nonces, expected);

    let mut unique = hashes.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), hashes.len());
    Ok(())
}

#[tokio::test]
async fn send_errors_are_classified() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7)).await?;
    ctx.bundler.lock().send_error =
        Some(ErrorObject::owned(-32500, "AA25 invalid account nonce", None::<bool>));

    let request = request(Address::zero()).nonce(9.into());
    let err = ctx.client.send_user_operation(request).await.unwrap_err();
    match err {
        ClientError::Bundler(BundlerError::InvalidAccountNonce { nonce }) => {
            assert_eq!(nonce, Some(9.into()))
        }
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn code_classification_of_estimation_errors() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7)).await?;
    ctx.bundler.lock().estimate_error = Some(ErrorObject::owned(
        -32521,
        "execution reverted",
        Some(json!({ "revertData": "0xdeadbeef" })),
    ));

    let err = ctx.client.estimate_user_operation_gas(request(Address::zero())).await.unwrap_err();
    match err {
        ClientError::Bundler(BundlerError::ExecutionReverted { data, .. }) => {
            assert_eq!(data, Some(Bytes::from(vec![0xde, 0xad, 0xbe, 0xef])))
        }
        other => panic!("unexpected error {other:?}"),
    }
    // nothing was sent
    assert!(sent(&ctx).is_empty());
    Ok(())
}

#[tokio::test]
async fn init_code_context_of_factory_errors() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7).undeployed()).await?;
    ctx.bundler.lock().estimate_error =
        Some(ErrorObject::owned(-32500, "AA13 initCode failed or OOG", None::<bool>));

    let err = ctx.client.send_user_operation(request(Address::zero())).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to simulate deployment for Smart Account.");
    match err {
        ClientError::Bundler(BundlerError::InitCodeFailed { factory, init_code, .. }) => {
            assert_eq!(factory, Some(crate::common::FACTORY));
            assert!(init_code.is_some());
        }
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn unknown_errors_keep_their_cause() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7)).await?;
    ctx.bundler.lock().send_error =
        Some(ErrorObject::owned(-32000, "bundler is syncing", None::<bool>));

    let request = request(Address::zero())
        .call_gas_limit(1.into())
        .verification_gas_limit(1.into())
        .pre_verification_gas(1.into());
    let err = ctx.client.send_user_operation(request).await.unwrap_err();
    assert!(matches!(err, ClientError::Bundler(BundlerError::Unknown { .. })));
    assert!(err.to_string().contains("bundler is syncing"));
    Ok(())
}

#[tokio::test]
async fn supported_entry_points() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_8)).await?;
    assert_eq!(ctx.client.supported_entry_points().await?, vec![ctx.account.entry_point.address]);
    Ok(())
}
