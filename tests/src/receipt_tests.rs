use crate::common::{raw_receipt, request, Context, MockAccount};
use ethers::types::{Address, H256, U256};
use std::time::Duration;
use userop_client::{BundlerClientConfig, ClientError};
use userop_primitives::{
    EntryPoint, EntryPointVersion, ReceiptError, ReceiptStatus, TransactionType, UserOperation,
    UserOperationByHash, UserOperationHash, UserOperationV0_7,
};

fn fast_polls(timeout: Option<Duration>) -> BundlerClientConfig {
    BundlerClientConfig::default().poll_interval(Duration::from_millis(10)).timeout(timeout)
}

#[tokio::test]
async fn wait_for_receipt() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7))
        .await?
        .map_client(|client| client.with_config(fast_polls(Some(Duration::from_secs(5)))));

    let hash = ctx.client.send_user_operation(request(Address::zero())).await?;
    {
        let mut bundler = ctx.bundler.lock();
        let receipt =
            raw_receipt(hash, ctx.account.address, ctx.account.entry_point.address)?;
        bundler.receipts.insert(hash, receipt);
        bundler.pending_polls = 2;
    }

    let receipt = ctx.client.wait_for_user_operation_receipt(hash, None, None).await?;
    assert_eq!(ctx.bundler.lock().receipt_polls, 3);
    // polling stops with the receipt
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ctx.bundler.lock().receipt_polls, 3);

    assert_eq!(receipt.user_operation_hash, hash);
    assert_eq!(receipt.sender, ctx.account.address);
    assert_eq!(receipt.nonce, 5.into());
    assert_eq!(receipt.actual_gas_used, 120_000.into());
    assert_eq!(receipt.actual_gas_cost, U256::exp10(16));
    assert!(receipt.success);
    assert_eq!(receipt.logs[0].log_index, Some(1));
    assert_eq!(receipt.receipt.block_number, 16);
    assert_eq!(receipt.receipt.status, ReceiptStatus::Success);
    assert_eq!(receipt.receipt.transaction_type, TransactionType::Eip1559);
    assert_eq!(receipt.receipt.effective_gas_price, Some(1_000_000_000.into()));
    Ok(())
}

#[tokio::test]
async fn wait_times_out() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7)).await?;
    let hash = UserOperationHash::from(H256::repeat_byte(0x42));

    let err = ctx
        .client
        .wait_for_user_operation_receipt(
            hash,
            Some(Duration::from_millis(10)),
            Some(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout { hash: h } if h == hash));
    assert_eq!(
        err.to_string(),
        format!("Timed out while waiting for User Operation with hash {hash}.")
    );
    assert!(ctx.bundler.lock().receipt_polls >= 2);
    Ok(())
}

#[tokio::test]
async fn polling_error_ends_the_wait() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7))
        .await?
        .map_client(|client| client.with_config(fast_polls(Some(Duration::from_secs(5)))));
    let hash = UserOperationHash::from(H256::repeat_byte(0x42));
    {
        let mut bundler = ctx.bundler.lock();
        let receipt = raw_receipt(hash, ctx.account.address, ctx.account.entry_point.address)?;
        bundler.receipts.insert(hash, receipt);
        bundler.pending_polls = 5;
        bundler.failing_poll = Some(2);
    }

    let err = ctx.client.wait_for_user_operation_receipt(hash, None, None).await.unwrap_err();
    assert!(matches!(err, ClientError::Rpc(_)), "{err:?}");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ctx.bundler.lock().receipt_polls, 2);
    Ok(())
}

#[tokio::test]
async fn configured_timeout() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7))
        .await?
        .map_client(|client| client.with_config(fast_polls(Some(Duration::from_millis(50)))));

    let err = ctx
        .client
        .wait_for_user_operation_receipt(H256::zero().into(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout { .. }));
    Ok(())
}

#[tokio::test]
async fn missing_receipt() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7)).await?;
    assert_eq!(ctx.client.get_user_operation_receipt(H256::zero().into()).await?, None);
    Ok(())
}

#[tokio::test]
async fn malformed_receipt() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_7)).await?;
    let hash = UserOperationHash::from(H256::repeat_byte(0x42));
    let mut receipt = raw_receipt(hash, ctx.account.address, ctx.account.entry_point.address)?;
    receipt.receipt.transaction_type = "0x9".into();
    ctx.bundler.lock().receipts.insert(hash, receipt);

    let err = ctx.client.get_user_operation_receipt(hash).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Receipt(ReceiptError::UnknownTransactionType(ref t)) if t == "0x9"
    ));
    Ok(())
}

#[tokio::test]
async fn user_operation_is_tagged_with_its_entry_point() -> eyre::Result<()> {
    let ctx = Context::new(MockAccount::new(EntryPointVersion::V0_8)).await?;
    let hash = UserOperationHash::from(H256::repeat_byte(0x42));
    let included = UserOperationByHash {
        user_operation: UserOperation::V0_8(UserOperationV0_7 {
            sender: ctx.account.address,
            nonce: 3.into(),
            ..Default::default()
        }),
        entry_point: EntryPoint::canonical(EntryPointVersion::V0_8).address,
        transaction_hash: H256::repeat_byte(0x03),
        block_hash: H256::repeat_byte(0x02),
        block_number: 16.into(),
    };
    ctx.bundler.lock().user_operations.insert(hash, included);

    let found = ctx.client.get_user_operation(hash).await?.expect("user operation");
    assert_eq!(found.user_operation.version(), EntryPointVersion::V0_8);
    assert_eq!(found.user_operation.nonce(), 3.into());
    assert_eq!(ctx.client.get_user_operation(H256::zero().into()).await?, None);
    Ok(())
}
