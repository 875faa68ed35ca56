use payloads::requests::MutationRequest;
use payloads::{AccountId, Reference};
use rust_decimal::Decimal;

fn request(account_id: AccountId, amount: Decimal, reference: &str) -> MutationRequest {
    MutationRequest {
        account_id,
        amount,
        reference_id: Reference(reference.to_string()),
        description: None,
        metadata: None,
    }
}

#[tokio::test]
async fn audit_is_consistent_after_ordinary_flows() -> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id =
        app.seed_user_account(asset_type_id, "alice", Decimal::ZERO).await?;

    app.client
        .top_up(&request(account_id, Decimal::new(500, 2), "audit-1"))
        .await?;
    app.client
        .spend(&request(account_id, Decimal::new(200, 2), "audit-2"))
        .await?;

    let report = app.client.audit(&account_id).await?;
    assert!(report.is_consistent);
    assert_eq!(report.cached_balance, Decimal::new(300, 2));
    assert_eq!(report.computed_balance, Decimal::new(300, 2));
    assert_eq!(report.discrepancy, Decimal::ZERO);

    Ok(())
}

#[tokio::test]
async fn audit_flags_a_cache_drifted_from_the_journal() -> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id = app
        .seed_user_account(asset_type_id, "alice", Decimal::new(100, 2))
        .await?;

    app.client
        .top_up(&request(account_id, Decimal::new(50, 2), "audit-drift"))
        .await?;

    // Corrupt the cached balance directly, bypassing the posting engine, to
    // simulate the cache having drifted from the journal it's meant to
    // mirror.
    sqlx::query("UPDATE balances SET balance = balance + 1 WHERE account_id = $1")
        .bind(account_id)
        .execute(&app.db_pool)
        .await?;

    let report = app.client.audit(&account_id).await?;
    assert!(!report.is_consistent);
    assert_eq!(report.discrepancy, Decimal::ONE);

    Ok(())
}
