use payloads::requests::MutationRequest;
use payloads::{AccountId, Reference, max_amount, min_amount};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use test_helpers::assert_status_code;
use uuid::Uuid;

fn request(
    account_id: AccountId,
    amount: Decimal,
    reference: &str,
) -> MutationRequest {
    MutationRequest {
        account_id,
        amount,
        reference_id: Reference(reference.to_string()),
        description: Some("test".into()),
        metadata: None,
    }
}

#[tokio::test]
async fn top_up_credits_the_account_and_debits_treasury()
-> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id =
        app.seed_user_account(asset_type_id, "alice", Decimal::ZERO).await?;

    let response = app
        .client
        .top_up(&request(account_id, Decimal::new(500, 2), "topup-1"))
        .await?;

    assert_eq!(response.balance_after, Decimal::new(500, 2));
    assert!(!response.idempotent);

    let balance = app.client.balance(&account_id).await?;
    assert_eq!(balance.balance, Decimal::new(500, 2));

    Ok(())
}

#[tokio::test]
async fn spend_debits_the_account_and_credits_revenue() -> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id = app
        .seed_user_account(asset_type_id, "alice", Decimal::new(1000, 2))
        .await?;

    let response = app
        .client
        .spend(&request(account_id, Decimal::new(300, 2), "spend-1"))
        .await?;

    assert_eq!(response.balance_after, Decimal::new(700, 2));

    let balance = app.client.balance(&account_id).await?;
    assert_eq!(balance.balance, Decimal::new(700, 2));

    Ok(())
}

#[tokio::test]
async fn bonus_credits_the_account_from_the_bonus_pool() -> anyhow::Result<()>
{
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id =
        app.seed_user_account(asset_type_id, "alice", Decimal::ZERO).await?;

    let response = app
        .client
        .bonus(&request(account_id, Decimal::new(1000, 2), "bonus-1"))
        .await?;

    assert_eq!(response.balance_after, Decimal::new(1000, 2));

    Ok(())
}

#[tokio::test]
async fn spend_beyond_balance_is_rejected() -> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id = app
        .seed_user_account(asset_type_id, "alice", Decimal::new(100, 2))
        .await?;

    let result = app
        .client
        .spend(&request(account_id, Decimal::new(101, 2), "spend-over"))
        .await;

    assert_status_code(result, StatusCode::UNPROCESSABLE_ENTITY);

    // Balance must be untouched by the rejected attempt.
    let balance = app.client.balance(&account_id).await?;
    assert_eq!(balance.balance, Decimal::new(100, 2));

    Ok(())
}

#[tokio::test]
async fn spend_of_exactly_the_balance_leaves_zero() -> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id = app
        .seed_user_account(asset_type_id, "alice", Decimal::new(100, 2))
        .await?;

    let response = app
        .client
        .spend(&request(account_id, Decimal::new(100, 2), "spend-exact"))
        .await?;

    assert_eq!(response.balance_after, Decimal::ZERO);

    Ok(())
}

#[tokio::test]
async fn top_up_for_an_unknown_account_is_not_found() -> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let nonexistent = AccountId(Uuid::new_v4());

    let result = app
        .client
        .top_up(&request(nonexistent, Decimal::new(100, 2), "topup-ghost"))
        .await;

    assert_status_code(result, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn amount_below_the_minimum_is_rejected() -> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id =
        app.seed_user_account(asset_type_id, "alice", Decimal::ZERO).await?;

    let result = app
        .client
        .top_up(&request(account_id, Decimal::ZERO, "topup-zero"))
        .await;
    assert_status_code(result, StatusCode::BAD_REQUEST);

    let result = app
        .client
        .top_up(&request(account_id, Decimal::new(-1, 8), "topup-negative"))
        .await;
    assert_status_code(result, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn amount_at_exactly_the_minimum_is_accepted() -> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id =
        app.seed_user_account(asset_type_id, "alice", Decimal::ZERO).await?;

    let response = app
        .client
        .top_up(&request(account_id, min_amount(), "topup-min"))
        .await?;
    assert_eq!(response.balance_after, min_amount());

    Ok(())
}

#[tokio::test]
async fn amount_above_the_maximum_is_rejected() -> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id =
        app.seed_user_account(asset_type_id, "alice", Decimal::ZERO).await?;

    let too_much = max_amount() + Decimal::new(1, 8);
    let result = app
        .client
        .top_up(&request(account_id, too_much, "topup-too-much"))
        .await;
    assert_status_code(result, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn spending_a_foreign_asset_account_is_an_asset_mismatch()
-> anyhow::Result<()> {
    // Spend looks up the revenue account for the user's own asset type, so
    // mismatches only surface if a future flow crosses asset types; today
    // the only way to reach this path is a second asset type whose system
    // account is unseeded. Exercise that instead: resolving a counterparty
    // for an asset type with no seeded system accounts reports a
    // configuration error, not an invented balance.
    let app = test_helpers::spawn_app().await;
    use sqlx::Row;
    let row = sqlx::query("INSERT INTO asset_types (id, code, display_name, is_active) VALUES ($1, $2, $3, true) RETURNING id")
        .bind(uuid::Uuid::new_v4())
        .bind("EUR")
        .bind("EUR asset type")
        .fetch_one(&app.db_pool)
        .await?;
    let asset_type_id: Uuid = row.get("id");

    sqlx::query(
        "INSERT INTO accounts (id, external_id, kind, asset_type_id, display_name, is_active) \
         VALUES ($1, NULL, 'user', $2, 'orphan', true)",
    )
    .bind(uuid::Uuid::new_v4())
    .bind(asset_type_id)
    .execute(&app.db_pool)
    .await?;
    let account_id: Uuid = sqlx::query_scalar(
        "SELECT id FROM accounts WHERE asset_type_id = $1 AND kind = 'user'",
    )
    .bind(asset_type_id)
    .fetch_one(&app.db_pool)
    .await?;
    sqlx::query(
        "INSERT INTO balances (account_id, asset_type_id, balance, version, updated_at) \
         VALUES ($1, $2, 0, 0, now())",
    )
    .bind(account_id)
    .bind(asset_type_id)
    .execute(&app.db_pool)
    .await?;

    let result = app
        .client
        .top_up(&request(
            AccountId(account_id),
            Decimal::new(100, 2),
            "topup-unseeded",
        ))
        .await;

    assert_status_code(result, StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn concurrent_distinct_references_both_commit() -> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id =
        app.seed_user_account(asset_type_id, "alice", Decimal::ZERO).await?;

    let request_a = request(account_id, Decimal::new(100, 2), "concurrent-a");
    let request_b = request(account_id, Decimal::new(200, 2), "concurrent-b");
    let (a, b) = tokio::join!(
        app.client.top_up(&request_a),
        app.client.top_up(&request_b),
    );
    a?;
    b?;

    let balance = app.client.balance(&account_id).await?;
    assert_eq!(balance.balance, Decimal::new(300, 2));
    assert_eq!(app.journal_entry_count(account_id).await?, 2);

    Ok(())
}

#[tokio::test]
async fn double_entry_postings_always_sum_to_zero() -> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id =
        app.seed_user_account(asset_type_id, "alice", Decimal::new(500, 2))
            .await?;

    app.client
        .spend(&request(account_id, Decimal::new(120, 2), "entry-check"))
        .await?;

    let (total,): (Decimal,) =
        sqlx::query_as("SELECT SUM(amount) FROM journal_entries")
            .fetch_one(&app.db_pool)
            .await?;
    assert_eq!(total, Decimal::ZERO);

    Ok(())
}
