use payloads::requests::MutationRequest;
use payloads::{AccountId, Reference};
use rust_decimal::Decimal;

fn request(account_id: AccountId, amount: Decimal, reference: &str) -> MutationRequest {
    MutationRequest {
        account_id,
        amount,
        reference_id: Reference(reference.to_string()),
        description: Some("test".into()),
        metadata: None,
    }
}

#[tokio::test]
async fn replaying_a_reference_returns_the_captured_response()
-> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id =
        app.seed_user_account(asset_type_id, "alice", Decimal::ZERO).await?;

    let first = app
        .client
        .top_up(&request(account_id, Decimal::new(500, 2), "replay-1"))
        .await?;
    assert!(!first.idempotent);

    let second = app
        .client
        .top_up(&request(account_id, Decimal::new(500, 2), "replay-1"))
        .await?;
    assert!(second.idempotent);
    assert_eq!(second.transaction_id, first.transaction_id);
    assert_eq!(second.balance_after, first.balance_after);

    let balance = app.client.balance(&account_id).await?;
    assert_eq!(balance.balance, Decimal::new(500, 2));
    assert_eq!(app.journal_entry_count(account_id).await?, 1);

    Ok(())
}

#[tokio::test]
async fn replaying_with_a_different_amount_still_returns_the_original()
-> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id =
        app.seed_user_account(asset_type_id, "alice", Decimal::ZERO).await?;

    app.client
        .top_up(&request(account_id, Decimal::new(500, 2), "replay-2"))
        .await?;

    // A caller that reuses a reference with a different body is a bug on
    // their end, but the ledger still replays the captured response rather
    // than double-posting.
    let replay = app
        .client
        .top_up(&request(account_id, Decimal::new(999, 2), "replay-2"))
        .await?;
    assert!(replay.idempotent);
    assert_eq!(replay.amount, Decimal::new(500, 2));

    let balance = app.client.balance(&account_id).await?;
    assert_eq!(balance.balance, Decimal::new(500, 2));

    Ok(())
}

#[tokio::test]
async fn concurrent_identical_references_post_exactly_once()
-> anyhow::Result<()> {
    let app = test_helpers::spawn_app().await;
    let asset_type_id = app.seed_asset_type("USD").await?;
    let account_id =
        app.seed_user_account(asset_type_id, "alice", Decimal::ZERO).await?;

    let request_a = request(account_id, Decimal::new(500, 2), "race-same-reference");
    let request_b = request(account_id, Decimal::new(500, 2), "race-same-reference");
    let (a, b) = tokio::join!(
        app.client.top_up(&request_a),
        app.client.top_up(&request_b),
    );

    // Whichever request's idempotency lookup ran first wins outright; the
    // other either replays its captured response (lookup ran after the
    // winner committed) or loses the reference's uniqueness check (lookup
    // ran concurrently, so it never saw a captured response to replay).
    // Either way exactly one posting survives.
    let results = [a, b];
    let successes: Vec<_> =
        results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert!(!successes.is_empty());
    let reference_conflicts = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(payloads::api_client::ClientError::APIError(
                    reqwest::StatusCode::CONFLICT,
                    _
                ))
            )
        })
        .count();
    assert_eq!(successes.len() + reference_conflicts, 2);

    let balance = app.client.balance(&account_id).await?;
    assert_eq!(balance.balance, Decimal::new(500, 2));
    assert_eq!(app.journal_entry_count(account_id).await?, 1);

    Ok(())
}
