mod common;

use chrono::Duration;
use common::{final_delivery, Harness};
use gig_market::error::MarketError;
use gig_market::marketplace::commands::WithdrawalCommand;
use gig_market::marketplace::model::PaymentStatus;

fn withdrawal(amount: i64) -> WithdrawalCommand {
    WithdrawalCommand {
        amount,
        method: "bank_transfer".to_string(),
    }
}

#[tokio::test]
async fn completed_order_releases_eighty_percent_to_seller() {
    let h = Harness::new();
    let fx = h.fixture_with(10_000, 3, 2).await;
    let order = h.delivered_order(&fx).await;
    h.clock.advance(Duration::hours(2));

    h.market.complete_order(order.id, fx.buyer).await.unwrap();

    let payment = h.payment(order.id).await;
    assert_eq!(payment.amount, 10_000);
    assert_eq!(payment.platform_fee, 2_000);
    assert_eq!(payment.seller_amount, 8_000);
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.released_at, Some(h.clock_now()));
    assert_eq!(payment.currency, "USD");
}

#[tokio::test]
async fn fee_split_always_adds_up_to_the_price() {
    let h = Harness::new();
    for price in [1, 99, 12_345, 45_678] {
        let fx = h.fixture_with(price, 2, 1).await;
        let order = h.package_order(&fx).await;
        let payment = h.payment(order.id).await;
        assert_eq!(payment.amount, price);
        assert_eq!(payment.platform_fee + payment.seller_amount, payment.amount);
        assert!(payment.platform_fee >= 0 && payment.seller_amount >= 0);
    }
}

#[tokio::test]
async fn earnings_summary_tracks_open_and_completed_orders() {
    let h = Harness::new();
    let fx = h.fixture_with(10_000, 3, 2).await;
    h.completed_order(&fx).await;
    let open = h.package_order(&fx).await;
    let cancelled = h.package_order(&fx).await;
    h.market.cancel_order(cancelled.id, fx.buyer).await.unwrap();

    let summary = h.market.earnings_summary(fx.seller_user).await.unwrap();
    assert_eq!(summary.total, 8_000);
    assert_eq!(summary.available, 8_000);
    assert_eq!(summary.pending, 8_000);
    assert_eq!(summary.monthly, 8_000);
    assert_eq!(summary.currency, "USD");

    h.market
        .deliver(open.id, fx.seller_user, final_delivery())
        .await
        .unwrap();
    h.clock.advance(Duration::days(30));
    h.market.complete_order(open.id, fx.buyer).await.unwrap();

    let summary = h.market.earnings_summary(fx.seller_user).await.unwrap();
    assert_eq!(summary.total, 16_000);
    assert_eq!(summary.pending, 0);
    assert_eq!(summary.monthly, 8_000);
}

#[tokio::test]
async fn earnings_history_lists_released_payments_newest_first() {
    let h = Harness::new();
    let fx = h.fixture().await;
    let first = h.completed_order(&fx).await;
    h.clock.advance(Duration::days(1));
    let second = h.completed_order(&fx).await;
    h.package_order(&fx).await;

    let history = h.market.earnings_history(fx.seller_user).await.unwrap();
    let orders: Vec<_> = history.iter().map(|p| p.order_id).collect();
    assert_eq!(orders, vec![second.id, first.id]);
    assert!(history
        .iter()
        .all(|p| p.status == PaymentStatus::Completed));
}

#[tokio::test]
async fn withdrawal_is_limited_to_available_balance() {
    let h = Harness::new();
    let fx = h.fixture_with(10_000, 3, 2).await;
    h.completed_order(&fx).await;

    let err = h
        .market
        .request_withdrawal(fx.seller_user, withdrawal(8_001))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MarketError::InsufficientBalance {
            requested: 8_001,
            available: 8_000
        }
    ));

    let receipt = h
        .market
        .request_withdrawal(fx.seller_user, withdrawal(8_000))
        .await
        .unwrap();
    assert_eq!(receipt.amount, 8_000);
    assert_eq!(receipt.seller_user_id, fx.seller_user);
    assert_eq!(receipt.method, "bank_transfer");
    assert_eq!(receipt.requested_at, h.clock_now());
}

#[tokio::test]
async fn withdrawal_rejects_bad_input() {
    let h = Harness::new();
    let fx = h.fixture().await;

    let err = h
        .market
        .request_withdrawal(fx.seller_user, withdrawal(0))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Validation(_)));

    let err = h
        .market
        .request_withdrawal(
            fx.seller_user,
            WithdrawalCommand {
                amount: 100,
                method: "  ".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Validation(_)));

    let err = h
        .market
        .request_withdrawal(fx.seller_user, withdrawal(100))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::InsufficientBalance { .. }));
}

#[tokio::test]
async fn payment_is_visible_only_to_order_parties() {
    let h = Harness::new();
    let fx = h.fixture().await;
    let stranger = h.buyer().await;
    let order = h.package_order(&fx).await;
    let payment = h.payment(order.id).await;

    let seen = h.market.get_payment(payment.id, fx.buyer).await.unwrap();
    assert_eq!(seen.order_id, order.id);
    assert!(h.market.get_payment(payment.id, fx.seller_user).await.is_ok());

    let err = h.market.get_payment(payment.id, stranger).await.unwrap_err();
    assert!(matches!(err, MarketError::PermissionDenied(_)));
}

#[tokio::test]
async fn concurrent_completions_both_reach_seller_earnings() {
    let h = Harness::new();
    let fx = h.fixture_with(10_000, 3, 2).await;
    let first = h.delivered_order(&fx).await;
    let second = h.delivered_order(&fx).await;

    let (a, b) = tokio::join!(
        h.market.complete_order(first.id, fx.buyer),
        h.market.complete_order(second.id, fx.buyer)
    );
    a.unwrap();
    b.unwrap();

    let profile = h.seller_profile(fx.seller_id).await.unwrap();
    assert_eq!(profile.total_earnings, 16_000);
    assert_eq!(h.gig_stats(fx.gig_id).await.unwrap().total_orders, 2);
    let summary = h.market.earnings_summary(fx.seller_user).await.unwrap();
    assert_eq!(summary.available, 16_000);
}
