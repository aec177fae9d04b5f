mod common;

use common::{Fixture, Harness};
use gig_market::error::MarketError;
use gig_market::marketplace::commands::{CreateReviewCommand, RespondToReviewCommand};
use gig_market::marketplace::model::{OrderId, Review, SellerLevel};
use gig_market::notification::NotificationKind;

fn review_of(order_id: OrderId, ratings: (i32, i32, i32)) -> CreateReviewCommand {
    CreateReviewCommand {
        order_id,
        communication_rating: ratings.0,
        service_rating: ratings.1,
        recommendation_rating: ratings.2,
        comment: Some("빠르고 친절했어요".to_string()),
    }
}

fn response(text: &str) -> RespondToReviewCommand {
    RespondToReviewCommand {
        response: text.to_string(),
    }
}

async fn reviewed_order(h: &Harness, fx: &Fixture, ratings: (i32, i32, i32)) -> Review {
    let order = h.completed_order(fx).await;
    h.market
        .create_review(fx.buyer, review_of(order.id, ratings))
        .await
        .unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// region:    --- Reviews

#[tokio::test]
async fn review_averages_the_three_ratings() {
    let h = Harness::new();
    let fx = h.fixture().await;

    let review = reviewed_order(&h, &fx, (4, 5, 3)).await;
    assert!(close(review.overall_rating, 4.0));
    assert_eq!(review.reviewer_id, fx.buyer);
    assert_eq!(review.reviewee_id, fx.seller_user);
    assert_eq!(review.gig_id, fx.gig_id);

    let profile = h.seller_profile(fx.seller_id).await.unwrap();
    assert_eq!(profile.rating_average, Some(4.0));
    assert_eq!(
        h.sink.sent_to(fx.seller_user).last().map(|n| n.kind),
        Some(NotificationKind::NewReview)
    );
}

#[tokio::test]
async fn seller_rating_is_the_mean_of_all_reviews() {
    let h = Harness::new();
    let fx = h.fixture().await;

    reviewed_order(&h, &fx, (4, 5, 3)).await;
    reviewed_order(&h, &fx, (5, 5, 5)).await;
    reviewed_order(&h, &fx, (3, 3, 3)).await;

    let profile = h.seller_profile(fx.seller_id).await.unwrap();
    assert!(close(profile.rating_average.unwrap(), 4.0));
    assert_eq!(h.gig_stats(fx.gig_id).await.unwrap().total_reviews, 3);

    assert_eq!(h.market.seller_reviews(fx.seller_id).await.unwrap().len(), 3);
    assert_eq!(h.market.gig_reviews(fx.gig_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn review_needs_a_completed_order() {
    let h = Harness::new();
    let fx = h.fixture().await;
    let order = h.delivered_order(&fx).await;

    let err = h
        .market
        .create_review(fx.buyer, review_of(order.id, (5, 5, 5)))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidState(_)));
}

#[tokio::test]
async fn only_the_buyer_reviews_once() {
    let h = Harness::new();
    let fx = h.fixture().await;
    let order = h.completed_order(&fx).await;

    let err = h
        .market
        .create_review(fx.seller_user, review_of(order.id, (5, 5, 5)))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::PermissionDenied(_)));

    h.market
        .create_review(fx.buyer, review_of(order.id, (5, 5, 5)))
        .await
        .unwrap();
    let err = h
        .market
        .create_review(fx.buyer, review_of(order.id, (1, 1, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Conflict(_)));
    assert_eq!(h.gig_stats(fx.gig_id).await.unwrap().total_reviews, 1);
}

#[tokio::test]
async fn ratings_outside_one_to_five_are_rejected() {
    let h = Harness::new();
    let fx = h.fixture().await;
    let order = h.completed_order(&fx).await;

    for ratings in [(0, 5, 5), (5, 6, 5), (5, 5, -1)] {
        let err = h
            .market
            .create_review(fx.buyer, review_of(order.id, ratings))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)), "{:?}", ratings);
    }
    assert!(h.market.gig_reviews(fx.gig_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn seller_responds_once_to_own_review() {
    let h = Harness::new();
    let fx = h.fixture().await;
    let review = reviewed_order(&h, &fx, (4, 4, 4)).await;

    let err = h
        .market
        .respond_to_review(review.id, fx.seller_user, response("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Validation(_)));

    let err = h
        .market
        .respond_to_review(review.id, fx.buyer, response("구매자 답글"))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::PermissionDenied(_)));

    let answered = h
        .market
        .respond_to_review(review.id, fx.seller_user, response(" 감사합니다! "))
        .await
        .unwrap();
    assert_eq!(answered.seller_response.as_deref(), Some("감사합니다!"));
    assert_eq!(answered.seller_response_date, Some(h.clock_now()));

    let err = h
        .market
        .respond_to_review(review.id, fx.seller_user, response("한 번 더"))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Conflict(_)));
}

#[tokio::test]
async fn concurrent_reviews_of_one_seller_both_count() {
    let h = Harness::new();
    let fx = h.fixture().await;
    let first = h.completed_order(&fx).await;
    let second = h.completed_order(&fx).await;

    let (a, b) = tokio::join!(
        h.market.create_review(fx.buyer, review_of(first.id, (5, 5, 5))),
        h.market.create_review(fx.buyer, review_of(second.id, (3, 3, 3)))
    );
    a.unwrap();
    b.unwrap();

    let profile = h.seller_profile(fx.seller_id).await.unwrap();
    assert!(close(profile.rating_average.unwrap(), 4.0));
    assert_eq!(h.gig_stats(fx.gig_id).await.unwrap().total_reviews, 2);
    assert_eq!(h.market.seller_reviews(fx.seller_id).await.unwrap().len(), 2);
}
// endregion: --- Reviews

// region:    --- Levels / Ranking

#[tokio::test]
async fn ten_completed_and_well_rated_orders_reach_level_one() {
    let h = Harness::new();
    let fx = h.fixture().await;

    let mut completed = Vec::new();
    for _ in 0..10 {
        completed.push(h.completed_order(&fx).await);
    }
    let profile = h.seller_profile(fx.seller_id).await.unwrap();
    assert_eq!(profile.account_level, SellerLevel::New);
    assert_eq!(profile.total_earnings, 80_000);

    h.market
        .create_review(fx.buyer, review_of(completed[0].id, (5, 5, 5)))
        .await
        .unwrap();
    let profile = h.seller_profile(fx.seller_id).await.unwrap();
    assert_eq!(profile.account_level, SellerLevel::Level1);
}

#[tokio::test]
async fn short_tenure_keeps_seller_new() {
    let h = Harness::new();
    let (seller_user, seller_id) = h.seller_with_tenure(10).await;
    let buyer = h.buyer().await;
    let gig_id = h.gig(seller_id).await;
    let package_id = h
        .package(
            gig_id,
            gig_market::gateway::PackageType::Basic,
            5_000,
            2,
            1,
        )
        .await;
    let fx = Fixture {
        seller_user,
        seller_id,
        buyer,
        gig_id,
        package_id,
    };

    for _ in 0..10 {
        reviewed_order(&h, &fx, (5, 5, 5)).await;
    }
    let profile = h.seller_profile(seller_id).await.unwrap();
    assert_eq!(profile.account_level, SellerLevel::New);
}

#[tokio::test]
async fn completion_stores_the_ranking_score() {
    let h = Harness::new();
    let fx = h.fixture().await;
    h.completed_order(&fx).await;

    // 판매자 1.78, 긱 0.01 + 0.2 + 0.5, 콘텐츠 5*0.4 + 7*0.3 + 8*0.3
    let expected = 1.78 * 0.4 + 0.71 * 0.35 + 6.5 * 0.25;
    let stats = h.gig_stats(fx.gig_id).await.unwrap();
    assert!(close(stats.ranking_score, expected), "{}", stats.ranking_score);
    assert_eq!(stats.total_orders, 1);

    let ranking = h.market.gig_ranking(fx.gig_id).await.unwrap();
    assert_eq!(ranking.gig_id, fx.gig_id);
    assert!(close(ranking.breakdown.seller_score, 1.78));
    assert!(close(ranking.breakdown.gig_score, 0.71));
    assert!(close(ranking.breakdown.content_score, 6.5));
    assert!(close(ranking.breakdown.total, expected));
}

#[tokio::test]
async fn ranking_picks_up_reviews_on_next_recompute() {
    let h = Harness::new();
    let fx = h.fixture().await;
    reviewed_order(&h, &fx, (5, 5, 5)).await;

    let ranking = h.market.gig_ranking(fx.gig_id).await.unwrap();
    // 평점 5.0, 리뷰 1건
    assert!(close(ranking.breakdown.seller_score, 5.0 * 0.5 + 0.16 + 0.12));
    assert!(close(ranking.breakdown.gig_score, 0.71 + 0.05));
    let stats = h.gig_stats(fx.gig_id).await.unwrap();
    assert!(close(stats.ranking_score, ranking.breakdown.total));
}

#[tokio::test]
async fn ranking_of_unknown_gig_is_not_found() {
    let h = Harness::new();
    let err = h
        .market
        .gig_ranking(gig_market::marketplace::model::GigId(uuid::Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::NotFound { entity: "gig", .. }));
}
// endregion: --- Levels / Ranking
