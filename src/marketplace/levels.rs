/// 판매자 등급
/// 완료 주문 수, 평균 평점, 활동 기간으로 가장 높은 만족 등급을 고른다.
// region:    --- Imports
use super::model::{OrderStatus, SellerId, SellerLevel, SellerProfilePatch, UserId};
use super::Marketplace;
use crate::error::Result;
use crate::gateway::SellerAccount;
use crate::store::{OrderParty, OrderQuery, UnitOfWork};
use chrono::{DateTime, Utc};
use tracing::info;

// endregion: --- Imports

/// (등급, 최소 완료 주문, 최소 평점, 최소 활동 일수) 높은 등급부터
const THRESHOLDS: [(SellerLevel, i64, f64, i64); 3] = [
    (SellerLevel::TopRated, 100, 4.7, 180),
    (SellerLevel::Level2, 50, 4.5, 90),
    (SellerLevel::Level1, 10, 4.0, 30),
];

pub fn classify(completed_orders: i64, rating: f64, tenure_days: i64) -> SellerLevel {
    THRESHOLDS
        .iter()
        .find(|(_, orders, min_rating, days)| {
            completed_orders >= *orders && rating >= *min_rating && tenure_days >= *days
        })
        .map_or(SellerLevel::New, |(level, ..)| *level)
}

impl Marketplace {
    /// 현재 작업 단위 안에서 판매자 등급 재계산
    /// 활동 기간은 호출자가 미리 조회한 판매자 계정의 가입 시점으로 계산한다.
    pub(super) async fn refresh_seller_level(
        uow: &mut dyn UnitOfWork,
        seller_id: SellerId,
        seller_user_id: UserId,
        account: Option<&SellerAccount>,
        now: DateTime<Utc>,
    ) -> Result<SellerLevel> {
        let completed = uow
            .orders(
                OrderQuery::of(OrderParty::Seller(seller_user_id))
                    .with_status(Some(OrderStatus::Completed)),
            )
            .await?
            .len() as i64;
        let profile = uow.seller_profile(seller_id).await?;
        let rating = profile
            .as_ref()
            .and_then(|p| p.rating_average)
            .unwrap_or(0.0);
        let tenure_days = account.map_or(0, |seller| (now - seller.joined_at).num_days());

        let level = classify(completed, rating, tenure_days);
        let previous = profile.map(|p| p.account_level).unwrap_or_default();
        if level != previous {
            info!(
                "{:<12} --> 판매자 등급 변경 seller: {} {:?} -> {:?}",
                "Level", seller_id, previous, level
            );
        }
        uow.patch_seller_profile(
            seller_id,
            &SellerProfilePatch {
                account_level: Some(level),
                ..Default::default()
            },
        )
        .await?;
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_orders_at_four_point_two_is_level_one() {
        assert_eq!(classify(12, 4.2, 40), SellerLevel::Level1);
    }

    #[test]
    fn every_threshold_must_hold() {
        assert_eq!(classify(9, 5.0, 365), SellerLevel::New);
        assert_eq!(classify(10, 3.9, 365), SellerLevel::New);
        assert_eq!(classify(10, 4.0, 29), SellerLevel::New);
        assert_eq!(classify(10, 4.0, 30), SellerLevel::Level1);
    }

    #[test]
    fn highest_satisfied_tier_wins() {
        assert_eq!(classify(60, 4.6, 100), SellerLevel::Level2);
        assert_eq!(classify(150, 4.9, 200), SellerLevel::TopRated);
        assert_eq!(classify(150, 4.6, 200), SellerLevel::Level2);
        assert_eq!(classify(150, 4.9, 120), SellerLevel::Level2);
    }
}
