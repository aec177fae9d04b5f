use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// region:    --- Identifiers
macro_rules! entity_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
            )]
            #[serde(transparent)]
            #[sqlx(transparent)]
            pub struct $name(pub Uuid);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<Uuid> for $name {
                fn from(id: Uuid) -> Self {
                    Self(id)
                }
            }
        )*
    };
}

entity_id!(
    UserId, SellerId, GigId, PackageId, OfferId, OrderId, DeliveryId, RevisionId, PaymentId,
    ReviewId,
);
// endregion: --- Identifiers

// region:    --- Statuses
/// 오퍼 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "offer_status", rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

/// 주문 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Delivered,
    Completed,
    Cancelled,
    Disputed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Disputed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Disputed => "disputed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 수정 요청 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "revision_status", rename_all = "snake_case")]
pub enum RevisionStatus {
    Pending,
    Accepted,
    Rejected,
}

/// 결제(에스크로) 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Refunded,
}

/// 판매자 등급
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "seller_level")]
pub enum SellerLevel {
    #[default]
    #[serde(rename = "new")]
    #[sqlx(rename = "new")]
    New,
    #[serde(rename = "level_1")]
    #[sqlx(rename = "level_1")]
    Level1,
    #[serde(rename = "level_2")]
    #[sqlx(rename = "level_2")]
    Level2,
    #[serde(rename = "top_rated")]
    #[sqlx(rename = "top_rated")]
    TopRated,
}
// endregion: --- Statuses

// region:    --- Entities
/// 커스텀 오퍼
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Offer {
    pub id: OfferId,
    pub seller_id: SellerId,
    pub buyer_id: UserId,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub delivery_time: i32,
    pub revision_count: i32,
    pub expiry_date: DateTime<Utc>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry_date
    }
}

/// 주문
/// 판매자는 프로필(seller_id)과 실제 사용자(seller_user_id)를 모두 기록한다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub gig_id: GigId,
    pub package_id: Option<PackageId>,
    pub offer_id: Option<OfferId>,
    pub buyer_id: UserId,
    pub seller_id: SellerId,
    pub seller_user_id: UserId,
    pub requirements: Option<String>,
    pub price: i64,
    pub delivery_time: i32,
    pub expected_delivery_date: DateTime<Utc>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub revision_count: i32,
    pub revisions_used: i32,
    pub status: OrderStatus,
    pub is_late: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_party(&self, user_id: UserId) -> bool {
        self.buyer_id == user_id || self.seller_user_id == user_id
    }

    /// 상대방 사용자
    pub fn counterparty(&self, user_id: UserId) -> UserId {
        if user_id == self.buyer_id {
            self.seller_user_id
        } else {
            self.buyer_id
        }
    }

    pub fn revisions_left(&self) -> i32 {
        (self.revision_count - self.revisions_used).max(0)
    }
}

/// 납품 기록 (주문별 추가 전용)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderDelivery {
    pub id: DeliveryId,
    pub order_id: OrderId,
    pub message: Option<String>,
    pub files: Vec<String>,
    pub delivered_at: DateTime<Utc>,
    pub is_final_delivery: bool,
}

/// 수정 요청 기록 (주문별 추가 전용)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderRevision {
    pub id: RevisionId,
    pub order_id: OrderId,
    pub requested_by: UserId,
    pub request_message: String,
    pub request_date: DateTime<Utc>,
    pub response_message: Option<String>,
    pub response_date: Option<DateTime<Utc>>,
    pub status: RevisionStatus,
}

/// 결제
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: i64,
    pub platform_fee: i64,
    pub seller_amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

/// 리뷰 (주문당 1개)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub order_id: OrderId,
    pub gig_id: GigId,
    pub reviewer_id: UserId,
    pub reviewee_id: UserId,
    pub communication_rating: i32,
    pub service_rating: i32,
    pub recommendation_rating: i32,
    pub overall_rating: f64,
    pub comment: Option<String>,
    pub seller_response: Option<String>,
    pub seller_response_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 판매자 프로필의 파생 필드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SellerProfile {
    pub seller_id: SellerId,
    pub rating_average: Option<f64>,
    pub account_level: SellerLevel,
    pub total_earnings: i64,
}

impl SellerProfile {
    pub fn empty(seller_id: SellerId) -> Self {
        Self {
            seller_id,
            rating_average: None,
            account_level: SellerLevel::New,
            total_earnings: 0,
        }
    }
}

/// 긱의 파생 카운터와 랭킹 점수
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct GigStats {
    pub gig_id: GigId,
    pub ranking_score: f64,
    pub total_orders: i32,
    pub total_reviews: i32,
}

impl GigStats {
    pub fn empty(gig_id: GigId) -> Self {
        Self {
            gig_id,
            ranking_score: 0.0,
            total_orders: 0,
            total_reviews: 0,
        }
    }
}
// endregion: --- Entities

// region:    --- Patches
/// 판매자 프로필 부분 갱신
/// 지정된 필드만 검증 후 반영된다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SellerProfilePatch {
    pub rating_average: Option<f64>,
    pub account_level: Option<SellerLevel>,
    pub total_earnings: Option<i64>,
}

impl SellerProfilePatch {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(rating) = self.rating_average {
            if !(0.0..=5.0).contains(&rating) {
                return Err(format!("평균 평점은 0~5 사이여야 합니다: {}", rating));
            }
        }
        if let Some(earnings) = self.total_earnings {
            if earnings < 0 {
                return Err(format!("누적 수익은 음수일 수 없습니다: {}", earnings));
            }
        }
        Ok(())
    }

    pub fn apply(&self, profile: &mut SellerProfile) {
        if let Some(rating) = self.rating_average {
            profile.rating_average = Some(rating);
        }
        if let Some(level) = self.account_level {
            profile.account_level = level;
        }
        if let Some(earnings) = self.total_earnings {
            profile.total_earnings = earnings;
        }
    }
}

/// 긱 파생 필드 부분 갱신
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GigStatsPatch {
    pub ranking_score: Option<f64>,
    pub total_orders: Option<i32>,
    pub total_reviews: Option<i32>,
}

impl GigStatsPatch {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(score) = self.ranking_score {
            if !score.is_finite() || score < 0.0 {
                return Err(format!("랭킹 점수가 올바르지 않습니다: {}", score));
            }
        }
        if self.total_orders.is_some_and(|n| n < 0) || self.total_reviews.is_some_and(|n| n < 0) {
            return Err("카운터는 음수일 수 없습니다.".to_string());
        }
        Ok(())
    }

    pub fn apply(&self, stats: &mut GigStats) {
        if let Some(score) = self.ranking_score {
            stats.ranking_score = score;
        }
        if let Some(orders) = self.total_orders {
            stats.total_orders = orders;
        }
        if let Some(reviews) = self.total_reviews {
            stats.total_reviews = reviews;
        }
    }
}
// endregion: --- Patches

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_patch_applies_only_given_fields() {
        let mut profile = SellerProfile::empty(SellerId(Uuid::new_v4()));
        profile.total_earnings = 500;
        let patch = SellerProfilePatch {
            rating_average: Some(4.5),
            ..Default::default()
        };
        patch.validate().unwrap();
        patch.apply(&mut profile);
        assert_eq!(profile.rating_average, Some(4.5));
        assert_eq!(profile.total_earnings, 500);
        assert_eq!(profile.account_level, SellerLevel::New);
    }

    #[test]
    fn seller_patch_rejects_out_of_range_rating() {
        let patch = SellerProfilePatch {
            rating_average: Some(5.5),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    fn order_with_revisions(revision_count: i32, revisions_used: i32) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId(Uuid::new_v4()),
            gig_id: GigId(Uuid::new_v4()),
            package_id: None,
            offer_id: None,
            buyer_id: UserId(Uuid::new_v4()),
            seller_id: SellerId(Uuid::new_v4()),
            seller_user_id: UserId(Uuid::new_v4()),
            requirements: None,
            price: 10_000,
            delivery_time: 3,
            expected_delivery_date: now,
            actual_delivery_date: None,
            revision_count,
            revisions_used,
            status: OrderStatus::Delivered,
            is_late: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn revisions_left_never_goes_negative() {
        assert_eq!(order_with_revisions(2, 0).revisions_left(), 2);
        assert_eq!(order_with_revisions(2, 2).revisions_left(), 0);
        assert_eq!(order_with_revisions(0, 0).revisions_left(), 0);
        assert_eq!(order_with_revisions(1, 3).revisions_left(), 0);
    }

    #[test]
    fn gig_patch_rejects_negative_counters() {
        let patch = GigStatsPatch {
            total_reviews: Some(-1),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }
}
