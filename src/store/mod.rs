/// 저장소 경계
/// 비즈니스 규칙은 전부 엔진에 있고, 저장소는 읽기/쓰기만 담당한다.
/// 하나의 연산은 하나의 작업 단위(UnitOfWork) 안에서 실행되며,
/// commit 하지 않고 drop 된 작업 단위의 쓰기는 모두 버려진다.
// region:    --- Imports
use crate::error::Result;
use crate::marketplace::model::{
    GigId, GigStats, GigStatsPatch, Offer, OfferId, OfferStatus, Order, OrderDelivery, OrderId,
    OrderRevision, OrderStatus, Payment, PaymentId, Review, ReviewId, SellerId, SellerProfile,
    SellerProfilePatch, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

// endregion: --- Imports

pub mod memory;

pub use memory::MemoryStore;

// region:    --- Filters
/// 주문 목록 조회 기준
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderParty {
    Buyer(UserId),
    Seller(UserId),
    Gig(GigId),
}

#[derive(Debug, Clone, Copy)]
pub struct OrderQuery {
    pub party: OrderParty,
    pub status: Option<OrderStatus>,
}

impl OrderQuery {
    pub fn of(party: OrderParty) -> Self {
        Self {
            party,
            status: None,
        }
    }

    pub fn with_status(mut self, status: Option<OrderStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        let party = match self.party {
            OrderParty::Buyer(user_id) => order.buyer_id == user_id,
            OrderParty::Seller(user_id) => order.seller_user_id == user_id,
            OrderParty::Gig(gig_id) => order.gig_id == gig_id,
        };
        party && self.status.map_or(true, |status| order.status == status)
    }
}

/// 리뷰 목록 조회 기준
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewQuery {
    Reviewee(UserId),
    Gig(GigId),
}

impl ReviewQuery {
    pub fn matches(&self, review: &Review) -> bool {
        match *self {
            ReviewQuery::Reviewee(user_id) => review.reviewee_id == user_id,
            ReviewQuery::Gig(gig_id) => review.gig_id == gig_id,
        }
    }
}

/// 판매자 정산 집계용 결제 + 주문 상태
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LedgerEntry {
    #[sqlx(flatten)]
    pub payment: Payment,
    pub order_status: OrderStatus,
}
// endregion: --- Filters

// region:    --- Store Traits
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    // 오퍼
    async fn insert_offer(&mut self, offer: &Offer) -> Result<()>;
    async fn offer(&mut self, offer_id: OfferId) -> Result<Option<Offer>>;
    async fn update_offer_status(
        &mut self,
        offer_id: OfferId,
        status: OfferStatus,
        now: DateTime<Utc>,
    ) -> Result<()>;
    async fn offers_by_seller(&mut self, seller_id: SellerId) -> Result<Vec<Offer>>;
    async fn offers_for_buyer(&mut self, buyer_id: UserId) -> Result<Vec<Offer>>;
    /// 만료 시각이 지난 대기 오퍼를 expired 로 바꾸고 바뀐 오퍼를 돌려준다.
    async fn expire_offers(&mut self, now: DateTime<Utc>) -> Result<Vec<Offer>>;

    // 주문
    async fn insert_order(&mut self, order: &Order) -> Result<()>;
    /// 갱신을 위해 주문을 잠그고 읽는다.
    async fn order(&mut self, order_id: OrderId) -> Result<Option<Order>>;
    async fn order_for_offer(&mut self, offer_id: OfferId) -> Result<Option<Order>>;
    async fn update_order(&mut self, order: &Order) -> Result<()>;
    async fn orders(&mut self, query: OrderQuery) -> Result<Vec<Order>>;

    // 납품 / 수정 요청
    async fn insert_delivery(&mut self, delivery: &OrderDelivery) -> Result<()>;
    async fn deliveries(&mut self, order_id: OrderId) -> Result<Vec<OrderDelivery>>;
    async fn insert_revision(&mut self, revision: &OrderRevision) -> Result<()>;
    async fn revisions(&mut self, order_id: OrderId) -> Result<Vec<OrderRevision>>;

    // 결제
    async fn insert_payment(&mut self, payment: &Payment) -> Result<()>;
    async fn payment(&mut self, payment_id: PaymentId) -> Result<Option<Payment>>;
    async fn payment_for_order(&mut self, order_id: OrderId) -> Result<Option<Payment>>;
    async fn update_payment(&mut self, payment: &Payment) -> Result<()>;
    async fn seller_ledger(&mut self, seller_user_id: UserId) -> Result<Vec<LedgerEntry>>;

    // 리뷰
    async fn insert_review(&mut self, review: &Review) -> Result<()>;
    async fn review(&mut self, review_id: ReviewId) -> Result<Option<Review>>;
    async fn review_for_order(&mut self, order_id: OrderId) -> Result<Option<Review>>;
    async fn update_review(&mut self, review: &Review) -> Result<()>;
    async fn reviews(&mut self, query: ReviewQuery) -> Result<Vec<Review>>;

    // 파생 필드
    async fn seller_profile(&mut self, seller_id: SellerId) -> Result<Option<SellerProfile>>;
    async fn patch_seller_profile(
        &mut self,
        seller_id: SellerId,
        patch: &SellerProfilePatch,
    ) -> Result<()>;
    async fn gig_stats(&mut self, gig_id: GigId) -> Result<Option<GigStats>>;
    async fn patch_gig_stats(&mut self, gig_id: GigId, patch: &GigStatsPatch) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;
}
// endregion: --- Store Traits
