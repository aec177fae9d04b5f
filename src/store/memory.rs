/// 메모리 저장소
/// 작업 단위는 전체 상태 잠금을 보유한 채 복사본을 수정하고, commit 시에만 반영한다.
/// 따라서 모든 연산이 직렬화되며 먼저 커밋한 쪽이 이긴다.
// region:    --- Imports
use super::{LedgerEntry, OrderQuery, ReviewQuery, Store, UnitOfWork};
use crate::error::{MarketError, Result};
use crate::marketplace::model::{
    GigId, GigStats, GigStatsPatch, Offer, OfferId, OfferStatus, Order, OrderDelivery, OrderId,
    OrderRevision, Payment, PaymentId, Review, ReviewId, SellerId, SellerProfile,
    SellerProfilePatch, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

// endregion: --- Imports

// region:    --- Market State
#[derive(Debug, Clone, Default)]
pub struct MarketState {
    offers: Vec<Offer>,
    orders: Vec<Order>,
    deliveries: Vec<OrderDelivery>,
    revisions: Vec<OrderRevision>,
    payments: Vec<Payment>,
    reviews: Vec<Review>,
    seller_profiles: HashMap<SellerId, SellerProfile>,
    gig_stats: HashMap<GigId, GigStats>,
}

/// 최신순 정렬 (같은 시각이면 나중에 추가된 것이 앞)
fn newest_first<T: Clone>(
    rows: &[T],
    keep: impl Fn(&T) -> bool,
    at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut found: Vec<T> = rows.iter().rev().filter(|row| keep(*row)).cloned().collect();
    found.sort_by_key(|row| std::cmp::Reverse(at(row)));
    found
}
// endregion: --- Market State

// region:    --- Memory Store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MarketState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            working,
            committed: false,
        }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MarketState>,
    working: MarketState,
    committed: bool,
}

impl MemoryUnitOfWork {
    fn order_mut(&mut self, order_id: OrderId) -> Result<&mut Order> {
        self.working
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| MarketError::not_found("order", order_id))
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    // region:    --- Offers
    async fn insert_offer(&mut self, offer: &Offer) -> Result<()> {
        self.working.offers.push(offer.clone());
        Ok(())
    }

    async fn offer(&mut self, offer_id: OfferId) -> Result<Option<Offer>> {
        Ok(self.working.offers.iter().find(|o| o.id == offer_id).cloned())
    }

    async fn update_offer_status(
        &mut self,
        offer_id: OfferId,
        status: OfferStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let offer = self
            .working
            .offers
            .iter_mut()
            .find(|o| o.id == offer_id)
            .ok_or_else(|| MarketError::not_found("offer", offer_id))?;
        offer.status = status;
        offer.updated_at = now;
        Ok(())
    }

    async fn offers_by_seller(&mut self, seller_id: SellerId) -> Result<Vec<Offer>> {
        Ok(newest_first(
            &self.working.offers,
            |o| o.seller_id == seller_id,
            |o| o.created_at,
        ))
    }

    async fn offers_for_buyer(&mut self, buyer_id: UserId) -> Result<Vec<Offer>> {
        Ok(newest_first(
            &self.working.offers,
            |o| o.buyer_id == buyer_id,
            |o| o.created_at,
        ))
    }

    async fn expire_offers(&mut self, now: DateTime<Utc>) -> Result<Vec<Offer>> {
        let mut expired = Vec::new();
        for offer in self.working.offers.iter_mut() {
            if offer.status == OfferStatus::Pending && offer.is_expired(now) {
                offer.status = OfferStatus::Expired;
                offer.updated_at = now;
                expired.push(offer.clone());
            }
        }
        Ok(expired)
    }
    // endregion: --- Offers

    // region:    --- Orders
    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.working.orders.push(order.clone());
        Ok(())
    }

    async fn order(&mut self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.working.orders.iter().find(|o| o.id == order_id).cloned())
    }

    async fn order_for_offer(&mut self, offer_id: OfferId) -> Result<Option<Order>> {
        Ok(self
            .working
            .orders
            .iter()
            .find(|o| o.offer_id == Some(offer_id))
            .cloned())
    }

    async fn update_order(&mut self, order: &Order) -> Result<()> {
        *self.order_mut(order.id)? = order.clone();
        Ok(())
    }

    async fn orders(&mut self, query: OrderQuery) -> Result<Vec<Order>> {
        Ok(newest_first(
            &self.working.orders,
            |o| query.matches(o),
            |o| o.created_at,
        ))
    }
    // endregion: --- Orders

    // region:    --- Deliveries / Revisions
    async fn insert_delivery(&mut self, delivery: &OrderDelivery) -> Result<()> {
        self.working.deliveries.push(delivery.clone());
        Ok(())
    }

    async fn deliveries(&mut self, order_id: OrderId) -> Result<Vec<OrderDelivery>> {
        Ok(self
            .working
            .deliveries
            .iter()
            .filter(|d| d.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn insert_revision(&mut self, revision: &OrderRevision) -> Result<()> {
        self.working.revisions.push(revision.clone());
        Ok(())
    }

    async fn revisions(&mut self, order_id: OrderId) -> Result<Vec<OrderRevision>> {
        Ok(self
            .working
            .revisions
            .iter()
            .filter(|r| r.order_id == order_id)
            .cloned()
            .collect())
    }
    // endregion: --- Deliveries / Revisions

    // region:    --- Payments
    async fn insert_payment(&mut self, payment: &Payment) -> Result<()> {
        if self.working.payments.iter().any(|p| p.order_id == payment.order_id) {
            return Err(MarketError::Conflict(format!(
                "주문 {}의 결제가 이미 있습니다.",
                payment.order_id
            )));
        }
        self.working.payments.push(payment.clone());
        Ok(())
    }

    async fn payment(&mut self, payment_id: PaymentId) -> Result<Option<Payment>> {
        Ok(self
            .working
            .payments
            .iter()
            .find(|p| p.id == payment_id)
            .cloned())
    }

    async fn payment_for_order(&mut self, order_id: OrderId) -> Result<Option<Payment>> {
        Ok(self
            .working
            .payments
            .iter()
            .find(|p| p.order_id == order_id)
            .cloned())
    }

    async fn update_payment(&mut self, payment: &Payment) -> Result<()> {
        let stored = self
            .working
            .payments
            .iter_mut()
            .find(|p| p.id == payment.id)
            .ok_or_else(|| MarketError::not_found("payment", payment.id))?;
        *stored = payment.clone();
        Ok(())
    }

    async fn seller_ledger(&mut self, seller_user_id: UserId) -> Result<Vec<LedgerEntry>> {
        let orders: HashMap<OrderId, &Order> = self
            .working
            .orders
            .iter()
            .filter(|o| o.seller_user_id == seller_user_id)
            .map(|o| (o.id, o))
            .collect();
        let mut entries: Vec<LedgerEntry> = self
            .working
            .payments
            .iter()
            .filter_map(|payment| {
                orders.get(&payment.order_id).map(|order| LedgerEntry {
                    payment: payment.clone(),
                    order_status: order.status,
                })
            })
            .collect();
        entries.reverse();
        entries.sort_by_key(|e| std::cmp::Reverse(e.payment.created_at));
        Ok(entries)
    }
    // endregion: --- Payments

    // region:    --- Reviews
    async fn insert_review(&mut self, review: &Review) -> Result<()> {
        if self.working.reviews.iter().any(|r| r.order_id == review.order_id) {
            return Err(MarketError::Conflict(format!(
                "주문 {}의 리뷰가 이미 있습니다.",
                review.order_id
            )));
        }
        self.working.reviews.push(review.clone());
        Ok(())
    }

    async fn review(&mut self, review_id: ReviewId) -> Result<Option<Review>> {
        Ok(self
            .working
            .reviews
            .iter()
            .find(|r| r.id == review_id)
            .cloned())
    }

    async fn review_for_order(&mut self, order_id: OrderId) -> Result<Option<Review>> {
        Ok(self
            .working
            .reviews
            .iter()
            .find(|r| r.order_id == order_id)
            .cloned())
    }

    async fn update_review(&mut self, review: &Review) -> Result<()> {
        let stored = self
            .working
            .reviews
            .iter_mut()
            .find(|r| r.id == review.id)
            .ok_or_else(|| MarketError::not_found("review", review.id))?;
        *stored = review.clone();
        Ok(())
    }

    async fn reviews(&mut self, query: ReviewQuery) -> Result<Vec<Review>> {
        Ok(newest_first(
            &self.working.reviews,
            |r| query.matches(r),
            |r| r.created_at,
        ))
    }
    // endregion: --- Reviews

    // region:    --- Derived Fields
    async fn seller_profile(&mut self, seller_id: SellerId) -> Result<Option<SellerProfile>> {
        Ok(self.working.seller_profiles.get(&seller_id).cloned())
    }

    async fn patch_seller_profile(
        &mut self,
        seller_id: SellerId,
        patch: &SellerProfilePatch,
    ) -> Result<()> {
        patch.validate().map_err(MarketError::Validation)?;
        let profile = self
            .working
            .seller_profiles
            .entry(seller_id)
            .or_insert_with(|| SellerProfile::empty(seller_id));
        patch.apply(profile);
        Ok(())
    }

    async fn gig_stats(&mut self, gig_id: GigId) -> Result<Option<GigStats>> {
        Ok(self.working.gig_stats.get(&gig_id).cloned())
    }

    async fn patch_gig_stats(&mut self, gig_id: GigId, patch: &GigStatsPatch) -> Result<()> {
        patch.validate().map_err(MarketError::Validation)?;
        let stats = self
            .working
            .gig_stats
            .entry(gig_id)
            .or_insert_with(|| GigStats::empty(gig_id));
        patch.apply(stats);
        Ok(())
    }
    // endregion: --- Derived Fields

    async fn commit(&mut self) -> Result<()> {
        if self.committed {
            return Err(MarketError::Internal("이미 커밋된 작업 단위입니다.".to_string()));
        }
        *self.guard = self.working.clone();
        self.committed = true;
        debug!("{:<12} --> 메모리 작업 단위 커밋", "Store");
        Ok(())
    }
}
// endregion: --- Memory Store
