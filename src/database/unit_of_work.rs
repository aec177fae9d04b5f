/// Postgres 작업 단위
/// 하나의 sqlx 트랜잭션을 감싼다. commit 없이 drop 되면 sqlx 가 롤백한다.
// region:    --- Imports
use crate::error::{MarketError, Result};
use crate::marketplace::model::{
    GigId, GigStats, GigStatsPatch, Offer, OfferId, OfferStatus, Order, OrderDelivery, OrderId,
    OrderRevision, Payment, PaymentId, Review, ReviewId, SellerId, SellerProfile,
    SellerProfilePatch, UserId,
};
use crate::query::queries;
use crate::store::{LedgerEntry, OrderParty, OrderQuery, ReviewQuery, UnitOfWork};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Postgres, Transaction};
use tracing::debug;

// endregion: --- Imports

const UNIQUE_VIOLATION: &str = "23505";

pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx: Some(tx) }
    }

    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| MarketError::Internal("이미 커밋된 작업 단위입니다.".to_string()))
    }
}

/// 유니크 제약 위반은 Conflict 로 바꾼다.
fn on_insert(e: sqlx::Error, what: impl FnOnce() -> String) -> MarketError {
    let unique = e
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION);
    if unique {
        MarketError::Conflict(what())
    } else {
        MarketError::Database(e)
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    // region:    --- Offers
    async fn insert_offer(&mut self, offer: &Offer) -> Result<()> {
        sqlx::query(queries::INSERT_OFFER)
            .bind(offer.id)
            .bind(offer.seller_id)
            .bind(offer.buyer_id)
            .bind(&offer.title)
            .bind(&offer.description)
            .bind(offer.price)
            .bind(offer.delivery_time)
            .bind(offer.revision_count)
            .bind(offer.expiry_date)
            .bind(offer.status)
            .bind(offer.created_at)
            .bind(offer.updated_at)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn offer(&mut self, offer_id: OfferId) -> Result<Option<Offer>> {
        let offer = sqlx::query_as::<_, Offer>(queries::GET_OFFER_FOR_UPDATE)
            .bind(offer_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(offer)
    }

    async fn update_offer_status(
        &mut self,
        offer_id: OfferId,
        status: OfferStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(queries::UPDATE_OFFER_STATUS)
            .bind(offer_id)
            .bind(status)
            .bind(now)
            .execute(self.conn()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MarketError::not_found("offer", offer_id));
        }
        Ok(())
    }

    async fn offers_by_seller(&mut self, seller_id: SellerId) -> Result<Vec<Offer>> {
        let offers = sqlx::query_as::<_, Offer>(queries::GET_OFFERS_BY_SELLER)
            .bind(seller_id)
            .fetch_all(self.conn()?)
            .await?;
        Ok(offers)
    }

    async fn offers_for_buyer(&mut self, buyer_id: UserId) -> Result<Vec<Offer>> {
        let offers = sqlx::query_as::<_, Offer>(queries::GET_OFFERS_FOR_BUYER)
            .bind(buyer_id)
            .fetch_all(self.conn()?)
            .await?;
        Ok(offers)
    }

    async fn expire_offers(&mut self, now: DateTime<Utc>) -> Result<Vec<Offer>> {
        let offers = sqlx::query_as::<_, Offer>(queries::EXPIRE_OFFERS)
            .bind(now)
            .fetch_all(self.conn()?)
            .await?;
        Ok(offers)
    }
    // endregion: --- Offers

    // region:    --- Orders
    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(queries::INSERT_ORDER)
            .bind(order.id)
            .bind(order.gig_id)
            .bind(order.package_id)
            .bind(order.offer_id)
            .bind(order.buyer_id)
            .bind(order.seller_id)
            .bind(order.seller_user_id)
            .bind(&order.requirements)
            .bind(order.price)
            .bind(order.delivery_time)
            .bind(order.expected_delivery_date)
            .bind(order.actual_delivery_date)
            .bind(order.revision_count)
            .bind(order.revisions_used)
            .bind(order.status)
            .bind(order.is_late)
            .bind(order.created_at)
            .bind(order.updated_at)
            .execute(self.conn()?)
            .await
            .map_err(|e| on_insert(e, || "이 오퍼로 이미 주문이 생성되었습니다.".to_string()))?;
        Ok(())
    }

    async fn order(&mut self, order_id: OrderId) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(queries::GET_ORDER_FOR_UPDATE)
            .bind(order_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(order)
    }

    async fn order_for_offer(&mut self, offer_id: OfferId) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(queries::GET_ORDER_BY_OFFER)
            .bind(offer_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(order)
    }

    async fn update_order(&mut self, order: &Order) -> Result<()> {
        let result = sqlx::query(queries::UPDATE_ORDER)
            .bind(order.id)
            .bind(order.actual_delivery_date)
            .bind(order.revisions_used)
            .bind(order.status)
            .bind(order.is_late)
            .bind(order.updated_at)
            .execute(self.conn()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MarketError::not_found("order", order.id));
        }
        Ok(())
    }

    async fn orders(&mut self, query: OrderQuery) -> Result<Vec<Order>> {
        let statement = match query.party {
            OrderParty::Buyer(_) => queries::GET_BUYER_ORDERS,
            OrderParty::Seller(_) => queries::GET_SELLER_ORDERS,
            OrderParty::Gig(_) => queries::GET_GIG_ORDERS,
        };
        let party = match query.party {
            OrderParty::Buyer(user_id) | OrderParty::Seller(user_id) => user_id.0,
            OrderParty::Gig(gig_id) => gig_id.0,
        };
        let orders = sqlx::query_as::<_, Order>(statement)
            .bind(party)
            .bind(query.status)
            .fetch_all(self.conn()?)
            .await?;
        Ok(orders)
    }
    // endregion: --- Orders

    // region:    --- Deliveries / Revisions
    async fn insert_delivery(&mut self, delivery: &OrderDelivery) -> Result<()> {
        sqlx::query(queries::INSERT_DELIVERY)
            .bind(delivery.id)
            .bind(delivery.order_id)
            .bind(&delivery.message)
            .bind(&delivery.files)
            .bind(delivery.delivered_at)
            .bind(delivery.is_final_delivery)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn deliveries(&mut self, order_id: OrderId) -> Result<Vec<OrderDelivery>> {
        let deliveries = sqlx::query_as::<_, OrderDelivery>(queries::GET_ORDER_DELIVERIES)
            .bind(order_id)
            .fetch_all(self.conn()?)
            .await?;
        Ok(deliveries)
    }

    async fn insert_revision(&mut self, revision: &OrderRevision) -> Result<()> {
        sqlx::query(queries::INSERT_REVISION)
            .bind(revision.id)
            .bind(revision.order_id)
            .bind(revision.requested_by)
            .bind(&revision.request_message)
            .bind(revision.request_date)
            .bind(&revision.response_message)
            .bind(revision.response_date)
            .bind(revision.status)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn revisions(&mut self, order_id: OrderId) -> Result<Vec<OrderRevision>> {
        let revisions = sqlx::query_as::<_, OrderRevision>(queries::GET_ORDER_REVISIONS)
            .bind(order_id)
            .fetch_all(self.conn()?)
            .await?;
        Ok(revisions)
    }
    // endregion: --- Deliveries / Revisions

    // region:    --- Payments
    async fn insert_payment(&mut self, payment: &Payment) -> Result<()> {
        sqlx::query(queries::INSERT_PAYMENT)
            .bind(payment.id)
            .bind(payment.order_id)
            .bind(payment.amount)
            .bind(payment.platform_fee)
            .bind(payment.seller_amount)
            .bind(&payment.currency)
            .bind(payment.status)
            .bind(payment.created_at)
            .bind(payment.released_at)
            .execute(self.conn()?)
            .await
            .map_err(|e| {
                on_insert(e, || format!("주문 {}의 결제가 이미 있습니다.", payment.order_id))
            })?;
        Ok(())
    }

    async fn payment(&mut self, payment_id: PaymentId) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(queries::GET_PAYMENT)
            .bind(payment_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(payment)
    }

    async fn payment_for_order(&mut self, order_id: OrderId) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(queries::GET_PAYMENT_BY_ORDER)
            .bind(order_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(payment)
    }

    async fn update_payment(&mut self, payment: &Payment) -> Result<()> {
        let result = sqlx::query(queries::UPDATE_PAYMENT)
            .bind(payment.id)
            .bind(payment.status)
            .bind(payment.released_at)
            .execute(self.conn()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MarketError::not_found("payment", payment.id));
        }
        Ok(())
    }

    async fn seller_ledger(&mut self, seller_user_id: UserId) -> Result<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(queries::GET_SELLER_LEDGER)
            .bind(seller_user_id)
            .fetch_all(self.conn()?)
            .await?;
        Ok(entries)
    }
    // endregion: --- Payments

    // region:    --- Reviews
    async fn insert_review(&mut self, review: &Review) -> Result<()> {
        sqlx::query(queries::INSERT_REVIEW)
            .bind(review.id)
            .bind(review.order_id)
            .bind(review.gig_id)
            .bind(review.reviewer_id)
            .bind(review.reviewee_id)
            .bind(review.communication_rating)
            .bind(review.service_rating)
            .bind(review.recommendation_rating)
            .bind(review.overall_rating)
            .bind(&review.comment)
            .bind(&review.seller_response)
            .bind(review.seller_response_date)
            .bind(review.created_at)
            .execute(self.conn()?)
            .await
            .map_err(|e| {
                on_insert(e, || format!("주문 {}의 리뷰가 이미 있습니다.", review.order_id))
            })?;
        Ok(())
    }

    async fn review(&mut self, review_id: ReviewId) -> Result<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(queries::GET_REVIEW_FOR_UPDATE)
            .bind(review_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(review)
    }

    async fn review_for_order(&mut self, order_id: OrderId) -> Result<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(queries::GET_REVIEW_BY_ORDER)
            .bind(order_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(review)
    }

    async fn update_review(&mut self, review: &Review) -> Result<()> {
        let result = sqlx::query(queries::UPDATE_REVIEW_RESPONSE)
            .bind(review.id)
            .bind(&review.seller_response)
            .bind(review.seller_response_date)
            .execute(self.conn()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MarketError::not_found("review", review.id));
        }
        Ok(())
    }

    async fn reviews(&mut self, query: ReviewQuery) -> Result<Vec<Review>> {
        let (statement, key) = match query {
            ReviewQuery::Reviewee(user_id) => (queries::GET_REVIEWS_BY_REVIEWEE, user_id.0),
            ReviewQuery::Gig(gig_id) => (queries::GET_REVIEWS_BY_GIG, gig_id.0),
        };
        let reviews = sqlx::query_as::<_, Review>(statement)
            .bind(key)
            .fetch_all(self.conn()?)
            .await?;
        Ok(reviews)
    }
    // endregion: --- Reviews

    // region:    --- Derived Fields
    async fn seller_profile(&mut self, seller_id: SellerId) -> Result<Option<SellerProfile>> {
        let profile = sqlx::query_as::<_, SellerProfile>(queries::GET_SELLER_PROFILE)
            .bind(seller_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(profile)
    }

    async fn patch_seller_profile(
        &mut self,
        seller_id: SellerId,
        patch: &SellerProfilePatch,
    ) -> Result<()> {
        patch.validate().map_err(MarketError::Validation)?;
        sqlx::query(queries::PATCH_SELLER_PROFILE)
            .bind(seller_id)
            .bind(patch.rating_average)
            .bind(patch.account_level)
            .bind(patch.total_earnings)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn gig_stats(&mut self, gig_id: GigId) -> Result<Option<GigStats>> {
        let stats = sqlx::query_as::<_, GigStats>(queries::GET_GIG_STATS)
            .bind(gig_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(stats)
    }

    async fn patch_gig_stats(&mut self, gig_id: GigId, patch: &GigStatsPatch) -> Result<()> {
        patch.validate().map_err(MarketError::Validation)?;
        sqlx::query(queries::PATCH_GIG_STATS)
            .bind(gig_id)
            .bind(patch.ranking_score)
            .bind(patch.total_orders)
            .bind(patch.total_reviews)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }
    // endregion: --- Derived Fields

    async fn commit(&mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| MarketError::Internal("이미 커밋된 작업 단위입니다.".to_string()))?;
        tx.commit().await?;
        debug!("{:<12} --> 트랜잭션 커밋", "Database");
        Ok(())
    }
}
