/// 주문 라이프사이클 (상태 머신)
/// pending -> {in_progress, cancelled}
/// in_progress -> {delivered, cancelled}
/// delivered -> {completed, in_progress}
/// disputed -> {in_progress, cancelled}
/// completed, cancelled 는 종료 상태
// region:    --- Imports
use super::commands::{CreateOrderCommand, UpdateStatusCommand};
use super::model::{
    GigStatsPatch, OfferId, OfferStatus, Order, OrderId, OrderStatus, Payment, PaymentStatus,
    SellerProfilePatch, UserId,
};
use super::payments::split_fee;
use super::{days_after, Marketplace, Outbox};
use crate::error::{MarketError, Result};
use crate::gateway::GigPackage;
use crate::notification::{EntityKind, NotificationKind};
use crate::store::{OrderParty, OrderQuery};
use tracing::info;

// endregion: --- Imports

// region:    --- Transition Table
impl OrderStatus {
    /// 허용된 상태 전이인지 확인
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Cancelled)
                | (InProgress, Delivered)
                | (InProgress, Cancelled)
                | (Delivered, Completed)
                | (Delivered, InProgress)
                | (Disputed, InProgress)
                | (Disputed, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// 전이 검증 (실패 시 시도한 출발/도착 상태를 함께 보고)
    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(MarketError::InvalidStateTransition {
                from: self,
                to: next,
            })
        }
    }
}
// endregion: --- Transition Table

/// 주문 조건의 출처
enum OrderSource {
    Package(GigPackage),
    Offer(OfferId),
}

impl Marketplace {
    // region:    --- Create
    /// 주문 생성
    /// 패키지 또는 수락된 오퍼 중 정확히 하나로 가격/기간/수정 횟수를 정한다.
    /// 주문과 결제(대기)는 같은 작업 단위에서 함께 만들어진다.
    pub async fn create_order(&self, buyer_id: UserId, cmd: CreateOrderCommand) -> Result<Order> {
        info!(
            "{:<12} --> 주문 생성 요청 buyer: {} gig: {}",
            "Order", buyer_id, cmd.gig_id
        );

        let buyer = self
            .identity
            .user(buyer_id)
            .await?
            .ok_or_else(|| MarketError::not_found("user", buyer_id))?;
        if !buyer.capabilities.can_buy {
            return Err(MarketError::PermissionDenied(
                "구매 권한이 없는 사용자입니다.".to_string(),
            ));
        }

        let gig = self
            .catalog
            .active_gig(cmd.gig_id)
            .await?
            .ok_or_else(|| MarketError::not_found("gig", cmd.gig_id))?;

        let source = match (cmd.package_id, cmd.offer_id) {
            (Some(package_id), None) => OrderSource::Package(
                self.catalog
                    .active_package(gig.id, package_id)
                    .await?
                    .ok_or_else(|| MarketError::not_found("package", package_id))?,
            ),
            (None, Some(offer_id)) => OrderSource::Offer(offer_id),
            _ => {
                return Err(MarketError::Validation(
                    "패키지와 오퍼 중 정확히 하나를 지정해야 합니다.".to_string(),
                ))
            }
        };

        let seller_user_id = self
            .identity
            .resolve_seller_user(gig.seller_id)
            .await?
            .ok_or_else(|| MarketError::not_found("seller", gig.seller_id))?;
        if seller_user_id == buyer_id {
            return Err(MarketError::SelfDealing);
        }

        let now = self.now();
        let mut uow = self.begin().await?;

        let (price, delivery_time, revision_count) = match &source {
            OrderSource::Package(package) => {
                (package.price, package.delivery_time, package.revision_count)
            }
            &OrderSource::Offer(offer_id) => {
                let offer = uow
                    .offer(offer_id)
                    .await?
                    .ok_or_else(|| MarketError::not_found("offer", offer_id))?;
                if offer.buyer_id != buyer_id {
                    return Err(MarketError::PermissionDenied(
                        "오퍼를 받은 구매자만 주문할 수 있습니다.".to_string(),
                    ));
                }
                if offer.seller_id != gig.seller_id {
                    return Err(MarketError::Validation(
                        "오퍼의 판매자와 긱의 판매자가 다릅니다.".to_string(),
                    ));
                }
                if offer.status != OfferStatus::Accepted {
                    return Err(MarketError::InvalidState(format!(
                        "수락된 오퍼가 아닙니다: {:?}",
                        offer.status
                    )));
                }
                if offer.is_expired(now) {
                    return Err(MarketError::Expired(format!(
                        "오퍼 {}는 {}에 만료되었습니다.",
                        offer.id, offer.expiry_date
                    )));
                }
                if uow.order_for_offer(offer_id).await?.is_some() {
                    return Err(MarketError::Conflict(format!(
                        "오퍼 {}로 이미 주문이 생성되었습니다.",
                        offer_id
                    )));
                }
                (offer.price, offer.delivery_time, offer.revision_count)
            }
        };

        let expected_delivery_date = days_after(now, i64::from(delivery_time))?;
        let (platform_fee, seller_amount) = split_fee(price)?;
        let order = Order {
            id: self.new_id(),
            gig_id: gig.id,
            package_id: match &source {
                OrderSource::Package(package) => Some(package.id),
                OrderSource::Offer(_) => None,
            },
            offer_id: match source {
                OrderSource::Package(_) => None,
                OrderSource::Offer(offer_id) => Some(offer_id),
            },
            buyer_id,
            seller_id: gig.seller_id,
            seller_user_id,
            requirements: cmd.requirements,
            price,
            delivery_time,
            expected_delivery_date,
            actual_delivery_date: None,
            revision_count,
            revisions_used: 0,
            status: OrderStatus::Pending,
            is_late: false,
            created_at: now,
            updated_at: now,
        };

        let payment = Payment {
            id: self.new_id(),
            order_id: order.id,
            amount: price,
            platform_fee,
            seller_amount,
            currency: self.settings.currency.clone(),
            status: PaymentStatus::Pending,
            created_at: now,
            released_at: None,
        };

        uow.insert_order(&order).await?;
        uow.insert_payment(&payment).await?;
        uow.commit().await?;

        let mut outbox = Outbox::default();
        outbox.push(
            seller_user_id,
            NotificationKind::NewOrder,
            EntityKind::Order,
            order.id.0,
            now,
        );
        self.dispatch(outbox).await;

        info!(
            "{:<12} --> 주문 생성 완료 id: {} price: {}",
            "Order", order.id, order.price
        );
        Ok(order)
    }
    // endregion: --- Create

    // region:    --- Queries
    /// 주문 조회 (구매자 또는 판매자)
    pub async fn get_order(&self, order_id: OrderId, caller: UserId) -> Result<Order> {
        let mut uow = self.begin().await?;
        let order = Self::load_order(uow.as_mut(), order_id).await?;
        Self::ensure_party(&order, caller)?;
        Ok(order)
    }

    pub async fn buyer_orders(
        &self,
        buyer_id: UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let mut uow = self.begin().await?;
        uow.orders(OrderQuery::of(OrderParty::Buyer(buyer_id)).with_status(status))
            .await
    }

    pub async fn seller_orders(
        &self,
        seller_user_id: UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let mut uow = self.begin().await?;
        uow.orders(OrderQuery::of(OrderParty::Seller(seller_user_id)).with_status(status))
            .await
    }
    // endregion: --- Queries

    // region:    --- Transitions
    /// 상태 변경
    /// completed / cancelled 로의 변경은 완료/취소 규칙과 부수 효과를 그대로 따른다.
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        caller: UserId,
        cmd: UpdateStatusCommand,
    ) -> Result<Order> {
        match cmd.status {
            OrderStatus::Completed => return self.complete_order(order_id, caller).await,
            OrderStatus::Cancelled => return self.cancel_order(order_id, caller).await,
            _ => {}
        }

        info!(
            "{:<12} --> 상태 변경 요청 id: {} -> {}",
            "Order", order_id, cmd.status
        );
        let now = self.now();
        let mut uow = self.begin().await?;
        let mut order = Self::load_order(uow.as_mut(), order_id).await?;
        Self::ensure_party(&order, caller)?;

        order.status = order.status.transition_to(cmd.status)?;
        order.updated_at = now;
        uow.update_order(&order).await?;
        uow.commit().await?;

        let mut outbox = Outbox::default();
        outbox.push(
            order.counterparty(caller),
            NotificationKind::OrderUpdate,
            EntityKind::Order,
            order.id.0,
            now,
        );
        self.dispatch(outbox).await;
        Ok(order)
    }

    /// 주문 완료 (구매자, delivered 에서만)
    /// 결제 정산, 긱 주문 수 증가, 판매자 수익/등급과 긱 랭킹 재계산을 함께 처리한다.
    pub async fn complete_order(&self, order_id: OrderId, buyer_id: UserId) -> Result<Order> {
        info!(
            "{:<12} --> 주문 완료 요청 id: {} buyer: {}",
            "Order", order_id, buyer_id
        );
        let context = self.order_context(order_id).await?;
        let now = self.now();
        let mut uow = self.begin().await?;
        let mut order = Self::load_order(uow.as_mut(), order_id).await?;
        if order.buyer_id != buyer_id {
            return Err(MarketError::PermissionDenied(
                "구매자만 주문을 완료할 수 있습니다.".to_string(),
            ));
        }
        order.status = order.status.transition_to(OrderStatus::Completed)?;
        order.updated_at = now;
        let gig = context
            .gig
            .ok_or_else(|| MarketError::not_found("gig", order.gig_id))?;

        // 판매자 프로필 -> 긱 순서로 잠근 뒤 파생 값을 다시 계산한다.
        uow.seller_profile(order.seller_id).await?;
        uow.update_order(&order).await?;

        let mut payment = uow
            .payment_for_order(order.id)
            .await?
            .ok_or_else(|| MarketError::not_found("payment", order.id))?;
        payment.status = PaymentStatus::Completed;
        payment.released_at = Some(now);
        uow.update_payment(&payment).await?;

        let stats = uow.gig_stats(order.gig_id).await?;
        let total_orders = stats.map_or(0, |s| s.total_orders) + 1;
        uow.patch_gig_stats(
            order.gig_id,
            &GigStatsPatch {
                total_orders: Some(total_orders),
                ..Default::default()
            },
        )
        .await?;

        let total_earnings: i64 = uow
            .seller_ledger(order.seller_user_id)
            .await?
            .iter()
            .filter(|entry| entry.payment.status == PaymentStatus::Completed)
            .map(|entry| entry.payment.seller_amount)
            .sum();
        uow.patch_seller_profile(
            order.seller_id,
            &SellerProfilePatch {
                total_earnings: Some(total_earnings),
                ..Default::default()
            },
        )
        .await?;

        Self::refresh_seller_level(
            uow.as_mut(),
            order.seller_id,
            order.seller_user_id,
            context.seller.as_ref(),
            now,
        )
        .await?;
        Self::recompute_ranking(uow.as_mut(), &gig, context.seller.as_ref(), now).await?;
        uow.commit().await?;

        let mut outbox = Outbox::default();
        outbox.push(
            order.seller_user_id,
            NotificationKind::OrderCompleted,
            EntityKind::Order,
            order.id.0,
            now,
        );
        self.dispatch(outbox).await;

        info!(
            "{:<12} --> 주문 완료 id: {} 정산액: {}",
            "Order", order.id, payment.seller_amount
        );
        Ok(order)
    }

    /// 주문 취소 (구매자/판매자, pending / in_progress / disputed 에서만)
    /// 결제는 환불 처리된다.
    pub async fn cancel_order(&self, order_id: OrderId, caller: UserId) -> Result<Order> {
        info!(
            "{:<12} --> 주문 취소 요청 id: {} caller: {}",
            "Order", order_id, caller
        );
        let now = self.now();
        let mut uow = self.begin().await?;
        let mut order = Self::load_order(uow.as_mut(), order_id).await?;
        Self::ensure_party(&order, caller)?;

        order.status = order.status.transition_to(OrderStatus::Cancelled)?;
        order.updated_at = now;
        uow.update_order(&order).await?;

        let mut payment = uow
            .payment_for_order(order.id)
            .await?
            .ok_or_else(|| MarketError::not_found("payment", order.id))?;
        payment.status = PaymentStatus::Refunded;
        uow.update_payment(&payment).await?;
        uow.commit().await?;

        let mut outbox = Outbox::default();
        outbox.push(
            order.counterparty(caller),
            NotificationKind::OrderCancelled,
            EntityKind::Order,
            order.id.0,
            now,
        );
        self.dispatch(outbox).await;
        Ok(order)
    }
    // endregion: --- Transitions
}
