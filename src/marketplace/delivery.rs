/// 납품 기록
// region:    --- Imports
use super::commands::DeliverCommand;
use super::model::{Order, OrderDelivery, OrderId, OrderStatus, UserId};
use super::{Marketplace, Outbox};
use crate::error::{MarketError, Result};
use crate::notification::{EntityKind, NotificationKind};
use tracing::info;

// endregion: --- Imports

impl Marketplace {
    /// 납품 등록
    /// 최종 납품이면 delivered 로, 중간 납품이면 pending 주문만 in_progress 로 바꾼다.
    pub async fn deliver(
        &self,
        order_id: OrderId,
        seller_user_id: UserId,
        cmd: DeliverCommand,
    ) -> Result<(Order, OrderDelivery)> {
        info!(
            "{:<12} --> 납품 요청 order: {} final: {}",
            "Delivery", order_id, cmd.is_final
        );
        let now = self.now();
        let mut uow = self.begin().await?;
        let mut order = Self::load_order(uow.as_mut(), order_id).await?;
        if order.seller_user_id != seller_user_id {
            return Err(MarketError::PermissionDenied(
                "주문의 판매자만 납품할 수 있습니다.".to_string(),
            ));
        }
        if !matches!(order.status, OrderStatus::Pending | OrderStatus::InProgress) {
            return Err(MarketError::InvalidState(format!(
                "{} 상태의 주문에는 납품할 수 없습니다.",
                order.status
            )));
        }

        let delivery = OrderDelivery {
            id: self.new_id(),
            order_id,
            message: cmd.message,
            files: cmd.files,
            delivered_at: now,
            is_final_delivery: cmd.is_final,
        };
        uow.insert_delivery(&delivery).await?;

        let kind = if cmd.is_final {
            order.status = OrderStatus::Delivered;
            order.actual_delivery_date = Some(now);
            order.is_late = now > order.expected_delivery_date;
            NotificationKind::OrderDelivered
        } else {
            if order.status == OrderStatus::Pending {
                order.status = OrderStatus::InProgress;
            }
            NotificationKind::OrderUpdate
        };
        order.updated_at = now;
        uow.update_order(&order).await?;
        uow.commit().await?;

        let mut outbox = Outbox::default();
        outbox.push(order.buyer_id, kind, EntityKind::Order, order.id.0, now);
        self.dispatch(outbox).await;

        if order.is_late {
            info!("{:<12} --> 지연 납품 order: {}", "Delivery", order.id);
        }
        Ok((order, delivery))
    }

    /// 주문 납품 이력 (오래된 순)
    pub async fn deliveries(&self, order_id: OrderId, caller: UserId) -> Result<Vec<OrderDelivery>> {
        let mut uow = self.begin().await?;
        let order = Self::load_order(uow.as_mut(), order_id).await?;
        Self::ensure_party(&order, caller)?;
        let mut deliveries = uow.deliveries(order_id).await?;
        deliveries.sort_by_key(|d| d.delivered_at);
        Ok(deliveries)
    }
}
