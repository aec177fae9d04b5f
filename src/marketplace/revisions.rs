/// 수정 요청 기록
/// 주문별 수정 요청은 추가만 되며, 주문의 수정 횟수를 넘을 수 없다.
// region:    --- Imports
use super::commands::RequestRevisionCommand;
use super::model::{Order, OrderId, OrderRevision, OrderStatus, RevisionStatus, UserId};
use super::{Marketplace, Outbox};
use crate::error::{MarketError, Result};
use crate::notification::{EntityKind, NotificationKind};
use tracing::info;

// endregion: --- Imports

impl Marketplace {
    /// 수정 요청 (구매자, delivered 주문, 남은 횟수 안에서)
    /// 주문은 in_progress 로 돌아간다.
    pub async fn request_revision(
        &self,
        order_id: OrderId,
        buyer_id: UserId,
        cmd: RequestRevisionCommand,
    ) -> Result<(Order, OrderRevision)> {
        let message = cmd.request_message.trim();
        if message.is_empty() {
            return Err(MarketError::Validation(
                "수정 요청 내용이 비어 있습니다.".to_string(),
            ));
        }

        let now = self.now();
        let mut uow = self.begin().await?;
        let mut order = Self::load_order(uow.as_mut(), order_id).await?;
        if order.buyer_id != buyer_id {
            return Err(MarketError::PermissionDenied(
                "구매자만 수정을 요청할 수 있습니다.".to_string(),
            ));
        }
        if order.status != OrderStatus::Delivered {
            return Err(MarketError::InvalidState(format!(
                "납품된 주문에만 수정을 요청할 수 있습니다: {}",
                order.status
            )));
        }
        if order.revisions_left() == 0 {
            return Err(MarketError::RevisionQuotaExceeded {
                used: order.revisions_used,
                quota: order.revision_count,
            });
        }

        let revision = OrderRevision {
            id: self.new_id(),
            order_id,
            requested_by: buyer_id,
            request_message: message.to_string(),
            request_date: now,
            response_message: None,
            response_date: None,
            status: RevisionStatus::Pending,
        };
        uow.insert_revision(&revision).await?;

        order.revisions_used += 1;
        order.status = order.status.transition_to(OrderStatus::InProgress)?;
        order.updated_at = now;
        uow.update_order(&order).await?;
        uow.commit().await?;

        info!(
            "{:<12} --> 수정 요청 order: {} ({}/{})",
            "Revision", order.id, order.revisions_used, order.revision_count
        );

        let mut outbox = Outbox::default();
        outbox.push(
            order.seller_user_id,
            NotificationKind::RevisionRequested,
            EntityKind::Order,
            order.id.0,
            now,
        );
        self.dispatch(outbox).await;
        Ok((order, revision))
    }

    /// 주문 수정 요청 이력 (오래된 순)
    pub async fn revisions(&self, order_id: OrderId, caller: UserId) -> Result<Vec<OrderRevision>> {
        let mut uow = self.begin().await?;
        let order = Self::load_order(uow.as_mut(), order_id).await?;
        Self::ensure_party(&order, caller)?;
        let mut revisions = uow.revisions(order_id).await?;
        revisions.sort_by_key(|r| r.request_date);
        Ok(revisions)
    }
}
