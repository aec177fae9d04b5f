/// 알림 발송 경계
/// 알림은 최선 노력(best effort)으로 발송되며, 실패해도 거래는 롤백되지 않는다.
// region:    --- Imports
use crate::error::Result;
use crate::marketplace::model::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Modules
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod postgres;

#[cfg(feature = "kafka")]
pub use kafka::KafkaNotificationSink;
pub use postgres::PgNotificationSink;
// endregion: --- Modules

// region:    --- Notification Model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewOffer,
    OfferAccepted,
    OfferRejected,
    NewOrder,
    OrderDelivered,
    OrderUpdate,
    RevisionRequested,
    OrderCompleted,
    OrderCancelled,
    NewReview,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewOffer => "new_offer",
            Self::OfferAccepted => "offer_accepted",
            Self::OfferRejected => "offer_rejected",
            Self::NewOrder => "new_order",
            Self::OrderDelivered => "order_delivered",
            Self::OrderUpdate => "order_update",
            Self::RevisionRequested => "revision_requested",
            Self::OrderCompleted => "order_completed",
            Self::OrderCancelled => "order_cancelled",
            Self::NewReview => "new_review",
        }
    }

    /// 기본 안내 문구
    pub fn default_content(&self) -> &'static str {
        match self {
            Self::NewOffer => "맞춤 오퍼가 도착했습니다.",
            Self::OfferAccepted => "오퍼가 수락되었습니다.",
            Self::OfferRejected => "오퍼가 거절되었습니다.",
            Self::NewOrder => "새 주문이 도착했습니다.",
            Self::OrderDelivered => "주문이 납품되었습니다.",
            Self::OrderUpdate => "주문 진행 상황이 업데이트되었습니다.",
            Self::RevisionRequested => "주문에 수정 요청이 들어왔습니다.",
            Self::OrderCompleted => "주문이 완료되어 대금이 정산되었습니다.",
            Self::OrderCancelled => "주문이 취소되었습니다.",
            Self::NewReview => "새 리뷰가 등록되었습니다.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Offer,
    Order,
    Review,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Order => "order",
            Self::Review => "review",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub content: String,
    pub related_entity_type: EntityKind,
    pub related_entity_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        related_entity_type: EntityKind,
        related_entity_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            kind,
            content: kind.default_content().to_string(),
            related_entity_type,
            related_entity_id,
            created_at,
        }
    }
}
// endregion: --- Notification Model

// region:    --- Notification Sinks
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// 로그로만 남기는 기본 발송기
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        info!(
            "{:<12} --> {} user: {} {}: {}",
            "Notify",
            notification.kind.as_str(),
            notification.user_id,
            notification.related_entity_type.as_str(),
            notification.related_entity_id
        );
        Ok(())
    }
}

/// 발송된 알림을 메모리에 보관
#[derive(Default)]
pub struct MemorySink {
    sent: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_to(&self, user_id: UserId) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|n| n.user_id == user_id)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for MemorySink {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        Ok(())
    }
}

/// 여러 발송기로 동시에 전달
/// 하나가 실패해도 나머지에는 전달하고, 첫 번째 오류를 돌려준다.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl NotificationSink for FanoutSink {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.notify(notification).await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
// endregion: --- Notification Sinks
