// region:    --- Imports
use super::{Notification, NotificationSink};
use crate::error::{MarketError, Result};
use crate::message_broker::KafkaProducer;
use async_trait::async_trait;
use std::sync::Arc;

// endregion: --- Imports

pub const NOTIFICATION_TOPIC: &str = "notifications";

/// 알림을 카프카 토픽으로 발행 (수신자 id 를 키로 사용)
pub struct KafkaNotificationSink {
    producer: Arc<KafkaProducer>,
}

impl KafkaNotificationSink {
    pub fn new(producer: Arc<KafkaProducer>) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl NotificationSink for KafkaNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let payload = serde_json::to_string(notification)
            .map_err(|e| MarketError::Internal(e.to_string()))?;
        self.producer
            .send_message(
                NOTIFICATION_TOPIC,
                &notification.user_id.to_string(),
                &payload,
            )
            .await
            .map_err(MarketError::Internal)
    }
}
