// region:    --- Imports
use super::{Notification, NotificationSink};
use crate::error::Result;
use crate::query::queries;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

// endregion: --- Imports

/// notifications 테이블에 알림 기록
/// 거래 트랜잭션과 별개의 커넥션으로 기록한다.
pub struct PgNotificationSink {
    pool: Arc<PgPool>,
}

impl PgNotificationSink {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        sqlx::query(queries::INSERT_NOTIFICATION)
            .bind(notification.user_id)
            .bind(notification.kind.as_str())
            .bind(&notification.content)
            .bind(notification.related_entity_type.as_str())
            .bind(notification.related_entity_id)
            .bind(notification.created_at)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }
}
