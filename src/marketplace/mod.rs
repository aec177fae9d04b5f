/// 거래 라이프사이클 엔진
/// 오퍼, 주문, 납품, 수정 요청, 결제, 리뷰, 랭킹, 판매자 등급 규칙을 한 곳에서 처리한다.
/// 각 연산은 하나의 작업 단위 안에서 실행되며, 알림은 커밋 이후에 발송된다.
// region:    --- Imports
use crate::error::{MarketError, Result};
use crate::gateway::{
    CatalogGateway, Clock, GigListing, IdGenerator, IdentityGateway, PayoutGateway,
    SellerAccount, StubPayoutGateway, SystemClock, UuidGenerator,
};
use crate::notification::{EntityKind, LogSink, Notification, NotificationKind, NotificationSink};
use crate::store::{Store, UnitOfWork};
use chrono::{DateTime, Duration, Utc};
use model::{Order, OrderId, UserId};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Modules
pub mod commands;
pub mod delivery;
pub mod levels;
pub mod model;
pub mod offers;
pub mod orders;
pub mod payments;
pub mod ranking;
pub mod reviews;
pub mod revisions;
// endregion: --- Modules

// region:    --- Settings
#[derive(Debug, Clone)]
pub struct MarketSettings {
    /// 결제에 기록되는 통화
    pub currency: String,
    /// 오퍼 기본 유효 기간 (일)
    pub offer_expiry_days: i64,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            offer_expiry_days: 7,
        }
    }
}
// endregion: --- Settings

// region:    --- Marketplace
pub struct Marketplace {
    store: Arc<dyn Store>,
    identity: Arc<dyn IdentityGateway>,
    catalog: Arc<dyn CatalogGateway>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    payouts: Arc<dyn PayoutGateway>,
    settings: MarketSettings,
}

impl Marketplace {
    pub fn builder(
        store: Arc<dyn Store>,
        identity: Arc<dyn IdentityGateway>,
        catalog: Arc<dyn CatalogGateway>,
    ) -> MarketplaceBuilder {
        MarketplaceBuilder {
            store,
            identity,
            catalog,
            notifier: Arc::new(LogSink),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            payouts: Arc::new(StubPayoutGateway),
            settings: MarketSettings::default(),
        }
    }

    pub fn settings(&self) -> &MarketSettings {
        &self.settings
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn new_id<T: From<Uuid>>(&self) -> T {
        T::from(self.ids.new_id())
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        self.store.begin().await
    }

    /// 주문 조회 (없으면 NotFound)
    async fn load_order(uow: &mut dyn UnitOfWork, order_id: OrderId) -> Result<Order> {
        uow.order(order_id)
            .await?
            .ok_or_else(|| MarketError::not_found("order", order_id))
    }

    /// 주문의 긱/판매자 정보 (작업 단위 밖에서 조회)
    async fn order_context(&self, order_id: OrderId) -> Result<OrderContext> {
        let order = {
            let mut uow = self.begin().await?;
            Self::load_order(uow.as_mut(), order_id).await?
        };
        Ok(OrderContext {
            gig: self.catalog.gig(order.gig_id).await?,
            seller: self.identity.seller(order.seller_id).await?,
        })
    }

    /// 주문 당사자(구매자/판매자)만 접근 가능
    fn ensure_party(order: &Order, caller: UserId) -> Result<()> {
        if order.is_party(caller) {
            Ok(())
        } else {
            Err(MarketError::PermissionDenied(format!(
                "주문 {}의 당사자가 아닙니다.",
                order.id
            )))
        }
    }

    /// 커밋된 연산의 알림 발송
    /// 발송 실패는 로그만 남기고 연산 결과에는 영향을 주지 않는다.
    async fn dispatch(&self, outbox: Outbox) {
        for notification in outbox.0 {
            if let Err(e) = self.notifier.notify(&notification).await {
                warn!(
                    "{:<12} --> 알림 발송 실패 ({} -> {}): {}",
                    "Notify",
                    notification.kind.as_str(),
                    notification.user_id,
                    e
                );
            }
        }
    }
}

/// now 로부터 days 일 뒤 (표현 범위를 넘으면 Validation 오류)
fn days_after(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|span| now.checked_add_signed(span))
        .ok_or_else(|| MarketError::Validation(format!("기간이 너무 깁니다: {}일", days)))
}

/// 주문에 딸린 외부 정보
struct OrderContext {
    gig: Option<GigListing>,
    seller: Option<SellerAccount>,
}

/// 커밋 후 발송할 알림 모음
#[derive(Default)]
struct Outbox(Vec<Notification>);

impl Outbox {
    fn push(
        &mut self,
        user_id: UserId,
        kind: NotificationKind,
        entity: EntityKind,
        entity_id: Uuid,
        now: DateTime<Utc>,
    ) {
        self.0
            .push(Notification::new(user_id, kind, entity, entity_id, now));
    }
}

pub struct MarketplaceBuilder {
    store: Arc<dyn Store>,
    identity: Arc<dyn IdentityGateway>,
    catalog: Arc<dyn CatalogGateway>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    payouts: Arc<dyn PayoutGateway>,
    settings: MarketSettings,
}

impl MarketplaceBuilder {
    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn payouts(mut self, payouts: Arc<dyn PayoutGateway>) -> Self {
        self.payouts = payouts;
        self
    }

    pub fn settings(mut self, settings: MarketSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Marketplace {
        Marketplace {
            store: self.store,
            identity: self.identity,
            catalog: self.catalog,
            notifier: self.notifier,
            clock: self.clock,
            ids: self.ids,
            payouts: self.payouts,
            settings: self.settings,
        }
    }
}
// endregion: --- Marketplace
