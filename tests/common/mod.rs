#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use gig_market::gateway::{
    Capabilities, Directory, GigListing, GigPackage, ManualClock, PackageType, SellerAccount,
    UserAccount,
};
use gig_market::marketplace::commands::{CreateOfferCommand, CreateOrderCommand, DeliverCommand};
use gig_market::marketplace::model::{
    GigId, GigStats, Order, OrderId, PackageId, Payment, SellerId, SellerProfile, UserId,
};
use gig_market::marketplace::Marketplace;
use gig_market::notification::{MemorySink, NotificationSink};
use gig_market::store::{MemoryStore, Store};
use std::sync::Arc;
use uuid::Uuid;

/// 트레이싱 초기화 (여러 테스트에서 호출되어도 한 번만 적용)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
}

/// 판매자 한 명, 긱 하나, 패키지 하나가 준비된 상태
pub struct Fixture {
    pub seller_user: UserId,
    pub seller_id: SellerId,
    pub buyer: UserId,
    pub gig_id: GigId,
    pub package_id: PackageId,
}

pub struct Harness {
    pub market: Arc<Marketplace>,
    pub directory: Arc<Directory>,
    pub sink: Arc<MemorySink>,
    pub clock: Arc<ManualClock>,
    pub store: MemoryStore,
}

impl Harness {
    pub fn new() -> Self {
        let sink = Arc::new(MemorySink::new());
        Self::build(sink.clone(), sink)
    }

    /// 알림 발송기를 바꿔 끼운 엔진 (MemorySink 는 비어 있는 채로 남는다)
    pub fn with_notifier(notifier: Arc<dyn NotificationSink>) -> Self {
        Self::build(Arc::new(MemorySink::new()), notifier)
    }

    fn build(sink: Arc<MemorySink>, notifier: Arc<dyn NotificationSink>) -> Self {
        init_tracing();
        let store = MemoryStore::new();
        let directory = Arc::new(Directory::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let market = Marketplace::builder(
            Arc::new(store.clone()),
            directory.clone(),
            directory.clone(),
        )
        .notifier(notifier)
        .clock(clock.clone())
        .build();
        Self {
            market: Arc::new(market),
            directory,
            sink,
            clock,
            store,
        }
    }

    pub async fn user(&self, capabilities: Capabilities) -> UserId {
        let id = UserId(Uuid::new_v4());
        self.directory
            .register_user(UserAccount {
                id,
                capabilities,
                registered_at: self.clock_now(),
            })
            .await;
        id
    }

    pub async fn buyer(&self) -> UserId {
        self.user(Capabilities::BUYER).await
    }

    /// 판매자 등록 (가입 시점은 현재로부터 tenure_days 전)
    pub async fn seller_with_tenure(&self, tenure_days: i64) -> (UserId, SellerId) {
        let user_id = self.user(Capabilities::BOTH).await;
        let seller_id = SellerId(Uuid::new_v4());
        self.directory
            .register_seller(SellerAccount {
                id: seller_id,
                user_id,
                completion_rate: None,
                response_time: None,
                joined_at: self.clock_now() - Duration::days(tenure_days),
            })
            .await
            .unwrap();
        (user_id, seller_id)
    }

    pub async fn seller(&self) -> (UserId, SellerId) {
        self.seller_with_tenure(0).await
    }

    pub async fn gig(&self, seller_id: SellerId) -> GigId {
        let id = GigId(Uuid::new_v4());
        self.directory
            .register_gig(GigListing {
                id,
                seller_id,
                title: "로고 디자인".to_string(),
                description: "브랜드 로고를 디자인합니다.".repeat(20),
                is_active: true,
                image_count: 3,
                tag_count: 4,
                conversion_rate: None,
            })
            .await
            .unwrap();
        id
    }

    pub async fn package(
        &self,
        gig_id: GigId,
        package_type: PackageType,
        price: i64,
        delivery_time: i32,
        revision_count: i32,
    ) -> PackageId {
        let id = PackageId(Uuid::new_v4());
        self.directory
            .add_package(GigPackage {
                id,
                gig_id,
                package_type,
                price,
                delivery_time,
                revision_count,
                is_active: true,
            })
            .await
            .unwrap();
        id
    }

    /// 기본 준비 상태 (패키지: 10000, 3일, 수정 2회)
    pub async fn fixture(&self) -> Fixture {
        self.fixture_with(10_000, 3, 2).await
    }

    pub async fn fixture_with(&self, price: i64, delivery_time: i32, revisions: i32) -> Fixture {
        let (seller_user, seller_id) = self.seller_with_tenure(40).await;
        let buyer = self.buyer().await;
        let gig_id = self.gig(seller_id).await;
        let package_id = self
            .package(gig_id, PackageType::Basic, price, delivery_time, revisions)
            .await;
        Fixture {
            seller_user,
            seller_id,
            buyer,
            gig_id,
            package_id,
        }
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        use gig_market::gateway::Clock;
        self.clock.now()
    }

    pub async fn package_order(&self, fx: &Fixture) -> Order {
        self.market
            .create_order(
                fx.buyer,
                CreateOrderCommand {
                    gig_id: fx.gig_id,
                    package_id: Some(fx.package_id),
                    offer_id: None,
                    requirements: Some("흰 배경".to_string()),
                },
            )
            .await
            .unwrap()
    }

    /// 최종 납품까지 진행된 주문
    pub async fn delivered_order(&self, fx: &Fixture) -> Order {
        let order = self.package_order(fx).await;
        let (order, _) = self
            .market
            .deliver(order.id, fx.seller_user, final_delivery())
            .await
            .unwrap();
        order
    }

    /// 완료까지 진행된 주문
    pub async fn completed_order(&self, fx: &Fixture) -> Order {
        let order = self.delivered_order(fx).await;
        self.market.complete_order(order.id, fx.buyer).await.unwrap()
    }

    pub fn offer_command(&self, buyer: UserId) -> CreateOfferCommand {
        CreateOfferCommand {
            buyer_id: buyer,
            title: "맞춤 일러스트".to_string(),
            description: "캐릭터 일러스트 3종".to_string(),
            price: 45_000,
            delivery_time: 5,
            revision_count: 3,
            expiry_days: None,
        }
    }

    pub async fn seller_profile(&self, seller_id: SellerId) -> Option<SellerProfile> {
        let mut uow = self.store.begin().await.unwrap();
        uow.seller_profile(seller_id).await.unwrap()
    }

    pub async fn gig_stats(&self, gig_id: GigId) -> Option<GigStats> {
        let mut uow = self.store.begin().await.unwrap();
        uow.gig_stats(gig_id).await.unwrap()
    }

    pub async fn payment(&self, order_id: OrderId) -> Payment {
        let mut uow = self.store.begin().await.unwrap();
        uow.payment_for_order(order_id).await.unwrap().unwrap()
    }
}

pub fn final_delivery() -> DeliverCommand {
    DeliverCommand {
        message: Some("최종 시안입니다.".to_string()),
        files: vec!["logo.png".to_string(), "logo.svg".to_string()],
        is_final: true,
    }
}

pub fn partial_delivery() -> DeliverCommand {
    DeliverCommand {
        message: Some("중간 시안입니다.".to_string()),
        files: vec!["draft.png".to_string()],
        is_final: false,
    }
}
