// region:    --- Imports
use axum::extract::DefaultBodyLimit;
use gig_market::config::Config;
use gig_market::database::DatabaseManager;
use gig_market::gateway::{CatalogGateway, Directory, IdentityGateway, PgDirectory};
use gig_market::handlers;
use gig_market::marketplace::{MarketSettings, Marketplace};
use gig_market::notification::{FanoutSink, LogSink, NotificationSink, PgNotificationSink};
use gig_market::scheduler::OfferExpiryScheduler;
use gig_market::store::{MemoryStore, Store};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    // 저장소 / 게이트웨이 / 알림 구성
    let (store, identity, catalog, notifier): (
        Arc<dyn Store>,
        Arc<dyn IdentityGateway>,
        Arc<dyn CatalogGateway>,
        Arc<dyn NotificationSink>,
    ) = if config.database_url.is_some() {
        let db_manager = Arc::new(DatabaseManager::new(&config).await?);
        if let Err(e) = db_manager.initialize_database(config.database_reset).await {
            error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
            return Err(e.into());
        }
        info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

        let directory = Arc::new(PgDirectory::new(db_manager.get_pool()));
        let notifier = build_notifier(&config, db_manager.get_pool()).await;
        let store: Arc<dyn Store> = db_manager;
        let identity: Arc<dyn IdentityGateway> = directory.clone();
        let catalog: Arc<dyn CatalogGateway> = directory;
        (store, identity, catalog, notifier)
    } else {
        warn!(
            "{:<12} --> DATABASE_URL 미설정: 메모리 저장소로 실행합니다.",
            "Main"
        );
        let directory = Arc::new(Directory::new());
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let identity: Arc<dyn IdentityGateway> = directory.clone();
        let catalog: Arc<dyn CatalogGateway> = directory;
        let notifier: Arc<dyn NotificationSink> = Arc::new(LogSink);
        (store, identity, catalog, notifier)
    };

    let marketplace = Arc::new(
        Marketplace::builder(store, identity, catalog)
            .notifier(notifier)
            .settings(MarketSettings {
                currency: config.currency.clone(),
                offer_expiry_days: config.offer_expiry_days,
            })
            .build(),
    );

    // 오퍼 만료 스케줄러
    if config.offer_sweep_interval_secs > 0 {
        OfferExpiryScheduler::new(
            Arc::clone(&marketplace),
            Duration::from_secs(config.offer_sweep_interval_secs),
        )
        .start();
    }

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes_all = handlers::router(marketplace)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20));

    let listener = TcpListener::bind(&config.server_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}

/// Postgres 알림 기록 + (kafka 기능 사용 시) 토픽 발행
async fn build_notifier(
    config: &Config,
    pool: Arc<sqlx::PgPool>,
) -> Arc<dyn NotificationSink> {
    #[cfg_attr(not(feature = "kafka"), allow(unused_mut))]
    let mut sinks: Vec<Arc<dyn NotificationSink>> = vec![Arc::new(PgNotificationSink::new(pool))];

    #[cfg(feature = "kafka")]
    if let Some(brokers) = &config.kafka_brokers {
        use gig_market::message_broker::KafkaProducer;
        use gig_market::notification::kafka::{KafkaNotificationSink, NOTIFICATION_TOPIC};

        match KafkaProducer::new(brokers) {
            Ok(producer) => {
                if let Err(e) = producer.create_topic(NOTIFICATION_TOPIC, 5, 1).await {
                    warn!("{:<12} --> Kafka 토픽 준비 실패: {}", "Main", e);
                }
                sinks.push(Arc::new(KafkaNotificationSink::new(Arc::new(producer))));
                info!("{:<12} --> Kafka 알림 발행 활성화", "Main");
            }
            Err(e) => warn!("{:<12} --> Kafka 초기화 실패: {}", "Main", e),
        }
    }
    #[cfg(not(feature = "kafka"))]
    if config.kafka_brokers.is_some() {
        warn!(
            "{:<12} --> KAFKA_BROKERS 가 설정되었지만 kafka 기능 없이 빌드되었습니다.",
            "Main"
        );
    }

    Arc::new(FanoutSink::new(sinks))
}
// endregion: --- Main
