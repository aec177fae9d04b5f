/// 오퍼 만료 스케줄러
/// 수락 시점의 만료 검사와 별개로, 주기적으로 기간이 지난 대기 오퍼를 expired 로 바꾼다.
// region:    --- Imports
use crate::marketplace::Marketplace;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Offer Expiry Scheduler
pub struct OfferExpiryScheduler {
    marketplace: Arc<Marketplace>,
    period: Duration,
}

impl OfferExpiryScheduler {
    pub fn new(marketplace: Arc<Marketplace>, period: Duration) -> Self {
        Self {
            marketplace,
            period,
        }
    }

    /// 스케줄러 시작
    pub fn start(self) -> JoinHandle<()> {
        info!(
            "{:<12} --> 오퍼 만료 스케줄러 시작 (주기 {:?})",
            "Scheduler", self.period
        );
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.marketplace.sweep_expired_offers().await {
                    Ok(expired) => debug!(
                        "{:<12} --> 만료 처리 완료 ({}건)",
                        "Scheduler",
                        expired.len()
                    ),
                    Err(e) => error!(
                        "{:<12} --> 오퍼 만료 처리 중 오류 발생: {:?}",
                        "Scheduler", e
                    ),
                }
            }
        })
    }
}
// endregion: --- Offer Expiry Scheduler
