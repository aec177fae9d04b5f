/// 긱 랭킹 점수
/// 총점 = 판매자 점수 * 0.4 + 긱 점수 * 0.35 + 콘텐츠 점수 * 0.25
/// 주문 완료 시와 조회 요청 시에만 다시 계산한다.
// region:    --- Imports
use super::model::{GigId, GigStatsPatch, OrderStatus};
use super::Marketplace;
use crate::error::{MarketError, Result};
use crate::gateway::{GigListing, SellerAccount};
use crate::store::{OrderParty, OrderQuery, UnitOfWork};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

const DEFAULT_RATING: f64 = 3.0;
const DEFAULT_COMPLETION_RATE: f64 = 80.0;
const DEFAULT_RESPONSE_TIME: f64 = 60.0;
const DEFAULT_CONVERSION_RATE: f64 = 2.0;
const RECENT_WINDOW_DAYS: i64 = 30;

// region:    --- Scoring
/// 점수 계산 입력
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingSignals {
    pub rating_average: Option<f64>,
    pub completion_rate: Option<f64>,
    pub response_time: Option<f64>,
    pub completed_orders: i64,
    pub conversion_rate: Option<f64>,
    pub total_reviews: i64,
    pub orders_last_30_days: i64,
    pub description_length: usize,
    pub image_count: i64,
    pub tag_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingBreakdown {
    pub seller_score: f64,
    pub gig_score: f64,
    pub content_score: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GigRanking {
    pub gig_id: GigId,
    #[serde(flatten)]
    pub breakdown: RankingBreakdown,
}

pub fn seller_score(signals: &RankingSignals) -> f64 {
    signals.rating_average.unwrap_or(DEFAULT_RATING) * 0.5
        + signals.completion_rate.unwrap_or(DEFAULT_COMPLETION_RATE) * 0.002
        + (100.0 - signals.response_time.unwrap_or(DEFAULT_RESPONSE_TIME)) * 0.003
}

pub fn gig_score(signals: &RankingSignals) -> f64 {
    signals.completed_orders as f64 * 0.01
        + signals.conversion_rate.unwrap_or(DEFAULT_CONVERSION_RATE) * 0.1
        + signals.total_reviews as f64 * 0.05
        + (signals.orders_last_30_days as f64 * 0.5).min(5.0)
}

pub fn content_score(signals: &RankingSignals) -> f64 {
    description_bucket(signals.description_length) * 0.4
        + image_bucket(signals.image_count) * 0.3
        + tag_bucket(signals.tag_count) * 0.3
}

fn description_bucket(length: usize) -> f64 {
    match length {
        l if l > 1000 => 10.0,
        l if l > 500 => 8.0,
        l if l > 200 => 5.0,
        _ => 3.0,
    }
}

fn image_bucket(count: i64) -> f64 {
    match count {
        c if c >= 5 => 10.0,
        c if c >= 3 => 7.0,
        c => c.max(0) as f64 * 2.0,
    }
}

fn tag_bucket(count: i64) -> f64 {
    if count >= 5 {
        10.0
    } else {
        count.max(0) as f64 * 2.0
    }
}

pub fn score(signals: &RankingSignals) -> RankingBreakdown {
    let seller_score = seller_score(signals);
    let gig_score = gig_score(signals);
    let content_score = content_score(signals);
    RankingBreakdown {
        seller_score,
        gig_score,
        content_score,
        total: seller_score * 0.4 + gig_score * 0.35 + content_score * 0.25,
    }
}
// endregion: --- Scoring

impl Marketplace {
    /// 긱 랭킹을 다시 계산해 저장하고 내역을 돌려준다.
    pub async fn gig_ranking(&self, gig_id: GigId) -> Result<GigRanking> {
        let gig = self
            .catalog
            .gig(gig_id)
            .await?
            .ok_or_else(|| MarketError::not_found("gig", gig_id))?;
        let seller = self.identity.seller(gig.seller_id).await?;
        let now = self.now();
        let mut uow = self.begin().await?;
        let breakdown = Self::recompute_ranking(uow.as_mut(), &gig, seller.as_ref(), now).await?;
        uow.commit().await?;
        Ok(GigRanking { gig_id, breakdown })
    }

    /// 현재 작업 단위 안에서 랭킹 재계산
    /// 긱과 판매자 계정은 작업 단위를 열기 전에 조회해 넘긴다.
    pub(super) async fn recompute_ranking(
        uow: &mut dyn UnitOfWork,
        gig: &GigListing,
        seller: Option<&SellerAccount>,
        now: DateTime<Utc>,
    ) -> Result<RankingBreakdown> {
        let gig_id = gig.id;
        let profile = uow.seller_profile(gig.seller_id).await?;
        let stats = uow.gig_stats(gig_id).await?;
        let orders = uow.orders(OrderQuery::of(OrderParty::Gig(gig_id))).await?;

        let recent_since = now - Duration::days(RECENT_WINDOW_DAYS);
        let signals = RankingSignals {
            rating_average: profile.and_then(|p| p.rating_average),
            completion_rate: seller.and_then(|s| s.completion_rate),
            response_time: seller.and_then(|s| s.response_time),
            completed_orders: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Completed)
                .count() as i64,
            conversion_rate: gig.conversion_rate,
            total_reviews: stats.map_or(0, |s| i64::from(s.total_reviews)),
            orders_last_30_days: orders
                .iter()
                .filter(|o| o.status != OrderStatus::Cancelled && o.created_at >= recent_since)
                .count() as i64,
            description_length: gig.description.chars().count(),
            image_count: i64::from(gig.image_count),
            tag_count: i64::from(gig.tag_count),
        };

        let breakdown = score(&signals);
        uow.patch_gig_stats(
            gig_id,
            &GigStatsPatch {
                ranking_score: Some(breakdown.total.max(0.0)),
                ..Default::default()
            },
        )
        .await?;
        info!(
            "{:<12} --> 랭킹 재계산 gig: {} score: {:.3}",
            "Ranking", gig_id, breakdown.total
        );
        Ok(breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn missing_signals_use_defaults() {
        let breakdown = score(&RankingSignals::default());
        // 3*0.5 + 80*0.002 + 40*0.003
        assert!(close(breakdown.seller_score, 1.78));
        // 2*0.1
        assert!(close(breakdown.gig_score, 0.2));
        // 3*0.4
        assert!(close(breakdown.content_score, 1.2));
        assert!(close(breakdown.total, 1.78 * 0.4 + 0.2 * 0.35 + 1.2 * 0.25));
    }

    #[test]
    fn recent_orders_bonus_is_capped() {
        let few = RankingSignals {
            orders_last_30_days: 4,
            ..Default::default()
        };
        let many = RankingSignals {
            orders_last_30_days: 40,
            ..Default::default()
        };
        assert!(close(gig_score(&few), 0.2 + 2.0));
        assert!(close(gig_score(&many), 0.2 + 5.0));
    }

    #[test]
    fn content_buckets() {
        assert_eq!(description_bucket(1001), 10.0);
        assert_eq!(description_bucket(1000), 8.0);
        assert_eq!(description_bucket(501), 8.0);
        assert_eq!(description_bucket(201), 5.0);
        assert_eq!(description_bucket(200), 3.0);
        assert_eq!(image_bucket(5), 10.0);
        assert_eq!(image_bucket(3), 7.0);
        assert_eq!(image_bucket(2), 4.0);
        assert_eq!(tag_bucket(5), 10.0);
        assert_eq!(tag_bucket(4), 8.0);
        assert_eq!(tag_bucket(0), 0.0);
    }

    #[test]
    fn full_signal_set() {
        let signals = RankingSignals {
            rating_average: Some(4.8),
            completion_rate: Some(95.0),
            response_time: Some(20.0),
            completed_orders: 120,
            conversion_rate: Some(4.0),
            total_reviews: 30,
            orders_last_30_days: 3,
            description_length: 750,
            image_count: 4,
            tag_count: 5,
        };
        let breakdown = score(&signals);
        assert!(close(breakdown.seller_score, 2.4 + 0.19 + 0.24));
        assert!(close(breakdown.gig_score, 1.2 + 0.4 + 1.5 + 1.5));
        assert!(close(breakdown.content_score, 3.2 + 2.1 + 3.0));
    }
}
