/// 리뷰와 판매자 평점
/// 주문당 리뷰는 하나이며, 평균 평점은 매번 전체 리뷰로 다시 계산한다.
// region:    --- Imports
use super::commands::{CreateReviewCommand, RespondToReviewCommand};
use super::model::{
    GigId, GigStatsPatch, OrderStatus, Review, ReviewId, SellerId, SellerProfilePatch, UserId,
};
use super::{Marketplace, Outbox};
use crate::error::{MarketError, Result};
use crate::notification::{EntityKind, NotificationKind};
use crate::store::ReviewQuery;
use std::ops::RangeInclusive;
use tracing::info;

// endregion: --- Imports

const RATING_RANGE: RangeInclusive<i32> = 1..=5;

/// 세부 평점 세 개의 평균
pub fn overall_rating(communication: i32, service: i32, recommendation: i32) -> f64 {
    f64::from(communication + service + recommendation) / 3.0
}

fn check_rating(name: &str, value: i32) -> Result<()> {
    if RATING_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(MarketError::Validation(format!(
            "{} 평점은 1~5 사이여야 합니다: {}",
            name, value
        )))
    }
}

impl Marketplace {
    /// 리뷰 작성 (완료된 주문의 구매자만, 주문당 1회)
    pub async fn create_review(&self, reviewer_id: UserId, cmd: CreateReviewCommand) -> Result<Review> {
        check_rating("소통", cmd.communication_rating)?;
        check_rating("서비스", cmd.service_rating)?;
        check_rating("추천", cmd.recommendation_rating)?;

        let context = self.order_context(cmd.order_id).await?;
        let now = self.now();
        let mut uow = self.begin().await?;
        let order = Self::load_order(uow.as_mut(), cmd.order_id).await?;
        if order.status != OrderStatus::Completed {
            return Err(MarketError::InvalidState(format!(
                "완료된 주문에만 리뷰를 작성할 수 있습니다: {}",
                order.status
            )));
        }
        if order.buyer_id != reviewer_id {
            return Err(MarketError::PermissionDenied(
                "주문의 구매자만 리뷰를 작성할 수 있습니다.".to_string(),
            ));
        }
        if uow.review_for_order(order.id).await?.is_some() {
            return Err(MarketError::Conflict(format!(
                "주문 {}의 리뷰가 이미 있습니다.",
                order.id
            )));
        }
        // 평균 재계산 전에 판매자 프로필을 잠근다.
        uow.seller_profile(order.seller_id).await?;

        let review = Review {
            id: self.new_id(),
            order_id: order.id,
            gig_id: order.gig_id,
            reviewer_id,
            reviewee_id: order.seller_user_id,
            communication_rating: cmd.communication_rating,
            service_rating: cmd.service_rating,
            recommendation_rating: cmd.recommendation_rating,
            overall_rating: overall_rating(
                cmd.communication_rating,
                cmd.service_rating,
                cmd.recommendation_rating,
            ),
            comment: cmd
                .comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            seller_response: None,
            seller_response_date: None,
            created_at: now,
        };
        uow.insert_review(&review).await?;

        let reviews = uow
            .reviews(ReviewQuery::Reviewee(order.seller_user_id))
            .await?;
        let rating_average =
            reviews.iter().map(|r| r.overall_rating).sum::<f64>() / reviews.len().max(1) as f64;
        uow.patch_seller_profile(
            order.seller_id,
            &SellerProfilePatch {
                rating_average: Some(rating_average),
                ..Default::default()
            },
        )
        .await?;

        let total_reviews = uow.gig_stats(order.gig_id).await?.map_or(0, |s| s.total_reviews) + 1;
        uow.patch_gig_stats(
            order.gig_id,
            &GigStatsPatch {
                total_reviews: Some(total_reviews),
                ..Default::default()
            },
        )
        .await?;

        Self::refresh_seller_level(
            uow.as_mut(),
            order.seller_id,
            order.seller_user_id,
            context.seller.as_ref(),
            now,
        )
        .await?;
        uow.commit().await?;

        info!(
            "{:<12} --> 리뷰 등록 order: {} overall: {:.2} 판매자 평균: {:.2}",
            "Review", order.id, review.overall_rating, rating_average
        );

        let mut outbox = Outbox::default();
        outbox.push(
            order.seller_user_id,
            NotificationKind::NewReview,
            EntityKind::Review,
            review.id.0,
            now,
        );
        self.dispatch(outbox).await;
        Ok(review)
    }

    /// 판매자 답글 (리뷰 대상 판매자만, 1회)
    pub async fn respond_to_review(
        &self,
        review_id: ReviewId,
        seller_user_id: UserId,
        cmd: RespondToReviewCommand,
    ) -> Result<Review> {
        let response = cmd.response.trim();
        if response.is_empty() {
            return Err(MarketError::Validation("답글 내용이 비어 있습니다.".to_string()));
        }

        let now = self.now();
        let mut uow = self.begin().await?;
        let mut review = uow
            .review(review_id)
            .await?
            .ok_or_else(|| MarketError::not_found("review", review_id))?;
        if review.reviewee_id != seller_user_id {
            return Err(MarketError::PermissionDenied(
                "리뷰 대상 판매자만 답글을 작성할 수 있습니다.".to_string(),
            ));
        }
        if review.seller_response.is_some() {
            return Err(MarketError::Conflict(format!(
                "리뷰 {}에는 이미 답글이 있습니다.",
                review.id
            )));
        }

        review.seller_response = Some(response.to_string());
        review.seller_response_date = Some(now);
        uow.update_review(&review).await?;
        uow.commit().await?;

        info!("{:<12} --> 리뷰 답글 등록 review: {}", "Review", review.id);
        Ok(review)
    }

    /// 판매자가 받은 리뷰 (최신순)
    pub async fn seller_reviews(&self, seller_id: SellerId) -> Result<Vec<Review>> {
        let seller_user_id = self
            .identity
            .resolve_seller_user(seller_id)
            .await?
            .ok_or_else(|| MarketError::not_found("seller", seller_id))?;
        let mut uow = self.begin().await?;
        uow.reviews(ReviewQuery::Reviewee(seller_user_id)).await
    }

    /// 긱 리뷰 (최신순)
    pub async fn gig_reviews(&self, gig_id: GigId) -> Result<Vec<Review>> {
        let mut uow = self.begin().await?;
        uow.reviews(ReviewQuery::Gig(gig_id)).await
    }
}
