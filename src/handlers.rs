/// HTTP 어댑터
/// 세션은 외부에서 관리하므로 호출자는 x-user-id (판매자 작업은 x-seller-id) 헤더로 전달된다.
// region:    --- Imports
use crate::error::MarketError;
use crate::marketplace::commands::{
    CreateOfferCommand, CreateOrderCommand, CreateReviewCommand, DeliverCommand,
    RequestRevisionCommand, RespondToReviewCommand, UpdateStatusCommand, WithdrawalCommand,
};
use crate::marketplace::model::{
    GigId, OfferId, OrderId, OrderStatus, PaymentId, ReviewId, SellerId, UserId,
};
use crate::marketplace::Marketplace;
use async_trait::async_trait;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

// endregion: --- Imports

pub const USER_HEADER: &str = "x-user-id";
pub const SELLER_HEADER: &str = "x-seller-id";

type MarketState = State<Arc<Marketplace>>;
type HandlerResult = Result<Response, MarketError>;

// region:    --- Router
pub fn router(marketplace: Arc<Marketplace>) -> Router {
    Router::new()
        .route("/offers", post(handle_create_offer))
        .route("/offers/sent", get(handle_sent_offers))
        .route("/offers/received", get(handle_received_offers))
        .route("/offers/:id", get(handle_get_offer))
        .route("/offers/:id/accept", post(handle_accept_offer))
        .route("/offers/:id/reject", post(handle_reject_offer))
        .route("/orders", post(handle_create_order).get(handle_list_orders))
        .route("/orders/:id", get(handle_get_order))
        .route("/orders/:id/status", patch(handle_update_status))
        .route("/orders/:id/deliver", post(handle_deliver))
        .route("/orders/:id/deliveries", get(handle_deliveries))
        .route(
            "/orders/:id/revisions",
            post(handle_request_revision).get(handle_revisions),
        )
        .route("/orders/:id/complete", post(handle_complete_order))
        .route("/orders/:id/cancel", post(handle_cancel_order))
        .route("/payments/:id", get(handle_get_payment))
        .route("/earnings", get(handle_earnings_summary))
        .route("/earnings/history", get(handle_earnings_history))
        .route("/earnings/withdrawals", post(handle_withdrawal))
        .route("/reviews", post(handle_create_review))
        .route("/reviews/:id/response", post(handle_respond_to_review))
        .route("/sellers/:id/reviews", get(handle_seller_reviews))
        .route("/gigs/:id/reviews", get(handle_gig_reviews))
        .route("/gigs/:id/ranking", get(handle_gig_ranking))
        .with_state(marketplace)
}
// endregion: --- Router

// region:    --- Error Response
impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = match &self {
            MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
            MarketError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            MarketError::InvalidStateTransition { .. }
            | MarketError::InvalidState(_)
            | MarketError::Conflict(_)
            | MarketError::Expired(_) => StatusCode::CONFLICT,
            MarketError::Validation(_) => StatusCode::BAD_REQUEST,
            MarketError::SelfDealing
            | MarketError::RevisionQuotaExceeded { .. }
            | MarketError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            MarketError::Database(_) | MarketError::Config(_) | MarketError::Internal(_) => {
                error!("{:<12} --> 내부 오류: {:?}", "Handler", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(json!({
                "error": self.to_string(),
                "code": self.code()
            })),
        )
            .into_response()
    }
}
// endregion: --- Error Response

// region:    --- Caller Extractors
/// x-user-id 헤더의 호출 사용자
pub struct Caller(pub UserId);

/// x-seller-id 헤더의 판매자 프로필
pub struct SellerCaller(pub SellerId);

fn header_uuid(parts: &Parts, name: &str) -> Result<Uuid, MarketError> {
    let raw = parts
        .headers
        .get(name)
        .ok_or_else(|| MarketError::PermissionDenied(format!("{} 헤더가 필요합니다.", name)))?;
    raw.to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or_else(|| MarketError::Validation(format!("{} 헤더 형식이 올바르지 않습니다.", name)))
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_uuid(parts, USER_HEADER).map(|id| Caller(UserId(id)))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SellerCaller {
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_uuid(parts, SELLER_HEADER).map(|id| SellerCaller(SellerId(id)))
    }
}
// endregion: --- Caller Extractors

// region:    --- Offer Handlers
/// 오퍼 생성
pub async fn handle_create_offer(
    State(market): MarketState,
    SellerCaller(seller_id): SellerCaller,
    Json(cmd): Json<CreateOfferCommand>,
) -> HandlerResult {
    info!("{:<12} --> 오퍼 생성 seller: {}", "Handler", seller_id);
    let offer = market.create_offer(seller_id, cmd).await?;
    Ok((StatusCode::CREATED, Json(offer)).into_response())
}

pub async fn handle_sent_offers(
    State(market): MarketState,
    SellerCaller(seller_id): SellerCaller,
) -> HandlerResult {
    Ok(Json(market.sent_offers(seller_id).await?).into_response())
}

pub async fn handle_received_offers(
    State(market): MarketState,
    Caller(user_id): Caller,
) -> HandlerResult {
    Ok(Json(market.received_offers(user_id).await?).into_response())
}

pub async fn handle_get_offer(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(offer_id): Path<OfferId>,
) -> HandlerResult {
    Ok(Json(market.get_offer(offer_id, user_id).await?).into_response())
}

/// 오퍼 수락
pub async fn handle_accept_offer(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(offer_id): Path<OfferId>,
) -> HandlerResult {
    info!("{:<12} --> 오퍼 수락 id: {}", "Handler", offer_id);
    Ok(Json(market.accept_offer(offer_id, user_id).await?).into_response())
}

/// 오퍼 거절
pub async fn handle_reject_offer(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(offer_id): Path<OfferId>,
) -> HandlerResult {
    info!("{:<12} --> 오퍼 거절 id: {}", "Handler", offer_id);
    Ok(Json(market.reject_offer(offer_id, user_id).await?).into_response())
}
// endregion: --- Offer Handlers

// region:    --- Order Handlers
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderRole {
    #[default]
    Buyer,
    Seller,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    #[serde(default)]
    pub role: OrderRole,
    pub status: Option<OrderStatus>,
}

/// 주문 생성
pub async fn handle_create_order(
    State(market): MarketState,
    Caller(user_id): Caller,
    Json(cmd): Json<CreateOrderCommand>,
) -> HandlerResult {
    info!("{:<12} --> 주문 생성 buyer: {}", "Handler", user_id);
    let order = market.create_order(user_id, cmd).await?;
    Ok((StatusCode::CREATED, Json(order)).into_response())
}

/// 주문 목록 (role=buyer|seller, status 선택)
pub async fn handle_list_orders(
    State(market): MarketState,
    Caller(user_id): Caller,
    Query(query): Query<OrderListQuery>,
) -> HandlerResult {
    let orders = match query.role {
        OrderRole::Buyer => market.buyer_orders(user_id, query.status).await?,
        OrderRole::Seller => market.seller_orders(user_id, query.status).await?,
    };
    Ok(Json(orders).into_response())
}

pub async fn handle_get_order(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(order_id): Path<OrderId>,
) -> HandlerResult {
    Ok(Json(market.get_order(order_id, user_id).await?).into_response())
}

/// 주문 상태 변경
pub async fn handle_update_status(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(order_id): Path<OrderId>,
    Json(cmd): Json<UpdateStatusCommand>,
) -> HandlerResult {
    info!(
        "{:<12} --> 주문 상태 변경 id: {} -> {}",
        "Handler", order_id, cmd.status
    );
    Ok(Json(market.update_order_status(order_id, user_id, cmd).await?).into_response())
}

/// 납품
pub async fn handle_deliver(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(order_id): Path<OrderId>,
    Json(cmd): Json<DeliverCommand>,
) -> HandlerResult {
    info!("{:<12} --> 납품 order: {}", "Handler", order_id);
    let (order, delivery) = market.deliver(order_id, user_id, cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "order": order, "delivery": delivery })),
    )
        .into_response())
}

pub async fn handle_deliveries(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(order_id): Path<OrderId>,
) -> HandlerResult {
    Ok(Json(market.deliveries(order_id, user_id).await?).into_response())
}

/// 수정 요청
pub async fn handle_request_revision(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(order_id): Path<OrderId>,
    Json(cmd): Json<RequestRevisionCommand>,
) -> HandlerResult {
    info!("{:<12} --> 수정 요청 order: {}", "Handler", order_id);
    let (order, revision) = market.request_revision(order_id, user_id, cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "order": order, "revision": revision })),
    )
        .into_response())
}

pub async fn handle_revisions(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(order_id): Path<OrderId>,
) -> HandlerResult {
    Ok(Json(market.revisions(order_id, user_id).await?).into_response())
}

/// 주문 완료
pub async fn handle_complete_order(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(order_id): Path<OrderId>,
) -> HandlerResult {
    info!("{:<12} --> 주문 완료 id: {}", "Handler", order_id);
    Ok(Json(market.complete_order(order_id, user_id).await?).into_response())
}

/// 주문 취소
pub async fn handle_cancel_order(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(order_id): Path<OrderId>,
) -> HandlerResult {
    info!("{:<12} --> 주문 취소 id: {}", "Handler", order_id);
    Ok(Json(market.cancel_order(order_id, user_id).await?).into_response())
}
// endregion: --- Order Handlers

// region:    --- Payment Handlers
pub async fn handle_get_payment(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(payment_id): Path<PaymentId>,
) -> HandlerResult {
    Ok(Json(market.get_payment(payment_id, user_id).await?).into_response())
}

pub async fn handle_earnings_summary(
    State(market): MarketState,
    Caller(user_id): Caller,
) -> HandlerResult {
    Ok(Json(market.earnings_summary(user_id).await?).into_response())
}

pub async fn handle_earnings_history(
    State(market): MarketState,
    Caller(user_id): Caller,
) -> HandlerResult {
    Ok(Json(market.earnings_history(user_id).await?).into_response())
}

/// 출금 요청
pub async fn handle_withdrawal(
    State(market): MarketState,
    Caller(user_id): Caller,
    Json(cmd): Json<WithdrawalCommand>,
) -> HandlerResult {
    info!(
        "{:<12} --> 출금 요청 seller: {} amount: {}",
        "Handler", user_id, cmd.amount
    );
    let receipt = market.request_withdrawal(user_id, cmd).await?;
    Ok((StatusCode::ACCEPTED, Json(receipt)).into_response())
}
// endregion: --- Payment Handlers

// region:    --- Review Handlers
/// 리뷰 작성
pub async fn handle_create_review(
    State(market): MarketState,
    Caller(user_id): Caller,
    Json(cmd): Json<CreateReviewCommand>,
) -> HandlerResult {
    info!("{:<12} --> 리뷰 작성 order: {}", "Handler", cmd.order_id);
    let review = market.create_review(user_id, cmd).await?;
    Ok((StatusCode::CREATED, Json(review)).into_response())
}

/// 리뷰 답글
pub async fn handle_respond_to_review(
    State(market): MarketState,
    Caller(user_id): Caller,
    Path(review_id): Path<ReviewId>,
    Json(cmd): Json<RespondToReviewCommand>,
) -> HandlerResult {
    Ok(Json(market.respond_to_review(review_id, user_id, cmd).await?).into_response())
}

pub async fn handle_seller_reviews(
    State(market): MarketState,
    Path(seller_id): Path<SellerId>,
) -> HandlerResult {
    Ok(Json(market.seller_reviews(seller_id).await?).into_response())
}

pub async fn handle_gig_reviews(
    State(market): MarketState,
    Path(gig_id): Path<GigId>,
) -> HandlerResult {
    Ok(Json(market.gig_reviews(gig_id).await?).into_response())
}

/// 긱 랭킹 (조회 시 재계산)
pub async fn handle_gig_ranking(
    State(market): MarketState,
    Path(gig_id): Path<GigId>,
) -> HandlerResult {
    Ok(Json(market.gig_ranking(gig_id).await?).into_response())
}
// endregion: --- Review Handlers
