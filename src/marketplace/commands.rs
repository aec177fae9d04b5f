/// 엔진 연산 입력
/// 호출자 식별자는 명령에 담지 않고 연산 인자로 따로 받는다.
// region:    --- Imports
use super::model::{GigId, OfferId, OrderId, OrderStatus, PackageId, UserId};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Commands
/// 커스텀 오퍼 생성
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOfferCommand {
    pub buyer_id: UserId,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub delivery_time: i32,
    #[serde(default)]
    pub revision_count: i32,
    /// 없으면 기본 유효 기간 사용
    #[serde(default)]
    pub expiry_days: Option<i64>,
}

/// 주문 생성 (패키지 또는 수락된 오퍼 중 하나)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderCommand {
    pub gig_id: GigId,
    #[serde(default)]
    pub package_id: Option<PackageId>,
    #[serde(default)]
    pub offer_id: Option<OfferId>,
    #[serde(default)]
    pub requirements: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusCommand {
    pub status: OrderStatus,
}

/// 납품
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverCommand {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default = "final_by_default")]
    pub is_final: bool,
}

fn final_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRevisionCommand {
    pub request_message: String,
}

/// 리뷰 작성 (세부 평점은 1~5)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewCommand {
    pub order_id: OrderId,
    pub communication_rating: i32,
    pub service_rating: i32,
    pub recommendation_rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondToReviewCommand {
    pub response: String,
}

/// 출금 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalCommand {
    pub amount: i64,
    pub method: String,
}
// endregion: --- Commands
