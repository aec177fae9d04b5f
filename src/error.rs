/// 거래 엔진 오류 분류
/// 모든 연산은 실패 시 아래 종류 중 하나를 호출자에게 그대로 돌려준다.
// region:    --- Imports
use crate::marketplace::model::OrderStatus;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Market Error
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("{entity}을(를) 찾을 수 없습니다: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("권한이 없습니다: {0}")]
    PermissionDenied(String),

    #[error("상태를 {from}에서 {to}(으)로 변경할 수 없습니다.")]
    InvalidStateTransition { from: OrderStatus, to: OrderStatus },

    #[error("현재 상태에서 처리할 수 없습니다: {0}")]
    InvalidState(String),

    #[error("입력값 오류: {0}")]
    Validation(String),

    #[error("이미 존재합니다: {0}")]
    Conflict(String),

    #[error("오퍼가 만료되었습니다: {0}")]
    Expired(String),

    #[error("본인과 거래할 수 없습니다.")]
    SelfDealing,

    #[error("수정 요청 횟수를 모두 사용했습니다. ({used}/{quota})")]
    RevisionQuotaExceeded { used: i32, quota: i32 },

    #[error("출금 가능 잔액이 부족합니다. (요청 {requested}, 가능 {available})")]
    InsufficientBalance { requested: i64, available: i64 },

    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),

    #[error("설정 오류: {0}")]
    Config(String),

    #[error("내부 오류: {0}")]
    Internal(String),
}

impl MarketError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// 응답 본문에 실리는 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Expired(_) => "EXPIRED",
            Self::SelfDealing => "SELF_DEALING",
            Self::RevisionQuotaExceeded { .. } => "REVISION_QUOTA_EXCEEDED",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T, E = MarketError> = std::result::Result<T, E>;
// endregion: --- Market Error
