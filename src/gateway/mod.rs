/// 외부 협력자 경계
/// 1. 시계 / 식별자 생성기
/// 2. 사용자(Identity) 게이트웨이
/// 3. 카탈로그(Catalog) 게이트웨이
/// 4. 출금(Payout) 게이트웨이
// region:    --- Imports
use crate::error::Result;
use crate::marketplace::model::{GigId, PackageId, SellerId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Modules
pub mod directory;
pub mod postgres;

pub use directory::Directory;
pub use postgres::PgDirectory;
// endregion: --- Modules

// region:    --- Clock / IdGenerator
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 수동으로 진행시키는 시계 (만료/기간 계산 검증용)
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> Uuid;
}

pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
// endregion: --- Clock / IdGenerator

// region:    --- Identity
/// 사용자 권한 집합
/// 자유 문자열 역할("buyer"/"seller"/"both"/"admin") 대신 사용한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_buy: bool,
    pub can_sell: bool,
    pub is_admin: bool,
}

impl Capabilities {
    pub const BUYER: Capabilities = Capabilities {
        can_buy: true,
        can_sell: false,
        is_admin: false,
    };
    pub const SELLER: Capabilities = Capabilities {
        can_buy: false,
        can_sell: true,
        is_admin: false,
    };
    pub const BOTH: Capabilities = Capabilities {
        can_buy: true,
        can_sell: true,
        is_admin: false,
    };
    pub const ADMIN: Capabilities = Capabilities {
        can_buy: true,
        can_sell: true,
        is_admin: true,
    };

    /// 기존 역할 문자열 변환
    pub fn from_role(role: &str) -> Option<Self> {
        match role.trim().to_ascii_lowercase().as_str() {
            "buyer" => Some(Self::BUYER),
            "seller" => Some(Self::SELLER),
            "both" => Some(Self::BOTH),
            "admin" => Some(Self::ADMIN),
            _ => None,
        }
    }

    /// 구매자 -> 구매자+판매자 전환
    pub fn grant_selling(self) -> Self {
        Self {
            can_sell: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub capabilities: Capabilities,
    pub registered_at: DateTime<Utc>,
}

/// 판매자 프로필 (실제 사용자와 1:1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerAccount {
    pub id: SellerId,
    pub user_id: UserId,
    pub completion_rate: Option<f64>,
    pub response_time: Option<f64>,
    pub joined_at: DateTime<Utc>,
}

#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn user(&self, user_id: UserId) -> Result<Option<UserAccount>>;

    async fn seller(&self, seller_id: SellerId) -> Result<Option<SellerAccount>>;

    async fn user_exists(&self, user_id: UserId) -> Result<bool> {
        Ok(self.user(user_id).await?.is_some())
    }

    /// 판매자 프로필의 실제 사용자 조회
    async fn resolve_seller_user(&self, seller_id: SellerId) -> Result<Option<UserId>> {
        Ok(self.seller(seller_id).await?.map(|seller| seller.user_id))
    }
}
// endregion: --- Identity

// region:    --- Catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "package_type", rename_all = "snake_case")]
pub enum PackageType {
    Basic,
    Standard,
    Premium,
}

/// 랭킹 계산에 필요한 긱 정보
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GigListing {
    pub id: GigId,
    pub seller_id: SellerId,
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub image_count: i32,
    pub tag_count: i32,
    pub conversion_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GigPackage {
    pub id: PackageId,
    pub gig_id: GigId,
    pub package_type: PackageType,
    pub price: i64,
    pub delivery_time: i32,
    pub revision_count: i32,
    pub is_active: bool,
}

#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// 활성/비활성 관계없이 긱 조회
    async fn gig(&self, gig_id: GigId) -> Result<Option<GigListing>>;

    /// 해당 긱에 속한 활성 패키지 조회
    async fn active_package(
        &self,
        gig_id: GigId,
        package_id: PackageId,
    ) -> Result<Option<GigPackage>>;

    async fn active_gig(&self, gig_id: GigId) -> Result<Option<GigListing>> {
        Ok(self.gig(gig_id).await?.filter(|gig| gig.is_active))
    }
}
// endregion: --- Catalog

// region:    --- Payout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutReceipt {
    pub reference: String,
    pub seller_user_id: UserId,
    pub amount: i64,
    pub method: String,
    pub requested_at: DateTime<Utc>,
}

/// 외부 출금 처리
#[async_trait]
pub trait PayoutGateway: Send + Sync {
    async fn request_payout(
        &self,
        seller_user_id: UserId,
        amount: i64,
        method: &str,
        now: DateTime<Utc>,
    ) -> Result<PayoutReceipt>;
}

/// 실제 송금 없이 요청을 승인만 한다.
pub struct StubPayoutGateway;

#[async_trait]
impl PayoutGateway for StubPayoutGateway {
    async fn request_payout(
        &self,
        seller_user_id: UserId,
        amount: i64,
        method: &str,
        now: DateTime<Utc>,
    ) -> Result<PayoutReceipt> {
        Ok(PayoutReceipt {
            reference: format!("payout_{}", Uuid::new_v4()),
            seller_user_id,
            amount,
            method: method.to_string(),
            requested_at: now,
        })
    }
}
// endregion: --- Payout

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_roles_map_to_capabilities() {
        assert_eq!(Capabilities::from_role("buyer"), Some(Capabilities::BUYER));
        assert_eq!(Capabilities::from_role(" Both "), Some(Capabilities::BOTH));
        assert!(Capabilities::from_role("admin").unwrap().is_admin);
        assert_eq!(Capabilities::from_role("guest"), None);
    }

    #[test]
    fn buyer_can_be_granted_selling() {
        let caps = Capabilities::BUYER.grant_selling();
        assert_eq!(caps, Capabilities::BOTH);
    }

    #[test]
    fn manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance(Duration::days(2));
        assert_eq!(clock.now(), start + Duration::days(2));
    }
}
