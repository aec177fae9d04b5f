/// Postgres 기반 사용자/카탈로그 조회
/// 사용자, 판매자 프로필, 긱 테이블은 다른 서비스가 관리하며 여기서는 읽기만 한다.
// region:    --- Imports
use super::{
    CatalogGateway, Capabilities, GigListing, GigPackage, IdentityGateway, SellerAccount,
    UserAccount,
};
use crate::error::{MarketError, Result};
use crate::marketplace::model::{GigId, PackageId, SellerId, UserId};
use crate::query::queries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

// endregion: --- Imports

pub struct PgDirectory {
    pool: Arc<PgPool>,
}

impl PgDirectory {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityGateway for PgDirectory {
    async fn user(&self, user_id: UserId) -> Result<Option<UserAccount>> {
        let row: Option<(UserId, String, DateTime<Utc>)> = sqlx::query_as(queries::GET_USER)
            .bind(user_id)
            .fetch_optional(&*self.pool)
            .await?;

        row.map(|(id, role, registered_at)| {
            let capabilities = Capabilities::from_role(&role).ok_or_else(|| {
                MarketError::Internal(format!("알 수 없는 사용자 역할입니다: {}", role))
            })?;
            Ok(UserAccount {
                id,
                capabilities,
                registered_at,
            })
        })
        .transpose()
    }

    async fn seller(&self, seller_id: SellerId) -> Result<Option<SellerAccount>> {
        let row: Option<(SellerId, UserId, Option<f64>, Option<f64>, DateTime<Utc>)> =
            sqlx::query_as(queries::GET_SELLER)
                .bind(seller_id)
                .fetch_optional(&*self.pool)
                .await?;

        Ok(row.map(
            |(id, user_id, completion_rate, response_time, joined_at)| SellerAccount {
                id,
                user_id,
                completion_rate,
                response_time,
                joined_at,
            },
        ))
    }
}

#[async_trait]
impl CatalogGateway for PgDirectory {
    async fn gig(&self, gig_id: GigId) -> Result<Option<GigListing>> {
        let gig = sqlx::query_as::<_, GigListing>(queries::GET_GIG_LISTING)
            .bind(gig_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(gig)
    }

    async fn active_package(
        &self,
        gig_id: GigId,
        package_id: PackageId,
    ) -> Result<Option<GigPackage>> {
        let package = sqlx::query_as::<_, GigPackage>(queries::GET_ACTIVE_PACKAGE)
            .bind(package_id)
            .bind(gig_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(package)
    }
}
