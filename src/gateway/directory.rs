/// 메모리 기반 사용자/카탈로그 디렉터리
/// 별도의 사용자/카탈로그 서비스가 없는 개발 환경과 테스트에서 사용한다.
// region:    --- Imports
use super::{
    CatalogGateway, GigListing, GigPackage, IdentityGateway, SellerAccount, UserAccount,
};
use crate::error::{MarketError, Result};
use crate::marketplace::model::{GigId, PackageId, SellerId, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

// endregion: --- Imports

/// 판매자당 활성 긱 최대 개수
pub const MAX_ACTIVE_GIGS_PER_SELLER: usize = 5;

#[derive(Default)]
struct DirectoryState {
    users: HashMap<UserId, UserAccount>,
    sellers: HashMap<SellerId, SellerAccount>,
    gigs: HashMap<GigId, GigListing>,
    packages: HashMap<PackageId, GigPackage>,
}

#[derive(Default)]
pub struct Directory {
    state: RwLock<DirectoryState>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_user(&self, account: UserAccount) {
        info!("{:<12} --> 사용자 등록 id: {}", "Directory", account.id);
        self.state.write().await.users.insert(account.id, account);
    }

    /// 판매자 등록 (실제 사용자가 먼저 등록되어 있어야 함)
    pub async fn register_seller(&self, account: SellerAccount) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&account.user_id) {
            return Err(MarketError::not_found("user", account.user_id));
        }
        if state.sellers.values().any(|s| s.user_id == account.user_id) {
            return Err(MarketError::Conflict(format!(
                "사용자 {}는 이미 판매자 프로필이 있습니다.",
                account.user_id
            )));
        }
        info!("{:<12} --> 판매자 등록 id: {}", "Directory", account.id);
        state.sellers.insert(account.id, account);
        Ok(())
    }

    /// 긱 등록
    /// 판매자당 활성 긱은 최대 5개까지만 허용한다.
    pub async fn register_gig(&self, gig: GigListing) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.sellers.contains_key(&gig.seller_id) {
            return Err(MarketError::not_found("seller", gig.seller_id));
        }
        let active = state
            .gigs
            .values()
            .filter(|g| g.seller_id == gig.seller_id && g.is_active)
            .count();
        if gig.is_active && active >= MAX_ACTIVE_GIGS_PER_SELLER {
            return Err(MarketError::Conflict(format!(
                "판매자 {}의 활성 긱은 최대 {}개입니다.",
                gig.seller_id, MAX_ACTIVE_GIGS_PER_SELLER
            )));
        }
        info!("{:<12} --> 긱 등록 id: {}", "Directory", gig.id);
        state.gigs.insert(gig.id, gig);
        Ok(())
    }

    pub async fn deactivate_gig(&self, gig_id: GigId) -> Result<()> {
        let mut state = self.state.write().await;
        let gig = state
            .gigs
            .get_mut(&gig_id)
            .ok_or_else(|| MarketError::not_found("gig", gig_id))?;
        gig.is_active = false;
        Ok(())
    }

    /// 패키지 등록 (긱당 패키지 유형별 1개)
    pub async fn add_package(&self, package: GigPackage) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.gigs.contains_key(&package.gig_id) {
            return Err(MarketError::not_found("gig", package.gig_id));
        }
        let duplicated = state
            .packages
            .values()
            .any(|p| p.gig_id == package.gig_id && p.package_type == package.package_type);
        if duplicated {
            return Err(MarketError::Conflict(format!(
                "긱 {}에 {:?} 패키지가 이미 있습니다.",
                package.gig_id, package.package_type
            )));
        }
        state.packages.insert(package.id, package);
        Ok(())
    }
}

#[async_trait]
impl IdentityGateway for Directory {
    async fn user(&self, user_id: UserId) -> Result<Option<UserAccount>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn seller(&self, seller_id: SellerId) -> Result<Option<SellerAccount>> {
        Ok(self.state.read().await.sellers.get(&seller_id).cloned())
    }
}

#[async_trait]
impl CatalogGateway for Directory {
    async fn gig(&self, gig_id: GigId) -> Result<Option<GigListing>> {
        Ok(self.state.read().await.gigs.get(&gig_id).cloned())
    }

    async fn active_package(
        &self,
        gig_id: GigId,
        package_id: PackageId,
    ) -> Result<Option<GigPackage>> {
        Ok(self
            .state
            .read()
            .await
            .packages
            .get(&package_id)
            .filter(|p| p.gig_id == gig_id && p.is_active)
            .cloned())
    }
}
