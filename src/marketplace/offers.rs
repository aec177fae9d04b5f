/// 커스텀 오퍼
/// 1. 생성
/// 2. 수락 / 거절
/// 3. 조회
/// 4. 만료 처리
// region:    --- Imports
use super::commands::CreateOfferCommand;
use super::model::{Offer, OfferId, OfferStatus, SellerId, UserId};
use super::payments::split_fee;
use super::{days_after, Marketplace, Outbox};
use crate::error::{MarketError, Result};
use crate::notification::{EntityKind, NotificationKind};
use tracing::info;

// endregion: --- Imports

/// 오퍼 작업 기간 상한 (일)
pub const MAX_DELIVERY_DAYS: i32 = 365;
/// 오퍼 유효 기간 상한 (일)
pub const MAX_EXPIRY_DAYS: i64 = 90;

impl Marketplace {
    /// 1. 오퍼 생성
    pub async fn create_offer(&self, seller_id: SellerId, cmd: CreateOfferCommand) -> Result<Offer> {
        info!(
            "{:<12} --> 오퍼 생성 seller: {} buyer: {}",
            "Offer", seller_id, cmd.buyer_id
        );

        if cmd.title.trim().is_empty() {
            return Err(MarketError::Validation("오퍼 제목이 비어 있습니다.".to_string()));
        }
        if cmd.price <= 0 {
            return Err(MarketError::Validation(format!(
                "가격은 0보다 커야 합니다: {}",
                cmd.price
            )));
        }
        split_fee(cmd.price)?;
        if !(1..=MAX_DELIVERY_DAYS).contains(&cmd.delivery_time) {
            return Err(MarketError::Validation(format!(
                "작업 기간은 1~{}일이어야 합니다: {}",
                MAX_DELIVERY_DAYS, cmd.delivery_time
            )));
        }
        if cmd.revision_count < 0 {
            return Err(MarketError::Validation(format!(
                "수정 횟수는 음수일 수 없습니다: {}",
                cmd.revision_count
            )));
        }
        let expiry_days = cmd.expiry_days.unwrap_or(self.settings.offer_expiry_days);
        if !(1..=MAX_EXPIRY_DAYS).contains(&expiry_days) {
            return Err(MarketError::Validation(format!(
                "유효 기간은 1~{}일이어야 합니다: {}",
                MAX_EXPIRY_DAYS, expiry_days
            )));
        }

        let seller = self
            .identity
            .seller(seller_id)
            .await?
            .ok_or_else(|| MarketError::not_found("seller", seller_id))?;
        if seller.user_id == cmd.buyer_id {
            return Err(MarketError::SelfDealing);
        }
        if !self.identity.user_exists(cmd.buyer_id).await? {
            return Err(MarketError::not_found("user", cmd.buyer_id));
        }
        let seller_user = self
            .identity
            .user(seller.user_id)
            .await?
            .ok_or_else(|| MarketError::not_found("user", seller.user_id))?;
        if !seller_user.capabilities.can_sell {
            return Err(MarketError::PermissionDenied(
                "판매 권한이 없는 사용자입니다.".to_string(),
            ));
        }

        let now = self.now();
        let expiry_date = days_after(now, expiry_days)?;
        let offer = Offer {
            id: self.new_id(),
            seller_id,
            buyer_id: cmd.buyer_id,
            title: cmd.title.trim().to_string(),
            description: cmd.description,
            price: cmd.price,
            delivery_time: cmd.delivery_time,
            revision_count: cmd.revision_count,
            expiry_date,
            status: OfferStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let mut uow = self.begin().await?;
        uow.insert_offer(&offer).await?;
        uow.commit().await?;

        let mut outbox = Outbox::default();
        outbox.push(
            offer.buyer_id,
            NotificationKind::NewOffer,
            EntityKind::Offer,
            offer.id.0,
            now,
        );
        self.dispatch(outbox).await;

        info!("{:<12} --> 오퍼 생성 완료 id: {}", "Offer", offer.id);
        Ok(offer)
    }

    /// 2. 오퍼 수락
    /// 주문은 만들지 않는다. 수락된 오퍼로 주문 생성을 따로 호출해야 한다.
    pub async fn accept_offer(&self, offer_id: OfferId, buyer_id: UserId) -> Result<Offer> {
        self.decide_offer(offer_id, buyer_id, OfferStatus::Accepted)
            .await
    }

    /// 2. 오퍼 거절
    pub async fn reject_offer(&self, offer_id: OfferId, buyer_id: UserId) -> Result<Offer> {
        self.decide_offer(offer_id, buyer_id, OfferStatus::Rejected)
            .await
    }

    async fn decide_offer(
        &self,
        offer_id: OfferId,
        buyer_id: UserId,
        decision: OfferStatus,
    ) -> Result<Offer> {
        info!(
            "{:<12} --> 오퍼 {:?} 요청 id: {} buyer: {}",
            "Offer", decision, offer_id, buyer_id
        );
        let now = self.now();
        let mut uow = self.begin().await?;

        let mut offer = uow
            .offer(offer_id)
            .await?
            .ok_or_else(|| MarketError::not_found("offer", offer_id))?;
        if offer.buyer_id != buyer_id {
            return Err(MarketError::PermissionDenied(
                "오퍼를 받은 구매자만 처리할 수 있습니다.".to_string(),
            ));
        }
        if offer.status != OfferStatus::Pending {
            return Err(MarketError::InvalidState(format!(
                "대기 중인 오퍼가 아닙니다: {:?}",
                offer.status
            )));
        }
        if decision == OfferStatus::Accepted && offer.is_expired(now) {
            return Err(MarketError::Expired(format!(
                "오퍼 {}는 {}에 만료되었습니다.",
                offer.id, offer.expiry_date
            )));
        }

        uow.update_offer_status(offer_id, decision, now).await?;
        uow.commit().await?;
        offer.status = decision;
        offer.updated_at = now;

        let mut outbox = Outbox::default();
        match self.identity.resolve_seller_user(offer.seller_id).await {
            Ok(Some(seller_user)) => {
                let kind = if decision == OfferStatus::Accepted {
                    NotificationKind::OfferAccepted
                } else {
                    NotificationKind::OfferRejected
                };
                outbox.push(seller_user, kind, EntityKind::Offer, offer.id.0, now);
            }
            Ok(None) => {}
            Err(e) => info!(
                "{:<12} --> 판매자 조회 실패로 알림 생략 seller: {} ({})",
                "Offer", offer.seller_id, e
            ),
        }
        self.dispatch(outbox).await;

        Ok(offer)
    }

    /// 3. 오퍼 단건 조회 (구매자 또는 판매자 본인)
    pub async fn get_offer(&self, offer_id: OfferId, caller: UserId) -> Result<Offer> {
        let mut uow = self.begin().await?;
        let offer = uow
            .offer(offer_id)
            .await?
            .ok_or_else(|| MarketError::not_found("offer", offer_id))?;
        drop(uow);

        if offer.buyer_id == caller {
            return Ok(offer);
        }
        let seller_user = self.identity.resolve_seller_user(offer.seller_id).await?;
        if seller_user == Some(caller) {
            Ok(offer)
        } else {
            Err(MarketError::PermissionDenied(
                "오퍼 당사자만 조회할 수 있습니다.".to_string(),
            ))
        }
    }

    /// 3. 판매자가 보낸 오퍼 (최신순)
    pub async fn sent_offers(&self, seller_id: SellerId) -> Result<Vec<Offer>> {
        let mut uow = self.begin().await?;
        uow.offers_by_seller(seller_id).await
    }

    /// 3. 구매자가 받은 오퍼 (최신순)
    pub async fn received_offers(&self, buyer_id: UserId) -> Result<Vec<Offer>> {
        let mut uow = self.begin().await?;
        uow.offers_for_buyer(buyer_id).await
    }

    /// 4. 유효 기간이 지난 대기 오퍼를 만료 처리
    pub async fn sweep_expired_offers(&self) -> Result<Vec<Offer>> {
        let now = self.now();
        let mut uow = self.begin().await?;
        let expired = uow.expire_offers(now).await?;
        uow.commit().await?;
        if !expired.is_empty() {
            info!("{:<12} --> 오퍼 {}건 만료 처리", "Offer", expired.len());
        }
        Ok(expired)
    }
}
