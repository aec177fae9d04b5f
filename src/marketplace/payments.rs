/// 결제 / 정산
/// 1. 수수료 분배
/// 2. 결제 조회
/// 3. 수익 요약 / 이력
/// 4. 출금 요청
// region:    --- Imports
use super::commands::WithdrawalCommand;
use super::model::{OrderStatus, Payment, PaymentId, PaymentStatus, UserId};
use super::Marketplace;
use crate::error::{MarketError, Result};
use crate::gateway::PayoutReceipt;
use crate::store::LedgerEntry;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

/// 플랫폼 수수료율 (%)
pub const PLATFORM_FEE_PERCENT: i64 = 20;

// region:    --- Fee Split
/// 1. (플랫폼 수수료, 판매자 정산액)
/// 수수료는 금액의 20%를 반올림한다. 계산 범위를 넘는 금액은 Validation 오류.
pub fn split_fee(amount: i64) -> Result<(i64, i64)> {
    let platform_fee = amount
        .checked_mul(PLATFORM_FEE_PERCENT)
        .and_then(|scaled| scaled.checked_add(50))
        .map(|scaled| scaled / 100)
        .ok_or_else(|| MarketError::Validation(format!("처리할 수 없는 금액입니다: {}", amount)))?;
    Ok((platform_fee, amount - platform_fee))
}
// endregion: --- Fee Split

// region:    --- Earnings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsSummary {
    /// 정산 완료된 판매자 금액 합계
    pub total: i64,
    /// 완료된 주문의 정산액 (출금 가능)
    pub available: i64,
    /// 진행 중인 주문의 대기 정산액
    pub pending: i64,
    /// 이번 달 정산액
    pub monthly: i64,
    pub currency: String,
}

impl EarningsSummary {
    pub fn from_ledger(entries: &[LedgerEntry], now: DateTime<Utc>, currency: &str) -> Self {
        let month_start = month_start(now);
        let mut summary = EarningsSummary {
            total: 0,
            available: 0,
            pending: 0,
            monthly: 0,
            currency: currency.to_string(),
        };
        for entry in entries {
            let payment = &entry.payment;
            match payment.status {
                PaymentStatus::Completed => {
                    summary.total += payment.seller_amount;
                    if entry.order_status == OrderStatus::Completed {
                        summary.available += payment.seller_amount;
                    }
                    if payment.released_at.is_some_and(|at| at >= month_start) {
                        summary.monthly += payment.seller_amount;
                    }
                }
                PaymentStatus::Pending if !entry.order_status.is_terminal() => {
                    summary.pending += payment.seller_amount;
                }
                _ => {}
            }
        }
        summary
    }
}

fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .and_then(|first| first.and_hms_opt(0, 0, 0))
        .map(|first| Utc.from_utc_datetime(&first))
        .unwrap_or(now)
}
// endregion: --- Earnings

impl Marketplace {
    /// 2. 결제 조회 (주문 당사자만)
    pub async fn get_payment(&self, payment_id: PaymentId, caller: UserId) -> Result<Payment> {
        let mut uow = self.begin().await?;
        let payment = uow
            .payment(payment_id)
            .await?
            .ok_or_else(|| MarketError::not_found("payment", payment_id))?;
        let order = Self::load_order(uow.as_mut(), payment.order_id).await?;
        Self::ensure_party(&order, caller)?;
        Ok(payment)
    }

    /// 3. 판매자 수익 요약
    pub async fn earnings_summary(&self, seller_user_id: UserId) -> Result<EarningsSummary> {
        let mut uow = self.begin().await?;
        let ledger = uow.seller_ledger(seller_user_id).await?;
        Ok(EarningsSummary::from_ledger(
            &ledger,
            self.now(),
            &self.settings.currency,
        ))
    }

    /// 3. 정산 완료 결제 이력 (최신순)
    pub async fn earnings_history(&self, seller_user_id: UserId) -> Result<Vec<Payment>> {
        let mut uow = self.begin().await?;
        let ledger = uow.seller_ledger(seller_user_id).await?;
        let mut history: Vec<Payment> = ledger
            .into_iter()
            .map(|entry| entry.payment)
            .filter(|payment| payment.status == PaymentStatus::Completed)
            .collect();
        history.sort_by_key(|p| std::cmp::Reverse(p.released_at.unwrap_or(p.created_at)));
        Ok(history)
    }

    /// 4. 출금 요청
    /// 출금 가능 금액 이내에서만 외부 출금 처리로 넘긴다.
    pub async fn request_withdrawal(
        &self,
        seller_user_id: UserId,
        cmd: WithdrawalCommand,
    ) -> Result<PayoutReceipt> {
        if cmd.amount <= 0 {
            return Err(MarketError::Validation(format!(
                "출금 금액은 0보다 커야 합니다: {}",
                cmd.amount
            )));
        }
        let method = cmd.method.trim();
        if method.is_empty() {
            return Err(MarketError::Validation("출금 수단이 비어 있습니다.".to_string()));
        }

        let summary = self.earnings_summary(seller_user_id).await?;
        if cmd.amount > summary.available {
            return Err(MarketError::InsufficientBalance {
                requested: cmd.amount,
                available: summary.available,
            });
        }

        let receipt = self
            .payouts
            .request_payout(seller_user_id, cmd.amount, method, self.now())
            .await?;
        info!(
            "{:<12} --> 출금 요청 승인 seller: {} amount: {} ref: {}",
            "Payment", seller_user_id, cmd.amount, receipt.reference
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::model::OrderId;
    use uuid::Uuid;

    fn entry(
        amount: i64,
        status: PaymentStatus,
        order_status: OrderStatus,
        released_at: Option<DateTime<Utc>>,
    ) -> LedgerEntry {
        let (platform_fee, seller_amount) = split_fee(amount).unwrap();
        LedgerEntry {
            payment: Payment {
                id: PaymentId(Uuid::new_v4()),
                order_id: OrderId(Uuid::new_v4()),
                amount,
                platform_fee,
                seller_amount,
                currency: "USD".to_string(),
                status,
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                released_at,
            },
            order_status,
        }
    }

    #[test]
    fn hundred_units_split_into_fee_and_seller_amount() {
        assert_eq!(split_fee(10_000).unwrap(), (2_000, 8_000));
    }

    #[test]
    fn fee_rounds_half_up_and_always_sums_to_amount() {
        assert_eq!(split_fee(1).unwrap(), (0, 1));
        assert_eq!(split_fee(3).unwrap(), (1, 2));
        assert_eq!(split_fee(999).unwrap(), (200, 799));
        for amount in [1, 2, 7, 13, 99, 101, 12_345, 1_000_003] {
            let (fee, seller) = split_fee(amount).unwrap();
            assert_eq!(fee + seller, amount);
            assert_eq!(fee, ((amount as f64) * 0.20).round() as i64);
        }
    }

    #[test]
    fn amounts_beyond_fee_range_are_rejected() {
        let largest = (i64::MAX - 50) / PLATFORM_FEE_PERCENT;
        let (fee, seller) = split_fee(largest).unwrap();
        assert_eq!(fee + seller, largest);

        for amount in [largest + 1, i64::MAX / 10, i64::MAX] {
            assert!(matches!(split_fee(amount), Err(MarketError::Validation(_))));
        }
    }

    #[test]
    fn summary_splits_ledger_by_status() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
        let this_month = Some(Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap());
        let last_month = Some(Utc.with_ymd_and_hms(2024, 4, 28, 0, 0, 0).unwrap());
        let ledger = vec![
            entry(10_000, PaymentStatus::Completed, OrderStatus::Completed, this_month),
            entry(5_000, PaymentStatus::Completed, OrderStatus::Completed, last_month),
            entry(2_500, PaymentStatus::Pending, OrderStatus::InProgress, None),
            entry(4_000, PaymentStatus::Refunded, OrderStatus::Cancelled, None),
        ];

        let summary = EarningsSummary::from_ledger(&ledger, now, "USD");
        assert_eq!(summary.total, 12_000);
        assert_eq!(summary.available, 12_000);
        assert_eq!(summary.pending, 2_000);
        assert_eq!(summary.monthly, 8_000);
    }

    #[test]
    fn month_starts_at_midnight_on_the_first() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        assert_eq!(month_start(now), Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
    }
}
