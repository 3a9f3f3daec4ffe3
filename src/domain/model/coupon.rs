use crate::domain::error::DomainError;
use crate::domain::model::{DiscountPercentage, Money};
use chrono::{DateTime, Utc};

/// クーポン集約
/// 有効期間と使用回数上限を持ち、注文への適用（使用）を管理する。
/// used_count は成功した適用でのみ増加する単調増加カウンタ
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon {
    code: String,
    discount_percentage: DiscountPercentage,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    max_usage: u32,
    used_count: u32,
}

impl Coupon {
    /// 新しいクーポンを作成
    /// used_count は0で初期化される
    ///
    /// # Arguments
    /// * `code` - クーポンコード（50文字以内、一意）
    /// * `discount_percentage` - 割引率
    /// * `valid_from` - 有効期間の開始
    /// * `valid_to` - 有効期間の終了
    /// * `max_usage` - 使用可能回数（1以上）
    pub fn new(
        code: String,
        discount_percentage: DiscountPercentage,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
        max_usage: u32,
    ) -> Result<Self, DomainError> {
        if code.trim().is_empty() {
            return Err(DomainError::Validation(
                "クーポンコードは空にできません".to_string(),
            ));
        }
        if code.chars().count() > 50 {
            return Err(DomainError::Validation(
                "クーポンコードは50文字以内である必要があります".to_string(),
            ));
        }
        if max_usage == 0 {
            return Err(DomainError::Validation(
                "使用可能回数は1以上である必要があります".to_string(),
            ));
        }
        if valid_from > valid_to {
            return Err(DomainError::Validation(
                "有効期間の開始は終了より前である必要があります".to_string(),
            ));
        }
        Ok(Self {
            code,
            discount_percentage,
            valid_from,
            valid_to,
            max_usage,
            used_count: 0,
        })
    }

    /// データベースから取得したデータでクーポンを再構築
    /// リポジトリでの使用を想定
    pub fn reconstruct(
        code: String,
        discount_percentage: DiscountPercentage,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
        max_usage: u32,
        used_count: u32,
    ) -> Self {
        Self {
            code,
            discount_percentage,
            valid_from,
            valid_to,
            max_usage,
            used_count,
        }
    }

    /// クーポンコードを取得
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 割引率を取得
    pub fn discount_percentage(&self) -> DiscountPercentage {
        self.discount_percentage
    }

    /// 有効期間の開始を取得
    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    /// 有効期間の終了を取得
    pub fn valid_to(&self) -> DateTime<Utc> {
        self.valid_to
    }

    /// 使用可能回数を取得
    pub fn max_usage(&self) -> u32 {
        self.max_usage
    }

    /// これまでの使用回数を取得
    pub fn used_count(&self) -> u32 {
        self.used_count
    }

    /// クーポンが現時点で使用可能か検証する
    /// 有効期間を先に判定し、期間内でのみ使用回数を判定するため、
    /// CouponExpired と CouponExhausted が同時に返ることはない
    ///
    /// # Returns
    /// * `Ok(())` - 使用可能
    /// * `Err(DomainError::CouponExpired)` - 有効期間外
    /// * `Err(DomainError::CouponExhausted)` - 使用回数上限に到達
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if now < self.valid_from || now > self.valid_to {
            return Err(DomainError::CouponExpired);
        }
        if self.used_count >= self.max_usage {
            return Err(DomainError::CouponExhausted);
        }
        Ok(())
    }

    /// 使用可能かどうか
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.validate(now).is_ok()
    }

    /// クーポンを1回分使用する
    /// 検証に成功した場合のみ used_count を加算する
    pub fn redeem(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.validate(now)?;
        self.used_count += 1;
        Ok(())
    }

    /// 割引適用後の金額を計算する
    pub fn discounted_total(&self, total: Money) -> Money {
        self.discount_percentage.discounted(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn percentage(s: &str) -> DiscountPercentage {
        DiscountPercentage::new(Decimal::from_str(s).unwrap()).unwrap()
    }

    fn active_coupon(max_usage: u32) -> Coupon {
        let now = Utc::now();
        Coupon::new(
            "WELCOME10".to_string(),
            percentage("10.00"),
            now - Duration::hours(1),
            now + Duration::hours(1),
            max_usage,
        )
        .unwrap()
    }

    #[test]
    fn test_new_coupon_starts_unused() {
        let coupon = active_coupon(3);
        assert_eq!(coupon.used_count(), 0);
        assert!(coupon.is_valid(Utc::now()));
    }

    #[test]
    fn test_code_over_50_chars_fails() {
        let now = Utc::now();
        let result = Coupon::new(
            "x".repeat(51),
            percentage("10"),
            now,
            now + Duration::hours(1),
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_max_usage_fails() {
        let now = Utc::now();
        let result = Coupon::new(
            "CODE".to_string(),
            percentage("10"),
            now,
            now + Duration::hours(1),
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_inverted_window_fails() {
        let now = Utc::now();
        let result = Coupon::new(
            "CODE".to_string(),
            percentage("10"),
            now + Duration::hours(1),
            now,
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_before_window_is_expired() {
        let now = Utc::now();
        let coupon = Coupon::new(
            "CODE".to_string(),
            percentage("10"),
            now + Duration::hours(1),
            now + Duration::hours(2),
            1,
        )
        .unwrap();
        assert_eq!(coupon.validate(now).unwrap_err(), DomainError::CouponExpired);
    }

    #[test]
    fn test_validate_after_window_is_expired() {
        let now = Utc::now();
        let coupon = Coupon::new(
            "CODE".to_string(),
            percentage("10"),
            now - Duration::hours(2),
            now - Duration::hours(1),
            1,
        )
        .unwrap();
        assert_eq!(coupon.validate(now).unwrap_err(), DomainError::CouponExpired);
    }

    #[test]
    fn test_exhausted_coupon_within_window() {
        let mut coupon = active_coupon(1);
        coupon.redeem(Utc::now()).unwrap();
        assert_eq!(
            coupon.validate(Utc::now()).unwrap_err(),
            DomainError::CouponExhausted
        );
    }

    #[test]
    fn test_expired_takes_precedence_over_exhausted() {
        // 期間外かつ使用済みの場合は期間外エラーが返る
        let now = Utc::now();
        let coupon = Coupon::reconstruct(
            "CODE".to_string(),
            percentage("10"),
            now - Duration::hours(2),
            now - Duration::hours(1),
            1,
            1,
        );
        assert_eq!(coupon.validate(now).unwrap_err(), DomainError::CouponExpired);
    }

    #[test]
    fn test_redeem_increments_used_count() {
        let mut coupon = active_coupon(2);
        coupon.redeem(Utc::now()).unwrap();
        assert_eq!(coupon.used_count(), 1);
        coupon.redeem(Utc::now()).unwrap();
        assert_eq!(coupon.used_count(), 2);
    }

    #[test]
    fn test_redeem_exhausted_does_not_increment() {
        let mut coupon = active_coupon(1);
        coupon.redeem(Utc::now()).unwrap();
        let result = coupon.redeem(Utc::now());
        assert!(result.is_err());
        assert_eq!(coupon.used_count(), 1); // 使用回数は変わらない
    }

    #[test]
    fn test_discounted_total() {
        let coupon = active_coupon(1);
        let total = Money::jpy(1000);
        assert_eq!(coupon.discounted_total(total).amount(), 900);
    }
}
