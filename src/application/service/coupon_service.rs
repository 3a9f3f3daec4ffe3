use crate::application::error::{ApplicationError, NotFoundEntity};
use crate::domain::error::DomainError;
use crate::domain::model::{Coupon, DiscountPercentage, Money, OrderId, UserId};
use crate::domain::port::{CouponApplyOutcome, CouponRepository, Logger};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

/// クーポン作成の入力
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub code: String,
    pub discount_percentage: Decimal,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub max_usage: u32,
}

/// クーポンアプリケーションサービス
/// クーポンの発行と注文への適用を調整する
pub struct CouponApplicationService {
    coupon_repository: Arc<dyn CouponRepository>,
    logger: Arc<dyn Logger>,
}

impl CouponApplicationService {
    /// 新しいクーポンアプリケーションサービスを作成
    pub fn new(coupon_repository: Arc<dyn CouponRepository>, logger: Arc<dyn Logger>) -> Self {
        Self {
            coupon_repository,
            logger,
        }
    }

    /// クーポンを発行する（管理者専用の操作。権限確認は呼び出し側で行う）
    ///
    /// # Returns
    /// * `Ok(Coupon)` - 発行されたクーポン（used_count = 0）
    /// * `Err(ApplicationError::Domain(Validation))` - 入力値の検証失敗
    pub async fn create_coupon(&self, input: NewCoupon) -> Result<Coupon, ApplicationError> {
        let percentage = DiscountPercentage::new(input.discount_percentage)?;
        let coupon = Coupon::new(
            input.code,
            percentage,
            input.valid_from,
            input.valid_to,
            input.max_usage,
        )?;

        // コードの一意性を確認する。データベースの一意制約が最終的な防衛線
        if self
            .coupon_repository
            .find_by_code(coupon.code())
            .await?
            .is_some()
        {
            return Err(ApplicationError::Domain(DomainError::Validation(
                "このクーポンコードは既に使用されています".to_string(),
            )));
        }

        self.coupon_repository.insert(&coupon).await?;

        self.logger.info(
            "CouponApplicationService",
            "クーポンを発行しました",
            Some(HashMap::from([
                ("code".to_string(), coupon.code().to_string()),
                ("max_usage".to_string(), coupon.max_usage().to_string()),
            ])),
        );

        Ok(coupon)
    }

    /// クーポンを注文に適用する
    ///
    /// 成功すると注文の合計金額が割引後の値に差し替えられ、クーポンの
    /// used_count が1加算される。同じ注文に再度適用した場合も改めて
    /// 割引が計算される（重複適用の排除は行わない）
    ///
    /// # Returns
    /// * `Ok(Money)` - 割引適用後の合計金額
    /// * `Err(ApplicationError)` - 注文・クーポンの不存在、または使用不可
    pub async fn apply_coupon(
        &self,
        user_id: UserId,
        order_id: OrderId,
        code: &str,
    ) -> Result<Money, ApplicationError> {
        let outcome = self
            .coupon_repository
            .apply_to_order(user_id, order_id, code, Utc::now())
            .await?;

        match outcome {
            CouponApplyOutcome::Applied { new_total } => {
                self.logger.info(
                    "CouponApplicationService",
                    "クーポンを注文に適用しました",
                    Some(HashMap::from([
                        ("code".to_string(), code.to_string()),
                        ("order_id".to_string(), order_id.to_string()),
                        ("new_total".to_string(), new_total.amount().to_string()),
                    ])),
                );
                Ok(new_total)
            }
            CouponApplyOutcome::OrderNotFound => {
                Err(ApplicationError::NotFound(NotFoundEntity::Order))
            }
            CouponApplyOutcome::CouponNotFound => {
                Err(ApplicationError::NotFound(NotFoundEntity::Coupon))
            }
            CouponApplyOutcome::Rejected(err) => Err(ApplicationError::Domain(err)),
        }
    }
}
