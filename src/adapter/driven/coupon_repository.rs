use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::order_repository::order_from_row;
use crate::domain::model::{Coupon, DiscountPercentage, OrderId, UserId};
use crate::domain::port::{CouponApplyOutcome, CouponRepository, RepositoryError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// MySQL関連のインポート
use sqlx::{MySql, Pool, Row};

/// MySQLクーポンリポジトリ
/// クーポンの永続化と、注文と連動した原子的な適用操作を提供する
#[derive(Clone)]
pub struct MySqlCouponRepository {
    pool: Pool<MySql>,
}

impl MySqlCouponRepository {
    /// 新しいMySQLクーポンリポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

/// データベースの行からクーポン集約を再構築する
fn coupon_from_row(row: &sqlx::mysql::MySqlRow) -> Result<Coupon, RepositoryError> {
    let percentage =
        DiscountPercentage::new(row.get::<rust_decimal::Decimal, _>("discount_percentage"))
            .map_err(|e| {
                RepositoryError::FetchFailed(format!("割引率の構築に失敗しました: {}", e))
            })?;

    Ok(Coupon::reconstruct(
        row.get("code"),
        percentage,
        row.get::<chrono::NaiveDateTime, _>("valid_from").and_utc(),
        row.get::<chrono::NaiveDateTime, _>("valid_to").and_utc(),
        row.get::<u32, _>("max_usage"),
        row.get::<u32, _>("used_count"),
    ))
}

#[async_trait]
impl CouponRepository for MySqlCouponRepository {
    async fn insert(&self, coupon: &Coupon) -> Result<(), RepositoryError> {
        // コードの一意性はPRIMARY KEYで保証される
        sqlx::query(
            r#"
            INSERT INTO coupons (code, discount_percentage, valid_from, valid_to, max_usage, used_count)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(coupon.code())
        .bind(coupon.discount_percentage().value())
        .bind(coupon.valid_from().naive_utc())
        .bind(coupon.valid_to().naive_utc())
        .bind(coupon.max_usage())
        .bind(coupon.used_count())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("クーポンの保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query(
            "SELECT code, discount_percentage, valid_from, valid_to, max_usage, used_count FROM coupons WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("クーポンの取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        match row {
            Some(row) => Ok(Some(coupon_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn apply_to_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<CouponApplyOutcome, RepositoryError> {
        // クーポン行をFOR UPDATEでロックし、検証と4つの変更
        // （合計金額の差し替え・クーポンの紐付け・used_countの加算）を
        // 1トランザクションで実行する。同一コードへの同時適用は
        // 行ロックで直列化される
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        let order_row = sqlx::query(
            r#"
            SELECT id, user_id, total_amount, total_currency, is_paid, accepted, shipped, delivered, coupon_code, created_at
            FROM orders
            WHERE id = ? AND user_id = ?
            FOR UPDATE
            "#,
        )
        .bind(order_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("注文の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut order = match order_row {
            Some(row) => order_from_row(&row)?,
            None => return Ok(CouponApplyOutcome::OrderNotFound),
        };

        let coupon_row = sqlx::query(
            r#"
            SELECT code, discount_percentage, valid_from, valid_to, max_usage, used_count
            FROM coupons
            WHERE code = ?
            FOR UPDATE
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("クーポンの取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut coupon = match coupon_row {
            Some(row) => coupon_from_row(&row)?,
            None => return Ok(CouponApplyOutcome::CouponNotFound),
        };

        if let Err(err) = coupon.redeem(now) {
            // 検証で拒否された場合は変更せずトランザクションを破棄する
            return Ok(CouponApplyOutcome::Rejected(err));
        }
        let new_total = order.apply_coupon(&coupon);

        sqlx::query("UPDATE coupons SET used_count = ? WHERE code = ?")
            .bind(coupon.used_count())
            .bind(coupon.code())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("クーポンの更新に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        sqlx::query("UPDATE orders SET total_amount = ?, coupon_code = ? WHERE id = ?")
            .bind(new_total.amount())
            .bind(order.applied_coupon())
            .bind(order.id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("注文の更新に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        tx.commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!(
                    "トランザクションのコミットに失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)?;

        Ok(CouponApplyOutcome::Applied { new_total })
    }
}
