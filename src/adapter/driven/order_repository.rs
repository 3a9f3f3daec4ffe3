use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Money, Order, OrderId, UserId};
use crate::domain::port::{OrderRepository, RepositoryError};
use async_trait::async_trait;

// MySQL関連のインポート
use sqlx::{MySql, Pool, Row};

/// MySQL注文リポジトリ
/// MySQLデータベースを使用して注文を永続化する
#[derive(Clone)]
pub struct MySqlOrderRepository {
    pool: Pool<MySql>,
}

impl MySqlOrderRepository {
    /// 新しいMySQL注文リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

/// データベースの行から注文集約を再構築する
pub(crate) fn order_from_row(row: &sqlx::mysql::MySqlRow) -> Result<Order, RepositoryError> {
    let order_id = OrderId::from_string(row.get("id"))
        .map_err(|e| RepositoryError::FetchFailed(format!("注文IDの解析に失敗しました: {}", e)))?;
    let user_id = UserId::from_string(row.get("user_id")).map_err(|e| {
        RepositoryError::FetchFailed(format!("ユーザーIDの解析に失敗しました: {}", e))
    })?;
    let total_price = Money::new(
        row.get::<i64, _>("total_amount"),
        row.get::<String, _>("total_currency"),
    )
    .map_err(|e| RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e)))?;

    Ok(Order::reconstruct(
        order_id,
        user_id,
        total_price,
        row.get::<bool, _>("is_paid"),
        row.get::<bool, _>("accepted"),
        row.get::<bool, _>("shipped"),
        row.get::<bool, _>("delivered"),
        row.get::<Option<String>, _>("coupon_code"),
        row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    ))
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        // 注文データをordersテーブルにUPSERT
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_amount, total_currency, is_paid, accepted, shipped, delivered, coupon_code, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                total_amount = VALUES(total_amount),
                total_currency = VALUES(total_currency),
                is_paid = VALUES(is_paid),
                accepted = VALUES(accepted),
                shipped = VALUES(shipped),
                delivered = VALUES(delivered),
                coupon_code = VALUES(coupon_code)
            "#,
        )
        .bind(order.id().to_string())
        .bind(order.user_id().to_string())
        .bind(order.total_price().amount())
        .bind(order.total_price().currency())
        .bind(order.is_paid())
        .bind(order.accepted())
        .bind(order.shipped())
        .bind(order.delivered())
        .bind(order.applied_coupon())
        .bind(order.created_at().naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("注文の保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        // 所有者以外の注文は見つからない扱いとする
        let row = sqlx::query(
            r#"
            SELECT id, user_id, total_amount, total_currency, is_paid, accepted, shipped, delivered, coupon_code, created_at
            FROM orders
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(order_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("注文の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        match row {
            Some(row) => Ok(Some(order_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, total_amount, total_currency, is_paid, accepted, shipped, delivered, coupon_code, created_at
            FROM orders
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("注文一覧の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        rows.iter().map(order_from_row).collect()
    }

    async fn exists_for_user(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM orders WHERE user_id = ?) AS has_order")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("注文の存在確認に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        Ok(row.get::<i64, _>("has_order") != 0)
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}
