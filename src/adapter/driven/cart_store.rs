use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::product_repository::product_from_row;
use crate::domain::model::{Cart, CartLine, ProductId, UserId};
use crate::domain::port::{CartAddOutcome, CartStore, RepositoryError};
use crate::domain::service::authorize_cart_add;
use async_trait::async_trait;

// MySQL関連のインポート
use sqlx::{MySql, Pool, Row};

/// MySQLカートストア
/// カートの永続化と、商品在庫と連動した原子的な追加操作を提供する
#[derive(Clone)]
pub struct MySqlCartStore {
    pool: Pool<MySql>,
}

impl MySqlCartStore {
    /// 新しいMySQLカートストアを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for MySqlCartStore {
    async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartAddOutcome, RepositoryError> {
        // 商品行をFOR UPDATEでロックし、確認から在庫の引当までを
        // 1トランザクションで実行する。同一商品への同時追加は
        // 行ロックで直列化される
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        let product_row = sqlx::query(
            r#"
            SELECT id, name, description, price_amount, price_currency, stock, purchase_limit, category_id, sold, views, created_at
            FROM products
            WHERE id = ?
            FOR UPDATE
            "#,
        )
        .bind(product_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("商品の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let product = match product_row {
            Some(row) => product_from_row(&row)?,
            None => return Ok(CartAddOutcome::ProductNotFound),
        };

        // このユーザーのカートに既に入っている同一商品の数量
        let quantity_in_cart = sqlx::query(
            "SELECT quantity FROM cart_lines WHERE user_id = ? AND product_id = ?",
        )
        .bind(user_id.to_string())
        .bind(product_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("カート明細の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?
        .map(|row| row.get::<u32, _>("quantity"))
        .unwrap_or(0);

        if let Err(err) = authorize_cart_add(&product, quantity_in_cart, quantity) {
            // 変更前に拒否された場合はトランザクションを破棄する
            return Ok(CartAddOutcome::Rejected(err));
        }

        // カートは最初の追加時に遅延生成する
        sqlx::query(
            "INSERT INTO carts (user_id) VALUES (?) ON DUPLICATE KEY UPDATE user_id = user_id",
        )
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("カートの作成に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        // 明細がなければ要求数量で作成し、あれば数量を加算する
        sqlx::query(
            r#"
            INSERT INTO cart_lines (user_id, product_id, quantity)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE quantity = quantity + VALUES(quantity)
            "#,
        )
        .bind(user_id.to_string())
        .bind(product_id.to_string())
        .bind(quantity)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("カート明細の保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        // 在庫を引き当てる
        sqlx::query("UPDATE products SET stock = stock - ? WHERE id = ?")
            .bind(quantity)
            .bind(product_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("在庫の更新に失敗しました: {}", e)))
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

        Ok(CartAddOutcome::Added {
            line_quantity: quantity_in_cart + quantity,
        })
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let cart_row = sqlx::query("SELECT user_id FROM carts WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("カートの取得に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        if cart_row.is_none() {
            return Ok(None);
        }

        let rows = sqlx::query(
            "SELECT product_id, quantity FROM cart_lines WHERE user_id = ? ORDER BY product_id ASC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("カート明細の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in &rows {
            let product_id = ProductId::from_string(row.get("product_id")).map_err(|e| {
                RepositoryError::FetchFailed(format!("商品IDの解析に失敗しました: {}", e))
            })?;
            let line = CartLine::new(product_id, row.get::<u32, _>("quantity")).map_err(|e| {
                RepositoryError::FetchFailed(format!("カート明細の構築に失敗しました: {}", e))
            })?;
            lines.push(line);
        }

        Ok(Some(Cart::reconstruct(user_id, lines)))
    }

    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        // カート本体をUPSERT
        sqlx::query(
            "INSERT INTO carts (user_id) VALUES (?) ON DUPLICATE KEY UPDATE user_id = user_id",
        )
        .bind(cart.user_id().to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("カートの保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        // 既存の明細を削除してから現在の明細を挿入する
        sqlx::query("DELETE FROM cart_lines WHERE user_id = ?")
            .bind(cart.user_id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("カート明細の削除に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        for line in cart.lines() {
            sqlx::query(
                "INSERT INTO cart_lines (user_id, product_id, quantity) VALUES (?, ?, ?)",
            )
            .bind(cart.user_id().to_string())
            .bind(line.product_id().to_string())
            .bind(line.quantity())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("カート明細の保存に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;
        }

        tx.commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!(
                    "トランザクションのコミットに失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)?;

        Ok(())
    }
}
