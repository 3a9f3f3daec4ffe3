use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Favorite, ProductId, UserId};
use crate::domain::port::{FavoriteRepository, RepositoryError};
use async_trait::async_trait;

// MySQL関連のインポート
use sqlx::{MySql, Pool, Row};

/// MySQLお気に入りリポジトリ
/// ユーザーと商品の組み合わせの一意性は複合主キーで保証される
#[derive(Clone)]
pub struct MySqlFavoriteRepository {
    pool: Pool<MySql>,
}

impl MySqlFavoriteRepository {
    /// 新しいMySQLお気に入りリポジトリを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for MySqlFavoriteRepository {
    async fn insert(&self, favorite: &Favorite) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO favorites (user_id, product_id, created_at) VALUES (?, ?, ?)")
            .bind(favorite.user_id().to_string())
            .bind(favorite.product_id().to_string())
            .bind(favorite.created_at().naive_utc())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("お気に入りの保存に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn exists(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = ? AND product_id = ?) AS registered",
        )
        .bind(user_id.to_string())
        .bind(product_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::QueryError(format!("お気に入りの確認に失敗しました: {}", e))
        })
        .map_err(RepositoryError::from)?;

        Ok(row.get::<i64, _>("registered") != 0)
    }

    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND product_id = ?")
            .bind(user_id.to_string())
            .bind(product_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("お気に入りの削除に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Favorite>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT user_id, product_id, created_at FROM favorites WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::QueryError(format!("お気に入り一覧の取得に失敗しました: {}", e))
        })
        .map_err(RepositoryError::from)?;

        let mut favorites = Vec::with_capacity(rows.len());
        for row in &rows {
            let user_id = UserId::from_string(row.get("user_id")).map_err(|e| {
                RepositoryError::FetchFailed(format!("ユーザーIDの解析に失敗しました: {}", e))
            })?;
            let product_id = ProductId::from_string(row.get("product_id")).map_err(|e| {
                RepositoryError::FetchFailed(format!("商品IDの解析に失敗しました: {}", e))
            })?;
            favorites.push(Favorite::reconstruct(
                user_id,
                product_id,
                row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
            ));
        }

        Ok(favorites)
    }
}
