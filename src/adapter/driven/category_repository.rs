use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Category, CategoryId};
use crate::domain::port::{CategoryRepository, RepositoryError};
use async_trait::async_trait;

// MySQL関連のインポート
use sqlx::{MySql, Pool, Row};

/// MySQLカテゴリリポジトリ
#[derive(Clone)]
pub struct MySqlCategoryRepository {
    pool: Pool<MySql>,
}

impl MySqlCategoryRepository {
    /// 新しいMySQLカテゴリリポジトリを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

fn category_from_row(row: &sqlx::mysql::MySqlRow) -> Result<Category, RepositoryError> {
    let category_id = CategoryId::from_string(row.get("id")).map_err(|e| {
        RepositoryError::FetchFailed(format!("カテゴリIDの解析に失敗しました: {}", e))
    })?;
    let parent_id = match row.get::<Option<String>, _>("parent_id") {
        Some(parent_id) => Some(CategoryId::from_string(&parent_id).map_err(|e| {
            RepositoryError::FetchFailed(format!("親カテゴリIDの解析に失敗しました: {}", e))
        })?),
        None => None,
    };
    Ok(Category::reconstruct(category_id, row.get("name"), parent_id))
}

#[async_trait]
impl CategoryRepository for MySqlCategoryRepository {
    async fn save(&self, category: &Category) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, parent_id)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                parent_id = VALUES(parent_id)
            "#,
        )
        .bind(category.id().to_string())
        .bind(category.name())
        .bind(category.parent_id().map(|id| id.to_string()))
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("カテゴリの保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        category_id: CategoryId,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, parent_id FROM categories WHERE id = ?")
            .bind(category_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("カテゴリの取得に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        match row {
            Some(row) => Ok(Some(category_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, parent_id FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("カテゴリ一覧の取得に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        rows.iter().map(category_from_row).collect()
    }

    fn next_identity(&self) -> CategoryId {
        CategoryId::new()
    }
}
