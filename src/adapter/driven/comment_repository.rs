use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Comment, CommentId, ProductId, UserId, VoteTally, VoteValue};
use crate::domain::port::{CommentRepository, RepositoryError};
use async_trait::async_trait;

// MySQL関連のインポート
use sqlx::{MySql, Pool, Row};

/// MySQLコメントリポジトリ
/// コメントと評価（いいね・よくないね）を永続化する
#[derive(Clone)]
pub struct MySqlCommentRepository {
    pool: Pool<MySql>,
}

impl MySqlCommentRepository {
    /// 新しいMySQLコメントリポジトリを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

fn comment_from_row(row: &sqlx::mysql::MySqlRow) -> Result<Comment, RepositoryError> {
    let comment_id = CommentId::from_string(row.get("id")).map_err(|e| {
        RepositoryError::FetchFailed(format!("コメントIDの解析に失敗しました: {}", e))
    })?;
    let product_id = ProductId::from_string(row.get("product_id"))
        .map_err(|e| RepositoryError::FetchFailed(format!("商品IDの解析に失敗しました: {}", e)))?;
    let author_id = UserId::from_string(row.get("author_id")).map_err(|e| {
        RepositoryError::FetchFailed(format!("ユーザーIDの解析に失敗しました: {}", e))
    })?;
    let parent_id = match row.get::<Option<String>, _>("parent_id") {
        Some(parent_id) => Some(CommentId::from_string(&parent_id).map_err(|e| {
            RepositoryError::FetchFailed(format!("親コメントIDの解析に失敗しました: {}", e))
        })?),
        None => None,
    };

    Ok(Comment::reconstruct(
        comment_id,
        product_id,
        author_id,
        row.get("text"),
        parent_id,
        row.get::<bool, _>("is_admin_reviewed"),
        row.get::<bool, _>("is_visible"),
        row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    ))
}

#[async_trait]
impl CommentRepository for MySqlCommentRepository {
    async fn save(&self, comment: &Comment) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, product_id, author_id, text, parent_id, is_admin_reviewed, is_visible, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                text = VALUES(text),
                is_admin_reviewed = VALUES(is_admin_reviewed),
                is_visible = VALUES(is_visible)
            "#,
        )
        .bind(comment.id().to_string())
        .bind(comment.product_id().to_string())
        .bind(comment.author_id().to_string())
        .bind(comment.text())
        .bind(comment.parent_id().map(|id| id.to_string()))
        .bind(comment.is_admin_reviewed())
        .bind(comment.is_visible())
        .bind(comment.created_at().naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("コメントの保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        comment_id: CommentId,
    ) -> Result<Option<Comment>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, product_id, author_id, text, parent_id, is_admin_reviewed, is_visible, created_at
            FROM comments
            WHERE id = ?
            "#,
        )
        .bind(comment_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("コメントの取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        match row {
            Some(row) => Ok(Some(comment_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_published_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Comment>, RepositoryError> {
        // レビュー済みかつ公開のコメントのみを返す
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, author_id, text, parent_id, is_admin_reviewed, is_visible, created_at
            FROM comments
            WHERE product_id = ? AND is_admin_reviewed = TRUE AND is_visible = TRUE
            ORDER BY created_at ASC
            "#,
        )
        .bind(product_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::QueryError(format!("コメント一覧の取得に失敗しました: {}", e))
        })
        .map_err(RepositoryError::from)?;

        rows.iter().map(comment_from_row).collect()
    }

    async fn tally(&self, comment_id: CommentId) -> Result<VoteTally, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(CASE WHEN value = 1 THEN 1 END) AS likes,
                COUNT(CASE WHEN value = -1 THEN 1 END) AS dislikes
            FROM comment_votes
            WHERE comment_id = ?
            "#,
        )
        .bind(comment_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("評価集計の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(VoteTally {
            likes: row.get::<i64, _>("likes") as u32,
            dislikes: row.get::<i64, _>("dislikes") as u32,
        })
    }

    async fn find_vote(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> Result<Option<VoteValue>, RepositoryError> {
        let row = sqlx::query(
            "SELECT value FROM comment_votes WHERE user_id = ? AND comment_id = ?",
        )
        .bind(user_id.to_string())
        .bind(comment_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("評価の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        match row {
            Some(row) => {
                let value = VoteValue::from_value(row.get::<i8, _>("value")).map_err(|e| {
                    RepositoryError::FetchFailed(format!("評価値の解析に失敗しました: {}", e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn upsert_vote(
        &self,
        user_id: UserId,
        comment_id: CommentId,
        value: VoteValue,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO comment_votes (user_id, comment_id, value)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE value = VALUES(value)
            "#,
        )
        .bind(user_id.to_string())
        .bind(comment_id.to_string())
        .bind(value.as_value())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("評価の保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn delete_vote(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM comment_votes WHERE user_id = ? AND comment_id = ?")
            .bind(user_id.to_string())
            .bind(comment_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("評価の削除に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        Ok(())
    }

    fn next_identity(&self) -> CommentId {
        CommentId::new()
    }
}
