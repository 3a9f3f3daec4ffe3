use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{HotTerm, SearchRecord, UserId};
use crate::domain::port::{RepositoryError, SearchHistoryRepository};
use async_trait::async_trait;

// MySQL関連のインポート
use sqlx::{MySql, Pool, Row};

/// MySQL検索履歴リポジトリ
#[derive(Clone)]
pub struct MySqlSearchHistoryRepository {
    pool: Pool<MySql>,
}

impl MySqlSearchHistoryRepository {
    /// 新しいMySQL検索履歴リポジトリを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchHistoryRepository for MySqlSearchHistoryRepository {
    async fn record(&self, record: &SearchRecord) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO search_history (user_id, term, created_at) VALUES (?, ?, ?)")
            .bind(record.user_id().to_string())
            .bind(record.term())
            .bind(record.created_at().naive_utc())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("検索履歴の保存に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn recent_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<SearchRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT user_id, term, created_at FROM search_history WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::QueryError(format!("検索履歴の取得に失敗しました: {}", e))
        })
        .map_err(RepositoryError::from)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let user_id = UserId::from_string(row.get("user_id")).map_err(|e| {
                RepositoryError::FetchFailed(format!("ユーザーIDの解析に失敗しました: {}", e))
            })?;
            records.push(SearchRecord::reconstruct(
                user_id,
                row.get("term"),
                row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
            ));
        }

        Ok(records)
    }

    async fn hot_terms(&self, limit: u32) -> Result<Vec<HotTerm>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT term, COUNT(*) AS search_count
            FROM search_history
            GROUP BY term
            ORDER BY search_count DESC, term ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::QueryError(format!("人気検索語の取得に失敗しました: {}", e))
        })
        .map_err(RepositoryError::from)?;

        Ok(rows
            .iter()
            .map(|row| HotTerm {
                term: row.get("term"),
                count: row.get::<i64, _>("search_count") as u64,
            })
            .collect())
    }
}
