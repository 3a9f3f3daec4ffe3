use crate::domain::model::UserId;
use chrono::{DateTime, Utc};

/// 検索履歴の1レコード
/// 認証済みユーザーの検索語を記録する
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRecord {
    user_id: UserId,
    term: String,
    created_at: DateTime<Utc>,
}

impl SearchRecord {
    /// 新しい検索履歴レコードを作成
    pub fn new(user_id: UserId, term: String) -> Self {
        Self {
            user_id,
            term,
            created_at: Utc::now(),
        }
    }

    /// データベースから取得したデータで再構築
    pub fn reconstruct(user_id: UserId, term: String, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            term,
            created_at,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// 人気検索語（全ユーザー横断の出現回数つき）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotTerm {
    pub term: String,
    pub count: u64,
}
