use crate::domain::model::{ProductId, UserId};
use chrono::{DateTime, Utc};

/// お気に入り
/// ユーザーと商品の組み合わせごとに高々1件
#[derive(Debug, Clone, PartialEq)]
pub struct Favorite {
    user_id: UserId,
    product_id: ProductId,
    created_at: DateTime<Utc>,
}

impl Favorite {
    /// 新しいお気に入りを作成
    pub fn new(user_id: UserId, product_id: ProductId) -> Self {
        Self {
            user_id,
            product_id,
            created_at: Utc::now(),
        }
    }

    /// データベースから取得したデータで再構築
    pub fn reconstruct(user_id: UserId, product_id: ProductId, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            product_id,
            created_at,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
