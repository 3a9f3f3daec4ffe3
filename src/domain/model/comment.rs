use crate::domain::error::DomainError;
use crate::domain::model::{CommentId, ProductId, UserId};
use chrono::{DateTime, Utc};

/// コメント
/// 商品に対する投稿。返信は親コメントのIDで表現する（直接参照は持たない）。
/// 管理者のレビューと公開フラグの両方が立つまで一覧には現れない
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    id: CommentId,
    product_id: ProductId,
    author_id: UserId,
    text: String,
    parent_id: Option<CommentId>,
    is_admin_reviewed: bool,
    is_visible: bool,
    created_at: DateTime<Utc>,
}

impl Comment {
    /// 新しいコメントを作成
    /// モデレーションフラグはどちらもfalseで初期化される
    pub fn new(
        id: CommentId,
        product_id: ProductId,
        author_id: UserId,
        text: String,
        parent_id: Option<CommentId>,
    ) -> Result<Self, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::Validation(
                "コメント本文は空にできません".to_string(),
            ));
        }
        Ok(Self {
            id,
            product_id,
            author_id,
            text,
            parent_id,
            is_admin_reviewed: false,
            is_visible: false,
            created_at: Utc::now(),
        })
    }

    /// データベースから取得したデータでコメントを再構築
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: CommentId,
        product_id: ProductId,
        author_id: UserId,
        text: String,
        parent_id: Option<CommentId>,
        is_admin_reviewed: bool,
        is_visible: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_id,
            author_id,
            text,
            parent_id,
            is_admin_reviewed,
            is_visible,
            created_at,
        }
    }

    pub fn id(&self) -> CommentId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn author_id(&self) -> UserId {
        self.author_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parent_id(&self) -> Option<CommentId> {
        self.parent_id
    }

    pub fn is_admin_reviewed(&self) -> bool {
        self.is_admin_reviewed
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 一覧に表示されるか（レビュー済みかつ公開）
    pub fn is_published(&self) -> bool {
        self.is_admin_reviewed && self.is_visible
    }

    /// モデレーションを通過させて公開する
    pub fn approve(&mut self) {
        self.is_admin_reviewed = true;
        self.is_visible = true;
    }
}

/// コメントへの評価値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteValue {
    Like,
    Dislike,
}

impl VoteValue {
    /// 整数値からVoteValueを作成（1: Like, -1: Dislike）
    pub fn from_value(value: i8) -> Result<Self, DomainError> {
        match value {
            1 => Ok(VoteValue::Like),
            -1 => Ok(VoteValue::Dislike),
            _ => Err(DomainError::InvalidValue(format!(
                "評価値は1または-1である必要があります: {}",
                value
            ))),
        }
    }

    /// 整数値として取得
    pub fn as_value(&self) -> i8 {
        match self {
            VoteValue::Like => 1,
            VoteValue::Dislike => -1,
        }
    }
}

/// コメントの評価集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub likes: u32,
    pub dislikes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_comment_is_not_published() {
        let comment = Comment::new(
            CommentId::new(),
            ProductId::new(),
            UserId::new(),
            "良い商品でした".to_string(),
            None,
        )
        .unwrap();
        assert!(!comment.is_published());
        assert!(!comment.is_admin_reviewed());
        assert!(!comment.is_visible());
    }

    #[test]
    fn test_empty_text_fails() {
        let result = Comment::new(
            CommentId::new(),
            ProductId::new(),
            UserId::new(),
            "   ".to_string(),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_approve_publishes_comment() {
        let mut comment = Comment::new(
            CommentId::new(),
            ProductId::new(),
            UserId::new(),
            "良い商品でした".to_string(),
            None,
        )
        .unwrap();
        comment.approve();
        assert!(comment.is_published());
    }

    #[test]
    fn test_vote_value_conversion() {
        assert_eq!(VoteValue::from_value(1).unwrap(), VoteValue::Like);
        assert_eq!(VoteValue::from_value(-1).unwrap(), VoteValue::Dislike);
        assert!(VoteValue::from_value(0).is_err());
        assert_eq!(VoteValue::Like.as_value(), 1);
        assert_eq!(VoteValue::Dislike.as_value(), -1);
    }
}
