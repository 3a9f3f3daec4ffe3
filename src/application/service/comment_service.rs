use crate::application::error::{ApplicationError, NotFoundEntity};
use crate::domain::model::{Comment, CommentId, ProductId, UserId, VoteTally, VoteValue};
use crate::domain::port::{CommentRepository, Logger, ProductRepository};
use std::collections::HashMap;
use std::sync::Arc;

/// 評価操作の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteResult {
    /// 評価を登録（または切り替え）した
    Recorded,
    /// 同じ評価を再送したため取り消した
    Removed,
}

/// コメントと評価集計の組
#[derive(Debug, Clone)]
pub struct CommentWithTally {
    pub comment: Comment,
    pub tally: VoteTally,
}

/// コメントアプリケーションサービス
/// コメントの投稿・公開・評価を調整する
pub struct CommentApplicationService {
    comment_repository: Arc<dyn CommentRepository>,
    product_repository: Arc<dyn ProductRepository>,
    logger: Arc<dyn Logger>,
}

impl CommentApplicationService {
    /// 新しいコメントアプリケーションサービスを作成
    pub fn new(
        comment_repository: Arc<dyn CommentRepository>,
        product_repository: Arc<dyn ProductRepository>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            comment_repository,
            product_repository,
            logger,
        }
    }

    /// コメントを投稿する
    /// 投稿直後は非公開で、モデレーション通過後に一覧へ現れる
    ///
    /// # Returns
    /// * `Ok(Comment)` - 投稿されたコメント
    /// * `Err(ApplicationError::NotFound(Product))` - 商品が存在しない
    /// * `Err(ApplicationError::NotFound(Comment))` - 親コメントが存在しない
    pub async fn create_comment(
        &self,
        user_id: UserId,
        product_id: ProductId,
        text: String,
        parent_id: Option<CommentId>,
    ) -> Result<Comment, ApplicationError> {
        self.product_repository
            .find_by_id(product_id)
            .await?
            .ok_or(ApplicationError::NotFound(NotFoundEntity::Product))?;

        if let Some(parent) = parent_id {
            let parent_comment = self
                .comment_repository
                .find_by_id(parent)
                .await?
                .ok_or(ApplicationError::NotFound(NotFoundEntity::Comment))?;
            // 返信先は同じ商品のコメントでなければならない
            if parent_comment.product_id() != product_id {
                return Err(ApplicationError::NotFound(NotFoundEntity::Comment));
            }
        }

        let comment = Comment::new(
            self.comment_repository.next_identity(),
            product_id,
            user_id,
            text,
            parent_id,
        )?;
        self.comment_repository.save(&comment).await?;

        self.logger.info(
            "CommentApplicationService",
            "コメントを投稿しました",
            Some(HashMap::from([
                ("comment_id".to_string(), comment.id().to_string()),
                ("product_id".to_string(), product_id.to_string()),
            ])),
        );

        Ok(comment)
    }

    /// 商品の公開済みコメントを評価集計つきで取得する
    ///
    /// # Returns
    /// * `Ok(Vec<CommentWithTally>)` - コメントのリスト
    /// * `Err(ApplicationError::NotFound(Product))` - 商品が存在しない
    pub async fn list_comments(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<CommentWithTally>, ApplicationError> {
        self.product_repository
            .find_by_id(product_id)
            .await?
            .ok_or(ApplicationError::NotFound(NotFoundEntity::Product))?;

        let comments = self
            .comment_repository
            .find_published_for_product(product_id)
            .await?;

        let mut result = Vec::with_capacity(comments.len());
        for comment in comments {
            let tally = self.comment_repository.tally(comment.id()).await?;
            result.push(CommentWithTally { comment, tally });
        }

        Ok(result)
    }

    /// コメントを公開する（管理者専用の操作。権限確認は呼び出し側で行う）
    pub async fn approve_comment(&self, comment_id: CommentId) -> Result<(), ApplicationError> {
        let mut comment = self
            .comment_repository
            .find_by_id(comment_id)
            .await?
            .ok_or(ApplicationError::NotFound(NotFoundEntity::Comment))?;
        comment.approve();
        self.comment_repository.save(&comment).await?;
        Ok(())
    }

    /// コメントを評価する
    ///
    /// 同じ評価を再送すると取り消し、逆の評価を送ると切り替える。
    /// ユーザーとコメントの組み合わせにつき評価は高々1件
    pub async fn vote(
        &self,
        user_id: UserId,
        comment_id: CommentId,
        value: i8,
    ) -> Result<VoteResult, ApplicationError> {
        let value = VoteValue::from_value(value)?;

        self.comment_repository
            .find_by_id(comment_id)
            .await?
            .ok_or(ApplicationError::NotFound(NotFoundEntity::Comment))?;

        match self.comment_repository.find_vote(user_id, comment_id).await? {
            Some(existing) if existing == value => {
                // 同じ評価の再送は取り消し
                self.comment_repository
                    .delete_vote(user_id, comment_id)
                    .await?;
                Ok(VoteResult::Removed)
            }
            _ => {
                self.comment_repository
                    .upsert_vote(user_id, comment_id, value)
                    .await?;
                Ok(VoteResult::Recorded)
            }
        }
    }
}
