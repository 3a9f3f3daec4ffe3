use crate::application::error::ApplicationError;
use crate::domain::model::Principal;
use crate::domain::port::OrderRepository;
use crate::domain::service::{classify_role, PermissionTier};
use std::sync::Arc;

/// 権限区分サービス
/// 主体に購入履歴の有無を補って権限区分を導出する
pub struct PermissionService {
    order_repository: Arc<dyn OrderRepository>,
}

impl PermissionService {
    /// 新しい権限区分サービスを作成
    pub fn new(order_repository: Arc<dyn OrderRepository>) -> Self {
        Self { order_repository }
    }

    /// 主体の権限区分を導出する
    /// 購入履歴の問い合わせは登録ユーザーに対してのみ行う
    pub async fn tier_for(&self, principal: &Principal) -> Result<PermissionTier, ApplicationError> {
        let has_prior_order = match principal.user_id() {
            // スタッフ以上は購入履歴に関係なく区分が決まるため問い合わせない
            Some(user_id) if !principal.is_admin() => {
                self.order_repository.exists_for_user(user_id).await?
            }
            _ => false,
        };
        Ok(classify_role(principal, has_prior_order))
    }
}
