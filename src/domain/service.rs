// ドメインサービス
// 複数の集約にまたがる純粋なビジネスロジックを実装

use crate::domain::error::DomainError;
use crate::domain::model::{Principal, Product};

/// ユーザーの権限区分
/// レスポンスのuserPermissionとして"1"〜"5"のコードで返される
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionTier {
    /// スーパーユーザー
    Superuser,
    /// スタッフ
    Staff,
    /// 購入履歴のある登録ユーザー
    Purchaser,
    /// 購入履歴のない登録ユーザー
    Registered,
    /// 未認証ユーザー
    Anonymous,
}

impl PermissionTier {
    /// レスポンス用のコードを取得
    pub fn as_code(&self) -> &'static str {
        match self {
            PermissionTier::Superuser => "1",
            PermissionTier::Staff => "2",
            PermissionTier::Purchaser => "3",
            PermissionTier::Registered => "4",
            PermissionTier::Anonymous => "5",
        }
    }
}

/// 主体と購入履歴の有無から権限区分を導出する
/// 判定はこの関数に一本化し、呼び出し側での再実装はしない
pub fn classify_role(principal: &Principal, has_prior_order: bool) -> PermissionTier {
    if !principal.is_authenticated() {
        return PermissionTier::Anonymous;
    }
    if principal.is_superuser() {
        PermissionTier::Superuser
    } else if principal.is_staff() {
        PermissionTier::Staff
    } else if has_prior_order {
        PermissionTier::Purchaser
    } else {
        PermissionTier::Registered
    }
}

/// カート追加の事前条件をまとめて検証する
/// 検証順序は固定: 数量 → 在庫切れ → 購入上限 → 在庫不足。
/// ストアアダプターがクリティカルセクション内から呼び出すことで、
/// 判定ロジックを1箇所に保ったまま原子性を確保する
///
/// # Arguments
/// * `product` - 追加対象の商品
/// * `quantity_in_cart` - このユーザーのカートに既に入っている同一商品の数量
/// * `requested` - 追加要求数量
pub fn authorize_cart_add(
    product: &Product,
    quantity_in_cart: u32,
    requested: u32,
) -> Result<(), DomainError> {
    if requested == 0 {
        return Err(DomainError::InvalidQuantity);
    }
    if product.is_out_of_stock() {
        return Err(DomainError::OutOfStock);
    }
    if !product.within_purchase_limit(quantity_in_cart, requested) {
        return Err(DomainError::PurchaseLimitExceeded {
            // within_purchase_limit がfalseを返すのは上限が設定されている場合のみ
            limit: product.purchase_limit().unwrap_or(0),
        });
    }
    if !product.has_available_stock(requested) {
        return Err(DomainError::InsufficientStock {
            available: product.stock(),
        });
    }
    Ok(())
}
