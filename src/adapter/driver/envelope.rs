use crate::application::error::{ApplicationError, NotFoundEntity};
use crate::domain::error::DomainError;
use crate::domain::service::PermissionTier;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;

/// すべてのレスポンスで共通のエンベロープ
/// 成功時は userPermission に "1"〜"5" の権限区分コードを含める。
/// 失敗時は errors のみを返し、userPermission は省略する
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub is_success: bool,
    pub data: Option<T>,
    pub errors: Option<Vec<String>>,
    #[serde(rename = "userPermission", skip_serializing_if = "Option::is_none")]
    pub user_permission: Option<String>,
}

/// 成功レスポンスを作成する
pub fn success<T: Serialize>(data: T, tier: PermissionTier) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::OK,
        Json(Envelope {
            is_success: true,
            data: Some(data),
            errors: None,
            user_permission: Some(tier.as_code().to_string()),
        }),
    )
}

/// エラーレスポンスを作成する
pub fn error(
    status: StatusCode,
    messages: Vec<String>,
) -> (StatusCode, Json<Envelope<serde_json::Value>>) {
    (
        status,
        Json(Envelope {
            is_success: false,
            data: None,
            errors: Some(messages),
            user_permission: None,
        }),
    )
}

/// 認証が必要な操作に未認証でアクセスした場合のエラーレスポンス
pub fn unauthorized() -> (StatusCode, Json<Envelope<serde_json::Value>>) {
    error(
        StatusCode::UNAUTHORIZED,
        vec!["ログインが必要です".to_string()],
    )
}

/// 管理者専用の操作に権限なしでアクセスした場合のエラーレスポンス
pub fn forbidden() -> (StatusCode, Json<Envelope<serde_json::Value>>) {
    error(
        StatusCode::FORBIDDEN,
        vec!["この操作を行う権限がありません".to_string()],
    )
}

/// アプリケーションエラーをエンベロープつきのHTTPレスポンスへ変換する
/// ビジネスルール違反は400、不存在は404、永続化の失敗は500に分類する
pub fn map_application_error(
    err: ApplicationError,
) -> (StatusCode, Json<Envelope<serde_json::Value>>) {
    match err {
        ApplicationError::Domain(domain_err) => map_domain_error(domain_err),
        ApplicationError::NotFound(entity) => error(
            StatusCode::NOT_FOUND,
            vec![not_found_message(entity).to_string()],
        ),
        ApplicationError::Repository(repo_err) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            vec![format!("{}", repo_err)],
        ),
    }
}

/// 見つからなかったエンティティごとの利用者向けメッセージ
fn not_found_message(entity: NotFoundEntity) -> &'static str {
    match entity {
        NotFoundEntity::Product => "指定された商品が見つかりません",
        NotFoundEntity::Cart => "カートが見つかりません",
        NotFoundEntity::CartItem => "商品がカート内に見つかりません",
        NotFoundEntity::Order => "指定された注文が見つかりません",
        NotFoundEntity::Coupon => "指定されたクーポンが見つかりません",
        NotFoundEntity::Comment => "指定されたコメントが見つかりません",
        NotFoundEntity::Category => "指定されたカテゴリが見つかりません",
        NotFoundEntity::Favorite => "お気に入りに登録されていません",
    }
}

/// ドメインエラーごとの利用者向けメッセージ（すべて400で返す）
fn map_domain_error(domain_err: DomainError) -> (StatusCode, Json<Envelope<serde_json::Value>>) {
    let message = match domain_err {
        DomainError::OutOfStock => "商品の在庫がありません".to_string(),
        DomainError::InsufficientStock { .. } => "要求数量が在庫数を超えています".to_string(),
        DomainError::PurchaseLimitExceeded { .. } => {
            "要求数量が購入可能な上限を超えています".to_string()
        }
        DomainError::CouponExpired => "クーポンの有効期間外です".to_string(),
        DomainError::CouponExhausted => "クーポンは使用回数の上限に達しています".to_string(),
        DomainError::InvalidQuantity => "数量は1以上である必要があります".to_string(),
        DomainError::AlreadyFavorited => {
            "この商品は既にお気に入りに登録されています".to_string()
        }
        DomainError::Validation(msg) => msg,
        DomainError::CurrencyMismatch => "通貨が一致しません".to_string(),
        DomainError::InvalidValue(msg) => msg,
    };
    error(StatusCode::BAD_REQUEST, vec![message])
}
