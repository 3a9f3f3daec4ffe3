use crate::domain::error::DomainError;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// クーポンの有効期間で使用する日時フォーマット
pub const COUPON_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// "YYYY-MM-DD HH:MM" 形式の文字列をUTC日時として解釈する
pub fn parse_coupon_datetime(value: &str, field: &str) -> Result<DateTime<Utc>, DomainError> {
    NaiveDateTime::parse_from_str(value, COUPON_DATETIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            DomainError::Validation(format!(
                "{}は YYYY-MM-DD HH:MM 形式で入力してください",
                field
            ))
        })
}

/// カート追加用のリクエストDTO
/// 数量は省略時に1として扱う
#[derive(Serialize, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: Option<u32>,
}

/// カート削除用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: Uuid,
}

/// クーポン発行用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateCouponRequest {
    pub code: String,
    pub discount_percentage: Decimal,
    pub valid_from: String,
    pub valid_to: String,
    pub max_usage: u32,
}

/// クーポン適用用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
}

/// 商品登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: u32,
    pub purchase_limit: Option<u32>,
    pub category_id: Option<Uuid>,
}

/// カテゴリ登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// コメント投稿用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
    pub parent: Option<Uuid>,
}

/// コメント評価用のリクエストDTO
/// value は 1（いいね）または -1（よくないね）
#[derive(Serialize, Deserialize)]
pub struct VoteCommentRequest {
    pub comment_id: Uuid,
    pub value: i8,
}

/// 商品一覧取得用のクエリパラメータ
#[derive(Deserialize)]
pub struct ProductsQueryParams {
    pub category: Option<Uuid>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub order_by: Option<String>,
    pub order_type: Option<String>,
}

/// 商品検索用のクエリパラメータ
#[derive(Deserialize)]
pub struct SearchQueryParams {
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coupon_datetime_valid() {
        let parsed = parse_coupon_datetime("2026-01-15 09:30", "開始日時").unwrap();
        assert_eq!(parsed.format(COUPON_DATETIME_FORMAT).to_string(), "2026-01-15 09:30");
    }

    #[test]
    fn test_parse_coupon_datetime_invalid_format() {
        let result = parse_coupon_datetime("2026/01/15 09:30", "開始日時");
        assert!(result.is_err());
        let result = parse_coupon_datetime("2026-01-15T09:30:00Z", "開始日時");
        assert!(result.is_err());
    }

    #[test]
    fn test_add_to_cart_request_quantity_is_optional() {
        let json = r#"{"product_id":"3fa85f64-5717-4562-b3fc-2c963f66afa6"}"#;
        let request: AddToCartRequest = serde_json::from_str(json).unwrap();
        assert!(request.quantity.is_none());
    }

    #[test]
    fn test_create_coupon_request_deserialization() {
        let json = r#"{
            "code": "WELCOME10",
            "discount_percentage": "10.00",
            "valid_from": "2026-01-01 00:00",
            "valid_to": "2026-12-31 23:59",
            "max_usage": 100
        }"#;
        let request: CreateCouponRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.code, "WELCOME10");
        assert_eq!(request.max_usage, 100);
    }
}
