use crate::adapter::driver::request_dto::COUPON_DATETIME_FORMAT;
use crate::application::service::{CommentWithTally, ResolvedCartLine};
use crate::domain::model::{
    Category, Coupon, Favorite, HotTerm, Money, Order, Product, SearchRecord,
};
use serde::Serialize;

/// 操作結果のメッセージのみを返すレスポンスDTO
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// 商品用のレスポンスDTO
#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_amount: i64,
    pub price_currency: String,
    pub stock: u32,
    pub purchase_limit: Option<u32>,
    pub category_id: Option<String>,
    pub sold: u32,
    pub views: u32,
    pub created_at: String,
}

impl ProductResponse {
    /// ドメインオブジェクトからProductResponseを作成
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id().to_string(),
            name: product.name().to_string(),
            description: product.description().to_string(),
            price_amount: product.price().amount(),
            price_currency: product.price().currency(),
            stock: product.stock(),
            purchase_limit: product.purchase_limit(),
            category_id: product.category_id().map(|id| id.to_string()),
            sold: product.sold(),
            views: product.views(),
            created_at: product.created_at().to_rfc3339(),
        }
    }
}

/// 商品詳細用のレスポンスDTO（関連商品つき）
#[derive(Serialize)]
pub struct ProductDetailResponse {
    pub product: ProductResponse,
    pub related_products: Vec<ProductResponse>,
}

impl ProductDetailResponse {
    pub fn new(product: &Product, related: &[Product]) -> Self {
        Self {
            product: ProductResponse::from_product(product),
            related_products: related.iter().map(ProductResponse::from_product).collect(),
        }
    }
}

/// カート明細用のレスポンスDTO
#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_id: String,
    pub product_name: String,
    pub unit_price_amount: i64,
    pub unit_price_currency: String,
    pub quantity: u32,
    pub subtotal_amount: i64,
}

impl CartLineResponse {
    /// 商品情報つきのカート明細からCartLineResponseを作成
    pub fn from_resolved_line(line: &ResolvedCartLine) -> Self {
        let unit_price = line.product.price();
        Self {
            product_id: line.product.id().to_string(),
            product_name: line.product.name().to_string(),
            unit_price_amount: unit_price.amount(),
            unit_price_currency: unit_price.currency(),
            quantity: line.quantity,
            subtotal_amount: unit_price.multiply(line.quantity).amount(),
        }
    }
}

/// カート用のレスポンスDTO
#[derive(Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLineResponse>,
}

impl CartResponse {
    pub fn from_resolved_lines(lines: &[ResolvedCartLine]) -> Self {
        Self {
            items: lines.iter().map(CartLineResponse::from_resolved_line).collect(),
        }
    }
}

/// カート追加結果のレスポンスDTO
#[derive(Serialize)]
pub struct AddToCartResponse {
    pub message: String,
    pub line_quantity: u32,
}

/// コメント投稿結果のレスポンスDTO
#[derive(Serialize)]
pub struct CreatedCommentResponse {
    pub message: String,
    pub comment_id: String,
}

/// 注文用のレスポンスDTO
#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub total_amount: i64,
    pub total_currency: String,
    pub is_paid: bool,
    pub accepted: bool,
    pub shipped: bool,
    pub delivered: bool,
    pub coupon_code: Option<String>,
    pub created_at: String,
}

impl OrderResponse {
    /// ドメインオブジェクトからOrderResponseを作成
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id().to_string(),
            total_amount: order.total_price().amount(),
            total_currency: order.total_price().currency(),
            is_paid: order.is_paid(),
            accepted: order.accepted(),
            shipped: order.shipped(),
            delivered: order.delivered(),
            coupon_code: order.applied_coupon().map(|code| code.to_string()),
            created_at: order.created_at().to_rfc3339(),
        }
    }
}

/// クーポン用のレスポンスDTO
#[derive(Serialize)]
pub struct CouponResponse {
    pub code: String,
    pub discount_percentage: String,
    pub valid_from: String,
    pub valid_to: String,
    pub max_usage: u32,
    pub used_count: u32,
}

impl CouponResponse {
    /// ドメインオブジェクトからCouponResponseを作成
    pub fn from_coupon(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code().to_string(),
            discount_percentage: coupon.discount_percentage().to_string(),
            valid_from: coupon
                .valid_from()
                .format(COUPON_DATETIME_FORMAT)
                .to_string(),
            valid_to: coupon.valid_to().format(COUPON_DATETIME_FORMAT).to_string(),
            max_usage: coupon.max_usage(),
            used_count: coupon.used_count(),
        }
    }
}

/// クーポン適用結果のレスポンスDTO
#[derive(Serialize)]
pub struct AppliedCouponResponse {
    pub total_amount: i64,
    pub total_currency: String,
}

impl AppliedCouponResponse {
    pub fn from_total(total: Money) -> Self {
        Self {
            total_amount: total.amount(),
            total_currency: total.currency(),
        }
    }
}

/// コメント用のレスポンスDTO（評価集計つき）
#[derive(Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub product_id: String,
    pub author_id: String,
    pub text: String,
    pub parent_id: Option<String>,
    pub likes: u32,
    pub dislikes: u32,
    pub created_at: String,
}

impl CommentResponse {
    /// 評価集計つきコメントからCommentResponseを作成
    pub fn from_comment_with_tally(item: &CommentWithTally) -> Self {
        Self {
            id: item.comment.id().to_string(),
            product_id: item.comment.product_id().to_string(),
            author_id: item.comment.author_id().to_string(),
            text: item.comment.text().to_string(),
            parent_id: item.comment.parent_id().map(|id| id.to_string()),
            likes: item.tally.likes,
            dislikes: item.tally.dislikes,
            created_at: item.comment.created_at().to_rfc3339(),
        }
    }
}

/// お気に入り用のレスポンスDTO（商品情報つき）
#[derive(Serialize)]
pub struct FavoriteResponse {
    pub product: ProductResponse,
    pub created_at: String,
}

impl FavoriteResponse {
    pub fn from_favorite(favorite: &Favorite, product: &Product) -> Self {
        Self {
            product: ProductResponse::from_product(product),
            created_at: favorite.created_at().to_rfc3339(),
        }
    }
}

/// 検索履歴用のレスポンスDTO
#[derive(Serialize)]
pub struct SearchRecordResponse {
    pub term: String,
    pub created_at: String,
}

impl SearchRecordResponse {
    pub fn from_record(record: &SearchRecord) -> Self {
        Self {
            term: record.term().to_string(),
            created_at: record.created_at().to_rfc3339(),
        }
    }
}

/// 人気検索語用のレスポンスDTO
#[derive(Serialize)]
pub struct HotTermResponse {
    pub term: String,
    pub count: u64,
}

impl HotTermResponse {
    pub fn from_hot_term(term: &HotTerm) -> Self {
        Self {
            term: term.term.clone(),
            count: term.count,
        }
    }
}

/// カテゴリ用のレスポンスDTO
#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

impl CategoryResponse {
    pub fn from_category(category: &Category) -> Self {
        Self {
            id: category.id().to_string(),
            name: category.name().to_string(),
            parent_id: category.parent_id().map(|id| id.to_string()),
        }
    }
}
