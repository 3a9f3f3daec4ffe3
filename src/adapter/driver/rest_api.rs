use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::adapter::driver::envelope::{
    self, map_application_error, Envelope,
};
use crate::adapter::driver::request_dto::{
    parse_coupon_datetime, AddToCartRequest, ApplyCouponRequest, CreateCategoryRequest,
    CreateCommentRequest, CreateCouponRequest, CreateProductRequest, ProductsQueryParams,
    RemoveFromCartRequest, SearchQueryParams, VoteCommentRequest,
};
use crate::adapter::driver::response_dto::{
    AddToCartResponse, AppliedCouponResponse, CartResponse, CategoryResponse, CommentResponse,
    CouponResponse, CreatedCommentResponse, FavoriteResponse, HotTermResponse, MessageResponse,
    OrderResponse, ProductDetailResponse, ProductResponse, SearchRecordResponse,
};
use crate::application::service::{
    CartApplicationService, CatalogApplicationService, CommentApplicationService,
    CouponApplicationService, FavoriteApplicationService, NewCoupon, NewProduct,
    OrderApplicationService, PermissionService, VoteResult,
};
use crate::domain::model::{
    CategoryId, CommentId, OrderId, Principal, ProductId, UserId,
};
use crate::domain::port::{ProductOrder, ProductQuery};
use crate::domain::service::PermissionTier;

/// エラーレスポンスの型（エンベロープつき）
type ErrorResponse = (StatusCode, Json<Envelope<serde_json::Value>>);

// アプリケーションサービスを含む状態
pub type AppState = AppStateInner;

#[derive(Clone)]
pub struct AppStateInner {
    pub cart_service: Arc<CartApplicationService>,
    pub coupon_service: Arc<CouponApplicationService>,
    pub order_service: Arc<OrderApplicationService>,
    pub catalog_service: Arc<CatalogApplicationService>,
    pub comment_service: Arc<CommentApplicationService>,
    pub favorite_service: Arc<FavoriteApplicationService>,
    pub permission_service: Arc<PermissionService>,
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        // カタログ
        .route("/products", get(list_products).post(create_product))
        .route("/products/search", get(search_products))
        .route("/products/:product_id", get(get_product))
        .route("/categories", get(list_categories).post(create_category))
        // コメント
        .route(
            "/products/:product_id/comments",
            get(list_comments).post(create_comment),
        )
        .route("/comments/vote", post(vote_comment))
        .route("/comments/:comment_id/approve", post(approve_comment))
        // お気に入り
        .route(
            "/products/:product_id/favorite",
            post(add_favorite).delete(remove_favorite),
        )
        .route("/favorites", get(list_favorites))
        // カート
        .route("/cart", get(get_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/remove", post(remove_from_cart))
        // 注文とクーポン
        .route("/orders", get(list_orders))
        .route("/orders/checkout", post(checkout))
        .route("/orders/:order_id/apply-coupon", post(apply_coupon))
        .route("/coupons", post(create_coupon))
        // 検索履歴
        .route("/search/recent", get(recent_searches))
        .route("/search/hot", get(hot_searches))
}

/// 認証基盤が設定するヘッダーから主体を復元する
/// トークンの検証は上流で完了しているため、ここではヘッダーのみを信頼する
fn principal_from_headers(headers: &HeaderMap) -> Principal {
    let user_id = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .map(UserId::from_uuid);

    match user_id {
        Some(user_id) => {
            let flag = |name: &str| {
                headers
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .map(|value| value == "true" || value == "1")
                    .unwrap_or(false)
            };
            Principal::authenticated(user_id, flag("x-user-staff"), flag("x-user-superuser"))
        }
        None => Principal::anonymous(),
    }
}

/// 認証済みユーザーのIDを要求する（未認証は401）
fn require_user(principal: &Principal) -> Result<UserId, ErrorResponse> {
    principal.user_id().ok_or_else(envelope::unauthorized)
}

/// 管理者権限を要求する（未認証は401、権限なしは403）
fn require_admin(principal: &Principal) -> Result<(), ErrorResponse> {
    if !principal.is_authenticated() {
        return Err(envelope::unauthorized());
    }
    if !principal.is_admin() {
        return Err(envelope::forbidden());
    }
    Ok(())
}

/// 主体の権限区分を解決する
async fn resolve_tier(
    state: &AppState,
    principal: &Principal,
) -> Result<PermissionTier, ErrorResponse> {
    state
        .permission_service
        .tier_for(principal)
        .await
        .map_err(map_application_error)
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "storefront-cart-management",
        "version": "0.1.0"
    }))
}

// 商品一覧取得エンドポイント
async fn list_products(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ProductsQueryParams>,
) -> Result<(StatusCode, Json<Envelope<Vec<ProductResponse>>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);

    let order_by = match params.order_by.as_deref() {
        None | Some("created_at") => ProductOrder::CreatedAt,
        Some("price") => ProductOrder::Price,
        Some("sold") => ProductOrder::Sold,
        Some(other) => {
            return Err(envelope::error(
                StatusCode::BAD_REQUEST,
                vec![format!("無効な並び順です: {}", other)],
            ))
        }
    };
    let query = ProductQuery {
        category_id: params.category.map(CategoryId::from_uuid),
        min_price: params.min_price,
        max_price: params.max_price,
        order_by: Some(order_by),
        descending: params.order_type.as_deref() == Some("desc"),
    };

    let products = state
        .catalog_service
        .list_products(&query)
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    let response: Vec<ProductResponse> =
        products.iter().map(ProductResponse::from_product).collect();
    Ok(envelope::success(response, tier))
}

// 商品登録エンドポイント（管理者専用）
async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Envelope<ProductResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    require_admin(&principal)?;

    let product = state
        .catalog_service
        .create_product(NewProduct {
            name: request.name,
            description: request.description.unwrap_or_default(),
            price: request.price,
            stock: request.stock,
            purchase_limit: request.purchase_limit,
            category_id: request.category_id.map(CategoryId::from_uuid),
        })
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(
        ProductResponse::from_product(&product),
        tier,
    ))
}

// 商品詳細取得エンドポイント（関連商品つき）
async fn get_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Envelope<ProductDetailResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);

    let (product, related) = state
        .catalog_service
        .get_product(ProductId::from_uuid(product_id))
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(
        ProductDetailResponse::new(&product, &related),
        tier,
    ))
}

// 商品検索エンドポイント
// 認証済みユーザーの検索語は検索履歴に記録される
async fn search_products(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchQueryParams>,
) -> Result<(StatusCode, Json<Envelope<Vec<ProductResponse>>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let term = params.q.unwrap_or_default();

    let products = state
        .catalog_service
        .search_products(&principal, &term)
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    let response: Vec<ProductResponse> =
        products.iter().map(ProductResponse::from_product).collect();
    Ok(envelope::success(response, tier))
}

// カテゴリ一覧取得エンドポイント
async fn list_categories(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Envelope<Vec<CategoryResponse>>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);

    let categories = state
        .catalog_service
        .list_categories()
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    let response: Vec<CategoryResponse> = categories
        .iter()
        .map(CategoryResponse::from_category)
        .collect();
    Ok(envelope::success(response, tier))
}

// カテゴリ登録エンドポイント（管理者専用）
async fn create_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Envelope<CategoryResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    require_admin(&principal)?;

    let category = state
        .catalog_service
        .create_category(request.name, request.parent_id.map(CategoryId::from_uuid))
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(
        CategoryResponse::from_category(&category),
        tier,
    ))
}

// コメント一覧取得エンドポイント（公開済みのみ）
async fn list_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Envelope<Vec<CommentResponse>>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);

    let comments = state
        .comment_service
        .list_comments(ProductId::from_uuid(product_id))
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    let response: Vec<CommentResponse> = comments
        .iter()
        .map(CommentResponse::from_comment_with_tally)
        .collect();
    Ok(envelope::success(response, tier))
}

// コメント投稿エンドポイント
async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<Uuid>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Envelope<CreatedCommentResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let user_id = require_user(&principal)?;

    let comment = state
        .comment_service
        .create_comment(
            user_id,
            ProductId::from_uuid(product_id),
            request.text,
            request.parent.map(CommentId::from_uuid),
        )
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(
        CreatedCommentResponse {
            message: "コメントを投稿しました".to_string(),
            comment_id: comment.id().to_string(),
        },
        tier,
    ))
}

// コメント評価エンドポイント
async fn vote_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<VoteCommentRequest>,
) -> Result<(StatusCode, Json<Envelope<MessageResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let user_id = require_user(&principal)?;

    let result = state
        .comment_service
        .vote(
            user_id,
            CommentId::from_uuid(request.comment_id),
            request.value,
        )
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    let message = match result {
        VoteResult::Recorded => "評価を登録しました",
        VoteResult::Removed => "評価を取り消しました",
    };
    Ok(envelope::success(MessageResponse::new(message), tier))
}

// コメント公開エンドポイント（管理者専用）
async fn approve_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Envelope<MessageResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    require_admin(&principal)?;

    state
        .comment_service
        .approve_comment(CommentId::from_uuid(comment_id))
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(
        MessageResponse::new("コメントを公開しました"),
        tier,
    ))
}

// お気に入り登録エンドポイント
async fn add_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Envelope<MessageResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let user_id = require_user(&principal)?;

    state
        .favorite_service
        .add_favorite(user_id, ProductId::from_uuid(product_id))
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(
        MessageResponse::new("商品をお気に入りに追加しました"),
        tier,
    ))
}

// お気に入り削除エンドポイント
async fn remove_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Envelope<MessageResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let user_id = require_user(&principal)?;

    state
        .favorite_service
        .remove_favorite(user_id, ProductId::from_uuid(product_id))
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(
        MessageResponse::new("商品をお気に入りから削除しました"),
        tier,
    ))
}

// お気に入り一覧取得エンドポイント
async fn list_favorites(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Envelope<Vec<FavoriteResponse>>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let user_id = require_user(&principal)?;

    let favorites = state
        .favorite_service
        .list_favorites(user_id)
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    let response: Vec<FavoriteResponse> = favorites
        .iter()
        .map(|(favorite, product)| FavoriteResponse::from_favorite(favorite, product))
        .collect();
    Ok(envelope::success(response, tier))
}

// カート取得エンドポイント
async fn get_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Envelope<CartResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let user_id = require_user(&principal)?;

    let lines = state
        .cart_service
        .get_cart(user_id)
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(
        CartResponse::from_resolved_lines(&lines),
        tier,
    ))
}

// カート追加エンドポイント
// 成功すると在庫がその場で引き当てられる
async fn add_to_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<Envelope<AddToCartResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let user_id = require_user(&principal)?;

    // 数量は省略時に1として扱う
    let quantity = request.quantity.unwrap_or(1);

    let line_quantity = state
        .cart_service
        .add_to_cart(user_id, ProductId::from_uuid(request.product_id), quantity)
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(
        AddToCartResponse {
            message: "商品をカートに追加しました".to_string(),
            line_quantity,
        },
        tier,
    ))
}

// カート削除エンドポイント
async fn remove_from_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<(StatusCode, Json<Envelope<MessageResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let user_id = require_user(&principal)?;

    state
        .cart_service
        .remove_from_cart(user_id, ProductId::from_uuid(request.product_id))
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(
        MessageResponse::new("商品をカートから削除しました"),
        tier,
    ))
}

// 注文一覧取得エンドポイント
async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Envelope<Vec<OrderResponse>>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let user_id = require_user(&principal)?;

    let orders = state
        .order_service
        .list_orders(user_id)
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    let response: Vec<OrderResponse> = orders.iter().map(OrderResponse::from_order).collect();
    Ok(envelope::success(response, tier))
}

// チェックアウトエンドポイント
// カートの内容から注文を作成する
async fn checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Envelope<OrderResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let user_id = require_user(&principal)?;

    let order = state
        .order_service
        .checkout(user_id)
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(OrderResponse::from_order(&order), tier))
}

// クーポン適用エンドポイント
async fn apply_coupon(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
    Json(request): Json<ApplyCouponRequest>,
) -> Result<(StatusCode, Json<Envelope<AppliedCouponResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let user_id = require_user(&principal)?;

    let new_total = state
        .coupon_service
        .apply_coupon(user_id, OrderId::from_uuid(order_id), &request.code)
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(
        AppliedCouponResponse::from_total(new_total),
        tier,
    ))
}

// クーポン発行エンドポイント（管理者専用）
async fn create_coupon(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<Envelope<CouponResponse>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    require_admin(&principal)?;

    // 日付は "YYYY-MM-DD HH:MM" 形式のみを受け付ける
    let valid_from = parse_coupon_datetime(&request.valid_from, "開始日時")
        .map_err(|err| map_application_error(err.into()))?;
    let valid_to = parse_coupon_datetime(&request.valid_to, "終了日時")
        .map_err(|err| map_application_error(err.into()))?;

    let coupon = state
        .coupon_service
        .create_coupon(NewCoupon {
            code: request.code,
            discount_percentage: request.discount_percentage,
            valid_from,
            valid_to,
            max_usage: request.max_usage,
        })
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    Ok(envelope::success(CouponResponse::from_coupon(&coupon), tier))
}

// 検索履歴取得エンドポイント（直近10件）
async fn recent_searches(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Envelope<Vec<SearchRecordResponse>>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);
    let user_id = require_user(&principal)?;

    let records = state
        .catalog_service
        .recent_searches(user_id)
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    let response: Vec<SearchRecordResponse> = records
        .iter()
        .map(SearchRecordResponse::from_record)
        .collect();
    Ok(envelope::success(response, tier))
}

// 人気検索語取得エンドポイント（上位10件）
async fn hot_searches(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Envelope<Vec<HotTermResponse>>>), ErrorResponse> {
    let principal = principal_from_headers(&headers);

    let terms = state
        .catalog_service
        .hot_searches()
        .await
        .map_err(map_application_error)?;
    let tier = resolve_tier(&state, &principal).await?;

    let response: Vec<HotTermResponse> =
        terms.iter().map(HotTermResponse::from_hot_term).collect();
    Ok(envelope::success(response, tier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_principal_from_headers_anonymous() {
        let headers = HeaderMap::new();
        let principal = principal_from_headers(&headers);
        assert!(!principal.is_authenticated());
    }

    #[test]
    fn test_principal_from_headers_authenticated() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-user-id",
            HeaderValue::from_static("3fa85f64-5717-4562-b3fc-2c963f66afa6"),
        );
        headers.insert("x-user-staff", HeaderValue::from_static("true"));

        let principal = principal_from_headers(&headers);
        assert!(principal.is_authenticated());
        assert!(principal.is_staff());
        assert!(!principal.is_superuser());
    }

    #[test]
    fn test_principal_from_headers_invalid_uuid_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("not-a-uuid"));

        let principal = principal_from_headers(&headers);
        assert!(!principal.is_authenticated());
    }

    #[test]
    fn test_require_admin_rejects_regular_user() {
        let regular = Principal::authenticated(UserId::new(), false, false);
        let result = require_admin(&regular);
        assert!(result.is_err());
        let (status, _) = result.unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_require_admin_rejects_anonymous_with_401() {
        let result = require_admin(&Principal::anonymous());
        assert!(result.is_err());
        let (status, _) = result.unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
