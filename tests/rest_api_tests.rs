use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use storefront_cart_management::adapter::driven::{ConsoleLogger, InMemoryStore};
use storefront_cart_management::adapter::driver::rest_api::{create_router, AppStateInner};
use storefront_cart_management::application::service::{
    CartApplicationService, CatalogApplicationService, CommentApplicationService,
    CouponApplicationService, FavoriteApplicationService, OrderApplicationService,
    PermissionService,
};

/// インメモリストアを使ったテストサーバーを構築する
fn build_server() -> TestServer {
    let store = Arc::new(InMemoryStore::new());
    let logger = Arc::new(ConsoleLogger::new());

    let app_state = AppStateInner {
        cart_service: Arc::new(CartApplicationService::new(
            store.clone(),
            store.clone(),
            logger.clone(),
        )),
        coupon_service: Arc::new(CouponApplicationService::new(
            store.clone(),
            logger.clone(),
        )),
        order_service: Arc::new(OrderApplicationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            logger.clone(),
        )),
        catalog_service: Arc::new(CatalogApplicationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            logger.clone(),
        )),
        comment_service: Arc::new(CommentApplicationService::new(
            store.clone(),
            store.clone(),
            logger.clone(),
        )),
        favorite_service: Arc::new(FavoriteApplicationService::new(
            store.clone(),
            store.clone(),
            logger.clone(),
        )),
        permission_service: Arc::new(PermissionService::new(store.clone())),
    };

    let app = create_router().with_state(app_state);
    TestServer::new(app).unwrap()
}

fn user_headers(user_id: Uuid) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user_id.to_string()).unwrap(),
    )
}

fn staff_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-staff"),
        HeaderValue::from_static("true"),
    )
}

/// スタッフ権限で商品を登録して商品IDを返す
async fn create_product(server: &TestServer, price: i64, stock: u32, limit: Option<u32>) -> Uuid {
    let (id_name, id_value) = user_headers(Uuid::new_v4());
    let (staff_name, staff_value) = staff_header();
    let response = server
        .post("/products")
        .add_header(id_name, id_value)
        .add_header(staff_name, staff_value)
        .json(&json!({
            "name": "テスト商品",
            "description": "sample widget",
            "price": price,
            "stock": stock,
            "purchase_limit": limit,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = build_server();

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_add_to_cart_requires_authentication() {
    let server = build_server();

    let response = server
        .post("/cart/add")
        .json(&json!({ "product_id": Uuid::new_v4() }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["is_success"], false);
    assert!(body["data"].is_null());
    assert!(body["errors"].is_array());
    // エラーレスポンスにはuserPermissionが含まれない
    assert!(body.get("userPermission").is_none());
}

#[tokio::test]
async fn test_create_coupon_requires_admin() {
    let server = build_server();
    let (id_name, id_value) = user_headers(Uuid::new_v4());

    let response = server
        .post("/coupons")
        .add_header(id_name, id_value)
        .json(&json!({
            "code": "SALE",
            "discount_percentage": "10.00",
            "valid_from": "2020-01-01 00:00",
            "valid_to": "2099-12-31 23:59",
            "max_usage": 10,
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["is_success"], false);
}

#[tokio::test]
async fn test_create_coupon_rejects_invalid_date_format() {
    let server = build_server();
    let (id_name, id_value) = user_headers(Uuid::new_v4());
    let (staff_name, staff_value) = staff_header();

    let response = server
        .post("/coupons")
        .add_header(id_name, id_value)
        .add_header(staff_name, staff_value)
        .json(&json!({
            "code": "SALE",
            "discount_percentage": "10.00",
            "valid_from": "2020/01/01 00:00",
            "valid_to": "2099-12-31 23:59",
            "max_usage": 10,
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["is_success"], false);
}

#[tokio::test]
async fn test_anonymous_product_listing_has_tier_five() {
    let server = build_server();
    create_product(&server, 1000, 10, None).await;

    let response = server.get("/products").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["is_success"], true);
    assert_eq!(body["userPermission"], "5");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_add_to_cart_unknown_product_is_404() {
    let server = build_server();
    let (id_name, id_value) = user_headers(Uuid::new_v4());

    let response = server
        .post("/cart/add")
        .add_header(id_name, id_value)
        .json(&json!({ "product_id": Uuid::new_v4(), "quantity": 1 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["is_success"], false);
    assert_eq!(body["errors"][0], "指定された商品が見つかりません");
}

#[tokio::test]
async fn test_cart_flow_and_role_promotion_after_checkout() {
    let server = build_server();
    let product_id = create_product(&server, 1200, 10, None).await;
    let user_id = Uuid::new_v4();

    // 数量を省略すると1個として追加される
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post("/cart/add")
        .add_header(id_name, id_value)
        .json(&json!({ "product_id": product_id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["is_success"], true);
    assert_eq!(body["data"]["line_quantity"], 1);
    // 購入履歴がない登録ユーザーは "4"
    assert_eq!(body["userPermission"], "4");

    // カートの内容を確認する
    let (id_name, id_value) = user_headers(user_id);
    let response = server.get("/cart").add_header(id_name, id_value).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 1);
    assert_eq!(items[0]["subtotal_amount"], 1200);

    // チェックアウトすると注文が作成される（1200円 + 送料500円）
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post("/orders/checkout")
        .add_header(id_name, id_value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["total_amount"], 1700);

    // 購入履歴ができたので以降のレスポンスでは "3" になる
    let (id_name, id_value) = user_headers(user_id);
    let response = server.get("/orders").add_header(id_name, id_value).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["userPermission"], "3");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_purchase_limit_error_through_envelope() {
    let server = build_server();
    // 在庫10、購入上限5の商品
    let product_id = create_product(&server, 1000, 10, Some(5)).await;
    let user_id = Uuid::new_v4();

    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post("/cart/add")
        .add_header(id_name, id_value)
        .json(&json!({ "product_id": product_id, "quantity": 3 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // 3 + 3 > 5 は400で拒否される
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post("/cart/add")
        .add_header(id_name, id_value)
        .json(&json!({ "product_id": product_id, "quantity": 3 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["is_success"], false);
    assert_eq!(body["errors"][0], "要求数量が購入可能な上限を超えています");
}

#[tokio::test]
async fn test_apply_coupon_through_envelope() {
    let server = build_server();
    let product_id = create_product(&server, 1000, 10, None).await;
    let user_id = Uuid::new_v4();

    // スタッフがクーポンを発行する
    let (id_name, id_value) = user_headers(Uuid::new_v4());
    let (staff_name, staff_value) = staff_header();
    let response = server
        .post("/coupons")
        .add_header(id_name, id_value)
        .add_header(staff_name, staff_value)
        .json(&json!({
            "code": "SAVE10",
            "discount_percentage": "10.00",
            "valid_from": "2020-01-01 00:00",
            "valid_to": "2099-12-31 23:59",
            "max_usage": 1,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["used_count"], 0);

    // ユーザーが商品を1つ購入して注文を作成する
    let (id_name, id_value) = user_headers(user_id);
    server
        .post("/cart/add")
        .add_header(id_name, id_value)
        .json(&json!({ "product_id": product_id, "quantity": 1 }))
        .await;
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post("/orders/checkout")
        .add_header(id_name, id_value)
        .await;
    let body: Value = response.json();
    let order_id = body["data"]["order_id"].as_str().unwrap().to_string();
    // 1000円 + 送料500円
    assert_eq!(body["data"]["total_amount"], 1500);

    // クーポンを適用すると合計が10%割引される
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post(&format!("/orders/{}/apply-coupon", order_id))
        .add_header(id_name, id_value)
        .json(&json!({ "code": "SAVE10" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["total_amount"], 1350);

    // 使用回数上限に達したクーポンは2回目の適用で400になる
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post(&format!("/orders/{}/apply-coupon", order_id))
        .add_header(id_name, id_value)
        .json(&json!({ "code": "SAVE10" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errors"][0], "クーポンは使用回数の上限に達しています");
}

#[tokio::test]
async fn test_comment_moderation_flow() {
    let server = build_server();
    let product_id = create_product(&server, 1000, 10, None).await;
    let user_id = Uuid::new_v4();

    // コメントを投稿する
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post(&format!("/products/{}/comments", product_id))
        .add_header(id_name, id_value)
        .json(&json!({ "text": "良い商品でした" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let comment_id = body["data"]["comment_id"].as_str().unwrap().to_string();

    // モデレーション前は一覧に現れない
    let response = server
        .get(&format!("/products/{}/comments", product_id))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // 評価は投稿直後のコメントにも登録できる
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post("/comments/vote")
        .add_header(id_name, id_value)
        .json(&json!({ "comment_id": comment_id, "value": 1 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // スタッフが公開すると評価集計つきで一覧に現れる
    let (id_name, id_value) = user_headers(Uuid::new_v4());
    let (staff_name, staff_value) = staff_header();
    let response = server
        .post(&format!("/comments/{}/approve", comment_id))
        .add_header(id_name, id_value)
        .add_header(staff_name, staff_value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get(&format!("/products/{}/comments", product_id))
        .await;
    let body: Value = response.json();
    let comments = body["data"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["likes"], 1);
    assert_eq!(comments[0]["dislikes"], 0);
}

#[tokio::test]
async fn test_vote_toggle_and_switch() {
    let server = build_server();
    let product_id = create_product(&server, 1000, 10, None).await;
    let user_id = Uuid::new_v4();

    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post(&format!("/products/{}/comments", product_id))
        .add_header(id_name, id_value)
        .json(&json!({ "text": "参考になりました" }))
        .await;
    let body: Value = response.json();
    let comment_id = body["data"]["comment_id"].as_str().unwrap().to_string();

    // いいねを登録する
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post("/comments/vote")
        .add_header(id_name, id_value)
        .json(&json!({ "comment_id": comment_id, "value": 1 }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "評価を登録しました");

    // 逆の評価を送ると切り替わる
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post("/comments/vote")
        .add_header(id_name, id_value)
        .json(&json!({ "comment_id": comment_id, "value": -1 }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "評価を登録しました");

    // 同じ評価を再送すると取り消される
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post("/comments/vote")
        .add_header(id_name, id_value)
        .json(&json!({ "comment_id": comment_id, "value": -1 }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "評価を取り消しました");

    // 1でも-1でもない値は400になる
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post("/comments/vote")
        .add_header(id_name, id_value)
        .json(&json!({ "comment_id": comment_id, "value": 2 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_favorites_flow() {
    let server = build_server();
    let product_id = create_product(&server, 1000, 10, None).await;
    let user_id = Uuid::new_v4();

    // お気に入りに登録する
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post(&format!("/products/{}/favorite", product_id))
        .add_header(id_name, id_value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // 同じ商品の再登録は400になる
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .post(&format!("/products/{}/favorite", product_id))
        .add_header(id_name, id_value)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // 一覧には1件だけ現れる
    let (id_name, id_value) = user_headers(user_id);
    let response = server.get("/favorites").add_header(id_name, id_value).await;
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_records_history_for_authenticated_user() {
    let server = build_server();
    create_product(&server, 1000, 10, None).await;
    let user_id = Uuid::new_v4();

    // 認証済みユーザーの検索は履歴に記録される
    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .get("/products/search?q=widget")
        .add_header(id_name, id_value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (id_name, id_value) = user_headers(user_id);
    let response = server
        .get("/search/recent")
        .add_header(id_name, id_value)
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"][0]["term"], "widget");

    // 人気検索語にも現れる
    let response = server.get("/search/hot").await;
    let body: Value = response.json();
    assert_eq!(body["data"][0]["term"], "widget");
    assert_eq!(body["data"][0]["count"], 1);
}
