use std::sync::Arc;

use storefront_cart_management::adapter::driven::{ConsoleLogger, InMemoryStore};
use storefront_cart_management::application::error::{ApplicationError, NotFoundEntity};
use storefront_cart_management::application::service::{
    CartApplicationService, OrderApplicationService,
};
use storefront_cart_management::domain::error::DomainError;
use storefront_cart_management::domain::model::{Money, Product, ProductId, UserId};
use storefront_cart_management::domain::port::ProductRepository;

/// テスト用のストアとサービス一式を作成する
fn setup() -> (Arc<InMemoryStore>, CartApplicationService) {
    let store = Arc::new(InMemoryStore::new());
    let logger = Arc::new(ConsoleLogger::new());
    let cart_service =
        CartApplicationService::new(store.clone(), store.clone(), logger);
    (store, cart_service)
}

/// 商品を登録してIDを返す
async fn seed_product(
    store: &Arc<InMemoryStore>,
    price: i64,
    stock: u32,
    purchase_limit: Option<u32>,
) -> ProductId {
    let product = Product::new(
        ProductId::new(),
        "テスト商品".to_string(),
        "説明".to_string(),
        Money::jpy(price),
        stock,
        purchase_limit,
        None,
    )
    .unwrap();
    let product_id = product.id();
    ProductRepository::save(store.as_ref(), &product)
        .await
        .unwrap();
    product_id
}

async fn stock_of(store: &Arc<InMemoryStore>, product_id: ProductId) -> u32 {
    ProductRepository::find_by_id(store.as_ref(), product_id)
        .await
        .unwrap()
        .unwrap()
        .stock()
}

#[tokio::test]
async fn test_add_to_cart_reserves_stock() {
    let (store, cart_service) = setup();
    let user_id = UserId::new();
    let product_id = seed_product(&store, 1000, 10, None).await;

    let line_quantity = cart_service
        .add_to_cart(user_id, product_id, 3)
        .await
        .unwrap();

    assert_eq!(line_quantity, 3);
    // 在庫は追加の時点で引き当てられる
    assert_eq!(stock_of(&store, product_id).await, 7);

    let lines = cart_service.get_cart(user_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 3);
}

#[tokio::test]
async fn test_repeated_adds_accumulate_into_one_line() {
    let (store, cart_service) = setup();
    let user_id = UserId::new();
    let product_id = seed_product(&store, 1000, 10, None).await;

    cart_service.add_to_cart(user_id, product_id, 2).await.unwrap();
    cart_service.add_to_cart(user_id, product_id, 3).await.unwrap();
    cart_service.add_to_cart(user_id, product_id, 1).await.unwrap();

    // 合計6個の追加で在庫は 10 - 6 = 4、明細は1つ
    assert_eq!(stock_of(&store, product_id).await, 4);
    let lines = cart_service.get_cart(user_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 6);
}

#[tokio::test]
async fn test_add_to_cart_product_not_found() {
    let (_, cart_service) = setup();
    let result = cart_service
        .add_to_cart(UserId::new(), ProductId::new(), 1)
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::NotFound(NotFoundEntity::Product))
    ));
}

#[tokio::test]
async fn test_add_to_cart_out_of_stock() {
    let (store, cart_service) = setup();
    let user_id = UserId::new();
    let product_id = seed_product(&store, 1000, 0, None).await;

    let result = cart_service.add_to_cart(user_id, product_id, 1).await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::OutOfStock))
    ));
}

#[tokio::test]
async fn test_add_to_cart_insufficient_stock_mutates_nothing() {
    let (store, cart_service) = setup();
    let user_id = UserId::new();
    let product_id = seed_product(&store, 1000, 2, Some(100)).await;

    let result = cart_service.add_to_cart(user_id, product_id, 3).await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InsufficientStock { available: 2 }))
    ));
    // 在庫は変わらず、カートも作成されない
    assert_eq!(stock_of(&store, product_id).await, 2);
    assert!(matches!(
        cart_service.get_cart(user_id).await,
        Err(ApplicationError::NotFound(NotFoundEntity::Cart))
    ));
}

#[tokio::test]
async fn test_add_to_cart_purchase_limit_exceeded() {
    let (store, cart_service) = setup();
    let user_id = UserId::new();
    // 在庫10、購入上限5
    let product_id = seed_product(&store, 1000, 10, Some(5)).await;

    // 3個の追加は成功して在庫は7になる
    cart_service.add_to_cart(user_id, product_id, 3).await.unwrap();
    assert_eq!(stock_of(&store, product_id).await, 7);

    // さらに3個は 3 + 3 > 5 で拒否され、在庫もカートも変わらない
    let result = cart_service.add_to_cart(user_id, product_id, 3).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(
            DomainError::PurchaseLimitExceeded { limit: 5 }
        ))
    ));
    assert_eq!(stock_of(&store, product_id).await, 7);
    let lines = cart_service.get_cart(user_id).await.unwrap();
    assert_eq!(lines[0].quantity, 3);
}

#[tokio::test]
async fn test_add_to_cart_succeeds_at_limit_boundary() {
    let (store, cart_service) = setup();
    let user_id = UserId::new();
    let product_id = seed_product(&store, 1000, 10, Some(5)).await;

    cart_service.add_to_cart(user_id, product_id, 2).await.unwrap();
    // 2 + 3 == 5 は境界ちょうどで成功する
    let line_quantity = cart_service
        .add_to_cart(user_id, product_id, 3)
        .await
        .unwrap();

    assert_eq!(line_quantity, 5);
    assert_eq!(stock_of(&store, product_id).await, 5);
}

#[tokio::test]
async fn test_add_to_cart_zero_quantity_rejected() {
    let (store, cart_service) = setup();
    let user_id = UserId::new();
    let product_id = seed_product(&store, 1000, 10, None).await;

    let result = cart_service.add_to_cart(user_id, product_id, 0).await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidQuantity))
    ));
    assert_eq!(stock_of(&store, product_id).await, 10);
}

#[tokio::test]
async fn test_remove_from_cart_without_cart() {
    let (_, cart_service) = setup();

    let result = cart_service
        .remove_from_cart(UserId::new(), ProductId::new())
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::NotFound(NotFoundEntity::Cart))
    ));
}

#[tokio::test]
async fn test_remove_from_cart_without_line() {
    let (store, cart_service) = setup();
    let user_id = UserId::new();
    let product_id = seed_product(&store, 1000, 10, None).await;
    let other_product_id = seed_product(&store, 2000, 10, None).await;

    cart_service.add_to_cart(user_id, product_id, 1).await.unwrap();

    // カートはあるが明細がない商品はCartItemの404になる
    let result = cart_service
        .remove_from_cart(user_id, other_product_id)
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::NotFound(NotFoundEntity::CartItem))
    ));

    // 既存の明細は変わらない
    let lines = cart_service.get_cart(user_id).await.unwrap();
    assert_eq!(lines.len(), 1);
}

#[tokio::test]
async fn test_remove_from_cart_does_not_restock() {
    let (store, cart_service) = setup();
    let user_id = UserId::new();
    let product_id = seed_product(&store, 1000, 10, None).await;

    cart_service.add_to_cart(user_id, product_id, 4).await.unwrap();
    assert_eq!(stock_of(&store, product_id).await, 6);

    cart_service
        .remove_from_cart(user_id, product_id)
        .await
        .unwrap();

    // 明細は消えるが、引き当て済みの在庫は戻らない
    let lines = cart_service.get_cart(user_id).await.unwrap();
    assert!(lines.is_empty());
    assert_eq!(stock_of(&store, product_id).await, 6);
}

#[tokio::test]
async fn test_get_cart_without_cart() {
    let (_, cart_service) = setup();

    let result = cart_service.get_cart(UserId::new()).await;

    assert!(matches!(
        result,
        Err(ApplicationError::NotFound(NotFoundEntity::Cart))
    ));
}

#[tokio::test]
async fn test_concurrent_adds_reserve_last_unit_exactly_once() {
    let (store, cart_service) = setup();
    let cart_service = Arc::new(cart_service);
    // 在庫1の商品に2ユーザーが同時に1個ずつ要求する
    let product_id = seed_product(&store, 1000, 1, None).await;
    let user1 = UserId::new();
    let user2 = UserId::new();

    let service1 = cart_service.clone();
    let service2 = cart_service.clone();
    let (result1, result2) = tokio::join!(
        tokio::spawn(async move { service1.add_to_cart(user1, product_id, 1).await }),
        tokio::spawn(async move { service2.add_to_cart(user2, product_id, 1).await }),
    );
    let result1 = result1.unwrap();
    let result2 = result2.unwrap();

    // ちょうど一方だけが成功し、他方は在庫関連のエラーで失敗する
    let successes = [&result1, &result2]
        .iter()
        .filter(|result| result.is_ok())
        .count();
    assert_eq!(successes, 1);

    let failure = if result1.is_err() { result1 } else { result2 };
    assert!(matches!(
        failure,
        Err(ApplicationError::Domain(
            DomainError::OutOfStock | DomainError::InsufficientStock { .. }
        ))
    ));

    // 最終在庫は0で、負にはならない
    assert_eq!(stock_of(&store, product_id).await, 0);
}

#[tokio::test]
async fn test_checkout_creates_order_and_clears_cart() {
    let (store, cart_service) = setup();
    let logger = Arc::new(ConsoleLogger::new());
    let order_service = OrderApplicationService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        logger,
    );
    let user_id = UserId::new();
    let product_id = seed_product(&store, 1200, 10, None).await;

    cart_service.add_to_cart(user_id, product_id, 3).await.unwrap();

    let order = order_service.checkout(user_id).await.unwrap();

    // 3600円 + 送料500円 = 4100円
    assert_eq!(order.total_price().amount(), 4100);
    assert!(!order.is_paid());

    // カートは空になり、在庫は変わらない（追加時に引き当て済み）
    let lines = cart_service.get_cart(user_id).await.unwrap();
    assert!(lines.is_empty());
    assert_eq!(stock_of(&store, product_id).await, 7);

    // 販売数が加算される
    let product = ProductRepository::find_by_id(store.as_ref(), product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.sold(), 3);
}

#[tokio::test]
async fn test_checkout_free_shipping_over_threshold() {
    let (store, cart_service) = setup();
    let logger = Arc::new(ConsoleLogger::new());
    let order_service = OrderApplicationService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        logger,
    );
    let user_id = UserId::new();
    let product_id = seed_product(&store, 5000, 10, None).await;

    cart_service.add_to_cart(user_id, product_id, 2).await.unwrap();

    let order = order_service.checkout(user_id).await.unwrap();

    // 10000円以上は送料無料
    assert_eq!(order.total_price().amount(), 10_000);
}

#[tokio::test]
async fn test_checkout_with_empty_cart_fails() {
    let (store, cart_service) = setup();
    let logger = Arc::new(ConsoleLogger::new());
    let order_service = OrderApplicationService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        logger,
    );
    let user_id = UserId::new();
    let product_id = seed_product(&store, 1000, 10, None).await;

    // 追加してから削除してカートを空にする
    cart_service.add_to_cart(user_id, product_id, 1).await.unwrap();
    cart_service
        .remove_from_cart(user_id, product_id)
        .await
        .unwrap();

    let result = order_service.checkout(user_id).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::Validation(_)))
    ));
}
