use storefront_cart_management::adapter::driven::{
    ConsoleLogger, MySqlCartStore, MySqlCategoryRepository, MySqlCommentRepository,
    MySqlCouponRepository, MySqlFavoriteRepository, MySqlOrderRepository, MySqlProductRepository,
    MySqlSearchHistoryRepository,
};
use storefront_cart_management::adapter::driver::rest_api::{create_router, AppStateInner};
use storefront_cart_management::adapter::{DatabaseConfig, DatabaseMigration};
use storefront_cart_management::application::service::{
    CartApplicationService, CatalogApplicationService, CommentApplicationService,
    CouponApplicationService, FavoriteApplicationService, OrderApplicationService,
    PermissionService,
};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== ストアフロント カート管理システム REST API ===");
    println!();

    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    // データベース設定を読み込む
    let config = DatabaseConfig::from_env()?;
    println!(
        "データベース設定を読み込みました: {}:{}",
        config.host, config.port
    );

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await?;
    println!("データベース接続プールを作成しました");

    // マイグレーションを実行
    let migration = DatabaseMigration::new(pool.clone());
    migration.run().await?;
    println!("データベースマイグレーションを実行しました");

    // MySQLリポジトリを作成
    let product_repository = Arc::new(MySqlProductRepository::new(pool.clone()));
    let category_repository = Arc::new(MySqlCategoryRepository::new(pool.clone()));
    let cart_store = Arc::new(MySqlCartStore::new(pool.clone()));
    let order_repository = Arc::new(MySqlOrderRepository::new(pool.clone()));
    let coupon_repository = Arc::new(MySqlCouponRepository::new(pool.clone()));
    let favorite_repository = Arc::new(MySqlFavoriteRepository::new(pool.clone()));
    let comment_repository = Arc::new(MySqlCommentRepository::new(pool.clone()));
    let search_history_repository = Arc::new(MySqlSearchHistoryRepository::new(pool.clone()));

    // ロガーを作成
    let logger = Arc::new(ConsoleLogger::new());

    // アプリケーションサービスを作成
    let cart_service = Arc::new(CartApplicationService::new(
        cart_store.clone(),
        product_repository.clone(),
        logger.clone(),
    ));
    let coupon_service = Arc::new(CouponApplicationService::new(
        coupon_repository.clone(),
        logger.clone(),
    ));
    let order_service = Arc::new(OrderApplicationService::new(
        order_repository.clone(),
        cart_store.clone(),
        product_repository.clone(),
        logger.clone(),
    ));
    let catalog_service = Arc::new(CatalogApplicationService::new(
        product_repository.clone(),
        category_repository.clone(),
        search_history_repository.clone(),
        logger.clone(),
    ));
    let comment_service = Arc::new(CommentApplicationService::new(
        comment_repository.clone(),
        product_repository.clone(),
        logger.clone(),
    ));
    let favorite_service = Arc::new(FavoriteApplicationService::new(
        favorite_repository.clone(),
        product_repository.clone(),
        logger.clone(),
    ));
    let permission_service = Arc::new(PermissionService::new(order_repository.clone()));

    // アプリケーション状態を作成
    let app_state = AppStateInner {
        cart_service,
        coupon_service,
        order_service,
        catalog_service,
        comment_service,
        favorite_service,
        permission_service,
    };

    // REST APIルーターを作成
    let app = create_router()
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // サーバーを起動
    let addr = std::env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("REST APIサーバーが起動しました: http://{}", addr);
    println!("ヘルスチェック: GET /health");
    println!("API仕様:");
    println!("  GET    /products - 商品一覧取得");
    println!("  POST   /products - 商品登録（管理者）");
    println!("  GET    /products/:id - 商品詳細取得");
    println!("  GET    /products/search?q= - 商品検索");
    println!("  GET    /categories - カテゴリ一覧取得");
    println!("  POST   /categories - カテゴリ登録（管理者）");
    println!("  GET    /cart - カート取得");
    println!("  POST   /cart/add - カートに追加");
    println!("  POST   /cart/remove - カートから削除");
    println!("  POST   /orders/checkout - 注文作成");
    println!("  GET    /orders - 注文一覧取得");
    println!("  POST   /orders/:id/apply-coupon - クーポン適用");
    println!("  POST   /coupons - クーポン発行（管理者）");
    println!("  GET    /products/:id/comments - コメント一覧取得");
    println!("  POST   /products/:id/comments - コメント投稿");
    println!("  POST   /comments/vote - コメント評価");
    println!("  POST   /comments/:id/approve - コメント公開（管理者）");
    println!("  POST   /products/:id/favorite - お気に入り登録");
    println!("  DELETE /products/:id/favorite - お気に入り削除");
    println!("  GET    /favorites - お気に入り一覧取得");
    println!("  GET    /search/recent - 検索履歴取得");
    println!("  GET    /search/hot - 人気検索語取得");
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}
