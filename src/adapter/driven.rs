// 駆動される側アダプター（リポジトリ実装など）

mod cart_store;
mod category_repository;
mod comment_repository;
mod console_logger;
mod coupon_repository;
mod favorite_repository;
mod memory_store;
mod order_repository;
mod product_repository;
mod search_history_repository;

pub use cart_store::MySqlCartStore;
pub use category_repository::MySqlCategoryRepository;
pub use comment_repository::MySqlCommentRepository;
pub use console_logger::ConsoleLogger;
pub use coupon_repository::MySqlCouponRepository;
pub use favorite_repository::MySqlFavoriteRepository;
pub use memory_store::InMemoryStore;
pub use order_repository::MySqlOrderRepository;
pub use product_repository::MySqlProductRepository;
pub use search_history_repository::MySqlSearchHistoryRepository;
