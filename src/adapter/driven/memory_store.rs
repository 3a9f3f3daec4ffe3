use crate::domain::model::{
    Cart, Category, CategoryId, Comment, CommentId, Coupon, Favorite, HotTerm, Order, OrderId,
    Product, ProductId, SearchRecord, UserId, VoteTally, VoteValue,
};
use crate::domain::port::{
    CartAddOutcome, CartStore, CategoryRepository, CommentRepository, CouponApplyOutcome,
    CouponRepository, FavoriteRepository, OrderRepository, ProductOrder, ProductQuery,
    ProductRepository, RepositoryError, SearchHistoryRepository,
};
use crate::domain::service::authorize_cart_add;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// インメモリストアの内部状態
#[derive(Debug, Default)]
struct StoreState {
    products: HashMap<ProductId, Product>,
    categories: HashMap<CategoryId, Category>,
    carts: HashMap<UserId, Cart>,
    orders: HashMap<OrderId, Order>,
    coupons: HashMap<String, Coupon>,
    favorites: Vec<Favorite>,
    comments: HashMap<CommentId, Comment>,
    votes: HashMap<(UserId, CommentId), VoteValue>,
    searches: Vec<SearchRecord>,
}

/// インメモリストア
/// すべてのリポジトリポートを単一のミューテックス配下の状態で実装する。
/// ミューテックスが直列化点となるため、在庫の引当やクーポンの使用は
/// 同時リクエスト下でも原子的に実行される。テストとローカル実行用
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    /// 新しい空のインメモリストアを作成
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn find_by_id(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.products.get(&product_id).cloned())
    }

    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.lock().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| match query.category_id {
                Some(category_id) => p.category_id() == Some(category_id),
                None => true,
            })
            .filter(|p| match query.min_price {
                Some(min) => p.price().amount() >= min,
                None => true,
            })
            .filter(|p| match query.max_price {
                Some(max) => p.price().amount() <= max,
                None => true,
            })
            .cloned()
            .collect();

        match query.order_by.unwrap_or(ProductOrder::CreatedAt) {
            ProductOrder::CreatedAt => products.sort_by_key(|p| p.created_at()),
            ProductOrder::Price => products.sort_by_key(|p| p.price().amount()),
            ProductOrder::Sold => products.sort_by_key(|p| p.sold()),
        }
        if query.descending {
            products.reverse();
        }

        Ok(products)
    }

    async fn search(&self, term: &str) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.lock().await;
        let needle = term.to_lowercase();
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| {
                let category_name = p
                    .category_id()
                    .and_then(|id| state.categories.get(&id))
                    .map(|c| c.name().to_lowercase())
                    .unwrap_or_default();
                p.name().to_lowercase().contains(&needle)
                    || p.description().to_lowercase().contains(&needle)
                    || category_name.contains(&needle)
            })
            .cloned()
            .collect();
        products.sort_by_key(|p| p.created_at());
        Ok(products)
    }

    fn next_identity(&self) -> ProductId {
        ProductId::new()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn save(&self, category: &Category) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.categories.insert(category.id(), category.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        category_id: CategoryId,
    ) -> Result<Option<Category>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.categories.get(&category_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let state = self.state.lock().await;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(categories)
    }

    fn next_identity(&self) -> CategoryId {
        CategoryId::new()
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartAddOutcome, RepositoryError> {
        // ロックの保持中に確認と更新をまとめて行うことで原子性を保証する
        let mut state = self.state.lock().await;

        let product = match state.products.get(&product_id) {
            Some(product) => product,
            None => return Ok(CartAddOutcome::ProductNotFound),
        };

        let quantity_in_cart = state
            .carts
            .get(&user_id)
            .map(|cart| cart.quantity_of(product_id))
            .unwrap_or(0);

        if let Err(err) = authorize_cart_add(product, quantity_in_cart, quantity) {
            return Ok(CartAddOutcome::Rejected(err));
        }

        // カートは最初の追加時に遅延生成する
        let cart = state
            .carts
            .entry(user_id)
            .or_insert_with(|| Cart::new(user_id));
        let line_quantity = match cart.add_line(product_id, quantity) {
            Ok(line_quantity) => line_quantity,
            Err(err) => return Ok(CartAddOutcome::Rejected(err)),
        };

        if let Some(product) = state.products.get_mut(&product_id) {
            if let Err(err) = product.reserve(quantity) {
                return Ok(CartAddOutcome::Rejected(err));
            }
        }

        Ok(CartAddOutcome::Added { line_quantity })
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.carts.get(&user_id).cloned())
    }

    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.carts.insert(cart.user_id(), cart.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn find_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .get(&order_id)
            .filter(|order| order.user_id() == user_id)
            .cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| order.user_id() == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|order| std::cmp::Reverse(order.created_at()));
        Ok(orders)
    }

    async fn exists_for_user(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .any(|order| order.user_id() == user_id))
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}

#[async_trait]
impl CouponRepository for InMemoryStore {
    async fn insert(&self, coupon: &Coupon) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.coupons.contains_key(coupon.code()) {
            return Err(RepositoryError::OperationFailed(format!(
                "クーポンコードが重複しています: {}",
                coupon.code()
            )));
        }
        state.coupons.insert(coupon.code().to_string(), coupon.clone());
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.coupons.get(code).cloned())
    }

    async fn apply_to_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<CouponApplyOutcome, RepositoryError> {
        // ロックの保持中に検証と4つの変更をまとめて行うことで原子性を保証する
        let mut state = self.state.lock().await;

        let order_exists = state
            .orders
            .get(&order_id)
            .map(|order| order.user_id() == user_id)
            .unwrap_or(false);
        if !order_exists {
            return Ok(CouponApplyOutcome::OrderNotFound);
        }

        let coupon = match state.coupons.get_mut(code) {
            Some(coupon) => coupon,
            None => return Ok(CouponApplyOutcome::CouponNotFound),
        };

        if let Err(err) = coupon.redeem(now) {
            return Ok(CouponApplyOutcome::Rejected(err));
        }
        let coupon = coupon.clone();

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| RepositoryError::OperationFailed("注文の取得に失敗しました".to_string()))?;
        let new_total = order.apply_coupon(&coupon);

        Ok(CouponApplyOutcome::Applied { new_total })
    }
}

#[async_trait]
impl FavoriteRepository for InMemoryStore {
    async fn insert(&self, favorite: &Favorite) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.favorites.push(favorite.clone());
        Ok(())
    }

    async fn exists(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .favorites
            .iter()
            .any(|f| f.user_id() == user_id && f.product_id() == product_id))
    }

    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        let before = state.favorites.len();
        state
            .favorites
            .retain(|f| !(f.user_id() == user_id && f.product_id() == product_id));
        Ok(state.favorites.len() != before)
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Favorite>, RepositoryError> {
        let state = self.state.lock().await;
        let mut favorites: Vec<Favorite> = state
            .favorites
            .iter()
            .filter(|f| f.user_id() == user_id)
            .cloned()
            .collect();
        favorites.sort_by_key(|f| std::cmp::Reverse(f.created_at()));
        Ok(favorites)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn save(&self, comment: &Comment) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.comments.insert(comment.id(), comment.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        comment_id: CommentId,
    ) -> Result<Option<Comment>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.comments.get(&comment_id).cloned())
    }

    async fn find_published_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let state = self.state.lock().await;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.product_id() == product_id && c.is_published())
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at());
        Ok(comments)
    }

    async fn tally(&self, comment_id: CommentId) -> Result<VoteTally, RepositoryError> {
        let state = self.state.lock().await;
        let mut tally = VoteTally::default();
        for ((_, voted_comment), value) in state.votes.iter() {
            if *voted_comment == comment_id {
                match value {
                    VoteValue::Like => tally.likes += 1,
                    VoteValue::Dislike => tally.dislikes += 1,
                }
            }
        }
        Ok(tally)
    }

    async fn find_vote(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> Result<Option<VoteValue>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.votes.get(&(user_id, comment_id)).copied())
    }

    async fn upsert_vote(
        &self,
        user_id: UserId,
        comment_id: CommentId,
        value: VoteValue,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.votes.insert((user_id, comment_id), value);
        Ok(())
    }

    async fn delete_vote(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.votes.remove(&(user_id, comment_id));
        Ok(())
    }

    fn next_identity(&self) -> CommentId {
        CommentId::new()
    }
}

#[async_trait]
impl SearchHistoryRepository for InMemoryStore {
    async fn record(&self, record: &SearchRecord) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.searches.push(record.clone());
        Ok(())
    }

    async fn recent_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<SearchRecord>, RepositoryError> {
        let state = self.state.lock().await;
        let mut records: Vec<SearchRecord> = state
            .searches
            .iter()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn hot_terms(&self, limit: u32) -> Result<Vec<HotTerm>, RepositoryError> {
        let state = self.state.lock().await;
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for record in state.searches.iter() {
            *counts.entry(record.term()).or_insert(0) += 1;
        }
        let mut terms: Vec<HotTerm> = counts
            .into_iter()
            .map(|(term, count)| HotTerm {
                term: term.to_string(),
                count,
            })
            .collect();
        terms.sort_by(|a, b| b.count.cmp(&a.count).then(a.term.cmp(&b.term)));
        terms.truncate(limit as usize);
        Ok(terms)
    }
}
