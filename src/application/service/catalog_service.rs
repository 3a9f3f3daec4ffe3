use crate::application::error::{ApplicationError, NotFoundEntity};
use crate::domain::model::{
    Category, CategoryId, HotTerm, Money, Principal, Product, ProductId, SearchRecord,
};
use crate::domain::port::{
    CategoryRepository, Logger, ProductQuery, ProductRepository, SearchHistoryRepository,
};
use std::collections::HashMap;
use std::sync::Arc;

/// 関連商品として返す最大件数
const RELATED_PRODUCTS_LIMIT: usize = 10;
/// 検索履歴・人気検索語の取得件数
const SEARCH_LIST_LIMIT: u32 = 10;

/// 商品作成の入力
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: u32,
    pub purchase_limit: Option<u32>,
    pub category_id: Option<CategoryId>,
}

/// カタログアプリケーションサービス
/// 商品・カテゴリの登録と参照、検索と検索履歴の記録を調整する
pub struct CatalogApplicationService {
    product_repository: Arc<dyn ProductRepository>,
    category_repository: Arc<dyn CategoryRepository>,
    search_history_repository: Arc<dyn SearchHistoryRepository>,
    logger: Arc<dyn Logger>,
}

impl CatalogApplicationService {
    /// 新しいカタログアプリケーションサービスを作成
    pub fn new(
        product_repository: Arc<dyn ProductRepository>,
        category_repository: Arc<dyn CategoryRepository>,
        search_history_repository: Arc<dyn SearchHistoryRepository>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            product_repository,
            category_repository,
            search_history_repository,
            logger,
        }
    }

    /// 商品を登録する（管理者専用の操作。権限確認は呼び出し側で行う）
    pub async fn create_product(&self, input: NewProduct) -> Result<Product, ApplicationError> {
        // カテゴリが指定されている場合は存在を確認する
        if let Some(category_id) = input.category_id {
            self.category_repository
                .find_by_id(category_id)
                .await?
                .ok_or(ApplicationError::NotFound(NotFoundEntity::Category))?;
        }

        let product = Product::new(
            self.product_repository.next_identity(),
            input.name,
            input.description,
            Money::jpy(input.price),
            input.stock,
            input.purchase_limit,
            input.category_id,
        )?;
        self.product_repository.save(&product).await?;

        self.logger.info(
            "CatalogApplicationService",
            "商品を登録しました",
            Some(HashMap::from([
                ("product_id".to_string(), product.id().to_string()),
                ("stock".to_string(), product.stock().to_string()),
            ])),
        );

        Ok(product)
    }

    /// 商品の詳細を取得する
    /// 閲覧数を加算し、同じカテゴリの関連商品も合わせて返す
    ///
    /// # Returns
    /// * `Ok((Product, Vec<Product>))` - 商品と関連商品のリスト
    /// * `Err(ApplicationError::NotFound(Product))` - 商品が存在しない
    pub async fn get_product(
        &self,
        product_id: ProductId,
    ) -> Result<(Product, Vec<Product>), ApplicationError> {
        let mut product = self
            .product_repository
            .find_by_id(product_id)
            .await?
            .ok_or(ApplicationError::NotFound(NotFoundEntity::Product))?;

        product.record_view();
        self.product_repository.save(&product).await?;

        // 同じカテゴリの商品を関連商品として返す（自身は除く）
        let related = match product.category_id() {
            Some(category_id) => {
                let query = ProductQuery {
                    category_id: Some(category_id),
                    ..ProductQuery::default()
                };
                self.product_repository
                    .list(&query)
                    .await?
                    .into_iter()
                    .filter(|p| p.id() != product_id)
                    .take(RELATED_PRODUCTS_LIMIT)
                    .collect()
            }
            None => Vec::new(),
        };

        Ok((product, related))
    }

    /// 条件に合致する商品の一覧を取得する
    pub async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, ApplicationError> {
        self.product_repository
            .list(query)
            .await
            .map_err(ApplicationError::from)
    }

    /// 商品を検索する
    /// 認証済みユーザーの場合は検索語を検索履歴に記録する
    pub async fn search_products(
        &self,
        principal: &Principal,
        term: &str,
    ) -> Result<Vec<Product>, ApplicationError> {
        let products = self.product_repository.search(term).await?;

        if let Some(user_id) = principal.user_id() {
            if !term.trim().is_empty() {
                let record = SearchRecord::new(user_id, term.to_string());
                self.search_history_repository.record(&record).await?;
            }
        }

        Ok(products)
    }

    /// ユーザーの直近の検索履歴を取得する
    pub async fn recent_searches(
        &self,
        user_id: crate::domain::model::UserId,
    ) -> Result<Vec<SearchRecord>, ApplicationError> {
        self.search_history_repository
            .recent_for_user(user_id, SEARCH_LIST_LIMIT)
            .await
            .map_err(ApplicationError::from)
    }

    /// 人気検索語を取得する
    pub async fn hot_searches(&self) -> Result<Vec<HotTerm>, ApplicationError> {
        self.search_history_repository
            .hot_terms(SEARCH_LIST_LIMIT)
            .await
            .map_err(ApplicationError::from)
    }

    /// カテゴリを登録する（管理者専用の操作。権限確認は呼び出し側で行う）
    pub async fn create_category(
        &self,
        name: String,
        parent_id: Option<CategoryId>,
    ) -> Result<Category, ApplicationError> {
        // 親カテゴリが指定されている場合は存在を確認する
        if let Some(parent) = parent_id {
            self.category_repository
                .find_by_id(parent)
                .await?
                .ok_or(ApplicationError::NotFound(NotFoundEntity::Category))?;
        }

        let category = Category::new(self.category_repository.next_identity(), name, parent_id)?;
        self.category_repository.save(&category).await?;
        Ok(category)
    }

    /// すべてのカテゴリを取得する
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApplicationError> {
        self.category_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }
}
