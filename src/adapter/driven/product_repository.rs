use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{CategoryId, Money, Product, ProductId};
use crate::domain::port::{ProductOrder, ProductQuery, ProductRepository, RepositoryError};
use async_trait::async_trait;

// MySQL関連のインポート
use sqlx::{MySql, Pool, Row};

/// MySQL商品リポジトリ
/// MySQLデータベースを使用して商品を永続化する
#[derive(Clone)]
pub struct MySqlProductRepository {
    pool: Pool<MySql>,
}

impl MySqlProductRepository {
    /// 新しいMySQL商品リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

/// データベースの行から商品集約を再構築する
pub(crate) fn product_from_row(row: &sqlx::mysql::MySqlRow) -> Result<Product, RepositoryError> {
    let product_id = ProductId::from_string(row.get("id"))
        .map_err(|e| RepositoryError::FetchFailed(format!("商品IDの解析に失敗しました: {}", e)))?;

    let category_id = match row.get::<Option<String>, _>("category_id") {
        Some(category_id) => Some(CategoryId::from_string(&category_id).map_err(|e| {
            RepositoryError::FetchFailed(format!("カテゴリIDの解析に失敗しました: {}", e))
        })?),
        None => None,
    };

    let price = Money::new(
        row.get::<i64, _>("price_amount"),
        row.get::<String, _>("price_currency"),
    )
    .map_err(|e| RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e)))?;

    Ok(Product::reconstruct(
        product_id,
        row.get("name"),
        row.get("description"),
        price,
        row.get::<u32, _>("stock"),
        row.get::<Option<u32>, _>("purchase_limit"),
        category_id,
        row.get::<u32, _>("sold"),
        row.get::<u32, _>("views"),
        row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    ))
}

#[async_trait]
impl ProductRepository for MySqlProductRepository {
    async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        // 商品データをproductsテーブルにUPSERT
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_amount, price_currency, stock, purchase_limit, category_id, sold, views, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                description = VALUES(description),
                price_amount = VALUES(price_amount),
                price_currency = VALUES(price_currency),
                stock = VALUES(stock),
                purchase_limit = VALUES(purchase_limit),
                category_id = VALUES(category_id),
                sold = VALUES(sold),
                views = VALUES(views)
            "#,
        )
        .bind(product.id().to_string())
        .bind(product.name())
        .bind(product.description())
        .bind(product.price().amount())
        .bind(product.price().currency())
        .bind(product.stock())
        .bind(product.purchase_limit())
        .bind(product.category_id().map(|id| id.to_string()))
        .bind(product.sold())
        .bind(product.views())
        .bind(product.created_at().naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("商品の保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price_amount, price_currency, stock, purchase_limit, category_id, sold, views, created_at
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(product_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("商品の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        match row {
            Some(row) => Ok(Some(product_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        // 絞り込み条件に応じてWHERE句を組み立てる（値はすべてバインドする）
        let mut sql = String::from(
            "SELECT id, name, description, price_amount, price_currency, stock, purchase_limit, category_id, sold, views, created_at FROM products WHERE 1 = 1",
        );
        if query.category_id.is_some() {
            sql.push_str(" AND category_id = ?");
        }
        if query.min_price.is_some() {
            sql.push_str(" AND price_amount >= ?");
        }
        if query.max_price.is_some() {
            sql.push_str(" AND price_amount <= ?");
        }

        // 並び順のキーは固定の候補からのみ選ぶ
        let order_column = match query.order_by.unwrap_or(ProductOrder::CreatedAt) {
            ProductOrder::CreatedAt => "created_at",
            ProductOrder::Price => "price_amount",
            ProductOrder::Sold => "sold",
        };
        let direction = if query.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY {} {}", order_column, direction));

        let mut db_query = sqlx::query(&sql);
        if let Some(category_id) = query.category_id {
            db_query = db_query.bind(category_id.to_string());
        }
        if let Some(min_price) = query.min_price {
            db_query = db_query.bind(min_price);
        }
        if let Some(max_price) = query.max_price {
            db_query = db_query.bind(max_price);
        }

        let rows = db_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("商品一覧の取得に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        rows.iter().map(product_from_row).collect()
    }

    async fn search(&self, term: &str) -> Result<Vec<Product>, RepositoryError> {
        let pattern = format!("%{}%", term);
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.description, p.price_amount, p.price_currency, p.stock, p.purchase_limit, p.category_id, p.sold, p.views, p.created_at
            FROM products p
            LEFT JOIN categories c ON p.category_id = c.id
            WHERE p.name LIKE ? OR p.description LIKE ? OR c.name LIKE ?
            ORDER BY p.created_at ASC
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("商品検索に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        rows.iter().map(product_from_row).collect()
    }

    fn next_identity(&self) -> ProductId {
        ProductId::new()
    }
}
