use crate::domain::error::DomainError;
use crate::domain::model::{CategoryId, Money, ProductId};
use chrono::{DateTime, Utc};

/// 商品集約
/// 在庫数と購入上限を管理する。在庫は成功した引当でのみ減少し、
/// カートからの削除では戻らない（楽観的な在庫確保）
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    price: Money,
    stock: u32,
    purchase_limit: Option<u32>,
    category_id: Option<CategoryId>,
    sold: u32,
    views: u32,
    created_at: DateTime<Utc>,
}

impl Product {
    /// 新しい商品を作成
    /// 購入上限が未指定の場合は初期在庫数を上限とする
    ///
    /// # Arguments
    /// * `id` - 商品ID
    /// * `name` - 商品名
    /// * `description` - 商品説明
    /// * `price` - 価格
    /// * `stock` - 初期在庫数
    /// * `purchase_limit` - 1ユーザーあたりの購入上限（任意）
    /// * `category_id` - カテゴリID（任意）
    pub fn new(
        id: ProductId,
        name: String,
        description: String,
        price: Money,
        stock: u32,
        purchase_limit: Option<u32>,
        category_id: Option<CategoryId>,
    ) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation(
                "商品名は空にできません".to_string(),
            ));
        }
        if price.amount() < 0 {
            return Err(DomainError::InvalidValue(
                "価格は0以上である必要があります".to_string(),
            ));
        }
        if let Some(limit) = purchase_limit {
            if limit == 0 {
                return Err(DomainError::Validation(
                    "購入上限は1以上である必要があります".to_string(),
                ));
            }
        }
        Ok(Self {
            id,
            name,
            description,
            price,
            stock,
            // 未指定なら初期在庫を購入上限とする
            purchase_limit: purchase_limit.or(Some(stock)),
            category_id,
            sold: 0,
            views: 1,
            created_at: Utc::now(),
        })
    }

    /// データベースから取得したデータで商品を再構築
    /// リポジトリでの使用を想定
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: ProductId,
        name: String,
        description: String,
        price: Money,
        stock: u32,
        purchase_limit: Option<u32>,
        category_id: Option<CategoryId>,
        sold: u32,
        views: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            price,
            stock,
            purchase_limit,
            category_id,
            sold,
            views,
            created_at,
        }
    }

    /// 商品IDを取得
    pub fn id(&self) -> ProductId {
        self.id
    }

    /// 商品名を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 商品説明を取得
    pub fn description(&self) -> &str {
        &self.description
    }

    /// 価格を取得
    pub fn price(&self) -> Money {
        self.price
    }

    /// 現在の在庫数を取得
    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// 購入上限を取得（未設定の場合はNone）
    pub fn purchase_limit(&self) -> Option<u32> {
        self.purchase_limit
    }

    /// カテゴリIDを取得
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    /// 累計販売数を取得
    pub fn sold(&self) -> u32 {
        self.sold
    }

    /// 閲覧数を取得
    pub fn views(&self) -> u32 {
        self.views
    }

    /// 作成日時を取得
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 在庫切れかどうか
    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    /// 指定された数量の在庫が利用可能かチェック
    pub fn has_available_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }

    /// カート内の既存数量と要求数量の合計が購入上限内に収まるか
    /// 上限が未設定の場合は常にtrue
    pub fn within_purchase_limit(&self, quantity_in_cart: u32, requested: u32) -> bool {
        match self.purchase_limit {
            Some(limit) => quantity_in_cart as u64 + requested as u64 <= limit as u64,
            None => true,
        }
    }

    /// 在庫を引き当てる（カート追加時に減算する）
    ///
    /// # Returns
    /// * `Ok(())` - 引当成功
    /// * `Err(DomainError::InsufficientStock)` - 在庫不足
    pub fn reserve(&mut self, quantity: u32) -> Result<(), DomainError> {
        if !self.has_available_stock(quantity) {
            return Err(DomainError::InsufficientStock {
                available: self.stock,
            });
        }
        self.stock -= quantity;
        Ok(())
    }

    /// 販売数を加算する（注文確定時）
    pub fn increase_sold(&mut self, quantity: u32) {
        self.sold += quantity;
    }

    /// 閲覧数を加算する（商品詳細の取得時）
    pub fn record_view(&mut self) {
        self.views += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product(stock: u32, purchase_limit: Option<u32>) -> Product {
        Product::new(
            ProductId::new(),
            "テスト商品".to_string(),
            "説明".to_string(),
            Money::jpy(1000),
            stock,
            purchase_limit,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_product_creation() {
        let product = sample_product(10, Some(5));
        assert_eq!(product.stock(), 10);
        assert_eq!(product.purchase_limit(), Some(5));
        assert_eq!(product.sold(), 0);
    }

    #[test]
    fn test_purchase_limit_defaults_to_initial_stock() {
        let product = sample_product(10, None);
        assert_eq!(product.purchase_limit(), Some(10));
    }

    #[test]
    fn test_empty_name_fails() {
        let result = Product::new(
            ProductId::new(),
            "  ".to_string(),
            "説明".to_string(),
            Money::jpy(1000),
            10,
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_purchase_limit_fails() {
        let result = Product::new(
            ProductId::new(),
            "テスト商品".to_string(),
            "説明".to_string(),
            Money::jpy(1000),
            10,
            Some(0),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_reserve_success() {
        let mut product = sample_product(10, None);
        let result = product.reserve(4);
        assert!(result.is_ok());
        assert_eq!(product.stock(), 6);
    }

    #[test]
    fn test_reserve_insufficient_stock() {
        let mut product = sample_product(5, None);
        let result = product.reserve(10);
        assert_eq!(
            result.unwrap_err(),
            DomainError::InsufficientStock { available: 5 }
        );
        assert_eq!(product.stock(), 5); // 在庫数は変わらない
    }

    #[test]
    fn test_reserve_exact_quantity() {
        let mut product = sample_product(10, None);
        let result = product.reserve(10);
        assert!(result.is_ok());
        assert_eq!(product.stock(), 0);
        assert!(product.is_out_of_stock());
    }

    #[test]
    fn test_within_purchase_limit_boundary() {
        let product = sample_product(10, Some(5));
        // 境界ちょうどは許容される
        assert!(product.within_purchase_limit(2, 3));
        assert!(!product.within_purchase_limit(3, 3));
    }

    #[test]
    fn test_within_purchase_limit_unlimited() {
        let product = Product::reconstruct(
            ProductId::new(),
            "テスト商品".to_string(),
            String::new(),
            Money::jpy(1000),
            10,
            None,
            None,
            0,
            1,
            Utc::now(),
        );
        assert!(product.within_purchase_limit(1000, 1000));
    }

    #[test]
    fn test_increase_sold_and_record_view() {
        let mut product = sample_product(10, None);
        product.increase_sold(3);
        product.record_view();
        assert_eq!(product.sold(), 3);
        assert_eq!(product.views(), 2);
    }
}
