use crate::application::error::{ApplicationError, NotFoundEntity};
use crate::domain::model::{Product, ProductId, UserId};
use crate::domain::port::{CartAddOutcome, CartStore, Logger, ProductRepository};
use std::collections::HashMap;
use std::sync::Arc;

/// カートの明細を商品情報つきで解決したビュー
#[derive(Debug, Clone)]
pub struct ResolvedCartLine {
    pub product: Product,
    pub quantity: u32,
}

/// カートアプリケーションサービス
/// カートへの追加・削除・取得を調整する
pub struct CartApplicationService {
    cart_store: Arc<dyn CartStore>,
    product_repository: Arc<dyn ProductRepository>,
    logger: Arc<dyn Logger>,
}

impl CartApplicationService {
    /// 新しいカートアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `cart_store` - カートストア
    /// * `product_repository` - 商品リポジトリ
    /// * `logger` - ロガー
    pub fn new(
        cart_store: Arc<dyn CartStore>,
        product_repository: Arc<dyn ProductRepository>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            cart_store,
            product_repository,
            logger,
        }
    }

    /// 商品をカートに追加する
    ///
    /// 追加に成功すると商品在庫はその場で引き当てられる（減算される）。
    /// カートから削除しても在庫は戻らない
    ///
    /// # Arguments
    /// * `user_id` - ユーザーID
    /// * `product_id` - 商品ID
    /// * `quantity` - 追加数量（1以上）
    ///
    /// # Returns
    /// * `Ok(u32)` - 追加後の明細数量
    /// * `Err(ApplicationError)` - 商品不存在またはビジネスルール違反
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<u32, ApplicationError> {
        let outcome = self
            .cart_store
            .add_item(user_id, product_id, quantity)
            .await?;

        match outcome {
            CartAddOutcome::Added { line_quantity } => {
                self.logger.info(
                    "CartApplicationService",
                    "商品をカートに追加しました",
                    Some(HashMap::from([
                        ("user_id".to_string(), user_id.to_string()),
                        ("product_id".to_string(), product_id.to_string()),
                        ("quantity".to_string(), quantity.to_string()),
                    ])),
                );
                Ok(line_quantity)
            }
            CartAddOutcome::ProductNotFound => {
                Err(ApplicationError::NotFound(NotFoundEntity::Product))
            }
            CartAddOutcome::Rejected(err) => Err(ApplicationError::Domain(err)),
        }
    }

    /// 商品をカートから削除する
    ///
    /// 明細を削除するだけで、引き当て済みの在庫は戻さない
    ///
    /// # Returns
    /// * `Ok(())` - 削除成功
    /// * `Err(ApplicationError::NotFound(Cart))` - カートが存在しない
    /// * `Err(ApplicationError::NotFound(CartItem))` - 明細が存在しない
    pub async fn remove_from_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ApplicationError> {
        let mut cart = self
            .cart_store
            .find_by_user(user_id)
            .await?
            .ok_or(ApplicationError::NotFound(NotFoundEntity::Cart))?;

        if !cart.remove_line(product_id) {
            return Err(ApplicationError::NotFound(NotFoundEntity::CartItem));
        }

        self.cart_store.save(&cart).await?;

        self.logger.info(
            "CartApplicationService",
            "商品をカートから削除しました",
            Some(HashMap::from([
                ("user_id".to_string(), user_id.to_string()),
                ("product_id".to_string(), product_id.to_string()),
            ])),
        );

        Ok(())
    }

    /// ユーザーのカートを商品情報つきで取得する
    ///
    /// # Returns
    /// * `Ok(Vec<ResolvedCartLine>)` - 明細のリスト
    /// * `Err(ApplicationError::NotFound(Cart))` - カートが存在しない
    pub async fn get_cart(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ResolvedCartLine>, ApplicationError> {
        let cart = self
            .cart_store
            .find_by_user(user_id)
            .await?
            .ok_or(ApplicationError::NotFound(NotFoundEntity::Cart))?;

        // 各明細を商品情報に解決する
        let mut resolved = Vec::with_capacity(cart.lines().len());
        for line in cart.lines() {
            let product = self
                .product_repository
                .find_by_id(line.product_id())
                .await?
                .ok_or(ApplicationError::NotFound(NotFoundEntity::Product))?;
            resolved.push(ResolvedCartLine {
                product,
                quantity: line.quantity(),
            });
        }

        Ok(resolved)
    }
}
