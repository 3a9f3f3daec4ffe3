use crate::application::error::{ApplicationError, NotFoundEntity};
use crate::domain::error::DomainError;
use crate::domain::model::{Money, Order, UserId};
use crate::domain::port::{CartStore, Logger, OrderRepository, ProductRepository};
use std::collections::HashMap;
use std::sync::Arc;

/// 送料が無料になる金額の下限
const FREE_SHIPPING_THRESHOLD: i64 = 10_000;
/// 通常の送料
const SHIPPING_FEE: i64 = 500;

/// 注文アプリケーションサービス
/// カートからの注文確定（チェックアウト）と注文の参照を調整する
pub struct OrderApplicationService {
    order_repository: Arc<dyn OrderRepository>,
    cart_store: Arc<dyn CartStore>,
    product_repository: Arc<dyn ProductRepository>,
    logger: Arc<dyn Logger>,
}

impl OrderApplicationService {
    /// 新しい注文アプリケーションサービスを作成
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        cart_store: Arc<dyn CartStore>,
        product_repository: Arc<dyn ProductRepository>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            order_repository,
            cart_store,
            product_repository,
            logger,
        }
    }

    /// カートの内容から注文を作成する
    ///
    /// 合計金額 = Σ(明細数量 × 商品価格) + 送料。
    /// 在庫はカート追加時に引き当て済みのため、ここでは変更しない。
    /// 作成後はカートの明細をすべて削除し、各商品の販売数を加算する
    ///
    /// # Returns
    /// * `Ok(Order)` - 作成された注文
    /// * `Err(ApplicationError::NotFound(Cart))` - カートが存在しない
    /// * `Err(ApplicationError::Domain(Validation))` - カートが空
    pub async fn checkout(&self, user_id: UserId) -> Result<Order, ApplicationError> {
        let mut cart = self
            .cart_store
            .find_by_user(user_id)
            .await?
            .ok_or(ApplicationError::NotFound(NotFoundEntity::Cart))?;

        if cart.is_empty() {
            return Err(ApplicationError::Domain(DomainError::Validation(
                "カートが空です".to_string(),
            )));
        }

        // 明細を商品価格に解決して小計を計算する
        let mut subtotal = Money::jpy(0);
        let mut sold_products = Vec::with_capacity(cart.lines().len());
        for line in cart.lines() {
            let product = self
                .product_repository
                .find_by_id(line.product_id())
                .await?
                .ok_or(ApplicationError::NotFound(NotFoundEntity::Product))?;
            subtotal = subtotal.add(&product.price().multiply(line.quantity()))?;
            sold_products.push((product, line.quantity()));
        }

        // 送料の計算（しきい値以上なら無料）
        let shipping_fee = if subtotal.amount() >= FREE_SHIPPING_THRESHOLD {
            Money::jpy(0)
        } else {
            Money::jpy(SHIPPING_FEE)
        };
        let total = subtotal.add(&shipping_fee)?;

        let order = Order::new(self.order_repository.next_identity(), user_id, total);
        self.order_repository.save(&order).await?;

        // 販売数を加算する
        for (mut product, quantity) in sold_products {
            product.increase_sold(quantity);
            self.product_repository.save(&product).await?;
        }

        // カートを空にする
        cart.clear();
        self.cart_store.save(&cart).await?;

        self.logger.info(
            "OrderApplicationService",
            "注文を作成しました",
            Some(HashMap::from([
                ("user_id".to_string(), user_id.to_string()),
                ("order_id".to_string(), order.id().to_string()),
                ("total".to_string(), total.amount().to_string()),
            ])),
        );

        Ok(order)
    }

    /// ユーザーの注文一覧を取得する
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, ApplicationError> {
        self.order_repository
            .find_by_user(user_id)
            .await
            .map_err(ApplicationError::from)
    }
}
