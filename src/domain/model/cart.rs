use crate::domain::error::DomainError;
use crate::domain::model::{CartLine, ProductId, UserId};

/// カート集約
/// 1ユーザーにつき1つ、最初の追加時に遅延生成される。
/// 同じ商品の明細は高々1つで、追加のたびに数量が加算される
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    user_id: UserId,
    lines: Vec<CartLine>,
}

impl Cart {
    /// 新しい空のカートを作成
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
        }
    }

    /// データベースから取得したデータでカートを再構築
    /// リポジトリでの使用を想定
    pub fn reconstruct(user_id: UserId, lines: Vec<CartLine>) -> Self {
        Self { user_id, lines }
    }

    /// 所有ユーザーのIDを取得
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// カート明細のリストを取得
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// カートが空かどうか
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 指定された商品の明細数量を取得（明細がなければ0）
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product_id() == product_id)
            .map(|line| line.quantity())
            .unwrap_or(0)
    }

    /// 商品をカートに追加する
    /// 既存の明細があれば数量を加算し、なければ指定数量で新規作成する
    ///
    /// # Returns
    /// * `Ok(u32)` - 追加後の明細数量
    /// * `Err(DomainError::InvalidQuantity)` - 数量が0
    pub fn add_line(&mut self, product_id: ProductId, quantity: u32) -> Result<u32, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }

        // 同じ商品の明細が既に存在するか確認
        if let Some(existing_line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id() == product_id)
        {
            existing_line.increase_quantity(quantity)?;
            Ok(existing_line.quantity())
        } else {
            let line = CartLine::new(product_id, quantity)?;
            let new_quantity = line.quantity();
            self.lines.push(line);
            Ok(new_quantity)
        }
    }

    /// 指定された商品の明細を削除する
    /// 在庫の戻し入れは行わない
    ///
    /// # Returns
    /// * `true` - 明細を削除した
    /// * `false` - 該当する明細がなかった
    pub fn remove_line(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id() != product_id);
        self.lines.len() != before
    }

    /// すべての明細を削除する（注文確定時）
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
