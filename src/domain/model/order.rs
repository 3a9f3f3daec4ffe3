use crate::domain::model::{Coupon, Money, OrderId, UserId};
use chrono::{DateTime, Utc};

/// 注文集約
/// 合計金額と支払い・配送の状態フラグ、適用済みクーポンへの参照を保持する。
/// クーポンの参照は高々1つ
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    total_price: Money,
    is_paid: bool,
    accepted: bool,
    shipped: bool,
    delivered: bool,
    applied_coupon: Option<String>,
    created_at: DateTime<Utc>,
}

impl Order {
    /// 新しい注文を作成
    /// 合計金額は作成時に計算済みの値を受け取り、各フラグはfalseで初期化される
    pub fn new(id: OrderId, user_id: UserId, total_price: Money) -> Self {
        Self {
            id,
            user_id,
            total_price,
            is_paid: false,
            accepted: false,
            shipped: false,
            delivered: false,
            applied_coupon: None,
            created_at: Utc::now(),
        }
    }

    /// データベースから取得したデータで注文を再構築
    /// リポジトリでの使用を想定
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: OrderId,
        user_id: UserId,
        total_price: Money,
        is_paid: bool,
        accepted: bool,
        shipped: bool,
        delivered: bool,
        applied_coupon: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            total_price,
            is_paid,
            accepted,
            shipped,
            delivered,
            applied_coupon,
            created_at,
        }
    }

    /// 注文IDを取得
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// 注文したユーザーのIDを取得
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// 合計金額を取得
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// 支払い済みかどうか
    pub fn is_paid(&self) -> bool {
        self.is_paid
    }

    /// 注文が承認済みかどうか
    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// 発送済みかどうか
    pub fn shipped(&self) -> bool {
        self.shipped
    }

    /// 配達完了かどうか
    pub fn delivered(&self) -> bool {
        self.delivered
    }

    /// 適用済みクーポンのコードを取得
    pub fn applied_coupon(&self) -> Option<&str> {
        self.applied_coupon.as_deref()
    }

    /// 作成日時を取得
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// クーポンを注文に適用し、現在の合計金額から割引後の合計を計算して
    /// 差し替える。適用済みクーポンの有無は確認しないため、再度呼び出すと
    /// その時点の合計に対して改めて割引が計算される
    ///
    /// # Returns
    /// * 割引適用後の合計金額
    pub fn apply_coupon(&mut self, coupon: &Coupon) -> Money {
        let new_total = coupon.discounted_total(self.total_price);
        self.total_price = new_total;
        self.applied_coupon = Some(coupon.code().to_string());
        new_total
    }
}
