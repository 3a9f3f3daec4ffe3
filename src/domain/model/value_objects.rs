use crate::domain::error::DomainError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// 商品の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(Uuid);

impl ProductId {
    /// 新しい一意のProductIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから ProductId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からProductIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

/// ユーザーの一意識別子
/// 認証基盤から渡される主体のIDをそのまま保持する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// 新しい一意のUserIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから UserId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からUserIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 注文の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// 新しい一意のOrderIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから OrderId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からOrderIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

/// コメントの一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(Uuid);

impl CommentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for CommentId {
    fn default() -> Self {
        Self::new()
    }
}

/// カテゴリの一意識別子
/// 親子関係は参照ではなくこのIDで表現する（循環所有を避ける）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(Uuid);

impl CategoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

/// 通貨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// 日本円
    #[allow(clippy::upper_case_acronyms)]
    JPY,
}

/// 金額を表す値オブジェクト
/// 最小通貨単位の整数で保持する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// 金額と通貨から作成
    pub fn new(amount: i64, currency: String) -> Result<Self, DomainError> {
        let currency = match currency.as_str() {
            "JPY" => Currency::JPY,
            _ => {
                return Err(DomainError::InvalidValue(format!(
                    "サポートされていない通貨: {}",
                    currency
                )))
            }
        };
        Ok(Self { amount, currency })
    }

    /// 日本円の金額を作成
    pub fn jpy(amount: i64) -> Self {
        Self {
            amount,
            currency: Currency::JPY,
        }
    }

    /// 金額を取得
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// 通貨を文字列として取得
    pub fn currency(&self) -> String {
        match self.currency {
            Currency::JPY => "JPY".to_string(),
        }
    }

    /// 同じ通貨で金額だけ差し替えた値を返す
    pub fn with_amount(&self, amount: i64) -> Money {
        Money {
            amount,
            currency: self.currency,
        }
    }

    /// 金額を加算
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch);
        }
        Ok(Money {
            amount: self.amount + other.amount,
            currency: self.currency,
        })
    }

    /// 金額を乗算
    pub fn multiply(&self, factor: u32) -> Money {
        Money {
            amount: self.amount * factor as i64,
            currency: self.currency,
        }
    }
}

/// 割引率を表す値オブジェクト
/// 0〜100の範囲、小数点以下2桁・有効桁数5桁までを許容する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountPercentage(Decimal);

impl DiscountPercentage {
    /// 割引率を検証して作成
    ///
    /// # Returns
    /// * `Ok(DiscountPercentage)` - 検証成功
    /// * `Err(DomainError::Validation)` - 範囲外または桁数超過
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value.is_sign_negative() || value > Decimal::from(100) {
            return Err(DomainError::Validation(
                "割引率は0から100の範囲である必要があります".to_string(),
            ));
        }
        let normalized = value.normalize();
        if normalized.scale() > 2 {
            return Err(DomainError::Validation(
                "割引率の小数点以下は2桁までです".to_string(),
            ));
        }
        if normalized.mantissa().abs() >= 100_000 {
            return Err(DomainError::Validation(
                "割引率は5桁以内である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 内部のDecimal値を取得
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// 割引後の金額を計算する
    /// 価格単位（整数）へ四捨五入する
    pub fn discounted(&self, total: Money) -> Money {
        let rate = (Decimal::from(100) - self.0) / Decimal::from(100);
        let discounted = (Decimal::from(total.amount()) * rate)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        total.with_amount(discounted.to_i64().unwrap_or(0))
    }
}

impl fmt::Display for DiscountPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// カート明細を表す値オブジェクト
/// 1つのカート内で同じ商品の明細は高々1つ（数量は加算される）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    product_id: ProductId,
    quantity: u32,
}

impl CartLine {
    /// 新しいカート明細を作成
    /// 数量は1以上である必要がある
    pub fn new(product_id: ProductId, quantity: u32) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            product_id,
            quantity,
        })
    }

    /// 商品IDを取得
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// 数量を取得
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// 数量を増加させる（同じ商品を追加する場合）
    pub fn increase_quantity(&mut self, additional_quantity: u32) -> Result<(), DomainError> {
        if additional_quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        self.quantity += additional_quantity;
        Ok(())
    }
}

/// リクエストを発行した主体
/// トークンの検証は上流の認証基盤で完了している前提で、
/// 認証済みかどうかとロールのフラグのみを保持する
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    user_id: Option<UserId>,
    is_staff: bool,
    is_superuser: bool,
}

impl Principal {
    /// 認証済みの主体を作成
    pub fn authenticated(user_id: UserId, is_staff: bool, is_superuser: bool) -> Self {
        Self {
            user_id: Some(user_id),
            is_staff,
            is_superuser,
        }
    }

    /// 匿名の主体を作成
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            is_staff: false,
            is_superuser: false,
        }
    }

    /// ユーザーIDを取得（匿名の場合はNone）
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// 認証済みかどうか
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// スタッフ権限を持つか
    pub fn is_staff(&self) -> bool {
        self.is_staff
    }

    /// スーパーユーザー権限を持つか
    pub fn is_superuser(&self) -> bool {
        self.is_superuser
    }

    /// 管理操作が許可されるか（スタッフまたはスーパーユーザー）
    pub fn is_admin(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_product_id_creation() {
        let id1 = ProductId::new();
        let id2 = ProductId::new();
        assert_ne!(id1, id2, "Each ProductId should be unique");
    }

    #[test]
    fn test_money_addition() {
        let money1 = Money::jpy(1000);
        let money2 = Money::jpy(500);
        let result = money1.add(&money2).unwrap();
        assert_eq!(result.amount(), 1500);
    }

    #[test]
    fn test_money_multiplication() {
        let money = Money::jpy(100);
        let result = money.multiply(5);
        assert_eq!(result.amount(), 500);
    }

    #[test]
    fn test_discount_percentage_valid() {
        let pct = DiscountPercentage::new(Decimal::from_str("10.00").unwrap());
        assert!(pct.is_ok());
    }

    #[test]
    fn test_discount_percentage_out_of_range() {
        assert!(DiscountPercentage::new(Decimal::from_str("-1").unwrap()).is_err());
        assert!(DiscountPercentage::new(Decimal::from_str("100.01").unwrap()).is_err());
    }

    #[test]
    fn test_discount_percentage_too_many_decimal_places() {
        let result = DiscountPercentage::new(Decimal::from_str("10.123").unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_discount_percentage_trailing_zeros_allowed() {
        // "10.100" は正規化すると 10.1 なので許容される
        let result = DiscountPercentage::new(Decimal::from_str("10.100").unwrap());
        assert!(result.is_ok());
    }

    #[test]
    fn test_discounted_total() {
        let pct = DiscountPercentage::new(Decimal::from_str("10.00").unwrap()).unwrap();
        let total = Money::jpy(1000);
        assert_eq!(pct.discounted(total).amount(), 900);
    }

    #[test]
    fn test_discounted_total_rounds_to_price_unit() {
        // 999 * 0.85 = 849.15 → 849
        let pct = DiscountPercentage::new(Decimal::from_str("15").unwrap()).unwrap();
        assert_eq!(pct.discounted(Money::jpy(999)).amount(), 849);
        // 850 * 0.85 = 722.5 → 723（四捨五入）
        assert_eq!(pct.discounted(Money::jpy(850)).amount(), 723);
    }

    #[test]
    fn test_cart_line_creation() {
        let product_id = ProductId::new();
        let line = CartLine::new(product_id, 2).unwrap();
        assert_eq!(line.quantity(), 2);
        assert_eq!(line.product_id(), product_id);
    }

    #[test]
    fn test_cart_line_invalid_quantity() {
        let product_id = ProductId::new();
        let result = CartLine::new(product_id, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_cart_line_increase_quantity() {
        let product_id = ProductId::new();
        let mut line = CartLine::new(product_id, 2).unwrap();
        line.increase_quantity(3).unwrap();
        assert_eq!(line.quantity(), 5);
    }

    #[test]
    fn test_principal_anonymous() {
        let principal = Principal::anonymous();
        assert!(!principal.is_authenticated());
        assert!(!principal.is_admin());
        assert!(principal.user_id().is_none());
    }

    #[test]
    fn test_principal_admin() {
        let staff = Principal::authenticated(UserId::new(), true, false);
        let superuser = Principal::authenticated(UserId::new(), false, true);
        let regular = Principal::authenticated(UserId::new(), false, false);
        assert!(staff.is_admin());
        assert!(superuser.is_admin());
        assert!(!regular.is_admin());
    }
}
