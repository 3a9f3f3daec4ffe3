// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::error::DomainError;
use crate::domain::model::{
    Cart, Category, CategoryId, Comment, CommentId, Coupon, Favorite, HotTerm, Money, Order,
    OrderId, Product, ProductId, SearchRecord, UserId, VoteTally, VoteValue,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// ロガートレイト
/// ログ出力を抽象化するポート
pub trait Logger: Send + Sync {
    /// デバッグレベルのログを出力
    fn debug(
        &self,
        component: &str,
        message: &str,
        context: Option<HashMap<String, String>>,
    );

    /// 情報レベルのログを出力
    fn info(
        &self,
        component: &str,
        message: &str,
        context: Option<HashMap<String, String>>,
    );

    /// 警告レベルのログを出力
    fn warn(
        &self,
        component: &str,
        message: &str,
        context: Option<HashMap<String, String>>,
    );

    /// エラーレベルのログを出力
    fn error(
        &self,
        component: &str,
        message: &str,
        context: Option<HashMap<String, String>>,
    );
}

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    ConnectionFailed(String),
    /// 操作に失敗
    OperationFailed(String),
    /// データの取得に失敗
    FetchFailed(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            RepositoryError::OperationFailed(msg) => write!(f, "Operation failed: {}", msg),
            RepositoryError::FetchFailed(msg) => write!(f, "Fetch failed: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// 商品一覧の並び順
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOrder {
    CreatedAt,
    Price,
    Sold,
}

/// 商品一覧の絞り込み条件
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// カテゴリで絞り込む
    pub category_id: Option<CategoryId>,
    /// 価格の下限
    pub min_price: Option<i64>,
    /// 価格の上限
    pub max_price: Option<i64>,
    /// 並び順のキー（省略時は作成日時）
    pub order_by: Option<ProductOrder>,
    /// 降順で並べるか
    pub descending: bool,
}

/// 商品リポジトリトレイト
/// 商品集約の永続化を抽象化する
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 商品を保存する（新規作成・更新の両方に使用する）
    async fn save(&self, product: &Product) -> Result<(), RepositoryError>;

    /// 商品IDで商品を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Product))` - 商品が見つかった
    /// * `Ok(None)` - 商品が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// 条件に合致する商品の一覧を取得する
    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError>;

    /// 商品名・説明・カテゴリ名の部分一致で商品を検索する
    async fn search(&self, term: &str) -> Result<Vec<Product>, RepositoryError>;

    /// 新しい一意の商品IDを生成する
    fn next_identity(&self) -> ProductId;
}

/// カテゴリリポジトリトレイト
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// カテゴリを保存する
    async fn save(&self, category: &Category) -> Result<(), RepositoryError>;

    /// カテゴリIDでカテゴリを検索する
    async fn find_by_id(&self, category_id: CategoryId)
        -> Result<Option<Category>, RepositoryError>;

    /// すべてのカテゴリを取得する
    async fn find_all(&self) -> Result<Vec<Category>, RepositoryError>;

    /// 新しい一意のカテゴリIDを生成する
    fn next_identity(&self) -> CategoryId;
}

/// カート追加の結果
/// 在庫・購入上限の判定はストア側のクリティカルセクション内で行われるため、
/// 判定結果をエラーではなく結果値として返す
#[derive(Debug, Clone, PartialEq)]
pub enum CartAddOutcome {
    /// 追加に成功した（追加後の明細数量を返す）
    Added { line_quantity: u32 },
    /// 商品が存在しない
    ProductNotFound,
    /// ビジネスルール違反で拒否された（在庫切れ・在庫不足・購入上限超過など）
    Rejected(DomainError),
}

/// カートストアトレイト
/// カート集約の永続化と、商品在庫と連動した原子的な追加操作を抽象化する
#[async_trait]
pub trait CartStore: Send + Sync {
    /// 商品をユーザーのカートに追加する
    ///
    /// 在庫確認・購入上限確認・明細の作成または数量加算・在庫の引当を
    /// 1つの不可分な操作として実行する。同一商品への同時追加は
    /// 実装側で直列化され、在庫が負になることはない
    async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartAddOutcome, RepositoryError>;

    /// ユーザーのカートを検索する
    ///
    /// # Returns
    /// * `Ok(Some(Cart))` - カートが見つかった
    /// * `Ok(None)` - カートがまだ作成されていない
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// カートを保存する（明細の削除を含む）
    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError>;
}

/// 注文リポジトリトレイト
/// 注文集約の永続化を抽象化する
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 注文を保存する
    async fn save(&self, order: &Order) -> Result<(), RepositoryError>;

    /// 注文IDとユーザーIDで注文を検索する
    /// 他のユーザーの注文は見つからない扱いとする
    async fn find_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError>;

    /// ユーザーの注文を作成日時の降順で取得する
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// ユーザーに1件でも注文が存在するか
    /// 権限区分の導出（購入履歴の有無）に使用する
    async fn exists_for_user(&self, user_id: UserId) -> Result<bool, RepositoryError>;

    /// 新しい一意の注文IDを生成する
    fn next_identity(&self) -> OrderId;
}

/// クーポン適用の結果
#[derive(Debug, Clone, PartialEq)]
pub enum CouponApplyOutcome {
    /// 適用に成功した（割引後の合計金額を返す）
    Applied { new_total: Money },
    /// 注文が存在しない（または他のユーザーの注文）
    OrderNotFound,
    /// クーポンが存在しない
    CouponNotFound,
    /// クーポンが使用できない（期間外または使用回数上限）
    Rejected(DomainError),
}

/// クーポンリポジトリトレイト
/// クーポンの永続化と、注文と連動した原子的な適用操作を抽象化する
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// クーポンを新規登録する
    async fn insert(&self, coupon: &Coupon) -> Result<(), RepositoryError>;

    /// クーポンコードでクーポンを検索する
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError>;

    /// クーポンを注文に適用する
    ///
    /// 注文の所有確認・クーポンの有効性検証・合計金額の再計算・
    /// クーポンの紐付け・used_countの加算を1つの不可分な操作として
    /// 実行する。同一コードへの同時適用は実装側で直列化され、
    /// used_count が max_usage を超えることはない
    async fn apply_to_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<CouponApplyOutcome, RepositoryError>;
}

/// お気に入りリポジトリトレイト
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// お気に入りを登録する
    async fn insert(&self, favorite: &Favorite) -> Result<(), RepositoryError>;

    /// 登録済みかどうか
    async fn exists(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError>;

    /// お気に入りを削除する
    ///
    /// # Returns
    /// * `Ok(true)` - 削除した
    /// * `Ok(false)` - 該当する登録がなかった
    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError>;

    /// ユーザーのお気に入りを登録日時の降順で取得する
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Favorite>, RepositoryError>;
}

/// コメントリポジトリトレイト
/// コメントと評価の永続化を抽象化する
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// コメントを保存する
    async fn save(&self, comment: &Comment) -> Result<(), RepositoryError>;

    /// コメントIDでコメントを検索する
    async fn find_by_id(&self, comment_id: CommentId)
        -> Result<Option<Comment>, RepositoryError>;

    /// 商品の公開済みコメントを作成日時の昇順で取得する
    async fn find_published_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Comment>, RepositoryError>;

    /// コメントの評価集計を取得する
    async fn tally(&self, comment_id: CommentId) -> Result<VoteTally, RepositoryError>;

    /// ユーザーのコメントへの評価を取得する
    async fn find_vote(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> Result<Option<VoteValue>, RepositoryError>;

    /// 評価を登録または更新する（user_id + comment_id につき1件）
    async fn upsert_vote(
        &self,
        user_id: UserId,
        comment_id: CommentId,
        value: VoteValue,
    ) -> Result<(), RepositoryError>;

    /// 評価を取り消す
    async fn delete_vote(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> Result<(), RepositoryError>;

    /// 新しい一意のコメントIDを生成する
    fn next_identity(&self) -> CommentId;
}

/// 検索履歴リポジトリトレイト
#[async_trait]
pub trait SearchHistoryRepository: Send + Sync {
    /// 検索履歴を記録する
    async fn record(&self, record: &SearchRecord) -> Result<(), RepositoryError>;

    /// ユーザーの直近の検索履歴を新しい順で取得する
    async fn recent_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<SearchRecord>, RepositoryError>;

    /// 全ユーザー横断の人気検索語を出現回数の降順で取得する
    async fn hot_terms(&self, limit: u32) -> Result<Vec<HotTerm>, RepositoryError>;
}
