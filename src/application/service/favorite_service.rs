use crate::application::error::{ApplicationError, NotFoundEntity};
use crate::domain::error::DomainError;
use crate::domain::model::{Favorite, Product, ProductId, UserId};
use crate::domain::port::{FavoriteRepository, Logger, ProductRepository};
use std::collections::HashMap;
use std::sync::Arc;

/// お気に入りアプリケーションサービス
/// お気に入りの登録・削除・一覧を調整する
pub struct FavoriteApplicationService {
    favorite_repository: Arc<dyn FavoriteRepository>,
    product_repository: Arc<dyn ProductRepository>,
    logger: Arc<dyn Logger>,
}

impl FavoriteApplicationService {
    /// 新しいお気に入りアプリケーションサービスを作成
    pub fn new(
        favorite_repository: Arc<dyn FavoriteRepository>,
        product_repository: Arc<dyn ProductRepository>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            favorite_repository,
            product_repository,
            logger,
        }
    }

    /// 商品をお気に入りに登録する
    ///
    /// # Returns
    /// * `Ok(())` - 登録成功
    /// * `Err(ApplicationError::NotFound(Product))` - 商品が存在しない
    /// * `Err(ApplicationError::Domain(AlreadyFavorited))` - 登録済み
    pub async fn add_favorite(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ApplicationError> {
        self.product_repository
            .find_by_id(product_id)
            .await?
            .ok_or(ApplicationError::NotFound(NotFoundEntity::Product))?;

        if self.favorite_repository.exists(user_id, product_id).await? {
            return Err(ApplicationError::Domain(DomainError::AlreadyFavorited));
        }

        let favorite = Favorite::new(user_id, product_id);
        self.favorite_repository.insert(&favorite).await?;

        self.logger.info(
            "FavoriteApplicationService",
            "商品をお気に入りに登録しました",
            Some(HashMap::from([
                ("user_id".to_string(), user_id.to_string()),
                ("product_id".to_string(), product_id.to_string()),
            ])),
        );

        Ok(())
    }

    /// 商品をお気に入りから削除する
    ///
    /// # Returns
    /// * `Ok(())` - 削除成功
    /// * `Err(ApplicationError::NotFound(Favorite))` - 登録がなかった
    pub async fn remove_favorite(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ApplicationError> {
        let removed = self.favorite_repository.remove(user_id, product_id).await?;
        if !removed {
            return Err(ApplicationError::NotFound(NotFoundEntity::Favorite));
        }
        Ok(())
    }

    /// ユーザーのお気に入りを商品情報つきで取得する
    pub async fn list_favorites(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Favorite, Product)>, ApplicationError> {
        let favorites = self.favorite_repository.find_by_user(user_id).await?;

        let mut result = Vec::with_capacity(favorites.len());
        for favorite in favorites {
            let product = self
                .product_repository
                .find_by_id(favorite.product_id())
                .await?
                .ok_or(ApplicationError::NotFound(NotFoundEntity::Product))?;
            result.push((favorite, product));
        }

        Ok(result)
    }
}
