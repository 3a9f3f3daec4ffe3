use crate::domain::error::DomainError;
use crate::domain::model::CategoryId;

/// カテゴリ
/// 親子関係は親カテゴリのIDで表現する。直接の相互参照を持たないため
/// 循環所有は起こらない
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    id: CategoryId,
    name: String,
    parent_id: Option<CategoryId>,
}

impl Category {
    /// 新しいカテゴリを作成
    pub fn new(
        id: CategoryId,
        name: String,
        parent_id: Option<CategoryId>,
    ) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation(
                "カテゴリ名は空にできません".to_string(),
            ));
        }
        Ok(Self {
            id,
            name,
            parent_id,
        })
    }

    /// データベースから取得したデータで再構築
    pub fn reconstruct(id: CategoryId, name: String, parent_id: Option<CategoryId>) -> Self {
        Self {
            id,
            name,
            parent_id,
        }
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_id(&self) -> Option<CategoryId> {
        self.parent_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_creation() {
        let parent = Category::new(CategoryId::new(), "家電".to_string(), None).unwrap();
        let child = Category::new(
            CategoryId::new(),
            "キッチン家電".to_string(),
            Some(parent.id()),
        )
        .unwrap();
        assert_eq!(child.parent_id(), Some(parent.id()));
    }

    #[test]
    fn test_empty_name_fails() {
        assert!(Category::new(CategoryId::new(), "".to_string(), None).is_err());
    }
}
