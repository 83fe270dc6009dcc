//! Category directory backed by the `cash_categories` table.

use chrono::Utc;
use moka::future::Cache;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::time::Duration;
use tracing::debug;

use cashbook_core::cash::{CategoryDirectory, DirectoryError};
use cashbook_shared::types::{BranchId, CategoryId};

use crate::entities::cash_categories;

/// Category repository for directory lookups and seeding.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the display name of an active category within a branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_name(
        &self,
        branch_id: BranchId,
        category_id: CategoryId,
    ) -> Result<Option<String>, DbErr> {
        Ok(cash_categories::Entity::find_by_id(category_id.into_inner())
            .filter(cash_categories::Column::BranchId.eq(branch_id.into_inner()))
            .filter(cash_categories::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .map(|c| c.name))
    }

    /// Lists the categories of a branch ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_branch(
        &self,
        branch_id: BranchId,
    ) -> Result<Vec<cash_categories::Model>, DbErr> {
        cash_categories::Entity::find()
            .filter(cash_categories::Column::BranchId.eq(branch_id.into_inner()))
            .order_by_asc(cash_categories::Column::Name)
            .all(&self.db)
            .await
    }

    /// Creates a category. Used by the seeder; the ledger itself never writes here.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g. duplicate name in the branch).
    pub async fn create(
        &self,
        branch_id: BranchId,
        name: &str,
    ) -> Result<cash_categories::Model, DbErr> {
        cash_categories::ActiveModel {
            id: Set(CategoryId::new().into_inner()),
            branch_id: Set(branch_id.into_inner()),
            name: Set(name.to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }
}

/// [`CategoryDirectory`] that caches resolved names in memory.
///
/// Only hits are cached, so a category created after a miss becomes visible
/// on the next lookup.
#[derive(Clone)]
pub struct CachedCategoryDirectory {
    repo: CategoryRepository,
    cache: Cache<(BranchId, CategoryId), String>,
}

impl CachedCategoryDirectory {
    /// Creates a cached directory with the given capacity and TTL.
    #[must_use]
    pub fn new(repo: CategoryRepository, max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();
        Self { repo, cache }
    }
}

impl CategoryDirectory for CachedCategoryDirectory {
    async fn resolve_category_name(
        &self,
        branch_id: BranchId,
        category_id: CategoryId,
    ) -> Result<Option<String>, DirectoryError> {
        let key = (branch_id, category_id);
        if let Some(name) = self.cache.get(&key).await {
            return Ok(Some(name));
        }

        let name = self
            .repo
            .find_name(branch_id, category_id)
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;
        if let Some(name) = &name {
            debug!(category_id = %category_id, "Caching category name");
            self.cache.insert(key, name.clone()).await;
        }
        Ok(name)
    }
}
