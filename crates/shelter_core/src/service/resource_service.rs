//! Resource inventory use-case service.
//!
//! Quantities may go negative through adjustment; that is recorded and
//! logged, not rejected.

use crate::config::DEFAULT_LOW_STOCK_THRESHOLD;
use crate::model::now_epoch_ms;
use crate::model::resource::{Resource, ResourceId};
use crate::repo::resource_repo::ResourceRepository;
use crate::repo::RepoResult;
use log::{info, warn};

pub struct ResourceService<R: ResourceRepository> {
    repo: R,
    low_stock_threshold: i64,
}

impl<R: ResourceRepository> ResourceService<R> {
    /// Creates a service using the default low-stock threshold.
    pub fn new(repo: R) -> Self {
        Self::with_low_stock_threshold(repo, DEFAULT_LOW_STOCK_THRESHOLD)
    }

    pub fn with_low_stock_threshold(repo: R, low_stock_threshold: i64) -> Self {
        Self {
            repo,
            low_stock_threshold,
        }
    }

    pub fn create(&self, resource: &Resource) -> RepoResult<ResourceId> {
        self.repo.create_resource(resource)
    }

    pub fn update(&self, resource: &Resource) -> RepoResult<()> {
        self.repo.update_resource(resource)
    }

    pub fn get(&self, id: ResourceId) -> RepoResult<Option<Resource>> {
        self.repo.get_resource(id)
    }

    pub fn list(&self) -> RepoResult<Vec<Resource>> {
        self.repo.list_resources()
    }

    pub fn list_by_category(&self, category: &str) -> RepoResult<Vec<Resource>> {
        self.repo.list_resources_by_category(category.trim())
    }

    /// Resources whose expiry lies strictly before `now`.
    pub fn list_expired(&self, now: i64) -> RepoResult<Vec<Resource>> {
        self.repo.list_expired_resources(now)
    }

    /// [`Self::list_expired`] against the wall clock.
    pub fn list_expired_now(&self) -> RepoResult<Vec<Resource>> {
        self.list_expired(now_epoch_ms())
    }

    /// Resources with `quantity <= threshold`.
    pub fn list_below_threshold(&self, threshold: i64) -> RepoResult<Vec<Resource>> {
        self.repo.list_resources_below(threshold)
    }

    /// [`Self::list_below_threshold`] with the configured threshold.
    pub fn list_low_stock(&self) -> RepoResult<Vec<Resource>> {
        self.list_below_threshold(self.low_stock_threshold)
    }

    pub fn delete(&self, id: ResourceId) -> RepoResult<()> {
        self.repo.delete_resource(id)
    }

    /// Applies a signed delta and returns the resulting quantity.
    pub fn adjust_quantity(&self, id: ResourceId, delta: i64) -> RepoResult<i64> {
        let quantity = self.repo.adjust_quantity(id, delta)?;
        if quantity < 0 {
            warn!(
                "event=adjust_quantity module=inventory status=negative resource_id={} delta={} quantity={}",
                id, delta, quantity
            );
        } else {
            info!(
                "event=adjust_quantity module=inventory status=ok resource_id={} delta={} quantity={}",
                id, delta, quantity
            );
        }
        Ok(quantity)
    }
}
