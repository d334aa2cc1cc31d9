//! Shelter directory use-case service.
//!
//! # Invariants
//! - New shelters start empty and active.
//! - Plain `get` treats a deactivated shelter as absent.

use crate::model::shelter::{Shelter, ShelterId};
use crate::repo::shelter_repo::ShelterRepository;
use crate::repo::RepoResult;

/// Input for registering a shelter.
#[derive(Debug, Clone, PartialEq)]
pub struct ShelterDraft {
    pub name: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub capacity: u32,
}

pub struct ShelterService<R: ShelterRepository> {
    repo: R,
}

impl<R: ShelterRepository> ShelterService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_active(&self) -> RepoResult<Vec<Shelter>> {
        self.repo.list_shelters(false)
    }

    /// Active and deactivated shelters alike.
    pub fn list_all(&self) -> RepoResult<Vec<Shelter>> {
        self.repo.list_shelters(true)
    }

    /// Returns `None` for unknown and for deactivated shelters.
    pub fn get(&self, id: ShelterId) -> RepoResult<Option<Shelter>> {
        self.repo.get_shelter(id, false)
    }

    pub fn get_including_inactive(&self, id: ShelterId) -> RepoResult<Option<Shelter>> {
        self.repo.get_shelter(id, true)
    }

    pub fn exists_active(&self, id: ShelterId) -> RepoResult<bool> {
        self.repo.shelter_exists_active(id)
    }

    /// Registers a shelter with occupancy 0.
    pub fn create(&self, draft: &ShelterDraft) -> RepoResult<Shelter> {
        let mut shelter = Shelter::new(draft.name.trim(), draft.location.trim(), draft.capacity);
        shelter.latitude = draft.latitude;
        shelter.longitude = draft.longitude;
        self.repo.create_shelter(&shelter)?;
        Ok(shelter)
    }

    /// Replaces mutable fields. Occupancy written here bypasses the ledger;
    /// use ledger reconciliation to repair a counter set out of step.
    pub fn update(&self, shelter: &Shelter) -> RepoResult<()> {
        self.repo.update_shelter(shelter)
    }

    /// Soft-deletes the shelter. Its stays are left untouched.
    pub fn deactivate(&self, id: ShelterId) -> RepoResult<()> {
        self.repo.deactivate_shelter(id)
    }
}
