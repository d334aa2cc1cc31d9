//! Core domain logic for the shelter occupancy ledger.
//! This crate is the single source of truth for occupancy invariants.

pub mod config;
pub mod db;
pub mod hazard;
pub mod links;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, LedgerConfig};
pub use db::{open_db, open_db_in_memory, open_db_with_timeout, DbError};
pub use hazard::{DisasterFeatures, HazardPredictor, PredictionError, RiskLevel};
pub use links::{record_links, Link};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::alert::{Alert, AlertId, AlertSeverity, AlertStatus};
pub use model::occupancy::{
    OccupancyReconciliation, OccupancyRecord, OccupancyRecordId, OccupancyStatus, OccupancyView,
};
pub use model::person::{Person, PersonId, PersonRole};
pub use model::resource::{Resource, ResourceId};
pub use model::shelter::{Shelter, ShelterId};
pub use model::{ParseEnumError, ValidationError};
pub use repo::alert_repo::{AlertRepository, SqliteAlertRepository};
pub use repo::occupancy_repo::{LedgerRepoError, OccupancyRepository, SqliteOccupancyRepository};
pub use repo::person_repo::{PersonRepository, SqlitePersonRepository};
pub use repo::resource_repo::{ResourceRepository, SqliteResourceRepository};
pub use repo::shelter_repo::{ShelterRepository, SqliteShelterRepository};
pub use repo::{RepoError, RepoResult};
pub use service::alert_service::AlertService;
pub use service::ledger_service::{LedgerError, LedgerResult, LedgerService};
pub use service::person_service::{PersonDraft, PersonService};
pub use service::resource_service::ResourceService;
pub use service::shelter_service::{ShelterDraft, ShelterService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
