//! Occupancy ledger use-case service.
//!
//! # Responsibility
//! - Expose check-in, check-out and stay queries to front ends.
//! - Translate repository failures into ledger-level errors.
//! - Emit one metadata-only log event per mutating call.
//!
//! # Invariants
//! - Check-in and check-out timestamps come from the wall clock at call time.
//! - Nothing is retried; a rejected call leaves storage untouched.

use crate::model::now_epoch_ms;
use crate::model::occupancy::{
    OccupancyReconciliation, OccupancyRecord, OccupancyRecordId, OccupancyView,
};
use crate::model::person::PersonId;
use crate::model::shelter::ShelterId;
use crate::model::ValidationError;
use crate::repo::occupancy_repo::{LedgerRepoError, OccupancyRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from occupancy ledger operations.
#[derive(Debug)]
pub enum LedgerError {
    /// Shelter does not exist or is deactivated.
    ShelterNotFound(ShelterId),
    PersonNotFound(PersonId),
    RecordNotFound(OccupancyRecordId),
    CapacityExceeded {
        shelter_id: ShelterId,
        capacity: u32,
        occupancy: u32,
    },
    DuplicateActiveRegistration {
        person_id: PersonId,
        active_record_id: Option<OccupancyRecordId>,
    },
    AlreadyCheckedOut(OccupancyRecordId),
    Validation(ValidationError),
    /// Stored counter disagrees with active stays; run reconciliation.
    Inconsistent(ShelterId),
    /// Storage-level failure.
    Repo(LedgerRepoError),
}

impl LedgerError {
    /// Stable snake_case code used in log events and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ShelterNotFound(_) => "shelter_not_found",
            Self::PersonNotFound(_) => "person_not_found",
            Self::RecordNotFound(_) => "record_not_found",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::DuplicateActiveRegistration { .. } => "duplicate_active_registration",
            Self::AlreadyCheckedOut(_) => "already_checked_out",
            Self::Validation(_) => "validation_error",
            Self::Inconsistent(_) => "occupancy_inconsistent",
            Self::Repo(_) => "storage_error",
        }
    }
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShelterNotFound(id) => write!(f, "shelter not found: {id}"),
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::RecordNotFound(id) => write!(f, "occupancy record not found: {id}"),
            Self::CapacityExceeded {
                shelter_id,
                capacity,
                occupancy,
            } => write!(
                f,
                "shelter {shelter_id} has no free capacity ({occupancy}/{capacity})"
            ),
            Self::DuplicateActiveRegistration { person_id, .. } => {
                write!(f, "person {person_id} is already checked in")
            }
            Self::AlreadyCheckedOut(id) => write!(f, "occupancy record already checked out: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Inconsistent(id) => write!(
                f,
                "occupancy counter of shelter {id} is inconsistent; reconcile it"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LedgerRepoError> for LedgerError {
    fn from(value: LedgerRepoError) -> Self {
        match value {
            LedgerRepoError::ShelterNotFound(id) => Self::ShelterNotFound(id),
            LedgerRepoError::PersonNotFound(id) => Self::PersonNotFound(id),
            LedgerRepoError::RecordNotFound(id) => Self::RecordNotFound(id),
            LedgerRepoError::CapacityExceeded {
                shelter_id,
                capacity,
                occupancy,
            } => Self::CapacityExceeded {
                shelter_id,
                capacity,
                occupancy,
            },
            LedgerRepoError::DuplicateActiveRegistration {
                person_id,
                active_record_id,
            } => Self::DuplicateActiveRegistration {
                person_id,
                active_record_id,
            },
            LedgerRepoError::AlreadyCheckedOut(id) => Self::AlreadyCheckedOut(id),
            LedgerRepoError::OccupancyDrift(id) => Self::Inconsistent(id),
            LedgerRepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Occupancy ledger facade.
pub struct LedgerService<R: OccupancyRepository> {
    repo: R,
}

impl<R: OccupancyRepository> LedgerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Houses `person_id` at `shelter_id`.
    ///
    /// # Errors
    /// Checked in this order: `ShelterNotFound`, `PersonNotFound`,
    /// `CapacityExceeded`, `DuplicateActiveRegistration`.
    pub fn check_in(
        &self,
        shelter_id: ShelterId,
        person_id: PersonId,
    ) -> LedgerResult<OccupancyRecord> {
        let started_at = Instant::now();
        let result = self
            .repo
            .check_in(shelter_id, person_id, now_epoch_ms())
            .map_err(LedgerError::from);

        match &result {
            Ok(record) => info!(
                "event=check_in module=ledger status=ok shelter_id={} record_id={} duration_ms={}",
                shelter_id,
                record.id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_rejection("check_in", &shelter_id.to_string(), err, started_at),
        }
        result
    }

    /// Ends an active stay and frees its bed.
    ///
    /// # Errors
    /// `RecordNotFound` or `AlreadyCheckedOut`; a second call on the same
    /// record never decrements the counter again.
    pub fn check_out(&self, record_id: OccupancyRecordId) -> LedgerResult<OccupancyRecord> {
        let started_at = Instant::now();
        let result = self
            .repo
            .check_out(record_id, now_epoch_ms())
            .map_err(LedgerError::from);

        match &result {
            Ok(record) => info!(
                "event=check_out module=ledger status=ok shelter_id={} record_id={} duration_ms={}",
                record.shelter_id,
                record_id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_rejection("check_out", &record_id.to_string(), err, started_at),
        }
        result
    }

    pub fn get_record(&self, record_id: OccupancyRecordId) -> LedgerResult<OccupancyView> {
        self.repo
            .get_record(record_id)?
            .ok_or(LedgerError::RecordNotFound(record_id))
    }

    pub fn list_records(&self) -> LedgerResult<Vec<OccupancyView>> {
        self.repo.list_records().map_err(Into::into)
    }

    pub fn list_active_by_shelter(
        &self,
        shelter_id: ShelterId,
    ) -> LedgerResult<Vec<OccupancyView>> {
        self.repo
            .list_active_by_shelter(shelter_id)
            .map_err(Into::into)
    }

    pub fn list_by_person(&self, person_id: PersonId) -> LedgerResult<Vec<OccupancyView>> {
        self.repo.list_by_person(person_id).map_err(Into::into)
    }

    /// Administrative removal of a stay record.
    pub fn delete_record(&self, record_id: OccupancyRecordId) -> LedgerResult<OccupancyRecord> {
        let started_at = Instant::now();
        let result = self.repo.delete_record(record_id).map_err(LedgerError::from);
        match &result {
            Ok(record) => info!(
                "event=delete_record module=ledger status=ok shelter_id={} record_id={} was_active={} duration_ms={}",
                record.shelter_id,
                record_id,
                record.is_active(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_rejection("delete_record", &record_id.to_string(), err, started_at),
        }
        result
    }

    /// Resets the shelter counter to its number of active stays.
    pub fn reconcile_occupancy(
        &self,
        shelter_id: ShelterId,
    ) -> LedgerResult<OccupancyReconciliation> {
        let reconciliation = self.repo.reconcile_occupancy(shelter_id)?;
        if reconciliation.drifted() {
            warn!(
                "event=reconcile_occupancy module=ledger status=repaired shelter_id={} previous={} current={}",
                shelter_id, reconciliation.previous, reconciliation.current
            );
        } else {
            info!(
                "event=reconcile_occupancy module=ledger status=ok shelter_id={} current={}",
                shelter_id, reconciliation.current
            );
        }
        Ok(reconciliation)
    }
}

fn log_rejection(event: &str, subject_id: &str, err: &LedgerError, started_at: Instant) {
    let duration_ms = started_at.elapsed().as_millis();
    match err {
        LedgerError::Repo(_) | LedgerError::Inconsistent(_) => warn!(
            "event={event} module=ledger status=error subject_id={subject_id} error_code={} duration_ms={duration_ms} error={err}",
            err.code()
        ),
        _ => info!(
            "event={event} module=ledger status=rejected subject_id={subject_id} reason={} duration_ms={duration_ms}",
            err.code()
        ),
    }
}
