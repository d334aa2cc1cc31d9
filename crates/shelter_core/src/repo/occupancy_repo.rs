//! Occupancy ledger repository: stays plus the shelter counter they drive.
//!
//! # Responsibility
//! - Run check-in and check-out as single write transactions that move the
//!   record state and the shelter occupancy counter together.
//! - Provide read-only listings joined with shelter and person names.
//! - Provide administrative delete and counter reconciliation.
//!
//! # Invariants
//! - Every mutating operation opens `BEGIN IMMEDIATE` before its first
//!   precondition read, so concurrent writers on the same database file are
//!   serialized and always re-read committed state.
//! - A failed precondition drops the transaction without commit.
//! - Shelter occupancy equals the number of active stays referencing it.
//! - A person has at most one active stay (partial unique index backs this).

use super::person_repo::load_person;
use super::shelter_repo::{load_shelter, try_adjust_occupancy};
use super::{check_schema, is_unique_violation, parse_uuid, RepoError};
use crate::db::DbError;
use crate::model::occupancy::{
    OccupancyReconciliation, OccupancyRecord, OccupancyRecordId, OccupancyStatus, OccupancyView,
};
use crate::model::person::PersonId;
use crate::model::shelter::ShelterId;
use crate::model::ValidationError;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type LedgerRepoResult<T> = Result<T, LedgerRepoError>;

const RECORD_COLUMNS: &[&str] = &[
    "id",
    "shelter_id",
    "person_id",
    "checked_in_at",
    "checked_out_at",
    "status",
];

const LEDGER_SHELTER_COLUMNS: &[&str] = &["id", "name", "capacity", "occupancy", "is_active"];
const LEDGER_PERSON_COLUMNS: &[&str] = &["id", "name"];

const VIEW_SELECT_SQL: &str = "SELECT
    r.id,
    r.shelter_id,
    r.person_id,
    r.checked_in_at,
    r.checked_out_at,
    r.status,
    s.name AS shelter_name,
    p.name AS person_name
FROM occupancy_records r
JOIN shelters s ON s.id = r.shelter_id
JOIN persons p ON p.id = r.person_id";

const VIEW_ORDER_SQL: &str = "ORDER BY r.checked_in_at DESC, r.id ASC";

/// Errors from occupancy ledger repository operations.
#[derive(Debug)]
pub enum LedgerRepoError {
    Db(DbError),
    /// Shelter does not exist or is deactivated.
    ShelterNotFound(ShelterId),
    PersonNotFound(PersonId),
    RecordNotFound(OccupancyRecordId),
    CapacityExceeded {
        shelter_id: ShelterId,
        capacity: u32,
        occupancy: u32,
    },
    /// Person already has an open stay. `active_record_id` is `None` when
    /// the collision was only detected by the unique index.
    DuplicateActiveRegistration {
        person_id: PersonId,
        active_record_id: Option<OccupancyRecordId>,
    },
    AlreadyCheckedOut(OccupancyRecordId),
    /// Counter could not be decremented for an active stay; the stored
    /// counter no longer matches the active stays.
    OccupancyDrift(ShelterId),
    Validation(ValidationError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
    /// Directory lookup failed for a reason with no ledger meaning.
    Directory(RepoError),
}

impl Display for LedgerRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ShelterNotFound(id) => write!(f, "shelter not found: {id}"),
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::RecordNotFound(id) => write!(f, "occupancy record not found: {id}"),
            Self::CapacityExceeded {
                shelter_id,
                capacity,
                occupancy,
            } => write!(
                f,
                "shelter {shelter_id} is full ({occupancy}/{capacity})"
            ),
            Self::DuplicateActiveRegistration {
                person_id,
                active_record_id: Some(record_id),
            } => write!(
                f,
                "person {person_id} already has active stay {record_id}"
            ),
            Self::DuplicateActiveRegistration {
                person_id,
                active_record_id: None,
            } => write!(f, "person {person_id} already has an active stay"),
            Self::AlreadyCheckedOut(id) => write!(f, "occupancy record already closed: {id}"),
            Self::OccupancyDrift(id) => {
                write!(f, "occupancy counter of shelter {id} disagrees with active stays")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "ledger repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "ledger repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "ledger repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Directory(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LedgerRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Directory(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for LedgerRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LedgerRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for LedgerRepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for LedgerRepoError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::InvalidData(message) => Self::InvalidData(message),
            RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            } => Self::UninitializedConnection {
                expected_version,
                actual_version,
            },
            RepoError::MissingRequiredTable(table) => Self::MissingRequiredTable(table),
            RepoError::MissingRequiredColumn { table, column } => {
                Self::MissingRequiredColumn { table, column }
            }
            other => Self::Directory(other),
        }
    }
}

/// Repository interface for the occupancy ledger.
pub trait OccupancyRepository {
    /// Opens a stay for `person_id` at `shelter_id`, checked in at `at`.
    fn check_in(
        &self,
        shelter_id: ShelterId,
        person_id: PersonId,
        at: i64,
    ) -> LedgerRepoResult<OccupancyRecord>;
    /// Closes an active stay, checked out at `at`.
    fn check_out(&self, record_id: OccupancyRecordId, at: i64)
        -> LedgerRepoResult<OccupancyRecord>;
    fn get_record(&self, record_id: OccupancyRecordId) -> LedgerRepoResult<Option<OccupancyView>>;
    fn list_records(&self) -> LedgerRepoResult<Vec<OccupancyView>>;
    /// Active stays at an active shelter.
    fn list_active_by_shelter(&self, shelter_id: ShelterId)
        -> LedgerRepoResult<Vec<OccupancyView>>;
    /// Every stay, open or closed, of one person.
    fn list_by_person(&self, person_id: PersonId) -> LedgerRepoResult<Vec<OccupancyView>>;
    /// Removes a record; an active record releases its bed in the same
    /// transaction.
    fn delete_record(&self, record_id: OccupancyRecordId) -> LedgerRepoResult<OccupancyRecord>;
    /// Rewrites the shelter counter to the number of active stays.
    fn reconcile_occupancy(&self, shelter_id: ShelterId)
        -> LedgerRepoResult<OccupancyReconciliation>;
}

/// SQLite-backed occupancy ledger.
pub struct SqliteOccupancyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOccupancyRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> LedgerRepoResult<Self> {
        let problem = check_schema(
            conn,
            &[
                ("occupancy_records", RECORD_COLUMNS),
                ("shelters", LEDGER_SHELTER_COLUMNS),
                ("persons", LEDGER_PERSON_COLUMNS),
            ],
        )?;
        if let Some(problem) = problem {
            return Err(RepoError::from(problem).into());
        }
        Ok(Self { conn })
    }

    fn begin_write(&self) -> rusqlite::Result<Transaction<'conn>> {
        Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
    }

    fn begin_read(&self) -> rusqlite::Result<Transaction<'conn>> {
        Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)
    }
}

impl OccupancyRepository for SqliteOccupancyRepository<'_> {
    fn check_in(
        &self,
        shelter_id: ShelterId,
        person_id: PersonId,
        at: i64,
    ) -> LedgerRepoResult<OccupancyRecord> {
        let tx = self.begin_write()?;

        let shelter = load_shelter(&tx, shelter_id, false)?
            .ok_or(LedgerRepoError::ShelterNotFound(shelter_id))?;
        if load_person(&tx, person_id)?.is_none() {
            return Err(LedgerRepoError::PersonNotFound(person_id));
        }
        if shelter.is_full() {
            return Err(LedgerRepoError::CapacityExceeded {
                shelter_id,
                capacity: shelter.capacity,
                occupancy: shelter.occupancy,
            });
        }
        if let Some(active_record_id) = find_active_record_id(&tx, person_id)? {
            return Err(LedgerRepoError::DuplicateActiveRegistration {
                person_id,
                active_record_id: Some(active_record_id),
            });
        }

        let record = OccupancyRecord::open(shelter_id, person_id, at);
        record.validate()?;
        let inserted = tx.execute(
            "INSERT INTO occupancy_records (
                id,
                shelter_id,
                person_id,
                checked_in_at,
                checked_out_at,
                status
            ) VALUES (?1, ?2, ?3, ?4, NULL, ?5);",
            params![
                record.id.to_string(),
                shelter_id.to_string(),
                person_id.to_string(),
                record.checked_in_at,
                record.status.as_str(),
            ],
        );
        if let Err(err) = inserted {
            if is_unique_violation(&err) {
                return Err(LedgerRepoError::DuplicateActiveRegistration {
                    person_id,
                    active_record_id: None,
                });
            }
            return Err(err.into());
        }

        if !try_adjust_occupancy(&tx, shelter_id, 1)? {
            return Err(LedgerRepoError::CapacityExceeded {
                shelter_id,
                capacity: shelter.capacity,
                occupancy: shelter.occupancy,
            });
        }

        tx.commit()?;
        Ok(record)
    }

    fn check_out(
        &self,
        record_id: OccupancyRecordId,
        at: i64,
    ) -> LedgerRepoResult<OccupancyRecord> {
        let tx = self.begin_write()?;

        let mut record =
            load_record(&tx, record_id)?.ok_or(LedgerRepoError::RecordNotFound(record_id))?;
        record
            .close(at)
            .map_err(|closed| LedgerRepoError::AlreadyCheckedOut(closed.0))?;

        let changed = tx.execute(
            "UPDATE occupancy_records
             SET
                status = ?2,
                checked_out_at = ?3
             WHERE id = ?1
               AND status = 'active';",
            params![
                record_id.to_string(),
                OccupancyStatus::Closed.as_str(),
                record.checked_out_at,
            ],
        )?;
        if changed == 0 {
            return Err(LedgerRepoError::AlreadyCheckedOut(record_id));
        }

        if !try_adjust_occupancy(&tx, record.shelter_id, -1)? {
            return Err(LedgerRepoError::OccupancyDrift(record.shelter_id));
        }

        tx.commit()?;
        Ok(record)
    }

    fn get_record(&self, record_id: OccupancyRecordId) -> LedgerRepoResult<Option<OccupancyView>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{VIEW_SELECT_SQL} WHERE r.id = ?1;"))?;
        let mut rows = stmt.query([record_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_view_row(row)?));
        }
        Ok(None)
    }

    fn list_records(&self) -> LedgerRepoResult<Vec<OccupancyView>> {
        query_views(self.conn, &format!("{VIEW_SELECT_SQL} {VIEW_ORDER_SQL};"), None)
    }

    fn list_active_by_shelter(
        &self,
        shelter_id: ShelterId,
    ) -> LedgerRepoResult<Vec<OccupancyView>> {
        let tx = self.begin_read()?;
        if load_shelter(&tx, shelter_id, false)?.is_none() {
            return Err(LedgerRepoError::ShelterNotFound(shelter_id));
        }
        query_views(
            &tx,
            &format!(
                "{VIEW_SELECT_SQL}
                 WHERE r.shelter_id = ?1 AND r.status = 'active'
                 {VIEW_ORDER_SQL};"
            ),
            Some(shelter_id.to_string()),
        )
    }

    fn list_by_person(&self, person_id: PersonId) -> LedgerRepoResult<Vec<OccupancyView>> {
        let tx = self.begin_read()?;
        if load_person(&tx, person_id)?.is_none() {
            return Err(LedgerRepoError::PersonNotFound(person_id));
        }
        query_views(
            &tx,
            &format!(
                "{VIEW_SELECT_SQL}
                 WHERE r.person_id = ?1
                 {VIEW_ORDER_SQL};"
            ),
            Some(person_id.to_string()),
        )
    }

    fn delete_record(&self, record_id: OccupancyRecordId) -> LedgerRepoResult<OccupancyRecord> {
        let tx = self.begin_write()?;

        let record =
            load_record(&tx, record_id)?.ok_or(LedgerRepoError::RecordNotFound(record_id))?;
        tx.execute(
            "DELETE FROM occupancy_records WHERE id = ?1;",
            [record_id.to_string()],
        )?;
        if record.is_active() && !try_adjust_occupancy(&tx, record.shelter_id, -1)? {
            return Err(LedgerRepoError::OccupancyDrift(record.shelter_id));
        }

        tx.commit()?;
        Ok(record)
    }

    fn reconcile_occupancy(
        &self,
        shelter_id: ShelterId,
    ) -> LedgerRepoResult<OccupancyReconciliation> {
        let tx = self.begin_write()?;

        let shelter = load_shelter(&tx, shelter_id, true)?
            .ok_or(LedgerRepoError::ShelterNotFound(shelter_id))?;
        let active: u32 = tx.query_row(
            "SELECT COUNT(*)
             FROM occupancy_records
             WHERE shelter_id = ?1 AND status = 'active';",
            [shelter_id.to_string()],
            |row| row.get(0),
        )?;
        if active > shelter.capacity {
            return Err(LedgerRepoError::CapacityExceeded {
                shelter_id,
                capacity: shelter.capacity,
                occupancy: active,
            });
        }

        if active != shelter.occupancy {
            tx.execute(
                "UPDATE shelters
                 SET
                    occupancy = ?2,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![shelter_id.to_string(), active],
            )?;
        }

        tx.commit()?;
        Ok(OccupancyReconciliation {
            shelter_id,
            previous: shelter.occupancy,
            current: active,
        })
    }
}

fn find_active_record_id(
    conn: &Connection,
    person_id: PersonId,
) -> LedgerRepoResult<Option<OccupancyRecordId>> {
    let id_text: Option<String> = conn
        .query_row(
            "SELECT id
             FROM occupancy_records
             WHERE person_id = ?1 AND status = 'active'
             LIMIT 1;",
            [person_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    id_text
        .map(|value| {
            parse_uuid(&value, "occupancy_records.id").map_err(LedgerRepoError::InvalidData)
        })
        .transpose()
}

fn load_record(
    conn: &Connection,
    record_id: OccupancyRecordId,
) -> LedgerRepoResult<Option<OccupancyRecord>> {
    let mut stmt = conn.prepare(
        "SELECT
            id,
            shelter_id,
            person_id,
            checked_in_at,
            checked_out_at,
            status
         FROM occupancy_records
         WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([record_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_record_row(row)?));
    }
    Ok(None)
}

fn query_views(
    conn: &Connection,
    sql: &str,
    key: Option<String>,
) -> LedgerRepoResult<Vec<OccupancyView>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = match key {
        Some(key) => stmt.query([key])?,
        None => stmt.query([])?,
    };
    let mut views = Vec::new();
    while let Some(row) = rows.next()? {
        views.push(parse_view_row(row)?);
    }
    Ok(views)
}

fn parse_view_row(row: &Row<'_>) -> LedgerRepoResult<OccupancyView> {
    Ok(OccupancyView {
        record: parse_record_row(row)?,
        shelter_name: row.get("shelter_name")?,
        person_name: row.get("person_name")?,
    })
}

fn parse_record_row(row: &Row<'_>) -> LedgerRepoResult<OccupancyRecord> {
    let id_text: String = row.get("id")?;
    let shelter_text: String = row.get("shelter_id")?;
    let person_text: String = row.get("person_id")?;
    let status_text: String = row.get("status")?;

    let status = status_text.parse::<OccupancyStatus>().map_err(|err| {
        LedgerRepoError::InvalidData(format!("{err} in occupancy_records.status"))
    })?;
    let record = OccupancyRecord {
        id: parse_uuid(&id_text, "occupancy_records.id").map_err(LedgerRepoError::InvalidData)?,
        shelter_id: parse_uuid(&shelter_text, "occupancy_records.shelter_id")
            .map_err(LedgerRepoError::InvalidData)?,
        person_id: parse_uuid(&person_text, "occupancy_records.person_id")
            .map_err(LedgerRepoError::InvalidData)?,
        checked_in_at: row.get("checked_in_at")?,
        checked_out_at: row.get("checked_out_at")?,
        status,
    };
    record
        .validate()
        .map_err(|err| LedgerRepoError::InvalidData(format!("record {}: {err}", record.id)))?;
    Ok(record)
}
