//! Shelter directory repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and soft-delete APIs over `shelters`.
//! - Expose the conditional occupancy update used inside ledger
//!   transactions.
//!
//! # Invariants
//! - Default reads exclude inactive shelters.
//! - Occupancy only moves through a conditional update that re-checks
//!   bounds in the same statement.

use super::{
    bool_to_int, check_schema, parse_bool, parse_uuid, RepoError, RepoResult,
};
use crate::model::shelter::{Shelter, ShelterId};
use rusqlite::{params, Connection, Row};

const SHELTER_SELECT_SQL: &str = "SELECT
    id,
    name,
    location,
    latitude,
    longitude,
    capacity,
    occupancy,
    created_at,
    is_active
FROM shelters";

const SHELTER_COLUMNS: &[&str] = &[
    "id",
    "name",
    "location",
    "latitude",
    "longitude",
    "capacity",
    "occupancy",
    "created_at",
    "is_active",
];

/// Repository interface for the shelter directory.
pub trait ShelterRepository {
    fn create_shelter(&self, shelter: &Shelter) -> RepoResult<ShelterId>;
    /// Replaces every mutable field, including occupancy and active flag.
    fn update_shelter(&self, shelter: &Shelter) -> RepoResult<()>;
    fn get_shelter(&self, id: ShelterId, include_inactive: bool) -> RepoResult<Option<Shelter>>;
    fn list_shelters(&self, include_inactive: bool) -> RepoResult<Vec<Shelter>>;
    fn shelter_exists_active(&self, id: ShelterId) -> RepoResult<bool>;
    fn deactivate_shelter(&self, id: ShelterId) -> RepoResult<()>;
}

/// SQLite-backed shelter repository.
pub struct SqliteShelterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteShelterRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if let Some(problem) = check_schema(conn, &[("shelters", SHELTER_COLUMNS)])? {
            return Err(problem.into());
        }
        Ok(Self { conn })
    }
}

impl ShelterRepository for SqliteShelterRepository<'_> {
    fn create_shelter(&self, shelter: &Shelter) -> RepoResult<ShelterId> {
        shelter.validate()?;

        self.conn.execute(
            "INSERT INTO shelters (
                id,
                name,
                location,
                latitude,
                longitude,
                capacity,
                occupancy,
                created_at,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                shelter.id.to_string(),
                shelter.name.as_str(),
                shelter.location.as_str(),
                shelter.latitude,
                shelter.longitude,
                shelter.capacity,
                shelter.occupancy,
                shelter.created_at,
                bool_to_int(shelter.is_active),
            ],
        )?;

        Ok(shelter.id)
    }

    fn update_shelter(&self, shelter: &Shelter) -> RepoResult<()> {
        shelter.validate()?;

        let changed = self.conn.execute(
            "UPDATE shelters
             SET
                name = ?2,
                location = ?3,
                latitude = ?4,
                longitude = ?5,
                capacity = ?6,
                occupancy = ?7,
                is_active = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                shelter.id.to_string(),
                shelter.name.as_str(),
                shelter.location.as_str(),
                shelter.latitude,
                shelter.longitude,
                shelter.capacity,
                shelter.occupancy,
                bool_to_int(shelter.is_active),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "shelter",
                id: shelter.id,
            });
        }

        Ok(())
    }

    fn get_shelter(&self, id: ShelterId, include_inactive: bool) -> RepoResult<Option<Shelter>> {
        load_shelter(self.conn, id, include_inactive)
    }

    fn list_shelters(&self, include_inactive: bool) -> RepoResult<Vec<Shelter>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SHELTER_SELECT_SQL}
             WHERE (?1 = 1 OR is_active = 1)
             ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(include_inactive)])?;
        let mut shelters = Vec::new();
        while let Some(row) = rows.next()? {
            shelters.push(parse_shelter_row(row)?);
        }
        Ok(shelters)
    }

    fn shelter_exists_active(&self, id: ShelterId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM shelters WHERE id = ?1 AND is_active = 1
            );",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn deactivate_shelter(&self, id: ShelterId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE shelters
             SET
                is_active = 0,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "shelter",
                id,
            });
        }

        Ok(())
    }
}

/// Loads one shelter on any connection or open transaction.
pub(crate) fn load_shelter(
    conn: &Connection,
    id: ShelterId,
    include_inactive: bool,
) -> RepoResult<Option<Shelter>> {
    let mut stmt = conn.prepare(&format!(
        "{SHELTER_SELECT_SQL}
         WHERE id = ?1
           AND (?2 = 1 OR is_active = 1);"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_inactive)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_shelter_row(row)?));
    }
    Ok(None)
}

/// Moves the occupancy counter by `delta` only if the result stays within
/// `0..=capacity`. Increments additionally require the shelter be active.
///
/// Returns `false` when no row satisfied the condition.
pub(crate) fn try_adjust_occupancy(
    conn: &Connection,
    id: ShelterId,
    delta: i64,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE shelters
         SET
            occupancy = occupancy + ?2,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1
           AND occupancy + ?2 >= 0
           AND occupancy + ?2 <= capacity
           AND (?2 <= 0 OR is_active = 1);",
        params![id.to_string(), delta],
    )?;
    Ok(changed == 1)
}

fn parse_shelter_row(row: &Row<'_>) -> RepoResult<Shelter> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "shelters.id").map_err(RepoError::InvalidData)?;
    let is_active =
        parse_bool(row.get("is_active")?, "shelters.is_active").map_err(RepoError::InvalidData)?;

    let shelter = Shelter {
        id,
        name: row.get("name")?,
        location: row.get("location")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        capacity: row.get("capacity")?,
        occupancy: row.get("occupancy")?,
        created_at: row.get("created_at")?,
        is_active,
    };
    shelter
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("shelter {id}: {err}")))?;
    Ok(shelter)
}
