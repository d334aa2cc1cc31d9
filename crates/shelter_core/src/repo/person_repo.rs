//! Person directory repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist person identity records.
//! - Surface unique national id / email collisions as `Conflict`.

use super::{check_schema, is_unique_violation, parse_uuid, RepoError, RepoResult};
use crate::model::person::{Person, PersonId, PersonRole};
use rusqlite::{params, Connection, Row};

const PERSON_SELECT_SQL: &str = "SELECT
    id,
    name,
    national_id,
    role,
    email,
    phone,
    created_at
FROM persons";

const PERSON_COLUMNS: &[&str] = &[
    "id",
    "name",
    "national_id",
    "role",
    "email",
    "phone",
    "created_at",
];

/// Repository interface for the person directory.
pub trait PersonRepository {
    fn create_person(&self, person: &Person) -> RepoResult<PersonId>;
    fn update_person(&self, person: &Person) -> RepoResult<()>;
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    fn get_person_by_national_id(&self, national_id: &str) -> RepoResult<Option<Person>>;
    /// Case-insensitive email lookup.
    fn get_person_by_email(&self, email: &str) -> RepoResult<Option<Person>>;
    fn list_persons(&self, role: Option<PersonRole>) -> RepoResult<Vec<Person>>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if let Some(problem) = check_schema(conn, &[("persons", PERSON_COLUMNS)])? {
            return Err(problem.into());
        }
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, person: &Person) -> RepoResult<PersonId> {
        person.validate()?;

        self.conn
            .execute(
                "INSERT INTO persons (
                    id,
                    name,
                    national_id,
                    role,
                    email,
                    phone,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    person.id.to_string(),
                    person.name.as_str(),
                    person.national_id.as_str(),
                    person.role.as_str(),
                    person.email.as_str(),
                    person.phone.as_deref(),
                    person.created_at,
                ],
            )
            .map_err(map_unique_conflict)?;

        Ok(person.id)
    }

    fn update_person(&self, person: &Person) -> RepoResult<()> {
        person.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE persons
                 SET
                    name = ?2,
                    national_id = ?3,
                    role = ?4,
                    email = ?5,
                    phone = ?6,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    person.id.to_string(),
                    person.name.as_str(),
                    person.national_id.as_str(),
                    person.role.as_str(),
                    person.email.as_str(),
                    person.phone.as_deref(),
                ],
            )
            .map_err(map_unique_conflict)?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "person",
                id: person.id,
            });
        }

        Ok(())
    }

    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        load_person(self.conn, id)
    }

    fn get_person_by_national_id(&self, national_id: &str) -> RepoResult<Option<Person>> {
        query_one(
            self.conn,
            &format!("{PERSON_SELECT_SQL} WHERE national_id = ?1;"),
            national_id,
        )
    }

    fn get_person_by_email(&self, email: &str) -> RepoResult<Option<Person>> {
        query_one(
            self.conn,
            &format!("{PERSON_SELECT_SQL} WHERE email = ?1 COLLATE NOCASE;"),
            email,
        )
    }

    fn list_persons(&self, role: Option<PersonRole>) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERSON_SELECT_SQL}
             WHERE (?1 IS NULL OR role = ?1)
             ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([role.map(PersonRole::as_str)])?;
        let mut persons = Vec::new();
        while let Some(row) = rows.next()? {
            persons.push(parse_person_row(row)?);
        }
        Ok(persons)
    }
}

/// Loads one person on any connection or open transaction.
pub(crate) fn load_person(conn: &Connection, id: PersonId) -> RepoResult<Option<Person>> {
    query_one(
        conn,
        &format!("{PERSON_SELECT_SQL} WHERE id = ?1;"),
        &id.to_string(),
    )
}

fn query_one(conn: &Connection, sql: &str, key: &str) -> RepoResult<Option<Person>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([key])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_person_row(row)?));
    }
    Ok(None)
}

fn map_unique_conflict(err: rusqlite::Error) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::Conflict("national_id or email already registered".to_string());
    }
    err.into()
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "persons.id").map_err(RepoError::InvalidData)?;
    let role_text: String = row.get("role")?;
    let role = role_text
        .parse::<PersonRole>()
        .map_err(|err| RepoError::InvalidData(format!("{err} in persons.role")))?;

    Ok(Person {
        id,
        name: row.get("name")?,
        national_id: row.get("national_id")?,
        role,
        email: row.get("email")?,
        phone: row.get("phone")?,
        created_at: row.get("created_at")?,
    })
}
