//! Resource inventory repository contracts and SQLite implementation.

use super::{check_schema, parse_uuid, RepoError, RepoResult};
use crate::model::resource::{Resource, ResourceId};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql, Transaction, TransactionBehavior};

const RESOURCE_SELECT_SQL: &str = "SELECT
    id,
    category,
    description,
    quantity,
    expires_at,
    unit
FROM resources";

const RESOURCE_ORDER_SQL: &str = "ORDER BY category ASC, id ASC";

const RESOURCE_COLUMNS: &[&str] = &[
    "id",
    "category",
    "description",
    "quantity",
    "expires_at",
    "unit",
];

/// Repository interface for consumable relief resources.
pub trait ResourceRepository {
    fn create_resource(&self, resource: &Resource) -> RepoResult<ResourceId>;
    fn update_resource(&self, resource: &Resource) -> RepoResult<()>;
    fn get_resource(&self, id: ResourceId) -> RepoResult<Option<Resource>>;
    fn list_resources(&self) -> RepoResult<Vec<Resource>>;
    fn list_resources_by_category(&self, category: &str) -> RepoResult<Vec<Resource>>;
    /// Resources whose expiry is strictly before `now`.
    fn list_expired_resources(&self, now: i64) -> RepoResult<Vec<Resource>>;
    /// Resources with `quantity <= threshold`.
    fn list_resources_below(&self, threshold: i64) -> RepoResult<Vec<Resource>>;
    fn delete_resource(&self, id: ResourceId) -> RepoResult<()>;
    /// Applies `quantity += delta` atomically and returns the new quantity.
    fn adjust_quantity(&self, id: ResourceId, delta: i64) -> RepoResult<i64>;
}

/// SQLite-backed resource repository.
pub struct SqliteResourceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteResourceRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if let Some(problem) = check_schema(conn, &[("resources", RESOURCE_COLUMNS)])? {
            return Err(problem.into());
        }
        Ok(Self { conn })
    }

    fn query_resources(&self, sql: &str, params: &[&dyn ToSql]) -> RepoResult<Vec<Resource>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut resources = Vec::new();
        while let Some(row) = rows.next()? {
            resources.push(parse_resource_row(row)?);
        }
        Ok(resources)
    }
}

impl ResourceRepository for SqliteResourceRepository<'_> {
    fn create_resource(&self, resource: &Resource) -> RepoResult<ResourceId> {
        resource.validate()?;

        self.conn.execute(
            "INSERT INTO resources (
                id,
                category,
                description,
                quantity,
                expires_at,
                unit
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                resource.id.to_string(),
                resource.category.as_str(),
                resource.description.as_deref(),
                resource.quantity,
                resource.expires_at,
                resource.unit.as_str(),
            ],
        )?;

        Ok(resource.id)
    }

    fn update_resource(&self, resource: &Resource) -> RepoResult<()> {
        resource.validate()?;

        let changed = self.conn.execute(
            "UPDATE resources
             SET
                category = ?2,
                description = ?3,
                quantity = ?4,
                expires_at = ?5,
                unit = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                resource.id.to_string(),
                resource.category.as_str(),
                resource.description.as_deref(),
                resource.quantity,
                resource.expires_at,
                resource.unit.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "resource",
                id: resource.id,
            });
        }

        Ok(())
    }

    fn get_resource(&self, id: ResourceId) -> RepoResult<Option<Resource>> {
        load_resource(self.conn, id)
    }

    fn list_resources(&self) -> RepoResult<Vec<Resource>> {
        self.query_resources(&format!("{RESOURCE_SELECT_SQL} {RESOURCE_ORDER_SQL};"), &[])
    }

    fn list_resources_by_category(&self, category: &str) -> RepoResult<Vec<Resource>> {
        self.query_resources(
            &format!("{RESOURCE_SELECT_SQL} WHERE category = ?1 {RESOURCE_ORDER_SQL};"),
            &[&category],
        )
    }

    fn list_expired_resources(&self, now: i64) -> RepoResult<Vec<Resource>> {
        self.query_resources(
            &format!(
                "{RESOURCE_SELECT_SQL}
                 WHERE expires_at IS NOT NULL AND expires_at < ?1
                 ORDER BY expires_at ASC, id ASC;"
            ),
            &[&now],
        )
    }

    fn list_resources_below(&self, threshold: i64) -> RepoResult<Vec<Resource>> {
        self.query_resources(
            &format!(
                "{RESOURCE_SELECT_SQL}
                 WHERE quantity <= ?1
                 ORDER BY quantity ASC, id ASC;"
            ),
            &[&threshold],
        )
    }

    fn delete_resource(&self, id: ResourceId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM resources WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "resource",
                id,
            });
        }
        Ok(())
    }

    fn adjust_quantity(&self, id: ResourceId, delta: i64) -> RepoResult<i64> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let resource = load_resource(&tx, id)?.ok_or(RepoError::NotFound {
            entity: "resource",
            id,
        })?;
        let quantity = resource.adjusted_quantity(delta)?;
        tx.execute(
            "UPDATE resources
             SET
                quantity = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), quantity],
        )?;

        tx.commit()?;
        Ok(quantity)
    }
}

fn load_resource(conn: &Connection, id: ResourceId) -> RepoResult<Option<Resource>> {
    let resource = conn
        .query_row(
            &format!("{RESOURCE_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            |row| Ok(parse_resource_row(row)),
        )
        .optional()?;
    resource.transpose()
}

fn parse_resource_row(row: &Row<'_>) -> RepoResult<Resource> {
    let id_text: String = row.get("id")?;
    Ok(Resource {
        id: parse_uuid(&id_text, "resources.id").map_err(RepoError::InvalidData)?,
        category: row.get("category")?,
        description: row.get("description")?,
        quantity: row.get("quantity")?,
        expires_at: row.get("expires_at")?,
        unit: row.get("unit")?,
    })
}
