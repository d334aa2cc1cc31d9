//! Hazard alert repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `set_alert_status` writes the requested status unconditionally.

use super::{check_schema, parse_uuid, RepoError, RepoResult};
use crate::model::alert::{Alert, AlertId, AlertSeverity, AlertStatus};
use rusqlite::{params, Connection, Row, ToSql};

const ALERT_SELECT_SQL: &str = "SELECT
    id,
    category,
    severity,
    area,
    latitude,
    longitude,
    radius_km,
    description,
    source,
    status,
    starts_at,
    estimated_end_at
FROM alerts";

const ALERT_ORDER_SQL: &str = "ORDER BY starts_at DESC, id ASC";

const ALERT_COLUMNS: &[&str] = &[
    "id",
    "category",
    "severity",
    "area",
    "latitude",
    "longitude",
    "radius_km",
    "description",
    "source",
    "status",
    "starts_at",
    "estimated_end_at",
];

/// Repository interface for hazard alerts.
pub trait AlertRepository {
    fn create_alert(&self, alert: &Alert) -> RepoResult<AlertId>;
    fn update_alert(&self, alert: &Alert) -> RepoResult<()>;
    fn get_alert(&self, id: AlertId) -> RepoResult<Option<Alert>>;
    fn list_alerts(&self) -> RepoResult<Vec<Alert>>;
    fn list_alerts_by_category(&self, category: &str) -> RepoResult<Vec<Alert>>;
    fn list_alerts_by_severity(&self, severity: AlertSeverity) -> RepoResult<Vec<Alert>>;
    fn list_alerts_by_status(&self, status: AlertStatus) -> RepoResult<Vec<Alert>>;
    fn set_alert_status(&self, id: AlertId, status: AlertStatus) -> RepoResult<()>;
    fn delete_alert(&self, id: AlertId) -> RepoResult<()>;
}

/// SQLite-backed alert repository.
pub struct SqliteAlertRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAlertRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if let Some(problem) = check_schema(conn, &[("alerts", ALERT_COLUMNS)])? {
            return Err(problem.into());
        }
        Ok(Self { conn })
    }

    fn query_alerts(&self, filter: &str, params: &[&dyn ToSql]) -> RepoResult<Vec<Alert>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ALERT_SELECT_SQL} {filter} {ALERT_ORDER_SQL};"))?;
        let mut rows = stmt.query(params)?;
        let mut alerts = Vec::new();
        while let Some(row) = rows.next()? {
            alerts.push(parse_alert_row(row)?);
        }
        Ok(alerts)
    }
}

impl AlertRepository for SqliteAlertRepository<'_> {
    fn create_alert(&self, alert: &Alert) -> RepoResult<AlertId> {
        alert.validate()?;

        self.conn.execute(
            "INSERT INTO alerts (
                id,
                category,
                severity,
                area,
                latitude,
                longitude,
                radius_km,
                description,
                source,
                status,
                starts_at,
                estimated_end_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                alert.id.to_string(),
                alert.category.as_str(),
                alert.severity.as_str(),
                alert.area.as_str(),
                alert.latitude,
                alert.longitude,
                alert.radius_km,
                alert.description.as_deref(),
                alert.source.as_str(),
                alert.status.as_str(),
                alert.starts_at,
                alert.estimated_end_at,
            ],
        )?;

        Ok(alert.id)
    }

    fn update_alert(&self, alert: &Alert) -> RepoResult<()> {
        alert.validate()?;

        let changed = self.conn.execute(
            "UPDATE alerts
             SET
                category = ?2,
                severity = ?3,
                area = ?4,
                latitude = ?5,
                longitude = ?6,
                radius_km = ?7,
                description = ?8,
                source = ?9,
                status = ?10,
                starts_at = ?11,
                estimated_end_at = ?12,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                alert.id.to_string(),
                alert.category.as_str(),
                alert.severity.as_str(),
                alert.area.as_str(),
                alert.latitude,
                alert.longitude,
                alert.radius_km,
                alert.description.as_deref(),
                alert.source.as_str(),
                alert.status.as_str(),
                alert.starts_at,
                alert.estimated_end_at,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "alert",
                id: alert.id,
            });
        }

        Ok(())
    }

    fn get_alert(&self, id: AlertId) -> RepoResult<Option<Alert>> {
        let mut alerts = self.query_alerts("WHERE id = ?1", &[&id.to_string()])?;
        Ok(alerts.pop())
    }

    fn list_alerts(&self) -> RepoResult<Vec<Alert>> {
        self.query_alerts("", &[])
    }

    fn list_alerts_by_category(&self, category: &str) -> RepoResult<Vec<Alert>> {
        self.query_alerts("WHERE category = ?1", &[&category])
    }

    fn list_alerts_by_severity(&self, severity: AlertSeverity) -> RepoResult<Vec<Alert>> {
        self.query_alerts("WHERE severity = ?1", &[&severity.as_str()])
    }

    fn list_alerts_by_status(&self, status: AlertStatus) -> RepoResult<Vec<Alert>> {
        self.query_alerts("WHERE status = ?1", &[&status.as_str()])
    }

    fn set_alert_status(&self, id: AlertId, status: AlertStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE alerts
             SET
                status = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), status.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "alert", id });
        }
        Ok(())
    }

    fn delete_alert(&self, id: AlertId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM alerts WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "alert", id });
        }
        Ok(())
    }
}

fn parse_alert_row(row: &Row<'_>) -> RepoResult<Alert> {
    let id_text: String = row.get("id")?;
    let severity_text: String = row.get("severity")?;
    let status_text: String = row.get("status")?;

    Ok(Alert {
        id: parse_uuid(&id_text, "alerts.id").map_err(RepoError::InvalidData)?,
        category: row.get("category")?,
        severity: severity_text
            .parse::<AlertSeverity>()
            .map_err(|err| RepoError::InvalidData(format!("{err} in alerts.severity")))?,
        area: row.get("area")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        radius_km: row.get("radius_km")?,
        description: row.get("description")?,
        source: row.get("source")?,
        status: status_text
            .parse::<AlertStatus>()
            .map_err(|err| RepoError::InvalidData(format!("{err} in alerts.status")))?,
        starts_at: row.get("starts_at")?,
        estimated_end_at: row.get("estimated_end_at")?,
    })
}
