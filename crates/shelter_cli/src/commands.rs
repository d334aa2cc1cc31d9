//! Command execution: one request-scoped connection per invocation.

use crate::cli::{
    AlertCommand, AssessArgs, Commands, CreateAlertArgs, CreatePersonArgs, CreateResourceArgs,
    CreateShelterArgs, LedgerCommand, PersonCommand, ResourceCommand, ShelterCommand,
};
use crate::predictor::ProcessPredictor;
use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{json, Value};
use shelter_core::links::{alert_links, resource_links, shelter_links};
use shelter_core::model::now_epoch_ms;
use shelter_core::{
    open_db_with_timeout, record_links, Alert, AlertRepository, AlertService, DisasterFeatures,
    LedgerConfig, LedgerService, Link, OccupancyRecord, OccupancyView, PersonDraft, PersonService,
    Resource, ResourceService, ShelterDraft, ShelterService, SqliteAlertRepository,
    SqliteOccupancyRepository, SqlitePersonRepository, SqliteResourceRepository,
    SqliteShelterRepository,
};

/// Item serialized next to its navigation links.
#[derive(Serialize)]
struct Linked<'a, T: Serialize> {
    #[serde(flatten)]
    item: &'a T,
    links: Vec<Link>,
}

fn linked<T: Serialize>(item: &T, links: Vec<Link>) -> Result<Value> {
    serde_json::to_value(Linked { item, links }).context("failed to encode output")
}

fn linked_all<T: Serialize>(items: &[T], links: impl Fn(&T) -> Vec<Link>) -> Result<Value> {
    items
        .iter()
        .map(|item| linked(item, links(item)))
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn view_links(view: &OccupancyView) -> Vec<Link> {
    record_links(&view.record)
}

fn stay_links(record: &OccupancyRecord) -> Vec<Link> {
    record_links(record)
}

/// Runs `command` against the configured database and returns the JSON
/// document to print.
pub fn execute(config: &LedgerConfig, command: Commands) -> Result<Value> {
    let conn = open_db_with_timeout(&config.database_path, config.busy_timeout())
        .with_context(|| format!("failed to open `{}`", config.database_path.display()))?;

    match command {
        Commands::Shelter(command) => shelter(&conn, command),
        Commands::Person(command) => person(&conn, command),
        Commands::Ledger(command) => ledger(&conn, command),
        Commands::Resource(command) => resource(&conn, config, command),
        Commands::Alert(command) => alert(&conn, command),
    }
}

fn shelter(conn: &Connection, command: ShelterCommand) -> Result<Value> {
    let service = ShelterService::new(SqliteShelterRepository::try_new(conn)?);
    match command {
        ShelterCommand::Create(CreateShelterArgs {
            name,
            location,
            capacity,
            latitude,
            longitude,
        }) => {
            let shelter = service.create(&ShelterDraft {
                name,
                location,
                latitude,
                longitude,
                capacity,
            })?;
            linked(&shelter, shelter_links(&shelter))
        }
        ShelterCommand::List { all } => {
            let shelters = if all {
                service.list_all()?
            } else {
                service.list_active()?
            };
            linked_all(&shelters, shelter_links)
        }
        ShelterCommand::Get {
            id,
            include_inactive,
        } => {
            let shelter = if include_inactive {
                service.get_including_inactive(id)?
            } else {
                service.get(id)?
            };
            let shelter = shelter.ok_or_else(|| anyhow!("shelter not found: {id}"))?;
            linked(&shelter, shelter_links(&shelter))
        }
        ShelterCommand::Deactivate { id } => {
            service.deactivate(id)?;
            Ok(json!({ "id": id, "is_active": false }))
        }
    }
}

fn person(conn: &Connection, command: PersonCommand) -> Result<Value> {
    let service = PersonService::new(SqlitePersonRepository::try_new(conn)?);
    match command {
        PersonCommand::Create(CreatePersonArgs {
            name,
            national_id,
            role,
            email,
            phone,
        }) => {
            let person = service.create(&PersonDraft {
                name,
                national_id,
                role,
                email,
                phone,
            })?;
            Ok(serde_json::to_value(person)?)
        }
        PersonCommand::Get { id } => {
            let person = service
                .get(id)?
                .ok_or_else(|| anyhow!("person not found: {id}"))?;
            Ok(serde_json::to_value(person)?)
        }
        PersonCommand::List { role } => Ok(serde_json::to_value(service.list(role)?)?),
    }
}

fn ledger(conn: &Connection, command: LedgerCommand) -> Result<Value> {
    let service = LedgerService::new(SqliteOccupancyRepository::try_new(conn)?);
    match command {
        LedgerCommand::CheckIn { shelter, person } => {
            let record = service.check_in(shelter, person)?;
            linked(&record, stay_links(&record))
        }
        LedgerCommand::CheckOut { record } => {
            let record = service.check_out(record)?;
            linked(&record, stay_links(&record))
        }
        LedgerCommand::Get { record } => {
            let view = service.get_record(record)?;
            linked(&view, view_links(&view))
        }
        LedgerCommand::List => linked_all(&service.list_records()?, view_links),
        LedgerCommand::Active { shelter } => {
            linked_all(&service.list_active_by_shelter(shelter)?, view_links)
        }
        LedgerCommand::Person { person } => {
            linked_all(&service.list_by_person(person)?, view_links)
        }
        LedgerCommand::Reconcile { shelter } => {
            let reconciliation = service.reconcile_occupancy(shelter)?;
            Ok(json!({
                "shelter_id": reconciliation.shelter_id,
                "previous": reconciliation.previous,
                "current": reconciliation.current,
                "drifted": reconciliation.drifted(),
            }))
        }
        LedgerCommand::Delete { record } => {
            let deleted = service.delete_record(record)?;
            Ok(json!({ "deleted": deleted }))
        }
    }
}

fn resource(
    conn: &Connection,
    config: &LedgerConfig,
    command: ResourceCommand,
) -> Result<Value> {
    let service = ResourceService::with_low_stock_threshold(
        SqliteResourceRepository::try_new(conn)?,
        config.low_stock_threshold,
    );
    match command {
        ResourceCommand::Create(CreateResourceArgs {
            category,
            quantity,
            description,
            unit,
            expires_at,
        }) => {
            let mut resource = Resource::new(category.trim(), quantity);
            resource.description = description;
            resource.expires_at = expires_at;
            if let Some(unit) = unit {
                resource.unit = unit;
            }
            service.create(&resource)?;
            linked(&resource, resource_links(&resource))
        }
        ResourceCommand::List { category } => {
            let resources = match category {
                Some(category) => service.list_by_category(&category)?,
                None => service.list()?,
            };
            linked_all(&resources, resource_links)
        }
        ResourceCommand::Adjust { id, delta } => {
            let quantity = service.adjust_quantity(id, delta)?;
            Ok(json!({ "id": id, "quantity": quantity }))
        }
        ResourceCommand::Delete { id } => {
            service.delete(id)?;
            Ok(json!({ "deleted": id }))
        }
        ResourceCommand::Expired => linked_all(&service.list_expired_now()?, resource_links),
        ResourceCommand::LowStock { threshold } => {
            let resources = match threshold {
                Some(threshold) => service.list_below_threshold(threshold)?,
                None => service.list_low_stock()?,
            };
            linked_all(&resources, resource_links)
        }
    }
}

fn alert(conn: &Connection, command: AlertCommand) -> Result<Value> {
    let service = AlertService::new(SqliteAlertRepository::try_new(conn)?);
    match command {
        AlertCommand::Create(args) => {
            let alert = alert_from_args(args);
            service.create(&alert)?;
            linked(&alert, alert_links(&alert))
        }
        AlertCommand::List { severity, category } => {
            let alerts = match (severity, category) {
                (Some(severity), None) => service.list_by_severity(severity)?,
                (None, Some(category)) => service.list_by_category(&category)?,
                (Some(severity), Some(category)) => service
                    .list_by_severity(severity)?
                    .into_iter()
                    .filter(|alert| alert.category == category.trim())
                    .collect(),
                (None, None) => service.list()?,
            };
            linked_all(&alerts, alert_links)
        }
        AlertCommand::Active => linked_all(&service.list_active()?, alert_links),
        AlertCommand::SetStatus { id, status } => {
            service.set_status(id, status)?;
            Ok(json!({ "id": id, "status": status }))
        }
        AlertCommand::Delete { id } => {
            service.delete(id)?;
            Ok(json!({ "deleted": id }))
        }
        AlertCommand::Assess(args) => assess(&service, args),
    }
}

fn assess<R: AlertRepository>(service: &AlertService<R>, args: AssessArgs) -> Result<Value> {
    let text = std::fs::read_to_string(&args.features)
        .with_context(|| format!("failed to read `{}`", args.features.display()))?;
    let features: DisasterFeatures = serde_json::from_str(&text)
        .with_context(|| format!("invalid features in `{}`", args.features.display()))?;
    let predictor = ProcessPredictor::new(args.predictor, args.predictor_args);
    let risk = service.assess_risk(&predictor, &features)?;
    Ok(json!({ "disaster_kind": features.disaster_kind, "risk": risk }))
}

fn alert_from_args(args: CreateAlertArgs) -> Alert {
    let mut alert = Alert::new(
        args.category.trim(),
        args.severity,
        args.area.trim(),
        args.source.trim(),
        args.starts_at.unwrap_or_else(now_epoch_ms),
    );
    alert.description = args.description;
    alert.latitude = args.latitude;
    alert.longitude = args.longitude;
    alert.radius_km = args.radius_km;
    alert.estimated_end_at = args.estimated_end_at;
    alert
}
