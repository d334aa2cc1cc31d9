use rusqlite::Connection;
use shelter_core::db::open_db_in_memory;
use shelter_core::{
    LedgerError, LedgerService, OccupancyRepository, OccupancyStatus, Person, PersonDraft,
    PersonRole, PersonService, Shelter, ShelterDraft, ShelterRepository, ShelterService,
    SqliteOccupancyRepository, SqlitePersonRepository, SqliteShelterRepository,
};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

static NEXT_PERSON: AtomicU64 = AtomicU64::new(1);

fn add_shelter(conn: &Connection, capacity: u32) -> Shelter {
    let service = ShelterService::new(SqliteShelterRepository::try_new(conn).unwrap());
    service
        .create(&ShelterDraft {
            name: "Escola Municipal".to_string(),
            location: "Rua das Flores, 12".to_string(),
            latitude: None,
            longitude: None,
            capacity,
        })
        .unwrap()
}

fn add_person(conn: &Connection) -> Person {
    let n = NEXT_PERSON.fetch_add(1, Ordering::Relaxed);
    let service = PersonService::new(SqlitePersonRepository::try_new(conn).unwrap());
    service
        .create(&PersonDraft {
            name: format!("Pessoa {n}"),
            national_id: format!("{n:011}"),
            role: PersonRole::Affected,
            email: format!("pessoa{n}@example.org"),
            phone: None,
        })
        .unwrap()
}

fn occupancy(conn: &Connection, shelter_id: Uuid) -> u32 {
    let repo = SqliteShelterRepository::try_new(conn).unwrap();
    repo.get_shelter(shelter_id, true).unwrap().unwrap().occupancy
}

fn ledger(conn: &Connection) -> LedgerService<SqliteOccupancyRepository<'_>> {
    LedgerService::new(SqliteOccupancyRepository::try_new(conn).unwrap())
}

#[test]
fn full_cycle_sets_status_and_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let shelter = add_shelter(&conn, 2);
    let person = add_person(&conn);
    let service = ledger(&conn);

    let record = service.check_in(shelter.id, person.id).unwrap();
    assert_eq!(record.status, OccupancyStatus::Active);
    assert!(record.checked_out_at.is_none());
    assert_eq!(occupancy(&conn, shelter.id), 1);

    let closed = service.check_out(record.id).unwrap();
    assert_eq!(closed.id, record.id);
    assert_eq!(closed.status, OccupancyStatus::Closed);
    assert_eq!(closed.checked_in_at, record.checked_in_at);
    assert!(closed.checked_out_at.unwrap() >= record.checked_in_at);
    assert_eq!(occupancy(&conn, shelter.id), 0);

    let stored = service.get_record(record.id).unwrap();
    assert_eq!(stored.record, closed);
    assert_eq!(stored.shelter_name, "Escola Municipal");
    assert_eq!(stored.person_name, person.name);
}

#[test]
fn repository_uses_supplied_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let shelter = add_shelter(&conn, 1);
    let person = add_person(&conn);
    let repo = SqliteOccupancyRepository::try_new(&conn).unwrap();

    let record = repo.check_in(shelter.id, person.id, 1_000).unwrap();
    assert_eq!(record.checked_in_at, 1_000);

    let closed = repo.check_out(record.id, 5_000).unwrap();
    assert_eq!(closed.checked_out_at, Some(5_000));
}

#[test]
fn second_check_out_is_rejected_and_decrements_once() {
    let conn = open_db_in_memory().unwrap();
    let shelter = add_shelter(&conn, 3);
    let first = add_person(&conn);
    let second = add_person(&conn);
    let service = ledger(&conn);

    let record = service.check_in(shelter.id, first.id).unwrap();
    service.check_in(shelter.id, second.id).unwrap();
    assert_eq!(occupancy(&conn, shelter.id), 2);

    let closed = service.check_out(record.id).unwrap();
    assert_eq!(occupancy(&conn, shelter.id), 1);

    match service.check_out(record.id).unwrap_err() {
        LedgerError::AlreadyCheckedOut(id) => assert_eq!(id, record.id),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(occupancy(&conn, shelter.id), 1);
    assert_eq!(service.get_record(record.id).unwrap().record, closed);
}

#[test]
fn full_shelter_rejects_check_in_without_side_effects() {
    let conn = open_db_in_memory().unwrap();
    let shelter = add_shelter(&conn, 1);
    let housed = add_person(&conn);
    let waiting = add_person(&conn);
    let service = ledger(&conn);

    service.check_in(shelter.id, housed.id).unwrap();
    match service.check_in(shelter.id, waiting.id).unwrap_err() {
        LedgerError::CapacityExceeded {
            shelter_id,
            capacity,
            occupancy,
        } => {
            assert_eq!(shelter_id, shelter.id);
            assert_eq!(capacity, 1);
            assert_eq!(occupancy, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(occupancy(&conn, shelter.id), 1);
    assert!(service.list_by_person(waiting.id).unwrap().is_empty());
}

#[test]
fn person_with_active_stay_cannot_check_in_elsewhere() {
    let conn = open_db_in_memory().unwrap();
    let shelter_a = add_shelter(&conn, 5);
    let shelter_b = add_shelter(&conn, 5);
    let person = add_person(&conn);
    let service = ledger(&conn);

    let active = service.check_in(shelter_a.id, person.id).unwrap();
    match service.check_in(shelter_b.id, person.id).unwrap_err() {
        LedgerError::DuplicateActiveRegistration {
            person_id,
            active_record_id,
        } => {
            assert_eq!(person_id, person.id);
            assert_eq!(active_record_id, Some(active.id));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(occupancy(&conn, shelter_a.id), 1);
    assert_eq!(occupancy(&conn, shelter_b.id), 0);
    assert!(service.list_active_by_shelter(shelter_b.id).unwrap().is_empty());

    service.check_out(active.id).unwrap();
    service.check_in(shelter_b.id, person.id).unwrap();
    assert_eq!(occupancy(&conn, shelter_b.id), 1);
    assert_eq!(service.list_by_person(person.id).unwrap().len(), 2);
}

#[test]
fn not_found_failures_mutate_nothing() {
    let conn = open_db_in_memory().unwrap();
    let shelter = add_shelter(&conn, 2);
    let person = add_person(&conn);
    let service = ledger(&conn);

    let missing_shelter = Uuid::new_v4();
    assert!(matches!(
        service.check_in(missing_shelter, person.id),
        Err(LedgerError::ShelterNotFound(id)) if id == missing_shelter
    ));

    let missing_person = Uuid::new_v4();
    assert!(matches!(
        service.check_in(shelter.id, missing_person),
        Err(LedgerError::PersonNotFound(id)) if id == missing_person
    ));

    let missing_record = Uuid::new_v4();
    assert!(matches!(
        service.check_out(missing_record),
        Err(LedgerError::RecordNotFound(id)) if id == missing_record
    ));
    assert!(matches!(
        service.get_record(missing_record),
        Err(LedgerError::RecordNotFound(_))
    ));

    assert_eq!(occupancy(&conn, shelter.id), 0);
    assert!(service.list_records().unwrap().is_empty());
}

#[test]
fn shelter_check_precedes_person_check() {
    let conn = open_db_in_memory().unwrap();
    let service = ledger(&conn);

    let missing_shelter = Uuid::new_v4();
    assert!(matches!(
        service.check_in(missing_shelter, Uuid::new_v4()),
        Err(LedgerError::ShelterNotFound(id)) if id == missing_shelter
    ));
}

#[test]
fn deactivated_shelter_rejects_check_in_but_allows_check_out() {
    let conn = open_db_in_memory().unwrap();
    let shelter = add_shelter(&conn, 2);
    let housed = add_person(&conn);
    let late = add_person(&conn);
    let service = ledger(&conn);

    let record = service.check_in(shelter.id, housed.id).unwrap();
    ShelterService::new(SqliteShelterRepository::try_new(&conn).unwrap())
        .deactivate(shelter.id)
        .unwrap();

    assert!(matches!(
        service.check_in(shelter.id, late.id),
        Err(LedgerError::ShelterNotFound(_))
    ));
    assert!(matches!(
        service.list_active_by_shelter(shelter.id),
        Err(LedgerError::ShelterNotFound(_))
    ));

    service.check_out(record.id).unwrap();
    assert_eq!(occupancy(&conn, shelter.id), 0);
    assert_eq!(service.list_by_person(housed.id).unwrap().len(), 1);
}

#[test]
fn list_by_person_requires_known_person_and_includes_closed_stays() {
    let conn = open_db_in_memory().unwrap();
    let shelter = add_shelter(&conn, 2);
    let person = add_person(&conn);
    let repo = SqliteOccupancyRepository::try_new(&conn).unwrap();

    let first = repo.check_in(shelter.id, person.id, 100).unwrap();
    repo.check_out(first.id, 200).unwrap();
    let second = repo.check_in(shelter.id, person.id, 300).unwrap();

    let service = LedgerService::new(repo);
    let history = service.list_by_person(person.id).unwrap();
    let ids: Vec<_> = history.iter().map(|view| view.record.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(history[1].record.status, OccupancyStatus::Closed);

    assert!(matches!(
        service.list_by_person(Uuid::new_v4()),
        Err(LedgerError::PersonNotFound(_))
    ));

    let active = service.list_active_by_shelter(shelter.id).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].record.id, second.id);
}

#[test]
fn delete_active_record_releases_its_bed() {
    let conn = open_db_in_memory().unwrap();
    let shelter = add_shelter(&conn, 2);
    let person = add_person(&conn);
    let other = add_person(&conn);
    let service = ledger(&conn);

    let active = service.check_in(shelter.id, person.id).unwrap();
    let closed = service.check_in(shelter.id, other.id).unwrap();
    service.check_out(closed.id).unwrap();
    assert_eq!(occupancy(&conn, shelter.id), 1);

    let deleted = service.delete_record(active.id).unwrap();
    assert!(deleted.is_active());
    assert_eq!(occupancy(&conn, shelter.id), 0);

    service.delete_record(closed.id).unwrap();
    assert_eq!(occupancy(&conn, shelter.id), 0);
    assert!(matches!(
        service.delete_record(closed.id),
        Err(LedgerError::RecordNotFound(_))
    ));
}

#[test]
fn reconcile_repairs_counter_written_outside_the_ledger() {
    let conn = open_db_in_memory().unwrap();
    let shelter = add_shelter(&conn, 4);
    let person = add_person(&conn);
    let service = ledger(&conn);
    service.check_in(shelter.id, person.id).unwrap();

    let shelters = ShelterService::new(SqliteShelterRepository::try_new(&conn).unwrap());
    let mut drifted = shelters.get(shelter.id).unwrap().unwrap();
    drifted.occupancy = 3;
    shelters.update(&drifted).unwrap();

    let reconciliation = service.reconcile_occupancy(shelter.id).unwrap();
    assert!(reconciliation.drifted());
    assert_eq!(reconciliation.previous, 3);
    assert_eq!(reconciliation.current, 1);
    assert_eq!(occupancy(&conn, shelter.id), 1);

    let again = service.reconcile_occupancy(shelter.id).unwrap();
    assert!(!again.drifted());
}

#[test]
fn check_out_with_zero_counter_reports_inconsistency() {
    let conn = open_db_in_memory().unwrap();
    let shelter = add_shelter(&conn, 2);
    let person = add_person(&conn);
    let service = ledger(&conn);
    let record = service.check_in(shelter.id, person.id).unwrap();

    conn.execute(
        "UPDATE shelters SET occupancy = 0 WHERE id = ?1;",
        [shelter.id.to_string()],
    )
    .unwrap();

    assert!(matches!(
        service.check_out(record.id),
        Err(LedgerError::Inconsistent(id)) if id == shelter.id
    ));
    let still_active = service.get_record(record.id).unwrap();
    assert_eq!(still_active.record.status, OccupancyStatus::Active);
}

#[test]
fn view_serializes_flat_with_snake_case_status() {
    let conn = open_db_in_memory().unwrap();
    let shelter = add_shelter(&conn, 1);
    let person = add_person(&conn);
    let service = ledger(&conn);
    let record = service.check_in(shelter.id, person.id).unwrap();

    let json = serde_json::to_value(service.get_record(record.id).unwrap()).unwrap();
    assert_eq!(json["status"], "active");
    assert_eq!(json["shelter_id"], shelter.id.to_string());
    assert!(json["checked_out_at"].is_null());
    assert_eq!(json["shelter_name"], "Escola Municipal");
}
