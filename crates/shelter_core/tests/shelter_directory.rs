use shelter_core::db::open_db_in_memory;
use shelter_core::{
    RepoError, ShelterDraft, ShelterRepository, ShelterService, SqliteShelterRepository,
    ValidationError,
};
use uuid::Uuid;

fn draft(name: &str, capacity: u32) -> ShelterDraft {
    ShelterDraft {
        name: name.to_string(),
        location: "Av. Brasil, 100".to_string(),
        latitude: Some(-27.59),
        longitude: Some(-48.55),
        capacity,
    }
}

#[test]
fn create_starts_empty_and_active() {
    let conn = open_db_in_memory().unwrap();
    let service = ShelterService::new(SqliteShelterRepository::try_new(&conn).unwrap());

    let created = service.create(&draft("  Ginásio Central ", 40)).unwrap();
    assert_eq!(created.name, "Ginásio Central");
    assert_eq!(created.occupancy, 0);
    assert!(created.is_active);

    let loaded = service.get(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert!(service.exists_active(created.id).unwrap());
}

#[test]
fn create_rejects_zero_capacity_and_blank_name() {
    let conn = open_db_in_memory().unwrap();
    let service = ShelterService::new(SqliteShelterRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.create(&draft("Escola", 0)),
        Err(RepoError::Validation(ValidationError::ZeroCapacity))
    ));
    assert!(matches!(
        service.create(&draft("   ", 10)),
        Err(RepoError::Validation(ValidationError::EmptyField("name")))
    ));
    assert!(service.list_active().unwrap().is_empty());
}

#[test]
fn deactivated_shelter_is_hidden_from_default_reads() {
    let conn = open_db_in_memory().unwrap();
    let service = ShelterService::new(SqliteShelterRepository::try_new(&conn).unwrap());

    let kept = service.create(&draft("Alpha", 10)).unwrap();
    let closed = service.create(&draft("Beta", 10)).unwrap();
    service.deactivate(closed.id).unwrap();

    assert!(service.get(closed.id).unwrap().is_none());
    assert!(!service.exists_active(closed.id).unwrap());
    let inactive = service.get_including_inactive(closed.id).unwrap().unwrap();
    assert!(!inactive.is_active);

    let active_ids: Vec<_> = service.list_active().unwrap().iter().map(|s| s.id).collect();
    assert_eq!(active_ids, vec![kept.id]);
    assert_eq!(service.list_all().unwrap().len(), 2);
}

#[test]
fn update_enforces_occupancy_bounds_and_reports_missing_id() {
    let conn = open_db_in_memory().unwrap();
    let service = ShelterService::new(SqliteShelterRepository::try_new(&conn).unwrap());

    let mut shelter = service.create(&draft("Paróquia", 3)).unwrap();
    shelter.occupancy = 4;
    assert!(matches!(
        service.update(&shelter),
        Err(RepoError::Validation(ValidationError::OccupancyExceedsCapacity {
            occupancy: 4,
            capacity: 3
        }))
    ));

    shelter.occupancy = 2;
    shelter.capacity = 8;
    shelter.name = "Paróquia São José".to_string();
    service.update(&shelter).unwrap();
    assert_eq!(service.get(shelter.id).unwrap().unwrap(), shelter);

    let mut ghost = shelter.clone();
    ghost.id = Uuid::new_v4();
    assert!(matches!(
        service.update(&ghost),
        Err(RepoError::NotFound { entity: "shelter", .. })
    ));
    assert!(matches!(
        service.deactivate(Uuid::new_v4()),
        Err(RepoError::NotFound { entity: "shelter", .. })
    ));
}

#[test]
fn list_orders_by_name_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShelterRepository::try_new(&conn).unwrap();
    let service = ShelterService::new(SqliteShelterRepository::try_new(&conn).unwrap());

    service.create(&draft("charlie", 1)).unwrap();
    service.create(&draft("Alpha", 1)).unwrap();
    service.create(&draft("bravo", 1)).unwrap();

    let names: Vec<_> = repo
        .list_shelters(false)
        .unwrap()
        .into_iter()
        .map(|shelter| shelter.name)
        .collect();
    assert_eq!(names, ["Alpha", "bravo", "charlie"]);
}
