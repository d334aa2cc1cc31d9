//! Concurrent ledger mutations from independent connections to one database file.

use shelter_core::db::open_db;
use shelter_core::{
    LedgerError, LedgerService, OccupancyRecord, PersonDraft, PersonRole, PersonService,
    ShelterDraft, ShelterRepository, ShelterService, SqliteOccupancyRepository,
    SqlitePersonRepository, SqliteShelterRepository,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;
use uuid::Uuid;

fn seed_shelter(path: &Path, capacity: u32) -> Uuid {
    let conn = open_db(path).unwrap();
    let service = ShelterService::new(SqliteShelterRepository::try_new(&conn).unwrap());
    service
        .create(&ShelterDraft {
            name: format!("Abrigo {capacity}"),
            location: "Centro".to_string(),
            latitude: None,
            longitude: None,
            capacity,
        })
        .unwrap()
        .id
}

fn seed_person(path: &Path, n: u64) -> Uuid {
    let conn = open_db(path).unwrap();
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn).unwrap());
    service
        .create(&PersonDraft {
            name: format!("Pessoa {n}"),
            national_id: format!("{n:011}"),
            role: PersonRole::Affected,
            email: format!("p{n}@example.org"),
            phone: None,
        })
        .unwrap()
        .id
}

#[derive(Debug, Clone, Copy)]
enum Attempt {
    CheckIn { shelter_id: Uuid, person_id: Uuid },
    CheckOut(Uuid),
}

/// Runs each attempt on its own thread and connection, released together
/// by a barrier.
fn race(path: &Path, attempts: Vec<Attempt>) -> Vec<Result<OccupancyRecord, LedgerError>> {
    let barrier = Arc::new(Barrier::new(attempts.len()));
    let handles: Vec<_> = attempts
        .into_iter()
        .map(|attempt| {
            let barrier = Arc::clone(&barrier);
            let path: PathBuf = path.to_path_buf();
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let repo = SqliteOccupancyRepository::try_new(&conn).unwrap();
                let service = LedgerService::new(repo);
                barrier.wait();
                match attempt {
                    Attempt::CheckIn {
                        shelter_id,
                        person_id,
                    } => service.check_in(shelter_id, person_id),
                    Attempt::CheckOut(record_id) => service.check_out(record_id),
                }
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect()
}

fn race_check_ins(
    path: &Path,
    attempts: Vec<(Uuid, Uuid)>,
) -> Vec<Result<OccupancyRecord, LedgerError>> {
    let attempts = attempts
        .into_iter()
        .map(|(shelter_id, person_id)| Attempt::CheckIn {
            shelter_id,
            person_id,
        })
        .collect();
    race(path, attempts)
}

/// Checks in fresh persons until the shelter is full; returns the stay ids.
fn fill_shelter(path: &Path, shelter_id: Uuid, first_person: u64, count: u64) -> Vec<Uuid> {
    let persons: Vec<_> = (first_person..first_person + count)
        .map(|n| seed_person(path, n))
        .collect();
    let conn = open_db(path).unwrap();
    let service = LedgerService::new(SqliteOccupancyRepository::try_new(&conn).unwrap());
    persons
        .into_iter()
        .map(|person_id| service.check_in(shelter_id, person_id).unwrap().id)
        .collect()
}

fn active_at_shelter(path: &Path, shelter_id: Uuid) -> usize {
    let conn = open_db(path).unwrap();
    let service = LedgerService::new(SqliteOccupancyRepository::try_new(&conn).unwrap());
    service.list_active_by_shelter(shelter_id).unwrap().len()
}

fn occupancy(path: &Path, shelter_id: Uuid) -> u32 {
    let conn = open_db(path).unwrap();
    let repo = SqliteShelterRepository::try_new(&conn).unwrap();
    repo.get_shelter(shelter_id, true).unwrap().unwrap().occupancy
}

fn active_stays(path: &Path, person_id: Uuid) -> usize {
    let conn = open_db(path).unwrap();
    let service = LedgerService::new(SqliteOccupancyRepository::try_new(&conn).unwrap());
    service
        .list_by_person(person_id)
        .unwrap()
        .iter()
        .filter(|view| view.record.is_active())
        .count()
}

#[test]
fn last_bed_goes_to_exactly_one_of_two_racers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");
    let shelter = seed_shelter(&path, 1);
    let first = seed_person(&path, 1);
    let second = seed_person(&path, 2);

    let results = race_check_ins(&path, vec![(shelter, first), (shelter, second)]);

    let admitted = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(admitted, 1, "results: {results:?}");
    let rejected: Vec<_> = results.iter().filter_map(|result| result.as_ref().err()).collect();
    assert_eq!(rejected.len(), 1);
    assert!(
        matches!(rejected[0], LedgerError::CapacityExceeded { capacity: 1, .. }),
        "unexpected error: {}",
        rejected[0]
    );
    assert_eq!(occupancy(&path, shelter), 1);
}

#[test]
fn many_racers_never_overfill_a_shelter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crowd.db");
    let shelter = seed_shelter(&path, 3);
    let attempts: Vec<_> = (10..18).map(|n| (shelter, seed_person(&path, n))).collect();

    let results = race_check_ins(&path, attempts);

    let admitted = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(admitted, 3, "results: {results:?}");
    assert!(results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .all(|err| matches!(err, LedgerError::CapacityExceeded { .. })));
    assert_eq!(occupancy(&path, shelter), 3);
}

#[test]
fn same_person_racing_into_two_shelters_gets_one_stay() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duplicate.db");
    let shelter_a = seed_shelter(&path, 5);
    let shelter_b = seed_shelter(&path, 6);
    let person = seed_person(&path, 42);

    let results = race_check_ins(&path, vec![(shelter_a, person), (shelter_b, person)]);

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(results.iter().any(|result| matches!(
        result,
        Err(LedgerError::DuplicateActiveRegistration { person_id, .. }) if *person_id == person
    )));
    assert_eq!(active_stays(&path, person), 1);
    assert_eq!(occupancy(&path, shelter_a) + occupancy(&path, shelter_b), 1);
}

#[test]
fn check_in_and_check_out_race_keeps_counter_exact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("turnover.db");
    let shelter = seed_shelter(&path, 4);
    let stays = fill_shelter(&path, shelter, 100, 4);
    assert_eq!(occupancy(&path, shelter), 4);

    let mut attempts: Vec<_> = stays.iter().map(|id| Attempt::CheckOut(*id)).collect();
    attempts.extend((200..212).map(|n| Attempt::CheckIn {
        shelter_id: shelter,
        person_id: seed_person(&path, n),
    }));

    let results = race(&path, attempts);

    let checked_out = results[..stays.len()]
        .iter()
        .filter(|result| result.is_ok())
        .count();
    assert_eq!(checked_out, stays.len(), "results: {results:?}");
    let admitted = results[stays.len()..]
        .iter()
        .filter(|result| result.is_ok())
        .count();
    assert!(admitted <= 4, "admitted {admitted}");
    assert!(results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .all(|err| matches!(err, LedgerError::CapacityExceeded { capacity: 4, .. })));

    let current = occupancy(&path, shelter);
    assert!(current <= 4);
    assert_eq!(current as usize, admitted);
    assert_eq!(current as usize, active_at_shelter(&path, shelter));
}

#[test]
fn concurrent_double_check_out_decrements_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("double_checkout.db");
    let shelter = seed_shelter(&path, 3);
    let stays = fill_shelter(&path, shelter, 300, 3);
    let target = stays[0];

    let results = race(&path, vec![Attempt::CheckOut(target), Attempt::CheckOut(target)]);

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(results.iter().any(|result| matches!(
        result,
        Err(LedgerError::AlreadyCheckedOut(id)) if *id == target
    )));
    assert_eq!(occupancy(&path, shelter), 2);
    assert_eq!(active_at_shelter(&path, shelter), 2);
}
