use shelter_core::db::open_db_in_memory;
use shelter_core::{
    RepoError, Resource, ResourceService, SqliteResourceRepository, ValidationError,
};
use uuid::Uuid;

fn resource(category: &str, quantity: i64, expires_at: Option<i64>) -> Resource {
    let mut resource = Resource::new(category, quantity);
    resource.expires_at = expires_at;
    resource
}

#[test]
fn create_get_update_and_delete() {
    let conn = open_db_in_memory().unwrap();
    let service = ResourceService::new(SqliteResourceRepository::try_new(&conn).unwrap());

    let mut water = resource("water", 120, None);
    water.unit = "liters".to_string();
    water.description = Some("Galões de 5L".to_string());
    let id = service.create(&water).unwrap();
    assert_eq!(service.get(id).unwrap().unwrap(), water);

    water.quantity = 80;
    water.expires_at = Some(1_900_000_000_000);
    service.update(&water).unwrap();
    assert_eq!(service.get(id).unwrap().unwrap(), water);

    service.delete(id).unwrap();
    assert!(service.get(id).unwrap().is_none());
    assert!(matches!(
        service.delete(id),
        Err(RepoError::NotFound { entity: "resource", .. })
    ));
}

#[test]
fn blank_category_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = ResourceService::new(SqliteResourceRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.create(&resource("  ", 1, None)),
        Err(RepoError::Validation(ValidationError::EmptyField("category")))
    ));
    assert!(service.list().unwrap().is_empty());
}

#[test]
fn list_by_category_matches_trimmed_input() {
    let conn = open_db_in_memory().unwrap();
    let service = ResourceService::new(SqliteResourceRepository::try_new(&conn).unwrap());

    service.create(&resource("blankets", 40, None)).unwrap();
    service.create(&resource("blankets", 12, None)).unwrap();
    service.create(&resource("food", 300, None)).unwrap();

    assert_eq!(service.list_by_category(" blankets ").unwrap().len(), 2);
    assert_eq!(service.list_by_category("food").unwrap().len(), 1);
    assert!(service.list_by_category("tents").unwrap().is_empty());
    assert_eq!(service.list().unwrap().len(), 3);
}

#[test]
fn expired_means_strictly_before_now() {
    let conn = open_db_in_memory().unwrap();
    let service = ResourceService::new(SqliteResourceRepository::try_new(&conn).unwrap());

    let old = resource("medicine", 10, Some(500));
    let boundary = resource("medicine", 10, Some(1_000));
    service.create(&old).unwrap();
    service.create(&boundary).unwrap();
    service.create(&resource("medicine", 10, Some(5_000))).unwrap();
    service.create(&resource("tools", 3, None)).unwrap();

    let expired: Vec<_> = service
        .list_expired(1_000)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(expired, vec![old.id]);

    let expired_later = service.list_expired(1_001).unwrap();
    assert_eq!(expired_later.len(), 2);
    assert_eq!(expired_later[1].id, boundary.id);
}

#[test]
fn low_stock_includes_the_threshold_itself() {
    let conn = open_db_in_memory().unwrap();
    let service = ResourceService::new(SqliteResourceRepository::try_new(&conn).unwrap());

    let at_default = resource("diapers", 5, None);
    let empty = resource("masks", 0, None);
    service.create(&at_default).unwrap();
    service.create(&empty).unwrap();
    service.create(&resource("soap", 6, None)).unwrap();

    let low: Vec<_> = service
        .list_low_stock()
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(low, vec![empty.id, at_default.id]);

    assert_eq!(service.list_below_threshold(6).unwrap().len(), 3);
    assert!(service.list_below_threshold(-1).unwrap().is_empty());
}

#[test]
fn configured_threshold_drives_low_stock() {
    let conn = open_db_in_memory().unwrap();
    let service = ResourceService::with_low_stock_threshold(
        SqliteResourceRepository::try_new(&conn).unwrap(),
        50,
    );

    service.create(&resource("water", 49, None)).unwrap();
    service.create(&resource("water", 51, None)).unwrap();

    assert_eq!(service.list_low_stock().unwrap().len(), 1);
}

#[test]
fn adjust_quantity_may_go_negative_but_not_overflow() {
    let conn = open_db_in_memory().unwrap();
    let service = ResourceService::new(SqliteResourceRepository::try_new(&conn).unwrap());

    let food = resource("food", 4, None);
    service.create(&food).unwrap();

    assert_eq!(service.adjust_quantity(food.id, 6).unwrap(), 10);
    assert_eq!(service.adjust_quantity(food.id, -13).unwrap(), -3);
    assert_eq!(service.get(food.id).unwrap().unwrap().quantity, -3);

    let hoard = resource("food", i64::MAX, None);
    service.create(&hoard).unwrap();
    assert!(matches!(
        service.adjust_quantity(hoard.id, 1),
        Err(RepoError::Validation(ValidationError::QuantityOverflow {
            quantity: i64::MAX,
            delta: 1
        }))
    ));
    assert_eq!(service.get(hoard.id).unwrap().unwrap().quantity, i64::MAX);

    assert!(matches!(
        service.adjust_quantity(Uuid::new_v4(), 1),
        Err(RepoError::NotFound { entity: "resource", .. })
    ));
}
