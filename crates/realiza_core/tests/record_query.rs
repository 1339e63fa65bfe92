use realiza_core::db::migrations::latest_version;
use realiza_core::db::open_db_in_memory;
use realiza_core::{
    Person, RecordRepository, RepoError, Scope, SoftDeletable, SqlitePersonRepository,
    SqliteVehicleRepository, Vehicle,
};
use rusqlite::types::Value;
use rusqlite::Connection;
use uuid::Uuid;

fn vehicle_with_id(id: &str, plate: &str) -> Vehicle {
    Vehicle::with_id(Uuid::parse_str(id).unwrap(), plate, "Fiat", "Uno", None).unwrap()
}

#[test]
fn query_scope_follows_alive_only_flag() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();

    assert_eq!(repo.query(true).scope(), Scope::AliveOnly);
    assert_eq!(repo.query(false).scope(), Scope::All);
    assert!(repo.query(true).fetch().unwrap().is_empty());
    assert_eq!(repo.query(false).count().unwrap(), 0);
}

#[test]
fn query_is_lazy_and_restartable() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();

    let query = repo.objects();
    let mut first = Vehicle::new("AAA1111", "Fiat", "Uno", None);
    repo.insert(&mut first).unwrap();

    assert_eq!(query.count().unwrap(), 1);

    let mut second = Vehicle::new("BBB2222", "Fiat", "Palio", None);
    repo.insert(&mut second).unwrap();

    let reused = query.clone();
    assert_eq!(query.fetch().unwrap().len(), 2);
    assert_eq!(reused.count().unwrap(), 2);
}

#[test]
fn fetch_orders_newest_first_with_uuid_tiebreak() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();

    let mut a = vehicle_with_id("00000000-0000-4000-8000-000000000001", "AAA0001");
    let mut b = vehicle_with_id("00000000-0000-4000-8000-000000000002", "AAA0002");
    let mut c = vehicle_with_id("00000000-0000-4000-8000-000000000003", "AAA0003");
    repo.insert(&mut c).unwrap();
    repo.insert(&mut a).unwrap();
    repo.insert(&mut b).unwrap();

    conn.execute("UPDATE vehicles SET created_at = 100;", []).unwrap();
    conn.execute(
        "UPDATE vehicles SET created_at = 200 WHERE uuid = ?1;",
        [c.id().to_string()],
    )
    .unwrap();

    let ordered: Vec<Uuid> = repo
        .list_all()
        .unwrap()
        .iter()
        .map(|vehicle| vehicle.id())
        .collect();
    assert_eq!(ordered, vec![c.id(), a.id(), b.id()]);
}

#[test]
fn limit_and_offset_page_through_results() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();

    let mut a = vehicle_with_id("00000000-0000-4000-8000-000000000001", "AAA0001");
    let mut b = vehicle_with_id("00000000-0000-4000-8000-000000000002", "AAA0002");
    let mut c = vehicle_with_id("00000000-0000-4000-8000-000000000003", "AAA0003");
    repo.insert(&mut a).unwrap();
    repo.insert(&mut b).unwrap();
    repo.insert(&mut c).unwrap();
    conn.execute("UPDATE vehicles SET created_at = 1234567890000;", [])
        .unwrap();

    let page = repo.all_objects().limit(2).offset(1).fetch().unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id(), b.id());
    assert_eq!(page[1].id(), c.id());

    let tail = repo.all_objects().offset(2).fetch().unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].id(), c.id());

    assert_eq!(repo.all_objects().limit(2).count().unwrap(), 2);
}

#[test]
fn first_and_exists_honor_zero_limit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let mut a = Vehicle::new("AAA1111", "Fiat", "Uno", None);
    repo.insert(&mut a).unwrap();

    let empty_page = repo.objects().limit(0);
    assert!(empty_page.fetch().unwrap().is_empty());
    assert_eq!(empty_page.count().unwrap(), 0);
    assert!(!empty_page.exists().unwrap());
    assert!(empty_page.first().unwrap().is_none());

    let wide_page = repo.objects().limit(5);
    assert!(wide_page.exists().unwrap());
    assert_eq!(wide_page.first().unwrap().map(|v| v.id()), Some(a.id()));
    assert_eq!(wide_page.count().unwrap(), 1);
}

#[test]
fn limited_soft_delete_only_touches_selected_page() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();

    let mut a = vehicle_with_id("00000000-0000-4000-8000-000000000001", "AAA0001");
    let mut b = vehicle_with_id("00000000-0000-4000-8000-000000000002", "AAA0002");
    repo.insert(&mut a).unwrap();
    repo.insert(&mut b).unwrap();
    conn.execute("UPDATE vehicles SET created_at = 10;", []).unwrap();

    assert_eq!(repo.objects().limit(1).soft_delete().unwrap(), 1);

    let alive = repo.list_alive().unwrap();
    assert_eq!(alive.len(), 1);
    assert_eq!(alive[0].id(), b.id());
}

#[test]
fn with_ids_and_created_by_filters() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();

    let mut a = Vehicle::new("AAA1111", "Fiat", "Uno", None);
    let mut b = Vehicle::new("BBB2222", "VW", "Gol", None);
    repo.insert(&mut a).unwrap();
    repo.insert(&mut b).unwrap();

    let selected = repo.objects().with_ids([b.id()]).fetch().unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].id(), b.id());

    assert_eq!(repo.objects().with_ids(Vec::<Uuid>::new()).count().unwrap(), 0);
    assert_eq!(repo.objects().created_by(None).count().unwrap(), 2);
    assert_eq!(
        repo.objects()
            .created_by(Some(Uuid::new_v4()))
            .count()
            .unwrap(),
        0
    );
}

#[test]
fn where_eq_matches_values_and_nulls() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();

    let mut dated = Vehicle::new("AAA1111", "Fiat", "Uno", None);
    dated.model_year = Some(2012);
    let mut undated = Vehicle::new("BBB2222", "Fiat", "Palio", None);
    repo.insert(&mut dated).unwrap();
    repo.insert(&mut undated).unwrap();

    let by_year = repo.objects().where_eq("model_year", 2012_i64).fetch().unwrap();
    assert_eq!(by_year.len(), 1);
    assert_eq!(by_year[0].id(), dated.id());

    let without_year = repo
        .objects()
        .where_eq("model_year", Value::Null)
        .fetch()
        .unwrap();
    assert_eq!(without_year.len(), 1);
    assert_eq!(without_year[0].id(), undated.id());
}

#[test]
fn where_eq_rejects_unknown_column_on_execution() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();

    let query = repo.objects().where_eq("plate; DROP TABLE vehicles", 1_i64);
    let err = query.fetch().unwrap_err();
    assert!(matches!(
        err,
        RepoError::UnknownColumn {
            table: "vehicles",
            ..
        }
    ));
    assert!(matches!(
        query.soft_delete(),
        Err(RepoError::UnknownColumn { .. })
    ));
}

#[test]
fn person_repository_normalizes_email() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let mut person = Person::new("Maria Silva", None);
    person.email = Some(" Maria@Example.COM ".to_string());
    person.phone = Some("+55 11 99999-0000".to_string());
    repo.insert(&mut person).unwrap();
    assert_eq!(person.email.as_deref(), Some("maria@example.com"));

    let stored = repo.get(person.id(), false).unwrap().unwrap();
    assert_eq!(stored.email.as_deref(), Some("maria@example.com"));
    assert_eq!(stored, person);
    assert_eq!(stored.phone.as_deref(), Some("+55 11 99999-0000"));

    repo.soft_delete(person.id()).unwrap();
    assert!(repo.list_alive().unwrap().is_empty());
    assert_eq!(repo.list_all().unwrap().len(), 1);
}

#[test]
fn invalid_records_are_rejected_before_insert() {
    let conn = open_db_in_memory().unwrap();
    let vehicles = SqliteVehicleRepository::try_new(&conn).unwrap();
    let people = SqlitePersonRepository::try_new(&conn).unwrap();

    let mut bad_plate = Vehicle::new("12", "Fiat", "Uno", None);
    assert!(matches!(
        vehicles.insert(&mut bad_plate),
        Err(RepoError::Validation(_))
    ));

    let mut nameless = Person::new("   ", None);
    assert!(matches!(
        people.insert(&mut nameless),
        Err(RepoError::Validation(_))
    ));
    assert_eq!(vehicles.list_all().unwrap().len(), 0);
}

#[test]
fn invalid_persisted_flag_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let mut a = Vehicle::new("AAA1111", "Fiat", "Uno", None);
    repo.insert(&mut a).unwrap();

    conn.execute_batch(
        "PRAGMA ignore_check_constraints = ON;
         UPDATE vehicles SET enabled = 7;",
    )
    .unwrap();

    assert!(matches!(
        repo.list_all(),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteVehicleRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_missing_table_and_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();
    assert!(matches!(
        SqliteVehicleRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("vehicles"))
    ));

    conn.execute_batch(
        "CREATE TABLE vehicles (
            uuid TEXT PRIMARY KEY NOT NULL,
            is_deleted INTEGER NOT NULL DEFAULT 0
        );",
    )
    .unwrap();
    assert!(matches!(
        SqliteVehicleRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "vehicles",
            column: "obs"
        })
    ));
}
