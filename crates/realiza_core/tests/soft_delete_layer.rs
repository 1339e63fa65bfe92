use realiza_core::db::open_db_in_memory;
use realiza_core::{
    filter_alive, filter_dead, RecordRepository, RepoError, SoftDeletable,
    SqliteVehicleRepository, Vehicle,
};
use rusqlite::Connection;
use std::collections::HashSet;

fn vehicle(index: u32) -> Vehicle {
    Vehicle::new(&format!("ABC{index:04}"), "Fiat", "Uno", None)
}

fn insert(repo: &SqliteVehicleRepository<'_>, index: u32) -> Vehicle {
    let mut record = vehicle(index);
    repo.insert(&mut record).unwrap();
    record
}

fn ids(records: &[Vehicle]) -> HashSet<uuid::Uuid> {
    records.iter().map(|record| record.id()).collect()
}

#[test]
fn insert_then_soft_delete_hides_record_from_alive_listing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();

    let a = insert(&repo, 1);
    let alive = repo.list_alive().unwrap();
    assert_eq!(alive.len(), 1);
    assert_eq!(alive[0].id(), a.id());
    assert!(!alive[0].meta.is_deleted);
    assert_eq!(alive[0].meta.deleted_at, None);

    repo.soft_delete(a.id()).unwrap();

    assert!(repo.list_alive().unwrap().is_empty());
    let all = repo.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id(), a.id());
    assert!(all[0].meta.is_deleted);
    assert!(all[0].meta.deleted_at.is_some());
}

#[test]
fn soft_delete_is_idempotent_and_keeps_first_deleted_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let a = insert(&repo, 1);

    repo.soft_delete(a.id()).unwrap();
    conn.execute(
        "UPDATE vehicles SET deleted_at = 1000 WHERE uuid = ?1;",
        [a.id().to_string()],
    )
    .unwrap();

    repo.soft_delete(a.id()).unwrap();

    let stored = repo.get(a.id(), true).unwrap().unwrap();
    assert!(stored.meta.is_deleted);
    assert_eq!(stored.meta.deleted_at, Some(1000));
    assert!(repo.get(a.id(), false).unwrap().is_none());
}

#[test]
fn hard_delete_removes_record_from_both_views() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let a = insert(&repo, 1);
    let b = insert(&repo, 2);
    repo.soft_delete(b.id()).unwrap();

    repo.hard_delete(a.id()).unwrap();
    repo.hard_delete(b.id()).unwrap();

    assert!(repo.list_alive().unwrap().is_empty());
    assert!(repo.list_all().unwrap().is_empty());
    assert!(repo.get(a.id(), true).unwrap().is_none());

    let err = repo.hard_delete(a.id()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { table: "vehicles", .. }));
}

#[test]
fn deleting_unknown_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let missing = vehicle(9);

    let err = repo.soft_delete(missing.id()).unwrap_err();
    match err {
        RepoError::NotFound { table, key } => {
            assert_eq!(table, "vehicles");
            assert_eq!(key, missing.id().to_string());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn soft_delete_after_purge_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();

    let a = insert(&repo, 1);
    repo.soft_delete(a.id()).unwrap();
    let tombstone = repo.get(a.id(), true).unwrap().unwrap();

    repo.soft_delete(a.id()).unwrap();
    let again = repo.get(a.id(), true).unwrap().unwrap();
    assert_eq!(again.meta.updated_at, tombstone.meta.updated_at);

    repo.hard_delete(a.id()).unwrap();
    assert!(matches!(
        repo.soft_delete(a.id()),
        Err(RepoError::NotFound { table: "vehicles", .. })
    ));
}

#[test]
fn half_deleted_row_counts_as_dead() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let a = insert(&repo, 1);
    let b = insert(&repo, 2);
    mark_flag_only(&conn, b.id());

    let dead = repo.all_objects().dead().fetch().unwrap();
    assert_eq!(ids(&dead), HashSet::from([b.id()]));

    let alive = repo.all_objects().alive().fetch().unwrap();
    assert_eq!(ids(&alive), HashSet::from([a.id()]));

    let loaded = repo.list_all().unwrap();
    let dead_in_memory = filter_dead(loaded.clone());
    assert_eq!(ids(&dead_in_memory), HashSet::from([b.id()]));
    assert_eq!(ids(&filter_alive(loaded)), HashSet::from([a.id()]));
}

#[test]
fn stamp_only_row_stays_in_default_scope_but_is_dead() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let a = insert(&repo, 1);
    conn.execute(
        "UPDATE vehicles SET deleted_at = 42 WHERE uuid = ?1;",
        [a.id().to_string()],
    )
    .unwrap();

    // Default scope only looks at is_deleted.
    assert_eq!(repo.objects().count().unwrap(), 1);
    assert_eq!(repo.objects().dead().count().unwrap(), 1);
    assert_eq!(repo.objects().alive().count().unwrap(), 0);
}

#[test]
fn soft_delete_completes_half_deleted_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let a = insert(&repo, 1);
    mark_flag_only(&conn, a.id());

    repo.soft_delete(a.id()).unwrap();

    let stored = repo.get(a.id(), true).unwrap().unwrap();
    assert!(stored.meta.is_deleted);
    assert!(stored.meta.deleted_at.is_some());
}

#[test]
fn alive_and_dead_partition_every_collection() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let alive_one = insert(&repo, 1);
    let deleted = insert(&repo, 2);
    let flag_only = insert(&repo, 3);
    let stamp_only = insert(&repo, 4);
    let alive_two = insert(&repo, 5);

    repo.soft_delete(deleted.id()).unwrap();
    mark_flag_only(&conn, flag_only.id());
    conn.execute(
        "UPDATE vehicles SET deleted_at = 7 WHERE uuid = ?1;",
        [stamp_only.id().to_string()],
    )
    .unwrap();

    let everything = ids(&repo.list_all().unwrap());
    let alive = ids(&repo.all_objects().alive().fetch().unwrap());
    let dead = ids(&repo.all_objects().dead().fetch().unwrap());

    assert!(alive.is_disjoint(&dead));
    assert_eq!(&alive | &dead, everything);
    assert_eq!(alive, HashSet::from([alive_one.id(), alive_two.id()]));
    assert_eq!(repo.all_objects().dead().alive().count().unwrap(), 0);
}

#[test]
fn collection_soft_delete_only_touches_matched_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let fiat = insert(&repo, 1);
    let mut gol = Vehicle::new("XYZ1D23", "VW", "Gol", None);
    repo.insert(&mut gol).unwrap();

    let affected = repo
        .objects()
        .where_eq("brand", "Fiat".to_string())
        .soft_delete()
        .unwrap();
    assert_eq!(affected, 1);

    let again = repo
        .all_objects()
        .where_eq("brand", "Fiat".to_string())
        .soft_delete()
        .unwrap();
    assert_eq!(again, 0);

    let alive = repo.list_alive().unwrap();
    assert_eq!(ids(&alive), HashSet::from([gol.id()]));
    assert!(repo.get(fiat.id(), true).unwrap().unwrap().meta.is_deleted);
}

#[test]
fn collection_hard_delete_on_dead_rows_purges_tombstones() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let keep = insert(&repo, 1);
    let gone = insert(&repo, 2);
    repo.soft_delete(gone.id()).unwrap();

    let purged = repo.all_objects().dead().hard_delete().unwrap();
    assert_eq!(purged, 1);
    assert_eq!(ids(&repo.list_all().unwrap()), HashSet::from([keep.id()]));
}

#[test]
fn alive_only_scope_cannot_reach_tombstones() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let gone = insert(&repo, 1);
    repo.soft_delete(gone.id()).unwrap();

    let purged = repo.objects().hard_delete().unwrap();
    assert_eq!(purged, 0);
    assert_eq!(repo.list_all().unwrap().len(), 1);
}

#[test]
fn update_refreshes_updated_at_and_keeps_created_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let mut a = insert(&repo, 1);
    conn.execute("UPDATE vehicles SET created_at = 5, updated_at = 5;", [])
        .unwrap();

    a.model = "Mobi".to_string();
    a.meta.created_at = 999;
    repo.update(&mut a).unwrap();

    let stored = repo.get(a.id(), false).unwrap().unwrap();
    assert_eq!(stored.model, "Mobi");
    assert_eq!(stored.meta.created_at, 5);
    assert!(stored.meta.updated_at > 5);
}

#[test]
fn update_rejects_inconsistent_deletion_pair() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let mut a = insert(&repo, 1);

    a.meta.is_deleted = true;
    let err = repo.update(&mut a).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    a.meta.deleted_at = Some(10);
    repo.update(&mut a).unwrap();
    assert!(repo.list_alive().unwrap().is_empty());
}

#[test]
fn update_missing_record_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let mut missing = vehicle(1);

    let err = repo.update(&mut missing).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));
}

#[test]
fn enabled_flag_does_not_filter_default_scope() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::try_new(&conn).unwrap();
    let mut hidden = vehicle(1);
    hidden.meta.enabled = false;
    repo.insert(&mut hidden).unwrap();

    assert_eq!(repo.list_alive().unwrap().len(), 1);
    assert_eq!(repo.objects().enabled(false).count().unwrap(), 1);
    assert_eq!(repo.objects().enabled(true).count().unwrap(), 0);
}

fn mark_flag_only(conn: &Connection, id: uuid::Uuid) {
    conn.execute(
        "UPDATE vehicles SET is_deleted = 1, deleted_at = NULL WHERE uuid = ?1;",
        [id.to_string()],
    )
    .unwrap();
}
