mod common;

use common::{open, seed, User};
use datarepo_core::{fields, Page, RepoError, Repository, SqliteRepository};
use rusqlite::types::Value;

#[test]
fn strict_fetch_on_zero_rows_returns_record_not_found() {
    let conn = open();
    seed(&conn);
    let users = SqliteRepository::<User>::new(&conn);

    let err = users
        .get_one_by_field("email", "nobody@example.test".to_string(), &[])
        .unwrap_err();
    assert!(err.is_record_not_found());
    assert!(matches!(err, RepoError::RecordNotFound));

    let err = users.get_one_by_id(999, &[]).unwrap_err();
    assert!(err.is_record_not_found());
}

#[test]
fn strict_fetch_on_one_row_returns_it() {
    let conn = open();
    seed(&conn);
    let users = SqliteRepository::<User>::new(&conn);

    let bob = users.get_one_by_field("name", "bob".to_string(), &[]).unwrap();
    assert_eq!(bob.email, "bob@acme.test");
    assert_eq!(bob.age, Some(25));

    let by_id = users.get_one_by_id(bob.id.unwrap(), &[]).unwrap();
    assert_eq!(by_id, bob);
}

#[test]
fn strict_fetch_on_many_rows_reports_ambiguity_not_absence() {
    let conn = open();
    seed(&conn);
    let users = SqliteRepository::<User>::new(&conn);

    let err = users.get_one_by_field("age", 31, &[]).unwrap_err();
    assert!(matches!(err, RepoError::AmbiguousMatch { count: 2 }));
    assert!(!err.is_record_not_found());

    let unaged = users
        .get_one_by_fields(&fields([("age", Value::Null)]), &[])
        .unwrap();
    assert_eq!(unaged.name, "dave");
}

#[test]
fn non_strict_single_fetch_treats_absence_as_success() {
    let conn = open();
    seed(&conn);
    let users = SqliteRepository::<User>::new(&conn);

    assert!(users
        .find_one_by_field("email", "nobody@example.test".to_string(), &[])
        .unwrap()
        .is_none());
    assert!(users.find_one_by_id(999, &[]).unwrap().is_none());

    let first_31 = users.find_one_by_field("age", 31, &[]).unwrap().unwrap();
    assert_eq!(first_31.name, "alice");
}

#[test]
fn database_errors_are_wrapped_and_distinct_from_sentinel() {
    let conn = open();
    seed(&conn);
    let users = SqliteRepository::<User>::new(&conn);

    let err = users.find_where("no_such_column = 1", &[]).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(!err.is_record_not_found());

    let err = users
        .get_one_by_field("no_such_column", 1, &[])
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn strict_fetch_ignores_the_query_page() {
    let conn = open();
    seed(&conn);
    let users = SqliteRepository::<User>::new(&conn);

    let err = users.query(&[]).page(Page::new(10, 3)).one().unwrap_err();
    assert!(matches!(err, RepoError::AmbiguousMatch { count: 4 }));

    let bob = users
        .query(&[])
        .where_field("name", "bob".to_string())
        .page(Page::new(1, 1))
        .one()
        .unwrap();
    assert_eq!(bob.name, "bob");
}
