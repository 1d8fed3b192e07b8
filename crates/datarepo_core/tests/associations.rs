mod common;

use common::{open, seed, Company, User};
use datarepo_core::{
    Associations, BatchQuery, Filter, Page, RepoError, Repository, SqliteRepository,
};

const COMPANY_JOIN: &str = "LEFT JOIN companies ON companies.id = users.company_id";

fn with_defaults(conn: &rusqlite::Connection) -> SqliteRepository<'_, User> {
    SqliteRepository::with_associations(
        conn,
        Associations {
            joins: vec![COMPANY_JOIN.to_string()],
            preloads: vec!["company".to_string()],
        },
    )
}

#[test]
fn default_joins_apply_to_every_read() {
    let conn = open();
    seed(&conn);
    let users = with_defaults(&conn);

    let at_acme = users.find_where("companies.name = 'Acme'", &[]).unwrap();
    assert_eq!(at_acme.len(), 2);

    let one = users
        .find_one_by_field("companies.name", "Globex".to_string(), &[])
        .unwrap()
        .unwrap();
    assert_eq!(one.name, "carol");

    let plain = SqliteRepository::<User>::new(&conn);
    let err = plain.find_where("companies.name = 'Acme'", &[]).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn joined_columns_do_not_make_bare_fields_ambiguous() {
    let conn = open();
    seed(&conn);
    let users = with_defaults(&conn);

    let alice = users.get_one_by_field("name", "alice".to_string(), &[]).unwrap();
    assert_eq!(alice.email, "alice@acme.test");

    let by_id = users.get_one_by_id(alice.id.unwrap(), &[]).unwrap();
    assert_eq!(by_id.name, "alice");
}

#[test]
fn default_preloads_fill_relations() {
    let conn = open();
    let (acme, _) = seed(&conn);
    let users = with_defaults(&conn);

    let alice = users.get_one_by_field("name", "alice".to_string(), &[]).unwrap();
    assert_eq!(alice.company.as_ref(), Some(&acme));

    let all = users.find_all(&[]).unwrap();
    let dave = all.iter().find(|user| user.name == "dave").unwrap();
    assert!(dave.company.is_none());
    assert!(all
        .iter()
        .filter(|user| user.company_id.is_some())
        .all(|user| user.company.is_some()));
}

#[test]
fn repository_without_defaults_leaves_relations_unloaded() {
    let conn = open();
    seed(&conn);
    let users = SqliteRepository::<User>::new(&conn);

    let alice = users.get_one_by_field("name", "alice".to_string(), &[]).unwrap();
    assert!(alice.company.is_none());

    let loaded = users
        .get_one_by_field("name", "alice".to_string(), &["company"])
        .unwrap();
    assert_eq!(loaded.company.unwrap().name, "Acme");
}

#[test]
fn per_call_preloads_replace_defaults() {
    let conn = open();
    seed(&conn);
    let users = with_defaults(&conn);

    let scoped = users.query(&[]);
    assert_eq!(scoped.preloads_in_use(), ["company".to_string()]);
    assert_eq!(scoped.joins_in_use(), [COMPANY_JOIN.to_string()]);

    let err = users.find_all(&["projects"]).unwrap_err();
    assert!(
        matches!(err, RepoError::UnknownRelation { table: "users", ref relation } if relation == "projects")
    );
}

#[test]
fn batch_query_can_override_joins_and_preloads() {
    let conn = open();
    seed(&conn);
    let users = with_defaults(&conn);

    let no_join = BatchQuery::new(Page::unbounded())
        .joins(Vec::<String>::new())
        .filter(Filter::condition("companies.name = 'Acme'"));
    assert!(matches!(
        users.find_batch(&no_join).unwrap_err(),
        RepoError::Db(_)
    ));

    let unknown = BatchQuery::new(Page::unbounded()).preload("projects");
    assert!(matches!(
        users.find_batch(&unknown).unwrap_err(),
        RepoError::UnknownRelation { .. }
    ));
}

#[test]
fn preloads_are_skipped_when_nothing_matched() {
    let conn = open();
    let users = SqliteRepository::<User>::new(&conn);

    assert!(users.find_all(&["projects"]).unwrap().is_empty());
}

#[test]
fn associations_are_fixed_at_construction() {
    let conn = open();
    let users = with_defaults(&conn);

    let associations = users.associations().clone();
    assert_eq!(associations.joins, vec![COMPANY_JOIN.to_string()]);
    assert_eq!(associations.preloads, vec!["company".to_string()]);
}

#[test]
fn one_to_many_default_join_yields_each_record_once() {
    let conn = open();
    let (acme, _) = seed(&conn);
    let companies = SqliteRepository::<Company>::with_associations(
        &conn,
        Associations {
            joins: vec!["LEFT JOIN users ON users.company_id = companies.id".to_string()],
            preloads: Vec::new(),
        },
    );

    assert_eq!(companies.find_all(&[]).unwrap().len(), 2);

    let found = companies.get_one_by_field("name", "Acme".to_string(), &[]).unwrap();
    assert_eq!(found, acme);

    let with_adults = companies.find_where("users.age > 20", &[]).unwrap();
    assert_eq!(with_adults.len(), 2);

    let batch = companies
        .find_batch(&BatchQuery::new(Page::new(1, 0)))
        .unwrap();
    assert_eq!(batch.rows.len(), 1);
    assert_eq!(batch.total, 2);
}
