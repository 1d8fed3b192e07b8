mod common;

use common::{seed, User, SCHEMA};
use datarepo_core::{
    init_logging, logging_status, open_db, Associations, Config, ConfigError, Repository,
    SqliteRepository,
};

#[test]
fn config_file_drives_logging_and_database_bootstrap() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db");
    let log_dir = dir.path().join("logs");
    let config_path = dir.path().join("config.json");
    let document = serde_json::json!({
        "db": { "path": db_path, "busy_timeout_ms": 250 },
        "log": { "dir": log_dir, "level": "debug" }
    });
    std::fs::write(&config_path, document.to_string()).unwrap();

    let config = Config::from_file(&config_path).unwrap();
    let log = config.log.as_ref().unwrap();
    init_logging(log).unwrap();
    assert_eq!(logging_status(), Some(("debug", log_dir.clone())));
    assert!(log_dir.is_dir());

    let conn = open_db(&config.db, SCHEMA).unwrap();
    seed(&conn);
    let users = SqliteRepository::<User>::new(&conn);
    assert_eq!(users.find_all(&[]).unwrap().len(), 4);
    assert!(db_path.is_file());
}

#[test]
fn missing_config_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");

    let err = Config::from_file(&missing).unwrap_err();
    match err {
        ConfigError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn associations_deserialize_from_json() {
    let associations: Associations = serde_json::from_str(
        r#"{"joins": ["LEFT JOIN companies ON companies.id = users.company_id"], "preloads": ["company"]}"#,
    )
    .unwrap();
    assert_eq!(associations.preloads, vec!["company".to_string()]);

    let empty: Associations = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, Associations::default());
}
