#![allow(dead_code)]

use datarepo_core::{
    open_db_in_memory, Migration, Record, RepoError, RepoResult, Repository, SqliteRepository,
};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use uuid::Uuid;

pub const SCHEMA: &[Migration] = &[
    Migration::new(
        1,
        "CREATE TABLE companies (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );
        CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            age INTEGER,
            company_id INTEGER REFERENCES companies(id)
        );",
    ),
    Migration::new(
        2,
        "CREATE TABLE tags (
            uuid TEXT PRIMARY KEY,
            label TEXT NOT NULL
        );",
    ),
];

pub fn open() -> Connection {
    open_db_in_memory(SCHEMA).unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub id: Option<i64>,
    pub name: String,
}

impl Company {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }
}

impl Record for Company {
    const TABLE: &'static str = "companies";

    fn columns() -> &'static [&'static str] {
        &["id", "name"]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![self.primary_key(), Value::from(self.name.clone())]
    }

    fn primary_key(&self) -> Value {
        self.id.map_or(Value::Null, Value::from)
    }

    fn set_primary_key(&mut self, rowid: i64) {
        self.id = Some(rowid);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub age: Option<i64>,
    pub company_id: Option<i64>,
    /// Filled by the `company` preload.
    pub company: Option<Company>,
}

impl User {
    pub fn new(name: &str, email: &str, age: Option<i64>) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            email: email.to_string(),
            age,
            company_id: None,
            company: None,
        }
    }

    pub fn at(mut self, company: &Company) -> Self {
        self.company_id = company.id;
        self
    }
}

impl Record for User {
    const TABLE: &'static str = "users";

    fn columns() -> &'static [&'static str] {
        &["id", "name", "email", "age", "company_id"]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            age: row.get("age")?,
            company_id: row.get("company_id")?,
            company: None,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.primary_key(),
            Value::from(self.name.clone()),
            Value::from(self.email.clone()),
            Value::from(self.age),
            Value::from(self.company_id),
        ]
    }

    fn primary_key(&self) -> Value {
        self.id.map_or(Value::Null, Value::from)
    }

    fn set_primary_key(&mut self, rowid: i64) {
        self.id = Some(rowid);
    }

    fn load_relation(conn: &Connection, records: &mut [Self], relation: &str) -> RepoResult<()> {
        match relation {
            "company" => {
                let companies = SqliteRepository::<Company>::new(conn);
                for user in records.iter_mut() {
                    user.company = match user.company_id {
                        Some(id) => companies.find_one_by_id(id, &[])?,
                        None => None,
                    };
                }
                Ok(())
            }
            other => Err(RepoError::UnknownRelation {
                table: Self::TABLE,
                relation: other.to_string(),
            }),
        }
    }
}

/// Text-keyed record: the caller assigns the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub uuid: Uuid,
    pub label: String,
}

impl Tag {
    pub fn new(label: &str) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            label: label.to_string(),
        }
    }
}

impl Record for Tag {
    const TABLE: &'static str = "tags";
    const PRIMARY_KEY: &'static str = "uuid";

    fn columns() -> &'static [&'static str] {
        &["uuid", "label"]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let text: String = row.get("uuid")?;
        let uuid = Uuid::parse_str(&text).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
        })?;
        Ok(Self {
            uuid,
            label: row.get("label")?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![self.primary_key(), Value::from(self.label.clone())]
    }

    fn primary_key(&self) -> Value {
        Value::from(self.uuid.to_string())
    }
}

/// Inserts `Acme` (alice, bob), `Globex` (carol) and the unaffiliated dave.
pub fn seed(conn: &Connection) -> (Company, Company) {
    let companies = SqliteRepository::<Company>::new(conn);
    let users = SqliteRepository::<User>::new(conn);

    let mut acme = Company::new("Acme");
    let mut globex = Company::new("Globex");
    companies.create(&mut acme).unwrap();
    companies.create(&mut globex).unwrap();

    for mut user in [
        User::new("alice", "alice@acme.test", Some(31)).at(&acme),
        User::new("bob", "bob@acme.test", Some(25)).at(&acme),
        User::new("carol", "carol@globex.test", Some(31)).at(&globex),
        User::new("dave", "dave@example.test", None),
    ] {
        users.create(&mut user).unwrap();
    }

    (acme, globex)
}
