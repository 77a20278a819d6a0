//! Shared SQLite fixture.

use gendb::config::Environment;
use gendb::query::QueryBuilder;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use tempfile::TempDir;

pub const ALL_ROWS: &str = "SELECT * FROM testTable WHERE 1=1";

/// A temporary database holding `testTable` with six rows.
pub struct Fixture {
    pub dir: TempDir,
    pub environment: Environment,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testDB.db");
        seed(&path).await;

        let environment = Environment::from_entries([
            ("driver", "SQLite3 ODBC Driver"),
            ("database", path.to_str().unwrap()),
        ])
        .unwrap();

        Self { dir, environment }
    }

    pub fn builder(&self, sql: &str) -> QueryBuilder {
        QueryBuilder::new(self.environment.clone())
            .with_sql(sql)
            .unwrap()
    }
}

async fn seed(path: &Path) {
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE testTable (
            testVarCharNull VARCHAR(50),
            testVarChar VARCHAR(50) NOT NULL,
            testIntNull INT,
            testInt INT NOT NULL,
            testFloatNull FLOAT,
            testFloat FLOAT NOT NULL
        )",
    )
    .execute(&mut conn)
    .await
    .unwrap();

    let rows: [(Option<&str>, &str, Option<i64>, i64, Option<f64>, f64); 6] = [
        (Some("vc1"), "vc10", Some(1), 10, Some(100.1), 100.1),
        (Some("vc2"), "vc20", Some(2), 20, Some(200.1), 200.1),
        (Some("vc3"), "vc30", Some(3), 30, Some(300.1), 300.1),
        (Some("991"), "992", Some(4), 40, Some(400.1), 400.1),
        (Some("991.1"), "992.1", Some(5), 50, Some(500.1), 500.1),
        (None, "992", None, 60, None, 600.1),
    ];

    for (vc_null, vc, int_null, int, float_null, float) in rows {
        sqlx::query("INSERT INTO testTable VALUES (?, ?, ?, ?, ?, ?)")
            .bind(vc_null)
            .bind(vc)
            .bind(int_null)
            .bind(int)
            .bind(float_null)
            .bind(float)
            .execute(&mut conn)
            .await
            .unwrap();
    }

    conn.close().await.unwrap();
}
