//! Query execution integration tests.
//!
//! Runs conditional queries against the SQLite fixture and checks the
//! number and shape of the returned rows.

use super::common::{Fixture, ALL_ROWS};
use gendb::db::{SqlxConnector, Value};
use gendb::error::GenDbError;
use gendb::query::ConditionValue;
use pretty_assertions::assert_eq;

async fn count(fixture: &Fixture, conditions: &[(&str, &str, ConditionValue)]) -> usize {
    let mut qb = fixture.builder(ALL_ROWS);
    for (field, op, value) in conditions {
        qb.add_conditional(field, op, value.clone()).unwrap();
    }
    qb.execute(&SqlxConnector::new()).await.unwrap().len()
}

#[tokio::test]
async fn test_select_all_rows() {
    let fixture = Fixture::new().await;
    assert_eq!(count(&fixture, &[]).await, 6);
}

#[tokio::test]
async fn test_user_variable_limit() {
    let fixture = Fixture::new().await;
    let mut qb = fixture
        .builder("SELECT * FROM testTable LIMIT ?")
        .with_vars([1i64]);

    let result = qb.execute(&SqlxConnector::new()).await.unwrap();
    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn test_chained_numeric_conditions() {
    let fixture = Fixture::new().await;
    let n = count(
        &fixture,
        &[
            ("testInt", "!=", 10.into()),
            ("testIntNull", "<", 4.into()),
        ],
    )
    .await;
    assert_eq!(n, 2);
}

#[tokio::test]
async fn test_null_conditions() {
    let fixture = Fixture::new().await;
    assert_eq!(count(&fixture, &[("testIntNull", "=", ConditionValue::Null)]).await, 1);
    assert_eq!(count(&fixture, &[("testIntNull", "!=", ConditionValue::Null)]).await, 5);
    assert_eq!(count(&fixture, &[("testIntNull", "<>", ConditionValue::Null)]).await, 5);
}

#[tokio::test]
async fn test_text_equality() {
    let fixture = Fixture::new().await;
    assert_eq!(count(&fixture, &[("testVarChar", "=", "vc10".into())]).await, 1);
}

#[tokio::test]
async fn test_numeric_comparison_on_text_column() {
    let fixture = Fixture::new().await;
    // "992", "992.1" and "992" all cast to 992
    assert_eq!(count(&fixture, &[("testVarChar", "=", 992.into())]).await, 3);
}

#[tokio::test]
async fn test_float_comparison() {
    let fixture = Fixture::new().await;
    assert_eq!(count(&fixture, &[("testFloat", ">", 300.5.into())]).await, 3);
}

#[tokio::test]
async fn test_membership_conditions() {
    let fixture = Fixture::new().await;
    assert_eq!(
        count(&fixture, &[("testInt", "in", vec![10i64, 20].into())]).await,
        2
    );
    assert_eq!(
        count(&fixture, &[("testInt", "not in", vec![10i64, 20].into())]).await,
        4
    );
    assert_eq!(
        count(&fixture, &[("testVarChar", "IN", "992".into())]).await,
        2
    );
}

#[tokio::test]
async fn test_like_condition() {
    let fixture = Fixture::new().await;
    assert_eq!(count(&fixture, &[("testVarChar", "like", "vc%".into())]).await, 3);
    assert_eq!(
        count(&fixture, &[("testVarChar", "not like", "vc%".into())]).await,
        3
    );
}

#[tokio::test]
async fn test_row_values_are_typed() {
    let fixture = Fixture::new().await;
    let mut qb = fixture.builder("SELECT * FROM testTable WHERE 1=1 ORDER BY testInt");
    let result = qb.execute(&SqlxConnector::new()).await.unwrap();

    assert_eq!(
        result.fields().unwrap(),
        vec![
            "testVarCharNull",
            "testVarChar",
            "testIntNull",
            "testInt",
            "testFloatNull",
            "testFloat"
        ]
    );

    let ints: Vec<&Value> = result.field_data("testInt").unwrap();
    assert_eq!(
        ints,
        vec![
            &Value::Int(10),
            &Value::Int(20),
            &Value::Int(30),
            &Value::Int(40),
            &Value::Int(50),
            &Value::Int(60)
        ]
    );

    let last = result.rows().last().unwrap();
    assert_eq!(last.get("testVarCharNull"), Some(&Value::Null));
    assert_eq!(last.get("testFloat"), Some(&Value::Float(600.1)));
}

#[tokio::test]
async fn test_sql_loaded_from_file() {
    let fixture = Fixture::new().await;
    let path = fixture.dir.path().join("query.sql");
    std::fs::write(&path, "SELECT testInt FROM testTable WHERE 1=1").unwrap();

    let mut qb = fixture.builder(path.to_str().unwrap());
    qb.add_conditional("testInt", ">=", 50).unwrap();

    let result = qb.execute(&SqlxConnector::new()).await.unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.fields().unwrap(), vec!["testInt"]);
}

#[tokio::test]
async fn test_failed_query_keeps_previous_result() {
    let fixture = Fixture::new().await;
    let mut qb = fixture.builder(ALL_ROWS);
    qb.execute(&SqlxConnector::new()).await.unwrap();

    qb.set_query("SELECT * FROM missingTable").unwrap();
    let err = qb.execute(&SqlxConnector::new()).await.unwrap_err();

    assert!(matches!(err, GenDbError::Query(_)));
    assert_eq!(qb.result().len(), 6);
}

#[tokio::test]
async fn test_missing_database_file_is_connection_error() {
    let fixture = Fixture::new().await;
    let mut qb = fixture.builder(ALL_ROWS);
    let missing = fixture.dir.path().join("nope.db");
    qb.set_environment([("database", missing.to_str().unwrap())])
        .unwrap();

    let err = qb.execute(&SqlxConnector::new()).await.unwrap_err();
    assert!(matches!(err, GenDbError::Connection(_)));
}

#[tokio::test]
async fn test_sql_server_environment_has_no_driver() {
    let fixture = Fixture::new().await;
    let mut qb = fixture.builder(ALL_ROWS);
    qb.set_environment([("driver", "ODBC Driver 17 for SQL Server")])
        .unwrap();

    let err = qb.execute(&SqlxConnector::new()).await.unwrap_err();
    assert!(matches!(err, GenDbError::Connection(_)));
}
